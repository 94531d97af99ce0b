//! BFS frontier and visited set
//!
//! Both structures are owned by the coordinator task alone, so plain
//! collections are enough: check-then-insert is atomic by construction.

use crate::url::visit_key;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// A unit of crawl work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// Normalized URL, fragment stripped
    pub url: Url,
    pub fragment: Option<String>,
    /// Link distance from the seed that led here
    pub depth: u32,
}

impl CrawlTask {
    pub fn new(url: Url, fragment: Option<String>, depth: u32) -> Self {
        Self {
            url,
            fragment,
            depth,
        }
    }

    /// Visit key of this task; the fragment only counts when fragments are exported
    pub fn key(&self, export_fragments: bool) -> String {
        visit_key(&self.url, self.fragment.as_deref(), export_fragments)
    }

    /// URL as shown in outcomes and logs
    pub fn display_url(&self) -> String {
        match &self.fragment {
            Some(fragment) => format!("{}#{}", self.url, fragment),
            None => self.url.to_string(),
        }
    }
}

/// FIFO queue of pending tasks that refuses keys it already holds
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<CrawlTask>,
    pending: HashSet<String>,
    export_fragments: bool,
}

impl Frontier {
    pub fn new(export_fragments: bool) -> Self {
        Self {
            queue: VecDeque::new(),
            pending: HashSet::new(),
            export_fragments,
        }
    }

    /// Enqueues `task` unless a task with the same key is already waiting
    ///
    /// # Returns
    ///
    /// `true` if the task was added
    pub fn push(&mut self, task: CrawlTask) -> bool {
        if !self.pending.insert(task.key(self.export_fragments)) {
            return false;
        }
        self.queue.push_back(task);
        true
    }

    pub fn pop(&mut self) -> Option<CrawlTask> {
        let task = self.queue.pop_front()?;
        self.pending.remove(&task.key(self.export_fragments));
        Some(task)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pending.contains(key)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Keys of every URL that has been dequeued and claimed in this run
#[derive(Debug, Default)]
pub struct VisitedSet {
    keys: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` visited; `false` if it already was
    pub fn insert(&mut self, key: String) -> bool {
        self.keys.insert(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
