//! In-memory content repository
//!
//! The ordered, append-only collection of exported pages. The crawl
//! coordinator is its only writer; the index builder reads it once the crawl
//! has finished.

mod record;

pub use record::{Endpoint, PageRecord};

use crate::{Result, ScraperError};
use std::collections::HashMap;

/// Ordered collection of accepted pages, keyed by visit order
#[derive(Debug, Default, Clone)]
pub struct ContentRepository {
    records: Vec<PageRecord>,
    /// Lowercased output path -> index into `records`
    by_path: HashMap<String, usize>,
}

impl ContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Record stored
    /// * `Err(ScraperError::VisitOrder)` - `visit_order` is not the next rank
    /// * `Err(ScraperError::DuplicateOutputPath)` - Another record owns the path
    pub fn push(&mut self, record: PageRecord) -> Result<()> {
        let expected = self.records.len();
        if record.visit_order != expected {
            return Err(ScraperError::VisitOrder {
                expected,
                actual: record.visit_order,
            });
        }

        let key = path_key(&record.output_path);
        if self.by_path.contains_key(&key) {
            return Err(ScraperError::DuplicateOutputPath(record.output_path));
        }

        self.by_path.insert(key, expected);
        self.records.push(record);
        Ok(())
    }

    /// Looks up a record by output path, ignoring case
    pub fn find_by_path(&self, output_path: &str) -> Option<&PageRecord> {
        self.by_path
            .get(&path_key(output_path))
            .map(|&index| &self.records[index])
    }

    pub fn contains_path(&self, output_path: &str) -> bool {
        self.by_path.contains_key(&path_key(output_path))
    }

    /// Records in visit order
    pub fn iter(&self) -> impl Iterator<Item = &PageRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[PageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records produced by fallback conversion
    pub fn degraded_count(&self) -> usize {
        self.records.iter().filter(|r| r.degraded).count()
    }
}

impl<'a> IntoIterator for &'a ContentRepository {
    type Item = &'a PageRecord;
    type IntoIter = std::slice::Iter<'a, PageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn path_key(output_path: &str) -> String {
    output_path.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(order: usize, path: &str) -> PageRecord {
        PageRecord {
            source_url: format!("https://x.test/{}", order),
            fragment: None,
            title: format!("Page {}", order),
            markdown_body: "Body text".to_string(),
            output_path: path.to_string(),
            is_fragment: false,
            word_count: 2,
            estimated_read_minutes: 1,
            first_h2_heading: None,
            detected_endpoints: Vec::new(),
            visit_order: order,
            depth: 0,
            summary: None,
            degraded: false,
        }
    }

    #[test]
    fn test_push_in_order() {
        let mut repo = ContentRepository::new();
        repo.push(record(0, "root.md")).unwrap();
        repo.push(record(1, "docs/intro.md")).unwrap();

        assert_eq!(repo.len(), 2);
        let orders: Vec<usize> = repo.iter().map(|r| r.visit_order).collect();
        assert_eq!(orders, vec![0, 1]);
    }

    #[test]
    fn test_rejects_gap_in_visit_order() {
        let mut repo = ContentRepository::new();
        repo.push(record(0, "root.md")).unwrap();
        let result = repo.push(record(2, "b.md"));
        assert!(matches!(
            result,
            Err(ScraperError::VisitOrder {
                expected: 1,
                actual: 2
            })
        ));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_rejects_duplicate_path_case_insensitively() {
        let mut repo = ContentRepository::new();
        repo.push(record(0, "docs/Intro.md")).unwrap();
        let result = repo.push(record(1, "docs/intro.md"));
        assert!(matches!(result, Err(ScraperError::DuplicateOutputPath(_))));
    }

    #[test]
    fn test_find_by_path() {
        let mut repo = ContentRepository::new();
        repo.push(record(0, "docs/Intro.md")).unwrap();

        assert_eq!(repo.find_by_path("docs/intro.md").unwrap().visit_order, 0);
        assert!(repo.contains_path("DOCS/INTRO.md"));
        assert!(repo.find_by_path("docs/other.md").is_none());
    }

    #[test]
    fn test_degraded_count() {
        let mut repo = ContentRepository::new();
        repo.push(record(0, "a.md")).unwrap();
        let mut degraded = record(1, "b.md");
        degraded.degraded = true;
        repo.push(degraded).unwrap();
        assert_eq!(repo.degraded_count(), 1);
    }
}
