use crate::{Result, ScraperError};
use std::fmt;

/// Lifecycle of a single crawl run
///
/// `Idle -> Running -> Completed` for a normal run; `Idle -> Aborted` when the
/// seeds are unusable, `Running -> Aborted` when a worker dies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Idle,
    Running,
    Completed,
    Aborted,
}

impl CrawlPhase {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }

    fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Aborted)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Aborted)
        )
    }

    /// Moves to `next`, rejecting transitions the lifecycle does not allow
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlPhase)` - The new phase
    /// * `Err(ScraperError::InvalidTransition)` - The transition is illegal
    pub fn transition(&mut self, next: CrawlPhase) -> Result<CrawlPhase> {
        if !self.can_transition_to(next) {
            return Err(ScraperError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        tracing::debug!("Crawl phase {} -> {}", self, next);
        *self = next;
        Ok(next)
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_lifecycle() {
        let mut phase = CrawlPhase::Idle;
        assert_eq!(phase.transition(CrawlPhase::Running).unwrap(), CrawlPhase::Running);
        assert_eq!(phase.transition(CrawlPhase::Completed).unwrap(), CrawlPhase::Completed);
        assert!(phase.is_finished());
    }

    #[test]
    fn test_abort_before_running() {
        let mut phase = CrawlPhase::Idle;
        assert!(phase.transition(CrawlPhase::Aborted).is_ok());
        assert!(phase.is_finished());
    }

    #[test]
    fn test_illegal_transitions() {
        let mut phase = CrawlPhase::Idle;
        assert!(matches!(
            phase.transition(CrawlPhase::Completed),
            Err(ScraperError::InvalidTransition { .. })
        ));
        assert_eq!(phase, CrawlPhase::Idle);

        let mut done = CrawlPhase::Completed;
        assert!(done.transition(CrawlPhase::Running).is_err());
        assert!(done.transition(CrawlPhase::Aborted).is_err());
    }
}
