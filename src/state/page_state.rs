/// Page state definitions for tracking crawl progress
///
/// Every dequeued URL that is not a duplicate ends in one terminal state,
/// which is reported in the export summary.
use std::fmt;

/// Represents the current state of a page in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageState {
    // ===== Active States =====
    /// Page is in the frontier waiting to be dequeued
    Queued,

    /// Page has been dispatched to a worker
    Extracting,

    // ===== Terminal Success States =====
    /// Page was rendered and written to the export
    Exported,

    /// Renderer failed; page was exported from fallback conversion
    Degraded,

    // ===== Terminal Skip States =====
    /// Scheme, host or path prefix excluded the page
    OutOfScope,

    /// robots.txt disallows the page for our user agent
    RobotsDenied,

    /// Page budget was exhausted before the page could be accepted
    BudgetExhausted,

    // ===== Terminal Error States =====
    /// Renderer and raw fetch both failed
    Failed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if this is an active state (page may still be processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Extracting)
    }

    /// Returns true if the page produced a file in the export
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Exported | Self::Degraded)
    }

    /// Returns true if the page was deliberately not visited
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            Self::OutOfScope | Self::RobotsDenied | Self::BudgetExhausted
        )
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Stable lowercase name used in logs and the export summary
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Extracting => "extracting",
            Self::Exported => "exported",
            Self::Degraded => "degraded",
            Self::OutOfScope => "out_of_scope",
            Self::RobotsDenied => "robots_denied",
            Self::BudgetExhausted => "budget_exhausted",
            Self::Failed => "failed",
        }
    }

    /// Parses a page state from its string representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "extracting" => Some(Self::Extracting),
            "exported" => Some(Self::Exported),
            "degraded" => Some(Self::Degraded),
            "out_of_scope" => Some(Self::OutOfScope),
            "robots_denied" => Some(Self::RobotsDenied),
            "budget_exhausted" => Some(Self::BudgetExhausted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Queued,
            Self::Extracting,
            Self::Exported,
            Self::Degraded,
            Self::OutOfScope,
            Self::RobotsDenied,
            Self::BudgetExhausted,
            Self::Failed,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
