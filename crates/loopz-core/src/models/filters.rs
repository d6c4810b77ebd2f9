//! Filter types for querying loops.

use jiff::Timestamp;

use super::{Loop, LoopStatus};

/// Filter options for querying loops.
#[derive(Debug, Clone, Default)]
pub struct LoopFilter {
    /// Filter by loop title (case-insensitive partial match)
    pub title_contains: Option<String>,

    /// Filter by creation date range
    pub created_after: Option<Timestamp>,
    pub created_before: Option<Timestamp>,

    /// Filter by loop status.
    /// If None, archived loops are hidden unless `include_archived` is set
    pub status: Option<LoopStatus>,

    /// Show archived loops alongside the others
    pub include_archived: bool,
}

impl LoopFilter {
    /// Filter matching only loops with the given status.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use loopz_core::models::{LoopFilter, LoopStatus};
    ///
    /// let filter = LoopFilter::with_status(LoopStatus::Archived);
    /// assert_eq!(filter.status, Some(LoopStatus::Archived));
    /// assert!(filter.include_archived);
    /// ```
    pub fn with_status(status: LoopStatus) -> Self {
        Self {
            status: Some(status),
            include_archived: status == LoopStatus::Archived,
            ..Default::default()
        }
    }

    /// Filter matching every loop regardless of status.
    pub fn all() -> Self {
        Self {
            include_archived: true,
            ..Default::default()
        }
    }

    /// Whether a loop passes every configured criterion.
    pub fn matches(&self, record: &Loop) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        } else if !self.include_archived && record.status == LoopStatus::Archived {
            return false;
        }

        if let Some(needle) = &self.title_contains {
            if !record
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }

        if let Some(after) = self.created_after {
            if record.created_at < after {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if record.created_at > before {
                return false;
            }
        }

        true
    }
}
