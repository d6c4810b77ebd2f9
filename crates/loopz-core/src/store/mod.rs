//! In-memory stores for loops and tasks.
//!
//! Each store is a service object holding the latest known records of the
//! signed-in user. Reads are served from memory; writes are applied to
//! memory and to the [`Persistence`](crate::persistence::Persistence)
//! collaborator. Both stores expose the same observable state:
//!
//! - `is_loading()`: at least one operation is in flight
//! - `error()`: message of the last collaborator failure, cleared when the
//!   next operation starts
//!
//! Fetches are tagged with a sequence number. A fetch result is applied
//! only when no newer fetch or write has been applied in the meantime, so a
//! slow response can never overwrite fresher data.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use log::warn;

use crate::error::{LoopzError, Result};

mod loops;
mod tasks;

pub use loops::LoopStore;
pub use tasks::TaskStore;

/// Marks one operation as in flight for as long as it is alive.
struct Busy<'a>(&'a AtomicUsize);

impl<'a> Busy<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Monotonic source of fetch and write sequence numbers.
#[derive(Debug, Default)]
struct Sequence(AtomicU64);

impl Sequence {
    fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Trims a title and rejects it when nothing is left.
fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(LoopzError::invalid_input("title").with_reason("Title cannot be empty"));
    }
    Ok(trimmed.to_string())
}

/// Normalizes an optional description; blank text counts as absent.
fn clean_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(String::from)
}

/// Logs a collaborator failure and returns the message kept in the
/// store's error state.
fn failure_message(context: &str, error: &LoopzError) -> String {
    warn!("{context}: {error}");
    error.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title_trims() {
        assert_eq!(validate_title("  Read a book ").ok().as_deref(), Some("Read a book"));
        assert!(validate_title("").is_err());
        assert!(validate_title(" \t\n").is_err());
    }

    #[test]
    fn test_blank_description_is_absent() {
        assert_eq!(clean_description(Some("   ")), None);
        assert_eq!(clean_description(None), None);
        assert_eq!(clean_description(Some(" notes ")).as_deref(), Some("notes"));
    }

    #[test]
    fn test_busy_guard_counts_nested_operations() {
        let counter = AtomicUsize::new(0);
        {
            let _outer = Busy::enter(&counter);
            let _inner = Busy::enter(&counter);
            assert_eq!(counter.load(Ordering::SeqCst), 2);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let sequence = Sequence::default();
        let first = sequence.next();
        assert!(sequence.next() > first);
    }
}
