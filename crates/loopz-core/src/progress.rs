//! Progress calculation for loops.
//!
//! Progress comes from one of two places: the denormalized step counters
//! kept on the loop record (fast path), or a live list of the loop's tasks.
//! A loop carrying both counters is measured by them; the task list is the
//! fallback for records without counters. The source is picked once as a
//! [`ProgressSource`] instead of being re-inferred by every calculation.

use crate::models::{Loop, LoopWithProgress, Task};

/// Where a progress percentage is computed from.
#[derive(Debug, Clone, Copy)]
pub enum ProgressSource<'a> {
    /// Stored counters; `None` totals count as zero
    Counters {
        total: Option<u32>,
        completed: Option<u32>,
    },
    /// Live tasks of the loop
    TaskList(&'a [Task]),
}

impl<'a> ProgressSource<'a> {
    /// Counters carried on the loop record.
    pub fn counters(record: &Loop) -> Self {
        ProgressSource::Counters {
            total: record.total_steps,
            completed: record.completed_steps,
        }
    }

    /// Stored counters when the loop carries both, otherwise the supplied
    /// tasks. Without either, the (absent) counters yield zero.
    pub fn for_loop(record: &Loop, tasks: Option<&'a [Task]>) -> Self {
        match (record.counters(), tasks) {
            (Some(_), _) | (None, None) => Self::counters(record),
            (None, Some(tasks)) => ProgressSource::TaskList(tasks),
        }
    }

    /// `(total, completed)` step counts for this source.
    pub fn steps(&self) -> (u32, u32) {
        match *self {
            ProgressSource::Counters { total, completed } => {
                let total = total.unwrap_or(0);
                (total, completed.unwrap_or(0).min(total))
            }
            ProgressSource::TaskList(tasks) => {
                let completed = tasks.iter().filter(|task| task.is_completed()).count();
                (
                    u32::try_from(tasks.len()).unwrap_or(u32::MAX),
                    u32::try_from(completed).unwrap_or(u32::MAX),
                )
            }
        }
    }

    /// Percentage complete in `[0, 100]`.
    pub fn percent(&self) -> u8 {
        let (total, completed) = self.steps();
        percent_of(completed, total)
    }
}

/// `round(100 * completed / total)`, rounding half away from zero.
///
/// Returns 0 when `total` is 0 and never exceeds 100.
///
/// # Examples
///
/// ```rust
/// use loopz_core::progress::percent_of;
///
/// assert_eq!(percent_of(1, 3), 33);
/// assert_eq!(percent_of(2, 3), 67);
/// assert_eq!(percent_of(1, 8), 13);
/// assert_eq!(percent_of(5, 0), 0);
/// ```
pub fn percent_of(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = u64::from(completed.min(total));
    let total = u64::from(total);
    // Integer form of round-half-up on a non-negative ratio
    let percent = (200 * completed + total) / (2 * total);
    u8::try_from(percent.min(100)).unwrap_or(100)
}

/// Progress of a loop from its counters or, lacking them, the given tasks.
pub fn progress(record: &Loop, tasks: Option<&[Task]>) -> u8 {
    ProgressSource::for_loop(record, tasks).percent()
}

impl LoopWithProgress {
    /// Joins a loop with progress from its stored counters, falling back to
    /// `tasks` for records that carry none.
    pub fn new(record: Loop, tasks: Option<&[Task]>) -> Self {
        let source = ProgressSource::for_loop(&record, tasks);
        let (total_steps, completed_steps) = source.steps();
        Self {
            percent: source.percent(),
            total_steps,
            completed_steps,
            record,
        }
    }
}
