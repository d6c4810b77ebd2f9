//! Display formatting for loops, tasks and the conversation.
//!
//! Domain models implement `Display` directly (see [`models`]); groups of
//! records and operation outcomes are formatted through small wrapper types
//! so the same markdown reaches every output context.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │ Wrappers        │    │   Markdown      │
//! │  (Loop, Task)   │───▶│ (LoopOverview,  │───▶│  (termimad or   │
//! │                 │    │  CreateResult)  │    │   plain text)   │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`collections`]: [`LoopOverview`], [`TaskList`], [`Transcript`]
//! - [`results`]: [`CreateResult`], [`UpdateResult`], [`DeleteResult`]
//! - [`status`]: [`OperationStatus`]
//! - [`datetime`]: [`LocalDateTime`]
//! - [`models`]: `Display` for the records plus [`ProgressBar`]
//!
//! # Examples
//!
//! ```rust
//! use loopz_core::display::OperationStatus;
//!
//! let status = OperationStatus::success("Loop archived");
//! assert_eq!(status.to_string(), "Success: Loop archived\n");
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;
pub mod status;

pub use collections::{LoopOverview, TaskList, Transcript};
pub use datetime::LocalDateTime;
pub use models::ProgressBar;
pub use results::{CreateResult, DeleteResult, UpdateResult};
pub use status::{OperationStatus, StatusKind};
