//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the stamping core and an
//! external system (filesystem, git). Implementations live in `src/adapters/`.

pub mod filesystem;
pub mod git;

pub use filesystem::{FileSystem, FileTimes};
pub use git::{GitHistory, HistoryError};
