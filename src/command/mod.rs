//! Reversible guide edits and the linear undo/redo history that records them.

mod commands;
mod history;

pub use commands::Command;
pub use history::CommandHistory;

use crate::error::SlicerError;

/// Result type for command operations
pub type CommandResult<T = ()> = Result<T, SlicerError>;

/// Whether a command is being applied for the first time or replayed by redo.
///
/// Replays restore recorded state and are not subject to the lock check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    No,
    Yes,
}
