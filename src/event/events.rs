use std::path::PathBuf;

use crate::export::ExportReport;
use crate::geometry::SnapMode;
use crate::guide::{Guide, GuideId};

/// Describes the open image, for title bars and status lines.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportProgress {
    /// Slices handled so far, successful or not
    pub done: usize,
    pub total: usize,
}

impl ExportProgress {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.done as f32 / self.total as f32
        }
    }
}

#[derive(Debug, Clone)]
pub enum SlicerEvent {
    /// An image was opened (`Some`) or closed (`None`)
    SessionChanged(Option<SessionInfo>),
    /// The guide set changed; carries the new sorted snapshot
    GuidesChanged(Vec<Guide>),
    SelectionChanged(Option<GuideId>),
    HistoryChanged {
        can_undo: bool,
        can_redo: bool,
    },
    SnapModeChanged(SnapMode),
    ExportProgress(ExportProgress),
    /// The export ran to completion or was cancelled; per-slice failures are in the report
    ExportFinished(ExportReport),
    /// The export could not start writing at all
    ExportFailed(String),
    /// Short user-facing feedback line
    Status(String),
}
