use super::Replay;
use crate::error::GuideError;
use crate::guide::{Guide, GuideId};
use crate::store::{GuideStore, LockCheck};

/// A self-contained, invertible change to the guide store.
///
/// Each variant carries the state it needs to undo itself exactly, so history can
/// be replayed even after the snap mode changes.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Insert a guide at an already-resolved position
    AddGuide { guide: Guide },

    /// Reposition a guide
    MoveGuide { id: GuideId, from: f64, to: f64 },

    /// Remove a guide, remembering it for undo
    DeleteGuide { id: GuideId, saved: Guide },

    /// Change a guide's lock flag
    SetLock { id: GuideId, from: bool, to: bool },

    /// Remove every guide as one step
    ClearGuides { saved: Vec<Guide> },
}

impl Command {
    /// Applies the forward effect. On error the store is unchanged.
    pub fn apply(&self, store: &mut GuideStore, replay: Replay) -> Result<(), GuideError> {
        match self {
            Command::AddGuide { guide } => store.insert(*guide),
            Command::MoveGuide { id, to, .. } => {
                let lock = match replay {
                    Replay::No => LockCheck::Enforce,
                    Replay::Yes => LockCheck::Bypass,
                };
                store.place(*id, *to, lock)
            }
            Command::DeleteGuide { id, .. } => store.delete(*id).map(|_| ()),
            Command::SetLock { id, to, .. } => store.set_lock(*id, *to),
            Command::ClearGuides { .. } => {
                store.replace_all(Vec::new());
                Ok(())
            }
        }
    }

    /// Applies the inverse effect. Never subject to the lock check.
    pub fn revert(&self, store: &mut GuideStore) -> Result<(), GuideError> {
        match self {
            Command::AddGuide { guide } => store.delete(guide.id).map(|_| ()),
            Command::MoveGuide { id, from, .. } => store.place(*id, *from, LockCheck::Bypass),
            Command::DeleteGuide { saved, .. } => store.insert(*saved),
            Command::SetLock { id, from, .. } => store.set_lock(*id, *from),
            Command::ClearGuides { saved } => {
                store.replace_all(saved.clone());
                Ok(())
            }
        }
    }

    /// Human readable name for history lists
    pub fn label(&self) -> &'static str {
        match self {
            Command::AddGuide { .. } => "Add guide",
            Command::MoveGuide { .. } => "Move guide",
            Command::DeleteGuide { .. } => "Delete guide",
            Command::SetLock { to: true, .. } => "Lock guide",
            Command::SetLock { to: false, .. } => "Unlock guide",
            Command::ClearGuides { .. } => "Clear guides",
        }
    }

    /// The single guide this command touches, if any
    pub fn target(&self) -> Option<GuideId> {
        match self {
            Command::AddGuide { guide } => Some(guide.id),
            Command::MoveGuide { id, .. }
            | Command::DeleteGuide { id, .. }
            | Command::SetLock { id, .. } => Some(*id),
            Command::ClearGuides { .. } => None,
        }
    }
}
