use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of a guide within one image session.
///
/// Survives moves, lock changes and undo/redo of its deletion, so the UI can keep
/// a selection pointing at the same guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuideId(Uuid);

impl GuideId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GuideId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GuideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The short form is enough to tell guides apart in logs
        write!(f, "{}", &self.0.simple().to_string()[..8])
    }
}

/// A horizontal line at an image-space Y coordinate marking a slice boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub id: GuideId,
    /// Y coordinate in image pixels, always within `[0, image_height]`
    pub position: f64,
    pub locked: bool,
}

impl Guide {
    /// Creates a new unlocked guide with a fresh identity
    pub fn new(position: f64) -> Self {
        Self {
            id: GuideId::new(),
            position,
            locked: false,
        }
    }
}

/// Sorts guides ascending by position.
pub fn sort_by_position(guides: &mut [Guide]) {
    guides.sort_by(|a, b| a.position.total_cmp(&b.position));
}
