//! The authoritative set of guides for the open image.
//!
//! Every position that enters the store goes through [`GuideStore::resolve`]: it is
//! snapped with the session's [`SnapMode`], then clamped to `[0, image_height]`.
//! Two guides never share a resolved position, which keeps slices non-degenerate
//! and guide identity unambiguous for selection.
//!
//! The public edit methods (`add`, `move_guide`, `delete`, `set_lock`) are the
//! user-facing operations with full validation. The crate-internal replay helpers
//! are used by [`crate::command::Command`] to apply and invert recorded edits; they
//! skip snapping (positions were resolved when the command was recorded) and may
//! bypass the lock check.

use crate::error::GuideError;
use crate::geometry::{SnapMode, clamp, snap};
use crate::guide::{Guide, GuideId, sort_by_position};

/// Whether an edit honours a guide's lock flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LockCheck {
    Enforce,
    Bypass,
}

#[derive(Debug, Clone)]
pub struct GuideStore {
    guides: Vec<Guide>,
    image_height: f64,
    snap_mode: SnapMode,
}

impl GuideStore {
    pub fn new(image_height: u32, snap_mode: SnapMode) -> Self {
        Self {
            guides: Vec::new(),
            image_height: f64::from(image_height),
            snap_mode,
        }
    }

    pub fn image_height(&self) -> f64 {
        self.image_height
    }

    pub fn snap_mode(&self) -> SnapMode {
        self.snap_mode
    }

    /// Affects only positions resolved from now on; existing guides are not re-snapped.
    pub fn set_snap_mode(&mut self, mode: SnapMode) {
        self.snap_mode = mode;
    }

    pub fn len(&self) -> usize {
        self.guides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guides.is_empty()
    }

    pub fn get(&self, id: GuideId) -> Option<&Guide> {
        self.guides.iter().find(|g| g.id == id)
    }

    pub fn contains(&self, id: GuideId) -> bool {
        self.get(id).is_some()
    }

    /// Snaps then clamps a raw coordinate. Non-finite input is rejected.
    pub fn resolve(&self, raw_y: f64) -> Result<f64, GuideError> {
        if !raw_y.is_finite() {
            return Err(GuideError::InvalidPosition(raw_y));
        }
        let position = clamp(snap(raw_y, self.snap_mode), 0.0, self.image_height);
        // Rounding a small negative value yields -0.0; store the positive zero
        Ok(position + 0.0)
    }

    /// Guides sorted ascending by position. Computed on every call.
    pub fn snapshot(&self) -> Vec<Guide> {
        let mut guides = self.guides.clone();
        sort_by_position(&mut guides);
        guides
    }

    /// Sorted positions only, as consumed by the slicing engine
    pub fn positions(&self) -> Vec<f64> {
        self.snapshot().iter().map(|g| g.position).collect()
    }

    pub fn add(&mut self, raw_y: f64) -> Result<GuideId, GuideError> {
        let guide = Guide::new(self.resolve(raw_y)?);
        self.insert(guide)?;
        Ok(guide.id)
    }

    pub fn move_guide(&mut self, id: GuideId, raw_y: f64) -> Result<(), GuideError> {
        let position = self.resolve(raw_y)?;
        self.place(id, position, LockCheck::Enforce)
    }

    pub fn delete(&mut self, id: GuideId) -> Result<Guide, GuideError> {
        let index = self.index_of(id)?;
        Ok(self.guides.remove(index))
    }

    pub fn set_lock(&mut self, id: GuideId, locked: bool) -> Result<(), GuideError> {
        let index = self.index_of(id)?;
        self.guides[index].locked = locked;
        Ok(())
    }

    /// Inserts a fully-formed guide, keeping its identity.
    pub(crate) fn insert(&mut self, guide: Guide) -> Result<(), GuideError> {
        debug_assert!(!self.contains(guide.id), "guide {} inserted twice", guide.id);
        self.ensure_free(guide.position, None)?;
        self.guides.push(guide);
        Ok(())
    }

    /// Sets an already-resolved position.
    pub(crate) fn place(
        &mut self,
        id: GuideId,
        position: f64,
        lock: LockCheck,
    ) -> Result<(), GuideError> {
        let index = self.index_of(id)?;
        if lock == LockCheck::Enforce && self.guides[index].locked {
            return Err(GuideError::Locked(id));
        }
        self.ensure_free(position, Some(id))?;
        self.guides[index].position = position;
        Ok(())
    }

    /// Replaces the whole set. Used by clear and its inverse.
    pub(crate) fn replace_all(&mut self, guides: Vec<Guide>) {
        self.guides = guides;
    }

    fn index_of(&self, id: GuideId) -> Result<usize, GuideError> {
        self.guides
            .iter()
            .position(|g| g.id == id)
            .ok_or(GuideError::NotFound(id))
    }

    fn ensure_free(&self, position: f64, ignore: Option<GuideId>) -> Result<(), GuideError> {
        let taken = self
            .guides
            .iter()
            .any(|g| Some(g.id) != ignore && g.position == position);
        if taken {
            Err(GuideError::DuplicatePosition { position })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> GuideStore {
        GuideStore::new(100, SnapMode::Pixel)
    }

    #[test]
    fn test_add_snaps_and_clamps() {
        let mut store = store();
        let a = store.add(17.4).unwrap();
        let b = store.add(-5.0).unwrap();
        let c = store.add(240.0).unwrap();

        assert_eq!(store.get(a).unwrap().position, 17.0);
        assert_eq!(store.get(b).unwrap().position, 0.0);
        assert_eq!(store.get(c).unwrap().position, 100.0);
    }

    #[test]
    fn test_small_negatives_resolve_to_positive_zero() {
        let mut store = store();
        assert!(store.resolve(-0.3).unwrap().is_sign_positive());

        let mut grid = GuideStore::new(100, SnapMode::grid(10).unwrap());
        assert!(grid.resolve(-2.0).unwrap().is_sign_positive());

        let id = store.add(-0.3).unwrap();
        assert_eq!(format!("{}", store.get(id).unwrap().position), "0");
        assert!(grid.add(-0.0).is_ok());
    }

    #[test]
    fn test_duplicate_is_checked_after_snapping() {
        let mut store = GuideStore::new(100, SnapMode::grid(10).unwrap());
        store.add(17.0).unwrap();
        let before = store.snapshot();

        let err = store.add(22.0).unwrap_err();
        assert_eq!(err, GuideError::DuplicatePosition { position: 20.0 });
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_non_finite_positions_are_rejected() {
        let mut store = store();
        assert!(matches!(
            store.add(f64::NAN),
            Err(GuideError::InvalidPosition(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_move_rules() {
        let mut store = store();
        let a = store.add(10.0).unwrap();
        let b = store.add(40.0).unwrap();

        assert_eq!(
            store.move_guide(a, 40.2),
            Err(GuideError::DuplicatePosition { position: 40.0 })
        );
        store.move_guide(a, 25.0).unwrap();
        assert_eq!(store.get(a).unwrap().position, 25.0);

        store.set_lock(b, true).unwrap();
        let before = store.snapshot();
        assert_eq!(store.move_guide(b, 60.0), Err(GuideError::Locked(b)));
        assert_eq!(store.snapshot(), before);

        let missing = GuideId::new();
        assert_eq!(store.move_guide(missing, 5.0), Err(GuideError::NotFound(missing)));
    }

    #[test]
    fn test_delete_and_lock_unknown_ids() {
        let mut store = store();
        let missing = GuideId::new();
        assert_eq!(store.delete(missing), Err(GuideError::NotFound(missing)));
        assert_eq!(store.set_lock(missing, true), Err(GuideError::NotFound(missing)));
    }

    #[test]
    fn test_locked_guides_can_be_deleted() {
        let mut store = store();
        let a = store.add(10.0).unwrap();
        store.set_lock(a, true).unwrap();
        let removed = store.delete(a).unwrap();
        assert!(removed.locked);
        assert!(store.is_empty());
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let mut store = store();
        store.add(80.0).unwrap();
        store.add(5.0).unwrap();
        let mid = store.add(50.0).unwrap();
        store.move_guide(mid, 1.0).unwrap();

        assert_eq!(store.positions(), vec![1.0, 5.0, 80.0]);
    }

    #[test]
    fn test_snap_mode_change_is_not_retroactive() {
        let mut store = GuideStore::new(100, SnapMode::Off);
        let a = store.add(12.3).unwrap();
        store.set_snap_mode(SnapMode::grid(10).unwrap());
        assert_eq!(store.get(a).unwrap().position, 12.3);
        let b = store.add(12.3).unwrap();
        assert_eq!(store.get(b).unwrap().position, 10.0);
    }
}
