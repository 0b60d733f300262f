use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, ImageFormat};

use crate::codec::DecodedImage;
use crate::command::{Command, CommandHistory, CommandResult};
use crate::event::SessionInfo;
use crate::geometry::SnapMode;
use crate::guide::{Guide, GuideId};
use crate::store::GuideStore;

/// Everything tied to the currently open image. Dropped wholesale when another
/// image is opened, so history never crosses images.
#[derive(Debug)]
pub struct ImageSession {
    image: Arc<DynamicImage>,
    source_path: PathBuf,
    source_format: Option<ImageFormat>,
    store: GuideStore,
    history: CommandHistory,
    selected: Option<GuideId>,
}

impl ImageSession {
    pub fn new(source_path: PathBuf, decoded: DecodedImage, snap_mode: SnapMode) -> Self {
        let store = GuideStore::new(decoded.height(), snap_mode);
        Self {
            image: Arc::new(decoded.pixels),
            source_path,
            source_format: decoded.format,
            store,
            history: CommandHistory::new(),
            selected: None,
        }
    }

    pub fn image(&self) -> &Arc<DynamicImage> {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn source_format(&self) -> Option<ImageFormat> {
        self.source_format
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            path: self.source_path.clone(),
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn store(&self) -> &GuideStore {
        &self.store
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    /// Sorted guide snapshot
    pub fn guides(&self) -> Vec<Guide> {
        self.store.snapshot()
    }

    pub fn selected(&self) -> Option<GuideId> {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, selected: Option<GuideId>) {
        self.selected = selected;
    }

    pub(crate) fn set_snap_mode(&mut self, mode: SnapMode) {
        self.store.set_snap_mode(mode);
    }

    pub(crate) fn execute(&mut self, command: Command) -> CommandResult {
        self.history.execute(command, &mut self.store)
    }

    pub(crate) fn undo(&mut self) -> CommandResult<Command> {
        self.history.undo(&mut self.store)
    }

    pub(crate) fn redo(&mut self) -> CommandResult<Command> {
        self.history.redo(&mut self.store)
    }
}
