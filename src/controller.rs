//! The composition root. Owns the open [`ImageSession`] and any running export,
//! routes every guide edit through the command history, and notifies subscribers
//! synchronously after each committed change.

use std::path::{Path, PathBuf};

use crate::codec::{self, DecodedImage};
use crate::command::{Command, CommandHistory};
use crate::error::{ConfigError, GuideError, SlicerError, SlicerResult, StateError};
use crate::event::{EventBus, EventHandler, ExportProgress, SessionInfo, SlicerEvent, SubscriptionId};
use crate::export::{
    ExportFormat, ExportJob, ExportMessage, ExportReport, Naming, compute_slices,
};
use crate::geometry::SnapMode;
use crate::guide::{Guide, GuideId};
use crate::session::ImageSession;
use crate::settings::Settings;
use crate::util::time;

/// Parameters for one export run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub destination: PathBuf,
    pub naming: Naming,
    /// Write straight into `destination` instead of a fresh timestamped sub-folder
    pub in_place: bool,
}

impl ExportRequest {
    pub fn new(format: ExportFormat, destination: impl Into<PathBuf>) -> Self {
        Self {
            format,
            destination: destination.into(),
            naming: Naming::default(),
            in_place: false,
        }
    }

    pub fn with_naming(mut self, naming: Naming) -> Self {
        self.naming = naming;
        self
    }

    pub fn in_place(mut self) -> Self {
        self.in_place = true;
        self
    }

    fn directory(&self) -> PathBuf {
        if self.in_place {
            self.destination.clone()
        } else {
            self.destination.join(time::export_folder_name())
        }
    }
}

#[derive(Debug, Default)]
pub struct Controller {
    session: Option<ImageSession>,
    snap_mode: SnapMode,
    bus: EventBus,
    export: Option<ExportJob>,
}

impl Controller {
    pub fn new(snap_mode: SnapMode) -> Self {
        Self {
            snap_mode,
            ..Default::default()
        }
    }

    /// Reads the initial snap configuration. Settings are never written back from here.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self::new(settings.snap_mode()?))
    }

    pub fn subscribe(&mut self, handler: impl EventHandler + 'static) -> SubscriptionId {
        self.bus.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn session(&self) -> Option<&ImageSession> {
        self.session.as_ref()
    }

    pub fn history(&self) -> Option<&CommandHistory> {
        self.session.as_ref().map(ImageSession::history)
    }

    /// Sorted guides of the open image; empty when nothing is open
    pub fn guides(&self) -> Vec<Guide> {
        self.session
            .as_ref()
            .map(ImageSession::guides)
            .unwrap_or_default()
    }

    pub fn selected(&self) -> Option<GuideId> {
        self.session.as_ref().and_then(ImageSession::selected)
    }

    pub fn snap_mode(&self) -> SnapMode {
        self.snap_mode
    }

    pub fn can_undo(&self) -> bool {
        self.history().is_some_and(CommandHistory::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.history().is_some_and(CommandHistory::can_redo)
    }

    pub fn is_exporting(&self) -> bool {
        self.export.is_some()
    }

    pub fn export_progress(&self) -> Option<ExportProgress> {
        self.export.as_ref().map(ExportJob::progress)
    }

    // --- Session lifecycle ---

    /// Decodes `path` on the calling thread and makes it the open image.
    pub fn open_image(&mut self, path: impl AsRef<Path>) -> SlicerResult<SessionInfo> {
        self.ensure_idle()?;
        let path = path.as_ref();
        let decoded = codec::decode(path).inspect_err(|err| {
            self.bus.emit(SlicerEvent::Status(err.to_string()));
        })?;
        self.open_decoded(path.to_path_buf(), decoded)
    }

    /// Installs an image decoded elsewhere, replacing the current session and its history.
    pub fn open_decoded(&mut self, path: PathBuf, decoded: DecodedImage) -> SlicerResult<SessionInfo> {
        self.ensure_idle()?;
        let session = ImageSession::new(path, decoded, self.snap_mode);
        let info = session.info();
        if let Some(previous) = self.session.replace(session) {
            log::debug!("Discarding session for {}", previous.source_path().display());
        }
        log::info!(
            "Opened {} ({}x{})",
            info.path.display(),
            info.width,
            info.height
        );

        self.bus.emit(SlicerEvent::SessionChanged(Some(info.clone())));
        self.notify_session_reset();
        self.status(format!(
            "Loaded {} ({}x{})",
            display_name(&info.path),
            info.width,
            info.height
        ));
        Ok(info)
    }

    /// Drops the open image and its history. Closing when nothing is open is a no-op.
    pub fn close_image(&mut self) -> SlicerResult<()> {
        self.ensure_idle()?;
        if let Some(session) = self.session.take() {
            log::info!("Closed {}", session.source_path().display());
            self.bus.emit(SlicerEvent::SessionChanged(None));
            self.notify_session_reset();
        }
        Ok(())
    }

    // --- Guide edits ---

    /// Adds a guide at the snapped and clamped `raw_y`; the new guide becomes selected.
    pub fn add_guide(&mut self, raw_y: f64) -> SlicerResult<GuideId> {
        self.ensure_idle()?;
        let session = self.active_session_mut()?;
        let guide = Guide::new(session.store().resolve(raw_y)?);
        if let Err(err) = session.execute(Command::AddGuide { guide }) {
            return Err(self.rejected(err));
        }
        session.set_selected(Some(guide.id));

        self.notify_edit();
        self.bus.emit(SlicerEvent::SelectionChanged(Some(guide.id)));
        Ok(guide.id)
    }

    /// Moving to the current position succeeds without recording anything.
    pub fn move_guide(&mut self, id: GuideId, raw_y: f64) -> SlicerResult<()> {
        self.ensure_idle()?;
        let session = self.active_session_mut()?;
        let store = session.store();
        let current = *store.get(id).ok_or(GuideError::NotFound(id))?;
        if current.locked {
            return Err(self.rejected(GuideError::Locked(id).into()));
        }
        let to = store.resolve(raw_y)?;
        if to == current.position {
            return Ok(());
        }
        let command = Command::MoveGuide {
            id,
            from: current.position,
            to,
        };
        if let Err(err) = session.execute(command) {
            return Err(self.rejected(err));
        }

        self.notify_edit();
        Ok(())
    }

    /// Deletes regardless of the lock flag.
    pub fn delete_guide(&mut self, id: GuideId) -> SlicerResult<()> {
        self.ensure_idle()?;
        let session = self.active_session_mut()?;
        let saved = *session.store().get(id).ok_or(GuideError::NotFound(id))?;
        session.execute(Command::DeleteGuide { id, saved })?;

        self.notify_edit();
        self.drop_stale_selection();
        Ok(())
    }

    pub fn set_lock(&mut self, id: GuideId, locked: bool) -> SlicerResult<()> {
        self.ensure_idle()?;
        let session = self.active_session_mut()?;
        let current = *session.store().get(id).ok_or(GuideError::NotFound(id))?;
        if current.locked == locked {
            return Ok(());
        }
        session.execute(Command::SetLock {
            id,
            from: current.locked,
            to: locked,
        })?;

        self.notify_edit();
        Ok(())
    }

    /// Removes every guide as one undoable step.
    pub fn clear_all_guides(&mut self) -> SlicerResult<()> {
        self.ensure_idle()?;
        let session = self.active_session_mut()?;
        if session.store().is_empty() {
            return Ok(());
        }
        let saved = session.guides();
        let count = saved.len();
        session.execute(Command::ClearGuides { saved })?;

        self.notify_edit();
        self.drop_stale_selection();
        self.status(format!("Cleared {count} guide(s)"));
        Ok(())
    }

    pub fn undo(&mut self) -> SlicerResult<()> {
        self.ensure_idle()?;
        let command = self.active_session_mut()?.undo()?;
        self.notify_edit();
        self.drop_stale_selection();
        self.status(format!("Undo: {}", command.label()));
        Ok(())
    }

    pub fn redo(&mut self) -> SlicerResult<()> {
        self.ensure_idle()?;
        let command = self.active_session_mut()?.redo()?;
        self.notify_edit();
        self.drop_stale_selection();
        self.status(format!("Redo: {}", command.label()));
        Ok(())
    }

    /// Selection is view state: not recorded and allowed during an export.
    pub fn select_guide(&mut self, id: Option<GuideId>) -> SlicerResult<()> {
        let session = self.active_session_mut()?;
        if let Some(id) = id {
            if !session.store().contains(id) {
                return Err(GuideError::NotFound(id).into());
            }
        }
        if session.selected() != id {
            session.set_selected(id);
            self.bus.emit(SlicerEvent::SelectionChanged(id));
        }
        Ok(())
    }

    // --- Configuration ---

    /// Applies to positions resolved from now on; existing guides keep their place.
    pub fn set_snap_mode(&mut self, mode: SnapMode) {
        if self.snap_mode == mode {
            return;
        }
        log::debug!("Snap mode: {mode}");
        self.snap_mode = mode;
        if let Some(session) = self.session.as_mut() {
            session.set_snap_mode(mode);
        }
        self.bus.emit(SlicerEvent::SnapModeChanged(mode));
    }

    /// Switches to grid snapping with the given spacing. Zero is rejected.
    pub fn set_grid_size(&mut self, size: u32) -> SlicerResult<()> {
        let mode = SnapMode::grid(size)?;
        self.set_snap_mode(mode);
        Ok(())
    }

    // --- Export ---

    /// Plans the slices from the current guides and starts writing them on a
    /// background thread. Returns the directory the files go to.
    pub fn request_export(&mut self, request: ExportRequest) -> SlicerResult<PathBuf> {
        self.ensure_idle()?;
        request.format.validate()?;
        let session = self.session.as_ref().ok_or(StateError::NoActiveSession)?;

        let plan = compute_slices(session.height(), &session.store().positions());
        let target = request
            .format
            .resolve(session.source_path(), session.source_format());
        let directory = request.directory();
        let total = plan.len();
        let skipped = plan.skipped;

        let job = ExportJob::spawn(
            session.image().clone(),
            plan,
            target,
            request.naming.clone(),
            directory.clone(),
        )?;
        self.export = Some(job);

        log::info!("Export started: {total} slice(s) into {}", directory.display());
        self.bus
            .emit(SlicerEvent::ExportProgress(ExportProgress { done: 0, total }));
        let mut message = format!("Exporting {total} slice(s)");
        if skipped > 0 {
            message.push_str(&format!(", skipping {skipped} empty"));
        }
        self.status(message);
        Ok(directory)
    }

    /// Forwards worker messages as events without blocking.
    ///
    /// Returns the outcome once the export has finished; `None` while it is still
    /// running or when no export was started.
    pub fn poll_export(&mut self) -> Option<SlicerResult<ExportReport>> {
        let messages = self.export.as_mut()?.poll();
        self.dispatch_export(messages)
    }

    /// Blocks until the running export finishes. `None` if there is none.
    pub fn wait_for_export(&mut self) -> Option<SlicerResult<ExportReport>> {
        let messages = self.export.as_mut()?.wait();
        self.dispatch_export(messages)
    }

    /// True after `cancel_export` until the running export reports back
    pub fn is_cancelling(&self) -> bool {
        self.export.as_ref().is_some_and(ExportJob::is_cancel_requested)
    }

    /// Asks the worker to stop after the slice it is writing. Returns false if idle.
    pub fn cancel_export(&mut self) -> bool {
        let Some(job) = &self.export else {
            return false;
        };
        job.cancel();
        self.status("Cancelling export".to_owned());
        true
    }

    fn dispatch_export(&mut self, messages: Vec<ExportMessage>) -> Option<SlicerResult<ExportReport>> {
        let mut outcome = None;
        for message in messages {
            match message {
                ExportMessage::Progress(progress) => {
                    self.bus.emit(SlicerEvent::ExportProgress(progress));
                }
                ExportMessage::Finished(result) => {
                    self.export = None;
                    outcome = Some(self.finish_export(result.map_err(SlicerError::from)));
                }
            }
        }
        outcome
    }

    fn finish_export(&mut self, result: SlicerResult<ExportReport>) -> SlicerResult<ExportReport> {
        match &result {
            Ok(report) => {
                log::info!("Export finished: {}", report.summary());
                self.bus.emit(SlicerEvent::ExportFinished(report.clone()));
                self.status(format!("Export: {}", report.summary()));
            }
            Err(err) => {
                log::error!("Export failed: {err}");
                self.bus.emit(SlicerEvent::ExportFailed(err.to_string()));
                self.status(format!("Export failed: {err}"));
            }
        }
        result
    }

    // --- Helpers ---

    fn ensure_idle(&self) -> Result<(), StateError> {
        if self.export.is_some() {
            return Err(StateError::ExportInProgress);
        }
        Ok(())
    }

    fn active_session_mut(&mut self) -> Result<&mut ImageSession, StateError> {
        self.session.as_mut().ok_or(StateError::NoActiveSession)
    }

    fn status(&mut self, message: String) {
        self.bus.emit(SlicerEvent::Status(message));
    }

    /// Turns validation failures into a status line before handing them back.
    fn rejected(&mut self, err: SlicerError) -> SlicerError {
        match &err {
            SlicerError::Guide(GuideError::DuplicatePosition { position }) => {
                self.status(format!("A guide already exists at y = {position}"));
            }
            SlicerError::Guide(GuideError::Locked(_)) => {
                self.status("Guide is locked".to_owned());
            }
            _ => {}
        }
        err
    }

    fn notify_edit(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let guides = session.guides();
        let history = session.history();
        let (can_undo, can_redo) = (history.can_undo(), history.can_redo());
        self.bus.emit(SlicerEvent::GuidesChanged(guides));
        self.bus
            .emit(SlicerEvent::HistoryChanged { can_undo, can_redo });
    }

    fn notify_session_reset(&mut self) {
        let guides = self.guides();
        self.bus.emit(SlicerEvent::GuidesChanged(guides));
        self.bus.emit(SlicerEvent::SelectionChanged(None));
        self.bus.emit(SlicerEvent::HistoryChanged {
            can_undo: false,
            can_redo: false,
        });
    }

    fn drop_stale_selection(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(selected) = session.selected() {
            if !session.store().contains(selected) {
                session.set_selected(None);
                self.bus.emit(SlicerEvent::SelectionChanged(None));
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbaImage};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn open(height: u32) -> Controller {
        let mut controller = Controller::default();
        let decoded = DecodedImage {
            pixels: DynamicImage::ImageRgba8(RgbaImage::new(4, height)),
            format: None,
        };
        controller
            .open_decoded(PathBuf::from("test.png"), decoded)
            .unwrap();
        controller
    }

    fn record(controller: &mut Controller) -> Rc<RefCell<Vec<SlicerEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        controller.subscribe(move |event: &SlicerEvent| sink.borrow_mut().push(event.clone()));
        events
    }

    #[test]
    fn test_edits_need_a_session() {
        let mut controller = Controller::default();
        assert!(matches!(
            controller.add_guide(10.0),
            Err(SlicerError::State(StateError::NoActiveSession))
        ));
        assert!(matches!(
            controller.undo(),
            Err(SlicerError::State(StateError::NoActiveSession))
        ));
        assert!(controller.guides().is_empty());
    }

    #[test]
    fn test_add_selects_new_guide() {
        let mut controller = open(100);
        let id = controller.add_guide(40.4).unwrap();
        assert_eq!(controller.selected(), Some(id));
        assert_eq!(controller.guides()[0].position, 40.0);
    }

    #[test]
    fn test_noop_edits_are_not_recorded() {
        let mut controller = open(100);
        let id = controller.add_guide(40.0).unwrap();
        let events = record(&mut controller);

        controller.move_guide(id, 40.2).unwrap();
        controller.set_lock(id, false).unwrap();
        assert_eq!(controller.history().unwrap().undo_stack().len(), 1);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_locked_guide_rejects_move_but_not_delete() {
        let mut controller = open(100);
        let id = controller.add_guide(40.0).unwrap();
        controller.set_lock(id, true).unwrap();

        assert!(matches!(
            controller.move_guide(id, 60.0),
            Err(SlicerError::Guide(GuideError::Locked(_)))
        ));
        assert_eq!(controller.guides()[0].position, 40.0);

        controller.delete_guide(id).unwrap();
        assert!(controller.guides().is_empty());
        assert_eq!(controller.selected(), None);
    }

    #[test]
    fn test_undo_of_add_clears_selection() {
        let mut controller = open(100);
        controller.add_guide(40.0).unwrap();
        let events = record(&mut controller);

        controller.undo().unwrap();
        assert_eq!(controller.selected(), None);
        let events = events.borrow();
        assert!(matches!(events[0], SlicerEvent::GuidesChanged(ref g) if g.is_empty()));
        assert!(matches!(
            events[1],
            SlicerEvent::HistoryChanged {
                can_undo: false,
                can_redo: true
            }
        ));
        assert!(matches!(events[2], SlicerEvent::SelectionChanged(None)));
    }

    #[test]
    fn test_grid_size_zero_is_rejected() {
        let mut controller = Controller::default();
        assert!(matches!(
            controller.set_grid_size(0),
            Err(SlicerError::Config(ConfigError::InvalidGridSize(0)))
        ));
        assert_eq!(controller.snap_mode(), SnapMode::Pixel);
    }

    #[test]
    fn test_select_unknown_guide() {
        let mut controller = open(100);
        let stray = GuideId::new();
        assert!(matches!(
            controller.select_guide(Some(stray)),
            Err(SlicerError::Guide(GuideError::NotFound(_)))
        ));
    }

    #[test]
    fn test_cancel_is_visible_until_the_export_reports() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = open(40);
        controller.add_guide(20.0).unwrap();
        assert!(!controller.cancel_export());

        controller
            .request_export(ExportRequest::new(ExportFormat::Png, dir.path()).in_place())
            .unwrap();
        assert!(!controller.is_cancelling());
        assert!(controller.cancel_export());
        assert!(controller.is_cancelling());

        assert!(controller.wait_for_export().unwrap().is_ok());
        assert!(!controller.is_cancelling());
        assert!(!controller.is_exporting());
    }

    #[test]
    fn test_export_directory_choice() {
        let request = ExportRequest::new(ExportFormat::Png, "/out");
        let nested = request.directory();
        assert_eq!(nested.parent(), Some(Path::new("/out")));
        assert_eq!(request.in_place().directory(), PathBuf::from("/out"));
    }
}
