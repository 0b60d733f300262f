use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::thread;

use egui::{Key, KeyboardShortcut, Modifiers};
use futures::channel::oneshot;

use crate::codec::{self, DecodedImage};
use crate::controller::{Controller, ExportRequest};
use crate::error::{CodecError, SlicerError, SlicerResult};
use crate::event::{ExportProgress, SessionInfo, SlicerEvent};
use crate::export::{ExportFormat, ExportReport, Naming};
use crate::file_handler::FileHandler;
use crate::panels::{CanvasState, central_panel, guides_panel, status_bar, toolbar};
use crate::settings::{FormatKind, Settings, SettingsStore};
use crate::texture_manager::TextureManager;

const UNDO: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::Z);
const REDO: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::Y);
const REDO_SHIFT: KeyboardShortcut =
    KeyboardShortcut::new(Modifiers::COMMAND.plus(Modifiers::SHIFT), Key::Z);
const OPEN: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::O);
const CLOSE: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::W);

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "webp", "tga", "ico",
];

/// What the UI remembers from controller events between frames.
#[derive(Debug, Default)]
pub struct EventFeed {
    pub status: String,
    pub session: Option<SessionInfo>,
    /// Bumped whenever a different image is opened or closed
    pub session_generation: u64,
    pub progress: Option<ExportProgress>,
    pub last_report: Option<ExportReport>,
}

impl EventFeed {
    pub fn apply(&mut self, event: &SlicerEvent) {
        match event {
            SlicerEvent::SessionChanged(info) => {
                self.session.clone_from(info);
                self.session_generation += 1;
                self.progress = None;
                self.last_report = None;
            }
            SlicerEvent::ExportProgress(progress) => self.progress = Some(*progress),
            SlicerEvent::ExportFinished(report) => {
                self.progress = None;
                self.last_report = Some(report.clone());
            }
            SlicerEvent::ExportFailed(_) => self.progress = None,
            SlicerEvent::Status(message) => self.status.clone_from(message),
            SlicerEvent::GuidesChanged(_)
            | SlicerEvent::SelectionChanged(_)
            | SlicerEvent::HistoryChanged { .. }
            | SlicerEvent::SnapModeChanged(_) => {}
        }
    }
}

/// Export form contents, kept across exports.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportForm {
    pub destination: String,
    pub format: FormatKind,
    pub jpeg_quality: u8,
    pub prefix: String,
    pub in_place: bool,
}

impl ExportForm {
    fn from_settings(settings: &Settings) -> Self {
        Self {
            destination: settings.last_export_dir.display().to_string(),
            format: settings.export_format,
            jpeg_quality: settings.jpeg_quality,
            prefix: String::new(),
            in_place: false,
        }
    }

    pub fn format(&self) -> SlicerResult<ExportFormat> {
        Ok(match self.format {
            FormatKind::Png => ExportFormat::Png,
            FormatKind::Jpeg => ExportFormat::jpeg(self.jpeg_quality)?,
            FormatKind::Keep => ExportFormat::KeepOriginal,
        })
    }

    pub fn request(&self) -> SlicerResult<ExportRequest> {
        let naming = Naming {
            prefix: self.prefix.clone(),
            ..Naming::default()
        };
        let request = ExportRequest::new(self.format()?, PathBuf::from(&self.destination))
            .with_naming(naming);
        Ok(if self.in_place {
            request.in_place()
        } else {
            request
        })
    }
}

/// A decode running on a background thread.
struct PendingLoad {
    path: PathBuf,
    receiver: oneshot::Receiver<Result<DecodedImage, CodecError>>,
}

pub struct SlicerApp {
    controller: Controller,
    feed: Rc<RefCell<EventFeed>>,
    settings: Settings,
    settings_store: Option<SettingsStore>,
    textures: TextureManager,
    file_handler: FileHandler,
    loading: Option<PendingLoad>,
    canvas: CanvasState,
    /// Contents of the toolbar path field
    pub path_input: String,
    /// Grid spacing shown in the toolbar, applied when grid snapping is picked
    pub grid_size: u32,
    pub export_form: ExportForm,
}

impl SlicerApp {
    /// Called once before the first frame.
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        settings_store: Option<SettingsStore>,
        settings: Settings,
    ) -> Self {
        Self::with_settings(settings_store, settings)
    }

    /// Everything except the egui context; also used by tests.
    pub fn with_settings(settings_store: Option<SettingsStore>, settings: Settings) -> Self {
        let mut controller = Controller::from_settings(&settings).unwrap_or_else(|err| {
            log::warn!("Ignoring stored snap settings: {err}");
            Controller::default()
        });

        let feed = Rc::new(RefCell::new(EventFeed::default()));
        let sink = Rc::clone(&feed);
        controller.subscribe(move |event: &SlicerEvent| sink.borrow_mut().apply(event));

        Self {
            controller,
            feed,
            path_input: settings.last_open_dir.display().to_string(),
            grid_size: settings.grid_size.max(1),
            export_form: ExportForm::from_settings(&settings),
            settings,
            settings_store,
            textures: TextureManager::new(),
            file_handler: FileHandler,
            loading: None,
            canvas: CanvasState::default(),
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }

    pub fn feed(&self) -> std::cell::Ref<'_, EventFeed> {
        self.feed.borrow()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    /// Split borrow for the canvas: it reads the controller while updating its own state.
    pub(crate) fn canvas_parts(&mut self) -> (&Controller, &mut CanvasState, &mut TextureManager, u64) {
        let generation = self.feed.borrow().session_generation;
        (&self.controller, &mut self.canvas, &mut self.textures, generation)
    }

    /// Shows a failed operation in the status bar. Returns the success value, if any.
    pub fn report<T>(&mut self, result: SlicerResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("{err}");
                self.feed.borrow_mut().status = err.to_string();
                None
            }
        }
    }

    /// Starts decoding `path` in the background. The image replaces the open one
    /// once decoding finishes.
    pub fn begin_open(&mut self, path: PathBuf) {
        if self.controller.is_exporting() {
            self.feed.borrow_mut().status = "Wait for the export to finish first".to_owned();
            return;
        }

        let (sender, receiver) = oneshot::channel();
        let worker_path = path.clone();
        let spawned = thread::Builder::new()
            .name("image-decode".to_owned())
            .spawn(move || {
                // The app may have quit in the meantime
                let _ = sender.send(codec::decode(&worker_path));
            });

        match spawned {
            Ok(_) => {
                self.feed.borrow_mut().status = format!("Loading {}", path.display());
                self.path_input = path.display().to_string();
                self.loading = Some(PendingLoad { path, receiver });
            }
            Err(err) => {
                log::error!("Failed to start decoder thread: {err}");
                // Fall back to decoding on this thread
                let result = self.controller.open_image(&path);
                if self.report(result).is_some() {
                    self.remember_open_dir(&path);
                }
            }
        }
    }

    /// Lets the user pick an image with the native file dialog, starting in the
    /// last folder an image was opened from.
    pub fn pick_image(&mut self) {
        if !self.is_idle() {
            return;
        }
        if let Some(path) = rfd::FileDialog::new()
            .set_title("Open image")
            .add_filter("Images", IMAGE_EXTENSIONS)
            .set_directory(&self.settings.last_open_dir)
            .pick_file()
        {
            self.begin_open(path);
        }
    }

    /// Fills the export folder field from the native folder dialog.
    pub fn pick_export_folder(&mut self) {
        if let Some(folder) = rfd::FileDialog::new()
            .set_title("Export folder")
            .set_directory(self.export_dialog_start())
            .pick_folder()
        {
            self.export_form.destination = folder.display().to_string();
        }
    }

    /// The typed folder if there is one, otherwise the last folder exported to
    fn export_dialog_start(&self) -> PathBuf {
        match self.export_form.destination.trim() {
            "" => self.settings.last_export_dir.clone(),
            typed => PathBuf::from(typed),
        }
    }

    /// No decode or export is running
    pub fn is_idle(&self) -> bool {
        !self.is_loading() && !self.controller.is_exporting()
    }

    pub fn close_image(&mut self) {
        let result = self.controller.close_image();
        if self.report(result).is_some() {
            self.textures.clear();
        }
    }

    pub fn start_export(&mut self) {
        if self.is_loading() {
            // The decoded image would replace the session being exported
            self.feed.borrow_mut().status = "Wait for the image to finish loading first".to_owned();
            return;
        }
        let request = self.export_form.request();
        let Some(request) = self.report(request) else {
            return;
        };
        let started = self.controller.request_export(request);
        if let Some(directory) = self.report(started) {
            log::debug!("Export target: {}", directory.display());
            self.settings.last_export_dir = PathBuf::from(&self.export_form.destination);
        }
    }

    fn poll_loading(&mut self) {
        let Some(pending) = self.loading.as_mut() else {
            return;
        };
        let result = match pending.receiver.try_recv() {
            Ok(Some(result)) => result,
            Ok(None) => return,
            Err(_) => {
                let path = pending.path.display().to_string();
                self.loading = None;
                self.feed.borrow_mut().status = format!("Loading {path} was interrupted");
                return;
            }
        };
        let Some(PendingLoad { path, .. }) = self.loading.take() else {
            return;
        };

        let opened = result
            .map_err(SlicerError::from)
            .and_then(|decoded| self.controller.open_decoded(path.clone(), decoded));
        if self.report(opened).is_some() {
            self.remember_open_dir(&path);
        }
    }

    fn remember_open_dir(&mut self, path: &Path) {
        if let Some(parent) = path.parent() {
            self.settings.last_open_dir = parent.to_path_buf();
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        // Consume the shift variant first, the plain one would match it too
        let redo = ctx.input_mut(|i| i.consume_shortcut(&REDO_SHIFT) || i.consume_shortcut(&REDO));
        let undo = ctx.input_mut(|i| i.consume_shortcut(&UNDO));
        let open = ctx.input_mut(|i| i.consume_shortcut(&OPEN));
        let close = ctx.input_mut(|i| i.consume_shortcut(&CLOSE));
        let delete = ctx.input_mut(|i| {
            i.consume_key(Modifiers::NONE, Key::Delete) || i.consume_key(Modifiers::NONE, Key::Backspace)
        });

        if undo && self.controller.can_undo() {
            let result = self.controller.undo();
            self.report(result);
        }
        if redo && self.controller.can_redo() {
            let result = self.controller.redo();
            self.report(result);
        }
        if delete {
            if let Some(id) = self.controller.selected() {
                let result = self.controller.delete_guide(id);
                self.report(result);
            }
        }
        if open {
            self.pick_image();
        }
        if close && self.is_idle() && self.controller.session().is_some() {
            self.close_image();
        }
    }

    /// Copies UI state that should survive a restart into the settings.
    fn sync_settings(&mut self) {
        self.settings.set_snap_mode(self.controller.snap_mode());
        self.settings.grid_size = self.grid_size;
        self.settings.export_format = self.export_form.format;
        self.settings.jpeg_quality = self.export_form.jpeg_quality;
    }

    fn save_settings(&mut self) {
        self.sync_settings();
        let Some(store) = &self.settings_store else {
            return;
        };
        match store.save(&self.settings) {
            Ok(()) => log::info!("Settings saved to {}", store.path().display()),
            Err(err) => log::error!("Failed to save settings: {err}"),
        }
    }
}

impl eframe::App for SlicerApp {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_loading();
        if let Some(outcome) = self.controller.poll_export() {
            self.report(outcome);
        }

        if let Some(path) = self.file_handler.take_dropped_image(ctx) {
            self.begin_open(path);
        }
        self.handle_shortcuts(ctx);

        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.settings.window_layout.width = rect.width();
            self.settings.window_layout.height = rect.height();
        }

        toolbar(self, ctx);
        status_bar(self, ctx);
        guides_panel(self, ctx);
        central_panel(self, ctx);

        self.file_handler.preview_files_being_dropped(ctx);

        // Keep polling background work even without input
        if self.loading.is_some() || self.controller.is_exporting() {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if self.controller.cancel_export() {
            // Let the worker stop at its next checkpoint so no file is left half written
            if let Some(outcome) = self.controller.wait_for_export() {
                self.report(outcome);
            }
        }
        self.save_settings();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::SnapMode;

    #[test]
    fn test_feed_tracks_sessions_and_exports() {
        let mut feed = EventFeed::default();
        let info = SessionInfo {
            path: PathBuf::from("a.png"),
            width: 10,
            height: 20,
        };
        feed.apply(&SlicerEvent::SessionChanged(Some(info.clone())));
        assert_eq!(feed.session, Some(info));
        assert_eq!(feed.session_generation, 1);

        feed.apply(&SlicerEvent::ExportProgress(ExportProgress { done: 1, total: 2 }));
        assert_eq!(feed.progress.map(|p| p.done), Some(1));

        feed.apply(&SlicerEvent::ExportFinished(ExportReport::default()));
        assert!(feed.progress.is_none());
        assert!(feed.last_report.is_some());

        feed.apply(&SlicerEvent::SessionChanged(None));
        assert_eq!(feed.session_generation, 2);
        assert!(feed.last_report.is_none());
    }

    #[test]
    fn test_export_form_builds_request() {
        let mut form = ExportForm::from_settings(&Settings::default());
        form.destination = "/tmp/out".into();
        form.format = FormatKind::Jpeg;
        form.jpeg_quality = 80;
        form.prefix = "part_".into();

        let request = form.request().unwrap();
        assert_eq!(request.format, ExportFormat::Jpeg { quality: 80 });
        assert_eq!(request.naming.prefix, "part_");
        assert!(!request.in_place);

        form.jpeg_quality = 0;
        assert!(matches!(form.request(), Err(SlicerError::Config(_))));
    }

    fn press(ctx: &egui::Context, app: &mut SlicerApp, key: Key) {
        let modifiers = Modifiers {
            ctrl: true,
            command: true,
            ..Modifiers::default()
        };
        let input = egui::RawInput {
            events: vec![egui::Event::Key {
                key,
                physical_key: Some(key),
                pressed: true,
                repeat: false,
                modifiers,
            }],
            ..egui::RawInput::default()
        };
        let _ = ctx.run(input, |ctx| app.handle_shortcuts(ctx));
    }

    #[test]
    fn test_ctrl_w_closes_the_image() {
        let ctx = egui::Context::default();
        let mut app = SlicerApp::with_settings(None, Settings::default());
        let decoded = DecodedImage {
            pixels: image::DynamicImage::ImageRgba8(image::RgbaImage::new(4, 20)),
            format: None,
        };
        app.controller_mut()
            .open_decoded(PathBuf::from("page.png"), decoded)
            .unwrap();
        app.controller_mut().add_guide(10.0).unwrap();

        press(&ctx, &mut app, Key::Z);
        assert!(app.controller().guides().is_empty());
        assert!(app.controller().session().is_some());

        press(&ctx, &mut app, Key::W);
        assert!(app.controller().session().is_none());
    }

    #[test]
    fn test_export_dialog_starts_in_a_known_folder() {
        let settings = Settings {
            last_export_dir: PathBuf::from("/srv/slices"),
            ..Settings::default()
        };
        let mut app = SlicerApp::with_settings(None, settings);
        assert_eq!(app.export_dialog_start(), PathBuf::from("/srv/slices"));

        app.export_form.destination = "  ".into();
        assert_eq!(app.export_dialog_start(), PathBuf::from("/srv/slices"));

        app.export_form.destination = "/tmp/typed ".into();
        assert_eq!(app.export_dialog_start(), PathBuf::from("/tmp/typed"));
    }

    #[test]
    fn test_export_waits_for_a_pending_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = SlicerApp::with_settings(None, Settings::default());
        let decoded = DecodedImage {
            pixels: image::DynamicImage::ImageRgba8(image::RgbaImage::new(4, 20)),
            format: None,
        };
        app.controller_mut()
            .open_decoded(PathBuf::from("first.png"), decoded)
            .unwrap();
        app.export_form.destination = dir.path().display().to_string();

        // Stays pending until the next frame polls it
        app.begin_open(dir.path().join("second.png"));
        assert!(app.is_loading());
        assert!(!app.is_idle());

        app.start_export();
        assert!(!app.controller().is_exporting());
        assert_eq!(app.feed().status, "Wait for the image to finish loading first");
    }

    #[test]
    fn test_app_mirrors_controller_status() {
        let settings = Settings {
            grid_size: 0,
            ..Settings::default()
        };
        // A bad stored grid size falls back to the default snap mode
        let mut app = SlicerApp::with_settings(None, settings);
        assert_eq!(app.controller().snap_mode(), SnapMode::Pixel);
        assert_eq!(app.grid_size, 1);

        let result = app.controller_mut().add_guide(5.0);
        assert!(app.report(result).is_none());
        assert_eq!(app.feed().status, "no image is open");
    }
}
