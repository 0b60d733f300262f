#![warn(clippy::all, rust_2018_idioms)]

use guide_slicer::{Settings, SettingsStore, SlicerApp};

fn main() -> eframe::Result<()> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let store = match SettingsStore::from_project_dirs() {
        Ok(store) => Some(store),
        Err(err) => {
            log::warn!("Settings will not be saved: {err}");
            None
        }
    };
    let settings = store.as_ref().map(SettingsStore::load).unwrap_or_default();
    let layout = settings.window_layout;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Guide Slicer")
            .with_inner_size([layout.width, layout.height])
            .with_min_inner_size([480.0, 320.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Guide Slicer",
        options,
        Box::new(move |cc| Ok(Box::new(SlicerApp::new(cc, store, settings)))),
    )
}
