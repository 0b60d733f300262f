#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod codec;
pub mod command;
pub mod controller;
pub mod error;
pub mod event;
pub mod export;
pub mod file_handler;
pub mod geometry;
pub mod guide;
pub mod panels;
pub mod session;
pub mod settings;
pub mod store;
pub mod texture_manager;
pub mod util;

pub use app::SlicerApp;
pub use command::{Command, CommandHistory};
pub use controller::{Controller, ExportRequest};
pub use error::{ErrorKind, SlicerError, SlicerResult};
pub use event::{EventBus, EventHandler, SlicerEvent};
pub use export::{ExportFormat, ExportReport, Naming, compute_slices};
pub use geometry::{SnapMode, ViewTransform};
pub use guide::{Guide, GuideId};
pub use session::ImageSession;
pub use settings::{Settings, SettingsStore};
pub use store::GuideStore;
