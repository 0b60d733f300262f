use std::fs;
use std::path::{Path, PathBuf};

use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SettingsError};
use crate::export::{DEFAULT_JPEG_QUALITY, ExportFormat};
use crate::geometry::{DEFAULT_GRID_SIZE, SnapMode};

const SETTINGS_FILE: &str = "settings.json";

/// Result type for settings operations
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Snap policy as stored on disk; the grid size lives in its own field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapKind {
    Off,
    #[default]
    Pixel,
    Grid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    #[default]
    Png,
    Jpeg,
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowLayout {
    pub width: f32,
    pub height: f32,
    pub side_panel_width: f32,
}

impl Default for WindowLayout {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            side_panel_width: 260.0,
        }
    }
}

/// User preferences remembered between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)] // fields added later fall back to their defaults
pub struct Settings {
    pub last_open_dir: PathBuf,
    pub last_export_dir: PathBuf,
    pub snap_mode: SnapKind,
    pub grid_size: u32,
    pub export_format: FormatKind,
    pub jpeg_quality: u8,
    pub window_layout: WindowLayout,
    pub language: String,
}

impl Default for Settings {
    fn default() -> Self {
        let home = home_dir();
        Self {
            last_open_dir: home.clone(),
            last_export_dir: home,
            snap_mode: SnapKind::default(),
            grid_size: DEFAULT_GRID_SIZE,
            export_format: FormatKind::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            window_layout: WindowLayout::default(),
            language: "en".to_owned(),
        }
    }
}

impl Settings {
    /// The initial snap mode. A zero grid size is rejected even when grid snapping
    /// is not selected, so a bad file is noticed early.
    pub fn snap_mode(&self) -> Result<SnapMode, ConfigError> {
        let grid = SnapMode::grid(self.grid_size)?;
        Ok(match self.snap_mode {
            SnapKind::Off => SnapMode::Off,
            SnapKind::Pixel => SnapMode::Pixel,
            SnapKind::Grid => grid,
        })
    }

    pub fn set_snap_mode(&mut self, mode: SnapMode) {
        self.snap_mode = match mode {
            SnapMode::Off => SnapKind::Off,
            SnapMode::Pixel => SnapKind::Pixel,
            SnapMode::Grid(size) => {
                self.grid_size = size.get();
                SnapKind::Grid
            }
        };
    }

    pub fn export_format(&self) -> Result<ExportFormat, ConfigError> {
        match self.export_format {
            FormatKind::Png => Ok(ExportFormat::Png),
            FormatKind::Jpeg => ExportFormat::jpeg(self.jpeg_quality),
            FormatKind::Keep => Ok(ExportFormat::KeepOriginal),
        }
    }

    pub fn set_export_format(&mut self, format: ExportFormat) {
        self.export_format = match format {
            ExportFormat::Png => FormatKind::Png,
            ExportFormat::Jpeg { quality } => {
                self.jpeg_quality = quality;
                FormatKind::Jpeg
            }
            ExportFormat::KeepOriginal => FormatKind::Keep,
        };
    }
}

fn home_dir() -> PathBuf {
    UserDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_default()
}

/// Loads and saves [`Settings`] as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store backed by the platform configuration directory
    pub fn from_project_dirs() -> SettingsResult<Self> {
        let dirs = ProjectDirs::from("org", "guide-slicer", "GuideSlicer")
            .ok_or(SettingsError::NoConfigDir)?;
        Ok(Self::at(dirs.config_dir().join(SETTINGS_FILE)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the settings file. Missing or unreadable content yields defaults.
    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                log::info!("No settings at {}, using defaults", self.path.display());
                Settings::default()
            }
            Err(err) => {
                log::warn!("Ignoring settings at {}: {err}", self.path.display());
                Settings::default()
            }
        }
    }

    /// Like [`load`](Self::load) but reports problems instead of falling back.
    pub fn try_load(&self) -> SettingsResult<Option<Settings>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    pub fn save(&self, settings: &Settings) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)?;
        log::debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}
