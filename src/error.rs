use std::path::PathBuf;

use thiserror::Error;

use crate::guide::GuideId;

/// Failures raised by the guide store when an edit would break one of its invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GuideError {
    #[error("guide position {0} is not a finite number")]
    InvalidPosition(f64),

    #[error("a guide already exists at y = {position}")]
    DuplicatePosition { position: f64 },

    #[error("no guide with id {0}")]
    NotFound(GuideId),

    #[error("guide {0} is locked")]
    Locked(GuideId),
}

/// Rejected configuration values. Never silently coerced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("grid size must be a positive integer, got {0}")]
    InvalidGridSize(u32),

    #[error("JPEG quality must be within 1..=100, got {0}")]
    InvalidJpegQuality(u8),
}

/// Operations refused because of the controller's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("no image is open")]
    NoActiveSession,

    #[error("an export is still running")]
    ExportInProgress,

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,
}

/// Image decode/encode failures reported by the codec layer.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("image not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported image format: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to decode {}: {reason}", .path.display())]
    CorruptFile { path: PathBuf, reason: String },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode slice: {0}")]
    Encode(#[from] image::ImageError),
}

/// Export failures. `Slice` carries the 1-based slice index so partial results can be reported.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot prepare export directory {}: {source}", .path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("slice {index} could not be encoded: {source}")]
    Encode {
        index: usize,
        #[source]
        source: CodecError,
    },

    #[error("slice {index} could not be written to {}: {source}", .path.display())]
    Write {
        index: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start export worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("export worker stopped before reporting a result")]
    WorkerLost,
}

impl ExportError {
    /// The slice index this failure belongs to, if it is a per-slice failure.
    pub fn slice_index(&self) -> Option<usize> {
        match self {
            ExportError::Encode { index, .. } | ExportError::Write { index, .. } => Some(*index),
            ExportError::Destination { .. } | ExportError::Spawn(_) | ExportError::WorkerLost => None,
        }
    }
}

/// Errors that can occur while loading or saving settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize settings: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no configuration directory is available on this platform")]
    NoConfigDir,
}

/// Coarse classification used by the UI to decide how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    State,
    Io,
}

/// Top-level error returned by the controller.
#[derive(Debug, Error)]
pub enum SlicerError {
    #[error(transparent)]
    Guide(#[from] GuideError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl SlicerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SlicerError::Guide(GuideError::NotFound(_)) => ErrorKind::NotFound,
            SlicerError::Guide(GuideError::Locked(_)) => ErrorKind::State,
            SlicerError::Guide(
                GuideError::InvalidPosition(_) | GuideError::DuplicatePosition { .. },
            ) => ErrorKind::Validation,
            SlicerError::Config(_) => ErrorKind::Validation,
            SlicerError::State(_) => ErrorKind::State,
            SlicerError::Codec(_) | SlicerError::Export(_) | SlicerError::Settings(_) => {
                ErrorKind::Io
            }
        }
    }
}

pub type SlicerResult<T> = Result<T, SlicerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let id = GuideId::new();
        assert_eq!(SlicerError::from(GuideError::NotFound(id)).kind(), ErrorKind::NotFound);
        assert_eq!(
            SlicerError::from(GuideError::DuplicatePosition { position: 4.0 }).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            SlicerError::from(ConfigError::InvalidGridSize(0)).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            SlicerError::from(StateError::NothingToUndo).kind(),
            ErrorKind::State
        );
    }

    #[test]
    fn test_slice_index_is_reported() {
        let err = ExportError::Write {
            index: 3,
            path: PathBuf::from("003.png"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.slice_index(), Some(3));
        assert!(err.to_string().contains("slice 3"));
    }
}
