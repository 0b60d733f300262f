use std::path::Path;

use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;
const MIN_COUNTER_DIGITS: usize = 3;

/// Output container requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg { quality: u8 },
    /// Reuse the source file's container
    KeepOriginal,
}

impl ExportFormat {
    pub fn jpeg(quality: u8) -> Result<Self, ConfigError> {
        let format = ExportFormat::Jpeg { quality };
        format.validate()?;
        Ok(format)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ExportFormat::Jpeg { quality } if !(1..=100).contains(quality) => {
                Err(ConfigError::InvalidJpegQuality(*quality))
            }
            ExportFormat::Png | ExportFormat::Jpeg { .. } | ExportFormat::KeepOriginal => Ok(()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Png => "PNG",
            ExportFormat::Jpeg { .. } => "JPEG",
            ExportFormat::KeepOriginal => "Keep original",
        }
    }

    /// Decides the encoder and file extension for an image loaded from `source_path`.
    ///
    /// `KeepOriginal` keeps the source extension as written (so `photo.JPEG` exports
    /// `.jpeg` files). Containers the codec cannot write fall back to PNG.
    pub fn resolve(&self, source_path: &Path, source_format: Option<ImageFormat>) -> ExportTarget {
        match self {
            ExportFormat::Png => ExportTarget::png(),
            ExportFormat::Jpeg { quality } => ExportTarget {
                encoding: Encoding::Jpeg { quality: *quality },
                extension: "jpg".to_owned(),
            },
            ExportFormat::KeepOriginal => {
                let extension = source_path
                    .extension()
                    .map(|ext| ext.to_string_lossy().to_lowercase())
                    .filter(|ext| !ext.is_empty());
                let format = extension
                    .as_deref()
                    .and_then(ImageFormat::from_extension)
                    .or(source_format);

                let encoding = match format {
                    Some(ImageFormat::Png) => Encoding::Png,
                    Some(ImageFormat::Jpeg) => Encoding::Jpeg {
                        quality: DEFAULT_JPEG_QUALITY,
                    },
                    Some(other) if other.writing_enabled() => Encoding::Other(other),
                    Some(other) => {
                        log::warn!("Cannot write {other:?}, exporting PNG instead");
                        return ExportTarget::png();
                    }
                    None => return ExportTarget::png(),
                };
                let extension = extension.unwrap_or_else(|| encoding.default_extension().to_owned());
                ExportTarget { encoding, extension }
            }
        }
    }
}

/// The concrete encoder used for each slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Png,
    Jpeg { quality: u8 },
    Other(ImageFormat),
}

impl Encoding {
    pub fn default_extension(&self) -> &'static str {
        match self {
            Encoding::Png => "png",
            Encoding::Jpeg { .. } => "jpg",
            Encoding::Other(format) => format.extensions_str().first().copied().unwrap_or("img"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    pub encoding: Encoding,
    pub extension: String,
}

impl ExportTarget {
    pub fn png() -> Self {
        Self {
            encoding: Encoding::Png,
            extension: "png".to_owned(),
        }
    }
}

/// File naming for exported slices: `<prefix><counter>.<ext>`, counter from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Naming {
    pub prefix: String,
    /// Counter is zero-padded to at least this many digits
    pub min_digits: usize,
}

impl Default for Naming {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            min_digits: MIN_COUNTER_DIGITS,
        }
    }
}

impl Naming {
    /// Name for the `counter`-th of `total` files. Widens past `min_digits` when needed
    /// so names still sort in slice order.
    pub fn file_name(&self, counter: usize, total: usize, extension: &str) -> String {
        let width = self.min_digits.max(total.max(1).to_string().len());
        format!("{}{:0width$}.{}", self.prefix, counter, extension, width = width)
    }
}
