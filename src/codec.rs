//! Thin wrapper over the `image` crate: decoding source files and encoding slices.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageError, ImageFormat};

use crate::error::CodecError;
use crate::export::Encoding;

/// A decoded source image together with the container it came from.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub pixels: DynamicImage,
    pub format: Option<ImageFormat>,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

pub fn decode(path: &Path) -> Result<DecodedImage, CodecError> {
    if !path.exists() {
        log::error!("Image not found: {}", path.display());
        return Err(CodecError::NotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path).map_err(|source| CodecError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let format = image::guess_format(&bytes)
        .or_else(|_| ImageFormat::from_path(path))
        .map_err(|_| CodecError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;

    let pixels = image::load_from_memory_with_format(&bytes, format).map_err(|err| match err {
        ImageError::Unsupported(_) => CodecError::UnsupportedFormat {
            path: path.to_path_buf(),
        },
        other => CodecError::CorruptFile {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })?;

    log::debug!(
        "Decoded {} ({}x{}, {:?})",
        path.display(),
        pixels.width(),
        pixels.height(),
        format
    );

    Ok(DecodedImage {
        pixels,
        format: Some(format),
    })
}

/// Encodes `image` into an in-memory file in the requested container.
pub fn encode(image: &DynamicImage, encoding: Encoding) -> Result<Vec<u8>, CodecError> {
    let mut bytes = Vec::new();
    match encoding {
        Encoding::Png => {
            image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        }
        Encoding::Jpeg { quality } => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
            rgb.write_with_encoder(encoder)?;
        }
        Encoding::Other(format) => {
            image.write_to(&mut Cursor::new(&mut bytes), format)?;
        }
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sample() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 6, Rgba([200, 10, 10, 255])))
    }

    #[test]
    fn test_missing_file() {
        let err = decode(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, CodecError::NotFound(_)));
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        let mut bytes = encode(&sample(), Encoding::Png).unwrap();
        bytes.truncate(40);
        fs::write(&path, bytes).unwrap();

        let err = decode(&path).unwrap_err();
        assert!(matches!(err, CodecError::CorruptFile { .. }), "{err:?}");
    }

    #[test]
    fn test_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"just some text").unwrap();

        let err = decode(&path).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedFormat { .. }), "{err:?}");
    }

    #[test]
    fn test_png_and_jpeg_encode_decode() {
        let dir = tempfile::tempdir().unwrap();
        for (name, encoding, format) in [
            ("a.png", Encoding::Png, ImageFormat::Png),
            ("a.jpg", Encoding::Jpeg { quality: 80 }, ImageFormat::Jpeg),
        ] {
            let path = dir.path().join(name);
            fs::write(&path, encode(&sample(), encoding).unwrap()).unwrap();
            let decoded = decode(&path).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (4, 6));
            assert_eq!(decoded.format, Some(format));
        }
    }
}
