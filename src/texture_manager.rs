use egui::{ColorImage, Context, TextureHandle, TextureOptions};
use image::DynamicImage;
use image::imageops::FilterType;

/// Holds the GPU copy of the open image.
///
/// Uploads once per session generation. Images taller or wider than the backend
/// allows are downscaled for display only; exports always use the full-resolution
/// pixels held by the session.
#[derive(Default)]
pub struct TextureManager {
    current: Option<(u64, TextureHandle)>,
}

impl TextureManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the texture for `generation`, uploading `image` if it changed.
    pub fn texture(&mut self, ctx: &Context, generation: u64, image: &DynamicImage) -> TextureHandle {
        match &self.current {
            Some((cached, handle)) if *cached == generation => handle.clone(),
            _ => {
                let max_side = ctx.input(|i| i.max_texture_side);
                let pixels = color_image(image, max_side);
                log::debug!(
                    "Uploading texture {}x{} for session {generation}",
                    pixels.size[0],
                    pixels.size[1]
                );
                let handle = ctx.load_texture(
                    format!("session_{generation}"),
                    pixels,
                    TextureOptions::LINEAR,
                );
                self.current = Some((generation, handle.clone()));
                handle
            }
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

/// Converts to egui's pixel format, shrinking so neither side exceeds `max_side`.
pub fn color_image(image: &DynamicImage, max_side: usize) -> ColorImage {
    let longest = image.width().max(image.height()) as usize;
    let rgba = if max_side > 0 && longest > max_side {
        let scale = max_side as f64 / longest as f64;
        let width = ((f64::from(image.width()) * scale).floor() as u32).max(1);
        let height = ((f64::from(image.height()) * scale).floor() as u32).max(1);
        image.resize_exact(width, height, FilterType::Triangle).to_rgba8()
    } else {
        image.to_rgba8()
    };
    let size = [rgba.width() as usize, rgba.height() as usize];
    ColorImage::from_rgba_unmultiplied(size, rgba.as_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn test_small_image_keeps_size() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(30, 200));
        assert_eq!(color_image(&image, 2048).size, [30, 200]);
    }

    #[test]
    fn test_tall_image_is_downscaled() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(100, 4000));
        let pixels = color_image(&image, 1000);
        assert_eq!(pixels.size, [25, 1000]);
    }
}
