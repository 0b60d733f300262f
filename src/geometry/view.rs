use egui::{Pos2, Rect, Vec2, pos2};

const MIN_ZOOM: f32 = 0.05;
const MAX_ZOOM: f32 = 32.0;

/// Maps between screen space (egui points) and image space (pixels).
///
/// The canvas owns one of these and converts pointer positions before calling into
/// the controller, so the core only ever sees image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Screen position of the image's top-left corner
    pub origin: Pos2,
    /// Screen points per image pixel
    pub zoom: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            origin: Pos2::ZERO,
            zoom: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn new(origin: Pos2, zoom: f32) -> Self {
        Self {
            origin,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    /// Fits an image of `image_size` pixels into `viewport`, centered, never upscaling.
    pub fn fit(image_size: Vec2, viewport: Rect) -> Self {
        if image_size.x <= 0.0 || image_size.y <= 0.0 {
            return Self::new(viewport.min, 1.0);
        }
        let zoom = (viewport.width() / image_size.x)
            .min(viewport.height() / image_size.y)
            .min(1.0);
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let scaled = image_size * zoom;
        let origin = viewport.center() - scaled / 2.0;
        Self { origin, zoom }
    }

    pub fn image_to_screen(&self, image_pos: Pos2) -> Pos2 {
        self.origin + image_pos.to_vec2() * self.zoom
    }

    pub fn screen_to_image(&self, screen_pos: Pos2) -> Pos2 {
        let local = (screen_pos - self.origin) / self.zoom;
        pos2(local.x, local.y)
    }

    pub fn image_y_to_screen(&self, image_y: f64) -> f32 {
        self.origin.y + image_y as f32 * self.zoom
    }

    pub fn screen_y_to_image(&self, screen_y: f32) -> f64 {
        f64::from((screen_y - self.origin.y) / self.zoom)
    }

    /// Screen rectangle covered by an image of `image_size` pixels
    pub fn image_rect(&self, image_size: Vec2) -> Rect {
        Rect::from_min_size(self.origin, image_size * self.zoom)
    }

    /// Zooms by `factor` keeping the image point under `anchor` fixed on screen.
    pub fn zoom_about(&mut self, anchor: Pos2, factor: f32) {
        let image_anchor = self.screen_to_image(anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.origin = anchor - image_anchor.to_vec2() * self.zoom;
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.origin += delta;
    }
}
