use egui::{Pos2, Rect};

use super::ViewTransform;
use crate::guide::{Guide, GuideId};

/// How close (in screen points) the pointer must be to grab a guide.
pub const GUIDE_HIT_TOLERANCE: f32 = 6.0;

/// Finds the guide nearest to `screen_y` within [`GUIDE_HIT_TOLERANCE`].
pub fn guide_at(screen_y: f32, guides: &[Guide], view: &ViewTransform) -> Option<GuideId> {
    guides
        .iter()
        .map(|guide| {
            let distance = (view.image_y_to_screen(guide.position) - screen_y).abs();
            (guide.id, distance)
        })
        .filter(|(_, distance)| *distance <= GUIDE_HIT_TOLERANCE)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

/// True when `pos` lies inside the ruler strip along the top edge of `canvas`.
pub fn ruler_contains(canvas: Rect, ruler_height: f32, pos: Pos2) -> bool {
    canvas.contains(pos) && pos.y <= canvas.top() + ruler_height
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_guide_at_picks_nearest() {
        let view = ViewTransform::new(pos2(0.0, 10.0), 2.0);
        let a = Guide::new(20.0); // screen y 50
        let b = Guide::new(22.0); // screen y 54
        let guides = [a, b];

        assert_eq!(guide_at(51.0, &guides, &view), Some(a.id));
        assert_eq!(guide_at(53.5, &guides, &view), Some(b.id));
        assert_eq!(guide_at(80.0, &guides, &view), None);
    }

    #[test]
    fn test_ruler_contains() {
        let canvas = Rect::from_min_max(pos2(0.0, 100.0), pos2(400.0, 500.0));
        assert!(ruler_contains(canvas, 20.0, pos2(10.0, 110.0)));
        assert!(!ruler_contains(canvas, 20.0, pos2(10.0, 130.0)));
        assert!(!ruler_contains(canvas, 20.0, pos2(10.0, 90.0)));
    }
}
