//! Pure coordinate helpers: snapping, clamping, and the screen/image mapping used by the canvas.

mod hit_testing;
mod snap;
mod view;

pub use hit_testing::{GUIDE_HIT_TOLERANCE, guide_at, ruler_contains};
pub use snap::{DEFAULT_GRID_SIZE, GridSize, SnapMode, clamp, snap};
pub use view::ViewTransform;
