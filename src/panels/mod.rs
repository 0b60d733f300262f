mod central_panel;
mod guides_panel;
mod toolbar;

pub use central_panel::{CanvasState, central_panel};
pub use guides_panel::guides_panel;
pub use toolbar::{status_bar, toolbar};
