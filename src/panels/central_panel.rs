use egui::{Color32, PointerButton, Pos2, Rect, Sense, Stroke, pos2, vec2};

use crate::SlicerApp;
use crate::controller::Controller;
use crate::geometry::{ViewTransform, guide_at, ruler_contains};
use crate::guide::{Guide, GuideId};
use crate::texture_manager::TextureManager;

const RULER_HEIGHT: f32 = 20.0;
const ZOOM_SPEED: f32 = 0.0015;

const GUIDE_COLOR: Color32 = Color32::from_rgb(0, 200, 255);
const SELECTED_COLOR: Color32 = Color32::from_rgb(255, 200, 0);
const LOCKED_COLOR: Color32 = Color32::from_rgb(150, 150, 150);

/// A pointer drag in progress on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CanvasDrag {
    /// Pulled out of the ruler; becomes a guide when released over the image area
    NewGuide { screen_y: f32 },
    MoveGuide { id: GuideId, screen_y: f32 },
}

enum CanvasAction {
    Add(f64),
    Move(GuideId, f64),
    Select(Option<GuideId>),
}

/// View and drag state owned by the canvas between frames.
#[derive(Debug, Default)]
pub struct CanvasState {
    view: Option<ViewTransform>,
    fitted_generation: u64,
    drag: Option<CanvasDrag>,
}

pub fn central_panel(app: &mut SlicerApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let (controller, state, textures, generation) = app.canvas_parts();
        let actions = canvas(ui, controller, state, textures, generation);

        for action in actions {
            let controller = app.controller_mut();
            let result = match action {
                CanvasAction::Add(y) => controller.add_guide(y).map(|_| ()),
                CanvasAction::Move(id, y) => controller.move_guide(id, y),
                CanvasAction::Select(id) => controller.select_guide(id),
            };
            app.report(result);
        }
    });
}

fn canvas(
    ui: &mut egui::Ui,
    controller: &Controller,
    state: &mut CanvasState,
    textures: &mut TextureManager,
    generation: u64,
) -> Vec<CanvasAction> {
    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
    let canvas_rect = response.rect;
    painter.rect_filled(canvas_rect, 0.0, Color32::from_gray(30));

    let Some(session) = controller.session() else {
        state.drag = None;
        painter.text(
            canvas_rect.center(),
            egui::Align2::CENTER_CENTER,
            "Open an image or drop one here",
            egui::FontId::proportional(18.0),
            Color32::GRAY,
        );
        return Vec::new();
    };

    let image_size = vec2(session.width() as f32, session.height() as f32);
    let work_area = Rect::from_min_max(
        pos2(canvas_rect.left(), canvas_rect.top() + RULER_HEIGHT),
        canvas_rect.max,
    );
    let mut view = match state.view {
        Some(view) if state.fitted_generation == generation => view,
        _ => {
            state.fitted_generation = generation;
            ViewTransform::fit(image_size, work_area.shrink(8.0))
        }
    };

    let guides = session.guides();
    let selected = session.selected();
    let editable = !controller.is_exporting();
    let mut actions = Vec::new();

    // Zoom and pan
    if response.hovered() {
        let scroll = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll != 0.0 {
            if let Some(pointer) = response.hover_pos() {
                view.zoom_about(pointer, (scroll * ZOOM_SPEED).exp());
            }
        }
    }
    if response.dragged_by(PointerButton::Middle) || response.dragged_by(PointerButton::Secondary) {
        view.pan(response.drag_delta());
    }

    // Guide interaction
    if response.drag_started_by(PointerButton::Primary) && editable {
        if let Some(pointer) = response.interact_pointer_pos() {
            state.drag = start_drag(pointer, canvas_rect, &guides, &view);
            if let Some(CanvasDrag::MoveGuide { id, .. }) = state.drag {
                actions.push(CanvasAction::Select(Some(id)));
            }
        }
    }
    if response.dragged_by(PointerButton::Primary) {
        if let (Some(drag), Some(pointer)) = (state.drag.as_mut(), response.interact_pointer_pos()) {
            match drag {
                CanvasDrag::NewGuide { screen_y } | CanvasDrag::MoveGuide { screen_y, .. } => {
                    *screen_y = pointer.y;
                }
            }
        }
    }
    if response.drag_stopped() {
        match state.drag.take() {
            Some(CanvasDrag::NewGuide { screen_y }) if screen_y > work_area.top() => {
                actions.push(CanvasAction::Add(view.screen_y_to_image(screen_y)));
            }
            Some(CanvasDrag::MoveGuide { id, screen_y }) => {
                actions.push(CanvasAction::Move(id, view.screen_y_to_image(screen_y)));
            }
            // Released back over the ruler: nothing to add
            Some(CanvasDrag::NewGuide { .. }) | None => {}
        }
    }
    if response.clicked() {
        if let Some(pointer) = response.interact_pointer_pos() {
            actions.push(CanvasAction::Select(guide_at(pointer.y, &guides, &view)));
        }
    }

    // Painting
    let clipped = painter.with_clip_rect(work_area);
    let image_rect = view.image_rect(image_size);
    let texture = textures.texture(ui.ctx(), generation, session.image());
    clipped.image(
        texture.id(),
        image_rect,
        Rect::from_min_max(Pos2::ZERO, pos2(1.0, 1.0)),
        Color32::WHITE,
    );

    for guide in &guides {
        let dragged_y = match state.drag {
            Some(CanvasDrag::MoveGuide { id, screen_y }) if id == guide.id => Some(screen_y),
            _ => None,
        };
        let y = dragged_y.unwrap_or_else(|| view.image_y_to_screen(guide.position));
        let color = guide_color(guide, selected);
        let width = if selected == Some(guide.id) { 2.0 } else { 1.0 };
        clipped.hline(image_rect.x_range(), y, Stroke::new(width, color));
    }

    if let Some(CanvasDrag::NewGuide { screen_y }) = state.drag {
        clipped.hline(image_rect.x_range(), screen_y, Stroke::new(1.0, GUIDE_COLOR));
        clipped.text(
            pos2(image_rect.left() + 4.0, screen_y - 2.0),
            egui::Align2::LEFT_BOTTOM,
            format!("y = {:.0}", view.screen_y_to_image(screen_y)),
            egui::FontId::monospace(12.0),
            GUIDE_COLOR,
        );
    }

    paint_ruler(&painter, canvas_rect, &guides, &view);

    state.view = Some(view);
    actions
}

fn start_drag(pointer: Pos2, canvas_rect: Rect, guides: &[Guide], view: &ViewTransform) -> Option<CanvasDrag> {
    if ruler_contains(canvas_rect, RULER_HEIGHT, pointer) {
        return Some(CanvasDrag::NewGuide { screen_y: pointer.y });
    }
    let id = guide_at(pointer.y, guides, view)?;
    let guide = guides.iter().find(|guide| guide.id == id)?;
    // Locked guides can still be selected, just not dragged
    (!guide.locked).then_some(CanvasDrag::MoveGuide {
        id,
        screen_y: pointer.y,
    })
}

fn guide_color(guide: &Guide, selected: Option<GuideId>) -> Color32 {
    if selected == Some(guide.id) {
        SELECTED_COLOR
    } else if guide.locked {
        LOCKED_COLOR
    } else {
        GUIDE_COLOR
    }
}

fn paint_ruler(painter: &egui::Painter, canvas_rect: Rect, guides: &[Guide], view: &ViewTransform) {
    let ruler = Rect::from_min_size(canvas_rect.min, vec2(canvas_rect.width(), RULER_HEIGHT));
    painter.rect_filled(ruler, 0.0, Color32::from_gray(55));
    painter.text(
        ruler.left_center() + vec2(6.0, 0.0),
        egui::Align2::LEFT_CENTER,
        format!("Drag down to add a guide  ({} placed, zoom {:.0}%)", guides.len(), view.zoom * 100.0),
        egui::FontId::proportional(11.0),
        Color32::LIGHT_GRAY,
    );
}
