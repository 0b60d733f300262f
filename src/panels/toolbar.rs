use std::path::PathBuf;

use crate::SlicerApp;
use crate::geometry::SnapMode;
use crate::settings::SnapKind;

pub fn toolbar(app: &mut SlicerApp, ctx: &egui::Context) {
    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let idle = app.is_idle();
            let has_session = app.controller().session().is_some();

            ui.label("Image");
            let field = ui.add(
                egui::TextEdit::singleline(&mut app.path_input)
                    .hint_text("path to image")
                    .desired_width(280.0),
            );
            let submitted = field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if (ui.add_enabled(idle, egui::Button::new("Open")).clicked() || submitted) && idle {
                let path = PathBuf::from(app.path_input.trim());
                app.begin_open(path);
            }
            if ui
                .add_enabled(idle, egui::Button::new("Browse…"))
                .on_hover_text("Choose an image (Ctrl+O)")
                .clicked()
            {
                app.pick_image();
            }
            if ui.add_enabled(idle && has_session, egui::Button::new("Close")).clicked() {
                app.close_image();
            }

            ui.separator();

            let can_undo = idle && app.controller().can_undo();
            let can_redo = idle && app.controller().can_redo();
            if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
                let result = app.controller_mut().undo();
                app.report(result);
            }
            if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
                let result = app.controller_mut().redo();
                app.report(result);
            }

            ui.separator();
            snap_controls(app, ui);
        });
    });
}

fn snap_controls(app: &mut SlicerApp, ui: &mut egui::Ui) {
    let current = app.controller().snap_mode();
    let mut kind = match current {
        SnapMode::Off => SnapKind::Off,
        SnapMode::Pixel => SnapKind::Pixel,
        SnapMode::Grid(_) => SnapKind::Grid,
    };

    egui::ComboBox::from_label("Snap")
        .selected_text(current.label())
        .show_ui(ui, |ui| {
            ui.selectable_value(&mut kind, SnapKind::Off, "Off");
            ui.selectable_value(&mut kind, SnapKind::Pixel, "Pixel");
            ui.selectable_value(&mut kind, SnapKind::Grid, "Grid");
        });

    let grid_changed = ui
        .add(
            egui::DragValue::new(&mut app.grid_size)
                .range(1..=10_000)
                .suffix(" px"),
        )
        .on_hover_text("Grid spacing")
        .changed();

    match kind {
        SnapKind::Off => app.controller_mut().set_snap_mode(SnapMode::Off),
        SnapKind::Pixel => app.controller_mut().set_snap_mode(SnapMode::Pixel),
        SnapKind::Grid if grid_changed || !matches!(current, SnapMode::Grid(_)) => {
            let size = app.grid_size;
            let result = app.controller_mut().set_grid_size(size);
            app.report(result);
        }
        SnapKind::Grid => {}
    }
}

pub fn status_bar(app: &mut SlicerApp, ctx: &egui::Context) {
    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if app.is_loading() {
                ui.spinner();
            }
            let feed = app.feed();
            ui.label(&feed.status);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if let Some(info) = &feed.session {
                    ui.weak(format!("{} x {} px", info.width, info.height));
                }
                ui.weak(format!("Snap: {}", app.controller().snap_mode()));
            });
        });
    });
}
