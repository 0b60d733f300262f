use crate::SlicerApp;
use crate::guide::GuideId;
use crate::settings::FormatKind;

enum GuideAction {
    Select(GuideId),
    Lock(GuideId, bool),
    Delete(GuideId),
    ClearAll,
}

pub fn guides_panel(app: &mut SlicerApp, ctx: &egui::Context) {
    let default_width = app.settings().window_layout.side_panel_width;
    let panel = egui::SidePanel::left("guides_panel")
        .resizable(true)
        .default_width(default_width)
        .show(ctx, |ui| {
            guide_list(app, ui);
            ui.separator();
            export_section(app, ui);
            ui.separator();
            history_section(app, ui);
        });
    app.settings_mut().window_layout.side_panel_width = panel.response.rect.width();
}

fn guide_list(app: &mut SlicerApp, ui: &mut egui::Ui) {
    ui.heading("Guides");

    let guides = app.controller().guides();
    let selected = app.controller().selected();
    let editable = !app.controller().is_exporting();
    let mut action = None;

    if app.controller().session().is_none() {
        ui.weak("No image open");
    } else if guides.is_empty() {
        ui.weak("Drag down from the ruler to add a guide");
    }

    egui::ScrollArea::vertical()
        .id_salt("guide_list")
        .max_height(240.0)
        .show(ui, |ui| {
            for (index, guide) in guides.iter().enumerate() {
                ui.horizontal(|ui| {
                    let label = format!("{}. y = {}", index + 1, guide.position);
                    if ui.selectable_label(selected == Some(guide.id), label).clicked() {
                        action = Some(GuideAction::Select(guide.id));
                    }
                    let mut locked = guide.locked;
                    if ui
                        .add_enabled(editable, egui::Checkbox::new(&mut locked, "Lock"))
                        .changed()
                    {
                        action = Some(GuideAction::Lock(guide.id, locked));
                    }
                    if ui
                        .add_enabled(editable, egui::Button::new("Delete").small())
                        .clicked()
                    {
                        action = Some(GuideAction::Delete(guide.id));
                    }
                });
            }
        });

    if ui
        .add_enabled(editable && !guides.is_empty(), egui::Button::new("Clear all"))
        .clicked()
    {
        action = Some(GuideAction::ClearAll);
    }

    let Some(action) = action else {
        return;
    };
    let controller = app.controller_mut();
    let result = match action {
        GuideAction::Select(id) => controller.select_guide(Some(id)),
        GuideAction::Lock(id, locked) => controller.set_lock(id, locked),
        GuideAction::Delete(id) => controller.delete_guide(id),
        GuideAction::ClearAll => controller.clear_all_guides(),
    };
    app.report(result);
}

fn export_section(app: &mut SlicerApp, ui: &mut egui::Ui) {
    ui.heading("Export");

    let exporting = app.controller().is_exporting();
    let mut pick_folder = false;
    let form = &mut app.export_form;
    ui.add_enabled_ui(!exporting, |ui| {
        ui.horizontal(|ui| {
            ui.label("Folder");
            ui.text_edit_singleline(&mut form.destination);
        });
        if ui.button("Choose folder…").clicked() {
            pick_folder = true;
        }
        ui.horizontal(|ui| {
            ui.label("Prefix");
            ui.text_edit_singleline(&mut form.prefix);
        });
        egui::ComboBox::from_label("Format")
            .selected_text(format_label(form.format))
            .show_ui(ui, |ui| {
                for kind in [FormatKind::Png, FormatKind::Jpeg, FormatKind::Keep] {
                    ui.selectable_value(&mut form.format, kind, format_label(kind));
                }
            });
        if form.format == FormatKind::Jpeg {
            ui.add(egui::Slider::new(&mut form.jpeg_quality, 1..=100).text("Quality"));
        }
        ui.checkbox(&mut form.in_place, "Write directly into folder");
    });
    if pick_folder {
        app.pick_export_folder();
    }

    if exporting {
        let progress = app.controller().export_progress().unwrap_or_default();
        ui.add(
            egui::ProgressBar::new(progress.fraction())
                .text(format!("{} / {}", progress.done, progress.total)),
        );
        if app.controller().is_cancelling() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Cancelling…");
            });
        } else if ui.button("Cancel").clicked() {
            app.controller_mut().cancel_export();
        }
    } else {
        let ready = app.controller().session().is_some() && !app.is_loading();
        if ui.add_enabled(ready, egui::Button::new("Export slices")).clicked() {
            app.start_export();
        }
    }

    let summary = app.feed().last_report.as_ref().map(|report| {
        (report.summary(), report.directory.display().to_string(), report.is_success())
    });
    if let Some((summary, directory, success)) = summary {
        if success {
            ui.label(summary);
        } else {
            ui.colored_label(ui.visuals().warn_fg_color, summary);
        }
        ui.weak(directory);
    }
}

fn format_label(kind: FormatKind) -> &'static str {
    match kind {
        FormatKind::Png => "PNG",
        FormatKind::Jpeg => "JPEG",
        FormatKind::Keep => "Keep original",
    }
}

fn history_section(app: &mut SlicerApp, ui: &mut egui::Ui) {
    ui.heading("History");
    let Some(history) = app.controller().history() else {
        return;
    };

    ui.horizontal(|ui| {
        ui.label(format!("Undo: {}", history.undo_stack().len()));
        ui.label(format!("Redo: {}", history.redo_stack().len()));
    });

    egui::ScrollArea::vertical()
        .id_salt("history_list")
        .show(ui, |ui| {
            for command in history.undo_stack() {
                ui.label(command.label());
            }
            // Undone steps, most recently undone first
            for command in history.redo_stack().iter().rev() {
                ui.weak(command.label());
            }
        });
}
