use crate::InkApp;
use crate::persistence::SaveStatus;
use crate::tools::Tool;

pub fn tools_panel(app: &mut InkApp, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(200.0)
        .show(ctx, |ui| {
            ui.heading("Tools");

            let active = app.canvas().brush().tool;
            for tool in Tool::ALL {
                let label = format!("{} {}", tool.icon(), tool.name());
                if ui.selectable_label(active == tool, label).clicked() {
                    log::info!("Tool selected from UI: {}", tool.name());
                    app.canvas_mut().set_tool(tool);
                }
            }
            ui.separator();

            brush_controls(app, ui);
            ui.separator();

            // Undo/Redo section
            ui.horizontal(|ui| {
                let can_undo = app.canvas().can_undo();
                let can_redo = app.canvas().can_redo();

                if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
                    let repaint = app.canvas_mut().undo();
                    app.queue_repaint(repaint);
                }
                if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
                    let repaint = app.canvas_mut().redo();
                    app.queue_repaint(repaint);
                }
            });

            ui.horizontal(|ui| {
                if ui.button("−").clicked() {
                    let repaint = app.canvas_mut().zoom_out();
                    app.queue_repaint(repaint);
                }
                ui.label(format!("{:.0}%", app.canvas().viewport().zoom() * 100.0));
                if ui.button("+").clicked() {
                    let repaint = app.canvas_mut().zoom_in();
                    app.queue_repaint(repaint);
                }
                if ui.button("Reset").clicked() {
                    let repaint = app.canvas_mut().reset_view();
                    app.queue_repaint(repaint);
                }
            });

            let clear_enabled = !app.canvas().content().is_empty();
            if ui.add_enabled(clear_enabled, egui::Button::new("Clear page")).clicked() {
                let repaint = app.canvas_mut().clear();
                app.queue_repaint(repaint);
            }
            ui.separator();

            ui.label(format!("Strokes: {}", app.canvas().content().len()));
            let status = match app.canvas().save_status() {
                SaveStatus::Saved => egui::RichText::new("Saved"),
                SaveStatus::Saving => egui::RichText::new("Saving…").weak(),
                SaveStatus::Error => egui::RichText::new("Save failed").color(ui.visuals().error_fg_color),
            };
            ui.label(status);
        });
}

fn brush_controls(app: &mut InkApp, ui: &mut egui::Ui) {
    let mut brush = app.canvas().brush().clone();
    let before = brush.clone();

    egui::Grid::new("brush_grid")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            ui.label("Color");
            ui.color_edit_button_srgba(&mut brush.color);
            ui.end_row();

            ui.label("Size");
            ui.add(egui::Slider::new(&mut brush.size, 1.0..=64.0));
            ui.end_row();

            ui.label("Opacity");
            ui.add(egui::Slider::new(&mut brush.opacity, 0.0..=1.0));
            ui.end_row();
        });

    egui::CollapsingHeader::new("Stroke shape").show(ui, |ui| {
        ui.add(egui::Slider::new(&mut brush.thinning, -1.0..=1.0).text("Thinning"));
        ui.add(egui::Slider::new(&mut brush.smoothing, 0.0..=1.0).text("Smoothing"));
        ui.add(egui::Slider::new(&mut brush.streamline, 0.0..=1.0).text("Streamline"));
        ui.checkbox(&mut brush.simulate_pressure, "Simulate pressure");
        ui.checkbox(&mut brush.cap_start, "Cap start");
        ui.checkbox(&mut brush.cap_end, "Cap end");
        ui.add(egui::Slider::new(&mut brush.taper_start, 0.0..=100.0).text("Taper start"));
        ui.add(egui::Slider::new(&mut brush.taper_end, 0.0..=100.0).text("Taper end"));
    });

    if brush != before {
        let repaint = app.canvas_mut().set_brush(brush);
        app.queue_repaint(repaint);
    }
}
