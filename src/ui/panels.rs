use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::export::ExportFormat;
use crate::data::model::DatasetSummary;
use crate::state::{AppState, NotificationLevel, PendingSave};

// ---------------------------------------------------------------------------
// Left side panel – catalogue, search, column selection
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("DataDock");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            search_section(ui, state);
            ui.separator();
            catalogue_section(ui, state);
            ui.separator();
            column_section(ui, state);
        });
}

fn search_section(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Search");
    let mut submit = false;
    ui.horizontal(|ui: &mut Ui| {
        let response = ui.add(
            egui::TextEdit::singleline(&mut state.search_query)
                .hint_text("Term to search for…")
                .desired_width(150.0),
        );
        submit |= response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        submit |= ui
            .add_enabled(!state.searching, egui::Button::new("Go"))
            .clicked();
    });
    if submit {
        state.search();
    }
    if state.searching {
        ui.spinner();
    }

    let mut open = None;
    if let Some(hits) = &state.search_results {
        for hit in hits {
            let label = format!("{}  ({} matches)", hit.table_name, hit.count);
            if ui
                .selectable_label(false, label)
                .on_hover_text(hit.columns.join(", "))
                .clicked()
            {
                open = Some(DatasetSummary::bare(hit.process_id, &hit.table_name));
            }
        }
    }
    if let Some(dataset) = open {
        state.open_dataset(dataset);
    }
}

fn catalogue_section(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Public datasets");
        if ui
            .add_enabled(!state.datasets_loading, egui::Button::new("⟳").small())
            .on_hover_text("Refresh")
            .clicked()
        {
            state.refresh_datasets();
        }
    });

    if state.datasets_loading {
        ui.spinner();
        return;
    }
    if state.datasets.is_empty() {
        ui.label("No public datasets.");
        return;
    }

    let current = state.session.as_ref().map(|s| s.dataset().id);
    let mut open = None;
    for dataset in &state.datasets {
        let selected = current == Some(dataset.id);
        let response = ui.selectable_label(selected, RichText::new(&dataset.table_name).strong());
        ui.weak(format!(
            "{} records · {} columns",
            dataset.record_count, dataset.column_count
        ));
        if response.clicked() {
            open = Some(dataset.clone());
        }
    }
    if let Some(dataset) = open {
        state.open_dataset(dataset);
    }
}

fn column_section(ui: &mut Ui, state: &mut AppState) {
    let Some(session) = state.session.as_mut() else {
        return;
    };
    if session.columns().is_empty() {
        return;
    }

    egui::CollapsingHeader::new(RichText::new("Columns").strong())
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            let mut all = session.all_selected();
            if ui.checkbox(&mut all, "All").changed() {
                session.toggle_all_columns();
            }

            let columns: Vec<(String, String)> = session
                .columns()
                .iter()
                .map(|c| (c.name.clone(), c.kind.to_string()))
                .collect();
            for (name, kind) in columns {
                let mut checked = session.is_selected(&name);
                let filtered = session.filter(&name).is_some();
                let mut text = RichText::new(format!("{name}  [{kind}]"));
                if filtered {
                    text = text.italics();
                }
                if ui.checkbox(&mut checked, text).changed() {
                    session.toggle_column(&name);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Refresh datasets").clicked() {
                state.refresh_datasets();
                ui.close_menu();
            }
            if ui
                .add_enabled(state.session.is_some(), egui::Button::new("Close dataset"))
                .clicked()
            {
                state.close_dataset();
                ui.close_menu();
            }
        });

        ui.separator();

        let Some(session) = state.session.as_mut() else {
            ui.label("No dataset open");
            return;
        };

        ui.label(RichText::new(&session.dataset().table_name).strong());
        ui.label(format!(
            "{} of {} rows visible",
            session.visible_count(),
            session.rows().len()
        ));

        let filters = session.active_filters().len();
        if filters > 0 {
            ui.separator();
            if ui
                .button(format!("Clear {filters} filter(s)"))
                .clicked()
            {
                session.clear_all_filters();
            }
        }

        ui.separator();

        egui::ComboBox::from_id_salt("export_format")
            .selected_text(state.export_format.label())
            .show_ui(ui, |ui: &mut Ui| {
                for format in ExportFormat::ALL {
                    ui.selectable_value(&mut state.export_format, format, format.label());
                }
            });
        if ui
            .add_enabled(!state.downloading, egui::Button::new("Download"))
            .clicked()
        {
            state.start_download();
        }
        if state.downloading {
            ui.spinner();
        }
    });
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Render pending notifications with a dismiss button each.
pub fn notification_bar(ui: &mut Ui, state: &mut AppState) {
    let mut dismissed = Vec::new();
    for note in state.notifications.iter() {
        let color = match note.level {
            NotificationLevel::Info => Color32::GRAY,
            NotificationLevel::Success => Color32::from_rgb(22, 163, 74),
            NotificationLevel::Warning => Color32::from_rgb(217, 119, 6),
            NotificationLevel::Error => Color32::RED,
        };
        ui.horizontal(|ui: &mut Ui| {
            if ui.small_button("✕").clicked() {
                dismissed.push(note.id);
            }
            ui.label(RichText::new(&note.message).color(color));
        });
    }
    for id in dismissed {
        state.notifications.dismiss(id);
    }
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

/// Ask where to store a finished download and write it.
pub fn save_file_dialog(state: &mut AppState, pending: PendingSave) {
    let file = rfd::FileDialog::new()
        .set_title("Save export")
        .set_file_name(&pending.filename)
        .save_file();

    match file {
        Some(path) => state.save_download(pending, &path),
        None => {
            log::info!("Save of {} cancelled", pending.filename);
            state
                .notifications
                .push(NotificationLevel::Info, "Download cancelled");
        }
    }
}
