use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{CellValue, ColumnMetadata};
use crate::state::AppState;

use super::filter_popover::filter_button;

// ---------------------------------------------------------------------------
// Data table (central panel)
// ---------------------------------------------------------------------------

/// Render the filtered rows of the open dataset.
pub fn data_table(ui: &mut Ui, state: &mut AppState) {
    let Some(session) = state.session.as_mut() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Pick a dataset from the list to explore it");
        });
        return;
    };

    if session.is_loading() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.spinner();
        });
        return;
    }

    // Cloned so the header can mutate filter drafts while iterating.
    let columns: Vec<ColumnMetadata> = session.visible_columns().into_iter().cloned().collect();
    if columns.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("No columns selected.");
        });
        return;
    }

    let text_height = egui::TextStyle::Body.resolve(ui.style()).size;

    egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(Column::auto().at_least(110.0).clip(true), columns.len())
            .min_scrolled_height(0.0)
            .header(text_height + 10.0, |mut header| {
                for column in &columns {
                    header.col(|ui: &mut Ui| {
                        ui.label(RichText::new(&column.name).strong())
                            .on_hover_text(format!("{} ({})", column.declared_type, column.kind));
                        filter_button(ui, session, column);
                    });
                }
            })
            .body(|body| {
                body.rows(text_height + 6.0, session.visible_count(), |mut row| {
                    let Some(record) = session.visible_row(row.index()) else {
                        return;
                    };
                    for column in &columns {
                        row.col(|ui: &mut Ui| {
                            let cell = record.get(&column.name).unwrap_or(&CellValue::Null);
                            match cell {
                                CellValue::Null => ui.weak(cell.to_string()),
                                _ => ui.label(cell.to_string()),
                            };
                        });
                    }
                });
            });
    });

    if session.visible_count() == 0 && !session.rows().is_empty() {
        ui.label("No rows match the active filters.");
    }
}
