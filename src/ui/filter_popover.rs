use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::filter::{
    BooleanChoice, BooleanFilter, CategoryFilter, DateFilter, DateOperator, FilterDefinition,
    NumberFilter, NumberOperator, StringFilter, StringOperator,
};
use crate::data::model::ColumnMetadata;
use crate::data::predicate::parse_timestamp;
use crate::session::ExplorationSession;

const ACTIVE_COLOR: Color32 = Color32::from_rgb(37, 99, 235);

// ---------------------------------------------------------------------------
// Column header filter button
// ---------------------------------------------------------------------------

/// Render the filter button of a column header and its popover.
///
/// Edits go to the session's draft for the column and only take effect on
/// "Apply".
pub fn filter_button(ui: &mut Ui, session: &mut ExplorationSession, column: &ColumnMetadata) {
    let applied = session.filter(&column.name).cloned();
    let active = applied.as_ref().is_some_and(FilterDefinition::is_active);
    let icon = if active {
        RichText::new("⏷").color(ACTIVE_COLOR)
    } else {
        RichText::new("⏷").weak()
    };

    let response = ui.menu_button(icon, |ui: &mut Ui| filter_menu(ui, session, column));
    if response.inner.is_none() {
        // Popover closed without applying.
        session.discard_draft(&column.name);
    }
    if let Some(filter) = applied {
        response.response.on_hover_text(filter.to_string());
    }
}

fn filter_menu(ui: &mut Ui, session: &mut ExplorationSession, column: &ColumnMetadata) {
    ui.set_min_width(240.0);
    ui.strong(format!("Filter: {}", column.name));
    ui.separator();

    let Some(draft) = session.draft_mut(&column.name) else {
        ui.label("Unknown column.");
        return;
    };
    let salt = column.name.as_str();
    match &mut draft.definition {
        FilterDefinition::String(f) => string_editor(ui, salt, f),
        FilterDefinition::Number(f)
        | FilterDefinition::Integer(f)
        | FilterDefinition::Float(f) => number_editor(ui, salt, f),
        FilterDefinition::Boolean(f) => boolean_editor(ui, salt, f),
        FilterDefinition::Category(f) => {
            category_editor(ui, f, &column.distinct_values, &mut draft.search)
        }
        FilterDefinition::Date(f) => date_editor(ui, salt, f, true),
        FilterDefinition::DateTime(f) => date_editor(ui, salt, f, false),
    }

    ui.separator();
    let mut apply = false;
    let mut clear = false;
    ui.horizontal(|ui: &mut Ui| {
        clear = ui.button("Clear").clicked();
        apply = ui.button("Apply").clicked();
    });

    if apply {
        session.apply_draft(&column.name);
        ui.close_menu();
    } else if clear {
        session.discard_draft(&column.name);
        session.clear_filter(&column.name);
        ui.close_menu();
    }
}

// ---------------------------------------------------------------------------
// Per-kind editors
// ---------------------------------------------------------------------------

fn string_editor(ui: &mut Ui, salt: &str, filter: &mut StringFilter) {
    ui.label("Operator");
    egui::ComboBox::from_id_salt(format!("{salt}-string-op"))
        .selected_text(filter.operator.label())
        .show_ui(ui, |ui: &mut Ui| {
            for op in StringOperator::ALL {
                ui.selectable_value(&mut filter.operator, op, op.label());
            }
        });

    if filter.operator.takes_operand() {
        ui.label("Value");
        ui.add(egui::TextEdit::singleline(&mut filter.value).hint_text("Type a value…"));
    }
}

fn number_editor(ui: &mut Ui, salt: &str, filter: &mut NumberFilter) {
    ui.label("Operator");
    egui::ComboBox::from_id_salt(format!("{salt}-number-op"))
        .selected_text(filter.operator.label())
        .show_ui(ui, |ui: &mut Ui| {
            for op in NumberOperator::ALL {
                ui.selectable_value(&mut filter.operator, op, op.label());
            }
        });

    if !filter.operator.takes_operand() {
        return;
    }
    let between = filter.operator == NumberOperator::Between;
    ui.label(if between { "Minimum" } else { "Value" });
    ui.add(egui::TextEdit::singleline(&mut filter.value).hint_text("0"));
    if between {
        ui.label("Maximum");
        let upper = filter.value2.get_or_insert_with(String::new);
        ui.add(egui::TextEdit::singleline(upper).hint_text("100"));
    }
}

fn boolean_editor(ui: &mut Ui, salt: &str, filter: &mut BooleanFilter) {
    ui.label("Value");
    egui::ComboBox::from_id_salt(format!("{salt}-bool"))
        .selected_text(filter.value.label())
        .show_ui(ui, |ui: &mut Ui| {
            for choice in BooleanChoice::ALL {
                ui.selectable_value(&mut filter.value, choice, choice.label());
            }
        });
}

fn category_editor(
    ui: &mut Ui,
    filter: &mut CategoryFilter,
    options: &[String],
    search: &mut String,
) {
    ui.add(egui::TextEdit::singleline(search).hint_text("Search…"));
    let needle = search.to_lowercase();
    let shown: Vec<&String> = options
        .iter()
        .filter(|opt| opt.to_lowercase().contains(&needle))
        .collect();

    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("Select all").clicked() {
            filter.values = shown.iter().map(|s| s.to_string()).collect();
        }
        if ui.small_button("Clear").clicked() {
            filter.values.clear();
        }
    });

    ScrollArea::vertical()
        .max_height(150.0)
        .auto_shrink([false, true])
        .show(ui, |ui: &mut Ui| {
            if shown.is_empty() {
                ui.weak("No options found");
            }
            for option in shown {
                let mut checked = filter.values.contains(option);
                let label = if option.is_empty() { "(empty)" } else { option.as_str() };
                if ui.checkbox(&mut checked, label).changed() {
                    if checked {
                        filter.values.push(option.clone());
                    } else {
                        filter.values.retain(|v| v != option);
                    }
                }
            }
        });

    if !filter.values.is_empty() {
        ui.weak(format!("{} selected", filter.values.len()));
    }
}

fn date_editor(ui: &mut Ui, salt: &str, filter: &mut DateFilter, date_only: bool) {
    ui.label("Operator");
    egui::ComboBox::from_id_salt(format!("{salt}-date-op"))
        .selected_text(filter.operator.label())
        .show_ui(ui, |ui: &mut Ui| {
            for op in DateOperator::ALL {
                ui.selectable_value(&mut filter.operator, op, op.label());
            }
        });

    if !filter.operator.takes_operand() {
        return;
    }
    let between = filter.operator == DateOperator::Between;
    let hint = if date_only { "YYYY-MM-DD" } else { "YYYY-MM-DDTHH:MM" };

    ui.label(if between { "From" } else { "Date" });
    date_input(ui, &format!("{salt}-from"), &mut filter.value, hint, date_only);
    if between {
        ui.label("To");
        let end = filter.value2.get_or_insert_with(String::new);
        date_input(ui, &format!("{salt}-to"), end, hint, date_only);
    }
}

fn date_input(ui: &mut Ui, id: &str, value: &mut String, hint: &str, picker: bool) {
    ui.horizontal(|ui: &mut Ui| {
        ui.add(
            egui::TextEdit::singleline(value)
                .hint_text(hint)
                .desired_width(140.0),
        );
        if picker {
            let mut date = parse_timestamp(value)
                .map(|t| t.date())
                .unwrap_or_else(|| chrono::Local::now().date_naive());
            if ui.add(DatePickerButton::new(&mut date).id_salt(id)).changed() {
                *value = date.format("%Y-%m-%d").to_string();
            }
        }
    });
}
