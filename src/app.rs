use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use crate::api::ApiError;
use crate::config::Config;
use crate::state::{AppState, Waker};
use crate::ui::{panels, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DataDockApp {
    pub state: AppState,
}

impl DataDockApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: Config) -> Result<Self, ApiError> {
        let ctx = cc.egui_ctx.clone();
        let waker: Waker = Arc::new(move || ctx.request_repaint());

        let mut state = AppState::new(config, waker)?;
        state.refresh_datasets();
        Ok(Self { state })
    }
}

impl eframe::App for DataDockApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll();

        if let Some(pending) = self.state.pending_save.take() {
            panels::save_file_dialog(&mut self.state, pending);
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: datasets and columns ----
        egui::SidePanel::left("dataset_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: notifications ----
        if !self.state.notifications.is_empty() {
            egui::TopBottomPanel::bottom("notifications").show(ctx, |ui| {
                panels::notification_bar(ui, &mut self.state);
            });
            // Keep ticking so notifications expire without input.
            ctx.request_repaint_after(Duration::from_secs(1));
        }

        // ---- Central panel: data table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            table::data_table(ui, &mut self.state);
        });
    }
}
