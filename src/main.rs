use datadock::app::DataDockApp;
use datadock::config::load_config;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "DataDock – Dataset Explorer",
        options,
        Box::new(|cc| {
            let app = DataDockApp::new(cc, config)?;
            Ok(Box::new(app))
        }),
    )
}
