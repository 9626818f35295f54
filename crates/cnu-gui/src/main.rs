//! CN Upload Results - Desktop GUI Application
//!
//! Sign in, pick a results workbook, check the preview and push the values
//! to QBench.

mod app;
mod views;

use eframe::egui;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("CN Upload Results")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "CN Upload Results",
        options,
        Box::new(|cc| Ok(Box::new(app::UploaderApp::new(cc)))),
    )
}
