#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use eframe::egui;
use egui_fleet::app::FleetApp;
use tr::tr;
#[cfg(not(windows))]
use tr::tr_init;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,egui_fleet=debug")),
        )
        .init();

    #[cfg(not(windows))]
    tr_init!("./locales");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(tr!("Server manager"))
            .with_inner_size([1100.0, 620.0])
            .with_resizable(true),
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };

    eframe::run_native(
        "egui_fleet",
        options,
        Box::new(|cc| Ok(Box::new(FleetApp::new(cc)?))),
    )
}
