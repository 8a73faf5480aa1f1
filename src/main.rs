// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod config;
mod engine;
mod gui;
mod parser;
mod types;
use config::AppConfig;
use eframe::egui;
// 入口函数
fn main() -> eframe::Result<()> {
    env_logger::init();
    let config = AppConfig::load();
    log::info!("starting with {config:?}");
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1280.0, 800.0])
        .with_min_inner_size([900.0, 600.0])
        .with_title("Serial Parser");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "Serial Parser",
        options,
        Box::new(move |_cc| Box::new(gui::SerialParserApp::new(config))),
    )
}
