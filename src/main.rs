mod error;
mod renderer;
mod types;
mod ui;

use crate::types::config::PlayerConfig;
use crate::ui::app::LoopViewApp;
use eframe::egui;
use gstreamer as gst;

use std::path::PathBuf;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = gst::init() {
        log::error!("failed to initialise GStreamer: {e}");
    }

    let config = PlayerConfig::discover(std::env::args_os().nth(1).map(PathBuf::from));

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(config.window_title.clone())
            .with_inner_size(config.window_size),
        ..Default::default()
    };
    let title = config.window_title.clone();
    eframe::run_native(
        &title,
        native_options,
        Box::new(move |cc| Ok(Box::new(LoopViewApp::new(cc, config)))),
    )
}
