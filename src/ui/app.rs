use eframe::egui;
use std::sync::Arc;

use crate::renderer::gst_backend::{GstBackend, GstOptions, RepaintHook};
use crate::renderer::playback_controller::PlaybackController;
use crate::types::config::PlayerConfig;
use crate::types::resource_bundle::ResourceBundle;
use crate::ui::video_player::VideoView;

pub struct LoopViewApp {
    pub config: PlayerConfig,
    pub controller: PlaybackController<GstBackend>,
    pub video_view: VideoView,
}

impl LoopViewApp {
    /// Build the app and start playback. A missing resource leaves the
    /// window open with nothing playing.
    pub fn new(cc: &eframe::CreationContext<'_>, config: PlayerConfig) -> Self {
        let egui_ctx = cc.egui_ctx.clone();
        let repaint: RepaintHook = Arc::new(move || egui_ctx.request_repaint());
        let options = GstOptions {
            muted: config.muted,
            repaint: Some(repaint),
        };

        let bundle = ResourceBundle::main(&config.resource_dirs);
        let mut controller = PlaybackController::new(&config);
        if let Err(e) = controller.start(&bundle, |path| GstBackend::open(path, options)) {
            log::warn!("playback not started: {e}");
        }

        Self {
            video_view: VideoView::new(config.fill_mode),
            config,
            controller,
        }
    }
}

impl eframe::App for LoopViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Backend events and ticks are applied here, on the UI thread.
        self.controller.poll();
        if let Some(frame) = self.controller.take_frame() {
            self.video_view.update_texture(ctx, &frame);
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let time_text = self.controller.time_text();
                let label = (self.config.show_time_label && !time_text.is_empty())
                    .then_some(time_text);
                let placeholder = if self.controller.state().has_session() {
                    ""
                } else {
                    "No video"
                };

                let response = self.video_view.show(ui, label, placeholder);
                if response.clicked() {
                    let state = self.controller.on_tap();
                    log::debug!("tap -> {state:?}");
                }
            });

        if self.controller.state().is_playing() {
            ctx.request_repaint_after(self.config.tick_interval());
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.controller.teardown();
    }
}
