use eframe::egui;

use crate::renderer::media_backend::VideoFrame;
use crate::types::config::FillMode;

const LABEL_MARGIN: f32 = 12.0;

/// Full-window video surface with an optional time overlay.
pub struct VideoView {
    pub texture: Option<egui::TextureHandle>,
    pub fill_mode: FillMode,
}

impl VideoView {
    pub fn new(fill_mode: FillMode) -> Self {
        Self {
            texture: None,
            fill_mode,
        }
    }

    /// Upload a decoded frame, reusing the texture when possible.
    pub fn update_texture(&mut self, ctx: &egui::Context, frame: &VideoFrame) {
        let size = [frame.width as usize, frame.height as usize];
        if frame.data.len() != size[0] * size[1] * 4 {
            log::warn!(
                "dropping frame with {} bytes for {}x{}",
                frame.data.len(),
                frame.width,
                frame.height
            );
            return;
        }
        log::trace!("uploading frame at {:?} s", frame.timestamp);
        let image = egui::ColorImage::from_rgba_unmultiplied(size, &frame.data);
        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("loopview_frame", image, egui::TextureOptions::LINEAR));
            }
        }
    }

    /// Paint into the whole available region. The returned response senses
    /// clicks anywhere in it.
    pub fn show(
        &self,
        ui: &mut egui::Ui,
        time_label: Option<&str>,
        placeholder: &str,
    ) -> egui::Response {
        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, egui::Sense::click());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, egui::Color32::BLACK);

        match &self.texture {
            Some(texture) => {
                let (dest, uv) = layout_video(texture.size_vec2(), rect, self.fill_mode);
                painter.image(texture.id(), dest, uv, egui::Color32::WHITE);
            }
            None => {
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    placeholder,
                    egui::FontId::proportional(16.0),
                    egui::Color32::GRAY,
                );
            }
        }

        if let Some(label) = time_label {
            painter.text(
                rect.left_top() + egui::vec2(LABEL_MARGIN, LABEL_MARGIN),
                egui::Align2::LEFT_TOP,
                label,
                egui::FontId::monospace(18.0),
                egui::Color32::WHITE,
            );
        }

        response
    }
}

/// Destination rect and UV rect for drawing a `frame`-sized image into
/// `container`.
pub fn layout_video(
    frame: egui::Vec2,
    container: egui::Rect,
    mode: FillMode,
) -> (egui::Rect, egui::Rect) {
    let full_uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    if frame.x <= 0.0 || frame.y <= 0.0 || container.width() <= 0.0 || container.height() <= 0.0 {
        return (container, full_uv);
    }

    let scale_x = container.width() / frame.x;
    let scale_y = container.height() / frame.y;
    match mode {
        FillMode::Stretch => (container, full_uv),
        FillMode::Fit => {
            let size = frame * scale_x.min(scale_y);
            (egui::Rect::from_center_size(container.center(), size), full_uv)
        }
        FillMode::Fill => {
            let scaled = frame * scale_x.max(scale_y);
            let visible = egui::vec2(container.width() / scaled.x, container.height() / scaled.y);
            let uv = egui::Rect::from_center_size(egui::pos2(0.5, 0.5), visible);
            (container, uv)
        }
    }
}
