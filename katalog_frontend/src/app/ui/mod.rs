pub(crate) mod activity;
mod comments;
mod feed;
mod search;
mod toasts;

use eframe::egui::{self, Color32, RichText};

use super::images::ImageCache;

pub(crate) const ACCENT: Color32 = Color32::from_rgb(0xe5, 0x6b, 0x3a);

/// Square thumbnail for an avatar or poster, with a placeholder while the
/// image downloads or when there is none.
pub(crate) fn thumbnail(ui: &mut egui::Ui, images: &mut ImageCache, url: Option<&str>, size: f32) {
    let side = egui::vec2(size, size);
    let texture = url.and_then(|url| images.texture(ui.ctx(), url));
    match texture {
        Some(tex) => {
            ui.add(egui::Image::from_texture(&tex).fit_to_exact_size(side));
        }
        None => {
            let (rect, _) = ui.allocate_exact_size(side, egui::Sense::hover());
            ui.painter()
                .rect_filled(rect, 4.0, ui.visuals().faint_bg_color);
        }
    }
}

pub(crate) fn link(ui: &mut egui::Ui, text: impl Into<String>) -> egui::Response {
    let response = ui.add(
        egui::Label::new(RichText::new(text.into()).strong()).sense(egui::Sense::click()),
    );
    if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }
    response
}
