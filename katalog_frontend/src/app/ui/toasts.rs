use eframe::egui::{self, Color32, RichText};

use super::super::toasts::ToastLevel;
use super::super::KatalogApp;

impl KatalogApp {
    pub(crate) fn render_toasts(&mut self, ctx: &egui::Context) {
        if self.toasts.is_empty() {
            return;
        }
        let mut dismissed = None;
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
            .show(ctx, |ui| {
                for (index, toast) in self.toasts.iter().enumerate() {
                    let fill = match toast.level {
                        ToastLevel::Info => Color32::from_rgb(0x2e, 0x4a, 0x3a),
                        ToastLevel::Error => Color32::from_rgb(0x5a, 0x24, 0x24),
                    };
                    egui::Frame::popup(ui.style()).fill(fill).show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(&toast.text).color(Color32::WHITE));
                            if ui.small_button("✕").clicked() {
                                dismissed = Some(index);
                            }
                        });
                    });
                }
            });
        if let Some(index) = dismissed {
            self.toasts.dismiss(index);
        }
    }
}
