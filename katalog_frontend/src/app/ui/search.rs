use std::time::Instant;

use eframe::egui::{self, Color32, RichText};

use crate::models::ContentSummary;

use super::super::render::NavTarget;
use super::super::search::SearchPhase;
use super::super::KatalogApp;
use super::{link, thumbnail};

fn render_phase(ui: &mut egui::Ui, phase: &SearchPhase, empty_text: &str) {
    match phase {
        SearchPhase::Idle => {}
        SearchPhase::Debouncing | SearchPhase::Loading => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Searching...");
            });
        }
        SearchPhase::Empty => {
            ui.label(RichText::new(empty_text).italics());
        }
        SearchPhase::Error(message) => {
            ui.colored_label(Color32::LIGHT_RED, message.as_str());
        }
        SearchPhase::Results => {}
    }
}

impl KatalogApp {
    pub(crate) fn render_user_search(&mut self, ui: &mut egui::Ui) {
        ui.heading("Find people");
        let mut query = self.user_search.query().to_string();
        let response = ui.add(
            egui::TextEdit::singleline(&mut query)
                .hint_text("Search users...")
                .desired_width(f32::INFINITY),
        );
        if response.changed() {
            self.user_search.set_query(query, Instant::now());
        }
        render_phase(ui, self.user_search.phase(), "No users found");

        let mut selected = None;
        for user in self.user_search.results() {
            ui.horizontal(|ui| {
                thumbnail(ui, &mut self.images, user.avatar_url.as_deref(), 28.0);
                ui.vertical(|ui| {
                    if link(ui, user.display()).clicked() {
                        selected = Some(user.username.clone());
                    }
                    ui.label(RichText::new(format!("@{}", user.username)).weak().small());
                });
            });
        }
        if let Some(username) = selected {
            self.user_search.clear();
            self.open_profile(&username);
        }
    }

    pub(crate) fn render_explore(&mut self, ui: &mut egui::Ui) {
        ui.heading("Explore films, series and books");
        let mut query = self.content_search.query().to_string();
        let response = ui.add(
            egui::TextEdit::singleline(&mut query)
                .hint_text("Search titles...")
                .desired_width(f32::INFINITY),
        );
        if response.changed() {
            self.content_search.set_query(query, Instant::now());
        }
        render_phase(ui, self.content_search.phase(), "No titles found");
        ui.separator();

        let mut selected: Option<ContentSummary> = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                for content in self.content_search.results() {
                    ui.horizontal(|ui| {
                        thumbnail(ui, &mut self.images, content.poster_url.as_deref(), 48.0);
                        ui.vertical(|ui| {
                            if link(ui, content.title.as_str()).clicked() {
                                selected = Some(content.clone());
                            }
                            let detail = match content.year {
                                Some(year) => format!("{} · {year}", content.kind.label()),
                                None => content.kind.label().to_string(),
                            };
                            ui.label(RichText::new(detail).weak().small());
                        });
                    });
                }
            });
        if let Some(content) = selected {
            self.navigate(NavTarget::Content {
                kind: content.kind,
                id: content.id,
                comment_id: None,
            });
        }
    }
}
