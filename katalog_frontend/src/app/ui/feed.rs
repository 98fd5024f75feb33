use std::time::Instant;

use chrono::Utc;
use eframe::egui::{self, Color32, RichText};

use super::super::feed::FeedSource;
use super::super::{KatalogApp, View};
use super::activity::{render_card, CardEnv, CardOutput};
use super::ACCENT;

impl KatalogApp {
    pub(crate) fn render_top_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading(RichText::new("Katalog").color(ACCENT));
            ui.separator();
            if ui.selectable_label(self.view == View::Home, "Home").clicked() {
                self.go_home();
            }
            if ui
                .selectable_label(self.view == View::Explore, "Explore")
                .clicked()
            {
                self.open_explore();
            }
            let viewer = self.session.viewer().map(|v| v.username.clone());
            if let Some(username) = viewer {
                let on_own = self.view == View::Profile
                    && self.profile.as_ref().is_some_and(|p| p.is_own_profile());
                if ui.selectable_label(on_own, "My profile").clicked() {
                    self.open_profile(&username);
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                match self.session.viewer() {
                    Some(viewer) => {
                        ui.label(format!("@{}", viewer.username));
                        let unread = self.badge.unread();
                        let bell = if unread > 0 {
                            RichText::new(format!("🔔 {unread}")).color(ACCENT).strong()
                        } else {
                            RichText::new("🔔")
                        };
                        ui.label(bell);
                    }
                    None => {
                        ui.label(RichText::new("Browsing anonymously").weak());
                    }
                }
            });
        });
    }

    pub(crate) fn render_feed(&mut self, ui: &mut egui::Ui) {
        let source = match (self.view, self.profile.as_ref()) {
            (View::Profile, Some(profile)) => profile.source().clone(),
            (View::Profile, None) => {
                ui.label("No profile selected.");
                return;
            }
            _ => FeedSource::Home,
        };
        let error = self.feed_error(&source);
        let loading = self.is_feed_loading(&source);
        let more_error = self.next_page_error();

        match &source {
            FeedSource::Home => ui.heading("Your feed"),
            FeedSource::Profile { username } => ui.heading(format!("@{username}")),
        };
        if let Some(error) = error {
            let mut retry = false;
            ui.horizontal(|ui| {
                ui.colored_label(Color32::LIGHT_RED, format!("Could not load the feed: {error}"));
                retry = ui.button("Retry").clicked();
            });
            if retry {
                self.retry_feed();
            }
        }
        ui.separator();

        let mut outputs: Vec<CardOutput> = Vec::new();
        let mut reached_end = false;
        let mut retry_more = false;
        {
            let feed = match source {
                FeedSource::Home => &mut self.home,
                FeedSource::Profile { .. } => match self.profile.as_mut() {
                    Some(profile) => profile,
                    None => return,
                },
            };
            let mut env = CardEnv {
                session: &self.session,
                dispatcher: &self.dispatcher,
                images: &mut self.images,
                now: Utc::now(),
            };

            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    if feed.items().is_empty() {
                        if loading {
                            ui.spinner();
                        } else {
                            ui.label(RichText::new("Nothing here yet.").weak().italics());
                        }
                    }
                    for item in feed.items_mut() {
                        outputs.push(render_card(ui, item, &mut env));
                        ui.add_space(6.0);
                    }
                    if let Some(error) = &more_error {
                        ui.horizontal(|ui| {
                            ui.colored_label(
                                Color32::LIGHT_RED,
                                format!("Could not load more: {error}"),
                            );
                            retry_more = ui.button("Retry").clicked();
                        });
                    } else if feed.has_more() {
                        let sentinel = ui.add(egui::Spinner::new());
                        reached_end = ui.is_rect_visible(sentinel.rect);
                    } else if !feed.items().is_empty() {
                        ui.label(RichText::new("You're all caught up.").weak());
                    }
                });
        }

        let now = Instant::now();
        if retry_more {
            self.retry_next_page();
        }
        if reached_end {
            self.load_more(now);
        }
        for output in outputs {
            for notice in output.notices {
                self.toasts.error(notice, now);
            }
            if let Some(activity_id) = output.delete {
                self.spawn_delete(&activity_id);
            }
            if let Some(target) = output.navigate {
                self.navigate(target);
            }
        }
    }
}
