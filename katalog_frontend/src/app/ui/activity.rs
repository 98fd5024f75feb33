use chrono::{DateTime, Utc};
use eframe::egui::{self, Color32, RichText};

use crate::models::{ActivityPayload, ContentSummary};

use super::super::feed_item::{CommentPane, FeedItemState};
use super::super::images::ImageCache;
use super::super::render::{
    action_text, format_relative, primary_target, score_badge, status_label, NavTarget,
};
use super::super::session::Session;
use super::super::tasks::Dispatcher;
use super::{comments, link, thumbnail, ACCENT};

const AVATAR_SIZE: f32 = 32.0;
const POSTER_SIZE: f32 = 56.0;

/// What a card needs from the app while it draws.
pub(crate) struct CardEnv<'a> {
    pub session: &'a Session,
    pub dispatcher: &'a Dispatcher,
    pub images: &'a mut ImageCache,
    pub now: DateTime<Utc>,
}

/// What the user asked for while the card was drawn; applied by the app.
#[derive(Default)]
pub(crate) struct CardOutput {
    pub navigate: Option<NavTarget>,
    pub delete: Option<String>,
    pub notices: Vec<String>,
}

pub(crate) fn render_card(
    ui: &mut egui::Ui,
    item: &mut FeedItemState,
    env: &mut CardEnv<'_>,
) -> CardOutput {
    let mut out = CardOutput::default();
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(ui.available_width());
        render_header(ui, item, env, &mut out);
        ui.add_space(4.0);
        render_payload(ui, item, env, &mut out);
        ui.add_space(4.0);
        render_footer(ui, item, env);
        if item.pane() != CommentPane::Collapsed {
            ui.separator();
            comments::render_thread(ui, item, env, &mut out);
        }
    });
    out
}

fn render_header(
    ui: &mut egui::Ui,
    item: &mut FeedItemState,
    env: &mut CardEnv<'_>,
    out: &mut CardOutput,
) {
    let activity = item.activity();
    let username = activity.actor.username.clone();
    let avatar = activity.actor.avatar_url.clone();
    let action = action_text(activity);
    let when = format_relative(&activity.created_at, env.now);

    ui.horizontal(|ui| {
        thumbnail(ui, env.images, avatar.as_deref(), AVATAR_SIZE);
        if link(ui, format!("@{username}")).clicked() {
            out.navigate = Some(NavTarget::Profile {
                username: username.clone(),
            });
        }
        ui.label(action);
        ui.label(RichText::new(when).weak().small());

        if item.can_delete() {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("⋯").clicked() {
                    item.toggle_menu();
                }
            });
        }
    });

    if item.menu_open() {
        ui.horizontal(|ui| {
            let delete = egui::Button::new(RichText::new("Delete activity").color(Color32::LIGHT_RED));
            if ui.add(delete).clicked() {
                item.request_delete(|id| out.delete = Some(id.to_string()));
            }
            if ui.button("Cancel").clicked() {
                item.close_menu();
            }
        });
    }
}

fn content_line(
    ui: &mut egui::Ui,
    images: &mut ImageCache,
    content: &ContentSummary,
    detail: Option<String>,
) -> bool {
    let mut clicked = false;
    ui.horizontal(|ui| {
        thumbnail(ui, images, content.poster_url.as_deref(), POSTER_SIZE);
        ui.vertical(|ui| {
            let title = match content.year {
                Some(year) => format!("{} ({year})", content.title),
                None => content.title.clone(),
            };
            clicked = link(ui, title).clicked();
            ui.label(RichText::new(content.kind.label()).weak().small());
            if let Some(detail) = detail {
                ui.label(detail);
            }
        });
    });
    clicked
}

fn render_payload(
    ui: &mut egui::Ui,
    item: &mut FeedItemState,
    env: &mut CardEnv<'_>,
    out: &mut CardOutput,
) {
    let target = primary_target(item.activity());
    let payload = item.activity().payload.clone();
    let mut open_target = false;

    match &payload {
        ActivityPayload::Rating(p) => {
            let badge = format!("★ {}", score_badge(p.score));
            open_target = content_line(ui, env.images, &p.content, Some(badge));
        }
        ActivityPayload::StatusUpdate(p) => {
            let label = status_label(p.status, p.content.kind).to_string();
            open_target = content_line(ui, env.images, &p.content, Some(label));
        }
        ActivityPayload::ListAddition(p) => {
            let detail = format!("in \"{}\"", p.list_name);
            open_target = content_line(ui, env.images, &p.content, Some(detail));
        }
        ActivityPayload::Comment(p) => {
            open_target = content_line(ui, env.images, &p.content, None);
            render_comment_excerpt(ui, item, &mut open_target);
        }
        ActivityPayload::Follow(p) => {
            ui.horizontal(|ui| {
                thumbnail(ui, env.images, p.user.avatar_url.as_deref(), AVATAR_SIZE);
                open_target = link(ui, p.user.display()).clicked();
            });
        }
        ActivityPayload::ListCreation { .. } | ActivityPayload::Unknown { .. } => {}
    }

    if open_target {
        out.navigate = target;
    }
}

fn render_comment_excerpt(ui: &mut egui::Ui, item: &mut FeedItemState, read_more: &mut bool) {
    if item.spoiler_hidden() {
        egui::Frame::none()
            .fill(ui.visuals().extreme_bg_color)
            .inner_margin(6.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new("This comment contains spoilers.").italics());
                    if ui.small_button("Show").clicked() {
                        item.reveal_spoiler();
                    }
                });
            });
        return;
    }

    let spoiler = matches!(&item.activity().payload, ActivityPayload::Comment(p) if p.spoiler);
    if let Some(excerpt) = item.excerpt() {
        let truncated = excerpt.truncated;
        ui.label(format!("“{}”", excerpt.text));
        if truncated && link(ui, "Read more").clicked() {
            *read_more = true;
        }
    }
    if spoiler && ui.small_button("Hide spoiler").clicked() {
        item.hide_spoiler();
    }
}

fn render_footer(ui: &mut egui::Ui, item: &mut FeedItemState, env: &mut CardEnv<'_>) {
    let activity = item.activity();
    let heart = if activity.liked { "♥" } else { "♡" };
    let like_label = RichText::new(format!("{heart} {}", activity.like_count));
    let like_label = if activity.liked {
        like_label.color(ACCENT)
    } else {
        like_label
    };
    let comment_label = format!("💬 {}", activity.comment_count);
    let can_like = item.can_like(env.session);
    let authenticated = env.session.is_authenticated();

    ui.horizontal(|ui| {
        let response = ui.add_enabled(can_like, egui::Button::new(like_label));
        let response = if authenticated {
            response
        } else {
            response.on_disabled_hover_text("Sign in to like")
        };
        if response.clicked() {
            item.toggle_like(env.session, env.dispatcher);
        }
        if item.is_like_pending() {
            ui.spinner();
        }

        let open = item.pane() != CommentPane::Collapsed;
        if ui.selectable_label(open, comment_label).clicked() {
            item.toggle_comments(env.dispatcher);
        }
    });
}
