use eframe::egui::{self, Color32, RichText};

use crate::models::Comment;

use super::super::comments::CommentThread;
use super::super::feed_item::{CommentPane, FeedItemState};
use super::super::render::format_relative;
use super::activity::{CardEnv, CardOutput};
use super::{thumbnail, ACCENT};

const REPLY_INDENT: &str = "comment_replies";

enum CommentAction {
    ToggleBody(String),
    Reply(String),
    Like(String),
}

pub(super) fn render_thread(
    ui: &mut egui::Ui,
    item: &mut FeedItemState,
    env: &mut CardEnv<'_>,
    out: &mut CardOutput,
) {
    if item.pane() == CommentPane::Loading {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Loading comments...");
        });
        return;
    }
    if item.pane() == CommentPane::Failed {
        let message = item
            .thread()
            .load_error()
            .map(|e| e.message().to_string())
            .unwrap_or_default();
        let mut retry = false;
        ui.horizontal(|ui| {
            ui.colored_label(Color32::LIGHT_RED, format!("Could not load comments: {message}"));
            retry = ui.small_button("Retry").clicked();
        });
        if retry {
            item.retry_comments(env.dispatcher);
        }
        return;
    }

    let thread = item.thread_mut();
    let mut actions = Vec::new();
    let shown: &CommentThread = thread;
    if shown.comments().is_empty() {
        ui.label(RichText::new("No comments yet.").weak().italics());
    }
    for comment in shown.comments() {
        render_comment(ui, shown, comment, true, env, &mut actions);
        if !comment.replies.is_empty() {
            ui.indent((REPLY_INDENT, &comment.id), |ui| {
                for reply in &comment.replies {
                    render_comment(ui, shown, reply, false, env, &mut actions);
                }
            });
        }
    }

    for action in actions {
        match action {
            CommentAction::ToggleBody(id) => thread.toggle_body(&id),
            CommentAction::Reply(id) => {
                thread.reply_to(&id);
            }
            CommentAction::Like(id) => {
                thread.toggle_like(&id, env.session, env.dispatcher);
            }
        }
    }

    ui.add_space(4.0);
    render_composer(ui, thread, env, out);
}

fn render_comment(
    ui: &mut egui::Ui,
    thread: &CommentThread,
    comment: &Comment,
    top_level: bool,
    env: &mut CardEnv<'_>,
    actions: &mut Vec<CommentAction>,
) {
    let authenticated = env.session.is_authenticated();
    ui.horizontal_top(|ui| {
        thumbnail(ui, env.images, comment.author.avatar_url.as_deref(), 24.0);
        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(format!("@{}", comment.author.username)).strong());
                ui.label(
                    RichText::new(format_relative(&comment.created_at, env.now))
                        .weak()
                        .small(),
                );
            });

            let body = thread.body_view(comment);
            ui.label(body.text.as_ref());
            if body.expandable {
                let label = if body.expanded { "Show less" } else { "Show more" };
                if ui.small_button(label).clicked() {
                    actions.push(CommentAction::ToggleBody(comment.id.clone()));
                }
            }

            ui.horizontal(|ui| {
                let heart = if comment.liked { "♥" } else { "♡" };
                let text = RichText::new(format!("{heart} {}", comment.like_count));
                let text = if comment.liked { text.color(ACCENT) } else { text };
                let enabled = authenticated && !thread.is_like_pending(&comment.id);
                if ui.add_enabled(enabled, egui::Button::new(text).small()).clicked() {
                    actions.push(CommentAction::Like(comment.id.clone()));
                }
                if top_level && authenticated && ui.small_button("Reply").clicked() {
                    actions.push(CommentAction::Reply(comment.id.clone()));
                }
            });
        });
    });
}

fn render_composer(
    ui: &mut egui::Ui,
    thread: &mut CommentThread,
    env: &mut CardEnv<'_>,
    out: &mut CardOutput,
) {
    if !env.session.is_authenticated() {
        ui.label(RichText::new("Sign in to join the conversation.").weak());
        return;
    }

    if let Some(target) = thread.replying_to().cloned() {
        ui.horizontal(|ui| {
            ui.label(RichText::new(format!("Replying to @{}", target.author)).small());
            if ui.small_button("Cancel").clicked() {
                thread.cancel_reply();
            }
        });
    }

    let placeholder = thread.placeholder();
    ui.add(
        egui::TextEdit::multiline(&mut thread.draft)
            .hint_text(placeholder)
            .desired_rows(2)
            .desired_width(f32::INFINITY),
    );
    ui.horizontal(|ui| {
        let sending = thread.is_submitting();
        let label = if sending { "Sending..." } else { "Send" };
        if ui.add_enabled(!sending, egui::Button::new(label)).clicked() {
            if let Err(rejection) = thread.submit(env.session, env.dispatcher) {
                out.notices.push(rejection.to_string());
            }
        }
        if sending {
            ui.spinner();
        }
    });
}
