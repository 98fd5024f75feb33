//! Display policy for feed cards: what each activity kind says, where a
//! click on it leads, and how long texts are cut. Kept free of egui so the
//! rules can be tested on their own.

use std::borrow::Cow;

use chrono::{DateTime, Utc};

use crate::models::{Activity, ActivityPayload, ContentKind, WatchStatus};

/// Comment excerpts on feed cards are cut here and link to the full view.
pub const EXCERPT_TRUNCATE_AT: usize = 100;
pub const ELLIPSIS: &str = "...";

/// Returns the first `limit` characters when `text` is longer than that.
pub fn truncate_chars(text: &str, limit: usize) -> Option<&str> {
    text.char_indices()
        .nth(limit)
        .map(|(byte_index, _)| &text[..byte_index])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt<'a> {
    pub text: Cow<'a, str>,
    pub truncated: bool,
}

pub fn excerpt(body: &str, limit: usize) -> Excerpt<'_> {
    match truncate_chars(body, limit) {
        Some(head) => Excerpt {
            text: Cow::Owned(format!("{head}{ELLIPSIS}")),
            truncated: true,
        },
        None => Excerpt {
            text: Cow::Borrowed(body),
            truncated: false,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavTarget {
    Content {
        kind: ContentKind,
        id: String,
        comment_id: Option<String>,
    },
    Profile {
        username: String,
    },
}

impl NavTarget {
    pub fn url(&self, web_base: &str) -> String {
        match self {
            NavTarget::Content {
                kind,
                id,
                comment_id: Some(comment_id),
            } => format!("{web_base}/{}/{id}#comment-{comment_id}", kind.path_segment()),
            NavTarget::Content { kind, id, .. } => {
                format!("{web_base}/{}/{id}", kind.path_segment())
            }
            NavTarget::Profile { username } => format!("{web_base}/users/{username}"),
        }
    }
}

/// Where a click on the card body leads.
pub fn primary_target(activity: &Activity) -> Option<NavTarget> {
    match &activity.payload {
        ActivityPayload::Comment(p) => Some(NavTarget::Content {
            kind: p.content.kind,
            id: p.content.id.clone(),
            comment_id: p.comment_id.clone().or_else(|| activity.comment_id.clone()),
        }),
        ActivityPayload::Follow(p) => Some(NavTarget::Profile {
            username: p.user.username.clone(),
        }),
        ActivityPayload::ListCreation { .. } | ActivityPayload::Unknown { .. } => None,
        payload => payload.content().map(|content| NavTarget::Content {
            kind: content.kind,
            id: content.id.clone(),
            comment_id: None,
        }),
    }
}

/// The verb phrase shown after the actor's name.
pub fn action_text(activity: &Activity) -> String {
    match &activity.payload {
        ActivityPayload::Rating(_) => "rated".to_string(),
        ActivityPayload::Comment(_) => "commented on".to_string(),
        ActivityPayload::StatusUpdate(p) => format!(
            "marked as {}",
            status_label(p.status, p.content.kind).to_lowercase()
        ),
        ActivityPayload::ListAddition(_) => "added to a list".to_string(),
        ActivityPayload::Follow(_) => "started following".to_string(),
        ActivityPayload::ListCreation {
            list_name: Some(name),
        } => format!("created the list \"{name}\""),
        ActivityPayload::ListCreation { list_name: None } => "created a new list".to_string(),
        ActivityPayload::Unknown { .. } => "shared an update".to_string(),
    }
}

pub fn status_label(status: WatchStatus, kind: ContentKind) -> &'static str {
    let reading = kind == ContentKind::Book;
    match (status, reading) {
        (WatchStatus::InProgress, false) => "Watching",
        (WatchStatus::InProgress, true) => "Reading",
        (WatchStatus::Completed, false) => "Watched",
        (WatchStatus::Completed, true) => "Read",
        (WatchStatus::Planned, false) => "Want to watch",
        (WatchStatus::Planned, true) => "Want to read",
        (WatchStatus::OnHold, _) => "On hold",
        (WatchStatus::Dropped, _) => "Dropped",
    }
}

pub fn score_badge(score: f32) -> String {
    if score.fract() == 0.0 {
        format!("{score:.0}")
    } else {
        format!("{score:.1}")
    }
}

pub fn format_relative(ts: &str, now: DateTime<Utc>) -> String {
    let Ok(at) = DateTime::parse_from_rfc3339(ts) else {
        return ts.to_string();
    };
    let at = at.with_timezone(&Utc);
    let elapsed = now.signed_duration_since(at);
    if elapsed.num_seconds() < 60 {
        "just now".to_string()
    } else if elapsed.num_minutes() < 60 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        format!("{}d ago", elapsed.num_days())
    } else {
        at.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::models::fixtures::{content_json, rating_activity, record};

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let body = "ğ".repeat(151);
        let head = truncate_chars(&body, 150).expect("truncated");
        assert_eq!(head.chars().count(), 150);
        assert_eq!(truncate_chars("short", 150), None);
        assert_eq!(truncate_chars(&"x".repeat(150), 150), None);
    }

    #[test]
    fn excerpt_marks_truncation() {
        let long = "a".repeat(101);
        let cut = excerpt(&long, EXCERPT_TRUNCATE_AT);
        assert!(cut.truncated);
        assert_eq!(cut.text, format!("{}{ELLIPSIS}", "a".repeat(100)));
        assert!(!excerpt("fine", EXCERPT_TRUNCATE_AT).truncated);
    }

    #[test]
    fn comment_cards_link_to_the_comment() {
        let activity = Activity::from_record(record(
            "a-1",
            "comment",
            json!({ "content": content_json(), "commentId": "y-3", "body": "x" }),
        ));
        let target = primary_target(&activity).unwrap();
        assert_eq!(
            target.url("https://katalog.app"),
            "https://katalog.app/films/c-1#comment-y-3"
        );
    }

    #[test]
    fn follow_cards_link_to_the_profile_and_others_to_content() {
        let follow = Activity::from_record(record(
            "a-2",
            "followed_user",
            json!({ "user": { "username": "zeynep" } }),
        ));
        assert_eq!(
            primary_target(&follow),
            Some(NavTarget::Profile {
                username: "zeynep".into()
            })
        );
        assert_eq!(
            primary_target(&rating_activity("a-3")).map(|t| t.url("")),
            Some("/films/c-1".to_string())
        );
        let list = Activity::from_record(record("a-4", "list_create", json!({ "listName": "Noir" })));
        assert_eq!(primary_target(&list), None);
        assert_eq!(action_text(&list), "created the list \"Noir\"");
    }

    #[test]
    fn unknown_kinds_fall_back_to_default_text() {
        let activity = Activity::from_record(record("a-5", "badge", json!({})));
        assert_eq!(action_text(&activity), "shared an update");
        assert_eq!(primary_target(&activity), None);
    }

    #[test]
    fn status_labels_depend_on_content_kind() {
        assert_eq!(status_label(WatchStatus::InProgress, ContentKind::Book), "Reading");
        assert_eq!(status_label(WatchStatus::InProgress, ContentKind::Series), "Watching");
        assert_eq!(status_label(WatchStatus::Completed, ContentKind::Film), "Watched");
    }

    #[test]
    fn scores_and_times_format_compactly() {
        assert_eq!(score_badge(8.0), "8");
        assert_eq!(score_badge(7.5), "7.5");

        let now = DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_relative("2024-03-01T11:59:30Z", now), "just now");
        assert_eq!(format_relative("2024-03-01T11:15:00Z", now), "45m ago");
        assert_eq!(format_relative("2024-02-29T12:00:00Z", now), "1d ago");
        assert_eq!(format_relative("2024-01-01T12:00:00Z", now), "2024-01-01");
        assert_eq!(format_relative("yesterday", now), "yesterday");
    }
}
