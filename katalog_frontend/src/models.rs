use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[serde(alias = "movie")]
    Film,
    #[serde(alias = "dizi", alias = "show")]
    Series,
    #[serde(alias = "kitap")]
    Book,
}

impl ContentKind {
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Film => "Film",
            ContentKind::Series => "Series",
            ContentKind::Book => "Book",
        }
    }

    /// Path segment used by the web client for detail pages.
    pub fn path_segment(&self) -> &'static str {
        match self {
            ContentKind::Film => "films",
            ContentKind::Series => "series",
            ContentKind::Book => "books",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub id: String,
    pub kind: ContentKind,
    pub title: String,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl UserSummary {
    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// Authoritative like state returned by every toggle endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub liked: bool,
    pub like_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author: Actor,
    pub body: String,
    pub created_at: String,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub liked: bool,
    #[serde(default, rename = "yanitlar")]
    pub replies: Vec<Comment>,
}

impl Comment {
    pub fn apply_like(&mut self, state: LikeState) {
        self.liked = state.liked;
        self.like_count = state.like_count;
    }
}

/// Finds a comment by id among top-level comments and their replies.
pub fn find_comment_mut<'a>(comments: &'a mut [Comment], id: &str) -> Option<&'a mut Comment> {
    for comment in comments.iter_mut() {
        if comment.id == id {
            return Some(comment);
        }
        if let Some(found) = find_comment_mut(&mut comment.replies, id) {
            return Some(found);
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<String>,
}

/// Activity exactly as the API sends it. `kind` is a free string and `veri`
/// holds the kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: String,
    pub actor: Actor,
    pub created_at: String,
    pub kind: String,
    #[serde(default)]
    pub veri: Value,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub comment_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    #[serde(default)]
    pub activities: Vec<ActivityRecord>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UnreadCountResponse {
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    Rating,
    Comment,
    StatusUpdate,
    ListAddition,
    Follow,
    ListCreation,
    Unknown,
}

impl ActivityKind {
    /// Maps every spelling the API has used for a kind onto one variant.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "rating" => ActivityKind::Rating,
            "comment" => ActivityKind::Comment,
            "status_update" => ActivityKind::StatusUpdate,
            "list_add" | "added_to_list" => ActivityKind::ListAddition,
            "follow" | "followed_user" => ActivityKind::Follow,
            "list_create" => ActivityKind::ListCreation,
            _ => ActivityKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    #[serde(alias = "watching", alias = "reading")]
    InProgress,
    #[serde(alias = "watched", alias = "read")]
    Completed,
    #[serde(alias = "want_to_watch", alias = "want_to_read")]
    Planned,
    OnHold,
    Dropped,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingPayload {
    pub content: ContentSummary,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPayload {
    pub content: ContentSummary,
    #[serde(default)]
    pub comment_id: Option<String>,
    pub body: String,
    #[serde(default)]
    pub spoiler: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    pub content: ContentSummary,
    pub status: WatchStatus,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAdditionPayload {
    pub content: ContentSummary,
    pub list_name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowPayload {
    pub user: UserSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActivityPayload {
    Rating(RatingPayload),
    Comment(CommentPayload),
    StatusUpdate(StatusPayload),
    ListAddition(ListAdditionPayload),
    Follow(FollowPayload),
    ListCreation { list_name: Option<String> },
    Unknown { tag: String },
}

impl ActivityPayload {
    pub fn kind(&self) -> ActivityKind {
        match self {
            ActivityPayload::Rating(_) => ActivityKind::Rating,
            ActivityPayload::Comment(_) => ActivityKind::Comment,
            ActivityPayload::StatusUpdate(_) => ActivityKind::StatusUpdate,
            ActivityPayload::ListAddition(_) => ActivityKind::ListAddition,
            ActivityPayload::Follow(_) => ActivityKind::Follow,
            ActivityPayload::ListCreation { .. } => ActivityKind::ListCreation,
            ActivityPayload::Unknown { .. } => ActivityKind::Unknown,
        }
    }

    pub fn content(&self) -> Option<&ContentSummary> {
        match self {
            ActivityPayload::Rating(p) => Some(&p.content),
            ActivityPayload::Comment(p) => Some(&p.content),
            ActivityPayload::StatusUpdate(p) => Some(&p.content),
            ActivityPayload::ListAddition(p) => Some(&p.content),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub id: String,
    pub actor: Actor,
    pub created_at: String,
    pub payload: ActivityPayload,
    pub like_count: i64,
    pub liked: bool,
    pub comment_count: i64,
    pub comment_id: Option<String>,
}

impl Activity {
    /// Ingests a wire record. Unknown kinds and payloads that do not match
    /// their kind degrade to `ActivityPayload::Unknown`.
    pub fn from_record(record: ActivityRecord) -> Self {
        let kind = ActivityKind::from_tag(&record.kind);
        let veri = record.veri;
        let payload = match kind {
            ActivityKind::Rating => decode(&record.id, &record.kind, veri).map(ActivityPayload::Rating),
            ActivityKind::Comment => decode(&record.id, &record.kind, veri).map(ActivityPayload::Comment),
            ActivityKind::StatusUpdate => {
                decode(&record.id, &record.kind, veri).map(ActivityPayload::StatusUpdate)
            }
            ActivityKind::ListAddition => {
                decode(&record.id, &record.kind, veri).map(ActivityPayload::ListAddition)
            }
            ActivityKind::Follow => decode(&record.id, &record.kind, veri).map(ActivityPayload::Follow),
            ActivityKind::ListCreation => Some(ActivityPayload::ListCreation {
                list_name: veri
                    .get("listName")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            ActivityKind::Unknown => {
                warn!("activity {} has unrecognised kind {:?}", record.id, record.kind);
                None
            }
        }
        .unwrap_or_else(|| ActivityPayload::Unknown {
            tag: record.kind.clone(),
        });

        Self {
            id: record.id,
            actor: record.actor,
            created_at: record.created_at,
            payload,
            like_count: record.like_count,
            liked: record.liked,
            comment_count: record.comment_count,
            comment_id: record.comment_id,
        }
    }

    pub fn kind(&self) -> ActivityKind {
        self.payload.kind()
    }

    pub fn apply_like(&mut self, state: LikeState) {
        self.liked = state.liked;
        self.like_count = state.like_count;
    }
}

fn decode<T: DeserializeOwned>(activity_id: &str, tag: &str, veri: Value) -> Option<T> {
    match serde_json::from_value(veri) {
        Ok(payload) => Some(payload),
        Err(err) => {
            warn!("activity {activity_id}: payload does not match kind {tag:?}: {err}");
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::json;

    use super::*;

    pub fn actor(username: &str) -> Actor {
        Actor {
            username: username.to_string(),
            avatar_url: None,
        }
    }

    pub fn comment(id: &str, body: &str) -> Comment {
        Comment {
            id: id.to_string(),
            author: actor("ayse"),
            body: body.to_string(),
            created_at: "2024-03-01T10:00:00Z".to_string(),
            like_count: 0,
            liked: false,
            replies: Vec::new(),
        }
    }

    pub fn content_json() -> Value {
        json!({ "id": "c-1", "kind": "film", "title": "Stalker", "year": 1979 })
    }

    pub fn record(id: &str, kind: &str, veri: Value) -> ActivityRecord {
        ActivityRecord {
            id: id.to_string(),
            actor: actor("mert"),
            created_at: "2024-03-01T09:00:00Z".to_string(),
            kind: kind.to_string(),
            veri,
            like_count: 3,
            liked: false,
            comment_count: 1,
            comment_id: None,
        }
    }

    pub fn rating_activity(id: &str) -> Activity {
        Activity::from_record(record(
            id,
            "rating",
            json!({ "content": content_json(), "score": 8.5 }),
        ))
    }
}
