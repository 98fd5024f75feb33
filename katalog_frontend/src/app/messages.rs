use std::time::Instant;

use crate::api::RemoteError;
use crate::models::{Comment, ContentSummary, FeedPage, LikeState, UserSummary};

use super::feed_item::ItemKey;
use super::images::LoadedImage;
use super::query_cache::QueryKey;
use super::KatalogApp;

/// Results of background calls, drained on the UI thread each frame.
pub enum AppMessage {
    ActivityLikeToggled {
        item: ItemKey,
        result: Result<LikeState, RemoteError>,
    },
    CommentsLoaded {
        item: ItemKey,
        result: Result<Vec<Comment>, RemoteError>,
    },
    CommentAdded {
        item: ItemKey,
        result: Result<Comment, RemoteError>,
    },
    CommentLikeToggled {
        item: ItemKey,
        comment_id: String,
        result: Result<LikeState, RemoteError>,
    },
    ActivityDeleted {
        activity_id: String,
        result: Result<(), RemoteError>,
    },
    UsersFound {
        generation: u64,
        result: Result<Vec<UserSummary>, RemoteError>,
    },
    ContentFound {
        generation: u64,
        result: Result<Vec<ContentSummary>, RemoteError>,
    },
    FeedPageLoaded {
        key: QueryKey,
        result: Result<FeedPage, RemoteError>,
    },
    UnreadCountLoaded(Result<u32, RemoteError>),
    ImageLoaded {
        url: String,
        result: Result<LoadedImage, String>,
    },
}

pub(super) fn process_messages(app: &mut KatalogApp, now: Instant) {
    while let Ok(message) = app.rx.try_recv() {
        match message {
            AppMessage::ActivityLikeToggled { item, result } => {
                app.handle_activity_like(item, result, now);
            }
            AppMessage::CommentsLoaded { item, result } => {
                app.handle_comments_loaded(item, result, now);
            }
            AppMessage::CommentAdded { item, result } => {
                app.handle_comment_added(item, result, now);
            }
            AppMessage::CommentLikeToggled {
                item,
                comment_id,
                result,
            } => {
                app.handle_comment_like(item, &comment_id, result, now);
            }
            AppMessage::ActivityDeleted {
                activity_id,
                result,
            } => {
                app.handle_activity_deleted(activity_id, result, now);
            }
            AppMessage::UsersFound { generation, result } => {
                app.user_search.apply(generation, result);
            }
            AppMessage::ContentFound { generation, result } => {
                app.content_search.apply(generation, result);
            }
            AppMessage::FeedPageLoaded { key, result } => {
                app.handle_feed_page(key, result, now);
            }
            AppMessage::UnreadCountLoaded(result) => {
                app.badge.apply(result, now);
            }
            AppMessage::ImageLoaded { url, result } => {
                app.images.apply(url, result);
            }
        }
    }
}
