use std::time::Instant;

use log::{debug, info, warn};

use crate::api::RemoteError;
use crate::models::{Comment, FeedPage, LikeState};

use super::events::AppEvent;
use super::feed_item::{FeedItemState, ItemKey};
use super::query_cache::QueryKey;
use super::KatalogApp;

impl KatalogApp {
    /// The mounted item `key` addresses, if it is still on screen.
    pub fn item_by_key_mut(&mut self, key: &ItemKey) -> Option<&mut FeedItemState> {
        if self.home.contains(key) {
            return self.home.item_by_key_mut(key);
        }
        self.profile
            .as_mut()
            .and_then(|feed| feed.item_by_key_mut(key))
    }

    pub(super) fn handle_activity_like(
        &mut self,
        item: ItemKey,
        result: Result<LikeState, RemoteError>,
        now: Instant,
    ) {
        let Some(state) = self.item_by_key_mut(&item) else {
            debug!("dropping like result for unmounted {item:?}");
            return;
        };
        match state.apply_like(result) {
            Ok(()) => self.bus.publish(AppEvent::NotificationsChanged),
            Err(err) => self.toasts.error(format!("Could not update like: {err}"), now),
        }
    }

    pub(super) fn handle_comments_loaded(
        &mut self,
        item: ItemKey,
        result: Result<Vec<Comment>, RemoteError>,
        now: Instant,
    ) {
        let failure = result
            .as_ref()
            .err()
            .map(|err| format!("Could not load comments: {err}"));
        let Some(state) = self.item_by_key_mut(&item) else {
            debug!("dropping comments for unmounted {item:?}");
            return;
        };
        state.thread_mut().apply_loaded(result);
        if let Some(message) = failure {
            self.toasts.error(message, now);
        }
    }

    pub(super) fn handle_comment_added(
        &mut self,
        item: ItemKey,
        result: Result<Comment, RemoteError>,
        now: Instant,
    ) {
        let Some(state) = self.item_by_key_mut(&item) else {
            debug!("dropping posted comment for unmounted {item:?}");
            return;
        };
        match state.apply_comment_added(result) {
            Ok(()) => {
                self.bus.publish(AppEvent::CommentPosted { item });
                self.bus.publish(AppEvent::NotificationsChanged);
            }
            Err(err) => self.toasts.error(format!("Could not post comment: {err}"), now),
        }
    }

    pub(super) fn handle_comment_like(
        &mut self,
        item: ItemKey,
        comment_id: &str,
        result: Result<LikeState, RemoteError>,
        now: Instant,
    ) {
        let Some(state) = self.item_by_key_mut(&item) else {
            debug!("dropping comment like for unmounted {item:?}");
            return;
        };
        match state.thread_mut().apply_like(comment_id, result) {
            Ok(()) => self.bus.publish(AppEvent::NotificationsChanged),
            Err(err) => self.toasts.error(format!("Could not update like: {err}"), now),
        }
    }

    pub(super) fn handle_activity_deleted(
        &mut self,
        activity_id: String,
        result: Result<(), RemoteError>,
        now: Instant,
    ) {
        self.deleting.remove(&activity_id);
        match result {
            Ok(()) => {
                info!("deleted activity {activity_id}");
                self.pages.invalidate_where(|key| {
                    matches!(key, QueryKey::Feed { .. } | QueryKey::UserActivities { .. })
                });
                self.bus.publish(AppEvent::ActivityDeleted { activity_id });
                self.bus.publish(AppEvent::NotificationsChanged);
                self.toasts.info("Activity deleted", now);
            }
            Err(err) => {
                warn!("failed to delete activity {activity_id}: {err}");
                self.toasts.error(format!("Could not delete activity: {err}"), now);
            }
        }
    }

    pub(super) fn handle_feed_page(
        &mut self,
        key: QueryKey,
        result: Result<FeedPage, RemoteError>,
        now: Instant,
    ) {
        match &result {
            Ok(page) => {
                let feeds = std::iter::once(&mut self.home).chain(self.profile.as_mut());
                for feed in feeds {
                    if let Some(number) = feed.source().page_of(&key) {
                        feed.apply_page(number, page);
                    }
                }
            }
            Err(err) => warn!("failed to load {key:?}: {err}"),
        }
        self.pages.complete(&key, result, now);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::app::feed_item::CommentPane;
    use crate::app::testing::FakeGateway;
    use crate::config::FrontendConfig;
    use crate::models::fixtures::record;

    #[test]
    fn comment_load_failure_keeps_the_server_message() {
        let (fake, _ctx, _rx) = FakeGateway::dispatcher();
        let mut app = KatalogApp::with_gateway(FrontendConfig::default(), fake);
        let page = FeedPage {
            activities: vec![record("a-1", "list_create", json!({ "listName": "Noir" }))],
            has_more: false,
        };
        app.home_mut().apply_page(0, &page);
        let ctx = app.dispatcher().clone();
        let item = &mut app.home_mut().items_mut()[0];
        item.toggle_comments(&ctx);
        let key = item.key().clone();

        app.handle_comments_loaded(key, Err(RemoteError::new("rate limited")), Instant::now());

        assert_eq!(
            app.toasts().iter().next().map(|t| t.text.as_str()),
            Some("Could not load comments: rate limited")
        );
        assert_eq!(app.home().items()[0].pane(), CommentPane::Failed);
    }
}
