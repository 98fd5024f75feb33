use std::time::Instant;

use log::{debug, info, warn};

use crate::api::RemoteError;
use crate::config::CacheSettings;
use crate::models::{Activity, FeedPage};

use super::events::{AppEvent, EventBus, Subscription};
use super::feed_item::{FeedItemState, ItemKey};
use super::query_cache::{QueryCache, QueryKey};
use super::tasks::{self, Dispatcher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Home,
    Profile { username: String },
}

impl FeedSource {
    pub fn page_key(&self, page: u32) -> QueryKey {
        match self {
            FeedSource::Home => QueryKey::Feed { page },
            FeedSource::Profile { username } => QueryKey::UserActivities {
                username: username.clone(),
                page,
            },
        }
    }

    /// Page number of `key` when it belongs to this source.
    pub fn page_of(&self, key: &QueryKey) -> Option<u32> {
        match (self, key) {
            (FeedSource::Home, QueryKey::Feed { page }) => Some(*page),
            (FeedSource::Profile { username }, QueryKey::UserActivities { username: u, page })
                if u == username =>
            {
                Some(*page)
            }
            _ => None,
        }
    }
}

/// One scrolling list of activity cards, home or a single profile.
pub struct FeedState {
    source: FeedSource,
    is_own_profile: bool,
    items: Vec<FeedItemState>,
    loaded_pages: u32,
    has_more: bool,
    subscription: Subscription,
}

impl FeedState {
    pub fn mount(source: FeedSource, is_own_profile: bool, bus: &mut EventBus) -> Self {
        Self {
            source,
            is_own_profile,
            items: Vec::new(),
            loaded_pages: 0,
            has_more: false,
            subscription: bus.subscribe(),
        }
    }

    pub fn unmount(self, bus: &mut EventBus) {
        bus.unsubscribe(self.subscription.id());
    }

    pub fn source(&self) -> &FeedSource {
        &self.source
    }

    pub fn is_own_profile(&self) -> bool {
        self.is_own_profile
    }

    pub fn items(&self) -> &[FeedItemState] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [FeedItemState] {
        &mut self.items
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn loaded_pages(&self) -> u32 {
        self.loaded_pages
    }

    /// Replays pages already held by the cache, so a remounted feed shows
    /// its last contents while page 0 refreshes.
    pub fn hydrate(&mut self, cache: &QueryCache<FeedPage>) {
        let mut page = 0;
        while let Some(cached) = cache.get(&self.source.page_key(page)) {
            self.apply_page(page, cached);
            if !cached.has_more {
                break;
            }
            page += 1;
        }
    }

    pub fn apply_page(&mut self, page: u32, feed: &FeedPage) {
        let activities: Vec<Activity> = feed
            .activities
            .iter()
            .cloned()
            .map(Activity::from_record)
            .collect();

        if page == 0 {
            self.apply_first_page(activities);
            if self.loaded_pages <= 1 {
                self.has_more = feed.has_more;
            }
            self.loaded_pages = self.loaded_pages.max(1);
            return;
        }
        if page > self.loaded_pages {
            warn!(
                "page {page} of {:?} arrived before page {}",
                self.source, self.loaded_pages
            );
            return;
        }

        let mut added = 0;
        for activity in activities {
            match self.items.iter_mut().find(|i| i.activity().id == activity.id) {
                Some(existing) => existing.refresh(activity),
                None => {
                    self.items.push(FeedItemState::new(activity, self.is_own_profile));
                    added += 1;
                }
            }
        }
        debug!("page {page} of {:?} added {added} activities", self.source);
        self.loaded_pages = self.loaded_pages.max(page + 1);
        self.has_more = feed.has_more;
    }

    /// Takes the server order for the head of the feed, reusing the state of
    /// items already mounted. Items only known from later pages stay behind.
    fn apply_first_page(&mut self, activities: Vec<Activity>) {
        let mut old = std::mem::take(&mut self.items);
        let mut items = Vec::with_capacity(activities.len() + old.len());

        for activity in activities {
            match old.iter().position(|i| i.activity().id == activity.id) {
                Some(index) => {
                    let mut existing = old.remove(index);
                    existing.refresh(activity);
                    items.push(existing);
                }
                None => items.push(FeedItemState::new(activity, self.is_own_profile)),
            }
        }
        if self.loaded_pages > 1 {
            items.extend(old);
        }
        self.items = items;
    }

    /// Requests page 0 whenever the cache considers it due.
    pub fn poll(&self, cache: &mut QueryCache<FeedPage>, ctx: &Dispatcher, now: Instant) {
        let key = self.source.page_key(0);
        if cache.should_fetch(&key, now) && cache.begin_fetch(&key) {
            tasks::load_feed_page(ctx, key);
        }
    }

    pub fn next_page_key(&self) -> Option<QueryKey> {
        if self.loaded_pages == 0 || !self.has_more {
            return None;
        }
        Some(self.source.page_key(self.loaded_pages))
    }

    /// Infinite scroll: fetches the next page when there is one and the cache
    /// considers it due, so failures back off and eventually give up.
    pub fn load_more(
        &self,
        cache: &mut QueryCache<FeedPage>,
        ctx: &Dispatcher,
        now: Instant,
    ) -> bool {
        let Some(key) = self.next_page_key() else {
            return false;
        };
        if !cache.should_fetch(&key, now) || !cache.begin_fetch(&key) {
            return false;
        }
        info!("loading {key:?}");
        tasks::load_feed_page(ctx, key);
        true
    }

    /// Error of the next page once automatic retries gave up on it.
    pub fn next_page_error<'c>(&self, cache: &'c QueryCache<FeedPage>) -> Option<&'c RemoteError> {
        let key = self.next_page_key()?;
        if !cache.retries_exhausted(&key) {
            return None;
        }
        cache.error(&key)
    }

    /// Reacts to bus events. Returns true when the list changed.
    pub fn drain_events(&mut self) -> bool {
        let mut changed = false;
        for event in self.subscription.drain() {
            match event {
                AppEvent::ActivityDeleted { activity_id } => changed |= self.remove(&activity_id),
                AppEvent::CommentPosted { item } => {
                    for other in self.items.iter_mut() {
                        let key = other.key();
                        if key.activity_id == item.activity_id && key.mount != item.mount {
                            other.note_comment_elsewhere();
                        }
                    }
                }
                AppEvent::NotificationsChanged => {}
            }
        }
        changed
    }

    pub fn remove(&mut self, activity_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.activity().id != activity_id);
        before != self.items.len()
    }

    pub fn contains(&self, key: &ItemKey) -> bool {
        self.items.iter().any(|i| i.key() == key)
    }

    pub fn item_by_key_mut(&mut self, key: &ItemKey) -> Option<&mut FeedItemState> {
        self.items.iter_mut().find(|i| i.key() == key)
    }
}

/// Unread notification count shown in the header.
pub struct NotificationBadge {
    cache: QueryCache<u32>,
    subscription: Subscription,
    enabled: bool,
}

impl NotificationBadge {
    pub fn mount(settings: CacheSettings, enabled: bool, bus: &mut EventBus) -> Self {
        Self {
            cache: QueryCache::new(settings),
            subscription: bus.subscribe(),
            enabled,
        }
    }

    pub fn unread(&self) -> u32 {
        self.cache
            .get(&QueryKey::UnreadNotifications)
            .copied()
            .unwrap_or(0)
    }

    pub fn poll(&mut self, ctx: &Dispatcher, now: Instant) {
        let key = QueryKey::UnreadNotifications;
        for event in self.subscription.drain() {
            if event == AppEvent::NotificationsChanged {
                self.cache.invalidate(&key);
            }
        }
        if !self.enabled {
            return;
        }
        if self.cache.should_fetch(&key, now) && self.cache.begin_fetch(&key) {
            tasks::load_unread_count(ctx);
        }
    }

    pub fn apply(&mut self, result: Result<u32, RemoteError>, now: Instant) {
        if let Err(err) = &result {
            warn!("failed to refresh unread notifications: {err}");
        }
        self.cache
            .complete(&QueryKey::UnreadNotifications, result, now);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::app::messages::AppMessage;
    use crate::app::testing::{recv, FakeGateway};
    use crate::models::fixtures::record;
    use crate::models::ActivityRecord;

    fn rec(id: &str) -> ActivityRecord {
        record(id, "list_create", serde_json::json!({ "listName": id }))
    }

    fn page(ids: &[&str], has_more: bool) -> FeedPage {
        FeedPage {
            activities: ids.iter().map(|id| rec(id)).collect(),
            has_more,
        }
    }

    fn ids(feed: &FeedState) -> Vec<String> {
        feed.items().iter().map(|i| i.activity().id.clone()).collect()
    }

    #[test]
    fn pages_append_and_refresh_keeps_item_state() {
        let mut bus = EventBus::default();
        let mut feed = FeedState::mount(FeedSource::Home, false, &mut bus);

        feed.apply_page(0, &page(&["a", "b"], true));
        let key_b = feed.items()[1].key().clone();
        feed.apply_page(1, &page(&["b", "c"], false));
        assert_eq!(ids(&feed), vec!["a", "b", "c"]);
        assert!(!feed.has_more());
        assert_eq!(feed.next_page_key(), None);

        feed.apply_page(0, &page(&["z", "b", "a"], true));
        assert_eq!(ids(&feed), vec!["z", "b", "a", "c"]);
        assert!(feed.contains(&key_b));
    }

    #[test]
    fn out_of_order_pages_are_ignored() {
        let mut bus = EventBus::default();
        let mut feed = FeedState::mount(FeedSource::Home, false, &mut bus);
        feed.apply_page(2, &page(&["x"], true));
        assert!(feed.items().is_empty());
    }

    #[test]
    fn profile_keys_belong_to_their_user() {
        let source = FeedSource::Profile {
            username: "mert".into(),
        };
        assert_eq!(source.page_of(&source.page_key(3)), Some(3));
        assert_eq!(source.page_of(&QueryKey::Feed { page: 3 }), None);
        assert_eq!(
            source.page_of(&QueryKey::UserActivities {
                username: "ayse".into(),
                page: 0
            }),
            None
        );
    }

    #[test]
    fn load_more_requests_each_page_once() {
        let (fake, ctx, rx) = FakeGateway::dispatcher();
        fake.set_page(1, page(&["c"], false));
        let mut bus = EventBus::default();
        let mut cache = QueryCache::new(CacheSettings::default());
        let mut feed = FeedState::mount(FeedSource::Home, false, &mut bus);

        let now = Instant::now();
        assert!(!feed.load_more(&mut cache, &ctx, now));
        feed.apply_page(0, &page(&["a", "b"], true));
        assert!(feed.load_more(&mut cache, &ctx, now));
        assert!(!feed.load_more(&mut cache, &ctx, now));

        match recv(&rx) {
            AppMessage::FeedPageLoaded { key, result } => {
                assert_eq!(key, QueryKey::Feed { page: 1 });
                let loaded = result.unwrap();
                feed.apply_page(1, &loaded);
                cache.complete(&key, Ok(loaded), Instant::now());
            }
            _ => panic!("unexpected message"),
        }
        assert_eq!(ids(&feed), vec!["a", "b", "c"]);
        assert_eq!(fake.calls("get_feed"), 1);
    }

    #[test]
    fn failing_next_page_backs_off_then_gives_up() {
        let (fake, ctx, rx) = FakeGateway::dispatcher();
        fake.fail("get_feed", "gateway timeout");
        let settings = CacheSettings {
            stale_after: Duration::from_secs(60),
            max_retries: 2,
            retry_backoff: Duration::from_secs(2),
        };
        let mut bus = EventBus::default();
        let mut cache = QueryCache::new(settings);
        let mut feed = FeedState::mount(FeedSource::Home, false, &mut bus);
        feed.apply_page(0, &page(&["a"], true));
        let key = QueryKey::Feed { page: 1 };

        let start = Instant::now();
        let mut issued = 0;
        for frame in 0..100u32 {
            let now = start + Duration::from_millis(100) * frame;
            if feed.load_more(&mut cache, &ctx, now) {
                issued += 1;
                match recv(&rx) {
                    AppMessage::FeedPageLoaded { key, result } => {
                        cache.complete(&key, result, now)
                    }
                    _ => panic!("unexpected message"),
                }
            }
        }
        // first attempt plus two retries, 2 s then 4 s apart
        assert_eq!(issued, 3);
        assert_eq!(fake.calls("get_feed"), 3);
        assert!(cache.retries_exhausted(&key));
        assert_eq!(
            feed.next_page_error(&cache).map(|e| e.message()),
            Some("gateway timeout")
        );

        cache.retry(&key);
        assert!(feed.next_page_error(&cache).is_none());
        assert!(feed.load_more(&mut cache, &ctx, start + Duration::from_secs(10)));
    }

    #[test]
    fn deletions_and_comment_counts_travel_over_the_bus() {
        let mut bus = EventBus::default();
        let mut home = FeedState::mount(FeedSource::Home, false, &mut bus);
        let mut profile = FeedState::mount(
            FeedSource::Profile {
                username: "mert".into(),
            },
            true,
            &mut bus,
        );
        home.apply_page(0, &page(&["a", "b"], false));
        profile.apply_page(0, &page(&["a"], false));

        bus.publish(AppEvent::CommentPosted {
            item: profile.items()[0].key().clone(),
        });
        bus.publish(AppEvent::ActivityDeleted {
            activity_id: "b".into(),
        });
        assert!(home.drain_events());
        assert!(!profile.drain_events());

        assert_eq!(ids(&home), vec!["a"]);
        assert_eq!(home.items()[0].activity().comment_count, 2);
        assert_eq!(profile.items()[0].activity().comment_count, 1);

        profile.unmount(&mut bus);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn hydrate_replays_cached_pages() {
        let mut bus = EventBus::default();
        let mut cache = QueryCache::new(CacheSettings::default());
        let now = Instant::now();
        for (n, p) in [(0, page(&["a"], true)), (1, page(&["b"], false))] {
            let key = QueryKey::Feed { page: n };
            cache.begin_fetch(&key);
            cache.complete(&key, Ok(p), now);
        }
        let mut feed = FeedState::mount(FeedSource::Home, false, &mut bus);
        feed.hydrate(&cache);
        assert_eq!(ids(&feed), vec!["a", "b"]);
        assert_eq!(feed.loaded_pages(), 2);
    }

    #[test]
    fn badge_refetches_after_notifications_change() {
        let (fake, ctx, rx) = FakeGateway::dispatcher();
        fake.set_unread(4);
        let mut bus = EventBus::default();
        let mut badge = NotificationBadge::mount(CacheSettings::default(), true, &mut bus);
        let now = Instant::now();

        badge.poll(&ctx, now);
        badge.poll(&ctx, now);
        match recv(&rx) {
            AppMessage::UnreadCountLoaded(result) => badge.apply(result, now),
            _ => panic!("unexpected message"),
        }
        assert_eq!(badge.unread(), 4);
        badge.poll(&ctx, now);
        assert_eq!(fake.calls("unread_notification_count"), 1);

        fake.set_unread(5);
        bus.publish(AppEvent::NotificationsChanged);
        badge.poll(&ctx, now);
        match recv(&rx) {
            AppMessage::UnreadCountLoaded(result) => badge.apply(result, now),
            _ => panic!("unexpected message"),
        }
        assert_eq!(badge.unread(), 5);
        assert_eq!(fake.calls("unread_notification_count"), 2);
    }

    #[test]
    fn anonymous_badge_never_fetches() {
        let (fake, ctx, _rx) = FakeGateway::dispatcher();
        let mut bus = EventBus::default();
        let mut badge = NotificationBadge::mount(CacheSettings::default(), false, &mut bus);
        badge.poll(&ctx, Instant::now());
        assert_eq!(badge.unread(), 0);
        assert_eq!(fake.calls("unread_notification_count"), 0);
    }
}
