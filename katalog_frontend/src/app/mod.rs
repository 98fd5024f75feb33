use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use eframe::egui::{self, Context};
use log::{info, warn};

use crate::api::ApiClient;
use crate::config::FrontendConfig;
use crate::models::{ContentSummary, FeedPage, UserSummary};

pub mod comments;
pub mod events;
pub mod feed;
pub mod feed_item;
mod handlers;
pub mod images;
mod messages;
pub mod query_cache;
pub mod render;
pub mod search;
pub mod session;
pub mod tasks;
#[cfg(test)]
mod testing;
pub mod toasts;
mod ui;

pub use messages::AppMessage;

use events::EventBus;
use feed::{FeedSource, FeedState, NotificationBadge};
use images::ImageCache;
use query_cache::QueryCache;
use render::NavTarget;
use search::DebouncedSearch;
use session::Session;
use tasks::{Dispatcher, Gateway};
use toasts::Toasts;

const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Profile,
    Explore,
}

pub struct KatalogApp {
    config: FrontendConfig,
    session: Session,
    dispatcher: Dispatcher,
    rx: Receiver<AppMessage>,
    bus: EventBus,
    pages: QueryCache<FeedPage>,
    home: FeedState,
    profile: Option<FeedState>,
    view: View,
    user_search: DebouncedSearch<UserSummary>,
    content_search: DebouncedSearch<ContentSummary>,
    badge: NotificationBadge,
    toasts: Toasts,
    images: ImageCache,
    deleting: HashSet<String>,
}

impl KatalogApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: FrontendConfig) -> Result<Self> {
        let api = ApiClient::new(config.api_url.clone(), config.request_timeout)?
            .with_token(config.auth_token.clone());
        info!("using API at {}", api.base_url());
        Ok(Self::with_gateway(config, Arc::new(api)))
    }

    /// Builds the app around any gateway; the UI shell is not needed.
    pub fn with_gateway(config: FrontendConfig, api: Gateway) -> Self {
        let (tx, rx) = mpsc::channel();
        let session = Session::from_config(&config);
        let mut bus = EventBus::default();
        let home = FeedState::mount(FeedSource::Home, false, &mut bus);
        let badge = NotificationBadge::mount(config.cache, session.is_authenticated(), &mut bus);
        Self {
            session,
            dispatcher: Dispatcher::new(api, tx.clone()),
            rx,
            pages: QueryCache::new(config.cache),
            home,
            profile: None,
            view: View::Home,
            user_search: DebouncedSearch::new(config.user_search),
            content_search: DebouncedSearch::new(config.content_search),
            badge,
            toasts: Toasts::default(),
            images: ImageCache::new(tx),
            deleting: HashSet::new(),
            bus,
            config,
        }
    }

    /// One step of the non-visual loop: apply finished background work,
    /// react to bus events, start whatever fetches are now due.
    pub fn tick(&mut self, now: Instant) {
        messages::process_messages(self, now);

        self.home.drain_events();
        if let Some(profile) = self.profile.as_mut() {
            profile.drain_events();
        }

        self.home.poll(&mut self.pages, &self.dispatcher, now);
        if let Some(profile) = self.profile.as_ref() {
            profile.poll(&mut self.pages, &self.dispatcher, now);
        }
        self.badge.poll(&self.dispatcher, now);

        if let Some(request) = self.user_search.tick(now) {
            tasks::search_users(&self.dispatcher, request, self.config.user_search_limit);
        }
        if let Some(request) = self.content_search.tick(now) {
            tasks::search_content(&self.dispatcher, request);
        }
        self.toasts.prune(now);
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn home(&self) -> &FeedState {
        &self.home
    }

    pub fn home_mut(&mut self) -> &mut FeedState {
        &mut self.home
    }

    pub fn profile(&self) -> Option<&FeedState> {
        self.profile.as_ref()
    }

    pub fn profile_mut(&mut self) -> Option<&mut FeedState> {
        self.profile.as_mut()
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    pub fn unread_notifications(&self) -> u32 {
        self.badge.unread()
    }

    pub fn user_search(&self) -> &DebouncedSearch<UserSummary> {
        &self.user_search
    }

    pub fn user_search_mut(&mut self) -> &mut DebouncedSearch<UserSummary> {
        &mut self.user_search
    }

    pub fn content_search(&self) -> &DebouncedSearch<ContentSummary> {
        &self.content_search
    }

    pub fn go_home(&mut self) {
        self.view = View::Home;
    }

    pub fn open_explore(&mut self) {
        self.view = View::Explore;
    }

    pub fn open_profile(&mut self, username: &str) {
        let already_open = matches!(
            self.profile.as_ref().map(FeedState::source),
            Some(FeedSource::Profile { username: current }) if current == username
        );
        if !already_open {
            if let Some(previous) = self.profile.take() {
                previous.unmount(&mut self.bus);
            }
            let source = FeedSource::Profile {
                username: username.to_string(),
            };
            let own = self.session.is_viewer(username);
            let mut feed = FeedState::mount(source, own, &mut self.bus);
            feed.hydrate(&self.pages);
            self.profile = Some(feed);
        }
        self.view = View::Profile;
    }

    fn visible_feed(&self) -> Option<&FeedState> {
        match self.view {
            View::Profile => self.profile.as_ref(),
            _ => Some(&self.home),
        }
    }

    /// Fetches the next page of the visible feed.
    pub fn load_more(&mut self, now: Instant) -> bool {
        let feed = match self.view {
            View::Profile => self.profile.as_ref(),
            _ => Some(&self.home),
        };
        match feed {
            Some(feed) => feed.load_more(&mut self.pages, &self.dispatcher, now),
            None => false,
        }
    }

    /// Retries page 0 of the visible feed after automatic retries ran out.
    pub fn retry_feed(&mut self) {
        let source = match (self.view, self.profile.as_ref()) {
            (View::Profile, Some(profile)) => profile.source().clone(),
            _ => FeedSource::Home,
        };
        self.pages.retry(&source.page_key(0));
    }

    /// Why the next page of the visible feed stopped loading, once automatic
    /// retries ran out.
    pub fn next_page_error(&self) -> Option<String> {
        let feed = self.visible_feed()?;
        feed.next_page_error(&self.pages)
            .map(|e| e.message().to_string())
    }

    /// Lets the next page of the visible feed load again after a failure.
    pub fn retry_next_page(&mut self) {
        if let Some(key) = self.visible_feed().and_then(FeedState::next_page_key) {
            self.pages.retry(&key);
        }
    }

    pub fn feed_error(&self, source: &FeedSource) -> Option<String> {
        let key = source.page_key(0);
        self.pages
            .retries_exhausted(&key)
            .then(|| self.pages.error(&key).map(|e| e.message().to_string()))
            .flatten()
    }

    pub fn is_feed_loading(&self, source: &FeedSource) -> bool {
        self.pages.is_fetching(&source.page_key(0))
    }

    /// Issues the server-side deletion an owner asked for from a card menu.
    pub fn spawn_delete(&mut self, activity_id: &str) -> bool {
        if !self.deleting.insert(activity_id.to_string()) {
            return false;
        }
        tasks::delete_activity(&self.dispatcher, activity_id.to_string());
        true
    }

    pub fn navigate(&mut self, target: NavTarget) {
        if let NavTarget::Profile { username } = &target {
            self.open_profile(username);
            return;
        }
        let url = target.url(&self.config.web_url);
        info!("opening {url}");
        if let Err(err) = open::that(&url) {
            warn!("failed to open {url}: {err}");
            self.toasts
                .error(format!("Could not open {url}"), Instant::now());
        }
    }
}

impl eframe::App for KatalogApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.tick(Instant::now());

        egui::TopBottomPanel::top("top_controls").show(ctx, |ui| {
            self.render_top_bar(ui);
        });

        egui::SidePanel::right("user_search")
            .resizable(false)
            .default_width(260.0)
            .show(ctx, |ui| {
                self.render_user_search(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| match self.view {
            View::Explore => self.render_explore(ui),
            View::Home | View::Profile => self.render_feed(ui),
        });

        self.render_toasts(ctx);
        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}
