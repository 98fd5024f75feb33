use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use log::{error, info};

use crate::api::RemoteGateway;
use crate::models::NewComment;

use super::feed_item::ItemKey;
use super::images::LoadedImage;
use super::messages::AppMessage;
use super::query_cache::QueryKey;
use super::search::SearchRequest;

pub type Gateway = Arc<dyn RemoteGateway>;

/// Gateway plus the channel results come back on. Cheap to clone; engines
/// borrow it to start background calls.
#[derive(Clone)]
pub struct Dispatcher {
    api: Gateway,
    tx: Sender<AppMessage>,
}

impl Dispatcher {
    pub fn new(api: Gateway, tx: Sender<AppMessage>) -> Self {
        Self { api, tx }
    }
}

fn deliver(tx: &Sender<AppMessage>, message: AppMessage, name: &str) {
    if tx.send(message).is_err() {
        error!("failed to send {name} message");
    }
}

pub fn toggle_activity_like(ctx: &Dispatcher, item: ItemKey) {
    let (api, tx) = (ctx.api.clone(), ctx.tx.clone());
    thread::spawn(move || {
        let result = api.toggle_activity_like(&item.activity_id);
        deliver(&tx, AppMessage::ActivityLikeToggled { item, result }, "ActivityLikeToggled");
    });
}

pub fn load_comments(ctx: &Dispatcher, item: ItemKey) {
    let (api, tx) = (ctx.api.clone(), ctx.tx.clone());
    thread::spawn(move || {
        let result = api.get_comments(&item.activity_id);
        deliver(&tx, AppMessage::CommentsLoaded { item, result }, "CommentsLoaded");
    });
}

pub fn add_comment(ctx: &Dispatcher, item: ItemKey, input: NewComment) {
    let (api, tx) = (ctx.api.clone(), ctx.tx.clone());
    thread::spawn(move || {
        let result = api.add_comment(&item.activity_id, &input);
        deliver(&tx, AppMessage::CommentAdded { item, result }, "CommentAdded");
    });
}

pub fn toggle_comment_like(ctx: &Dispatcher, item: ItemKey, comment_id: String) {
    let (api, tx) = (ctx.api.clone(), ctx.tx.clone());
    thread::spawn(move || {
        let result = api.toggle_comment_like(&comment_id);
        let message = AppMessage::CommentLikeToggled {
            item,
            comment_id,
            result,
        };
        deliver(&tx, message, "CommentLikeToggled");
    });
}

pub fn delete_activity(ctx: &Dispatcher, activity_id: String) {
    let (api, tx) = (ctx.api.clone(), ctx.tx.clone());
    thread::spawn(move || {
        let result = api.delete_activity(&activity_id);
        deliver(&tx, AppMessage::ActivityDeleted { activity_id, result }, "ActivityDeleted");
    });
}

pub fn search_users(ctx: &Dispatcher, request: SearchRequest, limit: usize) {
    let (api, tx) = (ctx.api.clone(), ctx.tx.clone());
    thread::spawn(move || {
        let result = api.search_users(&request.query, limit);
        let message = AppMessage::UsersFound {
            generation: request.generation,
            result,
        };
        deliver(&tx, message, "UsersFound");
    });
}

pub fn search_content(ctx: &Dispatcher, request: SearchRequest) {
    let (api, tx) = (ctx.api.clone(), ctx.tx.clone());
    thread::spawn(move || {
        let result = api.search_content(&request.query);
        let message = AppMessage::ContentFound {
            generation: request.generation,
            result,
        };
        deliver(&tx, message, "ContentFound");
    });
}

pub fn load_feed_page(ctx: &Dispatcher, key: QueryKey) {
    let (api, tx) = (ctx.api.clone(), ctx.tx.clone());
    thread::spawn(move || {
        let result = match &key {
            QueryKey::Feed { page } => api.get_feed(*page),
            QueryKey::UserActivities { username, page } => api.get_user_activities(username, *page),
            QueryKey::UnreadNotifications => {
                error!("load_feed_page called with {key:?}");
                return;
            }
        };
        deliver(&tx, AppMessage::FeedPageLoaded { key, result }, "FeedPageLoaded");
    });
}

pub fn load_unread_count(ctx: &Dispatcher) {
    let (api, tx) = (ctx.api.clone(), ctx.tx.clone());
    thread::spawn(move || {
        let result = api.unread_notification_count();
        deliver(&tx, AppMessage::UnreadCountLoaded(result), "UnreadCountLoaded");
    });
}

pub fn download_image(tx: Sender<AppMessage>, url: String) {
    thread::spawn(move || {
        info!("Downloading image from URL: {}", url);

        let result = (|| -> Result<LoadedImage, String> {
            let resp = reqwest::blocking::get(&url).map_err(|e| format!("Request error: {}", e))?;
            let resp = resp
                .error_for_status()
                .map_err(|e| format!("Request error: {}", e))?;
            let bytes = resp.bytes().map_err(|e| format!("Download error: {}", e))?;
            let dyn_img =
                image::load_from_memory(&bytes).map_err(|e| format!("Image decode error: {}", e))?;
            let rgba = dyn_img.to_rgba8();
            let size = [dyn_img.width() as usize, dyn_img.height() as usize];
            Ok(LoadedImage {
                size,
                pixels: rgba.as_flat_samples().as_slice().to_vec(),
            })
        })();

        deliver(&tx, AppMessage::ImageLoaded { url, result }, "ImageLoaded");
    });
}
