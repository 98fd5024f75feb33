//! In-memory gateway for engine tests.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::{RemoteError, RemoteGateway};
use crate::models::{
    fixtures, Comment, ContentSummary, FeedPage, LikeState, NewComment, UserSummary,
};

use super::messages::AppMessage;
use super::tasks::Dispatcher;

#[derive(Default)]
struct Script {
    calls: HashMap<&'static str, usize>,
    failures: HashMap<&'static str, String>,
    comments: Vec<Comment>,
    added: Vec<NewComment>,
    activity_like: Option<LikeState>,
    activity_likes: HashMap<String, LikeState>,
    comment_like: Option<LikeState>,
    pages: HashMap<u32, FeedPage>,
    users: Vec<UserSummary>,
    unread: u32,
}

#[derive(Default)]
pub struct FakeGateway {
    script: Mutex<Script>,
}

impl FakeGateway {
    pub fn dispatcher() -> (Arc<FakeGateway>, Dispatcher, Receiver<AppMessage>) {
        let fake = Arc::new(FakeGateway::default());
        let (tx, rx) = mpsc::channel();
        let ctx = Dispatcher::new(fake.clone(), tx);
        (fake, ctx, rx)
    }

    fn with<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut script = self.script.lock().unwrap();
        f(&mut script)
    }

    fn enter(&self, name: &'static str) -> Result<(), RemoteError> {
        self.with(|s| {
            *s.calls.entry(name).or_default() += 1;
            match s.failures.get(name) {
                Some(message) => Err(RemoteError::new(message.clone())),
                None => Ok(()),
            }
        })
    }

    pub fn calls(&self, name: &str) -> usize {
        self.with(|s| s.calls.get(name).copied().unwrap_or(0))
    }

    pub fn fail(&self, name: &'static str, message: &str) {
        self.with(|s| s.failures.insert(name, message.to_string()));
    }

    pub fn fail_clear(&self, name: &'static str) {
        self.with(|s| s.failures.remove(name));
    }

    pub fn set_comments(&self, comments: Vec<Comment>) {
        self.with(|s| s.comments = comments);
    }

    pub fn added_comments(&self) -> Vec<NewComment> {
        self.with(|s| s.added.clone())
    }

    pub fn set_activity_like(&self, state: LikeState) {
        self.with(|s| s.activity_like = Some(state));
    }

    /// Makes activity likes flip server-side, starting from `state`.
    pub fn seed_activity_like(&self, activity_id: &str, state: LikeState) {
        self.with(|s| s.activity_likes.insert(activity_id.to_string(), state));
    }

    pub fn set_comment_like(&self, state: LikeState) {
        self.with(|s| s.comment_like = Some(state));
    }

    pub fn set_page(&self, page: u32, feed: FeedPage) {
        self.with(|s| s.pages.insert(page, feed));
    }

    pub fn set_users(&self, users: Vec<UserSummary>) {
        self.with(|s| s.users = users);
    }

    pub fn set_unread(&self, count: u32) {
        self.with(|s| s.unread = count);
    }
}

impl RemoteGateway for FakeGateway {
    fn toggle_activity_like(&self, activity_id: &str) -> Result<LikeState, RemoteError> {
        self.enter("toggle_activity_like")?;
        Ok(self.with(|s| {
            if let Some(state) = s.activity_likes.get_mut(activity_id) {
                state.liked = !state.liked;
                state.like_count += if state.liked { 1 } else { -1 };
                return *state;
            }
            s.activity_like.unwrap_or(LikeState { liked: true, like_count: 1 })
        }))
    }

    fn get_comments(&self, _activity_id: &str) -> Result<Vec<Comment>, RemoteError> {
        self.enter("get_comments")?;
        Ok(self.with(|s| s.comments.clone()))
    }

    fn add_comment(&self, _activity_id: &str, input: &NewComment) -> Result<Comment, RemoteError> {
        self.enter("add_comment")?;
        self.with(|s| {
            s.added.push(input.clone());
            let mut comment = fixtures::comment(&format!("new-{}", s.added.len()), &input.body);
            comment.author = fixtures::actor("mert");
            Ok(comment)
        })
    }

    fn toggle_comment_like(&self, _comment_id: &str) -> Result<LikeState, RemoteError> {
        self.enter("toggle_comment_like")?;
        Ok(self.with(|s| s.comment_like.unwrap_or(LikeState { liked: true, like_count: 1 })))
    }

    fn delete_activity(&self, _activity_id: &str) -> Result<(), RemoteError> {
        self.enter("delete_activity")
    }

    fn search_users(&self, _query: &str, limit: usize) -> Result<Vec<UserSummary>, RemoteError> {
        self.enter("search_users")?;
        Ok(self.with(|s| s.users.iter().take(limit).cloned().collect()))
    }

    fn search_content(&self, _query: &str) -> Result<Vec<ContentSummary>, RemoteError> {
        self.enter("search_content")?;
        Ok(Vec::new())
    }

    fn get_feed(&self, page: u32) -> Result<FeedPage, RemoteError> {
        self.enter("get_feed")?;
        Ok(self.with(|s| s.pages.get(&page).cloned().unwrap_or_default()))
    }

    fn get_user_activities(&self, _username: &str, page: u32) -> Result<FeedPage, RemoteError> {
        self.enter("get_user_activities")?;
        Ok(self.with(|s| s.pages.get(&page).cloned().unwrap_or_default()))
    }

    fn unread_notification_count(&self) -> Result<u32, RemoteError> {
        self.enter("unread_notification_count")?;
        Ok(self.with(|s| s.unread))
    }
}

pub fn recv(rx: &Receiver<AppMessage>) -> AppMessage {
    rx.recv_timeout(Duration::from_secs(2))
        .expect("background task did not report back")
}
