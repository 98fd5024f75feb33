use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};

use crate::api::RemoteError;
use crate::models::{Activity, ActivityPayload, Comment, LikeState};

use super::comments::{CommentThread, LoadState};
use super::render::{excerpt, Excerpt, EXCERPT_TRUNCATE_AT};
use super::session::Session;
use super::tasks::{self, Dispatcher};

static NEXT_MOUNT: AtomicU64 = AtomicU64::new(1);

fn next_mount() -> u64 {
    NEXT_MOUNT.fetch_add(1, Ordering::Relaxed)
}

/// Addresses one mounted feed item. A remount gets a new `mount`, so results
/// started by the previous mount no longer match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub activity_id: String,
    pub mount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentPane {
    Collapsed,
    Loading,
    Expanded,
    Failed,
}

pub struct FeedItemState {
    key: ItemKey,
    activity: Activity,
    is_own_profile: bool,
    like_pending: bool,
    comments_open: bool,
    menu_open: bool,
    spoiler_revealed: bool,
    thread: CommentThread,
}

impl FeedItemState {
    pub fn new(activity: Activity, is_own_profile: bool) -> Self {
        let key = ItemKey {
            activity_id: activity.id.clone(),
            mount: next_mount(),
        };
        Self {
            thread: CommentThread::new(key.clone()),
            key,
            activity,
            is_own_profile,
            like_pending: false,
            comments_open: false,
            menu_open: false,
            spoiler_revealed: false,
        }
    }

    pub fn key(&self) -> &ItemKey {
        &self.key
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    pub fn thread(&self) -> &CommentThread {
        &self.thread
    }

    pub fn thread_mut(&mut self) -> &mut CommentThread {
        &mut self.thread
    }

    /// Takes a fresh copy of the activity from a page reload. A like still
    /// in flight keeps its local values until the server answers.
    pub fn refresh(&mut self, activity: Activity) {
        if activity.id != self.activity.id {
            warn!(
                "refusing to refresh item {} with activity {}",
                self.activity.id, activity.id
            );
            return;
        }
        let (liked, like_count) = (self.activity.liked, self.activity.like_count);
        self.activity = activity;
        if self.like_pending {
            self.activity.liked = liked;
            self.activity.like_count = like_count;
        }
    }

    pub fn is_like_pending(&self) -> bool {
        self.like_pending
    }

    pub fn can_like(&self, session: &Session) -> bool {
        session.is_authenticated() && !self.like_pending
    }

    pub fn toggle_like(&mut self, session: &Session, ctx: &Dispatcher) -> bool {
        if !self.can_like(session) {
            return false;
        }
        self.like_pending = true;
        tasks::toggle_activity_like(ctx, self.key.clone());
        true
    }

    pub fn apply_like(&mut self, result: Result<LikeState, RemoteError>) -> Result<(), RemoteError> {
        self.like_pending = false;
        let state = result?;
        self.activity.apply_like(state);
        Ok(())
    }

    /// Opens or closes the comment pane. The first opening loads the thread;
    /// closing keeps whatever was loaded.
    pub fn toggle_comments(&mut self, ctx: &Dispatcher) -> CommentPane {
        if self.comments_open {
            self.comments_open = false;
            self.thread.collapse();
        } else {
            self.comments_open = true;
            if self.thread.expand(ctx) {
                debug!("loading comments for {}", self.key.activity_id);
            }
        }
        self.pane()
    }

    pub fn pane(&self) -> CommentPane {
        if !self.comments_open {
            CommentPane::Collapsed
        } else {
            match self.thread.load_state() {
                LoadState::Loading => CommentPane::Loading,
                LoadState::Failed => CommentPane::Failed,
                LoadState::NotLoaded | LoadState::Loaded => CommentPane::Expanded,
            }
        }
    }

    /// Refetches comments after a failed load while the pane stays open.
    pub fn retry_comments(&mut self, ctx: &Dispatcher) -> bool {
        self.comments_open && self.pane() == CommentPane::Failed && self.thread.expand(ctx)
    }

    pub fn apply_comment_added(&mut self, result: Result<Comment, RemoteError>) -> Result<(), RemoteError> {
        self.thread.apply_added(result)?;
        self.activity.comment_count += 1;
        Ok(())
    }

    /// A comment on this activity was posted through another mount.
    pub fn note_comment_elsewhere(&mut self) {
        self.activity.comment_count += 1;
    }

    pub fn can_delete(&self) -> bool {
        self.is_own_profile
    }

    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = self.can_delete() && !self.menu_open;
    }

    pub fn close_menu(&mut self) {
        self.menu_open = false;
    }

    /// Hands the activity id to `on_delete` and closes the menu. The item
    /// does not talk to the network; the caller owns the removal.
    pub fn request_delete<F: FnOnce(&str)>(&mut self, on_delete: F) -> bool {
        if !self.can_delete() {
            warn!("delete requested for {} outside the owner's profile", self.activity.id);
            return false;
        }
        self.menu_open = false;
        on_delete(&self.activity.id);
        true
    }

    pub fn spoiler_hidden(&self) -> bool {
        match &self.activity.payload {
            ActivityPayload::Comment(p) => p.spoiler && !self.spoiler_revealed,
            _ => false,
        }
    }

    pub fn reveal_spoiler(&mut self) {
        self.spoiler_revealed = true;
    }

    pub fn hide_spoiler(&mut self) {
        self.spoiler_revealed = false;
    }

    /// Card excerpt of a comment activity; longer bodies link out instead of
    /// expanding in place.
    pub fn excerpt(&self) -> Option<Excerpt<'_>> {
        match &self.activity.payload {
            ActivityPayload::Comment(p) => Some(excerpt(&p.body, EXCERPT_TRUNCATE_AT)),
            _ => None,
        }
    }
}
