use std::borrow::Cow;
use std::collections::HashSet;

use log::{debug, error, warn};

use crate::api::RemoteError;
use crate::models::{find_comment_mut, Comment, LikeState, NewComment};

use super::feed_item::ItemKey;
use super::render::{truncate_chars, ELLIPSIS};
use super::session::Session;
use super::tasks::{self, Dispatcher};

/// Comment bodies longer than this are folded behind an inline expander.
pub const COMMENT_TRUNCATE_AT: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loading,
    Loaded,
    /// The last fetch failed; the next expansion tries again.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    pub comment_id: String,
    pub author: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejection {
    #[error("Sign in to comment")]
    Unauthenticated,
    #[error("Comment cannot be empty")]
    EmptyBody,
    #[error("Your comment is still being sent")]
    AlreadySubmitting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyView<'a> {
    pub text: Cow<'a, str>,
    /// The body is long enough to fold.
    pub expandable: bool,
    /// Currently showing the full text.
    pub expanded: bool,
}

/// Two-level comment tree of one activity, loaded on first expansion.
pub struct CommentThread {
    item: ItemKey,
    comments: Vec<Comment>,
    load: LoadState,
    load_error: Option<RemoteError>,
    pub draft: String,
    replying_to: Option<ReplyTarget>,
    submitting: bool,
    pending_parent: Option<String>,
    likes_pending: HashSet<String>,
    expanded_bodies: HashSet<String>,
}

impl CommentThread {
    pub fn new(item: ItemKey) -> Self {
        Self {
            item,
            comments: Vec::new(),
            load: LoadState::NotLoaded,
            load_error: None,
            draft: String::new(),
            replying_to: None,
            submitting: false,
            pending_parent: None,
            likes_pending: HashSet::new(),
            expanded_bodies: HashSet::new(),
        }
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn load_state(&self) -> LoadState {
        self.load
    }

    pub fn is_loaded(&self) -> bool {
        self.load == LoadState::Loaded
    }

    pub fn load_error(&self) -> Option<&RemoteError> {
        self.load_error.as_ref()
    }

    pub fn replying_to(&self) -> Option<&ReplyTarget> {
        self.replying_to.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_like_pending(&self, comment_id: &str) -> bool {
        self.likes_pending.contains(comment_id)
    }

    /// Starts the comment fetch unless one is running or the list is
    /// already loaded. Returns whether a fetch was issued.
    pub fn expand(&mut self, ctx: &Dispatcher) -> bool {
        if !matches!(self.load, LoadState::NotLoaded | LoadState::Failed) {
            return false;
        }
        self.load = LoadState::Loading;
        self.load_error = None;
        tasks::load_comments(ctx, self.item.clone());
        true
    }

    pub fn apply_loaded(&mut self, result: Result<Vec<Comment>, RemoteError>) {
        if self.load != LoadState::Loading {
            debug!("ignoring comments for {} outside a load", self.item.activity_id);
            return;
        }
        match result {
            Ok(comments) => {
                self.comments = comments;
                self.load = LoadState::Loaded;
            }
            Err(err) => {
                error!("failed to load comments for {}: {}", self.item.activity_id, err);
                self.comments.clear();
                self.load = LoadState::Failed;
                self.load_error = Some(err);
            }
        }
    }

    /// Folds every expanded body back; called when the pane closes.
    pub fn collapse(&mut self) {
        self.expanded_bodies.clear();
    }

    /// Targets a top-level comment for the next submission. Replies cannot
    /// be targeted.
    pub fn reply_to(&mut self, comment_id: &str) -> bool {
        let Some(comment) = self.comments.iter().find(|c| c.id == comment_id) else {
            warn!("reply target {comment_id} is not a top-level comment");
            return false;
        };
        self.replying_to = Some(ReplyTarget {
            comment_id: comment.id.clone(),
            author: comment.author.username.clone(),
        });
        true
    }

    pub fn cancel_reply(&mut self) {
        self.replying_to = None;
    }

    pub fn placeholder(&self) -> String {
        match &self.replying_to {
            Some(target) => format!("Reply to @{}...", target.author),
            None => "Write a comment...".to_string(),
        }
    }

    pub fn submit(&mut self, session: &Session, ctx: &Dispatcher) -> Result<(), SubmitRejection> {
        if !session.is_authenticated() {
            return Err(SubmitRejection::Unauthenticated);
        }
        if self.submitting {
            return Err(SubmitRejection::AlreadySubmitting);
        }
        let body = self.draft.trim();
        if body.is_empty() {
            return Err(SubmitRejection::EmptyBody);
        }
        let parent = self.replying_to.as_ref().map(|t| t.comment_id.clone());
        let input = NewComment {
            body: body.to_string(),
            parent_comment_id: parent.clone(),
        };
        self.submitting = true;
        self.pending_parent = parent;
        tasks::add_comment(ctx, self.item.clone(), input);
        Ok(())
    }

    /// Applies the outcome of a submission. On failure the draft is kept and
    /// the error handed back for display.
    pub fn apply_added(&mut self, result: Result<Comment, RemoteError>) -> Result<(), RemoteError> {
        self.submitting = false;
        let parent = self.pending_parent.take();
        let comment = result?;

        let parent_comment = parent
            .as_deref()
            .and_then(|id| self.comments.iter_mut().find(|c| c.id == id));
        match parent_comment {
            Some(parent) => parent.replies.push(comment),
            None => self.comments.insert(0, comment),
        }
        self.draft.clear();
        self.replying_to = None;
        Ok(())
    }

    pub fn toggle_like(&mut self, comment_id: &str, session: &Session, ctx: &Dispatcher) -> bool {
        if !session.is_authenticated() || self.likes_pending.contains(comment_id) {
            return false;
        }
        self.likes_pending.insert(comment_id.to_string());
        tasks::toggle_comment_like(ctx, self.item.clone(), comment_id.to_string());
        true
    }

    pub fn apply_like(
        &mut self,
        comment_id: &str,
        result: Result<LikeState, RemoteError>,
    ) -> Result<(), RemoteError> {
        self.likes_pending.remove(comment_id);
        let state = result?;
        match find_comment_mut(&mut self.comments, comment_id) {
            Some(comment) => comment.apply_like(state),
            None => debug!("liked comment {comment_id} is no longer listed"),
        }
        Ok(())
    }

    pub fn body_view<'a>(&self, comment: &'a Comment) -> BodyView<'a> {
        let expanded = self.expanded_bodies.contains(&comment.id);
        match truncate_chars(&comment.body, COMMENT_TRUNCATE_AT) {
            Some(head) if !expanded => BodyView {
                text: Cow::Owned(format!("{head}{ELLIPSIS}")),
                expandable: true,
                expanded: false,
            },
            Some(_) => BodyView {
                text: Cow::Borrowed(&comment.body),
                expandable: true,
                expanded: true,
            },
            None => BodyView {
                text: Cow::Borrowed(&comment.body),
                expandable: false,
                expanded: false,
            },
        }
    }

    pub fn toggle_body(&mut self, comment_id: &str) {
        if !self.expanded_bodies.remove(comment_id) {
            self.expanded_bodies.insert(comment_id.to_string());
        }
    }
}
