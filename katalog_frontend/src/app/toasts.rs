use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const TOAST_LIFETIME: Duration = Duration::from_secs(4);
const MAX_TOASTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub text: String,
    pub level: ToastLevel,
    expires_at: Instant,
}

/// Short-lived notices shown over the page. Oldest are dropped first once
/// the stack is full.
#[derive(Debug, Default)]
pub struct Toasts {
    entries: VecDeque<Toast>,
}

impl Toasts {
    pub fn info(&mut self, text: impl Into<String>, now: Instant) {
        self.push(text.into(), ToastLevel::Info, now);
    }

    pub fn error(&mut self, text: impl Into<String>, now: Instant) {
        self.push(text.into(), ToastLevel::Error, now);
    }

    fn push(&mut self, text: String, level: ToastLevel, now: Instant) {
        if self.entries.len() == MAX_TOASTS {
            self.entries.pop_front();
        }
        self.entries.push_back(Toast {
            text,
            level,
            expires_at: now + TOAST_LIFETIME,
        });
    }

    pub fn prune(&mut self, now: Instant) {
        self.entries.retain(|toast| toast.expires_at > now);
    }

    pub fn dismiss(&mut self, index: usize) {
        self.entries.remove(index);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
