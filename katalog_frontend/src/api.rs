use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::models::{
    Comment, ContentSummary, FeedPage, LikeState, NewComment, UnreadCountResponse, UserSummary,
};

/// Failure of a remote call, carrying a message fit to show the operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RemoteError {
    message: String,
    status: Option<u16>,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        let message = if err.is_timeout() {
            "The server took too long to respond".to_string()
        } else if err.is_connect() {
            "Could not reach the server".to_string()
        } else if err.is_decode() {
            "The server sent an unexpected response".to_string()
        } else {
            err.to_string()
        };
        Self { message, status }
    }
}

/// Everything the client needs from the remote service. Calls block the
/// calling thread; the app only invokes them from background tasks.
pub trait RemoteGateway: Send + Sync {
    fn toggle_activity_like(&self, activity_id: &str) -> Result<LikeState, RemoteError>;
    fn get_comments(&self, activity_id: &str) -> Result<Vec<Comment>, RemoteError>;
    fn add_comment(&self, activity_id: &str, input: &NewComment) -> Result<Comment, RemoteError>;
    fn toggle_comment_like(&self, comment_id: &str) -> Result<LikeState, RemoteError>;
    fn delete_activity(&self, activity_id: &str) -> Result<(), RemoteError>;
    fn search_users(&self, query: &str, limit: usize) -> Result<Vec<UserSummary>, RemoteError>;
    fn search_content(&self, query: &str) -> Result<Vec<ContentSummary>, RemoteError>;
    fn get_feed(&self, page: u32) -> Result<FeedPage, RemoteError>;
    fn get_user_activities(&self, username: &str, page: u32) -> Result<FeedPage, RemoteError>;
    fn unread_notification_count(&self) -> Result<u32, RemoteError>;
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base = sanitize_base_url(base_url.into())?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base,
            token: None,
            client,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, RemoteError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| RemoteError::new(format!("invalid base URL: {err}")))?;
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response, RemoteError> {
        let response = self.authorized(builder).send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let fallback = status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
        let message = response
            .json::<ErrorBody>()
            .ok()
            .and_then(|body| body.error.or(body.message))
            .unwrap_or(fallback);
        debug!("request failed with {status}: {message}");
        Err(RemoteError::with_status(message, status.as_u16()))
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, RemoteError> {
        let response = self.send(self.client.get(url))?;
        Ok(response.json()?)
    }

    fn post_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, RemoteError> {
        let response = self.send(self.client.post(url))?;
        Ok(response.json()?)
    }
}

impl RemoteGateway for ApiClient {
    fn toggle_activity_like(&self, activity_id: &str) -> Result<LikeState, RemoteError> {
        let url = self.url(&format!("/activities/{activity_id}/like"))?;
        self.post_json(url)
    }

    fn get_comments(&self, activity_id: &str) -> Result<Vec<Comment>, RemoteError> {
        let url = self.url(&format!("/activities/{activity_id}/comments"))?;
        self.get_json(url)
    }

    fn add_comment(&self, activity_id: &str, input: &NewComment) -> Result<Comment, RemoteError> {
        let url = self.url(&format!("/activities/{activity_id}/comments"))?;
        let response = self.send(self.client.post(url).json(input))?;
        Ok(response.json()?)
    }

    fn toggle_comment_like(&self, comment_id: &str) -> Result<LikeState, RemoteError> {
        let url = self.url(&format!("/comments/{comment_id}/like"))?;
        self.post_json(url)
    }

    fn delete_activity(&self, activity_id: &str) -> Result<(), RemoteError> {
        let url = self.url(&format!("/activities/{activity_id}"))?;
        self.send(self.client.delete(url))?;
        Ok(())
    }

    fn search_users(&self, query: &str, limit: usize) -> Result<Vec<UserSummary>, RemoteError> {
        let mut url = self.url("/users/search")?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("limit", &limit.to_string());
        self.get_json(url)
    }

    fn search_content(&self, query: &str) -> Result<Vec<ContentSummary>, RemoteError> {
        let mut url = self.url("/content/search")?;
        url.query_pairs_mut().append_pair("q", query);
        self.get_json(url)
    }

    fn get_feed(&self, page: u32) -> Result<FeedPage, RemoteError> {
        let mut url = self.url("/feed")?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        self.get_json(url)
    }

    fn get_user_activities(&self, username: &str, page: u32) -> Result<FeedPage, RemoteError> {
        let mut url = self.url(&format!("/users/{username}/activities"))?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        self.get_json(url)
    }

    fn unread_notification_count(&self) -> Result<u32, RemoteError> {
        let url = self.url("/notifications/unread-count")?;
        let body: UnreadCountResponse = self.get_json(url)?;
        Ok(body.count)
    }
}

fn sanitize_base_url(mut base: String) -> Result<String> {
    if !base.starts_with("http://") && !base.starts_with("https://") {
        base = format!("http://{base}");
    }
    while base.ends_with('/') {
        base.pop();
    }
    let _ = Url::parse(&base).context("invalid base URL")?;
    Ok(base)
}
