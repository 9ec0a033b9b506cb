//! HTTP client for the wall's board and post endpoints.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use events::{Board, BoardId, Post, PostId, PostStatus};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message} ({code})")]
    Status { status: u16, code: String, message: String },
}

/// Body of `POST /api/posts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_id: Option<BoardId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    code: String,
}

#[derive(Serialize)]
struct StatusPatch {
    status: PostStatus,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidBaseUrl`] unless `base_url` is `http://` or
    /// `https://`.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/');
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::InvalidBaseUrl(base_url.to_owned()));
        }
        Ok(Self { http: reqwest::Client::new(), base_url: base_url.to_owned() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Board with its approved posts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or a non-success status.
    pub async fn fetch_board(&self, board_id: BoardId) -> Result<Board, ApiError> {
        let url = format!("{}/api/boards/{board_id}", self.base_url);
        read_json(self.http.get(url).send().await?).await
    }

    /// The active board with its approved posts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or a non-success status,
    /// including 404 when no board is active.
    pub async fn fetch_active_board(&self) -> Result<Board, ApiError> {
        let url = format!("{}/api/boards/active", self.base_url);
        read_json(self.http.get(url).send().await?).await
    }

    /// Posts newest first, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or a non-success status.
    pub async fn list_posts(
        &self,
        board_id: Option<BoardId>,
        status: Option<PostStatus>,
    ) -> Result<Vec<Post>, ApiError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(board_id) = board_id {
            query.push(("boardId", board_id.to_string()));
        }
        if let Some(status) = status {
            query.push(("status", status.as_str().to_owned()));
        }
        let url = format!("{}/api/posts", self.base_url);
        read_json(self.http.get(url).query(&query).send().await?).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or a non-success status.
    pub async fn create_post(&self, post: &NewPost) -> Result<Post, ApiError> {
        let url = format!("{}/api/posts", self.base_url);
        read_json(self.http.post(url).json(post).send().await?).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or a non-success status.
    pub async fn update_post_status(&self, post_id: PostId, status: PostStatus) -> Result<Post, ApiError> {
        let url = format!("{}/api/posts/{post_id}", self.base_url);
        debug!(post_id, status = status.as_str(), "channel: updating post status");
        read_json(self.http.patch(url).json(&StatusPatch { status }).send().await?).await
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let text = response.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), &text))
}

fn status_error(status: u16, body: &str) -> ApiError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error, code }) => ApiError::Status { status, code, message: error },
        Err(_) => ApiError::Status { status, code: "E_HTTP".to_owned(), message: body.to_owned() },
    }
}
