use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::task::{Task, TodoPage};

pub const DEFAULT_TODOS_URL: &str = "https://dummyjson.com/todos";

/// Anything that can hand over the initial batch of tasks.
#[async_trait]
pub trait TaskSource {
    async fn fetch(&self) -> Result<Vec<Task>, LoadError>;
}

#[derive(Debug, Clone)]
pub struct HttpTaskSource {
    client: reqwest::Client,
    url: String,
    limit: Option<u64>,
}

impl HttpTaskSource {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        limit: Option<u64>,
    ) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| LoadError::Client(err.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            limit,
        })
    }

    fn endpoint(&self) -> Result<reqwest::Url, LoadError> {
        let mut endpoint = reqwest::Url::parse(&self.url).map_err(|err| LoadError::Transport {
            url: self.url.clone(),
            reason: format!("invalid URL: {err}"),
        })?;
        if let Some(limit) = self.limit {
            endpoint
                .query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        }
        Ok(endpoint)
    }
}

#[async_trait]
impl TaskSource for HttpTaskSource {
    #[tracing::instrument(skip(self), fields(url = %self.url, limit = ?self.limit))]
    async fn fetch(&self) -> Result<Vec<Task>, LoadError> {
        let endpoint = self.endpoint()?;
        let request = self
            .client
            .get(endpoint)
            .header(reqwest::header::ACCEPT, "application/json");

        let response = request.send().await.map_err(|err| {
            warn!(error = %err, "todo request failed");
            LoadError::Transport {
                url: self.url.clone(),
                reason: err.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "todo endpoint returned non-success status");
            return Err(LoadError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|err| LoadError::Transport {
            url: self.url.clone(),
            reason: err.to_string(),
        })?;
        debug!(bytes = body.len(), "received todo payload");

        let page = decode_page(&body).map_err(|err| LoadError::Decode {
            url: self.url.clone(),
            reason: err.to_string(),
        })?;

        info!(
            count = page.todos.len(),
            total = ?page.total,
            "fetched todos"
        );
        Ok(page.todos)
    }
}

pub fn decode_page(body: &str) -> serde_json::Result<TodoPage> {
    serde_json::from_str(body)
}
