//! Backend seam: reads that fill the cache and the two ordering commands.

use std::time::Duration;

use async_trait::async_trait;
use boardsync_common::{Board, BoardId, Column, MoveTask, ReorderColumns, Task};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::errors::SyncError;

pub type SyncResult<T> = Result<T, SyncError>;

/// Everything the engine asks of the backend.
#[async_trait]
pub trait BoardApi: Send + Sync {
    async fn fetch_board(&self, board_id: BoardId) -> SyncResult<Board>;
    async fn fetch_columns(&self, board_id: BoardId) -> SyncResult<Vec<Column>>;
    async fn fetch_tasks(&self, board_id: BoardId) -> SyncResult<Vec<Task>>;
    async fn reorder_columns(&self, board_id: BoardId, command: &ReorderColumns) -> SyncResult<()>;
    async fn move_task(&self, command: &MoveTask) -> SyncResult<()>;
}

/// `BoardApi` over HTTP with JSON bodies and bearer auth.
#[derive(Clone)]
pub struct HttpBoardApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBoardApi {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("boardsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Other(anyhow::Error::new(e).context("Failed to create HTTP client")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, endpoint: &str, req: RequestBuilder) -> SyncResult<Response> {
        let response = self
            .authorize(req)
            .send()
            .await
            .map_err(|source| SyncError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;
        check_status(endpoint, response.status())?;
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> SyncResult<T> {
        let response = self.send(path, self.client.get(self.url(path))).await?;
        response.json::<T>().await.map_err(|source| SyncError::Decode {
            endpoint: path.to_string(),
            source,
        })
    }
}

fn check_status(endpoint: &str, status: StatusCode) -> SyncResult<()> {
    if status.is_success() {
        return Ok(());
    }
    let endpoint = endpoint.to_string();
    Err(match status {
        StatusCode::UNAUTHORIZED => SyncError::Unauthorized { endpoint },
        StatusCode::FORBIDDEN => SyncError::Forbidden { endpoint },
        StatusCode::NOT_FOUND => SyncError::NotFound { endpoint },
        other => SyncError::Status {
            endpoint,
            status: other.as_u16(),
        },
    })
}

#[async_trait]
impl BoardApi for HttpBoardApi {
    async fn fetch_board(&self, board_id: BoardId) -> SyncResult<Board> {
        self.get_json(&format!("/boards/{board_id}")).await
    }

    async fn fetch_columns(&self, board_id: BoardId) -> SyncResult<Vec<Column>> {
        self.get_json(&format!("/boards/{board_id}/columns")).await
    }

    async fn fetch_tasks(&self, board_id: BoardId) -> SyncResult<Vec<Task>> {
        self.get_json(&format!("/boards/{board_id}/tasks")).await
    }

    async fn reorder_columns(&self, board_id: BoardId, command: &ReorderColumns) -> SyncResult<()> {
        let path = format!("/boards/{board_id}/columns/reorder");
        let req = self.client.put(self.url(&path)).json(command);
        self.send(&path, req).await?;
        Ok(())
    }

    async fn move_task(&self, command: &MoveTask) -> SyncResult<()> {
        let path = format!("/tasks/{}/move", command.task_id);
        let req = self.client.patch(self.url(&path)).json(command);
        self.send(&path, req).await?;
        Ok(())
    }
}
