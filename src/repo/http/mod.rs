pub mod model;

use std::time::Duration;

use anyhow::{Context, Result};
use model::NewTodo;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::TodoBackend;
use crate::domain::todo::Todo;
use crate::error::TodoError;

/// REST backend owning the todo collection.
///
/// Exposes a synchronous facade over a private Tokio runtime so the event
/// loop stays single-threaded; each call blocks until the round-trip ends.
pub struct HttpTodoBackend {
    url: String,
    client: Client,
    rt: tokio::runtime::Runtime,
}

impl HttpTodoBackend {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to init HTTP client")?;
        Self::with_client(url, client)
    }

    fn with_client(url: impl Into<String>, client: Client) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .context("failed to build tokio runtime")?;
        Ok(Self {
            url: url.into(),
            client,
            rt,
        })
    }

    async fn fetch_all(&self) -> Result<Vec<Todo>, TodoError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| network("fetching todos", e))?;
        decode(resp, "fetching todos").await
    }

    async fn post(&self, description: &str) -> Result<Todo, TodoError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&NewTodo::open(description))
            .send()
            .await
            .map_err(|e| network("adding todo", e))?;
        decode(resp, "adding todo").await
    }
}

impl TodoBackend for HttpTodoBackend {
    fn fetch_todos(&self) -> Result<Vec<Todo>, TodoError> {
        let todos = self.rt.block_on(self.fetch_all())?;
        info!(url = %self.url, count = todos.len(), "fetched todos from backend");
        Ok(todos)
    }

    fn create_todo(&self, description: &str) -> Result<Todo, TodoError> {
        let todo = self.rt.block_on(self.post(description))?;
        info!(url = %self.url, id = todo.id, "backend created todo");
        Ok(todo)
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response, action: &str) -> Result<T, TodoError> {
    let status = resp.status();
    if !status.is_success() {
        warn!(%status, action, "backend request failed");
        return Err(TodoError::Network(format!("HTTP error. Status: {status}")));
    }
    resp.json::<T>().await.map_err(|e| network(action, e))
}

fn network(action: &str, err: reqwest::Error) -> TodoError {
    warn!(action, error = %err, "backend request failed");
    TodoError::Network(err.to_string())
}
