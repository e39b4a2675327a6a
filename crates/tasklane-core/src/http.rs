use std::time::Duration;

use anyhow::{Context, anyhow};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Url};
use tasklane_shared::{TASKS_PATH, TaskDto};
use tracing::{debug, instrument, warn};

use crate::model::{Task, tasks_from_dtos};
use crate::remote::{RemoteError, RemoteStore};

const COMPLETED_SEGMENT: &str = "completed";

/// `RemoteStore` backed by the `/api/tasks` REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    collection: Url,
}

impl HttpRemoteStore {
    pub fn new(api_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base = Url::parse(api_url.trim())
            .with_context(|| format!("invalid api_url {api_url:?}"))?;
        let collection = tasks_url(&base)?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building HTTP client for the task API")?;

        debug!(collection = %collection, "configured task API client");
        Ok(Self { client, collection })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection
    }

    async fn send(&self, method: Method, url: Url, body: Option<&Task>) -> Result<String, RemoteError> {
        let method_name = method_label(&method);
        let mut request = self
            .client
            .request(method, url.clone())
            .header(ACCEPT, "application/json");

        if let Some(task) = body {
            let payload =
                serde_json::to_vec(&TaskDto::from(task)).map_err(|error| RemoteError::Transport {
                    method: method_name,
                    url: url.to_string(),
                    message: format!("failed encoding request body: {error}"),
                })?;
            request = request.header(CONTENT_TYPE, "application/json").body(payload);
        }

        let response = request.send().await.map_err(|error| {
            warn!(method = method_name, url = %url, error = %error, "task API request failed");
            RemoteError::Transport {
                method: method_name,
                url: url.to_string(),
                message: error.to_string(),
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|error| RemoteError::Transport {
            method: method_name,
            url: url.to_string(),
            message: format!("failed reading response body: {error}"),
        })?;

        if !status.is_success() {
            warn!(method = method_name, url = %url, status = status.as_u16(), "task API returned an error status");
            return Err(RemoteError::Status {
                method: method_name,
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        debug!(method = method_name, url = %url, status = status.as_u16(), bytes = text.len(), "task API request succeeded");
        Ok(text)
    }
}

impl RemoteStore for HttpRemoteStore {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Task>, RemoteError> {
        let url = self.collection.clone();
        let text = self.send(Method::GET, url.clone(), None).await?;
        decode_task_list(&url, &text)
    }

    #[instrument(skip(self, task), fields(title_len = task.title.len()))]
    async fn create(&self, task: &Task) -> Result<Option<Task>, RemoteError> {
        let text = self
            .send(Method::POST, self.collection.clone(), Some(task))
            .await?;
        Ok(decode_echoed_task(&text))
    }

    #[instrument(skip(self, task), fields(task_id = %id))]
    async fn update(&self, id: &str, task: &Task) -> Result<Option<Task>, RemoteError> {
        let text = self
            .send(Method::PUT, task_url(&self.collection, id), Some(task))
            .await?;
        Ok(decode_echoed_task(&text))
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.send(Method::DELETE, task_url(&self.collection, id), None)
            .await
            .map(drop)
    }

    #[instrument(skip(self))]
    async fn delete_completed(&self) -> Result<(), RemoteError> {
        self.send(
            Method::DELETE,
            task_url(&self.collection, COMPLETED_SEGMENT),
            None,
        )
        .await
        .map(drop)
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> Result<(), RemoteError> {
        self.send(Method::DELETE, self.collection.clone(), None)
            .await
            .map(drop)
    }
}

fn method_label(method: &Method) -> &'static str {
    if *method == Method::GET {
        "GET"
    } else if *method == Method::POST {
        "POST"
    } else if *method == Method::PUT {
        "PUT"
    } else if *method == Method::DELETE {
        "DELETE"
    } else {
        "OTHER"
    }
}

fn tasks_url(base: &Url) -> anyhow::Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| anyhow!("api_url {base} cannot carry a path"))?
        .pop_if_empty()
        .extend(TASKS_PATH.split('/').filter(|segment| !segment.is_empty()));
    Ok(url)
}

/// Ids are opaque, so they are pushed as a single escaped path segment.
fn task_url(collection: &Url, id: &str) -> Url {
    let mut url = collection.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.push(id);
    }
    url
}

fn decode_task_list(url: &Url, text: &str) -> Result<Vec<Task>, RemoteError> {
    let dtos: Vec<TaskDto> = serde_json::from_str(text).map_err(|error| RemoteError::Decode {
        url: url.to_string(),
        message: error.to_string(),
    })?;
    Ok(tasks_from_dtos(dtos))
}

/// Servers may answer a write with the stored task or with a bare status
/// document; only the former is returned.
fn decode_echoed_task(text: &str) -> Option<Task> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str::<TaskDto>(trimmed)
        .ok()
        .and_then(|dto| Task::try_from(dto).ok())
}
