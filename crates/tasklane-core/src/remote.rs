use thiserror::Error;

use crate::model::Task;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("request {method} {url} failed: {message}")]
    Transport {
        method: &'static str,
        url: String,
        message: String,
    },

    #[error("{method} {url} returned HTTP {status}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
    },

    #[error("failed decoding response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Single round trip per call, no retries.
///
/// `create` and `update` return the task echoed by the server when the
/// response carries one; callers re-fetch with `list` either way.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    async fn list(&self) -> Result<Vec<Task>, RemoteError>;

    async fn create(&self, task: &Task) -> Result<Option<Task>, RemoteError>;

    async fn update(&self, id: &str, task: &Task) -> Result<Option<Task>, RemoteError>;

    async fn delete(&self, id: &str) -> Result<(), RemoteError>;

    async fn delete_completed(&self) -> Result<(), RemoteError>;

    async fn delete_all(&self) -> Result<(), RemoteError>;
}
