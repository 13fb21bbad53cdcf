//! Access to the backend where activities live.
//!
//! [ActivityRepository] is the only contract the rest of the crate relies on. Two realizations
//! exist:
//!  - [rest::RestRepository] talks to a hosted PostgREST compatible backend.
//!  - [memory::InMemoryRepository] keeps everything in the process. Used for tests and demos.

pub mod memory;
pub mod rest;
pub mod watch;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use thiserror::Error;

use crate::activity::{Activity, ActivityDraft};

/// Notification that something in the activity collection changed. Carries no data, receivers
/// are expected to read the collection again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    Insert,
    Update,
    Delete,
    /// Some notifications were lost.
    Resync,
}

/// Stream of change notifications. Dropping it releases the underlying channel.
pub type ChangeFeed = BoxStream<'static, ChangeEvent>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend responded with {status}: {message}")]
    Status { status: u16, message: String },

    #[error("couldn't decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("backend didn't return the created record")]
    EmptyResponse,

    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityRepository: Send + Sync + 'static {
    /// Stores a draft. The repository assigns the id and, unless the draft carries a start, the
    /// timestamp.
    async fn create(&self, draft: ActivityDraft) -> RepositoryResult<Activity>;

    /// Every activity, newest timestamp first.
    async fn list_all(&self) -> RepositoryResult<Vec<Activity>>;

    /// Activities with `start <= timestamp <= end`, newest first.
    async fn list_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Activity>>;

    /// Registers for change notifications on the collection.
    fn subscribe(&self) -> ChangeFeed;
}
