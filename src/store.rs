//! In-process mirror of the activity collection.
//!
//! [ActivityStore] holds whatever the last fetch returned, plus records added through it since.
//! The cache lives in a [watch] channel so views can wait for it to change instead of polling.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument};

use crate::{
    activity::{Activity, ActivityDraft},
    repository::{ActivityRepository, RepositoryResult},
};

#[derive(Clone)]
pub struct ActivityStore {
    repository: Arc<dyn ActivityRepository>,
    activities: Arc<watch::Sender<Vec<Activity>>>,
}

impl ActivityStore {
    pub fn new(repository: Arc<dyn ActivityRepository>) -> Self {
        let (activities, _) = watch::channel(Vec::new());
        Self {
            repository,
            activities: Arc::new(activities),
        }
    }

    /// Snapshot of the cached activities, newest first.
    pub fn activities(&self) -> Vec<Activity> {
        self.activities.borrow().clone()
    }

    /// Receiver that is marked changed on every cache update.
    pub fn observe(&self) -> watch::Receiver<Vec<Activity>> {
        self.activities.subscribe()
    }

    /// Replaces the cache with everything the repository has. Errors are returned as they are,
    /// the cache is left alone in that case.
    pub async fn load(&self) -> RepositoryResult<()> {
        let activities = self.repository.list_all().await?;
        debug!("Loaded {} activities", activities.len());
        self.activities.send_replace(activities);
        Ok(())
    }

    /// Stores a draft and puts the created record at the front of the cache.
    pub async fn add(&self, draft: ActivityDraft) -> RepositoryResult<Activity> {
        let created = self.repository.create(draft).await?;
        info!("Added activity {}", created.id);
        self.activities
            .send_modify(|activities| activities.insert(0, created.clone()));
        Ok(created)
    }

    /// Reloads the cache every time the repository reports a change. Reloading stops once the
    /// returned [Subscription] is disposed or dropped.
    pub fn subscribe_to_updates(&self) -> Subscription {
        let token = CancellationToken::new();
        let mut feed = self.repository.subscribe();
        let repository = self.repository.clone();
        let activities = self.activities.clone();
        let cancelled = token.clone();

        let task = async move {
            loop {
                let event = tokio::select! {
                    _ = cancelled.cancelled() => break,
                    event = feed.next() => event,
                };
                let Some(event) = event else {
                    debug!("Change feed closed");
                    break;
                };
                debug!("Received {event:?}, reloading");

                let fetched = tokio::select! {
                    _ = cancelled.cancelled() => break,
                    fetched = repository.list_all() => fetched,
                };
                let fetched = match fetched {
                    Ok(fetched) => fetched,
                    Err(e) => {
                        error!("Failed to reload activities after {event:?}: {e}");
                        continue;
                    }
                };
                // The token is checked under the cache lock, which `dispose` takes as well.
                let written = activities.send_if_modified(|current| {
                    if cancelled.is_cancelled() {
                        return false;
                    }
                    *current = fetched;
                    true
                });
                if !written {
                    break;
                }
            }
            debug!("Subscription finished");
        };
        tokio::spawn(task.instrument(info_span!("Activity updates")));

        Subscription {
            token,
            activities: self.activities.clone(),
        }
    }
}

/// Handle of a running subscription.
#[must_use = "dropping a subscription stops it"]
#[derive(Debug)]
pub struct Subscription {
    token: CancellationToken,
    activities: Arc<watch::Sender<Vec<Activity>>>,
}

impl Subscription {
    /// Stops processing notifications. Once this returns the subscription never writes to the
    /// cache again. Calling it more than once is fine.
    pub fn dispose(&self) {
        self.activities.send_if_modified(|_| {
            self.token.cancel();
            false
        });
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}
