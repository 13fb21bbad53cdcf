use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::sync::{broadcast, Mutex};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::debug;
use uuid::Uuid;

use crate::{
    activity::{Activity, ActivityDraft},
    utils::clock::{Clock, DefaultClock},
};

use super::{ActivityRepository, ChangeEvent, ChangeFeed, RepositoryResult};

const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Repository that keeps records in memory and notifies subscribers through a broadcast channel.
pub struct InMemoryRepository {
    records: Mutex<Vec<Activity>>,
    changes: broadcast::Sender<ChangeEvent>,
    clock: Box<dyn Clock>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new(Box::new(DefaultClock))
    }
}

impl InMemoryRepository {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            records: Mutex::new(Vec::new()),
            changes,
            clock,
        }
    }

    /// Deletes a record the way someone with direct backend access would.
    pub async fn remove(&self, id: &str) -> Option<Activity> {
        let removed = {
            let mut records = self.records.lock().await;
            let position = records.iter().position(|v| v.id == id)?;
            records.remove(position)
        };
        self.notify(ChangeEvent::Delete);
        Some(removed)
    }

    fn notify(&self, event: ChangeEvent) {
        // Sending fails only when nobody listens.
        let receivers = self.changes.send(event).unwrap_or(0);
        debug!("Sent {event:?} to {receivers} subscribers");
    }
}

fn newest_first(mut records: Vec<Activity>) -> Vec<Activity> {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records
}

#[async_trait]
impl ActivityRepository for InMemoryRepository {
    async fn create(&self, draft: ActivityDraft) -> RepositoryResult<Activity> {
        let activity = draft.into_activity(Uuid::new_v4().to_string(), self.clock.time());
        self.records.lock().await.push(activity.clone());
        self.notify(ChangeEvent::Insert);
        Ok(activity)
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Activity>> {
        let records = self.records.lock().await.clone();
        Ok(newest_first(records))
    }

    async fn list_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Activity>> {
        let records = self
            .records
            .lock()
            .await
            .iter()
            .filter(|v| start <= v.timestamp && v.timestamp <= end)
            .cloned()
            .collect();
        Ok(newest_first(records))
    }

    fn subscribe(&self) -> ChangeFeed {
        BroadcastStream::new(self.changes.subscribe())
            .map(|event| match event {
                Ok(event) => event,
                Err(BroadcastStreamRecvError::Lagged(_)) => ChangeEvent::Resync,
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use futures::StreamExt;
    use tokio::time::Instant;

    use crate::{
        activity::ActivityDraft,
        repository::{ActivityRepository, ChangeEvent},
        utils::clock::Clock,
    };

    use super::InMemoryRepository;

    struct FixedClock(DateTime<Utc>);

    #[async_trait]
    impl Clock for FixedClock {
        fn time(&self) -> DateTime<Utc> {
            self.0
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep_until(&self, instant: Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 5, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn created_records_get_ids_and_clock_time() -> Result<()> {
        let repository = InMemoryRepository::new(Box::new(FixedClock(at(12))));
        let a = repository.create(ActivityDraft::new("Work", 30)).await?;
        let b = repository.create(ActivityDraft::new("Work", 30)).await?;

        assert_ne!(a.id, b.id);
        assert_eq!(a.timestamp, at(12));
        Ok(())
    }

    #[tokio::test]
    async fn listing_is_newest_first() -> Result<()> {
        let repository = InMemoryRepository::new(Box::new(FixedClock(at(12))));
        for hour in [8, 14, 10] {
            repository
                .create(ActivityDraft::new("Study", 60).with_start(at(hour)))
                .await?;
        }

        let hours = repository
            .list_all()
            .await?
            .iter()
            .map(|v| v.timestamp)
            .collect::<Vec<_>>();
        assert_eq!(hours, vec![at(14), at(10), at(8)]);
        Ok(())
    }

    #[tokio::test]
    async fn range_is_inclusive_on_both_ends() -> Result<()> {
        let repository = InMemoryRepository::new(Box::new(FixedClock(at(12))));
        for hour in [7, 8, 9, 10, 11] {
            repository
                .create(ActivityDraft::new("Other", 10).with_start(at(hour)))
                .await?;
        }

        let found = repository.list_in_range(at(8), at(10)).await?;
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].timestamp, at(10));
        assert_eq!(found[2].timestamp, at(8));

        let none = repository
            .list_in_range(at(8) + Duration::seconds(1), at(9) - Duration::seconds(1))
            .await?;
        assert!(none.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn subscribers_hear_inserts_and_removals() -> Result<()> {
        let repository = InMemoryRepository::default();
        let mut feed = repository.subscribe();

        let created = repository.create(ActivityDraft::new("Social", 15)).await?;
        assert_eq!(feed.next().await, Some(ChangeEvent::Insert));

        assert!(repository.remove(&created.id).await.is_some());
        assert_eq!(feed.next().await, Some(ChangeEvent::Delete));

        assert!(repository.remove(&created.id).await.is_none());
        assert!(repository.list_all().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn lagging_subscriber_is_asked_to_resync() -> Result<()> {
        let repository = InMemoryRepository::default();
        let mut feed = repository.subscribe();

        for _ in 0..(super::CHANGE_CHANNEL_CAPACITY + 4) {
            repository.create(ActivityDraft::new("Work", 1)).await?;
        }

        assert_eq!(feed.next().await, Some(ChangeEvent::Resync));
        Ok(())
    }
}
