use std::{collections::HashMap, sync::Arc, time::Duration};

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info_span, trace, warn, Instrument};

use crate::{activity::Activity, utils::clock::Clock};

use super::{ActivityRepository, ChangeEvent, ChangeFeed};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

const FEED_CAPACITY: usize = 16;

/// Creates a change feed for backends that can't push notifications. The collection is polled
/// on a fixed interval and consecutive snapshots are compared. Polling stops once the feed is
/// dropped.
pub fn polling_feed(
    source: Arc<dyn ActivityRepository>,
    interval: Duration,
    clock: Box<dyn Clock>,
) -> ChangeFeed {
    let (sender, receiver) = mpsc::channel(FEED_CAPACITY);
    let watcher = PollingWatcher {
        source,
        interval,
        clock,
        sender,
        known: None,
    };
    tokio::spawn(watcher.run().instrument(info_span!("Polling activity changes")));
    ReceiverStream::new(receiver).boxed()
}

struct PollingWatcher {
    source: Arc<dyn ActivityRepository>,
    interval: Duration,
    clock: Box<dyn Clock>,
    sender: mpsc::Sender<ChangeEvent>,
    known: Option<HashMap<String, Activity>>,
}

impl PollingWatcher {
    async fn run(mut self) {
        let mut poll_point = self.clock.instant();
        loop {
            poll_point += self.interval;

            let fetched = tokio::select! {
                _ = self.sender.closed() => break,
                fetched = self.source.list_all() => fetched,
            };

            match fetched {
                Ok(snapshot) => {
                    for event in self.observe(snapshot) {
                        if self.sender.send(event).await.is_err() {
                            debug!("Feed dropped while sending");
                            return;
                        }
                    }
                }
                // The next tick retries, so a flaky connection only delays notifications.
                Err(e) => warn!("Failed to poll activities {e}"),
            }

            tokio::select! {
                _ = self.sender.closed() => break,
                _ = self.clock.sleep_until(poll_point) => (),
            }
        }
        debug!("Feed dropped, stopping");
    }

    /// Remembers the snapshot and returns how it differs from the previous one. The very first
    /// snapshot is only a baseline.
    fn observe(&mut self, snapshot: Vec<Activity>) -> Vec<ChangeEvent> {
        let current = snapshot
            .into_iter()
            .map(|v| (v.id.clone(), v))
            .collect::<HashMap<_, _>>();
        let events = match &self.known {
            Some(previous) => diff_snapshots(previous, &current),
            None => vec![],
        };
        trace!("Observed {} records, {} changes", current.len(), events.len());
        self.known = Some(current);
        events
    }
}

fn diff_snapshots(
    previous: &HashMap<String, Activity>,
    current: &HashMap<String, Activity>,
) -> Vec<ChangeEvent> {
    let mut events = vec![];
    for (id, activity) in current {
        match previous.get(id) {
            None => events.push(ChangeEvent::Insert),
            Some(old) if old != activity => events.push(ChangeEvent::Update),
            Some(_) => {}
        }
    }
    events.extend(
        previous
            .keys()
            .filter(|id| !current.contains_key(*id))
            .map(|_| ChangeEvent::Delete),
    );
    events
}
