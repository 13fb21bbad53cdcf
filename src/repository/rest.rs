use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client, RequestBuilder, Response,
};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::{
    activity::{Activity, ActivityDraft},
    config::BackendConfig,
    utils::clock::DefaultClock,
};

use super::{
    watch::polling_feed, ActivityRepository, ChangeFeed, RepositoryError, RepositoryResult,
};

/// Row sent on insert. Backend fills in the id.
#[derive(Debug, Serialize)]
struct NewActivityRow<'a> {
    category: &'a str,
    duration: i64,
    details: Option<&'a str>,
    timestamp: i64,
}

/// Client for a hosted PostgREST backend (Supabase exposes the same interface under
/// `/rest/v1`). Cloning is cheap and clones share the connection pool.
#[derive(Clone)]
pub struct RestRepository {
    client: Client,
    table_url: Arc<str>,
    poll_interval: Duration,
}

impl RestRepository {
    pub fn new(config: &BackendConfig) -> RepositoryResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(&config.api_key)?);
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", config.api_key))?,
        );

        let client = Client::builder()
            .timeout(config.http_timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            table_url: format!(
                "{}/rest/v1/{}",
                config.url.trim_end_matches('/'),
                config.table
            )
            .into(),
            poll_interval: config.poll_interval,
        })
    }

    fn query(&self) -> RequestBuilder {
        self.client.get(&*self.table_url).query(&[("select", "*")])
    }

    /// Rows that can't be read, e.g. with a timestamp out of range, are logged and skipped so
    /// they don't hide the rest of the listing.
    async fn fetch(&self, request: RequestBuilder) -> RepositoryResult<Vec<Activity>> {
        let body = successful(request.send().await?).await?;
        let rows: Vec<serde_json::Value> = serde_json::from_str(&body)?;
        let total = rows.len();
        let activities = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<Activity>(row) {
                Ok(activity) => Some(activity),
                Err(e) => {
                    warn!("Skipping unreadable activity row: {e}");
                    None
                }
            })
            .collect::<Vec<_>>();
        if activities.len() < total {
            debug!("Read {} of {total} rows", activities.len());
        }
        Ok(activities)
    }
}

fn header_value(value: &str) -> RepositoryResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| RepositoryError::Unavailable(format!("invalid api key: {e}")))
}

/// Returns the body of a successful response. Anything else becomes [RepositoryError::Status].
async fn successful(response: Response) -> RepositoryResult<String> {
    let status = response.status();
    let body = response.text().await?;
    debug!("Backend responded with {status}");
    if status.is_success() {
        Ok(body)
    } else {
        Err(RepositoryError::Status {
            status: status.as_u16(),
            message: body,
        })
    }
}

#[async_trait]
impl ActivityRepository for RestRepository {
    #[instrument(skip(self))]
    async fn create(&self, draft: ActivityDraft) -> RepositoryResult<Activity> {
        let row = NewActivityRow {
            category: &draft.category,
            duration: draft.duration,
            details: draft.details.as_deref(),
            timestamp: draft.started_at.unwrap_or_else(Utc::now).timestamp_millis(),
        };
        let request = self
            .client
            .post(&*self.table_url)
            .header("Prefer", "return=representation")
            .json(&[row]);

        let body = successful(request.send().await?).await?;
        let created: Vec<Activity> = serde_json::from_str(&body)?;
        created.into_iter().next().ok_or(RepositoryError::EmptyResponse)
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> RepositoryResult<Vec<Activity>> {
        self.fetch(self.query().query(&[("order", "timestamp.desc")]))
            .await
    }

    #[instrument(skip(self))]
    async fn list_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Activity>> {
        let request = self.query().query(&[
            ("timestamp", format!("gte.{}", start.timestamp_millis())),
            ("timestamp", format!("lte.{}", end.timestamp_millis())),
            ("order", "timestamp.desc".to_string()),
        ]);
        self.fetch(request).await
    }

    fn subscribe(&self) -> ChangeFeed {
        polling_feed(
            Arc::new(self.clone()),
            self.poll_interval,
            Box::new(DefaultClock),
        )
    }
}
