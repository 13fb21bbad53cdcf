use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A logged block of time spent on a single category. Records are created by a repository, the
/// client never assigns `id` or `timestamp` on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub category: String,
    /// Minutes. Not validated, negative values are carried as they are.
    pub duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Activity that hasn't been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDraft {
    pub category: String,
    pub duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Start chosen by the user. When absent the repository uses the moment of creation.
    #[serde(skip)]
    pub started_at: Option<DateTime<Utc>>,
}

impl ActivityDraft {
    pub fn new(category: impl Into<String>, duration: i64) -> Self {
        Self {
            category: category.into(),
            duration,
            details: None,
            started_at: None,
        }
    }

    pub fn with_details(self, details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..self
        }
    }

    pub fn with_start(self, started_at: DateTime<Utc>) -> Self {
        Self {
            started_at: Some(started_at),
            ..self
        }
    }

    /// Turns the draft into a full record the way a backend would.
    pub fn into_activity(self, id: String, now: DateTime<Utc>) -> Activity {
        Activity {
            id,
            category: self.category,
            duration: self.duration,
            details: self.details,
            timestamp: self.started_at.unwrap_or(now),
        }
    }
}

/// Backends hand out either uuids or serial integers as primary keys.
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(v) => v,
        RawId::Number(v) => v.to_string(),
    })
}
