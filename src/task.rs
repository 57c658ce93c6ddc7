use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 2000;

/// A task as the server returns it.
///
/// `status` is kept as the raw wire string so that a value the client does
/// not know about survives deserialization; use [`Task::bucket`] to get the
/// typed column.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Task {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: String, // "pending", "in-progress", "completed"
    #[serde(default, with = "timestamp")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn bucket(&self) -> Option<Bucket> {
        self.status.parse().ok()
    }
}

/// One of the three board columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bucket {
    Pending,
    InProgress,
    Completed,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Pending, Bucket::InProgress, Bucket::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Pending => "pending",
            Bucket::InProgress => "in-progress",
            Bucket::Completed => "completed",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Bucket::Pending => "Pending",
            Bucket::InProgress => "In Progress",
            Bucket::Completed => "Completed",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Bucket::Pending => 0,
            Bucket::InProgress => 1,
            Bucket::Completed => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Bucket> {
        Bucket::ALL.get(index).copied()
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status `{0}`, expected pending, in-progress or completed")]
pub struct UnknownStatus(pub String);

impl FromStr for Bucket {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Bucket::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Payload for `POST /tasks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Bucket,
    #[serde(with = "timestamp")]
    pub due_date: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: Bucket::Pending,
            due_date: None,
        }
    }

    /// Trims the text fields and checks the length limits the server enforces.
    /// A blank description is treated as absent.
    pub fn validated(self) -> Result<Self, ApiError> {
        Ok(Self {
            title: check_title(&self.title)?,
            description: check_description(self.description.as_deref())?,
            status: self.status,
            due_date: self.due_date,
        })
    }
}

/// Partial update for `PUT /tasks/{id}`. Unset fields are left out of the
/// body; `Some(None)` on a nullable field clears it on the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Bucket>,
    #[serde(skip_serializing_if = "Option::is_none", with = "nullable_timestamp")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    pub fn status(status: Bucket) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
    }

    pub fn validated(self) -> Result<Self, ApiError> {
        let title = self.title.as_deref().map(check_title).transpose()?;
        let description = match self.description {
            Some(d) => Some(check_description(d.as_deref())?),
            None => None,
        };
        Ok(Self {
            title,
            description,
            status: self.status,
            due_date: self.due_date,
        })
    }
}

fn check_title(title: &str) -> Result<String, ApiError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::Validation("Title is required".into()));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(ApiError::Validation(format!(
            "Title must be at most {TITLE_MAX_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}

fn check_description(description: Option<&str>) -> Result<Option<String>, ApiError> {
    let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(ApiError::Validation(format!(
            "Description must be at most {DESCRIPTION_MAX_CHARS} characters"
        )));
    }
    Ok(Some(description.to_string()))
}

/// The API emits naive ISO timestamps (implicitly UTC) as well as RFC 3339
/// ones; accept both and always write RFC 3339.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.is_empty() => Ok(None),
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp `{raw}`"))),
        }
    }
}

mod nullable_timestamp {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(
        value: &Option<Option<DateTime<Utc>>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(inner) => super::timestamp::serialize(inner, serializer),
            None => serializer.serialize_none(),
        }
    }
}
