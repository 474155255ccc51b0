//! Request payloads and identifiers for the daybook API.
//!
//! # Design
//! Only payloads whose shape the client actually constructs are typed here.
//! Thought and suggestion payloads, and every response body, are owned by the
//! backend and travel as `serde_json::Value`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of news items requested when the caller does not say.
pub const DEFAULT_NEWS_LIMIT: u32 = 3;

/// Page size used by the record and summary listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 30;

/// Backend user identifier, kept as the string it was stored as.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Body of `POST /record/users/{userId}/records/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyRecordCreate {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_score: Option<i32>,
    #[serde(default)]
    pub work_activities: Vec<String>,
    #[serde(default)]
    pub personal_activities: Vec<String>,
    #[serde(default)]
    pub learning_activities: Vec<String>,
    #[serde(default)]
    pub health_activities: Vec<String>,
    #[serde(default)]
    pub goals_achieved: Vec<String>,
    #[serde(default)]
    pub challenges_faced: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflections: Option<String>,
}

impl DailyRecordCreate {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

/// Partial update of a daily record. Omitted fields stay unchanged on the
/// server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyRecordUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_activities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_activities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_activities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_activities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals_achieved: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenges_faced: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflections: Option<String>,
}

/// Body of `POST /user/users/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// `skip`/`limit` window for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub skip: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}
