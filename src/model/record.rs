use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::invoice::InvoiceData;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Final,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceStatus::Draft => write!(f, "DRAFT"),
            InvoiceStatus::Final => write!(f, "FINAL"),
        }
    }
}

/// A saved invoice owned by one user.
///
/// Serialized as `{ id, userId, status, data, createdAt, updatedAt }` with
/// millisecond timestamps; this is the shape the history file stores.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    pub id: String,
    pub user_id: String,
    pub status: InvoiceStatus,
    pub data: InvoiceData,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl InvoiceRecord {
    pub fn new(
        user_id: impl Into<String>,
        status: InvoiceStatus,
        data: InvoiceData,
        now: DateTime<Utc>,
    ) -> Self {
        let now = truncate_to_millis(now);
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            status,
            data,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = truncate_to_millis(now);
    }
}

// The wire format only keeps milliseconds.
fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}
