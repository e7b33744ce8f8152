//! Database models.

use chrono::{DateTime, Utc};
use rakto_core::{Document, Fields};
use sqlx::FromRow;

use crate::error::Result;

/// A row of the `documents` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DocumentRow {
    /// Document key within its collection.
    pub id: String,
    /// JSON object holding the client-owned fields.
    pub data: String,
    /// Creation time in microseconds since the Unix epoch.
    pub created_at: Option<i64>,
    /// Last write time in microseconds since the Unix epoch.
    pub updated_at: Option<i64>,
}

impl DocumentRow {
    /// Decode the JSON body and timestamps.
    pub fn into_document(self) -> Result<Document> {
        let fields: Fields = serde_json::from_str(&self.data)?;
        Ok(Document::new(self.id, fields).with_timestamps(
            self.created_at.and_then(from_micros),
            self.updated_at.and_then(from_micros),
        ))
    }
}

/// Current time as stored in timestamp columns.
pub fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}

fn from_micros(micros: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
}
