//! Raw documents and their mapping into typed records.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{BackendError, Result};
use crate::types::Collection;

/// Field map of a stored document.
pub type Fields = serde_json::Map<String, Value>;

/// Timestamp fields owned by the backend; never written by the client.
const SERVER_FIELDS: [&str; 2] = ["createdAt", "updatedAt"];

/// A document as the backend stores it.
///
/// Timestamps are server-assigned and live beside the fields rather than
/// inside them. A missing timestamp stays `None` all the way to the record.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document key within its collection.
    pub id: String,
    /// Client-owned fields.
    pub fields: Fields,
    /// Server creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Server time of the last write.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Create a document without timestamps.
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
            created_at: None,
            updated_at: None,
        }
    }

    /// Attach timestamps.
    pub fn with_timestamps(
        mut self,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Apply a partial update: every key in `patch` overwrites the stored value.
    pub fn merge(&mut self, patch: Fields) {
        for (key, value) in patch {
            if SERVER_FIELDS.contains(&key.as_str()) {
                continue;
            }
            self.fields.insert(key, value);
        }
    }
}

/// A typed record stored in a backend collection.
pub trait Record: DeserializeOwned + Sized {
    /// Collection this record lives in.
    const COLLECTION: Collection;

    /// Name of the field that carries the document key.
    const KEY_FIELD: &'static str = "id";

    /// Map a raw document into this record.
    fn from_document(document: Document) -> Result<Self> {
        decode_document(document)
    }
}

/// Map a raw document into a typed record.
///
/// The document key is written into [`Record::KEY_FIELD`] and the server
/// timestamps into `createdAt`/`updatedAt` (as `null` when absent).
pub fn decode_document<T: Record>(document: Document) -> Result<T> {
    let Document {
        id,
        mut fields,
        created_at,
        updated_at,
    } = document;

    fields.insert(T::KEY_FIELD.to_string(), Value::String(id.clone()));
    fields.insert("createdAt".to_string(), timestamp_value(created_at));
    fields.insert("updatedAt".to_string(), timestamp_value(updated_at));

    serde_json::from_value(Value::Object(fields)).map_err(|source| BackendError::Decode {
        collection: T::COLLECTION.name(),
        id,
        source,
    })
}

/// Serialize a value into document fields, dropping server-owned timestamps.
pub fn encode_fields<T: Serialize>(value: &T) -> Result<Fields> {
    match serde_json::to_value(value).map_err(BackendError::Encode)? {
        Value::Object(mut fields) => {
            for key in SERVER_FIELDS {
                fields.remove(key);
            }
            Ok(fields)
        }
        other => Err(BackendError::Encode(serde::ser::Error::custom(format!(
            "expected an object, got {}",
            other
        )))),
    }
}

fn timestamp_value(ts: Option<DateTime<Utc>>) -> Value {
    match ts {
        Some(ts) => Value::String(ts.to_rfc3339()),
        None => Value::Null,
    }
}
