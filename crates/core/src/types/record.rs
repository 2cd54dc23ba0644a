use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// =============================================================================
// Record Types
// =============================================================================

/// Free-form field values written to or read from a collection.
pub type Fields = Map<String, Value>;

/// Name of the store's own identifier field.
pub const OBJECT_ID_FIELD: &str = "objectId";

/// Field that receives an input column literally named `id` on import.
pub const IMPORTED_ID_FIELD: &str = "ID";

/// A record as held by the record store.
///
/// System fields are assigned by the store on creation. Everything else is
/// kept in `fields` untouched, including fields no configuration knows about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Stable identifier assigned by the store.
    #[serde(rename = "objectId")]
    pub object_id: String,

    /// Creation timestamp (store-assigned).
    pub created_at: DateTime<Utc>,

    /// Last update timestamp (store-assigned).
    pub updated_at: DateTime<Utc>,

    /// User fields.
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    /// Read a field as a string.
    ///
    /// Strings are returned verbatim, numbers and booleans are rendered,
    /// `null` and missing fields yield `None`.
    pub fn get_str(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Project the record onto a list of field names.
    pub fn project(&self, field_names: &[String]) -> DataRecord {
        let fields = field_names
            .iter()
            .map(|name| (name.clone(), self.get_str(name).unwrap_or_default()))
            .collect();

        DataRecord {
            id: self.object_id.clone(),
            created_at: iso_timestamp(&self.created_at),
            updated_at: iso_timestamp(&self.updated_at),
            fields,
        }
    }
}

/// A record projected onto a configured field list.
///
/// Every configured field is present; missing values surface as "".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRecord {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl DataRecord {
    /// Get a projected field value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Metadata describing a binary file held in the file store.
///
/// The store's `objectId` is never part of the serialized form; callers see
/// `id` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStoreRecord {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub extra: Fields,
}

impl From<Record> for FileStoreRecord {
    fn from(record: Record) -> Self {
        let mut extra = record.fields;
        for reserved in [OBJECT_ID_FIELD, "id", "createdAt", "updatedAt"] {
            extra.remove(reserved);
        }
        Self {
            id: record.object_id,
            created_at: iso_timestamp(&record.created_at),
            updated_at: iso_timestamp(&record.updated_at),
            extra,
        }
    }
}

/// Render a timestamp as ISO 8601 with millisecond precision.
pub fn iso_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
