use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::types::Operation;

/// Columns shown from a row snapshot in the audit view
const SUMMARY_KEYS: [&str; 2] = ["name", "quantity"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub user_email: Option<String>,
    pub operation: Operation,
    pub data: Value,
}

impl AuditLogEntry {
    /// "Insert", "Update" or "Delete"
    pub fn operation_label(&self) -> String {
        let lower = self.operation.as_str().to_lowercase();
        let mut chars = lower.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Row snapshot reduced to `name` and `quantity`
    pub fn data_summary(&self) -> Value {
        let mut picked = Map::new();
        if let Value::Object(map) = &self.data {
            for key in SUMMARY_KEYS {
                if let Some(value) = map.get(key) {
                    picked.insert(key.to_string(), value.clone());
                }
            }
        }
        Value::Object(picked)
    }

    /// Datetime column, e.g. "Sat, 17/10/2026, 09:30:12"
    pub fn display_time(&self) -> String {
        self.created_at.format("%a, %d/%m/%Y, %H:%M:%S").to_string()
    }
}

/// Rendered row of the audit view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditLogRow {
    pub id: Uuid,
    pub datetime: String,
    pub created_at: DateTime<Utc>,
    pub user: String,
    pub operation: String,
    pub data: Value,
}

impl From<&AuditLogEntry> for AuditLogRow {
    fn from(entry: &AuditLogEntry) -> Self {
        Self {
            id: entry.id,
            datetime: entry.display_time(),
            created_at: entry.created_at,
            user: entry.user_email.clone().unwrap_or_default(),
            operation: entry.operation_label(),
            data: entry.data_summary(),
        }
    }
}
