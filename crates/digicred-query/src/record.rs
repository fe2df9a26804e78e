//! Attribute access for records the engine can slice.

use chrono::{DateTime, SecondsFormat, Utc};
use digicred_core::ConnectionRecord;
use serde_json::Value;

/// A flat attribute bag with an optional `metadata` sub-map.
///
/// Attribute names are the record's public (JSON) names. A missing
/// attribute is `None`, which never equals a filter value. An attribute the
/// record has but leaves unset is `Some(Value::Null)` and equals a `null`
/// filter value.
pub trait Queryable {
    fn attribute(&self, name: &str) -> Option<Value>;

    fn metadata_value(&self, key: &str) -> Option<Value>;
}

impl Queryable for Value {
    fn attribute(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn metadata_value(&self, key: &str) -> Option<Value> {
        self.get("metadata")
            .and_then(|m| m.get(key))
            .cloned()
    }
}

// Fixed-width so that string order is chronological order.
fn timestamp(at: &DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn opt_str(value: &Option<String>) -> Option<Value> {
    Some(value.clone().map_or(Value::Null, Value::String))
}

impl Queryable for ConnectionRecord {
    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.clone())),
            "createdAt" => Some(timestamp(&self.created_at)),
            "updatedAt" => Some(self.updated_at.as_ref().map_or(Value::Null, timestamp)),
            "state" => Some(Value::String(self.state.as_str().to_string())),
            "role" => Some(Value::String(self.role.as_str().to_string())),
            "did" => opt_str(&self.did),
            "theirDid" => opt_str(&self.their_did),
            "theirLabel" => opt_str(&self.their_label),
            "alias" => opt_str(&self.alias),
            "threadId" => opt_str(&self.thread_id),
            "invitationDid" => opt_str(&self.invitation_did),
            "outOfBandId" => opt_str(&self.out_of_band_id),
            "connectionTypes" => Some(Value::Array(
                self.connection_types
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            )),
            _ => None,
        }
    }

    fn metadata_value(&self, key: &str) -> Option<Value> {
        self.metadata.get(key).cloned()
    }
}

/// The record's id under `id_field`, as used in cursors.
pub(crate) fn record_id<R: Queryable>(record: &R, id_field: &str) -> Option<String> {
    match record.attribute(id_field)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
