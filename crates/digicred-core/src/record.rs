use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::state::{
    CredentialState, DidExchangeRole, DidExchangeState, OutOfBandRole, OutOfBandState,
};

/// A connection record as held by the agent runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub state: DidExchangeState,
    pub role: DidExchangeRole,
    #[serde(default)]
    pub did: Option<String>,
    #[serde(default)]
    pub their_did: Option<String>,
    #[serde(default)]
    pub their_label: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub invitation_did: Option<String>,
    /// Correlation token of the invitation this connection was made from.
    #[serde(default)]
    pub out_of_band_id: Option<String>,
    #[serde(default)]
    pub connection_types: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ConnectionRecord {
    pub fn is_ready(&self) -> bool {
        self.state.is_completed()
    }
}

/// An out-of-band record, minted on invitation creation or receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutOfBandRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub role: OutOfBandRole,
    pub state: OutOfBandState,
    pub label: String,
    pub invitation_url: String,
    /// Whether this invitation was minted with the legacy RFC 0160 protocol.
    #[serde(default)]
    pub legacy: bool,
}

/// Result of creating an invitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub out_of_band_id: String,
    pub invitation_url: String,
}

/// A single `name = value` credential attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialAttribute {
    pub name: String,
    pub value: String,
}

/// A credential exchange record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialExchangeRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub connection_id: String,
    pub thread_id: String,
    pub state: CredentialState,
    pub credential_definition_id: String,
    #[serde(default)]
    pub attributes: Vec<CredentialAttribute>,
    pub protocol_version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasicMessageRole {
    Sender,
    Receiver,
}

/// A basic message (RFC 0095) exchanged over a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicMessageRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub connection_id: String,
    pub content: String,
    pub sent_time: DateTime<Utc>,
    pub role: BasicMessageRole,
}

/// Schema to be written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaTemplate {
    pub issuer_id: String,
    pub name: String,
    pub version: String,
    pub attr_names: Vec<String>,
}

/// Credential definition to be written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDefinitionTemplate {
    pub issuer_id: String,
    pub schema_id: String,
    pub tag: String,
    pub support_revocation: bool,
}
