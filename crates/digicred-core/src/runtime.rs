//! The agent runtime contract.
//!
//! The gateway never speaks DIDComm, signs, or writes ledger transactions
//! itself. Everything protocol-level goes through these two traits; an
//! implementation wraps whatever identity agent framework is deployed.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::Result;
use crate::event::AgentEvent;
use crate::record::{
    BasicMessageRecord, ConnectionRecord, CredentialAttribute, CredentialDefinitionTemplate,
    CredentialExchangeRecord, Invitation, OutOfBandRecord, SchemaTemplate,
};
use crate::types::AgentSpec;

/// Factory for agents. Implementations open wallets and transports.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Human-readable backend name, e.g. "memory".
    fn name(&self) -> &str;

    /// Initialise a new agent. Called at most once per agent name.
    async fn create_agent(&self, spec: &AgentSpec) -> Result<Arc<dyn AgentHandle>>;
}

/// A running agent owned by the runtime.
#[async_trait]
pub trait AgentHandle: Send + Sync {
    fn name(&self) -> &str;

    /// The agent's advertised endpoint, used as the invitation URL domain.
    fn endpoint(&self) -> &str;

    /// Receive every event this agent emits from now on. There is no
    /// unsubscribe; dropping the receiver ends the subscription.
    fn subscribe(&self) -> broadcast::Receiver<AgentEvent>;

    // ── Out-of-band ────────────────────────────────────────────

    /// Create an RFC 0434 out-of-band invitation.
    async fn create_invitation(&self) -> Result<Invitation>;

    /// Create an RFC 0160 connection invitation.
    async fn create_legacy_invitation(&self) -> Result<Invitation>;

    async fn receive_invitation(&self, invitation_url: &str) -> Result<OutOfBandRecord>;

    async fn find_out_of_band_record(&self, id: &str) -> Result<Option<OutOfBandRecord>>;

    // ── Connections ────────────────────────────────────────────

    async fn get_all_connections(&self) -> Result<Vec<ConnectionRecord>>;

    async fn find_connection_by_id(&self, id: &str) -> Result<Option<ConnectionRecord>>;

    async fn find_connection_by_did(&self, did: &str) -> Result<Option<ConnectionRecord>>;

    async fn find_connection_by_thread_id(&self, thread_id: &str)
    -> Result<Option<ConnectionRecord>>;

    async fn find_connection_by_invitation_did(
        &self,
        invitation_did: &str,
    ) -> Result<Option<ConnectionRecord>>;

    async fn find_connections_by_out_of_band_id(
        &self,
        out_of_band_id: &str,
    ) -> Result<Vec<ConnectionRecord>>;

    async fn find_connections_by_types(&self, types: &[String]) -> Result<Vec<ConnectionRecord>>;

    async fn delete_connection(&self, id: &str) -> Result<()>;

    // ── Credentials ────────────────────────────────────────────

    async fn offer_credential(
        &self,
        connection_id: &str,
        credential_definition_id: &str,
        attributes: &[CredentialAttribute],
    ) -> Result<CredentialExchangeRecord>;

    async fn accept_credential_request(&self, credential_id: &str) -> Result<()>;

    // ── Basic messages ─────────────────────────────────────────

    async fn send_basic_message(
        &self,
        connection_id: &str,
        content: &str,
    ) -> Result<BasicMessageRecord>;

    async fn find_basic_message(&self, id: &str) -> Result<Option<BasicMessageRecord>>;

    async fn delete_basic_message(&self, id: &str) -> Result<()>;

    // ── DIDs and ledger ────────────────────────────────────────

    /// Import a DID whose Ed25519 key is derived from `seed`.
    async fn import_did(&self, did: &str, seed: &str) -> Result<()>;

    /// Returns the ledger id of the registered schema.
    async fn register_schema(&self, schema: &SchemaTemplate) -> Result<String>;

    /// Returns the ledger id of the registered credential definition.
    async fn register_credential_definition(
        &self,
        definition: &CredentialDefinitionTemplate,
    ) -> Result<String>;
}
