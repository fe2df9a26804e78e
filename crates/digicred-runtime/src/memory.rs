//! In-process agent runtime.
//!
//! Agents created by one [`MemoryRuntime`] share a loopback network: an
//! invitation URL minted by one agent can be received by any other, which
//! runs the DID exchange to completion immediately. Basic messages and
//! credential offers travel over the resulting connection. The holder side
//! of a credential offer is simulated according to [`HolderBehavior`].
//!
//! Every call to `accept_credential_request` is recorded for assertions.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use dashmap::DashMap;
use digicred_core::{
    AgentEvent, AgentHandle, AgentRuntime, AgentSpec, BasicMessageRecord, BasicMessageRole,
    ConnectionEvent, ConnectionRecord, CredentialAttribute, CredentialDefinitionTemplate,
    CredentialEvent, CredentialExchangeRecord, CredentialState, DidExchangeRole,
    DidExchangeState, DigiCredError, EventBus, Invitation, LedgerNetwork, OutOfBandRecord,
    OutOfBandRole, OutOfBandState, Result, SchemaTemplate,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

/// What a simulated holder does with a credential offer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HolderBehavior {
    /// Send a credential request straight away.
    #[default]
    Request,
    /// Decline the offer.
    Decline,
    /// Leave the offer unanswered.
    Ignore,
}

#[derive(Default)]
struct Network {
    agents: DashMap<String, Arc<MemoryAgent>>,
}

/// Factory for loopback agents.
pub struct MemoryRuntime {
    network: Arc<Network>,
    holder: HolderBehavior,
}

impl Default for MemoryRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self {
            network: Arc::new(Network::default()),
            holder: HolderBehavior::default(),
        }
    }

    pub fn with_holder_behavior(mut self, holder: HolderBehavior) -> Self {
        self.holder = holder;
        self
    }

    /// The concrete agent behind a handle, for test inspection.
    pub fn agent(&self, name: &str) -> Option<Arc<MemoryAgent>> {
        self.network.agents.get(name).map(|a| Arc::clone(a.value()))
    }
}

#[async_trait]
impl AgentRuntime for MemoryRuntime {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create_agent(&self, spec: &AgentSpec) -> Result<Arc<dyn AgentHandle>> {
        if spec.port == 0 {
            return Err(DigiCredError::AgentCreation {
                name: spec.name.clone(),
                reason: "inbound port must not be 0".into(),
            });
        }
        if self.network.agents.contains_key(&spec.name) {
            return Err(DigiCredError::AgentCreation {
                name: spec.name.clone(),
                reason: "wallet already exists".into(),
            });
        }
        let agent = Arc::new(MemoryAgent {
            name: spec.name.clone(),
            endpoint: spec.public_endpoint(),
            ledgers: spec.ledgers.clone(),
            holder: self.holder,
            bus: EventBus::default(),
            network: Arc::downgrade(&self.network),
            store: Mutex::new(Store::default()),
        });
        self.network
            .agents
            .insert(spec.name.clone(), Arc::clone(&agent));
        info!(agent = %spec.name, endpoint = %agent.endpoint, "memory agent created");
        Ok(agent)
    }
}

/// Points from a local record to its counterpart on the peer agent.
#[derive(Debug, Clone)]
struct PeerRef {
    agent: String,
    record_id: String,
}

#[derive(Default)]
struct Store {
    out_of_band: HashMap<String, OutOfBandRecord>,
    /// Insertion order is creation order.
    connections: Vec<ConnectionRecord>,
    connection_peers: HashMap<String, PeerRef>,
    credentials: HashMap<String, CredentialExchangeRecord>,
    credential_peers: HashMap<String, PeerRef>,
    messages: HashMap<String, BasicMessageRecord>,
    dids: HashMap<String, String>,
    schemas: Vec<(String, SchemaTemplate)>,
    credential_definitions: HashMap<String, CredentialDefinitionTemplate>,
    accepted: Vec<String>,
}

impl Store {
    fn connection_mut(&mut self, id: &str) -> Option<&mut ConnectionRecord> {
        self.connections.iter_mut().find(|c| c.id == id)
    }
}

/// Payload carried in the invitation URL query string.
#[derive(Debug, Serialize, Deserialize)]
struct InvitationPayload {
    id: String,
    label: String,
}

/// A loopback agent.
pub struct MemoryAgent {
    name: String,
    endpoint: String,
    ledgers: Vec<LedgerNetwork>,
    holder: HolderBehavior,
    bus: EventBus,
    network: Weak<Network>,
    store: Mutex<Store>,
}

impl MemoryAgent {
    /// Credential ids passed to `accept_credential_request`, in call order.
    pub fn accepted_requests(&self) -> Vec<String> {
        self.store.lock().accepted.clone()
    }

    /// Publish an arbitrary event on this agent's bus.
    pub fn emit(&self, event: AgentEvent) {
        self.bus.publish(event);
    }

    /// Set a metadata entry on a connection record.
    pub fn set_connection_metadata(
        &self,
        connection_id: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        let mut store = self.store.lock();
        let record = store
            .connection_mut(connection_id)
            .ok_or_else(|| DigiCredError::not_found("connection", connection_id))?;
        record.metadata.insert(key.to_string(), value);
        record.updated_at = Some(Utc::now());
        Ok(())
    }

    /// Tag a connection record with a connection type.
    pub fn add_connection_type(&self, connection_id: &str, connection_type: &str) -> Result<()> {
        let mut store = self.store.lock();
        let record = store
            .connection_mut(connection_id)
            .ok_or_else(|| DigiCredError::not_found("connection", connection_id))?;
        if !record.connection_types.iter().any(|t| t == connection_type) {
            record.connection_types.push(connection_type.to_string());
        }
        record.updated_at = Some(Utc::now());
        Ok(())
    }

    fn peer(&self, name: &str) -> Result<Arc<MemoryAgent>> {
        let network = self
            .network
            .upgrade()
            .ok_or_else(|| DigiCredError::runtime("transport", "memory network is gone"))?;
        network
            .agents
            .get(name)
            .map(|a| Arc::clone(a.value()))
            .ok_or_else(|| {
                DigiCredError::runtime("transport", format!("no agent `{name}` on the network"))
            })
    }

    fn mint_invitation(&self, legacy: bool) -> Result<Invitation> {
        let id = Uuid::new_v4().to_string();
        let payload = serde_json::to_vec(&InvitationPayload {
            id: id.clone(),
            label: self.name.clone(),
        })?;
        let param = if legacy { "c_i" } else { "oob" };
        let invitation_url = format!(
            "{}?{}={}",
            self.endpoint,
            param,
            URL_SAFE_NO_PAD.encode(payload)
        );
        let record = OutOfBandRecord {
            id: id.clone(),
            created_at: Utc::now(),
            role: OutOfBandRole::Sender,
            state: OutOfBandState::AwaitResponse,
            label: self.name.clone(),
            invitation_url: invitation_url.clone(),
            legacy,
        };
        self.store.lock().out_of_band.insert(id.clone(), record);
        debug!(agent = %self.name, out_of_band_id = %id, legacy, "invitation created");
        Ok(Invitation {
            out_of_band_id: id,
            invitation_url,
        })
    }

    fn new_connection(
        &self,
        id: String,
        role: DidExchangeRole,
        out_of_band_id: &str,
        their_label: &str,
        thread_id: &str,
        invitation_did: &str,
        peer: PeerRef,
    ) {
        let record = ConnectionRecord {
            id,
            created_at: Utc::now(),
            updated_at: None,
            state: DidExchangeState::Start,
            role,
            did: Some(peer_did()),
            their_did: None,
            their_label: Some(their_label.to_string()),
            alias: None,
            thread_id: Some(thread_id.to_string()),
            invitation_did: Some(invitation_did.to_string()),
            out_of_band_id: Some(out_of_band_id.to_string()),
            connection_types: Vec::new(),
            metadata: BTreeMap::new(),
        };
        let mut store = self.store.lock();
        store.connection_peers.insert(record.id.clone(), peer);
        store.connections.push(record);
    }

    /// Move a connection to `state` and publish the change.
    fn transition_connection(&self, id: &str, state: DidExchangeState) -> Result<()> {
        let event = {
            let mut store = self.store.lock();
            let record = store
                .connection_mut(id)
                .ok_or_else(|| DigiCredError::not_found("connection", id))?;
            let previous = record.state;
            record.state = state;
            record.updated_at = Some(Utc::now());
            ConnectionEvent {
                connection_id: record.id.clone(),
                out_of_band_id: record.out_of_band_id.clone(),
                state,
                previous_state: Some(previous),
            }
        };
        self.bus.publish(AgentEvent::ConnectionStateChanged(event));
        Ok(())
    }

    fn set_their_did(&self, id: &str, their_did: Option<String>) {
        if let Some(record) = self.store.lock().connection_mut(id) {
            record.their_did = their_did;
        }
    }

    fn connection_did(&self, id: &str) -> Option<String> {
        self.store
            .lock()
            .connections
            .iter()
            .find(|c| c.id == id)
            .and_then(|c| c.did.clone())
    }

    /// Move a credential exchange to `state` and publish the change.
    fn transition_credential(&self, id: &str, state: CredentialState) -> Result<()> {
        let event = {
            let mut store = self.store.lock();
            let record = store
                .credentials
                .get_mut(id)
                .ok_or_else(|| DigiCredError::not_found("credential exchange", id))?;
            let previous = record.state;
            record.state = state;
            CredentialEvent {
                credential_id: id.to_string(),
                state,
                previous_state: Some(previous),
            }
        };
        self.bus.publish(AgentEvent::CredentialStateChanged(event));
        Ok(())
    }

    fn credential_peer(&self, id: &str) -> Result<(Arc<MemoryAgent>, String)> {
        let peer = self
            .store
            .lock()
            .credential_peers
            .get(id)
            .cloned()
            .ok_or_else(|| DigiCredError::not_found("credential exchange", id))?;
        Ok((self.peer(&peer.agent)?, peer.record_id))
    }

    /// Holder side of an incoming offer.
    fn receive_offer(
        &self,
        offer: &CredentialExchangeRecord,
        issuer: PeerRef,
        connection_id: String,
    ) -> String {
        let record = CredentialExchangeRecord {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            connection_id,
            thread_id: offer.thread_id.clone(),
            state: CredentialState::OfferReceived,
            credential_definition_id: offer.credential_definition_id.clone(),
            attributes: offer.attributes.clone(),
            protocol_version: offer.protocol_version.clone(),
        };
        let id = record.id.clone();
        {
            let mut store = self.store.lock();
            store.credential_peers.insert(id.clone(), issuer);
            store.credentials.insert(id.clone(), record);
        }
        self.bus
            .publish(AgentEvent::CredentialStateChanged(CredentialEvent {
                credential_id: id.clone(),
                state: CredentialState::OfferReceived,
                previous_state: None,
            }));
        id
    }

    fn require_ledger(&self, operation: &str) -> Result<()> {
        if self.ledgers.is_empty() {
            return Err(DigiCredError::Ledger(format!(
                "{operation}: no ledger networks configured for agent `{}`",
                self.name
            )));
        }
        Ok(())
    }
}

fn peer_did() -> String {
    format!("did:peer:1z{}", Uuid::new_v4().simple())
}

fn parse_invitation(invitation_url: &str) -> Result<(InvitationPayload, bool)> {
    let url = Url::parse(invitation_url)
        .map_err(|e| DigiCredError::InvalidRequest(format!("invitation url: {e}")))?;
    let (encoded, legacy) = url
        .query_pairs()
        .find_map(|(k, v)| match k.as_ref() {
            "oob" => Some((v.into_owned(), false)),
            "c_i" => Some((v.into_owned(), true)),
            _ => None,
        })
        .ok_or_else(|| DigiCredError::InvalidRequest("invitation url has no oob or c_i parameter".into()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded.as_bytes())
        .map_err(|e| DigiCredError::InvalidRequest(format!("invitation payload: {e}")))?;
    let payload: InvitationPayload = serde_json::from_slice(&bytes)
        .map_err(|e| DigiCredError::InvalidRequest(format!("invitation payload: {e}")))?;
    Ok((payload, legacy))
}

#[async_trait]
impl AgentHandle for MemoryAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.bus.subscribe()
    }

    async fn create_invitation(&self) -> Result<Invitation> {
        self.mint_invitation(false)
    }

    async fn create_legacy_invitation(&self) -> Result<Invitation> {
        self.mint_invitation(true)
    }

    async fn receive_invitation(&self, invitation_url: &str) -> Result<OutOfBandRecord> {
        let (payload, legacy) = parse_invitation(invitation_url)?;
        let inviter = self.peer(&payload.label)?;
        let inviter_oob = inviter
            .store
            .lock()
            .out_of_band
            .get(&payload.id)
            .cloned()
            .ok_or_else(|| {
                DigiCredError::runtime(
                    "receive invitation",
                    format!("unknown invitation {}", payload.id),
                )
            })?;

        let own_oob = OutOfBandRecord {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            role: OutOfBandRole::Receiver,
            state: OutOfBandState::PrepareResponse,
            label: payload.label.clone(),
            invitation_url: invitation_url.to_string(),
            legacy,
        };
        self.store
            .lock()
            .out_of_band
            .insert(own_oob.id.clone(), own_oob.clone());

        let thread_id = Uuid::new_v4().to_string();
        let invitation_did = format!("did:peer:2.{}", payload.id);

        // Both ids exist before either record does, so each side can point at the other.
        let requester = Uuid::new_v4().to_string();
        let responder = Uuid::new_v4().to_string();
        inviter.new_connection(
            responder.clone(),
            DidExchangeRole::Responder,
            &inviter_oob.id,
            &self.name,
            &thread_id,
            &invitation_did,
            PeerRef {
                agent: self.name.clone(),
                record_id: requester.clone(),
            },
        );
        self.new_connection(
            requester.clone(),
            DidExchangeRole::Requester,
            &own_oob.id,
            &inviter.name,
            &thread_id,
            &invitation_did,
            PeerRef {
                agent: inviter.name.clone(),
                record_id: responder.clone(),
            },
        );

        self.transition_connection(&requester, DidExchangeState::RequestSent)?;
        inviter.transition_connection(&responder, DidExchangeState::RequestReceived)?;
        inviter.transition_connection(&responder, DidExchangeState::ResponseSent)?;
        self.transition_connection(&requester, DidExchangeState::ResponseReceived)?;

        self.set_their_did(&requester, inviter.connection_did(&responder));
        inviter.set_their_did(&responder, self.connection_did(&requester));

        self.transition_connection(&requester, DidExchangeState::Completed)?;
        inviter.transition_connection(&responder, DidExchangeState::Completed)?;

        if let Some(record) = self.store.lock().out_of_band.get_mut(&own_oob.id) {
            record.state = OutOfBandState::Done;
        }
        if !legacy {
            if let Some(record) = inviter.store.lock().out_of_band.get_mut(&inviter_oob.id) {
                record.state = OutOfBandState::Done;
            }
        }

        info!(
            agent = %self.name,
            inviter = %inviter.name,
            out_of_band_id = %inviter_oob.id,
            "invitation accepted, connection completed"
        );
        let mut record = own_oob;
        record.state = OutOfBandState::Done;
        Ok(record)
    }

    async fn find_out_of_band_record(&self, id: &str) -> Result<Option<OutOfBandRecord>> {
        Ok(self.store.lock().out_of_band.get(id).cloned())
    }

    async fn get_all_connections(&self) -> Result<Vec<ConnectionRecord>> {
        Ok(self.store.lock().connections.clone())
    }

    async fn find_connection_by_id(&self, id: &str) -> Result<Option<ConnectionRecord>> {
        Ok(self
            .store
            .lock()
            .connections
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn find_connection_by_did(&self, did: &str) -> Result<Option<ConnectionRecord>> {
        Ok(self
            .store
            .lock()
            .connections
            .iter()
            .find(|c| c.did.as_deref() == Some(did) || c.their_did.as_deref() == Some(did))
            .cloned())
    }

    async fn find_connection_by_thread_id(&self, thread_id: &str) -> Result<Option<ConnectionRecord>> {
        Ok(self
            .store
            .lock()
            .connections
            .iter()
            .find(|c| c.thread_id.as_deref() == Some(thread_id))
            .cloned())
    }

    async fn find_connection_by_invitation_did(
        &self,
        invitation_did: &str,
    ) -> Result<Option<ConnectionRecord>> {
        Ok(self
            .store
            .lock()
            .connections
            .iter()
            .find(|c| c.invitation_did.as_deref() == Some(invitation_did))
            .cloned())
    }

    async fn find_connections_by_out_of_band_id(
        &self,
        out_of_band_id: &str,
    ) -> Result<Vec<ConnectionRecord>> {
        Ok(self
            .store
            .lock()
            .connections
            .iter()
            .filter(|c| c.out_of_band_id.as_deref() == Some(out_of_band_id))
            .cloned()
            .collect())
    }

    async fn find_connections_by_types(&self, types: &[String]) -> Result<Vec<ConnectionRecord>> {
        Ok(self
            .store
            .lock()
            .connections
            .iter()
            .filter(|c| types.iter().all(|t| c.connection_types.contains(t)))
            .cloned()
            .collect())
    }

    async fn delete_connection(&self, id: &str) -> Result<()> {
        let mut store = self.store.lock();
        let before = store.connections.len();
        store.connections.retain(|c| c.id != id);
        if store.connections.len() == before {
            return Err(DigiCredError::not_found("connection", id));
        }
        store.connection_peers.remove(id);
        Ok(())
    }

    async fn offer_credential(
        &self,
        connection_id: &str,
        credential_definition_id: &str,
        attributes: &[CredentialAttribute],
    ) -> Result<CredentialExchangeRecord> {
        let (ready, peer) = {
            let store = self.store.lock();
            let record = store
                .connections
                .iter()
                .find(|c| c.id == connection_id)
                .ok_or_else(|| DigiCredError::not_found("connection", connection_id))?;
            (record.is_ready(), store.connection_peers.get(connection_id).cloned())
        };
        if !ready {
            return Err(DigiCredError::runtime(
                "offer credential",
                format!("connection {connection_id} is not completed"),
            ));
        }
        let peer = peer.ok_or_else(|| DigiCredError::runtime("offer credential", "connection has no peer"))?;

        let record = CredentialExchangeRecord {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            connection_id: connection_id.to_string(),
            thread_id: Uuid::new_v4().to_string(),
            state: CredentialState::OfferSent,
            credential_definition_id: credential_definition_id.to_string(),
            attributes: attributes.to_vec(),
            protocol_version: "v2".into(),
        };
        self.store
            .lock()
            .credentials
            .insert(record.id.clone(), record.clone());
        self.bus
            .publish(AgentEvent::CredentialStateChanged(CredentialEvent {
                credential_id: record.id.clone(),
                state: CredentialState::OfferSent,
                previous_state: None,
            }));
        info!(agent = %self.name, credential_id = %record.id, %connection_id, "credential offered");

        let holder = self.peer(&peer.agent)?;
        let holder_record = holder.receive_offer(
            &record,
            PeerRef {
                agent: self.name.clone(),
                record_id: record.id.clone(),
            },
            peer.record_id,
        );
        self.store.lock().credential_peers.insert(
            record.id.clone(),
            PeerRef {
                agent: holder.name.clone(),
                record_id: holder_record.clone(),
            },
        );

        match holder.holder {
            HolderBehavior::Request => {
                holder.transition_credential(&holder_record, CredentialState::RequestSent)?;
                self.transition_credential(&record.id, CredentialState::RequestReceived)?;
            }
            HolderBehavior::Decline => {
                holder.transition_credential(&holder_record, CredentialState::Declined)?;
                self.transition_credential(&record.id, CredentialState::Declined)?;
            }
            HolderBehavior::Ignore => {}
        }
        Ok(record)
    }

    async fn accept_credential_request(&self, credential_id: &str) -> Result<()> {
        let state = {
            let mut store = self.store.lock();
            store.accepted.push(credential_id.to_string());
            store
                .credentials
                .get(credential_id)
                .map(|c| c.state)
                .ok_or_else(|| DigiCredError::not_found("credential exchange", credential_id))?
        };
        if state != CredentialState::RequestReceived {
            return Err(DigiCredError::runtime(
                "accept credential request",
                format!("credential {credential_id} is in state {state}"),
            ));
        }

        self.transition_credential(credential_id, CredentialState::CredentialIssued)?;
        let (holder, holder_record) = self.credential_peer(credential_id)?;
        holder.transition_credential(&holder_record, CredentialState::CredentialReceived)?;
        holder.transition_credential(&holder_record, CredentialState::Done)?;
        self.transition_credential(credential_id, CredentialState::Done)?;
        Ok(())
    }

    async fn send_basic_message(&self, connection_id: &str, content: &str) -> Result<BasicMessageRecord> {
        let peer = self
            .store
            .lock()
            .connection_peers
            .get(connection_id)
            .cloned()
            .ok_or_else(|| DigiCredError::not_found("connection", connection_id))?;
        let now = Utc::now();
        let record = BasicMessageRecord {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            connection_id: connection_id.to_string(),
            content: content.to_string(),
            sent_time: now,
            role: BasicMessageRole::Sender,
        };
        self.store
            .lock()
            .messages
            .insert(record.id.clone(), record.clone());

        let receiver = self.peer(&peer.agent)?;
        let received = BasicMessageRecord {
            id: Uuid::new_v4().to_string(),
            connection_id: peer.record_id.clone(),
            role: BasicMessageRole::Receiver,
            ..record.clone()
        };
        let message_id = received.id.clone();
        receiver
            .store
            .lock()
            .messages
            .insert(message_id.clone(), received);
        receiver.bus.publish(AgentEvent::BasicMessageReceived {
            connection_id: peer.record_id,
            message_id,
        });
        Ok(record)
    }

    async fn find_basic_message(&self, id: &str) -> Result<Option<BasicMessageRecord>> {
        Ok(self.store.lock().messages.get(id).cloned())
    }

    async fn delete_basic_message(&self, id: &str) -> Result<()> {
        self.store
            .lock()
            .messages
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DigiCredError::not_found("basic message", id))
    }

    async fn import_did(&self, did: &str, seed: &str) -> Result<()> {
        if seed.len() != 32 {
            return Err(DigiCredError::runtime(
                "import did",
                format!("seed must be 32 bytes, got {}", seed.len()),
            ));
        }
        // Re-importing overwrites the key.
        self.store
            .lock()
            .dids
            .insert(did.to_string(), seed.to_string());
        Ok(())
    }

    async fn register_schema(&self, schema: &SchemaTemplate) -> Result<String> {
        self.require_ledger("register schema")?;
        let mut store = self.store.lock();
        if !store.dids.contains_key(&schema.issuer_id) {
            return Err(DigiCredError::Ledger(format!(
                "issuer {} is not a DID controlled by this agent",
                schema.issuer_id
            )));
        }
        let id = format!(
            "{}/anoncreds/v0/SCHEMA/{}/{}",
            schema.issuer_id, schema.name, schema.version
        );
        if !store.schemas.iter().any(|(existing, _)| existing == &id) {
            store.schemas.push((id.clone(), schema.clone()));
        }
        Ok(id)
    }

    async fn register_credential_definition(
        &self,
        definition: &CredentialDefinitionTemplate,
    ) -> Result<String> {
        self.require_ledger("register credential definition")?;
        let mut store = self.store.lock();
        if !store.dids.contains_key(&definition.issuer_id) {
            return Err(DigiCredError::Ledger(format!(
                "issuer {} is not a DID controlled by this agent",
                definition.issuer_id
            )));
        }
        let seq_no = store
            .schemas
            .iter()
            .position(|(id, _)| id == &definition.schema_id)
            .ok_or_else(|| DigiCredError::Ledger(format!("schema {} not found", definition.schema_id)))?
            + 1;
        let id = format!(
            "{}/anoncreds/v0/CLAIM_DEF/{}/{}",
            definition.issuer_id, seq_no, definition.tag
        );
        store
            .credential_definitions
            .insert(id.clone(), definition.clone());
        Ok(id)
    }
}
