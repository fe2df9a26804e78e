//! Agent lifecycle, invitations, and credential issuance.

use digicred_config::DigiCredConfig;
use digicred_core::{
    AgentSpec, CredentialAttribute, CredentialExchangeRecord, DigiCredError, Invitation,
    OutOfBandRecord, Result,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::correlator::{CompletionCallback, WorkflowCorrelator};
use crate::qr;
use crate::registry::AgentRegistry;

/// Response to `create-new-invitation`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvitation {
    /// QR code of `invitation_url` as a `data:` URL.
    #[serde(rename = "invitationUrlQRcode")]
    pub invitation_url_qrcode: String,
    pub invitation_url: String,
    pub out_of_band_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentSummary {
    pub name: String,
    pub endpoint: String,
    /// False when the agent already existed.
    pub created: bool,
}

pub struct AgentService {
    registry: Arc<AgentRegistry>,
    correlator: Arc<WorkflowCorrelator>,
    config: Arc<RwLock<DigiCredConfig>>,
}

impl AgentService {
    pub fn new(
        registry: Arc<AgentRegistry>,
        correlator: Arc<WorkflowCorrelator>,
        config: Arc<RwLock<DigiCredConfig>>,
    ) -> Self {
        Self {
            registry,
            correlator,
            config,
        }
    }

    /// Create (or return) the named agent on the configured ledgers and
    /// start its event pump.
    pub async fn create_agent(&self, name: &str, endpoint: &str, port: u16) -> Result<AgentSummary> {
        let ledgers = self.config.read().ledger.networks.clone();
        self.create_from_spec(&AgentSpec::new(name, endpoint, port).with_ledgers(ledgers))
            .await
    }

    pub async fn create_from_spec(&self, spec: &AgentSpec) -> Result<AgentSummary> {
        if spec.name.trim().is_empty() {
            return Err(DigiCredError::InvalidRequest("agent name is empty".into()));
        }
        let (agent, created) = self.registry.get_or_create(spec).await?;
        if created {
            self.correlator.attach(Arc::clone(&agent));
        }
        Ok(AgentSummary {
            name: agent.name().to_string(),
            endpoint: agent.endpoint().to_string(),
            created,
        })
    }

    pub fn list_agents(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Mint an invitation, render its QR code, and start watching for the
    /// connection it produces.
    pub async fn create_new_invitation(&self, agent_name: &str) -> Result<NewInvitation> {
        self.create_new_invitation_with(agent_name, None).await
    }

    /// As [`create_new_invitation`](Self::create_new_invitation), running
    /// `on_complete` once the connection completes.
    pub async fn create_new_invitation_with(
        &self,
        agent_name: &str,
        on_complete: Option<CompletionCallback>,
    ) -> Result<NewInvitation> {
        let agent = self.registry.resolve(Some(agent_name))?;
        info!(agent = %agent_name, "creating new invitation");
        let invitation = agent.create_invitation().await.map_err(|e| {
            error!(agent = %agent_name, error = %e, "error creating new invitation");
            e
        })?;
        let min_dimension = self.config.read().qrcode.min_dimension;
        let invitation_url_qrcode = qr::to_data_url(&invitation.invitation_url, min_dimension)?;
        self.correlator
            .watch_invitation(agent_name, &invitation.out_of_band_id, on_complete)?;
        info!(
            agent = %agent_name,
            out_of_band_id = %invitation.out_of_band_id,
            url = %invitation.invitation_url,
            "new invitation created"
        );
        Ok(NewInvitation {
            invitation_url_qrcode,
            invitation_url: invitation.invitation_url,
            out_of_band_id: invitation.out_of_band_id,
        })
    }

    pub async fn create_legacy_invitation(&self, agent_name: &str) -> Result<Invitation> {
        let agent = self.registry.resolve(Some(agent_name))?;
        info!(agent = %agent_name, "creating legacy invitation");
        let invitation = agent.create_legacy_invitation().await.map_err(|e| {
            error!(agent = %agent_name, error = %e, "error creating legacy invitation");
            e
        })?;
        info!(agent = %agent_name, url = %invitation.invitation_url, "legacy invitation created");
        Ok(invitation)
    }

    pub async fn receive_invitation(&self, agent_name: &str, invitation_url: &str) -> Result<OutOfBandRecord> {
        let agent = self.registry.resolve(Some(agent_name))?;
        let record = agent.receive_invitation(invitation_url).await.map_err(|e| {
            error!(agent = %agent_name, error = %e, "error receiving invitation");
            e
        })?;
        info!(agent = %agent_name, out_of_band_id = %record.id, "received invitation");
        Ok(record)
    }

    /// Watch an existing out-of-band record of `agent_name` for completion.
    pub async fn setup_connection_listener(&self, agent_name: &str, out_of_band_id: &str) -> Result<()> {
        let agent = self.registry.resolve(Some(agent_name))?;
        if agent.find_out_of_band_record(out_of_band_id).await?.is_none() {
            return Err(DigiCredError::not_found("out-of-band record", out_of_band_id));
        }
        self.correlator.watch_invitation(agent_name, out_of_band_id, None)
    }

    /// Offer a credential over the connection created from the invitation
    /// `out_of_band_id`.
    pub async fn issue_credential(
        &self,
        agent_name: Option<&str>,
        out_of_band_id: &str,
        credential_definition_id: &str,
        attributes: &[CredentialAttribute],
    ) -> Result<CredentialExchangeRecord> {
        let agent = self.registry.resolve(agent_name)?;
        let connection = agent
            .find_connections_by_out_of_band_id(out_of_band_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DigiCredError::not_found("connection", out_of_band_id))?;
        let record = agent
            .offer_credential(&connection.id, credential_definition_id, attributes)
            .await
            .map_err(|e| {
                error!(agent = %agent.name(), connection_id = %connection.id, error = %e, "credential offer failed");
                e
            })?;
        info!(
            agent = %agent.name(),
            connection_id = %connection.id,
            credential_id = %record.id,
            "credential offered"
        );
        Ok(record)
    }
}
