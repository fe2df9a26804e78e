use digicred_core::{CredentialDefinitionTemplate, Result, SchemaTemplate};
use std::sync::Arc;
use tracing::{error, info};

use crate::registry::AgentRegistry;

/// Tag given to every credential definition registered through the gateway.
pub const CREDENTIAL_DEFINITION_TAG: &str = "default";

/// DID import and AnonCreds object registration.
pub struct LedgerService {
    registry: Arc<AgentRegistry>,
}

impl LedgerService {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry }
    }

    pub async fn import_did(&self, agent: Option<&str>, seed: &str, did: &str) -> Result<String> {
        let handle = self.registry.resolve(agent)?;
        handle.import_did(did, seed).await.map_err(|e| {
            error!(agent = %handle.name(), %did, error = %e, "failed to import DID");
            e
        })?;
        info!(agent = %handle.name(), %did, "DID imported");
        Ok(format!("DID {did} successfully imported"))
    }

    pub async fn register_schema(
        &self,
        agent: Option<&str>,
        did: &str,
        name: &str,
        version: &str,
        attr_names: &[String],
    ) -> Result<String> {
        let handle = self.registry.resolve(agent)?;
        let template = SchemaTemplate {
            issuer_id: did.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            attr_names: attr_names.to_vec(),
        };
        let schema_id = handle.register_schema(&template).await.map_err(|e| {
            error!(agent = %handle.name(), schema = %name, error = %e, "failed to register schema");
            e
        })?;
        info!(agent = %handle.name(), %schema_id, "registered schema");
        Ok(schema_id)
    }

    /// Register a non-revocable credential definition for `schema_id`.
    pub async fn register_credential_definition(
        &self,
        agent: Option<&str>,
        did: &str,
        schema_id: &str,
    ) -> Result<String> {
        let handle = self.registry.resolve(agent)?;
        let template = CredentialDefinitionTemplate {
            issuer_id: did.to_string(),
            schema_id: schema_id.to_string(),
            tag: CREDENTIAL_DEFINITION_TAG.to_string(),
            support_revocation: false,
        };
        let id = handle
            .register_credential_definition(&template)
            .await
            .map_err(|e| {
                error!(agent = %handle.name(), %schema_id, error = %e, "failed to register credential definition");
                e
            })?;
        info!(agent = %handle.name(), credential_definition_id = %id, "registered credential definition");
        Ok(id)
    }
}
