use digicred_core::{BasicMessageRecord, DigiCredError, Result};
use std::sync::Arc;
use tracing::{error, info};

use crate::registry::AgentRegistry;

/// Basic messages over established connections.
pub struct MessageService {
    registry: Arc<AgentRegistry>,
}

impl MessageService {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry }
    }

    pub async fn get_message(&self, agent: Option<&str>, message_id: &str) -> Result<BasicMessageRecord> {
        let handle = self.registry.resolve(agent)?;
        info!(agent = %handle.name(), %message_id, "retrieving message");
        handle
            .find_basic_message(message_id)
            .await?
            .ok_or_else(|| DigiCredError::not_found("basic message", message_id))
    }

    /// Send `content` over the connection created from invitation `out_of_band_id`.
    pub async fn send_message(
        &self,
        agent: Option<&str>,
        out_of_band_id: &str,
        content: &str,
    ) -> Result<BasicMessageRecord> {
        let handle = self.registry.resolve(agent)?;
        let connection = handle
            .find_connections_by_out_of_band_id(out_of_band_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DigiCredError::not_found("connection", out_of_band_id))?;
        info!(agent = %handle.name(), connection_id = %connection.id, "sending message");
        handle
            .send_basic_message(&connection.id, content)
            .await
            .map_err(|e| {
                error!(agent = %handle.name(), connection_id = %connection.id, error = %e, "failed to send message");
                e
            })
    }

    pub async fn delete_message(&self, agent: Option<&str>, message_id: &str) -> Result<String> {
        let handle = self.registry.resolve(agent)?;
        handle.delete_basic_message(message_id).await.map_err(|e| {
            error!(agent = %handle.name(), %message_id, error = %e, "failed to delete message");
            e
        })?;
        info!(agent = %handle.name(), %message_id, "message deleted");
        Ok(format!("Message with ID {message_id} has been deleted successfully."))
    }
}
