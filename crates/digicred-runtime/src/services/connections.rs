//! Connection record queries.

use digicred_core::{ConnectionRecord, DigiCredError, Result};
use digicred_query::{
    CursorPage, DEFAULT_ID_FIELD, Filter, OffsetPage, QuerySpec, apply_filter, execute,
    offset_paginate,
};
use std::sync::Arc;
use tracing::{debug, error};

use crate::registry::AgentRegistry;

pub struct ConnectionService {
    registry: Arc<AgentRegistry>,
}

impl ConnectionService {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry }
    }

    /// Filter, sort, and cursor-paginate all connections of the agent.
    pub async fn find_all(&self, agent: Option<&str>, query: &QuerySpec) -> Result<CursorPage<ConnectionRecord>> {
        let handle = self.registry.resolve(agent)?;
        let records = handle.get_all_connections().await?;
        execute(records, query, DEFAULT_ID_FIELD).map_err(|e| {
            error!(agent = %handle.name(), error = %e, "error fetching connections");
            DigiCredError::from(e)
        })
    }

    pub async fn find_all_offset(
        &self,
        agent: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<OffsetPage<ConnectionRecord>> {
        let handle = self.registry.resolve(agent)?;
        let records = handle.get_all_connections().await?;
        Ok(offset_paginate(records, offset, limit))
    }

    /// All connections matching `filter`, unpaginated.
    pub async fn find_all_by_query(&self, agent: Option<&str>, filter: &Filter) -> Result<Vec<ConnectionRecord>> {
        let handle = self.registry.resolve(agent)?;
        let records = handle.get_all_connections().await?;
        Ok(apply_filter(records, Some(filter)))
    }

    pub async fn find_by_id(&self, agent: Option<&str>, id: &str) -> Result<Option<ConnectionRecord>> {
        let record = self.registry.resolve(agent)?.find_connection_by_id(id).await?;
        log_missing("id", id, &record);
        Ok(record)
    }

    pub async fn find_by_did(&self, agent: Option<&str>, did: &str) -> Result<Option<ConnectionRecord>> {
        let record = self.registry.resolve(agent)?.find_connection_by_did(did).await?;
        log_missing("did", did, &record);
        Ok(record)
    }

    pub async fn find_by_thread_id(&self, agent: Option<&str>, thread_id: &str) -> Result<Option<ConnectionRecord>> {
        let record = self
            .registry
            .resolve(agent)?
            .find_connection_by_thread_id(thread_id)
            .await?;
        log_missing("thread id", thread_id, &record);
        Ok(record)
    }

    pub async fn find_by_invitation_did(
        &self,
        agent: Option<&str>,
        invitation_did: &str,
    ) -> Result<Option<ConnectionRecord>> {
        let record = self
            .registry
            .resolve(agent)?
            .find_connection_by_invitation_did(invitation_did)
            .await?;
        log_missing("invitation did", invitation_did, &record);
        Ok(record)
    }

    pub async fn find_all_by_out_of_band_id(
        &self,
        agent: Option<&str>,
        out_of_band_id: &str,
    ) -> Result<Vec<ConnectionRecord>> {
        self.registry
            .resolve(agent)?
            .find_connections_by_out_of_band_id(out_of_band_id)
            .await
    }

    pub async fn find_all_by_connection_types(
        &self,
        agent: Option<&str>,
        types: &[String],
    ) -> Result<Vec<ConnectionRecord>> {
        self.registry.resolve(agent)?.find_connections_by_types(types).await
    }

    pub async fn delete_by_id(&self, agent: Option<&str>, id: &str) -> Result<()> {
        let handle = self.registry.resolve(agent)?;
        handle.delete_connection(id).await.map_err(|e| {
            error!(agent = %handle.name(), connection_id = %id, error = %e, "error deleting connection");
            e
        })
    }
}

fn log_missing(by: &str, key: &str, record: &Option<ConnectionRecord>) {
    if record.is_none() {
        debug!(by, key, "connection not found");
    }
}
