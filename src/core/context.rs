//! Shared handles for the engine's collaborator-facing operations.

use crate::{
    config::settings::PlannerSettings,
    core::events::EventSink,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use std::{future::Future, sync::Arc};
use tracing::warn;

/// Database, event sink, and settings used by the orchestrator and plan tracker.
pub struct PlannerContext {
    /// Connection backing the debt source and the report, payment, and plan stores
    pub db: DatabaseConnection,
    /// Where "report created" events go
    pub events: Arc<dyn EventSink>,
    /// Engine tunables
    pub settings: PlannerSettings,
}

impl PlannerContext {
    /// Bundles the collaborators the engine needs.
    #[must_use]
    pub fn new(db: DatabaseConnection, events: Arc<dyn EventSink>, settings: PlannerSettings) -> Self {
        Self {
            db,
            events,
            settings,
        }
    }

    /// Runs a collaborator call under the configured store timeout.
    ///
    /// A call that takes too long is dropped (rolling back any open database transaction) and
    /// reported as `UpstreamUnavailable`.
    pub async fn bounded<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let limit = self.settings.store_timeout();
        tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
            warn!(operation, timeout_ms = self.settings.store_timeout_ms, "Store call timed out");
            Err(Error::UpstreamUnavailable {
                message: format!("{operation} timed out after {}ms", limit.as_millis()),
            })
        })
    }
}
