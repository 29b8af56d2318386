//! Two-source prompt resolution: remote store first, local catalog second.

use thiserror::Error;

use super::hub::{HubError, PromptHub};
use super::template::PromptTemplate;
use super::{Stage, catalog};

/// Resolves stage templates, preferring the remote store when one is
/// configured. Reads always succeed; writes require the store.
#[derive(Debug, Clone)]
pub struct PromptResolver {
    hub: Option<PromptHub>,
}

/// Error publishing a template.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("no prompt store is configured; pushes have no local fallback")]
    NoStore,
    #[error(transparent)]
    Hub(#[from] HubError),
}

impl PromptResolver {
    /// A resolver that only ever serves the compiled-in catalog.
    pub fn local_only() -> Self {
        Self { hub: None }
    }

    pub fn with_hub(hub: PromptHub) -> Self {
        Self { hub: Some(hub) }
    }

    /// Fetch a stage's template. Any store failure falls back to the local
    /// catalog, so this cannot fail.
    pub async fn resolve(&self, stage: Stage, version: Option<&str>) -> PromptTemplate {
        if let Some(hub) = &self.hub {
            match hub.fetch(stage.store_name(), version).await {
                Ok(template) => {
                    tracing::debug!(stage = %stage, "prompt fetched from store");
                    return template;
                }
                Err(e) => {
                    tracing::warn!(
                        stage = %stage,
                        error = %e,
                        "prompt store fetch failed, using local template"
                    );
                }
            }
        }
        catalog::local(stage)
    }

    /// Publish a new version of a stage's template. Unlike reads, a push
    /// fails hard when the store is missing or erroring.
    pub async fn push(
        &self,
        stage: Stage,
        template: &PromptTemplate,
    ) -> Result<String, PushError> {
        let hub = self.hub.as_ref().ok_or(PushError::NoStore)?;
        let version = hub.push(stage.store_name(), template).await?;
        tracing::info!(stage = %stage, version = %version, "prompt pushed to store");
        Ok(version)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
