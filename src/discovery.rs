use tracing::{debug, instrument, warn};

use crate::{
    client::OllamaClient,
    models::{
        errors::ClientError,
        tags::{CapabilityFilter, LibraryModel, ModelEntry, TagsResponse},
    },
};

/// The base model name is everything before the first `:` tag separator.
pub(crate) fn base_name(model: &str) -> &str {
    match model.find(':') {
        Some(idx) => &model[..idx],
        None => model,
    }
}

/// An entry survives only if it satisfies every filter constraint:
/// required capabilities must be present, forbidden ones absent.
pub(crate) fn passes_filter(capabilities: &[String], filter: &CapabilityFilter) -> bool {
    filter.iter().all(|(capability, required)| {
        let present = capabilities.iter().any(|c| c == capability);
        present == *required
    })
}

impl OllamaClient {
    /// Lists installed models whose capabilities satisfy `filter`.
    ///
    /// Models whose capability set is unknown or empty are excluded
    /// regardless of the filter; a failed capability lookup degrades to
    /// "unknown" for that entry rather than failing the whole listing.
    /// Result order follows the tags endpoint, filtered in place.
    #[instrument(name = "models.list", skip_all)]
    pub async fn list_models(
        &self,
        filter: &CapabilityFilter,
    ) -> Result<Vec<ModelEntry>, ClientError> {
        let url = format!("{}/api/tags", self.base_url);
        let tags: TagsResponse = self.get(&url).await?;

        let mut surviving = Vec::new();
        for entry in tags.models {
            let base = base_name(&entry.name);
            let capabilities = match self.capabilities_of(base).await {
                Ok(capabilities) => capabilities,
                Err(e) => {
                    warn!(model = %entry.name, error = %e, "capability lookup failed, excluding model");
                    Vec::new()
                }
            };

            if capabilities.is_empty() {
                debug!(model = %entry.name, "no known capabilities, excluding model");
                continue;
            }

            if !passes_filter(&capabilities, filter) {
                continue;
            }

            surviving.push(entry);
        }

        Ok(surviving)
    }

    /// Like [`OllamaClient::list_models`], but returns just the model names.
    pub async fn list_model_names(
        &self,
        filter: &CapabilityFilter,
    ) -> Result<Vec<String>, ClientError> {
        let models = self.list_models(filter).await?;
        Ok(models.into_iter().map(|entry| entry.name).collect())
    }

    /// Resolves the capability set of a base model name.
    ///
    /// Successful lookups are cached for the lifetime of the client and
    /// never refreshed; failures are not cached, so a transient outage can
    /// be retried on a later call. Concurrent lookups of the same uncached
    /// name may race, in which case the last write wins with an equivalent
    /// value.
    #[instrument(name = "models.capabilities", skip(self))]
    pub async fn capabilities_of(&self, base_name: &str) -> Result<Vec<String>, ClientError> {
        if let Some(cached) = self.capability_cache().get(base_name).cloned() {
            debug!(model = %base_name, "capability cache hit");
            return Ok(cached);
        }

        let url = format!("{}/{}", self.library_url, base_name);
        let model: LibraryModel = self.get(&url).await?;

        self.capability_cache()
            .insert(base_name.to_string(), model.capabilities.clone());

        Ok(model.capabilities)
    }

    /// Drops every cached capability set. Intended for tests and
    /// long-running processes that need to observe new model pushes.
    pub fn clear_capability_cache(&self) {
        self.capability_cache().clear();
    }
}
