use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{ProviderDescriptor, TranslationProvider};
use crate::error::{LingoError, Result};
use crate::result::{TranslationResult, UsedSource};

#[derive(Clone)]
pub struct ChainEntry {
    pub descriptor: ProviderDescriptor,
    pub provider: Arc<dyn TranslationProvider>,
}

/// Providers tried in ascending priority until one produces a translation.
pub struct ProviderChain {
    entries: Vec<ChainEntry>,
    timeout: Option<Duration>,
}

impl ProviderChain {
    pub fn new(mut entries: Vec<ChainEntry>) -> Self {
        entries.sort_by_key(|entry| entry.descriptor.priority_index);
        Self { entries, timeout: None }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Bound every provider call; an elapsed call counts as a network failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Providers that will actually be attempted.
    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|e| e.descriptor.credentials_present).count()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    async fn call(&self, entry: &ChainEntry, text: &str, target: &str, source: &str) -> Result<String> {
        let name = &entry.descriptor.name;
        let translated = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, entry.provider.translate(text, target, source))
                .await
                .map_err(|_| LingoError::network(name, format!("no response within {:?}", timeout)))??,
            None => entry.provider.translate(text, target, source).await?,
        };

        if translated.trim().is_empty() {
            return Err(LingoError::response(name, "empty translation received"));
        }
        Ok(translated)
    }

    /// Translate with the first provider that succeeds.
    ///
    /// Fails with `NoProvidersConfigured` when no provider has credentials,
    /// and with `AllProvidersFailed` when every attempt failed.
    pub async fn resolve(
        &self,
        text: &str,
        target_language: &str,
        source_language: &str,
    ) -> Result<TranslationResult> {
        if self.active_count() == 0 {
            return Err(LingoError::NoProvidersConfigured);
        }

        let mut failures = Vec::new();
        for entry in self.entries.iter().filter(|e| e.descriptor.credentials_present) {
            let descriptor = &entry.descriptor;
            debug!("Trying provider {} for {} -> {}", descriptor.name, source_language, target_language);

            match self.call(entry, text, target_language, source_language).await {
                Ok(translated) => {
                    info!("Translated with {} ({} -> {})", descriptor.name, source_language, target_language);
                    return Ok(TranslationResult::new(
                        translated,
                        descriptor.fixed_confidence,
                        descriptor.fallback_flag(),
                        UsedSource::Provider(descriptor.name.clone()),
                    ));
                }
                Err(e) => {
                    warn!("Provider {} failed: {}", descriptor.name, e);
                    failures.push(e.to_string());
                }
            }
        }

        Err(LingoError::AllProvidersFailed(failures))
    }
}
