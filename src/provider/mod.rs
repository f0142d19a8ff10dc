// External translation providers
//
// Each vendor adapter implements `TranslationProvider` and performs exactly one
// HTTP request per call. Vendor-specific behaviour that is not part of the wire
// protocol (confidence, fallback flag) lives in the policy table below, not in
// the adapters.
//
// To add a provider:
// 1. Write the adapter module
// 2. Add a `ProviderKind` variant and its row in `PROVIDER_POLICIES`
// 3. Teach `ProviderFactory::create_provider` to build it from config

pub mod chain;
pub mod common;
pub mod deepl;
pub mod libre;
pub mod microsoft;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub use chain::{ChainEntry, ProviderChain};
use crate::confidence::ConfidenceLevel;
use crate::config::Config;
use crate::error::{LingoError, Result};

/// Adapter contract for one external translation vendor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translate `text`, returning the vendor's translation or an error.
    /// `source_language` may be `auto`.
    async fn translate(&self, text: &str, target_language: &str, source_language: &str) -> Result<String>;
}

/// How a provider's successful results set the `fallback` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    Never,
    IfNotFirst,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    DeepL,
    Microsoft,
    Libre,
}

/// Confidence and fallback flag reported by each provider on success.
/// Paid providers are trusted outright; the free one is always flagged.
const PROVIDER_POLICIES: &[(ProviderKind, ConfidenceLevel, FallbackPolicy)] = &[
    (ProviderKind::DeepL, ConfidenceLevel::High, FallbackPolicy::Never),
    (ProviderKind::Microsoft, ConfidenceLevel::High, FallbackPolicy::IfNotFirst),
    (ProviderKind::Libre, ConfidenceLevel::Medium, FallbackPolicy::Always),
];

impl ProviderKind {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "deepl" => Ok(Self::DeepL),
            "microsoft" | "azure" => Ok(Self::Microsoft),
            "libre" | "libretranslate" => Ok(Self::Libre),
            _ => Err(LingoError::UnknownProvider(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DeepL => "deepl",
            Self::Microsoft => "microsoft",
            Self::Libre => "libre",
        }
    }

    pub fn policy(&self) -> (ConfidenceLevel, FallbackPolicy) {
        PROVIDER_POLICIES
            .iter()
            .find(|(kind, _, _)| kind == self)
            .map(|(_, confidence, policy)| (*confidence, *policy))
            .unwrap_or((ConfidenceLevel::Unknown, FallbackPolicy::Always))
    }
}

/// Static description of a configured provider. Built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub name: String,
    pub priority_index: usize,
    pub credentials_present: bool,
    pub fixed_confidence: ConfidenceLevel,
    pub fallback_policy: FallbackPolicy,
}

impl ProviderDescriptor {
    pub fn new(
        name: impl Into<String>,
        priority_index: usize,
        fixed_confidence: ConfidenceLevel,
        fallback_policy: FallbackPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            priority_index,
            credentials_present: true,
            fixed_confidence,
            fallback_policy,
        }
    }

    pub fn without_credentials(mut self) -> Self {
        self.credentials_present = false;
        self
    }

    /// The `fallback` flag this provider attaches to a successful result.
    pub fn fallback_flag(&self) -> bool {
        match self.fallback_policy {
            FallbackPolicy::Never => false,
            FallbackPolicy::IfNotFirst => self.priority_index > 0,
            FallbackPolicy::Always => true,
        }
    }
}

/// Factory for building the provider chain from configuration
pub struct ProviderFactory;

impl ProviderFactory {
    /// Descriptors in configured priority order. Unknown names are skipped;
    /// a repeated name keeps its first position.
    pub fn descriptors(config: &Config) -> Vec<(ProviderKind, ProviderDescriptor)> {
        let mut descriptors: Vec<(ProviderKind, ProviderDescriptor)> = Vec::new();

        for (index, name) in config.engine.priority.iter().enumerate() {
            let kind = match ProviderKind::from_name(name) {
                Ok(kind) => kind,
                Err(e) => {
                    warn!("{}; ignoring it in the priority list", e);
                    continue;
                }
            };
            if descriptors.iter().any(|(k, _)| *k == kind) {
                warn!("Provider {} listed twice in priority; keeping first position", kind.name());
                continue;
            }

            let credentials_present = match kind {
                ProviderKind::DeepL => config.providers.deepl.has_credentials(),
                ProviderKind::Microsoft => config.providers.microsoft.has_credentials(),
                ProviderKind::Libre => config.providers.libre.has_credentials(),
            };
            let (fixed_confidence, fallback_policy) = kind.policy();

            descriptors.push((
                kind,
                ProviderDescriptor {
                    name: kind.name().to_string(),
                    priority_index: index,
                    credentials_present,
                    fixed_confidence,
                    fallback_policy,
                },
            ));
        }

        descriptors
    }

    /// Create the adapter for one provider kind
    pub fn create_provider(
        kind: ProviderKind,
        config: &Config,
        client: reqwest::Client,
    ) -> Arc<dyn TranslationProvider> {
        match kind {
            ProviderKind::DeepL => Arc::new(deepl::DeepLProvider::new(client, config.providers.deepl.clone())),
            ProviderKind::Microsoft => Arc::new(microsoft::MicrosoftProvider::new(
                client,
                config.providers.microsoft.clone(),
            )),
            ProviderKind::Libre => Arc::new(libre::LibreProvider::new(client, config.providers.libre.clone())),
        }
    }

    /// Build the whole chain, sharing one HTTP client across adapters.
    pub fn create_chain(config: &Config) -> Result<ProviderChain> {
        let timeout = Duration::from_secs(config.engine.request_timeout_secs.max(1));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let entries = Self::descriptors(config)
            .into_iter()
            .map(|(kind, descriptor)| ChainEntry {
                descriptor,
                provider: Self::create_provider(kind, config, client.clone()),
            })
            .collect();

        Ok(ProviderChain::new(entries).with_timeout(timeout))
    }
}
