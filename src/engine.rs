use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{debug, info, warn};

use crate::cache::{BoundedCache, CacheStats, cache_key};
use crate::confidence::ConfidenceLevel;
use crate::config::Config;
use crate::emergency::emergency_translation;
use crate::error::{LingoError, Result};
use crate::language;
use crate::memory::TranslationMemory;
use crate::offline::OfflineMode;
use crate::provider::{ProviderChain, ProviderFactory};
use crate::result::{RequestOptions, TranslationRequest, TranslationResult, UsedSource};
use crate::simulator::{LocalSimulator, LocalTranslator};

/// Turns translation requests into results, consulting the cache, the
/// translation memory, the provider chain and the local simulator in turn.
///
/// `resolve` never fails: every internal error ends up in the returned
/// result's `error` field with `fallback` set.
pub struct ResolutionEngine {
    cache: BoundedCache,
    memory: TranslationMemory,
    offline: OfflineMode,
    providers: ProviderChain,
    simulator: Box<dyn LocalTranslator>,
    providers_enabled: bool,
    default_source: String,
}

impl ResolutionEngine {
    /// Engine with in-process state only: default cache, non-persistent
    /// memory and offline flag, built-in simulator tables.
    pub fn new(providers: ProviderChain) -> Self {
        Self {
            cache: BoundedCache::default(),
            memory: TranslationMemory::in_memory(),
            offline: OfflineMode::in_memory(),
            providers,
            simulator: Box::new(LocalSimulator::new("en")),
            providers_enabled: true,
            default_source: "en".to_string(),
        }
    }

    /// Build an engine from configuration, opening persisted state under the
    /// configured data directory.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let default_source = &config.engine.default_source_language;

        let mut simulator = LocalSimulator::new(default_source);
        if let Some(path) = &config.simulator.tables_path {
            simulator = simulator.with_tables_file(path)?;
        }

        let providers = ProviderFactory::create_chain(config)?;
        info!(
            "{} of {} translation providers have credentials",
            providers.active_count(),
            providers.len()
        );

        Ok(Self::new(providers)
            .with_cache_capacity(config.engine.cache_capacity)
            .with_memory(TranslationMemory::open(config.storage.memory_path()).await)
            .with_offline_mode(OfflineMode::open(config.storage.offline_path()).await)
            .with_simulator(simulator)
            .with_providers_enabled(config.engine.providers_enabled)
            .with_default_source(default_source))
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = BoundedCache::new(capacity);
        self
    }

    pub fn with_memory(mut self, memory: TranslationMemory) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_offline_mode(mut self, offline: OfflineMode) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_simulator(mut self, simulator: impl LocalTranslator + 'static) -> Self {
        self.simulator = Box::new(simulator);
        self
    }

    pub fn with_providers_enabled(mut self, enabled: bool) -> Self {
        self.providers_enabled = enabled;
        self
    }

    pub fn with_default_source(mut self, language: &str) -> Self {
        self.default_source = language::normalize(language);
        self
    }

    /// Convenience wrapper around [`ResolutionEngine::resolve`].
    pub async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: &str,
        options: RequestOptions,
    ) -> TranslationResult {
        let request = TranslationRequest::new(text, target_language)
            .from_language(source_language)
            .with_options(options);
        self.resolve(&request).await
    }

    pub async fn resolve(&self, request: &TranslationRequest) -> TranslationResult {
        let text = request.text.as_str();
        if text.trim().is_empty() {
            return TranslationResult::identity(text);
        }

        let source = language::resolve_source(&request.source_language, &self.default_source);
        let target = language::normalize(&request.target_language);
        if source == target {
            return TranslationResult::identity(text);
        }

        let options = request.options;
        let key = cache_key(&source, &target, text);

        if !options.skip_cache {
            if let Some(mut cached) = self.cache.get(&key) {
                cached.from_cache = true;
                cached.from_memory = false;
                cached.used_source = UsedSource::Cache;
                return cached;
            }
        }

        let offline = options.offline_override.unwrap_or_else(|| self.offline.is_offline());

        if !options.skip_memory {
            if let Some(entry) = self.memory.lookup(&key).await {
                let mut result = TranslationResult::new(entry.translation, entry.confidence, false, UsedSource::Memory);
                result.from_memory = true;
                self.cache.set(&key, result.clone());
                return result;
            }
        }

        let skip_reason = if offline {
            Some("offline mode")
        } else if !self.providers_enabled {
            Some("providers disabled")
        } else if self.providers.active_count() == 0 {
            Some("no providers configured")
        } else {
            None
        };
        if let Some(reason) = skip_reason {
            debug!("Skipping providers ({}) for {}", reason, key);
            return self.simulate(&key, text, &target, &source, None);
        }

        // Providers get the caller's source as given so they can detect it themselves
        let provider_source = match language::normalize(&request.source_language) {
            requested if requested.is_empty() => language::AUTO.to_string(),
            requested => requested,
        };

        match self.providers.resolve(text, &target, &provider_source).await {
            Ok(result) => {
                self.cache.set(&key, result.clone());
                if result.confidence == ConfidenceLevel::High && !result.fallback {
                    if let Err(e) = self.memory.promote(&key, &result.text, result.confidence).await {
                        warn!("Failed to persist translation memory entry: {}", e);
                    }
                }
                result
            }
            Err(LingoError::NoProvidersConfigured) => self.simulate(&key, text, &target, &source, None),
            Err(e) => {
                warn!("Falling back to local simulator for {} -> {}: {}", source, target, e);
                self.simulate(&key, text, &target, &source, Some(e.to_string()))
            }
        }
    }

    /// Local simulator tier. `provider_error` is set when the chain was tried
    /// and failed, which forces the fallback flag.
    fn simulate(
        &self,
        key: &str,
        text: &str,
        target: &str,
        source: &str,
        provider_error: Option<String>,
    ) -> TranslationResult {
        match catch_unwind(AssertUnwindSafe(|| self.simulator.translate(text, target, source))) {
            Ok(mut result) => {
                if let Some(error) = provider_error {
                    result.fallback = true;
                    result.error = error;
                }
                self.cache.set(key, result.clone());
                result
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                warn!("Local simulator failed for {}: {}; using emergency phrases", key, reason);
                let error = match provider_error {
                    Some(provider_error) => format!("{}; local simulator failed: {}", provider_error, reason),
                    None => format!("local simulator failed: {}", reason),
                };
                emergency_translation(text, target, error)
            }
        }
    }

    /// Record a user-approved or corrected translation.
    pub async fn promote(
        &self,
        text: &str,
        translation: &str,
        source_language: &str,
        target_language: &str,
        confidence: ConfidenceLevel,
    ) -> Result<()> {
        let source = language::resolve_source(source_language, &self.default_source);
        let target = language::normalize(target_language);
        if source == target || text.trim().is_empty() {
            return Ok(());
        }

        let key = cache_key(&source, &target, text);
        // Drop any stale cached result so the next resolve reads the memory
        self.cache.remove(&key);
        self.memory.promote(&key, translation, confidence).await
    }

    pub async fn set_offline_mode(&self, offline: bool) -> Result<()> {
        self.offline.set_manual(offline).await
    }

    pub fn get_offline_mode(&self) -> bool {
        self.offline.is_offline()
    }

    /// Hand offline mode back to network-status reporting.
    pub async fn release_offline_override(&self) -> Result<()> {
        self.offline.clear_manual().await
    }

    /// Feed from a network-status listener; ignored while a manual toggle is latched.
    pub async fn report_network_status(&self, online: bool) -> Result<bool> {
        self.offline.on_network_status(online).await
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub async fn clear_memory(&self) -> Result<u64> {
        self.memory.clear().await
    }

    /// Number of entries in the translation memory.
    pub async fn memory_stats(&self) -> usize {
        self.memory.len().await
    }

    pub fn memory(&self) -> &TranslationMemory {
        &self.memory
    }

    pub fn providers(&self) -> &ProviderChain {
        &self.providers
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChainEntry, FallbackPolicy, MockTranslationProvider, ProviderDescriptor};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn deepl(mock: MockTranslationProvider) -> ChainEntry {
        ChainEntry {
            descriptor: ProviderDescriptor::new("deepl", 0, ConfidenceLevel::High, FallbackPolicy::Never),
            provider: Arc::new(mock),
        }
    }

    fn libre(mock: MockTranslationProvider) -> ChainEntry {
        ChainEntry {
            descriptor: ProviderDescriptor::new("libre", 0, ConfidenceLevel::Medium, FallbackPolicy::Always),
            provider: Arc::new(mock),
        }
    }

    fn translating(times: usize, text: &'static str) -> MockTranslationProvider {
        let mut mock = MockTranslationProvider::new();
        mock.expect_translate()
            .times(times)
            .returning(move |_, _, _| Ok(text.to_string()));
        mock
    }

    fn failing(times: usize) -> MockTranslationProvider {
        let mut mock = MockTranslationProvider::new();
        mock.expect_translate()
            .times(times)
            .returning(|_, _, _| Err(LingoError::network("deepl", "connection refused")));
        mock
    }

    fn never_called() -> MockTranslationProvider {
        let mut mock = MockTranslationProvider::new();
        mock.expect_translate().never();
        mock
    }

    fn engine(entries: Vec<ChainEntry>) -> ResolutionEngine {
        ResolutionEngine::new(ProviderChain::new(entries))
    }

    fn request(text: &str, target: &str, source: &str) -> TranslationRequest {
        TranslationRequest::new(text, target).from_language(source)
    }

    #[tokio::test]
    async fn test_same_language_is_identity() {
        let engine = engine(vec![deepl(never_called())]);
        let result = engine.resolve(&request("Hello there", "en", "en")).await;
        assert_eq!(result, TranslationResult::identity("Hello there"));

        let auto = engine.resolve(&request("Hello there", "EN", "auto")).await;
        assert_eq!(auto.used_source, UsedSource::None);
        assert_eq!(engine.cache_stats().size, 0);
    }

    #[tokio::test]
    async fn test_blank_text_is_identity() {
        let engine = engine(vec![deepl(never_called())]);
        let result = engine.resolve(&request("   ", "fr", "en")).await;
        assert_eq!(result.text, "   ");
        assert_eq!(result.confidence, ConfidenceLevel::High);
        assert!(!result.fallback);
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let engine = engine(vec![deepl(translating(1, "Bonjour le monde"))]);

        let first = engine.resolve(&request("Hello world", "fr", "en")).await;
        assert_eq!(first.used_source, UsedSource::Provider("deepl".to_string()));
        assert!(!first.from_cache);

        let second = engine.resolve(&request("Hello world", "fr", "en")).await;
        assert!(second.from_cache);
        assert_eq!(second.text, first.text);
        assert_eq!(second.used_source, UsedSource::Cache);
    }

    #[tokio::test]
    async fn test_auto_source_shares_cache_with_default_source() {
        let engine = engine(vec![deepl(translating(1, "Hola"))]);
        engine.resolve(&request("Hello", "es", "auto")).await;
        let second = engine.resolve(&request("Hello", "es", "en")).await;
        assert!(second.from_cache);
    }

    #[tokio::test]
    async fn test_high_confidence_provider_result_is_promoted() {
        let engine = engine(vec![deepl(translating(1, "Bonjour"))]);
        engine.resolve(&request("Hello", "fr", "en")).await;

        let options = RequestOptions {
            skip_cache: true,
            ..Default::default()
        };
        let again = engine.resolve(&request("Hello", "fr", "en").with_options(options)).await;
        assert!(again.from_memory);
        assert!(!again.from_cache);
        assert_eq!(again.text, "Bonjour");
        assert_eq!(again.used_source, UsedSource::Memory);
    }

    #[tokio::test]
    async fn test_flagged_provider_result_is_not_promoted() {
        let engine = engine(vec![libre(translating(2, "Hallo"))]);
        let first = engine.resolve(&request("Hello", "de", "en")).await;
        assert!(first.fallback);
        assert_eq!(first.confidence, ConfidenceLevel::Medium);
        assert!(engine.memory().is_empty().await);

        let options = RequestOptions {
            skip_cache: true,
            ..Default::default()
        };
        let again = engine.resolve(&request("Hello", "de", "en").with_options(options)).await;
        assert!(!again.from_memory);
    }

    #[tokio::test]
    async fn test_total_provider_failure_degrades_to_simulator() {
        let engine = engine(vec![deepl(failing(2))]);

        let result = engine.resolve(&request("hello world", "fr", "en")).await;
        assert_eq!(result.text, "bonjour le monde");
        assert_eq!(result.used_source, UsedSource::Simulation);
        assert!(result.fallback);
        assert!(result.error.contains("connection refused"));

        // Failed resolutions are not cached, so providers are retried
        let retry = engine.resolve(&request("hello world", "fr", "en")).await;
        assert!(!retry.from_cache);
        assert!(retry.has_error());
    }

    #[tokio::test]
    async fn test_offline_mode_skips_providers() {
        let engine = engine(vec![deepl(never_called())]);
        engine.set_offline_mode(true).await.unwrap();
        assert!(engine.get_offline_mode());

        let result = engine.resolve(&request("hello world", "fr", "en")).await;
        assert_eq!(result.text, "bonjour le monde");
        assert!(!result.fallback);
        assert!(!result.has_error());
        assert_eq!(engine.cache_stats().size, 1);
    }

    #[tokio::test]
    async fn test_offline_override_beats_global_flag() {
        let engine = engine(vec![deepl(translating(1, "Bonjour"))]);
        engine.set_offline_mode(true).await.unwrap();

        let options = RequestOptions {
            offline_override: Some(false),
            ..Default::default()
        };
        let result = engine.resolve(&request("Hello", "fr", "en").with_options(options)).await;
        assert_eq!(result.used_source, UsedSource::Provider("deepl".to_string()));
    }

    #[tokio::test]
    async fn test_per_request_offline_override() {
        let engine = engine(vec![deepl(never_called())]);
        let options = RequestOptions {
            offline_override: Some(true),
            ..Default::default()
        };
        let result = engine.resolve(&request("xyzzy plugh", "fr", "en").with_options(options)).await;
        assert_eq!(result.text, "xyzzy plugh (fr)");
        assert!(result.fallback);
        assert!(!result.has_error());
    }

    #[tokio::test]
    async fn test_disabled_providers_use_simulator() {
        let engine = engine(vec![deepl(never_called())]).with_providers_enabled(false);
        let result = engine.resolve(&request("hello there friend", "fr", "en")).await;
        assert_eq!(result.text, "bonjour there friend");
        assert_eq!(result.confidence, ConfidenceLevel::Low);
        assert!(!result.fallback);
    }

    #[tokio::test]
    async fn test_no_credentialed_providers_use_simulator_without_error() {
        let mut entry = deepl(never_called());
        entry.descriptor = entry.descriptor.without_credentials();
        let engine = engine(vec![entry]);

        let result = engine.resolve(&request("hello world", "fr", "en")).await;
        assert_eq!(result.text, "bonjour le monde");
        assert!(!result.has_error());
    }

    #[tokio::test]
    async fn test_memory_hit_writes_through_to_cache() {
        let engine = engine(vec![deepl(never_called())]);
        engine
            .promote("Hello", "Salut", "en", "fr", ConfidenceLevel::High)
            .await
            .unwrap();

        let first = engine.resolve(&request("Hello", "fr", "auto")).await;
        assert!(first.from_memory);
        assert_eq!(first.text, "Salut");

        let second = engine.resolve(&request("Hello", "fr", "en")).await;
        assert!(second.from_cache);
        assert_eq!(second.text, "Salut");
    }

    #[tokio::test]
    async fn test_promote_replaces_cached_result() {
        let engine = engine(vec![libre(translating(1, "Bonjour"))]);
        engine.resolve(&request("Hello", "fr", "en")).await;
        engine
            .promote("Hello", "Salut", "en", "fr", ConfidenceLevel::High)
            .await
            .unwrap();

        let result = engine.resolve(&request("Hello", "fr", "en")).await;
        assert!(result.from_memory);
        assert_eq!(result.text, "Salut");
    }

    #[tokio::test]
    async fn test_skip_memory_goes_to_providers() {
        let engine = engine(vec![deepl(translating(1, "Bonjour"))]);
        engine
            .promote("Hello", "Salut", "en", "fr", ConfidenceLevel::High)
            .await
            .unwrap();

        let options = RequestOptions {
            skip_memory: true,
            ..Default::default()
        };
        let result = engine.resolve(&request("Hello", "fr", "en").with_options(options)).await;
        assert_eq!(result.text, "Bonjour");
        assert!(!result.from_memory);
    }

    struct PanickingSimulator {
        calls: Arc<AtomicUsize>,
    }

    impl LocalTranslator for PanickingSimulator {
        fn translate(&self, _: &str, _: &str, _: &str) -> TranslationResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            panic!("dictionary unavailable");
        }
    }

    #[tokio::test]
    async fn test_simulator_panic_uses_emergency_tier_uncached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = engine(vec![deepl(failing(2))]).with_simulator(PanickingSimulator {
            calls: Arc::clone(&calls),
        });

        let result = engine.resolve(&request("Thank you", "es", "en")).await;
        assert_eq!(result.text, "Gracias");
        assert_eq!(result.used_source, UsedSource::Emergency);
        assert_eq!(result.confidence, ConfidenceLevel::Low);
        assert!(result.fallback);
        assert!(result.error.contains("connection refused"));
        assert!(result.error.contains("dictionary unavailable"));

        let again = engine.resolve(&request("Thank you", "es", "en")).await;
        assert_eq!(again.used_source, UsedSource::Emergency);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(engine.cache_stats().size, 0);
    }

    #[tokio::test]
    async fn test_simulator_panic_while_offline_uses_emergency_tier() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = engine(vec![deepl(never_called())]).with_simulator(PanickingSimulator {
            calls: Arc::clone(&calls),
        });
        engine.set_offline_mode(true).await.unwrap();

        let result = engine.resolve(&request("Goodbye", "de", "en")).await;
        assert_eq!(result.text, "Auf Wiedersehen");
        assert_eq!(result.used_source, UsedSource::Emergency);
        assert!(result.fallback);
        assert_eq!(result.error, "local simulator failed: dictionary unavailable");
        assert_eq!(engine.cache_stats().size, 0);

        let disabled = ResolutionEngine::new(ProviderChain::empty())
            .with_providers_enabled(false)
            .with_simulator(PanickingSimulator {
                calls: Arc::clone(&calls),
            });
        let result = disabled.resolve(&request("Open the lesson", "ja", "en")).await;
        assert_eq!(result.text, "[ja] Open the lesson");
        assert_eq!(result.used_source, UsedSource::Emergency);
        assert!(result.has_error());
        assert_eq!(disabled.cache_stats().size, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    fn recording_sources(seen: &Arc<std::sync::Mutex<Vec<String>>>) -> MockTranslationProvider {
        let seen = Arc::clone(seen);
        let mut mock = MockTranslationProvider::new();
        mock.expect_translate().returning(move |_, _, source| {
            seen.lock().unwrap().push(source.to_string());
            Ok("Hallo".to_string())
        });
        mock
    }

    #[tokio::test]
    async fn test_providers_receive_auto_source_for_detection() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let engine = engine(vec![deepl(recording_sources(&seen))]);

        let result = engine.resolve(&TranslationRequest::new("Bonjour", "de").from_language("auto")).await;
        assert_eq!(result.text, "Hallo");
        engine.resolve(&TranslationRequest::new("Merci", "de").from_language("")).await;
        engine.resolve(&request("Danke schön", "fr", " DE ")).await;

        assert_eq!(*seen.lock().unwrap(), vec!["auto", "auto", "de"]);

        // Keys still use the resolved default source
        let cached = engine.resolve(&request("Bonjour", "de", "en")).await;
        assert!(cached.from_cache);
    }

    #[tokio::test]
    async fn test_provider_status_lists_chain_in_priority_order() {
        let mut entry = libre(never_called());
        entry.descriptor = ProviderDescriptor::new("libre", 2, ConfidenceLevel::Medium, FallbackPolicy::Always)
            .without_credentials();
        let engine = engine(vec![entry, deepl(never_called())]);

        let names: Vec<_> = engine
            .providers()
            .descriptors()
            .map(|d| (d.name.as_str(), d.credentials_present))
            .collect();
        assert_eq!(names, vec![("deepl", true), ("libre", false)]);
    }

    #[tokio::test]
    async fn test_clear_cache_and_memory() {
        let engine = engine(vec![deepl(translating(1, "Bonjour"))]).with_cache_capacity(5);
        engine.resolve(&request("Hello", "fr", "en")).await;
        assert_eq!(engine.cache_stats(), CacheStats { size: 1, capacity: 5 });

        engine.clear_cache();
        assert_eq!(engine.cache_stats().size, 0);
        assert_eq!(engine.clear_memory().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_network_status_respects_manual_latch() {
        let engine = engine(vec![]);
        assert!(engine.report_network_status(false).await.unwrap());
        assert!(engine.get_offline_mode());

        engine.set_offline_mode(false).await.unwrap();
        assert!(!engine.report_network_status(false).await.unwrap());
        assert!(!engine.get_offline_mode());

        engine.release_offline_override().await.unwrap();
        assert!(engine.report_network_status(false).await.unwrap());
        assert!(engine.get_offline_mode());
    }

    #[tokio::test]
    async fn test_concurrent_resolves() {
        let engine = Arc::new(engine(vec![deepl({
            let mut mock = MockTranslationProvider::new();
            mock.expect_translate()
                .returning(|text, _, _| Ok(format!("fr:{}", text)));
            mock
        })]));

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move { engine.resolve(&request(&format!("text {}", i % 5), "fr", "en")).await })
            })
            .collect();

        for handle in handles {
            let result = handle.await.unwrap();
            assert!(result.text.starts_with("fr:text "));
            assert!(!result.has_error());
        }
        assert_eq!(engine.cache_stats().size, 5);
    }
}
