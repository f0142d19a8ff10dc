use serde::{Serialize, Serializer};
use std::fmt;

use crate::confidence::ConfidenceLevel;
use crate::language::AUTO;

/// Per-call switches for a translation request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub skip_cache: bool,
    pub skip_memory: bool,
    /// Overrides the process-wide offline flag for this call only
    pub offline_override: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
    pub options: RequestOptions,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_language: AUTO.to_string(),
            target_language: target_language.into(),
            options: RequestOptions::default(),
        }
    }

    pub fn from_language(mut self, source_language: impl Into<String>) -> Self {
        self.source_language = source_language.into();
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

/// Where a translation result came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsedSource {
    /// An external provider, by its configured name
    Provider(String),
    Simulation,
    Memory,
    Cache,
    /// No translation was needed
    None,
    Emergency,
}

impl UsedSource {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Provider(name) => name,
            Self::Simulation => "simulation",
            Self::Memory => "memory",
            Self::Cache => "cache",
            Self::None => "none",
            Self::Emergency => "emergency",
        }
    }
}

impl fmt::Display for UsedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for UsedSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A fully populated translation outcome. Every field carries a defined value
/// on every path; `error` is empty when nothing went wrong.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationResult {
    pub text: String,
    pub confidence: ConfidenceLevel,
    pub fallback: bool,
    pub used_source: UsedSource,
    pub from_cache: bool,
    pub from_memory: bool,
    pub error: String,
}

impl TranslationResult {
    pub fn new(
        text: impl Into<String>,
        confidence: ConfidenceLevel,
        fallback: bool,
        used_source: UsedSource,
    ) -> Self {
        Self {
            text: text.into(),
            confidence,
            fallback,
            used_source,
            from_cache: false,
            from_memory: false,
            error: String::new(),
        }
    }

    /// The input returned untouched: nothing to translate.
    pub fn identity(text: impl Into<String>) -> Self {
        Self::new(text, ConfidenceLevel::High, false, UsedSource::None)
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}
