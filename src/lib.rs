//! Lingo - Translation Resolution Engine
//!
//! Resolves `(text, source language, target language)` requests into
//! translations with a confidence signal. Results come from a bounded
//! in-process cache, a persisted translation memory, a priority-ordered chain
//! of external providers, or an offline dictionary simulator, and resolution
//! never fails outright.

pub mod cli;
pub mod config;
pub mod error;
pub mod confidence;
pub mod language;
pub mod result;
pub mod cache;
pub mod memory;
pub mod offline;
pub mod simulator;
pub mod emergency;
pub mod provider;
pub mod engine;

pub use confidence::ConfidenceLevel;
pub use engine::ResolutionEngine;
pub use error::{LingoError, Result};
pub use result::{RequestOptions, TranslationRequest, TranslationResult, UsedSource};
