use crate::confidence::ConfidenceLevel;
use crate::language::{self, primary_subtag};
use crate::result::{TranslationResult, UsedSource};

/// Last-resort phrases, usable when nothing else in the engine is.
const EMERGENCY_PHRASES: &[(&str, &str, &str)] = &[
    ("fr", "hello", "Bonjour"),
    ("fr", "thank you", "Merci"),
    ("fr", "goodbye", "Au revoir"),
    ("fr", "yes", "Oui"),
    ("fr", "no", "Non"),
    ("es", "hello", "Hola"),
    ("es", "thank you", "Gracias"),
    ("es", "goodbye", "Adiós"),
    ("es", "yes", "Sí"),
    ("es", "no", "No"),
    ("de", "hello", "Hallo"),
    ("de", "thank you", "Danke"),
    ("de", "goodbye", "Auf Wiedersehen"),
    ("de", "yes", "Ja"),
    ("de", "no", "Nein"),
    ("it", "hello", "Ciao"),
    ("it", "thank you", "Grazie"),
    ("it", "goodbye", "Arrivederci"),
    ("it", "yes", "Sì"),
    ("it", "no", "No"),
    ("pt", "hello", "Olá"),
    ("pt", "thank you", "Obrigado"),
    ("pt", "goodbye", "Adeus"),
    ("pt", "yes", "Sim"),
    ("pt", "no", "Não"),
];

/// Placeholder translation built from a static table; cannot fail.
pub fn emergency_translation(text: &str, target_language: &str, error: impl Into<String>) -> TranslationResult {
    let target = language::normalize(target_language);
    let phrase = text.trim().to_lowercase();
    let phrase = phrase.trim_end_matches(['!', '.', '?']);

    let translated = EMERGENCY_PHRASES
        .iter()
        .find(|(lang, source, _)| *lang == primary_subtag(&target) && *source == phrase)
        .map(|(_, _, translation)| translation.to_string())
        .unwrap_or_else(|| format!("[{}] {}", target, text));

    let mut result = TranslationResult::new(translated, ConfidenceLevel::Low, true, UsedSource::Emergency);
    result.error = error.into();
    result
}
