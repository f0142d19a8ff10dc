/// Marker for "detect the source language for me".
pub const AUTO: &str = "auto";

/// Normalize a language code to trimmed lower-case form.
pub fn normalize(code: &str) -> String {
    code.trim().to_lowercase()
}

/// Resolve a requested source language, mapping `auto` (or nothing) to the
/// configured default source language.
pub fn resolve_source(source: &str, default_source: &str) -> String {
    let source = normalize(source);
    if source.is_empty() || source == AUTO {
        normalize(default_source)
    } else {
        source
    }
}

/// The primary subtag of a code: `pt-br` -> `pt`.
pub fn primary_subtag(code: &str) -> &str {
    code.split(['-', '_']).next().unwrap_or(code)
}

/// Convert language code to full language name for display
pub fn language_name(code: &str) -> String {
    match primary_subtag(&normalize(code)) {
        "en" => "English".to_string(),
        "fr" => "French".to_string(),
        "es" => "Spanish".to_string(),
        "de" => "German".to_string(),
        "it" => "Italian".to_string(),
        "pt" => "Portuguese".to_string(),
        "nl" => "Dutch".to_string(),
        "pl" => "Polish".to_string(),
        "ru" => "Russian".to_string(),
        "uk" => "Ukrainian".to_string(),
        "tr" => "Turkish".to_string(),
        "ar" => "Arabic".to_string(),
        "he" => "Hebrew".to_string(),
        "hi" => "Hindi".to_string(),
        "ja" => "Japanese".to_string(),
        "ko" => "Korean".to_string(),
        "zh" => "Chinese".to_string(),
        "sv" => "Swedish".to_string(),
        "da" => "Danish".to_string(),
        "no" => "Norwegian".to_string(),
        "fi" => "Finnish".to_string(),
        _ => code.to_string(),
    }
}
