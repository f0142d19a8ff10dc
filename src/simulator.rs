// Offline dictionary translator
//
// Tables are keyed by (source, target) language pair. Each pair has:
// - phrases: exact-match idioms, looked up on the trimmed lower-case input
// - words: single-word substitutions applied with case-insensitive word boundaries
//
// Built-in tables cover a handful of pairs; more can be merged from a TOML file:
// ```toml
// [[pairs]]
// source = "en"
// target = "fr"
// phrases = { "see you soon" = "à bientôt" }
// words = { "car" = "voiture" }
// ```

use regex::{NoExpand, Regex};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, warn};

use crate::confidence::ConfidenceLevel;
use crate::error::{LingoError, Result};
use crate::language::{self, primary_subtag};
use crate::result::{TranslationResult, UsedSource};

/// Translator that works without any network access and never fails.
pub trait LocalTranslator: Send + Sync {
    fn translate(&self, text: &str, target_language: &str, source_language: &str) -> TranslationResult;
}

/// Phrase and word tables for one language pair, as written in a tables file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairTable {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub phrases: BTreeMap<String, String>,
    #[serde(default)]
    pub words: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct TablesFile {
    #[serde(default)]
    pairs: Vec<PairTable>,
}

struct WordRule {
    pattern: Regex,
    replacement: String,
}

#[derive(Default)]
struct CompiledPair {
    phrases: HashMap<String, String>,
    words: BTreeMap<String, String>,
    rules: Vec<WordRule>,
}

impl CompiledPair {
    fn merge(&mut self, table: PairTable) {
        for (phrase, translation) in table.phrases {
            self.phrases.insert(normalize_phrase(&phrase), translation);
        }
        for (word, translation) in table.words {
            self.words.insert(word.trim().to_lowercase(), translation);
        }
        self.compile();
    }

    /// Longest words first so multi-word entries win over their parts,
    /// then lexicographic for a stable order.
    fn compile(&mut self) {
        let mut words: Vec<_> = self.words.iter().collect();
        words.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

        self.rules = words
            .into_iter()
            .filter_map(|(word, replacement)| {
                match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word))) {
                    Ok(pattern) => Some(WordRule {
                        pattern,
                        replacement: replacement.clone(),
                    }),
                    Err(e) => {
                        warn!("Skipping dictionary word {:?}: {}", word, e);
                        None
                    }
                }
            })
            .collect();
    }
}

fn normalize_phrase(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Dictionary and phrase-table translator used when providers are skipped or fail.
pub struct LocalSimulator {
    pairs: HashMap<(String, String), CompiledPair>,
    default_source: String,
}

impl LocalSimulator {
    /// Simulator with the built-in tables.
    pub fn new(default_source: &str) -> Self {
        let mut simulator = Self::empty(default_source);
        for table in builtin_tables() {
            simulator.merge(table);
        }
        simulator
    }

    /// Simulator without any tables: every translation takes the no-match path.
    pub fn empty(default_source: &str) -> Self {
        Self {
            pairs: HashMap::new(),
            default_source: language::normalize(default_source),
        }
    }

    /// Merge extra tables from a TOML file. Entries override built-ins.
    pub fn with_tables_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LingoError::Config(format!("Failed to read simulator tables {}: {}", path.display(), e))
        })?;
        let file: TablesFile = toml::from_str(&content)?;

        debug!("Loaded {} simulator table(s) from {}", file.pairs.len(), path.display());
        for table in file.pairs {
            self.merge(table);
        }
        Ok(self)
    }

    pub fn merge(&mut self, table: PairTable) {
        let key = (language::normalize(&table.source), language::normalize(&table.target));
        self.pairs.entry(key).or_default().merge(table);
    }

    pub fn has_pair(&self, source: &str, target: &str) -> bool {
        self.pair(source, target).is_some()
    }

    fn pair(&self, source: &str, target: &str) -> Option<&CompiledPair> {
        self.pairs
            .get(&(source.to_string(), target.to_string()))
            .or_else(|| {
                self.pairs.get(&(
                    primary_subtag(source).to_string(),
                    primary_subtag(target).to_string(),
                ))
            })
    }

    fn no_match(text: &str, target: &str) -> TranslationResult {
        TranslationResult::new(
            format!("{} ({})", text, target),
            ConfidenceLevel::Low,
            true,
            UsedSource::Simulation,
        )
    }
}

impl LocalTranslator for LocalSimulator {
    fn translate(&self, text: &str, target_language: &str, source_language: &str) -> TranslationResult {
        let source = language::resolve_source(source_language, &self.default_source);
        let target = language::normalize(target_language);

        if source == target || text.trim().is_empty() {
            return TranslationResult::identity(text);
        }

        let Some(pair) = self.pair(&source, &target) else {
            debug!("No simulator tables for {} -> {}", source, target);
            return Self::no_match(text, &target);
        };

        if let Some(phrase) = pair.phrases.get(&normalize_phrase(text)) {
            return TranslationResult::new(
                phrase.clone(),
                ConfidenceLevel::High,
                false,
                UsedSource::Simulation,
            );
        }

        let total_words = text.split_whitespace().count();
        let mut translated = text.to_string();
        let mut matched = 0usize;
        for rule in &pair.rules {
            let occurrences = rule.pattern.find_iter(&translated).count();
            if occurrences > 0 {
                matched += occurrences;
                translated = rule
                    .pattern
                    .replace_all(&translated, NoExpand(&rule.replacement))
                    .into_owned();
            }
        }

        if matched == 0 {
            return Self::no_match(text, &target);
        }

        let coverage = matched as f64 / total_words.max(1) as f64;
        debug!(
            "Dictionary matched {}/{} words ({:.0}%) for {} -> {}",
            matched,
            total_words,
            coverage * 100.0,
            source,
            target
        );

        TranslationResult::new(
            translated,
            ConfidenceLevel::from_coverage(coverage),
            false,
            UsedSource::Simulation,
        )
    }
}

fn table(source: &str, target: &str, phrases: &[(&str, &str)], words: &[(&str, &str)]) -> PairTable {
    PairTable {
        source: source.to_string(),
        target: target.to_string(),
        phrases: phrases.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        words: words.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
    }
}

fn builtin_tables() -> Vec<PairTable> {
    vec![
        table(
            "en",
            "fr",
            &[
                ("hello world", "bonjour le monde"),
                ("good morning", "bonjour"),
                ("good evening", "bonsoir"),
                ("good night", "bonne nuit"),
                ("thank you", "merci"),
                ("thank you very much", "merci beaucoup"),
                ("how are you", "comment allez-vous"),
                ("how are you?", "comment allez-vous ?"),
                ("see you later", "à plus tard"),
                ("excuse me", "excusez-moi"),
                ("you're welcome", "de rien"),
                ("i don't understand", "je ne comprends pas"),
                ("welcome to the course", "bienvenue dans le cours"),
            ],
            &[
                ("hello", "bonjour"),
                ("goodbye", "au revoir"),
                ("yes", "oui"),
                ("no", "non"),
                ("please", "s'il vous plaît"),
                ("thanks", "merci"),
                ("world", "monde"),
                ("good", "bon"),
                ("morning", "matin"),
                ("evening", "soir"),
                ("day", "jour"),
                ("night", "nuit"),
                ("course", "cours"),
                ("lesson", "leçon"),
                ("teacher", "professeur"),
                ("student", "étudiant"),
                ("answer", "réponse"),
                ("book", "livre"),
                ("water", "eau"),
                ("house", "maison"),
                ("cat", "chat"),
                ("dog", "chien"),
                ("today", "aujourd'hui"),
                ("tomorrow", "demain"),
                ("and", "et"),
            ],
        ),
        table(
            "en",
            "es",
            &[
                ("hello world", "hola mundo"),
                ("good morning", "buenos días"),
                ("good evening", "buenas tardes"),
                ("good night", "buenas noches"),
                ("thank you", "gracias"),
                ("thank you very much", "muchas gracias"),
                ("how are you", "¿cómo estás?"),
                ("see you later", "hasta luego"),
                ("excuse me", "disculpe"),
                ("you're welcome", "de nada"),
                ("i don't understand", "no entiendo"),
                ("welcome to the course", "bienvenido al curso"),
            ],
            &[
                ("hello", "hola"),
                ("goodbye", "adiós"),
                ("yes", "sí"),
                ("please", "por favor"),
                ("thanks", "gracias"),
                ("world", "mundo"),
                ("friend", "amigo"),
                ("day", "día"),
                ("night", "noche"),
                ("course", "curso"),
                ("lesson", "lección"),
                ("teacher", "profesor"),
                ("student", "estudiante"),
                ("answer", "respuesta"),
                ("book", "libro"),
                ("water", "agua"),
                ("house", "casa"),
                ("cat", "gato"),
                ("dog", "perro"),
                ("today", "hoy"),
                ("tomorrow", "mañana"),
                ("and", "y"),
            ],
        ),
        table(
            "en",
            "de",
            &[
                ("hello world", "hallo welt"),
                ("good morning", "guten Morgen"),
                ("good evening", "guten Abend"),
                ("good night", "gute Nacht"),
                ("thank you", "danke"),
                ("thank you very much", "vielen Dank"),
                ("how are you", "wie geht es Ihnen"),
                ("see you later", "bis später"),
                ("excuse me", "entschuldigung"),
                ("you're welcome", "gern geschehen"),
                ("i don't understand", "ich verstehe nicht"),
            ],
            &[
                ("hello", "hallo"),
                ("goodbye", "auf Wiedersehen"),
                ("yes", "ja"),
                ("no", "nein"),
                ("please", "bitte"),
                ("thanks", "danke"),
                ("world", "Welt"),
                ("friend", "Freund"),
                ("day", "Tag"),
                ("night", "Nacht"),
                ("course", "Kurs"),
                ("lesson", "Lektion"),
                ("teacher", "Lehrer"),
                ("student", "Student"),
                ("book", "Buch"),
                ("water", "Wasser"),
                ("house", "Haus"),
                ("cat", "Katze"),
                ("dog", "Hund"),
                ("today", "heute"),
                ("tomorrow", "morgen"),
                ("and", "und"),
            ],
        ),
        table(
            "fr",
            "en",
            &[
                ("bonjour le monde", "hello world"),
                ("merci beaucoup", "thank you very much"),
                ("comment allez-vous", "how are you"),
                ("à plus tard", "see you later"),
                ("je ne comprends pas", "i don't understand"),
                ("de rien", "you're welcome"),
            ],
            &[
                ("bonjour", "hello"),
                ("merci", "thanks"),
                ("oui", "yes"),
                ("non", "no"),
                ("monde", "world"),
                ("cours", "course"),
                ("livre", "book"),
                ("maison", "house"),
                ("chat", "cat"),
                ("chien", "dog"),
                ("demain", "tomorrow"),
                ("et", "and"),
            ],
        ),
        table(
            "es",
            "en",
            &[
                ("hola mundo", "hello world"),
                ("muchas gracias", "thank you very much"),
                ("buenos días", "good morning"),
                ("hasta luego", "see you later"),
                ("no entiendo", "i don't understand"),
                ("de nada", "you're welcome"),
            ],
            &[
                ("hola", "hello"),
                ("gracias", "thanks"),
                ("sí", "yes"),
                ("mundo", "world"),
                ("amigo", "friend"),
                ("curso", "course"),
                ("libro", "book"),
                ("casa", "house"),
                ("gato", "cat"),
                ("perro", "dog"),
                ("mañana", "tomorrow"),
                ("y", "and"),
            ],
        ),
    ]
}
