use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::confidence::ConfidenceLevel;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate text through cache, memory, providers and local dictionaries
    Translate {
        /// Text to translate
        #[arg(short, long)]
        text: String,

        /// Target language code
        #[arg(long)]
        to: String,

        /// Source language code
        #[arg(long, default_value = "auto")]
        from: String,

        /// Do not read the in-process cache
        #[arg(long)]
        skip_cache: bool,

        /// Do not read the translation memory
        #[arg(long)]
        skip_memory: bool,

        /// Force offline resolution for this call
        #[arg(long, conflicts_with = "online")]
        offline: bool,

        /// Force online resolution for this call
        #[arg(long)]
        online: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Store an approved or corrected translation in the translation memory
    Promote {
        /// Original text
        #[arg(short, long)]
        text: String,

        /// Approved translation
        #[arg(long)]
        translation: String,

        /// Target language code
        #[arg(long)]
        to: String,

        /// Source language code
        #[arg(long, default_value = "auto")]
        from: String,

        /// Confidence to record
        #[arg(long, value_enum, default_value = "high")]
        confidence: ConfidenceArg,
    },

    /// Show or change offline mode
    Offline {
        #[command(subcommand)]
        action: OfflineAction,
    },

    /// Inspect the in-process cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage the translation memory
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// List configured providers in priority order
    Providers,

    /// Write a default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "lingo.toml")]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum OfflineAction {
    /// Force offline mode
    On,
    /// Force online mode
    Off,
    /// Release the manual setting and follow network status again
    Auto,
    /// Show the current state
    Status,
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Show cache size and capacity
    Stats,
    /// Clear the cache
    Clear,
}

#[derive(Subcommand)]
pub enum MemoryAction {
    /// List memory entries, newest first
    List,
    /// Show the number of entries
    Stats,
    /// Remove every entry
    Clear,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ConfidenceArg {
    High,
    Medium,
    Low,
}

impl From<ConfidenceArg> for ConfidenceLevel {
    fn from(arg: ConfidenceArg) -> Self {
        match arg {
            ConfidenceArg::High => ConfidenceLevel::High,
            ConfidenceArg::Medium => ConfidenceLevel::Medium,
            ConfidenceArg::Low => ConfidenceLevel::Low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_args() {
        let args = Args::try_parse_from([
            "lingo", "-v", "translate", "--text", "hello", "--to", "fr", "--skip-cache", "--offline",
        ])
        .unwrap();
        assert!(args.verbose);
        match args.command {
            Commands::Translate {
                text,
                to,
                from,
                skip_cache,
                offline,
                online,
                ..
            } => {
                assert_eq!(text, "hello");
                assert_eq!(to, "fr");
                assert_eq!(from, "auto");
                assert!(skip_cache);
                assert!(offline);
                assert!(!online);
            }
            _ => panic!("expected translate command"),
        }
    }

    #[test]
    fn test_offline_and_online_conflict() {
        let result = Args::try_parse_from([
            "lingo", "translate", "--text", "x", "--to", "fr", "--offline", "--online",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_providers_command() {
        let args = Args::try_parse_from(["lingo", "providers"]).unwrap();
        assert!(matches!(args.command, Commands::Providers));
    }

    #[test]
    fn test_promote_confidence_default() {
        let args = Args::try_parse_from([
            "lingo", "promote", "--text", "hi", "--translation", "salut", "--to", "fr",
        ])
        .unwrap();
        match args.command {
            Commands::Promote { confidence, .. } => {
                assert_eq!(ConfidenceLevel::from(confidence), ConfidenceLevel::High)
            }
            _ => panic!("expected promote command"),
        }
    }
}
