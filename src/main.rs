//! Lingo - Translation Resolution Engine
//!
//! Command-line front end for resolving translations and managing the
//! translation memory and offline mode.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{Level, debug};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use lingo::cli::{Args, CacheAction, Commands, MemoryAction, OfflineAction};
use lingo::config::Config;
use lingo::language::language_name;
use lingo::{RequestOptions, ResolutionEngine};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_deref())?;

    setup_logging(args.verbose, &config.storage.log_dir())?;
    debug!("Using data directory {}", config.storage.data_dir.display());

    if let Commands::Init { output } = &args.command {
        Config::default().save_to_file(output)?;
        println!("Wrote default configuration to {}", output.display());
        return Ok(());
    }

    let engine = ResolutionEngine::from_config(&config).await?;

    match args.command {
        Commands::Translate {
            text,
            to,
            from,
            skip_cache,
            skip_memory,
            offline,
            online,
            json,
        } => {
            let options = RequestOptions {
                skip_cache,
                skip_memory,
                offline_override: if offline {
                    Some(true)
                } else if online {
                    Some(false)
                } else {
                    None
                },
            };
            let result = engine.translate(&text, &to, &from, options).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.text);
                println!();
                println!("{:<12} {}", "Target:", language_name(&to));
                println!("{:<12} {}", "Source:", result.used_source);
                println!("{:<12} {}", "Confidence:", result.confidence);
                println!("{:<12} {}", "Fallback:", result.fallback);
                if result.has_error() {
                    println!("{:<12} {}", "Error:", result.error);
                }
            }
        }
        Commands::Promote {
            text,
            translation,
            to,
            from,
            confidence,
        } => {
            engine
                .promote(&text, &translation, &from, &to, confidence.into())
                .await?;
            println!("Saved translation to memory");
        }
        Commands::Offline { action } => match action {
            OfflineAction::On => {
                engine.set_offline_mode(true).await?;
                println!("Offline mode: on (manual)");
            }
            OfflineAction::Off => {
                engine.set_offline_mode(false).await?;
                println!("Offline mode: off (manual)");
            }
            OfflineAction::Auto => {
                engine.release_offline_override().await?;
                println!("Offline mode follows network status");
            }
            OfflineAction::Status => {
                println!(
                    "Offline mode: {}",
                    if engine.get_offline_mode() { "on" } else { "off" }
                );
            }
        },
        Commands::Cache { action } => match action {
            CacheAction::Stats => {
                let stats = engine.cache_stats();
                println!("Cache entries: {} / {}", stats.size, stats.capacity);
            }
            CacheAction::Clear => {
                engine.clear_cache();
                println!("Cache cleared");
            }
        },
        Commands::Memory { action } => match action {
            MemoryAction::List => {
                let entries = engine.memory().list().await;
                if entries.is_empty() {
                    println!("Translation memory is empty.");
                } else {
                    println!("{:<25} {:<10} {:<30} {}", "Stored", "Confidence", "Key", "Translation");
                    println!("{}", "-".repeat(100));
                    for (key, entry) in entries {
                        println!(
                            "{:<25} {:<10} {:<30} {}",
                            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                            entry.confidence,
                            key,
                            entry.translation
                        );
                    }
                }
            }
            MemoryAction::Stats => {
                println!("Translation memory entries: {}", engine.memory_stats().await);
                if let Some(path) = engine.memory().path() {
                    println!("Stored in: {}", path.display());
                }
            }
            MemoryAction::Clear => {
                let count = engine.clear_memory().await?;
                println!("Cleared {} translation memory entries", count);
            }
        },
        Commands::Providers => {
            if engine.providers().is_empty() {
                println!("No translation providers in the priority list.");
            }
            for descriptor in engine.providers().descriptors() {
                println!(
                    "{:<2} {:<10} {:<8} {:<8} {}",
                    descriptor.priority_index,
                    descriptor.name,
                    descriptor.fixed_confidence,
                    if descriptor.fallback_flag() { "fallback" } else { "" },
                    if descriptor.credentials_present { "ready" } else { "no credentials" }
                );
            }
        }
        Commands::Init { .. } => {}
    }

    Ok(())
}

fn setup_logging(verbose: bool, log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(log_dir, "lingo.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Console output stays terse; translations go to stdout
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
