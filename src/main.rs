use clap::{Parser, Subcommand};
use colored::*;
use heycli::api_keys::ApiKeyManager;
use heycli::clipboard::SystemClipboard;
use heycli::config::Config;
use heycli::error_handling::{display_info, display_success, enhance_error};
use heycli::history::HistoryStore;
use heycli::logging::{get_logger, init_logger, LogCategory};
use heycli::providers::build_provider;
use heycli::session::{AssistantSession, SessionOptions};
use heycli::log_error;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "heycli")]
#[command(version)]
#[command(
    about = "🤖 heycli: ask your terminal",
    long_about = "An interactive assistant that answers terminal questions in a few lines and keeps the suggested command ready to copy."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current configuration
    Config,
    /// Delete all saved history entries
    ClearHistory,
    /// Store the OpenAI API key in the OS keyring
    SetKey {
        /// The API key
        key: String,
    },
    /// Remove the OpenAI API key from the OS keyring
    RemoveKey,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    if let Err(e) = init_logger() {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }

    if let Ok(logger) = get_logger() {
        if let Ok(logger_guard) = logger.lock() {
            let os_info = format!("{} {}", std::env::consts::OS, std::env::consts::ARCH);
            let _ = logger_guard.log_startup(env!("CARGO_PKG_VERSION"), &os_info);
        }
    }

    let cli = Cli::parse();
    let app_config = Config::load();

    let result = match cli.command {
        Some(Commands::Config) => {
            app_config.display();
            if let Ok(logger) = get_logger() {
                if let Ok(logger_guard) = logger.lock() {
                    println!(
                        "{} {}",
                        "Log file:".dimmed(),
                        logger_guard.log_path().display().to_string().dimmed()
                    );
                }
            }
            Ok(())
        }
        Some(Commands::ClearHistory) => clear_history(&app_config),
        Some(Commands::SetKey { key }) => ApiKeyManager::new()
            .set_key(&key)
            .map(|_| display_success("API key stored in the OS keyring")),
        Some(Commands::RemoveKey) => ApiKeyManager::new()
            .remove_key()
            .map(|_| display_success("API key removed from the OS keyring")),
        None => run_session(app_config).await,
    };

    if let Err(e) = result {
        log_error!(LogCategory::System, format!("Fatal: {}", e));
        enhance_error(&e).display();
        std::process::exit(1);
    }

    Ok(())
}

fn history_path(config: &Config) -> anyhow::Result<PathBuf> {
    config
        .history_file()
        .ok_or_else(|| anyhow::anyhow!("could not determine the home directory for the history file"))
}

fn clear_history(config: &Config) -> anyhow::Result<()> {
    let mut history = HistoryStore::load(history_path(config)?, config.history_max_entries)?;
    if history.is_empty() {
        display_info("History is already empty");
        return Ok(());
    }

    let removed = history.len();
    history.clear()?;
    display_success(&format!("Cleared {} history entries", removed));
    Ok(())
}

async fn run_session(config: Config) -> anyhow::Result<()> {
    let history = HistoryStore::load(history_path(&config)?, config.history_max_entries)?;
    let provider = build_provider(&config, ApiKeyManager::new().resolve())?;

    println!(
        "{}",
        format!("Using {} ({})", provider.name(), config.model).dimmed()
    );

    let mut session = AssistantSession::new(
        history,
        provider,
        Box::new(SystemClipboard::new()),
        io::stdout(),
        SessionOptions::from(&config),
    );

    session.run(io::stdin().lock()).await
}
