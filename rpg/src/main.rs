//! AI RPG console application.
//!
//! Explore a small village and chat with characters voiced by any
//! OpenAI-compatible provider.
//!
//! ```bash
//! cp .env.example .env    # then fill in RPG_API_KEY
//! cargo run -p rpg
//! cargo run -p rpg -- --provider kimi --model moonshot-v1-8k --debug
//! cargo run -p rpg -- --check
//! ```

mod console;

use clap::Parser;
use rpg_core::config::{self, Config, ConfigError};
use rpg_core::Game;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "rpg", version, about = "Explore a village and chat with AI-driven characters")]
struct Cli {
    /// AI provider (openai, kimi, deepseek, zhipu, qwen). Overrides RPG_PROVIDER.
    #[arg(long)]
    provider: Option<String>,

    /// Model identifier. Overrides RPG_MODEL.
    #[arg(long)]
    model: Option<String>,

    /// Maximum reply length in characters. Overrides RPG_MAX_RESPONSE_LENGTH.
    #[arg(long = "max-length")]
    max_length: Option<usize>,

    /// Show remote errors and verbose logs. Overrides RPG_DEBUG.
    #[arg(long)]
    debug: bool,

    /// Send one test message to the configured provider and exit.
    #[arg(long)]
    check: bool,

    /// List supported providers and exit.
    #[arg(long)]
    providers: bool,
}

impl Cli {
    /// Command-line value for a configuration key, if one was given.
    fn override_for(&self, key: &str) -> Option<String> {
        match key {
            config::ENV_PROVIDER => self.provider.clone(),
            config::ENV_MODEL => self.model.clone(),
            config::ENV_MAX_RESPONSE_LENGTH => self.max_length.map(|n| n.to_string()),
            config::ENV_DEBUG if self.debug => Some("true".to_string()),
            _ => None,
        }
    }

    fn load_config(&self) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| self.override_for(key).or_else(|| std::env::var(key).ok()))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.providers {
        console::print_providers();
        return ExitCode::SUCCESS;
    }

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            eprintln!(
                "Copy .env.example to .env and edit it, or run `rpg --providers` for options."
            );
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.debug);

    let client = config.client();
    info!(
        provider = config.provider.description(),
        model = %config.model,
        endpoint = client.base_url(),
        "initialized chat client"
    );
    if !config.model_is_suggested() {
        warn!(
            provider = %config.provider,
            model = %config.model,
            "model is not in the provider's suggested list"
        );
    }

    if cli.check {
        return console::run_check(&config, client).await;
    }

    let game = match Game::village(&config, client) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("Failed to create game: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = console::run(game, config.debug).await {
        eprintln!("Fatal error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Logs go to stderr so they never mix with game text.
fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "warn,rpg=debug,rpg_core=debug,chat=debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_environment_keys() {
        let cli = Cli::parse_from([
            "rpg",
            "--provider",
            "kimi",
            "--max-length",
            "80",
            "--debug",
        ]);
        assert_eq!(cli.override_for(config::ENV_PROVIDER).as_deref(), Some("kimi"));
        assert_eq!(cli.override_for(config::ENV_MAX_RESPONSE_LENGTH).as_deref(), Some("80"));
        assert_eq!(cli.override_for(config::ENV_DEBUG).as_deref(), Some("true"));
        assert_eq!(cli.override_for(config::ENV_MODEL), None);
        assert_eq!(cli.override_for(config::ENV_API_KEY), None);
    }

    #[test]
    fn test_debug_flag_absent_defers_to_environment() {
        let cli = Cli::parse_from(["rpg"]);
        assert_eq!(cli.override_for(config::ENV_DEBUG), None);
        assert!(!cli.check);
        assert!(!cli.providers);
    }
}
