//! Text RPG engine with AI-driven characters.
//!
//! This crate provides:
//! - A fixed village map with compass movement
//! - Characters that answer through any OpenAI-compatible chat provider
//! - A bilingual (English/Chinese) command vocabulary
//! - A mock backend for deterministic tests
//!
//! # Quick Start
//!
//! ```ignore
//! use rpg_core::{Config, Game};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let mut game = Game::village(&config, config.client())?;
//!
//!     let mut out = std::io::stdout();
//!     game.handle_command("look", &mut out).await?;
//!     game.handle_command("talk elder hello", &mut out).await?;
//!     Ok(())
//! }
//! ```

pub mod character;
pub mod command;
pub mod config;
pub mod dialogue;
pub mod game;
pub mod testing;
pub mod world;

// Primary public API
pub use character::{Character, CharacterRegistry, DialogueTurn, RegistryError};
pub use command::{parse_command, Command};
pub use config::{Config, ConfigError, Provider};
pub use dialogue::{ChatBackend, DialogueAdapter, DialogueRequest, FailureKind, Reply, ReplyOutcome};
pub use game::{Flow, Game, GameError};
pub use testing::{MockBackend, TestGame};
pub use world::{describe_exits, Direction, Location, MoveError, World, WorldError};
