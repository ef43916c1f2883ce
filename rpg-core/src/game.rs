//! The game itself: world, characters, and dialogue behind one command
//! entry point.
//!
//! [`Game::handle_command`] takes one line of player input, writes
//! everything the player should see to the given writer, and reports
//! whether the game should keep going. The console front end is a thin
//! loop around it.

use crate::character::{CharacterRegistry, RegistryError};
use crate::command::{parse_command, Command};
use crate::config::Config;
use crate::dialogue::{ChatBackend, DialogueAdapter, DialogueRequest};
use crate::world::{Direction, World, WorldError};
use std::io::{self, Write};
use thiserror::Error;
use tracing::debug;

/// Errors from running a command.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("World error: {0}")]
    World(#[from] WorldError),

    #[error("Character error: {0}")]
    Characters(#[from] RegistryError),
}

/// Whether the loop should keep reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

const RULE_WIDTH: usize = 60;

/// A single-player game session.
pub struct Game<B> {
    title: String,
    world: World,
    characters: CharacterRegistry,
    dialogue: DialogueAdapter<B>,
}

impl<B: ChatBackend> Game<B> {
    pub fn new(config: &Config, world: World, characters: CharacterRegistry, backend: B) -> Self {
        Self {
            title: config.game_title.clone(),
            world,
            characters,
            dialogue: DialogueAdapter::new(backend, config.max_response_length),
        }
    }

    /// The standard village with its four residents.
    pub fn village(config: &Config, backend: B) -> Result<Self, GameError> {
        let world = World::village()?;
        let characters = CharacterRegistry::village()?;
        characters.check_homes(&world)?;
        Ok(Self::new(config, world, characters, backend))
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn characters(&self) -> &CharacterRegistry {
        &self.characters
    }

    pub fn dialogue(&self) -> &DialogueAdapter<B> {
        &self.dialogue
    }

    /// Run one line of player input.
    pub async fn handle_command<W: Write>(
        &mut self,
        line: &str,
        out: &mut W,
    ) -> Result<Flow, GameError> {
        let command = parse_command(line);
        debug!(?command, "handling command");

        match command {
            Command::Empty => {}
            Command::Quit => {
                write_farewell(out)?;
                return Ok(Flow::Quit);
            }
            Command::Help => write_help(out)?,
            Command::Look => self.look(out)?,
            Command::Where => {
                writeln!(out, "You are at: {}", self.world.current().name)?;
                writeln!(out)?;
            }
            Command::Characters => self.list_characters(out)?,
            Command::Move(direction) => self.move_player(direction, out)?,
            Command::UnknownDirection(word) => {
                writeln!(out, "You can't go {word} from here.")?;
                writeln!(out)?;
            }
            Command::MissingDirection => {
                writeln!(out, "Go where? (north/south/east/west or 北/南/东/西)")?;
                writeln!(out)?;
            }
            Command::Talk { character, message } => {
                self.talk_to(&character, &message, out).await?;
            }
            Command::MissingTarget => {
                writeln!(out, "Talk to whom? Use: talk <character> <message>")?;
                writeln!(out, "Or: 说 <character> <message>")?;
                writeln!(out)?;
            }
            Command::Say { message } => {
                let first_present = self
                    .characters
                    .in_location(self.world.current_id())
                    .next()
                    .map(|c| c.id.clone());
                match first_present {
                    Some(id) => self.talk_to(&id, &message, out).await?,
                    None => {
                        writeln!(out, "There's nobody here to talk to.")?;
                        writeln!(out)?;
                    }
                }
            }
            Command::Unknown(word) => {
                writeln!(out, "Unknown command: {word}")?;
                writeln!(out, "Type 'help' or '帮助' to see available commands.")?;
                writeln!(out)?;
            }
        }

        Ok(Flow::Continue)
    }

    /// Banner shown once at startup.
    pub fn write_welcome<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(out, "Welcome to {}!", self.title)?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(out)?;
        writeln!(out, "You are an adventurer who has just arrived in a mysterious realm.")?;
        writeln!(out, "Explore the world and chat with its AI-driven characters!")?;
        writeln!(out)?;
        writeln!(out, "Type 'help' or '帮助' to see available commands.")?;
        writeln!(out, "Type 'quit' or '退出' to leave the game.")?;
        writeln!(out)?;
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
        writeln!(out)?;
        Ok(())
    }

    /// Describe the current location and who is there.
    pub fn look<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", self.world.describe_current())?;

        let mut present = self
            .characters
            .in_location(self.world.current_id())
            .peekable();
        if present.peek().is_some() {
            writeln!(out)?;
            for character in present {
                writeln!(out, "* {}", character.presence())?;
            }
        }
        writeln!(out)?;
        Ok(())
    }

    fn list_characters<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut present = self
            .characters
            .in_location(self.world.current_id())
            .peekable();

        if present.peek().is_none() {
            writeln!(out, "There is nobody else here.")?;
        } else {
            writeln!(out, "Characters here:")?;
            for character in present {
                writeln!(
                    out,
                    "  - {} (talk {id} / 说 {id})",
                    character.name,
                    id = character.id
                )?;
            }
        }
        writeln!(out)?;
        Ok(())
    }

    fn move_player<W: Write>(&mut self, direction: Direction, out: &mut W) -> io::Result<()> {
        match self.world.move_to(direction) {
            Ok(location) => {
                debug!(to = %location.id, "player moved");
                writeln!(out, "You head {direction}.")?;
                writeln!(out)?;
                self.look(out)
            }
            Err(reason) => {
                writeln!(out, "{reason}")?;
                writeln!(out)?;
                Ok(())
            }
        }
    }

    /// Talk to a character at the current location.
    ///
    /// Every exchange is remembered, including fallback lines shown when the
    /// model fails or stays silent.
    pub async fn talk_to<W: Write>(
        &mut self,
        id: &str,
        message: &str,
        out: &mut W,
    ) -> Result<(), GameError> {
        let Some(character) = self.characters.get(id) else {
            writeln!(out, "There is nobody called '{id}' here.")?;
            writeln!(out)?;
            return Ok(());
        };

        if character.home != self.world.current_id() {
            writeln!(out, "{} is not here.", character.name)?;
            writeln!(out)?;
            return Ok(());
        }

        let name = character.name.clone();
        writeln!(out, "You say to {name}: \"{message}\"")?;
        writeln!(out)?;
        writeln!(out, "({name} is thinking...)")?;
        out.flush()?;

        let location = self.world.current();
        let mut context = format!("Currently at {}. {}", location.name, location.description);
        let history = character.conversation_context();
        if !history.is_empty() {
            context.push_str("\n\n");
            context.push_str(&history);
        }

        let reply = self
            .dialogue
            .respond(DialogueRequest {
                character_name: &character.name,
                personality: &character.personality,
                player_message: message,
                context: &context,
            })
            .await;

        writeln!(out, "{name}: \"{}\"", reply.text)?;
        writeln!(out)?;

        if let Some(character) = self.characters.get_mut(id) {
            character.record_turn(message, reply.text);
        }
        Ok(())
    }
}

/// The command reference.
pub fn write_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Available commands:")?;
    writeln!(out, "  look / 看                  - Look around the current location")?;
    writeln!(out, "  go <direction> / 走 <方向>  - Move (north/south/east/west or 北/南/东/西)")?;
    writeln!(out, "  talk <character> / 说 <角色> - Chat with an AI character")?;
    writeln!(out, "  say <message> / 讲 <消息>   - Speak to whoever is here")?;
    writeln!(out, "  characters / 角色          - List characters at this location")?;
    writeln!(out, "  where / 位置               - Show the current location")?;
    writeln!(out, "  help / 帮助                - Show this help")?;
    writeln!(out, "  quit / 退出                - Leave the game")?;
    writeln!(out)?;
    writeln!(out, "Examples:")?;
    writeln!(out, "  看                         - Look around")?;
    writeln!(out, "  北 or go north             - Move north")?;
    writeln!(out, "  说 elder 你好              - Greet the village elder")?;
    writeln!(out)?;
    Ok(())
}

/// Parting line for quit, end of input, or interrupt.
pub fn write_farewell<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Thanks for playing! Goodbye!")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBackend, TestGame};

    #[tokio::test]
    async fn test_quit_stops_the_loop() {
        let mut game = TestGame::new(MockBackend::new()).unwrap();
        let (text, flow) = game.run("退出").await.unwrap();
        assert_eq!(flow, Flow::Quit);
        assert!(text.contains("Goodbye"));
    }

    #[tokio::test]
    async fn test_empty_line_prints_nothing() {
        let mut game = TestGame::new(MockBackend::new()).unwrap();
        let (text, flow) = game.run("   ").await.unwrap();
        assert_eq!(flow, Flow::Continue);
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_where() {
        let mut game = TestGame::new(MockBackend::new()).unwrap();
        assert_eq!(game.say("where").await, "You are at: Village Center\n\n");
    }

    #[tokio::test]
    async fn test_characters_listing() {
        let mut game = TestGame::new(MockBackend::new()).unwrap();
        let text = game.say("characters").await;
        assert!(text.starts_with("Characters here:\n"));
        assert!(text.contains("Village Elder (talk elder / 说 elder)"));

        game.say("west").await;
        assert_eq!(game.say("角色").await, "There is nobody else here.\n\n");
    }

    #[tokio::test]
    async fn test_move_prints_new_location() {
        let mut game = TestGame::new(MockBackend::new()).unwrap();
        let text = game.say("go east").await;
        assert!(text.starts_with("You head east.\n\nMarket Square\n\n"));
        assert!(text.contains("* Mysterious Merchant is here."));
        assert_eq!(game.current_location(), "market_square");
    }

    #[tokio::test]
    async fn test_go_without_direction() {
        let mut game = TestGame::new(MockBackend::new()).unwrap();
        assert!(game.say("go").await.starts_with("Go where?"));
        assert!(game.say("go up-ish").await.starts_with("You can't go up-ish from here."));
        assert_eq!(game.current_location(), "village_center");
    }

    #[tokio::test]
    async fn test_say_picks_first_character_present() {
        let backend = MockBackend::new().reply("Greetings, young one.");
        let mut game = TestGame::new(backend).unwrap();
        let text = game.say("say good morning").await;
        assert!(text.contains("You say to Village Elder: \"good morning\""));
        assert!(text.contains("Village Elder: \"Greetings, young one.\""));
    }

    #[tokio::test]
    async fn test_say_with_nobody_around() {
        let mut game = TestGame::new(MockBackend::new()).unwrap();
        game.say("w").await;
        assert_eq!(game.say("say hi").await, "There's nobody here to talk to.\n\n");
        assert_eq!(game.backend_calls().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let mut game = TestGame::new(MockBackend::new()).unwrap();
        let text = game.say("dance").await;
        assert!(text.starts_with("Unknown command: dance\n"));
    }

    #[tokio::test]
    async fn test_help_and_welcome() {
        let mut game = TestGame::new(MockBackend::new()).unwrap();
        assert!(game.say("help").await.starts_with("Available commands:"));

        let mut banner = Vec::new();
        game.game.write_welcome(&mut banner).unwrap();
        let banner = String::from_utf8(banner).unwrap();
        assert!(banner.contains("Welcome to Test Game!"));
    }
}
