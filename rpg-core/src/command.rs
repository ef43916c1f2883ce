//! Command parsing for player input.
//!
//! Every accepted surface word, English or Chinese, maps to exactly one
//! canonical [`Verb`] through [`VOCABULARY`]. Parsing is then a single
//! match on the verb.

use crate::world::Direction;

/// Canonical command kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Quit,
    Help,
    Look,
    Where,
    Characters,
    Go,
    Walk(Direction),
    Talk,
    Say,
}

/// Surface word → verb.
pub const VOCABULARY: &[(&str, Verb)] = &[
    ("quit", Verb::Quit),
    ("q", Verb::Quit),
    ("exit", Verb::Quit),
    ("退出", Verb::Quit),
    ("再见", Verb::Quit),
    ("help", Verb::Help),
    ("h", Verb::Help),
    ("帮助", Verb::Help),
    ("命令", Verb::Help),
    ("look", Verb::Look),
    ("l", Verb::Look),
    ("看", Verb::Look),
    ("查看", Verb::Look),
    ("观察", Verb::Look),
    ("where", Verb::Where),
    ("位置", Verb::Where),
    ("我在哪", Verb::Where),
    ("characters", Verb::Characters),
    ("chars", Verb::Characters),
    ("npc", Verb::Characters),
    ("角色", Verb::Characters),
    ("人物", Verb::Characters),
    ("go", Verb::Go),
    ("move", Verb::Go),
    ("走", Verb::Go),
    ("去", Verb::Go),
    ("移动", Verb::Go),
    ("talk", Verb::Talk),
    ("说", Verb::Talk),
    ("聊", Verb::Talk),
    ("对话", Verb::Talk),
    ("交谈", Verb::Talk),
    ("say", Verb::Say),
    ("讲", Verb::Say),
];

/// Surface word → direction. Used both as a bare command and after `go`.
pub const DIRECTIONS: &[(&str, Direction)] = &[
    ("north", Direction::North),
    ("n", Direction::North),
    ("北", Direction::North),
    ("上", Direction::North),
    ("south", Direction::South),
    ("s", Direction::South),
    ("南", Direction::South),
    ("下", Direction::South),
    ("east", Direction::East),
    ("e", Direction::East),
    ("东", Direction::East),
    ("右", Direction::East),
    ("west", Direction::West),
    ("w", Direction::West),
    ("西", Direction::West),
    ("左", Direction::West),
];

/// Greeting used when `talk` names a character but says nothing.
pub const DEFAULT_GREETING: &str = "Hello";

/// Resolve a direction word.
pub fn parse_direction(word: &str) -> Option<Direction> {
    let word = word.trim().to_lowercase();
    DIRECTIONS
        .iter()
        .find(|(token, _)| *token == word)
        .map(|(_, d)| *d)
}

/// Resolve a command word.
pub fn parse_verb(word: &str) -> Option<Verb> {
    let word = word.trim().to_lowercase();
    VOCABULARY
        .iter()
        .find(|(token, _)| *token == word)
        .map(|(_, v)| *v)
        .or_else(|| parse_direction(&word).map(Verb::Walk))
}

/// A parsed player command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    Look,
    Where,
    Characters,
    Move(Direction),
    /// `go` followed by a word that is not a direction.
    UnknownDirection(String),
    /// `go` with nothing after it.
    MissingDirection,
    Talk {
        character: String,
        message: String,
    },
    /// `talk` with no character named.
    MissingTarget,
    /// Speak to whoever is present.
    ///
    /// A bare `say` carries [`DEFAULT_GREETING`] rather than an empty
    /// message, so the model always has something to answer.
    Say {
        message: String,
    },
    Unknown(String),
    Empty,
}

/// Parse a line of player input.
///
/// The first word and a character id are case-folded; message text keeps
/// the player's own casing.
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let Some(first) = input.split_whitespace().next() else {
        return Command::Empty;
    };
    let rest = input[first.len()..].trim_start();
    let verb_word = first.to_lowercase();

    let Some(verb) = parse_verb(&verb_word) else {
        return Command::Unknown(verb_word);
    };

    match verb {
        Verb::Quit => Command::Quit,
        Verb::Help => Command::Help,
        Verb::Look => Command::Look,
        Verb::Where => Command::Where,
        Verb::Characters => Command::Characters,
        Verb::Walk(direction) => Command::Move(direction),
        Verb::Go => match rest.split_whitespace().next() {
            None => Command::MissingDirection,
            Some(word) => match parse_direction(word) {
                Some(direction) => Command::Move(direction),
                None => Command::UnknownDirection(word.to_lowercase()),
            },
        },
        Verb::Talk => {
            let Some(target) = rest.split_whitespace().next() else {
                return Command::MissingTarget;
            };
            let message = rest[target.len()..].trim();
            Command::Talk {
                character: target.to_lowercase(),
                message: if message.is_empty() {
                    DEFAULT_GREETING.to_string()
                } else {
                    message.to_string()
                },
            }
        }
        Verb::Say => Command::Say {
            message: if rest.is_empty() {
                DEFAULT_GREETING.to_string()
            } else {
                rest.to_string()
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_token_is_unique() {
        let mut words: Vec<&str> = VOCABULARY.iter().map(|(w, _)| *w).collect();
        words.extend(DIRECTIONS.iter().map(|(w, _)| *w));
        let total = words.len();
        words.sort();
        words.dedup();
        assert_eq!(words.len(), total);
    }

    #[test]
    fn test_bilingual_synonyms() {
        assert_eq!(parse_command("quit"), Command::Quit);
        assert_eq!(parse_command("退出"), Command::Quit);
        assert_eq!(parse_command("  LOOK  "), Command::Look);
        assert_eq!(parse_command("看"), Command::Look);
        assert_eq!(parse_command("我在哪"), Command::Where);
        assert_eq!(parse_command("角色"), Command::Characters);
        assert_eq!(parse_command("帮助"), Command::Help);
    }

    #[test]
    fn test_movement() {
        assert_eq!(parse_command("north"), Command::Move(Direction::North));
        assert_eq!(parse_command("N"), Command::Move(Direction::North));
        assert_eq!(parse_command("北"), Command::Move(Direction::North));
        assert_eq!(parse_command("左"), Command::Move(Direction::West));
        assert_eq!(parse_command("go east"), Command::Move(Direction::East));
        assert_eq!(parse_command("走 南"), Command::Move(Direction::South));
        assert_eq!(parse_command("go"), Command::MissingDirection);
        assert_eq!(
            parse_command("go Upward"),
            Command::UnknownDirection("upward".to_string())
        );
    }

    #[test]
    fn test_talk() {
        assert_eq!(
            parse_command("talk Elder How are you?"),
            Command::Talk {
                character: "elder".to_string(),
                message: "How are you?".to_string(),
            }
        );
        assert_eq!(
            parse_command("说 elder"),
            Command::Talk {
                character: "elder".to_string(),
                message: DEFAULT_GREETING.to_string(),
            }
        );
        assert_eq!(parse_command("talk"), Command::MissingTarget);
    }

    #[test]
    fn test_say() {
        assert_eq!(
            parse_command("say Nice weather"),
            Command::Say {
                message: "Nice weather".to_string()
            }
        );
        assert_eq!(
            parse_command("讲"),
            Command::Say {
                message: DEFAULT_GREETING.to_string()
            }
        );
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!(parse_command("Dance wildly"), Command::Unknown("dance".to_string()));
        assert_eq!(parse_command("   "), Command::Empty);
    }
}
