//! AI-driven characters and the registry that holds them.
//!
//! Each character lives at a fixed home location and remembers a short
//! rolling window of what the player said to them.

use crate::world::World;
use std::collections::VecDeque;
use thiserror::Error;

/// Maximum number of dialogue turns a character remembers.
pub const MAX_HISTORY: usize = 5;

/// Number of remembered turns included in the prompt context.
pub const CONTEXT_TURNS: usize = 3;

/// One exchange between the player and a character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueTurn {
    pub player: String,
    pub reply: String,
}

/// A scripted persona bound to a home location.
#[derive(Debug, Clone)]
pub struct Character {
    pub id: String,
    pub name: String,
    /// What the player sees when looking around.
    pub description: String,
    /// How the character behaves; fed to the model.
    pub personality: String,
    pub home: String,
    history: VecDeque<DialogueTurn>,
}

impl Character {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        personality: impl Into<String>,
        home: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            personality: personality.into(),
            home: home.into(),
            history: VecDeque::with_capacity(MAX_HISTORY + 1),
        }
    }

    /// Line shown when the player looks around.
    pub fn presence(&self) -> String {
        if self.description.is_empty() {
            format!("{} is here.", self.name)
        } else {
            format!("{} is here. {}", self.name, self.description)
        }
    }

    /// Remember a turn, forgetting the oldest once the window is full.
    pub fn record_turn(&mut self, player: impl Into<String>, reply: impl Into<String>) {
        self.history.push_back(DialogueTurn {
            player: player.into(),
            reply: reply.into(),
        });
        while self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }
    }

    /// Remembered turns, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &DialogueTurn> {
        self.history.iter()
    }

    /// Recent turns formatted for the prompt; empty when nothing was said yet.
    pub fn conversation_context(&self) -> String {
        if self.history.is_empty() {
            return String::new();
        }

        let skip = self.history.len().saturating_sub(CONTEXT_TURNS);
        let mut context = String::from("Recent conversation history:\n");
        for turn in self.history.iter().skip(skip) {
            context.push_str(&format!("Player: {}\n", turn.player));
            context.push_str(&format!("{}: {}\n", self.name, turn.reply));
        }
        context
    }
}

/// Errors from registering characters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Character '{0}' is already registered")]
    Duplicate(String),

    #[error("Character '{id}' lives at unknown location '{home}'")]
    UnknownHome { id: String, home: String },
}

/// All characters in the game, in registration order.
#[derive(Debug, Clone, Default)]
pub struct CharacterRegistry {
    characters: Vec<Character>,
}

impl CharacterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four villagers every game starts with.
    pub fn village() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for character in default_roster() {
            registry.register(character)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, character: Character) -> Result<(), RegistryError> {
        if self.get(&character.id).is_some() {
            return Err(RegistryError::Duplicate(character.id));
        }
        self.characters.push(character);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.id == id)
    }

    /// Every character's home must be a location in `world`.
    pub fn check_homes(&self, world: &World) -> Result<(), RegistryError> {
        match self.characters.iter().find(|c| world.location(&c.home).is_none()) {
            Some(c) => Err(RegistryError::UnknownHome {
                id: c.id.clone(),
                home: c.home.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Characters whose home is the given location.
    pub fn in_location<'a>(&'a self, location: &'a str) -> impl Iterator<Item = &'a Character> {
        self.characters.iter().filter(move |c| c.home == location)
    }

    pub fn all(&self) -> &[Character] {
        &self.characters
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

fn default_roster() -> Vec<Character> {
    vec![
        Character::new(
            "elder",
            "Village Elder",
            "A wise and kind elder who has lived in this village for decades. \
             He knows many stories and is always willing to help travelers.",
            "The elder is a friendly, wise person who speaks with warmth and offers guidance. \
             He has seen many adventurers come and go, and enjoys sharing wisdom and stories.",
            "village_center",
        ),
        Character::new(
            "merchant",
            "Mysterious Merchant",
            "A traveling merchant with an air of mystery about them. \
             They seem to have exotic goods and knowledge from far-off lands.",
            "The merchant is enigmatic and speaks in riddles sometimes. \
             They are knowledgeable about rare items and distant places, \
             but also enjoy being cryptic and mysterious in their responses.",
            "market_square",
        ),
        Character::new(
            "guardian",
            "Forest Guardian",
            "An ancient being who protects the forest and its creatures. \
             They have a deep connection with nature.",
            "The guardian is deeply connected to nature and speaks with reverence for all living things. \
             They are protective of the forest but kind to those who respect nature. \
             They often speak in metaphors related to plants, animals, and natural cycles.",
            "enchanted_forest",
        ),
        Character::new(
            "scholar",
            "Curious Scholar",
            "A young scholar who is always eager to learn new things. \
             They carry books and seem fascinated by knowledge of all kinds.",
            "The scholar is enthusiastic about learning and discovery. \
             They ask lots of questions, share interesting facts, and get excited about new knowledge. \
             They are friendly but can get carried away talking about their studies.",
            "ancient_library",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elder() -> Character {
        Character::new("elder", "Village Elder", "", "Wise.", "village_center")
    }

    #[test]
    fn test_history_is_capped() {
        let mut character = elder();
        for i in 1..=6 {
            character.record_turn(format!("q{i}"), format!("a{i}"));
        }

        let players: Vec<_> = character.history().map(|t| t.player.as_str()).collect();
        assert_eq!(players, vec!["q2", "q3", "q4", "q5", "q6"]);
        assert_eq!(character.history().len(), MAX_HISTORY);
    }

    #[test]
    fn test_context_uses_last_three_turns() {
        let mut character = elder();
        assert_eq!(character.conversation_context(), "");

        for i in 1..=5 {
            character.record_turn(format!("q{i}"), format!("a{i}"));
        }
        let context = character.conversation_context();

        assert!(context.starts_with("Recent conversation history:\n"));
        assert!(!context.contains("q2"));
        assert!(context.contains("Player: q3\nVillage Elder: a3\n"));
        assert!(context.ends_with("Player: q5\nVillage Elder: a5\n"));
    }

    #[test]
    fn test_presence_line() {
        assert_eq!(elder().presence(), "Village Elder is here.");
        let registry = CharacterRegistry::village().unwrap();
        let merchant = registry.get("merchant").unwrap();
        assert!(merchant
            .presence()
            .starts_with("Mysterious Merchant is here. A traveling merchant"));
    }

    #[test]
    fn test_village_roster() {
        let registry = CharacterRegistry::village().unwrap();
        assert_eq!(registry.len(), 4);

        let here: Vec<_> = registry
            .in_location("village_center")
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(here, vec!["elder"]);
        assert_eq!(registry.in_location("crystal_cave").count(), 0);
    }

    #[test]
    fn test_roster_homes_exist() {
        let world = World::village().unwrap();
        assert_eq!(CharacterRegistry::village().unwrap().check_homes(&world), Ok(()));
    }

    #[test]
    fn test_unknown_home_rejected() {
        let world = World::village().unwrap();
        let mut registry = CharacterRegistry::new();
        registry
            .register(Character::new("hermit", "Hermit", "", "Quiet.", "mountain_top"))
            .unwrap();
        assert_eq!(
            registry.check_homes(&world),
            Err(RegistryError::UnknownHome {
                id: "hermit".to_string(),
                home: "mountain_top".to_string(),
            })
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = CharacterRegistry::new();
        registry.register(elder()).unwrap();
        assert_eq!(
            registry.register(elder()),
            Err(RegistryError::Duplicate("elder".to_string()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_recording_one_character_leaves_others_alone() {
        let mut registry = CharacterRegistry::village().unwrap();
        registry
            .get_mut("elder")
            .unwrap()
            .record_turn("hello", "welcome");

        assert_eq!(registry.get("elder").unwrap().history().len(), 1);
        assert_eq!(registry.get("scholar").unwrap().history().len(), 0);
    }
}
