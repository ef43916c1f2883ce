//! The location graph and player navigation.
//!
//! Locations form a small hand-authored graph connected by compass exits.
//! The graph is validated once when the [`World`] is built and never
//! changes afterwards; the only mutable state is where the player stands.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Where every new game starts.
pub const START_LOCATION: &str = "village_center";

// ============================================================================
// Directions
// ============================================================================

/// A compass direction the player can move in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Render the exit sentence for a list of directions, in the order given.
pub fn describe_exits(exits: &[Direction]) -> String {
    match exits {
        [] => "There are no obvious exits.".to_string(),
        [only] => format!("There is an exit to the {only}."),
        [first, second] => format!("There are exits to the {first} and {second}."),
        [init @ .., last] => {
            let head = init
                .iter()
                .map(Direction::name)
                .collect::<Vec<_>>()
                .join(", ");
            format!("There are exits to the {head} and {last}.")
        }
    }
}

// ============================================================================
// Locations
// ============================================================================

/// A place in the world.
#[derive(Debug, Clone)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub description: String,
    exits: Vec<(Direction, String)>,
}

impl Location {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            exits: Vec::new(),
        }
    }

    /// Add an exit. A second exit in the same direction replaces the first.
    pub fn with_exit(mut self, direction: Direction, destination: impl Into<String>) -> Self {
        let destination = destination.into();
        match self.exits.iter_mut().find(|(d, _)| *d == direction) {
            Some(exit) => exit.1 = destination,
            None => self.exits.push((direction, destination)),
        }
        self
    }

    /// Destination for a direction, if there is an exit that way.
    pub fn exit(&self, direction: Direction) -> Option<&str> {
        self.exits
            .iter()
            .find(|(d, _)| *d == direction)
            .map(|(_, id)| id.as_str())
    }

    /// Exits in the order they were added.
    pub fn exits(&self) -> impl Iterator<Item = (Direction, &str)> {
        self.exits.iter().map(|(d, id)| (*d, id.as_str()))
    }

    pub fn exit_directions(&self) -> Vec<Direction> {
        self.exits.iter().map(|(d, _)| *d).collect()
    }

    pub fn describe_exits(&self) -> String {
        describe_exits(&self.exit_directions())
    }

    /// Full description: name, prose, and exits.
    pub fn render(&self) -> String {
        format!(
            "{}\n\n{}\n\n{}",
            self.name,
            self.description,
            self.describe_exits()
        )
    }
}

// ============================================================================
// World
// ============================================================================

/// Errors from building a world.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("Location '{0}' is defined more than once")]
    DuplicateLocation(String),

    #[error("Exit {direction} from '{from}' leads to unknown location '{to}'")]
    DanglingExit {
        from: String,
        direction: Direction,
        to: String,
    },

    #[error("Start location '{0}' does not exist")]
    UnknownStart(String),
}

/// Why a move failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("You can't go {0} from here.")]
    NoExit(Direction),

    #[error("That path seems to be blocked.")]
    Blocked,
}

/// The location graph plus the player's position in it.
#[derive(Debug, Clone)]
pub struct World {
    locations: HashMap<String, Location>,
    current: String,
}

impl World {
    /// Build a world, checking that every exit leads somewhere real.
    pub fn new(
        locations: impl IntoIterator<Item = Location>,
        start: impl Into<String>,
    ) -> Result<Self, WorldError> {
        let mut map = HashMap::new();
        for location in locations {
            if map.contains_key(&location.id) {
                return Err(WorldError::DuplicateLocation(location.id));
            }
            map.insert(location.id.clone(), location);
        }

        for location in map.values() {
            for (direction, to) in location.exits() {
                if !map.contains_key(to) {
                    return Err(WorldError::DanglingExit {
                        from: location.id.clone(),
                        direction,
                        to: to.to_string(),
                    });
                }
            }
        }

        let start = start.into();
        if !map.contains_key(&start) {
            return Err(WorldError::UnknownStart(start));
        }

        Ok(Self {
            locations: map,
            current: start,
        })
    }

    pub fn location(&self, id: &str) -> Option<&Location> {
        self.locations.get(id)
    }

    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    pub fn current_id(&self) -> &str {
        &self.current
    }

    pub fn current(&self) -> &Location {
        // `current` is only ever set to a key that exists.
        &self.locations[&self.current]
    }

    /// Description of where the player stands.
    pub fn describe_current(&self) -> String {
        self.current().render()
    }

    /// Try to move in a direction. On failure the player stays put.
    pub fn move_to(&mut self, direction: Direction) -> Result<&Location, MoveError> {
        let destination = self
            .current()
            .exit(direction)
            .ok_or(MoveError::NoExit(direction))?
            .to_string();

        if !self.locations.contains_key(&destination) {
            return Err(MoveError::Blocked);
        }

        self.current = destination;
        Ok(self.current())
    }
}

/// The village map every game is played on.
pub fn default_locations() -> Vec<Location> {
    use Direction::*;

    vec![
        Location::new(
            "village_center",
            "Village Center",
            "You are in the heart of a peaceful village. A stone fountain sits in the center, \
             surrounded by cobblestone paths. Cozy houses with thatched roofs line the square, \
             and you can hear the gentle chatter of villagers going about their daily lives.",
        )
        .with_exit(North, "ancient_library")
        .with_exit(East, "market_square")
        .with_exit(South, "enchanted_forest")
        .with_exit(West, "crystal_cave"),
        Location::new(
            "ancient_library",
            "Ancient Library",
            "You stand in a grand library with towering shelves that reach up to vaulted ceilings. \
             Thousands of books, scrolls, and manuscripts are carefully organized here. \
             Dust motes dance in shafts of sunlight streaming through tall windows. \
             The air smells of old parchment and leather bindings.",
        )
        .with_exit(South, "village_center")
        .with_exit(East, "wizard_tower"),
        Location::new(
            "market_square",
            "Market Square",
            "A bustling marketplace filled with colorful stalls and the sounds of commerce. \
             Merchants display their wares on wooden tables covered with bright cloth. \
             The aroma of fresh bread, exotic spices, and roasted nuts fills the air. \
             People from near and far come here to trade and socialize.",
        )
        .with_exit(West, "village_center")
        .with_exit(North, "wizard_tower")
        .with_exit(South, "riverside_dock"),
        Location::new(
            "enchanted_forest",
            "Enchanted Forest",
            "You enter a magical forest where ancient trees tower overhead, their branches \
             intertwining to form a natural cathedral. Soft, ethereal light filters through \
             the canopy, and you can hear the gentle whisper of leaves and distant bird songs. \
             There's a sense of old magic in the air here.",
        )
        .with_exit(North, "village_center")
        .with_exit(East, "riverside_dock")
        .with_exit(West, "moonlit_grove"),
        Location::new(
            "crystal_cave",
            "Crystal Cave",
            "You are inside a stunning crystal cave where the walls sparkle with embedded gems. \
             Soft, multicolored light emanates from the crystals, creating a dreamlike atmosphere. \
             The cave is surprisingly warm, and there's a gentle humming sound that seems to \
             come from the crystals themselves.",
        )
        .with_exit(East, "village_center")
        .with_exit(South, "moonlit_grove"),
        Location::new(
            "wizard_tower",
            "Wizard Tower",
            "You stand at the base of a tall, spiraling tower made of dark stone. \
             Strange symbols are carved into the walls, and an aura of magic surrounds the place. \
             Through windows high above, you can see the flicker of candlelight and \
             occasionally, colorful magical sparks.",
        )
        .with_exit(West, "ancient_library")
        .with_exit(South, "market_square"),
        Location::new(
            "riverside_dock",
            "Riverside Dock",
            "A peaceful wooden dock extends into a clear, flowing river. \
             Small boats are moored here, gently bobbing in the current. \
             You can hear the soothing sound of water lapping against the dock, \
             and fish occasionally jump, creating ripples in the water.",
        )
        .with_exit(North, "market_square")
        .with_exit(West, "enchanted_forest"),
        Location::new(
            "moonlit_grove",
            "Moonlit Grove",
            "A circular clearing in the forest where moonlight seems to shine even during the day. \
             Ancient standing stones are arranged in a circle, covered with glowing runes. \
             The grass here is unusually soft and green, and there's a sense of timeless peace. \
             This feels like a place where magic and nature are one.",
        )
        .with_exit(North, "crystal_cave")
        .with_exit(East, "enchanted_forest"),
    ]
}

impl World {
    /// The standard village world, starting in the village center.
    pub fn village() -> Result<Self, WorldError> {
        Self::new(default_locations(), START_LOCATION)
    }
}
