use serde::Serialize;

use super::info::{HeroArtifacts, SecondarySkill};
use super::Position;
use crate::codec::ObjectCategory;

/// Shared description of one kind of placeable object ("template").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectAttribute {
    pub def: String,
    /// One byte per footprint row, bit set = walkable.
    pub passable: [u8; 6],
    /// One byte per footprint row, bit set = visitable entrance.
    pub active: [u8; 6],
    pub allowed_landscapes: u16,
    pub landscape_group: u16,
    pub object_class: u32,
    pub object_number: u32,
    pub object_group: u8,
    pub above: u8,
}

impl ObjectAttribute {
    pub const FOOTPRINT_ROWS: usize = 6;
    pub const FOOTPRINT_COLS: usize = 8;

    /// `[row][col]`, true where the cell can be walked over. Rows and
    /// columns count from the object's bottom-right anchor.
    pub fn passability_matrix(&self) -> [[bool; 8]; 6] {
        mask_matrix(&self.passable)
    }

    /// `[row][col]`, true where the cell triggers a visit.
    pub fn interaction_matrix(&self) -> [[bool; 8]; 6] {
        mask_matrix(&self.active)
    }

    pub fn is_blocked(&self, row: usize, col: usize) -> bool {
        self.passable[row] & (1 << col) == 0
    }

    pub fn is_entrance(&self, row: usize, col: usize) -> bool {
        self.active[row] & (1 << col) != 0
    }
}

fn mask_matrix(mask: &[u8; 6]) -> [[bool; 8]; 6] {
    let mut matrix = [[false; 8]; 6];
    for (row, bits) in matrix.iter_mut().zip(mask) {
        for (col, cell) in row.iter_mut().enumerate() {
            *cell = (bits >> col) & 1 != 0;
        }
    }
    matrix
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreatureStack {
    pub id: u16,
    pub count: u16,
}

/// Optional message with an optional guard army, shared by several bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Guarded {
    pub message: String,
    pub guards: Option<Vec<CreatureStack>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonsterBody {
    pub identifier: Option<u32>,
    pub count: u16,
    pub disposition: u8,
    pub message: Option<String>,
    pub resources: Option<[i32; 7]>,
    pub artifact: Option<u16>,
    pub never_flees: bool,
    pub not_growing: bool,
    pub aggression: Option<i32>,
    pub join_only_for_money: Option<bool>,
    pub join_percent: Option<i32>,
    pub upgraded_stack: Option<i32>,
    pub stack_count: Option<i32>,
}

/// Contents of Pandora's boxes and events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoxContent {
    pub guard: Option<Guarded>,
    pub experience: u32,
    pub mana: i32,
    pub morale: i8,
    pub luck: i8,
    pub resources: [i32; 7],
    pub primary_skills: [u8; 4],
    pub secondary_skills: Vec<SecondarySkill>,
    pub artifacts: Vec<u16>,
    pub spells: Vec<u8>,
    pub creatures: Vec<CreatureStack>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventBody {
    pub content: BoxContent,
    pub players: u8,
    pub computer_activates: bool,
    pub remove_after_visit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TownBuildings {
    Custom { built: [u8; 6], forbidden: [u8; 6] },
    Default { has_fort: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TownEvent {
    pub name: String,
    pub message: String,
    pub resources: [i32; 7],
    pub players: u8,
    pub human_affected: Option<bool>,
    pub computer_affected: bool,
    pub first_occurrence: u16,
    pub next_occurrence: u8,
    pub buildings: [u8; 6],
    pub creatures: [u16; 7],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TownBody {
    pub identifier: Option<u32>,
    pub owner: u32,
    pub name: Option<String>,
    pub garrison: Option<Vec<CreatureStack>>,
    pub formation: u8,
    pub buildings: TownBuildings,
    pub obligatory_spells: Option<[u8; 9]>,
    pub possible_spells: [u8; 9],
    pub events: Vec<TownEvent>,
    pub alignment: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeroBody {
    pub identifier: Option<u32>,
    pub owner: u8,
    pub hero_type: u8,
    pub name: Option<String>,
    pub experience: Option<u32>,
    pub portrait: Option<u8>,
    pub secondary_skills: Option<Vec<SecondarySkill>>,
    pub garrison: Option<Vec<CreatureStack>>,
    pub formation: u8,
    pub artifacts: Option<HeroArtifacts>,
    pub patrol_radius: u8,
    pub biography: Option<String>,
    pub gender: Option<u8>,
    /// Full spell bitmask (SoD and later).
    pub spells: Option<[u8; 9]>,
    /// Single starting spell (AB only).
    pub spell: Option<u8>,
    pub primary_skills: Option<[u8; 4]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GarrisonBody {
    pub owner: u32,
    pub guards: Vec<CreatureStack>,
    pub removable: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RandomDwellingBody {
    pub owner: u32,
    pub town_id: Option<u32>,
    pub alignments: Option<u16>,
    pub min_level: Option<u8>,
    pub max_level: Option<u8>,
}

/// Category-specific payload following an object's placement header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ObjectBody {
    Empty,
    Monster(MonsterBody),
    Artifact { guard: Option<Guarded>, spell: Option<u32> },
    Resource { guard: Option<Guarded>, amount: u32 },
    PandorasBox(BoxContent),
    Event(EventBody),
    Town(TownBody),
    Hero(HeroBody),
    Sign { message: String },
    Garrison(GarrisonBody),
    Scholar { bonus_type: u8, bonus_id: u8 },
    Owned { owner: u32 },
    AbandonedMine { resources: u8 },
    RandomDwelling(RandomDwellingBody),
    Grail { radius: u32 },
    Shrine { spell: u32 },
    WitchHut { skills: Option<u32> },
    PlaceholderHero { owner: u8, hero_type: u8, power_rank: Option<u8> },
}

impl ObjectBody {
    fn guard(&self) -> Option<&Guarded> {
        match self {
            Self::Artifact { guard, .. } | Self::Resource { guard, .. } => guard.as_ref(),
            Self::PandorasBox(content) | Self::Event(EventBody { content, .. }) => {
                content.guard.as_ref()
            }
            _ => None,
        }
    }

    pub fn owner(&self) -> Option<u32> {
        match self {
            Self::Town(t) => Some(t.owner),
            Self::Hero(h) => Some(h.owner as u32),
            Self::Garrison(g) => Some(g.owner),
            Self::Owned { owner } => Some(*owner),
            Self::RandomDwelling(d) => Some(d.owner),
            Self::PlaceholderHero { owner, .. } => Some(*owner as u32),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Monster(m) => m.message.as_deref(),
            Self::Sign { message } => Some(message),
            _ => self.guard().map(|g| g.message.as_str()),
        }
    }

    pub fn guards(&self) -> &[CreatureStack] {
        match self {
            Self::Town(TownBody { garrison: Some(g), .. })
            | Self::Hero(HeroBody { garrison: Some(g), .. }) => g,
            Self::Garrison(g) => &g.guards,
            _ => self
                .guard()
                .and_then(|g| g.guards.as_deref())
                .unwrap_or(&[]),
        }
    }

    pub fn quantity(&self) -> Option<u32> {
        match self {
            Self::Monster(m) => Some(m.count as u32),
            Self::Resource { amount, .. } => Some(*amount),
            _ => None,
        }
    }

    pub fn experience(&self) -> Option<u32> {
        match self {
            Self::PandorasBox(c) => Some(c.experience),
            Self::Event(e) => Some(e.content.experience),
            Self::Hero(h) => h.experience,
            _ => None,
        }
    }

    pub fn resources(&self) -> Option<&[i32; 7]> {
        match self {
            Self::Monster(m) => m.resources.as_ref(),
            Self::PandorasBox(c) => Some(&c.resources),
            Self::Event(e) => Some(&e.content.resources),
            _ => None,
        }
    }
}

/// One placed object. The template is referenced by index into
/// `Map::templates` and resolved with `Map::template_of`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapObject {
    pub position: Position,
    pub template_index: u32,
    pub category: ObjectCategory,
    pub body: ObjectBody,
}
