use serde::Serialize;

use super::Position;

/// Hero type byte meaning "no lead hero".
pub const NO_HERO: u8 = 0xFF;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Player {
    pub id: u8,
    pub can_be_human: bool,
    pub can_be_computer: bool,
    pub behavior: u8,
    pub allowed_alignments: Option<u8>,
    pub allowed_factions: u16,
    pub random_faction: bool,
    pub main_town: Option<MainTown>,
    pub has_random_hero: bool,
    pub main_hero: Option<MainHero>,
    pub heroes: Vec<PlayerHero>,
}

impl Player {
    /// A slot that neither a human nor the AI can take.
    pub fn stub(id: u8) -> Self {
        Self { id, ..Default::default() }
    }

    pub fn is_playable(&self) -> bool {
        self.can_be_human || self.can_be_computer
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MainTown {
    pub generate_hero: Option<bool>,
    pub town_type: Option<u8>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MainHero {
    pub hero_type: u8,
    pub portrait: u8,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerHero {
    pub hero_type: u8,
    pub name: String,
}
