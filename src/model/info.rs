use serde::Serialize;

use super::Position;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum VictoryCondition {
    #[default]
    None,
    Special {
        allow_normal_victory: bool,
        applies_to_ai: bool,
        goal: VictoryGoal,
    },
}

impl VictoryCondition {
    pub const NONE_TAG: u8 = 0xFF;
}

/// Type-dependent payload of a special victory condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VictoryGoal {
    AcquireArtifact { artifact: u16 },
    AccumulateCreatures { creature: u16, count: u32 },
    AccumulateResources { resource: u8, amount: u32 },
    UpgradeTown { position: Position, hall_level: u8, castle_level: u8 },
    BuildGrail { position: Position },
    DefeatHero { position: Position },
    CaptureTown { position: Position },
    DefeatMonster { position: Position },
    FlagDwellings,
    FlagMines,
    TransportArtifact { artifact: u8, destination: Position },
    EliminateAllMonsters,
    SurviveDays { days: u32 },
    /// Tag outside the known set; no payload was read.
    Unknown { tag: u8 },
}

impl VictoryGoal {
    pub fn tag(&self) -> u8 {
        match self {
            Self::AcquireArtifact { .. } => 0,
            Self::AccumulateCreatures { .. } => 1,
            Self::AccumulateResources { .. } => 2,
            Self::UpgradeTown { .. } => 3,
            Self::BuildGrail { .. } => 4,
            Self::DefeatHero { .. } => 5,
            Self::CaptureTown { .. } => 6,
            Self::DefeatMonster { .. } => 7,
            Self::FlagDwellings => 8,
            Self::FlagMines => 9,
            Self::TransportArtifact { .. } => 10,
            Self::EliminateAllMonsters => 11,
            Self::SurviveDays { .. } => 12,
            Self::Unknown { tag } => *tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum LossCondition {
    #[default]
    None,
    LoseTown { position: Position },
    LoseHero { position: Position },
    TimeExpires { days: u16 },
    /// Tag outside the known set; no payload was read.
    Unknown { tag: u8 },
}

impl LossCondition {
    pub const NONE_TAG: u8 = 0xFF;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomHero {
    pub hero_type: u8,
    pub portrait: u8,
    pub name: String,
    pub players: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rumor {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SecondarySkill {
    pub skill: u8,
    pub level: u8,
}

/// Equipped and backpack artifacts of a hero. Empty slots are kept so slot
/// numbers stay meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct HeroArtifacts {
    pub equipped: Vec<Option<u16>>,
    pub backpack: Vec<u16>,
}

/// Map-wide overrides for one predefined hero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeroSettings {
    pub hero_type: u16,
    pub experience: Option<u32>,
    pub secondary_skills: Option<Vec<SecondarySkill>>,
    pub artifacts: Option<HeroArtifacts>,
    pub biography: Option<String>,
    pub gender: u8,
    pub spells: Option<[u8; 9]>,
    pub primary_skills: Option<[u8; 4]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AdditionalInfo {
    pub victory: VictoryCondition,
    pub loss: LossCondition,
    pub team_count: u8,
    pub teams: Option<[u8; 8]>,
    pub available_heroes: Vec<u8>,
    pub placeholder_heroes: Vec<u8>,
    pub custom_heroes: Vec<CustomHero>,
    pub special_months: Option<bool>,
    pub available_artifacts: Vec<u8>,
    pub available_spells: Vec<u8>,
    pub available_skills: Vec<u8>,
    pub rumors: Vec<Rumor>,
    pub hero_settings: Vec<HeroSettings>,
}

/// Expand a little-endian bitmask into the indices of its set bits, capped
/// at `limit` entries.
pub fn bitmask_indices(mask: &[u8], limit: usize) -> Vec<usize> {
    (0..limit.min(mask.len() * 8))
        .filter(|&i| mask[i / 8] & (1 << (i % 8)) != 0)
        .collect()
}
