//! Decoded map model. Pure data: produced by the decoder, read by exporters.

pub mod info;
pub mod object;
pub mod player;

use serde::Serialize;

use crate::codec::FormatVersion;

pub use info::{
    AdditionalInfo, CustomHero, HeroArtifacts, HeroSettings, LossCondition, Rumor,
    SecondarySkill, VictoryCondition, VictoryGoal,
};
pub use object::{
    BoxContent, CreatureStack, EventBody, GarrisonBody, Guarded, HeroBody, MapObject,
    MonsterBody, ObjectAttribute, ObjectBody, RandomDwellingBody, TownBody, TownBuildings,
    TownEvent,
};
pub use player::{MainHero, MainTown, Player, PlayerHero};

/// Number of player slots in every map.
pub const PLAYER_COUNT: usize = 8;

/// Map coordinate as stored in the file: one byte per axis, z = level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Position {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl Position {
    pub fn new(x: u8, y: u8, z: u8) -> Self {
        Self { x, y, z }
    }

    pub fn is_underground(self) -> bool {
        self.z != 0
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}

/// HotA extension header, present for formats at or above HotA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HotaHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub scripting_enabled: bool,
    pub reserved: [u8; 23],
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BasicInfo {
    pub has_hero: bool,
    pub hota_extra_flag: Option<u8>,
    pub map_size: u32,
    pub has_two_levels: bool,
    pub name: String,
    pub description: String,
    pub difficulty: u8,
    pub mastery_cap: Option<u8>,
    pub max_hero_level: Option<u8>,
}

impl BasicInfo {
    pub fn levels(&self) -> usize {
        if self.has_two_levels {
            2
        } else {
            1
        }
    }

    /// Number of tiles the map declares, saturating on absurd sizes.
    pub fn tile_count(&self) -> usize {
        let size = self.map_size as usize;
        size.saturating_mul(size).saturating_mul(self.levels())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Tile {
    pub terrain_type: u8,
    pub terrain_sprite: u8,
    pub river_type: u8,
    pub river_sprite: u8,
    pub road_type: u8,
    pub road_sprite: u8,
    pub mirroring: u8,
}

/// Root aggregate of a decoded map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Map {
    pub format: FormatVersion,
    pub hota: Option<HotaHeader>,
    pub info: BasicInfo,
    pub players: Vec<Player>,
    pub additional: AdditionalInfo,
    pub tiles: Vec<Tile>,
    pub templates: Vec<ObjectAttribute>,
    pub objects: Vec<MapObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unparsed_suffix: Option<Vec<u8>>,
}

impl Map {
    pub fn new(format: FormatVersion) -> Self {
        Self {
            format,
            hota: None,
            info: BasicInfo::default(),
            players: Vec::with_capacity(PLAYER_COUNT),
            additional: AdditionalInfo::default(),
            tiles: Vec::new(),
            templates: Vec::new(),
            objects: Vec::new(),
            unparsed_suffix: None,
        }
    }

    /// Resolve an object's template. `None` only for objects that did not
    /// come out of the decoder.
    pub fn template_of(&self, object: &MapObject) -> Option<&ObjectAttribute> {
        self.templates.get(object.template_index as usize)
    }

    /// Flat index of `(x, y, level)`, `None` when it does not fit in `usize`.
    pub fn tile_index(&self, x: usize, y: usize, level: usize) -> Option<usize> {
        let size = self.info.map_size as usize;
        let per_level = size.checked_mul(size)?;
        level
            .checked_mul(per_level)?
            .checked_add(y.checked_mul(size)?)?
            .checked_add(x)
    }

    pub fn tile(&self, x: usize, y: usize, level: usize) -> Option<&Tile> {
        let size = self.info.map_size as usize;
        if x >= size || y >= size || self.tiles.is_empty() {
            return None;
        }
        self.tiles.get(self.tile_index(x, y, level)?)
    }

    /// Tiles of one level, empty when the level does not exist or tiles
    /// were not decoded.
    pub fn level_tiles(&self, level: usize) -> &[Tile] {
        let size = self.info.map_size as usize;
        let range = size.checked_mul(size).and_then(|per_level| {
            let start = level.checked_mul(per_level)?;
            Some(start..start.checked_add(per_level)?)
        });
        range.and_then(|r| self.tiles.get(r)).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_of_size(size: u32, levels: usize) -> Map {
        let mut map = Map::new(FormatVersion::SoD);
        map.info.map_size = size;
        map.info.has_two_levels = levels == 2;
        map.tiles = vec![Tile::default(); map.info.tile_count()];
        map
    }

    #[test]
    fn test_tile_lookup() {
        let mut map = map_of_size(3, 2);
        map.tiles[9 + 3 + 2].terrain_type = 7;
        assert_eq!(map.tile_index(2, 1, 1), Some(14));
        assert_eq!(map.tile(2, 1, 1).map(|t| t.terrain_type), Some(7));
        assert!(map.tile(3, 0, 0).is_none());
        assert!(map.tile(0, 0, 2).is_none());
        assert_eq!(map.level_tiles(1).len(), 9);
        assert!(map.level_tiles(2).is_empty());
    }

    #[test]
    fn test_tile_lookup_on_overflowing_size() {
        let mut map = map_of_size(0, 2);
        map.info.map_size = u32::MAX;
        assert_eq!(map.info.tile_count(), usize::MAX);
        assert!(map.tile(5, 5, 1).is_none());
        assert!(map.level_tiles(1).is_empty());
        assert_eq!(map.tile_index(usize::MAX, usize::MAX, 1), None);
    }
}
