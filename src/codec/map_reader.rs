//! Whole-map decoding.
//!
//! Sections are read strictly in file order. Header, basic info, players,
//! the fixed part of the additional info and the tile grid are fatal on
//! failure; everything after the tiles is best-effort and reports
//! [`Warning`]s instead.

use std::io::Read;

use super::diagnostics::{Diagnostics, Warning};
use super::object_parsers::{
    read_hero_artifacts, read_id, read_object_body, read_secondary_skills,
};
use super::options::DecodeOptions;
use super::resync::{
    find_object_header, find_template_table, Desync, ResyncContext, OBJECT_HEADER_LEN,
    OBJECT_RECORD_HEADER_LEN,
};
use super::source::{decompress_if_needed, read_source};
use super::version::{MAP_OPTIONS_RESERVED, SKILL_BITMASK_LEN, SPELL_BITMASK_LEN};
use super::{object_category, BinaryReader, Features, FormatVersion, ObjectCategory};
use crate::error::{Error, Result};
use crate::model::player::NO_HERO;
use crate::model::{
    AdditionalInfo, BasicInfo, CustomHero, HeroSettings, HotaHeader, LossCondition, MainHero,
    MainTown, Map, MapObject, ObjectAttribute, Player, PlayerHero, Rumor, Tile,
    VictoryCondition, VictoryGoal, PLAYER_COUNT,
};

/// Bytes per tile record.
const TILE_LEN: usize = 7;
/// Team counts from here on carry no team assignment bytes.
const MAX_TEAMS: u8 = 10;

/// Top-level region of the file, used to locate fatal errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    HotaHeader,
    BasicInfo,
    Players,
    AdditionalInfo,
    Tiles,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Section::Header => "header",
            Section::HotaHeader => "HotA header",
            Section::BasicInfo => "basic info",
            Section::Players => "players",
            Section::AdditionalInfo => "additional info",
            Section::Tiles => "tiles",
        };
        f.write_str(name)
    }
}

/// Decoded map plus every warning raised while producing it, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub map: Map,
    pub warnings: Vec<Warning>,
}

/// Decode a map from raw (possibly compressed) bytes with default options.
pub fn decode(data: &[u8]) -> Result<Decoded> {
    decode_with(data, &DecodeOptions::default())
}

pub fn decode_with(data: &[u8], options: &DecodeOptions) -> Result<Decoded> {
    let data = decompress_if_needed(data)?;
    MapDecoder::new(&data, options).run()
}

/// Drain a byte source and decode it.
pub fn decode_reader(source: impl Read, options: &DecodeOptions) -> Result<Decoded> {
    let data = read_source(source)?;
    decode_with(&data, options)
}

/// Single-use decoder over an already decompressed buffer.
pub struct MapDecoder<'a, 'o> {
    reader: BinaryReader<'a>,
    options: &'o DecodeOptions,
    diagnostics: Diagnostics,
}

impl<'a, 'o> MapDecoder<'a, 'o> {
    pub fn new(data: &'a [u8], options: &'o DecodeOptions) -> Self {
        Self { reader: BinaryReader::new(data), options, diagnostics: Diagnostics::new() }
    }

    pub fn run(mut self) -> Result<Decoded> {
        let format = self.section(Section::Header, Self::read_format)?;
        let f = Features::for_version(format);
        tracing::debug!(format = %format, len = self.reader.len(), "decoding map");

        let mut map = Map::new(format);
        if f.hota {
            map.hota = Some(self.section(Section::HotaHeader, Self::read_hota_header)?);
        }
        map.info = self.section(Section::BasicInfo, |d| d.read_basic_info(&f))?;
        map.players = self.section(Section::Players, |d| d.read_players(&f))?;
        map.additional = self.section(Section::AdditionalInfo, |d| d.read_additional_info(&f))?;
        map.tiles = self.section(Section::Tiles, |d| d.read_tiles(&map.info))?;

        let templates_start = self.reader.position();
        let (templates, complete) = self.read_templates();
        map.templates = templates;
        map.objects = self.read_objects(&f, map.info.map_size, &map.templates);

        if map.objects.is_empty() && self.reader.len() > templates_start {
            self.recover_template_table(&f, &mut map, templates_start, complete);
        }

        map.unparsed_suffix = self.read_suffix();

        tracing::info!(
            format = %format,
            size = map.info.map_size,
            templates = map.templates.len(),
            objects = map.objects.len(),
            warnings = self.diagnostics.len(),
            "map decoded"
        );
        Ok(Decoded { map, warnings: self.diagnostics.into_vec() })
    }

    /// Run a fatal section reader, tagging any failure with the section.
    fn section<T>(
        &mut self,
        section: Section,
        read: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let start = self.reader.position();
        tracing::trace!(%section, offset = start, "section start");
        read(&mut *self).map_err(|source| {
            let offset = source.offset().unwrap_or_else(|| self.reader.position());
            Error::Section { section, offset, source: Box::new(source) }
        })
    }

    /// Run a best-effort sub-list reader; failures become a warning.
    fn best_effort<T>(
        &mut self,
        list: &'static str,
        read: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Option<T> {
        let offset = self.reader.position();
        match read(&mut *self) {
            Ok(value) => Some(value),
            Err(e) => {
                self.diagnostics.warn(Warning::SubListFailed { list, offset, reason: e.to_string() });
                None
            }
        }
    }

    fn read_format(&mut self) -> Result<FormatVersion> {
        let code = self.reader.read_u32_le()?;
        FormatVersion::from_code(code).ok_or(Error::UnsupportedFormat { code })
    }

    fn read_hota_header(&mut self) -> Result<HotaHeader> {
        let r = &mut self.reader;
        Ok(HotaHeader {
            magic: r.read_array::<4>()?,
            version: r.read_u32_le()?,
            scripting_enabled: r.read_bool()?,
            reserved: r.read_array::<23>()?,
        })
    }

    fn read_basic_info(&mut self, f: &Features) -> Result<BasicInfo> {
        let r = &mut self.reader;
        let has_hero = r.read_bool()?;
        let hota_extra_flag = if f.hota { Some(r.read_u8()?) } else { None };
        let map_size = r.read_u32_le()?;
        let has_two_levels = r.read_bool()?;
        let name = r.read_string()?;
        let description = r.read_string()?;
        let difficulty = r.read_u8()?;
        let mastery_cap = if f.ab { Some(r.read_u8()?) } else { None };
        let max_hero_level = if f.hota { Some(r.read_u8()?) } else { None };
        Ok(BasicInfo {
            has_hero,
            hota_extra_flag,
            map_size,
            has_two_levels,
            name,
            description,
            difficulty,
            mastery_cap,
            max_hero_level,
        })
    }

    fn read_players(&mut self, f: &Features) -> Result<Vec<Player>> {
        let mut players = Vec::with_capacity(PLAYER_COUNT);
        for id in 0..PLAYER_COUNT as u8 {
            players.push(self.read_player(id, f)?);
        }
        Ok(players)
    }

    fn read_player(&mut self, id: u8, f: &Features) -> Result<Player> {
        let max_heroes = self.options.max_sub_list;
        let r = &mut self.reader;
        let mut player = Player::stub(id);
        player.can_be_human = r.read_bool()?;
        player.can_be_computer = r.read_bool()?;

        if !player.can_be_human && !player.can_be_computer {
            r.skip(f.stub_player_padding)?;
            return Ok(player);
        }

        player.behavior = r.read_u8()?;
        if f.sod {
            player.allowed_alignments = Some(r.read_u8()?);
        }
        player.allowed_factions = if f.ab { r.read_u16_le()? } else { r.read_u8()? as u16 };
        player.random_faction = r.read_bool()?;

        if r.read_bool()? {
            let (generate_hero, town_type) = if f.ab {
                (Some(r.read_bool()?), Some(r.read_u8()?))
            } else {
                (None, None)
            };
            let position = r.read_position()?;
            player.main_town = Some(MainTown { generate_hero, town_type, position });
        }

        player.has_random_hero = r.read_bool()?;
        let hero_type = r.read_u8()?;
        if hero_type != NO_HERO {
            let portrait = r.read_u8()?;
            let name = r.read_string()?;
            player.main_hero = Some(MainHero { hero_type, portrait, name });
        }

        if f.ab {
            r.skip(1)?; // reserved
            let count = r.read_count("player hero count", max_heroes)?;
            for _ in 0..count {
                let hero_type = r.read_u8()?;
                let name = r.read_string()?;
                player.heroes.push(PlayerHero { hero_type, name });
            }
        }
        Ok(player)
    }

    fn read_victory(&mut self, f: &Features) -> Result<VictoryCondition> {
        let r = &mut self.reader;
        let offset = r.position();
        let tag = r.read_u8()?;
        if tag == VictoryCondition::NONE_TAG {
            return Ok(VictoryCondition::None);
        }
        let allow_normal_victory = r.read_bool()?;
        let applies_to_ai = r.read_bool()?;

        let goal = match tag {
            0 => VictoryGoal::AcquireArtifact { artifact: read_id(r, f.artifact_id_width)? },
            1 => VictoryGoal::AccumulateCreatures {
                creature: read_id(r, f.creature_id_width)?,
                count: r.read_u32_le()?,
            },
            2 => VictoryGoal::AccumulateResources {
                resource: r.read_u8()?,
                amount: r.read_u32_le()?,
            },
            3 => VictoryGoal::UpgradeTown {
                position: r.read_position()?,
                hall_level: r.read_u8()?,
                castle_level: r.read_u8()?,
            },
            4 => VictoryGoal::BuildGrail { position: r.read_position()? },
            5 => VictoryGoal::DefeatHero { position: r.read_position()? },
            6 => VictoryGoal::CaptureTown { position: r.read_position()? },
            7 => VictoryGoal::DefeatMonster { position: r.read_position()? },
            8 => VictoryGoal::FlagDwellings,
            9 => VictoryGoal::FlagMines,
            10 => VictoryGoal::TransportArtifact {
                artifact: r.read_u8()?,
                destination: r.read_position()?,
            },
            11 => VictoryGoal::EliminateAllMonsters,
            12 => VictoryGoal::SurviveDays { days: r.read_u32_le()? },
            _ => {
                self.diagnostics.warn(Warning::UnknownCondition { kind: "victory", tag, offset });
                VictoryGoal::Unknown { tag }
            }
        };
        Ok(VictoryCondition::Special { allow_normal_victory, applies_to_ai, goal })
    }

    fn read_loss(&mut self) -> Result<LossCondition> {
        let r = &mut self.reader;
        let offset = r.position();
        let tag = r.read_u8()?;
        Ok(match tag {
            LossCondition::NONE_TAG => LossCondition::None,
            0 => LossCondition::LoseTown { position: r.read_position()? },
            1 => LossCondition::LoseHero { position: r.read_position()? },
            2 => LossCondition::TimeExpires { days: r.read_u16_le()? },
            _ => {
                self.diagnostics.warn(Warning::UnknownCondition { kind: "loss", tag, offset });
                LossCondition::Unknown { tag }
            }
        })
    }

    /// Bitmask sized by a u32 bit count (HotA) or by a fixed byte length.
    fn read_counted_bitmask(
        &mut self,
        field: &'static str,
        hota: bool,
        fixed: usize,
    ) -> Result<(Vec<u8>, usize)> {
        if hota {
            let bits = self.reader.read_count(field, self.options.max_sub_list)?;
            Ok((self.reader.read_bytes(bits.div_ceil(8))?.to_vec(), bits))
        } else {
            Ok((self.reader.read_bytes(fixed)?.to_vec(), fixed * 8))
        }
    }

    fn read_additional_info(&mut self, f: &Features) -> Result<AdditionalInfo> {
        let mut info = AdditionalInfo {
            victory: self.read_victory(f)?,
            loss: self.read_loss()?,
            ..AdditionalInfo::default()
        };

        info.team_count = self.reader.read_u8()?;
        if (1..MAX_TEAMS).contains(&info.team_count) {
            info.teams = Some(self.reader.read_array::<8>()?);
        }

        let (heroes, hero_bits) =
            self.read_counted_bitmask("hero count", f.hota, f.hero_bitmask_len)?;
        info.available_heroes = heroes;
        let hero_total = if f.hota { hero_bits } else { f.hero_count };

        if f.ab {
            let count = self.reader.read_count("placeholder hero count", self.options.max_sub_list)?;
            info.placeholder_heroes = self.reader.read_bytes(count)?.to_vec();
        }

        if f.sod {
            let count = self.reader.read_u8()?;
            for _ in 0..count {
                let r = &mut self.reader;
                info.custom_heroes.push(CustomHero {
                    hero_type: r.read_u8()?,
                    portrait: r.read_u8()?,
                    name: r.read_string()?,
                    players: r.read_u8()?,
                });
            }
        }

        self.reader.skip(MAP_OPTIONS_RESERVED)?;
        if f.hota {
            info.special_months = Some(self.reader.read_bool()?);
            self.reader.skip(3)?; // reserved
        }

        if f.ab {
            let (artifacts, _) =
                self.read_counted_bitmask("artifact count", f.hota, f.artifact_bitmask_len)?;
            info.available_artifacts = artifacts;
        }

        if f.sod {
            info.available_spells = self.reader.read_bytes(SPELL_BITMASK_LEN)?.to_vec();
            info.available_skills = self.reader.read_bytes(SKILL_BITMASK_LEN)?.to_vec();
        }

        info.rumors = self.best_effort("rumors", Self::read_rumors).unwrap_or_default();

        if f.sod {
            info.hero_settings = self
                .best_effort("hero settings", |d| d.read_hero_settings(f, hero_total))
                .unwrap_or_default();
        }
        Ok(info)
    }

    fn read_rumors(&mut self) -> Result<Vec<Rumor>> {
        let count = self.reader.read_count("rumor count", self.options.max_sub_list)?;
        let mut rumors = Vec::with_capacity(count);
        for _ in 0..count {
            let name = self.reader.read_string()?;
            let text = self.reader.read_string()?;
            rumors.push(Rumor { name, text });
        }
        Ok(rumors)
    }

    fn read_hero_settings(&mut self, f: &Features, hero_total: usize) -> Result<Vec<HeroSettings>> {
        let opts = self.options;
        let r = &mut self.reader;
        let mut settings = Vec::new();
        for hero_type in 0..hero_total {
            if !r.read_bool()? {
                continue;
            }
            let experience = if r.read_bool()? { Some(r.read_u32_le()?) } else { None };
            let secondary_skills =
                if r.read_bool()? { Some(read_secondary_skills(r, opts)?) } else { None };
            let artifacts = read_hero_artifacts(r, f, opts)?;
            let biography = if r.read_bool()? { Some(r.read_string()?) } else { None };
            let gender = r.read_u8()?;
            let spells = if r.read_bool()? { Some(r.read_array::<SPELL_BITMASK_LEN>()?) } else { None };
            let primary_skills =
                if r.read_bool()? { Some(r.read_array::<SKILL_BITMASK_LEN>()?) } else { None };
            settings.push(HeroSettings {
                hero_type: hero_type as u16,
                experience,
                secondary_skills,
                artifacts,
                biography,
                gender,
                spells,
                primary_skills,
            });
        }
        Ok(settings)
    }

    fn read_tiles(&mut self, info: &BasicInfo) -> Result<Vec<Tile>> {
        let count = info.tile_count();
        if count == 0 || count >= self.options.max_tiles {
            self.diagnostics.warn(Warning::TilesSkipped { count });
            return Ok(Vec::new());
        }
        let bytes = self.reader.read_bytes(count * TILE_LEN)?;
        Ok(bytes
            .chunks_exact(TILE_LEN)
            .map(|t| Tile {
                terrain_type: t[0],
                terrain_sprite: t[1],
                river_type: t[2],
                river_sprite: t[3],
                road_type: t[4],
                road_sprite: t[5],
                mirroring: t[6],
            })
            .collect())
    }

    fn read_template(&mut self) -> Result<ObjectAttribute> {
        let r = &mut self.reader;
        let template = ObjectAttribute {
            def: r.read_string()?,
            passable: r.read_array::<6>()?,
            active: r.read_array::<6>()?,
            allowed_landscapes: r.read_u16_le()?,
            landscape_group: r.read_u16_le()?,
            object_class: r.read_u32_le()?,
            object_number: r.read_u32_le()?,
            object_group: r.read_u8()?,
            above: r.read_u8()?,
        };
        r.skip(16)?; // reserved
        Ok(template)
    }

    /// Read the template table. The flag is false when the table was
    /// skipped or cut short.
    fn read_templates(&mut self) -> (Vec<ObjectAttribute>, bool) {
        let offset = self.reader.position();
        let declared = match self.reader.read_u32_le() {
            Ok(n) => n as usize,
            Err(e) => {
                self.diagnostics.warn(Warning::TemplatesTruncated {
                    offset,
                    decoded: 0,
                    declared: 0,
                    reason: e.to_string(),
                });
                return (Vec::new(), false);
            }
        };
        if declared > self.options.max_templates {
            self.diagnostics.warn(Warning::OversizedCount {
                field: "template count",
                offset,
                count: declared,
                max: self.options.max_templates,
            });
            return (Vec::new(), false);
        }

        let mut templates = Vec::with_capacity(declared);
        for _ in 0..declared {
            match self.read_template() {
                Ok(t) => templates.push(t),
                Err(e) => {
                    self.diagnostics.warn(Warning::TemplatesTruncated {
                        offset: self.reader.position(),
                        decoded: templates.len(),
                        declared,
                        reason: e.to_string(),
                    });
                    return (templates, false);
                }
            }
        }
        (templates, true)
    }

    fn read_objects(
        &mut self,
        f: &Features,
        map_size: u32,
        templates: &[ObjectAttribute],
    ) -> Vec<MapObject> {
        let offset = self.reader.position();
        let declared = match self.reader.read_u32_le() {
            Ok(n) => n as usize,
            Err(_) => return Vec::new(),
        };
        if declared > self.options.max_objects {
            self.diagnostics.warn(Warning::OversizedCount {
                field: "object count",
                offset,
                count: declared,
                max: self.options.max_objects,
            });
            return Vec::new();
        }

        let mut objects = Vec::with_capacity(declared.min(4096));
        for index in 0..declared {
            if self.reader.remaining() < OBJECT_HEADER_LEN {
                self.diagnostics.warn(Warning::ObjectListTruncated {
                    offset: self.reader.position(),
                    decoded: objects.len(),
                    declared,
                });
                break;
            }
            let start = self.reader.position();
            match self.try_decode_object(index, f, templates) {
                Ok(object) => objects.push(object),
                Err(desync) => {
                    let warning = match desync {
                        Desync::UndeterminedBody { class, category } => {
                            Warning::UndeterminedBody { index, offset: start, class, category }
                        }
                        other => Warning::ObjectRejected {
                            index,
                            offset: start,
                            reason: other.to_string(),
                        },
                    };
                    self.diagnostics.warn(warning);
                    if !self.resync(map_size, templates, objects.len(), declared) {
                        break;
                    }
                }
            }
        }
        tracing::debug!(declared, decoded = objects.len(), "object list read");
        objects
    }

    /// Decode one placement header and its body.
    fn try_decode_object(
        &mut self,
        index: usize,
        f: &Features,
        templates: &[ObjectAttribute],
    ) -> std::result::Result<MapObject, Desync> {
        let position = self.reader.read_position()?;
        let template_index = self.reader.read_u32_le()?;
        let Some(template) = templates.get(template_index as usize) else {
            return Err(Desync::TemplateOutOfRange { index: template_index, count: templates.len() });
        };
        self.reader.skip(OBJECT_RECORD_HEADER_LEN - OBJECT_HEADER_LEN)?;

        let class = template.object_class;
        let category = object_category(class);
        let body_offset = self.reader.position();
        let Some(body) = read_object_body(&mut self.reader, f, self.options, template, category)?
        else {
            return Err(Desync::UndeterminedBody { class, category });
        };
        if category == ObjectCategory::Unknown {
            self.diagnostics.warn(Warning::UnknownObjectCategory { index, offset: body_offset, class });
        }
        Ok(MapObject { position, template_index, category, body })
    }

    /// Search for the next plausible object header and move the cursor
    /// there. Returns false when nothing was found.
    fn resync(
        &mut self,
        map_size: u32,
        templates: &[ObjectAttribute],
        decoded: usize,
        declared: usize,
    ) -> bool {
        let from = self.reader.position();
        let ctx = ResyncContext {
            map_size,
            templates,
            window: self.options.resync_window,
            max_attempts: self.options.resync_attempts,
        };
        match find_object_header(self.reader.data(), from, &ctx) {
            Some(to) => {
                self.reader.set_position(to);
                self.diagnostics.warn(Warning::Resynced { from, to });
                true
            }
            None => {
                self.diagnostics.warn(Warning::ResyncFailed { offset: from, decoded, declared });
                false
            }
        }
    }

    /// No object decoded: look for a template table further on and retry
    /// the template and object sections from there.
    fn recover_template_table(
        &mut self,
        f: &Features,
        map: &mut Map,
        templates_start: usize,
        complete: bool,
    ) {
        let window = self.options.template_scan_window;
        let Some(found) = find_template_table(self.reader.data(), templates_start, window) else {
            return;
        };
        if found == templates_start && complete {
            // same table again, nothing to gain
            return;
        }
        self.diagnostics.warn(Warning::TemplateTableRecovered { from: templates_start, to: found });
        self.reader.set_position(found);
        let (templates, _) = self.read_templates();
        map.templates = templates;
        map.objects = self.read_objects(f, map.info.map_size, &map.templates);
    }

    fn read_suffix(&mut self) -> Option<Vec<u8>> {
        let rest = self.reader.read_remaining();
        if rest.is_empty() {
            return None;
        }
        let kept = rest.len().min(self.options.max_suffix);
        if kept < rest.len() {
            self.diagnostics.warn(Warning::SuffixTruncated { total: rest.len(), kept });
        }
        Some(rest[..kept].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::fixtures::{monster_record, object_header, template, MapFixture};
    use crate::model::{ObjectBody, Position};
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    fn monster_map(version: FormatVersion, monsters: usize) -> MapFixture {
        let f = Features::for_version(version);
        let mut fixture = MapFixture::new(version, 8);
        fixture.templates = vec![template("avwmon1.def", 54), template("avxtree0.def", 0)];
        for i in 0..monsters {
            fixture.objects.push(monster_record(&f, Position::new(i as u8, 1, 0), 0, 10 + i as u16));
        }
        fixture
    }

    #[test]
    fn test_minimal_map_every_generation() {
        for version in FormatVersion::ALL {
            let mut fixture = MapFixture::new(version, 0);
            fixture.players[0] = true;
            fixture.two_levels = true;
            let decoded = decode(&fixture.build()).unwrap();
            let map = &decoded.map;

            assert_eq!(map.format, version, "{version}");
            assert_eq!(map.hota.is_some(), version >= FormatVersion::HotA);
            assert_eq!(map.info.map_size, 0);
            assert!(map.info.has_two_levels);
            assert_eq!(map.info.name, fixture.name);
            assert_eq!(map.players.len(), 8);
            assert!(map.players[0].can_be_human);
            assert!(map.players[1..].iter().all(|p| !p.can_be_human && !p.can_be_computer));
            assert!(map.tiles.is_empty());
            assert!(map.templates.is_empty());
            assert!(map.objects.is_empty());
            assert_eq!(map.unparsed_suffix, None);
            assert_eq!(decoded.warnings, vec![Warning::TilesSkipped { count: 0 }]);
        }
    }

    #[test]
    fn test_tile_count_matches_declared_size() {
        for version in FormatVersion::ALL {
            let mut fixture = MapFixture::new(version, 5);
            fixture.two_levels = true;
            let map = decode(&fixture.build()).unwrap().map;
            assert_eq!(map.tiles.len(), 5 * 5 * 2);
            assert_eq!(map.tiles[7].terrain_type, 7);
            assert_eq!(map.level_tiles(1).len(), 25);
        }
    }

    #[test]
    fn test_roe_monster_object() {
        let f = Features::for_version(FormatVersion::RoE);
        let mut fixture = MapFixture::new(FormatVersion::RoE, 8);
        fixture.players[0] = true;
        fixture.templates = vec![template("avwmon1.def", 54)];
        fixture.objects.push(monster_record(&f, Position::new(0, 1, 0), 0, 10));

        let decoded = decode(&fixture.build()).unwrap();
        let map = &decoded.map;
        assert!(decoded.warnings.is_empty(), "{:?}", decoded.warnings);
        assert_eq!(map.info.map_size, 8);
        assert!(!map.info.has_two_levels);
        assert!(map.players[0].can_be_human);
        assert_eq!(map.templates.len(), 1);
        assert_eq!(map.objects.len(), 1);

        let object = &map.objects[0];
        assert_eq!(object.category, ObjectCategory::Monster);
        assert_eq!(object.position, Position::new(0, 1, 0));
        assert_eq!(map.template_of(object).map(|t| t.def.as_str()), Some("avwmon1.def"));
        let ObjectBody::Monster(m) = &object.body else { panic!("expected monster body") };
        assert_eq!(m.count, 10);
        assert_eq!(m.identifier, None);
    }

    #[test]
    fn test_unknown_victory_condition_is_kept() {
        let mut fixture = monster_map(FormatVersion::SoD, 1);
        fixture.conditions = vec![13, 1, 0, 0xFF, 0];
        let decoded = decode(&fixture.build()).unwrap();

        assert_eq!(
            decoded.map.additional.victory,
            VictoryCondition::Special {
                allow_normal_victory: true,
                applies_to_ai: false,
                goal: VictoryGoal::Unknown { tag: 13 },
            }
        );
        assert_eq!(decoded.map.additional.loss, LossCondition::None);
        assert!(matches!(
            decoded.warnings.as_slice(),
            [Warning::UnknownCondition { kind: "victory", tag: 13, .. }]
        ));
        assert_eq!(decoded.map.objects.len(), 1);
    }

    #[test]
    fn test_unknown_loss_condition_is_kept() {
        let mut fixture = monster_map(FormatVersion::AB, 1);
        fixture.conditions = vec![0xFF, 7, 0];
        let decoded = decode(&fixture.build()).unwrap();

        assert_eq!(decoded.map.additional.loss, LossCondition::Unknown { tag: 7 });
        assert!(matches!(
            decoded.warnings.as_slice(),
            [Warning::UnknownCondition { kind: "loss", tag: 7, .. }]
        ));
        assert_eq!(decoded.map.objects.len(), 1);
    }

    #[test]
    fn test_team_bytes_only_for_plausible_counts() {
        let mut fixture = monster_map(FormatVersion::SoD, 1);
        fixture.conditions = vec![0xFF, 0xFF, 2, 0, 1, 0, 1, 0, 1, 0, 1];
        let map = decode(&fixture.build()).unwrap().map;
        assert_eq!(map.additional.team_count, 2);
        assert_eq!(map.additional.teams, Some([0, 1, 0, 1, 0, 1, 0, 1]));
        assert_eq!(map.objects.len(), 1);

        fixture.conditions = vec![0xFF, 0xFF, 12];
        let decoded = decode(&fixture.build()).unwrap();
        assert!(decoded.warnings.is_empty(), "{:?}", decoded.warnings);
        assert_eq!(decoded.map.additional.team_count, 12);
        assert_eq!(decoded.map.additional.teams, None);
        assert_eq!(decoded.map.objects.len(), 1);
    }

    #[test]
    fn test_every_generation_decodes_objects() {
        for version in FormatVersion::ALL {
            let decoded = decode(&monster_map(version, 3).build()).unwrap();
            assert!(decoded.warnings.is_empty(), "{version}: {:?}", decoded.warnings);
            let counts: Vec<_> = decoded.map.objects.iter().filter_map(|o| o.body.quantity()).collect();
            assert_eq!(counts, vec![10, 11, 12]);
        }
    }

    #[test]
    fn test_template_indices_stay_in_range() {
        let version = FormatVersion::SoD;
        let f = Features::for_version(version);
        let mut fixture = monster_map(version, 2);
        fixture.objects.insert(1, monster_record(&f, Position::new(4, 4, 0), 99, 5));
        let decoded = decode(&fixture.build()).unwrap();
        let map = &decoded.map;

        assert!(map
            .objects
            .iter()
            .all(|o| (o.template_index as usize) < map.templates.len()));
        assert!(decoded
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::ObjectRejected { index: 1, .. })));
        assert_eq!(map.objects[0].body.quantity(), Some(10));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let data = monster_map(FormatVersion::HotA, 4).build();
        assert_eq!(decode(&data).unwrap(), decode(&data).unwrap());
    }

    #[test]
    fn test_truncated_object_keeps_earlier_objects() {
        let version = FormatVersion::SoD;
        for cut in 1..=10 {
            let mut fixture = monster_map(version, 6);
            let broken = &mut fixture.objects[3];
            broken.truncate(broken.len() - cut);
            let decoded = decode(&fixture.build()).unwrap();
            let objects = &decoded.map.objects;

            assert!(objects.len() <= 6, "cut {cut}");
            assert!(objects.len() >= 3, "cut {cut}");
            for (i, object) in objects.iter().take(3).enumerate() {
                assert_eq!(object.position, Position::new(i as u8, 1, 0), "cut {cut}");
                assert_eq!(object.body.quantity(), Some(10 + i as u32), "cut {cut}");
            }
        }
    }

    #[test]
    fn test_oversized_template_count_is_dropped() {
        let mut fixture = MapFixture::new(FormatVersion::SoD, 4);
        fixture.template_count = Some(6000);
        let decoded = decode(&fixture.build()).unwrap();
        assert!(decoded.map.templates.is_empty());
        assert!(decoded.warnings.iter().any(|w| matches!(
            w,
            Warning::OversizedCount { field: "template count", count: 6000, .. }
        )));
    }

    #[test]
    fn test_oversized_object_count_is_dropped() {
        let mut fixture = monster_map(FormatVersion::AB, 1);
        fixture.object_count = Some(200_000);
        let decoded = decode(&fixture.build()).unwrap();
        assert!(decoded.map.objects.is_empty());
        assert!(decoded.warnings.iter().any(|w| matches!(
            w,
            Warning::OversizedCount { field: "object count", .. }
        )));
    }

    #[test]
    fn test_gzip_matches_plain() {
        let data = monster_map(FormatVersion::SoD, 3).build();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&data).unwrap();
        let packed = encoder.finish().unwrap();
        assert_eq!(decode(&packed).unwrap(), decode(&data).unwrap());
    }

    #[test]
    fn test_decode_reader_matches_decode() {
        let data = monster_map(FormatVersion::AB, 2).build();
        let from_reader = decode_reader(data.as_slice(), &DecodeOptions::default()).unwrap();
        assert_eq!(from_reader, decode(&data).unwrap());
    }

    #[test]
    fn test_unsupported_format_is_fatal() {
        let err = decode(&[0x1D, 0, 0, 0, 0, 0]).unwrap_err();
        match err {
            Error::Section { section: Section::Header, offset, source } => {
                assert_eq!(offset, 4);
                assert!(matches!(*source, Error::UnsupportedFormat { code: 0x1D }));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_truncated_players_is_fatal() {
        let data = MapFixture::new(FormatVersion::SoD, 4).build();
        let err = decode(&data[..60]).unwrap_err();
        assert!(matches!(err, Error::Section { section: Section::Players, .. }), "{err:?}");
    }

    #[test]
    fn test_trailing_bytes_become_suffix() {
        let mut fixture = monster_map(FormatVersion::SoD, 1);
        fixture.trailing = vec![1, 2, 3];
        let map = decode(&fixture.build()).unwrap().map;
        assert_eq!(map.unparsed_suffix, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_suffix_cap() {
        let mut fixture = monster_map(FormatVersion::SoD, 1);
        fixture.trailing = vec![7; 100];
        let options = DecodeOptions { max_suffix: 10, ..DecodeOptions::default() };
        let decoded = decode_with(&fixture.build(), &options).unwrap();
        assert_eq!(decoded.map.unparsed_suffix.map(|s| s.len()), Some(10));
        assert!(decoded
            .warnings
            .contains(&Warning::SuffixTruncated { total: 100, kept: 10 }));
    }

    #[test]
    fn test_unknown_class_consumes_no_body() {
        let version = FormatVersion::SoD;
        let mut fixture = monster_map(version, 1);
        fixture.templates.push(template("unknown.def", 212));
        fixture.objects.insert(0, object_header(Position::new(2, 2, 0), 2));
        let decoded = decode(&fixture.build()).unwrap();
        let objects = &decoded.map.objects;

        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].category, ObjectCategory::Unknown);
        assert_eq!(objects[0].body, ObjectBody::Empty);
        assert_eq!(objects[1].body.quantity(), Some(10));
        assert!(matches!(
            decoded.warnings.as_slice(),
            [Warning::UnknownObjectCategory { index: 0, class: 212, .. }]
        ));
    }

    #[test]
    fn test_seers_hut_forces_resync() {
        let version = FormatVersion::SoD;
        let mut fixture = monster_map(version, 2);
        fixture.templates.push(template("avxseer0.def", 83));
        let mut hut = object_header(Position::new(6, 6, 0), 2);
        hut.extend_from_slice(&[0xEE; 9]);
        fixture.objects.insert(1, hut);
        let decoded = decode(&fixture.build()).unwrap();
        let counts: Vec<_> = decoded.map.objects.iter().filter_map(|o| o.body.quantity()).collect();
        assert_eq!(counts, vec![10, 11]);
        assert!(decoded
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::UndeterminedBody { index: 1, class: 83, .. })));
        assert!(decoded.warnings.iter().any(|w| matches!(w, Warning::Resynced { .. })));
    }

    #[test]
    fn test_recovers_displaced_template_table() {
        let version = FormatVersion::SoD;
        let mut fixture = monster_map(version, 2);
        // junk between tiles and the template table
        fixture.gap = vec![0xEE; 25];
        let decoded = decode(&fixture.build()).unwrap();
        assert_eq!(decoded.map.templates.len(), 2);
        assert_eq!(decoded.map.objects.len(), 2);
        assert!(decoded
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::TemplateTableRecovered { .. })));
    }
}
