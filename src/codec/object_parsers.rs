use super::options::DecodeOptions;
use super::version::{BUILDING_BITMASK_LEN, SKILL_BITMASK_LEN, SPELL_BITMASK_LEN};
use super::{BinaryReader, Features, ObjectCategory};
use crate::error::{Error, Result};
use crate::model::{
    BoxContent, CreatureStack, EventBody, GarrisonBody, Guarded, HeroArtifacts, HeroBody,
    MonsterBody, ObjectAttribute, ObjectBody, RandomDwellingBody, SecondarySkill, TownBody,
    TownBuildings, TownEvent,
};

/// Creature slots in every army.
const ARMY_SLOTS: usize = 7;
const RESOURCE_KINDS: usize = 7;

/// Read a u8 or u16 id depending on the generation's id width.
pub(crate) fn read_id(reader: &mut BinaryReader, width: usize) -> Result<u16> {
    if width == 1 {
        Ok(reader.read_u8()? as u16)
    } else {
        reader.read_u16_le()
    }
}

/// Artifact id, `None` for the empty-slot sentinel of either width.
pub(crate) fn read_artifact(reader: &mut BinaryReader, f: &Features) -> Result<Option<u16>> {
    let id = read_id(reader, f.artifact_id_width)?;
    let none = if f.artifact_id_width == 1 { 0xFF } else { 0xFFFF };
    Ok((id != none).then_some(id))
}

pub(crate) fn read_resources(reader: &mut BinaryReader) -> Result<[i32; RESOURCE_KINDS]> {
    let mut out = [0i32; RESOURCE_KINDS];
    for amount in &mut out {
        *amount = reader.read_i32_le()?;
    }
    Ok(out)
}

/// Seven (creature, count) slots; empty slots are dropped.
pub(crate) fn read_creature_set(
    reader: &mut BinaryReader,
    f: &Features,
) -> Result<Vec<CreatureStack>> {
    let mut stacks = Vec::new();
    for _ in 0..ARMY_SLOTS {
        let id = read_id(reader, f.creature_id_width)?;
        let count = reader.read_u16_le()?;
        if count > 0 {
            stacks.push(CreatureStack { id, count });
        }
    }
    Ok(stacks)
}

fn read_message_and_guards(reader: &mut BinaryReader, f: &Features) -> Result<Option<Guarded>> {
    if !reader.read_bool()? {
        return Ok(None);
    }
    let message = reader.read_string()?;
    let guards = if reader.read_bool()? {
        Some(read_creature_set(reader, f)?)
    } else {
        None
    };
    reader.skip(4)?; // reserved
    Ok(Some(Guarded { message, guards }))
}

/// u32-counted (skill, level) pairs.
pub(crate) fn read_secondary_skills(
    reader: &mut BinaryReader,
    opts: &DecodeOptions,
) -> Result<Vec<SecondarySkill>> {
    let count = reader.read_count("secondary skill count", opts.max_sub_list)?;
    let mut skills = Vec::with_capacity(count);
    for _ in 0..count {
        skills.push(SecondarySkill { skill: reader.read_u8()?, level: reader.read_u8()? });
    }
    Ok(skills)
}

/// Flag-prefixed equipped slots plus u16-counted backpack.
pub(crate) fn read_hero_artifacts(
    reader: &mut BinaryReader,
    f: &Features,
    opts: &DecodeOptions,
) -> Result<Option<HeroArtifacts>> {
    if !reader.read_bool()? {
        return Ok(None);
    }
    let mut equipped = Vec::with_capacity(f.artifact_slots);
    for _ in 0..f.artifact_slots {
        equipped.push(read_artifact(reader, f)?);
    }

    let offset = reader.position();
    let count = reader.read_u16_le()? as usize;
    if count > opts.max_sub_list {
        return Err(Error::OversizedField {
            field: "backpack size",
            offset,
            len: count,
            max: opts.max_sub_list,
        });
    }
    let mut backpack = Vec::with_capacity(count);
    for _ in 0..count {
        if let Some(id) = read_artifact(reader, f)? {
            backpack.push(id);
        }
    }
    Ok(Some(HeroArtifacts { equipped, backpack }))
}

fn read_optional_string(reader: &mut BinaryReader) -> Result<Option<String>> {
    if reader.read_bool()? {
        Ok(Some(reader.read_string()?))
    } else {
        Ok(None)
    }
}

fn read_identifier(reader: &mut BinaryReader, f: &Features) -> Result<Option<u32>> {
    if f.ab {
        Ok(Some(reader.read_u32_le()?))
    } else {
        Ok(None)
    }
}

fn read_monster(reader: &mut BinaryReader, f: &Features) -> Result<MonsterBody> {
    let identifier = read_identifier(reader, f)?;
    let count = reader.read_u16_le()?;
    let disposition = reader.read_u8()?;

    let (message, resources, artifact) = if reader.read_bool()? {
        let message = reader.read_string()?;
        let resources = read_resources(reader)?;
        let artifact = read_artifact(reader, f)?;
        (Some(message), Some(resources), artifact)
    } else {
        (None, None, None)
    };

    let never_flees = reader.read_bool()?;
    let not_growing = reader.read_bool()?;
    reader.skip(2)?;

    let mut body = MonsterBody {
        identifier,
        count,
        disposition,
        message,
        resources,
        artifact,
        never_flees,
        not_growing,
        aggression: None,
        join_only_for_money: None,
        join_percent: None,
        upgraded_stack: None,
        stack_count: None,
    };
    if f.hota {
        body.aggression = Some(reader.read_i32_le()?);
        body.join_only_for_money = Some(reader.read_bool()?);
        body.join_percent = Some(reader.read_i32_le()?);
        body.upgraded_stack = Some(reader.read_i32_le()?);
        body.stack_count = Some(reader.read_i32_le()?);
    }
    Ok(body)
}

fn read_box_content(reader: &mut BinaryReader, f: &Features) -> Result<BoxContent> {
    let guard = read_message_and_guards(reader, f)?;
    let experience = reader.read_u32_le()?;
    let mana = reader.read_i32_le()?;
    let morale = reader.read_i8()?;
    let luck = reader.read_i8()?;
    let resources = read_resources(reader)?;
    let primary_skills = reader.read_array::<4>()?;

    let n = reader.read_u8()?;
    let mut secondary_skills = Vec::with_capacity(n as usize);
    for _ in 0..n {
        secondary_skills.push(SecondarySkill { skill: reader.read_u8()?, level: reader.read_u8()? });
    }

    let n = reader.read_u8()?;
    let mut artifacts = Vec::with_capacity(n as usize);
    for _ in 0..n {
        artifacts.push(read_id(reader, f.artifact_id_width)?);
    }

    let n = reader.read_u8()?;
    let spells = reader.read_bytes(n as usize)?.to_vec();

    let n = reader.read_u8()?;
    let mut creatures = Vec::with_capacity(n as usize);
    for _ in 0..n {
        let id = read_id(reader, f.creature_id_width)?;
        let count = reader.read_u16_le()?;
        if count > 0 {
            creatures.push(CreatureStack { id, count });
        }
    }
    reader.skip(8)?; // reserved

    Ok(BoxContent {
        guard,
        experience,
        mana,
        morale,
        luck,
        resources,
        primary_skills,
        secondary_skills,
        artifacts,
        spells,
        creatures,
    })
}

fn read_event(reader: &mut BinaryReader, f: &Features) -> Result<EventBody> {
    let content = read_box_content(reader, f)?;
    let players = reader.read_u8()?;
    let computer_activates = reader.read_bool()?;
    let remove_after_visit = reader.read_bool()?;
    reader.skip(4)?; // reserved
    Ok(EventBody { content, players, computer_activates, remove_after_visit })
}

fn read_town_event(reader: &mut BinaryReader, f: &Features) -> Result<TownEvent> {
    let name = reader.read_string()?;
    let message = reader.read_string()?;
    let resources = read_resources(reader)?;
    let players = reader.read_u8()?;
    let human_affected = if f.sod { Some(reader.read_bool()?) } else { None };
    let computer_affected = reader.read_bool()?;
    let first_occurrence = reader.read_u16_le()?;
    let next_occurrence = reader.read_u8()?;
    reader.skip(17)?; // reserved
    let buildings = reader.read_array::<BUILDING_BITMASK_LEN>()?;
    let mut creatures = [0u16; ARMY_SLOTS];
    for c in &mut creatures {
        *c = reader.read_u16_le()?;
    }
    reader.skip(4)?; // reserved
    Ok(TownEvent {
        name,
        message,
        resources,
        players,
        human_affected,
        computer_affected,
        first_occurrence,
        next_occurrence,
        buildings,
        creatures,
    })
}

fn read_town(reader: &mut BinaryReader, f: &Features, opts: &DecodeOptions) -> Result<TownBody> {
    let identifier = read_identifier(reader, f)?;
    let owner = reader.read_u32_le()?;
    let name = read_optional_string(reader)?;
    let garrison = if reader.read_bool()? {
        Some(read_creature_set(reader, f)?)
    } else {
        None
    };
    let formation = reader.read_u8()?;

    let buildings = if reader.read_bool()? {
        TownBuildings::Custom {
            built: reader.read_array::<BUILDING_BITMASK_LEN>()?,
            forbidden: reader.read_array::<BUILDING_BITMASK_LEN>()?,
        }
    } else {
        TownBuildings::Default { has_fort: reader.read_bool()? }
    };

    let obligatory_spells = if f.ab {
        Some(reader.read_array::<SPELL_BITMASK_LEN>()?)
    } else {
        None
    };
    let possible_spells = reader.read_array::<SPELL_BITMASK_LEN>()?;

    let count = reader.read_count("town event count", opts.max_sub_list)?;
    let mut events = Vec::with_capacity(count);
    for _ in 0..count {
        events.push(read_town_event(reader, f)?);
    }

    let alignment = if f.sod { Some(reader.read_u8()?) } else { None };
    reader.skip(3)?; // reserved

    Ok(TownBody {
        identifier,
        owner,
        name,
        garrison,
        formation,
        buildings,
        obligatory_spells,
        possible_spells,
        events,
        alignment,
    })
}

fn read_hero(reader: &mut BinaryReader, f: &Features, opts: &DecodeOptions) -> Result<HeroBody> {
    let identifier = read_identifier(reader, f)?;
    let owner = reader.read_u8()?;
    let hero_type = reader.read_u8()?;
    let name = read_optional_string(reader)?;

    let experience = if f.sod {
        if reader.read_bool()? {
            Some(reader.read_u32_le()?)
        } else {
            None
        }
    } else {
        Some(reader.read_u32_le()?)
    };

    let portrait = if reader.read_bool()? { Some(reader.read_u8()?) } else { None };
    let secondary_skills = if reader.read_bool()? {
        Some(read_secondary_skills(reader, opts)?)
    } else {
        None
    };
    let garrison = if reader.read_bool()? {
        Some(read_creature_set(reader, f)?)
    } else {
        None
    };
    let formation = reader.read_u8()?;
    let artifacts = read_hero_artifacts(reader, f, opts)?;
    let patrol_radius = reader.read_u8()?;

    let (biography, gender) = if f.ab {
        (read_optional_string(reader)?, Some(reader.read_u8()?))
    } else {
        (None, None)
    };

    let (spells, spell) = if f.sod {
        let spells = if reader.read_bool()? {
            Some(reader.read_array::<SPELL_BITMASK_LEN>()?)
        } else {
            None
        };
        (spells, None)
    } else if f.ab {
        (None, Some(reader.read_u8()?))
    } else {
        (None, None)
    };

    let primary_skills = if f.sod && reader.read_bool()? {
        Some(reader.read_array::<SKILL_BITMASK_LEN>()?)
    } else {
        None
    };
    reader.skip(16)?; // reserved

    Ok(HeroBody {
        identifier,
        owner,
        hero_type,
        name,
        experience,
        portrait,
        secondary_skills,
        garrison,
        formation,
        artifacts,
        patrol_radius,
        biography,
        gender,
        spells,
        spell,
        primary_skills,
    })
}

fn read_garrison(reader: &mut BinaryReader, f: &Features) -> Result<GarrisonBody> {
    let owner = reader.read_u32_le()?;
    let guards = read_creature_set(reader, f)?;
    let removable = if f.ab { Some(reader.read_bool()?) } else { None };
    reader.skip(8)?; // reserved
    Ok(GarrisonBody { owner, guards, removable })
}

/// Class 216 carries both a town link and a level range, 217 only the
/// town link, 218 only the level range.
fn read_random_dwelling(reader: &mut BinaryReader, class: u32) -> Result<RandomDwellingBody> {
    let owner = reader.read_u32_le()?;
    let mut body = RandomDwellingBody {
        owner,
        town_id: None,
        alignments: None,
        min_level: None,
        max_level: None,
    };
    if class == 216 || class == 217 {
        let town_id = reader.read_u32_le()?;
        body.town_id = Some(town_id);
        if town_id == 0 {
            body.alignments = Some(reader.read_u16_le()?);
        }
    }
    if class == 216 || class == 218 {
        body.min_level = Some(reader.read_u8()?);
        body.max_level = Some(reader.read_u8()?);
    }
    Ok(body)
}

/// Read the category-specific body that follows an object's placement
/// header. `Ok(None)` means the body length cannot be determined and the
/// caller must resynchronize.
pub fn read_object_body(
    reader: &mut BinaryReader,
    f: &Features,
    opts: &DecodeOptions,
    template: &ObjectAttribute,
    category: ObjectCategory,
) -> Result<Option<ObjectBody>> {
    use ObjectCategory as C;

    let body = match category {
        C::Monster => ObjectBody::Monster(read_monster(reader, f)?),

        C::Artifact => {
            let guard = read_message_and_guards(reader, f)?;
            if f.hota {
                reader.skip(5)?;
            }
            ObjectBody::Artifact { guard, spell: None }
        }

        C::SpellScroll => {
            let guard = read_message_and_guards(reader, f)?;
            let spell = reader.read_u32_le()?;
            if f.hota {
                reader.skip(5)?;
            }
            ObjectBody::Artifact { guard, spell: Some(spell) }
        }

        C::Resource => {
            let guard = read_message_and_guards(reader, f)?;
            let amount = reader.read_u32_le()?;
            reader.skip(4)?; // reserved
            ObjectBody::Resource { guard, amount }
        }

        C::PandorasBox => ObjectBody::PandorasBox(read_box_content(reader, f)?),
        C::Event => ObjectBody::Event(read_event(reader, f)?),

        C::Town | C::RandomTown => ObjectBody::Town(read_town(reader, f, opts)?),

        C::Hero | C::RandomHero | C::Prison => ObjectBody::Hero(read_hero(reader, f, opts)?),

        C::PlaceholderHero => {
            let owner = reader.read_u8()?;
            let hero_type = reader.read_u8()?;
            let power_rank = if hero_type == 0xFF { Some(reader.read_u8()?) } else { None };
            ObjectBody::PlaceholderHero { owner, hero_type, power_rank }
        }

        C::Sign | C::OceanBottle => {
            let message = reader.read_string()?;
            reader.skip(4)?; // reserved
            ObjectBody::Sign { message }
        }

        C::Garrison | C::GarrisonAbSod => ObjectBody::Garrison(read_garrison(reader, f)?),

        C::Scholar => {
            let bonus_type = reader.read_u8()?;
            let bonus_id = reader.read_u8()?;
            reader.skip(6)?; // reserved
            ObjectBody::Scholar { bonus_type, bonus_id }
        }

        C::ResourceGenerator | C::Dwelling | C::Lighthouse | C::Shipyard => {
            ObjectBody::Owned { owner: reader.read_u32_le()? }
        }

        C::AbandonedMineAbSod => {
            let resources = reader.read_u8()?;
            reader.skip(3)?; // reserved
            ObjectBody::AbandonedMine { resources }
        }

        C::RandomDwellingAbSod => {
            ObjectBody::RandomDwelling(read_random_dwelling(reader, template.object_class)?)
        }

        C::Grail => ObjectBody::Grail { radius: reader.read_u32_le()? },
        C::Shrine => ObjectBody::Shrine { spell: reader.read_u32_le()? },
        C::WitchHut => {
            let skills = if f.ab { Some(reader.read_u32_le()?) } else { None };
            ObjectBody::WitchHut { skills }
        }

        C::SeersHut | C::QuestGuard => return Ok(None),

        C::SubterraneanGate
        | C::Boat
        | C::Visitable
        | C::ImpassableTerrain
        | C::ImpassableTerrainAbSod
        | C::PassableTerrainSod
        | C::Unknown => ObjectBody::Empty,
    };
    Ok(Some(body))
}
