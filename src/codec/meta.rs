//! Object class → semantic category dispatch.
//!
//! The category decides which body layout follows an object's placement
//! header. Body decoding only ever looks at the category, never at the raw
//! class code.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectCategory {
    Monster,
    Artifact,
    SpellScroll,
    Resource,
    PandorasBox,
    Event,
    Town,
    RandomTown,
    Hero,
    RandomHero,
    Prison,
    PlaceholderHero,
    Sign,
    OceanBottle,
    Garrison,
    GarrisonAbSod,
    Scholar,
    ResourceGenerator,
    Dwelling,
    RandomDwellingAbSod,
    AbandonedMineAbSod,
    Lighthouse,
    Shipyard,
    Grail,
    Shrine,
    WitchHut,
    SeersHut,
    QuestGuard,
    SubterraneanGate,
    Boat,
    Visitable,
    ImpassableTerrain,
    ImpassableTerrainAbSod,
    PassableTerrainSod,
    Unknown,
}

pub const fn object_category(class: u32) -> ObjectCategory {
    use ObjectCategory::*;
    match class {
        0 => ImpassableTerrain,
        5 | 65..=69 => Artifact,
        6 => PandorasBox,
        8 => Boat,
        17..=20 => Dwelling,
        26 => Event,
        33 => Garrison,
        34 => Hero,
        36 => Grail,
        42 => Lighthouse,
        53 => ResourceGenerator,
        54 | 71..=75 | 162..=164 => Monster,
        59 => OceanBottle,
        62 => Prison,
        70 => RandomHero,
        76 | 79 => Resource,
        77 => RandomTown,
        81 => Scholar,
        83 => SeersHut,
        87 => Shipyard,
        88..=90 => Shrine,
        91 => Sign,
        93 => SpellScroll,
        98 => Town,
        103 => SubterraneanGate,
        113 => WitchHut,
        214 => PlaceholderHero,
        215 => QuestGuard,
        216..=218 => RandomDwellingAbSod,
        219 => GarrisonAbSod,
        220 => AbandonedMineAbSod,
        1..=4 | 7 | 9..=16 | 22..=25 | 27..=32 | 35 | 37..=41 | 43..=52 | 55..=58 | 60
        | 61 | 63 | 64 | 78 | 80 | 82 | 84..=86 | 92 | 94..=97 | 99..=102 | 104..=112 => {
            Visitable
        }
        114..=161 => ImpassableTerrain,
        165..=211 => ImpassableTerrainAbSod,
        222..=231 => PassableTerrainSod,
        _ => Unknown,
    }
}
