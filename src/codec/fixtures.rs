//! Synthetic map builder for decoder tests.

use super::{BinaryWriter, Features, FormatVersion};
use crate::model::{ObjectAttribute, Position};

/// Bit count written for the HotA allowed-heroes mask.
const HOTA_HERO_COUNT: u32 = 16;

pub struct MapFixture {
    pub version: FormatVersion,
    pub size: u32,
    pub two_levels: bool,
    pub name: String,
    pub description: String,
    /// Slots that can be played (human and computer).
    pub players: [bool; 8],
    /// Raw victory, loss and team bytes.
    pub conditions: Vec<u8>,
    /// Bytes inserted between the tiles and the template table.
    pub gap: Vec<u8>,
    pub templates: Vec<ObjectAttribute>,
    /// Overrides the declared template count.
    pub template_count: Option<u32>,
    /// Pre-encoded object records.
    pub objects: Vec<Vec<u8>>,
    /// Overrides the declared object count.
    pub object_count: Option<u32>,
    pub trailing: Vec<u8>,
}

impl MapFixture {
    pub fn new(version: FormatVersion, size: u32) -> Self {
        Self {
            version,
            size,
            two_levels: false,
            name: "Fixture".into(),
            description: "Synthetic map".into(),
            players: [false; 8],
            conditions: vec![0xFF, 0xFF, 0],
            gap: Vec::new(),
            templates: Vec::new(),
            template_count: None,
            objects: Vec::new(),
            object_count: None,
            trailing: Vec::new(),
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let f = Features::for_version(self.version);
        let mut w = BinaryWriter::new();

        w.write_u32_le(self.version.code());
        if f.hota {
            w.write_bytes(b"HOTA");
            w.write_u32_le(3);
            w.write_bool(false);
            w.write_zeros(23);
        }

        w.write_bool(false); // has hero
        if f.hota {
            w.write_u8(0);
        }
        w.write_u32_le(self.size);
        w.write_bool(self.two_levels);
        w.write_string(&self.name);
        w.write_string(&self.description);
        w.write_u8(1); // difficulty
        if f.ab {
            w.write_u8(3);
        }
        if f.hota {
            w.write_u8(0);
        }

        for &playable in &self.players {
            write_player(&mut w, &f, playable);
        }
        write_additional_info(&mut w, &f, &self.conditions);

        let levels = if self.two_levels { 2 } else { 1 };
        let tiles = (self.size * self.size * levels) as usize;
        for i in 0..tiles {
            w.write_bytes(&[(i % 256) as u8, 0, 0, 0, 0, 0, 0]);
        }

        w.write_bytes(&self.gap);
        w.write_u32_le(self.template_count.unwrap_or(self.templates.len() as u32));
        for t in &self.templates {
            write_template(&mut w, t);
        }

        w.write_u32_le(self.object_count.unwrap_or(self.objects.len() as u32));
        for record in &self.objects {
            w.write_bytes(record);
        }
        w.write_bytes(&self.trailing);
        w.into_vec()
    }
}

fn write_player(w: &mut BinaryWriter, f: &Features, playable: bool) {
    w.write_bool(playable);
    w.write_bool(playable);
    if !playable {
        w.write_zeros(f.stub_player_padding);
        return;
    }
    w.write_u8(0); // behavior
    if f.sod {
        w.write_u8(1);
    }
    if f.ab {
        w.write_u16_le(0x00FF);
    } else {
        w.write_u8(0xFF);
    }
    w.write_bool(false); // random faction
    w.write_bool(false); // main town
    w.write_bool(false); // random hero
    w.write_u8(0xFF); // no main hero
    if f.ab {
        w.write_u8(0);
        w.write_u32_le(0);
    }
}

fn write_additional_info(w: &mut BinaryWriter, f: &Features, conditions: &[u8]) {
    w.write_bytes(conditions);

    let hero_total = if f.hota {
        w.write_u32_le(HOTA_HERO_COUNT);
        w.write_bytes(&[0xFF; (HOTA_HERO_COUNT / 8) as usize]);
        HOTA_HERO_COUNT as usize
    } else {
        w.write_bytes(&vec![0xFF; f.hero_bitmask_len]);
        f.hero_count
    };
    if f.ab {
        w.write_u32_le(0); // placeholder heroes
    }
    if f.sod {
        w.write_u8(0); // custom heroes
    }
    w.write_zeros(super::version::MAP_OPTIONS_RESERVED);
    if f.hota {
        w.write_bool(false);
        w.write_zeros(3);
    }
    if f.ab {
        if f.hota {
            w.write_u32_le(0);
        } else {
            w.write_zeros(f.artifact_bitmask_len);
        }
    }
    if f.sod {
        w.write_zeros(9 + 4);
    }
    w.write_u32_le(0); // rumors
    if f.sod {
        w.write_zeros(hero_total);
    }
}

pub fn template(def: &str, class: u32) -> ObjectAttribute {
    ObjectAttribute {
        def: def.into(),
        passable: [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F],
        active: [0, 0, 0, 0, 0, 0x80],
        allowed_landscapes: 0x01FF,
        landscape_group: 0x01FF,
        object_class: class,
        object_number: 0,
        object_group: 1,
        above: 0,
    }
}

pub fn write_template(w: &mut BinaryWriter, t: &ObjectAttribute) {
    w.write_string(&t.def);
    w.write_bytes(&t.passable);
    w.write_bytes(&t.active);
    w.write_u16_le(t.allowed_landscapes);
    w.write_u16_le(t.landscape_group);
    w.write_u32_le(t.object_class);
    w.write_u32_le(t.object_number);
    w.write_u8(t.object_group);
    w.write_u8(t.above);
    w.write_zeros(16);
}

/// Placement header plus the reserved bytes; the body follows.
pub fn object_header(position: Position, template_index: u32) -> Vec<u8> {
    let mut w = BinaryWriter::new();
    w.write_position(position);
    w.write_u32_le(template_index);
    w.write_zeros(5);
    w.into_vec()
}

/// Complete monster record without a reward message.
pub fn monster_record(
    f: &Features,
    position: Position,
    template_index: u32,
    count: u16,
) -> Vec<u8> {
    let mut w = BinaryWriter::new();
    w.write_bytes(&object_header(position, template_index));
    if f.ab {
        w.write_u32_le(0x5000 + count as u32); // identifier
    }
    w.write_u16_le(count);
    w.write_u8(1); // disposition
    w.write_bool(false); // no message
    w.write_bool(false);
    w.write_bool(false);
    w.write_zeros(2);
    if f.hota {
        w.write_i32_le(-1);
        w.write_bool(false);
        w.write_i32_le(0);
        w.write_i32_le(0);
        w.write_i32_le(0);
    }
    w.into_vec()
}
