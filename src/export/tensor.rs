//! Fixed-size multi-channel grid for ML pipelines.
//!
//! Layout: `"H3MT"`, u32 version, u32 side, u32 levels, u32 channels, then
//! per level, per row (y), per column (x), one i16 per channel.

use std::io::Write;

use super::{ExportOptions, MapExporter};
use crate::codec::{BinaryWriter, ObjectCategory};
use crate::error::Result;
use crate::model::{Map, MapObject, ObjectAttribute};

const MAGIC: &[u8; 4] = b"H3MT";
const TENSOR_VERSION: u32 = 1;
/// Side of the square grid; smaller maps are padded, larger ones cropped.
pub const TARGET_SIZE: usize = 144;
pub const CHANNELS: usize = 7;

const OUTSIDE_TERRAIN: i16 = 255;
const WATER: u8 = 8;
const ROCK: u8 = 9;

/// Per-level planes, indexed `y * TARGET_SIZE + x`.
struct LevelGrid {
    class: Vec<i16>,
    subtype: Vec<i16>,
    passable: Vec<i16>,
    value: Vec<i16>,
    entrance: Vec<i16>,
}

impl LevelGrid {
    fn new() -> Self {
        let cells = TARGET_SIZE * TARGET_SIZE;
        Self {
            class: vec![0; cells],
            subtype: vec![0; cells],
            passable: vec![0; cells],
            value: vec![0; cells],
            entrance: vec![0; cells],
        }
    }

    fn stamp_footprint(&mut self, object: &MapObject, template: &ObjectAttribute) {
        let (ox, oy) = (object.position.x as i32, object.position.y as i32);
        for row in 0..ObjectAttribute::FOOTPRINT_ROWS {
            for col in 0..ObjectAttribute::FOOTPRINT_COLS {
                // anchor is the bottom-right cell of the 8x6 footprint
                let tx = ox - 7 + col as i32;
                let ty = oy - 5 + row as i32;
                if !(0..TARGET_SIZE as i32).contains(&tx) || !(0..TARGET_SIZE as i32).contains(&ty)
                {
                    continue;
                }
                let cell = ty as usize * TARGET_SIZE + tx as usize;
                if template.is_blocked(row, col) {
                    self.passable[cell] = 0;
                }
                if template.is_entrance(row, col) {
                    self.entrance[cell] = 1;
                }
            }
        }
    }
}

fn clamp_i16(v: i64) -> i16 {
    v.clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

/// Rough desirability of an object: category base plus quantity and guard
/// strength terms.
pub fn object_value(object: &MapObject) -> i16 {
    let base: i64 = match object.category {
        ObjectCategory::Town | ObjectCategory::RandomTown => 1000,
        ObjectCategory::PandorasBox => 200,
        ObjectCategory::Dwelling | ObjectCategory::RandomDwellingAbSod => 150,
        ObjectCategory::SpellScroll => 150,
        ObjectCategory::Artifact => 100,
        ObjectCategory::Resource => 30,
        ObjectCategory::Monster => -50,
        _ => 0,
    };
    let quantity = match object.body.quantity() {
        Some(q) if q > 0 => ((q as f64 + 1.0).ln() * 10.0) as i64,
        _ => 0,
    };
    let guards: i64 = object.body.guards().iter().map(|g| g.count as i64).sum();
    clamp_i16(base + quantity + guards / 10)
}

pub struct TensorExporter;

impl TensorExporter {
    pub fn encode(&self, map: &Map, options: &ExportOptions) -> Vec<u8> {
        let levels = options.tile_levels(map);
        let size = map.info.map_size as usize;
        let visible = size.min(TARGET_SIZE);

        let mut w = BinaryWriter::with_capacity(
            20 + levels * TARGET_SIZE * TARGET_SIZE * CHANNELS * 2,
        );
        w.write_bytes(MAGIC);
        w.write_u32_le(TENSOR_VERSION);
        w.write_u32_le(TARGET_SIZE as u32);
        w.write_u32_le(levels as u32);
        w.write_u32_le(CHANNELS as u32);

        for z in 0..levels {
            let mut grid = LevelGrid::new();

            for y in 0..visible {
                for x in 0..visible {
                    let terrain = map.tile(x, y, z).map_or(0, |t| t.terrain_type);
                    let open = terrain != WATER && terrain != ROCK;
                    grid.passable[y * TARGET_SIZE + x] = open as i16;
                }
            }

            for object in options.objects(map).filter(|o| o.position.z as usize == z) {
                let Some(template) = map.template_of(object) else { continue };
                grid.stamp_footprint(object, template);

                let (ox, oy) = (object.position.x as usize, object.position.y as usize);
                if ox < TARGET_SIZE && oy < TARGET_SIZE {
                    let cell = oy * TARGET_SIZE + ox;
                    grid.class[cell] = clamp_i16(template.object_class as i64);
                    grid.subtype[cell] = clamp_i16(template.object_number as i64);
                    grid.value[cell] = object_value(object);
                }
            }

            for y in 0..TARGET_SIZE {
                for x in 0..TARGET_SIZE {
                    let cell = y * TARGET_SIZE + x;
                    let tile = if x < size && y < size { map.tile(x, y, z) } else { None };
                    w.write_i16_le(tile.map_or(OUTSIDE_TERRAIN, |t| t.terrain_type as i16));
                    w.write_i16_le(grid.class[cell]);
                    w.write_i16_le(grid.subtype[cell]);
                    w.write_i16_le(tile.map_or(0, |t| {
                        ((t.road_type & 0x0F) | ((t.river_type & 0x0F) << 4)) as i16
                    }));
                    w.write_i16_le(grid.passable[cell]);
                    w.write_i16_le(grid.value[cell]);
                    w.write_i16_le(grid.entrance[cell]);
                }
            }
        }
        w.into_vec()
    }
}

impl MapExporter for TensorExporter {
    fn format_name(&self) -> &'static str {
        "ml-tensor"
    }

    fn file_extension(&self) -> &'static str {
        ".bin"
    }

    fn export(&self, map: &Map, options: &ExportOptions, out: &mut dyn Write) -> Result<()> {
        out.write_all(&self.encode(map, options))?;
        Ok(())
    }
}
