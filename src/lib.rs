//! H3M Map Decoder
//!
//! Decodes Heroes of Might and Magic III scenario files (RoE, AB, SoD,
//! HotA and WoG generations) into an owned [`Map`], recovering from
//! corrupt or partially unknown object data where the format allows it.

pub mod codec;
pub mod error;
pub mod export;
pub mod model;

pub use codec::{
    decode, decode_reader, decode_with, object_category, DecodeOptions, Decoded, FormatVersion,
    ObjectCategory, Warning,
};
pub use error::{Error, Result};
pub use export::{available_exporters, exporter_for, ExportOptions, MapExporter, MapSections};
pub use model::{Map, MapObject, ObjectAttribute, ObjectBody, Position};
