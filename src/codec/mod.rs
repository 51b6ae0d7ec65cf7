pub mod diagnostics;
pub mod map_reader;
pub mod meta;
pub mod object_parsers;
pub mod options;
pub mod reader;
pub mod resync;
pub mod source;
pub mod version;
pub mod writer;

#[cfg(test)]
pub(crate) mod fixtures;

pub use diagnostics::Warning;
pub use map_reader::{decode, decode_reader, decode_with, Decoded, MapDecoder, Section};
pub use meta::{object_category, ObjectCategory};
pub use options::DecodeOptions;
pub use reader::BinaryReader;
pub use source::{decompress_if_needed, read_source, Container};
pub use version::{Features, FormatVersion};
pub use writer::BinaryWriter;
