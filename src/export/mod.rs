//! Renderers over a decoded [`Map`].

pub mod json;
pub mod tensor;
pub mod text;

use std::io::Write;

use bitflags::bitflags;

use crate::error::Result;
use crate::model::{Map, MapObject};

pub use json::JsonExporter;
pub use tensor::TensorExporter;
pub use text::TextExporter;

bitflags! {
    /// Parts of the map an exporter should emit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MapSections: u8 {
        /// Format and basic info
        const HEADER = 1 << 0;
        const PLAYERS = 1 << 1;
        /// Victory/loss conditions, availability masks, rumors, hero settings
        const ADDITIONAL_INFO = 1 << 2;
        const TILES = 1 << 3;
        /// Templates and placed objects
        const OBJECTS = 1 << 4;
        /// Include level 1 tiles and objects
        const UNDERGROUND = 1 << 5;
    }
}

impl MapSections {
    /// Parse one section name as accepted on the command line.
    pub fn parse_section(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "header" => Some(Self::HEADER),
            "players" => Some(Self::PLAYERS),
            "additional" | "additional-info" => Some(Self::ADDITIONAL_INFO),
            "tiles" => Some(Self::TILES),
            "objects" => Some(Self::OBJECTS),
            "underground" => Some(Self::UNDERGROUND),
            "basic" => Some(Self::HEADER | Self::PLAYERS),
            "full" | "all" => Some(Self::all()),
            _ => None,
        }
    }
}

pub type ObjectFilter = Box<dyn Fn(&MapObject) -> bool>;

/// What to export. With no explicit filter, level 1 objects are dropped
/// unless `UNDERGROUND` is set.
pub struct ExportOptions {
    pub sections: MapSections,
    pub object_filter: Option<ObjectFilter>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { sections: MapSections::all(), object_filter: None }
    }
}

impl std::fmt::Debug for ExportOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportOptions")
            .field("sections", &self.sections)
            .field("object_filter", &self.object_filter.is_some())
            .finish()
    }
}

impl ExportOptions {
    pub fn with_sections(sections: MapSections) -> Self {
        Self { sections, object_filter: None }
    }

    /// Surface only: drop the underground flag and keep z = 0 objects.
    pub fn exclude_underground(&mut self) {
        self.sections.remove(MapSections::UNDERGROUND);
        self.object_filter = Some(Box::new(|o: &MapObject| !o.position.is_underground()));
    }

    pub fn includes(&self, section: MapSections) -> bool {
        self.sections.contains(section)
    }

    pub fn accepts(&self, object: &MapObject) -> bool {
        match &self.object_filter {
            Some(filter) => filter(object),
            None => {
                self.includes(MapSections::UNDERGROUND) || !object.position.is_underground()
            }
        }
    }

    pub fn objects<'m>(&'m self, map: &'m Map) -> impl Iterator<Item = &'m MapObject> + 'm {
        map.objects.iter().filter(move |o| self.accepts(o))
    }

    /// Number of levels whose tiles should be emitted.
    pub fn tile_levels(&self, map: &Map) -> usize {
        if self.includes(MapSections::UNDERGROUND) {
            map.info.levels()
        } else {
            1
        }
    }
}

pub trait MapExporter {
    /// Registry key, matched case-insensitively.
    fn format_name(&self) -> &'static str;

    /// Default file extension, including the dot.
    fn file_extension(&self) -> &'static str;

    fn export(&self, map: &Map, options: &ExportOptions, out: &mut dyn Write) -> Result<()>;
}

pub fn available_exporters() -> Vec<Box<dyn MapExporter>> {
    vec![Box::new(JsonExporter), Box::new(TextExporter), Box::new(TensorExporter)]
}

pub fn exporter_for(name: &str) -> Option<Box<dyn MapExporter>> {
    available_exporters()
        .into_iter()
        .find(|e| e.format_name().eq_ignore_ascii_case(name))
}
