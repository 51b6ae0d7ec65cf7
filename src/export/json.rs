use std::io::Write;

use serde_json::{json, Map as JsonObject, Value};

use super::{ExportOptions, MapExporter, MapSections};
use crate::error::{Error, Result};
use crate::model::Map;

/// Pretty-printed JSON document with one key per selected section.
pub struct JsonExporter;

fn section_value<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::Export(format!("json: {}", e)))
}

impl JsonExporter {
    pub fn to_value(&self, map: &Map, options: &ExportOptions) -> Result<Value> {
        let mut doc = JsonObject::new();

        if options.includes(MapSections::HEADER) {
            doc.insert("format".into(), json!(map.format.code()));
            doc.insert("format_name".into(), json!(map.format.name()));
            if let Some(hota) = &map.hota {
                doc.insert("hota".into(), section_value(hota)?);
            }
            doc.insert("info".into(), section_value(&map.info)?);
        }
        if options.includes(MapSections::PLAYERS) {
            doc.insert("players".into(), section_value(&map.players)?);
        }
        if options.includes(MapSections::ADDITIONAL_INFO) {
            doc.insert("additional".into(), section_value(&map.additional)?);
        }
        if options.includes(MapSections::TILES) {
            let size = map.info.map_size as usize;
            let take = size.saturating_mul(size).saturating_mul(options.tile_levels(map));
            let tiles: Vec<_> = map.tiles.iter().take(take).collect();
            doc.insert("tiles".into(), section_value(&tiles)?);
        }
        if options.includes(MapSections::OBJECTS) {
            doc.insert("templates".into(), section_value(&map.templates)?);
            let objects: Vec<_> = options.objects(map).collect();
            doc.insert("objects".into(), section_value(&objects)?);
        }
        if let Some(suffix) = &map.unparsed_suffix {
            doc.insert("unparsed_suffix_len".into(), json!(suffix.len()));
        }
        Ok(Value::Object(doc))
    }
}

impl MapExporter for JsonExporter {
    fn format_name(&self) -> &'static str {
        "json"
    }

    fn file_extension(&self) -> &'static str {
        ".json"
    }

    fn export(&self, map: &Map, options: &ExportOptions, out: &mut dyn Write) -> Result<()> {
        let doc = self.to_value(map, options)?;
        serde_json::to_writer_pretty(&mut *out, &doc)
            .map_err(|e| Error::Export(format!("json: {}", e)))?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_map;

    #[test]
    fn test_sections_select_keys() {
        let map = test_map::sample();
        let options = ExportOptions::with_sections(MapSections::HEADER | MapSections::TILES);
        let doc = JsonExporter.to_value(&map, &options).unwrap();

        assert_eq!(doc["format"], json!(0x1C));
        assert_eq!(doc["info"]["name"], json!("Sample"));
        assert_eq!(doc["tiles"].as_array().map(|t| t.len()), Some(16));
        assert!(doc.get("players").is_none());
        assert!(doc.get("objects").is_none());
    }

    #[test]
    fn test_objects_respect_filter() {
        let map = test_map::sample();
        let doc = JsonExporter
            .to_value(&map, &ExportOptions::with_sections(MapSections::OBJECTS))
            .unwrap();
        assert_eq!(doc["templates"].as_array().map(|t| t.len()), Some(2));
        let objects = doc["objects"].as_array().unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0]["category"], json!("Monster"));
        assert_eq!(objects[0]["body"]["Monster"]["count"], json!(20));
    }

    #[test]
    fn test_export_writes_parseable_json() {
        let map = test_map::sample();
        let mut out = Vec::new();
        JsonExporter.export(&map, &ExportOptions::default(), &mut out).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["tiles"].as_array().map(|t| t.len()), Some(32));
        assert_eq!(parsed["players"].as_array().map(|p| p.len()), Some(8));
    }
}
