use std::io::Write;

use super::{ExportOptions, MapExporter, MapSections};
use crate::error::Result;
use crate::model::info::bitmask_indices;
use crate::model::{Map, VictoryCondition};

/// Objects listed before the summary line.
const MAX_LISTED_OBJECTS: usize = 100;
/// Suffix bytes shown in the hex preview.
const SUFFIX_PREVIEW: usize = 256;

/// Human-readable summary.
pub struct TextExporter;

impl MapExporter for TextExporter {
    fn format_name(&self) -> &'static str {
        "text"
    }

    fn file_extension(&self) -> &'static str {
        ".txt"
    }

    fn export(&self, map: &Map, options: &ExportOptions, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "=== H3M Map Export ===")?;

        if options.includes(MapSections::HEADER) {
            writeln!(out, "Name:        {}", map.info.name)?;
            writeln!(out, "Format:      {} ({:#x})", map.format, map.format.code())?;
            writeln!(
                out,
                "Size:        {0}x{0}, {1} level(s)",
                map.info.map_size,
                map.info.levels()
            )?;
            writeln!(out, "Description: {}", map.info.description)?;
        }

        if options.includes(MapSections::PLAYERS) {
            writeln!(out, "\n--- Players ---")?;
            for p in map.players.iter().filter(|p| p.is_playable()) {
                let town = if p.main_town.is_some() { "Yes" } else { "No" };
                let hero = p.main_hero.as_ref().map_or("Random", |h| h.name.as_str());
                writeln!(out, "Player {}: Town={}, Hero={}", p.id, town, hero)?;
            }
        }

        if options.includes(MapSections::ADDITIONAL_INFO) {
            let info = &map.additional;
            writeln!(out, "\n--- Conditions ---")?;
            match &info.victory {
                VictoryCondition::None => writeln!(out, "Victory:     default")?,
                VictoryCondition::Special { allow_normal_victory, goal, .. } => writeln!(
                    out,
                    "Victory:     type {} {:?}{}",
                    goal.tag(),
                    goal,
                    if *allow_normal_victory { ", or default" } else { "" }
                )?,
            }
            writeln!(out, "Loss:        {:?}", info.loss)?;
            let heroes = bitmask_indices(&info.available_heroes, info.available_heroes.len() * 8);
            writeln!(out, "Heroes:      {} available", heroes.len())?;
        }

        if options.includes(MapSections::OBJECTS) {
            let objects: Vec<_> = options.objects(map).collect();
            writeln!(out, "\n--- Objects ({}) ---", objects.len())?;
            for object in objects.iter().take(MAX_LISTED_OBJECTS) {
                let def = map.template_of(object).map_or("Unknown", |t| t.def.as_str());
                writeln!(
                    out,
                    "{} {} (Idx: {}) {:?}",
                    object.position, def, object.template_index, object.category
                )?;
            }
            if objects.len() > MAX_LISTED_OBJECTS {
                writeln!(out, "... and {} more.", objects.len() - MAX_LISTED_OBJECTS)?;
            }
        }

        if let Some(suffix) = map.unparsed_suffix.as_deref().filter(|s| !s.is_empty()) {
            writeln!(out, "\n--- Unparsed Suffix ({} bytes) ---", suffix.len())?;
            let hex: Vec<_> = suffix
                .iter()
                .take(SUFFIX_PREVIEW)
                .map(|b| format!("{:02X}", b))
                .collect();
            writeln!(out, "{}", hex.join(" "))?;
            if suffix.len() > SUFFIX_PREVIEW {
                writeln!(out, "...")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_map;
    use crate::model::VictoryGoal;

    fn render(map: &Map, options: &ExportOptions) -> String {
        let mut out = Vec::new();
        TextExporter.export(map, options, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_summary_lists_surface_objects() {
        let map = test_map::sample();
        let options = ExportOptions::with_sections(MapSections::all() - MapSections::UNDERGROUND);
        let text = render(&map, &options);
        assert!(text.contains("Name:        Sample"));
        assert!(text.contains("Size:        4x4, 2 level(s)"));
        assert!(text.contains("Player 0: Town=No, Hero=Random"));
        assert!(text.contains("--- Objects (1) ---"));
        assert!(text.contains("(2,1,0) avwmon1.def (Idx: 0) Monster"));
        assert!(!text.contains("avgpike0.def"));
    }

    #[test]
    fn test_conditions_block() {
        let mut map = test_map::sample();
        map.additional.victory = VictoryCondition::Special {
            allow_normal_victory: true,
            applies_to_ai: false,
            goal: VictoryGoal::Unknown { tag: 13 },
        };
        map.additional.available_heroes = vec![0b0000_0101, 0x80];
        let text = render(&map, &ExportOptions::with_sections(MapSections::ADDITIONAL_INFO));
        assert!(text.contains("Victory:     type 13 Unknown { tag: 13 }, or default"));
        assert!(text.contains("Loss:        None"));
        assert!(text.contains("Heroes:      3 available"));
        assert!(!text.contains("--- Objects"));
    }

    #[test]
    fn test_suffix_preview_is_capped() {
        let mut map = test_map::sample();
        map.unparsed_suffix = Some(vec![0xAB; 300]);
        let text = render(&map, &ExportOptions::with_sections(MapSections::empty()));
        assert!(text.contains("--- Unparsed Suffix (300 bytes) ---"));
        assert_eq!(text.matches("AB").count(), SUFFIX_PREVIEW);
        assert!(text.trim_end().ends_with("..."));
    }
}
