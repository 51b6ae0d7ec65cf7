use serde::Deserialize;

/// Sanity ceilings and recovery bounds for one decode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Template counts above this are treated as garbage.
    pub max_templates: usize,
    /// Object counts above this are rejected outright.
    pub max_objects: usize,
    /// Ceiling for counted sub-lists (town events, backpacks, rumors, ...).
    pub max_sub_list: usize,
    /// Tile counts at or above this leave the tile array empty.
    pub max_tiles: usize,
    /// Bytes scanned after a broken object before giving up.
    pub resync_window: usize,
    /// Candidate offsets tried within the window.
    pub resync_attempts: usize,
    /// Bytes scanned for a plausible template table when no object decoded.
    pub template_scan_window: usize,
    /// Largest unparsed suffix kept on the map.
    pub max_suffix: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_templates: 5000,
            max_objects: 0x20000,
            max_sub_list: 1000,
            max_tiles: 1_000_000,
            resync_window: 5000,
            resync_attempts: 100,
            template_scan_window: 100_000,
            max_suffix: 32 * 1024 * 1024,
        }
    }
}
