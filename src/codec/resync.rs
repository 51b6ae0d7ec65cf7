//! Recovery searches for the object list.
//!
//! Both searches are pure: they inspect the buffer and return a candidate
//! offset. The decoder decides whether to commit the cursor there.

use super::ObjectCategory;
use crate::error::Error;
use crate::model::ObjectAttribute;

/// Position (3 bytes) + template index (u32).
pub const OBJECT_HEADER_LEN: usize = 7;

/// Placement header including the 5 reserved bytes before the body.
pub const OBJECT_RECORD_HEADER_LEN: usize = OBJECT_HEADER_LEN + 5;

/// Side used for coordinate checks when the map declares size 0.
const FALLBACK_MAP_SIZE: u32 = 255;

/// Bytes left unscanned at the end of the buffer by the template search.
const TEMPLATE_SCAN_TAIL: usize = 20;

/// Why one object record could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum Desync {
    #[error("template index {index} out of range ({count} templates)")]
    TemplateOutOfRange { index: u32, count: usize },

    #[error("body length of {category:?} (class {class}) cannot be determined")]
    UndeterminedBody { class: u32, category: ObjectCategory },

    #[error(transparent)]
    Read(#[from] Error),
}

/// Bounds for the object-header search.
#[derive(Debug, Clone, Copy)]
pub struct ResyncContext<'t> {
    pub map_size: u32,
    pub templates: &'t [ObjectAttribute],
    pub window: usize,
    pub max_attempts: usize,
}

/// Does the data at `pos` look like an object placement header?
pub fn plausible_object_header(
    data: &[u8],
    pos: usize,
    map_size: u32,
    templates: &[ObjectAttribute],
) -> bool {
    let Some(header) = pos
        .checked_add(OBJECT_HEADER_LEN)
        .and_then(|end| data.get(pos..end))
    else {
        return false;
    };
    let size = if map_size == 0 { FALLBACK_MAP_SIZE } else { map_size };
    let (x, y, z) = (header[0] as u32, header[1] as u32, header[2]);
    let index = u32::from_le_bytes([header[3], header[4], header[5], header[6]]) as usize;

    x < size
        && y < size
        && z <= 1
        && templates
            .get(index)
            .is_some_and(|t| t.def.chars().count() > 3)
}

/// First plausible object header at or after `from`, within the window and
/// attempt budget.
pub fn find_object_header(data: &[u8], from: usize, ctx: &ResyncContext<'_>) -> Option<usize> {
    let limit = data.len().min(from.saturating_add(ctx.window));
    let hit = (from..)
        .take_while(|pos| pos + OBJECT_HEADER_LEN <= limit)
        .take(ctx.max_attempts)
        .find(|&pos| plausible_object_header(data, pos, ctx.map_size, ctx.templates));
    if let Some(pos) = hit {
        tracing::trace!(from, pos, "object header candidate");
    }
    hit
}

/// Does the data at `pos` look like the start of a template table: a sane
/// count followed by a `.def` name of sane length?
pub fn plausible_template_table(data: &[u8], pos: usize) -> bool {
    let read_u32 = |at: usize| -> Option<u32> {
        let bytes = data.get(at..at.checked_add(4)?)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    };

    let Some(count) = read_u32(pos) else { return false };
    if !(1..2000).contains(&count) {
        return false;
    }
    let Some(name_len) = read_u32(pos + 4) else { return false };
    if !(5..50).contains(&name_len) {
        return false;
    }
    let start = pos + 8;
    let Some(name) = data.get(start..start + name_len as usize) else {
        return false;
    };
    name.len() >= 4 && name[name.len() - 4..].eq_ignore_ascii_case(b".def")
}

/// Scan forward from `from` for a plausible template table.
pub fn find_template_table(data: &[u8], from: usize, window: usize) -> Option<usize> {
    let limit = data
        .len()
        .saturating_sub(TEMPLATE_SCAN_TAIL)
        .min(from.saturating_add(window));
    let hit = (from..limit).find(|&pos| plausible_template_table(data, pos));
    if let Some(pos) = hit {
        tracing::trace!(from, pos, "template table candidate");
    }
    hit
}
