use crate::codec::ObjectCategory;

/// Non-fatal anomaly met while decoding. Returned in order alongside the map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Warning {
    #[error("object #{index} at offset {offset}: unknown object class {class}, no body consumed")]
    UnknownObjectCategory { index: usize, offset: usize, class: u32 },

    #[error("object #{index} at offset {offset}: body length of {category:?} (class {class}) cannot be determined")]
    UndeterminedBody { index: usize, offset: usize, class: u32, category: ObjectCategory },

    #[error("object #{index} at offset {offset} rejected: {reason}")]
    ObjectRejected { index: usize, offset: usize, reason: String },

    #[error("object list resynchronized from offset {from} to {to}")]
    Resynced { from: usize, to: usize },

    #[error("no object header found after offset {offset}; kept {decoded} of {declared} objects")]
    ResyncFailed { offset: usize, decoded: usize, declared: usize },

    #[error("object list ends at offset {offset} after {decoded} of {declared} objects")]
    ObjectListTruncated { offset: usize, decoded: usize, declared: usize },

    #[error("unknown {kind} condition {tag:#x} at offset {offset}, no payload read")]
    UnknownCondition { kind: &'static str, tag: u8, offset: usize },

    #[error("{field} {count} at offset {offset} exceeds {max}, section skipped")]
    OversizedCount { field: &'static str, offset: usize, count: usize, max: usize },

    #[error("{list} at offset {offset} abandoned: {reason}")]
    SubListFailed { list: &'static str, offset: usize, reason: String },

    #[error("template table stopped at offset {offset} after {decoded} of {declared}: {reason}")]
    TemplatesTruncated { offset: usize, decoded: usize, declared: usize, reason: String },

    #[error("template table re-read from offset {to} (section started at {from})")]
    TemplateTableRecovered { from: usize, to: usize },

    #[error("tile section skipped: {count} tiles is not plausible")]
    TilesSkipped { count: usize },

    #[error("unparsed suffix of {total} bytes truncated to {kept}")]
    SuffixTruncated { total: usize, kept: usize },
}

/// Decode-scoped warning sink.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.warnings
    }
}
