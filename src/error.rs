use crate::codec::map_reader::Section;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("out of data at offset {offset}: need {need} bytes, have {have}")]
    OutOfData { offset: usize, need: usize, have: usize },

    #[error("{field} at offset {offset} too large: {len} (max {max})")]
    OversizedField { field: &'static str, offset: usize, len: usize, max: usize },

    #[error("unsupported map format {code:#x}")]
    UnsupportedFormat { code: u32 },

    #[error("failed to decode {section} at offset {offset}: {source}")]
    Section {
        section: Section,
        offset: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("decompression failed: {0}")]
    Decompress(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("export failed: {0}")]
    Export(String),
}

impl Error {
    /// Byte offset the failure points at, when it has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::OutOfData { offset, .. }
            | Error::OversizedField { offset, .. }
            | Error::Section { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
