use std::borrow::Cow;
use std::io::Read;

use flate2::read::{MultiGzDecoder, ZlibDecoder};

use crate::error::{Error, Result};

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];
const ZLIB_CMF: u8 = 0x78;

/// Compression container detected at the start of a map source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Plain,
    Gzip,
    Zlib,
    Zstd,
}

pub fn sniff(data: &[u8]) -> Container {
    if data.starts_with(&GZIP_MAGIC) {
        Container::Gzip
    } else if data.starts_with(&ZSTD_MAGIC) {
        Container::Zstd
    } else if data.len() >= 2
        && data[0] == ZLIB_CMF
        && u16::from_be_bytes([data[0], data[1]]) % 31 == 0
    {
        Container::Zlib
    } else {
        Container::Plain
    }
}

/// Materialize a possibly compressed map into an uncompressed buffer.
/// Plain input is borrowed as-is.
pub fn decompress_if_needed(data: &[u8]) -> Result<Cow<'_, [u8]>> {
    let container = sniff(data);
    let decompressed = match container {
        Container::Plain => return Ok(Cow::Borrowed(data)),
        Container::Gzip => {
            let mut decoder = MultiGzDecoder::new(data);
            let mut out = Vec::new();
            decoder
                .read_to_end(&mut out)
                .map_err(|e| Error::Decompress(format!("gzip error: {}", e)))?;
            out
        }
        Container::Zlib => {
            let mut decoder = ZlibDecoder::new(data);
            let mut out = Vec::new();
            decoder
                .read_to_end(&mut out)
                .map_err(|e| Error::Decompress(format!("zlib error: {}", e)))?;
            out
        }
        Container::Zstd => zstd::decode_all(data)
            .map_err(|e| Error::Decompress(format!("zstd error: {}", e)))?,
    };
    tracing::debug!(
        ?container,
        compressed = data.len(),
        decompressed = decompressed.len(),
        "materialized compressed map source"
    );
    Ok(Cow::Owned(decompressed))
}

/// Read a whole stream into memory and decompress it if needed.
pub fn read_source(mut input: impl Read) -> Result<Vec<u8>> {
    let mut raw = Vec::new();
    input.read_to_end(&mut raw)?;
    Ok(decompress_if_needed(&raw)?.into_owned())
}
