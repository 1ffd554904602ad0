//! Tiled tile layer `data`: a plain array of gids, or base64 of a
//! little-endian `u32` stream, optionally zlib/gzip compressed.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use flate2::read::{GzDecoder, ZlibDecoder};
use serde::Deserialize;
use std::io::{self, Read};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TiledLayerData {
    Cells(Vec<u32>),
    Encoded(String),
}

/// Why a single layer could not be decoded. The layer is dropped, the map
/// still loads.
#[derive(Debug, Error)]
pub enum LayerDataError {
    #[error("unsupported layer compression `{0}`, use zlib, gzip or no compression")]
    UnsupportedCompression(String),

    #[error("unsupported layer encoding `{0}`")]
    UnsupportedEncoding(String),

    #[error("layer data does not match encoding `{encoding}`")]
    UnexpectedData { encoding: String },

    #[error("invalid base64 layer data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to inflate layer data: {0}")]
    Inflate(#[from] io::Error),
}

/// Decodes a layer's cells, one raw gid (flip bits included) per cell,
/// row-major.
pub fn decode_layer_data(
    data: &TiledLayerData,
    encoding: Option<&str>,
    compression: Option<&str>,
) -> Result<Vec<u32>, LayerDataError> {
    match (encoding.unwrap_or("csv"), data) {
        ("csv", TiledLayerData::Cells(cells)) => Ok(cells.clone()),
        ("base64", TiledLayerData::Encoded(text)) => {
            let bytes = BASE64.decode(text.trim())?;
            let bytes = decompress(bytes, compression.unwrap_or(""))?;
            Ok(le_u32_cells(&bytes))
        }
        (enc @ ("csv" | "base64"), _) => Err(LayerDataError::UnexpectedData {
            encoding: enc.to_owned(),
        }),
        (other, _) => Err(LayerDataError::UnsupportedEncoding(other.to_owned())),
    }
}

fn decompress(bytes: Vec<u8>, compression: &str) -> Result<Vec<u8>, LayerDataError> {
    let mut out = Vec::new();
    match compression {
        "" => return Ok(bytes),
        "zlib" => {
            ZlibDecoder::new(bytes.as_slice()).read_to_end(&mut out)?;
        }
        "gzip" => {
            GzDecoder::new(bytes.as_slice()).read_to_end(&mut out)?;
        }
        other => return Err(LayerDataError::UnsupportedCompression(other.to_owned())),
    }
    Ok(out)
}

fn le_u32_cells(bytes: &[u8]) -> Vec<u32> {
    let chunks = bytes.chunks_exact(4);
    if !chunks.remainder().is_empty() {
        debug!(trailing = chunks.remainder().len(), "ignoring trailing layer bytes");
    }
    chunks
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
