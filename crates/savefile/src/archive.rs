use crate::{Result, SavefileError};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde_json::Value;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

/// Read and decode an archive file.
///
/// Layout: 4-byte little-endian unsigned length of the decompressed payload,
/// then a zlib stream inflating to a UTF-8 JSON document. A header/payload
/// length disagreement means the file would not be loadable by its consumer,
/// so it is rejected here rather than patched over.
pub fn read_archive(path: &Path) -> Result<Value> {
    let raw = fs::read(path)?;
    if raw.len() < 4 {
        return Err(SavefileError::Truncated(raw.len()));
    }
    let declared = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;

    let mut payload = Vec::with_capacity(declared);
    ZlibDecoder::new(&raw[4..])
        .read_to_end(&mut payload)
        .map_err(SavefileError::Decompress)?;

    if payload.len() != declared {
        return Err(SavefileError::LengthMismatch {
            declared,
            actual: payload.len(),
        });
    }

    log::info!(
        "read archive {} ({} bytes, decompressed {})",
        path.display(),
        raw.len(),
        payload.len()
    );
    Ok(serde_json::from_slice(&payload)?)
}

/// Encode and write an archive file.
///
/// The length header is recomputed from the serialized JSON so the stored
/// value always equals the true decompressed byte length.
pub fn write_archive(path: &Path, document: &Value) -> Result<()> {
    let payload = serde_json::to_vec(document)?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&payload)?;
    let compressed = encoder.finish()?;

    let mut out = Vec::with_capacity(4 + compressed.len());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&compressed);
    fs::write(path, &out)?;

    log::info!("wrote archive {} ({} bytes)", path.display(), out.len());
    Ok(())
}

/// Write a pretty-printed JSON sibling of the decoded document.
pub fn export_json(path: &Path, document: &Value) -> Result<()> {
    let pretty = serde_json::to_vec_pretty(document)?;
    fs::write(path, pretty)?;
    log::info!("exported JSON to {}", path.display());
    Ok(())
}
