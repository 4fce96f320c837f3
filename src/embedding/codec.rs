//! Binary codec for embedding vectors.
//!
//! Vectors are stored as contiguous little-endian `f32` values with no
//! header or length prefix.

use thiserror::Error;

/// Size of one encoded element in bytes.
const F32_BYTES: usize = std::mem::size_of::<f32>();

/// Errors that can occur while decoding a stored vector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("corrupt embedding data: {len} bytes is not a multiple of 4")]
    CorruptData { len: usize },
}

/// Encodes a vector as little-endian `f32` bytes.
pub fn encode(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * F32_BYTES);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decodes little-endian `f32` bytes back into a vector.
pub fn decode(bytes: &[u8]) -> Result<Vec<f32>, CodecError> {
    if bytes.len() % F32_BYTES != 0 {
        return Err(CodecError::CorruptData { len: bytes.len() });
    }

    Ok(bytes
        .chunks_exact(F32_BYTES)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
