//! Merkle Integrity Content Encoding.
//!
//! The payload is split into fixed-size records and re-framed so a streaming
//! verifier can check each record as it arrives: every record except the
//! last is preceded by the record size and the hash chained over everything
//! that follows it. Only the first proof needs to arrive out of band (in the
//! `mi` header / signature), so nothing after the first record has to be
//! trusted before it is hashed.

use std::io::Write;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256};

use crate::error::EncodingError;

/// Content coding name advertised alongside the encoded payload.
pub const CONTENT_ENCODING: &str = "mi-sha256";

/// SHA-256 proof length embedded before each interior record.
pub const PROOF_LEN: usize = 32;

/// An integrity-encoded payload and its top-level digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiceEncoding {
    /// The re-framed payload stream.
    pub body: Vec<u8>,
    /// Base64 of the first proof; the value the signature's `integrity`
    /// parameter refers to.
    pub digest: String,
}

/// Encodes `payload` into records of `record_size` bytes, buffered.
///
/// Encoding the same payload twice changes the framing; apply this to the
/// original payload exactly once. The typestate on
/// [`Exchange`](crate::Exchange) enforces that for the pipeline.
pub fn encode(payload: &[u8], record_size: usize) -> Result<MiceEncoding, EncodingError> {
    let mut body = Vec::with_capacity(payload.len() + PROOF_LEN);
    let digest = encode_to(&mut body, payload, record_size)?;
    Ok(MiceEncoding { body, digest })
}

/// Streaming form of [`encode`]: emits the re-framed stream record by record
/// into `sink` and returns the digest.
pub fn encode_to<W: Write>(
    sink: &mut W,
    payload: &[u8],
    record_size: usize,
) -> Result<String, EncodingError> {
    if record_size == 0 {
        return Err(EncodingError::InvalidRecordSize);
    }

    // An empty payload still yields a single (empty) record. An exact
    // multiple of record_size yields a full-size final record, never an
    // empty trailing one.
    let records: Vec<&[u8]> = if payload.is_empty() {
        vec![&payload[..]]
    } else {
        payload.chunks(record_size).collect()
    };

    // Proofs chain back-to-front: each proof commits to its record and to
    // every record after it.
    let n = records.len();
    let mut proofs = vec![[0u8; PROOF_LEN]; n];
    proofs[n - 1] = Sha256::digest(records[n - 1]).into();
    for i in (0..n - 1).rev() {
        let mut hasher = Sha256::new();
        hasher.update(records[i]);
        hasher.update(proofs[i + 1]);
        proofs[i] = hasher.finalize().into();
    }

    for i in 0..n - 1 {
        sink.write_all(&(record_size as u64).to_be_bytes())?;
        sink.write_all(&proofs[i + 1])?;
        sink.write_all(records[i])?;
    }
    sink.write_all(records[n - 1])?;

    Ok(BASE64.encode(proofs[0]))
}
