//! Binary container serialization.
//!
//! Layout: magic (`0x00`-terminated), two 3-byte big-endian section lengths,
//! the signature header value, the canonical header block, then the
//! integrity-encoded payload as the unprefixed rest of the stream.

use std::io::Write;

use tracing::debug;

use crate::error::WriteError;
use crate::exchange::SignedExchange;

/// Magic byte sequence opening the container, including its `0x00`
/// terminator. Pinned to the wire-format version this crate targets.
pub const HEADER_MAGIC: &[u8] = b"sxg1-b0\x00";

/// 3-byte length prefixes cap each section at this many bytes; a protocol
/// constraint, not an implementation limit.
pub const SECTION_LENGTH_LIMIT: usize = 0xff_ffff;

fn encode_section_length(len: usize, section: &'static str) -> Result<[u8; 3], WriteError> {
    if len > SECTION_LENGTH_LIMIT {
        return Err(WriteError::SectionTooLarge { section, len });
    }
    let be = (len as u32).to_be_bytes();
    Ok([be[1], be[2], be[3]])
}

/// Decodes a 3-byte big-endian section length, for consumers splitting a
/// container back into sections.
pub fn decode_section_length(encoded: [u8; 3]) -> usize {
    u32::from_be_bytes([0, encoded[0], encoded[1], encoded[2]]) as usize
}

/// Serializes the finished exchange to `sink`.
///
/// Both section lengths are validated before the first byte is written, so
/// an oversized section never leaves partial output; I/O errors surface
/// as-is with no retry (the format has no mid-section resumption points).
pub fn write_exchange<W: Write>(sink: &mut W, exchange: &SignedExchange) -> Result<(), WriteError> {
    let signature = exchange.signature_header_value().as_bytes();
    let header_block = exchange.header_block();
    let signature_length = encode_section_length(signature.len(), "signature")?;
    let header_length = encode_section_length(header_block.len(), "headers")?;

    sink.write_all(HEADER_MAGIC)?;
    sink.write_all(&signature_length)?;
    sink.write_all(&header_length)?;
    sink.write_all(signature)?;
    sink.write_all(header_block)?;
    sink.write_all(exchange.payload())?;
    debug!(
        signature_len = signature.len(),
        header_len = header_block.len(),
        payload_len = exchange.payload().len(),
        "wrote exchange container"
    );
    Ok(())
}
