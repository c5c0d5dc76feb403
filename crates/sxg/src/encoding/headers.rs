//! Canonical serialization of exchange metadata.
//!
//! The header block is a 2-element CBOR array of canonical maps — request
//! metadata, then response metadata. Pseudo-headers (`:method`, `:url`,
//! `:status`) and header fields alike are encoded as byte-string key/value
//! pairs, so map ordering depends only on the logical header set, never on
//! insertion order. Verifiers rebuild this block byte for byte; it is both
//! what gets signed and what the container carries.

use crate::exchange::HeaderMap;

use super::{Encoder, MapEncoder};

/// The request method is fixed: only GET responses are redistributable.
const METHOD: &[u8] = b"GET";

/// Serializes request URL/method and response status/headers as the
/// canonical header block.
pub fn exchange_header_block(
    request_url: &str,
    request_headers: &HeaderMap,
    response_status: u16,
    response_headers: &HeaderMap,
) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.array_header(2);

    let mut request = MapEncoder::new();
    request.entry(|k| k.bytes(b":method"), |v| v.bytes(METHOD));
    request.entry(|k| k.bytes(b":url"), |v| v.bytes(request_url.as_bytes()));
    for (name, value) in request_headers.iter() {
        request.entry(|k| k.bytes(name.as_bytes()), |v| v.bytes(value.as_bytes()));
    }
    request.finish(&mut enc);

    let status = response_status.to_string();
    let mut response = MapEncoder::new();
    response.entry(|k| k.bytes(b":status"), |v| v.bytes(status.as_bytes()));
    for (name, value) in response_headers.iter() {
        response.entry(|k| k.bytes(name.as_bytes()), |v| v.bytes(value.as_bytes()));
    }
    response.finish(&mut enc);

    enc.into_bytes()
}
