mod cbor;
mod headers;
mod structured;

pub use cbor::{Encoder, MapEncoder};
pub use headers::exchange_header_block;
pub(crate) use structured::{SignatureParams, signature_header_value};
