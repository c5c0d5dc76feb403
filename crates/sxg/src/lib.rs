//! Signed HTTP Exchange (SXG) encoding and signing.
//!
//! Produces a self-contained, verifiable binary snapshot of an HTTP response
//! that untrusted intermediaries can redistribute. The pipeline is a strict
//! sequence of value transformations:
//! [`Exchange::new`] → [`Exchange::encode_payload`] →
//! [`EncodedExchange::sign`] → [`SignedExchange::write_to`].

pub mod encoding;
pub mod error;
pub mod exchange;
pub mod mice;
pub mod signing;
pub mod writer;

pub use error::{
    CertificateError, EncodingError, KeyError, SigningError, ValidationError, WriteError,
};
pub use exchange::{EncodedExchange, Exchange, HeaderMap, SignedExchange};
pub use signing::{Certificate, CertificateChain, PrivateKey, Signer};
pub use writer::{HEADER_MAGIC, decode_section_length, write_exchange};
