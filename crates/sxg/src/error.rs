//! Error types for each stage of the exchange pipeline.
//!
//! Every stage either succeeds and hands back the next usable state, or
//! fails without having mutated anything the caller still holds.

/// Rejected at [`Exchange`](crate::Exchange) construction; no exchange is produced.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The header would let an intermediary establish client-specific state,
    /// which a redistributable signed exchange must not do.
    #[error("stateful header not allowed in a signed exchange: {name}")]
    StatefulHeader { name: String },
    #[error("request URL must be an absolute http(s) URL: {0:?}")]
    MalformedUrl(String),
    #[error("response status out of range (expected 100-599): {0}")]
    InvalidStatus(u16),
}

/// Payload integrity encoding failed; the original payload is untouched.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("record size must be a positive number of bytes")]
    InvalidRecordSize,
    #[error("writing encoded record: {0}")]
    Io(#[from] std::io::Error),
}

/// Signing failed; no signature was attached and the exchange can be
/// re-signed with a corrected configuration.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("certificate chain is empty")]
    NoCertificate,
    #[error("signature expiry must be later than its date")]
    InvalidValidityWindow,
    #[error("signature generation failed: {0}")]
    Signature(#[from] signature::Error),
}

/// Key material could not be turned into a usable signing key.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("malformed PKCS#1 RSA private key: {0}")]
    Pkcs1(#[from] rsa::pkcs1::Error),
    #[error("malformed private key: {0}")]
    MalformedKey(String),
    #[error("unsupported key type (expected RSA or ECDSA P-256)")]
    UnsupportedKeyType,
}

/// Certificate material could not be turned into a DER chain.
#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("malformed PEM certificate: {0}")]
    Pem(#[from] std::io::Error),
    #[error("no certificates found in PEM input")]
    NoCertificates,
}

/// Container serialization failed.
///
/// `SectionTooLarge` is raised before any byte reaches the sink, so a
/// too-large section never produces partial output.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The container's length prefixes are 3 bytes wide, a protocol
    /// constraint that caps each section at 16,777,215 bytes.
    #[error("{section} section of {len} bytes exceeds the 3-byte length limit")]
    SectionTooLarge { section: &'static str, len: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
