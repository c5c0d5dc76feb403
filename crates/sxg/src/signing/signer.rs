use std::time::{SystemTime, UNIX_EPOCH};

use rand_core::CryptoRngCore;
use tracing::debug;

use crate::encoding::{
    Encoder, MapEncoder, SignatureParams, exchange_header_block, signature_header_value,
};
use crate::error::SigningError;
use crate::exchange::{EncodedExchange, SignedExchange};

use super::{CertificateChain, PrivateKey};

/// Context string separating exchange signatures from any other use of the
/// same key.
const CONTEXT_STRING: &str = "HTTP Exchange";

/// Configuration for one signing operation.
///
/// Everything but `rng` is read-only; the randomness source supplies the
/// PSS salt or ECDSA nonce, which is why signing takes `&mut self`. A fixed
/// source makes the whole pipeline reproducible.
pub struct Signer<R> {
    /// Signature issuance instant.
    pub date: SystemTime,
    /// Signature expiry; must be later than `date`.
    pub expires: SystemTime,
    /// Chain the signature is bound to, leaf first.
    pub certs: CertificateChain,
    /// Where clients can fetch the chain.
    pub cert_url: String,
    /// Where clients can fetch signature validity updates.
    pub validity_url: String,
    pub key: PrivateKey,
    pub rng: R,
}

fn unix_seconds(instant: SystemTime) -> u64 {
    instant
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Builds the canonical byte string the signature is computed over:
/// 64 bytes of 0x20 padding, the context string, a zero separator, then a
/// canonical CBOR map binding the certificate, validity window, validity URL
/// and the serialized exchange metadata. A verifier reconstructs this
/// byte-for-byte, so the layout is protocol-fixed.
pub(crate) fn signing_message(
    cert_sha256: &[u8],
    validity_url: &str,
    date: u64,
    expires: u64,
    header_block: &[u8],
) -> Vec<u8> {
    let mut message = vec![0x20u8; 64];
    message.extend_from_slice(CONTEXT_STRING.as_bytes());
    message.push(0);

    let mut map = MapEncoder::new();
    map.entry(|k| k.text("certSha256"), |v| v.bytes(cert_sha256));
    map.entry(|k| k.text("validityUrl"), |v| v.text(validity_url));
    map.entry(|k| k.text("date"), |v| v.unsigned(date));
    map.entry(|k| k.text("expires"), |v| v.unsigned(expires));
    map.entry(|k| k.text("headers"), |v| v.raw(header_block));
    let mut enc = Encoder::new();
    map.finish(&mut enc);
    message.extend_from_slice(&enc.into_bytes());
    message
}

impl<R: CryptoRngCore> Signer<R> {
    /// Signs the exchange metadata and attaches the structured signature
    /// header value.
    ///
    /// Single attempt, no retry semantics: on failure the exchange value has
    /// been consumed but nothing else changed, and the caller may rebuild
    /// and re-sign with a corrected configuration.
    pub fn sign(&mut self, exchange: EncodedExchange) -> Result<SignedExchange, SigningError> {
        if self.expires <= self.date {
            return Err(SigningError::InvalidValidityWindow);
        }
        let leaf = self.certs.leaf().ok_or(SigningError::NoCertificate)?;
        let cert_sha256 = leaf.sha256();
        let date = unix_seconds(self.date);
        let expires = unix_seconds(self.expires);

        let header_block = exchange_header_block(
            &exchange.request_url,
            &exchange.request_headers,
            exchange.response_status,
            &exchange.response_headers,
        );
        let message = signing_message(&cert_sha256, &self.validity_url, date, expires, &header_block);

        let Self { key, rng, .. } = self;
        let signature = key.sign(&message, rng)?;

        let value = signature_header_value(&SignatureParams {
            signature: &signature,
            validity_url: &self.validity_url,
            cert_url: &self.cert_url,
            cert_sha256: &cert_sha256,
            date,
            expires,
        });
        debug!(
            url = %exchange.request_url,
            date,
            expires,
            signature_len = signature.len(),
            "signed exchange"
        );
        Ok(SignedExchange {
            signature: value,
            header_block,
            payload: exchange.payload,
            digest: exchange.digest,
        })
    }
}
