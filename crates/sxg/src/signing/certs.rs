use sha2::{Digest, Sha256};

use crate::error::CertificateError;

/// A single DER-encoded certificate. Trust-chain validation is out of
/// scope; only the encoded bytes matter here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
}

impl Certificate {
    pub fn from_der(der: Vec<u8>) -> Self {
        Self { der }
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// SHA-256 over the encoded form, the `cert-sha256` signature parameter.
    pub fn sha256(&self) -> [u8; 32] {
        Sha256::digest(&self.der).into()
    }
}

/// Ordered certificate chain, leaf first. Immutable once constructed and
/// safe to share read-only across concurrent signing operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateChain {
    certs: Vec<Certificate>,
}

impl CertificateChain {
    pub fn from_der_chain(ders: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            certs: ders.into_iter().map(Certificate::from_der).collect(),
        }
    }

    /// Parses a PEM bundle, preserving certificate order.
    pub fn from_pem(pem: &str) -> Result<Self, CertificateError> {
        let mut reader = pem.as_bytes();
        let certs = rustls_pemfile::certs(&mut reader)
            .map(|der| der.map(|der| Certificate::from_der(der.as_ref().to_vec())))
            .collect::<Result<Vec<_>, _>>()?;
        if certs.is_empty() {
            return Err(CertificateError::NoCertificates);
        }
        Ok(Self { certs })
    }

    pub fn leaf(&self) -> Option<&Certificate> {
        self.certs.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Certificate> {
        self.certs.iter()
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }
}
