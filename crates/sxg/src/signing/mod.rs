mod certs;
mod keys;
mod signer;

pub use certs::{Certificate, CertificateChain};
pub use keys::PrivateKey;
pub use signer::Signer;
