use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::debug;

use crate::error::{EncodingError, ValidationError};
use crate::mice;

/// Response headers that establish client-specific state (cookies, auth
/// challenges, session profiles). An exchange carrying one of these could be
/// replayed by an intermediary to set state it should not control, so their
/// presence is a hard construction error. Closed set; do not extend beyond
/// what the governing draft enumerates.
const STATEFUL_HEADERS: [&str; 10] = [
    "authentication-control",
    "authentication-info",
    "optional-www-authenticate",
    "proxy-authenticate",
    "proxy-authentication-info",
    "sec-websocket-accept",
    "set-cookie",
    "set-cookie2",
    "setprofile",
    "www-authenticate",
];

/// Ordered header map with a lower-cased-key invariant.
///
/// Keys are folded to lowercase at the single insertion point. Repeated
/// names are combined with `", "` in insertion order, the standard HTTP
/// field-combination rule, so every name maps to exactly one stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: BTreeMap<String, String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header value, combining with any value already stored under the
    /// same (case-insensitive) name.
    pub fn append(&mut self, name: &str, value: &str) {
        match self.entries.entry(name.to_ascii_lowercase()) {
            Entry::Occupied(mut entry) => {
                let combined = entry.get_mut();
                combined.push_str(", ");
                combined.push_str(value);
            }
            Entry::Vacant(entry) => {
                entry.insert(value.to_owned());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Entries in ascending byte order of the lower-cased name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for HeaderMap {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.append(name, value);
        }
        map
    }
}

/// Checks a header set against the stateful-header denylist.
///
/// Matching is case-insensitive; `HeaderMap` keys are already lower-cased.
fn reject_stateful_headers(headers: &HeaderMap) -> Result<(), ValidationError> {
    for (name, _) in headers.iter() {
        if STATEFUL_HEADERS.contains(&name) {
            return Err(ValidationError::StatefulHeader { name: name.to_owned() });
        }
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<(), ValidationError> {
    let malformed = || ValidationError::MalformedUrl(url.to_owned());
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(malformed)?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    if host.is_empty() {
        return Err(malformed());
    }
    if url.bytes().any(|b| b <= 0x20 || b == 0x7f) {
        return Err(malformed());
    }
    Ok(())
}

fn validate_status(status: u16) -> Result<(), ValidationError> {
    if !(100..=599).contains(&status) {
        return Err(ValidationError::InvalidStatus(status));
    }
    Ok(())
}

/// An HTTP request/response pair with a raw payload, ready for integrity
/// encoding.
///
/// The pipeline is a sequence of value transformations:
/// `Exchange` → [`encode_payload`](Exchange::encode_payload) →
/// [`EncodedExchange`] → [`sign`](EncodedExchange::sign) →
/// [`SignedExchange`]. Each step consumes its input, so a payload cannot be
/// integrity-encoded twice and a signed exchange cannot be re-signed.
#[derive(Debug, Clone)]
pub struct Exchange {
    request_url: String,
    request_headers: HeaderMap,
    response_status: u16,
    response_headers: HeaderMap,
    payload: Vec<u8>,
}

impl Exchange {
    /// Builds an exchange, validating the URL, status, and both header sets.
    ///
    /// The request method is always GET; only GET resources can be usefully
    /// redistributed.
    pub fn new(
        request_url: impl Into<String>,
        request_headers: HeaderMap,
        response_status: u16,
        response_headers: HeaderMap,
        payload: Vec<u8>,
    ) -> Result<Self, ValidationError> {
        let request_url = request_url.into();
        validate_url(&request_url)?;
        validate_status(response_status)?;
        reject_stateful_headers(&request_headers)?;
        reject_stateful_headers(&response_headers)?;
        Ok(Self {
            request_url,
            request_headers,
            response_status,
            response_headers,
            payload,
        })
    }

    /// Replaces the payload with its Merkle integrity encoding and records
    /// the content coding and digest in the response headers.
    pub fn encode_payload(mut self, record_size: usize) -> Result<EncodedExchange, EncodingError> {
        let encoded = mice::encode(&self.payload, record_size)?;
        self.response_headers.append("content-encoding", mice::CONTENT_ENCODING);
        self.response_headers
            .append("mi", &format!("{}={}", mice::CONTENT_ENCODING, encoded.digest));
        debug!(
            raw_len = self.payload.len(),
            encoded_len = encoded.body.len(),
            record_size,
            "integrity-encoded exchange payload"
        );
        Ok(EncodedExchange {
            request_url: self.request_url,
            request_headers: self.request_headers,
            response_status: self.response_status,
            response_headers: self.response_headers,
            payload: encoded.body,
            digest: encoded.digest,
        })
    }

    pub fn request_url(&self) -> &str {
        &self.request_url
    }

    pub fn request_headers(&self) -> &HeaderMap {
        &self.request_headers
    }

    pub fn response_status(&self) -> u16 {
        self.response_status
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// An exchange whose payload carries the `mi-sha256` content coding.
///
/// The response headers already include the integrity digest, so this is the
/// exact metadata the signature must cover.
#[derive(Debug, Clone)]
pub struct EncodedExchange {
    pub(crate) request_url: String,
    pub(crate) request_headers: HeaderMap,
    pub(crate) response_status: u16,
    pub(crate) response_headers: HeaderMap,
    pub(crate) payload: Vec<u8>,
    pub(crate) digest: String,
}

impl EncodedExchange {
    /// Signs the exchange metadata. Equivalent to
    /// [`Signer::sign`](crate::Signer::sign).
    pub fn sign<R: rand_core::CryptoRngCore>(
        self,
        signer: &mut crate::signing::Signer<R>,
    ) -> Result<SignedExchange, crate::error::SigningError> {
        signer.sign(self)
    }

    /// Base64 of the first integrity proof, as advertised in the `mi` header.
    pub fn integrity_digest(&self) -> &str {
        &self.digest
    }

    pub fn request_url(&self) -> &str {
        &self.request_url
    }

    pub fn request_headers(&self) -> &HeaderMap {
        &self.request_headers
    }

    pub fn response_status(&self) -> u16 {
        self.response_status
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// A fully signed exchange, ready for container serialization.
///
/// Holds the exact canonical header block bytes the signature covers, so the
/// container writer cannot drift from what was signed.
#[derive(Debug, Clone)]
pub struct SignedExchange {
    pub(crate) signature: String,
    pub(crate) header_block: Vec<u8>,
    pub(crate) payload: Vec<u8>,
    pub(crate) digest: String,
}

impl SignedExchange {
    /// The structured-header signature value, also suitable for transmission
    /// as a `Signature` response header.
    pub fn signature_header_value(&self) -> &str {
        &self.signature
    }

    /// Canonical CBOR serialization of the request and response metadata.
    pub fn header_block(&self) -> &[u8] {
        &self.header_block
    }

    /// The integrity-encoded payload stream.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn integrity_digest(&self) -> &str {
        &self.digest
    }

    /// Serializes the container to `sink`. Equivalent to
    /// [`write_exchange`](crate::writer::write_exchange).
    pub fn write_to<W: std::io::Write>(&self, sink: &mut W) -> Result<(), crate::error::WriteError> {
        crate::writer::write_exchange(sink, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &[u8] = b"Duis aute irure dolor in reprehenderit in voluptate velit.";

    fn response_headers() -> HeaderMap {
        HeaderMap::from_iter([("Content-Type", "text/html; charset=utf-8")])
    }

    fn new_exchange(headers: HeaderMap) -> Result<Exchange, ValidationError> {
        Exchange::new("https://example.com/", HeaderMap::new(), 200, headers, PAYLOAD.to_vec())
    }

    #[test]
    fn plain_response_headers_accepted() {
        assert!(new_exchange(response_headers()).is_ok());
    }

    #[test]
    fn set_cookie_rejected() {
        let mut headers = response_headers();
        headers.append("Set-Cookie", "wow, such cookie");
        let err = new_exchange(headers).unwrap_err();
        assert!(matches!(err, ValidationError::StatefulHeader { name } if name == "set-cookie"));
    }

    #[test]
    fn stateful_header_match_is_case_insensitive() {
        let mut headers = response_headers();
        headers.append("sEt-CoOkIe2", "v=1");
        assert!(new_exchange(headers).is_err());
    }

    #[test]
    fn setprofile_rejected() {
        let mut headers = response_headers();
        headers.append("setProfile", "profile X");
        assert!(new_exchange(headers).is_err());
    }

    #[test]
    fn stateful_request_header_rejected() {
        let mut request_headers = HeaderMap::new();
        request_headers.append("WWW-Authenticate", "Basic");
        let err = Exchange::new(
            "https://example.com/",
            request_headers,
            200,
            response_headers(),
            PAYLOAD.to_vec(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::StatefulHeader { .. }));
    }

    #[test]
    fn repeated_names_combine_with_comma_space() {
        let mut headers = HeaderMap::new();
        headers.append("Foo", "Bar");
        headers.append("fOo", "Baz");
        assert_eq!(headers.get("foo"), Some("Bar, Baz"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn keys_are_stored_lower_cased() {
        let mut headers = HeaderMap::new();
        headers.append("Content-Type", "text/html");
        assert_eq!(headers.iter().next(), Some(("content-type", "text/html")));
    }

    #[test]
    fn url_without_scheme_rejected() {
        let err =
            Exchange::new("example.com/", HeaderMap::new(), 200, HeaderMap::new(), vec![]).unwrap_err();
        assert!(matches!(err, ValidationError::MalformedUrl(_)));
    }

    #[test]
    fn url_without_host_rejected() {
        assert!(Exchange::new("https:///path", HeaderMap::new(), 200, HeaderMap::new(), vec![]).is_err());
    }

    #[test]
    fn url_with_whitespace_rejected() {
        assert!(
            Exchange::new("https://example.com/a b", HeaderMap::new(), 200, HeaderMap::new(), vec![])
                .is_err()
        );
    }

    #[test]
    fn http_scheme_accepted() {
        assert!(Exchange::new("http://example.com/", HeaderMap::new(), 200, HeaderMap::new(), vec![]).is_ok());
    }

    #[test]
    fn status_out_of_range_rejected() {
        for status in [0, 99, 600] {
            let err = Exchange::new(
                "https://example.com/",
                HeaderMap::new(),
                status,
                HeaderMap::new(),
                vec![],
            )
            .unwrap_err();
            assert!(matches!(err, ValidationError::InvalidStatus(s) if s == status));
        }
    }

    #[test]
    fn encode_payload_records_coding_and_digest() {
        let encoded = new_exchange(response_headers()).unwrap().encode_payload(16).unwrap();
        assert_eq!(encoded.response_headers().get("content-encoding"), Some("mi-sha256"));
        let mi = encoded.response_headers().get("mi").unwrap();
        assert_eq!(mi, format!("mi-sha256={}", encoded.integrity_digest()));
    }

    #[test]
    fn encode_payload_zero_record_size_leaves_exchange_untouched() {
        let exchange = new_exchange(response_headers()).unwrap();
        let err = exchange.clone().encode_payload(0).unwrap_err();
        assert!(matches!(err, EncodingError::InvalidRecordSize));
        // The original is still usable with a corrected record size.
        assert!(exchange.encode_payload(16).is_ok());
    }
}
