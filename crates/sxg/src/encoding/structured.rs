//! Structured-header formatting of the signature value.
//!
//! A label token followed by `;`-separated parameters. The syntax does not
//! require a particular parameter order, but verifiers compare byte for
//! byte, so the order here is protocol-fixed: `sig`, `validity-url`,
//! `integrity`, `cert-url`, `cert-sha256`, `date`, `expires`. Binary
//! parameters are base64 inside `*` delimiters, strings are quoted,
//! timestamps are bare integers.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

const SIGNATURE_LABEL: &str = "label";

/// Payload integrity scheme referenced by the `integrity` parameter.
const INTEGRITY_SCHEME: &str = "mi";

pub(crate) struct SignatureParams<'a> {
    pub signature: &'a [u8],
    pub validity_url: &'a str,
    pub cert_url: &'a str,
    pub cert_sha256: &'a [u8],
    pub date: u64,
    pub expires: u64,
}

/// Serializes a structured-header quoted string: `"` delimiters, with `\`
/// and `"` backslash-escaped and every other byte emitted verbatim.
fn quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

pub(crate) fn signature_header_value(params: &SignatureParams<'_>) -> String {
    format!(
        "{label}; sig=*{sig}*; validity-url={validity_url}; integrity={integrity}; \
         cert-url={cert_url}; cert-sha256=*{cert_sha256}*; date={date}; expires={expires}",
        label = SIGNATURE_LABEL,
        sig = BASE64.encode(params.signature),
        validity_url = quoted(params.validity_url),
        integrity = quoted(INTEGRITY_SCHEME),
        cert_url = quoted(params.cert_url),
        cert_sha256 = BASE64.encode(params.cert_sha256),
        date = params.date,
        expires = params.expires,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_parameters_in_protocol_order() {
        let value = signature_header_value(&SignatureParams {
            signature: &[1, 2, 3],
            validity_url: "https://example.com/resource.validity",
            cert_url: "https://example.com/cert.msg",
            cert_sha256: &[0xab; 32],
            date: 1517418800,
            expires: 1517422400,
        });
        assert_eq!(
            value,
            "label; sig=*AQID*; validity-url=\"https://example.com/resource.validity\"; \
             integrity=\"mi\"; cert-url=\"https://example.com/cert.msg\"; \
             cert-sha256=*q6urq6urq6urq6urq6urq6urq6urq6urq6urq6urq6s=*; \
             date=1517418800; expires=1517422400"
        );
    }

    #[test]
    fn quoted_strings_escape_only_backslash_and_quote() {
        let value = signature_header_value(&SignatureParams {
            signature: &[1],
            validity_url: "https://example.com/\"quo\\ted\".validity",
            cert_url: "https://example.com/naïve-ü.msg",
            cert_sha256: &[0; 32],
            date: 1,
            expires: 2,
        });
        assert!(value.contains(r#"validity-url="https://example.com/\"quo\\ted\".validity""#));
        // Non-ASCII bytes pass through verbatim, never as \u escapes.
        assert!(value.contains("cert-url=\"https://example.com/naïve-ü.msg\""));
        assert!(!value.contains("\\u"));
    }
}
