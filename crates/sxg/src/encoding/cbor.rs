//! Minimal canonical CBOR writer.
//!
//! Only what the exchange format needs: definite-length byte strings, text
//! strings, unsigned integers, arrays, and maps. Canonical form per RFC 7049
//! §3.9 — integer heads use the shortest possible encoding and map entries
//! are sorted by the byte-wise order of their encoded keys, so two encoders
//! given the same logical content produce identical bytes.

pub struct Encoder {
    out: Vec<u8>,
}

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_BYTES: u8 = 2;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;

impl Encoder {
    pub fn new() -> Self {
        Self { out: Vec::new() }
    }

    fn head(&mut self, major: u8, arg: u64) {
        let major = major << 5;
        match arg {
            0..=0x17 => self.out.push(major | arg as u8),
            0x18..=0xff => {
                self.out.push(major | 24);
                self.out.push(arg as u8);
            }
            0x100..=0xffff => {
                self.out.push(major | 25);
                self.out.extend_from_slice(&(arg as u16).to_be_bytes());
            }
            0x1_0000..=0xffff_ffff => {
                self.out.push(major | 26);
                self.out.extend_from_slice(&(arg as u32).to_be_bytes());
            }
            _ => {
                self.out.push(major | 27);
                self.out.extend_from_slice(&arg.to_be_bytes());
            }
        }
    }

    pub fn unsigned(&mut self, value: u64) {
        self.head(MAJOR_UNSIGNED, value);
    }

    pub fn bytes(&mut self, value: &[u8]) {
        self.head(MAJOR_BYTES, value.len() as u64);
        self.out.extend_from_slice(value);
    }

    pub fn text(&mut self, value: &str) {
        self.head(MAJOR_TEXT, value.len() as u64);
        self.out.extend_from_slice(value.as_bytes());
    }

    pub fn array_header(&mut self, len: usize) {
        self.head(MAJOR_ARRAY, len as u64);
    }

    /// Splices in an already-encoded CBOR item.
    pub fn raw(&mut self, encoded: &[u8]) {
        self.out.extend_from_slice(encoded);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a canonical map: entries may be added in any order and are sorted
/// by encoded key bytes when the map is finished.
pub struct MapEncoder {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl MapEncoder {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn entry(
        &mut self,
        key: impl FnOnce(&mut Encoder),
        value: impl FnOnce(&mut Encoder),
    ) {
        let mut key_enc = Encoder::new();
        key(&mut key_enc);
        let mut value_enc = Encoder::new();
        value(&mut value_enc);
        self.entries.push((key_enc.into_bytes(), value_enc.into_bytes()));
    }

    pub fn finish(mut self, enc: &mut Encoder) {
        // The head byte of a definite-length string embeds its length, so
        // sorting encoded keys lexicographically yields the canonical
        // shorter-key-first order.
        self.entries.sort();
        enc.head(MAJOR_MAP, self.entries.len() as u64);
        for (key, value) in &self.entries {
            enc.raw(key);
            enc.raw(value);
        }
    }
}

impl Default for MapEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unsigned(value: u64) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.unsigned(value);
        enc.into_bytes()
    }

    #[test]
    fn unsigned_heads_are_minimal_length() {
        assert_eq!(unsigned(0), [0x00]);
        assert_eq!(unsigned(23), [0x17]);
        assert_eq!(unsigned(24), [0x18, 24]);
        assert_eq!(unsigned(255), [0x18, 0xff]);
        assert_eq!(unsigned(256), [0x19, 0x01, 0x00]);
        assert_eq!(unsigned(65535), [0x19, 0xff, 0xff]);
        assert_eq!(unsigned(65536), [0x1a, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(unsigned(1517418800), [0x1a, 0x5a, 0x72, 0x07, 0xb0]);
        assert_eq!(
            unsigned(0x1_0000_0000),
            [0x1b, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn byte_and_text_strings() {
        let mut enc = Encoder::new();
        enc.bytes(b"foo");
        assert_eq!(enc.into_bytes(), [0x43, b'f', b'o', b'o']);

        let mut enc = Encoder::new();
        enc.text("foo");
        assert_eq!(enc.into_bytes(), [0x63, b'f', b'o', b'o']);

        let mut enc = Encoder::new();
        enc.bytes(b"");
        assert_eq!(enc.into_bytes(), [0x40]);
    }

    #[test]
    fn long_string_head_widens() {
        let mut enc = Encoder::new();
        enc.bytes(&[0u8; 24]);
        let out = enc.into_bytes();
        assert_eq!(&out[..2], &[0x58, 24]);
        assert_eq!(out.len(), 2 + 24);
    }

    #[test]
    fn map_keys_sort_shorter_first() {
        let mut map = MapEncoder::new();
        map.entry(|k| k.bytes(b"aaa"), |v| v.unsigned(1));
        map.entry(|k| k.bytes(b"zz"), |v| v.unsigned(2));
        let mut enc = Encoder::new();
        map.finish(&mut enc);
        // "zz" is shorter, so it sorts before "aaa" despite 'z' > 'a'.
        assert_eq!(
            enc.into_bytes(),
            [0xa2, 0x42, b'z', b'z', 0x02, 0x43, b'a', b'a', b'a', 0x01]
        );
    }

    #[test]
    fn map_is_insertion_order_independent() {
        let entries: [(&[u8], u64); 3] = [(b":status", 1), (b"content-type", 2), (b"mi", 3)];
        let mut forward = MapEncoder::new();
        for (key, value) in entries {
            forward.entry(|k| k.bytes(key), |v| v.unsigned(value));
        }
        let mut backward = MapEncoder::new();
        for (key, value) in entries.iter().rev() {
            backward.entry(|k| k.bytes(key), |v| v.unsigned(*value));
        }
        let mut a = Encoder::new();
        forward.finish(&mut a);
        let mut b = Encoder::new();
        backward.finish(&mut b);
        assert_eq!(a.into_bytes(), b.into_bytes());
    }

    #[test]
    fn array_header_counts_items() {
        let mut enc = Encoder::new();
        enc.array_header(2);
        enc.unsigned(1);
        enc.unsigned(2);
        assert_eq!(enc.into_bytes(), [0x82, 0x01, 0x02]);
    }
}
