//! Content fingerprints.
//!
//! A fingerprint is the SHA-256 digest of a source workbook, a rendered schema
//! or a data blob. It is stored base64-encoded in the persisted cache.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt::{self, Write as _};

/// SHA-256 digest of some content.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Fingerprint(Vec<u8>);

impl Fingerprint {
    /// Fingerprint a single byte slice.
    pub fn of(data: &[u8]) -> Self {
        Self(Sha256::digest(data).to_vec())
    }

    /// Fingerprint a sequence of lines, each terminated by `\n`.
    ///
    /// The result equals `Fingerprint::of` over the joined file text.
    pub fn of_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hasher = Sha256::new();
        for line in lines {
            hasher.update(line.as_ref().as_bytes());
            hasher.update(b"\n");
        }
        Self(hasher.finalize().to_vec())
    }

    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex rendering, used in log output.
    pub fn to_hex(&self) -> String {
        let mut hex = String::with_capacity(self.0.len() * 2);
        for byte in &self.0 {
            let _ = write!(hex, "{:02x}", byte);
        }
        hex
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.as_bytes())
            .map(Fingerprint)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_match_joined_text() {
        let lines = ["syntax = \"proto2\";", "", "message A {", "}"];
        let text = "syntax = \"proto2\";\n\nmessage A {\n}\n";
        assert_eq!(Fingerprint::of_lines(lines), Fingerprint::of(text.as_bytes()));
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            Fingerprint::of(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hex_of_raw_bytes() {
        assert_eq!(Fingerprint::from_bytes(vec![0x00, 0x0f, 0xa0, 0xff]).to_hex(), "000fa0ff");
        assert_eq!(Fingerprint::default().to_hex(), "");
    }

    #[test]
    fn test_serde_base64() {
        let fp = Fingerprint::from_bytes(vec![0xde, 0xad, 0xbe, 0xef]);
        let json = serde_json::to_string(&fp).expect("serialize");
        assert_eq!(json, "\"3q2+7w==\"");
        let back: Fingerprint = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, fp);
    }
}
