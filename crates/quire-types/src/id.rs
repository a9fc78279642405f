use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Number of random bytes behind every identifier.
pub const ID_BYTES: usize = 16;

/// Length of the hex-encoded identifier.
pub const ID_HEX_LEN: usize = ID_BYTES * 2;

/// Public, unguessable identifier of a publication.
///
/// A `PublicationId` is 16 bytes drawn from the operating system's CSPRNG
/// and is always rendered as 32 lowercase hex characters. The rendered form
/// contains only `[0-9a-f]`, so it is safe to use directly as a directory
/// name and as a URL path segment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicationId([u8; ID_BYTES]);

impl PublicationId {
    /// Draw a fresh identifier from the OS random source.
    ///
    /// Collisions are astronomically unlikely but callers that mint
    /// identifiers must still check existence before use.
    pub fn generate() -> Self {
        let mut bytes = [0u8; ID_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create an identifier from raw bytes.
    pub const fn from_bytes(bytes: [u8; ID_BYTES]) -> Self {
        Self(bytes)
    }

    /// The raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8; ID_BYTES] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters), for logs.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from the canonical 32-character lowercase hex form.
    ///
    /// Uppercase hex is rejected so that every identifier has exactly one
    /// spelling on disk and in URLs.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.len() != ID_HEX_LEN {
            return Err(TypeError::InvalidLength {
                expected: ID_HEX_LEN,
                actual: s.len(),
            });
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(TypeError::InvalidId(s.to_string()));
        }
        let bytes = hex::decode(s).map_err(|_| TypeError::InvalidId(s.to_string()))?;
        let mut arr = [0u8; ID_BYTES];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for PublicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicationId({})", self.short_hex())
    }
}

impl fmt::Display for PublicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for PublicationId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PublicationId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PublicationId> for String {
    fn from(id: PublicationId) -> Self {
        id.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_canonical_hex() {
        let id = PublicationId::generate();
        let hex = id.to_hex();
        assert_eq!(hex.len(), ID_HEX_LEN);
        assert!(hex.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
    }

    #[test]
    fn generated_ids_differ() {
        let a = PublicationId::generate();
        let b = PublicationId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn parse_accepts_display_form() {
        let id = PublicationId::from_bytes([0xab; ID_BYTES]);
        let parsed = PublicationId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = PublicationId::parse("abc").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: ID_HEX_LEN,
                actual: 3
            }
        );
    }

    #[test]
    fn parse_rejects_uppercase_and_traversal() {
        assert!(PublicationId::parse(&"AB".repeat(ID_BYTES)).is_err());
        let sneaky = format!("../{}", "a".repeat(ID_HEX_LEN - 3));
        assert!(matches!(
            PublicationId::parse(&sneaky),
            Err(TypeError::InvalidId(_))
        ));
    }

    #[test]
    fn serde_uses_hex_string() {
        let id = PublicationId::from_bytes([1; ID_BYTES]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(ID_BYTES)));
        let back: PublicationId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn serde_rejects_malformed_string() {
        let result: Result<PublicationId, _> = serde_json::from_str("\"not-an-id\"");
        assert!(result.is_err());
    }

    #[test]
    fn debug_is_short() {
        let id = PublicationId::from_bytes([0xcd; ID_BYTES]);
        assert_eq!(format!("{id:?}"), "PublicationId(cdcdcdcd)");
    }
}
