//! Content digest type.
//!
//! This module provides [`Digest`], a 256-bit content fingerprint. The same
//! byte content always produces the same digest, so comparing digests across
//! scan cycles detects modification without retaining file contents.
//!
//! Digests are rendered and persisted as 64-character lowercase hex strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of bytes in a digest.
pub const DIGEST_LEN: usize = 32;

/// A 256-bit content fingerprint.
///
/// Wraps the raw hash bytes in a newtype so a digest can never be confused
/// with arbitrary bytes. Displays as 64 lowercase hex characters and parses
/// back from the same form.
///
/// # Examples
///
/// ```
/// use vigil_core::Digest;
///
/// let digest: Digest = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
///     .parse()
///     .unwrap();
/// assert_eq!(digest.to_string().len(), 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Creates a digest from raw hash bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_core::Digest;
    ///
    /// let digest = Digest::from_bytes([0u8; 32]);
    /// assert_eq!(digest.as_bytes(), &[0u8; 32]);
    /// ```
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw hash bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Encodes the digest as a 64-character lowercase hex string.
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_core::Digest;
    ///
    /// let digest = Digest::from_bytes([0u8; 32]);
    /// assert_eq!(digest.to_hex(), "0".repeat(64));
    /// ```
    #[must_use]
    pub fn to_hex(&self) -> String {
        use std::fmt::Write;

        let mut out = String::with_capacity(DIGEST_LEN * 2);
        for byte in &self.0 {
            // Writing to a String cannot fail
            let _ = write!(out, "{byte:02x}");
        }
        out
    }

    /// Parses a digest from a 64-character hex string.
    ///
    /// Accepts both lowercase and uppercase hex digits.
    ///
    /// # Errors
    ///
    /// Returns [`DigestParseError::Length`] if the input is not exactly 64
    /// characters, or [`DigestParseError::InvalidHex`] if any character is
    /// not a hex digit.
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_core::Digest;
    ///
    /// let hex = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
    /// let digest = Digest::parse_hex(hex).unwrap();
    /// assert_eq!(digest.to_hex(), hex);
    ///
    /// assert!(Digest::parse_hex("deadbeef").is_err());
    /// ```
    pub fn parse_hex(hex: &str) -> Result<Self, DigestParseError> {
        if hex.len() != DIGEST_LEN * 2 {
            return Err(DigestParseError::Length(hex.len()));
        }

        let mut bytes = [0u8; DIGEST_LEN];
        for (index, chunk) in hex.as_bytes().chunks_exact(2).enumerate() {
            let pair = std::str::from_utf8(chunk)
                .map_err(|_| DigestParseError::InvalidHex(index * 2))?;
            bytes[index] = u8::from_str_radix(pair, 16)
                .map_err(|_| DigestParseError::InvalidHex(index * 2))?;
        }

        Ok(Self(bytes))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for Digest {
    type Err = DigestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::parse_hex(&hex).map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing a digest from hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DigestParseError {
    /// The input was not exactly 64 characters long.
    #[error("digest must be 64 hex characters, got {0}")]
    Length(usize),

    /// A non-hex character was found at the given byte offset.
    #[error("invalid hex digit at offset {0}")]
    InvalidHex(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_hex_round_trip() {
        let digest = Digest::parse_hex(HELLO_SHA256).unwrap();
        assert_eq!(digest.to_hex(), HELLO_SHA256);
        assert_eq!(digest.to_string(), HELLO_SHA256);
    }

    #[test]
    fn test_parse_uppercase() {
        let upper = HELLO_SHA256.to_uppercase();
        let digest = Digest::parse_hex(&upper).unwrap();
        assert_eq!(digest.to_hex(), HELLO_SHA256);
    }

    #[test]
    fn test_parse_rejects_bad_length() {
        assert_eq!(
            Digest::parse_hex("abcd"),
            Err(DigestParseError::Length(4))
        );
        let long = "0".repeat(66);
        assert_eq!(Digest::parse_hex(&long), Err(DigestParseError::Length(66)));
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        let bad = format!("zz{}", &HELLO_SHA256[2..]);
        assert_eq!(Digest::parse_hex(&bad), Err(DigestParseError::InvalidHex(0)));
    }

    #[test]
    fn test_equality_is_bytewise() {
        let a = Digest::from_bytes([7u8; 32]);
        let b = Digest::from_bytes([7u8; 32]);
        let c = Digest::from_bytes([8u8; 32]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let digest = Digest::parse_hex(HELLO_SHA256).unwrap();
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{HELLO_SHA256}\""));

        let parsed: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, digest);
    }
}
