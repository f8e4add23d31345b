use crate::hex;
use blake3::Hash;
use serde::{Deserialize, Serialize};

use std::{fmt::Display, str::FromStr};

/// An identifier for a particular piece of binary content.
/// Under the hood, this is a [`blake3`] hash.
///
/// It is displayed, serialized, and parsed in hexadecimal format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(Hash);

/// Number of hexadecimal characters in an abbreviated [`ObjectId`].
pub const SHORT_LEN: usize = 7;

impl ObjectId {
    /// The abbreviated form used when listing merge parents.
    pub fn short(&self) -> String {
        let mut s = self.to_string();
        s.truncate(SHORT_LEN);
        s
    }

    /// Whether the hexadecimal form of this id begins with `prefix`.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.to_string().starts_with(&prefix.to_ascii_lowercase())
    }
}

impl Ord for ObjectId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.as_bytes().cmp(other.0.as_bytes())
    }
}

impl PartialOrd for ObjectId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::Hex(self.0.as_bytes()))
    }
}

impl From<&Vec<u8>> for ObjectId {
    fn from(vec: &Vec<u8>) -> Self {
        ObjectId(blake3::hash(vec))
    }
}

impl From<&[u8]> for ObjectId {
    fn from(bytes: &[u8]) -> Self {
        ObjectId(blake3::hash(bytes))
    }
}

/// Failure to parse a full-length hexadecimal [`ObjectId`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display(fmt = "malformed object id: {:?}", _0)]
pub struct ParseObjectIdError(String);

impl std::error::Error for ParseObjectIdError {}

impl FromStr for ObjectId {
    type Err = ParseObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; blake3::OUT_LEN] = hex::decode(s)
            .and_then(|v| v.try_into().ok())
            .ok_or_else(|| ParseObjectIdError(s.to_string()))?;
        Ok(ObjectId(Hash::from(bytes)))
    }
}

impl Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s: String = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[test]
fn test_parse_display_round_trip() {
    let b: &[u8] = b"wug.txt";
    let id = ObjectId::from(b);
    let hex = id.to_string();
    assert_eq!(hex.len(), 64);
    assert_eq!(hex.parse::<ObjectId>().unwrap(), id);
    assert!(id.has_prefix(&hex[..5]));
    assert_eq!(id.short(), hex[..SHORT_LEN]);
    assert!("not hex".parse::<ObjectId>().is_err());
    assert!(hex[..10].parse::<ObjectId>().is_err());
}

#[test]
fn test_serde_as_hex_string() {
    let b: &[u8] = b"hello, world";
    let id = ObjectId::from(b);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{}\"", id));
    let id_: ObjectId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, id_);
}
