//! Asset identifiers.
//!
//! Identifiers are assigned by the remote store on upload and are opaque to
//! the panel. The total order on [`AssetId`] exists only to break ties between
//! assets that share an order index.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A server-assigned asset identifier.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(u64);

impl AssetId {
    /// Wrap a raw identifier as returned by the store.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw identifier.
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for AssetId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl FromStr for AssetId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_transparent() {
        let id = AssetId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: AssetId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_parse() {
        assert_eq!(" 7 ".parse::<AssetId>().unwrap(), AssetId::new(7));
        assert!("seven".parse::<AssetId>().is_err());
    }
}
