//! Allow-listed asset identifiers

use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Assets that may appear in a pool
///
/// Serialized by display name (`"Apples"`). Pool naming orders assets by that
/// display name, not by declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    Apples,
    Bananas,
    Carrots,
    Lemons,
    Limes,
    Onions,
    Oranges,
    Pears,
    Potatoes,
    Tomatoes,
}

impl Asset {
    pub const ALL: [Asset; 10] = [
        Asset::Apples,
        Asset::Bananas,
        Asset::Carrots,
        Asset::Lemons,
        Asset::Limes,
        Asset::Onions,
        Asset::Oranges,
        Asset::Pears,
        Asset::Potatoes,
        Asset::Tomatoes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Asset::Apples => "Apples",
            Asset::Bananas => "Bananas",
            Asset::Carrots => "Carrots",
            Asset::Lemons => "Lemons",
            Asset::Limes => "Limes",
            Asset::Onions => "Onions",
            Asset::Oranges => "Oranges",
            Asset::Pears => "Pears",
            Asset::Potatoes => "Potatoes",
            Asset::Tomatoes => "Tomatoes",
        }
    }

    /// Display names of every allowed asset
    pub fn supported_names() -> Vec<&'static str> {
        Self::ALL.iter().map(Asset::as_str).collect()
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Asset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|asset| asset.as_str() == s)
            .ok_or(ValidationError::InvalidAssetName)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_and_unknown_names() {
        assert_eq!("Apples".parse::<Asset>().unwrap(), Asset::Apples);
        assert_eq!("Tomatoes".parse::<Asset>().unwrap(), Asset::Tomatoes);
        assert_eq!(
            "Durian".parse::<Asset>().unwrap_err(),
            ValidationError::InvalidAssetName
        );
        // names are case sensitive
        assert!("apples".parse::<Asset>().is_err());
    }

    #[test]
    fn test_serde_uses_display_name() {
        let json = serde_json::to_string(&Asset::Potatoes).unwrap();
        assert_eq!(json, "\"Potatoes\"");
        assert!(serde_json::from_str::<Asset>("\"Kiwis\"").is_err());
    }
}
