//! Target marketplaces and their metadata constraints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// ============================================================================
// Marketplace
// ============================================================================

/// Print-on-demand storefront the metadata is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    /// Spreadshirt: short title, short description, exactly 25 tags.
    #[default]
    Spreadshirt,
    /// TeePublic: main tag plus 25 secondary tags.
    TeePublic,
    /// Zazzle: at most 10 tags.
    Zazzle,
}

impl Marketplace {
    /// Returns the display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Spreadshirt => "Spreadshirt",
            Self::TeePublic => "TeePublic",
            Self::Zazzle => "Zazzle",
        }
    }

    /// Returns all marketplaces.
    pub fn all() -> &'static [Marketplace] {
        &[Self::Spreadshirt, Self::TeePublic, Self::Zazzle]
    }

    /// Returns the constraint table for this marketplace.
    pub fn constraints(&self) -> MarketConstraints {
        match self {
            Self::Spreadshirt => MarketConstraints {
                title_max_chars: 50,
                description_max_chars: 200,
                tag_floor: Some(25),
                tag_ceiling: Some(25),
                requests_main_tag: false,
            },
            Self::TeePublic => MarketConstraints {
                title_max_chars: 100,
                description_max_chars: 1000,
                tag_floor: Some(25),
                tag_ceiling: Some(25),
                requests_main_tag: true,
            },
            Self::Zazzle => MarketConstraints {
                title_max_chars: 100,
                description_max_chars: 2000,
                tag_floor: None,
                tag_ceiling: Some(10),
                requests_main_tag: false,
            },
        }
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Marketplace {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spreadshirt" | "spreadshop" => Ok(Self::Spreadshirt),
            "teepublic" | "tee-public" => Ok(Self::TeePublic),
            "zazzle" => Ok(Self::Zazzle),
            other => Err(CoreError::InvalidConfig(format!("unknown marketplace: {other}"))),
        }
    }
}

// ============================================================================
// Constraints
// ============================================================================

/// Limits the normalizer enforces for one marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketConstraints {
    /// Maximum title length in characters.
    pub title_max_chars: usize,
    /// Maximum description length in characters.
    pub description_max_chars: usize,
    /// Minimum tag count; shorter lists are padded.
    pub tag_floor: Option<usize>,
    /// Maximum tag count; longer lists are truncated.
    pub tag_ceiling: Option<usize>,
    /// Whether the prompt asks for a `mainTag`.
    pub requests_main_tag: bool,
}

impl MarketConstraints {
    /// Returns the exact tag count when floor and ceiling agree.
    pub fn exact_tag_count(&self) -> Option<usize> {
        match (self.tag_floor, self.tag_ceiling) {
            (Some(floor), Some(ceiling)) if floor == ceiling => Some(floor),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spreadshirt_constraints() {
        let c = Marketplace::Spreadshirt.constraints();
        assert_eq!(c.title_max_chars, 50);
        assert_eq!(c.description_max_chars, 200);
        assert_eq!(c.exact_tag_count(), Some(25));
        assert!(!c.requests_main_tag);
    }

    #[test]
    fn test_teepublic_requests_main_tag() {
        let c = Marketplace::TeePublic.constraints();
        assert!(c.requests_main_tag);
        assert_eq!(c.exact_tag_count(), Some(25));
    }

    #[test]
    fn test_zazzle_has_ceiling_only() {
        let c = Marketplace::Zazzle.constraints();
        assert_eq!(c.tag_floor, None);
        assert_eq!(c.tag_ceiling, Some(10));
        assert_eq!(c.exact_tag_count(), None);
    }

    #[test]
    fn test_parse_marketplace() {
        assert_eq!("TeePublic".parse::<Marketplace>().unwrap(), Marketplace::TeePublic);
        assert_eq!(" spreadshirt".parse::<Marketplace>().unwrap(), Marketplace::Spreadshirt);
        assert!("redbubble".parse::<Marketplace>().is_err());
    }
}
