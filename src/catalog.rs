//! Option Catalog - Server-Declared Attribute Domains
//!
//! The catalog is fetched once per session and never mutated afterwards.
//! `color` is the shared domain for both base and pattern color.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Hair code meaning "no hair layer".
pub const NO_HAIR: i64 = 0;

/// One of the six configurable facets of a seal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Eyes,
    Mouth,
    Hair,
    Pattern,
    BaseColor,
    PatternColor,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::Eyes,
        Attribute::Mouth,
        Attribute::Hair,
        Attribute::Pattern,
        Attribute::BaseColor,
        Attribute::PatternColor,
    ];

    /// Field name used in request bodies.
    pub fn wire_name(self) -> &'static str {
        match self {
            Attribute::Eyes => "eyes",
            Attribute::Mouth => "mouth",
            Attribute::Hair => "hair",
            Attribute::Pattern => "pattern",
            Attribute::BaseColor => "base_color",
            Attribute::PatternColor => "pattern_color",
        }
    }

    /// Catalog key holding this attribute's legal values.
    pub fn domain_key(self) -> &'static str {
        match self {
            Attribute::BaseColor | Attribute::PatternColor => "color",
            other => other.wire_name(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown attribute: {0}")]
pub struct AttributeParseError(pub String);

impl FromStr for Attribute {
    type Err = AttributeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "eyes" => Ok(Attribute::Eyes),
            "mouth" => Ok(Attribute::Mouth),
            "hair" => Ok(Attribute::Hair),
            "pattern" => Ok(Attribute::Pattern),
            "base_color" | "basecolor" => Ok(Attribute::BaseColor),
            "pattern_color" | "patterncolor" => Ok(Attribute::PatternColor),
            _ => Err(AttributeParseError(s.to_string())),
        }
    }
}

/// Legal integer codes per attribute, in server order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionCatalog {
    pub eyes: Vec<i64>,
    pub mouth: Vec<i64>,
    pub hair: Vec<i64>,
    pub pattern: Vec<i64>,
    pub color: Vec<i64>,
}

impl OptionCatalog {
    pub fn domain(&self, attribute: Attribute) -> &[i64] {
        match attribute {
            Attribute::Eyes => &self.eyes,
            Attribute::Mouth => &self.mouth,
            Attribute::Hair => &self.hair,
            Attribute::Pattern => &self.pattern,
            Attribute::BaseColor | Attribute::PatternColor => &self.color,
        }
    }

    pub fn contains(&self, attribute: Attribute, value: i64) -> bool {
        self.domain(attribute).contains(&value)
    }

    /// First legal value of an attribute's domain, if any.
    pub fn first(&self, attribute: Attribute) -> Option<i64> {
        self.domain(attribute).first().copied()
    }

    /// Names of domains that came back empty. A usable catalog has none.
    pub fn empty_domains(&self) -> Vec<&'static str> {
        [
            ("eyes", &self.eyes),
            ("mouth", &self.mouth),
            ("hair", &self.hair),
            ("pattern", &self.pattern),
            ("color", &self.color),
        ]
        .into_iter()
        .filter(|(_, values)| values.is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Availability of the catalog for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CatalogState {
    #[default]
    NotLoaded,
    Loading,
    Loaded(OptionCatalog),
    Failed(String),
}

impl CatalogState {
    pub fn catalog(&self) -> Option<&OptionCatalog> {
        match self {
            CatalogState::Loaded(catalog) => Some(catalog),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, CatalogState::Loaded(_))
    }

    /// Presentation view: anything short of a loaded or failed catalog reads as "loading".
    pub fn is_pending(&self) -> bool {
        matches!(self, CatalogState::NotLoaded | CatalogState::Loading)
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            CatalogState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}
