//! Selection State - the user's current choice per attribute
//!
//! Writes are total: no domain check happens here. Use
//! [`crate::validation::is_legal`] at the boundary that offers values.

use serde::{Deserialize, Serialize};

use crate::catalog::{Attribute, OptionCatalog, NO_HAIR};

/// A full set of six attribute values.
///
/// `Selection` is `Copy`; every operation that reads it takes a snapshot.
/// Serializes with wire names (`base_color`, `pattern_color`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub eyes: i64,
    pub mouth: i64,
    pub hair: i64,
    pub pattern: i64,
    pub base_color: i64,
    pub pattern_color: i64,
}

impl Default for Selection {
    /// Values shown before the catalog arrives.
    fn default() -> Self {
        Self {
            eyes: 1,
            mouth: 1,
            hair: NO_HAIR,
            pattern: 1,
            base_color: 1,
            pattern_color: 1,
        }
    }
}

impl Selection {
    /// Seed from the first element of each domain. Both colors take `color[0]`.
    ///
    /// Returns `None` if any domain is empty.
    pub fn seeded_from(catalog: &OptionCatalog) -> Option<Self> {
        Some(Self {
            eyes: catalog.first(Attribute::Eyes)?,
            mouth: catalog.first(Attribute::Mouth)?,
            hair: catalog.first(Attribute::Hair)?,
            pattern: catalog.first(Attribute::Pattern)?,
            base_color: catalog.first(Attribute::BaseColor)?,
            pattern_color: catalog.first(Attribute::PatternColor)?,
        })
    }

    pub fn get(&self, attribute: Attribute) -> i64 {
        match attribute {
            Attribute::Eyes => self.eyes,
            Attribute::Mouth => self.mouth,
            Attribute::Hair => self.hair,
            Attribute::Pattern => self.pattern,
            Attribute::BaseColor => self.base_color,
            Attribute::PatternColor => self.pattern_color,
        }
    }

    /// Replace one slot unconditionally.
    pub fn set_attribute(&mut self, attribute: Attribute, value: i64) {
        let slot = match attribute {
            Attribute::Eyes => &mut self.eyes,
            Attribute::Mouth => &mut self.mouth,
            Attribute::Hair => &mut self.hair,
            Attribute::Pattern => &mut self.pattern,
            Attribute::BaseColor => &mut self.base_color,
            Attribute::PatternColor => &mut self.pattern_color,
        };
        *slot = value;
    }

    pub fn with(mut self, attribute: Attribute, value: i64) -> Self {
        self.set_attribute(attribute, value);
        self
    }

    pub fn has_hair(&self) -> bool {
        self.hair != NO_HAIR
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, i64)> + '_ {
        Attribute::ALL.into_iter().map(move |a| (a, self.get(a)))
    }
}

/// Body of `POST /submit-seal`: the selection plus its creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealSubmission {
    pub timestamp: String,
    #[serde(flatten)]
    pub selection: Selection,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_with_wire_names() {
        let s = Selection::default().with(Attribute::BaseColor, 7);
        let v = serde_json::to_value(s).unwrap();
        assert_eq!(
            v,
            json!({"eyes":1,"mouth":1,"hair":0,"pattern":1,"base_color":7,"pattern_color":1})
        );
    }

    #[test]
    fn test_submission_flattens_selection() {
        let submission = SealSubmission {
            timestamp: "2026-10-18T09:30:00.000Z".to_string(),
            selection: Selection::default(),
        };
        let v = serde_json::to_value(&submission).unwrap();
        assert_eq!(v["timestamp"], "2026-10-18T09:30:00.000Z");
        assert_eq!(v["pattern_color"], 1);
        assert_eq!(v.as_object().unwrap().len(), 7);
    }

    #[test]
    fn test_set_attribute_is_total() {
        let mut s = Selection::default();
        for (i, attribute) in Attribute::ALL.into_iter().enumerate() {
            let value = -1000 - i as i64;
            s.set_attribute(attribute, value);
            assert_eq!(s.get(attribute), value);
        }
    }

    #[test]
    fn test_hair_zero_clears_nothing_else() {
        let s = Selection::default()
            .with(Attribute::Hair, 3)
            .with(Attribute::PatternColor, 4)
            .with(Attribute::Hair, NO_HAIR);
        assert!(!s.has_hair());
        assert_eq!(s.pattern_color, 4);
    }

    #[test]
    fn test_seeding_needs_every_domain() {
        let mut catalog = OptionCatalog {
            eyes: vec![2, 1],
            mouth: vec![4],
            hair: vec![3, 0],
            pattern: vec![2],
            color: vec![9, 1],
        };
        let seeded = Selection::seeded_from(&catalog).unwrap();
        assert_eq!(seeded.eyes, 2);
        assert_eq!(seeded.hair, 3);
        assert_eq!(seeded.base_color, 9);
        assert_eq!(seeded.pattern_color, 9);

        catalog.color.clear();
        assert!(Selection::seeded_from(&catalog).is_none());
    }
}
