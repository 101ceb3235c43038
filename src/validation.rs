//! Validation System - Domain Membership Checks
//!
//! Rules produce structured violations. Validation is a pure function of
//! catalog and selection; the selection state never calls it on write.

use serde::{Deserialize, Serialize};

use crate::catalog::{Attribute, OptionCatalog};
use crate::selection::Selection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainViolation {
    pub rule: String,
    pub attribute: Attribute,
    pub message: String,
    pub expected: Vec<i64>,
    pub actual: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<DomainViolation>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self {
            valid: true,
            violations: vec![],
        }
    }

    pub fn failure(violations: Vec<DomainViolation>) -> Self {
        Self {
            valid: false,
            violations,
        }
    }

    pub fn summary(&self) -> String {
        self.violations
            .iter()
            .map(|v| format!("{}: {}", v.rule, v.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validation rule trait - produces violations
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, selection: &Selection, catalog: &OptionCatalog) -> Vec<DomainViolation>;
}

// --- Concrete Rules ---

/// Each attribute value must be one of its catalog codes.
pub struct DomainMembershipRule;

impl ValidationRule for DomainMembershipRule {
    fn name(&self) -> &'static str { "domain_membership" }

    fn validate(&self, selection: &Selection, catalog: &OptionCatalog) -> Vec<DomainViolation> {
        selection
            .iter()
            .filter(|(attribute, value)| !catalog.contains(*attribute, *value))
            .map(|(attribute, value)| DomainViolation {
                rule: self.name().to_string(),
                attribute,
                message: format!("{} {} is not offered by the catalog", attribute, value),
                expected: catalog.domain(attribute).to_vec(),
                actual: value,
            })
            .collect()
    }
}

/// Validator runs every rule and folds the violations into one result
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule + Send + Sync>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![Box::new(DomainMembershipRule)],
        }
    }

    pub fn validate(&self, selection: &Selection, catalog: &OptionCatalog) -> ValidationResult {
        let violations: Vec<_> = self
            .rules
            .iter()
            .flat_map(|rule| rule.validate(selection, catalog))
            .collect();

        if violations.is_empty() {
            ValidationResult::success()
        } else {
            ValidationResult::failure(violations)
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// True if every field of `selection` belongs to its catalog domain.
pub fn is_legal(catalog: &OptionCatalog, selection: &Selection) -> bool {
    Validator::new().validate(selection, catalog).valid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> OptionCatalog {
        OptionCatalog {
            eyes: vec![1, 2],
            mouth: vec![1],
            hair: vec![0, 3],
            pattern: vec![1, 5],
            color: vec![1, 2],
        }
    }

    #[test]
    fn test_seeded_selection_is_legal() {
        let c = catalog();
        let s = Selection::seeded_from(&c).unwrap();
        assert!(is_legal(&c, &s));
    }

    #[test]
    fn test_hair_sentinel_is_legal_when_offered() {
        let c = catalog();
        let s = Selection::seeded_from(&c).unwrap().with(Attribute::Hair, 0);
        assert!(is_legal(&c, &s));
    }

    #[test]
    fn test_each_bad_field_reported() {
        let c = catalog();
        let s = Selection::seeded_from(&c)
            .unwrap()
            .with(Attribute::Mouth, 9)
            .with(Attribute::PatternColor, 3);

        let result = Validator::new().validate(&s, &c);
        assert!(!result.valid);
        let attrs: Vec<_> = result.violations.iter().map(|v| v.attribute).collect();
        assert_eq!(attrs, vec![Attribute::Mouth, Attribute::PatternColor]);
        assert_eq!(result.violations[1].expected, vec![1, 2]);
        assert_eq!(result.violations[1].actual, 3);
        assert!(result.summary().contains("pattern_color 3"));
    }
}
