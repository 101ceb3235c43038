//! Hashing - SHA-256 fingerprints of selection snapshots
//!
//! Fingerprints tag preview results and log lines so a result can be traced
//! back to the exact snapshot that produced it.

use sha2::{Sha256, Digest};
use serde::Serialize;
use serde_json::{Value, to_string};

use crate::selection::Selection;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    to_string(&sort_value(&v))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_value(v)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// Fingerprint of a selection snapshot, first 16 hex chars of its canonical hash.
pub fn selection_fingerprint(selection: &Selection) -> String {
    let canonical = canonical_json(selection).unwrap_or_default();
    let mut digest = sha256_hex(canonical.as_bytes());
    digest.truncate(16);
    digest
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Attribute;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"pattern_color": 1, "base_color": 2, "eyes": 3});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"base_color":2,"eyes":3,"pattern_color":1}"#);
    }

    #[test]
    fn test_fingerprint_stable() {
        let s = Selection::default();
        assert_eq!(selection_fingerprint(&s), selection_fingerprint(&s));
        assert_eq!(selection_fingerprint(&s).len(), 16);
    }

    #[test]
    fn test_fingerprint_tracks_every_field() {
        let base = Selection::default();
        for attribute in Attribute::ALL {
            let changed = base.with(attribute, base.get(attribute) + 1);
            assert_ne!(selection_fingerprint(&base), selection_fingerprint(&changed));
        }
    }
}
