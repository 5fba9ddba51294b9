//! Deterministic request fingerprints

use crate::crawler::Variables;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Serializes a JSON value with object keys sorted at every level
struct Canonical<'a>(&'a Value);

impl Serialize for Canonical<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                let mut out = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    out.serialize_entry(key, &Canonical(value))?;
                }
                out.end()
            }
            Value::Array(items) => {
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    out.serialize_element(&Canonical(item))?;
                }
                out.end()
            }
            other => other.serialize(serializer),
        }
    }
}

/// Encodes `{query, variables}` as canonical JSON
pub fn canonical_json(query: &str, variables: &Variables) -> Vec<u8> {
    let mut request = serde_json::Map::new();
    request.insert("query".to_string(), Value::String(query.to_string()));
    request.insert("variables".to_string(), variables.to_value());

    // Serializing a Value tree into memory cannot fail
    serde_json::to_vec(&Canonical(&Value::Object(request))).unwrap_or_default()
}

/// Returns `hex(sha256(canonical_json(query, variables)))`
pub fn fingerprint(query: &str, variables: &Variables) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(query, variables));
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fingerprint_ignores_insertion_order() {
        let ab = Variables::new().with("a", 1).with("b", 2);
        let ba = Variables::new().with("b", 2).with("a", 1);

        assert_eq!(fingerprint("query Q", &ab), fingerprint("query Q", &ba));
    }

    #[test]
    fn test_fingerprint_ignores_nested_key_order() {
        let first = Variables::new().with("filter", json!({"x": 1, "y": [{"b": 2, "a": 1}]}));
        let second = Variables::new().with("filter", json!({"y": [{"a": 1, "b": 2}], "x": 1}));

        assert_eq!(fingerprint("query Q", &first), fingerprint("query Q", &second));
    }

    #[test]
    fn test_fingerprint_depends_on_query_and_values() {
        let vars = Variables::new().with("login", "octocat");

        assert_ne!(fingerprint("query A", &vars), fingerprint("query B", &vars));
        assert_ne!(
            fingerprint("query A", &vars),
            fingerprint("query A", &Variables::new().with("login", "hubot"))
        );
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = fingerprint("query Q", &Variables::new());
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_canonical_json_layout() {
        let vars = Variables::new().with("name", "widget").with("first", 100);
        let encoded = String::from_utf8(canonical_json("q", &vars)).unwrap();

        assert_eq!(
            encoded,
            r#"{"query":"q","variables":{"first":100,"name":"widget"}}"#
        );
    }
}
