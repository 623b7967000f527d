//! walker.rs - Recursive redaction of structured values.
//!
//! Visits every node of a `Value`, redacting string leaves with the text
//! engine and whole subtrees stored under sensitive keys. Shared nodes are
//! followed and tracked by identity on the current path only, so a node that
//! is merely reachable twice (a DAG) is filtered twice, while a node that
//! contains itself yields the circular-reference marker at the point of
//! re-entry.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashSet;

use crate::config::{CIRCULAR_REFERENCE, MAX_DEPTH_EXCEEDED, MAX_RECURSION_DEPTH, REDACTED};
use crate::patterns::keys::is_sensitive_key;
use crate::value::{StructValue, Value};

pub struct Walker<F>
where
    F: FnMut(&str) -> String,
{
    redact: F,
    path: HashSet<usize>,
}

impl<F> Walker<F>
where
    F: FnMut(&str) -> String,
{
    pub fn new(redact: F) -> Self {
        Self {
            redact,
            path: HashSet::new(),
        }
    }

    /// Returns a filtered, acyclic copy of `value` with no shared nodes left.
    pub fn walk(&mut self, key: &str, value: &Value) -> Value {
        self.visit(key, value, 0)
    }

    fn visit(&mut self, key: &str, value: &Value, depth: usize) -> Value {
        if depth > MAX_RECURSION_DEPTH {
            return Value::String(MAX_DEPTH_EXCEEDED.to_string());
        }
        if value.is_null() {
            return Value::Null;
        }
        if is_sensitive_key(key) {
            return Value::String(REDACTED.to_string());
        }

        match value {
            Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::UInt(_)
            | Value::Float(_)
            | Value::Opaque(_) => value.clone(),
            Value::String(s) => Value::String((self.redact)(s.as_str())),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.visit(key, item, depth + 1))
                    .collect(),
            ),
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.visit(k, v, depth + 1)))
                    .collect(),
            ),
            Value::Struct(s) => {
                let mut out = StructValue::new(s.name.clone());
                for field in s.fields.iter().filter(|f| f.exported) {
                    let mut kept = field.clone();
                    kept.value = self.visit(field.key(), &field.value, depth + 1);
                    out.fields.push(kept);
                }
                Value::Struct(out)
            }
            Value::Shared(shared) => {
                let id = shared.id();
                if !self.path.insert(id) {
                    return Value::String(CIRCULAR_REFERENCE.to_string());
                }
                let out = {
                    let inner = shared.read();
                    self.visit(key, &inner, depth + 1)
                };
                self.path.remove(&id);
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SharedValue;
    use std::collections::BTreeMap;

    fn marker_walker() -> Walker<impl FnMut(&str) -> String> {
        Walker::new(|s: &str| s.replace("secret", REDACTED))
    }

    #[test]
    fn test_nested_map_filtering() {
        let mut inner = BTreeMap::new();
        inner.insert("api_key".to_string(), Value::from("abc"));
        inner.insert("note".to_string(), Value::from("a secret note"));
        let mut outer = BTreeMap::new();
        outer.insert("inner".to_string(), Value::Map(inner));

        let out = marker_walker().walk("root", &Value::Map(outer));
        let json = out.to_json();
        assert_eq!(json["inner"]["api_key"], REDACTED);
        assert_eq!(json["inner"]["note"], "a [REDACTED] note");
    }

    #[test]
    fn test_self_cycle_yields_marker() {
        let node = SharedValue::new(Value::Null);
        let mut map = BTreeMap::new();
        map.insert("next".to_string(), Value::Shared(node.clone()));
        node.set(Value::Map(map));

        let out = marker_walker().walk("root", &Value::Shared(node));
        let Value::Map(map) = out else { panic!("expected map") };
        assert_eq!(map.get("next"), Some(&Value::String(CIRCULAR_REFERENCE.into())));
    }

    #[test]
    fn test_dag_is_not_a_cycle() {
        let shared = SharedValue::new("same");
        let v = Value::Array(vec![Value::Shared(shared.clone()), Value::Shared(shared)]);
        let out = marker_walker().walk("items", &v);
        assert_eq!(out, Value::Array(vec![Value::from("same"), Value::from("same")]));
    }

    #[test]
    fn test_depth_guard() {
        let mut v = Value::from("leaf");
        for _ in 0..150 {
            v = Value::Array(vec![v]);
        }
        let out = marker_walker().walk("deep", &v);
        assert!(out.to_json().to_string().contains(MAX_DEPTH_EXCEEDED));
    }

    #[test]
    fn test_null_under_sensitive_key_stays_null() {
        assert_eq!(marker_walker().walk("password", &Value::Null), Value::Null);
        assert_eq!(marker_walker().walk("password", &Value::from(42)), Value::from(REDACTED));
    }
}
