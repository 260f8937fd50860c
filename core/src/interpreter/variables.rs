//! Per-task variable bindings

use super::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mapping from variable name to its last assigned value.
///
/// Reassignment replaces the previous binding. Reading a name that was never
/// assigned yields `None`; expression evaluation turns that into a "no value"
/// outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableStore {
    vars: HashMap<String, Value>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reassignment_replaces_binding() {
        let mut store = VariableStore::new();
        store.set("flag", Value::Boolean(true));
        store.set("flag", Value::Boolean(false));

        assert_eq!(store.get("flag"), Some(&Value::Boolean(false)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unbound_read() {
        let store = VariableStore::new();
        assert!(store.get("missing").is_none());
        assert!(!store.is_bound("missing"));
    }
}
