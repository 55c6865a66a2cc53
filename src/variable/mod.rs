//! Runtime variables
//!
//! Variables are `-@key value` pairs. The session keeps one store for the
//! whole interactive run, each `var`/`run` line carries its own, and lookups
//! go through a list of stores where the first holder of a key wins.

pub mod substitution;

pub use substitution::{substitute_line, substitute_token};

use crate::command::VARIABLE_MARKER;

/// Coerce a variable name to carry the `-@` marker
pub fn marked_key(name: &str) -> String {
    if name.starts_with(VARIABLE_MARKER) {
        name.to_string()
    } else {
        format!("{}{}", VARIABLE_MARKER, name)
    }
}

/// Ordered key/value store with unique keys
///
/// Keys keep their declaration order; redeclaring a key replaces its value
/// in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableStore {
    entries: Vec<(String, String)>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, last write wins
    pub fn declare(&mut self, key: &str, value: &str) {
        let key = marked_key(key);
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key, value.to_string())),
        }
    }

    /// Look up a variable, adding the marker to bare names
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = marked_key(key);
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove by exact key
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let position = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(position).1)
    }

    /// Copy every entry of `other` into this store
    pub fn merge(&mut self, other: &VariableStore) {
        for (key, value) in other.iter() {
            self.declare(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Look a key up through layered stores, first match wins
pub fn lookup<'a>(key: &str, layers: &[&'a VariableStore]) -> Option<&'a str> {
    layers.iter().find_map(|store| store.get(key))
}
