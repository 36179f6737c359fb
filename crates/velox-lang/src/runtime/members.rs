//! Insertion-ordered name → Item map. Backs both scopes and the sub-item
//! maps of composite values.

use rustc_hash::FxHashMap;

use crate::error::SetupError;
use crate::runtime::item::Item;

#[derive(Default, Clone)]
pub struct Members {
    entries: Vec<(String, Item)>,
    index: FxHashMap<String, usize>,
}

impl Members {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Item> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Add a new entry; an existing name is a setup error.
    pub fn insert(&mut self, name: impl Into<String>, item: Item) -> Result<(), SetupError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(SetupError::DuplicateMember(name));
        }
        self.push(name, item);
        Ok(())
    }

    /// Add or rebind an entry, keeping its original position when rebinding.
    pub fn set(&mut self, name: impl Into<String>, item: Item) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&i) => self.entries[i].1 = item,
            None => self.push(name, item),
        }
    }

    fn push(&mut self, name: String, item: Item) {
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, item));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Item)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Independent copy: every member Item is value-copied.
    pub fn deep_copy(&self) -> Self {
        Self {
            entries: self.entries.iter().map(|(k, v)| (k.clone(), v.copy())).collect(),
            index: self.index.clone(),
        }
    }
}

impl std::fmt::Debug for Members {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.entries.iter().map(|(k, v)| (k, v))).finish()
    }
}
