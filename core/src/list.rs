//! Insertion-ordered item list with an id index.
//!
//! Positions are kept in a map beside the vector so lookups by id do not
//! scan. Removing an item shifts the positions of everything after it.

use std::collections::HashMap;

use crate::types::{Item, ItemId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemList {
    items: Vec<Item>,
    index: HashMap<ItemId, usize>,
}

impl ItemList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a server listing, keeping order. A repeated id keeps its
    /// first occurrence.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut list = Self::new();
        for item in items {
            if list.contains(&item.id) {
                tracing::warn!(id = %item.id, "dropping duplicate id from item listing");
                continue;
            }
            list.push_new(item);
        }
        list
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.index.get(id).map(|&pos| &self.items[pos])
    }

    pub fn as_slice(&self) -> &[Item] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    /// Append `item`, or replace the entry with the same id in place.
    /// Returns the replaced item, if any.
    pub fn upsert(&mut self, item: Item) -> Option<Item> {
        match self.index.get(&item.id) {
            Some(&pos) => Some(std::mem::replace(&mut self.items[pos], item)),
            None => {
                self.push_new(item);
                None
            }
        }
    }

    /// Replace the entry with the same id. Absent ids are left absent.
    pub fn replace(&mut self, item: Item) -> Option<Item> {
        let pos = *self.index.get(&item.id)?;
        Some(std::mem::replace(&mut self.items[pos], item))
    }

    pub fn remove(&mut self, id: &ItemId) -> Option<Item> {
        let pos = self.index.remove(id)?;
        let removed = self.items.remove(pos);
        for item in &self.items[pos..] {
            if let Some(p) = self.index.get_mut(&item.id) {
                *p -= 1;
            }
        }
        Some(removed)
    }

    fn push_new(&mut self, item: Item) {
        self.index.insert(item.id.clone(), self.items.len());
        self.items.push(item);
    }
}

impl<'a> IntoIterator for &'a ItemList {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
