//! Identity map from row id to the single live instance for that row.
//!
//! # Invariants
//! - At most one handle per id.
//! - The cache owns strong references; entries leave only through `remove`
//!   or `clear`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct IdentityCache<T> {
    entries: HashMap<i64, Rc<RefCell<T>>>,
}

impl<T> Default for IdentityCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> IdentityCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of the cached handle, sharing the same instance.
    pub fn get(&self, id: i64) -> Option<Rc<RefCell<T>>> {
        self.entries.get(&id).map(Rc::clone)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.entries.contains_key(&id)
    }

    /// Registers `handle` for `id`, returning the handle it displaced.
    pub fn insert(&mut self, id: i64, handle: Rc<RefCell<T>>) -> Option<Rc<RefCell<T>>> {
        self.entries.insert(id, handle)
    }

    pub fn remove(&mut self, id: i64) -> Option<Rc<RefCell<T>>> {
        self.entries.remove(&id)
    }

    /// Drops every entry and reports how many were held.
    pub fn clear(&mut self) -> usize {
        let cleared = self.entries.len();
        self.entries.clear();
        cleared
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
