//! `Value::Map`'s backing store. Grounded directly in the teacher's
//! `SassMap`: an insertion-ordered `Vec<(Value, Value)>` rather than a hash
//! map, since keys compare by the fuzzy-equality rules in spec.md §4.4
//! rather than by `Hash`.

use std::{slice::Iter, vec::IntoIter};

use crate::common::ListSeparator;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct SassMap(Vec<(Value, Value)>);

impl SassMap {
    pub const fn new() -> SassMap {
        SassMap(Vec::new())
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.0
            .iter()
            .find(|(k, ..)| k.fuzzy_eq(key))
            .map(|(.., v)| v.clone())
    }

    pub fn remove(&mut self, key: &Value) {
        self.0.retain(|(ref k, ..)| !k.fuzzy_eq(key));
    }

    pub fn merge(&mut self, other: SassMap) {
        for (key, value) in other {
            self.insert(key, value);
        }
    }

    pub fn iter(&self) -> Iter<(Value, Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> Vec<Value> {
        self.0.iter().map(|(k, ..)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.0.iter().map(|(.., v)| v.clone()).collect()
    }

    pub fn as_list(&self) -> Vec<Value> {
        self.0
            .iter()
            .map(|(k, v)| {
                Value::List(vec![k.clone(), v.clone()], ListSeparator::Space, false)
            })
            .collect()
    }

    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.0.clone()
    }

    /// Returns true if the key already existed (and its value was replaced).
    pub fn insert(&mut self, key: Value, value: Value) -> bool {
        for (ref k, ref mut v) in &mut self.0 {
            if k.fuzzy_eq(&key) {
                *v = value;
                return true;
            }
        }
        self.0.push((key, value));
        false
    }
}

impl Default for SassMap {
    fn default() -> Self {
        SassMap::new()
    }
}

impl PartialEq for SassMap {
    fn eq(&self, other: &Self) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }
        self.0.iter().all(|(k, v)| {
            other
                .0
                .iter()
                .any(|(k2, v2)| k.fuzzy_eq(k2) && v.fuzzy_eq(v2))
        })
    }
}

impl IntoIterator for SassMap {
    type Item = (Value, Value);
    type IntoIter = IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(Value, Value)> for SassMap {
    fn from_iter<T: IntoIterator<Item = (Value, Value)>>(iter: T) -> Self {
        let mut map = SassMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
