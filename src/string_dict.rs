//! String dictionary for deduplicating `Str` instances.
//!
//! Member names are looked up over and over (every scope table, link and
//! domain lookup keys on them), so the realm interns them once and hands out
//! cheap clones of the shared `Rc<str>`.

use rustc_hash::FxHashMap;

use crate::value::{CheapClone, Str};

/// A dictionary for deduplicating `Str` instances.
pub struct StringDict {
    /// Using Box<str> as key to avoid double-indirection through Rc.
    strings: FxHashMap<Box<str>, Str>,
}

impl StringDict {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self {
            strings: FxHashMap::default(),
        }
    }

    /// Create a dictionary pre-populated with the names the engine uses itself.
    pub fn with_common_strings() -> Self {
        let mut dict = Self::new();
        for s in COMMON_STRINGS {
            dict.get_or_insert(s);
        }
        dict
    }

    /// Get an existing string or insert a new one.
    pub fn get_or_insert(&mut self, s: &str) -> Str {
        if let Some(existing) = self.strings.get(s) {
            return existing.cheap_clone();
        }
        let interned = Str::from(s);
        self.strings.insert(s.into(), interned.cheap_clone());
        interned
    }

    /// Get an existing string without inserting.
    pub fn get(&self, s: &str) -> Option<Str> {
        self.strings.get(s).map(|s| s.cheap_clone())
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for StringDict {
    fn default() -> Self {
        Self::new()
    }
}

const COMMON_STRINGS: &[&str] = &[
    "length",
    "prototype",
    "name",
    "constructor",
    "push",
    "pop",
    "join",
    "isArray",
    "keys",
];
