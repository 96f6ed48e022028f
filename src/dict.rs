//
// Copyright (c) The yangkit Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! String interning dictionary.
//!
//! Every schema identifier, prefix, namespace URI, description and attribute
//! value is interned into the context's dictionary. Comparing two interned
//! strings is a pointer comparison; the rest of the crate relies on that.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

/// Handle to a canonical interned string.
///
/// Two handles obtained from the same [`Dictionary`] compare equal if and
/// only if they point to the same canonical allocation. Use
/// [`DictStr::as_str`] (or deref) when the spelling itself is needed.
#[derive(Clone, Debug, Eq)]
pub struct DictStr(Rc<str>);

/// Intern table mapping strings to a single refcounted canonical copy.
///
/// The dictionary is owned by the context and is not thread-safe on its own;
/// callers serialize parse operations against lookups.
#[derive(Debug, Default)]
pub struct Dictionary {
    table: RefCell<HashMap<Rc<str>, usize>>,
}

// ===== impl DictStr =====

impl DictStr {
    /// Returns the interned spelling.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether two handles share the same canonical allocation.
    pub fn ptr_eq(a: &DictStr, b: &DictStr) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl PartialEq for DictStr {
    // Interned strings compare by identity, not by content.
    fn eq(&self, other: &DictStr) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq<str> for DictStr {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for DictStr {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Hash for DictStr {
    // Must agree with the identity-based Eq.
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as *const u8 as usize).hash(state);
    }
}

impl Deref for DictStr {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DictStr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DictStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ===== impl Dictionary =====

impl Dictionary {
    pub fn new() -> Dictionary {
        Dictionary::default()
    }

    /// Intern a string, incrementing its refcount.
    ///
    /// The canonical copy is allocated only on first occurrence; later
    /// inserts of an equal string return a handle to the same allocation.
    pub fn insert(&self, s: &str) -> DictStr {
        let mut table = self.table.borrow_mut();
        let canonical = table.get_key_value(s).map(|(key, _)| Rc::clone(key));
        match canonical {
            Some(key) => {
                *table.get_mut(s).unwrap() += 1;
                DictStr(key)
            }
            None => {
                let key: Rc<str> = Rc::from(s);
                table.insert(Rc::clone(&key), 1);
                DictStr(key)
            }
        }
    }

    /// Drop one reference to an interned string, evicting the canonical copy
    /// when the count reaches zero.
    pub fn remove(&self, s: &str) {
        let mut table = self.table.borrow_mut();
        if let Some(count) = table.get_mut(s) {
            *count -= 1;
            if *count == 0 {
                table.remove(s);
            }
        }
    }

    /// Current refcount of an interned string (zero if not present).
    pub fn refcount(&self, s: &str) -> usize {
        self.table.borrow().get(s).copied().unwrap_or(0)
    }

    /// Number of distinct interned strings.
    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.borrow().is_empty()
    }
}
