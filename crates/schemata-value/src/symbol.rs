//! Symbols compared by identity
//!
//! Two symbols are equal only if they were produced by the same call to
//! [`Symbol::new`], or were both obtained from the global registry with the
//! same key through [`Symbol::for_key`].

use dashmap::DashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

static REGISTRY: LazyLock<DashMap<String, Symbol>> = LazyLock::new(DashMap::new);

/// A unique symbol
#[derive(Clone)]
pub struct Symbol(Arc<SymbolInner>);

struct SymbolInner {
    id: u64,
    description: Option<String>,
    registered: bool,
}

impl Symbol {
    /// Create a fresh symbol with a description
    pub fn new(description: impl Into<String>) -> Self {
        Self::create(Some(description.into()), false)
    }

    /// Create a fresh symbol without a description
    pub fn anonymous() -> Self {
        Self::create(None, false)
    }

    /// Get the registered symbol for `key`, creating it on first use
    pub fn for_key(key: &str) -> Self {
        REGISTRY
            .entry(key.to_string())
            .or_insert_with(|| Self::create(Some(key.to_string()), true))
            .clone()
    }

    /// Registry key of this symbol, if it came from [`Symbol::for_key`]
    pub fn key(&self) -> Option<&str> {
        if self.0.registered {
            self.0.description.as_deref()
        } else {
            None
        }
    }

    /// Symbol description
    pub fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    fn create(description: Option<String>, registered: bool) -> Self {
        Self(Arc::new(SymbolInner {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            description,
            registered,
        }))
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or_default())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_symbols_are_distinct() {
        let a = Symbol::new("a");
        let b = Symbol::new("a");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_registered_symbols_are_shared() {
        let a = Symbol::for_key("schemata/test/shared");
        let b = Symbol::for_key("schemata/test/shared");
        assert_eq!(a, b);
        assert_eq!(a.key(), Some("schemata/test/shared"));
        assert_eq!(Symbol::new("x").key(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Symbol::new("tag").to_string(), "Symbol(tag)");
        assert_eq!(Symbol::anonymous().to_string(), "Symbol()");
    }
}
