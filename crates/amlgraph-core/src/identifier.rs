//! Source identifiers backed by a global string interner.
//!
//! AML documents refer to entities through opaque string ids such as
//! `ObjDef.1a2b` or `Model.9f`. Every registry and arena in the pipeline keys
//! on these ids, and the same id is typically mentioned many times (once at
//! its definition and once per reference), so they are interned into a small
//! [`SourceId`] symbol that is cheap to copy, hash and compare.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for source identifiers.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock")
}

/// Interned identifier of an entity as written in the source document.
///
/// # Examples
///
/// ```
/// use amlgraph_core::identifier::SourceId;
///
/// let a = SourceId::new("ObjDef.1");
/// let b: SourceId = "ObjDef.1".into();
///
/// assert_eq!(a, b);
/// assert_eq!(a, "ObjDef.1");
/// assert_eq!(a.to_string(), "ObjDef.1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(DefaultSymbol);

impl SourceId {
    /// Interns `id` and returns its symbol.
    pub fn new(id: &str) -> Self {
        Self(interner().get_or_intern(id))
    }

    /// Calls `f` with the interned string without allocating.
    ///
    /// The interner stays locked while `f` runs, so `f` must not intern.
    pub fn with_str<R>(self, f: impl FnOnce(&str) -> R) -> R {
        let interner = interner();
        let value = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        f(value)
    }

    /// Returns `true` if the interned string is empty.
    pub fn is_empty(self) -> bool {
        self.with_str(str::is_empty)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|value| f.write_str(value))
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<&String> for SourceId {
    fn from(id: &String) -> Self {
        Self::new(id)
    }
}

impl PartialEq<str> for SourceId {
    fn eq(&self, other: &str) -> bool {
        self.with_str(|value| value == other)
    }
}

impl PartialEq<&str> for SourceId {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
