//! Typed handles and the arenas they index.
//!
//! Entities never point at each other directly. Every relationship in a
//! [`Graph`](crate::graph::Graph) is a [`Handle`] into one of its arenas, which
//! keeps the graph free of reference cycles and lets the resolver wire
//! relationships after all entities exist.
//!
//! A handle's index equals the position at which its entity was first
//! assembled, so handles double as stable surrogate keys.

use std::{collections::HashMap, fmt, hash, marker::PhantomData};

use crate::identifier::SourceId;

/// Type-safe index of an entity of kind `T` inside an [`Arena<T>`].
///
/// The phantom type keeps handles of different entity kinds from being mixed
/// up: a `Handle<Model>` cannot be used to look up an object definition.
pub struct Handle<T> {
    index: usize,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Creates a handle for the entity at `index`.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            _kind: PhantomData,
        }
    }

    /// Returns the zero-based arena index.
    pub fn index(self) -> usize {
        self.index
    }
}

// Manual impls so that `Handle<T>` is `Copy` regardless of `T`.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> hash::Hash for Handle<T> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

/// Entities stored in an [`Arena`] are addressable by their source id.
pub trait Entity {
    /// The identifier the entity carries in the source document.
    fn source_id(&self) -> SourceId;
}

/// Append-only storage for one entity kind with lookup by source id.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    items: Vec<T>,
    by_source: HashMap<SourceId, Handle<T>>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            by_source: HashMap::new(),
        }
    }
}

impl<T: Entity> Arena<T> {
    /// Creates an empty arena with room for `capacity` entities.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            by_source: HashMap::with_capacity(capacity),
        }
    }

    /// Appends `item` and returns its handle.
    ///
    /// If an entity with the same source id already exists, the lookup table
    /// keeps pointing at the first one.
    pub fn push(&mut self, item: T) -> Handle<T> {
        let handle = Handle::new(self.items.len());
        self.by_source.entry(item.source_id()).or_insert(handle);
        self.items.push(item);
        handle
    }

    /// Finds the handle of the entity with the given source id.
    pub fn lookup(&self, source_id: SourceId) -> Option<Handle<T>> {
        self.by_source.get(&source_id).copied()
    }

    /// Returns the entity behind `handle`, if it belongs to this arena.
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(handle.index)
    }

    /// Returns a mutable reference to the entity behind `handle`.
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.items.get_mut(handle.index)
    }

    /// Number of entities in the arena.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the arena holds no entities.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over all entities together with their handles, in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| (Handle::new(index), item))
    }

    /// Iterates over all handles in order.
    pub fn handles(&self) -> impl Iterator<Item = Handle<T>> + use<T> {
        (0..self.items.len()).map(Handle::new)
    }
}

impl<T: Entity> std::ops::Index<Handle<T>> for Arena<T> {
    type Output = T;

    fn index(&self, handle: Handle<T>) -> &T {
        &self.items[handle.index]
    }
}
