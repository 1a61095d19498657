//! Name/value attributes and the capability of carrying them.
//!
//! Groups, object definitions, connection definitions and models all carry
//! an ordered list of attributes decoded from their `AttrDef` children.
//! Occurrences never do.

use indexmap::IndexMap;

/// A single name/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    value: String,
}

impl Attribute {
    /// Creates a new attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The attribute type code, e.g. `AT_DESC`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The decoded value; empty when the source carried no text.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Ordered collection of attributes.
///
/// Names are not required to be unique; lookups return the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute.
    pub fn push(&mut self, attribute: Attribute) {
        self.0.push(attribute);
    }

    /// Returns the value of the first attribute called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|attribute| attribute.name == name)
            .map(Attribute::value)
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exports the attributes as an insertion-ordered map.
    ///
    /// When a name repeats, the first value wins, consistent with [`Self::get`].
    pub fn to_map(&self) -> IndexMap<String, String> {
        let mut map = IndexMap::with_capacity(self.0.len());
        for attribute in &self.0 {
            map.entry(attribute.name.clone())
                .or_insert_with(|| attribute.value.clone());
        }
        map
    }
}

impl From<IndexMap<String, String>> for Attributes {
    fn from(map: IndexMap<String, String>) -> Self {
        Self(
            map.into_iter()
                .map(|(name, value)| Attribute { name, value })
                .collect(),
        )
    }
}

impl FromIterator<Attribute> for Attributes {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Capability shared by every entity kind that owns attributes.
pub trait HasAttributes {
    /// All attributes in source order.
    fn attributes(&self) -> &Attributes;

    /// Value of the first attribute called `name`.
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes().get(name)
    }

    /// All attributes as a name → value map.
    fn attributes_to_map(&self) -> IndexMap<String, String> {
        self.attributes().to_map()
    }
}
