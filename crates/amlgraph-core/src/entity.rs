//! Entity kinds of an AML repository graph.
//!
//! All relationships are [`Handle`]s into the arenas of the owning
//! [`Graph`](crate::graph::Graph). Entities are created during resolution and
//! only handed out by shared reference afterwards.

use crate::{
    arena::{Entity, Handle},
    attribute::{Attributes, HasAttributes},
    identifier::SourceId,
};

/// Handle of a [`Group`].
pub type GroupHandle = Handle<Group>;
/// Handle of an [`ObjectDefinition`].
pub type ObjectDefinitionHandle = Handle<ObjectDefinition>;
/// Handle of a [`ConnectionDefinition`].
pub type ConnectionDefinitionHandle = Handle<ConnectionDefinition>;
/// Handle of a [`Model`].
pub type ModelHandle = Handle<Model>;
/// Handle of an [`ObjectOccurrence`].
pub type ObjectOccurrenceHandle = Handle<ObjectOccurrence>;
/// Handle of a [`ConnectionOccurrence`].
pub type ConnectionOccurrenceHandle = Handle<ConnectionOccurrence>;

/// Organizational folder.
///
/// The root group has no parent, level 0 and path `"."`.
#[derive(Debug, Clone)]
pub struct Group {
    pub source_id: SourceId,
    pub guid: Option<String>,
    pub name: String,
    /// Number of ancestors.
    pub level: usize,
    /// Slash-joined names from the root, e.g. `./Finance/Billing`.
    pub path: String,
    pub parent: Option<GroupHandle>,
    pub attributes: Attributes,
    pub children: Vec<GroupHandle>,
    pub object_definitions: Vec<ObjectDefinitionHandle>,
    pub models: Vec<ModelHandle>,
}

impl Group {
    /// Returns `true` if the group holds child groups or models.
    ///
    /// Object definitions don't count as children for reporting purposes.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty() || !self.models.is_empty()
    }

    /// Returns `true` for the root group.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Reusable definition of a modeled element (function, role, data object…).
#[derive(Debug, Clone)]
pub struct ObjectDefinition {
    pub source_id: SourceId,
    pub guid: String,
    pub name: String,
    /// Object type code (`TypeNum`).
    pub type_code: String,
    /// Default symbol code (`SymbolNum`).
    pub symbol: String,
    pub path: String,
    pub attributes: Attributes,
    pub group: GroupHandle,
    /// Outgoing connection definitions, in source order.
    pub connections: Vec<ConnectionDefinitionHandle>,
    /// Models this definition links to, in first-seen order.
    pub linked_models: Vec<ModelHandle>,
    pub occurrences: Vec<ObjectOccurrenceHandle>,
}

/// Typed, directed relationship between two object definitions.
#[derive(Debug, Clone)]
pub struct ConnectionDefinition {
    pub source_id: SourceId,
    pub guid: String,
    /// Connection type code (`CxnDef.Type`).
    pub type_code: String,
    pub attributes: Attributes,
    /// Owning definition (source side).
    pub source: ObjectDefinitionHandle,
    /// Destination; `None` when the source format left it unspecified.
    pub target: Option<ObjectDefinitionHandle>,
    pub occurrences: Vec<ConnectionOccurrenceHandle>,
}

/// A diagram: an ordered container of object occurrences.
#[derive(Debug, Clone)]
pub struct Model {
    pub source_id: SourceId,
    pub guid: String,
    pub name: String,
    /// Model type code (`Model.Type`).
    pub type_code: String,
    pub path: String,
    pub attributes: Attributes,
    pub group: GroupHandle,
    /// The definition whose link list enumerates this model.
    pub superior: Option<ObjectDefinitionHandle>,
    pub occurrences: Vec<ObjectOccurrenceHandle>,
}

/// Placement coordinates inside a model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

/// Placement extent inside a model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i64,
    pub height: i64,
}

/// Placement of one object definition inside one model.
#[derive(Debug, Clone)]
pub struct ObjectOccurrence {
    pub source_id: SourceId,
    pub symbol: String,
    pub derived_symbol: Option<String>,
    pub position: Position,
    pub size: Size,
    pub definition: ObjectDefinitionHandle,
    pub model: ModelHandle,
    /// Outgoing connection occurrences, in source order.
    pub connections: Vec<ConnectionOccurrenceHandle>,
}

/// Placement of a connection definition inside a model, linking two occurrences.
#[derive(Debug, Clone)]
pub struct ConnectionOccurrence {
    pub source_id: SourceId,
    pub definition: ConnectionDefinitionHandle,
    /// Owning occurrence (source side).
    pub source: ObjectOccurrenceHandle,
    pub target: Option<ObjectOccurrenceHandle>,
}

macro_rules! impl_entity {
    ($($kind:ty),* $(,)?) => {
        $(
            impl Entity for $kind {
                fn source_id(&self) -> SourceId {
                    self.source_id
                }
            }
        )*
    };
}

impl_entity!(
    Group,
    ObjectDefinition,
    ConnectionDefinition,
    Model,
    ObjectOccurrence,
    ConnectionOccurrence,
);

macro_rules! impl_has_attributes {
    ($($kind:ty),* $(,)?) => {
        $(
            impl HasAttributes for $kind {
                fn attributes(&self) -> &Attributes {
                    &self.attributes
                }
            }
        )*
    };
}

impl_has_attributes!(Group, ObjectDefinition, ConnectionDefinition, Model);
