//! Unresolved records produced by extraction.
//!
//! Every relationship is still a [`SourceId`] here. Offsets point at the
//! element the record was extracted from and end up in resolver diagnostics.

use amlgraph_core::{
    attribute::Attributes,
    entity::{Position, Size},
    identifier::SourceId,
};

#[derive(Debug, Clone)]
pub(crate) struct GroupRecord {
    pub id: SourceId,
    pub guid: Option<String>,
    pub name: String,
    pub level: usize,
    pub path: String,
    pub parent: Option<SourceId>,
    pub attributes: Attributes,
    pub offset: u64,
}

/// Scalar fields of an object definition; the latest encounter wins.
#[derive(Debug, Clone)]
pub(crate) struct ObjectDefinitionRecord {
    pub id: SourceId,
    pub guid: String,
    pub name: String,
    pub type_code: String,
    pub symbol: String,
    pub path: String,
    pub group: SourceId,
    pub attributes: Attributes,
    /// Models named in `LinkedModels.IdRefs` by this encounter.
    pub linked_models: Vec<SourceId>,
    pub offset: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct ConnectionDefinitionRecord {
    pub id: SourceId,
    pub guid: String,
    pub type_code: String,
    pub attributes: Attributes,
    pub source: SourceId,
    pub target: Option<SourceId>,
    pub offset: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct ModelRecord {
    pub id: SourceId,
    pub guid: String,
    pub name: String,
    pub type_code: String,
    pub path: String,
    pub group: SourceId,
    pub attributes: Attributes,
    /// Occurrence ids in document order.
    pub occurrences: Vec<SourceId>,
    pub offset: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct ObjectOccurrenceRecord {
    pub id: SourceId,
    pub symbol: String,
    pub derived_symbol: Option<String>,
    pub position: Position,
    pub size: Size,
    pub definition: SourceId,
    pub model: SourceId,
    pub offset: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct ConnectionOccurrenceRecord {
    pub id: SourceId,
    pub definition: SourceId,
    pub source: SourceId,
    pub target: Option<SourceId>,
    pub offset: u64,
}

/// Everything extracted from one `ObjDef` element.
#[derive(Debug, Clone)]
pub(crate) struct ObjectDefinitionBundle {
    pub definition: ObjectDefinitionRecord,
    pub connections: Vec<ConnectionDefinitionRecord>,
}

/// Everything extracted from one `Model` element.
#[derive(Debug, Clone)]
pub(crate) struct ModelBundle {
    pub model: ModelRecord,
    pub occurrences: Vec<ObjectOccurrenceRecord>,
    pub connections: Vec<ConnectionOccurrenceRecord>,
}
