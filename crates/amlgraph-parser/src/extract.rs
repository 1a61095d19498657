//! Field extraction from retained elements.
//!
//! Each function reads one element (and the children it owns) into the
//! record types of [`crate::record`]. Missing required fields and malformed
//! numbers are reported with the offset of the offending element.

use amlgraph_core::{
    entity::{Position, Size},
    identifier::SourceId,
};

use crate::{
    config::ParseConfig,
    decode::decode_attributes,
    error::{Diagnostic, ErrorCode, Result},
    node::Node,
    record::{
        ConnectionDefinitionRecord, ConnectionOccurrenceRecord, GroupRecord, ModelBundle,
        ModelRecord, ObjectDefinitionBundle, ObjectDefinitionRecord, ObjectOccurrenceRecord,
    },
};

/// The open group a new group is nested in.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Parent<'a> {
    pub id: SourceId,
    pub path: &'a str,
}

/// Reads a group header.
///
/// Without a parent the group is the root: it keeps its attributes but takes
/// the name and path `"."` and has no GUID.
pub(crate) fn group(
    node: &Node,
    id: SourceId,
    parent: Option<Parent<'_>>,
    level: usize,
    config: &ParseConfig,
) -> GroupRecord {
    let decoded = decode_attributes(node, &config.name_attribute);
    match parent {
        None => GroupRecord {
            id,
            guid: None,
            name: ".".to_string(),
            level,
            path: ".".to_string(),
            parent: None,
            attributes: decoded.attributes,
            offset: node.offset(),
        },
        Some(parent) => GroupRecord {
            id,
            guid: node.child("GUID").map(|guid| guid.text().trim().to_string()),
            path: format!("{}/{}", parent.path, decoded.name),
            name: decoded.name,
            level,
            parent: Some(parent.id),
            attributes: decoded.attributes,
            offset: node.offset(),
        },
    }
}

/// Reads an `ObjDef` element and the `CxnDef` elements it owns.
pub(crate) fn object_definition(
    node: &Node,
    group: SourceId,
    path: &str,
    config: &ParseConfig,
) -> Result<ObjectDefinitionBundle> {
    let id = required_id(node, "ObjDef.ID")?;
    let guid = guid(node)?;
    let decoded = decode_attributes(node, &config.name_attribute);
    let linked_models = node
        .attribute("LinkedModels.IdRefs")
        .map(|ids| ids.split_whitespace().map(SourceId::new).collect())
        .unwrap_or_default();

    let connections = node
        .children_named("CxnDef")
        .map(|connection| connection_definition(connection, id, config))
        .collect::<Result<Vec<_>>>()?;

    Ok(ObjectDefinitionBundle {
        definition: ObjectDefinitionRecord {
            id,
            guid,
            name: decoded.name,
            type_code: node.attribute("TypeNum").unwrap_or_default().to_string(),
            symbol: node.attribute("SymbolNum").unwrap_or_default().to_string(),
            path: path.to_string(),
            group,
            attributes: decoded.attributes,
            linked_models,
            offset: node.offset(),
        },
        connections,
    })
}

fn connection_definition(
    node: &Node,
    source: SourceId,
    config: &ParseConfig,
) -> Result<ConnectionDefinitionRecord> {
    Ok(ConnectionDefinitionRecord {
        id: required_id(node, "CxnDef.ID")?,
        guid: guid(node)?,
        type_code: required(node, "CxnDef.Type")?.to_string(),
        attributes: decode_attributes(node, &config.name_attribute).attributes,
        source,
        target: optional_id(node, "ToObjDef.IdRef"),
        offset: node.offset(),
    })
}

/// Reads a `Model` element with its occurrences and their connections.
pub(crate) fn model(
    node: &Node,
    group: SourceId,
    path: &str,
    config: &ParseConfig,
) -> Result<ModelBundle> {
    let id = required_id(node, "Model.ID")?;
    let guid = guid(node)?;
    let type_code = required(node, "Model.Type")?.to_string();
    let decoded = decode_attributes(node, &config.name_attribute);

    let mut occurrences = Vec::new();
    let mut connections = Vec::new();
    for occurrence in node.children_named("ObjOcc") {
        let record = object_occurrence(occurrence, id)?;
        for connection in occurrence.children_named("CxnOcc") {
            connections.push(connection_occurrence(connection, record.id)?);
        }
        occurrences.push(record);
    }

    Ok(ModelBundle {
        model: ModelRecord {
            id,
            guid,
            name: decoded.name,
            type_code,
            path: path.to_string(),
            group,
            attributes: decoded.attributes,
            occurrences: occurrences.iter().map(|occurrence| occurrence.id).collect(),
            offset: node.offset(),
        },
        occurrences,
        connections,
    })
}

fn object_occurrence(node: &Node, model: SourceId) -> Result<ObjectOccurrenceRecord> {
    let symbol_num = node.attribute("SymbolNum").unwrap_or_default().to_string();
    let (symbol, derived_symbol) = match node.child("SymbolGUID") {
        Some(symbol_guid) => (symbol_guid.text().trim().to_string(), Some(symbol_num)),
        None => (symbol_num, None),
    };

    let position = match node.child("Position") {
        Some(position) => Position {
            x: integer(position, "Pos.X")?,
            y: integer(position, "Pos.Y")?,
        },
        None => Position::default(),
    };
    let size = match node.child("Size") {
        Some(size) => Size {
            width: integer(size, "Size.dX")?,
            height: integer(size, "Size.dY")?,
        },
        None => Size::default(),
    };

    Ok(ObjectOccurrenceRecord {
        id: required_id(node, "ObjOcc.ID")?,
        symbol,
        derived_symbol,
        position,
        size,
        definition: required_id(node, "ObjDef.IdRef")?,
        model,
        offset: node.offset(),
    })
}

fn connection_occurrence(node: &Node, source: SourceId) -> Result<ConnectionOccurrenceRecord> {
    Ok(ConnectionOccurrenceRecord {
        id: required_id(node, "CxnOcc.ID")?,
        definition: required_id(node, "CxnDef.IdRef")?,
        source,
        target: optional_id(node, "ToObjOcc.IdRef"),
        offset: node.offset(),
    })
}

/// A non-empty XML attribute.
fn required<'a>(node: &'a Node, key: &str) -> Result<&'a str> {
    node.attribute(key)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            Diagnostic::error(format!("`{}` element has no `{key}` attribute", node.name()))
                .with_code(ErrorCode::E100)
                .with_offset(node.offset())
        })
}

fn required_id(node: &Node, key: &str) -> Result<SourceId> {
    required(node, key).map(SourceId::new)
}

/// An absent or empty reference means "unspecified".
fn optional_id(node: &Node, key: &str) -> Option<SourceId> {
    node.attribute(key)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(SourceId::new)
}

fn guid(node: &Node) -> Result<String> {
    node.child("GUID")
        .map(|guid| guid.text().trim().to_string())
        .ok_or_else(|| {
            let id = node
                .attribute(&format!("{}.ID", node.name()))
                .unwrap_or("?");
            Diagnostic::error(format!("`{}` element `{id}` has no `GUID` child", node.name()))
                .with_code(ErrorCode::E101)
                .with_offset(node.offset())
        })
}

/// An integer attribute defaulting to 0.
fn integer(node: &Node, key: &str) -> Result<i64> {
    let Some(value) = node.attribute(key) else {
        return Ok(0);
    };
    value.trim().parse().map_err(|_| {
        Diagnostic::error(format!("`{key}` is not an integer: `{value}`"))
            .with_code(ErrorCode::E102)
            .with_offset(node.offset())
    })
}
