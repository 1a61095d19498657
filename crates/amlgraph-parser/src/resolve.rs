//! Cross-reference resolver.
//!
//! Runs once the registry holds the whole document. Entities are created in
//! registry order, so the handle of a record is its position in the
//! registry map; every reference is then wired by looking up that position.
//! Steps run in a fixed order and each only relies on earlier ones.
//!
//! Dangling references are collected rather than returned one by one; when
//! any were found the partially wired arenas are dropped.

use std::mem;

use indexmap::IndexMap;
use log::{debug, info};

use amlgraph_core::{
    arena::{Arena, Handle},
    entity::{
        ConnectionDefinition, ConnectionOccurrence, Group, GroupHandle, Model, ObjectDefinition,
        ObjectOccurrence,
    },
    graph::Graph,
    identifier::SourceId,
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    registry::Registry,
};

/// Resolves every reference in `registry` into a [`Graph`] rooted at `root_id`.
pub(crate) fn resolve(registry: Registry, root_id: SourceId) -> Result<Graph, ParseError> {
    info!(
        groups = registry.groups.len(),
        object_definitions = registry.object_definitions.len(),
        connection_definitions = registry.connection_definitions.len(),
        models = registry.models.len(),
        object_occurrences = registry.object_occurrences.len(),
        connection_occurrences = registry.connection_occurrences.len();
        "Resolving cross references"
    );

    let mut resolver = Resolver::new(registry);
    resolver.create_entities();
    resolver.link_group_parents();
    resolver.check_group_levels();
    resolver.link_connection_definition_targets();
    resolver.link_connection_occurrence_targets();
    resolver.link_model_occurrences();
    resolver.link_models();
    resolver.finish(root_id)
}

/// Where a reference was found, for diagnostics.
struct Reference {
    code: ErrorCode,
    kind: &'static str,
    field: &'static str,
    referrer: SourceId,
    offset: u64,
}

/// Position of `id` in `map` as a handle, or a dangling-reference diagnostic.
fn lookup<T, V>(
    map: &IndexMap<SourceId, V>,
    id: SourceId,
    reference: Reference,
    collector: &mut DiagnosticCollector,
) -> Option<Handle<T>> {
    let handle = map.get_index_of(&id).map(Handle::new);
    if handle.is_none() {
        collector.emit(
            Diagnostic::error(format!("{} `{id}` is not defined", reference.kind))
                .with_code(reference.code)
                .with_offset(reference.offset)
                .with_help(format!(
                    "referenced by `{}` of `{}`",
                    reference.field, reference.referrer
                )),
        );
    }
    handle
}

struct Resolver {
    registry: Registry,
    collector: DiagnosticCollector,
    groups: Arena<Group>,
    object_definitions: Arena<ObjectDefinition>,
    connection_definitions: Arena<ConnectionDefinition>,
    models: Arena<Model>,
    object_occurrences: Arena<ObjectOccurrence>,
    connection_occurrences: Arena<ConnectionOccurrence>,
}

impl Resolver {
    fn new(registry: Registry) -> Self {
        Self {
            collector: DiagnosticCollector::new(),
            groups: Arena::with_capacity(registry.groups.len()),
            object_definitions: Arena::with_capacity(registry.object_definitions.len()),
            connection_definitions: Arena::with_capacity(registry.connection_definitions.len()),
            models: Arena::with_capacity(registry.models.len()),
            object_occurrences: Arena::with_capacity(registry.object_occurrences.len()),
            connection_occurrences: Arena::with_capacity(registry.connection_occurrences.len()),
            registry,
        }
    }

    /// Moves record payloads into entities and wires owner links.
    ///
    /// Source ids and reference fields stay in the registry for later steps.
    fn create_entities(&mut self) {
        let registry = &mut self.registry;
        let collector = &mut self.collector;

        for record in registry.groups.values_mut() {
            self.groups.push(Group {
                source_id: record.id,
                guid: record.guid.take(),
                name: mem::take(&mut record.name),
                level: record.level,
                path: mem::take(&mut record.path),
                parent: None,
                attributes: mem::take(&mut record.attributes),
                children: Vec::new(),
                object_definitions: Vec::new(),
                models: Vec::new(),
            });
        }

        for record in registry.object_definitions.values_mut() {
            let reference = Reference {
                code: ErrorCode::E200,
                kind: "group",
                field: "owning group",
                referrer: record.id,
                offset: record.offset,
            };
            let Some(group) = lookup(&registry.groups, record.group, reference, collector) else {
                continue;
            };
            let handle = self.object_definitions.push(ObjectDefinition {
                source_id: record.id,
                guid: mem::take(&mut record.guid),
                name: mem::take(&mut record.name),
                type_code: mem::take(&mut record.type_code),
                symbol: mem::take(&mut record.symbol),
                path: mem::take(&mut record.path),
                attributes: mem::take(&mut record.attributes),
                group,
                connections: Vec::new(),
                linked_models: Vec::new(),
                occurrences: Vec::new(),
            });
            if let Some(group) = self.groups.get_mut(group) {
                group.object_definitions.push(handle);
            }
        }

        for record in registry.connection_definitions.values_mut() {
            let reference = Reference {
                code: ErrorCode::E201,
                kind: "object definition",
                field: "owning object definition",
                referrer: record.id,
                offset: record.offset,
            };
            let Some(source) =
                lookup(&registry.object_definitions, record.source, reference, collector)
            else {
                continue;
            };
            let handle = self.connection_definitions.push(ConnectionDefinition {
                source_id: record.id,
                guid: mem::take(&mut record.guid),
                type_code: mem::take(&mut record.type_code),
                attributes: mem::take(&mut record.attributes),
                source,
                target: None,
                occurrences: Vec::new(),
            });
            if let Some(definition) = self.object_definitions.get_mut(source) {
                definition.connections.push(handle);
            }
        }

        for record in registry.models.values_mut() {
            let reference = Reference {
                code: ErrorCode::E200,
                kind: "group",
                field: "owning group",
                referrer: record.id,
                offset: record.offset,
            };
            let Some(group) = lookup(&registry.groups, record.group, reference, collector) else {
                continue;
            };
            let handle = self.models.push(Model {
                source_id: record.id,
                guid: mem::take(&mut record.guid),
                name: mem::take(&mut record.name),
                type_code: mem::take(&mut record.type_code),
                path: mem::take(&mut record.path),
                attributes: mem::take(&mut record.attributes),
                group,
                superior: None,
                occurrences: Vec::new(),
            });
            if let Some(group) = self.groups.get_mut(group) {
                group.models.push(handle);
            }
        }

        for record in registry.object_occurrences.values_mut() {
            let definition = lookup(
                &registry.object_definitions,
                record.definition,
                Reference {
                    code: ErrorCode::E201,
                    kind: "object definition",
                    field: "ObjDef.IdRef",
                    referrer: record.id,
                    offset: record.offset,
                },
                collector,
            );
            let model = lookup(
                &registry.models,
                record.model,
                Reference {
                    code: ErrorCode::E203,
                    kind: "model",
                    field: "owning model",
                    referrer: record.id,
                    offset: record.offset,
                },
                collector,
            );
            let (Some(definition), Some(model)) = (definition, model) else {
                continue;
            };
            let handle = self.object_occurrences.push(ObjectOccurrence {
                source_id: record.id,
                symbol: mem::take(&mut record.symbol),
                derived_symbol: record.derived_symbol.take(),
                position: record.position,
                size: record.size,
                definition,
                model,
                connections: Vec::new(),
            });
            if let Some(definition) = self.object_definitions.get_mut(definition) {
                definition.occurrences.push(handle);
            }
        }

        for record in registry.connection_occurrences.values() {
            let definition = lookup(
                &registry.connection_definitions,
                record.definition,
                Reference {
                    code: ErrorCode::E202,
                    kind: "connection definition",
                    field: "CxnDef.IdRef",
                    referrer: record.id,
                    offset: record.offset,
                },
                collector,
            );
            let source = lookup(
                &registry.object_occurrences,
                record.source,
                Reference {
                    code: ErrorCode::E204,
                    kind: "object occurrence",
                    field: "owning object occurrence",
                    referrer: record.id,
                    offset: record.offset,
                },
                collector,
            );
            let (Some(definition), Some(source)) = (definition, source) else {
                continue;
            };
            let handle = self.connection_occurrences.push(ConnectionOccurrence {
                source_id: record.id,
                definition,
                source,
                target: None,
            });
            if let Some(occurrence) = self.object_occurrences.get_mut(source) {
                occurrence.connections.push(handle);
            }
            if let Some(definition) = self.connection_definitions.get_mut(definition) {
                definition.occurrences.push(handle);
            }
        }
        debug!("Entities created");
    }

    fn link_group_parents(&mut self) {
        for (index, record) in self.registry.groups.values().enumerate() {
            let Some(parent_id) = record.parent else {
                continue;
            };
            let reference = Reference {
                code: ErrorCode::E200,
                kind: "group",
                field: "parent",
                referrer: record.id,
                offset: record.offset,
            };
            let Some(parent) = lookup(
                &self.registry.groups,
                parent_id,
                reference,
                &mut self.collector,
            ) else {
                continue;
            };
            let handle = Handle::new(index);
            if let Some(group) = self.groups.get_mut(handle) {
                group.parent = Some(parent);
            }
            if let Some(group) = self.groups.get_mut(parent) {
                group.children.push(handle);
            }
        }
        debug!("Group parents linked");
    }

    /// Every group must reach a parentless group in exactly `level` steps.
    fn check_group_levels(&mut self) {
        let limit = self.groups.len();
        for (handle, group) in self.groups.iter() {
            let mut steps = 0;
            let mut current = group.parent;
            while let Some(parent) = current {
                steps += 1;
                if steps > limit {
                    break;
                }
                current = self.groups.get(parent).and_then(|parent| parent.parent);
            }
            if steps != group.level {
                let offset = self
                    .registry
                    .groups
                    .get_index(handle.index())
                    .map_or(0, |(_, record)| record.offset);
                self.collector.emit(
                    Diagnostic::error(format!(
                        "group `{}` is nested {} level(s) deep but its parent chain has {steps}",
                        group.source_id, group.level
                    ))
                    .with_code(ErrorCode::E007)
                    .with_offset(offset)
                    .with_help("group ids must be unique within the document"),
                );
            }
        }
    }

    fn link_connection_definition_targets(&mut self) {
        for (index, record) in self.registry.connection_definitions.values().enumerate() {
            let Some(target_id) = record.target else {
                continue;
            };
            let reference = Reference {
                code: ErrorCode::E201,
                kind: "object definition",
                field: "ToObjDef.IdRef",
                referrer: record.id,
                offset: record.offset,
            };
            let target = lookup(
                &self.registry.object_definitions,
                target_id,
                reference,
                &mut self.collector,
            );
            if let Some(definition) = self.connection_definitions.get_mut(Handle::new(index)) {
                definition.target = target;
            }
        }
        debug!("Connection definition targets linked");
    }

    fn link_connection_occurrence_targets(&mut self) {
        for (index, record) in self.registry.connection_occurrences.values().enumerate() {
            let Some(target_id) = record.target else {
                continue;
            };
            let reference = Reference {
                code: ErrorCode::E204,
                kind: "object occurrence",
                field: "ToObjOcc.IdRef",
                referrer: record.id,
                offset: record.offset,
            };
            let target = lookup(
                &self.registry.object_occurrences,
                target_id,
                reference,
                &mut self.collector,
            );
            if let Some(occurrence) = self.connection_occurrences.get_mut(Handle::new(index)) {
                occurrence.target = target;
            }
        }
        debug!("Connection occurrence targets linked");
    }

    fn link_model_occurrences(&mut self) {
        for (index, record) in self.registry.models.values().enumerate() {
            let mut occurrences = Vec::with_capacity(record.occurrences.len());
            for &id in &record.occurrences {
                let reference = Reference {
                    code: ErrorCode::E204,
                    kind: "object occurrence",
                    field: "ObjOcc",
                    referrer: record.id,
                    offset: record.offset,
                };
                if let Some(occurrence) = lookup(
                    &self.registry.object_occurrences,
                    id,
                    reference,
                    &mut self.collector,
                ) {
                    occurrences.push(occurrence);
                }
            }
            if let Some(model) = self.models.get_mut(Handle::new(index)) {
                model.occurrences = occurrences;
            }
        }
        debug!("Model occurrences linked");
    }

    /// Linked models of each definition; the linked model's superior is the
    /// last definition, in registry order, that lists it.
    fn link_models(&mut self) {
        for (definition_id, model_ids) in &self.registry.linked_models {
            let Some(index) = self.registry.object_definitions.get_index_of(definition_id) else {
                continue;
            };
            let definition = Handle::new(index);
            let offset = self.registry.object_definitions[index].offset;

            for &model_id in model_ids {
                let reference = Reference {
                    code: ErrorCode::E203,
                    kind: "model",
                    field: "LinkedModels.IdRefs",
                    referrer: *definition_id,
                    offset,
                };
                let Some(model) = lookup(
                    &self.registry.models,
                    model_id,
                    reference,
                    &mut self.collector,
                ) else {
                    continue;
                };
                if let Some(entity) = self.object_definitions.get_mut(definition) {
                    entity.linked_models.push(model);
                }
                if let Some(entity) = self.models.get_mut(model) {
                    entity.superior = Some(definition);
                }
            }
        }
        debug!("Linked models resolved");
    }

    fn finish(self, root_id: SourceId) -> Result<Graph, ParseError> {
        self.collector.finish()?;

        let root: GroupHandle = self
            .registry
            .groups
            .get_index_of(&root_id)
            .map(Handle::new)
            .ok_or_else(|| {
                Diagnostic::error(format!("root group `{root_id}` was never registered"))
                    .with_code(ErrorCode::E004)
            })?;

        Ok(Graph::new(
            root,
            self.groups,
            self.object_definitions,
            self.connection_definitions,
            self.models,
            self.object_occurrences,
            self.connection_occurrences,
        ))
    }
}
