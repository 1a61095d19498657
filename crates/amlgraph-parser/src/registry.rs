//! Entity registry.
//!
//! The registry is the assembler's state: one insertion-ordered map per
//! entity kind, keyed by source id. A record's position in its map is the
//! handle index its entity receives during resolution.

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace, warn};

use amlgraph_core::identifier::SourceId;

use crate::record::{
    ConnectionDefinitionRecord, ConnectionOccurrenceRecord, GroupRecord, ModelBundle,
    ModelRecord, ObjectDefinitionBundle, ObjectDefinitionRecord, ObjectOccurrenceRecord,
};

/// Per-kind records accumulated while walking the document.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    pub groups: IndexMap<SourceId, GroupRecord>,
    /// Scalar overlay; the latest encounter replaces the fields.
    pub object_definitions: IndexMap<SourceId, ObjectDefinitionRecord>,
    pub connection_definitions: IndexMap<SourceId, ConnectionDefinitionRecord>,
    pub models: IndexMap<SourceId, ModelRecord>,
    pub object_occurrences: IndexMap<SourceId, ObjectOccurrenceRecord>,
    pub connection_occurrences: IndexMap<SourceId, ConnectionOccurrenceRecord>,
    /// Set accumulator: every model any encounter of a definition linked.
    pub linked_models: IndexMap<SourceId, IndexSet<SourceId>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_group(&mut self, record: GroupRecord) {
        trace!(id:% = record.id, path = record.path.as_str(); "Registering group");
        overwrite(&mut self.groups, record.id, record, "group");
    }

    /// Registers a definition together with the connection definitions it owns.
    ///
    /// Scalars take the latest values; linked models accumulate.
    pub fn insert_object_definition(&mut self, bundle: ObjectDefinitionBundle) {
        let ObjectDefinitionBundle {
            mut definition,
            connections,
        } = bundle;
        let id = definition.id;
        trace!(id:% = id, linked_models = definition.linked_models.len(); "Registering object definition");

        self.linked_models
            .entry(id)
            .or_default()
            .extend(definition.linked_models.drain(..));
        self.object_definitions.insert(id, definition);

        for connection in connections {
            overwrite(
                &mut self.connection_definitions,
                connection.id,
                connection,
                "connection definition",
            );
        }
    }

    /// Registers a model together with its occurrences and their connections.
    ///
    /// A repeated model id replaces the earlier model along with every
    /// occurrence and connection occurrence it owned.
    pub fn insert_model(&mut self, bundle: ModelBundle) {
        let ModelBundle {
            model,
            occurrences,
            connections,
        } = bundle;
        trace!(id:% = model.id, occurrences = occurrences.len(); "Registering model");

        if self.models.contains_key(&model.id) {
            self.remove_occurrences_of(model.id);
        }
        overwrite(&mut self.models, model.id, model, "model");
        for occurrence in occurrences {
            overwrite(
                &mut self.object_occurrences,
                occurrence.id,
                occurrence,
                "object occurrence",
            );
        }
        for connection in connections {
            overwrite(
                &mut self.connection_occurrences,
                connection.id,
                connection,
                "connection occurrence",
            );
        }
    }

    /// Drops the occurrences placed in `model` and the connection
    /// occurrences they own. Remaining records keep their relative order.
    fn remove_occurrences_of(&mut self, model: SourceId) {
        let stale: IndexSet<SourceId> = self
            .object_occurrences
            .values()
            .filter(|occurrence| occurrence.model == model)
            .map(|occurrence| occurrence.id)
            .collect();
        for id in &stale {
            self.object_occurrences.shift_remove(id);
        }
        self.connection_occurrences
            .retain(|_, connection| !stale.contains(&connection.source));
        debug!(model:% = model, occurrences = stale.len(); "Dropped occurrences of a replaced model");
    }
}

/// Replaces a record in place, keeping its first-encounter position.
fn overwrite<V>(map: &mut IndexMap<SourceId, V>, id: SourceId, record: V, kind: &str) {
    if map.insert(id, record).is_some() {
        warn!(id:% = id, kind = kind; "Duplicate id, keeping the latest record");
    }
}
