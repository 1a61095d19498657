use std::path::Path;

use log::{debug, info, trace};
use rusqlite::{Connection, Transaction, params};

use amlgraph_core::{
    arena::Handle,
    attribute::Attributes,
    graph::{Graph, Stats},
};

use super::{StorageError, schema::SCHEMA};
use crate::query::Owner;

/// Row id of the entity behind `handle`.
fn row_id<T>(handle: Handle<T>) -> i64 {
    handle.index() as i64 + 1
}

/// Write `graph` to a fresh store at `destination`, replacing any previous
/// store atomically.
///
/// The store is built in a temporary file next to `destination` inside a
/// single transaction. Only after the commit succeeds is it renamed over the
/// destination; on any failure the temporary file is removed and the
/// destination keeps its previous content.
///
/// # Errors
///
/// Returns [`StorageError`] if the temporary file cannot be created, any
/// insert violates the schema, or the final rename fails.
pub fn materialize(graph: &Graph, destination: &Path) -> Result<Stats, StorageError> {
    let directory = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    info!(destination:? = destination; "Materializing graph");

    let staging = tempfile::Builder::new()
        .prefix(".amlgraph-")
        .suffix(".tmp")
        .tempfile_in(directory)?;
    debug!(staging:? = staging.path(); "Staging store created");

    let mut connection = Connection::open(staging.path())?;
    connection.execute_batch(SCHEMA)?;

    let transaction = connection.transaction()?;
    Writer::new(&transaction, graph).write()?;
    transaction.commit()?;
    connection.close().map_err(|(_, err)| err)?;

    staging.persist(destination)?;

    let stats = graph.stats();
    info!(destination:? = destination, stats:? = stats; "Graph materialized");
    Ok(stats)
}

/// Inserts every entity of a graph in dependency order.
struct Writer<'a> {
    transaction: &'a Transaction<'a>,
    graph: &'a Graph,
}

impl<'a> Writer<'a> {
    fn new(transaction: &'a Transaction<'a>, graph: &'a Graph) -> Self {
        Self { transaction, graph }
    }

    fn write(&self) -> Result<(), StorageError> {
        self.write_groups()?;
        self.write_object_definitions()?;
        self.write_connection_definitions()?;
        self.write_models()?;
        self.write_object_occurrences()?;
        self.write_connection_occurrences()?;
        Ok(())
    }

    fn write_groups(&self) -> Result<(), StorageError> {
        let mut statement = self.transaction.prepare(
            "INSERT INTO groups (id, source_id, guid, name, level, path, parent_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for (handle, group) in self.graph.groups().iter() {
            let id = row_id(handle);
            statement.execute(params![
                id,
                group.source_id.to_string(),
                group.guid,
                group.name,
                group.level as i64,
                group.path,
                group.parent.map(row_id),
            ])?;
            self.write_attributes(Owner::Group(id), &group.attributes)?;
        }
        debug!(table = "groups", rows = self.graph.groups().len(); "Table written");
        Ok(())
    }

    fn write_object_definitions(&self) -> Result<(), StorageError> {
        let mut statement = self.transaction.prepare(
            "INSERT INTO object_definitions (id, source_id, guid, name, type, symbol, path, group_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for (handle, definition) in self.graph.object_definitions().iter() {
            let id = row_id(handle);
            statement.execute(params![
                id,
                definition.source_id.to_string(),
                definition.guid,
                definition.name,
                definition.type_code,
                definition.symbol,
                definition.path,
                row_id(definition.group),
            ])?;
            self.write_attributes(Owner::ObjectDefinition(id), &definition.attributes)?;
        }
        debug!(
            table = "object_definitions",
            rows = self.graph.object_definitions().len();
            "Table written"
        );
        Ok(())
    }

    fn write_connection_definitions(&self) -> Result<(), StorageError> {
        let mut statement = self.transaction.prepare(
            "INSERT INTO connection_definitions
                 (id, source_id, guid, type, object_definition_id, target_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for (handle, connection) in self.graph.connection_definitions().iter() {
            let id = row_id(handle);
            statement.execute(params![
                id,
                connection.source_id.to_string(),
                connection.guid,
                connection.type_code,
                row_id(connection.source),
                connection.target.map(row_id),
            ])?;
            self.write_attributes(Owner::ConnectionDefinition(id), &connection.attributes)?;
        }
        debug!(
            table = "connection_definitions",
            rows = self.graph.connection_definitions().len();
            "Table written"
        );
        Ok(())
    }

    /// Models, then the link rows of every definition.
    fn write_models(&self) -> Result<(), StorageError> {
        let mut statement = self.transaction.prepare(
            "INSERT INTO models (id, source_id, guid, name, type, path, group_id, superior_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for (handle, model) in self.graph.models().iter() {
            let id = row_id(handle);
            statement.execute(params![
                id,
                model.source_id.to_string(),
                model.guid,
                model.name,
                model.type_code,
                model.path,
                row_id(model.group),
                model.superior.map(row_id),
            ])?;
            self.write_attributes(Owner::Model(id), &model.attributes)?;
        }
        debug!(table = "models", rows = self.graph.models().len(); "Table written");

        let mut links = self.transaction.prepare(
            "INSERT INTO linked_models (object_definition_id, model_id, position)
             VALUES (?1, ?2, ?3)",
        )?;
        for (handle, definition) in self.graph.object_definitions().iter() {
            for (position, &model) in definition.linked_models.iter().enumerate() {
                links.execute(params![row_id(handle), row_id(model), position as i64])?;
            }
        }
        Ok(())
    }

    fn write_object_occurrences(&self) -> Result<(), StorageError> {
        let occurrences = self.graph.object_occurrences();

        // Index of each occurrence within the model that owns it.
        let mut positions = vec![0_i64; occurrences.len()];
        for (model, record) in self.graph.models().iter() {
            for (position, &occurrence) in record.occurrences.iter().enumerate() {
                let owned = occurrences
                    .get(occurrence)
                    .is_some_and(|candidate| candidate.model == model);
                if owned {
                    positions[occurrence.index()] = position as i64;
                }
            }
        }

        let mut statement = self.transaction.prepare(
            "INSERT INTO object_occurrences
                 (id, source_id, symbol, derived_symbol, x, y, width, height,
                  object_definition_id, model_id, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )?;
        for (handle, occurrence) in occurrences.iter() {
            statement.execute(params![
                row_id(handle),
                occurrence.source_id.to_string(),
                occurrence.symbol,
                occurrence.derived_symbol,
                occurrence.position.x,
                occurrence.position.y,
                occurrence.size.width,
                occurrence.size.height,
                row_id(occurrence.definition),
                row_id(occurrence.model),
                positions[handle.index()],
            ])?;
        }
        debug!(table = "object_occurrences", rows = occurrences.len(); "Table written");
        Ok(())
    }

    fn write_connection_occurrences(&self) -> Result<(), StorageError> {
        let mut statement = self.transaction.prepare(
            "INSERT INTO connection_occurrences
                 (id, source_id, connection_definition_id, object_occurrence_id, target_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (handle, connection) in self.graph.connection_occurrences().iter() {
            statement.execute(params![
                row_id(handle),
                connection.source_id.to_string(),
                row_id(connection.definition),
                row_id(connection.source),
                connection.target.map(row_id),
            ])?;
        }
        debug!(
            table = "connection_occurrences",
            rows = self.graph.connection_occurrences().len();
            "Table written"
        );
        Ok(())
    }

    fn write_attributes(&self, owner: Owner, attributes: &Attributes) -> Result<(), StorageError> {
        if attributes.is_empty() {
            return Ok(());
        }
        let sql = format!(
            "INSERT INTO attributes (name, value, position, {}) VALUES (?1, ?2, ?3, ?4)",
            owner.column()
        );
        let mut statement = self.transaction.prepare_cached(&sql)?;
        for (position, attribute) in attributes.iter().enumerate() {
            statement.execute(params![
                attribute.name(),
                attribute.value(),
                position as i64,
                owner.id(),
            ])?;
        }
        trace!(owner:? = owner, count = attributes.len(); "Attributes written");
        Ok(())
    }
}
