//! Read-only query façade over a materialized store.
//!
//! A [`Repository`] answers the questions analysts ask of an imported AML
//! repository: which models exist, what a model contains, how occurrences
//! are wired together, and which attributes an entity carries. Every method
//! runs plain SQL against the store; nothing is cached between calls.
//!
//! # Example
//!
//! ```no_run
//! # use amlgraph::{AmlError, config::QueryConfig, query::{ConnectionFilter, Repository}};
//! # use amlgraph_core::graph::Direction;
//! # fn main() -> Result<(), AmlError> {
//! let repository = Repository::open("export.db", QueryConfig::default())?;
//! for model in repository.models(&["MT_EEPC"])? {
//!     for occurrence in repository.occurrences(&model)? {
//!         let next = repository.connected_occurrences(
//!             &occurrence,
//!             &ConnectionFilter::new().with_connection_types(["CT_ACTIV_1"]),
//!             Direction::Out,
//!         )?;
//!         println!("{} -> {} neighbours", occurrence.name, next.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use log::{debug, trace};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};

use amlgraph_core::{
    attribute::{Attribute, Attributes},
    entity::{Position, Size},
    graph::{Direction, Stats},
};

use crate::{AmlError, config::QueryConfig, store::StorageError};

const GROUP_SELECT: &str = "SELECT id, source_id, guid, name, level, path, parent_id FROM groups";

const OBJECT_DEFINITION_SELECT: &str =
    "SELECT id, source_id, guid, name, type, symbol, path, group_id FROM object_definitions";

const CONNECTION_DEFINITION_SELECT: &str =
    "SELECT id, source_id, guid, type, object_definition_id, target_id FROM connection_definitions";

const MODEL_SELECT: &str =
    "SELECT m.id, m.source_id, m.guid, m.name, m.type, m.path, m.group_id, m.superior_id
     FROM models m";

const OCCURRENCE_COLUMNS: &str = "o.id, o.source_id, d.name, o.symbol, o.derived_symbol,
     o.x, o.y, o.width, o.height, o.object_definition_id, o.model_id";

const OCCURRENCE_FROM: &str =
    "FROM object_occurrences o JOIN object_definitions d ON d.id = o.object_definition_id";

const CONNECTION_OCCURRENCE_SELECT: &str =
    "SELECT c.id, c.source_id, cd.type, c.connection_definition_id, c.object_occurrence_id, c.target_id
     FROM connection_occurrences c
     JOIN connection_definitions cd ON cd.id = c.connection_definition_id";

/// Entity that attributes can be attached to, by row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Group(i64),
    ObjectDefinition(i64),
    ConnectionDefinition(i64),
    Model(i64),
}

impl Owner {
    /// Column of the `attributes` table referencing this owner.
    pub(crate) fn column(self) -> &'static str {
        match self {
            Owner::Group(_) => "group_id",
            Owner::ObjectDefinition(_) => "object_definition_id",
            Owner::ConnectionDefinition(_) => "connection_definition_id",
            Owner::Model(_) => "model_id",
        }
    }

    pub fn id(self) -> i64 {
        match self {
            Owner::Group(id)
            | Owner::ObjectDefinition(id)
            | Owner::ConnectionDefinition(id)
            | Owner::Model(id) => id,
        }
    }
}

/// Capability of stored rows that own attributes.
pub trait AttributeOwner {
    fn owner(&self) -> Owner;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRow {
    pub id: i64,
    pub source_id: String,
    pub guid: Option<String>,
    pub name: String,
    pub level: i64,
    pub path: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDefinitionRow {
    pub id: i64,
    pub source_id: String,
    pub guid: String,
    pub name: String,
    pub type_code: String,
    pub symbol: String,
    pub path: String,
    pub group_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDefinitionRow {
    pub id: i64,
    pub source_id: String,
    pub guid: String,
    pub type_code: String,
    /// Owning definition.
    pub object_definition_id: i64,
    pub target_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRow {
    pub id: i64,
    pub source_id: String,
    pub guid: String,
    pub name: String,
    pub type_code: String,
    pub path: String,
    pub group_id: i64,
    pub superior_id: Option<i64>,
}

/// An object occurrence, named after its definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceRow {
    pub id: i64,
    pub source_id: String,
    pub name: String,
    pub symbol: String,
    pub derived_symbol: Option<String>,
    pub position: Position,
    pub size: Size,
    pub object_definition_id: i64,
    pub model_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOccurrenceRow {
    pub id: i64,
    pub source_id: String,
    /// Type code of the connection definition.
    pub type_code: String,
    pub connection_definition_id: i64,
    /// Owning occurrence.
    pub object_occurrence_id: i64,
    pub target_id: Option<i64>,
}

impl AttributeOwner for GroupRow {
    fn owner(&self) -> Owner {
        Owner::Group(self.id)
    }
}

impl AttributeOwner for ObjectDefinitionRow {
    fn owner(&self) -> Owner {
        Owner::ObjectDefinition(self.id)
    }
}

impl AttributeOwner for ConnectionDefinitionRow {
    fn owner(&self) -> Owner {
        Owner::ConnectionDefinition(self.id)
    }
}

impl AttributeOwner for ModelRow {
    fn owner(&self) -> Owner {
        Owner::Model(self.id)
    }
}

impl AttributeOwner for Owner {
    fn owner(&self) -> Owner {
        *self
    }
}

/// Restricts [`Repository::connected_occurrences`].
///
/// An empty list places no restriction.
#[derive(Debug, Clone, Default)]
pub struct ConnectionFilter {
    connection_types: Vec<String>,
    symbols: Vec<String>,
}

impl ConnectionFilter {
    /// A filter that accepts every connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only follow connections whose definition has one of these types.
    pub fn with_connection_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.connection_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Only return neighbours placed with one of these symbols.
    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    fn accepts(&self, type_code: &str, neighbour: &OccurrenceRow) -> bool {
        let type_matches = self.connection_types.is_empty()
            || self.connection_types.iter().any(|t| t == type_code);
        let symbol_matches =
            self.symbols.is_empty() || self.symbols.iter().any(|s| *s == neighbour.symbol);
        type_matches && symbol_matches
    }
}

/// Read-only handle on a materialized store.
#[derive(Debug)]
pub struct Repository {
    connection: Connection,
    config: QueryConfig,
    path: PathBuf,
}

impl Repository {
    /// Open the store at `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::MissingStore`] if no file exists at `path`,
    /// or a storage error if SQLite cannot open it.
    pub fn open(path: impl AsRef<Path>, config: QueryConfig) -> Result<Self, AmlError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(StorageError::MissingStore(path.to_path_buf()).into());
        }
        let connection = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        debug!(path:? = path; "Store opened");
        Ok(Self {
            connection,
            config,
            path: path.to_path_buf(),
        })
    }

    /// Location of the store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The group without parent.
    pub fn root_group(&self) -> Result<GroupRow, AmlError> {
        let sql = format!("{GROUP_SELECT} WHERE parent_id IS NULL");
        Ok(self.connection.query_row(&sql, [], group_row)?)
    }

    pub fn group(&self, id: i64) -> Result<Option<GroupRow>, AmlError> {
        let sql = format!("{GROUP_SELECT} WHERE id = ?1");
        Ok(self.connection.query_row(&sql, [id], group_row).optional()?)
    }

    /// Direct child groups of `group`, in document order.
    pub fn child_groups(&self, group: &GroupRow) -> Result<Vec<GroupRow>, AmlError> {
        let sql = format!("{GROUP_SELECT} WHERE parent_id = ?1 ORDER BY id");
        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement.query_map([group.id], group_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn object_definition(&self, id: i64) -> Result<Option<ObjectDefinitionRow>, AmlError> {
        let sql = format!("{OBJECT_DEFINITION_SELECT} WHERE id = ?1");
        Ok(self
            .connection
            .query_row(&sql, [id], object_definition_row)
            .optional()?)
    }

    /// The object definition with the given source id.
    pub fn find_object_definition(
        &self,
        source_id: &str,
    ) -> Result<Option<ObjectDefinitionRow>, AmlError> {
        let sql = format!("{OBJECT_DEFINITION_SELECT} WHERE source_id = ?1");
        Ok(self
            .connection
            .query_row(&sql, [source_id], object_definition_row)
            .optional()?)
    }

    /// Outgoing connection definitions of `definition`, in document order.
    pub fn connection_definitions(
        &self,
        definition: &ObjectDefinitionRow,
    ) -> Result<Vec<ConnectionDefinitionRow>, AmlError> {
        let sql =
            format!("{CONNECTION_DEFINITION_SELECT} WHERE object_definition_id = ?1 ORDER BY id");
        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement.query_map([definition.id], connection_definition_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn model(&self, id: i64) -> Result<Option<ModelRow>, AmlError> {
        let sql = format!("{MODEL_SELECT} WHERE m.id = ?1");
        Ok(self.connection.query_row(&sql, [id], model_row).optional()?)
    }

    /// The model whose GUID or source id matches.
    ///
    /// Returns `None` when nothing matches, including when both keys are
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::Query`] if more than one model matches.
    pub fn find_model(
        &self,
        source_id: Option<&str>,
        guid: Option<&str>,
    ) -> Result<Option<ModelRow>, AmlError> {
        let sql = format!("{MODEL_SELECT} WHERE m.guid = ?1 OR m.source_id = ?2 ORDER BY m.id");
        let mut statement = self.connection.prepare(&sql)?;
        let mut models = statement
            .query_map(params![guid, source_id], model_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        if models.len() > 1 {
            return Err(AmlError::Query(format!(
                "{} models match source id {:?} or guid {:?}",
                models.len(),
                source_id,
                guid
            )));
        }
        Ok(models.pop())
    }

    /// All models, or only those whose type is listed in `types`.
    pub fn models(&self, types: &[&str]) -> Result<Vec<ModelRow>, AmlError> {
        let sql = format!("{MODEL_SELECT} ORDER BY m.id");
        let mut statement = self.connection.prepare(&sql)?;
        let mut models = statement
            .query_map([], model_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        if !types.is_empty() {
            models.retain(|model| types.contains(&model.type_code.as_str()));
        }
        Ok(models)
    }

    /// Models listed by `definition`, in link order.
    pub fn linked_models(
        &self,
        definition: &ObjectDefinitionRow,
    ) -> Result<Vec<ModelRow>, AmlError> {
        let sql = format!(
            "{MODEL_SELECT} JOIN linked_models l ON l.model_id = m.id
             WHERE l.object_definition_id = ?1 ORDER BY l.position"
        );
        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement.query_map([definition.id], model_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Occurrences of `model`, in the order the document lists them.
    pub fn occurrences(&self, model: &ModelRow) -> Result<Vec<OccurrenceRow>, AmlError> {
        let sql = format!(
            "SELECT {OCCURRENCE_COLUMNS} {OCCURRENCE_FROM}
             WHERE o.model_id = ?1 ORDER BY o.position, o.id"
        );
        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement.query_map([model.id], occurrence_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Occurrences of `model` placed with one of `symbols`.
    pub fn occurrences_with_symbol(
        &self,
        model: &ModelRow,
        symbols: &[&str],
    ) -> Result<Vec<OccurrenceRow>, AmlError> {
        let mut occurrences = self.occurrences(model)?;
        occurrences.retain(|occurrence| symbols.contains(&occurrence.symbol.as_str()));
        Ok(occurrences)
    }

    /// The occurrence with the given source id.
    pub fn find_occurrence(&self, source_id: &str) -> Result<Option<OccurrenceRow>, AmlError> {
        let sql = format!("SELECT {OCCURRENCE_COLUMNS} {OCCURRENCE_FROM} WHERE o.source_id = ?1");
        Ok(self
            .connection
            .query_row(&sql, [source_id], occurrence_row)
            .optional()?)
    }

    /// Occurrences connected to `occurrence` through connection occurrences.
    ///
    /// Incoming neighbours are searched within the occurrence's own model.
    /// With [`Direction::Both`] outgoing neighbours come first; each edge
    /// contributes once per direction.
    pub fn connected_occurrences(
        &self,
        occurrence: &OccurrenceRow,
        filter: &ConnectionFilter,
        direction: Direction,
    ) -> Result<Vec<OccurrenceRow>, AmlError> {
        let mut connected = Vec::new();
        if direction.includes_out() {
            let sql = format!(
                "SELECT {OCCURRENCE_COLUMNS}, cd.type {OCCURRENCE_FROM}
                 JOIN connection_occurrences c ON c.target_id = o.id
                 JOIN connection_definitions cd ON cd.id = c.connection_definition_id
                 WHERE c.object_occurrence_id = ?1
                 ORDER BY c.id"
            );
            self.collect_neighbours(&sql, params![occurrence.id], filter, &mut connected)?;
        }
        if direction.includes_in() {
            let sql = format!(
                "SELECT {OCCURRENCE_COLUMNS}, cd.type {OCCURRENCE_FROM}
                 JOIN connection_occurrences c ON c.object_occurrence_id = o.id
                 JOIN connection_definitions cd ON cd.id = c.connection_definition_id
                 WHERE c.target_id = ?1 AND o.model_id = ?2
                 ORDER BY o.position, o.id, c.id"
            );
            self.collect_neighbours(
                &sql,
                params![occurrence.id, occurrence.model_id],
                filter,
                &mut connected,
            )?;
        }
        trace!(
            occurrence = occurrence.source_id.as_str(),
            direction:% = direction,
            count = connected.len();
            "Connected occurrences"
        );
        Ok(connected)
    }

    fn collect_neighbours(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
        filter: &ConnectionFilter,
        connected: &mut Vec<OccurrenceRow>,
    ) -> Result<(), AmlError> {
        let mut statement = self.connection.prepare(sql)?;
        let rows = statement.query_map(params, |row| {
            Ok((occurrence_row(row)?, row.get::<_, String>(11)?))
        })?;
        for row in rows {
            let (neighbour, type_code) = row?;
            if filter.accepts(&type_code, &neighbour) {
                connected.push(neighbour);
            }
        }
        Ok(())
    }

    /// The connection definition from `a` to `b`, else from `b` to `a`.
    pub fn connection_between_definitions(
        &self,
        a: &ObjectDefinitionRow,
        b: &ObjectDefinitionRow,
    ) -> Result<Option<ConnectionDefinitionRow>, AmlError> {
        let sql = format!(
            "{CONNECTION_DEFINITION_SELECT}
             WHERE object_definition_id = ?1 AND target_id = ?2 ORDER BY id LIMIT 1"
        );
        let mut statement = self.connection.prepare(&sql)?;
        let forward = statement
            .query_row([a.id, b.id], connection_definition_row)
            .optional()?;
        match forward {
            Some(connection) => Ok(Some(connection)),
            None => Ok(statement
                .query_row([b.id, a.id], connection_definition_row)
                .optional()?),
        }
    }

    /// The connection occurrence from `a` to `b`, else from `b` to `a`.
    pub fn connection_between_occurrences(
        &self,
        a: &OccurrenceRow,
        b: &OccurrenceRow,
    ) -> Result<Option<ConnectionOccurrenceRow>, AmlError> {
        let sql = format!(
            "{CONNECTION_OCCURRENCE_SELECT}
             WHERE c.object_occurrence_id = ?1 AND c.target_id = ?2 ORDER BY c.id LIMIT 1"
        );
        let mut statement = self.connection.prepare(&sql)?;
        let forward = statement
            .query_row([a.id, b.id], connection_occurrence_row)
            .optional()?;
        match forward {
            Some(connection) => Ok(Some(connection)),
            None => Ok(statement
                .query_row([b.id, a.id], connection_occurrence_row)
                .optional()?),
        }
    }

    /// The first model linked from `definition` whose type is the configured
    /// functional allocation type.
    pub fn assigned_functional_allocation(
        &self,
        definition: &ObjectDefinitionRow,
    ) -> Result<Option<ModelRow>, AmlError> {
        self.functional_allocation_of(definition.id)
    }

    /// [`Self::assigned_functional_allocation`] for the definition of
    /// `occurrence`.
    pub fn assigned_functional_allocation_for_occurrence(
        &self,
        occurrence: &OccurrenceRow,
    ) -> Result<Option<ModelRow>, AmlError> {
        self.functional_allocation_of(occurrence.object_definition_id)
    }

    fn functional_allocation_of(&self, definition_id: i64) -> Result<Option<ModelRow>, AmlError> {
        let sql = format!(
            "{MODEL_SELECT} JOIN linked_models l ON l.model_id = m.id
             WHERE l.object_definition_id = ?1 AND m.type = ?2
             ORDER BY l.position LIMIT 1"
        );
        Ok(self
            .connection
            .query_row(
                &sql,
                params![
                    definition_id,
                    self.config.functional_allocation_model_type()
                ],
                model_row,
            )
            .optional()?)
    }

    /// All attributes of `owner`, in document order.
    pub fn attributes<T: AttributeOwner + ?Sized>(
        &self,
        owner: &T,
    ) -> Result<Attributes, AmlError> {
        let owner = owner.owner();
        let sql = format!(
            "SELECT name, value FROM attributes WHERE {} = ?1 ORDER BY position",
            owner.column()
        );
        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement.query_map([owner.id()], |row| {
            Ok(Attribute::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<Attributes>>()?)
    }

    /// Value of the first attribute of `owner` called `name`.
    pub fn attribute<T: AttributeOwner + ?Sized>(
        &self,
        owner: &T,
        name: &str,
    ) -> Result<Option<String>, AmlError> {
        let owner = owner.owner();
        let sql = format!(
            "SELECT value FROM attributes WHERE {} = ?1 AND name = ?2 ORDER BY position LIMIT 1",
            owner.column()
        );
        Ok(self
            .connection
            .query_row(&sql, params![owner.id(), name], |row| row.get(0))
            .optional()?)
    }

    /// Number of stored entities of each kind.
    pub fn stats(&self) -> Result<Stats, AmlError> {
        Ok(Stats {
            groups: self.count("groups")?,
            object_definitions: self.count("object_definitions")?,
            connection_definitions: self.count("connection_definitions")?,
            models: self.count("models")?,
            object_occurrences: self.count("object_occurrences")?,
            connection_occurrences: self.count("connection_occurrences")?,
        })
    }

    fn count(&self, table: &str) -> Result<usize, AmlError> {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let count: i64 = self.connection.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn group_row(row: &Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
        id: row.get(0)?,
        source_id: row.get(1)?,
        guid: row.get(2)?,
        name: row.get(3)?,
        level: row.get(4)?,
        path: row.get(5)?,
        parent_id: row.get(6)?,
    })
}

fn object_definition_row(row: &Row<'_>) -> rusqlite::Result<ObjectDefinitionRow> {
    Ok(ObjectDefinitionRow {
        id: row.get(0)?,
        source_id: row.get(1)?,
        guid: row.get(2)?,
        name: row.get(3)?,
        type_code: row.get(4)?,
        symbol: row.get(5)?,
        path: row.get(6)?,
        group_id: row.get(7)?,
    })
}

fn connection_definition_row(row: &Row<'_>) -> rusqlite::Result<ConnectionDefinitionRow> {
    Ok(ConnectionDefinitionRow {
        id: row.get(0)?,
        source_id: row.get(1)?,
        guid: row.get(2)?,
        type_code: row.get(3)?,
        object_definition_id: row.get(4)?,
        target_id: row.get(5)?,
    })
}

fn model_row(row: &Row<'_>) -> rusqlite::Result<ModelRow> {
    Ok(ModelRow {
        id: row.get(0)?,
        source_id: row.get(1)?,
        guid: row.get(2)?,
        name: row.get(3)?,
        type_code: row.get(4)?,
        path: row.get(5)?,
        group_id: row.get(6)?,
        superior_id: row.get(7)?,
    })
}

fn occurrence_row(row: &Row<'_>) -> rusqlite::Result<OccurrenceRow> {
    Ok(OccurrenceRow {
        id: row.get(0)?,
        source_id: row.get(1)?,
        name: row.get(2)?,
        symbol: row.get(3)?,
        derived_symbol: row.get(4)?,
        position: Position {
            x: row.get(5)?,
            y: row.get(6)?,
        },
        size: Size {
            width: row.get(7)?,
            height: row.get(8)?,
        },
        object_definition_id: row.get(9)?,
        model_id: row.get(10)?,
    })
}

fn connection_occurrence_row(row: &Row<'_>) -> rusqlite::Result<ConnectionOccurrenceRow> {
    Ok(ConnectionOccurrenceRow {
        id: row.get(0)?,
        source_id: row.get(1)?,
        type_code: row.get(2)?,
        connection_definition_id: row.get(3)?,
        object_occurrence_id: row.get(4)?,
        target_id: row.get(5)?,
    })
}
