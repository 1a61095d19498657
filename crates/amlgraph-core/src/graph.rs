//! The fully resolved repository graph.
//!
//! A [`Graph`] owns one [`Arena`] per entity kind. It is produced by the
//! resolver once every cross-reference has been wired and is immutable from
//! then on: callers only ever get shared references to its entities.

use std::{fmt, str::FromStr};

use log::debug;
use serde::Serialize;
use thiserror::Error;

use crate::{
    arena::Arena,
    entity::{
        ConnectionDefinition, ConnectionOccurrence, Group, GroupHandle, Model, ObjectDefinition,
        ObjectOccurrence, ObjectOccurrenceHandle,
    },
};

/// Which connections of an occurrence to follow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Connections owned by the occurrence.
    #[default]
    Out,
    /// Connections pointing at the occurrence.
    In,
    /// Outgoing results followed by incoming results.
    Both,
}

impl Direction {
    /// Returns `true` if outgoing connections are followed.
    pub fn includes_out(self) -> bool {
        matches!(self, Direction::Out | Direction::Both)
    }

    /// Returns `true` if incoming connections are followed.
    pub fn includes_in(self) -> bool {
        matches!(self, Direction::In | Direction::Both)
    }
}

/// Error returned when parsing an unknown [`Direction`].
#[derive(Debug, Clone, Error)]
#[error("invalid direction `{0}`, expected one of: out, in, both")]
pub struct InvalidDirection(String);

impl FromStr for Direction {
    type Err = InvalidDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "out" => Ok(Direction::Out),
            "in" => Ok(Direction::In),
            "both" => Ok(Direction::Both),
            other => Err(InvalidDirection(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Out => "out",
            Direction::In => "in",
            Direction::Both => "both",
        };
        f.write_str(name)
    }
}

/// Number of entities of each kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub groups: usize,
    pub object_definitions: usize,
    pub connection_definitions: usize,
    pub models: usize,
    pub object_occurrences: usize,
    pub connection_occurrences: usize,
}

/// A fully linked AML repository.
#[derive(Debug, Clone)]
pub struct Graph {
    root: GroupHandle,
    groups: Arena<Group>,
    object_definitions: Arena<ObjectDefinition>,
    connection_definitions: Arena<ConnectionDefinition>,
    models: Arena<Model>,
    object_occurrences: Arena<ObjectOccurrence>,
    connection_occurrences: Arena<ConnectionOccurrence>,
}

impl Graph {
    /// Assembles a graph from resolved arenas.
    pub fn new(
        root: GroupHandle,
        groups: Arena<Group>,
        object_definitions: Arena<ObjectDefinition>,
        connection_definitions: Arena<ConnectionDefinition>,
        models: Arena<Model>,
        object_occurrences: Arena<ObjectOccurrence>,
        connection_occurrences: Arena<ConnectionOccurrence>,
    ) -> Self {
        let graph = Self {
            root,
            groups,
            object_definitions,
            connection_definitions,
            models,
            object_occurrences,
            connection_occurrences,
        };
        debug!(stats:? = graph.stats(); "Graph assembled");
        graph
    }

    /// The single group without parent.
    pub fn root(&self) -> GroupHandle {
        self.root
    }

    pub fn groups(&self) -> &Arena<Group> {
        &self.groups
    }

    pub fn object_definitions(&self) -> &Arena<ObjectDefinition> {
        &self.object_definitions
    }

    pub fn connection_definitions(&self) -> &Arena<ConnectionDefinition> {
        &self.connection_definitions
    }

    pub fn models(&self) -> &Arena<Model> {
        &self.models
    }

    pub fn object_occurrences(&self) -> &Arena<ObjectOccurrence> {
        &self.object_occurrences
    }

    pub fn connection_occurrences(&self) -> &Arena<ConnectionOccurrence> {
        &self.connection_occurrences
    }

    /// Iterates from `group` up to the root, excluding `group` itself.
    pub fn ancestors(&self, group: GroupHandle) -> impl Iterator<Item = GroupHandle> + '_ {
        std::iter::successors(self.groups[group].parent, |&parent| {
            self.groups[parent].parent
        })
    }

    /// Display name of an occurrence, taken from its definition.
    pub fn occurrence_name(&self, occurrence: ObjectOccurrenceHandle) -> &str {
        let definition = self.object_occurrences[occurrence].definition;
        &self.object_definitions[definition].name
    }

    /// Occurrences connected to `occurrence`.
    ///
    /// `connection_types` and `symbols` restrict the connection type code and
    /// the neighbour's symbol; an empty slice means no restriction. With
    /// [`Direction::Both`] outgoing neighbours come first.
    pub fn connected_occurrences(
        &self,
        occurrence: ObjectOccurrenceHandle,
        connection_types: &[&str],
        symbols: &[&str],
        direction: Direction,
    ) -> Vec<ObjectOccurrenceHandle> {
        let type_matches = |connection: &ConnectionOccurrence| {
            let type_code = &self.connection_definitions[connection.definition].type_code;
            connection_types.is_empty() || connection_types.contains(&type_code.as_str())
        };
        let symbol_matches = |neighbour: ObjectOccurrenceHandle| {
            symbols.is_empty()
                || symbols.contains(&self.object_occurrences[neighbour].symbol.as_str())
        };

        let mut connected = Vec::new();
        if direction.includes_out() {
            for &handle in &self.object_occurrences[occurrence].connections {
                let connection = &self.connection_occurrences[handle];
                if let Some(target) = connection.target {
                    if type_matches(connection) && symbol_matches(target) {
                        connected.push(target);
                    }
                }
            }
        }
        if direction.includes_in() {
            let model = self.object_occurrences[occurrence].model;
            for &candidate in &self.models[model].occurrences {
                for &handle in &self.object_occurrences[candidate].connections {
                    let connection = &self.connection_occurrences[handle];
                    if connection.target == Some(occurrence)
                        && type_matches(connection)
                        && symbol_matches(candidate)
                    {
                        connected.push(candidate);
                    }
                }
            }
        }
        connected
    }

    /// Counts of each entity kind.
    pub fn stats(&self) -> Stats {
        Stats {
            groups: self.groups.len(),
            object_definitions: self.object_definitions.len(),
            connection_definitions: self.connection_definitions.len(),
            models: self.models.len(),
            object_occurrences: self.object_occurrences.len(),
            connection_occurrences: self.connection_occurrences.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        arena::Handle,
        attribute::Attributes,
        entity::{Position, Size},
        identifier::SourceId,
    };

    fn group(id: &str, name: &str, level: usize, parent: Option<GroupHandle>) -> Group {
        Group {
            source_id: SourceId::new(id),
            guid: None,
            name: name.to_string(),
            level,
            path: String::new(),
            parent,
            attributes: Attributes::new(),
            children: Vec::new(),
            object_definitions: Vec::new(),
            models: Vec::new(),
        }
    }

    /// Two occurrences of one definition in one model, joined by one connection.
    fn two_occurrence_graph() -> Graph {
        let mut groups = Arena::default();
        let root = groups.push(group("graph.Root", ".", 0, None));

        let mut definitions = Arena::default();
        let definition = definitions.push(ObjectDefinition {
            source_id: SourceId::new("graph.D1"),
            guid: "d1".to_string(),
            name: "Invoice".to_string(),
            type_code: "OT_FUNC".to_string(),
            symbol: "ST_FUNC".to_string(),
            path: ".".to_string(),
            attributes: Attributes::new(),
            group: root,
            connections: Vec::new(),
            linked_models: Vec::new(),
            occurrences: vec![Handle::new(0), Handle::new(1)],
        });

        let mut connection_definitions = Arena::default();
        let connection_definition = connection_definitions.push(ConnectionDefinition {
            source_id: SourceId::new("graph.CD1"),
            guid: "cd1".to_string(),
            type_code: "is input for".to_string(),
            attributes: Attributes::new(),
            source: definition,
            target: Some(definition),
            occurrences: vec![Handle::new(0)],
        });

        let mut models = Arena::default();
        let model = models.push(Model {
            source_id: SourceId::new("graph.M1"),
            guid: "m1".to_string(),
            name: "Billing".to_string(),
            type_code: "MT_EEPC".to_string(),
            path: ".".to_string(),
            attributes: Attributes::new(),
            group: root,
            superior: None,
            occurrences: vec![Handle::new(0), Handle::new(1)],
        });

        let occurrence = |id: &str, symbol: &str, connections| ObjectOccurrence {
            source_id: SourceId::new(id),
            symbol: symbol.to_string(),
            derived_symbol: None,
            position: Position::default(),
            size: Size::default(),
            definition,
            model,
            connections,
        };
        let mut occurrences = Arena::default();
        let o1 = occurrences.push(occurrence("graph.O1", "ST_FUNC", vec![Handle::new(0)]));
        let o2 = occurrences.push(occurrence("graph.O2", "ST_EV", Vec::new()));

        let mut connection_occurrences = Arena::default();
        connection_occurrences.push(ConnectionOccurrence {
            source_id: SourceId::new("graph.C1"),
            definition: connection_definition,
            source: o1,
            target: Some(o2),
        });

        Graph::new(
            root,
            groups,
            definitions,
            connection_definitions,
            models,
            occurrences,
            connection_occurrences,
        )
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("out".parse::<Direction>().unwrap(), Direction::Out);
        assert_eq!("in".parse::<Direction>().unwrap(), Direction::In);
        assert_eq!("both".parse::<Direction>().unwrap(), Direction::Both);
        assert!("sideways".parse::<Direction>().is_err());
        assert_eq!(Direction::default(), Direction::Out);
    }

    #[test]
    fn test_connected_occurrences_by_direction() {
        let graph = two_occurrence_graph();
        let o1 = Handle::new(0);
        let o2 = Handle::new(1);
        let types = ["is input for"];

        assert_eq!(
            graph.connected_occurrences(o1, &types, &[], Direction::Out),
            vec![o2]
        );
        assert_eq!(
            graph.connected_occurrences(o2, &types, &[], Direction::In),
            vec![o1]
        );
        assert_eq!(
            graph.connected_occurrences(o1, &types, &[], Direction::Both),
            vec![o2]
        );
        assert_eq!(
            graph.connected_occurrences(o2, &types, &[], Direction::Both),
            vec![o1]
        );
        assert!(graph.connected_occurrences(o1, &types, &[], Direction::In).is_empty());
    }

    #[test]
    fn test_connected_occurrences_filters() {
        let graph = two_occurrence_graph();
        let o1 = Handle::new(0);

        assert!(
            graph
                .connected_occurrences(o1, &["is output of"], &[], Direction::Out)
                .is_empty()
        );
        assert!(
            graph
                .connected_occurrences(o1, &[], &["ST_FUNC"], Direction::Out)
                .is_empty()
        );
        assert_eq!(
            graph.connected_occurrences(o1, &[], &["ST_EV"], Direction::Out),
            vec![Handle::new(1)]
        );
    }

    #[test]
    fn test_occurrence_name_and_stats() {
        let graph = two_occurrence_graph();

        assert_eq!(graph.occurrence_name(Handle::new(1)), "Invoice");
        assert_eq!(
            graph.stats(),
            Stats {
                groups: 1,
                object_definitions: 1,
                connection_definitions: 1,
                models: 1,
                object_occurrences: 2,
                connection_occurrences: 1,
            }
        );
    }

    #[test]
    fn test_ancestors_of_root_is_empty() {
        let graph = two_occurrence_graph();
        assert_eq!(graph.ancestors(graph.root()).count(), 0);
    }
}
