//! Table layout of the store.
//!
//! Row ids are the arena index of the entity plus one. The self-reference of
//! `groups` is deferred to commit time because duplicated group ids may place
//! a parent after its child in arena order.

pub(super) const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE groups (
    id          INTEGER PRIMARY KEY,
    source_id   TEXT    NOT NULL,
    guid        TEXT,
    name        TEXT    NOT NULL,
    level       INTEGER NOT NULL,
    path        TEXT    NOT NULL,
    parent_id   INTEGER REFERENCES groups(id) DEFERRABLE INITIALLY DEFERRED
);

CREATE TABLE object_definitions (
    id          INTEGER PRIMARY KEY,
    source_id   TEXT    NOT NULL,
    guid        TEXT    NOT NULL,
    name        TEXT    NOT NULL,
    type        TEXT    NOT NULL,
    symbol      TEXT    NOT NULL,
    path        TEXT    NOT NULL,
    group_id    INTEGER NOT NULL REFERENCES groups(id)
);

CREATE TABLE connection_definitions (
    id                      INTEGER PRIMARY KEY,
    source_id               TEXT    NOT NULL,
    guid                    TEXT    NOT NULL,
    type                    TEXT    NOT NULL,
    object_definition_id    INTEGER NOT NULL REFERENCES object_definitions(id),
    target_id               INTEGER REFERENCES object_definitions(id)
);

CREATE TABLE models (
    id          INTEGER PRIMARY KEY,
    source_id   TEXT    NOT NULL,
    guid        TEXT    NOT NULL,
    name        TEXT    NOT NULL,
    type        TEXT    NOT NULL,
    path        TEXT    NOT NULL,
    group_id    INTEGER NOT NULL REFERENCES groups(id),
    superior_id INTEGER REFERENCES object_definitions(id)
);

CREATE TABLE object_occurrences (
    id                      INTEGER PRIMARY KEY,
    source_id               TEXT    NOT NULL,
    symbol                  TEXT    NOT NULL,
    derived_symbol          TEXT,
    x                       INTEGER NOT NULL,
    y                       INTEGER NOT NULL,
    width                   INTEGER NOT NULL,
    height                  INTEGER NOT NULL,
    object_definition_id    INTEGER NOT NULL REFERENCES object_definitions(id),
    model_id                INTEGER NOT NULL REFERENCES models(id),
    position                INTEGER NOT NULL
);

CREATE TABLE connection_occurrences (
    id                          INTEGER PRIMARY KEY,
    source_id                   TEXT    NOT NULL,
    connection_definition_id    INTEGER NOT NULL REFERENCES connection_definitions(id),
    object_occurrence_id        INTEGER NOT NULL REFERENCES object_occurrences(id),
    target_id                   INTEGER REFERENCES object_occurrences(id)
);

CREATE TABLE attributes (
    id                          INTEGER PRIMARY KEY,
    name                        TEXT    NOT NULL,
    value                       TEXT    NOT NULL,
    position                    INTEGER NOT NULL,
    group_id                    INTEGER REFERENCES groups(id),
    connection_definition_id    INTEGER REFERENCES connection_definitions(id),
    object_definition_id        INTEGER REFERENCES object_definitions(id),
    model_id                    INTEGER REFERENCES models(id)
);

CREATE TABLE linked_models (
    object_definition_id    INTEGER NOT NULL REFERENCES object_definitions(id),
    model_id                INTEGER NOT NULL REFERENCES models(id),
    position                INTEGER NOT NULL,
    PRIMARY KEY (object_definition_id, model_id)
);

CREATE INDEX idx_models_source_id ON models(source_id);
CREATE INDEX idx_models_guid ON models(guid);
CREATE INDEX idx_object_definitions_source_id ON object_definitions(source_id);
CREATE INDEX idx_connection_definitions_source ON connection_definitions(object_definition_id);
CREATE INDEX idx_object_occurrences_model ON object_occurrences(model_id);
CREATE INDEX idx_connection_occurrences_source ON connection_occurrences(object_occurrence_id);
CREATE INDEX idx_connection_occurrences_target ON connection_occurrences(target_id);
CREATE INDEX idx_attributes_group ON attributes(group_id);
CREATE INDEX idx_attributes_connection_definition ON attributes(connection_definition_id);
CREATE INDEX idx_attributes_object_definition ON attributes(object_definition_id);
CREATE INDEX idx_attributes_model ON attributes(model_id);
"#;
