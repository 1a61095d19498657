//! Configuration types for amlgraph imports.
//!
//! This module provides the configuration structures that control how AML
//! documents are parsed, where the resulting store is written, and how the
//! query façade interprets model types. All types implement
//! [`serde::Deserialize`] so they can be loaded from a TOML file; every field
//! has a default.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`ParserConfig`] - Display-name designator and root group sentinel id.
//! - [`StoreConfig`] - Extension of the store written next to the input.
//! - [`QueryConfig`] - Model type used for functional allocation lookups.
//!
//! # Example
//!
//! ```
//! # use amlgraph::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.parser().name_attribute(), "AT_NAME");
//! assert_eq!(config.store().extension(), "db");
//! ```

use serde::Deserialize;

use amlgraph_parser::{DEFAULT_NAME_ATTRIBUTE, DEFAULT_ROOT_GROUP_ID, ParseConfig};

/// Default extension of the generated store.
pub const DEFAULT_STORE_EXTENSION: &str = "db";

/// Default model type of functional allocation diagrams.
pub const DEFAULT_FUNCTIONAL_ALLOCATION_MODEL_TYPE: &str = "MT_FUNC_ALLOC_DGM";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Parser configuration section.
    #[serde(default)]
    parser: ParserConfig,

    /// Store configuration section.
    #[serde(default)]
    store: StoreConfig,

    /// Query configuration section.
    #[serde(default)]
    query: QueryConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(parser: ParserConfig, store: StoreConfig, query: QueryConfig) -> Self {
        Self {
            parser,
            store,
            query,
        }
    }

    /// Returns the parser configuration.
    pub fn parser(&self) -> &ParserConfig {
        &self.parser
    }

    /// Returns the store configuration.
    pub fn store(&self) -> &StoreConfig {
        &self.store
    }

    /// Returns the query configuration.
    pub fn query(&self) -> &QueryConfig {
        &self.query
    }
}

/// How AML documents are read.
#[derive(Debug, Clone, Deserialize)]
pub struct ParserConfig {
    /// `AttrDef.Type` whose value becomes an entity's display name.
    #[serde(default = "default_name_attribute")]
    name_attribute: String,

    /// Id given to the root group, whatever the document calls it.
    #[serde(default = "default_root_group_id")]
    root_group_id: String,
}

impl ParserConfig {
    /// Creates a new [`ParserConfig`].
    ///
    /// # Arguments
    ///
    /// * `name_attribute` - Attribute type holding display names.
    /// * `root_group_id` - Sentinel id of the root group.
    pub fn new(name_attribute: impl Into<String>, root_group_id: impl Into<String>) -> Self {
        Self {
            name_attribute: name_attribute.into(),
            root_group_id: root_group_id.into(),
        }
    }

    /// Returns the display-name attribute type.
    pub fn name_attribute(&self) -> &str {
        &self.name_attribute
    }

    /// Returns the root group sentinel id.
    pub fn root_group_id(&self) -> &str {
        &self.root_group_id
    }

    /// Converts this section into the parser's own configuration.
    pub fn to_parse_config(&self) -> ParseConfig {
        ParseConfig::new(&self.name_attribute, &self.root_group_id)
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NAME_ATTRIBUTE, DEFAULT_ROOT_GROUP_ID)
    }
}

/// Where the store is written.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Extension replacing the input's extension, without the leading dot.
    #[serde(default = "default_store_extension")]
    extension: String,
}

impl StoreConfig {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    /// Returns the store extension.
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_EXTENSION)
    }
}

/// Settings of the read-only query façade.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_functional_allocation_model_type")]
    functional_allocation_model_type: String,
}

impl QueryConfig {
    pub fn new(functional_allocation_model_type: impl Into<String>) -> Self {
        Self {
            functional_allocation_model_type: functional_allocation_model_type.into(),
        }
    }

    /// Returns the model type searched by functional allocation lookups.
    pub fn functional_allocation_model_type(&self) -> &str {
        &self.functional_allocation_model_type
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FUNCTIONAL_ALLOCATION_MODEL_TYPE)
    }
}

fn default_name_attribute() -> String {
    DEFAULT_NAME_ATTRIBUTE.to_string()
}

fn default_root_group_id() -> String {
    DEFAULT_ROOT_GROUP_ID.to_string()
}

fn default_store_extension() -> String {
    DEFAULT_STORE_EXTENSION.to_string()
}

fn default_functional_allocation_model_type() -> String {
    DEFAULT_FUNCTIONAL_ALLOCATION_MODEL_TYPE.to_string()
}
