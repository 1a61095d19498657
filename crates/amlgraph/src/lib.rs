//! amlgraph - Import AML repository exports into a queryable graph store.
//!
//! An AML document is streamed into a fully cross-referenced graph, written
//! to a SQLite store next to the input, and read back through a query façade.

pub mod config;
pub mod query;
pub mod store;

mod error;

pub use amlgraph_core::{arena, attribute, entity, graph, identifier};

pub use error::AmlError;

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use log::{debug, info, trace};

use config::AppConfig;
use graph::{Graph, Stats};
use query::Repository;

/// Pipeline for importing AML documents and opening their stores.
///
/// # Examples
///
/// ```rust,no_run
/// use amlgraph::{Importer, config::AppConfig};
///
/// let importer = Importer::new(AppConfig::default());
///
/// // Parse, materialize and open the store next to the input
/// let repository = importer
///     .open("export.xml", false)
///     .expect("Failed to import");
///
/// let stats = repository.stats().expect("Failed to count entities");
/// println!("{} models", stats.models);
/// ```
#[derive(Debug, Default)]
pub struct Importer {
    config: AppConfig,
}

impl Importer {
    /// Create a new importer with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Parser, store and query settings
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// The configuration this importer was created with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Location of the store generated for `input`.
    ///
    /// ```
    /// # use amlgraph::Importer;
    /// # use std::path::Path;
    /// let importer = Importer::default();
    /// assert_eq!(importer.store_path("exports/bank.xml"), Path::new("exports/bank.db"));
    /// ```
    pub fn store_path(&self, input: impl AsRef<Path>) -> PathBuf {
        input.as_ref().with_extension(self.config.store().extension())
    }

    /// Parse the AML document at `input` into a resolved graph.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::MissingInput`] if the file does not exist, and
    /// [`AmlError::Parse`] carrying every diagnostic if the document is
    /// malformed or holds dangling references.
    pub fn parse(&self, input: impl AsRef<Path>) -> Result<Graph, AmlError> {
        let input = input.as_ref();
        if !input.is_file() {
            return Err(AmlError::MissingInput(input.to_path_buf()));
        }
        info!(input:? = input; "Parsing AML document");

        let reader = BufReader::new(File::open(input)?);
        self.parse_source(reader)
            .map_err(|err| AmlError::new_parse_error(err, Some(input.to_path_buf())))
    }

    /// Parse an AML document from any buffered reader.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::Parse`] if the document is malformed or holds
    /// dangling references.
    pub fn parse_reader<R: BufRead>(&self, reader: R) -> Result<Graph, AmlError> {
        info!("Parsing AML stream");
        self.parse_source(reader)
            .map_err(|err| AmlError::new_parse_error(err, None))
    }

    fn parse_source<R: BufRead>(
        &self,
        reader: R,
    ) -> Result<Graph, amlgraph_parser::ParseError> {
        let parse_config = self.config.parser().to_parse_config();
        let graph = amlgraph_parser::parse(reader, &parse_config)?;

        debug!("Document parsed successfully");
        trace!(stats:? = graph.stats(); "Parsed graph");
        Ok(graph)
    }

    /// Write `graph` to a store at `destination`, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::Storage`] on any write failure. The destination
    /// is left as it was.
    pub fn materialize(
        &self,
        graph: &Graph,
        destination: impl AsRef<Path>,
    ) -> Result<Stats, AmlError> {
        Ok(store::materialize(graph, destination.as_ref())?)
    }

    /// Parse `input` and materialize it next to the input.
    ///
    /// Returns the path of the written store.
    ///
    /// # Errors
    ///
    /// Returns any error of [`Self::parse`] or [`Self::materialize`].
    pub fn import(&self, input: impl AsRef<Path>) -> Result<PathBuf, AmlError> {
        let input = input.as_ref();
        let graph = self.parse(input)?;
        let destination = self.store_path(input);
        let stats = self.materialize(&graph, &destination)?;
        info!(store:? = destination, stats:? = stats; "Import finished");
        Ok(destination)
    }

    /// Open the store of `input`, importing it first when it is absent or
    /// `force` is set.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::MissingInput`] if `input` does not exist, any
    /// import error, or a storage error if the store cannot be opened.
    pub fn open(&self, input: impl AsRef<Path>, force: bool) -> Result<Repository, AmlError> {
        let input = input.as_ref();
        if !input.is_file() {
            return Err(AmlError::MissingInput(input.to_path_buf()));
        }

        let destination = self.store_path(input);
        if force || !destination.exists() {
            info!(input:? = input, force = force; "Importing AML document");
            self.import(input)?;
        } else {
            debug!(store:? = destination; "Reusing existing store");
        }

        Repository::open(&destination, self.config.query().clone())
    }
}
