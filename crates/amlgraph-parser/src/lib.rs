//! # amlgraph Parser
//!
//! Streaming parser for AML repository exports. This crate turns an AML
//! document into a fully cross-referenced [`Graph`].
//!
//! ## Pipeline
//!
//! 1. **Walk** - Pull start/text/end events from the document, keeping only
//!    the open part of the tree. Each `Group` is processed when it closes.
//! 2. **Extract** - Decode groups, object and connection definitions, models
//!    and occurrences into records keyed by source id.
//! 3. **Assemble** - Merge records into per-kind registries. Repeated object
//!    definitions overwrite their scalars and accumulate their linked models.
//! 4. **Resolve** - Turn every source-id reference into a typed handle,
//!    reporting all dangling references at once.
//!
//! ## Usage
//!
//! ```
//! # use amlgraph_parser::{parse_str, ParseConfig, ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         <AML>
//!             <Group Group.ID="Group.Root">
//!                 <Group Group.ID="Group.1">
//!                     <GUID>g1</GUID>
//!                     <AttrDef AttrDef.Type="AT_NAME"><AttrValue>Finance</AttrValue></AttrDef>
//!                 </Group>
//!             </Group>
//!         </AML>
//!     "#;
//!
//!     let graph = parse_str(source, &ParseConfig::default())?;
//!     assert_eq!(graph.groups().len(), 2);
//!     Ok(())
//! }
//! ```

mod config;
mod cursor;
mod decode;
pub mod error;
mod extract;
mod node;
#[cfg(test)]
mod parser_tests;
mod record;
mod registry;
mod resolve;
mod walker;

pub use config::{DEFAULT_NAME_ATTRIBUTE, DEFAULT_ROOT_GROUP_ID, ParseConfig};
pub use error::ParseError;

use std::io::BufRead;

use log::info;

use amlgraph_core::{graph::Graph, identifier::SourceId};

use walker::Walker;

/// Parse an AML document into a resolved graph.
///
/// The reader is consumed as a stream; memory held while walking is bounded
/// by the nesting depth of the open groups, not by the document size.
///
/// # Errors
///
/// Returns a [`ParseError`] when the document is malformed, a required field
/// is missing, or any reference is dangling. Dangling references are all
/// reported together.
pub fn parse<R: BufRead>(source: R, config: &ParseConfig) -> Result<Graph, ParseError> {
    let registry = Walker::new(config).walk(source)?;
    let graph = resolve::resolve(registry, SourceId::new(&config.root_group_id))?;
    info!(stats:? = graph.stats(); "AML document parsed");
    Ok(graph)
}

/// Parse an AML document held in memory.
pub fn parse_str(source: &str, config: &ParseConfig) -> Result<Graph, ParseError> {
    parse(source.as_bytes(), config)
}
