//! amlgraph Core Types and Definitions
//!
//! This crate provides the foundational types shared by the amlgraph parser,
//! store and query layers. It includes:
//!
//! - **Identifiers**: Interned source identifiers ([`identifier::SourceId`])
//! - **Arenas**: Typed handles and per-kind entity storage ([`arena`] module)
//! - **Attributes**: Name/value pairs and the [`attribute::HasAttributes`] capability
//! - **Entities**: Groups, definitions, models and occurrences ([`entity`] module)
//! - **Graph**: The fully resolved repository ([`graph::Graph`])

pub mod arena;
pub mod attribute;
pub mod entity;
pub mod graph;
pub mod identifier;
