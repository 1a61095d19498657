//! Error and diagnostic system for the amlgraph parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Byte offsets pointing into the source document
//! - Diagnostic collector for accumulating multiple errors
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single fatal error message with optional error code, source offset
//! and help text. Multiple diagnostics are wrapped in [`ParseError`] for
//! returning from the parsing lifecycle.
//!
//! The walker fails on the first structural problem, so its errors carry one
//! diagnostic. The resolver reports every dangling reference it finds in a
//! single [`ParseError`].
//!
//! # Example
//!
//! ```
//! # use amlgraph_parser::error::{Diagnostic, ErrorCode};
//!
//! let diag = Diagnostic::error("object definition `ObjDef.7` is not defined")
//!     .with_code(ErrorCode::E201)
//!     .with_offset(4096)
//!     .with_help("check the `ToObjDef.IdRef` attribute of connection `CxnDef.3`");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod parse_error;

pub(crate) use collector::DiagnosticCollector;
pub(crate) use parse_error::Result;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use parse_error::ParseError;
