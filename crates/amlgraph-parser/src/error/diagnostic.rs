//! The core diagnostic type for the amlgraph error system.
//!
//! A [`Diagnostic`] represents a single fatal error with optional
//! error code, byte offset into the source document, and help text.

use std::fmt;

use crate::error::error_code::ErrorCode;

/// A diagnostic message with source location information.
///
/// Diagnostics carry:
/// - An optional error code for documentation and searchability
/// - A primary message describing the issue
/// - The byte offset of the offending element, when known
/// - Optional help text with suggestions
///
/// AML exports are far too large to echo back as source snippets, so the
/// location is a plain byte offset rather than a labeled span.
///
/// # Example
///
/// ```text
/// error[E201]: object definition `ObjDef.7` is not defined
///   at byte 4096
///   = help: referenced by `ToObjDef.IdRef` of connection definition `CxnDef.3`
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    code: Option<ErrorCode>,
    message: String,
    offset: Option<u64>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use amlgraph_parser::error::{Diagnostic, ErrorCode};
    ///
    /// let diag = Diagnostic::error("group `Group.9` is not defined")
    ///     .with_code(ErrorCode::E200)
    ///     .with_offset(120);
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            offset: None,
            help: None,
        }
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Byte offset into the source document, if known.
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the byte offset of the offending element.
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E001]: message (at byte 42)"
        write!(f, "error")?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(offset) = self.offset {
            write!(f, " (at byte {offset})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}
