//! Error codes for the amlgraph diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Document structure errors
//! - `E1xx` - Field extraction errors
//! - `E2xx` - Dangling reference errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Document Structure Errors (E0xx)
    // =========================================================================
    /// Malformed XML.
    ///
    /// The reader could not tokenize the document, e.g. mismatched tags or
    /// an unterminated element.
    E001,

    /// Invalid text.
    ///
    /// Text or an attribute value could not be unescaped or decoded.
    E002,

    /// Unexpected end of document.
    ///
    /// The input ended while elements were still open.
    E003,

    /// Missing root group.
    ///
    /// The document contains no `Group` element, so the graph has no root.
    E004,

    /// Group outside the root group.
    ///
    /// A `Group` element started with no enclosing group open. Only the
    /// first top-level group may act as the root.
    E005,

    /// Reserved group id.
    ///
    /// A nested group uses the source id reserved for the root group.
    E006,

    /// Inconsistent group hierarchy.
    ///
    /// Repeated group ids produced a parent chain that does not reach the
    /// root in `level` steps.
    E007,

    // =========================================================================
    // Field Extraction Errors (E1xx)
    // =========================================================================
    /// Missing required XML attribute.
    ///
    /// An element lacks an attribute such as `ObjDef.ID` or `CxnDef.IdRef`.
    E100,

    /// Missing required child element.
    ///
    /// A definition or model lacks its `GUID` child.
    E101,

    /// Invalid number.
    ///
    /// A numeric attribute such as `Pos.X` is not an integer.
    E102,

    // =========================================================================
    // Dangling Reference Errors (E2xx)
    // =========================================================================
    /// Undefined group.
    ///
    /// A group's parent id names no parsed group.
    E200,

    /// Undefined object definition.
    ///
    /// A connection target or an occurrence names an object definition that
    /// was never parsed.
    E201,

    /// Undefined connection definition.
    ///
    /// A connection occurrence names a connection definition that was never
    /// parsed.
    E202,

    /// Undefined model.
    ///
    /// A `LinkedModels.IdRefs` list names a model that was never parsed.
    E203,

    /// Undefined object occurrence.
    ///
    /// A connection occurrence targets an object occurrence that was never
    /// parsed.
    E204,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Document structure errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E006 => "E006",
            ErrorCode::E007 => "E007",
            // Field extraction errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            // Dangling reference errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Document structure errors
            ErrorCode::E001 => "malformed XML",
            ErrorCode::E002 => "invalid text",
            ErrorCode::E003 => "unexpected end of document",
            ErrorCode::E004 => "missing root group",
            ErrorCode::E005 => "group outside the root group",
            ErrorCode::E006 => "reserved group id",
            ErrorCode::E007 => "inconsistent group hierarchy",
            // Field extraction errors
            ErrorCode::E100 => "missing required attribute",
            ErrorCode::E101 => "missing required element",
            ErrorCode::E102 => "invalid number",
            // Dangling reference errors
            ErrorCode::E200 => "undefined group",
            ErrorCode::E201 => "undefined object definition",
            ErrorCode::E202 => "undefined connection definition",
            ErrorCode::E203 => "undefined model",
            ErrorCode::E204 => "undefined object occurrence",
        }
    }

    /// Returns `true` for codes reported by the reference resolver.
    pub fn is_dangling_reference(&self) -> bool {
        matches!(
            self,
            ErrorCode::E200 | ErrorCode::E201 | ErrorCode::E202 | ErrorCode::E203 | ErrorCode::E204
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
