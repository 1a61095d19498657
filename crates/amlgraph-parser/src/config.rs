//! Parser configuration.

/// Attribute type code promoted to an entity's display name.
pub const DEFAULT_NAME_ATTRIBUTE: &str = "AT_NAME";

/// Source identifier the root group is registered under.
pub const DEFAULT_ROOT_GROUP_ID: &str = "Group.Root";

/// Configuration for walking and extracting an AML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseConfig {
    /// Attribute definition type whose value becomes the entity name.
    pub name_attribute: String,
    /// Sentinel source id of the synthesized root group.
    pub root_group_id: String,
}

impl ParseConfig {
    /// Create a new ParseConfig with the given name designator and root id.
    pub fn new(name_attribute: impl Into<String>, root_group_id: impl Into<String>) -> Self {
        Self {
            name_attribute: name_attribute.into(),
            root_group_id: root_group_id.into(),
        }
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NAME_ATTRIBUTE, DEFAULT_ROOT_GROUP_ID)
    }
}
