//! Attribute decoder.
//!
//! Turns the `AttrDef` children of a group, definition or model into an
//! ordered name/value collection and pulls out the display name.

use indexmap::IndexMap;
use log::warn;

use amlgraph_core::attribute::Attributes;

use crate::node::Node;

/// Attributes of one element, with the display name split off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DecodedAttributes {
    /// Value of the display-name attribute; empty when absent.
    pub name: String,
    pub attributes: Attributes,
}

/// Decodes the direct `AttrDef` children of `element`.
///
/// A repeated type code overwrites the earlier value but keeps its position.
pub(crate) fn decode_attributes(element: &Node, name_attribute: &str) -> DecodedAttributes {
    let mut values: IndexMap<String, String> = IndexMap::new();
    for definition in element.children_named("AttrDef") {
        let Some(key) = definition.attribute("AttrDef.Type") else {
            warn!(
                element = element.name(),
                offset = definition.offset();
                "Skipping attribute definition without type"
            );
            continue;
        };
        values.insert(key.to_string(), attribute_value(definition));
    }

    let name = values.shift_remove(name_attribute).unwrap_or_default();
    DecodedAttributes {
        name,
        attributes: Attributes::from(values),
    }
}

/// Plain-text runs first, then the first `AttrValue`, then empty.
fn attribute_value(definition: &Node) -> String {
    let runs: Vec<&str> = definition
        .descendants_named("PlainText")
        .into_iter()
        .filter_map(|run| run.attribute("TextValue"))
        .filter(|text| !text.is_empty())
        .collect();
    let joined = runs.join(" ");
    let joined = joined.trim();
    if !joined.is_empty() {
        return joined.to_string();
    }

    definition
        .first_descendant("AttrValue")
        .map(|value| value.text().trim().to_string())
        .unwrap_or_default()
}
