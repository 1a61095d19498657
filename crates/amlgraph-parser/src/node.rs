//! Retained XML elements.
//!
//! The walker keeps a [`Node`] for every open element inside the root group
//! and for the closed non-group elements beneath a still-open group. Closed
//! groups are never attached to their parent, which is what keeps the window
//! bounded.

/// An XML element with its attributes, text and retained children.
#[derive(Debug, Clone, Default)]
pub(crate) struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Node>,
    offset: u64,
}

impl Node {
    /// Creates a childless element.
    pub fn new(name: impl Into<String>, attributes: Vec<(String, String)>, offset: u64) -> Self {
        Self {
            name: name.into(),
            attributes,
            text: String::new(),
            children: Vec::new(),
            offset,
        }
    }

    /// The element tag.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte offset of the start tag in the source document.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Value of the XML attribute `key`.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated character data directly inside the element.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn push_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Direct children called `name`, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// First direct child called `name`.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Descendants called `name` in document (pre-)order, excluding `self`.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Node> {
        let mut found = Vec::new();
        let mut pending: Vec<&Node> = self.children.iter().rev().collect();
        while let Some(node) = pending.pop() {
            if node.name == name {
                found.push(node);
            }
            pending.extend(node.children.iter().rev());
        }
        found
    }

    /// First descendant called `name` in document order.
    pub fn first_descendant<'a>(&'a self, name: &str) -> Option<&'a Node> {
        self.children.iter().find_map(|child| {
            if child.name == name {
                Some(child)
            } else {
                child.first_descendant(name)
            }
        })
    }
}
