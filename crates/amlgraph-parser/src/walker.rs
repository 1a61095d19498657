//! Path-tracking tree walker.
//!
//! The walker consumes [`XmlEvent`]s and keeps only what it still needs:
//!
//! - a frame per open element, holding the retained [`Node`] for elements
//!   inside the root group,
//! - two parallel stacks of the open groups' names and source ids.
//!
//! When a group closes, the `ObjDef` and `Model` elements directly inside it
//! are extracted into the [`Registry`] and the group's subtree is retired.
//! Closed groups are never attached to their parent, so retained memory is
//! bounded by the depth and the not-yet-closed part of the document.

use std::io::BufRead;

use log::{debug, info};

use amlgraph_core::identifier::SourceId;

use crate::{
    config::ParseConfig,
    cursor::{EventCursor, XmlEvent},
    error::{Diagnostic, ErrorCode, Result},
    extract::{self, Parent},
    node::Node,
    registry::Registry,
};

const GROUP: &str = "Group";

#[derive(Debug)]
enum Frame {
    /// An element outside the root group; dropped when it closes.
    Outside,
    /// A non-group element inside the root group.
    Element(Node),
    Group(GroupFrame),
}

#[derive(Debug)]
struct GroupFrame {
    node: Node,
    id: SourceId,
    is_root: bool,
    /// The header has been registered and pushed onto the path stacks.
    opened: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootState {
    Pending,
    Open,
    Closed,
}

/// Streaming walker state.
pub(crate) struct Walker<'a> {
    config: &'a ParseConfig,
    root_id: SourceId,
    registry: Registry,
    frames: Vec<Frame>,
    open_groups: usize,
    root: RootState,
    path: PathStack,
}

/// Names and source ids of the opened groups, root first.
#[derive(Debug, Default)]
struct PathStack {
    names: Vec<String>,
    ids: Vec<SourceId>,
}

impl PathStack {
    /// Slash-joined names of the opened groups.
    fn path(&self) -> String {
        self.names.join("/")
    }

    /// Registers the header of `group` and pushes it, once.
    fn open(&mut self, group: &mut GroupFrame, registry: &mut Registry, config: &ParseConfig) {
        if group.opened {
            return;
        }
        group.opened = true;

        let path = self.path();
        let parent = self.ids.last().map(|&id| Parent {
            id,
            path: path.as_str(),
        });
        let record = extract::group(&group.node, group.id, parent, self.ids.len(), config);

        self.names.push(record.name.clone());
        self.ids.push(record.id);
        registry.insert_group(record);
    }

    fn pop(&mut self) {
        self.names.pop();
        self.ids.pop();
    }
}

impl<'a> Walker<'a> {
    pub fn new(config: &'a ParseConfig) -> Self {
        Self {
            config,
            root_id: SourceId::new(&config.root_group_id),
            registry: Registry::new(),
            frames: Vec::new(),
            open_groups: 0,
            root: RootState::Pending,
            path: PathStack::default(),
        }
    }

    /// Walks the whole document and returns the populated registry.
    pub fn walk<R: BufRead>(mut self, source: R) -> Result<Registry> {
        info!("Walking AML document");
        let mut cursor = EventCursor::new(source);
        for event in cursor.by_ref() {
            match event? {
                XmlEvent::Enter(node) => self.enter(node)?,
                XmlEvent::Text(text) => self.text(&text),
                XmlEvent::Exit => self.exit()?,
            }
        }

        if self.root == RootState::Pending {
            return Err(Diagnostic::error("document contains no `Group` element")
                .with_code(ErrorCode::E004)
                .with_offset(cursor.position())
                .with_help("the first top-level `Group` becomes the root of the graph"));
        }

        info!(
            groups = self.registry.groups.len(),
            object_definitions = self.registry.object_definitions.len(),
            models = self.registry.models.len();
            "Document walked"
        );
        Ok(self.registry)
    }

    fn enter(&mut self, node: Node) -> Result<()> {
        if node.name() != GROUP {
            let frame = if self.open_groups == 0 {
                Frame::Outside
            } else {
                Frame::Element(node)
            };
            self.frames.push(frame);
            return Ok(());
        }

        let is_root = self.open_groups == 0;
        let id = if is_root {
            if self.root != RootState::Pending {
                return Err(Diagnostic::error("group has no enclosing group")
                    .with_code(ErrorCode::E005)
                    .with_offset(node.offset())
                    .with_help("only the first top-level `Group` may act as the root"));
            }
            self.root = RootState::Open;
            self.root_id
        } else {
            let id = node
                .attribute("Group.ID")
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(SourceId::new)
                .ok_or_else(|| {
                    Diagnostic::error("`Group` element has no `Group.ID` attribute")
                        .with_code(ErrorCode::E100)
                        .with_offset(node.offset())
                })?;
            if id == self.root_id {
                return Err(Diagnostic::error(format!(
                    "group id `{id}` is reserved for the root group"
                ))
                .with_code(ErrorCode::E006)
                .with_offset(node.offset()));
            }
            self.open_enclosing_group();
            id
        };

        self.open_groups += 1;
        self.frames.push(Frame::Group(GroupFrame {
            node,
            id,
            is_root,
            opened: false,
        }));
        Ok(())
    }

    fn text(&mut self, text: &str) {
        match self.frames.last_mut() {
            Some(Frame::Element(node)) => node.push_text(text),
            Some(Frame::Group(group)) => group.node.push_text(text),
            Some(Frame::Outside) | None => {}
        }
    }

    fn exit(&mut self) -> Result<()> {
        match self.frames.pop() {
            Some(Frame::Element(node)) => {
                match self.frames.last_mut() {
                    Some(Frame::Element(parent)) => parent.push_child(node),
                    Some(Frame::Group(group)) => group.node.push_child(node),
                    Some(Frame::Outside) | None => {}
                }
                Ok(())
            }
            Some(Frame::Group(group)) => self.close_group(group),
            Some(Frame::Outside) | None => Ok(()),
        }
    }

    /// Registers the header of the innermost open group.
    ///
    /// Called before a nested group starts, so the nested group and everything
    /// extracted below it see the complete ancestor path.
    fn open_enclosing_group(&mut self) {
        let enclosing = self.frames.iter_mut().rev().find_map(|frame| match frame {
            Frame::Group(group) => Some(group),
            _ => None,
        });
        if let Some(group) = enclosing {
            self.path.open(group, &mut self.registry, self.config);
        }
    }

    fn close_group(&mut self, mut group: GroupFrame) -> Result<()> {
        // The header is still pending when no nested group started.
        self.path.open(&mut group, &mut self.registry, self.config);

        let path = self.path.path();
        for definition in group.node.children_named("ObjDef") {
            let bundle = extract::object_definition(definition, group.id, &path, self.config)?;
            self.registry.insert_object_definition(bundle);
        }
        for model in group.node.children_named("Model") {
            let bundle = extract::model(model, group.id, &path, self.config)?;
            self.registry.insert_model(bundle);
        }
        debug!(id:% = group.id, path = path.as_str(); "Group closed");

        self.path.pop();
        self.open_groups -= 1;
        if group.is_root {
            self.root = RootState::Closed;
        }
        Ok(())
    }
}
