//! Traversal position: the path, value and container stacks.
//!
//! The path and value stacks always have the same length. Their first entry
//! is a placeholder for the root; every other entry is one step from the root
//! to the current node. The container stack has one frame per container the
//! engine is streaming through. All three grow and shrink with the nesting
//! depth of the input only.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathElem {
    /// Placeholder at the bottom of the stack; ignored by matching
    Root,
    Index(usize),
    Name(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Object,
    Array,
}

/// Where the scan is inside a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructurePosition {
    /// The opening `{` is peeked but not consumed
    ObjectBegin,
    /// Between members, the next key is not read yet
    ObjectMiddle,
    /// The opening `[` is peeked but not consumed
    ArrayBegin,
    /// Between elements
    ArrayMiddle,
}

/// Bookkeeping for one container that is streamed through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerFrame {
    pub kind: ContainerKind,
    pub position: StructurePosition,
    /// Index the next array element gets
    pub next_index: usize,
}

impl ContainerFrame {
    #[must_use]
    pub fn new(kind: ContainerKind) -> Self {
        let position = match kind {
            ContainerKind::Object => StructurePosition::ObjectBegin,
            ContainerKind::Array => StructurePosition::ArrayBegin,
        };
        ContainerFrame {
            kind,
            position,
            next_index: 0,
        }
    }
}

#[derive(Debug)]
pub struct TraversalStack {
    path: Vec<PathElem>,
    values: Vec<Option<Value>>,
    containers: Vec<ContainerFrame>,
}

impl Default for TraversalStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TraversalStack {
    #[must_use]
    pub fn new() -> Self {
        TraversalStack {
            path: vec![PathElem::Root],
            values: vec![None],
            containers: Vec::new(),
        }
    }

    /// Path from the root to the current node, root placeholder included.
    #[must_use]
    pub fn path(&self) -> &[PathElem] {
        &self.path
    }

    pub fn push_node(&mut self, elem: PathElem) {
        self.path.push(elem);
        self.values.push(None);
    }

    pub fn set_value(&mut self, value: Value) {
        if let Some(slot) = self.values.last_mut() {
            *slot = Some(value);
        }
    }

    /// Move the decoded value of the current node out, if it is a scalar or
    /// was materialized.
    pub fn take_value(&mut self) -> Option<Value> {
        self.values.last_mut().and_then(Option::take)
    }

    /// Drop the current node. The root placeholder stays.
    pub fn pop_node(&mut self) {
        if self.path.len() > 1 {
            self.path.pop();
            self.values.pop();
        }
    }

    pub fn open_container(&mut self, kind: ContainerKind) {
        self.containers.push(ContainerFrame::new(kind));
    }

    pub fn close_container(&mut self) -> Option<ContainerFrame> {
        self.containers.pop()
    }

    pub fn top_container(&mut self) -> Option<&mut ContainerFrame> {
        self.containers.last_mut()
    }

    #[must_use]
    pub fn container_depth(&self) -> usize {
        self.containers.len()
    }

    #[must_use]
    pub fn canonical_path(&self) -> String {
        canonical_path(&self.path)
    }
}

/// Render a path as normalized JSONPath text: `$`, then `[i]` for array
/// elements, `.name` for identifier-like member names and `['name']` for the rest.
#[must_use]
pub fn canonical_path(path: &[PathElem]) -> String {
    let mut text = String::from("$");
    for elem in path {
        push_elem(&mut text, elem);
    }
    text
}

pub fn push_elem(text: &mut String, elem: &PathElem) {
    match elem {
        PathElem::Root => {}
        PathElem::Index(index) => push_index(text, *index),
        PathElem::Name(name) => push_name(text, name),
    }
}

pub fn push_index(text: &mut String, index: usize) {
    text.push('[');
    text.push_str(&index.to_string());
    text.push(']');
}

pub fn push_name(text: &mut String, name: &str) {
    if is_identifier(name) {
        text.push('.');
        text.push_str(name);
        return;
    }
    text.push_str("['");
    for c in name.chars() {
        match c {
            '\'' | '\\' => {
                text.push('\\');
                text.push(c);
            }
            '\u{8}' => text.push_str("\\b"),
            '\u{c}' => text.push_str("\\f"),
            '\n' => text.push_str("\\n"),
            '\r' => text.push_str("\\r"),
            '\t' => text.push_str("\\t"),
            c if c < ' ' => text.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => text.push(c),
        }
    }
    text.push_str("']");
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
