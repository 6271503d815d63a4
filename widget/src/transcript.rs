//! In-memory stand-in for the hosting document.
//!
//! The widget has no real DOM here; the embedder owns a [`Document`] that
//! carries the injected stylesheets and the scrollable message list. The
//! shell owns every node it creates and mutates them only through handles.

use std::collections::BTreeMap;

/// Who authored a transcript message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

/// Handle to one message cell. Stable for the lifetime of the document;
/// cells are append-only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId(usize);

/// One message in the scrollable list.
#[derive(Clone, Debug)]
pub struct MessageCell {
    pub role: Role,
    /// Rendered HTML for bot cells; escaped text for user cells.
    pub inner_html: String,
    /// Set while the owning stream is still delivering fragments.
    pub streaming: bool,
}

/// Style registry plus message list for one hosting page.
#[derive(Debug, Default)]
pub struct Document {
    styles: BTreeMap<String, String>,
    cells: Vec<MessageCell>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stylesheet under a fixed element id. Returns `false` when
    /// the id is already present, making repeated injection a no-op.
    pub fn inject_style(&mut self, id: &str, css: &str) -> bool {
        if self.styles.contains_key(id) {
            return false;
        }
        self.styles.insert(id.to_string(), css.to_string());
        true
    }

    pub fn has_style(&self, id: &str) -> bool {
        self.styles.contains_key(id)
    }

    pub fn push_cell(&mut self, cell: MessageCell) -> NodeId {
        self.cells.push(cell);
        NodeId(self.cells.len() - 1)
    }

    pub fn cell(&self, id: NodeId) -> Option<&MessageCell> {
        self.cells.get(id.0)
    }

    pub fn cell_mut(&mut self, id: NodeId) -> Option<&mut MessageCell> {
        self.cells.get_mut(id.0)
    }

    pub fn cells(&self) -> &[MessageCell] {
        &self.cells
    }
}
