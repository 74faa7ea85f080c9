//! Selections: a text range between two positions, or a rectangular cell
//! selection inside a table.

use serde::{Deserialize, Serialize};

use crate::node::{Node, NodeType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Selection {
    /// Ordinary selection. `anchor` is the fixed side, `head` the moving
    /// side; they are equal for a caret.
    Text { anchor: usize, head: usize },
    /// Cell selection: `anchor` and `head` are positions directly before
    /// two cells of the same table, spanning a rectangle.
    Cell { anchor: usize, head: usize },
}

impl Selection {
    pub fn caret(pos: usize) -> Selection {
        Selection::Text {
            anchor: pos,
            head: pos,
        }
    }

    pub fn text(anchor: usize, head: usize) -> Selection {
        Selection::Text { anchor, head }
    }

    pub fn cell(anchor: usize, head: usize) -> Selection {
        Selection::Cell { anchor, head }
    }

    pub fn anchor(&self) -> usize {
        match self {
            Selection::Text { anchor, .. } | Selection::Cell { anchor, .. } => *anchor,
        }
    }

    pub fn head(&self) -> usize {
        match self {
            Selection::Text { head, .. } | Selection::Cell { head, .. } => *head,
        }
    }

    /// The lower end of the selection.
    pub fn start(&self) -> usize {
        self.anchor().min(self.head())
    }

    /// The upper end of the selection.
    pub fn end(&self) -> usize {
        self.anchor().max(self.head())
    }

    pub fn is_caret(&self) -> bool {
        matches!(self, Selection::Text { anchor, head } if anchor == head)
    }

    /// Clamps the selection into `doc` and downgrades cell selections whose
    /// endpoints no longer sit before cells. Structural edits can invalidate
    /// a selection; this keeps the state usable instead of erroring.
    pub fn normalized(&self, doc: &Node) -> Selection {
        let size = doc.content_size();
        match self {
            Selection::Text { anchor, head } => Selection::Text {
                anchor: (*anchor).min(size),
                head: (*head).min(size),
            },
            Selection::Cell { anchor, head } => {
                let is_cell = |pos: usize| {
                    doc.node_at(pos).is_some_and(|n| {
                        matches!(
                            n.node_type(),
                            NodeType::TableCell | NodeType::TableHeader
                        )
                    })
                };
                if *anchor <= size && *head <= size && is_cell(*anchor) && is_cell(*head) {
                    self.clone()
                } else {
                    Selection::caret(self.start().min(size))
                }
            }
        }
    }
}
