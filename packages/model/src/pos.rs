//! Position resolution.
//!
//! A bare integer position says nothing about its surroundings; resolving
//! it against a document yields the chain of ancestors it sits inside,
//! the child index it points at in each, and where each ancestor's content
//! starts. Commands lean on this for everything that needs context: the
//! enclosing textblock, block ranges for wrapping, marks at the cursor.

use crate::mark::Mark;
use crate::node::{Node, NodeType};
use crate::schema::Schema;

#[derive(Debug, Clone, Copy)]
struct PathEntry<'a> {
    node: &'a Node,
    /// Index of the child the position points at (or into) within `node`.
    index: usize,
    /// Absolute position where `node`'s content starts.
    start: usize,
}

/// A position with its ancestor chain. Depth 0 is the document itself;
/// the entry at `depth()` is the direct parent of the position.
#[derive(Debug, Clone)]
pub struct ResolvedPos<'a> {
    pos: usize,
    path: Vec<PathEntry<'a>>,
    parent_offset: usize,
}

impl<'a> ResolvedPos<'a> {
    /// Resolves `pos` inside `doc`. Returns `None` when the position lies
    /// outside the document.
    pub fn resolve(doc: &'a Node, pos: usize) -> Option<ResolvedPos<'a>> {
        if !doc.is_element() || pos > doc.content_size() {
            return None;
        }
        let mut path = Vec::new();
        let mut node = doc;
        let mut start = 0usize;
        loop {
            let rel = pos - start;
            let mut offset = 0usize;
            let mut index = node.child_count();
            let mut inside: Option<(&Node, usize)> = None;
            for (i, child) in node.children().iter().enumerate() {
                if rel == offset {
                    index = i;
                    break;
                }
                let size = child.node_size();
                if rel < offset + size {
                    index = i;
                    inside = Some((child, start + offset));
                    break;
                }
                offset += size;
            }
            path.push(PathEntry { node, index, start });
            match inside {
                Some((child, child_pos)) if child.is_element() && !child.node_type().is_leaf() => {
                    node = child;
                    start = child_pos + 1;
                }
                _ => {
                    return Some(ResolvedPos {
                        pos,
                        path,
                        parent_offset: rel,
                    });
                }
            }
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    /// The ancestor at the given depth (0 = document root).
    pub fn node(&self, depth: usize) -> &'a Node {
        self.path[depth].node
    }

    /// The direct parent of the position.
    pub fn parent(&self) -> &'a Node {
        self.node(self.depth())
    }

    /// Child index the position points at within the ancestor at `depth`.
    pub fn index(&self, depth: usize) -> usize {
        self.path[depth].index
    }

    /// Absolute position where the content of the ancestor at `depth`
    /// starts.
    pub fn start(&self, depth: usize) -> usize {
        self.path[depth].start
    }

    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content_size()
    }

    /// Position directly before the ancestor at `depth`. The document
    /// itself has no before.
    pub fn before(&self, depth: usize) -> Option<usize> {
        if depth == 0 {
            None
        } else {
            Some(self.start(depth) - 1)
        }
    }

    /// Position directly after the ancestor at `depth`.
    pub fn after(&self, depth: usize) -> Option<usize> {
        self.before(depth)
            .map(|before| before + self.node(depth).node_size())
    }

    /// Offset of the position within its parent's content.
    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    /// The textblock ancestor closest to the position, with its depth.
    pub fn textblock(&self) -> Option<(&'a Node, usize)> {
        (0..=self.depth())
            .rev()
            .map(|d| (self.node(d), d))
            .find(|(n, _)| n.node_type().is_textblock())
    }

    /// The nearest ancestor of the given type, with its depth.
    pub fn ancestor_of_type(&self, node_type: NodeType) -> Option<(&'a Node, usize)> {
        (0..=self.depth())
            .rev()
            .map(|d| (self.node(d), d))
            .find(|(n, _)| n.node_type() == node_type)
    }

    /// Marks active at this position: the marks of the text ending here
    /// (minus non-inclusive ones), or of the text starting here when the
    /// position opens its parent.
    pub fn marks(&self, schema: &Schema) -> Vec<Mark> {
        let parent = self.parent();
        let children = parent.children();
        let index = self.index(self.depth());

        let child_start: usize = children[..index].iter().map(Node::node_size).sum();
        if self.parent_offset > child_start {
            // strictly inside a text node
            if let Some(child) = children.get(index) {
                return child.marks().to_vec();
            }
        }
        if index > 0 {
            return children[index - 1]
                .marks()
                .iter()
                .filter(|m| schema.mark_inclusive(m.mark_type()))
                .cloned()
                .collect();
        }
        if let Some(next) = children.get(index) {
            return next.marks().to_vec();
        }
        Vec::new()
    }

    /// Deepest depth at which this position and `other` share an ancestor.
    /// Both must be resolved against the same document.
    pub fn shared_depth(&self, other: &ResolvedPos<'a>) -> usize {
        let max = self.depth().min(other.depth());
        let mut shared = 0;
        for d in 1..=max {
            if std::ptr::eq(self.path[d].node, other.path[d].node) {
                shared = d;
            } else {
                break;
            }
        }
        shared
    }

    /// The range of block-level children spanned by `self..other` inside
    /// their shared ancestor. `self` must not come after `other`.
    pub fn block_range(&self, other: &ResolvedPos<'a>) -> Option<BlockRange<'a>> {
        let mut depth = self.shared_depth(other);
        // ascend out of textblocks and inline containers to a node whose
        // children are blocks
        while depth > 0 {
            let t = self.node(depth).node_type();
            if t.is_textblock() || t.is_inline() {
                depth -= 1;
            } else {
                break;
            }
        }
        let parent = self.node(depth);

        let start_index = self.index(depth);
        let mut end_index = other.index(depth);
        // a position deeper than the shared depth sits inside the child it
        // points at, so that child is part of the range
        if other.depth() > depth || other.parent_offset() > child_offset(parent, end_index) {
            end_index += 1;
        }
        if start_index >= end_index || end_index > parent.child_count() {
            return None;
        }

        let content_start = self.start(depth);
        let start = content_start + child_offset(parent, start_index);
        let end = content_start + child_offset(parent, end_index);
        Some(BlockRange {
            parent,
            depth,
            start_index,
            end_index,
            start,
            end,
        })
    }
}

fn child_offset(parent: &Node, index: usize) -> usize {
    parent.children()[..index].iter().map(Node::node_size).sum()
}

/// A contiguous run of children inside one parent, with absolute positions
/// before the first and after the last.
#[derive(Debug, Clone, Copy)]
pub struct BlockRange<'a> {
    pub parent: &'a Node,
    pub depth: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub start: usize,
    pub end: usize,
}

impl<'a> BlockRange<'a> {
    pub fn children(&self) -> &'a [Node] {
        &self.parent.children()[self.start_index..self.end_index]
    }
}
