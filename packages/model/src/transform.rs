//! Steps and transactions.
//!
//! A [`Transaction`] is an ordered list of [`Step`]s plus an optional
//! selection update. Steps are data, not closures, so a transaction can be
//! logged, serialized, and inspected. Application is atomic: the state
//! applies every step to a scratch copy, validates the result against the
//! schema, and only then commits. A failing step or a schema violation
//! leaves the state untouched.
//!
//! ```text
//! command ──▶ Transaction ──▶ apply to scratch doc ──▶ schema.check ──▶ commit
//!                                      │                     │
//!                                      └──── Err(TransformError): state unchanged
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attrs::{AttrValue, Attrs};
use crate::mark::{self, Mark, MarkType};
use crate::node::{merge_adjacent_text, Node, NodeType};
use crate::pos::ResolvedPos;
use crate::schema::Schema;
use crate::selection::Selection;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("position {pos} is outside the document (content size {size})")]
    OutOfBounds { pos: usize, size: usize },

    #[error("no element starts at position {pos}")]
    NoNodeAt { pos: usize },

    #[error("{node_type:?} does not declare attribute {name:?}")]
    UnknownAttr { node_type: NodeType, name: String },

    #[error("content of {node_type:?} does not match its content model")]
    InvalidContent { node_type: NodeType },

    #[error("marks are not allowed inside {node_type:?}")]
    MarksForbidden { node_type: NodeType },

    #[error("expected a document root, found {found:?}")]
    NotADocument { found: NodeType },

    #[error("empty text nodes are not allowed")]
    EmptyText,

    #[error("replace endpoints {from}..{to} do not share a workable ancestor")]
    UnsupportedRange { from: usize, to: usize },

    #[error("invalid step: {reason}")]
    InvalidStep { reason: String },
}

/// One atomic change to the editor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Step {
    /// Add a mark to every piece of inline content in `[from, to)`,
    /// splitting text nodes at the edges.
    AddMark { from: usize, to: usize, mark: Mark },
    /// Remove every mark of a type from the inline content in `[from, to)`.
    RemoveMark {
        from: usize,
        to: usize,
        mark_type: MarkType,
    },
    /// Set a single declared attribute on the element starting at `pos`.
    SetNodeAttr {
        pos: usize,
        name: String,
        value: AttrValue,
    },
    /// Change the type and attributes of the element at `pos`, keeping its
    /// content (coerced to the new type's content model).
    SetNodeMarkup {
        pos: usize,
        node_type: NodeType,
        attrs: Attrs,
    },
    /// Swap the element starting at `pos` for another node.
    ReplaceNode { pos: usize, node: Node },
    /// Replace the content of `[from, to)` with new nodes. Inline content
    /// splices into textblocks (joining across block edges); block content
    /// splices between blocks of a shared parent.
    ReplaceRange {
        from: usize,
        to: usize,
        content: Vec<Node>,
    },
    /// Replace the whole document.
    ReplaceDoc { doc: Node },
    /// Set or clear the marks applied to the next typed text.
    SetStoredMarks { marks: Option<Vec<Mark>> },
}

/// An ordered bundle of steps, applied atomically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
}

impl Transaction {
    pub fn new() -> Transaction {
        Transaction::default()
    }

    pub fn step(mut self, step: Step) -> Transaction {
        self.steps.push(step);
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Transaction {
        self.selection = Some(selection);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.selection.is_none()
    }
}

/// Applies one step to a document, producing the changed document.
/// `SetStoredMarks` is a state-level step and leaves the tree alone.
pub(crate) fn apply_step(
    schema: &Schema,
    doc: &Node,
    step: &Step,
) -> Result<Node, TransformError> {
    match step {
        Step::AddMark { from, to, mark } => {
            apply_mark(schema, doc, *from, *to, &MarkPatch::Add(mark.clone()))
        }
        Step::RemoveMark {
            from,
            to,
            mark_type,
        } => apply_mark(schema, doc, *from, *to, &MarkPatch::Remove(*mark_type)),
        Step::SetNodeAttr { pos, name, value } => {
            update_node_at(doc, *pos, &mut |node| set_attr(schema, node, name, value))
        }
        Step::SetNodeMarkup {
            pos,
            node_type,
            attrs,
        } => update_node_at(doc, *pos, &mut |node| {
            Ok(retype(schema, node, *node_type, attrs))
        }),
        Step::ReplaceNode { pos, node } => {
            update_node_at(doc, *pos, &mut |_| Ok(node.clone()))
        }
        Step::ReplaceRange { from, to, content } => {
            replace_range(schema, doc, *from, *to, content)
        }
        Step::ReplaceDoc { doc: new_doc } => {
            if new_doc.node_type() != NodeType::Doc {
                return Err(TransformError::NotADocument {
                    found: new_doc.node_type(),
                });
            }
            Ok(new_doc.clone())
        }
        Step::SetStoredMarks { .. } => Ok(doc.clone()),
    }
}

fn set_attr(
    schema: &Schema,
    node: &Node,
    name: &str,
    value: &AttrValue,
) -> Result<Node, TransformError> {
    let node_type = node.node_type();
    if !schema.declares_attr(node_type, name) {
        return Err(TransformError::UnknownAttr {
            node_type,
            name: name.to_string(),
        });
    }
    let mut updated = node.clone();
    if let Node::Element { attrs, .. } = &mut updated {
        attrs.set(name, value.clone());
    }
    Ok(updated)
}

fn retype(schema: &Schema, node: &Node, node_type: NodeType, attrs: &Attrs) -> Node {
    let content = coerce_content(schema, node_type, node.children());
    Node::Element {
        node_type,
        attrs: attrs.clone(),
        marks: node.marks().to_vec(),
        content,
    }
}

/// Makes existing children fit a new node type. Retargeting to a code block
/// collapses everything to plain text; other textblock targets keep inline
/// content as-is and leave the rest to validation.
fn coerce_content(schema: &Schema, target: NodeType, children: &[Node]) -> Vec<Node> {
    if target == NodeType::CodeBlock {
        let text: String = children.iter().map(Node::text_content).collect();
        if text.is_empty() {
            return Vec::new();
        }
        return vec![Node::text(text)];
    }
    if !schema.allows_marks(target) {
        return children
            .iter()
            .cloned()
            .map(|mut c| {
                c.set_marks(Vec::new());
                c
            })
            .collect();
    }
    children.to_vec()
}

/// Finds the element starting at `pos` and replaces it with `f`'s result.
fn update_node_at(
    doc: &Node,
    pos: usize,
    f: &mut dyn FnMut(&Node) -> Result<Node, TransformError>,
) -> Result<Node, TransformError> {
    fn rebuild(
        children: &[Node],
        base: usize,
        pos: usize,
        f: &mut dyn FnMut(&Node) -> Result<Node, TransformError>,
    ) -> Result<Option<Vec<Node>>, TransformError> {
        let mut out = Vec::with_capacity(children.len());
        let mut found = false;
        let mut offset = base;
        for child in children {
            let size = child.node_size();
            if !found && offset == pos && child.is_element() {
                out.push(f(child)?);
                found = true;
            } else if !found
                && offset < pos
                && pos < offset + size
                && child.is_element()
                && !child.node_type().is_leaf()
            {
                match rebuild(child.children(), offset + 1, pos, f)? {
                    Some(new_children) => {
                        let mut updated = child.clone();
                        if let Node::Element { content, .. } = &mut updated {
                            *content = new_children;
                        }
                        out.push(updated);
                        found = true;
                    }
                    None => out.push(child.clone()),
                }
            } else {
                out.push(child.clone());
            }
            offset += size;
        }
        Ok(if found { Some(out) } else { None })
    }

    match rebuild(doc.children(), 0, pos, f)? {
        Some(children) => Ok(with_content(doc, children)),
        None => Err(TransformError::NoNodeAt { pos }),
    }
}

fn with_content(node: &Node, children: Vec<Node>) -> Node {
    let mut updated = node.clone();
    if let Node::Element { content, .. } = &mut updated {
        *content = children;
    }
    updated
}

enum MarkPatch {
    Add(Mark),
    Remove(MarkType),
}

impl MarkPatch {
    fn apply(&self, marks: &[Mark]) -> Vec<Mark> {
        match self {
            MarkPatch::Add(m) => mark::add_to_set(m.clone(), marks),
            MarkPatch::Remove(t) => mark::remove_from_set(*t, marks),
        }
    }
}

fn apply_mark(
    schema: &Schema,
    doc: &Node,
    from: usize,
    to: usize,
    patch: &MarkPatch,
) -> Result<Node, TransformError> {
    let size = doc.content_size();
    if from > to || to > size {
        return Err(TransformError::OutOfBounds {
            pos: to.max(from),
            size,
        });
    }
    let children = mark_children(schema, doc.children(), 0, from, to, patch, true);
    Ok(with_content(doc, children))
}

fn mark_children(
    schema: &Schema,
    children: &[Node],
    base: usize,
    from: usize,
    to: usize,
    patch: &MarkPatch,
    parent_allows: bool,
) -> Vec<Node> {
    let mut out = Vec::with_capacity(children.len());
    let mut pos = base;
    for child in children {
        let size = child.node_size();
        let overlaps = pos < to && pos + size > from;
        if !overlaps {
            out.push(child.clone());
            pos += size;
            continue;
        }
        match child {
            Node::Text { text, marks } if parent_allows => {
                let start = from.saturating_sub(pos).min(size);
                let end = to.saturating_sub(pos).min(size);
                let chars: Vec<char> = text.chars().collect();
                let segments = [
                    (0, start, false),
                    (start, end, true),
                    (end, size, false),
                ];
                for (seg_start, seg_end, patched) in segments {
                    if seg_start >= seg_end {
                        continue;
                    }
                    let piece: String = chars[seg_start..seg_end].iter().collect();
                    let seg_marks = if patched {
                        patch.apply(marks)
                    } else {
                        marks.clone()
                    };
                    out.push(Node::Text {
                        text: piece,
                        marks: seg_marks,
                    });
                }
            }
            Node::Text { .. } => out.push(child.clone()),
            Node::Element { node_type, .. } => {
                let mut updated = child.clone();
                let covered = pos >= from && pos + size <= to;
                if node_type.is_inline() && parent_allows && covered {
                    let patched = patch.apply(updated.marks());
                    updated.set_marks(patched);
                }
                if !node_type.is_leaf() {
                    let child_allows = schema.allows_marks(*node_type);
                    let new_children = mark_children(
                        schema,
                        child.children(),
                        pos + 1,
                        from,
                        to,
                        patch,
                        child_allows,
                    );
                    updated = with_content(&updated, new_children);
                }
                out.push(updated);
            }
        }
        pos += size;
    }
    merge_adjacent_text(out)
}

/// True for nodes whose direct content is inline.
fn has_inline_content(node_type: NodeType) -> bool {
    node_type.is_textblock() || node_type == NodeType::Button
}

/// Splits an inline child list at a content offset, cutting through text.
fn split_inline(children: &[Node], offset: usize) -> (Vec<Node>, Vec<Node>) {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut pos = 0usize;
    for child in children {
        let size = child.node_size();
        if pos + size <= offset {
            before.push(child.clone());
        } else if pos >= offset {
            after.push(child.clone());
        } else if let Node::Text { text, marks } = child {
            let cut = offset - pos;
            let pre: String = text.chars().take(cut).collect();
            let post: String = text.chars().skip(cut).collect();
            if !pre.is_empty() {
                before.push(Node::Text {
                    text: pre,
                    marks: marks.clone(),
                });
            }
            if !post.is_empty() {
                after.push(Node::Text {
                    text: post,
                    marks: marks.clone(),
                });
            }
        } else {
            // elements have no interior positions below their content
            before.push(child.clone());
        }
        pos += size;
    }
    (before, after)
}

fn replace_range(
    schema: &Schema,
    doc: &Node,
    from: usize,
    to: usize,
    content: &[Node],
) -> Result<Node, TransformError> {
    let size = doc.content_size();
    if from > to || to > size {
        return Err(TransformError::OutOfBounds {
            pos: to.max(from),
            size,
        });
    }
    let r_from = ResolvedPos::resolve(doc, from)
        .ok_or(TransformError::OutOfBounds { pos: from, size })?;
    let r_to =
        ResolvedPos::resolve(doc, to).ok_or(TransformError::OutOfBounds { pos: to, size })?;

    let all_inline = content.iter().all(|n| n.node_type().is_inline());
    let all_block = content.iter().all(|n| n.node_type().is_block());
    let inline_context = has_inline_content(r_from.parent().node_type())
        && has_inline_content(r_to.parent().node_type());

    if inline_context && (content.is_empty() || all_inline) {
        return splice_inline_range(schema, doc, &r_from, &r_to, content);
    }
    if all_block && !has_inline_content(r_from.parent().node_type()) {
        return splice_block_range(schema, doc, &r_from, &r_to, content);
    }
    Err(TransformError::InvalidStep {
        reason: format!(
            "cannot place {} content at {}..{}",
            if all_inline { "inline" } else { "mixed" },
            from,
            to
        ),
    })
}

/// Inline splice. Within one textblock this cuts text at both edges and
/// drops the new content in between. Across textblocks it joins the two
/// blocks when they share a parent and a type, otherwise it trims each and
/// removes any fully covered siblings between them.
fn splice_inline_range(
    schema: &Schema,
    doc: &Node,
    r_from: &ResolvedPos,
    r_to: &ResolvedPos,
    content: &[Node],
) -> Result<Node, TransformError> {
    let unsupported = || TransformError::UnsupportedRange {
        from: r_from.pos(),
        to: r_to.pos(),
    };

    if std::ptr::eq(r_from.parent(), r_to.parent()) {
        let parent = r_from.parent();
        let (before, _) = split_inline(parent.children(), r_from.parent_offset());
        let (_, after) = split_inline(parent.children(), r_to.parent_offset());
        let mut children = before;
        children.extend(content.iter().cloned());
        children.extend(after);
        let new_parent = with_content(parent, merge_adjacent_text(children));
        let parent_pos = r_from.before(r_from.depth()).ok_or_else(unsupported)?;
        return update_node_at(doc, parent_pos, &mut |_| Ok(new_parent.clone()));
    }

    let shared = r_from.shared_depth(r_to);
    if r_from.depth() != shared + 1 || r_to.depth() != shared + 1 {
        return Err(unsupported());
    }
    let container = r_from.node(shared);
    let i_from = r_from.index(shared);
    let i_to = r_to.index(shared);
    let block_from = r_from.parent();
    let block_to = r_to.parent();

    let (prefix, _) = split_inline(block_from.children(), r_from.parent_offset());
    let (_, suffix) = split_inline(block_to.children(), r_to.parent_offset());

    let mut children: Vec<Node> = container.children()[..i_from].to_vec();
    if block_from.node_type() == block_to.node_type() {
        let mut inline = prefix;
        inline.extend(content.iter().cloned());
        inline.extend(suffix);
        children.push(with_content(block_from, merge_adjacent_text(inline)));
    } else {
        let mut head_inline = prefix;
        head_inline.extend(content.iter().cloned());
        children.push(with_content(block_from, merge_adjacent_text(head_inline)));
        children.push(with_content(block_to, merge_adjacent_text(suffix)));
    }
    children.extend(container.children()[i_to + 1..].iter().cloned());

    replace_container(schema, doc, r_from, shared, children)
}

/// Block splice: both endpoints must be child boundaries of the same
/// block-level parent.
fn splice_block_range(
    schema: &Schema,
    doc: &Node,
    r_from: &ResolvedPos,
    r_to: &ResolvedPos,
    content: &[Node],
) -> Result<Node, TransformError> {
    let unsupported = || TransformError::UnsupportedRange {
        from: r_from.pos(),
        to: r_to.pos(),
    };
    if !std::ptr::eq(r_from.parent(), r_to.parent())
        || r_from.depth() != r_to.depth()
        || !at_child_boundary(r_from)
        || !at_child_boundary(r_to)
    {
        return Err(unsupported());
    }
    let depth = r_from.depth();
    let container = r_from.parent();
    let i_from = r_from.index(depth);
    let i_to = r_to.index(depth);

    let mut children: Vec<Node> = container.children()[..i_from].to_vec();
    children.extend(content.iter().cloned());
    children.extend(container.children()[i_to..].iter().cloned());
    if children.is_empty() && !schema.content(container.node_type()).admits_empty() {
        children.push(Node::element(NodeType::Paragraph));
    }
    replace_container(schema, doc, r_from, depth, children)
}

fn at_child_boundary(r: &ResolvedPos) -> bool {
    let children = r.parent().children();
    let index = r.index(r.depth());
    let offset: usize = children[..index].iter().map(Node::node_size).sum();
    offset == r.parent_offset()
}

fn replace_container(
    _schema: &Schema,
    doc: &Node,
    r: &ResolvedPos,
    depth: usize,
    children: Vec<Node>,
) -> Result<Node, TransformError> {
    let container = r.node(depth);
    let new_container = with_content(container, children);
    match r.before(depth) {
        Some(pos) => update_node_at(doc, pos, &mut |_| Ok(new_container.clone())),
        None => Ok(new_container),
    }
}
