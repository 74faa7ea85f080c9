//! Document tree nodes.
//!
//! A document is a [`Node::Element`] of type [`NodeType::Doc`] whose
//! descendants are further elements and [`Node::Text`] leaves. Sizes follow
//! the flattened token model: a text node is as big as its character count,
//! a leaf element (image, line break, rule) occupies one token, and any
//! other element occupies its content plus one opening and one closing
//! token.

use serde::{Deserialize, Serialize};

use crate::attrs::{AttrValue, Attrs};
use crate::mark::Mark;

/// Every node kind the document schema knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Doc,
    Paragraph,
    Heading,
    Div,
    Header,
    Nav,
    Footer,
    Article,
    Blockquote,
    CodeBlock,
    BulletList,
    OrderedList,
    CheckList,
    ListItem,
    Table,
    TableRow,
    TableCell,
    TableHeader,
    Button,
    Image,
    HardBreak,
    HorizontalRule,
    Text,
}

/// Node categories referenced by content expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Group {
    Block,
    Inline,
}

impl NodeType {
    /// The group this node type participates in, if any. Structural types
    /// (rows, cells, list items) belong to no group and are only valid where
    /// a content expression names them directly.
    pub fn group(self) -> Option<Group> {
        match self {
            NodeType::Paragraph
            | NodeType::Heading
            | NodeType::Div
            | NodeType::Header
            | NodeType::Nav
            | NodeType::Footer
            | NodeType::Article
            | NodeType::Blockquote
            | NodeType::CodeBlock
            | NodeType::BulletList
            | NodeType::OrderedList
            | NodeType::CheckList
            | NodeType::Table
            | NodeType::HorizontalRule => Some(Group::Block),
            NodeType::Text | NodeType::Button | NodeType::Image | NodeType::HardBreak => {
                Some(Group::Inline)
            }
            NodeType::Doc
            | NodeType::ListItem
            | NodeType::TableRow
            | NodeType::TableCell
            | NodeType::TableHeader => None,
        }
    }

    pub fn is_block(self) -> bool {
        matches!(self.group(), Some(Group::Block))
    }

    pub fn is_inline(self) -> bool {
        matches!(self.group(), Some(Group::Inline))
    }

    /// Leaf elements occupy a single position and never hold content.
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            NodeType::Image | NodeType::HardBreak | NodeType::HorizontalRule
        )
    }

    /// Textblocks are the blocks whose content is inline; cursors live in
    /// them.
    pub fn is_textblock(self) -> bool {
        matches!(
            self,
            NodeType::Paragraph | NodeType::Heading | NodeType::CodeBlock
        )
    }
}

/// A piece of the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Element {
        node_type: NodeType,
        #[serde(default, skip_serializing_if = "Attrs::is_empty")]
        attrs: Attrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<Mark>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<Mark>,
    },
}

impl Node {
    pub fn element(node_type: NodeType) -> Node {
        Node::Element {
            node_type,
            attrs: Attrs::new(),
            marks: Vec::new(),
            content: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Node {
        Node::Text {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Node {
        if let Node::Element { attrs, .. } = &mut self {
            attrs.set(name, value);
        }
        self
    }

    pub fn with_mark(mut self, mark: Mark) -> Node {
        match &mut self {
            Node::Element { marks, .. } | Node::Text { marks, .. } => {
                *marks = crate::mark::add_to_set(mark, marks);
            }
        }
        self
    }

    pub fn with_child(mut self, child: Node) -> Node {
        if let Node::Element { content, .. } = &mut self {
            content.push(child);
        }
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Node {
        if let Node::Element { content, .. } = &mut self {
            content.extend(children);
        }
        self
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Element { node_type, .. } => *node_type,
            Node::Text { .. } => NodeType::Text,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text { .. })
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element { .. })
    }

    pub fn marks(&self) -> &[Mark] {
        match self {
            Node::Element { marks, .. } | Node::Text { marks, .. } => marks,
        }
    }

    pub fn set_marks(&mut self, new_marks: Vec<Mark>) {
        match self {
            Node::Element { marks, .. } | Node::Text { marks, .. } => *marks = new_marks,
        }
    }

    pub fn attrs(&self) -> Option<&Attrs> {
        match self {
            Node::Element { attrs, .. } => Some(attrs),
            Node::Text { .. } => None,
        }
    }

    pub fn text_str(&self) -> Option<&str> {
        match self {
            Node::Text { text, .. } => Some(text),
            Node::Element { .. } => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element { content, .. } => content,
            Node::Text { .. } => &[],
        }
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children().get(index)
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    /// Size of this node in position tokens.
    pub fn node_size(&self) -> usize {
        match self {
            Node::Text { text, .. } => text.chars().count(),
            Node::Element { node_type, .. } if node_type.is_leaf() => 1,
            Node::Element { .. } => self.content_size() + 2,
        }
    }

    /// Combined size of the children, which is also the number of positions
    /// inside this node.
    pub fn content_size(&self) -> usize {
        self.children().iter().map(Node::node_size).sum()
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text { text, .. } => text.clone(),
            Node::Element { content, .. } => {
                content.iter().map(Node::text_content).collect::<String>()
            }
        }
    }

    /// Calls `f` for every descendant whose span intersects `[from, to)`,
    /// passing the position just before the node. Returning `false` from `f`
    /// skips the node's children. Positions are relative to this node's
    /// content, so calling this on the document uses document positions.
    pub fn nodes_between<'a, F>(&'a self, from: usize, to: usize, f: &mut F)
    where
        F: FnMut(&'a Node, usize) -> bool,
    {
        fn walk<'a, F>(children: &'a [Node], base: usize, from: usize, to: usize, f: &mut F)
        where
            F: FnMut(&'a Node, usize) -> bool,
        {
            let mut pos = base;
            for child in children {
                let size = child.node_size();
                if pos < to && pos + size > from {
                    let descend = f(child, pos);
                    if descend && child.is_element() && !child.node_type().is_leaf() {
                        walk(child.children(), pos + 1, from, to, f);
                    }
                }
                pos += size;
            }
        }
        walk(self.children(), 0, from, to, f);
    }

    /// The descendant that starts exactly at `pos`, if any.
    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        let mut found = None;
        self.nodes_between(pos, pos + 1, &mut |node, node_pos| {
            if found.is_none() && node_pos == pos {
                found = Some(node);
                false
            } else {
                found.is_none()
            }
        });
        found
    }
}

/// Merges adjacent text children that carry identical mark sets. Mark edits
/// split text nodes freely; normalizing afterwards keeps trees canonical so
/// structural equality means visual equality.
pub fn merge_adjacent_text(children: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(children.len());
    for child in children {
        match (out.last_mut(), &child) {
            (
                Some(Node::Text {
                    text: prev,
                    marks: prev_marks,
                }),
                Node::Text { text, marks },
            ) if prev_marks == marks => {
                prev.push_str(text);
            }
            _ => out.push(child),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> Node {
        // <p>ab</p><p><img>cd</p>
        Node::element(NodeType::Doc)
            .with_child(Node::element(NodeType::Paragraph).with_child(Node::text("ab")))
            .with_child(
                Node::element(NodeType::Paragraph)
                    .with_child(Node::element(NodeType::Image).with_attr("src", "x.png"))
                    .with_child(Node::text("cd")),
            )
    }

    #[test]
    fn sizes_follow_token_model() {
        let doc = sample_doc();
        // p(ab) = 2 + 2, p(img cd) = 2 + 1 + 2
        assert_eq!(doc.content_size(), 4 + 5);
        assert_eq!(doc.node_size(), 11);
        assert_eq!(Node::element(NodeType::Image).node_size(), 1);
        assert_eq!(Node::element(NodeType::Paragraph).node_size(), 2);
    }

    #[test]
    fn nodes_between_visits_intersecting_nodes() {
        let doc = sample_doc();
        let mut seen = Vec::new();
        doc.nodes_between(1, 7, &mut |node, pos| {
            seen.push((node.node_type(), pos));
            true
        });
        // first paragraph at 0, its text at 1, second paragraph at 4, image at 5,
        // text "cd" at 6
        assert_eq!(
            seen,
            vec![
                (NodeType::Paragraph, 0),
                (NodeType::Text, 1),
                (NodeType::Paragraph, 4),
                (NodeType::Image, 5),
                (NodeType::Text, 6),
            ]
        );
    }

    #[test]
    fn nodes_between_skips_children_on_false() {
        let doc = sample_doc();
        let mut seen = Vec::new();
        doc.nodes_between(0, doc.content_size(), &mut |node, _| {
            seen.push(node.node_type());
            node.node_type() != NodeType::Paragraph
        });
        assert_eq!(seen, vec![NodeType::Paragraph, NodeType::Paragraph]);
    }

    #[test]
    fn node_at_finds_starts_only() {
        let doc = sample_doc();
        assert_eq!(doc.node_at(0).map(Node::node_type), Some(NodeType::Paragraph));
        assert_eq!(doc.node_at(5).map(Node::node_type), Some(NodeType::Image));
        assert_eq!(doc.node_at(6).map(Node::node_type), Some(NodeType::Text));
        // 2 is inside the first text node, nothing starts there
        assert!(doc.node_at(2).is_none());
    }

    #[test]
    fn merge_compacts_equal_mark_runs() {
        let merged = merge_adjacent_text(vec![
            Node::text("a").with_mark(Mark::Strong),
            Node::text("b").with_mark(Mark::Strong),
            Node::text("c"),
        ]);
        assert_eq!(
            merged,
            vec![Node::text("ab").with_mark(Mark::Strong), Node::text("c")]
        );
    }

    #[test]
    fn text_sizes_count_chars_not_bytes() {
        let t = Node::text("héllo");
        assert_eq!(t.node_size(), 5);
    }
}
