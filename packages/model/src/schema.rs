//! The document schema: which children each node admits, which attributes
//! it declares, and whether its content may carry marks.
//!
//! There is a single schema for the editor. It is expressed as data
//! (content expressions and default tables) so validation and attribute
//! reads are total functions: asking for a declared attribute that was
//! never set yields its default, and malformed trees are reported, never
//! panicked on.

use crate::attrs::AttrValue;
use crate::mark::MarkType;
use crate::node::{Group, Node, NodeType};
use crate::transform::TransformError;

/// How often a content item may repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    One,
    ZeroOrMore,
    OneOrMore,
}

/// What a single content item accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentMatch {
    Kind(NodeType),
    Group(Group),
    OneOf(Vec<NodeType>),
}

impl ContentMatch {
    pub fn admits(&self, node_type: NodeType) -> bool {
        match self {
            ContentMatch::Kind(t) => *t == node_type,
            ContentMatch::Group(g) => node_type.group() == Some(*g),
            ContentMatch::OneOf(set) => set.contains(&node_type),
        }
    }
}

/// A node's content model: an ordered sequence of repeated matchers.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentExpr {
    Empty,
    Sequence(Vec<(ContentMatch, Repeat)>),
}

impl ContentExpr {
    fn one(matcher: ContentMatch, repeat: Repeat) -> ContentExpr {
        ContentExpr::Sequence(vec![(matcher, repeat)])
    }

    /// Greedy left-to-right match of `children` against the expression.
    /// Greediness is safe for this schema: no expression puts two matchers
    /// in a row where the first could steal the second's only candidate.
    pub fn matches(&self, children: &[Node]) -> bool {
        match self {
            ContentExpr::Empty => children.is_empty(),
            ContentExpr::Sequence(items) => {
                let mut i = 0;
                for (matcher, repeat) in items {
                    match repeat {
                        Repeat::One => {
                            if i < children.len() && matcher.admits(children[i].node_type()) {
                                i += 1;
                            } else {
                                return false;
                            }
                        }
                        Repeat::OneOrMore => {
                            if i >= children.len() || !matcher.admits(children[i].node_type()) {
                                return false;
                            }
                            while i < children.len() && matcher.admits(children[i].node_type()) {
                                i += 1;
                            }
                        }
                        Repeat::ZeroOrMore => {
                            while i < children.len() && matcher.admits(children[i].node_type()) {
                                i += 1;
                            }
                        }
                    }
                }
                i == children.len()
            }
        }
    }

    /// Whether this expression can be satisfied by an empty child list.
    pub fn admits_empty(&self) -> bool {
        self.matches(&[])
    }
}

/// The full description of one node type.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub content: ContentExpr,
    pub defaults: Vec<(&'static str, AttrValue)>,
    pub allow_marks: bool,
}

/// The editor's document schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Schema;

impl Schema {
    pub fn new() -> Schema {
        Schema
    }

    pub fn spec(&self, node_type: NodeType) -> NodeSpec {
        NodeSpec {
            content: self.content(node_type),
            defaults: self.attr_defaults(node_type),
            allow_marks: self.allows_marks(node_type),
        }
    }

    pub fn content(&self, node_type: NodeType) -> ContentExpr {
        use ContentMatch::{Group as G, Kind, OneOf};
        use NodeType::*;
        match node_type {
            Doc => ContentExpr::one(G(Group::Block), Repeat::OneOrMore),
            Paragraph | Heading | Button => ContentExpr::one(G(Group::Inline), Repeat::ZeroOrMore),
            CodeBlock => ContentExpr::one(Kind(Text), Repeat::ZeroOrMore),
            Div | Header | Nav | Footer | Article | Blockquote | TableCell | TableHeader => {
                ContentExpr::one(G(Group::Block), Repeat::OneOrMore)
            }
            BulletList | OrderedList | CheckList => {
                ContentExpr::one(Kind(ListItem), Repeat::OneOrMore)
            }
            ListItem => ContentExpr::Sequence(vec![
                (Kind(Paragraph), Repeat::One),
                (G(Group::Block), Repeat::ZeroOrMore),
            ]),
            Table => ContentExpr::one(Kind(TableRow), Repeat::OneOrMore),
            TableRow => ContentExpr::one(OneOf(vec![TableCell, TableHeader]), Repeat::OneOrMore),
            Image | HardBreak | HorizontalRule | Text => ContentExpr::Empty,
        }
    }

    /// Declared attributes with their defaults. An attribute absent from a
    /// node's map reads as the default listed here.
    pub fn attr_defaults(&self, node_type: NodeType) -> Vec<(&'static str, AttrValue)> {
        use NodeType::*;
        match node_type {
            Paragraph => vec![("textAlign", AttrValue::str(""))],
            Heading => vec![
                ("level", AttrValue::Int(1)),
                ("textAlign", AttrValue::str("")),
            ],
            Div | Header | Nav | Footer | Article => vec![
                ("style", AttrValue::str("")),
                ("class", AttrValue::str("")),
                ("textAlign", AttrValue::str("")),
            ],
            OrderedList => vec![("order", AttrValue::Int(1))],
            TableCell | TableHeader => vec![
                ("colspan", AttrValue::Int(1)),
                ("rowspan", AttrValue::Int(1)),
                ("background", AttrValue::str("")),
            ],
            Button => vec![
                ("style", AttrValue::str("")),
                ("class", AttrValue::str("")),
                ("onclick", AttrValue::str("")),
            ],
            Image => vec![
                ("src", AttrValue::str("")),
                ("alt", AttrValue::str("")),
                ("title", AttrValue::str("")),
                ("width", AttrValue::Int(0)),
                ("style", AttrValue::str("")),
            ],
            _ => Vec::new(),
        }
    }

    pub fn attr_default(&self, node_type: NodeType, name: &str) -> Option<AttrValue> {
        self.attr_defaults(node_type)
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// Total attribute read: the node's own value, or the declared default.
    /// `None` means the attribute is not declared for this node type.
    pub fn attr(&self, node: &Node, name: &str) -> Option<AttrValue> {
        if let Some(value) = node.attrs().and_then(|a| a.get(name)) {
            return Some(value.clone());
        }
        self.attr_default(node.node_type(), name)
    }

    pub fn attr_str(&self, node: &Node, name: &str) -> Option<String> {
        self.attr(node, name)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn attr_int(&self, node: &Node, name: &str) -> Option<i64> {
        self.attr(node, name).and_then(|v| v.as_int())
    }

    /// Whether the given node type declares the attribute at all.
    pub fn declares_attr(&self, node_type: NodeType, name: &str) -> bool {
        self.attr_default(node_type, name).is_some()
    }

    /// Code blocks hold plain text only; everything else with inline
    /// content accepts marks.
    pub fn allows_marks(&self, node_type: NodeType) -> bool {
        node_type != NodeType::CodeBlock
    }

    pub fn mark_inclusive(&self, mark_type: MarkType) -> bool {
        mark_type.inclusive()
    }

    /// Paragraphs and headings advertise themselves as color-inheritance
    /// targets in serialized markup, pairing with the scoped-CSS companion
    /// rules.
    pub fn color_inherit_marker(&self, node_type: NodeType) -> bool {
        matches!(node_type, NodeType::Paragraph | NodeType::Heading)
    }

    /// Validates an entire document tree: the root must be a `Doc`, every
    /// element's children must match its content expression, attributes
    /// must be declared, text must be non-empty, and mark-free zones must
    /// be mark-free.
    pub fn check(&self, doc: &Node) -> Result<(), TransformError> {
        if doc.node_type() != NodeType::Doc {
            return Err(TransformError::NotADocument {
                found: doc.node_type(),
            });
        }
        self.check_node(doc)
    }

    fn check_node(&self, node: &Node) -> Result<(), TransformError> {
        match node {
            Node::Text { text, .. } => {
                if text.is_empty() {
                    return Err(TransformError::EmptyText);
                }
                Ok(())
            }
            Node::Element {
                node_type,
                attrs,
                content,
                ..
            } => {
                for (name, _) in attrs.iter() {
                    if !self.declares_attr(*node_type, name) {
                        return Err(TransformError::UnknownAttr {
                            node_type: *node_type,
                            name: name.to_string(),
                        });
                    }
                }
                if !self.content(*node_type).matches(content) {
                    return Err(TransformError::InvalidContent {
                        node_type: *node_type,
                    });
                }
                if !self.allows_marks(*node_type)
                    && content.iter().any(|c| !c.marks().is_empty())
                {
                    return Err(TransformError::MarksForbidden {
                        node_type: *node_type,
                    });
                }
                for child in content {
                    self.check_node(child)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mark::Mark;

    #[test]
    fn doc_requires_at_least_one_block() {
        let schema = Schema::new();
        let empty = Node::element(NodeType::Doc);
        assert!(matches!(
            schema.check(&empty),
            Err(TransformError::InvalidContent { .. })
        ));
        let ok = Node::element(NodeType::Doc).with_child(Node::element(NodeType::Paragraph));
        assert!(schema.check(&ok).is_ok());
    }

    #[test]
    fn list_item_leads_with_paragraph() {
        let schema = Schema::new();
        let expr = schema.content(NodeType::ListItem);
        let p = Node::element(NodeType::Paragraph);
        let quote = Node::element(NodeType::Blockquote).with_child(p.clone());
        assert!(expr.matches(&[p.clone()]));
        assert!(expr.matches(&[p.clone(), quote.clone()]));
        assert!(!expr.matches(&[quote]));
        assert!(!expr.matches(&[]));
    }

    #[test]
    fn rows_mix_cells_and_headers() {
        let schema = Schema::new();
        let expr = schema.content(NodeType::TableRow);
        let p = Node::element(NodeType::Paragraph);
        let cell = Node::element(NodeType::TableCell).with_child(p.clone());
        let header = Node::element(NodeType::TableHeader).with_child(p);
        assert!(expr.matches(&[header.clone(), cell.clone()]));
        assert!(!expr.matches(&[cell, Node::element(NodeType::Paragraph)]));
    }

    #[test]
    fn attr_reads_fall_back_to_defaults() {
        let schema = Schema::new();
        let heading = Node::element(NodeType::Heading);
        assert_eq!(schema.attr_int(&heading, "level"), Some(1));
        let heading = heading.with_attr("level", 3i64);
        assert_eq!(schema.attr_int(&heading, "level"), Some(3));
        assert_eq!(schema.attr(&heading, "bogus"), None);
    }

    #[test]
    fn code_blocks_reject_marked_text() {
        let schema = Schema::new();
        let doc = Node::element(NodeType::Doc).with_child(
            Node::element(NodeType::CodeBlock)
                .with_child(Node::text("let x = 1;").with_mark(Mark::Strong)),
        );
        assert!(matches!(
            schema.check(&doc),
            Err(TransformError::MarksForbidden { .. })
        ));
    }

    #[test]
    fn undeclared_attrs_are_rejected() {
        let schema = Schema::new();
        let doc = Node::element(NodeType::Doc)
            .with_child(Node::element(NodeType::Paragraph).with_attr("onload", "x()"));
        assert!(matches!(
            schema.check(&doc),
            Err(TransformError::UnknownAttr { .. })
        ));
    }
}
