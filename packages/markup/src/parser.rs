//! Tolerant HTML-fragment parsing.
//!
//! The parser is a total function: any input produces a schema-valid
//! document. It works as a stack machine over the token stream:
//!
//! ```text
//! tokens ──▶ open/close/text events ──▶ frame stack ──▶ fixups ──▶ Doc node
//! ```
//!
//! Recovery rules, in the order they matter:
//! - unknown tags are dropped but their children are parsed in place
//! - formatting tags (`b`, `i`, `u`, `a`, `span`) become mark frames; text
//!   collects every mark active above it
//! - block tags opening inside a textblock close it first, as do repeated
//!   `li` / `td` / `tr` without explicit closes
//! - when an element closes, its children are coerced to its content
//!   model: stray inline content in block containers is wrapped in
//!   paragraphs, list items get their leading paragraph, empty required
//!   content gets an empty paragraph, and code blocks flatten to plain text
//! - elements that cannot be repaired (tables with no rows) are dropped

use tracing::{debug, instrument};

use vellum_model::node::merge_adjacent_text;
use vellum_model::{mark, Attrs, Mark, Node, NodeType};

use crate::css::split_declarations;
use crate::tokenizer::{self, decode_entities, parse_close_tag, parse_open_tag, RawTag, Token};

/// Parses an HTML fragment into a document node. Never fails; the worst
/// input yields a document with one empty paragraph.
#[instrument(skip(html), fields(bytes = html.len()))]
pub fn parse_document(html: &str) -> Node {
    let tokens = tokenizer::tokenize(html);
    let mut parser = Parser::new();
    for (token, _) in &tokens {
        parser.push_token(token);
    }
    parser.finish()
}

struct Frame {
    tag: String,
    kind: FrameKind,
}

enum FrameKind {
    Element {
        node_type: NodeType,
        attrs: Attrs,
        children: Vec<Node>,
    },
    Marks {
        count: usize,
    },
    Transparent,
}

struct Parser {
    stack: Vec<Frame>,
    marks: Vec<Mark>,
    dropped: usize,
}

impl Parser {
    fn new() -> Parser {
        Parser {
            stack: vec![Frame {
                tag: String::new(),
                kind: FrameKind::Element {
                    node_type: NodeType::Doc,
                    attrs: Attrs::new(),
                    children: Vec::new(),
                },
            }],
            marks: Vec::new(),
            dropped: 0,
        }
    }

    fn push_token(&mut self, token: &Token) {
        match token {
            Token::OpenTag(slice) => {
                let raw = parse_open_tag(slice);
                self.open_tag(&raw);
            }
            Token::CloseTag(slice) => self.close_tag(&parse_close_tag(slice)),
            Token::Text(slice) => self.push_text(slice),
            Token::Comment | Token::Doctype => {}
        }
    }

    /// The innermost element frame; the root guarantees one exists.
    fn top_element_type(&self) -> NodeType {
        self.stack
            .iter()
            .rev()
            .find_map(|f| match &f.kind {
                FrameKind::Element { node_type, .. } => Some(*node_type),
                _ => None,
            })
            .unwrap_or(NodeType::Doc)
    }

    fn append(&mut self, node: Node) {
        for frame in self.stack.iter_mut().rev() {
            if let FrameKind::Element { children, .. } = &mut frame.kind {
                children.push(node);
                return;
            }
        }
    }

    fn active_marks(&self) -> Vec<Mark> {
        self.marks
            .iter()
            .fold(Vec::new(), |set, m| mark::add_to_set(m.clone(), &set))
    }

    fn push_text(&mut self, raw: &str) {
        let text = decode_entities(raw);
        if text.is_empty() {
            return;
        }
        let context = self.top_element_type();
        if !has_inline_content(context) && text.trim().is_empty() {
            return;
        }
        let marks = self.active_marks();
        self.append(Node::Text { text, marks });
    }

    fn open_tag(&mut self, raw: &RawTag) {
        match raw.name.as_str() {
            "p" => self.open_element(raw, NodeType::Paragraph, aligned_attrs(raw)),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level: i64 = raw.name[1..].parse().unwrap_or(1);
                let mut attrs = aligned_attrs(raw);
                if level != 1 {
                    attrs.set("level", level);
                }
                self.open_element(raw, NodeType::Heading, attrs);
            }
            "div" => self.open_element(raw, NodeType::Div, styled_block_attrs(raw)),
            "header" => self.open_element(raw, NodeType::Header, styled_block_attrs(raw)),
            "nav" => self.open_element(raw, NodeType::Nav, styled_block_attrs(raw)),
            "footer" => self.open_element(raw, NodeType::Footer, styled_block_attrs(raw)),
            "article" => self.open_element(raw, NodeType::Article, styled_block_attrs(raw)),
            "blockquote" => self.open_element(raw, NodeType::Blockquote, Attrs::new()),
            "pre" => self.open_element(raw, NodeType::CodeBlock, Attrs::new()),
            "ul" => {
                let checked = raw
                    .attr("class")
                    .is_some_and(|c| c.split_whitespace().any(|t| t == "check-list"));
                let node_type = if checked {
                    NodeType::CheckList
                } else {
                    NodeType::BulletList
                };
                self.open_element(raw, node_type, Attrs::new());
            }
            "ol" => {
                let mut attrs = Attrs::new();
                if let Some(start) = raw.attr("start").and_then(|s| s.trim().parse::<i64>().ok())
                {
                    if start != 1 {
                        attrs.set("order", start);
                    }
                }
                self.open_element(raw, NodeType::OrderedList, attrs);
            }
            "li" => self.open_element(raw, NodeType::ListItem, Attrs::new()),
            "table" => self.open_element(raw, NodeType::Table, Attrs::new()),
            "thead" | "tbody" | "tfoot" | "code" => self.push_transparent(raw),
            "tr" => self.open_element(raw, NodeType::TableRow, Attrs::new()),
            "td" => self.open_element(raw, NodeType::TableCell, cell_attrs(raw)),
            "th" => self.open_element(raw, NodeType::TableHeader, cell_attrs(raw)),
            "button" => self.open_element(raw, NodeType::Button, button_attrs(raw)),
            "img" => {
                let node = Node::Element {
                    node_type: NodeType::Image,
                    attrs: image_attrs(raw),
                    marks: self.active_marks(),
                    content: Vec::new(),
                };
                self.append_leaf(node);
            }
            "br" => {
                let node = Node::Element {
                    node_type: NodeType::HardBreak,
                    attrs: Attrs::new(),
                    marks: self.active_marks(),
                    content: Vec::new(),
                };
                self.append_leaf(node);
            }
            "hr" => self.append_leaf(Node::element(NodeType::HorizontalRule)),
            "b" | "strong" => self.push_marks(raw, vec![Mark::Strong]),
            "i" | "em" => self.push_marks(raw, vec![Mark::Em]),
            "u" => self.push_marks(raw, vec![Mark::Underline]),
            "a" => match link_mark(raw) {
                Some(link) => self.push_marks(raw, vec![link]),
                None => self.push_transparent(raw),
            },
            "span" => {
                let marks = span_marks(raw.attr("style").unwrap_or(""));
                if marks.is_empty() {
                    self.push_transparent(raw);
                } else {
                    self.push_marks(raw, marks);
                }
            }
            other => {
                debug!(tag = other, "dropping unsupported tag, keeping children");
                self.dropped += 1;
                self.push_transparent(raw);
            }
        }
    }

    fn open_element(&mut self, raw: &RawTag, node_type: NodeType, attrs: Attrs) {
        while should_auto_close(self.top_element_type(), node_type) {
            self.close_top_element();
        }
        if raw.self_closing {
            if let Some(node) = finalize_element(node_type, attrs, Vec::new()) {
                self.append(node);
            }
            return;
        }
        self.stack.push(Frame {
            tag: raw.name.clone(),
            kind: FrameKind::Element {
                node_type,
                attrs,
                children: Vec::new(),
            },
        });
    }

    fn append_leaf(&mut self, node: Node) {
        let is_block = node.node_type().is_block();
        if is_block {
            while should_auto_close(self.top_element_type(), node.node_type()) {
                self.close_top_element();
            }
        }
        self.append(node);
    }

    fn push_marks(&mut self, raw: &RawTag, marks: Vec<Mark>) {
        if raw.self_closing {
            return;
        }
        let count = marks.len();
        self.marks.extend(marks);
        self.stack.push(Frame {
            tag: raw.name.clone(),
            kind: FrameKind::Marks { count },
        });
    }

    fn push_transparent(&mut self, raw: &RawTag) {
        if raw.self_closing {
            return;
        }
        self.stack.push(Frame {
            tag: raw.name.clone(),
            kind: FrameKind::Transparent,
        });
    }

    fn close_tag(&mut self, name: &str) {
        let Some(index) = self
            .stack
            .iter()
            .rposition(|f| !f.tag.is_empty() && f.tag == name)
        else {
            return;
        };
        while self.stack.len() > index {
            self.pop_frame();
        }
    }

    /// Pops frames until an element frame (never the root) has been closed.
    fn close_top_element(&mut self) {
        while self.stack.len() > 1 {
            let was_element = matches!(
                self.stack.last().map(|f| &f.kind),
                Some(FrameKind::Element { .. })
            );
            self.pop_frame();
            if was_element {
                return;
            }
        }
    }

    fn pop_frame(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame.kind {
            FrameKind::Marks { count } => {
                let len = self.marks.len().saturating_sub(count);
                self.marks.truncate(len);
            }
            FrameKind::Transparent => {}
            FrameKind::Element {
                node_type,
                attrs,
                children,
            } => match finalize_element(node_type, attrs, children) {
                Some(mut node) => {
                    if node.node_type().is_inline() {
                        node.set_marks(self.active_marks());
                    }
                    self.append(node);
                }
                None => {
                    debug!(?node_type, "dropping element with unusable content");
                    self.dropped += 1;
                }
            },
        }
    }

    fn finish(mut self) -> Node {
        while self.stack.len() > 1 {
            self.pop_frame();
        }
        if self.dropped > 0 {
            debug!(count = self.dropped, "dropped tags while parsing");
        }
        let Some(root) = self.stack.pop() else {
            return empty_doc();
        };
        match root.kind {
            FrameKind::Element {
                node_type,
                attrs,
                children,
            } => finalize_element(node_type, attrs, children).unwrap_or_else(empty_doc),
            _ => empty_doc(),
        }
    }
}

fn empty_doc() -> Node {
    Node::element(NodeType::Doc).with_child(Node::element(NodeType::Paragraph))
}

fn has_inline_content(node_type: NodeType) -> bool {
    node_type.is_textblock() || node_type == NodeType::Button
}

fn should_auto_close(top: NodeType, new: NodeType) -> bool {
    use NodeType::*;
    match top {
        t if t.is_textblock() => new.is_block(),
        ListItem => new == ListItem,
        TableCell | TableHeader => matches!(new, TableCell | TableHeader | TableRow),
        TableRow => new == TableRow,
        _ => false,
    }
}

/// Coerces raw children to a node type's content model. `None` drops the
/// element entirely.
fn finalize_element(node_type: NodeType, attrs: Attrs, children: Vec<Node>) -> Option<Node> {
    use NodeType::*;
    let content = match node_type {
        CodeBlock => {
            let text: String = children.iter().map(Node::text_content).collect();
            if text.is_empty() {
                Vec::new()
            } else {
                vec![Node::text(text)]
            }
        }
        Paragraph | Heading | Button => merge_adjacent_text(
            children
                .into_iter()
                .filter(|c| c.node_type().is_inline())
                .collect(),
        ),
        Doc | Div | Header | Nav | Footer | Article | Blockquote | TableCell | TableHeader => {
            let mut blocks = coerce_blocks(group_blocks(children));
            if blocks.is_empty() {
                blocks.push(Node::element(Paragraph));
            }
            blocks
        }
        BulletList | OrderedList | CheckList => {
            let items: Vec<Node> = structural_to_table(group_blocks(children))
                .into_iter()
                .map(wrap_in_list_item)
                .collect();
            if items.is_empty() {
                return None;
            }
            items
        }
        ListItem => {
            let mut blocks = coerce_blocks(group_blocks(children));
            if !matches!(blocks.first().map(Node::node_type), Some(Paragraph)) {
                blocks.insert(0, Node::element(Paragraph));
            }
            blocks
        }
        Table => {
            let rows: Vec<Node> = children
                .into_iter()
                .filter(|c| c.node_type() == TableRow)
                .collect();
            if rows.is_empty() {
                return None;
            }
            rows
        }
        TableRow => {
            let cells: Vec<Node> = children
                .into_iter()
                .filter(|c| matches!(c.node_type(), TableCell | TableHeader))
                .collect();
            if cells.is_empty() {
                return None;
            }
            cells
        }
        Image | HardBreak | HorizontalRule | Text => Vec::new(),
    };
    Some(Node::Element {
        node_type,
        attrs,
        marks: Vec::new(),
        content,
    })
}

/// Wraps runs of loose inline content into paragraphs so the result is a
/// plain block sequence.
fn group_blocks(children: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::new();
    let mut run: Vec<Node> = Vec::new();
    for child in children {
        if child.node_type().is_inline() {
            run.push(child);
        } else {
            flush_run(&mut out, &mut run);
            out.push(child);
        }
    }
    flush_run(&mut out, &mut run);
    out
}

fn flush_run(out: &mut Vec<Node>, run: &mut Vec<Node>) {
    if run.is_empty() {
        return;
    }
    let inline = merge_adjacent_text(std::mem::take(run));
    out.push(Node::element(NodeType::Paragraph).with_children(inline));
}

/// Re-homes list items and table pieces that surfaced outside their
/// containers: runs of stray rows or cells become a table, runs of stray
/// items become a bullet list.
fn coerce_blocks(blocks: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::new();
    let mut iter = structural_to_table(blocks).into_iter().peekable();
    while let Some(block) = iter.next() {
        if block.node_type() != NodeType::ListItem {
            out.push(block);
            continue;
        }
        let mut items = vec![block];
        while iter.peek().map(Node::node_type) == Some(NodeType::ListItem) {
            items.extend(iter.next());
        }
        out.push(Node::element(NodeType::BulletList).with_children(items));
    }
    out
}

fn structural_to_table(blocks: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::new();
    let mut iter = blocks.into_iter().peekable();
    while let Some(block) = iter.next() {
        match block.node_type() {
            NodeType::TableRow => {
                let mut rows = vec![block];
                while iter.peek().map(Node::node_type) == Some(NodeType::TableRow) {
                    rows.extend(iter.next());
                }
                out.push(Node::element(NodeType::Table).with_children(rows));
            }
            NodeType::TableCell | NodeType::TableHeader => {
                let mut cells = vec![block];
                while matches!(
                    iter.peek().map(Node::node_type),
                    Some(NodeType::TableCell | NodeType::TableHeader)
                ) {
                    cells.extend(iter.next());
                }
                out.push(
                    Node::element(NodeType::Table)
                        .with_child(Node::element(NodeType::TableRow).with_children(cells)),
                );
            }
            _ => out.push(block),
        }
    }
    out
}

fn wrap_in_list_item(block: Node) -> Node {
    match block.node_type() {
        NodeType::ListItem => block,
        NodeType::Paragraph => Node::element(NodeType::ListItem).with_child(block),
        _ => Node::element(NodeType::ListItem)
            .with_child(Node::element(NodeType::Paragraph))
            .with_child(block),
    }
}

fn aligned_attrs(raw: &RawTag) -> Attrs {
    let mut attrs = Attrs::new();
    if let Some(align) = raw.attr("align").filter(|a| !a.is_empty()) {
        attrs.set("textAlign", align);
    }
    attrs
}

fn styled_block_attrs(raw: &RawTag) -> Attrs {
    let mut attrs = aligned_attrs(raw);
    if let Some(style) = raw.attr("style").filter(|s| !s.is_empty()) {
        attrs.set("style", style);
    }
    if let Some(class) = raw.attr("class").filter(|c| !c.is_empty()) {
        attrs.set("class", class);
    }
    attrs
}

fn cell_attrs(raw: &RawTag) -> Attrs {
    let mut attrs = Attrs::new();
    for name in ["colspan", "rowspan"] {
        if let Some(span) = raw
            .attr(name)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|v| *v > 1)
        {
            attrs.set(name, span);
        }
    }
    if let Some(background) = raw
        .attr("style")
        .and_then(|s| crate::css::get_declaration(s, "background-color"))
    {
        attrs.set("background", background);
    }
    attrs
}

fn button_attrs(raw: &RawTag) -> Attrs {
    let mut attrs = Attrs::new();
    for name in ["style", "class", "onclick"] {
        if let Some(value) = raw.attr(name).filter(|v| !v.is_empty()) {
            attrs.set(name, value);
        }
    }
    attrs
}

fn image_attrs(raw: &RawTag) -> Attrs {
    let mut attrs = Attrs::new();
    for name in ["src", "alt", "title", "style"] {
        if let Some(value) = raw.attr(name).filter(|v| !v.is_empty()) {
            attrs.set(name, value);
        }
    }
    if let Some(width) = raw
        .attr("width")
        .and_then(|v| v.trim().trim_end_matches("px").parse::<i64>().ok())
        .filter(|w| *w > 0)
    {
        attrs.set("width", width);
    }
    attrs
}

fn link_mark(raw: &RawTag) -> Option<Mark> {
    let href = raw.attr("href")?.to_string();
    let take = |name: &str| raw.attr(name).filter(|v| !v.is_empty()).map(str::to_string);
    Some(Mark::Link {
        href,
        title: take("title"),
        class: take("class"),
        style: take("style"),
    })
}

/// Decomposes a span's style attribute into marks: recognized declarations
/// get their dedicated mark, the rest ride along in one `Styled` mark.
fn span_marks(style: &str) -> Vec<Mark> {
    let mut marks = Vec::new();
    let mut residual: Vec<(String, String)> = Vec::new();
    for (prop, value) in split_declarations(style) {
        match prop.as_str() {
            "font-size" => marks.push(Mark::FontSize { size: value }),
            "font-family" => marks.push(Mark::FontFamily { family: value }),
            "color" => marks.push(Mark::TextColor { color: value }),
            "background-color" => marks.push(Mark::Highlight { color: value }),
            _ => residual.push((prop, value)),
        }
    }
    if !residual.is_empty() {
        marks.push(Mark::Styled {
            style: crate::css::join_declarations(&residual),
        });
    }
    marks
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_model::{MarkType, Schema};

    fn parse(html: &str) -> Node {
        let doc = parse_document(html);
        Schema::new().check(&doc).unwrap();
        doc
    }

    #[test]
    fn parses_simple_paragraphs() {
        let doc = parse("<p>hello</p><p>world</p>");
        assert_eq!(doc.child_count(), 2);
        assert_eq!(doc.child(0).unwrap().children(), &[Node::text("hello")]);
    }

    #[test]
    fn formatting_tags_become_marks() {
        let doc = parse("<p><b>a<i>b</i></b>c</p>");
        let p = doc.child(0).unwrap();
        assert_eq!(
            p.children(),
            &[
                Node::text("a").with_mark(Mark::Strong),
                Node::text("b").with_mark(Mark::Strong).with_mark(Mark::Em),
                Node::text("c"),
            ]
        );
    }

    #[test]
    fn span_styles_decompose_into_marks() {
        let doc = parse(r#"<p><span style="font-size: 18px; color: red; letter-spacing: 1px">x</span></p>"#);
        let text = &doc.child(0).unwrap().children()[0];
        let marks = text.marks();
        assert!(marks.contains(&Mark::font_size("18px")));
        assert!(marks.contains(&Mark::text_color("red")));
        assert!(marks.contains(&Mark::Styled {
            style: "letter-spacing: 1px;".to_string()
        }));
    }

    #[test]
    fn unknown_tags_keep_their_children() {
        let doc = parse("<section><p>kept</p></section>");
        assert_eq!(doc.child_count(), 1);
        assert_eq!(doc.child(0).unwrap().node_type(), NodeType::Paragraph);
        assert_eq!(doc.child(0).unwrap().text_content(), "kept");
    }

    #[test]
    fn loose_text_is_wrapped_in_a_paragraph() {
        let doc = parse("loose <b>text</b><p>block</p>");
        assert_eq!(doc.child_count(), 2);
        let first = doc.child(0).unwrap();
        assert_eq!(first.node_type(), NodeType::Paragraph);
        assert_eq!(
            first.children(),
            &[
                Node::text("loose "),
                Node::text("text").with_mark(Mark::Strong)
            ]
        );
    }

    #[test]
    fn whitespace_between_blocks_is_dropped() {
        let doc = parse("<p>a</p>\n  <p>b</p>\n");
        assert_eq!(doc.child_count(), 2);
    }

    #[test]
    fn list_items_autoclose() {
        let doc = parse("<ul><li>a<li>b</ul>");
        let list = doc.child(0).unwrap();
        assert_eq!(list.node_type(), NodeType::BulletList);
        assert_eq!(list.child_count(), 2);
        assert_eq!(list.child(0).unwrap().text_content(), "a");
        assert_eq!(list.child(1).unwrap().text_content(), "b");
    }

    #[test]
    fn check_list_class_is_recognized() {
        let doc = parse(r#"<ul class="check-list"><li>task</li></ul>"#);
        assert_eq!(doc.child(0).unwrap().node_type(), NodeType::CheckList);
    }

    #[test]
    fn tables_flatten_sections_and_keep_cell_attrs() {
        let doc = parse(
            r#"<table><thead><tr><th>h</th></tr></thead><tbody><tr><td colspan="2" style="background-color: #fee">x</td></tr></tbody></table>"#,
        );
        let table = doc.child(0).unwrap();
        assert_eq!(table.node_type(), NodeType::Table);
        assert_eq!(table.child_count(), 2);
        let schema = Schema::new();
        let header = table.child(0).unwrap().child(0).unwrap();
        assert_eq!(header.node_type(), NodeType::TableHeader);
        let cell = table.child(1).unwrap().child(0).unwrap();
        assert_eq!(schema.attr_int(cell, "colspan"), Some(2));
        assert_eq!(schema.attr_str(cell, "background").as_deref(), Some("#fee"));
    }

    #[test]
    fn pre_blocks_flatten_to_plain_text() {
        let doc = parse("<pre><code>let <b>x</b> = 1;</code></pre>");
        let block = doc.child(0).unwrap();
        assert_eq!(block.node_type(), NodeType::CodeBlock);
        assert_eq!(block.children(), &[Node::text("let x = 1;")]);
    }

    #[test]
    fn empty_div_is_padded_with_a_paragraph() {
        let doc = parse(r#"<div class="box"></div>"#);
        let div = doc.child(0).unwrap();
        assert_eq!(div.node_type(), NodeType::Div);
        assert_eq!(div.children(), &[Node::element(NodeType::Paragraph)]);
        assert_eq!(
            Schema::new().attr_str(div, "class").as_deref(),
            Some("box")
        );
    }

    #[test]
    fn link_attributes_are_preserved() {
        let doc = parse(
            r#"<p><a href="https://x.test" class="fancy" style="color: teal" title="go">x</a></p>"#,
        );
        let marks = doc.child(0).unwrap().children()[0].marks();
        assert_eq!(
            marks,
            &[Mark::Link {
                href: "https://x.test".to_string(),
                title: Some("go".to_string()),
                class: Some("fancy".to_string()),
                style: Some("color: teal".to_string()),
            }]
        );
    }

    #[test]
    fn anchor_without_href_is_transparent() {
        let doc = parse("<p><a>plain</a></p>");
        assert!(doc.child(0).unwrap().children()[0].marks().is_empty());
    }

    #[test]
    fn image_width_parses_from_attribute() {
        let doc = parse(r#"<p><img src="a.png" width="300" alt="pic"></p>"#);
        let img = &doc.child(0).unwrap().children()[0];
        let schema = Schema::new();
        assert_eq!(img.node_type(), NodeType::Image);
        assert_eq!(schema.attr_int(img, "width"), Some(300));
        assert_eq!(schema.attr_str(img, "alt").as_deref(), Some("pic"));
    }

    #[test]
    fn block_tag_closes_open_paragraph() {
        let doc = parse("<p>a<div>b</div>");
        assert_eq!(doc.child_count(), 2);
        assert_eq!(doc.child(0).unwrap().node_type(), NodeType::Paragraph);
        assert_eq!(doc.child(1).unwrap().node_type(), NodeType::Div);
    }

    #[test]
    fn stray_close_tags_are_ignored() {
        let doc = parse("</div><p>ok</p></p>");
        assert_eq!(doc.child_count(), 1);
        assert_eq!(doc.child(0).unwrap().text_content(), "ok");
    }

    #[test]
    fn empty_input_yields_one_empty_paragraph() {
        let doc = parse("");
        assert_eq!(doc.child_count(), 1);
        assert_eq!(doc.child(0).unwrap(), &Node::element(NodeType::Paragraph));
    }

    #[test]
    fn garbage_still_validates() {
        let schema = Schema::new();
        for input in [
            "<table><p>no rows</p></table>",
            "<<<>>>",
            "<ul></ul>",
            "<li>floating</li>",
            "<tr><td>floating cell</td></tr>",
            "<p><p><p>",
            "<b>unclosed",
        ] {
            let doc = parse_document(input);
            schema.check(&doc).unwrap();
        }
    }

    #[test]
    fn stray_structure_is_rehomed() {
        let doc = parse("<li>one</li><li>two</li>");
        assert_eq!(doc.child_count(), 1);
        let list = doc.child(0).unwrap();
        assert_eq!(list.node_type(), NodeType::BulletList);
        assert_eq!(list.child_count(), 2);

        let doc = parse("<td>cell</td>");
        let table = doc.child(0).unwrap();
        assert_eq!(table.node_type(), NodeType::Table);
        assert_eq!(
            table.child(0).unwrap().child(0).unwrap().node_type(),
            NodeType::TableCell
        );
    }

    #[test]
    fn marked_text_in_block_context_keeps_marks() {
        let doc = parse("<b>bold root</b>");
        let p = doc.child(0).unwrap();
        assert_eq!(
            p.children(),
            &[Node::text("bold root").with_mark(Mark::Strong)]
        );
    }

    #[test]
    fn font_size_marks_survive_nesting() {
        let doc = parse(
            r#"<p><span style="font-size: 12px">a<span style="font-size: 18px">b</span>c</span></p>"#,
        );
        let children = doc.child(0).unwrap().children();
        let size_of = |n: &Node| {
            n.marks()
                .iter()
                .find_map(|m| match m {
                    Mark::FontSize { size } => Some(size.clone()),
                    _ => None,
                })
                .unwrap()
        };
        assert_eq!(size_of(&children[0]), "12px");
        assert_eq!(size_of(&children[1]), "18px");
        assert_eq!(size_of(&children[2]), "12px");
        assert_eq!(
            children
                .iter()
                .filter(|c| c.marks().iter().any(|m| m.mark_type() == MarkType::FontSize))
                .count(),
            3
        );
    }
}
