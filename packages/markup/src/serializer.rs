//! Document to HTML-fragment serialization.
//!
//! Blocks map one-to-one onto tags. Inline content streams through a mark
//! tag stack: each child declares the tags it wants open, the serializer
//! keeps the common prefix with what is already open and closes or opens
//! the rest, so a run of identically-marked nodes shares one set of tags:
//!
//! ```text
//! a(b)  b(b,i)  c(b)   ──▶   <b>a<i>b</i>c</b>
//! ```
//!
//! The span-family marks (font family, font size, text color, highlight,
//! raw styling) collapse into a single `<span>` whose style attribute lists
//! their declarations in a fixed order, so equal formatting always prints
//! the same bytes.

use tracing::instrument;

use vellum_model::{Mark, Node, NodeType, Schema};

use crate::css::{join_declarations, split_declarations};

/// Serializes a document's content to an HTML fragment. The document tag
/// itself has no representation; top-level blocks concatenate directly.
#[instrument(skip(doc))]
pub fn serialize_document(doc: &Node) -> String {
    let schema = Schema::new();
    let mut out = String::new();
    for child in doc.children() {
        serialize_block(child, schema, &mut out);
    }
    out
}

fn serialize_block(node: &Node, schema: Schema, out: &mut String) {
    use NodeType::*;
    match node.node_type() {
        Paragraph => {
            out.push_str("<p");
            push_align(node, schema, out);
            out.push_str(" data-color-inherit=\"true\">");
            serialize_inline(node.children(), out);
            out.push_str("</p>");
        }
        Heading => {
            let level = schema.attr_int(node, "level").unwrap_or(1).clamp(1, 6);
            out.push_str("<h");
            out.push_str(&level.to_string());
            push_align(node, schema, out);
            out.push_str(" data-color-inherit=\"true\">");
            serialize_inline(node.children(), out);
            out.push_str("</h");
            out.push_str(&level.to_string());
            out.push('>');
        }
        Div => styled_container(node, schema, "div", out),
        Header => styled_container(node, schema, "header", out),
        Nav => styled_container(node, schema, "nav", out),
        Footer => styled_container(node, schema, "footer", out),
        Article => styled_container(node, schema, "article", out),
        Blockquote => {
            out.push_str("<blockquote>");
            serialize_children(node, schema, out);
            out.push_str("</blockquote>");
        }
        CodeBlock => {
            out.push_str("<pre><code>");
            out.push_str(&escape_text(&node.text_content()));
            out.push_str("</code></pre>");
        }
        BulletList => {
            out.push_str("<ul>");
            serialize_children(node, schema, out);
            out.push_str("</ul>");
        }
        CheckList => {
            out.push_str("<ul class=\"check-list\">");
            serialize_children(node, schema, out);
            out.push_str("</ul>");
        }
        OrderedList => {
            out.push_str("<ol");
            if let Some(order) = schema.attr_int(node, "order").filter(|o| *o != 1) {
                push_attr(out, "start", &order.to_string());
            }
            out.push('>');
            serialize_children(node, schema, out);
            out.push_str("</ol>");
        }
        ListItem => {
            out.push_str("<li>");
            serialize_children(node, schema, out);
            out.push_str("</li>");
        }
        Table => {
            out.push_str("<table>");
            serialize_children(node, schema, out);
            out.push_str("</table>");
        }
        TableRow => {
            out.push_str("<tr>");
            serialize_children(node, schema, out);
            out.push_str("</tr>");
        }
        TableCell => cell(node, schema, "td", out),
        TableHeader => cell(node, schema, "th", out),
        HorizontalRule => out.push_str("<hr>"),
        // Inline types reach here only for malformed trees; emit nothing.
        Doc | Button | Image | HardBreak | Text => {}
    }
}

fn serialize_children(node: &Node, schema: Schema, out: &mut String) {
    for child in node.children() {
        serialize_block(child, schema, out);
    }
}

fn styled_container(node: &Node, schema: Schema, tag: &str, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    for name in ["style", "class"] {
        if let Some(value) = schema.attr_str(node, name).filter(|v| !v.is_empty()) {
            push_attr(out, name, &value);
        }
    }
    push_align(node, schema, out);
    out.push('>');
    serialize_children(node, schema, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn cell(node: &Node, schema: Schema, tag: &str, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    for name in ["colspan", "rowspan"] {
        if let Some(span) = schema.attr_int(node, name).filter(|s| *s > 1) {
            push_attr(out, name, &span.to_string());
        }
    }
    if let Some(background) = schema
        .attr_str(node, "background")
        .filter(|b| !b.is_empty())
    {
        push_attr(out, "style", &format!("background-color: {background};"));
    }
    out.push('>');
    serialize_children(node, schema, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn push_align(node: &Node, schema: Schema, out: &mut String) {
    if let Some(align) = schema
        .attr_str(node, "textAlign")
        .filter(|a| !a.is_empty())
    {
        push_attr(out, "align", &align);
    }
}

/// One open formatting tag. Equality drives the common-prefix diff in
/// [`serialize_inline`].
#[derive(Debug, Clone, PartialEq)]
enum MarkTag {
    Link {
        href: String,
        title: Option<String>,
        class: Option<String>,
        style: Option<String>,
    },
    Bold,
    Italic,
    Underline,
    Span {
        style: String,
    },
}

impl MarkTag {
    fn open(&self, out: &mut String) {
        match self {
            MarkTag::Link {
                href,
                title,
                class,
                style,
            } => {
                out.push_str("<a");
                push_attr(out, "href", href);
                if let Some(class) = class {
                    push_attr(out, "class", class);
                }
                if let Some(style) = style {
                    push_attr(out, "style", style);
                }
                if let Some(title) = title {
                    push_attr(out, "title", title);
                }
                out.push('>');
            }
            MarkTag::Bold => out.push_str("<b>"),
            MarkTag::Italic => out.push_str("<i>"),
            MarkTag::Underline => out.push_str("<u>"),
            MarkTag::Span { style } => {
                out.push_str("<span");
                push_attr(out, "style", style);
                out.push('>');
            }
        }
    }

    fn close(&self, out: &mut String) {
        out.push_str(match self {
            MarkTag::Link { .. } => "</a>",
            MarkTag::Bold => "</b>",
            MarkTag::Italic => "</i>",
            MarkTag::Underline => "</u>",
            MarkTag::Span { .. } => "</span>",
        });
    }
}

/// Maps a canonical mark set to the tags it opens, merging the span family
/// into one span. Style declarations print in a fixed order so the same
/// marks always produce the same attribute text.
fn mark_tags(marks: &[Mark]) -> Vec<MarkTag> {
    let mut tags = Vec::new();
    let mut span: Vec<(String, String)> = Vec::new();
    for mark in marks {
        match mark {
            Mark::Link {
                href,
                title,
                class,
                style,
            } => tags.push(MarkTag::Link {
                href: href.clone(),
                title: title.clone(),
                class: class.clone(),
                style: style.clone(),
            }),
            Mark::Strong => tags.push(MarkTag::Bold),
            Mark::Em => tags.push(MarkTag::Italic),
            Mark::Underline => tags.push(MarkTag::Underline),
            Mark::FontFamily { family } => span.push(("font-family".to_string(), family.clone())),
            Mark::FontSize { size } => span.push(("font-size".to_string(), size.clone())),
            Mark::TextColor { color } => span.push(("color".to_string(), color.clone())),
            Mark::Highlight { color } => {
                span.push(("background-color".to_string(), color.clone()))
            }
            Mark::Styled { style } => span.extend(split_declarations(style)),
        }
    }
    if !span.is_empty() {
        tags.push(MarkTag::Span {
            style: join_declarations(&span),
        });
    }
    tags
}

fn serialize_inline(children: &[Node], out: &mut String) {
    let mut open: Vec<MarkTag> = Vec::new();
    for child in children {
        let want = mark_tags(child.marks());
        let keep = open
            .iter()
            .zip(want.iter())
            .take_while(|(a, b)| a == b)
            .count();
        while open.len() > keep {
            if let Some(tag) = open.pop() {
                tag.close(out);
            }
        }
        for tag in &want[keep..] {
            tag.open(out);
            open.push(tag.clone());
        }
        serialize_inline_node(child, out);
    }
    while let Some(tag) = open.pop() {
        tag.close(out);
    }
}

fn serialize_inline_node(node: &Node, out: &mut String) {
    let schema = Schema::new();
    match node.node_type() {
        NodeType::Text => {
            if let Some(text) = node.text_str() {
                out.push_str(&escape_text(text));
            }
        }
        NodeType::HardBreak => out.push_str("<br>"),
        NodeType::Image => {
            out.push_str("<img");
            for name in ["src", "alt", "title"] {
                if let Some(value) = schema.attr_str(node, name).filter(|v| !v.is_empty()) {
                    push_attr(out, name, &value);
                }
            }
            let width = schema.attr_int(node, "width").filter(|w| *w > 0);
            if let Some(width) = width {
                push_attr(out, "width", &width.to_string());
            }
            match schema.attr_str(node, "style").filter(|s| !s.is_empty()) {
                Some(style) => push_attr(out, "style", &style),
                None => {
                    if let Some(width) = width {
                        push_attr(out, "style", &format!("width: {width}px;"));
                    }
                }
            }
            out.push('>');
        }
        NodeType::Button => {
            out.push_str("<button");
            for name in ["style", "class", "onclick"] {
                if let Some(value) = schema.attr_str(node, name).filter(|v| !v.is_empty()) {
                    push_attr(out, name, &value);
                }
            }
            out.push('>');
            serialize_inline(node.children(), out);
            out.push_str("</button>");
        }
        _ => {}
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_attr(value));
    out.push('"');
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    fn doc(children: Vec<Node>) -> Node {
        Node::element(NodeType::Doc).with_children(children)
    }

    fn p(children: Vec<Node>) -> Node {
        Node::element(NodeType::Paragraph).with_children(children)
    }

    #[test]
    fn paragraphs_carry_the_inherit_marker() {
        let html = serialize_document(&doc(vec![p(vec![Node::text("hi")])]));
        assert_eq!(html, r#"<p data-color-inherit="true">hi</p>"#);
    }

    #[test]
    fn align_prints_as_an_attribute() {
        let block = p(vec![Node::text("x")]).with_attr("textAlign", "center");
        let html = serialize_document(&doc(vec![block]));
        assert_eq!(
            html,
            r#"<p align="center" data-color-inherit="true">x</p>"#
        );
    }

    #[test]
    fn shared_marks_share_tags() {
        let block = p(vec![
            Node::text("a").with_mark(Mark::Strong),
            Node::text("b").with_mark(Mark::Strong).with_mark(Mark::Em),
            Node::text("c").with_mark(Mark::Strong),
        ]);
        let html = serialize_document(&doc(vec![block]));
        assert_eq!(
            html,
            r#"<p data-color-inherit="true"><b>a<i>b</i>c</b></p>"#
        );
    }

    #[test]
    fn links_wrap_other_formatting() {
        let block = p(vec![Node::text("go")
            .with_mark(Mark::Strong)
            .with_mark(Mark::link("https://x.test"))]);
        let html = serialize_document(&doc(vec![block]));
        assert_eq!(
            html,
            r#"<p data-color-inherit="true"><a href="https://x.test"><b>go</b></a></p>"#
        );
    }

    #[test]
    fn span_family_merges_into_one_span() {
        let block = p(vec![Node::text("x")
            .with_mark(Mark::font_family("Georgia, serif"))
            .with_mark(Mark::font_size("18px"))
            .with_mark(Mark::text_color("red"))
            .with_mark(Mark::highlight("#ff0"))]);
        let html = serialize_document(&doc(vec![block]));
        assert_eq!(
            html,
            concat!(
                r#"<p data-color-inherit="true">"#,
                r#"<span style="font-family: Georgia, serif; font-size: 18px; color: red; background-color: #ff0;">x</span>"#,
                "</p>"
            )
        );
    }

    #[test]
    fn heading_level_picks_the_tag() {
        let h = Node::element(NodeType::Heading)
            .with_attr("level", 3i64)
            .with_child(Node::text("t"));
        let html = serialize_document(&doc(vec![h]));
        assert_eq!(html, r#"<h3 data-color-inherit="true">t</h3>"#);
    }

    #[test]
    fn list_attributes_round_out() {
        let li = Node::element(NodeType::ListItem).with_child(p(vec![Node::text("x")]));
        let ol = Node::element(NodeType::OrderedList)
            .with_attr("order", 4i64)
            .with_child(li.clone());
        let check = Node::element(NodeType::CheckList).with_child(li);
        let html = serialize_document(&doc(vec![ol, check]));
        assert!(html.starts_with(r#"<ol start="4"><li>"#));
        assert!(html.contains(r#"<ul class="check-list"><li>"#));
    }

    #[test]
    fn cells_print_spans_and_background() {
        let cell = Node::element(NodeType::TableCell)
            .with_attr("colspan", 2i64)
            .with_attr("background", "#fee")
            .with_child(p(vec![Node::text("x")]));
        let table = Node::element(NodeType::Table)
            .with_child(Node::element(NodeType::TableRow).with_child(cell));
        let html = serialize_document(&doc(vec![table]));
        assert_eq!(
            html,
            concat!(
                r#"<table><tr><td colspan="2" style="background-color: #fee;">"#,
                r#"<p data-color-inherit="true">x</p></td></tr></table>"#
            )
        );
    }

    #[test]
    fn code_blocks_print_pre_code() {
        let block =
            Node::element(NodeType::CodeBlock).with_child(Node::text("if a < b { swap() }"));
        let html = serialize_document(&doc(vec![block]));
        assert_eq!(html, "<pre><code>if a &lt; b { swap() }</code></pre>");
    }

    #[test]
    fn image_width_synthesizes_style_when_absent() {
        let img = Node::element(NodeType::Image)
            .with_attr("src", "a.png")
            .with_attr("width", 300i64);
        let html = serialize_document(&doc(vec![p(vec![img])]));
        assert_eq!(
            html,
            r#"<p data-color-inherit="true"><img src="a.png" width="300" style="width: 300px;"></p>"#
        );
    }

    #[test]
    fn text_and_attrs_are_escaped() {
        let block = p(vec![Node::text("a < b & c").with_mark(Mark::link("https://x.test/?a=1&b=2"))]);
        let html = serialize_document(&doc(vec![block]));
        assert!(html.contains(r#"href="https://x.test/?a=1&amp;b=2""#));
        assert!(html.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn parse_serialize_is_stable() {
        for html in [
            r#"<p data-color-inherit="true">plain</p>"#,
            r#"<p align="right" data-color-inherit="true"><b>b<i>bi</i></b></p>"#,
            r#"<ul class="check-list"><li><p data-color-inherit="true">t</p></li></ul>"#,
            concat!(
                r#"<table><tr><th>h</th><td style="background-color: #eef;">"#,
                r#"<p data-color-inherit="true">x</p></td></tr></table>"#
            ),
            r#"<div style="padding: 4px;" class="card"><p data-color-inherit="true">in</p></div>"#,
            r#"<pre><code>let x = 1;</code></pre>"#,
        ] {
            let once = serialize_document(&parse_document(html));
            let twice = serialize_document(&parse_document(&once));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn parse_of_serialized_doc_round_trips() {
        let original = doc(vec![
            p(vec![
                Node::text("hello "),
                Node::text("bold").with_mark(Mark::Strong),
            ]),
            Node::element(NodeType::Heading)
                .with_attr("level", 2i64)
                .with_child(Node::text("head")),
        ]);
        let html = serialize_document(&original);
        assert_eq!(parse_document(&html), original);
    }
}
