//! Block-level commands: block type changes, alignment, wrapping.

use vellum_model::{
    Attrs, EditorState, Node, NodeType, ResolvedPos, Selection, Step, Transaction,
};

use crate::utils::validated;

/// Converts every textblock touched by the selection to `node_type` with
/// exactly `attrs`. Blocks already matching are left alone; `None` when no
/// block changes or the result would break a container's content rules
/// (a list item must keep its leading paragraph, for instance).
pub fn set_block_type(
    state: &EditorState,
    node_type: NodeType,
    attrs: Attrs,
) -> Option<Transaction> {
    let sel = &state.selection;
    let (from, to) = (sel.start(), sel.end());
    let mut tr = Transaction::new();
    state.doc.nodes_between(from, to, &mut |node, pos| {
        if node.node_type().is_textblock() {
            if node.node_type() != node_type || node.attrs() != Some(&attrs) {
                tr.steps.push(Step::SetNodeMarkup {
                    pos,
                    node_type,
                    attrs: attrs.clone(),
                });
            }
            return false;
        }
        true
    });
    validated(state, tr)
}

pub fn set_paragraph(state: &EditorState) -> Option<Transaction> {
    set_block_type(state, NodeType::Paragraph, Attrs::new())
}

pub fn set_heading(state: &EditorState, level: i64) -> Option<Transaction> {
    let mut attrs = Attrs::new();
    if level != 1 {
        attrs.set("level", level);
    }
    set_block_type(state, NodeType::Heading, attrs)
}

pub fn set_code_block(state: &EditorState) -> Option<Transaction> {
    set_block_type(state, NodeType::CodeBlock, Attrs::new())
}

/// Sets `textAlign` on every node intersecting the selection that declares
/// it, however deep, leaving the rest untouched.
pub fn set_text_align(state: &EditorState, alignment: &str) -> Option<Transaction> {
    let sel = &state.selection;
    let (from, to) = (sel.start(), sel.end());
    let mut tr = Transaction::new();
    state.doc.nodes_between(from, to, &mut |node, pos| {
        if state.schema.declares_attr(node.node_type(), "textAlign") {
            tr.steps.push(Step::SetNodeAttr {
                pos,
                name: "textAlign".to_string(),
                value: alignment.into(),
            });
        }
        true
    });
    if tr.is_empty() {
        return None;
    }
    Some(tr)
}

/// Wraps the selected paragraphs in a list, one item per paragraph. Only
/// plain paragraphs wrap; anything else in the range makes the command
/// inapplicable.
pub fn wrap_in_list(state: &EditorState, list_type: NodeType) -> Option<Transaction> {
    let sel = &state.selection;
    let r_from = ResolvedPos::resolve(&state.doc, sel.start())?;
    let r_to = ResolvedPos::resolve(&state.doc, sel.end())?;
    let range = r_from.block_range(&r_to)?;
    let children = range.children();
    if children
        .iter()
        .any(|c| c.node_type() != NodeType::Paragraph)
    {
        return None;
    }
    let items: Vec<Node> = children
        .iter()
        .cloned()
        .map(|p| Node::element(NodeType::ListItem).with_child(p))
        .collect();
    let list = Node::element(list_type).with_children(items);
    let tr = Transaction::new()
        .step(Step::ReplaceRange {
            from: range.start,
            to: range.end,
            content: vec![list],
        })
        .with_selection(Selection::caret(range.start + 3));
    validated(state, tr)
}

/// Wraps the selected blocks in a blockquote.
pub fn wrap_in_blockquote(state: &EditorState) -> Option<Transaction> {
    let sel = &state.selection;
    let r_from = ResolvedPos::resolve(&state.doc, sel.start())?;
    let r_to = ResolvedPos::resolve(&state.doc, sel.end())?;
    let range = r_from.block_range(&r_to)?;
    let children = range.children();
    if children.iter().any(|c| !c.node_type().is_block()) {
        return None;
    }
    let quote = Node::element(NodeType::Blockquote).with_children(children.to_vec());
    let tr = Transaction::new()
        .step(Step::ReplaceRange {
            from: range.start,
            to: range.end,
            content: vec![quote],
        })
        .with_selection(Selection::caret(range.start + 2));
    validated(state, tr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_of(doc: Node) -> EditorState {
        EditorState::new(doc).unwrap()
    }

    fn two_paragraphs() -> Node {
        Node::element(NodeType::Doc)
            .with_child(Node::element(NodeType::Paragraph).with_child(Node::text("one")))
            .with_child(Node::element(NodeType::Paragraph).with_child(Node::text("two")))
    }

    #[test]
    fn converts_paragraph_to_heading_and_back() {
        let mut state = state_of(two_paragraphs());
        state.set_selection(Selection::caret(2));

        let tr = set_heading(&state, 2).unwrap();
        state.apply(&tr).unwrap();
        let block = state.doc.child(0).unwrap();
        assert_eq!(block.node_type(), NodeType::Heading);
        assert_eq!(state.schema.attr_int(block, "level"), Some(2));
        // the second paragraph is outside the selection
        assert_eq!(state.doc.child(1).unwrap().node_type(), NodeType::Paragraph);

        let tr = set_paragraph(&state).unwrap();
        state.apply(&tr).unwrap();
        assert_eq!(state.doc.child(0).unwrap().node_type(), NodeType::Paragraph);
    }

    #[test]
    fn code_block_conversion_strips_marks() {
        let doc = Node::element(NodeType::Doc).with_child(
            Node::element(NodeType::Paragraph)
                .with_child(Node::text("keep ").with_mark(vellum_model::Mark::Strong))
                .with_child(Node::text("this")),
        );
        let mut state = state_of(doc);
        state.set_selection(Selection::caret(3));
        let tr = set_code_block(&state).unwrap();
        state.apply(&tr).unwrap();
        let block = state.doc.child(0).unwrap();
        assert_eq!(block.node_type(), NodeType::CodeBlock);
        assert_eq!(block.children(), &[Node::text("keep this")]);
    }

    #[test]
    fn heading_inside_list_item_is_not_applicable() {
        let doc = Node::element(NodeType::Doc).with_child(
            Node::element(NodeType::BulletList).with_child(
                Node::element(NodeType::ListItem)
                    .with_child(Node::element(NodeType::Paragraph).with_child(Node::text("x"))),
            ),
        );
        let mut state = state_of(doc);
        // inside the item's paragraph
        state.set_selection(Selection::caret(4));
        assert!(set_heading(&state, 2).is_none());
    }

    #[test]
    fn unchanged_block_type_is_not_applicable() {
        let mut state = state_of(two_paragraphs());
        state.set_selection(Selection::caret(2));
        assert!(set_paragraph(&state).is_none());
    }

    #[test]
    fn alignment_hits_every_intersected_block() {
        let mut state = state_of(two_paragraphs());
        // from inside "one" to inside "two"
        state.set_selection(Selection::text(2, 8));
        let tr = set_text_align(&state, "center").unwrap();
        state.apply(&tr).unwrap();
        for i in 0..2 {
            let block = state.doc.child(i).unwrap();
            assert_eq!(
                state.schema.attr_str(block, "textAlign").as_deref(),
                Some("center")
            );
        }
    }

    #[test]
    fn alignment_skips_blocks_without_the_attribute() {
        let doc = Node::element(NodeType::Doc)
            .with_child(Node::element(NodeType::Paragraph).with_child(Node::text("ab")))
            .with_child(Node::element(NodeType::CodeBlock).with_child(Node::text("cd")));
        let mut state = state_of(doc);
        state.set_selection(Selection::text(1, 7));
        let tr = set_text_align(&state, "right").unwrap();
        state.apply(&tr).unwrap();
        assert_eq!(
            state
                .schema
                .attr_str(state.doc.child(0).unwrap(), "textAlign")
                .as_deref(),
            Some("right")
        );
        // code blocks declare no alignment and carry no attrs
        assert!(state.doc.child(1).unwrap().attrs().unwrap().is_empty());
    }

    #[test]
    fn wrapping_two_paragraphs_builds_one_list() {
        let mut state = state_of(two_paragraphs());
        state.set_selection(Selection::text(2, 8));
        let tr = wrap_in_list(&state, NodeType::BulletList).unwrap();
        state.apply(&tr).unwrap();
        assert_eq!(state.doc.child_count(), 1);
        let list = state.doc.child(0).unwrap();
        assert_eq!(list.node_type(), NodeType::BulletList);
        assert_eq!(list.child_count(), 2);
        assert_eq!(list.child(0).unwrap().text_content(), "one");
        assert_eq!(list.child(1).unwrap().text_content(), "two");
    }

    #[test]
    fn lists_only_wrap_paragraphs() {
        let doc = Node::element(NodeType::Doc)
            .with_child(Node::element(NodeType::Heading).with_child(Node::text("title")));
        let mut state = state_of(doc);
        state.set_selection(Selection::caret(2));
        assert!(wrap_in_list(&state, NodeType::BulletList).is_none());
    }

    #[test]
    fn blockquote_wraps_mixed_blocks() {
        let doc = Node::element(NodeType::Doc)
            .with_child(Node::element(NodeType::Paragraph).with_child(Node::text("ab")))
            .with_child(Node::element(NodeType::Heading).with_child(Node::text("cd")));
        let mut state = state_of(doc);
        state.set_selection(Selection::text(2, 7));
        let tr = wrap_in_blockquote(&state).unwrap();
        state.apply(&tr).unwrap();
        assert_eq!(state.doc.child_count(), 1);
        let quote = state.doc.child(0).unwrap();
        assert_eq!(quote.node_type(), NodeType::Blockquote);
        assert_eq!(quote.child_count(), 2);
    }
}
