//! Media commands: image and button insertion, raw markup import.

use vellum_model::{EditorState, Node, NodeType, Selection, Step, Transaction};

use crate::utils::validated;

const BUTTON_CLASS: &str = "px-4 py-2 bg-blue-500 text-white rounded hover:bg-blue-600";
const BUTTON_LABEL: &str = "Click me";

/// Replaces the selection with an image. `name` doubles as alt text and
/// title. Only applies at an inline position.
pub fn insert_image(state: &EditorState, src: &str, name: &str) -> Option<Transaction> {
    let image = Node::element(NodeType::Image)
        .with_attr("src", src)
        .with_attr("alt", name)
        .with_attr("title", name);
    replace_selection_with(state, image)
}

/// Replaces the selection with a button carrying the stock face.
pub fn insert_button(state: &EditorState) -> Option<Transaction> {
    let button = Node::element(NodeType::Button)
        .with_attr("class", BUTTON_CLASS)
        .with_child(Node::text(BUTTON_LABEL));
    replace_selection_with(state, button)
}

fn replace_selection_with(state: &EditorState, node: Node) -> Option<Transaction> {
    let sel = &state.selection;
    let caret = sel.start() + node.node_size();
    let tr = Transaction::new()
        .step(Step::ReplaceRange {
            from: sel.start(),
            to: sel.end(),
            content: vec![node],
        })
        .with_selection(Selection::caret(caret));
    validated(state, tr)
}

/// Swaps the whole document for the parse of `html`, which tolerates any
/// input. Blank markup is rejected instead of producing an empty document.
pub fn import_html(html: &str) -> Option<Transaction> {
    if html.trim().is_empty() {
        return None;
    }
    let doc = vellum_markup::parse_document(html);
    Some(
        Transaction::new()
            .step(Step::ReplaceDoc { doc })
            .with_selection(Selection::caret(1)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_text(text: &str) -> EditorState {
        let doc = Node::element(NodeType::Doc)
            .with_child(Node::element(NodeType::Paragraph).with_child(Node::text(text)));
        EditorState::new(doc).unwrap()
    }

    #[test]
    fn image_replaces_the_selected_text() {
        let mut state = state_with_text("hello");
        state.set_selection(Selection::text(3, 5));
        let tr = insert_image(&state, "pic.png", "A picture").unwrap();
        state.apply(&tr).unwrap();

        let block = state.doc.child(0).unwrap();
        assert_eq!(block.child_count(), 3);
        let image = block.child(1).unwrap();
        assert_eq!(image.node_type(), NodeType::Image);
        assert_eq!(
            state.schema.attr_str(image, "src").as_deref(),
            Some("pic.png")
        );
        assert_eq!(
            state.schema.attr_str(image, "alt").as_deref(),
            Some("A picture")
        );
        assert_eq!(
            state.schema.attr_str(image, "title").as_deref(),
            Some("A picture")
        );
        assert_eq!(state.selection, Selection::caret(4));
    }

    #[test]
    fn images_need_an_inline_position() {
        let mut state = state_with_text("hello");
        // position before the paragraph, not inside it
        state.set_selection(Selection::caret(0));
        assert!(insert_image(&state, "pic.png", "x").is_none());
    }

    #[test]
    fn button_carries_its_stock_face() {
        let mut state = state_with_text("ab");
        state.set_selection(Selection::caret(2));
        let tr = insert_button(&state).unwrap();
        state.apply(&tr).unwrap();

        let block = state.doc.child(0).unwrap();
        let button = block.child(1).unwrap();
        assert_eq!(button.node_type(), NodeType::Button);
        assert_eq!(
            state.schema.attr_str(button, "class").as_deref(),
            Some(BUTTON_CLASS)
        );
        assert_eq!(button.text_content(), BUTTON_LABEL);
    }

    #[test]
    fn import_rejects_blank_markup() {
        assert!(import_html("").is_none());
        assert!(import_html("  \n\t ").is_none());
    }

    #[test]
    fn import_swaps_the_whole_document() {
        let mut state = state_with_text("old");
        let tr = import_html("<p>new</p>").unwrap();
        state.apply(&tr).unwrap();
        assert_eq!(state.doc.child_count(), 1);
        assert_eq!(state.doc.child(0).unwrap().text_content(), "new");
        assert_eq!(state.selection, Selection::caret(1));
    }

    #[test]
    fn import_survives_garbage_markup() {
        let mut state = state_with_text("old");
        let tr = import_html("<td>stranded</div></p>").unwrap();
        state.apply(&tr).unwrap();
        assert_eq!(state.doc.text_content(), "stranded");
    }
}
