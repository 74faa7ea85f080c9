//! The editor state: document, selection, and stored marks, changed only
//! through transactions.

use serde::{Deserialize, Serialize};

use crate::mark::Mark;
use crate::node::{Node, NodeType};
use crate::schema::Schema;
use crate::selection::Selection;
use crate::transform::{self, Step, Transaction, TransformError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorState {
    #[serde(skip)]
    pub schema: Schema,
    pub doc: Node,
    pub selection: Selection,
    /// Marks staged for the next typed text. `None` means "derive from the
    /// cursor position"; `Some` overrides it until the next document edit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_marks: Option<Vec<Mark>>,
}

impl EditorState {
    /// Builds a state around a validated document. The cursor starts at the
    /// beginning of the first block.
    pub fn new(doc: Node) -> Result<EditorState, TransformError> {
        let schema = Schema::new();
        schema.check(&doc)?;
        let selection = Selection::caret(if doc.content_size() > 0 { 1 } else { 0 });
        Ok(EditorState {
            schema,
            doc,
            selection,
            stored_marks: None,
        })
    }

    /// An empty document: one paragraph, caret inside it.
    pub fn empty() -> EditorState {
        EditorState {
            schema: Schema::new(),
            doc: Node::element(NodeType::Doc).with_child(Node::element(NodeType::Paragraph)),
            selection: Selection::caret(1),
            stored_marks: None,
        }
    }

    /// Applies a transaction atomically. Every step runs against a scratch
    /// document which is validated before anything is committed; on error
    /// the state is exactly as it was.
    pub fn apply(&mut self, tr: &Transaction) -> Result<(), TransformError> {
        let mut doc = self.doc.clone();
        let mut stored = self.stored_marks.clone();
        for step in &tr.steps {
            match step {
                Step::SetStoredMarks { marks } => stored = marks.clone(),
                _ => {
                    doc = transform::apply_step(&self.schema, &doc, step)?;
                    // a document edit invalidates previously staged marks
                    stored = None;
                }
            }
        }
        self.schema.check(&doc)?;

        let selection = tr
            .selection
            .clone()
            .unwrap_or_else(|| self.selection.clone())
            .normalized(&doc);
        self.doc = doc;
        self.selection = selection;
        self.stored_marks = stored;
        Ok(())
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection.normalized(&self.doc);
        self.stored_marks = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::AttrValue;
    use crate::mark::MarkType;

    fn state() -> EditorState {
        let doc = Node::element(NodeType::Doc)
            .with_child(Node::element(NodeType::Paragraph).with_child(Node::text("hello")));
        EditorState::new(doc).unwrap()
    }

    #[test]
    fn failed_transactions_leave_state_untouched() {
        let mut st = state();
        let before = st.clone();
        let tr = Transaction::new()
            .step(Step::AddMark {
                from: 1,
                to: 3,
                mark: Mark::Strong,
            })
            .step(Step::SetNodeAttr {
                pos: 0,
                name: "nope".into(),
                value: AttrValue::str("x"),
            });
        assert!(st.apply(&tr).is_err());
        assert_eq!(st, before);
    }

    #[test]
    fn schema_violations_roll_back_whole_transactions() {
        let mut st = state();
        let before = st.clone();
        // a bare list item is not valid doc content
        let tr = Transaction::new().step(Step::ReplaceRange {
            from: 0,
            to: 0,
            content: vec![Node::element(NodeType::ListItem)
                .with_child(Node::element(NodeType::Paragraph))],
        });
        assert!(matches!(
            st.apply(&tr),
            Err(TransformError::InvalidContent { .. })
        ));
        assert_eq!(st, before);
    }

    #[test]
    fn doc_edits_clear_stored_marks() {
        let mut st = state();
        st.apply(&Transaction::new().step(Step::SetStoredMarks {
            marks: Some(vec![Mark::Strong]),
        }))
        .unwrap();
        assert_eq!(st.stored_marks, Some(vec![Mark::Strong]));

        st.apply(&Transaction::new().step(Step::AddMark {
            from: 1,
            to: 2,
            mark: Mark::Em,
        }))
        .unwrap();
        assert_eq!(st.stored_marks, None);
    }

    #[test]
    fn selection_is_clamped_after_shrinking_edits() {
        let mut st = state();
        st.set_selection(Selection::text(1, 6));
        let tr = Transaction::new().step(Step::ReplaceRange {
            from: 1,
            to: 6,
            content: vec![],
        });
        st.apply(&tr).unwrap();
        assert_eq!(st.selection, Selection::text(1, 2));
    }

    #[test]
    fn stored_mark_round_trip_survives_serialization() {
        let mut st = state();
        st.apply(&Transaction::new().step(Step::SetStoredMarks {
            marks: Some(vec![Mark::font_size("18px")]),
        }))
        .unwrap();
        let json = serde_json::to_string(&st).unwrap();
        let back: EditorState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.doc, st.doc);
        assert_eq!(back.stored_marks, st.stored_marks);
        assert!(back
            .stored_marks
            .as_deref()
            .is_some_and(|m| m[0].mark_type() == MarkType::FontSize));
    }
}
