//! Helpers shared across command modules.

use tracing::debug;

use vellum_model::{EditorState, Node, NodeType, Transaction};

/// Returns the transaction only if a trial application on a copy of the
/// state succeeds. Commands use this to report "not applicable" instead of
/// handing out a transaction that would be rejected.
pub(crate) fn validated(state: &EditorState, tr: Transaction) -> Option<Transaction> {
    if tr.is_empty() {
        return None;
    }
    let mut trial = state.clone();
    match trial.apply(&tr) {
        Ok(()) => Some(tr),
        Err(err) => {
            debug!(%err, "command produced an inapplicable transaction");
            None
        }
    }
}

/// An empty paragraph-in-cell, the filler for structural table edits.
pub(crate) fn empty_cell() -> Node {
    Node::element(NodeType::TableCell).with_child(Node::element(NodeType::Paragraph))
}
