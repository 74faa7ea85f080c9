//! Mark commands: toggling formatting, font sizing, link insertion.
//!
//! All commands are pure: they read the state and either return a
//! transaction for the caller to apply or `None` when the operation does
//! not apply in the current selection context. A caret never edits text;
//! mark changes at a caret stage stored marks for the next typed input.

use vellum_model::{
    mark, EditorState, Mark, MarkType, Node, NodeType, ResolvedPos, Step, Transaction,
};

/// Smallest font size the editor offers.
pub const FONT_SIZE_MIN: i64 = 8;
/// Largest font size the editor offers.
pub const FONT_SIZE_MAX: i64 = 72;

/// Clamps a size into the editor's font range. Input widgets use this; the
/// command itself stores whatever it is given.
pub fn clamp_font_size(size: i64) -> i64 {
    size.clamp(FONT_SIZE_MIN, FONT_SIZE_MAX)
}

/// Standard toggle: a range carrying the mark everywhere loses it, any
/// other range gains it throughout. Equality includes mark values, so
/// toggling red onto blue text recolors instead of clearing. At a caret
/// the toggle applies to the stored marks instead.
pub fn toggle_mark(state: &EditorState, mark: Mark) -> Option<Transaction> {
    let sel = &state.selection;
    if sel.is_caret() {
        let current = caret_marks(state);
        let next = if current.contains(&mark) {
            current.iter().filter(|m| *m != &mark).cloned().collect()
        } else {
            mark::add_to_set(mark, &current)
        };
        return Some(Transaction::new().step(Step::SetStoredMarks { marks: Some(next) }));
    }

    let (from, to) = (sel.start(), sel.end());
    if !mark_applies(&state.doc, from, to) {
        return None;
    }
    let step = if range_fully_marked(&state.doc, from, to, &mark) {
        Step::RemoveMark {
            from,
            to,
            mark_type: mark.mark_type(),
        }
    } else {
        Step::AddMark { from, to, mark }
    };
    Some(Transaction::new().step(step))
}

/// Removes every mark of a type from the selection, or clears it from the
/// stored marks at a caret. `None` when nothing carries the type.
pub fn remove_mark(state: &EditorState, mark_type: MarkType) -> Option<Transaction> {
    let sel = &state.selection;
    if sel.is_caret() {
        let current = caret_marks(state);
        if !mark::contains_type(&current, mark_type) {
            return None;
        }
        let next = mark::remove_from_set(mark_type, &current);
        return Some(Transaction::new().step(Step::SetStoredMarks { marks: Some(next) }));
    }

    let (from, to) = (sel.start(), sel.end());
    if !range_has_mark_type(&state.doc, from, to, mark_type) {
        return None;
    }
    Some(Transaction::new().step(Step::RemoveMark {
        from,
        to,
        mark_type,
    }))
}

/// Applies a font size to the selection as a `"<size>px"` mark, replacing
/// any size already there. A caret stages the size for the next input.
pub fn set_font_size(state: &EditorState, size: i64) -> Option<Transaction> {
    let mark = Mark::font_size(format!("{size}px"));
    let sel = &state.selection;
    if sel.is_caret() {
        let next = mark::add_to_set(mark, &caret_marks(state));
        return Some(Transaction::new().step(Step::SetStoredMarks { marks: Some(next) }));
    }
    let (from, to) = (sel.start(), sel.end());
    if !mark_applies(&state.doc, from, to) {
        return None;
    }
    Some(Transaction::new().step(Step::AddMark { from, to, mark }))
}

/// Selects a font family, `""` meaning "back to the default face".
pub fn set_font_family(state: &EditorState, family: &str) -> Option<Transaction> {
    if family.is_empty() {
        remove_mark(state, MarkType::FontFamily)
    } else {
        toggle_mark(state, Mark::font_family(family))
    }
}

/// Links must annotate text, so a caret is not applicable. `title` rides
/// along for hover text; class and style stay unset for new links.
pub fn insert_link(state: &EditorState, href: &str, title: &str) -> Option<Transaction> {
    let sel = &state.selection;
    if sel.is_caret() {
        return None;
    }
    let (from, to) = (sel.start(), sel.end());
    if !mark_applies(&state.doc, from, to) {
        return None;
    }
    Some(Transaction::new().step(Step::AddMark {
        from,
        to,
        mark: Mark::Link {
            href: href.to_string(),
            title: Some(title.to_string()),
            class: None,
            style: None,
        },
    }))
}

fn caret_marks(state: &EditorState) -> Vec<Mark> {
    if let Some(stored) = &state.stored_marks {
        return stored.clone();
    }
    ResolvedPos::resolve(&state.doc, state.selection.head())
        .map(|r| r.marks(&state.schema))
        .unwrap_or_default()
}

/// Whether `[from, to)` contains any inline content that accepts marks.
fn mark_applies(doc: &Node, from: usize, to: usize) -> bool {
    let mut found = false;
    doc.nodes_between(from, to, &mut |node, _| {
        if node.node_type() == NodeType::CodeBlock {
            return false;
        }
        if node.node_type().is_inline() {
            found = true;
        }
        !found
    });
    found
}

/// True when every markable piece of `[from, to)` carries exactly `mark`.
/// Text counts when it intersects the range; inline elements only when the
/// range fully covers them, since partial coverage leaves them unpatched.
fn range_fully_marked(doc: &Node, from: usize, to: usize, mark: &Mark) -> bool {
    let mut any = false;
    let mut all = true;
    doc.nodes_between(from, to, &mut |node, pos| {
        match node.node_type() {
            NodeType::CodeBlock => return false,
            NodeType::Text => {
                any = true;
                if !node.marks().contains(mark) {
                    all = false;
                }
            }
            t if t.is_inline() && pos >= from && pos + node.node_size() <= to => {
                any = true;
                if !node.marks().contains(mark) {
                    all = false;
                }
            }
            _ => {}
        }
        all
    });
    any && all
}

fn range_has_mark_type(doc: &Node, from: usize, to: usize, mark_type: MarkType) -> bool {
    let mut found = false;
    doc.nodes_between(from, to, &mut |node, _| {
        if node.node_type().is_inline() && mark::contains_type(node.marks(), mark_type) {
            found = true;
        }
        !found
    });
    found
}
