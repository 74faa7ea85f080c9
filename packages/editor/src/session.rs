//! # Edit Session Management
//!
//! One user's live editing surface. The session owns the editor state and
//! everything stateful that sits between commands and the host: the log of
//! applied transactions, the single allowed image-resize drag, and the
//! scoped custom-CSS register. Hosts feed it selections and pointer
//! positions and read back HTML and CSS text.

use tracing::{debug, warn};

use vellum_assets::ByteStore;
use vellum_commands::{self as commands, ResizeDrag};
use vellum_markup::{parse_document, serialize_document};
use vellum_model::{EditorState, Selection, Transaction};
use vellum_style::scope_css;

use crate::errors::EditorError;

/// Container class custom CSS is confined to when none is given.
pub const DEFAULT_SCOPE_CLASS: &str = "vellum-editor-content";

/// An asset picked by the host, by stored key or literal location.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRef {
    pub url: String,
    pub name: String,
}

/// Resolves an asset location: a byte-store hit wins, a miss falls back
/// to the literal value so external URLs keep working.
pub fn resolve_asset(bytes: &dyn ByteStore, url: &str) -> String {
    bytes.get(url).unwrap_or_else(|| url.to_owned())
}

/// Single edit session over one document.
pub struct EditSession {
    state: EditorState,
    log: Vec<Transaction>,
    resize: Option<ResizeDrag>,
    scope_class: String,
    scoped_css: String,
}

impl EditSession {
    /// An empty session scoped under [`DEFAULT_SCOPE_CLASS`].
    pub fn new() -> Self {
        Self::with_scope_class(DEFAULT_SCOPE_CLASS)
    }

    /// An empty session whose custom CSS is confined to `scope_class`.
    pub fn with_scope_class(scope_class: &str) -> Self {
        Self {
            state: EditorState::empty(),
            log: Vec::new(),
            resize: None,
            scope_class: scope_class.to_owned(),
            scoped_css: String::new(),
        }
    }

    /// A session over parsed markup.
    pub fn from_html(html: &str) -> Result<Self, EditorError> {
        let state = EditorState::new(parse_document(html))?;
        let mut session = Self::new();
        session.state = state;
        Ok(session)
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.state.set_selection(selection);
    }

    /// Applied transactions, oldest first, for hosts that build their own
    /// history on top.
    pub fn transaction_log(&self) -> &[Transaction] {
        &self.log
    }

    /// Runs a command against the current state and applies its
    /// transaction when one is produced. Returns whether anything changed.
    pub fn run(&mut self, command: impl FnOnce(&EditorState) -> Option<Transaction>) -> bool {
        let Some(tr) = command(&self.state) else {
            return false;
        };
        let applied = self.dispatch(tr);
        if applied {
            // an edit from outside the drag invalidates its anchor
            self.resize = None;
        }
        applied
    }

    /// The current document as HTML.
    pub fn export_html(&self) -> String {
        serialize_document(&self.state.doc)
    }

    /// Replaces the whole document with parsed markup. Blank input is
    /// refused.
    pub fn import_html(&mut self, html: &str) -> bool {
        self.run(|_| commands::import_html(html))
    }

    /// Replaces the selection with an image showing `asset`, resolved
    /// through the byte store.
    pub fn insert_image(&mut self, bytes: &dyn ByteStore, asset: &AssetRef) -> bool {
        let src = resolve_asset(bytes, &asset.url);
        self.run(|state| commands::insert_image(state, &src, &asset.name))
    }

    /// Links the selected text to `asset`'s resolved location.
    pub fn insert_link(&mut self, bytes: &dyn ByteStore, asset: &AssetRef) -> bool {
        let href = resolve_asset(bytes, &asset.url);
        self.run(|state| commands::insert_link(state, &href, &href))
    }

    /// Starts an image-resize drag. Only one drag may be live at a time;
    /// a second begin is refused until [`Self::end_resize`].
    pub fn begin_resize(
        &mut self,
        image_pos: usize,
        pointer_x: i64,
        rendered_width: i64,
    ) -> Result<(), EditorError> {
        if self.resize.is_some() {
            return Err(EditorError::ResizeActive);
        }
        let drag = ResizeDrag::begin(&self.state, image_pos, pointer_x, rendered_width)
            .ok_or(EditorError::NoImage(image_pos))?;
        self.resize = Some(drag);
        Ok(())
    }

    /// Applies one pointer-move frame of the active drag.
    pub fn resize_to(&mut self, pointer_x: i64) -> bool {
        let Some(drag) = self.resize else {
            debug!("resize_to without an active drag");
            return false;
        };
        self.dispatch(drag.move_to(pointer_x))
    }

    /// Ends the drag, releasing ownership. Returns whether one was live.
    pub fn end_resize(&mut self) -> bool {
        self.resize.take().is_some()
    }

    pub fn resize_active(&self) -> bool {
        self.resize.is_some()
    }

    /// Rewrites raw CSS under the session's scope class and retains the
    /// result for the host's style element.
    pub fn set_custom_css(&mut self, css: &str) {
        self.scoped_css = scope_css(css, &self.scope_class);
    }

    pub fn scoped_css(&self) -> &str {
        &self.scoped_css
    }

    pub fn scope_class(&self) -> &str {
        &self.scope_class
    }

    fn dispatch(&mut self, tr: Transaction) -> bool {
        match self.state.apply(&tr) {
            Ok(()) => {
                self.log.push(tr);
                true
            }
            Err(err) => {
                warn!(%err, "transaction rejected");
                false
            }
        }
    }
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use vellum_assets::MemoryByteStore;
    use vellum_model::Mark;

    use super::*;

    fn session_with(html: &str) -> EditSession {
        EditSession::from_html(html).unwrap()
    }

    #[test]
    fn run_applies_and_logs_commands() {
        let mut session = session_with("<p>hello</p>");
        session.set_selection(Selection::text(1, 6));
        assert!(session.run(|s| commands::toggle_mark(s, Mark::Strong)));
        assert_eq!(session.transaction_log().len(), 1);
        assert_eq!(
            session.export_html(),
            r#"<p data-color-inherit="true"><b>hello</b></p>"#
        );
    }

    #[test]
    fn inapplicable_commands_change_nothing() {
        let mut session = session_with("<p>hello</p>");
        session.set_selection(Selection::caret(1));
        assert!(!session.run(|s| commands::insert_link(s, "https://a", "https://a")));
        assert!(session.transaction_log().is_empty());
    }

    #[test]
    fn second_resize_begin_is_refused() {
        let mut session = session_with(r#"<p><img src="pic.png" width="100"></p>"#);
        session.begin_resize(1, 10, 100).unwrap();
        assert!(matches!(
            session.begin_resize(1, 20, 100),
            Err(EditorError::ResizeActive)
        ));
        assert!(session.end_resize());
        assert!(!session.end_resize());
        session.begin_resize(1, 30, 100).unwrap();
        assert!(session.resize_active());
    }

    #[test]
    fn begin_resize_needs_an_image() {
        let mut session = session_with("<p>words</p>");
        assert!(matches!(
            session.begin_resize(1, 0, 100),
            Err(EditorError::NoImage(1))
        ));
    }

    #[test]
    fn moves_without_a_drag_are_ignored() {
        let mut session = session_with(r#"<p><img src="pic.png" width="100"></p>"#);
        assert!(!session.resize_to(50));
        assert!(session.transaction_log().is_empty());
    }

    #[test]
    fn an_outside_edit_cancels_the_drag() {
        let mut session = session_with(r#"<p><img src="pic.png" width="100">abc</p>"#);
        session.begin_resize(1, 0, 100).unwrap();
        session.set_selection(Selection::text(2, 5));
        assert!(session.run(|s| commands::toggle_mark(s, Mark::Em)));
        assert!(!session.resize_active());
        assert!(!session.resize_to(40));
    }

    #[test]
    fn resolve_prefers_the_byte_store() {
        let bytes = MemoryByteStore::new();
        bytes.put("asset-1-pic.png", "data:image/png;base64,AA==");
        assert_eq!(
            resolve_asset(&bytes, "asset-1-pic.png"),
            "data:image/png;base64,AA=="
        );
        assert_eq!(
            resolve_asset(&bytes, "https://example.com/pic.png"),
            "https://example.com/pic.png"
        );
    }

    #[test]
    fn custom_css_is_scoped_and_retained() {
        let mut session = EditSession::new();
        assert_eq!(session.scoped_css(), "");
        session.set_custom_css(".note { color: red; }");
        assert_eq!(
            session.scoped_css(),
            ".vellum-editor-content .note { color: red; }"
        );

        let mut custom = EditSession::with_scope_class("sandbox");
        custom.set_custom_css(".note { color: red; }");
        assert_eq!(custom.scoped_css(), ".sandbox .note { color: red; }");
    }

    #[test]
    fn blank_import_is_refused() {
        let mut session = session_with("<p>keep</p>");
        assert!(!session.import_html("   "));
        assert_eq!(
            session.export_html(),
            r#"<p data-color-inherit="true">keep</p>"#
        );
        assert!(session.import_html("<h1>new</h1>"));
        assert_eq!(
            session.export_html(),
            r#"<h1 data-color-inherit="true">new</h1>"#
        );
    }
}
