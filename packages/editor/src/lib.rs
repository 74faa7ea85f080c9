//! # Vellum Editor
//!
//! Host-facing integration surface for the document engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ markup: HTML text ⇄ document tree           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditSession                         │
//! │  - owns the EditorState + transaction log   │
//! │  - dispatches commands                      │
//! │  - resolves asset references                │
//! │  - owns the single image-resize drag        │
//! │  - retains scoped custom CSS                │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ host: DOM rendering, pointers, storage      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The session never touches a real DOM. Hosts feed it selections and
//! pointer positions, run commands through [`EditSession::run`], and read
//! back HTML, scoped CSS, and the transaction log.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vellum_commands::insert_table;
//! use vellum_editor::EditSession;
//! use vellum_model::Selection;
//!
//! let mut session = EditSession::from_html("<p>hello</p>")?;
//! session.set_selection(Selection::text(1, 6));
//! session.run(insert_table);
//! let html = session.export_html();
//! ```

mod errors;
mod session;

pub use errors::EditorError;
pub use session::{resolve_asset, AssetRef, EditSession, DEFAULT_SCOPE_CLASS};
