//! # Vellum Model
//!
//! The typed document tree at the core of the editor, plus the machinery
//! for changing it safely:
//!
//! ```text
//! Schema ──describes──▶ Node tree ──resolved by──▶ positions/selections
//!                          ▲
//!                          │ validated, atomic
//!                     Transaction (steps)
//! ```
//!
//! Design principles:
//! - The tree is plain data: cloneable, serializable, no interior mutability
//! - Every structural change flows through a [`Transaction`]; a transaction
//!   that would leave the tree violating its content model is rejected whole
//! - Positions are integer offsets into a flattened token sequence, so ranges
//!   survive serialization and can be reasoned about without DOM handles

pub mod attrs;
pub mod mark;
pub mod node;
pub mod pos;
pub mod schema;
pub mod selection;
pub mod state;
pub mod transform;

pub use attrs::{AttrValue, Attrs};
pub use mark::{Mark, MarkType};
pub use node::{Group, Node, NodeType};
pub use pos::{BlockRange, ResolvedPos};
pub use schema::{ContentExpr, ContentMatch, NodeSpec, Repeat, Schema};
pub use selection::Selection;
pub use state::EditorState;
pub use transform::{Step, Transaction, TransformError};
