//! Editing commands over a [`vellum_model`] state.
//!
//! Every command is a pure function from a state (plus arguments) to an
//! optional [`Transaction`](vellum_model::Transaction): `None` means the
//! command does not apply at the current selection. Commands never mutate
//! the state they inspect, and structural commands trial-apply their
//! transaction before returning it, so a `Some` result will not be
//! rejected by [`EditorState::apply`](vellum_model::EditorState::apply).

mod utils;

pub mod blocks;
pub mod marks;
pub mod media;
pub mod resize;
pub mod tables;

pub use blocks::{
    set_block_type, set_code_block, set_heading, set_paragraph, set_text_align,
    wrap_in_blockquote, wrap_in_list,
};
pub use marks::{
    clamp_font_size, insert_link, remove_mark, set_font_family, set_font_size, toggle_mark,
    FONT_SIZE_MAX, FONT_SIZE_MIN,
};
pub use media::{import_html, insert_button, insert_image};
pub use resize::{ResizeDrag, RESIZE_MIN_WIDTH};
pub use tables::{
    add_column_after, add_column_before, add_row_after, add_row_before, delete_column,
    delete_row, insert_table, merge_cells, split_cell, toggle_header_cell,
};
