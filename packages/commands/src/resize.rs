//! Image resize drags.

use vellum_model::{EditorState, NodeType, Step, Transaction};

/// Images never shrink below this width during a drag.
pub const RESIZE_MIN_WIDTH: i64 = 60;

/// A live resize drag on a single image. The drag captures the image's
/// width and the pointer's x at the start; every later pointer position
/// maps to a one-step transaction against that baseline, so moves do not
/// stack and the last one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeDrag {
    image_pos: usize,
    start_width: i64,
    start_x: i64,
}

impl ResizeDrag {
    /// Starts a drag on the image at `image_pos`. `rendered_width` is the
    /// width the host currently displays; it is the baseline when the
    /// image has no explicit width yet. `None` when no image starts at
    /// the position.
    pub fn begin(
        state: &EditorState,
        image_pos: usize,
        start_x: i64,
        rendered_width: i64,
    ) -> Option<ResizeDrag> {
        let node = state.doc.node_at(image_pos)?;
        if node.node_type() != NodeType::Image {
            return None;
        }
        let attr_width = state.schema.attr_int(node, "width").unwrap_or(0);
        Some(ResizeDrag {
            image_pos,
            start_width: if attr_width > 0 {
                attr_width
            } else {
                rendered_width
            },
            start_x,
        })
    }

    pub fn image_pos(&self) -> usize {
        self.image_pos
    }

    /// Width the image gets with the pointer at `x`, clamped to
    /// [`RESIZE_MIN_WIDTH`].
    pub fn width_at(&self, x: i64) -> i64 {
        (self.start_width + (x - self.start_x)).max(RESIZE_MIN_WIDTH)
    }

    /// Transaction for the pointer sitting at `x`.
    pub fn move_to(&self, x: i64) -> Transaction {
        Transaction::new().step(Step::SetNodeAttr {
            pos: self.image_pos,
            name: "width".to_string(),
            value: self.width_at(x).into(),
        })
    }
}
