//! Inline formatting marks.
//!
//! Marks annotate inline content without changing tree structure. A text
//! node carries an ordered set of marks; the set never holds two marks of
//! the same type, and it stays sorted by [`MarkType`] rank so two trees
//! with the same formatting compare equal.

use serde::{Deserialize, Serialize};

/// The kind of a mark, used for set membership and replacement.
///
/// The declaration order is also the canonical nesting order when marks are
/// rendered: links wrap everything else, span-backed styling sits innermost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MarkType {
    Link,
    Strong,
    Em,
    Underline,
    FontFamily,
    FontSize,
    TextColor,
    Highlight,
    Styled,
}

impl MarkType {
    /// Whether a cursor sitting at the end of this mark keeps it active for
    /// newly typed text. Links do not: typing after a link should not extend
    /// the link.
    pub fn inclusive(self) -> bool {
        !matches!(self, MarkType::Link)
    }
}

/// One inline formatting annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Mark {
    Strong,
    Em,
    Underline,
    /// Font family, e.g. `"Georgia, serif"`.
    FontFamily { family: String },
    /// Font size with its unit, e.g. `"16px"`.
    FontSize { size: String },
    /// Foreground color in any form the style attribute accepts.
    TextColor { color: String },
    /// Background highlight color.
    Highlight { color: String },
    Link {
        href: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        class: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<String>,
    },
    /// Raw style declarations that do not map onto a dedicated mark.
    Styled { style: String },
}

impl Mark {
    pub fn mark_type(&self) -> MarkType {
        match self {
            Mark::Strong => MarkType::Strong,
            Mark::Em => MarkType::Em,
            Mark::Underline => MarkType::Underline,
            Mark::FontFamily { .. } => MarkType::FontFamily,
            Mark::FontSize { .. } => MarkType::FontSize,
            Mark::TextColor { .. } => MarkType::TextColor,
            Mark::Highlight { .. } => MarkType::Highlight,
            Mark::Link { .. } => MarkType::Link,
            Mark::Styled { .. } => MarkType::Styled,
        }
    }

    pub fn link(href: impl Into<String>) -> Mark {
        Mark::Link {
            href: href.into(),
            title: None,
            class: None,
            style: None,
        }
    }

    pub fn font_size(size: impl Into<String>) -> Mark {
        Mark::FontSize { size: size.into() }
    }

    pub fn font_family(family: impl Into<String>) -> Mark {
        Mark::FontFamily {
            family: family.into(),
        }
    }

    pub fn text_color(color: impl Into<String>) -> Mark {
        Mark::TextColor {
            color: color.into(),
        }
    }

    pub fn highlight(color: impl Into<String>) -> Mark {
        Mark::Highlight {
            color: color.into(),
        }
    }
}

/// Adds `mark` to a set, replacing any existing mark of the same type and
/// keeping the set in canonical order.
pub fn add_to_set(mark: Mark, set: &[Mark]) -> Vec<Mark> {
    let mut out: Vec<Mark> = set
        .iter()
        .filter(|m| m.mark_type() != mark.mark_type())
        .cloned()
        .collect();
    out.push(mark);
    out.sort_by_key(|m| m.mark_type());
    out
}

/// Removes every mark of the given type from a set.
pub fn remove_from_set(mark_type: MarkType, set: &[Mark]) -> Vec<Mark> {
    set.iter()
        .filter(|m| m.mark_type() != mark_type)
        .cloned()
        .collect()
}

pub fn contains_type(set: &[Mark], mark_type: MarkType) -> bool {
    set.iter().any(|m| m.mark_type() == mark_type)
}

pub fn find_by_type(set: &[Mark], mark_type: MarkType) -> Option<&Mark> {
    set.iter().find(|m| m.mark_type() == mark_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_replaces_same_type() {
        let set = vec![Mark::font_size("14px"), Mark::Strong];
        let set = add_to_set(Mark::font_size("18px"), &set);
        assert_eq!(set, vec![Mark::Strong, Mark::font_size("18px")]);
    }

    #[test]
    fn canonical_order_is_stable() {
        let a = add_to_set(Mark::Strong, &[Mark::link("https://x.test")]);
        let b = add_to_set(Mark::link("https://x.test"), &[Mark::Strong]);
        assert_eq!(a, b);
        assert_eq!(a[0].mark_type(), MarkType::Link);
    }

    #[test]
    fn remove_is_type_wide() {
        let set = vec![Mark::Em, Mark::text_color("red")];
        assert_eq!(remove_from_set(MarkType::TextColor, &set), vec![Mark::Em]);
    }

    #[test]
    fn link_is_not_inclusive() {
        assert!(!MarkType::Link.inclusive());
        assert!(MarkType::Strong.inclusive());
    }
}
