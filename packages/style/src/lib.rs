//! Scoped CSS rewriting - confine user style rules to the editor container.
//!
//! Pasted stylesheets are rewritten so every selector is prefixed with the
//! editor's container class and cannot leak into the surrounding page.
//! Element selectors get a second, `[class]`-qualified copy so they win
//! over class-based resets at the same nesting depth. Selectors with a
//! descendant combinator get a companion rule that switches marked blocks
//! (`data-color-inherit`) to `color: inherit`, letting a color set on a
//! styled container cascade into the paragraphs and headings below it.
//!
//! This is a best-effort text transform, not a CSS parser: input splits on
//! `}`, `{` and `,`, rules that do not fit that shape are skipped, and no
//! input makes it fail.

use tracing::debug;

/// Rewrites a stylesheet so all rules apply only beneath `scope_class`.
pub fn scope_css(css: &str, scope_class: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for rule in css.split('}') {
        if rule.trim().is_empty() {
            continue;
        }
        let Some((selectors, body)) = rule.split_once('{') else {
            debug!(rule = rule.trim(), "skipping rule without a body");
            continue;
        };
        let body = body.trim();
        for selector in selectors.split(',') {
            let selector = selector.trim();
            if selector.is_empty() {
                continue;
            }
            if selector.starts_with('@') {
                debug!(selector, "skipping at-rule");
                continue;
            }
            out.push(format!(".{scope_class} {selector} {{ {body} }}"));
            if !selector.starts_with('.') {
                out.push(format!(".{scope_class} {selector}[class] {{ {body} }}"));
            }
            if has_descendant_combinator(selector) {
                out.push(format!(
                    ".{scope_class} {selector} [data-color-inherit=\"true\"] {{ color: inherit; }}"
                ));
            }
        }
    }
    out.join("\n")
}

/// True for selectors that target descendants (`div p`, `.card > h2`),
/// false for single compound selectors and sibling combinators.
fn has_descendant_combinator(selector: &str) -> bool {
    if selector.contains('>') {
        return true;
    }
    selector
        .split_whitespace()
        .filter(|part| !matches!(*part, ">" | "+" | "~"))
        .count()
        > 1
        && !selector.contains('+')
        && !selector.contains('~')
}
