//! Minimal inline-style handling: splitting `style` attribute text into
//! declarations and putting it back together. Good enough for the
//! declarations the editor itself writes; anything unrecognized is carried
//! through untouched as raw text.

/// Splits `"color: red; font-size: 16px"` into lowercased property /
/// trimmed value pairs. Declarations without a colon are dropped.
pub fn split_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim().to_string();
            if prop.is_empty() || value.is_empty() {
                None
            } else {
                Some((prop, value))
            }
        })
        .collect()
}

/// The value of one property inside a style string, if present.
pub fn get_declaration(style: &str, prop: &str) -> Option<String> {
    split_declarations(style)
        .into_iter()
        .find(|(p, _)| p == prop)
        .map(|(_, v)| v)
}

/// Joins declarations back into `prop: value; prop: value;` form.
pub fn join_declarations(decls: &[(String, String)]) -> String {
    let mut out = String::new();
    for (prop, value) in decls {
        out.push_str(prop);
        out.push_str(": ");
        out.push_str(value);
        out.push(';');
        out.push(' ');
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_normalizes() {
        let decls = split_declarations("Color:red; font-size : 16px ;;bad");
        assert_eq!(
            decls,
            vec![
                ("color".to_string(), "red".to_string()),
                ("font-size".to_string(), "16px".to_string()),
            ]
        );
    }

    #[test]
    fn lookup_single_property() {
        assert_eq!(
            get_declaration("background-color: #fee; color: black", "background-color"),
            Some("#fee".to_string())
        );
        assert_eq!(get_declaration("color: black", "width"), None);
    }

    #[test]
    fn join_round_trips() {
        let decls = vec![("width".to_string(), "300px".to_string())];
        assert_eq!(join_declarations(&decls), "width: 300px;");
    }
}
