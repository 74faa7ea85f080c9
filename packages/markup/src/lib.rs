//! HTML-fragment reading and writing for editor documents.

pub mod css;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

pub use parser::parse_document;
pub use serializer::serialize_document;
pub use tokenizer::{tokenize, Token};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_round_trip() {
        let doc = parse_document("<p>hello <b>world</b></p>");
        let html = serialize_document(&doc);
        assert_eq!(
            html,
            r#"<p data-color-inherit="true">hello <b>world</b></p>"#
        );
        assert_eq!(parse_document(&html), doc);
    }
}
