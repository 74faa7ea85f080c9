use logos::Logos;

/// Token types for HTML fragments.
///
/// The stream is fully tolerant: anything the lexer cannot shape into a
/// tag, comment, or doctype comes back as text, so tokenizing never fails.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // A complete open (or self-closing) tag, attributes included. Quoted
    // attribute values may contain '>' so they are matched as units.
    #[regex(r#"<[a-zA-Z][^<>"']*("[^"]*"[^<>"']*|'[^']*'[^<>"']*)*>"#, |lex| lex.slice())]
    OpenTag(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9:-]*[ \t\n\r]*>", |lex| lex.slice())]
    CloseTag(&'src str),

    #[regex(r"<!--([^-]|-[^-]|--[^>])*-*-->")]
    Comment,

    #[regex(r"<![^>]*>")]
    Doctype,

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

/// Tokenize an HTML fragment. Slices the lexer rejects (stray `<`,
/// malformed tags) are folded back into the stream as text.
pub fn tokenize(source: &str) -> Vec<(Token, std::ops::Range<usize>)> {
    let lexer = Token::lexer(source);
    lexer
        .spanned()
        .map(|(result, span)| {
            let token = match result {
                Ok(token) => token,
                Err(()) => Token::Text(&source[span.clone()]),
            };
            (token, span)
        })
        .collect()
}

/// An open tag taken apart: lowercased name, decoded attributes in source
/// order, and whether the tag closed itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTag {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub self_closing: bool,
}

impl RawTag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Splits an `OpenTag` slice into name and attributes. The input is known
/// to be `<name ...>` shaped because the lexer produced it.
pub fn parse_open_tag(slice: &str) -> RawTag {
    let inner = slice
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim_end();
    let self_closing = inner.ends_with('/');
    let inner = inner.trim_end_matches('/').trim_end();
    let chars: Vec<char> = inner.chars().collect();
    let mut i = 0usize;

    let mut name = String::new();
    while i < chars.len() && !chars[i].is_whitespace() {
        name.push(chars[i].to_ascii_lowercase());
        i += 1;
    }

    let mut attrs = Vec::new();
    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }
        let mut attr_name = String::new();
        while i < chars.len() && !chars[i].is_whitespace() && chars[i] != '=' {
            attr_name.push(chars[i].to_ascii_lowercase());
            i += 1;
        }
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        let mut value = String::new();
        if i < chars.len() && chars[i] == '=' {
            i += 1;
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            if i < chars.len() && (chars[i] == '"' || chars[i] == '\'') {
                let quote = chars[i];
                i += 1;
                while i < chars.len() && chars[i] != quote {
                    value.push(chars[i]);
                    i += 1;
                }
                i += 1; // past the closing quote
            } else {
                while i < chars.len() && !chars[i].is_whitespace() {
                    value.push(chars[i]);
                    i += 1;
                }
            }
        }
        if !attr_name.is_empty() {
            attrs.push((attr_name, decode_entities(&value)));
        }
    }

    RawTag {
        name,
        attrs,
        self_closing,
    }
}

/// The element name of a `CloseTag` slice, lowercased.
pub fn parse_close_tag(slice: &str) -> String {
    slice
        .trim_start_matches("</")
        .trim_end_matches('>')
        .trim()
        .to_ascii_lowercase()
}

/// Decodes the named and numeric character references that show up in
/// editor-produced markup. Unknown references pass through literally.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail.find(';') {
            Some(end) if end <= 12 => {
                let entity = &tail[1..end];
                let decoded = match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => {
                        if let Some(num) = entity.strip_prefix("#x").or(entity.strip_prefix("#X"))
                        {
                            u32::from_str_radix(num, 16).ok().and_then(char::from_u32)
                        } else if let Some(num) = entity.strip_prefix('#') {
                            num.parse::<u32>().ok().and_then(char::from_u32)
                        } else {
                            None
                        }
                    }
                };
                match decoded {
                    Some(c) => {
                        out.push(c);
                        rest = &tail[end + 1..];
                    }
                    None => {
                        out.push('&');
                        rest = &tail[1..];
                    }
                }
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
