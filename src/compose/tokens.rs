//! Flat tokenizer for rule bodies
//!
//! Rule bodies stay opaque text, but reference rewriting must not touch
//! identifiers inside string literals or comments. The tokenizer splits a body
//! into a flat stream of identifiers, literals, comments and everything else,
//! and rewriting then works token by token. Concatenating every token's text
//! reproduces the input exactly.

use std::ops::Range;

/// Kind of a body token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `[A-Za-z_][A-Za-z0-9_]*`
    Identifier,
    /// A quoted string, single or double quotes, backslash escapes
    Literal,
    /// `// ...` up to (not including) the line break
    LineComment,
    /// `/* ... */`
    BlockComment,
    /// Spaces, tabs and line breaks
    Whitespace,
    /// A run of digits and trailing word characters
    Number,
    /// Any other single character
    Symbol,
}

/// A token with its byte range in the body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token kind
    pub kind: TokenKind,
    /// Byte range into the tokenized text
    pub span: Range<usize>,
}

impl Token {
    /// The token text
    #[inline]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }
}

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

#[inline]
fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Tokenize a rule body
pub fn tokenize(text: &str) -> Vec<Token> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let b = bytes[pos];

        let kind = if is_ident_start(b) {
            pos += 1;
            while pos < bytes.len() && is_ident_continue(bytes[pos]) {
                pos += 1;
            }
            TokenKind::Identifier
        } else if b.is_ascii_digit() {
            pos += 1;
            while pos < bytes.len() && is_ident_continue(bytes[pos]) {
                pos += 1;
            }
            TokenKind::Number
        } else if b == b'\'' || b == b'"' {
            pos += 1;
            while pos < bytes.len() && bytes[pos] != b {
                if bytes[pos] == b'\\' {
                    pos += 1;
                }
                pos += 1;
            }
            pos = (pos + 1).min(bytes.len());
            TokenKind::Literal
        } else if bytes[pos..].starts_with(b"//") {
            pos = memchr::memchr(b'\n', &bytes[pos..]).map_or(bytes.len(), |n| pos + n);
            TokenKind::LineComment
        } else if bytes[pos..].starts_with(b"/*") {
            pos = memchr::memmem::find(&bytes[pos + 2..], b"*/").map_or(bytes.len(), |n| pos + 2 + n + 2);
            TokenKind::BlockComment
        } else if b.is_ascii_whitespace() {
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            TokenKind::Whitespace
        } else {
            // Advance a whole UTF-8 character
            pos += text[pos..].chars().next().map_or(1, char::len_utf8);
            TokenKind::Symbol
        };

        tokens.push(Token {
            kind,
            span: start..pos,
        });
    }

    tokens
}

/// Rewrite identifier tokens
///
/// `replace` is called for every identifier; returning `Some` substitutes the
/// token text, `None` keeps it. All other tokens are copied unchanged.
pub fn rewrite_identifiers<F>(text: &str, mut replace: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut output = String::with_capacity(text.len() * 2);
    for token in tokenize(text) {
        let slice = token.text(text);
        match token.kind {
            TokenKind::Identifier => match replace(slice) {
                Some(replacement) => output.push_str(&replacement),
                None => output.push_str(slice),
            },
            _ => output.push_str(slice),
        }
    }
    output
}

/// Rewrite `{name}` external rule references
///
/// Only a brace, a single identifier and a closing brace with nothing in
/// between count as an external reference; attribute blocks never match.
pub fn rewrite_external_refs<F>(text: &str, mut replace: F) -> String
where
    F: FnMut(&str) -> String,
{
    let tokens = tokenize(text);
    let mut output = String::with_capacity(text.len());
    let mut i = 0;

    while i < tokens.len() {
        if let [open, ident, close, ..] = &tokens[i..] {
            if open.text(text) == "{"
                && ident.kind == TokenKind::Identifier
                && close.text(text) == "}"
            {
                output.push_str(&replace(ident.text(text)));
                i += 3;
                continue;
            }
        }
        output.push_str(tokens[i].text(text));
        i += 1;
    }

    output
}

/// Whether the last significant token of `text` is a line comment
pub fn ends_with_line_comment(text: &str) -> bool {
    tokenize(text)
        .iter()
        .rev()
        .find(|t| t.kind != TokenKind::Whitespace)
        .map_or(false, |t| t.kind == TokenKind::LineComment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokens_cover_input() {
        let text = "a_b 'lit b' | <<meta c>> /* b */ // b\n  d?";
        let joined: String = tokenize(text).iter().map(|t| t.text(text)).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn test_token_kinds() {
        use TokenKind::*;
        assert_eq!(
            kinds("a 'x' 12 |"),
            vec![Identifier, Whitespace, Literal, Whitespace, Number, Whitespace, Symbol]
        );
        assert_eq!(kinds("\"a\\\"b\""), vec![Literal]);
        assert_eq!(kinds("// c\nx"), vec![LineComment, Whitespace, Identifier]);
    }

    #[test]
    fn test_rewrite_skips_literals_and_comments() {
        let text = "b 'b' \"b\" /* b */ b_c b";
        let out = rewrite_identifiers(text, |id| (id == "b").then(|| "X".to_string()));
        assert_eq!(out, "X 'b' \"b\" /* b */ b_c X");
    }

    #[test]
    fn test_rewrite_adjacent_references() {
        let out = rewrite_identifiers("a a a", |id| Some(format!("<{}>", id)));
        assert_eq!(out, "<a> <a> <a>");
    }

    #[test]
    fn test_external_refs() {
        let out = rewrite_external_refs("x {ext} { pin=1 } {}", |name| format!("[{}]", name));
        assert_eq!(out, "x [ext] { pin=1 } {}");
    }

    #[test]
    fn test_ends_with_line_comment() {
        assert!(ends_with_line_comment("a b // note\n"));
        assert!(!ends_with_line_comment("a b // note\n c"));
        assert!(!ends_with_line_comment("a '//'"));
    }

    #[test]
    fn test_unicode_symbols() {
        let text = "a → b";
        let joined: String = tokenize(text).iter().map(|t| t.text(text)).collect();
        assert_eq!(joined, text);
    }
}
