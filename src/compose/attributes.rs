//! Trailing attribute blocks of rule bodies
//!
//! A rule body may end with a `{ key=value ... }` block. Only the production
//! text before the block is subject to reference rewriting; the block is
//! parsed into entries so that individual attributes (`pin`, `recoverWhile`,
//! `override`, `elementType`) can be handled on their own.

use super::tokens::{tokenize, Token, TokenKind};

/// One `key=value` entry of an attribute block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute name (`pin` for `pin(".*")=1`)
    pub name: String,
    /// The key as written, including a parenthesized argument
    pub key: String,
    /// The value text, trimmed
    pub value: String,
    /// The whole entry as written, trimmed
    pub text: String,
}

/// A parsed attribute block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeBlock {
    /// Entries in source order
    pub entries: Vec<Attribute>,
}

impl AttributeBlock {
    /// Parse the text between the braces of an attribute block
    pub fn parse(inner: &str) -> Self {
        let tokens = tokenize(inner);
        let mut starts: Vec<(usize, usize, usize, usize)> = Vec::new();
        let mut depth = 0usize;
        let mut i = 0;

        while i < tokens.len() {
            let token = &tokens[i];
            if depth == 0 && token.kind == TokenKind::Identifier {
                if let Some((key_end, value_start, next)) = entry_key(inner, &tokens, i) {
                    starts.push((token.span.start, token.span.end, key_end, value_start));
                    i = next;
                    continue;
                }
            }
            if token.kind == TokenKind::Symbol {
                match token.text(inner) {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }
            i += 1;
        }

        let entries = starts
            .iter()
            .enumerate()
            .map(|(n, &(start, name_end, key_end, value_start))| {
                let end = starts.get(n + 1).map_or(inner.len(), |next| next.0);
                Attribute {
                    name: inner[start..name_end].to_string(),
                    key: inner[start..key_end].trim().to_string(),
                    value: inner[value_start..end].trim().to_string(),
                    text: inner[start..end].trim().to_string(),
                }
            })
            .collect();

        Self { entries }
    }

    /// Find the first entry with the given name
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.entries.iter().find(|a| a.name == name)
    }

    /// Whether the block sets `override=true`
    pub fn override_enabled(&self) -> bool {
        self.get("override").map_or(false, |a| a.value == "true")
    }
}

/// Check whether the identifier at `i` starts a `key=` or `key(...)=` entry.
///
/// Returns the end of the key text, the start of the value and the index of
/// the first token after `=`.
fn entry_key(text: &str, tokens: &[Token], i: usize) -> Option<(usize, usize, usize)> {
    let mut j = skip_whitespace(tokens, i + 1);
    let mut key_end = tokens[i].span.end;

    if tokens.get(j).map(|t| t.text(text)) == Some("(") {
        let mut parens = 0usize;
        loop {
            let token = tokens.get(j)?;
            if token.kind == TokenKind::Symbol {
                match token.text(text) {
                    "(" => parens += 1,
                    ")" => parens -= 1,
                    _ => {}
                }
            }
            j += 1;
            if parens == 0 {
                key_end = token.span.end;
                break;
            }
        }
        j = skip_whitespace(tokens, j);
    }

    let eq = tokens.get(j)?;
    if eq.text(text) != "=" || tokens.get(j + 1).map(|t| t.text(text)) == Some("=") {
        return None;
    }
    Some((key_end, eq.span.end, j + 1))
}

fn skip_whitespace(tokens: &[Token], mut j: usize) -> usize {
    while tokens
        .get(j)
        .map_or(false, |t| t.kind == TokenKind::Whitespace)
    {
        j += 1;
    }
    j
}

/// Split a body into its production text and trailing attribute block
///
/// Returns the production (trailing whitespace removed) and the text between
/// the braces of the block, if the trimmed body ends with a balanced block.
pub fn split_trailing_block(body: &str) -> (&str, Option<&str>) {
    let trimmed = body.trim_end();
    if !trimmed.ends_with('}') {
        return (trimmed, None);
    }

    let tokens = tokenize(trimmed);
    let mut depth = 0usize;
    for token in tokens.iter().rev() {
        if token.kind != TokenKind::Symbol {
            continue;
        }
        match token.text(trimmed) {
            "}" => depth += 1,
            "{" => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                if depth == 0 {
                    let inner = &trimmed[token.span.end..trimmed.len() - 1];
                    return (trimmed[..token.span.start].trim_end(), Some(inner));
                }
            }
            _ => {}
        }
    }

    (trimmed, None)
}
