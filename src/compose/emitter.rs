//! Output emitter
//!
//! Reassembles the composed grammar: a synthesized header followed by the
//! root/extendable block and the unextendable block, each separated by one
//! blank line.

use regex::Regex;
use std::fmt::Write;
use std::sync::OnceLock;

use super::layout::GrammarNames;
use super::rewrite::{ImportSet, RewrittenRule};

static PARSER_UTIL_DIRECTIVE: OnceLock<Regex> = OnceLock::new();
static PARSER_IMPORTS_OPEN: OnceLock<Regex> = OnceLock::new();

fn parser_util_directive() -> &'static Regex {
    PARSER_UTIL_DIRECTIVE.get_or_init(|| {
        Regex::new(r#"parserUtilClass\s*=\s*"[^"]*""#).expect("directive pattern is valid")
    })
}

fn parser_imports_open() -> &'static Regex {
    PARSER_IMPORTS_OPEN
        .get_or_init(|| Regex::new(r"parserImports\s*=\s*\[").expect("directive pattern is valid"))
}

/// Build the composed grammar's header
///
/// The original `parserUtilClass` directive is removed and the generated
/// class and package directives are injected first. Imports not already
/// listed in `existing_imports` are merged into an existing `parserImports`
/// list, or a new list is synthesized when the header has none.
pub fn emit_header(
    header: Option<&str>,
    names: &GrammarNames,
    imports: &ImportSet,
    existing_imports: &[String],
) -> String {
    let body = strip_opening_brace(header.unwrap_or("{\n}"));
    let body = remove_parser_util_class(body);

    let new_imports: Vec<&str> = imports
        .iter()
        .filter(|i| !existing_imports.iter().any(|e| e.as_str() == *i))
        .collect();

    let mut output = String::from("{\n");
    let _ = writeln!(output, "  parserUtilClass=\"{}\"", names.dispatch_module());
    let _ = writeln!(output, "  parserClass=\"{}\"", names.parser_class());
    let _ = writeln!(output, "  elementTypeHolderClass=\"{}\"", names.element_holder());
    let _ = writeln!(output, "  psiPackage=\"{}\"", names.psi_package());
    let _ = writeln!(output, "  psiImplPackage=\"{}\"", names.psi_impl_package());

    match parser_imports_open().find(&body) {
        Some(open) => {
            output.push_str(&body[..open.end()]);
            for import in &new_imports {
                let _ = write!(output, "\n    \"{}\"", import);
            }
            output.push_str(&body[open.end()..]);
        }
        None => {
            if !new_imports.is_empty() {
                output.push_str("  parserImports=[\n");
                for import in &new_imports {
                    let _ = writeln!(output, "    \"{}\"", import);
                }
                output.push_str("  ]\n");
            }
            output.push_str(&body);
        }
    }

    let trimmed = output.trim_end().len();
    output.truncate(trimmed);
    output.push('\n');
    output
}

/// The header text after its opening `{`, starting on the next line when the
/// brace stands alone
fn strip_opening_brace(header: &str) -> &str {
    let rest = header
        .find('{')
        .map_or(header, |open| &header[open + 1..]);
    let first_line_end = rest.find('\n').map_or(rest.len(), |n| n + 1);
    if rest[..first_line_end].trim().is_empty() {
        &rest[first_line_end..]
    } else {
        rest
    }
}

fn remove_parser_util_class(body: &str) -> String {
    let mut output = String::with_capacity(body.len());
    for line in body.split_inclusive('\n') {
        if !parser_util_directive().is_match(line) {
            output.push_str(line);
            continue;
        }
        let stripped = parser_util_directive().replace_all(line, "");
        if !stripped.trim().is_empty() {
            output.push_str(&stripped);
        }
    }
    output
}

/// Join header, root rule and rule blocks into the composed grammar
pub fn emit_grammar(
    header: &str,
    root_rule: &str,
    extendable: &[RewrittenRule],
    unextendable: &[RewrittenRule],
) -> String {
    let capacity = header.len()
        + root_rule.len()
        + extendable
            .iter()
            .chain(unextendable)
            .map(|r| r.text.len())
            .sum::<usize>()
        + 2;
    let mut output = String::with_capacity(capacity);

    output.push_str(header);
    output.push('\n');
    output.push_str(root_rule);
    for rule in extendable {
        output.push_str(&rule.text);
    }
    if !unextendable.is_empty() {
        output.push('\n');
        for rule in unextendable {
            output.push_str(&rule.text);
        }
    }
    output
}
