//! Line scanner for BNF grammar files
//!
//! Splits raw grammar text into the header block and an ordered table of
//! rules. A rule starts on any line containing the `::=` separator: the text
//! before it is the rule name, everything after it (and every following line
//! up to the next separator) is the rule body. Bodies are opaque text here;
//! later stages only look at specific sub-patterns inside them.

use hashbrown::HashMap;
use memchr::memmem;
use std::path::Path;

use super::error::{ComposeError, Result};

/// The rule separator token
pub const RULE_SEPARATOR: &str = "::=";

/// The marker that makes a rule private
pub const PRIVATE_MARKER: &str = "private";

/// A single named production
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEntry {
    /// The rule name as written, including modifiers (`private helper`)
    pub name: String,
    /// The body text after the separator, line breaks preserved
    pub body: String,
}

impl RuleEntry {
    /// Whether the rule carries the private marker
    pub fn is_private(&self) -> bool {
        is_private_name(&self.name)
    }

    /// The rule name with the private marker stripped
    pub fn bare_name(&self) -> &str {
        bare_name(&self.name)
    }
}

/// Whether a raw rule name carries the private marker
pub fn is_private_name(name: &str) -> bool {
    name.strip_prefix(PRIVATE_MARKER)
        .map_or(false, |rest| rest.starts_with(char::is_whitespace))
}

/// Strip the private marker from a raw rule name
pub fn bare_name(name: &str) -> &str {
    if is_private_name(name) {
        name[PRIVATE_MARKER.len()..].trim_start()
    } else {
        name
    }
}

/// Ordered rule table
///
/// Iteration order is first-declaration order. Declaring a name twice keeps
/// its original position and replaces the body (last declaration wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    entries: Vec<RuleEntry>,
    index: HashMap<String, usize>,
}

impl RuleTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rule, returning `true` if it replaced an earlier declaration
    pub fn insert(&mut self, name: String, body: String) -> bool {
        if let Some(&idx) = self.index.get(&name) {
            self.entries[idx].body = body;
            return true;
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(RuleEntry { name, body });
        false
    }

    /// Look up a rule by its raw name
    pub fn get(&self, name: &str) -> Option<&RuleEntry> {
        self.index.get(name).map(|&idx| &self.entries[idx])
    }

    /// Whether a raw rule name is declared
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate rules in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &RuleEntry> {
        self.entries.iter()
    }

    /// Iterate raw rule names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Number of distinct rules
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A scanned grammar file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarSource {
    /// Header text from its opening `{` up to the line before the first rule.
    /// `None` when the text before the first rule has no `{`.
    pub header: Option<String>,
    /// Rules in first-declaration order
    pub rules: RuleTable,
    /// Raw name of the first declared rule
    pub first_rule: String,
    /// Names that were declared more than once
    pub duplicates: Vec<String>,
}

impl GrammarSource {
    /// Scan grammar text
    pub fn scan(text: &str) -> Result<Self> {
        Self::scan_impl(text, None)
    }

    /// Scan grammar text read from `path` (used for diagnostics only)
    pub fn scan_file_contents(text: &str, path: &Path) -> Result<Self> {
        Self::scan_impl(text, Some(path))
    }

    fn scan_impl(text: &str, path: Option<&Path>) -> Result<Self> {
        let finder = memmem::Finder::new(RULE_SEPARATOR);

        let mut rules = RuleTable::new();
        let mut duplicates = Vec::new();
        let mut header = None;
        let mut first_rule: Option<String> = None;
        let mut current: Option<String> = None;
        let mut body = String::new();

        for line in text.lines() {
            match finder.find(line.as_bytes()) {
                Some(idx) => {
                    let name = line[..idx].trim().to_string();
                    match current.take() {
                        Some(previous) => {
                            if rules.insert(previous.clone(), std::mem::take(&mut body)) {
                                duplicates.push(previous);
                            }
                        }
                        None => {
                            header = body.find('{').map(|open| body[open..].to_string());
                            first_rule = Some(name.clone());
                        }
                    }
                    current = Some(name);
                    body = line[idx + RULE_SEPARATOR.len()..]
                        .trim_start_matches([' ', '\t'])
                        .to_string();
                }
                None => {
                    if current.is_some() || !body.is_empty() {
                        body.push('\n');
                    }
                    body.push_str(line);
                }
            }
        }

        let (Some(current), Some(first_rule)) = (current, first_rule) else {
            return Err(ComposeError::NoRules {
                path: path.map(Path::to_path_buf),
            });
        };
        if rules.insert(current.clone(), body) {
            duplicates.push(current);
        }

        for name in &duplicates {
            log_warn!("rule `{}` is declared more than once; last declaration wins", name);
        }
        log_debug!("scanned {} rules, first rule `{}`", rules.len(), first_rule);

        Ok(Self {
            header,
            rules,
            first_rule,
            duplicates,
        })
    }
}
