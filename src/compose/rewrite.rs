//! Rule rewriting
//!
//! Extendable and private rules are emitted as a pair: a `fake` documentation
//! rule carrying the body as written, and a `<name>_real` rule whose
//! references go through the override-aware accessors. Rules fixed by a
//! subclass pattern are emitted once, with references pointing straight at
//! the real productions.
//!
//! Reference policy inside an extendable or private rule:
//! - private rule `p` → `p_real`
//! - extendable rule `r` → `<<rExt r_real>>`
//! - anything else is left alone
//!
//! External references `{ext}` become `<<extExt <<ext_real>>>>` and register
//! an import of the parent dispatch module's accessor.

use hashbrown::HashSet;
use std::fmt::Write;

use super::attributes::{split_trailing_block, Attribute, AttributeBlock};
use super::classify::{Classification, RuleKind};
use super::naming::{real_rule_name, ClassName, NamingAuthority};
use super::scanner::RuleEntry;
use super::tokens::{ends_with_line_comment, rewrite_external_refs, rewrite_identifiers};

/// Name of the synthesized entry rule
pub const ROOT_RULE: &str = "root";

/// Attributes consumed by the composer and never forwarded to the real rule
const CONSUMED_ATTRIBUTES: [&str; 4] = ["elementType", "pin", "recoverWhile", "override"];

/// Insertion-ordered, deduplicated import list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl ImportSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an import, returning `false` if it was already present
    pub fn insert(&mut self, import: impl Into<String>) -> bool {
        let import = import.into();
        if self.seen.contains(&import) {
            return false;
        }
        self.seen.insert(import.clone());
        self.order.push(import);
        true
    }

    /// Whether an import is present
    pub fn contains(&self, import: &str) -> bool {
        self.seen.contains(import)
    }

    /// Imports in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of imports
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// A rule after rewriting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenRule {
    /// Raw rule name, modifiers included
    pub name: String,
    /// Bare rule name
    pub bare: String,
    /// How the rule was composed
    pub kind: RuleKind,
    /// The emitted grammar text, newline terminated
    pub text: String,
    /// Whether the body set `override=true`
    pub override_enabled: bool,
}

/// Rewrites rule bodies for one grammar
pub struct RuleRewriter<'a> {
    classification: &'a Classification,
    naming: &'a NamingAuthority,
    parent: Option<&'a ClassName>,
    imports: ImportSet,
}

impl<'a> RuleRewriter<'a> {
    /// Create a rewriter
    ///
    /// `parent` is the parent parser class from `overrides="..."`; when set,
    /// its static members are imported first.
    pub fn new(
        classification: &'a Classification,
        naming: &'a NamingAuthority,
        parent: Option<&'a ClassName>,
    ) -> Self {
        let mut imports = ImportSet::new();
        if let Some(parent) = parent {
            imports.insert(format!("static {}.*", parent));
        }
        Self {
            classification,
            naming,
            parent,
            imports,
        }
    }

    /// Imports registered so far
    pub fn imports(&self) -> &ImportSet {
        &self.imports
    }

    /// Consume the rewriter, returning the registered imports
    pub fn into_imports(self) -> ImportSet {
        self.imports
    }

    /// Render a reference through the extendable policy
    pub fn reference(&self, bare: &str) -> Option<String> {
        match self.classification.reference_kind(bare)? {
            RuleKind::Private => Some(real_rule_name(bare)),
            RuleKind::Extendable => Some(format!(
                "<<{} {}>>",
                self.naming.accessor(bare),
                real_rule_name(bare)
            )),
            RuleKind::Subclass => None,
        }
    }

    /// Render a reference through the subclass policy
    fn direct_reference(&self, bare: &str) -> Option<String> {
        self.classification
            .reference_kind(bare)
            .filter(|kind| kind.has_real_production())
            .map(|_| real_rule_name(bare))
    }

    /// Rewrite every local rule reference in `text`
    pub fn rewrite_references(&self, text: &str) -> String {
        rewrite_identifiers(text, |id| self.reference(id))
    }

    fn rewrite_direct_references(&self, text: &str) -> String {
        rewrite_identifiers(text, |id| self.direct_reference(id))
    }

    /// Replace `{ext}` references, registering their imports
    pub fn replace_external_refs(&mut self, text: &str) -> String {
        let naming = self.naming;
        let parent_util = self.parent.map(|p| p.with_suffix("Util"));
        let mut registered = Vec::new();

        let rewritten = rewrite_external_refs(text, |name| {
            let accessor = naming.accessor(name);
            match &parent_util {
                Some(util) => registered.push(format!("static {}.{}", util, accessor)),
                None => {
                    log_warn!(
                        "external rule `{{{}}}` referenced without an `overrides` parent; no import registered",
                        name
                    );
                }
            }
            format!("<<{} <<{}>>>>", accessor, real_rule_name(name))
        });

        for import in registered {
            self.imports.insert(import);
        }
        rewritten
    }

    /// The synthesized entry rule for the first declared rule
    pub fn root_rule(&self, first_rule_bare: &str) -> String {
        let target = self
            .reference(first_rule_bare)
            .unwrap_or_else(|| first_rule_bare.to_string());
        format!("{} ::= {}\n", ROOT_RULE, target)
    }

    /// Emit the documentation rule and real rule for an extendable or private rule
    pub fn rewrite_overridable(&mut self, entry: &RuleEntry, kind: RuleKind) -> RewrittenRule {
        let bare = entry.bare_name().to_string();
        let body = self.replace_external_refs(&entry.body);
        let body = body.trim_end();
        let (production, block) = split_trailing_block(body);
        let attributes = block.map(AttributeBlock::parse).unwrap_or_default();

        let mut text = String::new();
        let _ = writeln!(text, "fake {} ::= {}", entry.name, body);

        let production = self.rewrite_references(production);
        let _ = write!(text, "{}{} ::= {}", entry.name, super::naming::REAL_SUFFIX, production);
        text.push_str(block_opener(&production));

        let _ = writeln!(text, "  elementType = {}", bare);
        if let Some(pin) = attributes.get("pin") {
            let _ = writeln!(text, "  {}", pin.text);
        }
        if let Some(recover) = attributes.get("recoverWhile") {
            let _ = writeln!(
                text,
                "  recoverWhile={}",
                self.rewrite_references(&recover.value)
            );
        }
        for attribute in preserved(&attributes) {
            let _ = writeln!(text, "  {}", attribute.text);
        }
        text.push_str("}\n");

        RewrittenRule {
            name: entry.name.clone(),
            bare,
            kind,
            text,
            override_enabled: attributes.override_enabled(),
        }
    }

    /// Emit a rule fixed by a subclass pattern
    pub fn rewrite_subclass(&mut self, entry: &RuleEntry) -> RewrittenRule {
        let body = self.replace_external_refs(&entry.body);
        let (production, block) = split_trailing_block(&body);
        let attributes = block.map(AttributeBlock::parse);

        let production = self.rewrite_direct_references(production);
        let mut text = format!("{} ::= {}", entry.name, production);
        match &attributes {
            Some(attributes) => {
                text.push_str(block_opener(&production));
                for attribute in &attributes.entries {
                    if attribute.name == "recoverWhile" {
                        let _ = writeln!(
                            text,
                            "  recoverWhile={}",
                            self.rewrite_direct_references(&attribute.value)
                        );
                    } else {
                        let _ = writeln!(text, "  {}", attribute.text);
                    }
                }
                text.push_str("}\n");
            }
            None => text.push('\n'),
        }

        RewrittenRule {
            name: entry.name.clone(),
            bare: entry.bare_name().to_string(),
            kind: RuleKind::Subclass,
            text,
            override_enabled: attributes.map_or(false, |a| a.override_enabled()),
        }
    }
}

/// Opening of a generated attribute block; a trailing line comment would
/// swallow a brace on the same line
fn block_opener(production: &str) -> &'static str {
    if ends_with_line_comment(production) {
        "\n{\n"
    } else {
        " {\n"
    }
}

fn preserved(attributes: &AttributeBlock) -> impl Iterator<Item = &Attribute> {
    attributes
        .entries
        .iter()
        .filter(|a| !CONSUMED_ATTRIBUTES.contains(&a.name.as_str()))
}
