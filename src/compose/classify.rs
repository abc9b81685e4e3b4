//! Extensibility classification
//!
//! Partitions rules into extendable rules, private rules, and rules fixed by
//! an `extends(...)` subclass pattern. Private status wins over a pattern
//! match: a private rule is always composed as a private rule.

use hashbrown::HashMap;

use super::directives::HeaderDirectives;
use super::scanner::{RuleEntry, RuleTable};

/// How a rule takes part in composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Independently overridable through its accessor
    Extendable,
    /// Carries the private marker, referenced directly by its real name
    Private,
    /// Matched by an `extends(...)` pattern, emitted once as written
    Subclass,
}

impl RuleKind {
    /// Whether references to this rule have a `_real` production to target
    pub fn has_real_production(self) -> bool {
        matches!(self, RuleKind::Extendable | RuleKind::Private)
    }
}

/// Classification of every rule in a grammar
#[derive(Debug, Clone, Default)]
pub struct Classification {
    kinds: Vec<RuleKind>,
    by_bare_name: HashMap<String, RuleKind>,
}

impl Classification {
    /// Classify the rules of a table
    pub fn classify(rules: &RuleTable, directives: &HeaderDirectives) -> Self {
        let mut kinds = Vec::with_capacity(rules.len());
        let mut by_bare_name = HashMap::with_capacity(rules.len());

        for entry in rules.iter() {
            let kind = if entry.is_private() {
                RuleKind::Private
            } else if directives.matches_subclass(&entry.name) {
                RuleKind::Subclass
            } else {
                RuleKind::Extendable
            };
            kinds.push(kind);

            let bare = entry.bare_name().to_string();
            match by_bare_name.get(&bare) {
                Some(RuleKind::Private) => {}
                _ => {
                    by_bare_name.insert(bare, kind);
                }
            }
        }

        let classification = Self {
            kinds,
            by_bare_name,
        };
        log_debug!(
            "classified rules: {} extendable, {} private, {} subclass",
            classification.count(RuleKind::Extendable),
            classification.count(RuleKind::Private),
            classification.count(RuleKind::Subclass)
        );
        classification
    }

    /// Kind of the rule at declaration position `idx`
    pub fn kind_at(&self, idx: usize) -> RuleKind {
        self.kinds[idx]
    }

    /// Kind of the rule a bare reference name points at, if it is a local rule
    pub fn reference_kind(&self, bare: &str) -> Option<RuleKind> {
        self.by_bare_name.get(bare).copied()
    }

    /// Number of rules of a kind
    pub fn count(&self, kind: RuleKind) -> usize {
        self.kinds.iter().filter(|&&k| k == kind).count()
    }

    /// Rules of a kind, in declaration order
    pub fn rules_of<'a>(
        &'a self,
        rules: &'a RuleTable,
        kind: RuleKind,
    ) -> impl Iterator<Item = &'a RuleEntry> + 'a {
        rules
            .iter()
            .zip(self.kinds.iter())
            .filter(move |(_, k)| **k == kind)
            .map(|(entry, _)| entry)
    }

    /// Rules that are not independently overridable, in declaration order
    pub fn unextendable<'a>(
        &'a self,
        rules: &'a RuleTable,
    ) -> impl Iterator<Item = (&'a RuleEntry, RuleKind)> + 'a {
        rules
            .iter()
            .zip(self.kinds.iter().copied())
            .filter(|(_, k)| *k != RuleKind::Extendable)
    }
}
