//! In-process indirection table
//!
//! The Rust counterpart of a generated dispatch module: per rule a slot that
//! is either the rule's default entry point or an installed override, plus a
//! replaceable element constructor. Lookup resolves the slot; `reset`
//! reinitializes every slot and the constructor.
//!
//! Tables are shared through `Arc` and mutated through `&self`. Overrides
//! are resolved and cloned out before they run, so an override may parse
//! through the same table. Concurrent parses and resets are safe but not
//! ordered; callers that reuse a table across independent parses call
//! [`IndirectionTable::reset`] in between.

use hashbrown::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::dispatch_gen::{DispatchPlan, SlotPlan};

/// A rule entry point: builder handle and nesting level in, success out
pub type RuleFn<B> = Arc<dyn Fn(&mut B, usize) -> bool + Send + Sync>;

/// An element constructor
pub type ElementFn<N, E> = Arc<dyn Fn(&N) -> Result<E, NoMatch> + Send + Sync>;

/// Raised by an element constructor that does not handle a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoMatch;

impl fmt::Display for NoMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No element constructor matched the node")
    }
}

impl std::error::Error for NoMatch {}

/// Errors from table operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The table has no slot for this rule
    UnknownRule(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::UnknownRule(rule) => write!(f, "No slot for rule `{}`", rule),
        }
    }
}

impl std::error::Error for DispatchError {}

/// State of one rule's slot
pub enum Slot<B> {
    /// Resolves to the rule's own entry point
    Default(RuleFn<B>),
    /// Resolves to an installed override
    Overridden(RuleFn<B>),
}

impl<B> Slot<B> {
    /// The function this slot resolves to
    pub fn resolve(&self) -> &RuleFn<B> {
        match self {
            Slot::Default(entry) | Slot::Overridden(entry) => entry,
        }
    }

    /// Whether an override is installed
    pub fn is_overridden(&self) -> bool {
        matches!(self, Slot::Overridden(_))
    }
}

impl<B> Clone for Slot<B> {
    fn clone(&self) -> Self {
        match self {
            Slot::Default(entry) => Slot::Default(Arc::clone(entry)),
            Slot::Overridden(entry) => Slot::Overridden(Arc::clone(entry)),
        }
    }
}

impl<B> fmt::Debug for Slot<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Default(_) => write!(f, "Default"),
            Slot::Overridden(_) => write!(f, "Overridden"),
        }
    }
}

struct TableState<B, N, E> {
    slots: HashMap<String, Slot<B>>,
    element: ElementFn<N, E>,
}

/// Override-aware dispatch for one grammar
pub struct IndirectionTable<B, N, E> {
    order: Vec<String>,
    entries: HashMap<String, RuleFn<B>>,
    default_element: ElementFn<N, E>,
    state: RwLock<TableState<B, N, E>>,
}

impl<B, N, E> IndirectionTable<B, N, E> {
    /// Create a table from rule entry points and a default element constructor
    pub fn new<I, S>(entries: I, default_element: ElementFn<N, E>) -> Self
    where
        I: IntoIterator<Item = (S, RuleFn<B>)>,
        S: Into<String>,
    {
        let mut order = Vec::new();
        let mut map = HashMap::new();
        for (rule, entry) in entries {
            let rule = rule.into();
            if map.insert(rule.clone(), entry).is_none() {
                order.push(rule);
            }
        }

        let slots = Self::default_slots(&map);
        Self {
            order,
            entries: map,
            state: RwLock::new(TableState {
                slots,
                element: Arc::clone(&default_element),
            }),
            default_element,
        }
    }

    /// Create a table with one slot per slot of a dispatch plan
    ///
    /// `entry_for` supplies the real-rule entry point of each slot.
    pub fn from_plan<F>(
        plan: &DispatchPlan,
        mut entry_for: F,
        default_element: ElementFn<N, E>,
    ) -> Self
    where
        F: FnMut(&SlotPlan) -> RuleFn<B>,
    {
        let entries: Vec<(String, RuleFn<B>)> = plan
            .slots
            .iter()
            .map(|slot| (slot.rule.clone(), entry_for(slot)))
            .collect();
        Self::new(entries, default_element)
    }

    fn default_slots(entries: &HashMap<String, RuleFn<B>>) -> HashMap<String, Slot<B>> {
        entries
            .iter()
            .map(|(rule, entry)| (rule.clone(), Slot::Default(Arc::clone(entry))))
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, TableState<B, N, E>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TableState<B, N, E>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rule names in registration order
    pub fn rules(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Whether the table has a slot for `rule`
    pub fn contains(&self, rule: &str) -> bool {
        self.entries.contains_key(rule)
    }

    /// Current state of a rule's slot
    pub fn slot(&self, rule: &str) -> Option<Slot<B>> {
        self.read().slots.get(rule).cloned()
    }

    /// The function a rule currently resolves to
    pub fn lookup(&self, rule: &str) -> Result<RuleFn<B>, DispatchError> {
        self.read()
            .slots
            .get(rule)
            .map(|slot| Arc::clone(slot.resolve()))
            .ok_or_else(|| DispatchError::UnknownRule(rule.to_string()))
    }

    /// The rule's own entry point, ignoring overrides
    pub fn real_entry(&self, rule: &str) -> Result<RuleFn<B>, DispatchError> {
        self.entries
            .get(rule)
            .cloned()
            .ok_or_else(|| DispatchError::UnknownRule(rule.to_string()))
    }

    /// Parse `rule` through its slot
    pub fn parse(&self, rule: &str, builder: &mut B, level: usize) -> Result<bool, DispatchError> {
        let target = self.lookup(rule)?;
        Ok(target(builder, level))
    }

    /// Install an override for `rule`
    pub fn set_override<F>(&self, rule: &str, custom: F) -> Result<(), DispatchError>
    where
        F: Fn(&mut B, usize) -> bool + Send + Sync + 'static,
    {
        self.install(rule, Arc::new(custom))
    }

    /// Install a shared override for `rule`
    pub fn install(&self, rule: &str, custom: RuleFn<B>) -> Result<(), DispatchError> {
        let mut state = self.write();
        match state.slots.get_mut(rule) {
            Some(slot) => {
                *slot = Slot::Overridden(custom);
                Ok(())
            }
            None => Err(DispatchError::UnknownRule(rule.to_string())),
        }
    }

    /// Return `rule`'s slot to its default
    pub fn clear_override(&self, rule: &str) -> Result<(), DispatchError> {
        let entry = self.real_entry(rule)?;
        if let Some(slot) = self.write().slots.get_mut(rule) {
            *slot = Slot::Default(entry);
        }
        Ok(())
    }

    /// Whether `rule` currently has an override installed
    pub fn is_overridden(&self, rule: &str) -> bool {
        self.read()
            .slots
            .get(rule)
            .map_or(false, Slot::is_overridden)
    }

    /// Number of installed overrides
    pub fn override_count(&self) -> usize {
        self.read().slots.values().filter(|s| s.is_overridden()).count()
    }

    /// Reinitialize every slot and the element constructor
    pub fn reset(&self) {
        let mut state = self.write();
        state.slots = Self::default_slots(&self.entries);
        state.element = Arc::clone(&self.default_element);
    }

    /// Build the element for a node with the current constructor
    pub fn create_element(&self, node: &N) -> Result<E, NoMatch> {
        let constructor = self.element_constructor();
        constructor(node)
    }

    /// The current element constructor
    pub fn element_constructor(&self) -> ElementFn<N, E> {
        Arc::clone(&self.read().element)
    }

    /// Replace the element constructor
    pub fn set_element_constructor(&self, constructor: ElementFn<N, E>) {
        self.write().element = constructor;
    }

    /// Whether the element constructor is the default one
    pub fn has_default_element_constructor(&self) -> bool {
        Arc::ptr_eq(&self.read().element, &self.default_element)
    }
}

impl<B: 'static, N: 'static, E: 'static> IndirectionTable<B, N, E> {
    /// Bind this table's overrides into a parent table
    ///
    /// For each named rule the parent's slot is overridden with a function
    /// that resolves this table's slot at call time, so it runs this table's
    /// override if one is installed and this table's own entry point
    /// otherwise. The parent's element constructor becomes this table's
    /// constructor, falling back on [`NoMatch`] to the constructor the parent
    /// held when this call was made.
    ///
    /// Every rule must have a slot in both tables. If one does not, nothing
    /// in the parent changes.
    pub fn chain_into<'a, I>(
        self: &Arc<Self>,
        parent: &IndirectionTable<B, N, E>,
        rules: I,
    ) -> Result<(), DispatchError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let rules: Vec<&str> = rules.into_iter().collect();
        if let Some(missing) = rules
            .iter()
            .copied()
            .find(|rule| !self.contains(rule) || !parent.contains(rule))
        {
            return Err(DispatchError::UnknownRule(missing.to_string()));
        }

        let mut state = parent.write();
        for rule in rules {
            let child = Arc::clone(self);
            let name = rule.to_string();
            let bound: RuleFn<B> = Arc::new(move |builder: &mut B, level: usize| {
                child.parse(&name, builder, level).unwrap_or(false)
            });
            if let Some(slot) = state.slots.get_mut(rule) {
                *slot = Slot::Overridden(bound);
            }
        }

        let previous = Arc::clone(&state.element);
        let child = Arc::clone(self);
        state.element = Arc::new(move |node: &N| {
            child.create_element(node).or_else(|NoMatch| previous(node))
        });
        Ok(())
    }

    /// Bind the slots a dispatch plan marks for its parent
    pub fn chain_plan(
        self: &Arc<Self>,
        parent: &IndirectionTable<B, N, E>,
        plan: &DispatchPlan,
    ) -> Result<(), DispatchError> {
        self.chain_into(parent, plan.bound_slots().map(|s| s.rule.as_str()))
    }
}

impl<B, N, E> fmt::Debug for IndirectionTable<B, N, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        let slots: Vec<(&str, &Slot<B>)> = self
            .order
            .iter()
            .filter_map(|rule| state.slots.get(rule).map(|slot| (rule.as_str(), slot)))
            .collect();
        f.debug_struct("IndirectionTable")
            .field("slots", &slots)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Trace = Vec<String>;
    type Table = IndirectionTable<Trace, u32, String>;

    fn entry(tag: &'static str, result: bool) -> RuleFn<Trace> {
        Arc::new(move |trace: &mut Trace, level: usize| {
            trace.push(format!("{}@{}", tag, level));
            result
        })
    }

    fn element(prefix: &'static str, handles: fn(u32) -> bool) -> ElementFn<u32, String> {
        Arc::new(move |node: &u32| {
            if handles(*node) {
                Ok(format!("{}{}", prefix, node))
            } else {
                Err(NoMatch)
            }
        })
    }

    fn table(tag: &'static str) -> Table {
        Table::new(
            vec![("a", entry(tag, true)), ("b", entry(tag, false))],
            element(tag, |n| n % 2 == 0),
        )
    }

    #[test]
    fn test_default_lookup() {
        let table = table("root");
        let mut trace = Trace::new();

        assert_eq!(table.parse("a", &mut trace, 0), Ok(true));
        assert_eq!(table.parse("b", &mut trace, 1), Ok(false));
        assert_eq!(trace, vec!["root@0", "root@1"]);
        assert_eq!(
            table.parse("missing", &mut trace, 0),
            Err(DispatchError::UnknownRule("missing".into()))
        );
    }

    #[test]
    fn test_override_and_clear() {
        let table = table("root");
        let mut trace = Trace::new();

        table
            .set_override("a", |trace: &mut Trace, _| {
                trace.push("custom".into());
                false
            })
            .unwrap();
        assert!(table.is_overridden("a"));
        assert_eq!(table.parse("a", &mut trace, 0), Ok(false));

        table.clear_override("a").unwrap();
        assert!(!table.is_overridden("a"));
        assert_eq!(table.parse("a", &mut trace, 0), Ok(true));
        assert_eq!(trace, vec!["custom", "root@0"]);
    }

    #[test]
    fn test_reset_restores_everything() {
        let table = table("root");
        table.set_override("a", |_: &mut Trace, _| false).unwrap();
        table.set_override("b", |_: &mut Trace, _| true).unwrap();
        table.set_element_constructor(element("x", |_| true));
        assert_eq!(table.override_count(), 2);

        table.reset();

        assert_eq!(table.override_count(), 0);
        assert!(table.rules().all(|r| !table.is_overridden(r)));
        assert!(table.has_default_element_constructor());
        assert_eq!(table.create_element(&2), Ok("root2".to_string()));
    }

    #[test]
    fn test_unknown_override_is_error() {
        let table = table("root");
        let result = table.set_override("zzz", |_: &mut Trace, _| true);
        assert_eq!(result, Err(DispatchError::UnknownRule("zzz".into())));
    }

    #[test]
    fn test_chain_into_parent() {
        let parent = table("parent");
        let child = Arc::new(table("child"));
        child.chain_into(&parent, ["a"]).unwrap();

        let mut trace = Trace::new();
        assert_eq!(parent.parse("a", &mut trace, 3), Ok(true));
        assert_eq!(parent.parse("b", &mut trace, 3), Ok(false));
        assert_eq!(trace, vec!["child@3", "parent@3"]);

        // The parent consults the child's slot at call time
        child
            .set_override("a", |trace: &mut Trace, _| {
                trace.push("child-custom".into());
                true
            })
            .unwrap();
        trace.clear();
        parent.parse("a", &mut trace, 0).unwrap();
        assert_eq!(trace, vec!["child-custom"]);
    }

    #[test]
    fn test_chained_element_constructor_falls_back() {
        let parent = Table::new(vec![("a", entry("p", true))], element("parent", |_| true));
        let child = Arc::new(Table::new(
            vec![("a", entry("c", true))],
            element("child", |n| n > 10),
        ));
        child.chain_into(&parent, std::iter::empty()).unwrap();

        assert_eq!(parent.create_element(&42), Ok("child42".to_string()));
        assert_eq!(parent.create_element(&1), Ok("parent1".to_string()));
    }

    #[test]
    fn test_chaining_twice_does_not_recurse() {
        let parent = Table::new(vec![("a", entry("p", true))], element("parent", |_| true));
        let child = Arc::new(Table::new(
            vec![("a", entry("c", true))],
            element("child", |n| n > 10),
        ));
        child.chain_into(&parent, ["a"]).unwrap();
        child.chain_into(&parent, ["a"]).unwrap();

        assert_eq!(parent.create_element(&3), Ok("parent3".to_string()));
        assert_eq!(parent.create_element(&30), Ok("child30".to_string()));
    }

    #[test]
    fn test_chain_unknown_rule() {
        let parent = table("parent");
        let child = Arc::new(Table::new(vec![("x", entry("c", true))], element("c", |_| true)));
        assert!(child.chain_into(&parent, ["a"]).is_err());
    }

    #[test]
    fn test_failed_chain_leaves_parent_untouched() {
        let parent = Table::new(vec![("a", entry("p", true))], element("parent", |_| true));
        let child = Arc::new(Table::new(
            vec![("a", entry("c", false)), ("x", entry("c", true))],
            element("child", |_| true),
        ));

        let result = child.chain_into(&parent, ["a", "x"]);

        assert_eq!(result, Err(DispatchError::UnknownRule("x".into())));
        assert!(!parent.is_overridden("a"));
        assert_eq!(parent.override_count(), 0);
        assert!(parent.has_default_element_constructor());

        let mut trace = Trace::new();
        assert_eq!(parent.parse("a", &mut trace, 0), Ok(true));
        assert_eq!(trace, vec!["p@0"]);
    }

    #[test]
    fn test_parent_reset_drops_binding() {
        let parent = table("parent");
        let child = Arc::new(table("child"));
        child.chain_into(&parent, ["a"]).unwrap();

        parent.reset();
        let mut trace = Trace::new();
        parent.parse("a", &mut trace, 0).unwrap();
        assert_eq!(trace, vec!["parent@0"]);
    }
}
