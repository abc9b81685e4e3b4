//! Dispatch module generator
//!
//! A [`DispatchPlan`] describes one grammar's dispatch module: an override
//! slot and accessor per extendable rule, the element constructor hook, and
//! the optional binding into a parent grammar's module. The plan renders to
//! Kotlin source and also seeds the in-process [`IndirectionTable`].
//!
//! [`IndirectionTable`]: super::dispatch::IndirectionTable

use super::kotlin::{escape_identifier, KotlinFile};
use super::naming::{real_rule_name, ClassName};

/// The parser-combinator interface every slot holds
pub const PARSER_INTERFACE: &str = "com.intellij.lang.parser.GeneratedParserUtilBase.Parser";
/// Parser-builder handle passed to every rule
pub const BUILDER_CLASS: &str = "com.intellij.lang.PsiBuilder";
/// Syntax-tree node type handed to the element constructor
pub const AST_NODE_CLASS: &str = "com.intellij.lang.ASTNode";
/// Element type returned by the element constructor
pub const PSI_ELEMENT_CLASS: &str = "com.intellij.psi.PsiElement";
/// Failure class caught when chaining element constructors
pub const NO_MATCH_CLASS: &str = "kotlin.AssertionError";
const JVM_STATIC: &str = "kotlin.jvm.JvmStatic";

/// Name of the element constructor hook
pub const CREATE_ELEMENT: &str = "createElement";
/// Name of the reset operation
pub const RESET: &str = "reset";

/// One override slot and its accessor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPlan {
    /// Bare rule name, also the slot name
    pub rule: String,
    /// Indirection name
    pub accessor: String,
    /// Real-rule entry point on the parser class
    pub real_entry: String,
    /// Whether the rule asked to be bound into the parent
    pub overrides_parent: bool,
}

impl SlotPlan {
    /// Create a slot for an extendable rule
    pub fn new(rule: impl Into<String>, accessor: impl Into<String>, overrides_parent: bool) -> Self {
        let rule = rule.into();
        Self {
            real_entry: real_rule_name(&rule),
            rule,
            accessor: accessor.into(),
            overrides_parent,
        }
    }
}

/// Binding of this module into a parent grammar's module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentBinding {
    /// The parent parser class named by `overrides="..."`
    pub parser: ClassName,
    /// The parent dispatch module
    pub module: ClassName,
}

impl ParentBinding {
    /// Binding for a parent parser class
    pub fn new(parser: ClassName) -> Self {
        let module = parser.with_suffix("Util");
        Self { parser, module }
    }

    /// Name of the generated binding routine
    pub fn method_name(&self) -> String {
        format!("override{}", self.parser.simple_name())
    }
}

/// Everything needed to generate one dispatch module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPlan {
    /// The dispatch module itself
    pub module: ClassName,
    /// Its superclass
    pub base_class: ClassName,
    /// The generated parser holding the real-rule entry points
    pub parser_class: ClassName,
    /// The generated element-type holder
    pub element_holder: ClassName,
    /// Slots in rule declaration order
    pub slots: Vec<SlotPlan>,
    /// Parent binding, when the grammar overrides a parent
    pub parent: Option<ParentBinding>,
}

impl DispatchPlan {
    /// Slot names in declaration order
    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.rule.as_str())
    }

    /// Slots bound into the parent, empty without a parent
    pub fn bound_slots(&self) -> impl Iterator<Item = &SlotPlan> {
        let has_parent = self.parent.is_some();
        self.slots
            .iter()
            .filter(move |s| has_parent && s.overrides_parent)
    }

    /// Render the module as Kotlin source
    pub fn render_kotlin(&self) -> String {
        let mut file = KotlinFile::new(self.module.package.clone());
        file.declare(self.module.simple_name());

        let parser_type = file.class(&ClassName::best_guess(PARSER_INTERFACE));
        let builder_type = file.class(&ClassName::best_guess(BUILDER_CLASS));
        let node_type = file.class(&ClassName::best_guess(AST_NODE_CLASS));
        let element_type = file.class(&ClassName::best_guess(PSI_ELEMENT_CLASS));
        let jvm_static = file.class(&ClassName::best_guess(JVM_STATIC));
        let base = file.class(&self.base_class);
        let holder = file.class(&self.element_holder);
        let default_constructor = format!("{{ {}.Factory.createElement(it) }}", holder);

        file.open(&format!("object {} : {}() {{", self.module.simple_name(), base));
        file.line(&format!(
            "var {}: ({}) -> {} = {}",
            CREATE_ELEMENT, node_type, element_type, default_constructor
        ));

        for slot in &self.slots {
            file.blank();
            file.line(&format!(
                "var {}: {}? = null",
                escape_identifier(&slot.rule),
                parser_type
            ));
        }

        for slot in &self.slots {
            file.blank();
            file.line(&format!("@{}", jvm_static));
            file.line(&format!(
                "fun {}(builder: {}, level: Int, fallback: {}): Boolean = (this.{} ?: fallback).parse(builder, level)",
                slot.accessor,
                builder_type,
                parser_type,
                escape_identifier(&slot.rule)
            ));
        }

        file.blank();
        file.open(&format!("fun {}() {{", RESET));
        file.line(&format!("{} = {}", CREATE_ELEMENT, default_constructor));
        for slot in &self.slots {
            file.line(&format!("{} = null", escape_identifier(&slot.rule)));
        }
        file.close("}");

        if let Some(parent) = &self.parent {
            self.render_binding(&mut file, parent, &parser_type);
        }

        file.close("}");
        file.finish()
    }

    fn render_binding(&self, file: &mut KotlinFile, parent: &ParentBinding, parser_type: &str) {
        let parent_module = file.class(&parent.module);
        let own_module = file.class(&self.module);
        let own_parser = file.class(&self.parser_class);
        let no_match = file.class(&ClassName::best_guess(NO_MATCH_CLASS));

        file.blank();
        file.open(&format!("fun {}() {{", parent.method_name()));
        for slot in self.bound_slots() {
            let rule = escape_identifier(&slot.rule);
            file.line(&format!(
                "{}.{} = {} {{ builder, level -> {}.{}?.parse(builder, level) ?: {}.{}(builder, level) }}",
                parent_module, rule, parser_type, own_module, rule, own_parser, slot.real_entry
            ));
        }

        file.line(&format!(
            "val currentCreateElement = {}.{}",
            parent_module, CREATE_ELEMENT
        ));
        file.open(&format!("{}.{} = {{", parent_module, CREATE_ELEMENT));
        file.open("try {");
        file.line(&format!("{}.{}(it)", own_module, CREATE_ELEMENT));
        file.reopen(&format!("}} catch (e: {}) {{", no_match));
        file.line("currentCreateElement(it)");
        file.close("}");
        file.close("}");
        file.close("}");
    }
}
