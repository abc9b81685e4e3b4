//! Integration tests for grammar composition
//!
//! These tests compose complete grammars and check both artifacts: the
//! composed grammar text and the generated dispatch module.

use bnf_composer::compose::{ComposeError, RuleKind};
use bnf_composer::prelude::*;

// ============================================================================
// Fixtures
// ============================================================================

const MINIMAL: &str = "a ::= b c\nb ::= 'x'\nc ::= 'y'\n";

const ROOT_GRAMMAR: &str = r#"{
  tokens=[
    space='regexp:\s+'
  ]
  extends(".*_stmt")=stmt
}

root_file ::= stmt*
stmt ::= hello_stmt | bye_stmt {
  pin=1
  recoverWhile=stmt_recover
}
hello_stmt ::= 'hello' name
bye_stmt ::= 'bye' name
name ::= 'world' | 'you'
private stmt_recover ::= !('hello' | 'bye')
"#;

const ROOT_COMPOSED: &str = r#"{
  parserUtilClass="com.example.RootParserUtil"
  parserClass="com.example.RootParser"
  elementTypeHolderClass="com.example.psi.RootTypes"
  psiPackage="com.example.psi"
  psiImplPackage="com.example.psi.impl"
  tokens=[
    space='regexp:\s+'
  ]
  extends(".*_stmt")=stmt
}

root ::= <<rootFileExt root_file_real>>
fake root_file ::= stmt*
root_file_real ::= <<stmtExt stmt_real>>* {
  elementType = root_file
}
fake stmt ::= hello_stmt | bye_stmt {
  pin=1
  recoverWhile=stmt_recover
}
stmt_real ::= hello_stmt | bye_stmt {
  elementType = stmt
  pin=1
  recoverWhile=stmt_recover_real
}
fake name ::= 'world' | 'you'
name_real ::= 'world' | 'you' {
  elementType = name
}

hello_stmt ::= 'hello' name_real
bye_stmt ::= 'bye' name_real
fake private stmt_recover ::= !('hello' | 'bye')
private stmt_recover_real ::= !('hello' | 'bye') {
  elementType = stmt_recover
}
"#;

const CHILD_GRAMMAR: &str = r#"{
  overrides="com.example.RootParser"
  parserImports=[
    "static com.example.Helpers.*"
  ]
}
german_file ::= {stmt}* name
name ::= 'welt' {
  override=true
}
"#;

const CHILD_COMPOSED: &str = r#"{
  parserUtilClass="com.example.german.GermanParserUtil"
  parserClass="com.example.german.GermanParser"
  elementTypeHolderClass="com.example.german.psi.GermanTypes"
  psiPackage="com.example.german.psi"
  psiImplPackage="com.example.german.psi.impl"
  overrides="com.example.RootParser"
  parserImports=[
    "static com.example.RootParser.*"
    "static com.example.RootParserUtil.stmtExt"
    "static com.example.Helpers.*"
  ]
}

root ::= <<germanFileExt german_file_real>>
fake german_file ::= <<stmtExt <<stmt_real>>>>* name
german_file_real ::= <<stmtExt <<stmt_real>>>>* <<nameExt name_real>> {
  elementType = german_file
}
fake name ::= 'welt' {
  override=true
}
name_real ::= 'welt' {
  elementType = name
}
"#;

fn compose(text: &str, package: &str, stem: &str) -> ComposedGrammar {
    GrammarComposer::default()
        .compose(text, &GrammarNames::new(package, stem))
        .unwrap()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_round_trip_scenario() {
    let composed = compose(MINIMAL, "com.example", "foo");
    let text = &composed.grammar_text;

    assert!(text.contains("\nroot ::= <<aExt a_real>>\n"));
    assert!(text.contains("a_real ::= <<bExt b_real>> <<cExt c_real>> {\n  elementType = a\n}\n"));
    assert!(text.contains("b_real ::= 'x' {\n  elementType = b\n}\n"));
    assert!(text.contains("c_real ::= 'y' {\n  elementType = c\n}\n"));

    let module = &composed.dispatch_source;
    for slot in ["a", "b", "c"] {
        assert!(module.contains(&format!("  var {}: GeneratedParserUtilBase.Parser? = null\n", slot)));
    }
    for accessor in ["aExt", "bExt", "cExt"] {
        assert_eq!(module.matches(&format!("fun {}(", accessor)).count(), 1);
    }
}

#[test]
fn test_full_root_grammar() {
    let composed = compose(ROOT_GRAMMAR, "com.example", "root");
    assert_eq!(composed.grammar_text, ROOT_COMPOSED);

    let slots: Vec<&str> = composed.plan.slot_names().collect();
    assert_eq!(slots, vec!["root_file", "stmt", "name"]);
    assert!(composed.plan.parent.is_none());
    assert!(!composed.dispatch_source.contains("fun override"));
}

#[test]
fn test_private_rule_scenario() {
    let composed = compose("a ::= helper\nprivate helper ::= 'z'\n", "com.example", "foo");

    assert!(composed
        .grammar_text
        .contains("a_real ::= helper_real {\n  elementType = a\n}\n"));
    assert!(!composed.grammar_text.contains("helperExt"));
    assert!(!composed.dispatch_source.contains("var helper"));
    assert!(!composed.dispatch_source.contains("helperExt"));
}

#[test]
fn test_external_rule_scenario() {
    let grammar = "{\n  overrides=\"com.example.RootParser\"\n}\nouter ::= {ext} 'x' {ext}\n";
    let composed = compose(grammar, "com.example.child", "child");
    let text = &composed.grammar_text;

    assert!(text.contains("outer_real ::= <<extExt <<ext_real>>>> 'x' <<extExt <<ext_real>>>> {"));
    assert_eq!(
        text.matches("\"static com.example.RootParserUtil.extExt\"").count(),
        1
    );
    assert!(text.contains("  parserImports=[\n    \"static com.example.RootParser.*\"\n"));
}

#[test]
fn test_external_rule_without_parent_has_no_import() {
    let composed = compose("outer ::= {ext}\n", "com.example", "foo");

    assert!(composed.grammar_text.contains("outer_real ::= <<extExt <<ext_real>>>> {"));
    assert!(!composed.grammar_text.contains("parserImports"));
}

#[test]
fn test_parent_chaining_scenario() {
    let composed = compose(CHILD_GRAMMAR, "com.example.german", "german");
    assert_eq!(composed.grammar_text, CHILD_COMPOSED);

    let module = &composed.dispatch_source;
    assert!(module.contains("import com.example.RootParserUtil\n"));
    assert!(module.contains("  fun overrideRootParser() {\n"));
    assert!(module.contains(
        "    RootParserUtil.name = GeneratedParserUtilBase.Parser { builder, level -> GermanParserUtil.name?.parse(builder, level) ?: GermanParser.name_real(builder, level) }\n"
    ));
    assert!(!module.contains("RootParserUtil.german_file ="));
    assert!(module.contains("    val currentCreateElement = RootParserUtil.createElement\n"));

    let bound: Vec<&str> = composed.plan.bound_slots().map(|s| s.rule.as_str()).collect();
    assert_eq!(bound, vec!["name"]);
}

#[test]
fn test_existing_import_is_not_repeated() {
    let grammar = r#"{
  overrides="com.example.RootParser"
  parserImports=["static com.example.RootParser.*"]
}
a ::= 'a'
"#;
    let composed = compose(grammar, "com.example.child", "child");
    assert_eq!(
        composed
            .grammar_text
            .matches("\"static com.example.RootParser.*\"")
            .count(),
        1
    );
}

#[test]
fn test_subclass_rules_are_inert() {
    let composed = compose(ROOT_GRAMMAR, "com.example", "root");
    let text = &composed.grammar_text;

    for rule in ["hello_stmt", "bye_stmt"] {
        assert!(!text.contains(&format!("fake {} ::=", rule)));
        assert!(!text.contains(&format!("{}_real", rule)));
        assert_eq!(text.matches(&format!("\n{} ::= ", rule)).count(), 1);
        assert!(!composed.plan.slot_names().any(|s| s == rule));
    }
}

#[test]
fn test_declared_base_class_is_replaced() {
    let grammar = "{\n  parserUtilClass=\"com.example.CustomUtil\"\n  tokens=[x='x']\n}\na ::= x\n";
    let composed = compose(grammar, "com.example", "foo");

    assert!(!composed.grammar_text.contains("CustomUtil"));
    assert!(composed
        .grammar_text
        .starts_with("{\n  parserUtilClass=\"com.example.FooParserUtil\"\n"));
    assert!(composed
        .dispatch_source
        .contains("object FooParserUtil : CustomUtil() {"));
    // Same package as the module, so no import
    assert!(!composed.dispatch_source.contains("import com.example.CustomUtil"));
}

#[test]
fn test_identifiers_in_literals_and_comments_are_kept() {
    let grammar = "a ::= 'b' b // b\n  | \"c b\" /* c */ c\nb ::= 'x'\nc ::= 'y'\n";
    let composed = compose(grammar, "", "foo");

    assert!(composed.grammar_text.contains(
        "a_real ::= 'b' <<bExt b_real>> // b\n  | \"c b\" /* c */ <<cExt c_real>> {\n  elementType = a\n}\n"
    ));
}

#[test]
fn test_trailing_line_comment_moves_block() {
    let composed = compose("a ::= b // trailing b\nb ::= 'x'\n", "", "foo");
    assert!(composed
        .grammar_text
        .contains("a_real ::= <<bExt b_real>> // trailing b\n{\n  elementType = a\n}\n"));
}

#[test]
fn test_adjacent_references() {
    let composed = compose("a ::= b b b\nb ::= 'x'\n", "", "foo");
    assert!(composed
        .grammar_text
        .contains("a_real ::= <<bExt b_real>> <<bExt b_real>> <<bExt b_real>> {"));
}

// ============================================================================
// Determinism and errors
// ============================================================================

#[test]
fn test_idempotence() {
    let first = compose(ROOT_GRAMMAR, "com.example", "root");
    let second = compose(ROOT_GRAMMAR, "com.example", "root");
    assert_eq!(first, second);
}

#[test]
fn test_invalid_extends_pattern() {
    let grammar = "{\n  extends(\"(unclosed\")=stmt\n}\na ::= 'a'\n";
    let result = GrammarComposer::default().compose(grammar, &GrammarNames::new("", "foo"));

    match result {
        Err(ComposeError::InvalidExtendsPattern { directive, .. }) => {
            assert_eq!(directive, "extends(\"(unclosed\")=stmt");
        }
        other => panic!("expected invalid pattern error, got {:?}", other),
    }
}

#[test]
fn test_no_rules() {
    let result = GrammarComposer::default().compose("{\n}\n", &GrammarNames::new("", "foo"));
    assert!(matches!(result, Err(ComposeError::NoRules { path: None })));
}

#[test]
fn test_private_rule_matching_pattern_stays_private() {
    let grammar = "{\n  extends(\".*_stmt\")=stmt\n}\na ::= helper_stmt\nprivate helper_stmt ::= 'z'\n";
    let composed = compose(grammar, "", "foo");

    assert!(composed.grammar_text.contains("fake private helper_stmt ::= 'z'\n"));
    assert!(composed.grammar_text.contains("a_real ::= helper_stmt_real {"));
    assert!(!composed.plan.slot_names().any(|s| s == "helper_stmt"));
    assert!(RuleKind::Private.has_real_production());
}

#[test]
fn test_config_changes_generated_names() {
    let config = ComposerConfig::default()
        .with_accessor_suffix("Hook")
        .with_default_base_class("com.example.Base");
    let composed = GrammarComposer::new(config)
        .compose(MINIMAL, &GrammarNames::new("com.example", "foo"))
        .unwrap();

    assert!(composed.grammar_text.contains("root ::= <<aHook a_real>>"));
    assert!(composed.dispatch_source.contains("object FooParserUtil : Base() {"));
}

#[test]
fn test_declared_element_type_becomes_bare_name() {
    let composed = compose("a ::= b { elementType=foo }\nb ::= 'x'\n", "com.example", "foo");

    assert!(composed
        .grammar_text
        .contains("a_real ::= <<bExt b_real>> {\n  elementType = a\n}\n"));
    assert!(!composed.grammar_text.contains("elementType = foo"));
}
