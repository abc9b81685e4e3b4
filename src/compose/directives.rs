//! Header directive parser
//!
//! Each directive is searched independently and is optional; a missing or
//! malformed directive yields its default. The only fatal case is an
//! `extends("...")` pattern that does not compile.

use regex::Regex;
use std::sync::OnceLock;

use super::error::{ComposeError, Result};
use super::naming::ClassName;
use super::regex_cache;

/// Dispatch module superclass used when the header names none
pub const DEFAULT_BASE_CLASS: &str = "com.intellij.lang.parser.GeneratedParserUtilBase";

static PARSER_UTIL_CLASS: OnceLock<Regex> = OnceLock::new();
static OVERRIDES: OnceLock<Regex> = OnceLock::new();
static EXTENDS: OnceLock<Regex> = OnceLock::new();
static PARSER_IMPORTS: OnceLock<Regex> = OnceLock::new();
static QUOTED: OnceLock<Regex> = OnceLock::new();

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("directive patterns are valid"))
}

/// `extends("<pattern>")=<elementType>`
#[derive(Debug, Clone)]
pub struct SubclassPattern {
    /// The directive text as written
    pub directive: String,
    /// The pattern source
    pub pattern: String,
    /// The element type the matched rules extend
    pub element_type: String,
    regex: Regex,
}

impl SubclassPattern {
    /// Compile a subclass pattern
    pub fn new(
        directive: impl Into<String>,
        pattern: impl Into<String>,
        element_type: impl Into<String>,
    ) -> Result<Self> {
        let directive = directive.into();
        let pattern = pattern.into();
        let regex = regex_cache::get_or_compile_full_match(&pattern).map_err(|source| {
            ComposeError::InvalidExtendsPattern {
                directive: directive.clone(),
                source,
            }
        })?;

        Ok(Self {
            directive,
            pattern,
            element_type: element_type.into(),
            regex,
        })
    }

    /// Whether the pattern matches a whole rule name
    pub fn matches(&self, rule_name: &str) -> bool {
        self.regex.is_match(rule_name)
    }
}

/// Directives extracted from a grammar header
#[derive(Debug, Clone)]
pub struct HeaderDirectives {
    /// Superclass of the generated dispatch module
    pub base_class: ClassName,
    /// Whether `base_class` came from a `parserUtilClass` directive
    pub base_class_declared: bool,
    /// Parent parser class from `overrides="..."`
    pub overrides: Option<ClassName>,
    /// `extends(...)` directives in header order
    pub subclass_patterns: Vec<SubclassPattern>,
    /// Entries of an existing `parserImports=[...]` list, unquoted
    pub existing_imports: Vec<String>,
}

impl HeaderDirectives {
    /// Parse directives from header text, falling back to `default_base_class`
    pub fn parse(header: Option<&str>, default_base_class: &str) -> Result<Self> {
        let header = header.unwrap_or("");

        let declared_base = regex(
            &PARSER_UTIL_CLASS,
            r#"parserUtilClass\s*=\s*"([A-Za-z0-9_.$]+)""#,
        )
        .captures(header)
        .map(|c| c[1].to_string());
        let base_class_declared = declared_base.is_some();
        let base_class =
            ClassName::best_guess(declared_base.as_deref().unwrap_or(default_base_class));

        let overrides = regex(&OVERRIDES, r#"overrides\s*=\s*"([A-Za-z0-9_.]+)""#)
            .captures(header)
            .map(|c| ClassName::best_guess(&c[1]));

        let subclass_patterns = regex(
            &EXTENDS,
            r#"extends\(\s*"([^"]+)"\s*\)\s*=\s*([A-Za-z_][A-Za-z0-9_]*)"#,
        )
        .captures_iter(header)
        .map(|c| SubclassPattern::new(&c[0], &c[1], &c[2]))
        .collect::<Result<Vec<_>>>()?;

        let existing_imports: Vec<String> =
            regex(&PARSER_IMPORTS, r"parserImports\s*=\s*\[([^\]]*)\]")
                .captures(header)
                .map(|c| {
                    regex(&QUOTED, r#""((?:[^"\\]|\\.)*)""#)
                        .captures_iter(&c[1])
                        .map(|q| q[1].to_string())
                        .collect()
                })
                .unwrap_or_default();

        log_debug!(
            "header directives: base={} overrides={:?} patterns={} imports={}",
            base_class,
            overrides.as_ref().map(ToString::to_string),
            subclass_patterns.len(),
            existing_imports.len()
        );

        Ok(Self {
            base_class,
            base_class_declared,
            overrides,
            subclass_patterns,
            existing_imports,
        })
    }

    /// Whether any subclass pattern matches `rule_name`
    pub fn matches_subclass(&self, rule_name: &str) -> bool {
        self.subclass_patterns.iter().any(|p| p.matches(rule_name))
    }

    /// The parent dispatch module (`<overrides>Util`), if a parent is declared
    pub fn parent_dispatch_module(&self) -> Option<ClassName> {
        self.overrides.as_ref().map(|parent| parent.with_suffix("Util"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#"{
  parserUtilClass="com.example.CustomUtilBase"
  overrides="com.example.RootParser"
  extends(".*_stmt")=stmt
  extends("hello|bye")=greeting
  parserImports=[
    "static com.example.Helpers.*"
    "static com.example.More.thing"
  ]
}"#;

    #[test]
    fn test_parse_all_directives() {
        let directives = HeaderDirectives::parse(Some(HEADER), DEFAULT_BASE_CLASS).unwrap();

        assert_eq!(directives.base_class.to_string(), "com.example.CustomUtilBase");
        assert!(directives.base_class_declared);
        assert_eq!(
            directives.overrides.as_ref().unwrap().to_string(),
            "com.example.RootParser"
        );
        assert_eq!(directives.subclass_patterns.len(), 2);
        assert_eq!(directives.subclass_patterns[0].element_type, "stmt");
        assert_eq!(directives.subclass_patterns[1].pattern, "hello|bye");
        assert_eq!(
            directives.existing_imports,
            vec!["static com.example.Helpers.*", "static com.example.More.thing"]
        );
    }

    #[test]
    fn test_defaults_without_header() {
        let directives = HeaderDirectives::parse(None, DEFAULT_BASE_CLASS).unwrap();

        assert_eq!(directives.base_class.to_string(), DEFAULT_BASE_CLASS);
        assert!(!directives.base_class_declared);
        assert!(directives.overrides.is_none());
        assert!(directives.subclass_patterns.is_empty());
        assert!(directives.existing_imports.is_empty());
        assert!(directives.parent_dispatch_module().is_none());
    }

    #[test]
    fn test_subclass_matching_is_full() {
        let directives = HeaderDirectives::parse(Some(HEADER), DEFAULT_BASE_CLASS).unwrap();

        assert!(directives.matches_subclass("hello_stmt"));
        assert!(directives.matches_subclass("bye"));
        assert!(!directives.matches_subclass("goodbye"));
        assert!(!directives.matches_subclass("stmt"));
    }

    #[test]
    fn test_invalid_pattern_is_fatal() {
        let header = "{\n  extends(\"[unclosed\")=stmt\n}";
        match HeaderDirectives::parse(Some(header), DEFAULT_BASE_CLASS) {
            Err(ComposeError::InvalidExtendsPattern { directive, .. }) => {
                assert_eq!(directive, "extends(\"[unclosed\")=stmt");
            }
            other => panic!("expected invalid pattern error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_parent_dispatch_module() {
        let directives = HeaderDirectives::parse(Some(HEADER), DEFAULT_BASE_CLASS).unwrap();
        assert_eq!(
            directives.parent_dispatch_module().unwrap().to_string(),
            "com.example.RootParserUtil"
        );
    }

    #[test]
    fn test_empty_overrides_is_ignored() {
        let directives =
            HeaderDirectives::parse(Some("{\n  overrides=\"\"\n}"), DEFAULT_BASE_CLASS).unwrap();
        assert!(directives.overrides.is_none());
    }
}
