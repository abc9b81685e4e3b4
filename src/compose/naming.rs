//! Naming authority
//!
//! Every generated identifier that links the composed grammar to the dispatch
//! module is derived here, so both emitters agree by construction.

use hashbrown::HashMap;
use std::fmt;

use super::error::{ComposeError, Result};

/// Default suffix appended to indirection names
pub const DEFAULT_ACCESSOR_SUFFIX: &str = "Ext";

/// Suffix of the renamed production holding a rule's real body
pub const REAL_SUFFIX: &str = "_real";

/// Turn `snake_case` into `camelCase`: every `_x` becomes `X`
pub fn to_camel_case(name: &str) -> String {
    let mut output = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '_' {
            // `_\w` collapses; a run of underscores collapses with it
            while chars.peek() == Some(&'_') {
                chars.next();
            }
            match chars.next() {
                Some(next) => output.extend(next.to_uppercase()),
                None => output.push('_'),
            }
        } else {
            output.push(c);
        }
    }

    output
}

/// Title-case the first character (`root` → `Root`)
pub fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Name of the real production for a bare rule name
#[inline]
pub fn real_rule_name(bare: &str) -> String {
    format!("{}{}", bare, REAL_SUFFIX)
}

/// Derives indirection names and guarantees they are unique per grammar
#[derive(Debug, Clone)]
pub struct NamingAuthority {
    suffix: String,
    claimed: HashMap<String, String>,
}

impl NamingAuthority {
    /// Create an authority using the given accessor suffix
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            claimed: HashMap::new(),
        }
    }

    /// Indirection name for a bare rule name (pure, no bookkeeping)
    pub fn accessor(&self, bare: &str) -> String {
        format!("{}{}", to_camel_case(bare), self.suffix)
    }

    /// Claim the indirection name of `bare`
    ///
    /// Fails if a different rule already derived the same name, which would
    /// make two rules share one override slot.
    pub fn claim(&mut self, bare: &str) -> Result<String> {
        let accessor = self.accessor(bare);
        match self.claimed.get(&accessor) {
            Some(owner) if owner != bare => Err(ComposeError::AccessorCollision {
                first: owner.clone(),
                second: bare.to_string(),
                accessor,
            }),
            Some(_) => Ok(accessor),
            None => {
                self.claimed.insert(accessor.clone(), bare.to_string());
                Ok(accessor)
            }
        }
    }
}

impl Default for NamingAuthority {
    fn default() -> Self {
        Self::new(DEFAULT_ACCESSOR_SUFFIX)
    }
}

/// A JVM class name split into package and simple names
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassName {
    /// Dotted package, empty for the default package
    pub package: String,
    /// Simple names, outermost first
    pub simple_names: Vec<String>,
}

impl ClassName {
    /// Create a top-level class name
    pub fn new(package: impl Into<String>, simple_name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            simple_names: vec![simple_name.into()],
        }
    }

    /// Guess package and simple names from a dotted name
    ///
    /// Segments up to the first one starting with an uppercase letter form
    /// the package. Without any uppercase segment the last segment is taken
    /// as the class.
    pub fn best_guess(dotted: &str) -> Self {
        let segments: Vec<&str> = dotted.split('.').filter(|s| !s.is_empty()).collect();
        let split = segments
            .iter()
            .position(|s| s.starts_with(|c: char| c.is_uppercase()))
            .unwrap_or(segments.len().saturating_sub(1));

        Self {
            package: segments[..split].join("."),
            simple_names: segments[split..].iter().map(|s| s.to_string()).collect(),
        }
    }

    /// A class nested in this one
    pub fn nested(&self, name: impl Into<String>) -> Self {
        let mut nested = self.clone();
        nested.simple_names.push(name.into());
        nested
    }

    /// A sibling top-level class whose name is this class's name plus `suffix`
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self::new(self.package.clone(), format!("{}{}", self.simple_name(), suffix))
    }

    /// The innermost simple name
    pub fn simple_name(&self) -> &str {
        self.simple_names.last().map_or("", String::as_str)
    }

    /// The outermost class, the one an import refers to
    pub fn top_level(&self) -> Self {
        Self::new(
            self.package.clone(),
            self.simple_names.first().cloned().unwrap_or_default(),
        )
    }

    /// Simple names joined with dots (`GeneratedParserUtilBase.Parser`)
    pub fn relative_name(&self) -> String {
        self.simple_names.join(".")
    }

    /// Path of the class relative to a source root (`com/example/FooParser`)
    pub fn relative_path(&self) -> String {
        let mut parts: Vec<&str> = self.package.split('.').filter(|p| !p.is_empty()).collect();
        parts.push(self.simple_names.first().map_or("", String::as_str));
        parts.join("/")
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            write!(f, "{}", self.relative_name())
        } else {
            write!(f, "{}.{}", self.package, self.relative_name())
        }
    }
}
