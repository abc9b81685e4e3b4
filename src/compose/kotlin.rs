//! Kotlin source writer
//!
//! A small line-oriented builder for one Kotlin file. Class references go
//! through an import manager: the first class to claim a simple name gets
//! imported, later classes with the same simple name are written fully
//! qualified. Classes in the file's own package and in `kotlin` need no
//! import.

use hashbrown::HashMap;
use std::borrow::Cow;
use std::collections::BTreeSet;

use super::naming::ClassName;

/// Packages imported by default in every Kotlin file
const DEFAULT_PACKAGES: [&str; 1] = ["kotlin"];

/// Kotlin hard keywords, which need backticks when used as identifiers
const HARD_KEYWORDS: [&str; 28] = [
    "as", "break", "class", "continue", "do", "else", "false", "for", "fun", "if", "in",
    "interface", "is", "null", "object", "package", "return", "super", "this", "throw", "true",
    "try", "typealias", "typeof", "val", "var", "when", "while",
];

/// Escape an identifier that collides with a hard keyword
pub fn escape_identifier(name: &str) -> Cow<'_, str> {
    if HARD_KEYWORDS.contains(&name) {
        Cow::Owned(format!("`{}`", name))
    } else {
        Cow::Borrowed(name)
    }
}

/// Decides how class references are written
#[derive(Debug, Clone)]
pub struct ImportManager {
    package: String,
    claimed: HashMap<String, ClassName>,
    imports: BTreeSet<String>,
}

impl ImportManager {
    /// Create a manager for a file in `package`
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            claimed: HashMap::new(),
            imports: BTreeSet::new(),
        }
    }

    /// Reserve a simple name for a class declared in this file
    pub fn declare(&mut self, simple_name: &str) {
        let class = ClassName::new(self.package.clone(), simple_name);
        self.claimed.insert(simple_name.to_string(), class);
    }

    /// The text to write for a class reference
    pub fn reference(&mut self, class: &ClassName) -> String {
        let top = class.top_level();
        let simple = top.simple_name().to_string();

        match self.claimed.get(&simple) {
            Some(owner) if *owner == top => class.relative_name(),
            Some(_) => class.to_string(),
            None => {
                let implicit = top.package == self.package
                    || DEFAULT_PACKAGES.contains(&top.package.as_str());
                if !implicit {
                    self.imports.insert(top.to_string());
                }
                self.claimed.insert(simple, top);
                class.relative_name()
            }
        }
    }

    /// Imports in sorted order
    pub fn imports(&self) -> impl Iterator<Item = &str> {
        self.imports.iter().map(String::as_str)
    }
}

/// Builder for one Kotlin source file
#[derive(Debug, Clone)]
pub struct KotlinFile {
    imports: ImportManager,
    body: String,
    depth: usize,
}

impl KotlinFile {
    /// Indentation unit
    pub const INDENT: &'static str = "  ";

    /// Start a file in `package`
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            imports: ImportManager::new(package),
            body: String::new(),
            depth: 0,
        }
    }

    /// Reserve the simple name of a class declared in this file
    pub fn declare(&mut self, simple_name: &str) {
        self.imports.declare(simple_name);
    }

    /// Reference a class, importing it when possible
    pub fn class(&mut self, class: &ClassName) -> String {
        self.imports.reference(class)
    }

    /// Write one line at the current depth
    pub fn line(&mut self, text: &str) {
        if text.is_empty() {
            self.body.push('\n');
            return;
        }
        for _ in 0..self.depth {
            self.body.push_str(Self::INDENT);
        }
        self.body.push_str(text);
        self.body.push('\n');
    }

    /// Write a line and indent what follows
    pub fn open(&mut self, text: &str) {
        self.line(text);
        self.depth += 1;
    }

    /// Dedent and write a closing line
    pub fn close(&mut self, text: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    /// Dedent, write a line and indent again (`} else {`)
    pub fn reopen(&mut self, text: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.open(text);
    }

    /// Write an empty line
    pub fn blank(&mut self) {
        self.body.push('\n');
    }

    /// Assemble package clause, imports and body
    pub fn finish(self) -> String {
        let mut output = String::with_capacity(self.body.len() + 256);
        if !self.imports.package.is_empty() {
            output.push_str("package ");
            output.push_str(&self.imports.package);
            output.push_str("\n\n");
        }

        let mut any_import = false;
        for import in self.imports.imports() {
            output.push_str("import ");
            output.push_str(import);
            output.push('\n');
            any_import = true;
        }
        if any_import {
            output.push('\n');
        }

        output.push_str(&self.body);
        output
    }
}
