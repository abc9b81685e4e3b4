//! Output layout
//!
//! Every generated name is a deterministic function of the grammar file's
//! stem and its directory relative to the source root:
//!
//! | Artifact                | Name                                   |
//! |-------------------------|----------------------------------------|
//! | output package          | `com/example/foo.bnf` → `com.example`  |
//! | syntax-tree package     | `<pkg>.psi`                            |
//! | implementation package  | `<pkg>.psi.impl`                       |
//! | parser class            | `<pkg>.FooParser`                      |
//! | dispatch module         | `<pkg>.FooParserUtil`                  |
//! | element-type holder     | `<pkg>.psi.FooTypes`                   |
//! | composed grammar        | `<out>/foo_gen.bnf`                    |
//! | dispatch module source  | `<out>/com/example/FooParserUtil.kt`   |

use std::path::{Component, Path, PathBuf};

use super::config::ComposerConfig;
use super::error::{ComposeError, Result};
use super::naming::{title_case, ClassName};

/// Extension of grammar files
pub const GRAMMAR_EXTENSION: &str = "bnf";

/// Extension of the generated dispatch module
pub const MODULE_EXTENSION: &str = "kt";

const PSI_PACKAGE: &str = "psi";

/// Names derived from one grammar file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarNames {
    /// Dotted output package, empty for the source root itself
    pub package: String,
    /// File stem as written (`foo`)
    pub stem: String,
}

impl GrammarNames {
    /// Create names for a stem in a package
    pub fn new(package: impl Into<String>, stem: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            stem: stem.into(),
        }
    }

    /// Title-cased stem (`foo` → `Foo`)
    pub fn title(&self) -> String {
        title_case(&self.stem)
    }

    /// Syntax-tree node package
    pub fn psi_package(&self) -> String {
        qualify(&self.package, PSI_PACKAGE)
    }

    /// Syntax-tree implementation package
    pub fn psi_impl_package(&self) -> String {
        format!("{}.impl", self.psi_package())
    }

    /// The parser class produced by the downstream generator
    pub fn parser_class(&self) -> ClassName {
        ClassName::new(self.package.clone(), format!("{}Parser", self.title()))
    }

    /// The generated dispatch module
    pub fn dispatch_module(&self) -> ClassName {
        ClassName::new(self.package.clone(), format!("{}ParserUtil", self.title()))
    }

    /// The element-type holder produced by the downstream generator
    pub fn element_holder(&self) -> ClassName {
        ClassName::new(self.psi_package(), format!("{}Types", self.title()))
    }
}

fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", package, name)
    }
}

/// Where one grammar's artifacts go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// Derived names
    pub names: GrammarNames,
    /// The input grammar file
    pub input: PathBuf,
    /// The output directory for this grammar
    pub output_dir: PathBuf,
    /// Path of the composed grammar
    pub grammar_path: PathBuf,
    /// Path of the dispatch module source
    pub module_path: PathBuf,
}

impl OutputLayout {
    /// Compute the layout of `input`, a grammar file below `root`
    pub fn resolve(
        input: impl AsRef<Path>,
        root: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        config: &ComposerConfig,
    ) -> Result<Self> {
        let input = input.as_ref();
        let names = derive_names(input, root.as_ref())?;
        let output_dir = output_dir.as_ref().to_path_buf();

        let grammar_path = output_dir.join(format!(
            "{}{}.{}",
            names.stem, config.generated_suffix, GRAMMAR_EXTENSION
        ));
        let mut module_path = output_dir.clone();
        for segment in names.package.split('.').filter(|s| !s.is_empty()) {
            module_path.push(segment);
        }
        module_path.push(format!(
            "{}.{}",
            names.dispatch_module().simple_name(),
            MODULE_EXTENSION
        ));

        Ok(Self {
            names,
            input: input.to_path_buf(),
            output_dir,
            grammar_path,
            module_path,
        })
    }

    /// The descriptor handed to the downstream parser generator
    pub fn parser_outputs(&self) -> ParserOutputs {
        ParserOutputs {
            grammar: self.grammar_path.clone(),
            parser_class_path: to_native(&self.names.parser_class().relative_path()),
            psi_path: to_native(&self.names.psi_package().replace('.', "/")),
        }
    }
}

fn to_native(slash_path: &str) -> PathBuf {
    slash_path.split('/').collect()
}

/// Derive package and stem from the file's position below `root`
pub fn derive_names(input: &Path, root: &Path) -> Result<GrammarNames> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ComposeError::layout(format!("{} has no usable file stem", input.display()))
        })?;

    let parent = input.parent().unwrap_or_else(|| Path::new(""));
    let relative = parent.strip_prefix(root).map_err(|_| {
        ComposeError::layout(format!(
            "{} is not below the source root {}",
            input.display(),
            root.display()
        ))
    })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => match segment.to_str() {
                Some(segment) => segments.push(segment),
                None => {
                    return Err(ComposeError::layout(format!(
                        "{} contains a directory name that is not UTF-8",
                        input.display()
                    )))
                }
            },
            Component::CurDir => {}
            _ => {
                return Err(ComposeError::layout(format!(
                    "{} escapes the source root {}",
                    input.display(),
                    root.display()
                )))
            }
        }
    }

    Ok(GrammarNames::new(segments.join("."), stem))
}

/// What the downstream parser generator needs to know about one grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOutputs {
    /// The composed grammar to generate from
    pub grammar: PathBuf,
    /// Parser class as a path relative to the output root (`com/example/FooParser`)
    pub parser_class_path: PathBuf,
    /// Syntax-tree package as a directory relative to the output root
    pub psi_path: PathBuf,
}
