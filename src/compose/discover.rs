//! Grammar discovery below a source root

use std::path::{Path, PathBuf};

use super::composer::CompositionJob;
use super::error::{ComposeError, Result};
use super::layout::GRAMMAR_EXTENSION;

/// Directory below the build directory holding per-grammar outputs
pub const GRAMMARS_DIR: &str = "grammars";

/// A grammar file found below a source root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredGrammar {
    /// The grammar file
    pub path: PathBuf,
    /// Relative path with separators turned into `_` and the extension
    /// dropped (`com/example/foo.bnf` → `com_example_foo`)
    pub task_name: String,
}

impl DiscoveredGrammar {
    /// Describe a grammar file below `root`
    pub fn new(path: impl Into<PathBuf>, root: &Path) -> Result<Self> {
        let path = path.into();
        let task_name = task_name(&path, root)?;
        Ok(Self { path, task_name })
    }

    /// This grammar's output directory below `build_dir`
    pub fn output_dir(&self, build_dir: &Path) -> PathBuf {
        build_dir.join(GRAMMARS_DIR).join(&self.task_name)
    }

    /// The composition job for this grammar
    pub fn job(&self, root: &Path, build_dir: &Path) -> CompositionJob {
        CompositionJob::new(&self.path, root, self.output_dir(build_dir))
    }
}

/// Task name of a grammar file below `root`
pub fn task_name(path: &Path, root: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        ComposeError::layout(format!(
            "{} is not below the source root {}",
            path.display(),
            root.display()
        ))
    })?;

    let segments: Vec<String> = relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if segments.is_empty() {
        return Err(ComposeError::layout(format!(
            "{} does not name a grammar file",
            path.display()
        )));
    }
    Ok(segments.join("_"))
}

/// Find every grammar file below `root`, sorted by path
pub fn discover(root: &Path) -> Result<Vec<DiscoveredGrammar>> {
    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&root.display().to_string()),
        GRAMMAR_EXTENSION
    );
    let entries = glob::glob(&pattern).map_err(|e| ComposeError::layout(e.to_string()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            ComposeError::io(path, e.into())
        })?;
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    log_debug!("found {} grammars below {}", paths.len(), root.display());
    paths
        .into_iter()
        .map(|path| DiscoveredGrammar::new(path, root))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_task_name() {
        let root = Path::new("/src/main/kotlin");
        let name = task_name(Path::new("/src/main/kotlin/com/example/foo.bnf"), root).unwrap();
        assert_eq!(name, "com_example_foo");
        assert_eq!(task_name(Path::new("/src/main/kotlin/top.bnf"), root).unwrap(), "top");
    }

    #[test]
    fn test_task_name_outside_root() {
        let result = task_name(Path::new("/other/foo.bnf"), Path::new("/src"));
        assert!(matches!(result, Err(ComposeError::InvalidLayout { .. })));
    }

    #[test]
    fn test_output_dir() {
        let grammar =
            DiscoveredGrammar::new("/src/com/example/bar.bnf", Path::new("/src")).unwrap();
        assert_eq!(
            grammar.output_dir(Path::new("/project/build")),
            PathBuf::from("/project/build/grammars/com_example_bar")
        );

        let job = grammar.job(Path::new("/src"), Path::new("/project/build"));
        assert_eq!(job.input, PathBuf::from("/src/com/example/bar.bnf"));
        assert_eq!(job.output_dir, PathBuf::from("/project/build/grammars/com_example_bar"));
    }

    #[test]
    fn test_discover_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("com/example")).unwrap();
        fs::write(root.join("com/example/foo.bnf"), "a ::= 'a'").unwrap();
        fs::write(root.join("com/example/bar.bnf"), "b ::= 'b'").unwrap();
        fs::write(root.join("com/example/notes.txt"), "").unwrap();
        fs::write(root.join("top.bnf"), "t ::= 't'").unwrap();

        let found = discover(root).unwrap();
        let names: Vec<&str> = found.iter().map(|g| g.task_name.as_str()).collect();
        assert_eq!(names, vec!["com_example_bar", "com_example_foo", "top"]);
    }
}
