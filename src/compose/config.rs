//! Composer configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::directives::DEFAULT_BASE_CLASS;
use super::error::{ComposeError, Result};
use super::naming::DEFAULT_ACCESSOR_SUFFIX;

/// Default suffix of the composed grammar's file stem
pub const DEFAULT_GENERATED_SUFFIX: &str = "_gen";

/// Configuration for composing grammars
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Dispatch module superclass when the header declares no `parserUtilClass`
    pub default_base_class: String,
    /// Suffix appended to indirection names
    pub accessor_suffix: String,
    /// Suffix of the composed grammar's file stem
    pub generated_suffix: String,
    /// Leave outputs whose bytes are already up to date untouched
    pub skip_unchanged: bool,
    /// Batch composition settings
    pub parallel: ParallelConfig,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            default_base_class: DEFAULT_BASE_CLASS.to_string(),
            accessor_suffix: DEFAULT_ACCESSOR_SUFFIX.to_string(),
            generated_suffix: DEFAULT_GENERATED_SUFFIX.to_string(),
            skip_unchanged: true,
            parallel: ParallelConfig::default(),
        }
    }
}

impl ComposerConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file; missing keys take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ComposeError::io(path, e))?;
        serde_json::from_str(&text).map_err(|source| ComposeError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Set the default dispatch module superclass
    pub fn with_default_base_class(mut self, class: impl Into<String>) -> Self {
        self.default_base_class = class.into();
        self
    }

    /// Set the accessor suffix
    pub fn with_accessor_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.accessor_suffix = suffix.into();
        self
    }

    /// Set the composed grammar's stem suffix
    pub fn with_generated_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.generated_suffix = suffix.into();
        self
    }

    /// Set whether unchanged outputs are left untouched
    pub fn with_skip_unchanged(mut self, skip: bool) -> Self {
        self.skip_unchanged = skip;
        self
    }

    /// Set the batch composition settings
    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Configuration for batch composition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Number of threads to use (None = auto)
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of threads to use
    pub fn with_num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }
}
