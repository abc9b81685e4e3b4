//! bnf-composer - Extensible grammar composition for BNF parser generators
//!
//! Rewrites a BNF grammar so that a derived grammar can override any of its
//! public rules at runtime without copying the grammar. It provides:
//! - Rule scanning and header directive parsing
//! - Reference rewriting through generated override-aware accessors
//! - Generation of the companion dispatch module (Kotlin source)
//! - An in-process indirection table with the same override semantics
//! - Output layout, discovery and paired atomic writes for build tools
//! - Optional parallel batch composition
//!
//! ## Quick Start
//!
//! ```rust
//! use bnf_composer::prelude::*;
//!
//! let grammar = "a ::= b c\nb ::= 'x'\nc ::= 'y'\n";
//! let composer = GrammarComposer::default();
//! let composed = composer
//!     .compose(grammar, &GrammarNames::new("com.example", "foo"))
//!     .unwrap();
//!
//! assert!(composed.grammar_text.contains("root ::= <<aExt a_real>>"));
//! assert!(composed.dispatch_source.contains("object FooParserUtil"));
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Build the `bnf-composer` binary (default)
//! - `logging` - Enable debug logging using the `log` crate
//! - `parallel` - Compose batches on rayon's thread pool

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

/// Logging macros - no-op when logging feature is disabled
#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        if false {
            let _ = format!($($arg)*);
        }
    }};
}

/// Logging macros - use log crate when logging feature is enabled
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        if false {
            let _ = format!($($arg)*);
        }
    }};
}

#[cfg(feature = "logging")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

// Prelude module for convenient imports
pub mod prelude;

// Composition core
pub mod compose;

/// Re-export commonly used types for convenience
pub use compose::{
    compose_batch, discover, ComposeError, ComposedGrammar, ComposerConfig, CompositionJob,
    CompositionOutput, DispatchPlan, GrammarComposer, GrammarNames, IndirectionTable,
    OutputLayout, ParserOutputs, Result,
};
