//! Grammar composition core
//!
//! Rewrites a BNF grammar into an extensible form in which every public rule
//! can be overridden at runtime by a derived grammar, and generates the
//! companion dispatch module holding the override slots.
//!
//! # Module Organization
//!
//! ## Pipeline
//! - [`scanner`] - Splits grammar text into header and ordered rules
//! - [`directives`] - Extracts header directives
//! - [`classify`] - Partitions rules into extendable, private and subclass rules
//! - [`rewrite`] - Rewrites rule bodies and references
//! - [`emitter`] - Assembles the composed grammar
//! - [`dispatch_gen`] - Plans and renders the dispatch module
//! - [`composer`] - Runs the pipeline for one grammar
//!
//! ## Support
//! - [`tokens`] - Flat tokenizer for rule bodies
//! - [`attributes`] - Trailing attribute blocks
//! - [`naming`] - Indirection names and class names
//! - [`kotlin`] - Kotlin source writer
//! - [`regex_cache`] - Thread-local regex cache
//!
//! ## Runtime
//! - [`dispatch`] - In-process indirection table
//!
//! ## Build Integration
//! - [`layout`] - Output names and paths
//! - [`discover`] - Grammar discovery below a source root
//! - [`writer`] - Paired atomic writes
//! - [`parallel`] - Batch composition

// ============================================================================
// Module Declarations
// ============================================================================

pub mod attributes;
pub mod classify;
pub mod composer;
pub mod config;
pub mod directives;
pub mod discover;
pub mod dispatch;
pub mod dispatch_gen;
pub mod emitter;
pub mod error;
pub mod kotlin;
pub mod layout;
pub mod naming;
pub mod regex_cache;
pub mod rewrite;
pub mod scanner;
pub mod tokens;
pub mod writer;

// Batch composition (always available, uses rayon when feature is enabled)
pub mod parallel;

// ============================================================================
// Core Types
// ============================================================================

pub use composer::{ComposedGrammar, CompositionJob, CompositionOutput, GrammarComposer};
pub use config::{ComposerConfig, ParallelConfig};
pub use error::{ComposeError, Result};

// ============================================================================
// Pipeline Stages
// ============================================================================

pub use classify::{Classification, RuleKind};
pub use directives::{HeaderDirectives, SubclassPattern, DEFAULT_BASE_CLASS};
pub use rewrite::{ImportSet, RewrittenRule, RuleRewriter};
pub use scanner::{GrammarSource, RuleEntry, RuleTable};

// ============================================================================
// Naming
// ============================================================================

pub use naming::{ClassName, NamingAuthority};

// ============================================================================
// Dispatch
// ============================================================================

pub use dispatch::{DispatchError, IndirectionTable, NoMatch, Slot};
pub use dispatch_gen::{DispatchPlan, ParentBinding, SlotPlan};

// ============================================================================
// Build Integration
// ============================================================================

pub use discover::{discover, DiscoveredGrammar};
pub use layout::{GrammarNames, OutputLayout, ParserOutputs};
pub use parallel::compose_batch;
pub use writer::{ArtifactWriter, FileStatus, WrittenFile};
