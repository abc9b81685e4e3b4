//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types from bnf-composer.
//! Importing this module with a wildcard import brings the core types into scope:
//!
//! ```
//! use bnf_composer::prelude::*;
//! ```
//!
//! # Re-exported Items
//!
//! ## Composition
//! - [`GrammarComposer`] - Runs the pipeline for one grammar
//! - [`ComposedGrammar`] - Composed grammar text and dispatch module source
//! - [`ComposerConfig`] - Composer settings
//! - [`GrammarNames`] - Names derived from a grammar's package and stem
//!
//! ## Build Integration
//! - [`CompositionJob`] - One grammar file to compose and write
//! - [`OutputLayout`] - Output names and paths of one grammar
//! - [`compose_batch()`] - Compose many jobs
//! - [`discover()`] - Find grammar files below a source root
//!
//! ## Dispatch
//! - [`IndirectionTable`] - In-process override table
//! - [`DispatchPlan`] - Description of a dispatch module
//! - [`NoMatch`] - Element constructor miss
//!
//! ## Error Handling
//! - [`ComposeError`] - Composition error
//! - [`Result`] - Result alias

// ============================================================================
// Composition
// ============================================================================

pub use crate::compose::{ComposedGrammar, ComposerConfig, GrammarComposer, GrammarNames};

// ============================================================================
// Build Integration
// ============================================================================

pub use crate::compose::{
    compose_batch, discover, CompositionJob, CompositionOutput, OutputLayout, ParallelConfig,
    ParserOutputs,
};

// ============================================================================
// Dispatch
// ============================================================================

pub use crate::compose::{DispatchPlan, IndirectionTable, NoMatch, Slot};

// ============================================================================
// Error Handling
// ============================================================================

pub use crate::compose::{ComposeError, Result};
