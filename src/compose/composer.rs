//! Grammar composer
//!
//! Runs the whole pipeline for one grammar: scan, parse directives,
//! classify, rewrite, emit the composed grammar and generate the dispatch
//! module. Both artifacts come out of one pass over one naming authority, so
//! every accessor called from the grammar is declared in the module.

use std::fs;
use std::path::{Path, PathBuf};

use super::classify::{Classification, RuleKind};
use super::config::ComposerConfig;
use super::directives::HeaderDirectives;
use super::dispatch_gen::{DispatchPlan, ParentBinding, SlotPlan};
use super::emitter::{emit_grammar, emit_header};
use super::error::{ComposeError, Result};
use super::layout::{GrammarNames, OutputLayout, ParserOutputs};
use super::naming::{real_rule_name, NamingAuthority, REAL_SUFFIX};
use super::rewrite::{RewrittenRule, RuleRewriter, ROOT_RULE};
use super::scanner::{bare_name, GrammarSource, RuleTable};
use super::writer::{Artifact, ArtifactWriter, WrittenFile};

/// The two artifacts composed from one grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedGrammar {
    /// The composed grammar text
    pub grammar_text: String,
    /// The dispatch module source
    pub dispatch_source: String,
    /// The plan the dispatch module was rendered from
    pub plan: DispatchPlan,
    /// Rule names declared more than once in the input
    pub duplicates: Vec<String>,
}

/// One grammar file to compose and write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionJob {
    /// The grammar file
    pub input: PathBuf,
    /// The source root the output package is computed from
    pub root: PathBuf,
    /// This grammar's output directory
    pub output_dir: PathBuf,
}

impl CompositionJob {
    /// Create a job
    pub fn new(
        input: impl Into<PathBuf>,
        root: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: input.into(),
            root: root.into(),
            output_dir: output_dir.into(),
        }
    }
}

/// Result of a job that was composed and written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionOutput {
    /// Where everything went
    pub layout: OutputLayout,
    /// The composed grammar file
    pub grammar: WrittenFile,
    /// The dispatch module file
    pub module: WrittenFile,
}

impl CompositionOutput {
    /// The descriptor for the downstream parser generator
    pub fn parser_outputs(&self) -> ParserOutputs {
        self.layout.parser_outputs()
    }
}

/// Composes grammars with one configuration
#[derive(Debug, Clone, Default)]
pub struct GrammarComposer {
    config: ComposerConfig,
}

impl GrammarComposer {
    /// Create a composer
    pub fn new(config: ComposerConfig) -> Self {
        Self { config }
    }

    /// The configuration in use
    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Compose grammar text
    pub fn compose(&self, text: &str, names: &GrammarNames) -> Result<ComposedGrammar> {
        self.compose_source(GrammarSource::scan(text)?, names)
    }

    /// Read and compose the grammar file of a layout
    pub fn compose_file(&self, layout: &OutputLayout) -> Result<ComposedGrammar> {
        let text = read_grammar(&layout.input)?;
        let source = GrammarSource::scan_file_contents(&text, &layout.input)?;
        self.compose_source(source, &layout.names)
    }

    /// Compose a job and write both artifacts
    pub fn run(&self, job: &CompositionJob) -> Result<CompositionOutput> {
        let layout = OutputLayout::resolve(&job.input, &job.root, &job.output_dir, &self.config)?;
        let composed = self.compose_file(&layout)?;

        let [grammar, module] = ArtifactWriter::new(self.config.skip_unchanged).write_all([
            Artifact::new(&layout.grammar_path, &composed.grammar_text),
            Artifact::new(&layout.module_path, &composed.dispatch_source),
        ])?;

        Ok(CompositionOutput {
            layout,
            grammar,
            module,
        })
    }

    fn compose_source(
        &self,
        source: GrammarSource,
        names: &GrammarNames,
    ) -> Result<ComposedGrammar> {
        let directives =
            HeaderDirectives::parse(source.header.as_deref(), &self.config.default_base_class)?;
        let classification = Classification::classify(&source.rules, &directives);
        check_reserved_names(&source.rules, &classification)?;

        let mut naming = NamingAuthority::new(self.config.accessor_suffix.clone());
        let mut accessors = Vec::new();
        for entry in classification.rules_of(&source.rules, RuleKind::Extendable) {
            accessors.push(naming.claim(entry.bare_name())?);
        }

        let mut rewriter =
            RuleRewriter::new(&classification, &naming, directives.overrides.as_ref());
        let root_rule = rewriter.root_rule(bare_name(&source.first_rule));

        let extendable: Vec<RewrittenRule> = classification
            .rules_of(&source.rules, RuleKind::Extendable)
            .map(|entry| rewriter.rewrite_overridable(entry, RuleKind::Extendable))
            .collect();
        let unextendable: Vec<RewrittenRule> = classification
            .unextendable(&source.rules)
            .map(|(entry, kind)| match kind {
                RuleKind::Subclass => rewriter.rewrite_subclass(entry),
                _ => rewriter.rewrite_overridable(entry, kind),
            })
            .collect();

        let imports = rewriter.into_imports();
        let header = emit_header(
            source.header.as_deref(),
            names,
            &imports,
            &directives.existing_imports,
        );
        let grammar_text = emit_grammar(&header, &root_rule, &extendable, &unextendable);

        let plan = DispatchPlan {
            module: names.dispatch_module(),
            base_class: directives.base_class,
            parser_class: names.parser_class(),
            element_holder: names.element_holder(),
            slots: extendable
                .iter()
                .zip(accessors)
                .map(|(rule, accessor)| {
                    SlotPlan::new(rule.bare.clone(), accessor, rule.override_enabled)
                })
                .collect(),
            parent: directives.overrides.map(ParentBinding::new),
        };
        let dispatch_source = plan.render_kotlin();

        log_debug!(
            "composed {}: {} slots, {} unextendable rules, {} imports",
            names.stem,
            plan.slots.len(),
            unextendable.len(),
            imports.len()
        );

        Ok(ComposedGrammar {
            grammar_text,
            dispatch_source,
            plan,
            duplicates: source.duplicates,
        })
    }
}

/// Reject rules named like the synthesized root or another rule's real production
fn check_reserved_names(rules: &RuleTable, classification: &Classification) -> Result<()> {
    for entry in rules.iter() {
        let bare = entry.bare_name();
        let generated = if bare == ROOT_RULE {
            Some(ROOT_RULE.to_string())
        } else {
            bare.strip_suffix(REAL_SUFFIX)
                .filter(|base| {
                    classification
                        .reference_kind(base)
                        .map_or(false, RuleKind::has_real_production)
                })
                .map(real_rule_name)
        };

        if let Some(generated) = generated {
            return Err(ComposeError::ReservedRuleName {
                name: entry.name.clone(),
                generated,
            });
        }
    }
    Ok(())
}

fn read_grammar(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ComposeError::io(path, e))
}
