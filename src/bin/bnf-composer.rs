//! Command-line interface for bnf-composer
//!
//! Usage:
//!   bnf-composer compose `<file>` --root `<dir>` --out `<dir>`        - Compose one grammar
//!   bnf-composer build --root `<dir>` --build-dir `<dir>`             - Compose every grammar below root
//!   bnf-composer print `<file>` --root `<dir>` [--module]             - Print a composed artifact
//!
//! Every subcommand accepts `--config <file>` (JSON composer settings) and
//! `-v` (repeatable) to raise log verbosity; `RUST_LOG` wins when set.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bnf_composer::compose::discover::GRAMMARS_DIR;
use bnf_composer::prelude::{
    compose_batch, discover, ComposerConfig, CompositionJob, GrammarComposer, OutputLayout,
};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_logging(matches.get_count("verbose"));

    let composer = match load_composer(matches.get_one::<PathBuf>("config")) {
        Ok(composer) => composer,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = match matches.subcommand() {
        Some(("compose", sub)) => handle_compose_command(&composer, sub),
        Some(("build", sub)) => handle_build_command(&composer, sub),
        Some(("print", sub)) => handle_print_command(&composer, sub),
        _ => Err("no subcommand given".to_string()),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cli() -> Command {
    let root = Arg::new("root")
        .long("root")
        .short('r')
        .help("Source root the output package is computed from")
        .value_parser(value_parser!(PathBuf))
        .required(true);

    Command::new("bnf-composer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Rewrites BNF grammars into composable grammars with override dispatch")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("JSON file with composer settings")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Raise log verbosity (repeatable)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            Command::new("compose")
                .about("Compose one grammar and write both artifacts")
                .arg(grammar_arg())
                .arg(root.clone())
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .help("Output directory for this grammar")
                        .value_parser(value_parser!(PathBuf))
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("build")
                .about("Discover and compose every grammar below the source root")
                .arg(root.clone())
                .arg(
                    Arg::new("build-dir")
                        .long("build-dir")
                        .short('b')
                        .help("Build directory; outputs go to <build-dir>/grammars/<task>")
                        .value_parser(value_parser!(PathBuf))
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("print")
                .about("Print a composed artifact without writing anything")
                .arg(grammar_arg())
                .arg(root)
                .arg(
                    Arg::new("module")
                        .long("module")
                        .short('m')
                        .help("Print the dispatch module instead of the grammar")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn grammar_arg() -> Arg {
    Arg::new("grammar")
        .help("Path to the .bnf grammar")
        .value_parser(value_parser!(PathBuf))
        .required(true)
        .index(1)
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_composer(config: Option<&PathBuf>) -> Result<GrammarComposer, String> {
    let config = match config {
        Some(path) => ComposerConfig::from_json_file(path).map_err(|e| e.to_string())?,
        None => ComposerConfig::default(),
    };
    Ok(GrammarComposer::new(config))
}

fn path_arg<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a Path, String> {
    matches
        .get_one::<PathBuf>(name)
        .map(PathBuf::as_path)
        .ok_or_else(|| format!("missing --{}", name))
}

/// Handle the compose command
fn handle_compose_command(composer: &GrammarComposer, matches: &ArgMatches) -> Result<ExitCode, String> {
    let job = CompositionJob::new(
        path_arg(matches, "grammar")?,
        path_arg(matches, "root")?,
        path_arg(matches, "out")?,
    );
    let output = composer.run(&job).map_err(|e| e.to_string())?;

    println!("{}", output.grammar.path.display());
    println!("{}", output.module.path.display());
    Ok(ExitCode::SUCCESS)
}

/// Handle the build command
fn handle_build_command(composer: &GrammarComposer, matches: &ArgMatches) -> Result<ExitCode, String> {
    let root = path_arg(matches, "root")?;
    let build_dir = path_arg(matches, "build-dir")?;

    let grammars = discover(root).map_err(|e| e.to_string())?;
    if grammars.is_empty() {
        eprintln!("no grammars found below {}", root.display());
        return Ok(ExitCode::SUCCESS);
    }

    let jobs: Vec<CompositionJob> = grammars.iter().map(|g| g.job(root, build_dir)).collect();
    let results = compose_batch(composer, &jobs);

    let mut failed = 0usize;
    for (grammar, result) in grammars.iter().zip(results) {
        match result {
            Ok(output) => println!(
                "{}: {} ({:?})",
                grammar.task_name,
                output.grammar.path.display(),
                output.grammar.status
            ),
            Err(e) => {
                failed += 1;
                eprintln!("{}: {}", grammar.task_name, e);
            }
        }
    }

    if failed > 0 {
        eprintln!(
            "{} of {} grammars failed (outputs in {})",
            failed,
            jobs.len(),
            build_dir.join(GRAMMARS_DIR).display()
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Handle the print command
fn handle_print_command(composer: &GrammarComposer, matches: &ArgMatches) -> Result<ExitCode, String> {
    let grammar = path_arg(matches, "grammar")?;
    let root = path_arg(matches, "root")?;

    let layout = OutputLayout::resolve(grammar, root, Path::new("."), composer.config())
        .map_err(|e| e.to_string())?;
    let composed = composer.compose_file(&layout).map_err(|e| e.to_string())?;

    if matches.get_flag("module") {
        print!("{}", composed.dispatch_source);
    } else {
        print!("{}", composed.grammar_text);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        cli().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = cli()
            .try_get_matches_from([
                "bnf-composer",
                "print",
                "foo.bnf",
                "--root",
                "src",
                "-vv",
                "--config",
                "composer.json",
            ])
            .unwrap();
        assert_eq!(matches.get_count("verbose"), 2);
        assert_eq!(
            matches.get_one::<PathBuf>("config"),
            Some(&PathBuf::from("composer.json"))
        );
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "print");
        assert!(!sub.get_flag("module"));
    }
}
