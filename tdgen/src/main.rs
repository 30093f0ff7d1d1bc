//! Test-driven code generation CLI.
//!
//! `generate` reads the test files, asks the model for an implementation,
//! and drives the verify-fix loop until the tests pass or the retry budget
//! runs out. `gen-tests` generates one test file per segment of the
//! specification document, repairing build errors only.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use tdgen::batch::{BatchOutcome, SegmentImpossibleError, run_batch};
use tdgen::cycle::{CycleOutcome, CycleRequest, VerifyMode, run_cycle};
use tdgen::exit_codes;
use tdgen::io::config::{LoopConfig, TdgenPaths, init_scaffold, load_config};
use tdgen::io::model::CommandModel;
use tdgen::io::prompt::{Flow, PromptEngine};
use tdgen::io::verify::CommandVerifier;
use tdgen::io::workspace::Workspace;
use tdgen::logging;

#[derive(Parser)]
#[command(name = "tdgen", version, about = "Test-driven code generation loop")]
struct Cli {
    /// Workspace root (defaults to the current directory).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.tdgen/` scaffolding (config and cycle log directory).
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Generate the implementation from the test files and verify it.
    Generate,
    /// Generate one test file per spec segment, repairing build errors.
    GenTests,
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("resolve current directory")?,
    };
    match cli.command {
        Command::Init { force } => cmd_init(&root, force),
        Command::Generate => cmd_generate(&root),
        Command::GenTests => cmd_gen_tests(&root),
    }
}

fn cmd_init(root: &Path, force: bool) -> Result<i32> {
    let paths = init_scaffold(root, force)?;
    println!("initialized {}", paths.state_dir.display());
    Ok(exit_codes::OK)
}

fn cmd_generate(root: &Path) -> Result<i32> {
    let (workspace, config, engine) = load_env(root)?;
    let model = CommandModel::new(&config.model);
    let verifier = CommandVerifier::new(workspace.root(), &config.build, &config.test);

    let input = workspace.combined_test_input(&config.test_dir, &config.test_suffix)?;
    if input.trim().is_empty() {
        bail!("no test files under {}", config.test_dir);
    }

    let request = CycleRequest {
        target: config.source_file.clone(),
        input,
        flow: Flow::Implementation,
        mode: VerifyMode::CompileAndTest,
    };
    match run_cycle(&workspace, &model, &verifier, &engine, &request)? {
        CycleOutcome::Succeeded { .. } => {
            println!("Tests passed successfully.");
            Ok(exit_codes::OK)
        }
        CycleOutcome::Exhausted { .. } => {
            eprintln!("Code Generation is impossible.");
            Ok(exit_codes::EXHAUSTED)
        }
        CycleOutcome::Impossible { reason } => {
            eprintln!("error: Code Generation is impossible.{reason}");
            Ok(exit_codes::IMPOSSIBLE)
        }
    }
}

fn cmd_gen_tests(root: &Path) -> Result<i32> {
    let (workspace, config, engine) = load_env(root)?;
    let model = CommandModel::new(&config.model);
    let verifier = CommandVerifier::new(workspace.root(), &config.build, &config.test);

    match run_batch(&workspace, &model, &verifier, &engine, &config) {
        Ok(outcome) => Ok(report_batch(&outcome)),
        Err(err) => {
            if let Some(impossible) = err.downcast_ref::<SegmentImpossibleError>() {
                eprintln!("error: {impossible}");
                return Ok(exit_codes::IMPOSSIBLE);
            }
            Err(err)
        }
    }
}

fn report_batch(outcome: &BatchOutcome) -> i32 {
    println!("Test case generated!!");
    let exhausted = outcome.exhausted();
    if exhausted.is_empty() {
        return exit_codes::OK;
    }
    for segment in exhausted {
        eprintln!(
            "Code Generation is impossible. (segment {}: {})",
            segment.index, segment.target
        );
    }
    exit_codes::EXHAUSTED
}

fn load_env(root: &Path) -> Result<(Workspace, LoopConfig, PromptEngine)> {
    let workspace = Workspace::open(root)?;
    let paths = TdgenPaths::new(workspace.root());
    let config = load_config(&paths.config_path)?;
    let engine = PromptEngine::new(config.framework.as_str());
    Ok((workspace, config, engine))
}
