//! argbind: The argument-binding compiler CLI.
//!
//! Usage:
//!   argbind [options] [file...]
//!
//! Compiles the binding prologue of every body in the given units, prints
//! diagnostics, and optionally disassembles or runs a compiled body.

use argbind_ast::Body;
use argbind_compiler::{CompileOutput, CompiledBody, Program};
use argbind_diagnostics::{messages, Diagnostic};
use argbind_options::{parse_config_file, CompilerOptions, ProjectConfig, PROJECT_FILE_NAME};
use argbind_vm::{Machine, Value};
use clap::Parser as ClapParser;
use miette::{miette, IntoDiagnostic, WrapErr};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser, Debug)]
#[command(name = "argbind", about = "argbind - compiles parameter lists into binding instructions")]
struct Cli {
    /// Compilation units (JSON) to compile.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Path to argbind.json.
    #[arg(short = 'p', long = "project")]
    project: Option<PathBuf>,

    /// Print the instruction stream of every compiled body.
    #[arg(long)]
    disasm: bool,

    /// Run the named body against `--args`.
    #[arg(long, value_name = "BODY")]
    run: Option<String>,

    /// Call-time arguments as a JSON array, or the right-hand side of a
    /// multiple assignment.
    #[arg(long, value_name = "JSON", default_value = "[]")]
    args: String,

    /// Persist compiled bodies under this directory.
    #[arg(long = "cache-dir")]
    cache_dir: Option<String>,

    /// Do not read or write the compilation cache.
    #[arg(long = "no-cache")]
    no_cache: bool,

    /// Worker threads for parallel compilation.
    #[arg(long)]
    jobs: Option<usize>,

    /// Log compiler decisions to stderr.
    #[arg(long)]
    verbose: bool,
}

// ANSI color codes
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const GRAY: &str = "\x1b[90m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run_compile(&cli) {
        Ok(code) => process::exit(code),
        Err(report) => {
            eprintln!("{:?}", report);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_compile(cli: &Cli) -> miette::Result<i32> {
    let start = Instant::now();
    let (files, config) = resolve_input_files(cli)?;
    if files.is_empty() {
        return Err(miette!("No input files found."));
    }
    tracing::info!(files = files.len(), "loading units");

    // CLI options override argbind.json
    let overrides = CompilerOptions {
        cache_dir: cli.cache_dir.clone(),
        no_cache: cli.no_cache.then_some(true),
        jobs: cli.jobs,
        ..Default::default()
    };
    let options = config
        .and_then(|config| config.compiler_options)
        .unwrap_or_default()
        .merge(&overrides);
    let list_files = options.list_files.unwrap_or(false);

    let mut program = Program::new(options);
    program.load_files(&files);
    let output = program.compile();

    let use_color = std::io::stderr().is_terminal();
    for diagnostic in output.diagnostics.diagnostics() {
        print_diagnostic(diagnostic, use_color);
    }
    if list_files {
        for body in &output.bodies {
            let count = body.instructions.len().to_string();
            let message = Diagnostic::new(&messages::COMPILED_BODY, &[body.name.as_str(), count.as_str()]);
            println!("{}: {}", body.file, message.message_text);
        }
    }
    if cli.disasm {
        print_disassembly(&output);
    }

    if output.diagnostics.has_errors() {
        let count = output.diagnostics.error_count();
        let plural = if count == 1 { "" } else { "s" };
        if use_color {
            eprintln!("\n{}Found {} error{}.{}", RED, count, plural, RESET);
        } else {
            eprintln!("\nFound {} error{}.", count, plural);
        }
        return Ok(1);
    }

    if let Some(name) = &cli.run {
        run_body(&program, &output, name, &cli.args)?;
    }

    if use_color {
        eprintln!(
            "{}Compiled {} bodies in {:.2}s.{}",
            GRAY,
            output.bodies.len(),
            start.elapsed().as_secs_f64(),
            RESET
        );
    }
    Ok(0)
}

fn resolve_input_files(cli: &Cli) -> miette::Result<(Vec<PathBuf>, Option<ProjectConfig>)> {
    if let Some(project) = &cli.project {
        let config = load_project(project)?;
        let mut files = config.resolved_files(project);
        files.extend(cli.files.iter().cloned());
        Ok((files, Some(config)))
    } else if !cli.files.is_empty() {
        Ok((cli.files.clone(), None))
    } else if Path::new(PROJECT_FILE_NAME).exists() {
        let project = Path::new(PROJECT_FILE_NAME);
        let config = load_project(project)?;
        Ok((config.resolved_files(project), Some(config)))
    } else {
        Ok((Vec::new(), None))
    }
}

fn load_project(path: &Path) -> miette::Result<ProjectConfig> {
    parse_config_file(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read project '{}'", path.display()))
}

fn print_disassembly(output: &CompileOutput) {
    for body in &output.bodies {
        println!("== {}: {} ==", body.file, body.name);
        print!("{}", argbind_ir::disassemble(&body.instructions));
    }
}

/// Execute one compiled body on a fresh machine and print what it bound.
fn run_body(program: &Program, output: &CompileOutput, name: &str, args: &str) -> miette::Result<()> {
    let compiled: &CompiledBody = output
        .body(name)
        .ok_or_else(|| miette!("No compiled body named '{}'.", name))?;
    let json: serde_json::Value = serde_json::from_str(args)
        .into_diagnostic()
        .wrap_err("--args is not valid JSON")?;
    let value = Value::from_json(&json).into_diagnostic()?;

    let mut machine = Machine::new();
    let result = match program.find_body(name) {
        Some(Body::MultipleAssignment { .. }) => machine.assign(&compiled.instructions, &value),
        _ => {
            let args = value
                .array_items()
                .ok_or_else(|| miette!("--args must be a JSON array for '{}'.", name))?;
            machine.bind_arguments(&compiled.instructions, args)
        }
    };
    result
        .into_diagnostic()
        .wrap_err_with(|| format!("Calling '{}' failed", name))?;

    for (local, value) in machine.locals() {
        println!("{} = {}", local, value);
    }
    if let Value::Object(object) = machine.self_value() {
        for (ivar, value) in &object.borrow().ivars {
            println!("{} = {}", ivar, value);
        }
    }
    Ok(())
}

fn print_diagnostic(diag: &Diagnostic, use_color: bool) {
    if use_color {
        let color = if diag.is_error() { RED } else { YELLOW };
        let category = diag.category.to_string().to_lowercase();
        if let Some(ref file) = diag.file {
            eprint!("{}{}{}", CYAN, file, RESET);
            if let Some(span) = diag.span {
                eprint!("({})", span.start);
            }
            eprint!(": ");
        }
        eprint!(
            "{}{}{}{} {}AB{}{}: {}",
            BOLD, color, category, RESET, CYAN, diag.code, RESET, diag.message_text
        );
        if let Some(ref body) = diag.body {
            eprint!(" {}(in `{}`){}", GRAY, body, RESET);
        }
        eprintln!();
    } else {
        eprintln!("{}", diag);
    }
}
