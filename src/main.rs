use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use sphinx_autoindex::cli::{Cli, Commands, OutputFormat};
use sphinx_autoindex::config::{validate_index_file, validate_project_root};
use sphinx_autoindex::filter::PrefixFilter;
use sphinx_autoindex::patch::{patch_index_file, splice_document};
use sphinx_autoindex::render::{hash_content, render_index};
use sphinx_autoindex::scan::build_module_map;
use std::path::Path;
use std::time::Instant;

fn main() -> Result<()> {
    init_logging();

    let cli = parse_cli()?;

    match cli.command {
        Commands::Apply {
            project_root,
            index_file,
            prefixes,
            format,
        } => {
            let result = run_apply(&project_root, &index_file, prefixes)?;
            write_apply_output(&result, format)?;
        }
        Commands::Render {
            project_root,
            prefixes,
            output,
        } => {
            run_render(&project_root, prefixes, output.as_deref())?;
        }
        Commands::Check {
            project_root,
            index_file,
            prefixes,
        } => {
            if !run_check(&project_root, &index_file, prefixes)? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

// Per-module discovery diagnostics go to stdout, like the rest of the
// run's output.
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .init();
}

fn parse_cli() -> Result<Cli> {
    let args: Vec<String> = std::env::args().collect();
    Ok(Cli::parse_from(rewrite_args_for_implicit_apply(args)))
}

// `sphinx-autoindex <project_root> <index_file> [<prefix>...]` is the
// canonical invocation. When the first non-flag token is not a subcommand,
// `apply` is inserted right after the program name; any flags seen before
// it belong to `apply` and stay behind the inserted subcommand.
fn rewrite_args_for_implicit_apply(mut args: Vec<String>) -> Vec<String> {
    if args.len() <= 1 {
        return args;
    }

    let subcommands = ["apply", "render", "check", "help"];

    let mut idx = 1usize;
    while idx < args.len() {
        let a = args[idx].as_str();
        if a == "--" {
            idx += 1;
            break;
        }

        if a == "-f" || a == "--format" || a == "-o" || a == "--output" {
            idx += 2;
            continue;
        }

        if a.starts_with('-') {
            idx += 1;
            continue;
        }

        break;
    }

    if idx < args.len() {
        let token = args[idx].as_str();
        if !subcommands.contains(&token) {
            args.insert(1, "apply".to_string());
        }
    }

    args
}

#[derive(Debug, Serialize)]
struct ApplyResult {
    project_root: String,
    index_file: String,
    modules: usize,
    classes: usize,
    fragment_hash: String,
    skipped: bool,
    duration_ms: u64,
}

fn run_apply(project_root: &Path, index_file: &Path, prefixes: Vec<String>) -> Result<ApplyResult> {
    let start = Instant::now();
    validate_project_root(project_root)?;
    validate_index_file(index_file)?;

    let filter = PrefixFilter::new(prefixes);
    let modules = build_module_map(project_root, &filter)?;
    let body = render_index(&modules);
    let skipped = patch_index_file(index_file, &body)?;

    Ok(ApplyResult {
        project_root: project_root.to_string_lossy().to_string(),
        index_file: index_file.to_string_lossy().to_string(),
        modules: modules.len(),
        classes: modules.values().map(|classes| classes.len()).sum(),
        fragment_hash: hash_content(&body),
        skipped,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn write_apply_output(result: &ApplyResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&format!("index_file: {}\n", result.index_file));
            out.push_str(&format!("modules: {}\n", result.modules));
            out.push_str(&format!("classes: {}\n", result.classes));
            out.push_str(&format!("skipped: {}\n", result.skipped));
            out.push_str(&format!("duration_ms: {}\n", result.duration_ms));
            print!("{out}");
        }
    }
    Ok(())
}

fn run_render(project_root: &Path, prefixes: Vec<String>, output: Option<&Path>) -> Result<()> {
    validate_project_root(project_root)?;

    let filter = PrefixFilter::new(prefixes);
    let modules = build_module_map(project_root, &filter)?;
    let body = render_index(&modules);

    if let Some(path) = output {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &body)?;
    } else {
        print!("{body}");
        if !body.ends_with('\n') {
            println!();
        }
    }

    Ok(())
}

fn run_check(project_root: &Path, index_file: &Path, prefixes: Vec<String>) -> Result<bool> {
    validate_project_root(project_root)?;
    validate_index_file(index_file)?;

    let filter = PrefixFilter::new(prefixes);
    let modules = build_module_map(project_root, &filter)?;
    let body = render_index(&modules);

    let document = std::fs::read_to_string(index_file)
        .with_context(|| format!("failed to read index file: {}", index_file.display()))?;
    let updated = splice_document(&document, &body)?;

    if updated == document {
        Ok(true)
    } else {
        eprintln!(
            "[sphinx-autoindex] index file is out of date: {}",
            index_file.display()
        );
        Ok(false)
    }
}
