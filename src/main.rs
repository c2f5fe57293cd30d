use anyhow::{bail, Context};
use cljr::error::ErrorDisplay;
use cljr::logging::{self, Logger};
use cljr::{CljrConfig, Outcome, Workspace};
use std::path::PathBuf;

const USAGE: &str = "usage: cljr [--config <file>] [--debug-log [<file>]] <command>

commands:
  rename <file> <new-name>   rename a source file and update its namespace
  bootstrap <file>           insert a namespace declaration into an empty file
  bindings                   print the key bindings";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(err) = run(&args) {
        match err.downcast_ref::<cljr::CljrError>() {
            Some(cljr_error) => eprintln!("{}", ErrorDisplay::new(cljr_error).message),
            None => eprintln!("{:#}", err),
        }
        std::process::exit(1);
    }
}

struct Options {
    config: Option<PathBuf>,
    debug_log: Option<PathBuf>,
    command: Vec<String>,
}

fn parse_options(args: &[String]) -> anyhow::Result<Options> {
    let mut options = Options {
        config: None,
        debug_log: None,
        command: Vec::new(),
    };

    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config requires a file")?;
                options.config = Some(PathBuf::from(path));
            }
            "--debug-log" => {
                let path = match iter.peek() {
                    Some(next) if !next.starts_with('-') && next.ends_with(".log") => {
                        iter.next().map(PathBuf::from)
                    }
                    _ => logging::default_log_path(),
                };
                options.debug_log = path;
            }
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            _ => options.command.push(arg.clone()),
        }
    }

    Ok(options)
}

fn run(args: &[String]) -> anyhow::Result<()> {
    let options = parse_options(args)?;

    let mut logger = Logger::for_development();
    if let Some(path) = &options.debug_log {
        logger = logger.with_level(log::LevelFilter::Debug).with_file_output(path);
    }
    logging::init(logger);

    let config = match &options.config {
        Some(path) => CljrConfig::load_from(path)?,
        None => CljrConfig::load()?,
    };
    let mut workspace = Workspace::new(config)?;

    let command: Vec<&str> = options.command.iter().map(String::as_str).collect();
    match command.as_slice() {
        ["rename", file, new_name] => rename(&mut workspace, file, new_name),
        ["bootstrap", file] => bootstrap(&mut workspace, file),
        ["bindings"] => {
            for (sequence, bound) in workspace.keymap().bindings() {
                println!("{:<20} {}", sequence.to_string(), bound.name());
            }
            Ok(())
        }
        _ => bail!("{}", USAGE),
    }
}

fn rename(workspace: &mut Workspace, file: &str, new_name: &str) -> anyhow::Result<()> {
    workspace
        .open_file(file)
        .with_context(|| format!("could not open {}", file))?;
    let report = workspace.rename_file(new_name)?;

    println!("{}", report.message);
    if let (Some(old), Some(new)) = (&report.old_ns, &report.new_ns) {
        println!("namespace: {} -> {}", old, new);
    }
    match &report.propagation {
        Outcome::Succeeded(replaced) => {
            println!(
                "updated {} references in {} files",
                replaced.replacements,
                replaced.files_changed.len()
            );
            for (path, error) in &replaced.failures {
                eprintln!("could not update {}: {}", path.display(), error);
            }
        }
        Outcome::Skipped(reason) => println!("references not updated: {}", reason),
        Outcome::Failed(err) => eprintln!("references not updated: {}", err),
    }
    Ok(())
}

fn bootstrap(workspace: &mut Workspace, file: &str) -> anyhow::Result<()> {
    let opened = workspace
        .open_file(file)
        .with_context(|| format!("could not open {}", file))?;

    match opened.bootstrap {
        Outcome::Succeeded(ns) => {
            workspace.save_modified_buffers()?;
            println!("inserted (ns {})", ns);
            Ok(())
        }
        Outcome::Skipped(reason) => {
            println!("nothing to do: {}", reason);
            Ok(())
        }
        Outcome::Failed(err) => Err(err.into()),
    }
}
