//! Theme config compiler CLI
//!
//! Entry point for the `compile-config` command-line tool.

use clap::Parser;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;
use themecfg::{CompileOptions, CompileReport, Compiler, ThemeLayout};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILE: &str = "compile_config_json.log";

#[derive(Parser)]
#[command(name = "compile-config")]
#[command(about = "Merge a theme's main config and custom config groups into config.json", version)]
struct Cli {
    /// Theme root directory (skips marker discovery)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Directory to start searching upward for .publii_theme_root
    /// (default: the directory holding this executable)
    #[arg(long, conflicts_with = "root")]
    start: Option<PathBuf>,

    /// Log file, truncated on every run
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// Load, validate and order without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Wait for Enter before exiting
    #[arg(long)]
    pause: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_file, cli.verbose) {
        eprintln!("Error opening log file {}: {}", cli.log_file.display(), e);
        process::exit(1);
    }

    let code = match run(&cli) {
        Ok(report) => {
            print_report(&report, cli.json);
            0
        }
        Err(e) => {
            tracing::error!("{}", e);
            1
        }
    };

    eprintln!("Logs are saved in {}", cli.log_file.display());
    if cli.pause {
        wait_for_enter();
    }
    process::exit(code);
}

fn init_logging(log_file: &Path, verbose: bool) -> io::Result<()> {
    let file = File::create(log_file)?;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();
    Ok(())
}

fn run(cli: &Cli) -> Result<CompileReport, Box<dyn std::error::Error>> {
    let layout = match &cli.root {
        Some(root) => ThemeLayout::new(root),
        None => {
            let start = match &cli.start {
                Some(start) => start.clone(),
                None => start_dir(std::env::current_exe(), std::env::current_dir)?,
            };
            ThemeLayout::discover(&start)?
        }
    };

    let options = CompileOptions {
        dry_run: cli.dry_run,
        ..Default::default()
    };
    let report = Compiler::new(layout).with_options(options).run()?;

    if !report.dry_run {
        tracing::info!("Successfully recompiled config.json and updated in the theme root.");
    }
    Ok(report)
}

/// Where root discovery starts: the executable's directory, else the
/// current directory
fn start_dir(
    exe: io::Result<PathBuf>,
    current_dir: impl FnOnce() -> io::Result<PathBuf>,
) -> io::Result<PathBuf> {
    match exe.as_deref().ok().and_then(Path::parent) {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(dir.to_path_buf()),
        _ => current_dir(),
    }
}

fn print_report(report: &CompileReport, json_output: bool) {
    if json_output {
        match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing report: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    println!("Theme root: {}", report.theme_root.display());
    println!("  Fragment files: {}", report.fragment_files.len());
    println!("  Records: {}", report.record_count);
    if let Some(ref ordering) = report.ordering {
        println!("  Sorted groups: {}", ordering.sorted_groups.join(", "));
        if !ordering.missing_groups.is_empty() {
            println!("  Missing groups: {}", ordering.missing_groups.join(", "));
        }
    }
    if let Some(ref rewrite) = report.rewrite {
        println!("  Groups: {}", rewrite.groups.join(", "));
        if !rewrite.removed_groups.is_empty() {
            println!("  Removed groups: {}", rewrite.removed_groups.join(", "));
        }
        if !rewrite.new_groups.is_empty() {
            println!("  New groups: {}", rewrite.new_groups.join(", "));
        }
    }
    match (&report.output_path, &report.output_sha256) {
        (Some(path), Some(sha)) => println!("  Output: {} (sha256 {})", path.display(), sha),
        _ => println!("  Dry run: nothing written"),
    }
}

fn wait_for_enter() {
    eprint!("Press Enter to finish...");
    let mut line = String::new();
    let _ = io::stdin().read_line(&mut line);
}
