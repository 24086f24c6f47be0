mod cleaner;
mod scanner;
mod targets;

use anyhow::Result;
use clap::Parser;
use cleaner::{CleanResult, Observer};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use scanner::{format_size, FoundDir};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "clearout")]
#[command(about = "Recursively delete out/ and .vs/ build folders under a directory")]
#[command(version)]
struct Cli {
    /// Directory to scan (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Print skipped and unreadable directories
    #[arg(short, long)]
    verbose: bool,
}

struct ConsoleObserver {
    spinner: ProgressBar,
    verbose: bool,
}

impl ConsoleObserver {
    fn new(verbose: bool) -> Self {
        // Draws to stderr, and not at all when stderr is not a terminal.
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {wide_msg:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        ConsoleObserver { spinner, verbose }
    }
}

impl Observer for ConsoleObserver {
    fn removing(&mut self, dir: &FoundDir) {
        self.spinner.suspend(|| {
            if self.verbose {
                println!(
                    "Removing folder: {}  {}",
                    dir.path.display(),
                    format!("[{}, {}]", dir.target.description, dir.size_human()).dimmed()
                );
            } else {
                println!("Removing folder: {}", dir.path.display());
            }
        });
    }

    fn failed(&mut self, dir: &FoundDir, err: &io::Error) {
        self.spinner.suspend(|| {
            eprintln!(
                "{} failed to remove {}: {}",
                "error:".red().bold(),
                dir.path.display(),
                err
            );
        });
    }

    fn visiting(&mut self, path: &Path) {
        self.spinner.set_message(path.display().to_string());
        self.spinner.tick();
    }

    fn skipped(&mut self, path: &Path, reason: &str) {
        if self.verbose {
            self.spinner.suspend(|| {
                eprintln!("{} {} ({})", "skipped:".yellow(), path.display(), reason);
            });
        }
    }
}

fn summary_line(result: &CleanResult) -> String {
    let count = result.deleted.len();
    let noun = if count == 1 { "folder" } else { "folders" };
    let details = format!(
        "({} {}, {} reclaimed)",
        count,
        noun,
        format_size(result.total_cleaned())
    );

    if result.is_success() {
        format!(
            "{} All {} folders have been removed. {}",
            "Clearing complete.".green().bold(),
            targets::names_for_display(),
            details.green()
        )
    } else {
        format!(
            "{} {} {} could not be removed. {}",
            "Clearing complete.".yellow().bold(),
            result.failed.len().to_string().red().bold(),
            if result.failed.len() == 1 { "folder" } else { "folders" },
            details
        )
    }
}

fn run(cli: &Cli) -> Result<bool> {
    if cli.verbose {
        eprintln!("{} {}...", "Scanning".cyan().bold(), cli.path.display());
    }

    let observer = ConsoleObserver::new(cli.verbose);
    let spinner = observer.spinner.clone();
    let outcome = cleaner::clean(&cli.path, observer);
    spinner.finish_and_clear();
    let result = outcome?;

    if cli.verbose && (!result.vanished.is_empty() || !result.unreadable.is_empty()) {
        eprintln!(
            "{} {} vanished, {} unreadable",
            "skipped:".yellow(),
            result.vanished.len(),
            result.unreadable.len()
        );
    }

    println!("{}", summary_line(&result));
    Ok(result.is_success())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
