use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use layermap::cli::Cli;
use layermap::config::{load_config, load_config_file};
use layermap::io::write_file;
use layermap::AnalysisResult;
use std::io::{IsTerminal, Write};
use std::process::ExitCode;

/// Exit status when the tree has import cycles
const EXIT_CYCLES: u8 = 1;
/// Exit status for fatal errors
const EXIT_FAILURE: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }
    layermap::observability::init_logging(cli.verbosity, cli.quiet);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => load_config(&cli.path),
    };

    let mut options = cli.analyze_options(&config);
    options.show_progress = !cli.quiet && !cli.no_progress && std::io::stderr().is_terminal();

    let result = layermap::analyze(&cli.path, &options)
        .with_context(|| format!("Failed to analyze {}", cli.path.display()))?;
    let report = layermap::render(&result, options.report_format, options.breakdown)?;

    match &cli.output {
        Some(path) => write_file(path, &report)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(report.as_bytes())
                .context("Failed to write report to stdout")?;
            stdout.flush()?;
        }
    }

    if !cli.quiet {
        print_status(&result);
    }

    Ok(if result.has_cycles {
        ExitCode::from(EXIT_CYCLES)
    } else {
        ExitCode::SUCCESS
    })
}

fn print_status(result: &AnalysisResult) {
    let status = if result.has_cycles {
        "FAIL".red().bold()
    } else if result.is_clean() {
        "PASS".green().bold()
    } else {
        "PASS (with warnings)".yellow().bold()
    };
    eprintln!("{} {}", status, result.summary);
}
