use clap::Parser;
use colored::Colorize;
use pyrubric::config::{load_from_path, ConfigError};
use pyrubric::{Validator, Verdict};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::ExitCode;

// Process exit codes, stable for scripting.
const EXIT_SUCCESS: u8 = 0;
const EXIT_VALIDATION_FAILED: u8 = 1;
const EXIT_FILE_NOT_FOUND: u8 = 2;
const EXIT_RULES_ERROR: u8 = 3;
const EXIT_UNEXPECTED: u8 = 10;

#[derive(Parser)]
#[command(name = "pyrubric")]
#[command(about = "Validates a Python source file against a set of JSON rules", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the Python solution file to validate
    solution_path: PathBuf,

    /// Path to the JSON file with validation rules
    rules_path: PathBuf,

    /// Stop after the first failed rule
    #[arg(long)]
    stop_on_first_fail: bool,

    /// Suppress all stdout output (failed rules and final verdict)
    #[arg(short, long)]
    quiet: bool,

    /// Suppress the final verdict line, still showing failed rules
    #[arg(long)]
    no_verdict: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();
    let cli = Cli::parse();
    ExitCode::from(run(&cli))
}

fn run(cli: &Cli) -> u8 {
    let source = match std::fs::read_to_string(&cli.solution_path) {
        Ok(source) => source,
        Err(error) => {
            let code = if error.kind() == ErrorKind::NotFound {
                EXIT_FILE_NOT_FOUND
            } else {
                EXIT_UNEXPECTED
            };
            eprintln!(
                "{}",
                format!(
                    "Error: cannot read {}: {}",
                    cli.solution_path.display(),
                    error
                )
                .red()
            );
            return code;
        }
    };

    let rules = match load_from_path(&cli.rules_path) {
        Ok(rules) => rules,
        Err(error) => {
            let code = match &error {
                ConfigError::Io { source, .. } if source.kind() == ErrorKind::NotFound => {
                    EXIT_FILE_NOT_FOUND
                }
                ConfigError::Io { .. } => EXIT_UNEXPECTED,
                _ => EXIT_RULES_ERROR,
            };
            eprintln!("{}", format!("Error: {error}").red());
            return code;
        }
    };

    let validator = Validator::new(rules).with_stop_on_first_fail(cli.stop_on_first_fail);
    let verdict = match validator.run(&source) {
        Ok(verdict) => verdict,
        Err(error) => {
            eprintln!("{}", format!("Error: {error}").red());
            return EXIT_UNEXPECTED;
        }
    };

    report(cli, &verdict);
    if verdict.passed() {
        EXIT_SUCCESS
    } else {
        EXIT_VALIDATION_FAILED
    }
}

fn report(cli: &Cli, verdict: &Verdict) {
    if cli.quiet {
        return;
    }

    for failure in &verdict.failures {
        println!("{}", format!("Rule {}: {}", failure.id, failure.message).red());
    }

    if cli.no_verdict {
        return;
    }
    if verdict.passed() {
        println!("{}", "Validation successful.".green());
    } else {
        println!("{}", "Validation failed.".red());
    }
}
