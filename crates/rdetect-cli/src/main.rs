use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use rdetect_eval::{Engine, Evaluation, EventContext};
use rdetect_parser::{RuleCollection, compile, parse_rules_directory, parse_rules_file, validate_rules_file};

#[derive(Parser)]
#[command(name = "rdetect")]
#[command(about = "Validate and evaluate detection rules")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate rule files against the schema and the condition grammar
    ///
    /// Every error across every file is reported (one line per error,
    /// prefixed with the file name) before exiting. Exit code is 0 only
    /// when every file is valid.
    Validate {
        /// Rule files or directories containing them
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Compile a condition expression and print the expression tree as JSON
    Condition {
        /// The condition expression to compile
        expr: String,
    },

    /// Evaluate events against a set of detection rules
    ///
    /// Load rules from a file or directory, then evaluate JSON events.
    /// Events can be provided as a single JSON object (--event) or as
    /// NDJSON (newline-delimited JSON) from stdin. Hits are printed to
    /// stdout as JSON; per-rule failures and summary counters go to stderr.
    Eval {
        /// Path to a rule file or directory of rules
        #[arg(short, long)]
        rules: PathBuf,

        /// A single event as a JSON object (if omitted, reads NDJSON from stdin)
        #[arg(short, long)]
        event: Option<String>,

        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { paths } => cmd_validate(paths),
        Commands::Condition { expr } => cmd_condition(expr),
        Commands::Eval {
            rules,
            event,
            pretty,
        } => cmd_eval(rules, event, pretty),
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_validate(paths: Vec<PathBuf>) {
    let files = collect_rule_files(&paths);
    if files.is_empty() {
        eprintln!("Warning: no rule files found");
        return;
    }

    let mut error_count = 0usize;
    for file in &files {
        let report = validate_rules_file(file);
        if report.is_valid() {
            println!("ok {}", file.display());
        } else {
            for error in &report.errors {
                println!("{}: {error}", file.display());
            }
            error_count += report.errors.len();
        }
    }

    eprintln!("Checked {} file(s), {} error(s)", files.len(), error_count);
    if error_count > 0 {
        process::exit(1);
    }
}

fn cmd_condition(expr: String) {
    match compile(&expr) {
        Ok(tree) => print_json(&tree, true),
        Err(e) => {
            eprintln!("Condition compile error: {e}");
            process::exit(1);
        }
    }
}

fn cmd_eval(rules_path: PathBuf, event_json: Option<String>, pretty: bool) {
    let collection = load_collection(&rules_path);
    let mut engine = Engine::new();
    engine.add_collection(&collection);

    eprintln!(
        "Loaded {} rules from {}",
        engine.rule_count(),
        rules_path.display()
    );

    if let Some(json_str) = event_json {
        let value: serde_json::Value = match serde_json::from_str(&json_str) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("Invalid JSON event: {e}");
                process::exit(1);
            }
        };
        let ctx = match EventContext::from_json(&value) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Invalid event: {e}");
                process::exit(1);
            }
        };

        let outcome = engine.evaluate(&ctx);
        report_failures(&outcome);
        if outcome.hits.is_empty() {
            eprintln!("No hits.");
        } else {
            for hit in &outcome.hits {
                print_json(hit, pretty);
            }
        }
    } else {
        let stdin = io::stdin();
        let mut line_num = 0u64;
        let mut hit_count = 0u64;

        for line in stdin.lock().lines() {
            line_num += 1;
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("Error reading line {line_num}: {e}");
                    continue;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            let value: serde_json::Value = match serde_json::from_str(&line) {
                Ok(v) => v,
                Err(e) => {
                    eprintln!("Invalid JSON on line {line_num}: {e}");
                    continue;
                }
            };
            let ctx = match EventContext::from_json(&value) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Invalid event on line {line_num}: {e}");
                    continue;
                }
            };

            let outcome = engine.evaluate(&ctx);
            report_failures(&outcome);
            for hit in &outcome.hits {
                hit_count += 1;
                print_json(hit, pretty);
            }
        }

        eprintln!("Processed {line_num} events, {hit_count} hits.");
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Expand files and directories into the list of rule files to check.
/// Nonexistent paths are kept so validation reports them as errors.
fn collect_rule_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk_dir(path, &mut files);
        } else {
            files.push(path.clone());
        }
    }
    files.sort();
    files
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        eprintln!("Error reading directory {}", dir.display());
        process::exit(1);
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_dir(&path, files);
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yml" | "yaml")
        ) {
            files.push(path);
        }
    }
}

fn load_collection(path: &Path) -> RuleCollection {
    let result = if path.is_dir() {
        parse_rules_directory(path)
    } else {
        parse_rules_file(path)
    };

    let collection = match result {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading rules from {}: {e}", path.display());
            process::exit(1);
        }
    };

    if !collection.errors.is_empty() {
        eprintln!(
            "Warning: {} rule(s) failed to load",
            collection.errors.len()
        );
        for err in &collection.errors {
            eprintln!("  - {err}");
        }
    }

    collection
}

fn report_failures(outcome: &Evaluation) {
    for failure in &outcome.failures {
        eprintln!("Rule failure: {failure}");
    }
}

fn print_json(value: &impl serde::Serialize, pretty: bool) {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match json {
        Ok(j) => println!("{j}"),
        Err(e) => {
            eprintln!("JSON serialization error: {e}");
            process::exit(1);
        }
    }
}
