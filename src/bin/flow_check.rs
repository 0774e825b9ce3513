use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use componentcraft::{check_invariants, InvariantViolation, ProjectDocument};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Validates a project document: parses the YAML and checks every flow's
/// graph invariants against the project's screen list.
#[derive(Debug, Parser)]
#[command(name = "flow_check", about = "Validate a ComponentCraft project document")]
struct Args {
    /// Path to the project YAML file
    path: PathBuf,

    /// Emit a machine-readable JSON report instead of plain text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct FlowReport {
    flow_id: String,
    flow_name: String,
    errors: Vec<String>,
    warnings: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let input = match std::fs::read_to_string(&args.path) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("failed to read {}: {err}", args.path.display());
            return ExitCode::FAILURE;
        }
    };

    let document = match ProjectDocument::from_yaml_str(&input) {
        Ok(document) => document,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let reports: Vec<FlowReport> = document
        .project
        .flows
        .iter()
        .map(|flow| {
            let (errors, warnings): (Vec<InvariantViolation>, Vec<InvariantViolation>) =
                check_invariants(flow, &document.project.screens)
                    .into_iter()
                    .partition(|v| v.is_fatal());
            FlowReport {
                flow_id: flow.id.clone(),
                flow_name: flow.name.clone(),
                errors: errors.iter().map(ToString::to_string).collect(),
                warnings: warnings.iter().map(ToString::to_string).collect(),
            }
        })
        .collect();

    let failed = reports.iter().any(|r| !r.errors.is_empty());

    if args.json {
        match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("failed to serialize report: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!(
            "{}: {} screens, {} flows",
            document.project.name,
            document.project.screens.len(),
            reports.len()
        );
        for report in &reports {
            let verdict = if report.errors.is_empty() { "ok" } else { "INVALID" };
            println!("  {} ({}): {verdict}", report.flow_name, report.flow_id);
            for error in &report.errors {
                println!("    error: {error}");
            }
            for warning in &report.warnings {
                println!("    warning: {warning}");
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
