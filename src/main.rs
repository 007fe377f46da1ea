//! # cp-engine CLI
//!
//! Reference command-line driver for the CP-theory reasoning engine
//! (spec §6): read a rule-text theory file and a CSV-like record source,
//! then print the input records alongside the best record and top-3
//! ranking under the configured evaluation strategy.
//!
//! ```bash
//! cp-engine --theory rules.txt --records data.csv --table PRODUCTS
//! ```

use clap::Parser;
use cp_engine::config::EngineConfig;
use cp_engine::records::parse_records_csv;
use cp_engine::theory::Theory;
use cp_engine::{best_with_strategy, parser as theory_parser, topk_with_strategy};
use std::fs;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "cp-engine", about = "Evaluate records against a conditional-preference theory")]
struct Cli {
    /// Path to a rule-text theory file (spec §6 grammar).
    #[arg(long)]
    theory: String,

    /// Path to a CSV-like record source: a header line of attribute
    /// names, then one line per record.
    #[arg(long)]
    records: String,

    /// Table name, used only for the printed report header.
    #[arg(long, default_value = "RECORDS")]
    table: String,

    /// Optional path to an `engine.toml`-shaped config file; falls back
    /// to `EngineConfig::load()`'s default search path.
    #[arg(long)]
    config: Option<String>,

    /// How many ranked records to print after the best one.
    #[arg(long, default_value_t = 3)]
    top: usize,
}

fn main() -> ExitCode {
    cp_engine::init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path).map_err(|e| format!("config error: {e}"))?,
        None => EngineConfig::load().unwrap_or_default(),
    };

    let theory_text = fs::read_to_string(&cli.theory)
        .map_err(|e| format!("reading theory file {}: {e}", cli.theory))?;
    let ast = theory_parser::parse_theory(&theory_text).map_err(|e| e.to_string())?;
    let theory = Theory::from_ast(&ast).map_err(|e| e.to_string())?;

    if config.evaluation.strict_consistency {
        theory.require_consistent().map_err(|e| e.to_string())?;
    }
    info!(
        rules = theory.rules.len(),
        globally_consistent = theory.is_globally_consistent(),
        locally_consistent = theory.is_locally_consistent(),
        "loaded theory"
    );

    let records_text = fs::read_to_string(&cli.records)
        .map_err(|e| format!("reading records file {}: {e}", cli.records))?;
    let batch = parse_records_csv(&records_text);
    let records = batch.into_inner();

    println!("=== {} ({} records) ===", cli.table, records.len());
    for record in &records {
        println!("{record:?}");
    }

    let best = best_with_strategy(&theory, &records, config.evaluation.strategy)
        .map_err(|e| e.to_string())?;
    println!("\n=== best ({:?} strategy) ===", config.evaluation.strategy);
    if best.is_empty() {
        println!("(no records)");
    } else {
        for record in &best {
            println!("{record:?}");
        }
    }

    let top = topk_with_strategy(&theory, &records, cli.top, config.evaluation.strategy)
        .map_err(|e| e.to_string())?;
    println!("\n=== top {} ===", cli.top);
    for (rank, record) in top.iter().enumerate() {
        println!("{rank}: {record:?}");
    }

    Ok(())
}
