//! relalg - evaluate relational-algebra formulas over JSON data

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, ValueEnum};
use relalg::engine::DEFAULT_MAX_DEPTH;
use relalg::{render, Catalog, Engine, EngineConfig};
use std::path::PathBuf;

/// Output format for the result printed to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

/// relalg - evaluate a relational-algebra formula against relations in a JSON file
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file mapping relation names to arrays of records
    data: PathBuf,

    /// Formula to evaluate, e.g. "SELECT(Employees, salary > 75)"
    formula: String,

    /// CSV file the result is written to
    #[arg(short, long, default_value = "output.csv")]
    output: PathBuf,

    /// Do not write the CSV file
    #[arg(long)]
    no_csv: bool,

    /// Format of the result printed to stdout
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Maximum operator nesting depth
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Print the logical plan before the result
    #[arg(long)]
    explain: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let catalog = Catalog::load(&args.data)?;
    let engine = Engine::with_config(
        catalog,
        EngineConfig {
            max_depth: args.max_depth,
        },
    );

    let plan = engine
        .plan(&args.formula)
        .with_context(|| format!("Failed to evaluate '{}'", args.formula))?;
    if args.explain {
        println!("{}", plan.explain());
        println!();
    }

    let result = engine
        .execute(&plan)
        .with_context(|| format!("Failed to evaluate '{}'", args.formula))?;

    match args.format {
        OutputFormat::Table => println!("{}", render::format_table(&result)),
        OutputFormat::Json => println!("{}", render::format_json(&result)?),
    }

    if !args.no_csv {
        render::write_csv_file(&result, &args.output)?;
        log::info!(
            "Wrote {} record(s) to {}",
            result.len(),
            args.output.display()
        );
    }

    Ok(())
}
