//! Command implementations for the ProteusDS result processor.
//!
//! Each command validates its arguments, drives the library and prints
//! a human-readable report.

use std::fs;

use colored::*;
use tracing_subscriber::EnvFilter;

use crate::aggregate::AggregationResult;
use crate::cli::args::{AggregateArgs, Args, Commands, ConnectionsArgs, DecodeArgs};
use crate::error::{ProteusError, Result};
use crate::formula;
use crate::header;
use crate::loader;
use crate::models::FileKind;
use crate::processor::{BatchProcessor, MissingPathPolicy};
use crate::table::LabeledTable;
use crate::walker::DirectoryAggregationWalker;

/// Dispatch the parsed command.
pub fn run(args: Args) -> Result<()> {
    match args.command {
        Some(Commands::Decode(command)) => {
            init_logging(command.log_level());
            command.validate()?;
            execute_decode(&command)
        }
        Some(Commands::Connections(command)) => {
            init_logging(command.log_level());
            command.validate()?;
            execute_connections(&command)
        }
        Some(Commands::Aggregate(command)) => {
            init_logging(command.log_level());
            command.validate()?;
            execute_aggregate(&command)
        }
        None => Ok(()), // main prints the help screen instead
    }
}

/// Initialize tracing from the verbosity-derived level; RUST_LOG wins
/// when set.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn execute_decode(args: &DecodeArgs) -> Result<()> {
    let options = args.load_options();
    let mut table = loader::decode_file(&args.file, &options)?;

    if let (Some(expression), Some(columns)) = (&args.formula, &args.formula_columns) {
        table = formula::add_computed_column(
            &table,
            &columns.columns,
            expression,
            &args.new_column,
        )?;
        if !args.quiet {
            println!(
                "{} '{}'",
                "Added computed column".bright_green(),
                args.new_column.bright_white()
            );
        }
    }

    if !args.quiet {
        println!("{}", "Decoded table".bright_green().bold());
        println!(
            "  {} {}",
            "File:".bright_cyan(),
            args.file.display()
        );
        println!(
            "  {} {} rows x {} columns",
            "Shape:".bright_cyan(),
            table.n_rows().to_string().bright_white(),
            table.n_cols().to_string().bright_white()
        );
        println!();
        print_preview(&table, args.head);
    }

    if !args.stats.is_empty() {
        let column = args.stats_column.as_deref().ok_or_else(|| {
            ProteusError::configuration("--stats requires --stats-column")
        })?;
        let stats = table.column_stats(column).ok_or_else(|| {
            ProteusError::configuration(format!(
                "no statistics for column '{}'; available: {}",
                column,
                table.labels().join(", ")
            ))
        })?;

        println!("\n{} {}", "Statistics for".bright_green().bold(), column);
        for kind in &args.stats {
            println!(
                "  {:<14} {}",
                format!("{}:", kind.label()).bright_cyan(),
                format_value(kind.value(&stats))
            );
        }
    }

    if let Some(output) = &args.output {
        fs::write(output, table.to_delimited('\t'))?;
        if !args.quiet {
            println!(
                "\n{} {}",
                "Wrote".bright_green(),
                output.display()
            );
        }
    }

    Ok(())
}

fn execute_connections(args: &ConnectionsArgs) -> Result<()> {
    let file_name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ProteusError::UnsupportedFileName {
            name: args.file.display().to_string(),
        })?;

    let kind =
        FileKind::from_file_name(file_name).ok_or_else(|| ProteusError::UnsupportedFileName {
            name: file_name.to_string(),
        })?;

    if !kind.is_connection() {
        return Err(ProteusError::configuration(format!(
            "{} is not a connection file",
            file_name
        )));
    }

    let text = fs::read_to_string(&args.file)?;
    let groups = header::connection_groups(&text, kind)?;

    println!(
        "{} {}",
        "Connections in".bright_green().bold(),
        args.file.display()
    );
    for group in &groups {
        println!(
            "  {}. {}",
            group.ordinal.to_string().bright_yellow(),
            group.name.bright_cyan()
        );
    }

    Ok(())
}

fn execute_aggregate(args: &AggregateArgs) -> Result<()> {
    let (Some(feature), Some(file_name)) = (args.feature.as_deref(), args.file_name.as_deref())
    else {
        return list_study(args);
    };

    let policy = if args.strict_paths {
        MissingPathPolicy::Fail
    } else {
        MissingPathPolicy::Skip
    };

    let mut processor = BatchProcessor::new(
        &args.base_folder,
        feature,
        file_name,
        args.method.to_method(),
    )
    .with_options(args.load_options())
    .with_missing_path_policy(policy);

    if !args.quiet {
        processor = processor.with_progress();
        println!(
            "{}",
            "Aggregating across Cases and Realizations".bright_green().bold()
        );
        println!(
            "  {} {}",
            "Base folder:".bright_cyan(),
            args.base_folder.display()
        );
        println!("  {} {}", "Feature:".bright_cyan(), feature);
        println!("  {} {}", "File:".bright_cyan(), file_name);
    }

    let outcome = processor.run()?;
    let stats = &outcome.stats;

    if !args.quiet {
        println!(
            "\n  {} {} cases, {} realizations",
            "Found".bright_cyan(),
            stats.cases_found.to_string().bright_white(),
            stats.realizations_found.to_string().bright_white()
        );
        println!(
            "  {} {} processed, {} missing, {} failed",
            "Files:".bright_cyan(),
            stats.files_processed.to_string().bright_white(),
            stats.files_missing.to_string().bright_white(),
            stats.files_failed.to_string().bright_white()
        );
        println!(
            "  {} {}ms",
            "Time elapsed:".bright_cyan(),
            stats.processing_time_ms
        );
    }

    if args.per_file {
        for per_file in &outcome.per_file {
            println!(
                "\n{} {}",
                "Result for".bright_green(),
                per_file.path.display()
            );
            print_aggregation(&per_file.result);
        }
    }

    match &outcome.combined {
        Some(combined) => {
            if !args.quiet {
                println!("\n{}", "Combined summary".bright_green().bold());
            }
            print_aggregation(combined);

            if let Some(output) = &args.output {
                fs::write(output, combined.to_delimited('\t'))?;
                if !args.quiet {
                    println!("\n{} {}", "Wrote".bright_green(), output.display());
                }
            }
        }
        None => {
            println!(
                "{}",
                "No files produced a result; nothing to combine".bright_red()
            );
        }
    }

    Ok(())
}

/// List the features of a study, or the supported files of one feature.
fn list_study(args: &AggregateArgs) -> Result<()> {
    let walker = DirectoryAggregationWalker::new(&args.base_folder);

    match &args.feature {
        None => {
            let features = walker.discover_features()?;
            if features.is_empty() {
                println!(
                    "{}",
                    "No features found under Case*/Realization*/Results".bright_red()
                );
                return Ok(());
            }
            println!("{}", "Available features:".bright_green().bold());
            for feature in features {
                println!("  {}", feature.bright_cyan());
            }
            println!("\nPick one with --feature <NAME>");
        }
        Some(feature) => {
            let files = walker.discover_files(feature)?;
            if files.is_empty() {
                println!(
                    "{} '{}'",
                    "No supported result files found for feature".bright_red(),
                    feature
                );
                return Ok(());
            }
            println!(
                "{} '{}':",
                "Supported files for feature".bright_green().bold(),
                feature
            );
            for file in files {
                println!("  {}", file.bright_cyan());
            }
            println!("\nPick one with --file <NAME>");
        }
    }

    Ok(())
}

/// Print the first rows of a decoded table.
fn print_preview(table: &LabeledTable, rows: usize) {
    let labels = table.labels();
    println!("  {}", labels.join("  ").bright_white().bold());
    for row in table.head(rows) {
        let cells: Vec<String> = row.iter().map(|v| format_value(*v)).collect();
        println!("  {}", cells.join("  "));
    }
    if table.n_rows() > rows {
        println!("  ... {} more rows", table.n_rows() - rows);
    }
}

/// Print an aggregation result as an aligned table.
fn print_aggregation(result: &AggregationResult) {
    let header: Vec<String> = std::iter::once("".to_string())
        .chain(result.labels().iter().cloned())
        .collect();
    println!("  {}", header.join("  ").bright_white().bold());
    for row in result.rows() {
        let cells: Vec<String> = std::iter::once(row.statistic.clone())
            .chain(row.values.iter().map(|v| format_value(*v)))
            .collect();
        println!("  {}", cells.join("  "));
    }
}

fn format_value(value: f64) -> String {
    if value == 0.0 || (value.abs() >= 1e-3 && value.abs() < 1e6) {
        format!("{:.4}", value)
    } else {
        format!("{:.4e}", value)
    }
}
