//! Command-line argument definitions for the ProteusDS result processor
//!
//! This module defines the CLI interface using the clap derive API, with
//! per-command validation mirroring what the decoding layer will accept.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

use crate::aggregate::AggregationMethod;
use crate::constants::{
    is_known_unit, ANGULAR_UNITS, DEFAULT_ANGULAR_UNIT, DEFAULT_COMPUTED_COLUMN_NAME,
    DEFAULT_FORCE_UNIT, DEFAULT_LINEAR_UNIT, DEFAULT_MOMENT_UNIT, DEFAULT_PREVIEW_ROWS,
    FORCE_UNITS, LINEAR_UNITS, MOMENT_UNITS, SUPPORTED_FILE_NAMES,
};
use crate::error::{ProteusError, Result};
use crate::loader::{ConnectionSelector, LoadOptions};
use crate::models::UnitConfig;
use crate::table::ColumnStats;

/// CLI arguments for the ProteusDS result processor
///
/// Decodes fixed-format simulation output files (cable tensions,
/// rigid-body forces and moments, positional data) and aggregates
/// results across Cases and Realizations.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "proteus-processor",
    version,
    about = "Decode ProteusDS simulation output and aggregate results across Cases and Realizations"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Decode a single results file and preview it
    Decode(DecodeArgs),
    /// List the connection names embedded in a connection file
    Connections(ConnectionsArgs),
    /// Aggregate one results file across all Cases and Realizations
    Aggregate(AggregateArgs),
}

/// Unit overrides shared by decode and aggregate
#[derive(Debug, Clone, clap::Args)]
pub struct UnitArgs {
    /// Force unit for column labels
    #[arg(long = "force-units", value_name = "UNIT", default_value = DEFAULT_FORCE_UNIT)]
    pub force_units: String,

    /// Moment unit for column labels
    #[arg(long = "moment-units", value_name = "UNIT", default_value = DEFAULT_MOMENT_UNIT)]
    pub moment_units: String,

    /// Linear unit for column labels
    #[arg(long = "linear-units", value_name = "UNIT", default_value = DEFAULT_LINEAR_UNIT)]
    pub linear_units: String,

    /// Angular unit for column labels
    #[arg(long = "angular-units", value_name = "UNIT", default_value = DEFAULT_ANGULAR_UNIT)]
    pub angular_units: String,
}

impl UnitArgs {
    /// Validate each override against the published choice lists.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("force", &self.force_units, FORCE_UNITS),
            ("moment", &self.moment_units, MOMENT_UNITS),
            ("linear", &self.linear_units, LINEAR_UNITS),
            ("angular", &self.angular_units, ANGULAR_UNITS),
        ];
        for (category, unit, choices) in checks {
            if !is_known_unit(choices, unit) {
                return Err(ProteusError::configuration(format!(
                    "unknown {} unit '{}'. Available: {}",
                    category,
                    unit,
                    choices.join(", ")
                )));
            }
        }
        Ok(())
    }

    pub fn to_unit_config(&self) -> UnitConfig {
        UnitConfig::default()
            .with_force(&self.force_units)
            .with_moment(&self.moment_units)
            .with_linear(&self.linear_units)
            .with_angular(&self.angular_units)
    }
}

/// Arguments for the decode command
#[derive(Debug, Clone, Parser)]
pub struct DecodeArgs {
    /// Path to the results file to decode
    ///
    /// The basename must be one of the supported ProteusDS output files;
    /// anything else is rejected before parsing.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Connection to extract, by name or 0-based index
    ///
    /// Required for connection files, which pack several named
    /// instrument groups side by side. Use the connections command to
    /// list the available names.
    #[arg(short = 'c', long = "connection", value_name = "NAME|INDEX")]
    pub connection: Option<String>,

    /// Additional data rows to skip after the header
    ///
    /// Useful to drop transient startup rows before statistics.
    #[arg(long = "skip-rows", value_name = "COUNT", default_value_t = 0)]
    pub skip_rows: usize,

    /// Field delimiter (default: any whitespace)
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    #[command(flatten)]
    pub units: UnitArgs,

    /// Formula for a computed column, e.g. "np.sqrt(dx**2 + dy**2)"
    #[arg(long, value_name = "EXPR")]
    pub formula: Option<String>,

    /// Columns the formula may reference (comma-separated labels)
    #[arg(long = "formula-columns", value_name = "LIST")]
    pub formula_columns: Option<ColumnList>,

    /// Name of the computed column
    #[arg(long = "new-column", value_name = "NAME", default_value = DEFAULT_COMPUTED_COLUMN_NAME)]
    pub new_column: String,

    /// Summary statistics to report for the selected column
    #[arg(long, value_enum, value_delimiter = ',', value_name = "LIST")]
    pub stats: Vec<StatKind>,

    /// Column the statistics are computed over
    #[arg(long = "stats-column", value_name = "LABEL")]
    pub stats_column: Option<String>,

    /// Preview rows to print
    #[arg(long, value_name = "COUNT", default_value_t = DEFAULT_PREVIEW_ROWS)]
    pub head: usize,

    /// Write the decoded table as tab-delimited text
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl DecodeArgs {
    /// Validate argument consistency before any decoding work.
    pub fn validate(&self) -> Result<()> {
        if !self.file.exists() {
            return Err(ProteusError::configuration(format!(
                "file does not exist: {}",
                self.file.display()
            )));
        }

        self.units.validate()?;

        if self.formula.is_some() && self.formula_columns.is_none() {
            return Err(ProteusError::configuration(
                "--formula requires --formula-columns to whitelist the columns it may use",
            ));
        }

        if !self.stats.is_empty() && self.stats_column.is_none() {
            return Err(ProteusError::configuration(
                "--stats requires --stats-column to pick the column to summarize",
            ));
        }

        Ok(())
    }

    /// Assemble decoding options from the arguments.
    pub fn load_options(&self) -> LoadOptions {
        let mut options = LoadOptions::default()
            .with_extra_skip_rows(self.skip_rows)
            .with_units(self.units.to_unit_config());
        if let Some(delimiter) = self.delimiter {
            options = options.with_delimiter(delimiter);
        }
        if let Some(selector) = &self.connection {
            options = options.with_connection(parse_connection_selector(selector));
        }
        options
    }

    /// Map verbosity flags to a log level.
    pub fn log_level(&self) -> &'static str {
        log_level(self.verbose, self.quiet)
    }
}

/// Arguments for the connections command
#[derive(Debug, Clone, Parser)]
pub struct ConnectionsArgs {
    /// Path to the connection file to inspect
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl ConnectionsArgs {
    pub fn validate(&self) -> Result<()> {
        if !self.file.exists() {
            return Err(ProteusError::configuration(format!(
                "file does not exist: {}",
                self.file.display()
            )));
        }
        Ok(())
    }

    pub fn log_level(&self) -> &'static str {
        log_level(self.verbose, false)
    }
}

/// Arguments for the aggregate command
#[derive(Debug, Clone, Parser)]
pub struct AggregateArgs {
    /// Base folder containing Case*/Realization* directories
    #[arg(value_name = "BASE_FOLDER")]
    pub base_folder: PathBuf,

    /// Feature whose results to aggregate
    ///
    /// When omitted, the available features are listed and nothing is
    /// aggregated.
    #[arg(short = 'f', long, value_name = "NAME")]
    pub feature: Option<String>,

    /// Results file to aggregate within the feature
    ///
    /// When omitted, the supported files present for the feature are
    /// listed and nothing is aggregated.
    #[arg(long = "file", value_name = "NAME")]
    pub file_name: Option<String>,

    /// Aggregation method applied per file
    #[arg(short = 'm', long, value_enum, default_value = "extrema")]
    pub method: MethodArg,

    /// Connection to extract, by name or 0-based index
    #[arg(short = 'c', long = "connection", value_name = "NAME|INDEX")]
    pub connection: Option<String>,

    /// Additional data rows to skip after the header
    #[arg(long = "skip-rows", value_name = "COUNT", default_value_t = 0)]
    pub skip_rows: usize,

    /// Field delimiter (default: any whitespace)
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    #[command(flatten)]
    pub units: UnitArgs,

    /// Fail when an enumerated path does not exist
    ///
    /// By default missing paths are counted and skipped, since not
    /// every realization writes every results file.
    #[arg(long = "strict-paths")]
    pub strict_paths: bool,

    /// Print the per-file results in addition to the combined summary
    #[arg(long = "per-file")]
    pub per_file: bool,

    /// Write the combined summary as tab-delimited text
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl AggregateArgs {
    pub fn validate(&self) -> Result<()> {
        if !self.base_folder.is_dir() {
            return Err(ProteusError::configuration(format!(
                "base folder is not a directory: {}",
                self.base_folder.display()
            )));
        }

        self.units.validate()?;

        if let Some(file_name) = &self.file_name {
            if !SUPPORTED_FILE_NAMES.contains(&file_name.as_str()) {
                return Err(ProteusError::configuration(format!(
                    "unsupported file name '{}'. Supported: {}",
                    file_name,
                    SUPPORTED_FILE_NAMES.join(", ")
                )));
            }
        }

        if self.file_name.is_some() && self.feature.is_none() {
            return Err(ProteusError::configuration(
                "--file requires --feature to locate the results directory",
            ));
        }

        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        let mut options = LoadOptions::default()
            .with_extra_skip_rows(self.skip_rows)
            .with_units(self.units.to_unit_config());
        if let Some(delimiter) = self.delimiter {
            options = options.with_delimiter(delimiter);
        }
        if let Some(selector) = &self.connection {
            options = options.with_connection(parse_connection_selector(selector));
        }
        options
    }

    pub fn log_level(&self) -> &'static str {
        log_level(self.verbose, self.quiet)
    }
}

/// Aggregation methods selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    /// Component-wise maxima and minima
    Extrema,
    /// Per-column arithmetic mean
    Mean,
}

impl MethodArg {
    pub fn to_method(self) -> AggregationMethod {
        match self {
            MethodArg::Extrema => AggregationMethod::Extrema,
            MethodArg::Mean => AggregationMethod::Mean,
        }
    }
}

/// Summary statistics selectable for the decode preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatKind {
    #[value(name = "min")]
    Min,
    #[value(name = "max")]
    Max,
    #[value(name = "mean")]
    Mean,
    #[value(name = "mean+3std")]
    MeanPlus3Std,
    #[value(name = "mean-3std")]
    MeanMinus3Std,
}

impl StatKind {
    pub fn label(&self) -> &'static str {
        match self {
            StatKind::Min => "Min",
            StatKind::Max => "Max",
            StatKind::Mean => "Mean",
            StatKind::MeanPlus3Std => "Mean + 3*std",
            StatKind::MeanMinus3Std => "Mean - 3*std",
        }
    }

    pub fn value(&self, stats: &ColumnStats) -> f64 {
        match self {
            StatKind::Min => stats.min,
            StatKind::Max => stats.max,
            StatKind::Mean => stats.mean,
            StatKind::MeanPlus3Std => stats.mean_plus_3_std(),
            StatKind::MeanMinus3Std => stats.mean_minus_3_std(),
        }
    }
}

/// Wrapper for parsing comma-separated column label lists
#[derive(Debug, Clone)]
pub struct ColumnList {
    pub columns: Vec<String>,
}

impl FromStr for ColumnList {
    type Err = ProteusError;

    fn from_str(s: &str) -> Result<Self> {
        let columns: Vec<String> = s
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        if columns.is_empty() {
            return Err(ProteusError::configuration(
                "column list cannot be empty".to_string(),
            ));
        }

        Ok(ColumnList { columns })
    }
}

/// A connection argument is an ordinal when it parses as one, otherwise
/// a name.
fn parse_connection_selector(value: &str) -> ConnectionSelector {
    match value.parse::<usize>() {
        Ok(ordinal) => ConnectionSelector::Ordinal(ordinal),
        Err(_) => ConnectionSelector::Name(value.to_string()),
    }
}

fn log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_column_list_parsing() {
        let list = ColumnList::from_str("dx m, dy m ,dz m").unwrap();
        assert_eq!(list.columns, vec!["dx m", "dy m", "dz m"]);

        assert!(ColumnList::from_str("").is_err());
        assert!(ColumnList::from_str(",,,").is_err());
    }

    #[test]
    fn test_connection_selector_parsing() {
        assert_eq!(
            parse_connection_selector("2"),
            ConnectionSelector::Ordinal(2)
        );
        assert_eq!(
            parse_connection_selector("M1"),
            ConnectionSelector::Name("M1".to_string())
        );
    }

    #[test]
    fn test_unit_args_validation() {
        let valid = UnitArgs {
            force_units: "kN".to_string(),
            moment_units: "kN-m".to_string(),
            linear_units: "ft".to_string(),
            angular_units: "rad".to_string(),
        };
        assert!(valid.validate().is_ok());

        let units = valid.to_unit_config();
        assert_eq!(units.force, "kN");
        assert_eq!(units.linear, "ft");

        let invalid = UnitArgs {
            force_units: "furlongs".to_string(),
            moment_units: "N-m".to_string(),
            linear_units: "m".to_string(),
            angular_units: "deg".to_string(),
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(log_level(0, false), "warn");
        assert_eq!(log_level(1, false), "info");
        assert_eq!(log_level(2, false), "debug");
        assert_eq!(log_level(3, false), "trace");
        assert_eq!(log_level(2, true), "error");
    }

    #[test]
    fn test_decode_args_validation() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("tensions.dat");
        std::fs::write(&file, "# h\n# h\n0.0 1.0\n").unwrap();

        let args = Args::parse_from(["proteus-processor", "decode", file.to_str().unwrap()]);
        let Some(Commands::Decode(decode)) = args.command else {
            panic!("expected decode command");
        };
        assert!(decode.validate().is_ok());

        let missing = Args::parse_from(["proteus-processor", "decode", "/nonexistent/tensions.dat"]);
        let Some(Commands::Decode(decode)) = missing.command else {
            panic!("expected decode command");
        };
        assert!(decode.validate().is_err());
    }

    #[test]
    fn test_formula_requires_columns() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("tensions.dat");
        std::fs::write(&file, "# h\n# h\n0.0 1.0\n").unwrap();

        let args = Args::parse_from([
            "proteus-processor",
            "decode",
            file.to_str().unwrap(),
            "--formula",
            "t * 2",
        ]);
        let Some(Commands::Decode(decode)) = args.command else {
            panic!("expected decode command");
        };
        assert!(decode.validate().is_err());
    }

    #[test]
    fn test_aggregate_rejects_unsupported_file() {
        let temp_dir = TempDir::new().unwrap();

        let args = Args::parse_from([
            "proteus-processor",
            "aggregate",
            temp_dir.path().to_str().unwrap(),
            "--feature",
            "M1",
            "--file",
            "velocity.dat",
        ]);
        let Some(Commands::Aggregate(aggregate)) = args.command else {
            panic!("expected aggregate command");
        };
        assert!(aggregate.validate().is_err());
    }
}
