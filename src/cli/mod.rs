//! Command-line parsing for the weekly sales forecaster.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the engine code. Every option that a deployment is likely to
//! set can also come from the environment (or a `.env` file).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_TARGET_YEAR, LoadPolicy, NegativePolicy};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "weekcast", version, about = "Weekly sales forecaster for short-window point-of-sale exports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Predict every item for the target year and print one line per item.
    Report(ReportArgs),
    /// Predict a single item (case-insensitive).
    Predict(PredictArgs),
    /// Serve predictions over HTTP.
    Serve(ServeArgs),
    /// Write a synthetic sales export for trying things out.
    Sample(SampleArgs),
}

/// Options shared by every command that loads sales data.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Sales export (comma and/or tab separated) with `Date`, `Item Name`, `Quantity Sold`.
    #[arg(short = 'd', long, env = "WEEKCAST_DATA", default_value = "sales_data_july_weeks.csv")]
    pub data: PathBuf,

    /// Year to predict.
    #[arg(short = 'y', long, env = "WEEKCAST_TARGET_YEAR", default_value_t = DEFAULT_TARGET_YEAR)]
    pub year: i32,

    /// Days covered by each year's sales window (scaled to 7).
    #[arg(long, env = "WEEKCAST_WINDOW_DAYS", default_value_t = 4)]
    pub window_days: u32,

    /// What to do with rows that fail to parse.
    #[arg(long, env = "WEEKCAST_POLICY", value_enum, default_value_t = LoadPolicy::Lenient)]
    pub policy: LoadPolicy,

    /// How to report trends that extrapolate below zero.
    #[arg(long, env = "WEEKCAST_NEGATIVE", value_enum, default_value_t = NegativePolicy::Allow)]
    pub negative: NegativePolicy,
}

/// Options for the batch report.
#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Print the load summary before the predictions.
    #[arg(long)]
    pub summary: bool,

    /// Print an aligned table (with fit method) instead of report lines.
    #[arg(long)]
    pub table: bool,

    /// Export predictions to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// Options for a single prediction.
#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    /// Item name (any casing).
    pub item: String,

    #[command(flatten)]
    pub data: DataArgs,
}

/// Options for the HTTP server.
#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind.
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Origins allowed to call the API from a browser (comma separated).
    #[arg(
        long = "allow-origin",
        env = "WEEKCAST_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,
}

/// Options for synthetic data generation.
#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(short = 'o', long, default_value = "sales_data_july_weeks.csv")]
    pub out: PathBuf,

    /// First year to generate.
    #[arg(long, default_value_t = 2019)]
    pub first_year: i32,

    /// Last year to generate.
    #[arg(long, default_value_t = 2023)]
    pub last_year: i32,

    /// Days in each year's window (starting July 11).
    #[arg(long, default_value_t = 4)]
    pub window_days: u32,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_defaults() {
        let cli = Cli::parse_from(["weekcast", "predict", "Iced Latte", "--data", "x.csv"]);
        let Command::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.item, "Iced Latte");
        assert_eq!(args.data.data, PathBuf::from("x.csv"));
        assert_eq!(args.data.window_days, 4);
        assert_eq!(args.data.policy, LoadPolicy::Lenient);
        assert_eq!(args.data.negative, NegativePolicy::Allow);
    }

    #[test]
    fn serve_parses_origin_list() {
        let cli = Cli::parse_from([
            "weekcast",
            "serve",
            "--allow-origin",
            "http://a.test,http://b.test",
            "--negative",
            "clamp-zero",
            "--policy",
            "strict",
        ]);
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.allowed_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(args.data.negative, NegativePolicy::ClampZero);
        assert_eq!(args.data.policy, LoadPolicy::Strict);
    }
}
