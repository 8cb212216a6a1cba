//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - loads and aggregates the sales export
//! - prints reports / answers queries / serves HTTP
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, DataArgs, PredictArgs, ReportArgs, SampleArgs, ServeArgs};
use crate::data::SampleSpec;
use crate::domain::{ForecastConfig, WeekScale};
use crate::error::AppError;
use crate::server::{AppState, ServerConfig};
use crate::service::SharedSnapshot;

pub mod pipeline;

/// Entry point for the `weekcast` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    crate::logging::init();

    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Report(args) => handle_report(args),
        Command::Predict(args) => handle_predict(args),
        Command::Serve(args) => handle_serve(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    let config = forecast_config_from_args(&args.data)?;
    let forecaster = pipeline::load_forecaster(&config)?;
    let predictions = forecaster.predict_all(config.target_year);

    if args.summary {
        println!("{}", crate::report::format_load_summary(forecaster.snapshot(), &config));
    }

    if args.table {
        print!("{}", crate::report::format_table(&predictions));
    } else {
        print!("{}", crate::report::format_predictions(&predictions, config.target_year));
    }

    if let Some(path) = &args.export {
        crate::io::export::write_predictions_csv(path, &predictions)?;
        tracing::info!(path = %path.display(), rows = predictions.len(), "predictions exported");
    }

    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let config = forecast_config_from_args(&args.data)?;
    let forecaster = pipeline::load_forecaster(&config)?;

    let prediction = forecaster.lookup(&args.item, config.target_year)?;
    println!("{}", crate::report::format_prediction(&prediction));
    Ok(())
}

fn handle_serve(args: ServeArgs) -> Result<(), AppError> {
    let config = forecast_config_from_args(&args.data)?;
    // Refuse to start without a complete snapshot.
    let snapshot = pipeline::load_snapshot(&config)?;

    let server = ServerConfig {
        host: args.host,
        port: args.port,
        allowed_origins: args.allowed_origins,
    };
    let state = AppState::new(SharedSnapshot::new(snapshot), config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::new(4, format!("Failed to start async runtime: {e}")))?;
    runtime.block_on(crate::server::serve(state, server))
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let params = SampleSpec {
        first_year: args.first_year,
        last_year: args.last_year,
        window_days: args.window_days,
        seed: args.seed,
        ..SampleSpec::default()
    };
    let records = crate::data::generate_sample(&params)?;
    crate::data::write_sample_csv(&args.out, &records)?;
    println!("Wrote {} rows to {}", records.len(), args.out.display());
    Ok(())
}

pub fn forecast_config_from_args(args: &DataArgs) -> Result<ForecastConfig, AppError> {
    let week_scale = WeekScale::new(args.window_days)
        .ok_or_else(|| AppError::new(2, "`--window-days` must be at least 1."))?;

    Ok(ForecastConfig {
        data_path: args.data.clone(),
        target_year: args.year,
        week_scale,
        load_policy: args.policy,
        negative_policy: args.negative,
    })
}
