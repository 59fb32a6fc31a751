//! Solar Tracker - CLI Entry Point
//!
//! Drives the core pipeline from the terminal with the same three actions the
//! dashboard menu offers: manual rainfall prediction, automated prediction
//! from live data, and the solar output report.

use clap::{Parser, Subcommand};

use solar_tracker_core::api::commands::{self, ManualRainfallInput};
use solar_tracker_core::constants;
use solar_tracker_core::logic::model::inference::{self, ModelKind};

#[derive(Parser)]
#[command(
    name = "solar-tracker",
    version,
    about = "Solar Tracker Dashboard - core prediction service"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rainfall prediction from manually entered conditions
    Manual {
        /// Temperature (°C)
        #[arg(long, default_value_t = 23.7)]
        temperature: f32,
        /// Humidity (%)
        #[arg(long, default_value_t = 89.6)]
        humidity: f32,
        /// Wind speed (m/s)
        #[arg(long, default_value_t = 7.33)]
        wind_speed: f32,
        /// Cloud cover (%)
        #[arg(long, default_value_t = 50.5)]
        cloud_cover: f32,
        /// Pressure (Pa)
        #[arg(long, default_value_t = 103237.0)]
        pressure: f32,
    },
    /// Automated rainfall prediction from the spreadsheet + weather API
    Automated,
    /// Solar power report with anomaly check against the observed output
    Solar,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!(
        "Starting {} core v{}...",
        constants::APP_NAME,
        constants::APP_VERSION
    );

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Manual {
            temperature,
            humidity,
            wind_speed,
            cloud_cover,
            pressure,
        } => run_manual(ManualRainfallInput {
            temperature,
            humidity,
            wind_speed,
            cloud_cover,
            pressure,
        }),
        Command::Automated => run_automated(),
        Command::Solar => run_solar(),
    };

    if let Err(message) = result {
        eprintln!("error: {}", message);
        std::process::exit(1);
    }
}

fn run_manual(input: ManualRainfallInput) -> Result<(), String> {
    warm_up(ModelKind::Rainfall)?;

    let outcome = commands::run_rainfall_prediction(&input)?;
    print_degraded(&outcome.degraded_fields);
    println!("Predicted Rainfall: {}", outcome.label.as_str());
    Ok(())
}

fn run_automated() -> Result<(), String> {
    warm_up(ModelKind::Rainfall)?;

    let outcome = commands::run_automated_rainfall_prediction()?;
    print_degraded(&outcome.degraded_fields);
    println!("Latest Prediction: {}", outcome.label.as_str());
    Ok(())
}

fn run_solar() -> Result<(), String> {
    warm_up(ModelKind::Solar)?;

    let outcome = commands::run_solar_report()?;
    print_degraded(&outcome.degraded_fields);

    println!("Predicted Output: {:.2} mW", outcome.predicted_milliwatts);
    match outcome.actual_milliwatts {
        Some(actual) => println!("Actual Output: {:.2} mW", actual),
        None => println!("Actual Output not available."),
    }

    if let Some(verdict) = outcome.verdict {
        if verdict.is_anomalous {
            println!(
                "Anomaly Detected! Difference: {:.2} mW ({:.1}%)",
                verdict.absolute_difference, verdict.relative_difference_percent
            );
        } else {
            println!("System Operating Normally");
        }
    }
    Ok(())
}

/// Load the model up front so a missing artifact fails before any fetch
fn warm_up(kind: ModelKind) -> Result<(), String> {
    let already_loaded = inference::is_model_loaded(kind);
    inference::ensure_loaded(kind).map_err(|e| e.to_string())?;
    if !already_loaded {
        log::info!("{} model ready", kind.as_str());
    }
    Ok(())
}

fn print_degraded(fields: &[String]) {
    if !fields.is_empty() {
        println!("warning: zero-filled input fields: {}", fields.join(", "));
    }
}
