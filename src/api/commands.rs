//! Commands - pipeline entry points for the presentation layer
//!
//! Thin wrappers over `logic::pipeline`: inputs are plain serde-friendly
//! structs, failures come back as display strings the frontend can show
//! as-is. The composed commands read the process-wide pipeline config, which
//! defaults from the environment and can be replaced at startup.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::logic::features::RawRecord;
use crate::logic::model::inference::{self, EngineStatus};
use crate::logic::pipeline::{self, PipelineConfig, RainfallOutcome, SolarOutcome};

// ============================================================================
// STATE
// ============================================================================

/// Active pipeline configuration for the composed commands
static PIPELINE_CONFIG: Lazy<RwLock<PipelineConfig>> =
    Lazy::new(|| RwLock::new(PipelineConfig::default()));

/// Replace the active pipeline configuration
pub fn set_pipeline_config(config: PipelineConfig) {
    *PIPELINE_CONFIG.write() = config;
}

/// Snapshot of the active pipeline configuration
pub fn get_pipeline_config() -> PipelineConfig {
    PIPELINE_CONFIG.read().clone()
}

// ============================================================================
// INPUTS
// ============================================================================

/// Manually entered rainfall conditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualRainfallInput {
    /// Temperature (°C)
    pub temperature: f32,
    /// Humidity (%)
    pub humidity: f32,
    /// Wind speed (m/s)
    pub wind_speed: f32,
    /// Cloud cover (%)
    pub cloud_cover: f32,
    /// Pressure (Pa)
    pub pressure: f32,
}

impl ManualRainfallInput {
    /// Loose record under the names the form fields use
    pub fn to_raw(&self) -> RawRecord {
        let mut raw = RawRecord::new();
        raw.insert("Temperature".to_string(), json!(self.temperature));
        raw.insert("Humidity".to_string(), json!(self.humidity));
        raw.insert("Wind Speed".to_string(), json!(self.wind_speed));
        raw.insert("Cloud Cover".to_string(), json!(self.cloud_cover));
        raw.insert("Pressure".to_string(), json!(self.pressure));
        raw
    }
}

/// Solar conditions plus an optional observed output to compare against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolarInput {
    /// Temperature (°C)
    pub temperature: f32,
    /// Humidity (%)
    pub humidity: f32,
    /// Pressure (Pa)
    pub pressure: f32,
    /// Altitude (m)
    pub altitude: f32,
    /// Observed output (mW), when a reading exists
    pub actual_milliwatts: Option<f32>,
}

impl SolarInput {
    pub fn to_raw(&self) -> RawRecord {
        let mut raw = RawRecord::new();
        raw.insert("Temperature".to_string(), json!(self.temperature));
        raw.insert("Humidity".to_string(), json!(self.humidity));
        raw.insert("Pressure".to_string(), json!(self.pressure));
        raw.insert("Altitude".to_string(), json!(self.altitude));
        raw
    }
}

// ============================================================================
// PIPELINE COMMANDS
// ============================================================================

/// Rainfall prediction from manual input
pub fn run_rainfall_prediction(input: &ManualRainfallInput) -> Result<RainfallOutcome, String> {
    pipeline::run_rainfall_prediction(&input.to_raw()).map_err(|e| e.to_string())
}

/// Solar power prediction (+ anomaly check when an observation is supplied)
pub fn run_solar_prediction(input: &SolarInput) -> Result<SolarOutcome, String> {
    let config = get_pipeline_config();
    pipeline::run_solar_prediction(&input.to_raw(), input.actual_milliwatts, &config.threshold)
        .map_err(|e| e.to_string())
}

/// Automated rainfall prediction: spreadsheet + weather API composition
pub fn run_automated_rainfall_prediction() -> Result<RainfallOutcome, String> {
    let config = get_pipeline_config();
    pipeline::run_automated_rainfall_prediction(&config).map_err(|e| e.to_string())
}

/// Solar report from the latest spreadsheet sample
pub fn run_solar_report() -> Result<SolarOutcome, String> {
    let config = get_pipeline_config();
    pipeline::run_solar_report(&config).map_err(|e| e.to_string())
}

// ============================================================================
// STATUS COMMANDS
// ============================================================================

/// Engine status for the dashboard header
pub fn get_engine_status() -> EngineStatus {
    inference::get_status()
}

// ============================================================================
// TESTS
// ============================================================================
