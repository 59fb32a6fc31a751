//! Pipeline - end-to-end composition
//!
//! Wires the adapters, normalizer, models and detector together: one user
//! action, one synchronous pass, one result. Any collaborator failure stops
//! the pass before a model is invoked — no partial predictions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::anomaly::{self, AnomalyVerdict, ThresholdConfig};
use crate::logic::features::{normalize, ModelSchema, RawRecord};
use crate::logic::ingest::{
    CurrentConditions, SheetClient, SheetError, WeatherClient, WeatherError,
};
use crate::logic::model::inference::{self, ModelError, RainfallLabel};

/// Spreadsheet columns the automated rainfall path consumes
const RAINFALL_SHEET_COLUMNS: &[&str] = &["Temperature", "Humidity", "Pressure"];

/// Spreadsheet columns the solar report consumes
const SOLAR_SHEET_COLUMNS: &[&str] = &["Temperature", "Humidity", "Pressure", "Altitude"];

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Settings for the composed (spreadsheet + weather API) paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub sheet_url: String,
    pub weather_api_key: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub threshold: ThresholdConfig,
    pub timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sheet_url: constants::get_sheet_url(),
            weather_api_key: constants::get_weather_api_key(),
            latitude: constants::get_latitude(),
            longitude: constants::get_longitude(),
            threshold: ThresholdConfig::new(constants::get_threshold_percent()),
            timeout_secs: constants::get_timeout_secs(),
        }
    }
}

impl PipelineConfig {
    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn sheet_client(&self) -> SheetClient {
        SheetClient::with_url(self.sheet_url.clone()).with_timeout(self.timeout())
    }

    fn weather_client(&self) -> WeatherClient {
        WeatherClient::new()
            .with_api_key(self.weather_api_key.clone())
            .with_timeout(self.timeout())
    }
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Request-level pipeline failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineError {
    /// A data source could not supply the inputs; no prediction was made
    DataUnavailable { reason: String },
    /// Model loading or invocation failed
    Model(ModelError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::DataUnavailable { reason } => {
                write!(f, "Data unavailable: {}", reason)
            }
            PipelineError::Model(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<SheetError> for PipelineError {
    fn from(err: SheetError) -> Self {
        PipelineError::DataUnavailable {
            reason: err.to_string(),
        }
    }
}

impl From<WeatherError> for PipelineError {
    fn from(err: WeatherError) -> Self {
        PipelineError::DataUnavailable {
            reason: err.to_string(),
        }
    }
}

impl From<ModelError> for PipelineError {
    fn from(err: ModelError) -> Self {
        PipelineError::Model(err)
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// Rainfall prediction result for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RainfallOutcome {
    pub label: RainfallLabel,
    /// Fields that were zero-filled during normalization
    pub degraded_fields: Vec<String>,
}

/// Solar prediction + anomaly check result for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolarOutcome {
    pub predicted_milliwatts: f32,
    pub actual_milliwatts: Option<f32>,
    /// Present only when an observed value existed
    pub verdict: Option<AnomalyVerdict>,
    pub degraded_fields: Vec<String>,
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Rainfall prediction from a raw feature record
pub fn run_rainfall_prediction(raw: &RawRecord) -> Result<RainfallOutcome, PipelineError> {
    let record = normalize(raw, ModelSchema::Rainfall);
    warn_degraded(&record.schema, &record.degraded);

    let label = inference::predict_rainfall(&record)?;
    log::info!("rainfall prediction: {}", label.as_str());

    Ok(RainfallOutcome {
        label,
        degraded_fields: record.degraded,
    })
}

/// Solar power prediction from a raw feature record, with an anomaly check
/// against the observed output when one is supplied
pub fn run_solar_prediction(
    raw: &RawRecord,
    actual: Option<f32>,
    threshold: &ThresholdConfig,
) -> Result<SolarOutcome, PipelineError> {
    let record = normalize(raw, ModelSchema::Solar);
    warn_degraded(&record.schema, &record.degraded);

    let predicted = inference::predict_solar(&record)?;
    let verdict = anomaly::detect(predicted, actual, threshold);

    match &verdict {
        Some(v) if v.is_anomalous => log::warn!(
            "solar output anomaly: predicted {:.2} mW, observed {:.2} mW ({:.1}% deviation)",
            v.predicted,
            v.actual,
            v.relative_difference_percent
        ),
        Some(v) => log::info!(
            "solar output normal: predicted {:.2} mW, observed {:.2} mW",
            v.predicted,
            v.actual
        ),
        None => log::info!(
            "solar output predicted {:.2} mW, no observation to compare",
            predicted
        ),
    }

    Ok(SolarOutcome {
        predicted_milliwatts: predicted,
        actual_milliwatts: actual,
        verdict,
        degraded_fields: record.degraded,
    })
}

/// Automated rainfall prediction: latest spreadsheet sample merged with live
/// weather conditions
///
/// Either collaborator failing halts the pass — no model invocation occurs.
pub fn run_automated_rainfall_prediction(
    config: &PipelineConfig,
) -> Result<RainfallOutcome, PipelineError> {
    let snapshot = config.sheet_client().fetch_latest()?;
    snapshot.ensure_columns(RAINFALL_SHEET_COLUMNS)?;

    let latest = snapshot.latest().ok_or_else(|| PipelineError::DataUnavailable {
        reason: SheetError::Empty.to_string(),
    })?;

    let conditions = config
        .weather_client()
        .fetch_current(config.latitude, config.longitude)?;

    let raw = merge_conditions(latest, &conditions, RAINFALL_SHEET_COLUMNS);
    run_rainfall_prediction(&raw)
}

/// Solar report: latest spreadsheet sample through the regressor, compared
/// against the observed `Solar Power` column when it exists
pub fn run_solar_report(config: &PipelineConfig) -> Result<SolarOutcome, PipelineError> {
    let snapshot = config.sheet_client().fetch_latest()?;
    snapshot.ensure_columns(SOLAR_SHEET_COLUMNS)?;

    let actual = snapshot.latest_solar_power();
    let latest = snapshot.latest().ok_or_else(|| PipelineError::DataUnavailable {
        reason: SheetError::Empty.to_string(),
    })?;

    run_solar_prediction(latest, actual, &config.threshold)
}

/// Subset the sheet columns the model needs and merge live conditions in,
/// under the loose names the normalizer's alias table knows
pub fn merge_conditions(
    row: &RawRecord,
    conditions: &CurrentConditions,
    columns: &[&str],
) -> RawRecord {
    let mut merged = RawRecord::new();

    for column in columns {
        if let Some(value) = row.get(*column) {
            merged.insert((*column).to_string(), value.clone());
        }
    }

    merged.insert(
        "Cloud Cover".to_string(),
        serde_json::json!(conditions.cloud_cover),
    );
    merged.insert(
        "Wind Speed".to_string(),
        serde_json::json!(conditions.wind_speed),
    );

    merged
}

fn warn_degraded(schema: &ModelSchema, degraded: &[String]) {
    if !degraded.is_empty() {
        log::warn!(
            "{} record degraded: zero-filled fields {:?}",
            schema.as_str(),
            degraded
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
