//! Ingest Types - snapshots, conditions, and error kinds

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::features::RawRecord;

// ============================================================================
// SPREADSHEET TYPES
// ============================================================================

/// Column carrying the observed power reading (optional in the sheet)
pub const SOLAR_POWER_COLUMN: &str = "Solar Power";

/// Column carrying the sample timestamp (optional in the sheet)
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// Parsed spreadsheet state: raw rows keyed by header name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetSnapshot {
    /// Header names as published
    pub headers: Vec<String>,
    /// Rows in sheet order; cells stay raw strings until normalization
    pub rows: Vec<RawRecord>,
    /// Rows seen in the CSV, including ones skipped as unparseable
    pub rows_read: usize,
}

impl SheetSnapshot {
    /// The most recent sample (last row)
    pub fn latest(&self) -> Option<&RawRecord> {
        self.rows.last()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fail unless every required column is published
    pub fn ensure_columns(&self, required: &[&str]) -> Result<(), SheetError> {
        for name in required {
            if !self.headers.iter().any(|h| h == name) {
                return Err(SheetError::MissingColumn {
                    name: (*name).to_string(),
                });
            }
        }
        Ok(())
    }

    /// Observed power output from the latest row, when the column exists and
    /// the cell parses. Absence is "no observation", not an error.
    pub fn latest_solar_power(&self) -> Option<f32> {
        self.latest()
            .and_then(|row| row.get(SOLAR_POWER_COLUMN))
            .and_then(|value| match value {
                serde_json::Value::String(s) => s.trim().parse::<f32>().ok(),
                serde_json::Value::Number(n) => n.as_f64().map(|v| v as f32),
                _ => None,
            })
    }

    /// Timestamp of the latest row, parsed leniently
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self
            .latest()
            .and_then(|row| row.get(TIMESTAMP_COLUMN))
            .and_then(|value| value.as_str())?;

        parse_timestamp(raw)
    }
}

/// Accept RFC 3339 or the plain "YYYY-MM-DD HH:MM:SS" the sheet exports
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Some(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Spreadsheet fetch/parse failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SheetError {
    /// Transport-level failure (DNS, connect, timeout)
    Network { message: String },
    /// Non-200 response from the sheet endpoint
    Http { status: u16 },
    /// Sheet fetched but contains no data rows
    Empty,
    /// A required column is not published
    MissingColumn { name: String },
    /// CSV structure could not be parsed at all
    Parse { message: String },
}

impl std::fmt::Display for SheetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetError::Network { message } => write!(f, "Spreadsheet network error: {}", message),
            SheetError::Http { status } => {
                write!(f, "Spreadsheet fetch failed with status {}", status)
            }
            SheetError::Empty => write!(f, "Spreadsheet contains no data rows"),
            SheetError::MissingColumn { name } => {
                write!(f, "Spreadsheet is missing required column '{}'", name)
            }
            SheetError::Parse { message } => write!(f, "Spreadsheet parse error: {}", message),
        }
    }
}

impl std::error::Error for SheetError {}

// ============================================================================
// WEATHER API TYPES
// ============================================================================

/// Live conditions merged into the rainfall record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Cloud cover (%)
    pub cloud_cover: f32,
    /// Wind speed (m/s)
    pub wind_speed: f32,
    pub fetched_at: DateTime<Utc>,
}

/// Weather API failures
///
/// "API down" (`Unavailable`, `Network`) is deliberately distinct from "the
/// API answered but had no usable values" (`MissingData`): both halt the
/// automated pipeline, but they are different operational problems.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WeatherError {
    /// No API key configured
    NotConfigured,
    /// API key rejected (401)
    InvalidApiKey,
    /// Request quota exhausted (429)
    RateLimited { retry_after: u64 },
    /// Non-200 response
    Unavailable { status: u16 },
    /// Transport-level failure (DNS, connect, timeout)
    Network { message: String },
    /// 200 response without the expected value
    MissingData { field: String },
    /// Response body could not be parsed
    Parse { message: String },
}

impl std::fmt::Display for WeatherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherError::NotConfigured => write!(f, "Weather API key not configured"),
            WeatherError::InvalidApiKey => write!(f, "Invalid weather API key"),
            WeatherError::RateLimited { retry_after } => {
                write!(f, "Weather API rate limited, retry after {} seconds", retry_after)
            }
            WeatherError::Unavailable { status } => {
                write!(f, "Weather API unavailable (status {})", status)
            }
            WeatherError::Network { message } => write!(f, "Weather API network error: {}", message),
            WeatherError::MissingData { field } => {
                write!(f, "Weather API response has no '{}' value", field)
            }
            WeatherError::Parse { message } => write!(f, "Weather API parse error: {}", message),
        }
    }
}

impl std::error::Error for WeatherError {}

// ============================================================================
// API RESPONSE TYPES (for parsing the point endpoint)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PointResponse {
    #[serde(default)]
    pub hours: Vec<HourBlock>,
}

#[derive(Debug, Deserialize)]
pub struct HourBlock {
    #[serde(rename = "cloudCover", default)]
    pub cloud_cover: SourceValues,
    #[serde(rename = "windSpeed", default)]
    pub wind_speed: SourceValues,
    #[serde(default)]
    pub time: Option<String>,
}

/// Per-source values; only the NOAA series is consumed
#[derive(Debug, Default, Deserialize)]
pub struct SourceValues {
    pub noaa: Option<f32>,
    #[serde(default)]
    pub sg: Option<f32>,
}
