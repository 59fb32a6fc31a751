//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To change the default spreadsheet or weather endpoint, only edit this file.

use std::path::PathBuf;

/// Default published-CSV URL of the telemetry spreadsheet
///
/// This is the fallback URL when no environment variable is set.
pub const DEFAULT_SHEET_CSV_URL: &str =
    "https://docs.google.com/spreadsheets/d/1FJL6mVDp7xfxs0w2Jmnw7dbDhUQkOnQ6muOwC5dCaAE/gviz/tq?tqx=out:csv";

/// Weather API base URL (Stormglass)
pub const WEATHER_API_BASE: &str = "https://api.stormglass.io/v2";

/// Default station coordinates (Delhi)
pub const DEFAULT_LATITUDE: f64 = 28.6139;
pub const DEFAULT_LONGITUDE: f64 = 77.2090;

/// Default network timeout for both collaborators (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default anomaly threshold (percent deviation from predicted output)
pub const DEFAULT_THRESHOLD_PERCENT: f32 = 25.0;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Solar Tracker";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get spreadsheet CSV URL from environment or use default
pub fn get_sheet_url() -> String {
    std::env::var("SHEET_CSV_URL").unwrap_or_else(|_| DEFAULT_SHEET_CSV_URL.to_string())
}

/// Get weather API key from environment (no default; unset means unconfigured)
pub fn get_weather_api_key() -> Option<String> {
    std::env::var("STORMGLASS_API_KEY")
        .ok()
        .filter(|key| !key.is_empty())
}

/// Get station latitude from environment or use default
pub fn get_latitude() -> f64 {
    std::env::var("STATION_LATITUDE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_LATITUDE)
}

/// Get station longitude from environment or use default
pub fn get_longitude() -> f64 {
    std::env::var("STATION_LONGITUDE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_LONGITUDE)
}

/// Get network timeout from environment or use default
pub fn get_timeout_secs() -> u64 {
    std::env::var("FETCH_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
}

/// Get anomaly threshold percent from environment or use default
pub fn get_threshold_percent() -> f32 {
    std::env::var("ANOMALY_THRESHOLD_PERCENT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_THRESHOLD_PERCENT)
}

/// Get model artifact directory from environment or use the local data dir
pub fn get_model_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MODEL_DIR") {
        return PathBuf::from(dir);
    }

    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("solar-tracker")
        .join("models")
}
