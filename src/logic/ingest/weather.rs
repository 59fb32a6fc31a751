//! Weather API Collaborator - live cloud cover and wind speed
//!
//! Queries the Stormglass point endpoint for the station coordinates and
//! extracts the first hour block's NOAA values. The rainfall model needs both
//! readings; a response without them is reported as missing data, which is a
//! different failure than the API being unreachable.

use std::time::Duration;

use chrono::Utc;

use crate::constants;

use super::types::{CurrentConditions, PointResponse, WeatherError};

// ============================================================================
// WEATHER CLIENT
// ============================================================================

pub struct WeatherClient {
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl WeatherClient {
    /// Client configured from the environment
    pub fn new() -> Self {
        Self {
            api_key: constants::get_weather_api_key(),
            base_url: constants::WEATHER_API_BASE.to_string(),
            timeout: Duration::from_secs(constants::get_timeout_secs()),
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.is_empty());
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch current conditions for a coordinate (blocking)
    pub fn fetch_current(&self, lat: f64, lon: f64) -> Result<CurrentConditions, WeatherError> {
        let api_key = self.api_key.as_ref().ok_or(WeatherError::NotConfigured)?;

        let url = format!(
            "{}/weather/point?lat={}&lng={}&params=cloudCover,windSpeed",
            self.base_url, lat, lon
        );

        log::debug!("fetching weather conditions for ({}, {})", lat, lon);

        let response = ureq::get(&url)
            .set("Authorization", api_key)
            .timeout(self.timeout)
            .call();

        match response {
            Ok(resp) => {
                let body = resp.into_string().map_err(|e| WeatherError::Network {
                    message: e.to_string(),
                })?;
                parse_point_response(&body)
            }
            Err(ureq::Error::Status(401, _)) => Err(WeatherError::InvalidApiKey),
            Err(ureq::Error::Status(429, _)) => Err(WeatherError::RateLimited { retry_after: 60 }),
            Err(ureq::Error::Status(status, _)) => Err(WeatherError::Unavailable { status }),
            Err(e) => Err(WeatherError::Network {
                message: e.to_string(),
            }),
        }
    }
}

impl Default for WeatherClient {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// PARSING
// ============================================================================

/// Extract current conditions from a point-endpoint response body
pub fn parse_point_response(body: &str) -> Result<CurrentConditions, WeatherError> {
    let parsed: PointResponse = serde_json::from_str(body).map_err(|e| WeatherError::Parse {
        message: e.to_string(),
    })?;

    let hour = parsed.hours.first().ok_or_else(|| WeatherError::MissingData {
        field: "hours".to_string(),
    })?;

    let cloud_cover = hour
        .cloud_cover
        .noaa
        .ok_or_else(|| WeatherError::MissingData {
            field: "cloudCover".to_string(),
        })?;

    let wind_speed = hour
        .wind_speed
        .noaa
        .ok_or_else(|| WeatherError::MissingData {
            field: "windSpeed".to_string(),
        })?;

    Ok(CurrentConditions {
        cloud_cover,
        wind_speed,
        fetched_at: Utc::now(),
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_hour_noaa_values() {
        let body = r#"{
            "hours": [
                {
                    "time": "2025-04-01T10:00:00+00:00",
                    "cloudCover": {"noaa": 50.5, "sg": 48.0},
                    "windSpeed": {"noaa": 7.33, "sg": 7.1}
                },
                {
                    "time": "2025-04-01T11:00:00+00:00",
                    "cloudCover": {"noaa": 61.0},
                    "windSpeed": {"noaa": 8.0}
                }
            ]
        }"#;

        let conditions = parse_point_response(body).expect("parse");
        assert_eq!(conditions.cloud_cover, 50.5);
        assert_eq!(conditions.wind_speed, 7.33);
    }

    #[test]
    fn test_empty_hours_is_missing_data() {
        let err = parse_point_response(r#"{"hours": []}"#).unwrap_err();
        assert!(matches!(err, WeatherError::MissingData { field } if field == "hours"));
    }

    #[test]
    fn test_missing_noaa_value_is_missing_data() {
        let body = r#"{
            "hours": [
                {"cloudCover": {"sg": 48.0}, "windSpeed": {"noaa": 7.33}}
            ]
        }"#;

        let err = parse_point_response(body).unwrap_err();
        assert!(matches!(err, WeatherError::MissingData { field } if field == "cloudCover"));
    }

    #[test]
    fn test_garbage_body_is_parse_error() {
        let err = parse_point_response("not json").unwrap_err();
        assert!(matches!(err, WeatherError::Parse { .. }));
    }

    #[test]
    fn test_unconfigured_client_does_not_call_out() {
        let client = WeatherClient::new().with_api_key(None);
        let err = client.fetch_current(28.6139, 77.2090).unwrap_err();
        assert!(matches!(err, WeatherError::NotConfigured));
    }
}
