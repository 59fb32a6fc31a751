//! Spreadsheet Collaborator - published CSV snapshots
//!
//! Fetches the telemetry sheet's CSV export and turns it into raw records.
//! Cells stay strings here; coercion belongs to the normalizer. Unparseable
//! rows are skipped with a warning instead of failing the whole snapshot.

use std::time::Duration;

use serde_json::Value;

use crate::constants;
use crate::logic::features::RawRecord;

use super::types::{SheetError, SheetSnapshot};

// ============================================================================
// SHEET CLIENT
// ============================================================================

pub struct SheetClient {
    csv_url: String,
    timeout: Duration,
}

impl SheetClient {
    /// Client for the configured default sheet
    pub fn new() -> Self {
        Self::with_url(constants::get_sheet_url())
    }

    pub fn with_url(csv_url: String) -> Self {
        Self {
            csv_url,
            timeout: Duration::from_secs(constants::get_timeout_secs()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch the published CSV and parse it (blocking)
    pub fn fetch_latest(&self) -> Result<SheetSnapshot, SheetError> {
        log::debug!("fetching spreadsheet snapshot from {}", self.csv_url);

        let response = ureq::get(&self.csv_url).timeout(self.timeout).call();

        match response {
            Ok(resp) => {
                let body = resp.into_string().map_err(|e| SheetError::Network {
                    message: e.to_string(),
                })?;
                parse_snapshot(&body)
            }
            Err(ureq::Error::Status(status, _)) => Err(SheetError::Http { status }),
            Err(e) => Err(SheetError::Network {
                message: e.to_string(),
            }),
        }
    }
}

impl Default for SheetClient {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// PARSING
// ============================================================================

/// Parse CSV text into a snapshot of raw records
pub fn parse_snapshot(body: &str) -> Result<SheetSnapshot, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SheetError::Parse {
            message: e.to_string(),
        })?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    let mut rows_read = 0usize;

    for (index, result) in reader.records().enumerate() {
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                // +2: records() starts after the header row, lines are 1-based
                log::warn!("skipping unparseable sheet row at line {}: {}", index + 2, e);
                continue;
            }
        };

        let mut row = RawRecord::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            row.insert(header.clone(), Value::String(field.to_string()));
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(SheetError::Empty);
    }

    log::debug!("spreadsheet snapshot: {} rows", rows.len());

    Ok(SheetSnapshot {
        headers,
        rows,
        rows_read,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
Timestamp,Temperature,Humidity,Pressure,Altitude,Solar Power
2025-04-01 09:00:00,27.1,48,100900.0,216,702.4
2025-04-01 10:00:00,29.4,41,100120.0,216,845.2
";

    #[test]
    fn test_parse_keeps_rows_in_order() {
        let snapshot = parse_snapshot(SAMPLE_CSV).expect("parse");
        assert_eq!(snapshot.rows.len(), 2);
        assert_eq!(snapshot.rows_read, 2);

        let latest = snapshot.latest().expect("latest row");
        assert_eq!(latest.get("Temperature").and_then(|v| v.as_str()), Some("29.4"));
    }

    #[test]
    fn test_empty_sheet_is_an_error() {
        let result = parse_snapshot("Temperature,Humidity,Pressure\n");
        assert!(matches!(result, Err(SheetError::Empty)));
    }

    #[test]
    fn test_ensure_columns() {
        let snapshot = parse_snapshot(SAMPLE_CSV).expect("parse");
        assert!(snapshot
            .ensure_columns(&["Temperature", "Humidity", "Pressure", "Altitude"])
            .is_ok());

        let err = snapshot.ensure_columns(&["Wind Speed"]).unwrap_err();
        assert!(matches!(err, SheetError::MissingColumn { name } if name == "Wind Speed"));
    }

    #[test]
    fn test_latest_solar_power() {
        let snapshot = parse_snapshot(SAMPLE_CSV).expect("parse");
        assert_eq!(snapshot.latest_solar_power(), Some(845.2));
    }

    #[test]
    fn test_missing_solar_power_column_is_none() {
        let csv = "Temperature,Humidity,Pressure\n25.0,50,101000.0\n";
        let snapshot = parse_snapshot(csv).expect("parse");
        assert_eq!(snapshot.latest_solar_power(), None);
    }

    #[test]
    fn test_blank_solar_power_cell_is_none() {
        let csv = "Temperature,Solar Power\n25.0,\n";
        let snapshot = parse_snapshot(csv).expect("parse");
        assert_eq!(snapshot.latest_solar_power(), None);
    }

    #[test]
    fn test_latest_timestamp_lenient_formats() {
        let snapshot = parse_snapshot(SAMPLE_CSV).expect("parse");
        let ts = snapshot.latest_timestamp().expect("timestamp");
        assert_eq!(ts.to_rfc3339(), "2025-04-01T10:00:00+00:00");

        let rfc = "Timestamp,Temperature\n2025-04-01T10:00:00Z,25.0\n";
        let snapshot = parse_snapshot(rfc).expect("parse");
        assert!(snapshot.latest_timestamp().is_some());
    }

    #[test]
    fn test_short_rows_tolerated() {
        // flexible(true): a truncated trailing row still parses, missing
        // cells simply stay absent from the record
        let csv = "Temperature,Humidity,Pressure\n25.0,50,101000.0\n26.0,49\n";
        let snapshot = parse_snapshot(csv).expect("parse");
        assert_eq!(snapshot.rows.len(), 2);
        let latest = snapshot.latest().expect("latest");
        assert!(latest.get("Pressure").is_none());
    }
}
