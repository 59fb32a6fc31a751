//! Input Normalizer - raw dictionaries → canonical feature records
//!
//! Raw inputs arrive with loose names ("Wind Speed", "Pressure") and loose
//! types (spreadsheet cells are strings, manual entry is numeric). This module
//! renames known aliases, selects exactly the schema's fields in trained
//! order, and coerces every value to `f32`.
//!
//! Coercion is lenient by policy: a missing or non-numeric field becomes 0.0
//! instead of failing the record. Every zero-fill is logged and recorded in
//! the record's `degraded` list, so downstream consumers can tell a defaulted
//! value from a genuine zero reading. No physical-range validation is done
//! here (a 200 °C temperature passes through untouched).

use std::collections::HashMap;

use serde_json::Value;

use super::record::FeatureRecord;
use super::schema::ModelSchema;

/// Loose input record: raw field name → raw value (string or number)
pub type RawRecord = serde_json::Map<String, Value>;

/// Normalize a raw record into the canonical feature record for `schema`
///
/// Unknown/extra fields are dropped. Output order is fixed by the schema
/// layout regardless of input key order.
pub fn normalize(raw: &RawRecord, schema: ModelSchema) -> FeatureRecord {
    // Alias rename first, keeping only fields the schema knows about
    let mut canonical: HashMap<&'static str, &Value> = HashMap::new();
    for (key, value) in raw {
        if let Some(name) = schema.canonical_name(key) {
            canonical.insert(name, value);
        }
    }

    let mut record = FeatureRecord::new(schema);

    for (index, field) in schema.layout().iter().enumerate() {
        match canonical.get(field) {
            None => {
                log::warn!(
                    "{}: field '{}' missing from input, defaulting to 0.0",
                    schema.as_str(),
                    field
                );
                record.mark_degraded(field);
            }
            Some(value) => match coerce(value) {
                Some(number) => record.values[index] = number,
                None => {
                    log::warn!(
                        "{}: field '{}' is non-numeric ({}), defaulting to 0.0",
                        schema.as_str(),
                        field,
                        value
                    );
                    record.mark_degraded(field);
                }
            },
        }
    }

    record
}

/// Coerce a loose JSON value to `f32`
///
/// Numbers pass through; strings are trimmed and parsed. Everything else
/// (null, bool, arrays, objects) is non-numeric.
fn coerce(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(pairs: &[(&str, Value)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_missing_key_defaults_to_zero() {
        let input = raw(&[
            ("Temperature", json!(23.7)),
            ("Humidity", json!(89.6)),
            // Wind Speed, Cloud Cover, Pressure absent
        ]);

        let record = normalize(&input, ModelSchema::Rainfall);
        assert_eq!(record.get_by_name("Wind_Speed"), Some(0.0));
        assert_eq!(record.get_by_name("Pressure"), Some(0.0));
        assert!(record.is_degraded("Wind_Speed"));
        assert!(record.is_degraded("Cloud_Cover"));
        assert!(record.is_degraded("Pressure"));
        assert!(!record.is_degraded("Temperature"));
    }

    #[test]
    fn test_non_numeric_defaults_to_zero() {
        let input = raw(&[
            ("Temperature", json!("not a number")),
            ("Humidity", json!(null)),
            ("Wind Speed", json!(7.33)),
            ("Cloud Cover", json!(true)),
            ("Pressure", json!(103237.0)),
        ]);

        let record = normalize(&input, ModelSchema::Rainfall);
        assert_eq!(record.get_by_name("Temperature"), Some(0.0));
        assert_eq!(record.get_by_name("Humidity"), Some(0.0));
        assert_eq!(record.get_by_name("Cloud_Cover"), Some(0.0));
        assert_eq!(record.get_by_name("Wind_Speed"), Some(7.33));
        assert!(record.is_degraded("Temperature"));
        assert!(record.is_degraded("Humidity"));
        assert!(record.is_degraded("Cloud_Cover"));
        assert!(!record.is_degraded("Pressure"));
    }

    #[test]
    fn test_string_cells_are_parsed() {
        let input = raw(&[
            ("Temperature", json!(" 31.2 ")),
            ("Humidity", json!("40")),
            ("Pressure", json!("95432.5")),
            ("Altitude", json!("216")),
        ]);

        let record = normalize(&input, ModelSchema::Solar);
        assert_eq!(record.get_by_name("temperature"), Some(31.2));
        assert_eq!(record.get_by_name("humidity"), Some(40.0));
        assert_eq!(record.get_by_name("surface_pressure"), Some(95432.5));
        assert_eq!(record.get_by_name("altitude"), Some(216.0));
        assert!(record.degraded.is_empty());
    }

    #[test]
    fn test_order_independent_of_input_order() {
        let forwards = raw(&[
            ("Temperature", json!(1.0)),
            ("Humidity", json!(2.0)),
            ("Wind Speed", json!(3.0)),
            ("Cloud Cover", json!(4.0)),
            ("Pressure", json!(5.0)),
        ]);
        let backwards = raw(&[
            ("Pressure", json!(5.0)),
            ("Cloud Cover", json!(4.0)),
            ("Wind Speed", json!(3.0)),
            ("Humidity", json!(2.0)),
            ("Temperature", json!(1.0)),
        ]);

        let a = normalize(&forwards, ModelSchema::Rainfall);
        let b = normalize(&backwards, ModelSchema::Rainfall);
        assert_eq!(a.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(a.as_slice(), b.as_slice());
    }

    #[test]
    fn test_unknown_fields_dropped() {
        let input = raw(&[
            ("Temperature", json!(23.7)),
            ("Humidity", json!(89.6)),
            ("Wind Speed", json!(7.33)),
            ("Cloud Cover", json!(50.5)),
            ("Pressure", json!(103237.0)),
            ("Timestamp", json!("2025-04-01T10:00:00Z")),
            ("Solar Power", json!(812.0)),
        ]);

        let record = normalize(&input, ModelSchema::Rainfall);
        assert_eq!(record.values.len(), 5);
        assert!(record.degraded.is_empty());
    }

    #[test]
    fn test_rainfall_scenario_field_order() {
        let input = raw(&[
            ("Temperature", json!(23.7)),
            ("Humidity", json!(89.6)),
            ("Wind Speed", json!(7.33)),
            ("Cloud Cover", json!(50.5)),
            ("Pressure", json!(103237.0)),
        ]);

        let record = normalize(&input, ModelSchema::Rainfall);
        assert_eq!(record.as_slice(), &[23.7, 89.6, 7.33, 50.5, 103237.0]);
        assert_eq!(
            record.schema.layout(),
            &["Temperature", "Humidity", "Wind_Speed", "Cloud_Cover", "Pressure"]
        );
    }

    #[test]
    fn test_solar_pressure_alias_applies() {
        let input = raw(&[
            ("Temperature", json!(30.0)),
            ("Humidity", json!(45.0)),
            ("Pressure", json!(100800.0)),
            ("Altitude", json!(520.0)),
        ]);

        let record = normalize(&input, ModelSchema::Solar);
        assert_eq!(record.get_by_name("surface_pressure"), Some(100800.0));
        assert_eq!(record.as_slice(), &[30.0, 45.0, 100800.0, 520.0]);
    }
}
