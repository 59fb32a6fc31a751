//! Feature Schema - Centralized Layout Definition
//!
//! **CRITICAL: This file controls the per-model feature schemas**
//!
//! ## Rules (NEVER break these):
//! 1. Add field → increment SCHEMA_VERSION
//! 2. Change order → increment SCHEMA_VERSION
//! 3. Remove field → increment SCHEMA_VERSION
//!
//! Field order is positional input to the pre-trained artifacts. Reordering a
//! layout without retraining silently produces garbage predictions, which is
//! why every record carries the layout hash computed here.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// SCHEMA VERSION
// ============================================================================

/// Current schema version
/// MUST be incremented when any layout changes
pub const SCHEMA_VERSION: u8 = 1;

// ============================================================================
// LAYOUTS (Authoritative source)
// ============================================================================

/// Rainfall classifier input, in exact trained column order
pub const RAINFALL_LAYOUT: &[&str] = &[
    "Temperature", // 0: Air temperature (°C)
    "Humidity",    // 1: Relative humidity (%)
    "Wind_Speed",  // 2: Wind speed (m/s)
    "Cloud_Cover", // 3: Cloud cover (%)
    "Pressure",    // 4: Atmospheric pressure (Pa)
];

/// Solar power regressor input, in exact trained column order
pub const SOLAR_LAYOUT: &[&str] = &[
    "temperature",      // 0: Air temperature (°C)
    "humidity",         // 1: Relative humidity (%)
    "surface_pressure", // 2: Surface pressure (Pa)
    "altitude",         // 3: Station altitude (m)
];

/// Alias → canonical renames for raw rainfall inputs
const RAINFALL_ALIASES: &[(&str, &str)] = &[
    ("Wind Speed", "Wind_Speed"),
    ("Cloud Cover", "Cloud_Cover"),
];

/// Alias → canonical renames for raw solar inputs (spreadsheet headers)
const SOLAR_ALIASES: &[(&str, &str)] = &[
    ("Temperature", "temperature"),
    ("Humidity", "humidity"),
    ("Pressure", "surface_pressure"),
    ("Altitude", "altitude"),
];

// ============================================================================
// MODEL SCHEMA
// ============================================================================

/// Which canonical input shape a record conforms to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelSchema {
    Rainfall,
    Solar,
}

impl ModelSchema {
    /// Canonical field names in trained order
    pub fn layout(&self) -> &'static [&'static str] {
        match self {
            ModelSchema::Rainfall => RAINFALL_LAYOUT,
            ModelSchema::Solar => SOLAR_LAYOUT,
        }
    }

    fn aliases(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            ModelSchema::Rainfall => RAINFALL_ALIASES,
            ModelSchema::Solar => SOLAR_ALIASES,
        }
    }

    /// Number of fields this schema feeds to its model
    pub fn field_count(&self) -> usize {
        self.layout().len()
    }

    /// Get field index by canonical name (O(n) but fields are few)
    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.layout().iter().position(|&n| n == name)
    }

    /// Get canonical field name by index
    pub fn feature_name(&self, index: usize) -> Option<&'static str> {
        self.layout().get(index).copied()
    }

    /// Resolve a raw input key to its canonical field name
    ///
    /// Exact canonical names pass through; known aliases are renamed;
    /// anything else is an unknown field and gets dropped by the normalizer.
    pub fn canonical_name(&self, raw: &str) -> Option<&'static str> {
        if let Some(index) = self.feature_index(raw) {
            return self.feature_name(index);
        }
        self.aliases()
            .iter()
            .find(|(alias, _)| *alias == raw)
            .map(|(_, canonical)| *canonical)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSchema::Rainfall => "rainfall",
            ModelSchema::Solar => "solar",
        }
    }

    /// CRC32 hash of this schema's layout
    /// Used to detect layout drift between a record and the current schema
    pub fn layout_hash(&self) -> u32 {
        let mut hasher = Hasher::new();

        hasher.update(&[SCHEMA_VERSION]);
        hasher.update(self.as_str().as_bytes());
        hasher.update(&[0]);

        for name in self.layout() {
            hasher.update(name.as_bytes());
            hasher.update(&[0]); // Separator
        }

        hasher.finalize()
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when a record's layout doesn't match the current schema
#[derive(Debug, Clone)]
pub struct LayoutMismatchError {
    pub schema: ModelSchema,
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

impl std::fmt::Display for LayoutMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} layout mismatch: expected v{} (hash: {:08x}), got v{} (hash: {:08x})",
            self.schema.as_str(),
            self.expected_version,
            self.expected_hash,
            self.actual_version,
            self.actual_hash
        )
    }
}

impl std::error::Error for LayoutMismatchError {}

/// Validate that a record's version/hash match the current schema layout
pub fn validate_layout(
    schema: ModelSchema,
    version: u8,
    hash: u32,
) -> Result<(), LayoutMismatchError> {
    let expected_hash = schema.layout_hash();

    if version != SCHEMA_VERSION || hash != expected_hash {
        return Err(LayoutMismatchError {
            schema,
            expected_version: SCHEMA_VERSION,
            expected_hash,
            actual_version: version,
            actual_hash: hash,
        });
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_counts() {
        assert_eq!(ModelSchema::Rainfall.field_count(), 5);
        assert_eq!(ModelSchema::Solar.field_count(), 4);
        assert_eq!(RAINFALL_LAYOUT.len(), ModelSchema::Rainfall.field_count());
        assert_eq!(SOLAR_LAYOUT.len(), ModelSchema::Solar.field_count());
    }

    #[test]
    fn test_feature_index() {
        assert_eq!(ModelSchema::Rainfall.feature_index("Temperature"), Some(0));
        assert_eq!(ModelSchema::Rainfall.feature_index("Pressure"), Some(4));
        assert_eq!(
            ModelSchema::Solar.feature_index("surface_pressure"),
            Some(2)
        );
        assert_eq!(ModelSchema::Solar.feature_index("Pressure"), None);
        assert_eq!(ModelSchema::Rainfall.feature_index("nonexistent"), None);
    }

    #[test]
    fn test_canonical_name_aliases() {
        assert_eq!(
            ModelSchema::Rainfall.canonical_name("Wind Speed"),
            Some("Wind_Speed")
        );
        assert_eq!(
            ModelSchema::Rainfall.canonical_name("Cloud Cover"),
            Some("Cloud_Cover")
        );
        // Pressure renames only under the solar schema
        assert_eq!(
            ModelSchema::Solar.canonical_name("Pressure"),
            Some("surface_pressure")
        );
        assert_eq!(
            ModelSchema::Rainfall.canonical_name("Pressure"),
            Some("Pressure")
        );
    }

    #[test]
    fn test_canonical_name_passthrough_and_unknown() {
        assert_eq!(
            ModelSchema::Solar.canonical_name("altitude"),
            Some("altitude")
        );
        assert_eq!(ModelSchema::Solar.canonical_name("Solar Power"), None);
        assert_eq!(ModelSchema::Rainfall.canonical_name("Timestamp"), None);
    }

    #[test]
    fn test_layout_hash_consistency() {
        assert_eq!(
            ModelSchema::Rainfall.layout_hash(),
            ModelSchema::Rainfall.layout_hash()
        );
        assert_ne!(ModelSchema::Rainfall.layout_hash(), 0);
    }

    #[test]
    fn test_layout_hash_differs_per_schema() {
        assert_ne!(
            ModelSchema::Rainfall.layout_hash(),
            ModelSchema::Solar.layout_hash()
        );
    }

    #[test]
    fn test_validate_layout() {
        let schema = ModelSchema::Solar;
        assert!(validate_layout(schema, SCHEMA_VERSION, schema.layout_hash()).is_ok());
        assert!(validate_layout(schema, SCHEMA_VERSION + 1, schema.layout_hash()).is_err());
        assert!(validate_layout(schema, SCHEMA_VERSION, schema.layout_hash() ^ 1).is_err());
    }
}
