//! Feature Record - Ordered model input with provenance
//!
//! Every record carries its schema tag, version and layout hash so a stale
//! record (built against an older layout) is rejected before it reaches a
//! model. The `degraded` list names fields that were zero-filled during
//! coercion — callers can tell a defaulted 0.0 apart from a genuine reading.

use serde::{Deserialize, Serialize};

use super::schema::{validate_layout, LayoutMismatchError, ModelSchema, SCHEMA_VERSION};

/// Ordered numeric input for one model invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Which canonical schema the values follow
    pub schema: ModelSchema,
    /// Schema version the record was built against
    pub version: u8,
    /// CRC32 hash of the layout the record was built against
    pub layout_hash: u32,
    /// Feature values in the order defined by the schema layout
    pub values: Vec<f32>,
    /// Canonical names of fields that were zero-filled during coercion
    pub degraded: Vec<String>,
}

impl FeatureRecord {
    /// Create a zeroed record for the current schema layout
    pub fn new(schema: ModelSchema) -> Self {
        Self {
            schema,
            version: SCHEMA_VERSION,
            layout_hash: schema.layout_hash(),
            values: vec![0.0; schema.field_count()],
            degraded: Vec::new(),
        }
    }

    /// Create from raw values (truncates or zero-pads to the layout arity)
    pub fn from_values(schema: ModelSchema, values: Vec<f32>) -> Self {
        let mut record = Self::new(schema);
        for (i, v) in values.into_iter().take(record.values.len()).enumerate() {
            record.values[i] = v;
        }
        record
    }

    /// Get feature by index
    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    /// Get feature by canonical name
    pub fn get_by_name(&self, name: &str) -> Option<f32> {
        self.schema.feature_index(name).and_then(|i| self.get(i))
    }

    /// Set feature by canonical name; returns false for unknown names
    pub fn set_by_name(&mut self, name: &str, value: f32) -> bool {
        match self.schema.feature_index(name) {
            Some(index) => {
                self.values[index] = value;
                true
            }
            None => false,
        }
    }

    /// Values as a positional slice, in layout order
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Record a field as zero-filled
    pub fn mark_degraded(&mut self, name: &str) {
        if !self.is_degraded(name) {
            self.degraded.push(name.to_string());
        }
    }

    /// Was this field zero-filled rather than read from the input?
    pub fn is_degraded(&self, name: &str) -> bool {
        self.degraded.iter().any(|d| d == name)
    }

    /// Validate that this record matches the current schema layout
    pub fn validate(&self) -> Result<(), LayoutMismatchError> {
        validate_layout(self.schema, self.version, self.layout_hash)
    }

    /// Check compatibility with the current schema layout
    pub fn is_compatible(&self) -> bool {
        self.validate().is_ok()
    }

    /// JSON view for logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "schema": self.schema.as_str(),
            "version": self.version,
            "layout_hash": self.layout_hash,
            "named_values": self.schema.layout().iter()
                .zip(self.values.iter())
                .map(|(name, value)| (name.to_string(), *value))
                .collect::<std::collections::HashMap<_, _>>(),
            "degraded": self.degraded,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
