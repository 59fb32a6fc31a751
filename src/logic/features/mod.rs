//! Features Module - Canonical Schemas & Input Normalization
//!
//! Maps loosely-named raw inputs (manual entry, spreadsheet rows, weather API)
//! into the fixed-order numeric records each model was trained on.

pub mod normalize;
pub mod record;
pub mod schema;


// Re-export common types
pub use normalize::{normalize, RawRecord};
pub use record::FeatureRecord;
pub use schema::{ModelSchema, SCHEMA_VERSION};
