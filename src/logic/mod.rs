//! Logic Module - Prediction Pipeline & Engines
//!
//! - `features/` - Canonical schemas, feature records, input normalization
//! - `model/` - ONNX inference (rainfall classifier, solar regressor)
//! - `anomaly` - Deviation-based anomaly detection
//! - `ingest/` - Data source adapters (spreadsheet, weather API)
//! - `pipeline` - End-to-end composition + error taxonomy

pub mod anomaly;
pub mod features;
pub mod ingest;
pub mod model;
pub mod pipeline;
