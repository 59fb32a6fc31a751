//! Model Module - Pre-trained Model Invocation
//!
//! Wraps the two opaque artifacts (rainfall classifier, solar power
//! regressor) behind a uniform "ordered feature table in, one output per row
//! out" contract. No training, no fallback heuristics: a missing or corrupt
//! artifact is fatal for the request.

pub mod inference;
pub mod integrity;

// Re-export common types
pub use inference::{EngineStatus, ModelError, ModelKind, RainfallLabel, RowModel};
