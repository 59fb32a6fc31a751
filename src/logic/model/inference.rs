//! Inference Engine - ONNX Runtime Integration
//!
//! Loads and runs the pre-trained ONNX artifacts. Sessions are cached
//! process-wide (one slot per model kind), populated on first use and
//! read-only afterwards, so repeated requests don't reload from disk.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::features::{FeatureRecord, ModelSchema, SCHEMA_VERSION};

use super::integrity;

// ============================================================================
// STATE
// ============================================================================

/// Latency stats
static LATENCY_SUM: AtomicU64 = AtomicU64::new(0);
static INFERENCE_COUNT: AtomicU64 = AtomicU64::new(0);

/// Cached ONNX sessions, one slot per model kind
static RAINFALL_SESSION: RwLock<Option<Session>> = RwLock::new(None);
static SOLAR_SESSION: RwLock<Option<Session>> = RwLock::new(None);

static RAINFALL_METADATA: RwLock<Option<ModelMetadata>> = RwLock::new(None);
static SOLAR_METADATA: RwLock<Option<ModelMetadata>> = RwLock::new(None);

fn session_slot(kind: ModelKind) -> &'static RwLock<Option<Session>> {
    match kind {
        ModelKind::Rainfall => &RAINFALL_SESSION,
        ModelKind::Solar => &SOLAR_SESSION,
    }
}

fn metadata_slot(kind: ModelKind) -> &'static RwLock<Option<ModelMetadata>> {
    match kind {
        ModelKind::Rainfall => &RAINFALL_METADATA,
        ModelKind::Solar => &SOLAR_METADATA,
    }
}

// ============================================================================
// MODEL KIND
// ============================================================================

/// The two pre-trained artifacts this service consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Binary rain / no-rain classifier
    Rainfall,
    /// Continuous power output regressor (milliwatts)
    Solar,
}

impl ModelKind {
    /// Canonical input schema this model was trained on
    pub fn schema(&self) -> ModelSchema {
        match self {
            ModelKind::Rainfall => ModelSchema::Rainfall,
            ModelKind::Solar => ModelSchema::Solar,
        }
    }

    /// Artifact filename inside the model directory
    pub fn artifact_name(&self) -> &'static str {
        match self {
            ModelKind::Rainfall => "xgboost_rainfall_model.onnx",
            ModelKind::Solar => "solar_power_model.onnx",
        }
    }

    /// Env var that overrides the artifact path
    pub fn env_var(&self) -> &'static str {
        match self {
            ModelKind::Rainfall => "RAINFALL_MODEL_PATH",
            ModelKind::Solar => "SOLAR_MODEL_PATH",
        }
    }

    /// Resolved artifact path: env override or model dir default
    pub fn default_path(&self) -> PathBuf {
        match std::env::var(self.env_var()) {
            Ok(path) => PathBuf::from(path),
            Err(_) => constants::get_model_dir().join(self.artifact_name()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Rainfall => "rainfall",
            ModelKind::Solar => "solar",
        }
    }
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Classifier output label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RainfallLabel {
    Rain,
    NoRain,
}

impl RainfallLabel {
    /// Map a raw classifier output (int label or score) to a label
    pub fn from_output(value: f32) -> Self {
        if value >= 0.5 {
            RainfallLabel::Rain
        } else {
            RainfallLabel::NoRain
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RainfallLabel::Rain => "Rain",
            RainfallLabel::NoRain => "No Rain",
        }
    }
}

/// Loaded-model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub kind: ModelKind,
    pub model_path: String,
    pub feature_count: usize,
    pub schema_version: u8,
    pub layout_hash: u32,
    /// SHA-256 of the artifact, when it could be computed
    pub sha256: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

/// Engine status for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub rainfall_loaded: bool,
    pub solar_loaded: bool,
    pub inference_device: String,
    pub avg_latency_ms: f32,
    pub inference_count: u64,
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Model invocation failures. Artifact problems are fatal for the request;
/// there is no fallback model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelError {
    /// Artifact file missing on disk
    NotFound { path: String },
    /// Artifact present but could not be loaded
    Load { message: String },
    /// Artifact content does not match its recorded checksum
    ChecksumMismatch { expected: String, actual: String },
    /// Record does not conform to the schema the model was trained on
    SchemaMismatch { expected: String, actual: String },
    /// The model call itself failed
    Inference { message: String },
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::NotFound { path } => write!(f, "Model not found: {}", path),
            ModelError::Load { message } => write!(f, "Model load failed: {}", message),
            ModelError::ChecksumMismatch { expected, actual } => write!(
                f,
                "Model checksum mismatch: expected {}, got {}",
                expected, actual
            ),
            ModelError::SchemaMismatch { expected, actual } => write!(
                f,
                "Feature schema mismatch: model expects {}, record is {}",
                expected, actual
            ),
            ModelError::Inference { message } => write!(f, "Inference failed: {}", message),
        }
    }
}

impl std::error::Error for ModelError {}

// ============================================================================
// ROW MODEL TRAIT
// ============================================================================

/// Capability contract for predictive backends: an ordered numeric feature
/// table in, one output per row out. The invoker assumes nothing else about
/// the underlying implementation.
pub trait RowModel {
    fn predict_rows(&mut self, rows: &Array2<f32>) -> Result<Vec<f32>, ModelError>;
}

/// ONNX-backed model bound to one of the cached session slots
pub struct OnnxRuntime {
    kind: ModelKind,
}

impl OnnxRuntime {
    pub fn new(kind: ModelKind) -> Self {
        Self { kind }
    }
}

impl RowModel for OnnxRuntime {
    fn predict_rows(&mut self, rows: &Array2<f32>) -> Result<Vec<f32>, ModelError> {
        run_session(self.kind, rows)
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Load an ONNX artifact into the session slot for `kind`
pub fn load_model(kind: ModelKind, model_path: &Path) -> Result<(), ModelError> {
    log::info!(
        "Loading {} model from: {}",
        kind.as_str(),
        model_path.display()
    );

    if !model_path.exists() {
        return Err(ModelError::NotFound {
            path: model_path.display().to_string(),
        });
    }

    // Sidecar checksum, when present, must match before the artifact is used
    let sha256 = integrity::verify_sidecar(model_path)?;

    let session = Session::builder()
        .map_err(|e| ModelError::Load {
            message: format!("session builder error: {}", e),
        })?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| ModelError::Load {
            message: format!("optimization error: {}", e),
        })?
        .commit_from_file(model_path)
        .map_err(|e| ModelError::Load {
            message: format!("{}", e),
        })?;

    let schema = kind.schema();

    *session_slot(kind).write() = Some(session);
    *metadata_slot(kind).write() = Some(ModelMetadata {
        kind,
        model_path: model_path.display().to_string(),
        feature_count: schema.field_count(),
        schema_version: SCHEMA_VERSION,
        layout_hash: schema.layout_hash(),
        sha256,
        loaded_at: Utc::now(),
    });

    log::info!("{} model loaded successfully", kind.as_str());
    Ok(())
}

/// Populate the session slot from the default path if it is still empty
pub fn ensure_loaded(kind: ModelKind) -> Result<(), ModelError> {
    if is_model_loaded(kind) {
        return Ok(());
    }
    load_model(kind, &kind.default_path())
}

/// Check if a model is loaded
pub fn is_model_loaded(kind: ModelKind) -> bool {
    session_slot(kind).read().is_some()
}

/// Unload a model
pub fn unload_model(kind: ModelKind) {
    *session_slot(kind).write() = None;
    *metadata_slot(kind).write() = None;
    log::info!("{} model unloaded", kind.as_str());
}

/// Get loaded-model metadata
pub fn get_metadata(kind: ModelKind) -> Option<ModelMetadata> {
    metadata_slot(kind).read().clone()
}

pub fn get_status() -> EngineStatus {
    let sum = LATENCY_SUM.load(Ordering::Relaxed);
    let count = INFERENCE_COUNT.load(Ordering::Relaxed);
    let avg = if count > 0 {
        (sum as f32 / count as f32) / 1000.0
    } else {
        0.0
    };

    EngineStatus {
        rainfall_loaded: is_model_loaded(ModelKind::Rainfall),
        solar_loaded: is_model_loaded(ModelKind::Solar),
        inference_device: "ONNX Runtime (CPU)".to_string(),
        avg_latency_ms: avg,
        inference_count: count,
    }
}

// ============================================================================
// INVOCATION
// ============================================================================

/// Run one record through the cached model for `kind`
pub fn invoke(kind: ModelKind, record: &FeatureRecord) -> Result<f32, ModelError> {
    ensure_loaded(kind)?;
    let mut runtime = OnnxRuntime::new(kind);
    invoke_model(&mut runtime, kind, record)
}

/// Build the single-row feature table in trained column order, call the
/// model, extract the first (only) result. No retries.
pub fn invoke_model(
    model: &mut dyn RowModel,
    kind: ModelKind,
    record: &FeatureRecord,
) -> Result<f32, ModelError> {
    let schema = kind.schema();

    if record.schema != schema || record.values.len() != schema.field_count() {
        return Err(ModelError::SchemaMismatch {
            expected: schema.as_str().to_string(),
            actual: format!(
                "{} ({} fields)",
                record.schema.as_str(),
                record.values.len()
            ),
        });
    }
    record.validate().map_err(|e| ModelError::SchemaMismatch {
        expected: schema.as_str().to_string(),
        actual: e.to_string(),
    })?;

    let start_time = Instant::now();

    let table = Array2::from_shape_vec((1, schema.field_count()), record.values.clone())
        .map_err(|e| ModelError::Inference {
            message: format!("table error: {}", e),
        })?;

    let outputs = model.predict_rows(&table)?;
    let first = outputs.first().copied().ok_or_else(|| ModelError::Inference {
        message: "model returned no outputs".to_string(),
    })?;

    // Track metrics
    let elapsed = start_time.elapsed().as_micros() as u64;
    LATENCY_SUM.fetch_add(elapsed, Ordering::Relaxed);
    INFERENCE_COUNT.fetch_add(1, Ordering::Relaxed);

    Ok(first)
}

/// Classify rain / no-rain from a normalized rainfall record
pub fn predict_rainfall(record: &FeatureRecord) -> Result<RainfallLabel, ModelError> {
    invoke(ModelKind::Rainfall, record).map(RainfallLabel::from_output)
}

/// Predict power output in milliwatts from a normalized solar record
pub fn predict_solar(record: &FeatureRecord) -> Result<f32, ModelError> {
    invoke(ModelKind::Solar, record)
}

// ============================================================================
// ONNX SESSION EXECUTION
// ============================================================================

fn run_session(kind: ModelKind, rows: &Array2<f32>) -> Result<Vec<f32>, ModelError> {
    let mut session_guard = session_slot(kind).write();
    let session = session_guard.as_mut().ok_or_else(|| ModelError::Load {
        message: format!("{} model not loaded", kind.as_str()),
    })?;

    let n_rows = rows.nrows();

    let output_name = session
        .outputs()
        .first()
        .map(|o| o.name().to_string())
        .ok_or_else(|| ModelError::Inference {
            message: "no output defined".to_string(),
        })?;

    let input_tensor = Value::from_array(rows.clone()).map_err(|e| ModelError::Inference {
        message: format!("tensor error: {}", e),
    })?;

    let outputs = session
        .run(ort::inputs![input_tensor])
        .map_err(|e| ModelError::Inference {
            message: format!("{}", e),
        })?;

    let output = outputs
        .get(output_name.as_str())
        .ok_or_else(|| ModelError::Inference {
            message: "no output".to_string(),
        })?;

    // Regressors emit f32; converted classifiers commonly emit int64 labels
    let values: Vec<f32> = match output.try_extract_tensor::<f32>() {
        Ok(tensor) => tensor.1.to_vec(),
        Err(_) => {
            let tensor = output
                .try_extract_tensor::<i64>()
                .map_err(|e| ModelError::Inference {
                    message: format!("extract error: {}", e),
                })?;
            tensor.1.iter().map(|&v| v as f32).collect()
        }
    };

    if values.len() < n_rows {
        return Err(ModelError::Inference {
            message: format!("model returned {} outputs for {} rows", values.len(), n_rows),
        });
    }

    Ok(values.into_iter().take(n_rows).collect())
}

// ============================================================================
// TESTS
// ============================================================================
