//! Model Artifact Integrity
//!
//! A corrupt artifact must fail the load, not produce silent garbage. When a
//! `<artifact>.sha256` sidecar exists next to the model file, its digest is
//! verified before the session is built.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::inference::ModelError;

/// Calculate SHA-256 of a file (streaming, lowercase hex)
pub fn sha256_file(path: &Path) -> Result<String, ModelError> {
    let mut file = File::open(path).map_err(|e| ModelError::Load {
        message: format!("cannot open {}: {}", path.display(), e),
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| ModelError::Load {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Sidecar checksum path for an artifact: `<artifact>.sha256`
pub fn sidecar_path(artifact: &Path) -> PathBuf {
    let mut name = artifact.as_os_str().to_os_string();
    name.push(".sha256");
    PathBuf::from(name)
}

/// Verify an artifact against its sidecar checksum, if one exists
///
/// Returns the computed digest when verification ran, `None` when there is no
/// sidecar (verification is opt-in per artifact).
pub fn verify_sidecar(artifact: &Path) -> Result<Option<String>, ModelError> {
    let sidecar = sidecar_path(artifact);

    if !sidecar.exists() {
        log::debug!("no checksum sidecar for {}", artifact.display());
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&sidecar).map_err(|e| ModelError::Load {
        message: format!("cannot read {}: {}", sidecar.display(), e),
    })?;

    // sha256sum format: "<hex>  <filename>" — first token is the digest
    let expected = contents
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase();

    if expected.is_empty() {
        return Err(ModelError::Load {
            message: format!("empty checksum sidecar: {}", sidecar.display()),
        });
    }

    let actual = sha256_file(artifact)?;

    if actual != expected {
        return Err(ModelError::ChecksumMismatch { expected, actual });
    }

    log::info!("checksum verified for {}", artifact.display());
    Ok(Some(actual))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    fn write_artifact(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).expect("create artifact");
        file.write_all(bytes).expect("write artifact");
        path
    }

    #[test]
    fn test_sha256_known_digest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_artifact(&dir, "model.onnx", b"abc");

        assert_eq!(sha256_file(&path).expect("hash"), ABC_SHA256);
    }

    #[test]
    fn test_sidecar_path_appends_extension() {
        let path = sidecar_path(Path::new("models/solar_power_model.onnx"));
        assert_eq!(
            path,
            Path::new("models/solar_power_model.onnx.sha256")
        );
    }

    #[test]
    fn test_missing_sidecar_skips_verification() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_artifact(&dir, "model.onnx", b"abc");

        assert_eq!(verify_sidecar(&path).expect("verify"), None);
    }

    #[test]
    fn test_matching_sidecar_verifies() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_artifact(&dir, "model.onnx", b"abc");
        // sha256sum-style line with trailing filename
        std::fs::write(
            sidecar_path(&path),
            format!("{}  model.onnx\n", ABC_SHA256),
        )
        .expect("write sidecar");

        let digest = verify_sidecar(&path).expect("verify");
        assert_eq!(digest.as_deref(), Some(ABC_SHA256));
    }

    #[test]
    fn test_mismatched_sidecar_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_artifact(&dir, "model.onnx", b"abc");
        std::fs::write(sidecar_path(&path), "0".repeat(64)).expect("write sidecar");

        let err = verify_sidecar(&path).unwrap_err();
        assert!(matches!(err, ModelError::ChecksumMismatch { .. }));
    }
}
