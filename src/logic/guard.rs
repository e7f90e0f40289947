//! Model Guard - artifact protection at rest
//!
//! - SHA-256 checksum written next to every persisted artifact
//! - Optional AES-256-GCM sealing: fresh 96-bit nonce per call, prepended to
//!   the ciphertext

use std::fs;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use sha2::{Digest, Sha256};

use crate::logic::error::{GuardError, PipelineError, PipelineResult};
use crate::logic::model::ModelArtifact;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

// ============================================================================
// ENCRYPTION
// ============================================================================

/// Random 256-bit key
pub fn generate_key() -> Vec<u8> {
    Aes256Gcm::generate_key(OsRng).to_vec()
}

/// Decode a hex key and check its length
pub fn parse_key(hex_key: &str) -> Result<Vec<u8>, GuardError> {
    let key = hex::decode(hex_key.trim()).map_err(|_| GuardError::InvalidKey(hex_key.trim().len() / 2))?;
    if key.len() != KEY_LEN {
        return Err(GuardError::InvalidKey(key.len()));
    }
    Ok(key)
}

fn cipher(key: &[u8]) -> Result<Aes256Gcm, GuardError> {
    Aes256Gcm::new_from_slice(key).map_err(|_| GuardError::InvalidKey(key.len()))
}

/// Encrypt `plaintext`; output is `nonce || ciphertext || tag`
pub fn seal(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, GuardError> {
    let cipher = cipher(key)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| GuardError::EncryptFailed)?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Reverse of [`seal`]. Fails on a wrong key or any modified byte.
pub fn open(key: &[u8], sealed: &[u8]) -> Result<Vec<u8>, GuardError> {
    let cipher = cipher(key)?;
    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(GuardError::Truncated);
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| GuardError::DecryptFailed)
}

// ============================================================================
// CHECKSUM
// ============================================================================

pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn verify(bytes: &[u8], expected: &str) -> Result<(), GuardError> {
    let actual = checksum(bytes);
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(GuardError::ChecksumMismatch {
            expected: expected.trim().to_string(),
            actual,
        });
    }
    Ok(())
}

// ============================================================================
// PERSISTENCE
// ============================================================================

/// `<data dir>/ai-security/models`
pub fn default_model_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ai-security")
        .join("models")
}

fn checksum_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".sha256");
    PathBuf::from(name)
}

/// Write the artifact (sealed when a key is given) plus its checksum file.
/// Returns the artifact path.
pub fn persist_artifact(artifact: &ModelArtifact, dir: &Path, key: Option<&[u8]>) -> PipelineResult<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;

    let plain = artifact.to_bytes()?;
    let (bytes, extension) = match key {
        Some(key) => (seal(key, &plain)?, "sealed"),
        None => (plain, "json"),
    };

    let path = dir.join(format!("model-{}.{}", artifact.id, extension));
    fs::write(&path, &bytes).map_err(|e| PipelineError::io(&path, e))?;

    let sum_path = checksum_path(&path);
    fs::write(&sum_path, checksum(&bytes)).map_err(|e| PipelineError::io(&sum_path, e))?;

    log::info!("Model artifact saved: {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

/// Read an artifact written by [`persist_artifact`], verifying its checksum first
pub fn load_artifact(path: &Path, key: Option<&[u8]>) -> PipelineResult<ModelArtifact> {
    let bytes = fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    let sum_path = checksum_path(path);
    let expected = fs::read_to_string(&sum_path).map_err(|e| PipelineError::io(&sum_path, e))?;
    verify(&bytes, &expected)?;

    let plain = match key {
        Some(key) => open(key, &bytes)?,
        None => bytes,
    };
    ModelArtifact::from_bytes(&plain)
}
