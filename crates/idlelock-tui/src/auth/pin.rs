//! PIN storage with secure hashing

use std::fs;
use std::path::{Path, PathBuf};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

/// Minimum PIN length
pub const MIN_PIN_LENGTH: usize = 4;
/// Maximum PIN length
pub const MAX_PIN_LENGTH: usize = 12;

/// PIN storage errors
#[derive(Debug, Error)]
pub enum PinError {
    #[error("PIN must be between {} and {} digits", MIN_PIN_LENGTH, MAX_PIN_LENGTH)]
    InvalidLength,

    #[error("PIN must contain only digits")]
    NonDigit,

    #[error("No PIN has been set")]
    NotEnrolled,

    #[error("Hashing error: {0}")]
    Hash(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse PIN storage: {0}")]
    Parse(#[from] serde_json::Error),
}

/// PIN storage format
#[derive(Serialize, Deserialize)]
struct PinRecord {
    /// Argon2 hash of the PIN
    hash: String,
}

/// Enrolled PIN, loaded from disk
pub struct PinStore {
    /// Path to the PIN storage file
    path: PathBuf,
    /// Current record, if a PIN is enrolled
    record: Option<PinRecord>,
}

impl PinStore {
    /// Load an existing PIN file, or an empty store if there is none
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PinError> {
        let path = path.into();
        let record = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            Some(serde_json::from_str(&contents)?)
        } else {
            None
        };

        Ok(Self { path, record })
    }

    /// Location of the PIN file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if a PIN has been set
    pub fn is_enrolled(&self) -> bool {
        self.record.is_some()
    }

    /// Set a new PIN, replacing any previous one
    pub fn enroll(&mut self, pin: &str) -> Result<(), PinError> {
        validate(pin)?;

        // Hash the PIN using Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let pin_bytes = Zeroizing::new(pin.as_bytes().to_vec());
        let hash = Argon2::default()
            .hash_password(&pin_bytes, &salt)
            .map_err(|e| PinError::Hash(e.to_string()))?
            .to_string();

        let record = PinRecord { hash };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&record)?)?;

        // Set restrictive permissions (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        self.record = Some(record);
        tracing::info!("PIN enrolled at {:?}", self.path);
        Ok(())
    }

    /// Verify a PIN against the enrolled hash
    pub fn verify(&self, pin: &str) -> Result<bool, PinError> {
        let record = self.record.as_ref().ok_or(PinError::NotEnrolled)?;

        let parsed_hash =
            PasswordHash::new(&record.hash).map_err(|e| PinError::Hash(e.to_string()))?;

        // Verify with constant-time comparison
        let pin_bytes = Zeroizing::new(pin.as_bytes().to_vec());
        Ok(Argon2::default()
            .verify_password(&pin_bytes, &parsed_hash)
            .is_ok())
    }

    /// Remove the enrolled PIN
    pub fn clear(&mut self) -> Result<(), PinError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        self.record = None;
        Ok(())
    }
}

/// Check a candidate PIN's shape
pub fn validate(pin: &str) -> Result<(), PinError> {
    if pin.len() < MIN_PIN_LENGTH || pin.len() > MAX_PIN_LENGTH {
        return Err(PinError::InvalidLength);
    }
    if !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(PinError::NonDigit);
    }
    Ok(())
}
