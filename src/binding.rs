//! Integrity / binding gate.
//!
//! Ties one installer build to one device: the first run stores
//! `sha256(artifact),identity`; every later run must reproduce both exactly.
//! A plain hash is not a signature, so this only stops casual copying of the
//! installer to another device or editing it in place.

use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::{Result, SetupError};
use crate::identity::DeviceIdentity;

/// Lower-case hex SHA-256 of the file at `path`.
pub fn fingerprint_file(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|source| SetupError::Artifact {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let read = reader
            .read(&mut buffer)
            .map_err(|source| SetupError::Artifact {
                path: path.to_path_buf(),
                source,
            })?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Persisted `{fingerprint, device}` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingRecord {
    pub fingerprint: String,
    pub device: String,
}

impl BindingRecord {
    pub fn new(fingerprint: impl Into<String>, device: &DeviceIdentity) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            device: device.as_str().to_string(),
        }
    }

    /// Parse the single-line `hashHex,deviceIdentity` form.
    ///
    /// Returns the reason on failure so the caller can attach the path.
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let (fingerprint, device) = line
            .trim()
            .split_once(',')
            .ok_or_else(|| "expected 'hash,device'".to_string())?;
        if fingerprint.is_empty() || device.is_empty() {
            return Err("empty field".to_string());
        }
        if device.contains(',') {
            return Err("too many fields".to_string());
        }
        Ok(Self {
            fingerprint: fingerprint.to_string(),
            device: device.to_string(),
        })
    }

    pub fn to_line(&self) -> String {
        format!("{},{}", self.fingerprint, self.device)
    }
}

/// File-backed binding record.
#[derive(Debug, Clone)]
pub struct BindingStore {
    path: PathBuf,
}

impl BindingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no record has been written yet.
    pub fn load(&self) -> Result<Option<BindingRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        BindingRecord::parse(&content)
            .map(Some)
            .map_err(|reason| SetupError::CorruptBinding {
                path: self.path.clone(),
                reason,
            })
    }

    /// Create the record. Refuses to replace an existing one.
    pub fn create(&self, record: &BindingRecord) -> Result<()> {
        use std::io::Write;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)?;
        file.write_all(record.to_line().as_bytes())?;
        Ok(())
    }
}

/// Result of a passed gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// No record yet; the caller writes one once the run gets past connectivity
    Unbound,
    /// Existing record matched
    Verified,
}

/// Compare this artifact/device pair against the stored binding.
///
/// Never writes. Any difference from a stored record is
/// [`SetupError::BindingMismatch`]; an unparsable record is
/// [`SetupError::CorruptBinding`].
pub fn verify_binding(store: &BindingStore, candidate: &BindingRecord) -> Result<BindingState> {
    match store.load()? {
        None => {
            log::debug!("No binding record at {}", store.path().display());
            Ok(BindingState::Unbound)
        }
        Some(stored) if stored == *candidate => {
            log::debug!("Binding verified for {}", candidate.device);
            Ok(BindingState::Verified)
        }
        Some(stored) => {
            log::error!("Error: this installer has already been run on another device");
            Err(SetupError::BindingMismatch {
                stored_fingerprint: stored.fingerprint,
                stored_device: stored.device,
                fingerprint: candidate.fingerprint.clone(),
                device: candidate.device.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(s: &str) -> DeviceIdentity {
        DeviceIdentity::parse(s).unwrap()
    }

    #[test]
    fn test_fingerprint_known_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(
            fingerprint_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fingerprint_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = fingerprint_file(&dir.path().join("gone")).unwrap_err();
        assert!(matches!(err, SetupError::Artifact { .. }));
    }

    #[test]
    fn test_record_line_format() {
        let record = BindingRecord::new("deadbeef", &device("aa:bb:cc:dd:ee:ff"));
        assert_eq!(record.to_line(), "deadbeef,AA:BB:CC:DD:EE:FF");
        assert_eq!(BindingRecord::parse("deadbeef,AA:BB:CC:DD:EE:FF\n"), Ok(record));
    }

    #[test]
    fn test_record_parse_rejects_bad_lines() {
        assert!(BindingRecord::parse("").is_err());
        assert!(BindingRecord::parse("nocomma").is_err());
        assert!(BindingRecord::parse(",AA:BB").is_err());
        assert!(BindingRecord::parse("a,b,c").is_err());
    }

    #[test]
    fn test_unbound_then_verified() {
        let dir = tempfile::tempdir().unwrap();
        let store = BindingStore::new(dir.path().join(".wifite_hash"));
        let candidate = BindingRecord::new("f00d", &device("AA:BB:CC:DD:EE:FF"));

        assert_eq!(verify_binding(&store, &candidate).unwrap(), BindingState::Unbound);
        assert!(!store.path().exists());

        store.create(&candidate).unwrap();
        let written = fs::read_to_string(store.path()).unwrap();
        assert_eq!(written, "f00d,AA:BB:CC:DD:EE:FF");

        assert_eq!(verify_binding(&store, &candidate).unwrap(), BindingState::Verified);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), written);
    }

    #[test]
    fn test_create_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = BindingStore::new(dir.path().join(".wifite_hash"));
        fs::write(store.path(), "f00d,AA:BB:CC:DD:EE:FF").unwrap();
        let other = BindingRecord::new("beef", &DeviceIdentity::unavailable());
        assert!(store.create(&other).is_err());
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "f00d,AA:BB:CC:DD:EE:FF"
        );
    }

    #[test]
    fn test_mismatch_leaves_record_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = BindingStore::new(dir.path().join(".wifite_hash"));
        fs::write(store.path(), "f00d,AA:BB:CC:DD:EE:FF").unwrap();

        let other_device = BindingRecord::new("f00d", &DeviceIdentity::unavailable());
        assert!(matches!(
            verify_binding(&store, &other_device),
            Err(SetupError::BindingMismatch { .. })
        ));
        let other_build = BindingRecord::new("beef", &device("AA:BB:CC:DD:EE:FF"));
        assert!(matches!(
            verify_binding(&store, &other_build),
            Err(SetupError::BindingMismatch { .. })
        ));
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "f00d,AA:BB:CC:DD:EE:FF"
        );
    }

    #[test]
    fn test_corrupt_record_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = BindingStore::new(dir.path().join(".wifite_hash"));
        fs::write(store.path(), "garbage").unwrap();
        let candidate = BindingRecord::new("f00d", &DeviceIdentity::unavailable());
        assert!(matches!(
            verify_binding(&store, &candidate),
            Err(SetupError::CorruptBinding { .. })
        ));
    }
}
