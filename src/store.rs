//! Secure local key-value store seam.
//!
//! The original client keeps the private key in the OS keychain; here the
//! same capability is a trait so the key store can sit on whatever
//! this-device-only credential facility the host platform offers. The
//! bundled [`FileStore`] writes one `0o600` file per identifier under a
//! caller-chosen directory; [`MemoryStore`] backs tests and ephemeral
//! identities.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::errors::IdentityError;

/// Synchronous local secret storage: put/get/delete over opaque bytes.
///
/// Implementations must be process-independent (a secret written by one run
/// is readable by the next) and must never sync secrets off the device.
pub trait SecureStore: Send + Sync {
    /// Store `secret` under `id`, overwriting any previous value.
    fn put(&self, id: &str, secret: &[u8]) -> Result<(), IdentityError>;

    /// Fetch the secret stored under `id`, or `None` if absent.
    fn get(&self, id: &str) -> Result<Option<Vec<u8>>, IdentityError>;

    /// Remove the secret stored under `id`. Removing an absent entry is not
    /// an error.
    fn delete(&self, id: &str) -> Result<(), IdentityError>;
}

/// File-per-identifier store rooted at a fixed directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, IdentityError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| IdentityError::store("create store dir", e))?;
        Ok(Self { dir })
    }

    fn entry_path(&self, id: &str) -> PathBuf {
        // Identifiers are reverse-DNS style names chosen by this crate, not
        // untrusted input, but keep them filename-safe anyway.
        let safe: String = id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.key"))
    }
}

impl SecureStore for FileStore {
    fn put(&self, id: &str, secret: &[u8]) -> Result<(), IdentityError> {
        let path = self.entry_path(id);
        if let Err(e) = write_owner_only(&path, secret) {
            // A failed write must not leave a partial entry behind.
            let _ = fs::remove_file(&path);
            return Err(IdentityError::store("write secret", e));
        }
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Vec<u8>>, IdentityError> {
        match fs::read(self.entry_path(id)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(IdentityError::store("read secret", e)),
        }
    }

    fn delete(&self, id: &str) -> Result<(), IdentityError> {
        match fs::remove_file(self.entry_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(IdentityError::store("delete secret", e)),
        }
    }
}

/// Write `secret` to `path`, creating the file owner-readable only.
///
/// The entry must never exist with a permissive mode, not even between
/// create and a later chmod, so the mode is set at creation time.
fn write_owner_only(path: &Path, secret: &[u8]) -> io::Result<()> {
    use std::io::Write as _;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(secret)
}

/// In-memory store for tests and ephemeral identities.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecureStore for MemoryStore {
    fn put(&self, id: &str, secret: &[u8]) -> Result<(), IdentityError> {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(id.to_owned(), secret.to_vec());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Vec<u8>>, IdentityError> {
        let entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries.get(id).cloned())
    }

    fn delete(&self, id: &str) -> Result<(), IdentityError> {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.remove(id);
        Ok(())
    }
}
