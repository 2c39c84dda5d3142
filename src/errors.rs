use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("no signing key loaded; generate or import an identity first")]
    KeyNotFound,

    #[error("invalid private key: {0}")]
    InvalidKeyFormat(&'static str),

    #[error("secure store failure during {op}: {source}")]
    SecureStoreFailure {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl IdentityError {
    /// Wrap an I/O error from the secure store, tagged with the operation
    /// that failed.
    #[must_use]
    pub fn store(op: &'static str, source: std::io::Error) -> Self {
        Self::SecureStoreFailure { op, source }
    }
}
