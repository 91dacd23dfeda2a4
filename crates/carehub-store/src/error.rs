//! Error types for the persistence layer

/// Key-value storage failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("storage I/O error for key {key}: {source}")]
    Io {
        /// Key being accessed
        key: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Value could not be encoded
    #[error("failed to serialize {key}: {source}")]
    Serialize {
        /// Key being written
        key: String,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// Key contains characters not allowed in a file name
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Failure of a persisted dispatch
#[derive(Debug, thiserror::Error)]
pub enum PersistError<E> {
    /// Reducer rejected the action; nothing was written
    #[error("action rejected: {0}")]
    Rejected(#[source] E),

    /// New state could not be written; the previous state was restored
    #[error("state not persisted: {0}")]
    Store(#[from] StoreError),
}

impl<E> PersistError<E> {
    /// The reducer's rejection, if that is what happened
    pub fn rejection(&self) -> Option<&E> {
        match self {
            Self::Rejected(e) => Some(e),
            Self::Store(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_key_display() {
        let err = StoreError::InvalidKey("../etc".into());
        assert_eq!(err.to_string(), "invalid storage key: ../etc");
    }
}
