//! Error types for the memory store.

/// Errors that can occur in memory store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// SQLite database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization / deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A referenced row does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind (table)
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// A stored value could not be decoded into its domain type
    #[error("corrupt row in {table}: {detail}")]
    CorruptRow {
        /// Table the row came from
        table: &'static str,
        /// What failed to decode
        detail: String,
    },

    /// General internal error
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Whether the store rejected a write because of a constraint
    /// (foreign key, unique, check).
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::Database(sqlx::Error::Database(db)) => {
                db.is_foreign_key_violation()
                    || db.is_unique_violation()
                    || db.is_check_violation()
            }
            _ => false,
        }
    }
}

/// Convenience Result type.
pub type Result<T> = std::result::Result<T, Error>;
