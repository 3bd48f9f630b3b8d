use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("{table} entry already exists: {key}")]
    AlreadyExists { table: &'static str, key: String },

    #[error("{table} entry not found: {key}")]
    NotFound { table: &'static str, key: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn already_exists(table: &'static str, key: impl Into<String>) -> Self {
        StoreError::AlreadyExists {
            table,
            key: key.into(),
        }
    }

    pub fn not_found(table: &'static str, key: impl Into<String>) -> Self {
        StoreError::NotFound {
            table,
            key: key.into(),
        }
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        StoreError::Unavailable(msg.into())
    }

    /// Infrastructure failure, as opposed to a conditional-write outcome
    pub fn is_operational(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
