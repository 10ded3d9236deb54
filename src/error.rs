use thiserror::Error;

/// Errors raised by ledger commands and the persistence layer.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid payment amount: {0}")]
    InvalidAmount(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Area already exists: {0}")]
    DuplicateArea(String),

    #[error("Area not found: {0}")]
    AreaNotFound(String),

    #[error("Cannot delete area with assigned customers.")]
    AreaInUse(String),

    #[error("Corrupted backup file.")]
    CorruptedBackup(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
