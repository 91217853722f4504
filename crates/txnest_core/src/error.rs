//! Error types for txnest core.

use thiserror::Error;
use txnest_store::StoreError;

/// Result type for core operations.
pub type TxResult<T> = Result<T, TxError>;

/// Classification of a failure, consulted by `no_rollback_for`
/// exemption sets when deciding commit vs rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A business rule violation raised by a unit-of-work body.
    BusinessRule,
    /// A resource store failure.
    Store,
    /// A propagation-level error (rejects and manager misuse).
    Propagation,
}

/// Errors that can occur in txnest core operations.
#[derive(Debug, Error)]
pub enum TxError {
    /// MANDATORY propagation was entered with no ambient context.
    #[error("no existing transaction found for a unit of work marked with propagation 'mandatory'")]
    NoTransaction,

    /// NEVER propagation was entered with an ambient context present.
    #[error("existing transaction found for a unit of work marked with propagation 'never'")]
    UnexpectedTransaction,

    /// A business rule was violated by body logic.
    #[error("business rule violated: {message}")]
    BusinessRule {
        /// Description of the violated rule.
        message: String,
    },

    /// Resource store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl TxError {
    /// Creates a business rule error.
    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::BusinessRule {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns the classification of this error.
    ///
    /// The kind is what exemption sets are matched against; the error
    /// value itself is always re-raised to the caller unchanged.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BusinessRule { .. } => ErrorKind::BusinessRule,
            Self::Store(_) => ErrorKind::Store,
            Self::NoTransaction | Self::UnexpectedTransaction | Self::InvalidOperation { .. } => {
                ErrorKind::Propagation
            }
        }
    }
}
