//! # txnest Core
//!
//! Propagation-aware transaction manager core for txnest.
//!
//! This crate provides:
//! - Transaction contexts with buffered pending writes
//! - A pure propagation resolver (REQUIRED, REQUIRES_NEW, MANDATORY,
//!   SUPPORTS, NOT_SUPPORTED, NEVER)
//! - A transaction manager owning the ambient context stack of one
//!   logical call chain
//! - A closure-driven unit-of-work surface with rollback rules and
//!   `no_rollback_for` exemptions
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use txnest_core::{TransactionManager, UnitOfWork};
//! use txnest_store::InMemoryStore;
//!
//! let manager = TransactionManager::new(Arc::new(InMemoryStore::new()));
//! manager
//!     .execute(&UnitOfWork::default(), |m| {
//!         m.save(b"hello".to_vec())?;
//!         Ok(())
//!     })
//!     .unwrap();
//! assert_eq!(manager.find_all().unwrap().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod transaction;
mod types;

pub use error::{ErrorKind, TxError, TxResult};
pub use transaction::{
    resolve, Action, Invocation, Outcome, Propagation, TransactionManager, UnitOfWork,
};
pub use types::TransactionId;
