//! # txnest Store
//!
//! Resource store contract and implementations for txnest.
//!
//! This crate provides the lowest-level storage abstraction for txnest.
//! A resource store is an **ordered, append-only collection of committed
//! records** - it holds only what transactions have committed and knows
//! nothing about contexts, propagation, or pending writes.
//!
//! ## Design Principles
//!
//! - Stores hold committed records only; uncommitted state lives in the
//!   transaction layer
//! - A merge of committed writes is a single atomic step, serialized
//!   against other merges and reads
//! - Enumeration preserves insertion order
//! - Must be `Send + Sync` so independent call chains can share one store
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral use
//!
//! ## Example
//!
//! ```rust
//! use txnest_store::{InMemoryStore, RecordId, RecordStore};
//!
//! let store = InMemoryStore::new();
//! let id = RecordId::new();
//! store.apply(&[(id, b"hello".to_vec())]).unwrap();
//! assert_eq!(store.find_all().unwrap().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod memory;
mod record;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use record::{RecordId, RecordPayload};
pub use store::RecordStore;
