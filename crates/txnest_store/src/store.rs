//! Resource store trait definition.

use crate::error::StoreResult;
use crate::record::{RecordId, RecordPayload};

/// An ordered, append-only store of committed records.
///
/// Resource stores hold **committed state only**. The transaction layer
/// buffers a context's pending writes itself and hands them to the store
/// in one batch when the owning unit of work commits; a rolled-back
/// context never reaches the store at all.
///
/// # Invariants
///
/// - `apply` merges a batch atomically: concurrent readers see either
///   none or all of the batch, never a prefix
/// - `find_all` enumerates records in insertion order
/// - Stores must be `Send + Sync` so independent call chains can share
///   one store
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing and ephemeral use
pub trait RecordStore: Send + Sync {
    /// Atomically merges a batch of committed writes into the store.
    ///
    /// The batch's internal order is preserved, and the whole batch is
    /// appended after all previously committed records. The serializing
    /// lock is held only for the duration of the merge.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed or the merge fails.
    fn apply(&self, writes: &[(RecordId, RecordPayload)]) -> StoreResult<()>;

    /// Returns all committed records in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed or cannot be read.
    fn find_all(&self) -> StoreResult<Vec<(RecordId, RecordPayload)>>;

    /// Removes all committed records.
    ///
    /// Typically used outside any active transaction context, e.g. as
    /// test setup.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed.
    fn delete_all(&self) -> StoreResult<()>;

    /// Returns the number of committed records.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed.
    fn len(&self) -> StoreResult<usize>;

    /// Returns `true` if the store holds no committed records.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed.
    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}
