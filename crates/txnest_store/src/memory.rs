//! In-memory resource store.

use crate::error::StoreResult;
use crate::record::{RecordId, RecordPayload};
use crate::store::RecordStore;
use parking_lot::Mutex;

/// An in-memory resource store.
///
/// This store keeps all committed records in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// # Thread Safety
///
/// The store is thread-safe. The internal mutex is held only for the
/// duration of a single merge or read, never across a transaction.
///
/// # Example
///
/// ```rust
/// use txnest_store::{InMemoryStore, RecordId, RecordStore};
///
/// let store = InMemoryStore::new();
/// let id = RecordId::new();
/// store.apply(&[(id, b"check".to_vec())]).unwrap();
/// let records = store.find_all().unwrap();
/// assert_eq!(records[0].0, id);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Mutex<Vec<(RecordId, RecordPayload)>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with committed records.
    ///
    /// Useful for testing visibility of pre-existing state.
    #[must_use]
    pub fn with_records(records: Vec<(RecordId, RecordPayload)>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl RecordStore for InMemoryStore {
    fn apply(&self, writes: &[(RecordId, RecordPayload)]) -> StoreResult<()> {
        let mut records = self.records.lock();
        records.extend(writes.iter().cloned());
        Ok(())
    }

    fn find_all(&self) -> StoreResult<Vec<(RecordId, RecordPayload)>> {
        Ok(self.records.lock().clone())
    }

    fn delete_all(&self) -> StoreResult<()> {
        self.records.lock().clear();
        Ok(())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.records.lock().len())
    }
}
