//! Transaction context state.

use crate::error::ErrorKind;
use crate::types::TransactionId;
use std::collections::HashSet;
use txnest_store::{RecordId, RecordPayload};

/// One in-flight unit of work.
///
/// A context buffers its writes until the owning unit of work commits
/// (pending writes merge into the store) or rolls back (pending writes
/// are discarded). Joined units execute against the owner's context
/// and never commit or roll it back themselves.
#[derive(Debug)]
pub struct TxContext {
    /// Context ID.
    id: TransactionId,
    /// The enclosing context at creation time, if any (by ID; the
    /// manager's stack owns the contexts themselves).
    parent: Option<TransactionId>,
    /// Buffered writes, in save order.
    pending: Vec<(RecordId, RecordPayload)>,
    /// Sticky rollback marker. Monotonic: never cleared once set.
    rollback_only: bool,
    /// Failure kinds that do not trigger rollback for this context.
    no_rollback_for: HashSet<ErrorKind>,
}

impl TxContext {
    /// Creates a new context.
    pub(crate) fn new(
        id: TransactionId,
        parent: Option<TransactionId>,
        no_rollback_for: HashSet<ErrorKind>,
    ) -> Self {
        Self {
            id,
            parent,
            pending: Vec::new(),
            rollback_only: false,
            no_rollback_for,
        }
    }

    /// Returns the context ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the ID of the enclosing context at creation time.
    #[must_use]
    pub fn parent(&self) -> Option<TransactionId> {
        self.parent
    }

    /// Buffers a write and returns the ID assigned to the record.
    pub(crate) fn save(&mut self, payload: RecordPayload) -> RecordId {
        let id = RecordId::new();
        self.pending.push((id, payload));
        id
    }

    /// Returns the buffered writes in save order.
    #[must_use]
    pub fn pending(&self) -> &[(RecordId, RecordPayload)] {
        &self.pending
    }

    /// Returns the number of buffered writes.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Consumes the context, yielding its buffered writes for commit.
    pub(crate) fn into_pending(self) -> Vec<(RecordId, RecordPayload)> {
        self.pending
    }

    /// Marks the context rollback-only.
    ///
    /// The flag is sticky: once set, the context always rolls back at
    /// its owning boundary, regardless of exemptions or a successful
    /// outcome.
    pub(crate) fn mark_rollback_only(&mut self) {
        self.rollback_only = true;
    }

    /// Returns whether the context has been marked rollback-only.
    #[must_use]
    pub fn is_rollback_only(&self) -> bool {
        self.rollback_only
    }

    /// Returns whether a failure of `kind` is exempt from rollback.
    #[must_use]
    pub fn is_exempt(&self, kind: ErrorKind) -> bool {
        self.no_rollback_for.contains(&kind)
    }
}
