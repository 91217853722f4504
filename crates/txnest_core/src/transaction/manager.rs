//! Transaction manager.

use crate::error::{ErrorKind, TxError, TxResult};
use crate::transaction::context::TxContext;
use crate::transaction::propagation::{resolve, Action, UnitOfWork};
use crate::types::TransactionId;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};
use txnest_store::{RecordId, RecordPayload, RecordStore};

/// Outcome reported by a unit-of-work body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The body completed normally.
    Success,
    /// The body failed with an error of the given kind.
    Failure(ErrorKind),
}

/// Bookkeeping for one unit-of-work invocation.
///
/// Returned by [`TransactionManager::enter`] and consumed by
/// [`TransactionManager::exit`]. Records whether this invocation owns
/// a context (and so decides its commit/rollback) and holds any
/// context it suspended on entry.
#[derive(Debug)]
pub struct Invocation {
    /// Resolved action taken on entry.
    action: Action,
    /// ID of the context this invocation created, if owning.
    owned: Option<TransactionId>,
    /// Context parked on entry, resumed on exit.
    suspended: Option<TxContext>,
}

impl Invocation {
    /// Returns the action resolved for this invocation.
    #[must_use]
    pub fn action(&self) -> Action {
        self.action
    }

    /// Returns whether this invocation owns a context.
    #[must_use]
    pub fn is_owner(&self) -> bool {
        self.owned.is_some()
    }
}

/// Manages the ambient transaction context stack of one logical call
/// chain.
///
/// The manager provides:
/// - Propagation resolution on entry to a unit of work
/// - Suspend/resume bookkeeping across nested invocations
/// - Commit-or-rollback decisions at exit, including `no_rollback_for`
///   exemptions and the sticky rollback-only flag
/// - An ambient-aware store surface (`save`/`find_all`/`delete_all`)
///
/// ## Call-Chain Ownership
///
/// One manager serves one strictly nested (LIFO) call chain; there is
/// no thread-local lookup. Bodies receive `&TransactionManager` and
/// thread it explicitly into nested units. Independent call chains use
/// independent managers sharing one [`RecordStore`], which serializes
/// commit merges itself.
pub struct TransactionManager {
    /// Shared resource store; holds committed records only.
    store: Arc<dyn RecordStore>,
    /// Ambient context stack, top = current context. The lock is held
    /// only inside a single operation, never across a body.
    stack: Mutex<Vec<TxContext>>,
    /// Next context ID.
    next_txn_id: AtomicU64,
}

impl TransactionManager {
    /// Creates a manager over the given store.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            stack: Mutex::new(Vec::new()),
            next_txn_id: AtomicU64::new(1),
        }
    }

    /// Runs `body` as a unit of work declared by `unit`.
    ///
    /// Entry resolves the propagation mode against the ambient context
    /// and performs any suspend/create bookkeeping; exit decides commit
    /// vs rollback for an owned context and resumes any suspended
    /// parent. The body's error, if any, is always re-raised unchanged:
    /// the manager decides durability, not whether the caller observes
    /// the failure.
    ///
    /// # Errors
    ///
    /// - Rejects ([`TxError::NoTransaction`],
    ///   [`TxError::UnexpectedTransaction`]) surface before the body
    ///   runs, with the stack untouched
    /// - Body errors are re-raised after the rollback decision
    /// - A commit-time store failure surfaces only when the body itself
    ///   succeeded
    pub fn execute<T, F>(&self, unit: &UnitOfWork, body: F) -> TxResult<T>
    where
        F: FnOnce(&Self) -> TxResult<T>,
    {
        let invocation = self.enter(unit)?;
        let result = body(self);
        let outcome = match &result {
            Ok(_) => Outcome::Success,
            Err(err) => Outcome::Failure(err.kind()),
        };
        match (self.exit(invocation, outcome), result) {
            // The body's own error always wins over exit bookkeeping.
            (_, Err(err)) => Err(err),
            (Err(exit_err), Ok(_)) => Err(exit_err),
            (Ok(()), Ok(value)) => Ok(value),
        }
    }

    /// Enters a unit of work: resolves propagation and performs
    /// suspend/create bookkeeping.
    ///
    /// Prefer [`TransactionManager::execute`]; this lower-level surface
    /// exists for callers that need to drive the body themselves. Every
    /// successful `enter` must be paired with exactly one
    /// [`TransactionManager::exit`].
    ///
    /// # Errors
    ///
    /// Returns the reject errors of [`resolve`] without mutating the
    /// stack.
    pub fn enter(&self, unit: &UnitOfWork) -> TxResult<Invocation> {
        let mut stack = self.stack.lock();
        let action = resolve(unit.propagation(), !stack.is_empty())?;

        let mut invocation = Invocation {
            action,
            owned: None,
            suspended: None,
        };

        match action {
            Action::Join | Action::RunWithoutContext => {}
            Action::SuspendAndRunWithoutContext => {
                invocation.suspended = stack.pop();
            }
            Action::CreateNew | Action::SuspendAndCreateNew => {
                if action == Action::SuspendAndCreateNew {
                    invocation.suspended = stack.pop();
                }
                let parent = invocation
                    .suspended
                    .as_ref()
                    .map(TxContext::id)
                    .or_else(|| stack.last().map(TxContext::id));
                let id = TransactionId::new(self.next_txn_id.fetch_add(1, Ordering::SeqCst));
                stack.push(TxContext::new(id, parent, unit.exemptions().clone()));
                invocation.owned = Some(id);
                trace!(%id, mode = %unit.propagation(), "created transaction context");
            }
        }

        if let Some(parked) = &invocation.suspended {
            trace!(id = %parked.id(), "suspended ambient context");
        }

        Ok(invocation)
    }

    /// Exits a unit of work: decides commit vs rollback for an owned
    /// context, then resumes any suspended parent.
    ///
    /// Non-owning invocations only resume; they never commit, roll
    /// back, or pop a context they joined.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack does not match this invocation's
    /// entry bookkeeping, or if the commit merge fails. A suspended
    /// parent is resumed even when the commit fails.
    pub fn exit(&self, invocation: Invocation, outcome: Outcome) -> TxResult<()> {
        let result = match invocation.owned {
            Some(owned_id) => self.settle(owned_id, outcome),
            None => Ok(()),
        };

        if let Some(parked) = invocation.suspended {
            trace!(id = %parked.id(), "resumed suspended context");
            self.stack.lock().push(parked);
        }

        result
    }

    /// Commits or rolls back the owned context at the top of the stack.
    fn settle(&self, owned_id: TransactionId, outcome: Outcome) -> TxResult<()> {
        let ctx = {
            let mut stack = self.stack.lock();
            match stack.pop() {
                Some(ctx) if ctx.id() == owned_id => ctx,
                Some(ctx) => {
                    let id = ctx.id();
                    stack.push(ctx);
                    return Err(TxError::invalid_operation(format!(
                        "unbalanced exit: expected context {owned_id}, found {id}"
                    )));
                }
                None => {
                    return Err(TxError::invalid_operation(format!(
                        "unbalanced exit: context {owned_id} is not active"
                    )));
                }
            }
        };

        let rollback = ctx.is_rollback_only()
            || match outcome {
                Outcome::Success => false,
                Outcome::Failure(kind) => !ctx.is_exempt(kind),
            };

        if rollback {
            debug!(
                id = %ctx.id(),
                writes = ctx.pending_count(),
                rollback_only = ctx.is_rollback_only(),
                "rolling back transaction"
            );
            drop(ctx);
            return Ok(());
        }

        debug!(id = %ctx.id(), writes = ctx.pending_count(), "committing transaction");
        let pending = ctx.into_pending();
        if !pending.is_empty() {
            self.store.apply(&pending)?;
        }
        Ok(())
    }

    /// Marks the current ambient context rollback-only.
    ///
    /// Any code running with an ambient context may call this; it is
    /// how a joined invocation forces the owning ancestor to roll back
    /// even though the joined invocation never controls commit itself.
    /// The flag is sticky and overrides both exemption sets and a
    /// successful outcome.
    ///
    /// # Errors
    ///
    /// Returns [`TxError::InvalidOperation`] if there is no ambient
    /// context.
    pub fn mark_rollback_only(&self) -> TxResult<()> {
        let mut stack = self.stack.lock();
        match stack.last_mut() {
            Some(ctx) => {
                debug!(id = %ctx.id(), "marked context rollback-only");
                ctx.mark_rollback_only();
                Ok(())
            }
            None => Err(TxError::invalid_operation(
                "no active transaction context to mark rollback-only",
            )),
        }
    }

    /// Saves a record through the ambient context, if any.
    ///
    /// With an ambient context the write is buffered in that context
    /// and becomes visible to others only at commit. Without one the
    /// write is durable immediately, as an auto-committing
    /// single-record transaction.
    ///
    /// # Errors
    ///
    /// Returns an error only when an auto-committed write fails to
    /// reach the store.
    pub fn save(&self, payload: RecordPayload) -> TxResult<RecordId> {
        {
            let mut stack = self.stack.lock();
            if let Some(ctx) = stack.last_mut() {
                return Ok(ctx.save(payload));
            }
        }
        let id = RecordId::new();
        self.store.apply(&[(id, payload)])?;
        Ok(id)
    }

    /// Returns all records visible to the current ambient state.
    ///
    /// That is the committed base in insertion order, followed by the
    /// ambient context's own pending writes in save order. Pending
    /// writes of sibling or suspended contexts are never visible.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn find_all(&self) -> TxResult<Vec<(RecordId, RecordPayload)>> {
        let mut records = self.store.find_all()?;
        let stack = self.stack.lock();
        if let Some(ctx) = stack.last() {
            records.extend(ctx.pending().iter().cloned());
        }
        Ok(records)
    }

    /// Removes all committed records from the store.
    ///
    /// Applies directly to committed state; pending writes of open
    /// contexts are unaffected. Typically used outside any active
    /// context, e.g. as test setup.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be cleared.
    pub fn delete_all(&self) -> TxResult<()> {
        self.store.delete_all()?;
        Ok(())
    }

    /// Returns whether an ambient context is active.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        !self.stack.lock().is_empty()
    }

    /// Returns the depth of the ambient context stack.
    ///
    /// Suspended contexts are parked with their invocations and do not
    /// count.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.lock().len()
    }

    /// Returns the ID of the current ambient context, if any.
    #[must_use]
    pub fn current_id(&self) -> Option<TransactionId> {
        self.stack.lock().last().map(TxContext::id)
    }

    /// Returns the ID of the context that enclosed the current ambient
    /// context when it was created, if any.
    ///
    /// A context created by REQUIRES_NEW records the context it
    /// suspended as its parent; a context created with no ambient
    /// context has none.
    #[must_use]
    pub fn current_parent(&self) -> Option<TransactionId> {
        self.stack.lock().last().and_then(TxContext::parent)
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("depth", &self.depth())
            .field("current_id", &self.current_id())
            .finish_non_exhaustive()
    }
}
