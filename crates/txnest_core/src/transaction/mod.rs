//! Transaction contexts, propagation resolution, and the manager.
//!
//! A unit of work declares how it relates to the ambient transaction
//! context via a [`Propagation`] mode; the pure [`resolve`] function
//! maps that declaration to an [`Action`], and the
//! [`TransactionManager`] performs the join/create/suspend bookkeeping
//! around the body and decides commit vs rollback at exit.

mod context;
mod manager;
mod propagation;

pub(crate) use context::TxContext;
pub use manager::{Invocation, Outcome, TransactionManager};
pub use propagation::{resolve, Action, Propagation, UnitOfWork};
