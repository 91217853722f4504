//! Propagation modes and the resolver decision table.

use crate::error::{ErrorKind, TxError, TxResult};
use std::collections::HashSet;
use std::fmt;

/// Declared policy governing how a unit of work relates to an ambient
/// transaction context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Propagation {
    /// Join the ambient context, or create one if absent.
    #[default]
    Required,
    /// Always create a new context, suspending any ambient one.
    RequiresNew,
    /// Join the ambient context; fail if there is none.
    Mandatory,
    /// Join the ambient context if present, else run without one.
    Supports,
    /// Run without a context, suspending any ambient one.
    NotSupported,
    /// Run without a context; fail if an ambient one is present.
    Never,
}

impl fmt::Display for Propagation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Required => "required",
            Self::RequiresNew => "requires_new",
            Self::Mandatory => "mandatory",
            Self::Supports => "supports",
            Self::NotSupported => "not_supported",
            Self::Never => "never",
        };
        f.write_str(name)
    }
}

/// Resolved action for a unit-of-work entry.
///
/// `Join` means the invocation is **not** the owner of the context it
/// runs in; all `CreateNew` variants make the invocation the owner,
/// solely responsible for commit/rollback at exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Execute in the existing ambient context, without owning it.
    Join,
    /// Create and own a new context.
    CreateNew,
    /// Park the ambient context, then create and own a new one.
    SuspendAndCreateNew,
    /// Execute with no context at all.
    RunWithoutContext,
    /// Park the ambient context and execute with no context.
    SuspendAndRunWithoutContext,
}

/// Resolves a propagation mode against the current ambient state.
///
/// This is a pure decision table; rejects (MANDATORY without a
/// context, NEVER with one) surface as errors without any side
/// effects.
///
/// # Errors
///
/// - [`TxError::NoTransaction`] for `Mandatory` with no ambient context
/// - [`TxError::UnexpectedTransaction`] for `Never` with one present
pub fn resolve(mode: Propagation, ambient: bool) -> TxResult<Action> {
    let action = match (mode, ambient) {
        (Propagation::Required, true) => Action::Join,
        (Propagation::Required, false) => Action::CreateNew,
        (Propagation::RequiresNew, true) => Action::SuspendAndCreateNew,
        (Propagation::RequiresNew, false) => Action::CreateNew,
        (Propagation::Mandatory, true) => Action::Join,
        (Propagation::Mandatory, false) => return Err(TxError::NoTransaction),
        (Propagation::Supports, true) => Action::Join,
        (Propagation::Supports, false) => Action::RunWithoutContext,
        (Propagation::NotSupported, true) => Action::SuspendAndRunWithoutContext,
        (Propagation::NotSupported, false) => Action::RunWithoutContext,
        (Propagation::Never, true) => return Err(TxError::UnexpectedTransaction),
        (Propagation::Never, false) => Action::RunWithoutContext,
    };
    Ok(action)
}

/// Declaration for one unit-of-work invocation.
///
/// This replaces method-level transactional metadata with an explicit
/// value passed at the call site: the propagation mode plus the set of
/// failure kinds that do not trigger rollback.
///
/// # Example
///
/// ```rust
/// use txnest_core::{ErrorKind, Propagation, UnitOfWork};
///
/// let unit = UnitOfWork::new(Propagation::Required)
///     .no_rollback_for(ErrorKind::BusinessRule);
/// assert!(unit.exemptions().contains(&ErrorKind::BusinessRule));
/// ```
#[derive(Debug, Clone, Default)]
pub struct UnitOfWork {
    /// Declared propagation mode.
    propagation: Propagation,
    /// Failure kinds exempt from rollback for a context this unit owns.
    no_rollback_for: HashSet<ErrorKind>,
}

impl UnitOfWork {
    /// Creates a declaration with the given propagation mode and an
    /// empty exemption set.
    #[must_use]
    pub fn new(propagation: Propagation) -> Self {
        Self {
            propagation,
            no_rollback_for: HashSet::new(),
        }
    }

    /// Adds a failure kind that does not trigger rollback.
    ///
    /// Only consulted for a context this unit *owns*; joined units
    /// defer entirely to the owner's declaration.
    #[must_use]
    pub fn no_rollback_for(mut self, kind: ErrorKind) -> Self {
        self.no_rollback_for.insert(kind);
        self
    }

    /// Returns the declared propagation mode.
    #[must_use]
    pub fn propagation(&self) -> Propagation {
        self.propagation
    }

    /// Returns the exemption set.
    #[must_use]
    pub fn exemptions(&self) -> &HashSet<ErrorKind> {
        &self.no_rollback_for
    }
}
