//! Propagation scenarios over item/log service fixtures.
//!
//! Two small services share one call chain: `ItemCatalog` persists
//! items and `AuditLog` persists log lines, both as prefixed payloads
//! in a single shared store. The scenarios exercise every propagation
//! mode through the observable store contents after success and
//! failure.

use std::sync::Arc;
use txnest_core::{ErrorKind, Propagation, TransactionManager, TxError, TxResult, UnitOfWork};
use txnest_store::InMemoryStore;

const ITEM_PREFIX: &str = "item:";
const LOG_PREFIX: &str = "log:";

/// Log-line persistence over the shared manager.
struct AuditLog<'a> {
    manager: &'a TransactionManager,
}

impl AuditLog<'_> {
    /// Writes a log line in its own independent transaction.
    fn log(&self, message: &str) -> TxResult<()> {
        self.manager
            .execute(&UnitOfWork::new(Propagation::RequiresNew), |m| {
                m.save(format!("{LOG_PREFIX}{message}").into_bytes())?;
                Ok(())
            })
    }

    /// Writes log lines outside any transaction, failing mid-way.
    fn add_separate_logs_not_supported(&self) -> TxResult<()> {
        self.manager
            .execute(&UnitOfWork::new(Propagation::NotSupported), |m| {
                m.save(format!("{LOG_PREFIX}check from not supported 1").into_bytes())?;
                // The second line is never reached.
                Err(TxError::business_rule("log write interrupted"))
            })
    }

    /// Writes log lines joining a transaction only if one is present,
    /// failing mid-way.
    fn add_separate_logs_supports(&self) -> TxResult<()> {
        self.manager
            .execute(&UnitOfWork::new(Propagation::Supports), |m| {
                m.save(format!("{LOG_PREFIX}check from supports 1").into_bytes())?;
                Err(TxError::business_rule("log write interrupted"))
            })
    }

    /// Enumerates log lines; prohibited inside a transaction.
    fn show_logs(&self) -> TxResult<Vec<String>> {
        self.manager
            .execute(&UnitOfWork::new(Propagation::Never), |m| {
                Ok(decode(m, LOG_PREFIX))
            })
    }

    fn lines(&self) -> Vec<String> {
        decode(self.manager, LOG_PREFIX)
    }
}

/// Item persistence with duplicate-name checking.
struct ItemCatalog<'a> {
    manager: &'a TransactionManager,
    audit: AuditLog<'a>,
}

impl<'a> ItemCatalog<'a> {
    fn new(manager: &'a TransactionManager) -> Self {
        Self {
            manager,
            audit: AuditLog { manager },
        }
    }

    /// Rejects duplicate item names; only callable inside a transaction.
    fn check_name_duplicate(&self, name: &str) -> TxResult<()> {
        self.manager
            .execute(&UnitOfWork::new(Propagation::Mandatory), |m| {
                let exists = decode(m, ITEM_PREFIX).iter().any(|n| n == name);
                if exists {
                    return Err(TxError::business_rule(format!(
                        "item with name {name} already exists"
                    )));
                }
                Ok(())
            })
    }

    /// Adds an item, logging the attempt in a separate transaction.
    fn add_item(&self, name: &str) -> TxResult<()> {
        self.manager.execute(&UnitOfWork::default(), |m| {
            self.audit.log(&format!("adding item with name {name}"))?;
            self.check_name_duplicate(name)?;
            m.save(format!("{ITEM_PREFIX}{name}").into_bytes())?;
            Ok(())
        })
    }

    /// Adds an item; duplicate-name failures do not roll the unit back.
    fn add_item_no_rollback(&self, name: &str) -> TxResult<()> {
        let unit = UnitOfWork::new(Propagation::Required).no_rollback_for(ErrorKind::BusinessRule);
        self.manager.execute(&unit, |m| {
            m.save(format!("{LOG_PREFIX}adding log in method with no rollback for item {name}").into_bytes())?;
            self.check_name_duplicate(name)?;
            m.save(format!("{ITEM_PREFIX}{name}").into_bytes())?;
            Ok(())
        })
    }

    /// Writes separate log lines from inside an owning transaction.
    fn add_logs(&self) -> TxResult<()> {
        self.manager.execute(&UnitOfWork::default(), |_| {
            self.audit.add_separate_logs_not_supported()
        })
    }

    /// Shows logs from inside a transaction (always rejected by the
    /// audit log's NEVER declaration).
    fn show_logs(&self) -> TxResult<Vec<String>> {
        self.manager
            .execute(&UnitOfWork::default(), |_| self.audit.show_logs())
    }

    fn names(&self) -> Vec<String> {
        decode(self.manager, ITEM_PREFIX)
    }
}

/// Decodes visible payloads carrying the given prefix.
fn decode(manager: &TransactionManager, prefix: &str) -> Vec<String> {
    manager
        .find_all()
        .unwrap()
        .into_iter()
        .filter_map(|(_, payload)| {
            String::from_utf8(payload)
                .ok()
                .and_then(|s| s.strip_prefix(prefix).map(str::to_owned))
        })
        .collect()
}

fn setup() -> TransactionManager {
    TransactionManager::new(Arc::new(InMemoryStore::new()))
}

#[test]
fn not_supported() {
    let manager = setup();
    let catalog = ItemCatalog::new(&manager);

    // add_logs starts a transaction, but the NOT_SUPPORTED unit
    // suspends it; the first line is durable even after the failure.
    let err = catalog.add_logs().unwrap_err();
    assert!(matches!(err, TxError::BusinessRule { .. }));
    assert_eq!(
        catalog.audit.lines(),
        vec!["check from not supported 1".to_owned()]
    );

    // No transaction active anymore, so showing logs succeeds.
    let shown = catalog.audit.show_logs().unwrap();
    assert_eq!(shown, vec!["check from not supported 1".to_owned()]);
}

#[test]
fn supports() {
    let manager = setup();
    let catalog = ItemCatalog::new(&manager);

    // No ambient transaction: SUPPORTS runs without a context, so the
    // first line auto-commits before the failure.
    let err = catalog.audit.add_separate_logs_supports().unwrap_err();
    assert!(matches!(err, TxError::BusinessRule { .. }));
    assert_eq!(
        catalog.audit.lines(),
        vec!["check from supports 1".to_owned()]
    );
}

#[test]
fn supports_joins_and_rolls_back_with_owner() {
    let manager = setup();
    let catalog = ItemCatalog::new(&manager);

    // With an ambient transaction, the SUPPORTS write joins the owner
    // and rolls back with it.
    let err = manager
        .execute::<(), _>(&UnitOfWork::default(), |_| {
            catalog.audit.add_separate_logs_supports()
        })
        .unwrap_err();
    assert!(matches!(err, TxError::BusinessRule { .. }));
    assert!(catalog.audit.lines().is_empty());
}

#[test]
fn mandatory() {
    let manager = setup();
    let catalog = ItemCatalog::new(&manager);

    let err = catalog.check_name_duplicate("Item1").unwrap_err();
    assert!(matches!(err, TxError::NoTransaction));
    assert_eq!(
        err.to_string(),
        "no existing transaction found for a unit of work marked with propagation 'mandatory'"
    );
    assert!(manager.find_all().unwrap().is_empty());
}

#[test]
fn never() {
    let manager = setup();
    let catalog = ItemCatalog::new(&manager);
    catalog.add_item("Item1").unwrap();

    // Safe to show logs with no transaction active.
    assert_eq!(catalog.audit.show_logs().unwrap().len(), 1);

    // Prohibited from inside a transaction.
    let err = catalog.show_logs().unwrap_err();
    assert!(matches!(err, TxError::UnexpectedTransaction));
    assert_eq!(
        err.to_string(),
        "existing transaction found for a unit of work marked with propagation 'never'"
    );
}

#[test]
fn requires_new() {
    let manager = setup();
    let catalog = ItemCatalog::new(&manager);

    catalog.add_item("Item1").unwrap();
    catalog.add_item("Item2").unwrap();
    catalog.add_item("Item3").unwrap();

    // The duplicate fails and rolls back its item transaction, but the
    // REQUIRES_NEW log committed independently beforehand.
    let err = catalog.add_item("Item2").unwrap_err();
    assert_eq!(
        err.to_string(),
        "business rule violated: item with name Item2 already exists"
    );
    assert_eq!(catalog.audit.lines().len(), 4);
    assert_eq!(
        catalog.names(),
        vec!["Item1".to_owned(), "Item2".to_owned(), "Item3".to_owned()]
    );
}

#[test]
fn no_rollback() {
    let manager = setup();
    let catalog = ItemCatalog::new(&manager);

    catalog.add_item_no_rollback("Item1").unwrap();
    catalog.add_item_no_rollback("Item2").unwrap();
    catalog.add_item_no_rollback("Item3").unwrap();

    let err = catalog.add_item("Item2").unwrap_err();
    assert_eq!(
        err.to_string(),
        "business rule violated: item with name Item2 already exists"
    );
    // Three in-context lines plus the failed add's REQUIRES_NEW line.
    assert_eq!(catalog.audit.lines().len(), 4);
    assert_eq!(catalog.names().len(), 3);
}

#[test]
fn no_rollback_exemption_keeps_in_context_writes() {
    let manager = setup();
    let catalog = ItemCatalog::new(&manager);
    catalog.add_item_no_rollback("Item1").unwrap();

    // The duplicate failure is exempt, so the unit commits what it
    // wrote before failing: the log line, but no second item.
    let err = catalog.add_item_no_rollback("Item1").unwrap_err();
    assert!(matches!(err, TxError::BusinessRule { .. }));
    assert_eq!(catalog.names(), vec!["Item1".to_owned()]);
    assert_eq!(catalog.audit.lines().len(), 2);
}

#[test]
fn without_exemption_identical_failure_rolls_back() {
    let manager = setup();
    let catalog = ItemCatalog::new(&manager);
    catalog.add_item("Item1").unwrap();

    let lines_before = catalog.audit.lines().len();
    let err = catalog.add_item("Item1").unwrap_err();
    assert!(matches!(err, TxError::BusinessRule { .. }));

    // Only the duplicate attempt's REQUIRES_NEW line survives.
    assert_eq!(catalog.names(), vec!["Item1".to_owned()]);
    assert_eq!(catalog.audit.lines().len(), lines_before + 1);
}

#[test]
fn rollback_only_overrides_exemption_and_success() {
    let manager = setup();
    let unit = UnitOfWork::new(Propagation::Required).no_rollback_for(ErrorKind::BusinessRule);

    // A joined nested unit marks the shared context rollback-only; the
    // owner's exemption set and its reported success are both
    // overridden at the owning boundary.
    manager
        .execute(&unit, |m| {
            m.save(b"doomed".to_vec())?;
            m.execute(&UnitOfWork::new(Propagation::Required), |inner| {
                inner.mark_rollback_only()
            })?;
            Ok(())
        })
        .unwrap();

    assert!(manager.find_all().unwrap().is_empty());
}

#[test]
fn find_all_is_stable_between_writes() {
    let manager = setup();
    let catalog = ItemCatalog::new(&manager);
    catalog.add_item("Item1").unwrap();
    catalog.add_item("Item2").unwrap();

    let first = manager.find_all().unwrap();
    let second = manager.find_all().unwrap();
    assert_eq!(first, second);
}
