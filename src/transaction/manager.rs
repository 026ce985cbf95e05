use super::{ConnectionProvider, Transaction, TransactionError, TransactionState};
use crate::config::TransactionConfig;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tracks the live transaction handles for one database service.
///
/// The live set keeps creation order. Its length is the live count; there is
/// no separate counter to drift out of sync.
pub struct TransactionManager {
    provider: Arc<dyn ConnectionProvider>,
    service: RwLock<String>,
    rollback_pendent: AtomicBool,
    transactions: Mutex<Vec<Arc<Transaction>>>,
}

impl TransactionManager {
    pub fn new(
        provider: Option<Arc<dyn ConnectionProvider>>,
    ) -> Result<Arc<Self>, TransactionError> {
        Self::with_config(provider, &TransactionConfig::default())
    }

    pub fn with_config(
        provider: Option<Arc<dyn ConnectionProvider>>,
        config: &TransactionConfig,
    ) -> Result<Arc<Self>, TransactionError> {
        let provider = provider.ok_or(TransactionError::NoContainerAvailable)?;
        Ok(Arc::new(Self {
            provider,
            service: RwLock::new(config.db_service.clone()),
            rollback_pendent: AtomicBool::new(config.rollback_pendent),
            transactions: Mutex::new(Vec::new()),
        }))
    }

    /// Database service new transactions are opened against.
    pub fn db_service(&self) -> String {
        self.service.read().clone()
    }

    pub fn set_db_service(&self, service: impl Into<String>) {
        *self.service.write() = service.into();
    }

    /// Whether pending transactions are rolled back when the manager is dropped.
    pub fn rollback_pendent(&self) -> bool {
        self.rollback_pendent.load(Ordering::Relaxed)
    }

    pub fn set_rollback_pendent(&self, enabled: bool) {
        self.rollback_pendent.store(enabled, Ordering::Relaxed);
    }

    pub fn has(&self) -> bool {
        !self.transactions.lock().is_empty()
    }

    pub fn count(&self) -> usize {
        self.transactions.lock().len()
    }

    /// Snapshot of the live set in creation order.
    pub fn transactions(&self) -> Vec<Arc<Transaction>> {
        self.transactions.lock().clone()
    }

    /// Return the first live handle still under transaction, or open a new one.
    ///
    /// Reuse is by position, not by service: the first open handle wins even
    /// if it was opened before `set_db_service` changed the target.
    pub fn get(self: &Arc<Self>, auto_begin: bool) -> Result<Arc<Transaction>, TransactionError> {
        for transaction in self.transactions() {
            if transaction.connection().is_under_transaction() {
                transaction.set_is_new_transaction(false);
                debug!(transaction = %transaction.id(), "Reusing open transaction");
                return Ok(transaction);
            }
        }

        let service = self.db_service();
        let connection = self.provider.connection(&service)?;
        if auto_begin {
            connection.begin()?;
        }

        let transaction = Arc::new(Transaction::new(
            service.as_str(),
            connection,
            Arc::downgrade(self),
        ));
        self.transactions.lock().push(Arc::clone(&transaction));
        info!(
            transaction = %transaction.id(),
            service = %service,
            auto_begin,
            "Transaction created"
        );
        Ok(transaction)
    }

    /// Commit every live connection that is under transaction. Handles stay
    /// in the live set but become `Committed`.
    pub fn commit(&self) -> Result<(), TransactionError> {
        for transaction in self.transactions() {
            let connection = transaction.connection();
            if connection.is_under_transaction() {
                connection.commit()?;
                transaction.mark_finished(TransactionState::Committed);
                debug!(transaction = %transaction.id(), "Committed connection");
            }
        }
        Ok(())
    }

    /// Roll back and close every live connection under transaction, marking
    /// those handles `RolledBack` and removing them from the live set when
    /// `collect` is set.
    pub fn rollback(&self, collect: bool) -> Result<(), TransactionError> {
        for transaction in self.transactions() {
            let connection = transaction.connection();
            if connection.is_under_transaction() {
                connection.rollback()?;
                transaction.mark_finished(TransactionState::RolledBack);
                connection.close()?;
                debug!(transaction = %transaction.id(), collect, "Rolled back connection");
                if collect {
                    self.collect_transaction(&transaction);
                }
            }
        }
        Ok(())
    }

    /// Roll back pending transactions without collecting them.
    pub fn rollback_pendent_transactions(&self) -> Result<(), TransactionError> {
        self.rollback(false)
    }

    pub fn notify_commit(&self, transaction: &Transaction) {
        self.collect_transaction(transaction);
    }

    pub fn notify_rollback(&self, transaction: &Transaction) {
        self.collect_transaction(transaction);
    }

    /// Drop every handle from the live set.
    pub fn collect_transactions(&self) {
        let removed = {
            let mut transactions = self.transactions.lock();
            let removed = transactions.len();
            transactions.clear();
            removed
        };
        debug!(removed, "Collected transactions");
    }

    fn collect_transaction(&self, transaction: &Transaction) {
        let id = transaction.id();
        self.transactions.lock().retain(|t| t.id() != id);
    }
}

impl Drop for TransactionManager {
    fn drop(&mut self) {
        if !self.rollback_pendent() || self.transactions.get_mut().is_empty() {
            return;
        }
        if let Err(err) = self.rollback(false) {
            warn!(error = %err, "Failed to roll back pending transactions");
        }
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("service", &self.db_service())
            .field("rollback_pendent", &self.rollback_pendent())
            .field("live", &self.count())
            .finish_non_exhaustive()
    }
}
