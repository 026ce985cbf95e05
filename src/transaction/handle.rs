use super::{Connection, TransactionError, TransactionManager, DEFAULT_ROLLBACK_MESSAGE};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionState::Active => "active",
            TransactionState::Committed => "committed",
            TransactionState::RolledBack => "rolled back",
        };
        f.write_str(label)
    }
}

/// One unit of work bound to one borrowed connection.
pub struct Transaction {
    id: Uuid,
    service: String,
    connection: Arc<dyn Connection>,
    manager: Weak<TransactionManager>,
    is_new: AtomicBool,
    rollback_throw_exception: AtomicBool,
    state: Mutex<TransactionState>,
    messages: Mutex<Vec<String>>,
}

impl Transaction {
    pub(crate) fn new(
        service: impl Into<String>,
        connection: Arc<dyn Connection>,
        manager: Weak<TransactionManager>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            service: service.into(),
            connection,
            manager,
            is_new: AtomicBool::new(true),
            rollback_throw_exception: AtomicBool::new(false),
            state: Mutex::new(TransactionState::Active),
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Database service the connection was obtained for.
    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn connection(&self) -> Arc<dyn Connection> {
        Arc::clone(&self.connection)
    }

    pub fn is_new_transaction(&self) -> bool {
        self.is_new.load(Ordering::Relaxed)
    }

    pub fn set_is_new_transaction(&self, is_new: bool) {
        self.is_new.store(is_new, Ordering::Relaxed);
    }

    /// Whether `rollback` reports the abort as an error.
    pub fn set_rollback_throw_exception(&self, enabled: bool) {
        self.rollback_throw_exception.store(enabled, Ordering::Relaxed);
    }

    pub fn state(&self) -> TransactionState {
        *self.state.lock()
    }

    /// Whether the underlying connection is still inside a transaction.
    pub fn is_valid(&self) -> bool {
        self.connection.is_under_transaction()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn begin(&self) -> Result<(), TransactionError> {
        self.ensure_active()?;
        self.connection.begin()?;
        Ok(())
    }

    /// Commit and leave the manager's live set.
    ///
    /// A failed commit keeps the handle live so the manager can still roll
    /// it back.
    pub fn commit(&self) -> Result<(), TransactionError> {
        self.ensure_active()?;
        self.connection.commit()?;
        self.mark_finished(TransactionState::Committed);
        if let Some(manager) = self.manager.upgrade() {
            manager.notify_commit(self);
        }
        info!(transaction = %self.id, service = %self.service, "Transaction committed");
        Ok(())
    }

    /// Roll back and leave the manager's live set.
    ///
    /// The message (or [`DEFAULT_ROLLBACK_MESSAGE`]) is recorded; when
    /// rollback exceptions are enabled it is also returned as
    /// [`TransactionError::Aborted`].
    pub fn rollback(&self, message: Option<&str>) -> Result<(), TransactionError> {
        self.ensure_active()?;
        self.connection.rollback()?;
        self.mark_finished(TransactionState::RolledBack);
        if let Some(manager) = self.manager.upgrade() {
            manager.notify_rollback(self);
        }

        let message = message.unwrap_or(DEFAULT_ROLLBACK_MESSAGE).to_string();
        self.messages.lock().push(message.clone());
        info!(
            transaction = %self.id,
            service = %self.service,
            reason = %message,
            "Transaction rolled back"
        );

        if self.rollback_throw_exception.load(Ordering::Relaxed) {
            return Err(TransactionError::Aborted { message });
        }
        Ok(())
    }

    /// Move the handle into a terminal state after its connection finished.
    pub(crate) fn mark_finished(&self, state: TransactionState) {
        *self.state.lock() = state;
    }

    fn ensure_active(&self) -> Result<(), TransactionError> {
        let state = self.state();
        if state != TransactionState::Active {
            debug!(transaction = %self.id, %state, "Operation on finished transaction");
            return Err(TransactionError::AlreadyFinished { id: self.id, state });
        }
        Ok(())
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("service", &self.service)
            .field("is_new", &self.is_new_transaction())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
