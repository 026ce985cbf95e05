//! Transaction management.
//!
//! A [`TransactionManager`] hands out [`Transaction`] handles bound to a
//! database connection. Nested units of work asking for a transaction while one
//! is already open receive that open handle instead of starting a new one.
//!
//! ```text
//! get() ──► Active ──commit()──► Committed
//!              │
//!              └──rollback()──► RolledBack
//! ```

pub mod connection;
pub mod handle;
pub mod manager;

pub use connection::{Connection, ConnectionError, ConnectionProvider, ConnectionRegistry};
pub use handle::{Transaction, TransactionState};
pub use manager::TransactionManager;

use thiserror::Error;
use uuid::Uuid;

/// Default name of the database service transactions are opened against.
pub const DEFAULT_DB_SERVICE: &str = "db";

/// Message recorded when a rollback is requested without one.
pub const DEFAULT_ROLLBACK_MESSAGE: &str = "Transaction aborted";

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("A connection provider is required to access the services related to transactions")]
    NoContainerAvailable,

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Transaction {id} is already {state}")]
    AlreadyFinished { id: Uuid, state: TransactionState },

    #[error("{message}")]
    Aborted { message: String },
}
