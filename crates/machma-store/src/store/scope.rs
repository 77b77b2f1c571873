//! Transaction scope handed to every domain operation.

use machma_core::error::MachmaError;
use sqlx::{Sqlite, SqliteConnection, Transaction};

/// One open transaction.
///
/// All domain operations are methods on `Scope`, so every read and write of a
/// command goes through the same transaction. A scope that is dropped
/// without [`Scope::commit`] rolls back.
pub struct Scope {
    tx: Transaction<'static, Sqlite>,
}

impl Scope {
    pub(super) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self { tx }
    }

    /// The connection this scope's transaction runs on.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut *self.tx
    }

    /// Persist every write made in this scope.
    pub async fn commit(self) -> Result<(), MachmaError> {
        self.tx
            .commit()
            .await
            .map_err(|e| MachmaError::Store(format!("commit failed: {e}")))
    }

    /// Discard every write made in this scope.
    pub async fn rollback(self) -> Result<(), MachmaError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| MachmaError::Store(format!("rollback failed: {e}")))
    }
}
