//! After-commit hooks

use crate::error::DispatchError;
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Deferred work handed to a transaction manager.
pub type AfterCommitCallback =
    Box<dyn FnOnce() -> BoxFuture<'static, Result<(), DispatchError>> + Send>;

/// Looks up the transaction manager for the current context, if any.
pub type TransactionManagerResolver =
    Arc<dyn Fn() -> Option<Arc<dyn TransactionManager>> + Send + Sync>;

/// Receives callbacks that must only run once the open transaction commits.
///
/// Whether a callback runs immediately when no transaction is open is the
/// manager's decision.
pub trait TransactionManager: Send + Sync {
    fn add_callback(&self, callback: AfterCommitCallback);
}

/// Transaction manager that holds callbacks until `commit` or `rollback`.
#[derive(Default)]
pub struct BufferedTransactionManager {
    callbacks: Mutex<Vec<AfterCommitCallback>>,
}

impl BufferedTransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks waiting for the commit
    pub fn pending(&self) -> usize {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run every pending callback in registration order
    pub async fn commit(&self) -> Result<(), DispatchError> {
        let callbacks = std::mem::take(
            &mut *self.callbacks.lock().unwrap_or_else(PoisonError::into_inner),
        );
        debug!("Committing transaction with {} callbacks", callbacks.len());
        for callback in callbacks {
            callback().await?;
        }
        Ok(())
    }

    /// Drop every pending callback without running it
    pub fn rollback(&self) {
        let dropped = std::mem::take(
            &mut *self.callbacks.lock().unwrap_or_else(PoisonError::into_inner),
        );
        debug!("Rolled back transaction, discarded {} callbacks", dropped.len());
    }
}

impl TransactionManager for BufferedTransactionManager {
    fn add_callback(&self, callback: AfterCommitCallback) {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
    }
}

impl std::fmt::Debug for BufferedTransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedTransactionManager")
            .field("pending", &self.pending())
            .finish()
    }
}
