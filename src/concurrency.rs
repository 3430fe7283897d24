//! Serialization of configuration mutations
//!
//! Upgrade, reset, restore, update and reload all rewrite the live
//! configuration. At most one of them may run at a time; a second caller is
//! turned away immediately instead of queueing behind the first.

use crate::error::ApiError;
use parking_lot::Mutex;
use std::sync::Arc;

/// In-process busy flag naming the mutation currently in flight.
#[derive(Debug, Clone, Default)]
pub struct MutationGate {
    in_flight: Arc<Mutex<Option<&'static str>>>,
}

impl MutationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate for `operation`, or fail with [`ApiError::Busy`] naming the holder.
    pub fn try_acquire(&self, operation: &'static str) -> Result<MutationGuard, ApiError> {
        let mut slot = self.in_flight.lock();
        if let Some(current) = *slot {
            tracing::warn!(
                requested = operation,
                in_flight = current,
                "configuration mutation rejected"
            );
            return Err(ApiError::Busy { operation: current });
        }
        *slot = Some(operation);
        Ok(MutationGuard {
            in_flight: Arc::clone(&self.in_flight),
            operation,
        })
    }

    /// The mutation currently holding the gate, if any.
    pub fn current(&self) -> Option<&'static str> {
        *self.in_flight.lock()
    }
}

/// Releases the gate on drop.
#[derive(Debug)]
pub struct MutationGuard {
    in_flight: Arc<Mutex<Option<&'static str>>>,
    operation: &'static str,
}

impl Drop for MutationGuard {
    fn drop(&mut self) {
        *self.in_flight.lock() = None;
        tracing::debug!(operation = self.operation, "configuration mutation finished");
    }
}
