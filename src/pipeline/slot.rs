//! Process-wide admission slot
//!
//! Speech recognition and synthesis are heavy and not reentrant, so at most
//! one message runs the pipeline at a time. The slot is a capacity-1
//! semaphore that is only ever *tried*: a caller that finds it held gets
//! `None` and must answer "busy" instead of queueing.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Cloneable handle to the single pipeline slot
#[derive(Debug, Clone)]
pub struct ExclusiveSlot {
    semaphore: Arc<Semaphore>,
}

/// Proof of holding the slot; released on drop
#[derive(Debug)]
pub struct SlotGuard {
    _permit: OwnedSemaphorePermit,
}

impl ExclusiveSlot {
    pub fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
        }
    }

    /// Take the slot without waiting
    pub fn try_acquire(&self) -> Option<SlotGuard> {
        self.semaphore
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| SlotGuard { _permit: permit })
    }

    /// Whether some pipeline currently holds the slot
    pub fn is_held(&self) -> bool {
        self.semaphore.available_permits() == 0
    }
}

impl Default for ExclusiveSlot {
    fn default() -> Self {
        Self::new()
    }
}
