use std::fmt::{Debug, Formatter};
use std::sync::{Mutex, PoisonError};

use tracing::trace;

use crate::proto::model::U2fResponse;

/// Completion handed to `register`/`sign`. Runs at most once.
pub type Callback = Box<dyn FnOnce(U2fResponse) + Send + 'static>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OperationKind {
    Register,
    Sign,
}

pub struct PendingOperation {
    pub kind: OperationKind,
    callback: Callback,
}

impl PendingOperation {
    pub fn new(kind: OperationKind, callback: Callback) -> Self {
        Self { kind, callback }
    }

    pub fn complete(self, response: U2fResponse) {
        (self.callback)(response)
    }
}

impl Debug for PendingOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingOperation")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SlotBusy {
    pub pending: OperationKind,
}

/// Holds the single in-flight operation. Not a queue: a claim on an occupied
/// slot fails and the rejected operation is dropped without running.
#[derive(Debug, Default)]
pub struct PendingSlot {
    slot: Mutex<Option<PendingOperation>>,
}

impl PendingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&self, operation: PendingOperation) -> Result<(), SlotBusy> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pending) = slot.as_ref() {
            return Err(SlotBusy {
                pending: pending.kind,
            });
        }
        trace!(kind = ?operation.kind, "Claiming pending slot");
        *slot = Some(operation);
        Ok(())
    }

    /// Takes the pending operation out, leaving the slot empty.
    pub fn release(&self) -> Option<PendingOperation> {
        let released = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(operation) = &released {
            trace!(kind = ?operation.kind, "Released pending slot");
        }
        released
    }

    pub fn pending_kind(&self) -> Option<OperationKind> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|operation| operation.kind)
    }

    pub fn is_pending(&self) -> bool {
        self.pending_kind().is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::{OperationKind, PendingOperation, PendingSlot, SlotBusy};
    use crate::proto::model::{U2fError, U2fResponse};

    fn counting(kind: OperationKind, calls: &Arc<AtomicUsize>) -> PendingOperation {
        let calls = Arc::clone(calls);
        PendingOperation::new(
            kind,
            Box::new(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn second_claim_is_rejected_and_dropped() {
        let slot = PendingSlot::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        slot.claim(counting(OperationKind::Register, &first)).unwrap();
        assert_eq!(
            slot.claim(counting(OperationKind::Sign, &second)),
            Err(SlotBusy {
                pending: OperationKind::Register
            })
        );
        assert_eq!(slot.pending_kind(), Some(OperationKind::Register));
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn release_empties_the_slot() {
        let slot = PendingSlot::new();
        let calls = Arc::new(AtomicUsize::new(0));
        slot.claim(counting(OperationKind::Sign, &calls)).unwrap();

        let released = slot.release().unwrap();
        assert_eq!(released.kind, OperationKind::Sign);
        assert!(!slot.is_pending());
        assert!(slot.release().is_none());

        released.complete(U2fResponse::from(U2fError::other()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn slot_can_be_claimed_again_after_release() {
        let slot = PendingSlot::new();
        let calls = Arc::new(AtomicUsize::new(0));
        slot.claim(counting(OperationKind::Register, &calls)).unwrap();
        slot.release();
        assert!(slot.claim(counting(OperationKind::Sign, &calls)).is_ok());
        assert_eq!(slot.pending_kind(), Some(OperationKind::Sign));
    }
}
