// Operation serialiser: ensures at most one of {ATTACH, DETACH, RELEASE}
// runs at a time for a given room. Modelled as a single-slot queue plus a
// completion notifier rather than unbounded concurrent tasks guarded by a
// mutex, so ordering is easy to reason about and to test.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Attach,
    Detach,
    Release,
}

#[derive(Debug, Clone)]
pub struct OperationRecord {
    pub id: Uuid,
    pub kind: OperationKind,
}

/// Emitted on the internal waiting-event stream whenever a request has to
/// wait for an in-flight operation. For tests and debug introspection
/// only; must never be relied on for correctness.
#[derive(Debug, Clone)]
pub struct WaitingEvent {
    pub waiting_operation_id: Uuid,
    pub waited_operation_id: Uuid,
}

struct Slot {
    record: OperationRecord,
    done_tx: broadcast::Sender<()>,
}

/// Serialises ATTACH/DETACH/RELEASE against each other for one room.
pub struct OperationSerialiser {
    current: Mutex<Option<Slot>>,
    waiting_tx: broadcast::Sender<WaitingEvent>,
}

impl OperationSerialiser {
    pub fn new() -> Self {
        let (waiting_tx, _) = broadcast::channel(64);
        Self {
            current: Mutex::new(None),
            waiting_tx,
        }
    }

    /// Subscribe to the internal waiting-event stream (tests / debug only).
    pub fn subscribe_waiting(&self) -> broadcast::Receiver<WaitingEvent> {
        self.waiting_tx.subscribe()
    }

    /// Best-effort check for whether an operation currently holds the
    /// slot. A contended lock (someone else mid-claim or mid-release)
    /// counts as active: callers use this to decide whether it's safe to
    /// apply a channel-driven status update, and "active" is the safe
    /// default when genuinely unsure.
    pub fn is_active(&self) -> bool {
        match self.current.try_lock() {
            Ok(guard) => guard.is_some(),
            Err(_) => true,
        }
    }

    /// Waits for any in-flight operation to finish, claims the slot for
    /// `kind`, runs `body`, then frees the slot and wakes any waiters.
    /// `body` is only invoked once this call holds the slot, so its
    /// precondition checks see a stable room status.
    pub async fn run<F, Fut, T>(&self, kind: OperationKind, body: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let my_id = Uuid::new_v4();

        loop {
            let mut guard = self.current.lock().await;
            if let Some(slot) = guard.as_ref() {
                let waited_id = slot.record.id;
                let mut done_rx = slot.done_tx.subscribe();
                drop(guard);

                let _ = self.waiting_tx.send(WaitingEvent {
                    waiting_operation_id: my_id,
                    waited_operation_id: waited_id,
                });
                debug!("operation {} waiting on in-flight operation {}", my_id, waited_id);

                let _ = done_rx.recv().await;
                continue;
            }

            let (done_tx, _) = broadcast::channel(1);
            *guard = Some(Slot {
                record: OperationRecord { id: my_id, kind },
                done_tx,
            });
            break;
        }

        let result = body().await;

        let mut guard = self.current.lock().await;
        if let Some(slot) = guard.take() {
            let _ = slot.done_tx.send(());
        }
        drop(guard);

        result
    }
}

impl Default for OperationSerialiser {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedOperationSerialiser = Arc<OperationSerialiser>;
