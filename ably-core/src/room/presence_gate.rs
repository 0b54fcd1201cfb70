// Presence gate: a synchronisation barrier feature-level code waits on
// before touching presence (or any other room-status-gated feature).

use tokio::sync::broadcast;

use crate::error::{AblyError, AblyResult};
use crate::room::status::{FeatureTag, RoomStatus, RoomStatusChange};

fn invalid_state_message(feature: FeatureTag) -> String {
    format!(
        "To perform this {} operation, you must first attach the room.",
        feature
    )
}

/// Returns once the room has reached `Attached`, or fails with
/// `roomInInvalidState` otherwise — either immediately, or after waiting
/// through an in-progress ATTACH.
///
/// `current` is a snapshot of the room status taken atomically with
/// `status_rx`'s subscription point, so no status change between the
/// snapshot and the subscribe call is missed or double-counted.
pub async fn wait_to_be_able_to_perform_presence_operations(
    feature: FeatureTag,
    current: RoomStatus,
    mut status_rx: broadcast::Receiver<RoomStatusChange>,
) -> AblyResult<()> {
    match current {
        RoomStatus::Attached(_) => Ok(()),
        RoomStatus::Attaching(_) => loop {
            match status_rx.recv().await {
                Ok(change) => {
                    if change.current.is_attached() {
                        return Ok(());
                    }
                    return Err(AblyError::room_in_invalid_state(
                        invalid_state_message(feature),
                        change.current.error().cloned(),
                    ));
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(AblyError::room_in_invalid_state(
                        invalid_state_message(feature),
                        None,
                    ));
                }
            }
        },
        _ => Err(AblyError::room_in_invalid_state(
            invalid_state_message(feature),
            None,
        )),
    }
}
