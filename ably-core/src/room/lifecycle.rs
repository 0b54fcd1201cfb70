// Room lifecycle manager: serialises ATTACH/DETACH/RELEASE against the
// underlying channel, derives room status from the channel's noisier
// state stream, and gates presence operations on reaching ATTACHED.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

use crate::channel::ChannelState;
use crate::error::{AblyError, AblyResult};
use crate::protocol::messages::ErrorInfo;
use crate::room::channel_adapter::{ChannelAdapter, ChannelStateChange};
use crate::room::clock::Clock;
use crate::room::discontinuity;
use crate::room::operation::{OperationKind, OperationSerialiser};
use crate::room::presence_gate;
use crate::room::status::{FeatureTag, RoomStatus, RoomStatusChange};

/// Configuration for the lifecycle manager. Currently just the RELEASE
/// retry pacing; see DESIGN.md for why the retry loop itself has no cap.
#[derive(Debug, Clone, Copy)]
pub struct RoomLifecycleOptions {
    pub release_retry_interval: Duration,
}

impl Default for RoomLifecycleOptions {
    fn default() -> Self {
        Self {
            release_retry_interval: Duration::from_millis(250),
        }
    }
}

struct RoomState {
    status: RoomStatus,
    has_attached_once: bool,
    is_explicitly_detached: bool,
}

/// The Room Lifecycle Manager. One instance per room; owns the single
/// underlying channel's attach/detach lifecycle.
pub struct Room {
    channel: Arc<dyn ChannelAdapter>,
    clock: Arc<dyn Clock>,
    options: RoomLifecycleOptions,
    serialiser: OperationSerialiser,
    state: Mutex<RoomState>,
    status_tx: broadcast::Sender<RoomStatusChange>,
    discontinuity_tx: broadcast::Sender<ErrorInfo>,
}

impl Room {
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        clock: Arc<dyn Clock>,
        options: RoomLifecycleOptions,
    ) -> Arc<Self> {
        let (status_tx, _) = broadcast::channel(64);
        let (discontinuity_tx, _) = broadcast::channel(64);

        let room = Arc::new(Self {
            channel,
            clock,
            options,
            serialiser: OperationSerialiser::new(),
            state: Mutex::new(RoomState {
                status: RoomStatus::Initialized,
                has_attached_once: false,
                is_explicitly_detached: false,
            }),
            status_tx,
            discontinuity_tx,
        });

        Room::spawn_channel_event_handler(room.clone());
        room
    }

    fn spawn_channel_event_handler(room: Arc<Self>) {
        let mut rx = room.channel.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) => room.handle_channel_event(change).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("room channel event handler lagged, skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    async fn handle_channel_event(&self, change: ChannelStateChange) {
        let (has_attached_once, is_explicitly_detached) = {
            let state = self.state.lock().await;
            (state.has_attached_once, state.is_explicitly_detached)
        };

        if let Some(reason) = discontinuity::detect(&change, has_attached_once, is_explicitly_detached) {
            info!("room discontinuity detected: {:?}", reason);
            let _ = self.discontinuity_tx.send(reason);
        }

        if change.is_update {
            return;
        }

        if self.serialiser.is_active() {
            // A lifecycle operation owns the status right now; its own
            // body will write the authoritative post-condition.
            return;
        }

        let new_status = Self::room_status_for_channel_state(change.current, change.reason);
        self.set_status(new_status).await;
    }

    fn room_status_for_channel_state(state: ChannelState, reason: Option<ErrorInfo>) -> RoomStatus {
        match state {
            ChannelState::Initialized => RoomStatus::Initialized,
            ChannelState::Attaching => RoomStatus::Attaching(reason),
            ChannelState::Attached => RoomStatus::Attached(reason),
            ChannelState::Detaching => RoomStatus::Detaching(reason),
            ChannelState::Detached => RoomStatus::Detached(reason),
            ChannelState::Suspended => RoomStatus::Suspended(reason),
            ChannelState::Failed => RoomStatus::Failed(reason),
        }
    }

    fn error_info_from(err: &AblyError) -> ErrorInfo {
        ErrorInfo {
            code: err.code().map(|c| c.as_u16()).unwrap_or(50000),
            message: Some(err.to_string()),
            ..Default::default()
        }
    }

    /// Applies `new_status`, emitting a status-change event iff it's an
    /// actual change (invariant: never emit a spurious same-status event).
    async fn set_status(&self, new_status: RoomStatus) {
        let mut state = self.state.lock().await;
        if state.status == new_status {
            return;
        }
        let previous = std::mem::replace(&mut state.status, new_status.clone());
        drop(state);

        info!("room status transition: {} -> {}", previous.name(), new_status.name());
        let change = RoomStatusChange {
            previous,
            current: new_status.clone(),
            error: new_status.error().cloned(),
        };
        let _ = self.status_tx.send(change);
    }

    pub async fn status(&self) -> RoomStatus {
        self.state.lock().await.status.clone()
    }

    pub async fn error(&self) -> Option<ErrorInfo> {
        self.state.lock().await.status.error().cloned()
    }

    pub fn on_status_change(&self) -> broadcast::Receiver<RoomStatusChange> {
        self.status_tx.subscribe()
    }

    pub fn on_discontinuity(&self) -> broadcast::Receiver<ErrorInfo> {
        self.discontinuity_tx.subscribe()
    }

    pub async fn wait_to_be_able_to_perform_presence_operations(
        &self,
        feature: FeatureTag,
    ) -> AblyResult<()> {
        // Snapshot status and subscribe under the same lock so no status
        // change between the two is missed or double-observed.
        let (current, rx) = {
            let state = self.state.lock().await;
            (state.status.clone(), self.status_tx.subscribe())
        };
        presence_gate::wait_to_be_able_to_perform_presence_operations(feature, current, rx).await
    }

    pub async fn attach(&self) -> AblyResult<()> {
        self.serialiser
            .run(OperationKind::Attach, || self.attach_body())
            .await
    }

    async fn attach_body(&self) -> AblyResult<()> {
        let current = self.status().await;
        match current {
            RoomStatus::Attached(_) => return Ok(()),
            RoomStatus::Releasing | RoomStatus::Released => {
                return Err(AblyError::room_in_invalid_state(
                    format!("cannot attach a room in {} status", current.name()),
                    None,
                ));
            }
            _ => {}
        }

        self.set_status(RoomStatus::Attaching(None)).await;

        match self.channel.attach().await {
            Ok(()) => {
                let mut state = self.state.lock().await;
                state.is_explicitly_detached = false;
                state.has_attached_once = true;
                drop(state);
                self.set_status(RoomStatus::Attached(None)).await;
                Ok(())
            }
            Err(err) => {
                let channel_state = self.channel.state().await;
                let reason = self
                    .channel
                    .error_reason()
                    .await
                    .unwrap_or_else(|| Self::error_info_from(&err));
                error!("attach failed: {:?}", reason);
                self.set_status(Self::room_status_for_channel_state(channel_state, Some(reason)))
                    .await;
                Err(err)
            }
        }
    }

    pub async fn detach(&self) -> AblyResult<()> {
        self.serialiser
            .run(OperationKind::Detach, || self.detach_body())
            .await
    }

    async fn detach_body(&self) -> AblyResult<()> {
        let current = self.status().await;
        match current {
            RoomStatus::Detached(_) => return Ok(()),
            RoomStatus::Releasing | RoomStatus::Released | RoomStatus::Failed(_) => {
                return Err(AblyError::room_in_invalid_state(
                    format!("cannot detach a room in {} status", current.name()),
                    None,
                ));
            }
            _ => {}
        }

        self.set_status(RoomStatus::Detaching(None)).await;

        match self.channel.detach().await {
            Ok(()) => {
                let mut state = self.state.lock().await;
                state.is_explicitly_detached = true;
                drop(state);
                self.set_status(RoomStatus::Detached(None)).await;
                Ok(())
            }
            Err(err) => {
                let channel_state = self.channel.state().await;
                let reason = self
                    .channel
                    .error_reason()
                    .await
                    .unwrap_or_else(|| Self::error_info_from(&err));
                error!("detach failed: {:?}", reason);
                self.set_status(Self::room_status_for_channel_state(channel_state, Some(reason)))
                    .await;
                Err(err)
            }
        }
    }

    pub async fn release(&self) {
        self.serialiser
            .run(OperationKind::Release, || self.release_body())
            .await
    }

    async fn release_body(&self) {
        let current = self.status().await;
        if current.is_released() {
            return;
        }
        if matches!(current, RoomStatus::Detached(_) | RoomStatus::Initialized) {
            self.set_status(RoomStatus::Released).await;
            return;
        }

        self.set_status(RoomStatus::Releasing).await;

        if self.channel.state().await != ChannelState::Failed {
            loop {
                match self.channel.detach().await {
                    Ok(()) => break,
                    Err(_) => {
                        if self.channel.state().await == ChannelState::Failed {
                            break;
                        }
                        warn!(
                            "release detach attempt failed, retrying in {:?}",
                            self.options.release_retry_interval
                        );
                        self.clock.sleep(self.options.release_retry_interval).await;
                    }
                }
            }
        }

        self.set_status(RoomStatus::Released).await;
    }
}
