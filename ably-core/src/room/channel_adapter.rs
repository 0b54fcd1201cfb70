// The manager's view of the underlying realtime channel: a minimal,
// async-trait facade over whatever transport SDK backs it, so the
// lifecycle manager never has to know about websockets, retries, or
// protocol framing directly.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::channel::{Channel, ChannelState};
use crate::error::AblyResult;
use crate::protocol::messages::ErrorInfo;

/// A channel state-change or update event, as delivered to the room
/// lifecycle manager. Mirrors `crate::channel::StateChangeEvent` but uses
/// the `current`/`previous` naming the room layer's spec uses.
#[derive(Debug, Clone)]
pub struct ChannelStateChange {
    pub current: ChannelState,
    pub previous: ChannelState,
    pub reason: Option<ErrorInfo>,
    /// Whether continuity was preserved across whatever caused this event.
    /// Meaningful only when `current == ChannelState::Attached`.
    pub resumed: bool,
    /// `true` for a protocol UPDATE (no state transition, `current ==
    /// previous`); `false` for every genuine state change.
    pub is_update: bool,
}

/// Operation surface plus event stream the room lifecycle manager needs
/// from the underlying channel. Kept deliberately small: everything else
/// the full `Channel` type exposes (publish, presence, subscribe) belongs
/// to the feature APIs that sit above the lifecycle manager, not to it.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    async fn attach(&self) -> AblyResult<()>;
    async fn detach(&self) -> AblyResult<()>;
    async fn state(&self) -> ChannelState;
    async fn error_reason(&self) -> Option<ErrorInfo>;

    /// Subscribe to the channel's state-change/update stream. Each call
    /// returns an independent receiver; the manager keeps exactly one for
    /// its own lifetime.
    fn subscribe(&self) -> broadcast::Receiver<ChannelStateChange>;
}

/// Adapts `crate::channel::Channel` to the `ChannelAdapter` surface the
/// room lifecycle manager depends on. Bridges the channel's per-listener
/// `mpsc` fan-out onto a `broadcast` channel so the manager (and tests) can
/// subscribe independently of how many other listeners the channel has.
pub struct LiveChannelAdapter {
    channel: std::sync::Arc<Channel>,
    change_tx: broadcast::Sender<ChannelStateChange>,
}

impl LiveChannelAdapter {
    pub fn new(channel: std::sync::Arc<Channel>) -> Self {
        let (change_tx, _) = broadcast::channel(64);
        let adapter = Self { channel: channel.clone(), change_tx: change_tx.clone() };
        adapter.spawn_forwarder();
        adapter
    }

    fn spawn_forwarder(&self) {
        let channel = self.channel.clone();
        let change_tx = self.change_tx.clone();
        tokio::spawn(async move {
            let mut rx = channel.on_state_change().await;
            while let Some(event) = rx.recv().await {
                let mapped = ChannelStateChange {
                    current: event.to,
                    previous: event.from,
                    reason: event.reason,
                    resumed: event.resumed,
                    is_update: event.is_update,
                };
                // No subscribers yet (or all dropped) just means the event
                // is lost, matching broadcast's usual semantics.
                let _ = change_tx.send(mapped);
            }
        });
    }
}

#[async_trait]
impl ChannelAdapter for LiveChannelAdapter {
    async fn attach(&self) -> AblyResult<()> {
        self.channel.attach().await
    }

    async fn detach(&self) -> AblyResult<()> {
        self.channel.detach().await
    }

    async fn state(&self) -> ChannelState {
        self.channel.state().await
    }

    async fn error_reason(&self) -> Option<ErrorInfo> {
        self.channel.state_info().await.reason
    }

    fn subscribe(&self) -> broadcast::Receiver<ChannelStateChange> {
        self.change_tx.subscribe()
    }
}
