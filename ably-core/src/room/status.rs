// Room status model: the stable, user-visible state derived from the
// noisier channel state stream (see room::lifecycle).

use crate::protocol::messages::ErrorInfo;

/// User-visible room status. The `Attaching`/`Attached`/`Detaching`/
/// `Detached`/`Suspended`/`Failed` variants carry the error that caused
/// entry into that state, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomStatus {
    Initialized,
    Attaching(Option<ErrorInfo>),
    Attached(Option<ErrorInfo>),
    Detaching(Option<ErrorInfo>),
    Detached(Option<ErrorInfo>),
    Suspended(Option<ErrorInfo>),
    Failed(Option<ErrorInfo>),
    Releasing,
    Released,
}

impl RoomStatus {
    /// The cause error attached to this status, if any.
    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            RoomStatus::Attaching(e)
            | RoomStatus::Attached(e)
            | RoomStatus::Detaching(e)
            | RoomStatus::Detached(e)
            | RoomStatus::Suspended(e)
            | RoomStatus::Failed(e) => e.as_ref(),
            RoomStatus::Initialized | RoomStatus::Releasing | RoomStatus::Released => None,
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(self, RoomStatus::Attached(_))
    }

    pub fn is_released(&self) -> bool {
        matches!(self, RoomStatus::Released)
    }

    /// Name used in log lines and error messages; deliberately independent
    /// of the carried error so two statuses with different causes still
    /// compare equal for display purposes.
    pub fn name(&self) -> &'static str {
        match self {
            RoomStatus::Initialized => "INITIALIZED",
            RoomStatus::Attaching(_) => "ATTACHING",
            RoomStatus::Attached(_) => "ATTACHED",
            RoomStatus::Detaching(_) => "DETACHING",
            RoomStatus::Detached(_) => "DETACHED",
            RoomStatus::Suspended(_) => "SUSPENDED",
            RoomStatus::Failed(_) => "FAILED",
            RoomStatus::Releasing => "RELEASING",
            RoomStatus::Released => "RELEASED",
        }
    }
}

/// A single room-status transition, delivered on the status-change stream.
#[derive(Debug, Clone)]
pub struct RoomStatusChange {
    pub previous: RoomStatus,
    pub current: RoomStatus,
    pub error: Option<ErrorInfo>,
}

/// Tags the feature invoking the presence gate so error messages can name
/// it without the gate itself knowing about feature internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureTag {
    Messages,
    Presence,
    Typing,
    Reactions,
    Occupancy,
}

impl FeatureTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureTag::Messages => "messages",
            FeatureTag::Presence => "presence",
            FeatureTag::Typing => "typing",
            FeatureTag::Reactions => "reactions",
            FeatureTag::Occupancy => "occupancy",
        }
    }
}

impl std::fmt::Display for FeatureTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
