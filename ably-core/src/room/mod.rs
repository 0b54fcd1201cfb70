//! Room lifecycle management: coordinates ATTACH/DETACH/RELEASE against a
//! single underlying realtime channel, derives a stable room status from
//! the channel's noisier event stream, gates presence-style operations on
//! reaching `Attached`, and surfaces continuity gaps as discontinuities.

pub mod channel_adapter;
pub mod clock;
pub mod discontinuity;
pub mod lifecycle;
pub mod operation;
pub mod presence_gate;
pub mod status;

pub use channel_adapter::{ChannelAdapter, ChannelStateChange, LiveChannelAdapter};
pub use clock::{Clock, TokioClock};
pub use lifecycle::{Room, RoomLifecycleOptions};
pub use operation::{OperationKind, SharedOperationSerialiser};
pub use status::{FeatureTag, RoomStatus, RoomStatusChange};
