// Discontinuity detection: a pure function of an incoming channel event
// plus the two flags the lifecycle manager tracks, kept free of any I/O
// or locking so it's trivially testable in isolation.

use crate::protocol::messages::ErrorInfo;
use crate::room::channel_adapter::ChannelStateChange;

/// Evaluates whether `change` represents a discontinuity: a gap in
/// message/presence continuity the client cannot paper over. Returns the
/// `ErrorInfo` to surface on the discontinuity stream when it does.
///
/// A discontinuity is raised iff all of:
/// 1. `change` is an UPDATE, or a transition into `Attached`.
/// 2. `change.resumed == false`.
/// 3. `has_attached_once == true` (otherwise this is the first attach).
/// 4. `is_explicitly_detached == false` (otherwise the gap was intended).
pub fn detect(
    change: &ChannelStateChange,
    has_attached_once: bool,
    is_explicitly_detached: bool,
) -> Option<ErrorInfo> {
    use crate::channel::ChannelState;

    let is_attach_or_update = change.is_update || change.current == ChannelState::Attached;
    if !is_attach_or_update {
        return None;
    }
    if change.resumed {
        return None;
    }
    if !has_attached_once || is_explicitly_detached {
        return None;
    }

    Some(change.reason.clone().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelState;

    fn change(current: ChannelState, resumed: bool, is_update: bool, reason: Option<ErrorInfo>) -> ChannelStateChange {
        ChannelStateChange {
            current,
            previous: ChannelState::Attached,
            reason,
            resumed,
            is_update,
        }
    }

    #[test]
    fn emits_on_unresumed_attached_after_prior_attach() {
        let reason = ErrorInfo { code: 50000, ..Default::default() };
        let c = change(ChannelState::Attached, false, false, Some(reason.clone()));
        assert_eq!(detect(&c, true, false), Some(reason));
    }

    #[test]
    fn emits_on_unresumed_update() {
        let c = change(ChannelState::Attached, false, true, None);
        assert_eq!(detect(&c, true, false), Some(ErrorInfo::default()));
    }

    #[test]
    fn suppressed_when_resumed() {
        let c = change(ChannelState::Attached, true, false, None);
        assert_eq!(detect(&c, true, false), None);
    }

    #[test]
    fn suppressed_before_first_attach() {
        let c = change(ChannelState::Attached, false, false, None);
        assert_eq!(detect(&c, false, false), None);
    }

    #[test]
    fn suppressed_after_explicit_detach() {
        let c = change(ChannelState::Attached, false, false, None);
        assert_eq!(detect(&c, true, true), None);
    }

    #[test]
    fn ignored_for_non_attached_non_update_transitions() {
        let c = change(ChannelState::Suspended, false, false, None);
        assert_eq!(detect(&c, true, false), None);
    }
}
