use crate::bus::ControlAction;
use serde::{Deserialize, Serialize};

/// Inputs to the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionEvent {
    Start,
    Pause,
    Resume,
    Stop,
    /// The recording surface went away
    SurfaceClosed,
}

impl SessionEvent {
    /// Action to forward to recording pages once this event takes effect
    pub fn control_action(self) -> Option<ControlAction> {
        match self {
            SessionEvent::Start => Some(ControlAction::Start),
            SessionEvent::Pause => Some(ControlAction::Pause),
            SessionEvent::Resume => Some(ControlAction::Resume),
            SessionEvent::Stop => Some(ControlAction::Stop),
            SessionEvent::SurfaceClosed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_closed_forwards_nothing() {
        assert_eq!(SessionEvent::SurfaceClosed.control_action(), None);
        assert_eq!(
            SessionEvent::Resume.control_action(),
            Some(ControlAction::Resume)
        );
    }
}
