//! What the controller needs from the media player hosting it.

use std::fmt;
use std::time::Duration;

/// Handle to a single-shot timer armed through [`Player::arm_timer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "timer#{}", self.0)
    }
}

/// Change notifications the controller subscribes to while enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventStream {
    Subtitle,
    Pause,
}

/// User-facing triggers. `Toggle` is bound by the host for the whole
/// session; the others are bound only while the controller is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Toggle,
    Acknowledge,
    Resume,
    IncreaseHold,
    DecreaseHold,
}

impl Action {
    /// Triggers that only make sense while enabled.
    pub const SCOPED: [Action; 4] = [
        Action::Acknowledge,
        Action::Resume,
        Action::IncreaseHold,
        Action::DecreaseHold,
    ];
}

/// Operations the host player provides.
///
/// Notifications are delivered by the host calling back into the
/// controller, one at a time, in the order the changes happened. None of
/// these methods may call back into the controller.
pub trait Player {
    fn is_paused(&self) -> bool;
    fn set_paused(&mut self, paused: bool);

    /// Subtitle delay in seconds.
    fn sub_delay(&self) -> f64;
    fn set_sub_delay(&mut self, seconds: f64);

    fn set_sub_visibility(&mut self, visible: bool);

    /// Arm a single-shot timer. When it elapses the host calls
    /// `PrimerController::on_timer` with the returned id.
    fn arm_timer(&mut self, after: Duration) -> TimerId;
    fn cancel_timer(&mut self, timer: TimerId);

    fn show_message(&mut self, text: &str, duration: Option<Duration>);

    fn observe(&mut self, stream: EventStream);
    fn unobserve(&mut self, stream: EventStream);

    fn bind(&mut self, action: Action);
    fn unbind(&mut self, action: Action);
}
