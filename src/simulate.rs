//! An in-process player with a virtual clock.

use crate::controller::{PrimerController, SubtitleOutcome};
use crate::event::Cue;
use crate::player::{Action, EventStream, Player, TimerId};
use crate::settings::SettingsStore;

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use tracing::{trace, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetPaused(bool),
    SetSubDelay(f64),
    SetSubVisibility(bool),
    ArmTimer(TimerId, Duration),
    CancelTimer(TimerId),
    ShowMessage(String),
    Observe(EventStream),
    Unobserve(EventStream),
    Bind(Action),
    Unbind(Action),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    Pause(bool),
}

#[derive(Debug, Default)]
pub struct SimulatedPlayer {
    paused: bool,
    sub_delay: f64,
    sub_visible: bool,
    clock: Duration,
    next_timer: u64,
    timers: Vec<(TimerId, Duration, Duration)>,
    observed: HashSet<EventStream>,
    bound: HashSet<Action>,
    notifications: VecDeque<Notification>,
    commands: Vec<Command>,
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        Self {
            sub_visible: true,
            ..Self::default()
        }
    }

    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    pub fn with_sub_delay(mut self, seconds: f64) -> Self {
        self.sub_delay = seconds;
        self
    }

    pub fn sub_visible(&self) -> bool {
        self.sub_visible
    }

    /// Wall-clock time spent in the simulation, holds included.
    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn is_observing(&self, stream: EventStream) -> bool {
        self.observed.contains(&stream)
    }

    pub fn is_bound(&self, action: Action) -> bool {
        self.bound.contains(&action)
    }

    pub fn armed_timers(&self) -> usize {
        self.timers.len()
    }

    /// The delay a still-armed timer was created with.
    pub fn timer_delay(&self, timer: TimerId) -> Option<Duration> {
        self.timers
            .iter()
            .find(|(id, _, _)| *id == timer)
            .map(|(_, delay, _)| *delay)
    }

    /// Advance the clock to the earliest armed timer and disarm it. The
    /// caller hands the id to the controller.
    pub fn fire_next_timer(&mut self) -> Option<TimerId> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .min_by_key(|(_, (_, _, deadline))| *deadline)
            .map(|(i, _)| i)?;
        let (id, _, deadline) = self.timers.remove(index);
        self.clock = self.clock.max(deadline);
        trace!(%id, clock = ?self.clock, "timer fired");
        Some(id)
    }

    /// Pause or unpause as if the user pressed the player's own key.
    pub fn user_set_paused(&mut self, paused: bool) {
        self.change_pause(paused);
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    pub fn advance_to(&mut self, clock: Duration) {
        self.clock = self.clock.max(clock);
    }

    fn change_pause(&mut self, paused: bool) {
        if self.paused != paused {
            self.paused = paused;
            if self.is_observing(EventStream::Pause) {
                self.notifications.push_back(Notification::Pause(paused));
            }
        }
    }
}

impl Player for SimulatedPlayer {
    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_paused(&mut self, paused: bool) {
        self.commands.push(Command::SetPaused(paused));
        self.change_pause(paused);
    }

    fn sub_delay(&self) -> f64 {
        self.sub_delay
    }

    fn set_sub_delay(&mut self, seconds: f64) {
        self.commands.push(Command::SetSubDelay(seconds));
        self.sub_delay = seconds;
    }

    fn set_sub_visibility(&mut self, visible: bool) {
        self.commands.push(Command::SetSubVisibility(visible));
        self.sub_visible = visible;
    }

    fn arm_timer(&mut self, after: Duration) -> TimerId {
        self.next_timer += 1;
        let id = TimerId(self.next_timer);
        self.commands.push(Command::ArmTimer(id, after));
        self.timers.push((id, after, self.clock.saturating_add(after)));
        id
    }

    fn cancel_timer(&mut self, timer: TimerId) {
        self.commands.push(Command::CancelTimer(timer));
        self.timers.retain(|(id, _, _)| *id != timer);
    }

    fn show_message(&mut self, text: &str, _duration: Option<Duration>) {
        self.commands.push(Command::ShowMessage(text.to_string()));
    }

    fn observe(&mut self, stream: EventStream) {
        self.commands.push(Command::Observe(stream));
        self.observed.insert(stream);
    }

    fn unobserve(&mut self, stream: EventStream) {
        self.commands.push(Command::Unobserve(stream));
        self.observed.remove(&stream);
    }

    fn bind(&mut self, action: Action) {
        self.commands.push(Command::Bind(action));
        self.bound.insert(action);
    }

    fn unbind(&mut self, action: Action) {
        self.commands.push(Command::Unbind(action));
        self.bound.remove(&action);
    }
}

/// Deliver queued player notifications to the controller, in order.
pub fn dispatch_notifications<S: SettingsStore>(
    ctl: &mut PrimerController<SimulatedPlayer, S>,
) {
    for notification in ctl.player_mut().take_notifications() {
        match notification {
            Notification::Pause(paused) => ctl.on_pause_changed(paused),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CueReport {
    pub show_at: Duration,
    pub hide_at: Duration,
    pub outcome: SubtitleOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub cues: Vec<CueReport>,
    pub pauses: usize,
    pub total_hold: Duration,
}

/// Play `cues` through the controller, letting every hold run out.
///
/// The controller is enabled first if it is not already.
pub fn replay<S: SettingsStore>(
    ctl: &mut PrimerController<SimulatedPlayer, S>,
    cues: &[Cue],
) -> Report {
    ctl.enable();
    dispatch_notifications(ctl);

    let mut report = Report::default();
    for cue in cues {
        let held = report.total_hold;
        ctl.player_mut().advance_to(cue.show_at().saturating_add(held));
        let outcome = ctl.on_subtitle_changed(cue.event());
        dispatch_notifications(ctl);

        if let SubtitleOutcome::Paused { seconds, .. } = &outcome {
            report.pauses += 1;
            match Duration::try_from_secs_f64(*seconds) {
                Ok(hold) => report.total_hold = report.total_hold.saturating_add(hold),
                Err(err) => warn!(seconds = *seconds, "hold left out of the total: {}", err),
            }
            if let Some(timer) = ctl.player_mut().fire_next_timer() {
                ctl.on_timer(timer);
                dispatch_notifications(ctl);
            }
        }
        report.cues.push(CueReport {
            show_at: cue.show_at(),
            hide_at: cue.hide_at(),
            outcome,
        });
    }
    report
}
