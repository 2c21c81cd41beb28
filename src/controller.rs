//! The pause/resume state machine.

use crate::duration::hold_duration;
use crate::event::SubtitleEvent;
use crate::filter::extract_dialogue_line;
use crate::player::{Action, EventStream, Player, TimerId};
use crate::settings::{load_settings, persist_settings, Settings, SettingsStore};

use std::time::Duration;

use tracing::{debug, info, warn};

const MESSAGE_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Disabled,
    /// Playing, waiting for the next line.
    Idle,
    /// Paused by us; the timer will resume playback.
    AutoPaused { timer: TimerId },
    /// Paused until the user resumes, whoever paused.
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    /// Already paused on a line.
    Holding,
    /// Nothing left after filtering and normalization.
    NoDialogue,
    /// Same text as the line we last paused for.
    Duplicate,
    TooShort,
    /// The computed hold is not a usable duration.
    BadHold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubtitleOutcome {
    Paused { line: String, seconds: f64 },
    Ignored(SkipReason),
}

pub struct PrimerController<P: Player, S: SettingsStore> {
    player: P,
    store: S,
    settings: Settings,
    phase: Phase,
    last_line: Option<String>,
    saved_sub_delay: Option<f64>,
}

impl<P: Player, S: SettingsStore> PrimerController<P, S> {
    /// Create a disabled controller, loading settings from `store`.
    pub fn new(player: P, mut store: S) -> Self {
        let settings = load_settings(&mut store);
        Self::with_settings(player, store, settings)
    }

    pub fn with_settings(player: P, store: S, settings: Settings) -> Self {
        Self {
            player,
            store,
            settings,
            phase: Phase::Disabled,
            last_line: None,
            saved_sub_delay: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_enabled(&self) -> bool {
        self.phase != Phase::Disabled
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn last_line(&self) -> Option<&str> {
        self.last_line.as_deref()
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn enable(&mut self) {
        if self.is_enabled() {
            return;
        }
        let delay = self.player.sub_delay();
        self.saved_sub_delay = Some(delay);
        self.player
            .set_sub_delay(delay + self.settings.subtitle_delay_adjustment);
        self.last_line = None;

        self.player.observe(EventStream::Subtitle);
        self.player.observe(EventStream::Pause);
        for action in Action::SCOPED.iter() {
            self.player.bind(*action);
        }

        if self.player.is_paused() {
            self.phase = Phase::Locked;
            self.player.set_sub_visibility(true);
        } else {
            self.phase = Phase::Idle;
            self.player.set_sub_visibility(false);
        }
        info!(phase = ?self.phase, "primed listening enabled");
        self.player
            .show_message("Primed listening: on", Some(MESSAGE_DURATION));
    }

    pub fn disable(&mut self) {
        if !self.is_enabled() {
            return;
        }
        self.cancel_timer();
        self.phase = Phase::Disabled;

        if let Some(delay) = self.saved_sub_delay.take() {
            self.player.set_sub_delay(delay);
        }
        self.player.set_sub_visibility(true);

        self.player.unobserve(EventStream::Subtitle);
        self.player.unobserve(EventStream::Pause);
        for action in Action::SCOPED.iter() {
            self.player.unbind(*action);
        }
        info!("primed listening disabled");
        self.player
            .show_message("Primed listening: off", Some(MESSAGE_DURATION));
    }

    pub fn toggle(&mut self) {
        if self.is_enabled() {
            self.disable();
        } else {
            self.enable();
        }
    }

    pub fn on_subtitle_changed(&mut self, event: &SubtitleEvent) -> SubtitleOutcome {
        match self.phase {
            Phase::Disabled => return SubtitleOutcome::Ignored(SkipReason::Disabled),
            Phase::AutoPaused { .. } | Phase::Locked => {
                return SubtitleOutcome::Ignored(SkipReason::Holding)
            }
            Phase::Idle => (),
        }

        let line = match extract_dialogue_line(event, &self.settings.style_blacklist) {
            Some(line) => line,
            None => return SubtitleOutcome::Ignored(SkipReason::NoDialogue),
        };
        if self.last_line.as_deref() == Some(line.text.as_str()) {
            debug!(line = %line.text, "suppressing repeated line");
            return SubtitleOutcome::Ignored(SkipReason::Duplicate);
        }
        let seconds = match hold_duration(line.visible_chars, &self.settings) {
            Some(seconds) => seconds,
            None => return SubtitleOutcome::Ignored(SkipReason::TooShort),
        };
        let hold = match Duration::try_from_secs_f64(seconds) {
            Ok(hold) => hold,
            Err(err) => {
                warn!(seconds, "not holding line: {}", err);
                return SubtitleOutcome::Ignored(SkipReason::BadHold);
            }
        };

        self.player.set_sub_visibility(true);
        self.player.set_paused(true);
        let timer = self.arm_timer(hold);
        self.phase = Phase::AutoPaused { timer };
        debug!(%timer, seconds, chars = line.visible_chars, "holding line");

        self.last_line = Some(line.text.clone());
        SubtitleOutcome::Paused {
            line: line.text,
            seconds,
        }
    }

    /// Pause flag changed in the player, whether we or the user caused it.
    pub fn on_pause_changed(&mut self, paused: bool) {
        match (self.phase, paused) {
            (Phase::Disabled, _) => (),
            (Phase::Idle, true) => {
                debug!("external pause, locking");
                self.phase = Phase::Locked;
                self.player.set_sub_visibility(true);
            }
            (Phase::AutoPaused { .. }, true) | (Phase::Locked, true) => (),
            (_, false) => {
                self.cancel_timer();
                self.phase = Phase::Idle;
                self.player.set_sub_visibility(false);
            }
        }
    }

    /// A timer armed through the player elapsed. Only the timer of the
    /// current hold resumes playback; anything else is stale.
    pub fn on_timer(&mut self, fired: TimerId) {
        match self.phase {
            Phase::AutoPaused { timer } if timer == fired => {
                debug!(%timer, "hold elapsed");
                self.release();
            }
            _ => debug!(%fired, phase = ?self.phase, "ignoring stale timer"),
        }
    }

    /// Turn the running hold into an indefinite one.
    pub fn acknowledge(&mut self) {
        if let Phase::AutoPaused { timer } = self.phase {
            self.player.cancel_timer(timer);
            self.phase = Phase::Locked;
            debug!("hold locked");
            self.player
                .show_message("Holding: resume to continue", Some(MESSAGE_DURATION));
        }
    }

    pub fn resume(&mut self) {
        match self.phase {
            Phase::AutoPaused { timer } => {
                self.player.cancel_timer(timer);
                self.release();
            }
            Phase::Locked => self.release(),
            Phase::Disabled | Phase::Idle => (),
        }
    }

    pub fn increase_hold(&mut self) {
        let value = self.settings.increase_hold();
        self.hold_changed(value);
    }

    pub fn decrease_hold(&mut self) {
        let value = self.settings.decrease_hold();
        self.hold_changed(value);
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Toggle => self.toggle(),
            Action::Acknowledge => self.acknowledge(),
            Action::Resume => self.resume(),
            Action::IncreaseHold => self.increase_hold(),
            Action::DecreaseHold => self.decrease_hold(),
        }
    }

    fn hold_changed(&mut self, pause_per_char: f64) {
        info!(pause_per_char, "hold per character changed");
        persist_settings(&mut self.store, &self.settings);
        self.player.show_message(
            &format!("Hold per character: {:.3}s", pause_per_char),
            Some(MESSAGE_DURATION),
        );
    }

    fn release(&mut self) {
        self.phase = Phase::Idle;
        self.player.set_sub_visibility(false);
        self.player.set_paused(false);
    }

    fn arm_timer(&mut self, after: Duration) -> TimerId {
        self.cancel_timer();
        self.player.arm_timer(after)
    }

    fn cancel_timer(&mut self) {
        if let Phase::AutoPaused { timer } = self.phase {
            self.player.cancel_timer(timer);
            self.phase = Phase::Idle;
        }
    }
}
