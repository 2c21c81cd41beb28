use std::time::Duration;

/// A subtitle payload as delivered by the player when the track changes.
#[derive(Debug, Clone, PartialEq)]
pub enum SubtitleEvent {
    /// Plain text. No style information, so it is always treated as dialogue.
    Plain(String),
    /// Raw ASS-style event records, one per entry, in the order the player
    /// reports them.
    Structured(Vec<String>),
}

/// The two fields of a structured record that matter to us. The remaining
/// leading fields (layer, timing, speaker, margins, effect) are skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueRecord<'a> {
    pub(crate) style: &'a str,
    pub(crate) text: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanLine {
    pub text: String,
    pub visible_chars: usize,
}

impl CleanLine {
    pub fn is_empty(&self) -> bool {
        self.visible_chars == 0
    }
}

/// A timed subtitle taken from a file, used when replaying a track offline.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub(crate) show_at: Duration,
    pub(crate) hide_at: Duration,
    pub(crate) event: SubtitleEvent,
}

impl Cue {
    pub fn show_at(&self) -> Duration {
        self.show_at
    }

    pub fn hide_at(&self) -> Duration {
        self.hide_at
    }

    pub fn event(&self) -> &SubtitleEvent {
        &self.event
    }
}
