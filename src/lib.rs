//! Primed listening: pause before each subtitle line, show it for a moment
//! proportional to its length, then play the line.
//!
//! [`PrimerController`] is the entry point. A host player implements
//! [`Player`], owns a controller, and forwards subtitle changes, pause
//! changes, elapsed timers and user actions to it.

pub mod controller;
pub mod duration;
pub mod error;
pub mod event;
pub mod filter;
pub mod logging;
pub mod normalizer;
pub mod parser;
pub mod player;
pub mod serialiser;
pub mod settings;
pub mod simulate;

pub use controller::{Phase, PrimerController, SkipReason, SubtitleOutcome};
pub use error::{PrimerError, Result};
pub use event::{CleanLine, Cue, SubtitleEvent};
pub use filter::{extract_dialogue_line, Blacklist, Pattern};
pub use normalizer::normalize;
pub use player::{Action, EventStream, Player, TimerId};
pub use settings::{FileSettingsStore, MemorySettingsStore, Settings, SettingsStore};
