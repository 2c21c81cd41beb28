//! Tunable parameters and their `key=value` persistence.

use crate::error::{PrimerError, Result};
use crate::filter::Blacklist;
use crate::parser::setting_line;
use crate::serialiser;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Amount one press of the adjust actions changes `pause_per_char` by.
pub const HOLD_STEP: f64 = 0.005;

pub const DEFAULT_BLACKLIST: &str = "sign*,op,ed,song*,karaoke*,title*";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Seconds of hold per visible character.
    pub pause_per_char: f64,
    /// Shortest hold, in seconds.
    pub min_pause: f64,
    /// Lines with fewer visible characters never pause.
    pub min_chars: usize,
    /// Floor for `pause_per_char`.
    pub min_ppc: f64,
    /// Seconds added to the player's subtitle delay while enabled.
    pub subtitle_delay_adjustment: f64,
    pub style_blacklist: Blacklist,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pause_per_char: 0.06,
            min_pause: 0.5,
            min_chars: 2,
            min_ppc: 0.01,
            subtitle_delay_adjustment: 0.0,
            style_blacklist: Blacklist::parse(DEFAULT_BLACKLIST),
        }
    }
}

impl Settings {
    /// Build settings from the persisted representation. Missing keys keep
    /// their defaults; unknown keys, comments and malformed lines are skipped.
    pub fn from_contents(contents: &str) -> Self {
        let mut settings = Settings::default();
        for line in contents.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match setting_line(trimmed) {
                Some((key, value)) => match settings.apply(key, value) {
                    Ok(true) => (),
                    Ok(false) => debug!(key, "ignoring unknown setting"),
                    Err(err) => warn!("{}", err),
                },
                None => warn!(line = trimmed, "skipping malformed settings line"),
            }
        }
        settings.pause_per_char = settings.pause_per_char.max(settings.min_ppc);
        settings
    }

    /// Set one value from its textual form. Returns `Ok(false)` for keys
    /// this version does not know about.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<bool> {
        let invalid = || PrimerError::InvalidSetting {
            key: key.to_string(),
            value: value.to_string(),
        };
        let number = || -> Result<f64> {
            value
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(invalid)
        };
        let non_negative = || number().ok().filter(|n| *n >= 0.0).ok_or_else(invalid);
        match key {
            "pause_per_char" => self.pause_per_char = non_negative()?,
            "min_pause" => self.min_pause = non_negative()?,
            "min_ppc" => self.min_ppc = non_negative()?,
            "subtitle_delay_adjustment" => self.subtitle_delay_adjustment = number()?,
            "min_chars" => self.min_chars = non_negative()?.round() as usize,
            "style_blacklist" => self.style_blacklist = Blacklist::parse(value),
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Lengthen the hold by one step. Returns the new value.
    pub fn increase_hold(&mut self) -> f64 {
        self.pause_per_char = round_setting(self.pause_per_char + HOLD_STEP);
        self.pause_per_char
    }

    /// Shorten the hold by one step, never going below `min_ppc`. Returns the
    /// new value.
    pub fn decrease_hold(&mut self) -> f64 {
        self.pause_per_char = round_setting(self.pause_per_char - HOLD_STEP).max(self.min_ppc);
        self.pause_per_char
    }
}

// Same precision as the persisted form.
fn round_setting(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

pub trait SettingsStore {
    /// The stored contents, or `None` when nothing has been stored yet.
    fn read(&self) -> Result<Option<String>>;
    fn write(&mut self, contents: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SettingsStore for FileSettingsStore {
    fn read(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    contents: Option<String>,
    writes: usize,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: &str) -> Self {
        Self {
            contents: Some(contents.to_string()),
            writes: 0,
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SettingsStore for MemorySettingsStore {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.contents.clone())
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        self.contents = Some(contents.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// Load settings and write them straight back so missing keys get filled in.
pub fn load_settings<S: SettingsStore>(store: &mut S) -> Settings {
    let settings = match store.read() {
        Ok(Some(contents)) => Settings::from_contents(&contents),
        Ok(None) => {
            debug!("no stored settings, using defaults");
            Settings::default()
        }
        Err(err) => {
            warn!("Failed to read settings, using defaults: {}", err);
            Settings::default()
        }
    };
    persist_settings(store, &settings);
    settings
}

pub fn save_settings<S: SettingsStore>(store: &mut S, settings: &Settings) -> Result<()> {
    store.write(&serialiser::to_string(settings))
}

/// Like [`save_settings`], but a failure is only logged.
pub fn persist_settings<S: SettingsStore>(store: &mut S, settings: &Settings) {
    if let Err(err) = save_settings(store, settings) {
        warn!("Failed to save settings: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Pattern;

    struct BrokenStore;

    impl SettingsStore for BrokenStore {
        fn read(&self) -> Result<Option<String>> {
            Err(std::io::Error::new(ErrorKind::PermissionDenied, "denied").into())
        }

        fn write(&mut self, _contents: &str) -> Result<()> {
            Err(std::io::Error::new(ErrorKind::PermissionDenied, "denied").into())
        }
    }

    #[test]
    fn missing_keys_use_defaults() {
        let settings = Settings::from_contents("min_pause=1.2500\n");
        assert_eq!(settings.min_pause, 1.25);
        assert_eq!(settings.pause_per_char, Settings::default().pause_per_char);
        assert_eq!(settings.style_blacklist, Settings::default().style_blacklist);
    }

    #[test]
    fn unknown_and_malformed_lines_are_skipped() {
        let settings = Settings::from_contents(
            "# comment\n\nfuture_key=7\nnot a setting\nmin_chars=abc\nmin_chars=4.0000\n",
        );
        assert_eq!(settings.min_chars, 4);
    }

    #[test]
    fn blacklist_is_parsed() {
        let settings = Settings::from_contents("style_blacklist=Sign, OP*\n");
        assert_eq!(
            settings.style_blacklist.patterns(),
            &[
                Pattern::Word("sign".to_string()),
                Pattern::Wildcard("op*".to_string())
            ]
        );
        let empty = Settings::from_contents("style_blacklist=\n");
        assert!(empty.style_blacklist.patterns().is_empty());
    }

    #[test]
    fn pause_per_char_respects_floor_on_load() {
        let settings = Settings::from_contents("pause_per_char=0.0010\nmin_ppc=0.0200\n");
        assert_eq!(settings.pause_per_char, 0.02);
    }

    macro_rules! test_rejected_value {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (key, value) = $value;

                let mut settings = Settings::default();
                assert!(settings.apply(key, value).is_err());
                assert_eq!(settings, Settings::default());

                let loaded = Settings::from_contents(&format!("{}={}\n", key, value));
                assert_eq!(loaded, Settings::default());
            }
        )*
        }
    }

    test_rejected_value! {
        rejects_negative_pause_per_char: ("pause_per_char", "-1"),
        rejects_negative_min_pause: ("min_pause", "-0.5000"),
        rejects_negative_min_ppc: ("min_ppc", "-1"),
        rejects_negative_min_chars: ("min_chars", "-1"),
        rejects_nan_min_pause: ("min_pause", "NaN"),
        rejects_infinite_pause_per_char: ("pause_per_char", "inf"),
        rejects_text_min_ppc: ("min_ppc", "fast"),
    }

    #[test]
    fn negative_values_keep_defaults_on_load() {
        let settings =
            Settings::from_contents("min_ppc=-1\npause_per_char=-1\nmin_pause=-1\nmin_chars=3\n");
        assert_eq!(settings.min_ppc, 0.01);
        assert_eq!(settings.pause_per_char, 0.06);
        assert_eq!(settings.min_pause, 0.5);
        assert_eq!(settings.min_chars, 3);
    }

    #[test]
    fn huge_pause_per_char_loads() {
        let settings = Settings::from_contents("pause_per_char=1e30\n");
        assert_eq!(settings.pause_per_char, 1e30);
    }

    #[test]
    fn delay_adjustment_may_be_negative() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.apply("subtitle_delay_adjustment", "-0.2500"),
            Ok(true)
        ));
        assert_eq!(settings.subtitle_delay_adjustment, -0.25);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut settings = Settings::default();
        assert!(settings.apply("min_pause", "NaN").is_err());
        assert!(settings.apply("min_chars", "-1").is_err());
        assert!(matches!(settings.apply("whatever", "1"), Ok(false)));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn adjustments_step_and_clamp() {
        let mut settings = Settings {
            pause_per_char: 0.02,
            min_ppc: 0.01,
            ..Settings::default()
        };
        assert_eq!(settings.increase_hold(), 0.025);
        assert_eq!(settings.decrease_hold(), 0.02);
        assert_eq!(settings.decrease_hold(), 0.015);
        assert_eq!(settings.decrease_hold(), 0.01);
        assert_eq!(settings.decrease_hold(), 0.01);
    }

    #[test]
    fn load_backfills_store() {
        let mut store = MemorySettingsStore::with_contents("min_pause=0.7500\nold_key=1\n");
        let settings = load_settings(&mut store);
        assert_eq!(settings.min_pause, 0.75);
        assert_eq!(store.writes(), 1);
        let contents = store.contents().unwrap();
        assert!(contents.contains("min_pause=0.7500\n"));
        assert!(contents.contains("pause_per_char=0.0600\n"));
        assert!(!contents.contains("old_key"));
    }

    #[test]
    fn broken_store_falls_back_to_defaults() {
        let settings = load_settings(&mut BrokenStore);
        assert_eq!(settings, Settings::default());
        assert!(save_settings(&mut BrokenStore, &settings).is_err());
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subprime.conf");
        let mut store = FileSettingsStore::new(&path);
        assert_eq!(store.read().unwrap(), None);

        let settings = load_settings(&mut store);
        assert_eq!(settings, Settings::default());
        assert!(path.exists());

        std::fs::write(&path, "pause_per_char=0.0800\n").unwrap();
        let settings = load_settings(&mut store);
        assert_eq!(settings.pause_per_char, 0.08);
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("min_chars=2.0000\n"));
    }
}
