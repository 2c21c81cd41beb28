use crate::settings::Settings;

use std::io::{BufWriter, Write};

use anyhow::{Context, Result};

/// Write `settings` as sorted `key=value` lines.
pub fn serialise<W: Write>(settings: &Settings, output: W) -> Result<()> {
    let mut writer = BufWriter::new(output);
    writer
        .write_all(to_string(settings).as_bytes())
        .context("Failed to write settings.")?;
    writer.flush().context("Failed to write settings.")?;
    Ok(())
}

pub fn to_string(settings: &Settings) -> String {
    let mut entries = vec![
        ("pause_per_char", format_number(settings.pause_per_char)),
        ("min_pause", format_number(settings.min_pause)),
        ("min_chars", format_number(settings.min_chars as f64)),
        ("min_ppc", format_number(settings.min_ppc)),
        (
            "subtitle_delay_adjustment",
            format_number(settings.subtitle_delay_adjustment),
        ),
        ("style_blacklist", settings.style_blacklist.to_string()),
    ];
    entries.sort_by_key(|(key, _)| *key);
    entries
        .iter()
        .map(|(key, value)| format!("{}={}\n", key, value))
        .collect()
}

fn format_number(value: f64) -> String {
    let formatted = format!("{:.4}", value);
    // No "-0.0000".
    if formatted.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        formatted.trim_start_matches('-').to_string()
    } else {
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    macro_rules! test_format_number {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (input, expected) = $value;

                assert_eq!(format_number(input), expected);
            }
        )*
        }
    }

    test_format_number! {
        format_number_zero: (0.0, "0.0000"),
        format_number_negative_zero: (-0.0, "0.0000"),
        format_number_tiny_negative: (-0.00001, "0.0000"),
        format_number_step: (0.065, "0.0650"),
        format_number_integer: (2.0, "2.0000"),
        format_number_negative: (-0.25, "-0.2500"),
        format_number_rounds: (0.123456, "0.1235"),
    }

    #[test]
    fn keys_are_sorted() {
        let mut buf = Cursor::new(vec![]);
        serialise(&Settings::default(), &mut buf).expect("Failed to write to buffer");
        let written = String::from_utf8(buf.into_inner()).unwrap();
        assert_eq!(
            written,
            "min_chars=2.0000\n\
             min_pause=0.5000\n\
             min_ppc=0.0100\n\
             pause_per_char=0.0600\n\
             style_blacklist=sign*,op,ed,song*,karaoke*,title*\n\
             subtitle_delay_adjustment=0.0000\n"
        );
        assert_eq!(to_string(&Settings::default()), written);
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn write_failure_is_reported() {
        let err = serialise(&Settings::default(), FullDisk).unwrap_err();
        assert_eq!(err.to_string(), "Failed to write settings.");
    }

    #[test]
    fn written_settings_load_back() {
        let settings = Settings {
            pause_per_char: 0.085,
            subtitle_delay_adjustment: -0.3,
            ..Settings::default()
        };
        assert_eq!(Settings::from_contents(&to_string(&settings)), settings);
    }
}
