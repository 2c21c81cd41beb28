use crate::settings::Settings;

/// Seconds to hold a line of `visible_chars` characters on screen, or `None`
/// when the line is too short to be worth a pause.
pub fn hold_duration(visible_chars: usize, settings: &Settings) -> Option<f64> {
    if visible_chars < settings.min_chars {
        return None;
    }
    Some(settings.min_pause.max(visible_chars as f64 * settings.pause_per_char))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pause_per_char: f64, min_pause: f64, min_chars: usize) -> Settings {
        Settings {
            pause_per_char,
            min_pause,
            min_chars,
            ..Settings::default()
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn scales_with_length() {
        let s = settings(0.06, 0.5, 2);
        assert!(approx(hold_duration(10, &s).unwrap(), 0.6));
        assert!(approx(hold_duration(100, &s).unwrap(), 6.0));
    }

    #[test]
    fn short_lines_hit_the_floor() {
        let s = settings(0.06, 0.5, 2);
        assert!(approx(hold_duration(2, &s).unwrap(), 0.5));
        assert!(approx(hold_duration(8, &s).unwrap(), 0.5));
    }

    #[test]
    fn below_min_chars_never_holds() {
        for ppc in [0.01, 0.06, 10.0].iter() {
            let s = settings(*ppc, 0.5, 2);
            assert_eq!(hold_duration(0, &s), None);
            assert_eq!(hold_duration(1, &s), None);
        }
    }

    #[test]
    fn monotonic_and_floored() {
        let s = settings(0.06, 0.5, 2);
        let mut previous = 0.0;
        for chars in 2..200 {
            let hold = hold_duration(chars, &s).unwrap();
            assert!(hold >= s.min_pause);
            assert!(hold >= previous);
            previous = hold;
        }

        let slower = settings(0.08, 0.5, 2);
        for chars in 2..200 {
            assert!(hold_duration(chars, &slower).unwrap() >= hold_duration(chars, &s).unwrap());
        }
    }
}
