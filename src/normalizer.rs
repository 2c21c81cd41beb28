//! Turns a raw subtitle payload into display text and a character count.

use crate::event::CleanLine;

use std::sync::LazyLock;

use regex::Regex;

// `{\i1}`, `\{\an8\}`. An unclosed `{` stays literal.
static OVERRIDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\?\{[^}]*\}").expect("override pattern is valid"));

// Hard line breaks and hard spaces.
static ESCAPES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\[Nnh]").expect("escape pattern is valid"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Strip markup from `raw` and count the characters a viewer would read.
pub fn normalize(raw: &str) -> CleanLine {
    // Escapes last: stripping `\{x}` from `\\{x}N` leaves a `\N` behind.
    let stripped = OVERRIDE.replace_all(raw, "");
    let unescaped = ESCAPES.replace_all(&stripped, " ");
    let text = WHITESPACE.replace_all(&unescaped, " ").trim().to_string();
    let visible_chars = count_visible(&text);
    CleanLine {
        text,
        visible_chars,
    }
}

pub fn count_visible(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_normalize {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (input, text, count) = $value;

                let line = normalize(input);

                assert_eq!(line.text, text);
                assert_eq!(line.visible_chars, count);
            }
        )*
        }
    }

    test_normalize! {
        normalize_plain: ("Hello world", "Hello world", 10),
        normalize_empty: ("", "", 0),
        normalize_only_markup: ("{\\i1}{\\b1}", "", 0),
        normalize_inline_tags: ("{\\i1}Hello{\\i0} there", "Hello there", 10),
        normalize_escaped_tag: ("\\{\\an8\\}Top line", "Top line", 7),
        normalize_hard_break: ("first\\Nsecond", "first second", 11),
        normalize_soft_break_and_hard_space: ("a\\nb\\hc", "a b c", 3),
        normalize_newlines: ("  line one\n\n line two  ", "line one line two", 14),
        normalize_unterminated: ("{\\i1 never closed", "{\\i1 never closed", 15),
        normalize_multibyte: ("こんにちは 世界", "こんにちは 世界", 7),
        normalize_accents: ("{\\fs20}Ça va très bien", "Ça va très bien", 12),
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            "{\\i1}Hello{\\i0}, world",
            "\\\\{x}N",
            "\\{x}N",
            "{{a}}b",
            "{a{b}c}",
            "one\\N\\Ntwo\n\tthree",
            "trailing {",
            "\\\\NN",
            "   ",
            "日本語{\\c&H00FF00&}テキスト",
        ];
        for input in inputs.iter() {
            let once = normalize(input);
            let twice = normalize(&once.text);
            assert_eq!(once, twice, "input: {:?}", input);
        }
    }

    #[test]
    fn count_ignores_all_whitespace() {
        assert_eq!(count_visible(" a \t b\n c "), 3);
        assert_eq!(count_visible(""), 0);
    }
}
