use crate::event::{CleanLine, SubtitleEvent};
use crate::normalizer::normalize;
use crate::parser::dialogue_record;

use std::fmt;

use tracing::trace;

/// A single style-name matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Matches when the word occurs in the style bounded by non-letters.
    Word(String),
    /// Matches the whole style; `*` stands for any run of characters.
    Wildcard(String),
}

impl Pattern {
    /// Build a pattern from user input. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Pattern> {
        let raw = raw.trim().to_lowercase();
        if raw.is_empty() {
            None
        } else if raw.contains('*') {
            Some(Pattern::Wildcard(raw))
        } else {
            Some(Pattern::Word(raw))
        }
    }

    pub fn matches(&self, style: &str) -> bool {
        let style: Vec<char> = style.to_lowercase().chars().collect();
        match self {
            Pattern::Word(word) => {
                let word: Vec<char> = word.chars().collect();
                contains_word(&style, &word)
            }
            Pattern::Wildcard(glob) => {
                let glob: Vec<char> = glob.chars().collect();
                wildcard_match(&glob, &style)
            }
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Pattern::Word(s) | Pattern::Wildcard(s) => write!(fmt, "{}", s),
        }
    }
}

fn contains_word(haystack: &[char], word: &[char]) -> bool {
    if word.is_empty() || word.len() > haystack.len() {
        return false;
    }
    (0..=haystack.len() - word.len()).any(|start| {
        let end = start + word.len();
        let bounded_left = start == 0 || !haystack[start - 1].is_alphabetic();
        let bounded_right = end == haystack.len() || !haystack[end].is_alphabetic();
        bounded_left && bounded_right && &haystack[start..end] == word
    })
}

// Backtracks to the most recent `*` only.
fn wildcard_match(glob: &[char], text: &[char]) -> bool {
    let (mut g, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        if g < glob.len() && glob[g] == '*' {
            star = Some((g, t));
            g += 1;
        } else if g < glob.len() && glob[g] == text[t] {
            g += 1;
            t += 1;
        } else if let Some((star_g, star_t)) = star {
            g = star_g + 1;
            t = star_t + 1;
            star = Some((star_g, star_t + 1));
        } else {
            return false;
        }
    }
    glob[g..].iter().all(|&c| c == '*')
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist {
    patterns: Vec<Pattern>,
}

impl Blacklist {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }

    /// Parse a comma-separated pattern list, dropping blank entries.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(',').filter_map(Pattern::parse).collect())
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn is_blacklisted(&self, style: &str) -> bool {
        self.patterns.iter().any(|p| {
            let hit = p.matches(style);
            if hit {
                trace!(style, pattern = %p, "style blacklisted");
            }
            hit
        })
    }
}

impl fmt::Display for Blacklist {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        for (i, pattern) in self.patterns.iter().enumerate() {
            if i > 0 {
                write!(fmt, ",")?;
            }
            write!(fmt, "{}", pattern)?;
        }
        Ok(())
    }
}

/// Plain text is always dialogue. Otherwise the first record that parses
/// and has a style outside the blacklist wins.
pub fn extract_dialogue_line(event: &SubtitleEvent, blacklist: &Blacklist) -> Option<CleanLine> {
    let line = match event {
        SubtitleEvent::Plain(text) => normalize(text),
        SubtitleEvent::Structured(records) => records
            .iter()
            .filter_map(|raw| dialogue_record(raw))
            .find(|record| !blacklist.is_blacklisted(record.style))
            .map(|record| normalize(record.text))?,
    };
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}
