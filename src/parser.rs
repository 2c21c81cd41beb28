use crate::error::{PrimerError, Result};
use crate::event::{Cue, DialogueRecord, SubtitleEvent};

use std::time::Duration;

use nom::bytes::complete::{tag, take_while, take_while1, take_while_m_n};
use nom::character::complete::{char, digit1, line_ending, multispace0, multispace1, space0, space1};
use nom::combinator::{map_res, opt, rest};
use nom::error::{convert_error, ErrorKind, VerboseError};
use nom::multi::{count, many_till};
use nom::sequence::{preceded, terminated};
use nom::{branch::alt, error_position, Err, IResult};

/// Number of comma-separated fields in front of the free-form text of an
/// event record.
const LEADING_FIELDS: usize = 9;
const STYLE_FIELD: usize = 3;
const START_FIELD: usize = 1;
const END_FIELD: usize = 2;

type ParseResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// Split a structured event record into its style and text.
///
/// Returns `None` when the record does not have enough leading fields.
/// Everything after the ninth comma is text, commas included.
pub fn dialogue_record(input: &str) -> Option<DialogueRecord<'_>> {
    let (_, (fields, text)) = record_fields(input).ok()?;
    Some(DialogueRecord {
        style: fields[STYLE_FIELD].trim(),
        text,
    })
}

fn record_fields(input: &str) -> ParseResult<'_, (Vec<&str>, &str)> {
    let (input, _) = opt(terminated(tag("Dialogue:"), space0))(input)?;
    let field = terminated(take_while(|c: char| c != ','), char(','));
    let (input, fields) = count(field, LEADING_FIELDS)(input)?;
    let (input, text) = rest(input)?;
    Ok((input, (fields, text.trim_end_matches(['\r', '\n']))))
}

/// Parse one `key = value` settings line. Blank lines and comments are the
/// caller's business.
pub fn setting_line(input: &str) -> Option<(&str, &str)> {
    key_value(input).ok().map(|(_, kv)| kv)
}

fn key_value(input: &str) -> ParseResult<'_, (&str, &str)> {
    let key = take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_');
    let (input, key) = preceded(space0, key)(input)?;
    let (input, _) = preceded(space0, char('='))(input)?;
    let (input, value) = rest(input)?;
    Ok((input, (key, value.trim())))
}

/// Parse a complete SRT file into plain-text cues ordered by start time.
pub fn parse_srt(input: &str) -> Result<Vec<Cue>> {
    match srt_file(input) {
        Ok((_, cues)) => Ok(cues),
        Err(Err::Error(err)) | Err(Err::Failure(err)) => {
            Err(PrimerError::Parse(convert_error(input, err)))
        }
        Err(Err::Incomplete(_)) => Err(PrimerError::Parse(
            "Incomplete data received by non-streaming parser.".to_string(),
        )),
    }
}

/// Collect the `Dialogue:` lines of an ASS script into structured cues.
///
/// Records sharing a start time are grouped into one event, in file order,
/// the way a player reports overlapping lines. Lines that fail to parse are
/// skipped.
pub fn parse_ass(input: &str) -> Result<Vec<Cue>> {
    let mut cues: Vec<Cue> = Vec::new();
    for line in input.lines() {
        let line = line.trim_start_matches('\u{FEFF}');
        if !line.starts_with("Dialogue:") {
            continue;
        }
        let fields = match record_fields(line) {
            Ok((_, (fields, _))) => fields,
            Err(_) => continue,
        };
        let (show_at, hide_at) = match (
            ass_timestamp(fields[START_FIELD].trim()),
            ass_timestamp(fields[END_FIELD].trim()),
        ) {
            (Ok((_, show_at)), Ok((_, hide_at))) => (show_at, hide_at),
            _ => continue,
        };
        match cues.iter_mut().find(|c| c.show_at == show_at) {
            Some(cue) => {
                if let SubtitleEvent::Structured(records) = &mut cue.event {
                    records.push(line.to_string());
                }
                cue.hide_at = cue.hide_at.max(hide_at);
            }
            None => cues.push(Cue {
                show_at,
                hide_at,
                event: SubtitleEvent::Structured(vec![line.to_string()]),
            }),
        }
    }
    if cues.is_empty() && !input.trim().is_empty() && !input.contains("Dialogue:") {
        return Err(PrimerError::Parse(
            "No Dialogue lines found in ASS script".to_string(),
        ));
    }
    cues.sort_by_key(|c| c.show_at);
    Ok(cues)
}

fn optional_bom(input: &str) -> ParseResult<'_, Option<&str>> {
    opt(tag("\u{FEFF}"))(input)
}

fn srt_file(input: &str) -> ParseResult<'_, Vec<Cue>> {
    let (input, _) = optional_bom(input)?;
    let (input, mut cues) = all_cues(input)?;
    let (input, _) = end_of_file(input)?;
    cues.sort_by_key(|c| c.show_at);
    Ok((input, cues))
}

fn all_cues(input: &str) -> ParseResult<'_, Vec<Cue>> {
    let mut parsed = Vec::new();
    let mut input = input;
    loop {
        match srt_cue(input) {
            Ok((remaining, cue)) => {
                parsed.push(cue);
                let (remaining, _) = multispace0(remaining)?;
                input = remaining;
            }
            Err(err) => {
                let (remaining, _) = multispace0(input)?;
                if remaining.is_empty() {
                    return Ok((remaining, parsed));
                }
                return Err(err);
            }
        }
    }
}

fn srt_cue(input: &str) -> ParseResult<'_, Cue> {
    let (input, _) = multispace0(input)?;
    let (input, _) = terminated(digit1, multispace1)(input)?;
    let (input, (show_at, hide_at)) = terminated(show_hide, line_ending)(input)?;
    let (input, lines) = cue_text(input)?;

    Ok((
        input,
        Cue {
            show_at,
            hide_at,
            event: SubtitleEvent::Plain(lines.join("\n")),
        },
    ))
}

fn end_of_file(input: &str) -> ParseResult<'_, &str> {
    if input.is_empty() {
        Ok((input, input))
    } else {
        Err(Err::Error(error_position!(input, ErrorKind::Eof)))
    }
}

fn cue_text(input: &str) -> ParseResult<'_, Vec<&str>> {
    let line = terminated(
        take_while1(|c: char| c != '\n' && c != '\r'),
        alt((line_ending, end_of_file)),
    );
    let (input, (lines, _)) = many_till(line, alt((line_ending, end_of_file)))(input)?;
    Ok((input, lines))
}

fn show_hide(input: &str) -> ParseResult<'_, (Duration, Duration)> {
    let (input, show_at) = srt_timestamp(input)?;
    let (input, _) = space1(input)?;
    let (input, _) = tag("-->")(input)?;
    let (input, _) = space1(input)?;
    let (input, hide_at) = srt_timestamp(input)?;
    let (input, _) = space0(input)?;
    Ok((input, (show_at, hide_at)))
}

fn srt_timestamp(input: &str) -> ParseResult<'_, Duration> {
    clock_time(input, ',')
}

fn ass_timestamp(input: &str) -> ParseResult<'_, Duration> {
    clock_time(input, '.')
}

/// `H:MM:SS<sep>fff`, tolerant of short components. Hours, minutes and
/// seconds are left-padded (`1:2:3` is `01:02:03`); the fraction is
/// right-padded, so `,2` is 200ms and ASS centiseconds `.25` are 250ms.
fn clock_time(input: &str, fraction_sep: char) -> ParseResult<'_, Duration> {
    let (input, hours) = padded_number(input, 2, true)?;
    let (input, _) = char(':')(input)?;
    let (input, minutes) = padded_number(input, 2, true)?;
    let (input, _) = char(':')(input)?;
    let (input, seconds) = padded_number(input, 2, true)?;
    let (input, _) = char(fraction_sep)(input)?;
    let (input, millis) = padded_number(input, 3, false)?;

    Ok((
        input,
        Duration::from_millis(millis + (seconds + minutes * 60 + hours * 3600) * 1000),
    ))
}

fn padded_number(input: &str, width: usize, pad_left: bool) -> ParseResult<'_, u64> {
    let digits = take_while_m_n(0, width, |c: char| c.is_ascii_digit());
    map_res(digits, |s: &str| {
        let padded = if pad_left {
            format!("{:0>width$}", s, width = width)
        } else {
            format!("{:0<width$}", s, width = width)
        };
        padded.parse::<u64>()
    })(input)
}
