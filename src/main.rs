use subprime::controller::{PrimerController, SkipReason, SubtitleOutcome};
use subprime::event::Cue;
use subprime::parser::{parse_ass, parse_srt};
use subprime::settings::{load_settings, FileSettingsStore};
use subprime::simulate::{replay, Report, SimulatedPlayer};
use subprime::{logging, serialiser};

use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser as ClapParser, Subcommand, ValueEnum};

fn main() {
    logging::init();
    match run() {
        Ok(()) => (),
        Err(err) => {
            eprintln!("An error occurred: {}", err);
            for cause in err.chain().skip(1) {
                eprintln!("    {}", cause);
            }
            std::process::exit(1);
        }
    }
}

#[derive(ClapParser)]
#[command(about = "Pause before every subtitle line, long enough to read it")]
struct Cli {
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        help = "The settings file to load and keep up to date.",
        default_value = "subprime.conf"
    )]
    settings: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a subtitle file and show where playback would pause.
    Preview {
        #[arg(
            value_name = "FILE",
            help = "The subtitle file to read. If not supplied, it will be read from standard input.",
            default_value = "-"
        )]
        input: String,
        #[arg(
            short,
            long,
            value_enum,
            help = "Subtitle format. Guessed from the file extension when omitted."
        )]
        format: Option<Format>,
    },
    /// Load the settings file, fill in missing keys and print it.
    Settings,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Srt,
    Ass,
}

impl Format {
    fn guess(input: &str) -> Format {
        let ext = Path::new(input)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("ass") | Some("ssa") => Format::Ass,
            _ => Format::Srt,
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut store = FileSettingsStore::new(&cli.settings);

    match cli.command {
        Command::Preview { input, format } => {
            let data = read_input(&input)?;
            let format = format.unwrap_or_else(|| Format::guess(&input));
            let cues = parse_cues(&data, format)
                .context(format!("Failed to parse subtitle file: '{}'", input))?;
            if cues.is_empty() {
                return Err(anyhow!("You appear to have supplied an empty file."));
            }

            let mut controller = PrimerController::new(SimulatedPlayer::new(), store);
            let report = replay(&mut controller, &cues);
            let stdout = io::stdout();
            write_report(&mut BufWriter::new(stdout.lock()), &report)?;
        }
        Command::Settings => {
            let settings = load_settings(&mut store);
            serialiser::serialise(&settings, io::stdout())?;
        }
    }
    Ok(())
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(input).context(format!("Failed to open input file: '{}'", input))
    }
}

fn parse_cues(data: &str, format: Format) -> subprime::Result<Vec<Cue>> {
    match format {
        Format::Srt => parse_srt(data),
        Format::Ass => parse_ass(data),
    }
}

fn write_report<W: Write>(buf: &mut W, report: &Report) -> Result<()> {
    for cue in &report.cues {
        write_ts(buf, cue.show_at)?;
        write!(buf, " --> ")?;
        write_ts(buf, cue.hide_at)?;
        match &cue.outcome {
            SubtitleOutcome::Paused { line, seconds } => {
                writeln!(buf, "  hold {:>5.2}s  {}", seconds, line)?
            }
            SubtitleOutcome::Ignored(reason) => writeln!(buf, "  skip  {}", describe(*reason))?,
        }
    }
    writeln!(
        buf,
        "{} cues, {} pauses, {:.2}s of holds",
        report.cues.len(),
        report.pauses,
        report.total_hold.as_secs_f64()
    )?;
    buf.flush()?;
    Ok(())
}

fn describe(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::Disabled => "disabled",
        SkipReason::Holding => "already holding",
        SkipReason::NoDialogue => "no dialogue",
        SkipReason::Duplicate => "repeated line",
        SkipReason::TooShort => "too short",
        SkipReason::BadHold => "hold out of range",
    }
}

fn write_ts<W: Write>(buf: &mut W, timestamp: Duration) -> Result<()> {
    let total_secs = timestamp.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = timestamp.subsec_millis();
    write!(buf, "{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)?;
    Ok(())
}
