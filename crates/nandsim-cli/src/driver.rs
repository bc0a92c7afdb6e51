//! Clock driving loop.
//!
//! One loop owns the [`Computer`] and is the only caller of `tick`. In
//! automatic mode a reader thread forwards command lines over a channel and
//! the loop ticks whenever the interval elapses, whatever arrives meanwhile; in manual
//! mode the loop reads commands directly. Either way ticks never overlap.

use std::io::{BufRead, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use nandsim_core::Computer;
use tracing::{debug, info};

use crate::errors::CliError;
use crate::render::{render_panel, render_status};

/// Default automatic tick interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// How edge advances are triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    /// Tick every `interval` until quit or the tick limit.
    Auto {
        /// Delay between ticks.
        interval: Duration,
    },
    /// Tick once per `t` command (or empty line).
    Manual,
}

/// Output flavour for each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameFormat {
    /// Full text panel.
    #[default]
    Panel,
    /// One JSON snapshot per line.
    Json,
}

/// Driving options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveConfig {
    /// Tick trigger.
    pub mode: DriveMode,
    /// Stop after this many ticks.
    pub max_ticks: Option<u64>,
    /// Frame output format.
    pub format: FrameFormat,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            mode: DriveMode::Auto {
                interval: DEFAULT_INTERVAL,
            },
            max_ticks: None,
            format: FrameFormat::Panel,
        }
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A `q` command was received.
    Quit,
    /// The configured tick limit was reached.
    TickLimit,
    /// Manual mode reached the end of its input.
    InputClosed,
}

/// Result of a completed drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveOutcome {
    /// Ticks performed by this drive.
    pub ticks: u64,
    /// Stop cause.
    pub reason: StopReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Tick,
    Quit,
    Unknown,
}

fn parse_command(line: &str) -> Command {
    match line.trim() {
        "" | "t" | "T" => Command::Tick,
        "q" | "Q" => Command::Quit,
        _ => Command::Unknown,
    }
}

/// Runs `cpu` per `config`, reading commands from `input` and writing frames
/// to `output`.
///
/// # Errors
///
/// Returns [`CliError::Sim`] when a tick fails to settle, and
/// [`CliError::Io`] or [`CliError::Json`] when a frame cannot be written.
pub fn drive<R, W>(
    cpu: &mut Computer,
    config: &DriveConfig,
    input: R,
    output: &mut W,
) -> Result<DriveOutcome, CliError>
where
    R: BufRead + Send + 'static,
    W: Write,
{
    let mut driver = Driver {
        cpu,
        config,
        output,
        ticks: 0,
    };
    driver.frame()?;
    if driver.limit_reached() {
        return Ok(driver.outcome(StopReason::TickLimit));
    }
    match config.mode {
        DriveMode::Auto { interval } => driver.run_auto(input, interval),
        DriveMode::Manual => driver.run_manual(input),
    }
}

struct Driver<'a, W> {
    cpu: &'a mut Computer,
    config: &'a DriveConfig,
    output: &'a mut W,
    ticks: u64,
}

impl<W: Write> Driver<'_, W> {
    fn run_auto<R>(&mut self, input: R, interval: Duration) -> Result<DriveOutcome, CliError>
    where
        R: BufRead + Send + 'static,
    {
        let (sender, commands) = mpsc::channel();
        let _reader = thread::spawn(move || {
            for line in input.lines() {
                let Ok(line) = line else { break };
                if sender.send(parse_command(&line)).is_err() {
                    break;
                }
            }
        });

        let mut input_open = true;
        let mut next_tick = Instant::now() + interval;
        loop {
            let wait = next_tick.saturating_duration_since(Instant::now());
            if input_open {
                match commands.recv_timeout(wait) {
                    Ok(Command::Quit) => return Ok(self.outcome(StopReason::Quit)),
                    Ok(Command::Tick) => continue,
                    Ok(Command::Unknown) => {
                        self.hint()?;
                        continue;
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        debug!("command input closed, ticking on the timer only");
                        input_open = false;
                        continue;
                    }
                }
            } else {
                thread::sleep(wait);
            }

            self.step()?;
            if self.limit_reached() {
                return Ok(self.outcome(StopReason::TickLimit));
            }
            next_tick = Instant::now() + interval;
        }
    }

    fn run_manual<R: BufRead>(&mut self, input: R) -> Result<DriveOutcome, CliError> {
        for line in input.lines() {
            match parse_command(&line?) {
                Command::Tick => {
                    self.step()?;
                    if self.limit_reached() {
                        return Ok(self.outcome(StopReason::TickLimit));
                    }
                }
                Command::Quit => return Ok(self.outcome(StopReason::Quit)),
                Command::Unknown => self.hint()?,
            }
        }
        Ok(self.outcome(StopReason::InputClosed))
    }

    fn step(&mut self) -> Result<(), CliError> {
        let passes = self.cpu.tick()?;
        self.ticks += 1;
        let snapshot = self.cpu.snapshot();
        debug!(passes, "{}", render_status(&snapshot));
        self.frame()
    }

    fn frame(&mut self) -> Result<(), CliError> {
        let snapshot = self.cpu.snapshot();
        match self.config.format {
            FrameFormat::Panel => {
                write!(self.output, "{}", render_panel(&snapshot))?;
                if self.config.mode == DriveMode::Manual {
                    writeln!(self.output, " t: tick  q: quit")?;
                }
                writeln!(self.output)?;
            }
            FrameFormat::Json => {
                serde_json::to_writer(&mut *self.output, &snapshot)?;
                writeln!(self.output)?;
            }
        }
        self.output.flush()?;
        Ok(())
    }

    fn hint(&mut self) -> Result<(), CliError> {
        writeln!(self.output, "commands: t = tick, q = quit")?;
        self.output.flush()?;
        Ok(())
    }

    fn limit_reached(&self) -> bool {
        self.config.max_ticks.is_some_and(|limit| self.ticks >= limit)
    }

    fn outcome(&self, reason: StopReason) -> DriveOutcome {
        info!(ticks = self.ticks, ?reason, "drive stopped");
        DriveOutcome {
            ticks: self.ticks,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufReader, Cursor, Read};
    use std::thread;
    use std::time::Duration;

    use nandsim_core::{Computer, MemoryImage, Snapshot};
    use rstest::rstest;

    use super::{drive, DriveConfig, DriveMode, FrameFormat, StopReason};

    fn sample() -> Computer {
        Computer::new(&MemoryImage::sample()).expect("cpu builds")
    }

    /// Yields one line per read, pausing before each.
    struct PacedLines {
        lines: Vec<&'static [u8]>,
        pause: Duration,
    }

    impl Read for PacedLines {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.lines.is_empty() {
                return Ok(0);
            }
            thread::sleep(self.pause);
            let line = self.lines.remove(0);
            buf[..line.len()].copy_from_slice(line);
            Ok(line.len())
        }
    }

    fn json_frames(output: &[u8]) -> Vec<Snapshot> {
        String::from_utf8_lossy(output)
            .lines()
            .map(|line| serde_json::from_str(line).expect("frame is a snapshot"))
            .collect()
    }

    #[test]
    fn manual_mode_ticks_per_command_and_quits() {
        let mut cpu = sample();
        let config = DriveConfig {
            mode: DriveMode::Manual,
            max_ticks: None,
            format: FrameFormat::Json,
        };
        let mut output = Vec::new();
        let input = Cursor::new(b"t\n\nt\nq\nt\n".to_vec());

        let outcome = drive(&mut cpu, &config, input, &mut output).expect("drive succeeds");

        assert_eq!(outcome.ticks, 3);
        assert_eq!(outcome.reason, StopReason::Quit);
        let frames = json_frames(&output);
        assert_eq!(frames.len(), 4, "initial frame plus one per tick");
        assert_eq!(frames[3].a(), 13);
        assert_eq!(frames[3].b(), 3);
    }

    #[test]
    fn manual_mode_stops_at_end_of_input() {
        let mut cpu = sample();
        let config = DriveConfig {
            mode: DriveMode::Manual,
            ..DriveConfig::default()
        };
        let mut output = Vec::new();
        let outcome = drive(&mut cpu, &config, Cursor::new(b"t\nhelp\n".to_vec()), &mut output)
            .expect("drive succeeds");

        assert_eq!(outcome.reason, StopReason::InputClosed);
        assert_eq!(outcome.ticks, 1);
        assert!(String::from_utf8_lossy(&output).contains("commands: t = tick, q = quit"));
    }

    #[rstest]
    #[case(0)]
    #[case(11)]
    fn auto_mode_honours_tick_limit(#[case] limit: u64) {
        let mut cpu = sample();
        let config = DriveConfig {
            mode: DriveMode::Auto {
                interval: Duration::ZERO,
            },
            max_ticks: Some(limit),
            format: FrameFormat::Json,
        };
        let mut output = Vec::new();
        let outcome =
            drive(&mut cpu, &config, Cursor::new(Vec::new()), &mut output).expect("drive succeeds");

        assert_eq!(outcome.ticks, limit);
        assert_eq!(outcome.reason, StopReason::TickLimit);
        let last = *json_frames(&output).last().expect("at least one frame");
        assert_eq!(last.ticks, limit);
        if limit == 11 {
            assert_eq!((last.a(), last.b(), last.pc()), (0, 9, 5));
        }
    }

    #[test]
    fn auto_mode_quits_on_command() {
        let mut cpu = sample();
        let config = DriveConfig {
            mode: DriveMode::Auto {
                interval: Duration::from_secs(5),
            },
            max_ticks: None,
            format: FrameFormat::Panel,
        };
        let mut output = Vec::new();
        let outcome = drive(&mut cpu, &config, Cursor::new(b"q\n".to_vec()), &mut output)
            .expect("drive succeeds");

        assert_eq!(outcome.reason, StopReason::Quit);
        assert_eq!(outcome.ticks, 0);
        assert!(String::from_utf8_lossy(&output).contains("3bit CPU Demo"));
    }

    #[test]
    fn auto_mode_keeps_ticking_while_lines_arrive() {
        let mut cpu = sample();
        let config = DriveConfig {
            mode: DriveMode::Auto {
                interval: Duration::from_millis(50),
            },
            max_ticks: None,
            format: FrameFormat::Json,
        };
        let mut lines: Vec<&'static [u8]> = vec![&b"t\n"[..]; 30];
        lines.push(&b"q\n"[..]);
        let input = BufReader::new(PacedLines {
            lines,
            pause: Duration::from_millis(20),
        });
        let mut output = Vec::new();

        let outcome = drive(&mut cpu, &config, input, &mut output).expect("drive succeeds");

        assert_eq!(outcome.reason, StopReason::Quit);
        assert!(outcome.ticks >= 5, "only {} ticks in ~600ms", outcome.ticks);
        assert_eq!(json_frames(&output).len() as u64, outcome.ticks + 1);
    }

    #[test]
    fn auto_mode_answers_unknown_commands() {
        let mut cpu = sample();
        let config = DriveConfig {
            mode: DriveMode::Auto {
                interval: Duration::from_secs(5),
            },
            max_ticks: None,
            format: FrameFormat::Panel,
        };
        let mut output = Vec::new();
        let outcome = drive(&mut cpu, &config, Cursor::new(b"help\nq\n".to_vec()), &mut output)
            .expect("drive succeeds");

        assert_eq!(outcome.reason, StopReason::Quit);
        assert!(String::from_utf8_lossy(&output).contains("commands: t = tick, q = quit"));
    }
}
