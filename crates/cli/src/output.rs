//! Console rendering of engine events and errors.
//!
//! This is the external formatter for the engine's reporter stream: colors,
//! quiet-mode filtering, short ids, and relative-time humanization all live
//! here, never in the engine.

use std::time::{SystemTime, UNIX_EPOCH};

use owo_colors::OwoColorize;
use strata_core::{Error, Event, Reporter};

/// Reporter that prints events to the terminal.
pub struct ConsoleReporter {
    quiet: bool,
    full: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet, full: false }
    }

    /// Render log rows with full ids and messages (`log --full`).
    pub fn set_full(&mut self, full: bool) {
        self.full = full;
    }
}

impl Reporter for ConsoleReporter {
    fn emit(&mut self, event: Event) {
        match event {
            Event::Info(text) => {
                if !self.quiet {
                    println!("{text}");
                }
            }
            Event::Warn(text) => eprintln!("{}", text.yellow()),
            Event::Error(text) => eprintln!("{}", text.red()),
            Event::BranchRow {
                name,
                current,
                target,
                summary,
            } => {
                if self.quiet {
                    return;
                }
                let marker = if current { "*" } else { " " };
                println!(
                    "{} {}\t{} {}",
                    marker,
                    name.green(),
                    target.short().yellow(),
                    summary
                );
            }
            Event::CommitRow {
                id,
                ts,
                decorations,
                message,
            } => {
                if self.quiet {
                    return;
                }
                let shown_id = if self.full { id.to_hex() } else { id.short() };
                let when = format_relative_time(ts);
                let decor = if decorations.is_empty() {
                    String::new()
                } else {
                    let names: Vec<String> = decorations
                        .iter()
                        .map(|name| {
                            if name == strata_core::HEAD_TOKEN {
                                name.blue().to_string()
                            } else {
                                name.green().to_string()
                            }
                        })
                        .collect();
                    format!("({}) ", names.join(", "))
                };
                let shown_msg = if self.full {
                    message
                } else {
                    message.lines().next().unwrap_or("").to_string()
                };
                println!("* {} ({}) {}{}", shown_id.yellow(), when, decor, shown_msg);
            }
        }
    }
}

/// Render an error as a single class line plus, where applicable, a
/// bulleted list of offending items.
pub fn render_error(err: &anyhow::Error) {
    eprintln!("{} {err}", "error:".red().bold());
    if let Some(core) = err.downcast_ref::<Error>() {
        match core {
            Error::DirtyWorkingTree { paths } => {
                for path in paths {
                    eprintln!("  - {}", path.display().to_string().red());
                }
            }
            Error::AmbiguousRef { matches, .. } => {
                for id in matches {
                    eprintln!("  - {}", id.to_hex().yellow());
                }
            }
            _ => {}
        }
    }
}

/// Humanize a commit timestamp relative to now ("3 minutes ago").
pub fn format_relative_time(ts: f64) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    format_duration_ago(now - ts)
}

fn format_duration_ago(elapsed: f64) -> String {
    const MINUTE: f64 = 60.0;
    const HOUR: f64 = MINUTE * 60.0;
    const DAY: f64 = HOUR * 24.0;
    const WEEK: f64 = DAY * 7.0;
    const MONTH: f64 = DAY * 30.0;
    const YEAR: f64 = DAY * 365.0;

    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("1 {unit} ago")
        } else {
            format!("{n} {unit}s ago")
        }
    };

    if elapsed < 20.0 {
        "Just now".to_string()
    } else if elapsed < MINUTE {
        plural(elapsed as u64, "second")
    } else if elapsed < HOUR {
        plural((elapsed / MINUTE) as u64, "minute")
    } else if elapsed < DAY {
        plural((elapsed / HOUR) as u64, "hour")
    } else if elapsed < WEEK {
        plural((elapsed / DAY) as u64, "day")
    } else if elapsed < MONTH {
        plural((elapsed / WEEK) as u64, "week")
    } else if elapsed < YEAR {
        plural((elapsed / MONTH) as u64, "month")
    } else {
        plural((elapsed / YEAR) as u64, "year")
    }
}
