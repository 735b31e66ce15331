//! Reporter interface: a stream of structured events consumed by an
//! external formatter.
//!
//! The engine never prints. Commands emit events; the CLI decides colors,
//! verbosity filtering, and time humanization.

use crate::id::CommitId;

/// One event in a command's output stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Info(String),
    Warn(String),
    Error(String),
    /// One row of `branch` listing output.
    BranchRow {
        name: String,
        /// Whether HEAD is attached to this branch.
        current: bool,
        target: CommitId,
        /// First line of the target commit's message.
        summary: String,
    },
    /// One row of `log` output. Carries raw data; the formatter derives
    /// short ids and relative times.
    CommitRow {
        id: CommitId,
        /// Fractional seconds since the Unix epoch.
        ts: f64,
        /// Branch names pointing at this commit, plus `HEAD` if applicable.
        decorations: Vec<String>,
        message: String,
    },
}

/// Consumer of engine events.
pub trait Reporter {
    fn emit(&mut self, event: Event);
}

/// Reporter that records events in memory; used by tests and embedders.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    pub events: Vec<Event>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All Info texts, in emission order.
    pub fn infos(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Info(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}
