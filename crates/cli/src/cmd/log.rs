//! Show commit history, grouped by starting ref.

use anyhow::Result;
use strata_core::Store;

use crate::output::ConsoleReporter;

pub fn run(refs: &[String], all: bool, full: bool, reporter: &mut ConsoleReporter) -> Result<()> {
    let store = Store::discover()?;
    reporter.set_full(full);
    strata_core::ops::log(&store, refs, all, reporter)?;
    Ok(())
}
