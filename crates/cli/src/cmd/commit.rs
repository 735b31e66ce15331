//! Capture the working tree as a new commit.

use anyhow::Result;
use strata_core::Store;

use crate::output::ConsoleReporter;

pub fn run(msg: &str, reporter: &mut ConsoleReporter) -> Result<()> {
    let store = Store::discover()?;
    strata_core::ops::commit(&store, msg, reporter)?;
    Ok(())
}
