//! Remove unreachable commits.

use anyhow::Result;
use strata_core::Store;

use crate::output::ConsoleReporter;

pub fn run(reporter: &mut ConsoleReporter) -> Result<()> {
    let store = Store::discover()?;
    strata_core::ops::prune(&store, reporter)?;
    Ok(())
}
