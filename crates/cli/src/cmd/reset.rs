//! Retarget HEAD or its branch.

use anyhow::Result;
use strata_core::Store;

use crate::output::ConsoleReporter;

pub fn run(reference: &str, hard: bool, reporter: &mut ConsoleReporter) -> Result<()> {
    let store = Store::discover()?;
    strata_core::ops::reset(&store, reference, hard, reporter)?;
    Ok(())
}
