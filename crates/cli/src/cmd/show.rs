//! Show the paths touched by a commit.

use anyhow::Result;
use strata_core::Store;

use crate::output::ConsoleReporter;

pub fn run(reference: Option<&str>, reporter: &mut ConsoleReporter) -> Result<()> {
    let store = Store::discover()?;
    strata_core::ops::show(&store, reference, reporter)?;
    Ok(())
}
