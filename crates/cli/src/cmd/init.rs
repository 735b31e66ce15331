//! Turn a directory into a tracked root.

use anyhow::Result;

use crate::output::ConsoleReporter;

pub fn run(reporter: &mut ConsoleReporter) -> Result<()> {
    let root = strata_core::store::start_dir()?;
    strata_core::ops::init(&root, reporter)?;
    Ok(())
}
