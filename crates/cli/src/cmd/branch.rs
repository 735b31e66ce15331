//! List, create, or delete branches.

use anyhow::Result;
use strata_core::Store;

use crate::output::ConsoleReporter;

pub fn run(
    name: Option<&str>,
    reference: Option<&str>,
    force: bool,
    delete: bool,
    reporter: &mut ConsoleReporter,
) -> Result<()> {
    let store = Store::discover()?;
    strata_core::ops::branch(&store, name, reference, force, delete, reporter)?;
    Ok(())
}
