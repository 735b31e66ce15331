//! Reconstruct a historical state, or start an orphan branch.

use anyhow::Result;
use strata_core::{Error, Store};

use crate::output::ConsoleReporter;

pub fn run(
    reference: Option<&str>,
    force: bool,
    orphan: bool,
    reporter: &mut ConsoleReporter,
) -> Result<()> {
    let store = Store::discover()?;
    if orphan {
        let name = reference
            .ok_or_else(|| Error::Usage("--orphan requires a branch name".to_string()))?;
        strata_core::ops::checkout_orphan(&store, name, reporter)?;
    } else {
        strata_core::ops::checkout(&store, reference, force, reporter)?;
    }
    Ok(())
}
