//! Check command implementation.

use super::{read_script, CliError};
use bandcode::{RunBudget, Sandbox};
use std::path::Path;

/// Execute the check command.
///
/// # Errors
///
/// Returns an error if the script cannot be read or does not compile.
pub(crate) fn execute(path: &Path) -> Result<(), CliError> {
    let source = read_script(path)?;
    let sandbox = Sandbox::new(RunBudget::default());

    match sandbox.check(&source) {
        Ok(()) => {
            println!("OK: {} compiles", path.display());
            Ok(())
        }
        Err(diagnostic) => Err(CliError::new(format!("{}: {diagnostic}", path.display()))),
    }
}
