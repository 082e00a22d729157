//! Handing saved logs to an office program.

use std::path::Path;
use std::process::{Child, Command};

use tracing::info;

use crate::error::{Error, Result};

/// Spawn `program` with `log_path` as its only argument.
///
/// The child is detached; this returns as soon as the process has been
/// spawned. The program is invoked directly, not through a shell, so the
/// path needs no quoting.
///
/// # Errors
///
/// Fails when the program cannot be spawned, typically because the
/// configured path does not exist.
pub fn open_log_file(program: &Path, log_path: &Path) -> Result<Child> {
    let child = Command::new(program)
        .arg(log_path)
        .spawn()
        .map_err(|source| Error::office_launch(program.to_path_buf(), source))?;
    info!(
        program = %program.display(),
        log = %log_path.display(),
        "log handed to office program"
    );
    Ok(child)
}
