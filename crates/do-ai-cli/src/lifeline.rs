// SPDX-License-Identifier: MIT

//! The lifeline file: a sentinel whose removal is the agreed-upon
//! self-termination signal from the wrapped agent (§4.1, §6).

use std::path::{Path, PathBuf};

use crate::timefmt::format_rfc3339_now;

pub const DEFAULT_LIFELINE_NAME: &str = ".do-ai.lock";

/// Write the lifeline file in `dir`, containing the current RFC3339
/// timestamp (contents are irrelevant after creation; only existence
/// matters).
pub fn write(dir: &Path) -> std::io::Result<PathBuf> {
    let path = dir.join(DEFAULT_LIFELINE_NAME);
    std::fs::write(&path, format_rfc3339_now())?;
    Ok(path)
}

/// True iff the lifeline file still exists. Injection stops permanently
/// once this returns false for the first time.
pub fn exists(path: &Path) -> bool {
    path.exists()
}

/// Substitute `{LOCK_FILE}` with the absolute lifeline path in a message
/// template (§4.1).
pub fn substitute(template: &str, lifeline_path: &Path) -> String {
    template.replace("{LOCK_FILE}", &lifeline_path.display().to_string())
}

#[cfg(test)]
#[path = "lifeline_tests.rs"]
mod tests;
