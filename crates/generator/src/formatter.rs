//! External source formatting
//!
//! Generated files are formatted in place after they are written. A missing
//! or failing formatter never fails generation: the unformatted file is kept.

use provider_codegen_common::{CodegenError, Result};
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

/// Formats a written source file in place
#[cfg_attr(test, mockall::automock)]
pub trait SourceFormatter {
    fn format_file(&self, path: &Path) -> Result<()>;
}

/// Runs `gofmt -w <file>`
#[derive(Debug, Clone)]
pub struct Gofmt {
    program: String,
}

impl Gofmt {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Gofmt {
    fn default() -> Self {
        Self::new("gofmt")
    }
}

impl SourceFormatter for Gofmt {
    fn format_file(&self, path: &Path) -> Result<()> {
        debug!("Running {} -w {}", self.program, path.display());
        let output = Command::new(&self.program)
            .arg("-w")
            .arg(path)
            .output()
            .map_err(|e| CodegenError::Formatting(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(CodegenError::Formatting(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Format `path`, downgrading any failure to a warning
///
/// Returns whether the file was formatted.
pub fn format_best_effort(formatter: &dyn SourceFormatter, path: &Path) -> bool {
    match formatter.format_file(path) {
        Ok(()) => true,
        Err(e) => {
            warn!("{}; keeping unformatted {}", e, path.display());
            false
        },
    }
}
