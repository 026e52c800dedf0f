//! Compile-and-run check for a freshly generated header.

use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tracing::info;

use crate::error::{AmalgamError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeTest {
    pub compiler: String,
    pub flags: Vec<String>,
    pub sources: Vec<PathBuf>,
    /// Execute the compiled binary after a successful build.
    pub run: bool,
}

impl SmokeTest {
    /// Compile `sources` against the directory holding `header`, then optionally run the result.
    pub fn execute(&self, header: &Path) -> Result<()> {
        let include_dir = header
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let workdir = tempfile::tempdir().map_err(|err| AmalgamError::io(std::env::temp_dir(), err))?;
        let binary = workdir.path().join(format!("amalgam-smoke{EXE_SUFFIX}"));

        info!(compiler = %self.compiler, sources = self.sources.len(), "compiling smoke test");
        let mut compile = Command::new(&self.compiler);
        compile
            .args(&self.flags)
            .arg("-I")
            .arg(include_dir)
            .args(&self.sources)
            .arg("-o")
            .arg(&binary);
        check("compile", &self.compiler, compile.status())?;

        if self.run {
            info!(binary = %binary.display(), "running smoke test");
            let status = Command::new(&binary).status();
            check("run", &binary.display().to_string(), status)?;
        }

        Ok(())
    }
}

fn check(stage: &str, program: &str, status: std::io::Result<ExitStatus>) -> Result<()> {
    match status {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(AmalgamError::SmokeTestFailed {
            stage: stage.to_string(),
            detail: format!("{program} exited with {status}"),
        }),
        Err(err) => Err(AmalgamError::SmokeTestFailed {
            stage: stage.to_string(),
            detail: format!("could not start {program}: {err}"),
        }),
    }
}
