use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

/// pdm only prints a path or a short diagnostic; anything longer is trimmed
/// from the front so the final error lines survive.
const MAX_CAPTURE_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Runs `program` in `cwd` with stdin closed and waits for it to exit.
///
/// # Errors
///
/// Returns an error when the program cannot be spawned or waited on.
pub fn run_command(program: &str, args: &[String], cwd: &Path) -> Result<RunOutput> {
    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to start {program}"))?;
    Ok(RunOutput {
        // Killed by a signal.
        code: output.status.code().unwrap_or(-1),
        stdout: tail_lossy(&output.stdout, MAX_CAPTURE_BYTES),
        stderr: tail_lossy(&output.stderr, MAX_CAPTURE_BYTES),
    })
}

fn tail_lossy(bytes: &[u8], limit: usize) -> String {
    if bytes.len() <= limit {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    let tail = &bytes[bytes.len() - limit..];
    format!("[...truncated...]\n{}", String::from_utf8_lossy(tail))
}
