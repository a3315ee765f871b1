use anyhow::{anyhow, Result};
use camino::Utf8PathBuf;
use tracing::debug;
use venvsync_domain::{DomainError, ProjectRoot};
use which::which;

use super::effects::PdmClient;
use super::process::{run_command, RunOutput};

pub(crate) struct SystemPdm {
    program: Option<String>,
}

impl SystemPdm {
    pub(crate) fn new(program: Option<String>) -> Self {
        Self { program }
    }

    fn program(&self) -> Result<String> {
        if let Some(explicit) = &self.program {
            return Ok(explicit.clone());
        }
        let path = which("pdm").map_err(|_| anyhow!("pdm executable not found on PATH"))?;
        path.into_os_string()
            .into_string()
            .map_err(|_| anyhow!("non-utf8 path to pdm"))
    }

    fn run(&self, root: &ProjectRoot, args: &[&str]) -> Result<RunOutput> {
        let program = self.program()?;
        let args: Vec<String> = args.iter().map(ToString::to_string).collect();
        debug!(%program, ?args, root = %root, "invoking pdm");
        run_command(&program, &args, root.path().as_std_path())
    }
}

impl PdmClient for SystemPdm {
    fn venv_location(&self, root: &ProjectRoot) -> Result<Utf8PathBuf, DomainError> {
        let unavailable = |reason: String| DomainError::StorageRootUnavailable {
            root: root.path().to_path_buf(),
            reason,
        };
        let output = self
            .run(root, &["config", "venv.location"])
            .map_err(|err| unavailable(format!("{err:#}")))?;
        parse_venv_location(&output).map_err(unavailable)
    }

    fn use_venv(&self, root: &ProjectRoot, name: &str) -> Result<RunOutput> {
        self.run(root, &["use", "--venv", name])
    }
}

pub(crate) fn parse_venv_location(output: &RunOutput) -> Result<Utf8PathBuf, String> {
    if !output.success() {
        let stderr = output.stderr.trim();
        return Err(if stderr.is_empty() {
            format!("pdm exited with status {}", output.code)
        } else {
            format!("pdm exited with status {}: {stderr}", output.code)
        });
    }
    let location = output.stdout.trim();
    if location.is_empty() {
        return Err("pdm printed no venv location".to_string());
    }
    Ok(Utf8PathBuf::from(location))
}
