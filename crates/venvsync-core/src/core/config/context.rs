use std::env;
use std::sync::OnceLock;

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use venvsync_domain::{discover_project_root, DomainError, ProjectRoot};

use crate::config::{Config, GlobalOptions};
use crate::effects::{Effects, SharedEffects};
use crate::sync::SyncSession;

pub struct CommandContext<'a> {
    pub global: &'a GlobalOptions,
    config: Config,
    project_root: OnceLock<ProjectRoot>,
    effects: SharedEffects,
}

impl<'a> CommandContext<'a> {
    #[must_use]
    pub fn new(global: &'a GlobalOptions, config: Config, effects: SharedEffects) -> Self {
        Self {
            global,
            config,
            project_root: OnceLock::new(),
            effects,
        }
    }

    pub fn effects(&self) -> &dyn Effects {
        self.effects.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> SyncSession<'_> {
        SyncSession::new(self.effects(), self.config.sync().auto_select)
    }

    /// Resolves the project root from `--project` or by walking up from the
    /// working directory.
    ///
    /// # Errors
    /// Returns [`DomainError::NoProjectContext`] (wrapped) when no pdm project
    /// can be found, or an error if the working directory is unusable.
    pub fn project_root(&self) -> Result<ProjectRoot> {
        if let Some(root) = self.project_root.get() {
            return Ok(root.clone());
        }
        let cwd = env::current_dir()?;
        let cwd = Utf8PathBuf::from_path_buf(cwd)
            .map_err(|path| DomainError::NonUtf8Path {
                path: path.display().to_string(),
            })?;
        let root = match self.global.project.as_deref() {
            Some(explicit) => {
                let path = cwd.join(explicit);
                if !path.is_dir() {
                    return Err(DomainError::NoProjectContext {
                        path: path.to_string(),
                    }
                    .into());
                }
                ProjectRoot::new(normalize(&path))?
            }
            None => discover_project_root(&cwd)?,
        };
        let _ = self.project_root.set(root.clone());
        Ok(root)
    }
}

// Collapses `.` and `..` so the basename pdm hashes matches ours. `dunce`
// keeps Windows paths in `C:\...` form rather than `\\?\C:\...`.
fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    dunce::canonicalize(path)
        .ok()
        .and_then(|resolved| Utf8PathBuf::from_path_buf(resolved).ok())
        .unwrap_or_else(|| path.to_path_buf())
}
