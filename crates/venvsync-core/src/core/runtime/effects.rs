use std::sync::Arc;

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use venvsync_domain::{DomainError, ProjectRoot, StorageRootSource};

use super::pdm::SystemPdm;
use super::process::RunOutput;
use crate::config::Config;
use crate::selection::SelectionStore;

/// The dependency manager, seen only through the two commands we need.
pub trait PdmClient: Send + Sync {
    /// `pdm config venv.location`, trimmed.
    fn venv_location(&self, root: &ProjectRoot) -> Result<Utf8PathBuf, DomainError>;
    /// `pdm use --venv <name>`; the output is returned but not interpreted.
    fn use_venv(&self, root: &ProjectRoot, name: &str) -> Result<RunOutput>;
}

/// Host-side record of which interpreter is active for a scope.
pub trait EnvironmentSelector: Send + Sync {
    fn get_active(&self, scope: &str) -> Result<Option<Utf8PathBuf>>;
    fn set_active(&self, path: &Utf8Path, scope: &str) -> Result<()>;
}

pub trait Notifier: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

pub trait Effects: Send + Sync {
    fn pdm(&self) -> &dyn PdmClient;
    fn selector(&self) -> &dyn EnvironmentSelector;
    fn notifier(&self) -> &dyn Notifier;
}

pub type SharedEffects = Arc<dyn Effects>;

/// Adapts a [`PdmClient`] to the enumerator's storage-root lookup.
pub struct PdmStorageRoot<'a>(pub &'a dyn PdmClient);

impl StorageRootSource for PdmStorageRoot<'_> {
    fn storage_root(&self, root: &ProjectRoot) -> Result<Utf8PathBuf, DomainError> {
        self.0.venv_location(root)
    }
}

pub struct SystemEffects {
    pdm: Arc<SystemPdm>,
    selector: Arc<SelectionStore>,
    notifier: Arc<dyn Notifier>,
}

impl SystemEffects {
    #[must_use]
    pub fn new(config: &Config, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            pdm: Arc::new(SystemPdm::new(config.pdm().program.clone())),
            selector: Arc::new(SelectionStore::new(config.selection().store.clone())),
            notifier,
        }
    }
}

impl Effects for SystemEffects {
    fn pdm(&self) -> &dyn PdmClient {
        self.pdm.as_ref()
    }

    fn selector(&self) -> &dyn EnvironmentSelector {
        self.selector.as_ref()
    }

    fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }
}

/// Routes notifications into the log only.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}
