use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;

use anyhow::{bail, Result};
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;
use venvsync_domain::{DomainError, ProjectRoot};

use crate::core::runtime::process::RunOutput;
use crate::effects::{EnvironmentSelector, Effects, Notifier, PdmClient};

pub(crate) fn project_with_storage() -> (TempDir, ProjectRoot, Utf8PathBuf) {
    let temp = tempfile::tempdir().expect("tempdir");
    let base = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 tempdir");
    let project = base.join("proj");
    let storage = base.join("venvs");
    fs::create_dir_all(&project).expect("project dir");
    fs::create_dir_all(&storage).expect("storage dir");
    (temp, ProjectRoot::new(project).expect("root"), storage)
}

#[derive(Default)]
pub(crate) struct FakePdm {
    pub(crate) storage: Option<Utf8PathBuf>,
    pub(crate) use_exit_code: i32,
    pub(crate) used: Mutex<Vec<String>>,
}

impl PdmClient for FakePdm {
    fn venv_location(&self, root: &ProjectRoot) -> Result<Utf8PathBuf, DomainError> {
        self.storage
            .clone()
            .ok_or_else(|| DomainError::StorageRootUnavailable {
                root: root.path().to_path_buf(),
                reason: "failed to start pdm".to_string(),
            })
    }

    fn use_venv(&self, root: &ProjectRoot, name: &str) -> Result<RunOutput> {
        self.used.lock().unwrap().push(name.to_string());
        if self.use_exit_code != 0 {
            return Ok(RunOutput {
                code: self.use_exit_code,
                stdout: String::new(),
                stderr: format!("cannot use {name}"),
            });
        }
        // Mirror pdm: record the venv interpreter in the marker.
        let Some(storage) = &self.storage else {
            bail!("no storage configured");
        };
        let prefix = venvsync_domain::HashedPrefix::for_root(root);
        let binary = venvsync_domain::interpreter_in(&storage.join(prefix.dir_name(name)));
        fs::write(root.marker_path(), format!("{binary}\n"))?;
        Ok(RunOutput {
            code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

#[derive(Default)]
pub(crate) struct MemorySelector {
    records: Mutex<HashMap<String, Utf8PathBuf>>,
}

impl EnvironmentSelector for MemorySelector {
    fn get_active(&self, scope: &str) -> Result<Option<Utf8PathBuf>> {
        Ok(self.records.lock().unwrap().get(scope).cloned())
    }

    fn set_active(&self, path: &Utf8Path, scope: &str) -> Result<()> {
        self.records
            .lock()
            .unwrap()
            .insert(scope.to_string(), path.to_path_buf());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn info(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("info: {message}"));
    }

    fn error(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("error: {message}"));
    }
}

#[derive(Default)]
pub(crate) struct FakeEffects {
    pub(crate) pdm: FakePdm,
    pub(crate) selector: MemorySelector,
    pub(crate) notifier: RecordingNotifier,
}

impl FakeEffects {
    pub(crate) fn with_storage(storage: &Utf8Path) -> Self {
        Self {
            pdm: FakePdm {
                storage: Some(storage.to_path_buf()),
                ..FakePdm::default()
            },
            ..Self::default()
        }
    }

    pub(crate) fn active(&self, scope: &str) -> Option<Utf8PathBuf> {
        self.selector.get_active(scope).unwrap()
    }

    pub(crate) fn notifications(&self) -> Vec<String> {
        self.notifier.messages.lock().unwrap().clone()
    }
}

impl Effects for FakeEffects {
    fn pdm(&self) -> &dyn PdmClient {
        &self.pdm
    }

    fn selector(&self) -> &dyn EnvironmentSelector {
        &self.selector
    }

    fn notifier(&self) -> &dyn Notifier {
        &self.notifier
    }
}
