use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;

use crate::effects::EnvironmentSelector;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActiveRecord {
    pub path: Utf8PathBuf,
    pub updated_at: String,
}

/// JSON file mapping a project scope to its selected interpreter.
pub struct SelectionStore {
    path: Utf8PathBuf,
    lock: Mutex<()>,
}

impl SelectionStore {
    #[must_use]
    pub fn new(path: Utf8PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn records(&self) -> Result<BTreeMap<String, ActiveRecord>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", self.path));
            }
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents)
            .with_context(|| format!("selection store {} is not valid JSON", self.path))
    }

    fn persist(&self, records: &BTreeMap<String, ActiveRecord>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("failed to create {parent}"))?;
        }
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| anyhow!("selection store path {} has no file name", self.path))?;
        let staging = self.path.with_file_name(format!(".{file_name}.tmp"));
        let payload = serde_json::to_string_pretty(records)?;
        fs::write(&staging, payload).with_context(|| format!("failed to write {staging}"))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("failed to replace {}", self.path))?;
        Ok(())
    }
}

impl EnvironmentSelector for SelectionStore {
    fn get_active(&self, scope: &str) -> Result<Option<Utf8PathBuf>> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("selection store lock poisoned"))?;
        Ok(self.records()?.remove(scope).map(|record| record.path))
    }

    fn set_active(&self, path: &Utf8Path, scope: &str) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("selection store lock poisoned"))?;
        let mut records = self.records()?;
        let updated_at = OffsetDateTime::now_utc().format(&Rfc3339)?;
        records.insert(
            scope.to_string(),
            ActiveRecord {
                path: path.to_path_buf(),
                updated_at,
            },
        );
        self.persist(&records)?;
        debug!(scope, %path, store = %self.path, "recorded active interpreter");
        Ok(())
    }
}
