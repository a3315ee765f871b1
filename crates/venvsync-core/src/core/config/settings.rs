use std::collections::HashMap;
use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

const DEFAULT_POLL_MS: u64 = 500;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub verbose: u8,
    pub trace: bool,
    pub json: bool,
    pub project: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub(crate) fn toggle(&self, key: &str, default: bool) -> bool {
        match self.var(key) {
            Some(value) => {
                let lowered = value.trim().to_ascii_lowercase();
                !matches!(lowered.as_str(), "0" | "false" | "no" | "off" | "")
            }
            None => default,
        }
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) pdm: PdmConfig,
    pub(crate) sync: SyncConfig,
    pub(crate) selection: SelectionConfig,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment.
    ///
    /// # Errors
    /// Returns an error if a variable holds an unusable value or no data
    /// directory can be determined for the selection store.
    pub fn from_env() -> Result<Self> {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot) -> Result<Self> {
        let poll_ms = match snapshot.var("VENVSYNC_POLL_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or_else(|| anyhow!("VENVSYNC_POLL_MS must be a positive integer, got `{raw}`"))?,
            None => DEFAULT_POLL_MS,
        };
        let store = match snapshot.var("VENVSYNC_STATE").filter(|v| !v.trim().is_empty()) {
            Some(path) => Utf8PathBuf::from(path.trim()),
            None => default_store_path()?,
        };
        Ok(Self {
            pdm: PdmConfig {
                program: snapshot
                    .var("VENVSYNC_PDM")
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| v.trim().to_string()),
            },
            sync: SyncConfig {
                auto_select: snapshot.toggle("VENVSYNC_AUTO_SELECT", true),
                poll_interval: Duration::from_millis(poll_ms),
            },
            selection: SelectionConfig { store },
        })
    }

    #[must_use]
    pub fn pdm(&self) -> &PdmConfig {
        &self.pdm
    }

    #[must_use]
    pub fn sync(&self) -> &SyncConfig {
        &self.sync
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionConfig {
        &self.selection
    }
}

fn default_store_path() -> Result<Utf8PathBuf> {
    let base = dirs_next::data_local_dir()
        .ok_or_else(|| anyhow!("unable to determine a data directory; set VENVSYNC_STATE"))?;
    let base = Utf8PathBuf::from_path_buf(base)
        .map_err(|path| anyhow!("data directory is not UTF-8: {}", path.display()))?;
    Ok(base.join("venvsync").join("active.json"))
}

#[derive(Debug, Clone)]
pub struct PdmConfig {
    /// Explicit executable; `None` means look up `pdm` on PATH.
    pub program: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
    pub auto_select: bool,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct SelectionConfig {
    pub store: Utf8PathBuf,
}
