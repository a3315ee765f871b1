#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::assert::Assert;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;
use venvsync_domain::{HashedPrefix, ProjectRoot};

const FAKE_PDM: &str = r#"#!/bin/sh
case "$1" in
  config)
    if [ -z "$FAKE_PDM_STORAGE" ]; then
      echo "venv.location is not configured" >&2
      exit 1
    fi
    echo "$FAKE_PDM_STORAGE"
    ;;
  use)
    if [ -n "$FAKE_PDM_FAIL_USE" ]; then
      echo "pdm refused to switch" >&2
      exit 1
    fi
    dir="$FAKE_PDM_STORAGE/$FAKE_PDM_PREFIX$3"
    if [ ! -d "$dir" ]; then
      echo "No virtualenv with key '$3' is found" >&2
      exit 1
    fi
    echo "$dir/bin/python" > .pdm-python
    ;;
  *)
    echo "unsupported: $*" >&2
    exit 2
    ;;
esac
"#;

/// A pdm project next to a venv storage directory and a fake `pdm`.
pub struct Sandbox {
    _temp: TempDir,
    pub project: PathBuf,
    pub storage: PathBuf,
    pub state: PathBuf,
    pub pdm: PathBuf,
    pub prefix: String,
}

impl Sandbox {
    pub fn new() -> Self {
        let temp = tempfile::Builder::new()
            .prefix("venvsync-cli")
            .tempdir()
            .expect("tempdir");
        let base = temp.path().canonicalize().expect("canonical tempdir");
        let project = base.join("proj");
        let storage = base.join("venvs");
        fs::create_dir_all(&project).expect("project dir");
        fs::create_dir_all(&storage).expect("storage dir");
        fs::write(
            project.join("pyproject.toml"),
            "[project]\nname = \"proj\"\nversion = \"0.1.0\"\n\n[tool.pdm]\ndistribution = false\n",
        )
        .expect("pyproject");

        let pdm = base.join("fake-pdm");
        fs::write(&pdm, FAKE_PDM).expect("fake pdm");
        let mut perms = fs::metadata(&pdm).expect("pdm metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&pdm, perms).expect("pdm permissions");

        let root = ProjectRoot::from_std_path(&project).expect("project root");
        let prefix = HashedPrefix::for_root(&root).as_str().to_string();
        Self {
            state: base.join("state").join("active.json"),
            _temp: temp,
            project,
            storage,
            pdm,
            prefix,
        }
    }

    /// Creates `<storage>/<prefix><name>/bin` and returns the venv dir.
    pub fn create_venv(&self, name: &str) -> PathBuf {
        self.create_foreign_venv(&format!("{}{name}", self.prefix))
    }

    pub fn create_foreign_venv(&self, dir_name: &str) -> PathBuf {
        let venv = self.storage.join(dir_name);
        fs::create_dir_all(venv.join("bin")).expect("venv dir");
        fs::write(venv.join("pyvenv.cfg"), format!("prompt = {dir_name}\n")).expect("pyvenv.cfg");
        venv
    }

    pub fn command(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("venvsync");
        cmd.current_dir(&self.project)
            .env("VENVSYNC_PDM", &self.pdm)
            .env("VENVSYNC_STATE", &self.state)
            .env("FAKE_PDM_STORAGE", &self.storage)
            .env("FAKE_PDM_PREFIX", &self.prefix)
            .env_remove("VENVSYNC_AUTO_SELECT")
            .env("NO_COLOR", "1");
        cmd
    }

    pub fn state_json(&self) -> Value {
        let contents = fs::read_to_string(&self.state).expect("state file");
        serde_json::from_str(&contents).expect("state json")
    }

    pub fn scope(&self) -> String {
        self.project.to_str().expect("utf8 project").to_string()
    }
}

pub fn parse_json(assert: &Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("valid json")
}

pub fn python_in(venv: &Path) -> String {
    venv.join("bin").join("python").to_str().expect("utf8").to_string()
}
