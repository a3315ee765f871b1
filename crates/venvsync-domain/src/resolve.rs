use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::DomainError;
use crate::hash::HashedPrefix;
use crate::marker::read_active_binary;
use crate::root::ProjectRoot;

/// Display name for an interpreter.
///
/// `Raw` carries the interpreter path itself when it does not live in one of
/// the project's pdm venvs (a system Python, a manually picked one). It is a
/// valid result, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedName {
    Short(String),
    Raw(String),
}

impl ResolvedName {
    pub fn as_str(&self) -> &str {
        match self {
            ResolvedName::Short(name) | ResolvedName::Raw(name) => name,
        }
    }

    pub fn is_managed(&self) -> bool {
        matches!(self, ResolvedName::Short(_))
    }

    pub fn into_string(self) -> String {
        match self {
            ResolvedName::Short(name) | ResolvedName::Raw(name) => name,
        }
    }
}

impl fmt::Display for ResolvedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recovers the short venv name from an interpreter inside `<venv>/bin/`.
pub fn resolve(root: &ProjectRoot, binary: &Utf8Path) -> ResolvedName {
    let prefix = HashedPrefix::for_root(root);
    binary
        .parent()
        .and_then(Utf8Path::parent)
        .and_then(Utf8Path::file_name)
        .and_then(|venv_dir| prefix.strip(venv_dir))
        .map_or_else(
            || ResolvedName::Raw(binary.to_string()),
            |short| ResolvedName::Short(short.to_string()),
        )
}

pub fn resolve_name(root: &ProjectRoot, binary: &Utf8Path) -> String {
    resolve(root, binary).into_string()
}

/// Reads the marker and resolves the interpreter it records.
pub fn resolve_active(root: &ProjectRoot) -> Result<(Utf8PathBuf, ResolvedName), DomainError> {
    let binary = read_active_binary(root)?;
    let name = resolve(root, &binary);
    Ok((binary, name))
}

/// Interpreter path inside a venv directory for the host platform.
pub fn interpreter_in(venv_dir: &Utf8Path) -> Utf8PathBuf {
    if cfg!(windows) {
        venv_dir.join("Scripts").join("python.exe")
    } else {
        venv_dir.join("bin").join("python")
    }
}
