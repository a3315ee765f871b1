use std::fmt;
use std::fs;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use toml_edit::DocumentMut;

use crate::error::DomainError;
use crate::marker::MARKER_FILE;

/// Top-level directory of a pdm-managed project.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectRoot {
    path: Utf8PathBuf,
}

impl ProjectRoot {
    /// Accepts an absolute path or a drive-letter path. A Windows verbatim
    /// prefix (`\\?\C:\...`) is dropped so the root hashes like pdm's.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();
        let path = match strip_verbatim(path.as_str()) {
            Some(plain) => Utf8PathBuf::from(plain),
            None => path,
        };
        let absolute = path.is_absolute() || has_drive_prefix(path.as_str());
        let root = Self { path };
        if !absolute || root.name().is_empty() {
            return Err(DomainError::NoProjectContext {
                path: root.path.to_string(),
            });
        }
        Ok(root)
    }

    pub fn from_std_path(path: &Path) -> Result<Self, DomainError> {
        let utf8 = Utf8Path::from_path(path).ok_or_else(|| DomainError::NonUtf8Path {
            path: path.display().to_string(),
        })?;
        Self::new(utf8)
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Last segment of the root, which pdm uses verbatim as the venv prefix.
    pub fn name(&self) -> &str {
        let trimmed = self.path.as_str().trim_end_matches(['/', '\\']);
        trimmed
            .rsplit(['/', '\\'])
            .next()
            .filter(|segment| !segment.ends_with(':'))
            .unwrap_or("")
    }

    pub fn uri_path(&self) -> String {
        uri_path(self.path.as_str())
    }

    pub fn canonical_path(&self) -> String {
        canonicalize(&self.uri_path())
    }

    pub fn marker_path(&self) -> Utf8PathBuf {
        self.path.join(MARKER_FILE)
    }

    /// Key under which the selected interpreter for this project is stored.
    pub fn scope(&self) -> &str {
        self.path.as_str()
    }
}

impl fmt::Display for ProjectRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.path.fmt(f)
    }
}

/// Converts a native path into the slash-separated path component form.
///
/// Drive-letter paths such as `C:\work\app` become `/C:/work/app`; anything
/// else is returned as-is.
pub fn uri_path(native: &str) -> String {
    if has_drive_prefix(native) {
        format!("/{}", native.replace('\\', "/"))
    } else {
        native.to_string()
    }
}

/// Rewrites a path component into the form pdm feeds to its hash.
///
/// pdm hashes a posix path with an uppercase drive letter, so `/c:/x` must be
/// turned into `/C:/x` before hashing. Every other shape is left untouched.
pub fn canonicalize(path: &str) -> String {
    let bytes = path.as_bytes();
    if bytes.len() >= 3 && bytes[0] == b'/' && bytes[2] == b':' {
        // bytes[2] is ASCII, so bytes[1] is a complete single-byte char.
        let drive = path[1..2].to_ascii_uppercase();
        return format!("/{drive}{}", &path[2..]);
    }
    path.to_string()
}

fn strip_verbatim(native: &str) -> Option<&str> {
    native
        .strip_prefix(r"\\?\")
        .filter(|rest| has_drive_prefix(rest))
}

fn has_drive_prefix(native: &str) -> bool {
    let bytes = native.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'\\' || bytes[2] == b'/')
}

/// Walks up from `start` to the nearest directory pdm would treat as the
/// project root: one holding a `pyproject.toml` or a `.pdm-python` marker.
///
/// The nearest `pyproject.toml` wins even without a `[tool.pdm]` table, since
/// pdm hashes that directory. It must still parse as TOML.
pub fn discover_project_root(start: &Utf8Path) -> Result<ProjectRoot, DomainError> {
    let mut dir = start.to_path_buf();
    loop {
        let pyproject = dir.join("pyproject.toml");
        if pyproject.is_file() {
            ensure_valid_pyproject(&pyproject)?;
            return ProjectRoot::new(dir);
        }
        if dir.join(MARKER_FILE).is_file() {
            return ProjectRoot::new(dir);
        }
        if !dir.pop() {
            break;
        }
    }
    Err(DomainError::NoProjectContext {
        path: start.to_string(),
    })
}

fn ensure_valid_pyproject(path: &Utf8Path) -> Result<(), DomainError> {
    let invalid = |reason: String| DomainError::InvalidPyproject {
        path: path.to_path_buf(),
        reason,
    };
    let contents = fs::read_to_string(path).map_err(|err| invalid(err.to_string()))?;
    contents
        .parse::<DocumentMut>()
        .map_err(|err| invalid(format!("{err}")))?;
    Ok(())
}
