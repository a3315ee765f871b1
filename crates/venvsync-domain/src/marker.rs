use std::fs;
use std::io;

use camino::Utf8PathBuf;

use crate::error::DomainError;
use crate::root::ProjectRoot;

/// File pdm writes at the project root to record the selected interpreter.
pub const MARKER_FILE: &str = ".pdm-python";

/// Reads the interpreter path pdm recorded for `root`.
///
/// A missing or blank marker yields [`DomainError::MarkerFileMissing`]; any
/// other read failure is [`DomainError::MarkerFileUnreadable`]. A relative
/// path in the marker is taken relative to the project root.
pub fn read_active_binary(root: &ProjectRoot) -> Result<Utf8PathBuf, DomainError> {
    let marker = root.marker_path();
    let contents = match fs::read_to_string(&marker) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(DomainError::MarkerFileMissing {
                root: root.path().to_path_buf(),
                marker,
            })
        }
        Err(source) => return Err(DomainError::MarkerFileUnreadable { marker, source }),
    };

    let recorded = contents.trim();
    if recorded.is_empty() {
        return Err(DomainError::MarkerFileMissing {
            root: root.path().to_path_buf(),
            marker,
        });
    }

    let binary = Utf8PathBuf::from(recorded);
    if binary.is_absolute() {
        Ok(binary)
    } else {
        Ok(root.path().join(binary))
    }
}
