use std::collections::BTreeMap;
use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::DomainError;
use crate::hash::HashedPrefix;
use crate::root::ProjectRoot;

/// Short venv name mapped to the venv directory.
pub type Environments = BTreeMap<String, Utf8PathBuf>;

/// Answers where pdm keeps its venvs (`pdm config venv.location`).
pub trait StorageRootSource {
    fn storage_root(&self, root: &ProjectRoot) -> Result<Utf8PathBuf, DomainError>;
}

/// Lists every venv pdm created for `root`.
///
/// A storage root that does not exist yet simply has no venvs. Failing to
/// find out where the storage root is propagates as
/// [`DomainError::StorageRootUnavailable`].
pub fn list_environments(
    root: &ProjectRoot,
    source: &dyn StorageRootSource,
) -> Result<Environments, DomainError> {
    let storage = source.storage_root(root)?;
    scan_storage(root, &storage)
}

/// Scans `storage` for directories carrying the project's hashed prefix.
///
/// Entries are visited in name order so the result never depends on the
/// platform's listing order. Since the prefix is fixed per project, two
/// distinct directory names can never strip to the same short name.
pub fn scan_storage(root: &ProjectRoot, storage: &Utf8Path) -> Result<Environments, DomainError> {
    let unreadable = |source: io::Error| DomainError::StorageRootUnreadable {
        storage: storage.to_path_buf(),
        source,
    };
    let entries = match fs::read_dir(storage) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Environments::new()),
        Err(err) => return Err(unreadable(err)),
    };

    let prefix = HashedPrefix::for_root(root);
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(unreadable)?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if prefix.strip(&name).is_some() && entry.path().is_dir() {
            names.push(name);
        }
    }
    names.sort();

    let mut environments = Environments::new();
    for name in names {
        if let Some(short) = prefix.strip(&name) {
            environments.insert(short.to_string(), storage.join(&name));
        }
    }
    Ok(environments)
}
