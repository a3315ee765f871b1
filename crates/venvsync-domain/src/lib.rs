#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

//! Recovers pdm's per-project virtualenv naming scheme.
//!
//! pdm names every venv it creates for a project `<project>-<hash>-<name>`,
//! where `<hash>` is derived from the project root path. Everything here is
//! pure or performs a single read; logging and presentation live in
//! `venvsync-core`.

pub mod enumerate;
pub mod error;
pub mod hash;
pub mod marker;
pub mod pyvenv;
pub mod resolve;
pub mod root;

pub use enumerate::{list_environments, scan_storage, Environments, StorageRootSource};
pub use error::DomainError;
pub use hash::{environment_hash, EnvironmentHash, HashedPrefix, HASH_LEN};
pub use marker::{read_active_binary, MARKER_FILE};
pub use pyvenv::{parse_pyvenv_cfg, read_prompt, PYVENV_CFG};
pub use resolve::{interpreter_in, resolve, resolve_active, resolve_name, ResolvedName};
pub use root::{canonicalize, discover_project_root, uri_path, ProjectRoot};
