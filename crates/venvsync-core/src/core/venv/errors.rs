use serde_json::json;
use venvsync_domain::DomainError;

use crate::outcome::{ExecutionOutcome, UserError};
use crate::watch::WatchError;

pub const MISSING_PROJECT_HINT: &str =
    "run inside a pdm project (pyproject.toml with [tool.pdm]) or pass --project <DIR>";

/// Turns a handler error into the outcome shown to the user.
pub fn outcome_from_error(err: anyhow::Error) -> ExecutionOutcome {
    let err = match err.downcast::<UserError>() {
        Ok(user) => return user.into_outcome(),
        Err(err) => err,
    };
    if let Some(domain) = err.downcast_ref::<DomainError>() {
        return domain_outcome(domain);
    }
    if let Some(WatchError::Start { root, source }) = err.downcast_ref::<WatchError>() {
        return ExecutionOutcome::failure(
            format!("unable to watch {root}"),
            json!({ "project": root, "reason": source.to_string() }),
        );
    }
    ExecutionOutcome::failure(
        format!("{err:#}"),
        json!({ "reason": err.to_string() }),
    )
}

pub fn domain_outcome(err: &DomainError) -> ExecutionOutcome {
    match err {
        DomainError::NoProjectContext { path } => ExecutionOutcome::user_error(
            "no pdm project found",
            json!({ "path": path, "hint": MISSING_PROJECT_HINT }),
        ),
        DomainError::MarkerFileMissing { root, marker } => ExecutionOutcome::user_error(
            format!("no interpreter recorded for {root}"),
            json!({
                "project": root,
                "marker": marker,
                "recorded": false,
                "hint": "run `pdm use` to select an interpreter for this project",
            }),
        ),
        DomainError::MarkerFileUnreadable { marker, source } => ExecutionOutcome::failure(
            format!("unable to read {marker}"),
            json!({ "marker": marker, "reason": source.to_string() }),
        ),
        DomainError::StorageRootUnavailable { root, reason } => ExecutionOutcome::failure(
            "unable to locate pdm's venv storage",
            json!({
                "project": root,
                "reason": reason,
                "hint": "ensure pdm is installed and on PATH, or set VENVSYNC_PDM",
            }),
        ),
        DomainError::StorageRootUnreadable { storage, source } => ExecutionOutcome::failure(
            format!("unable to list {storage}"),
            json!({ "storage": storage, "reason": source.to_string() }),
        ),
        DomainError::InvalidPyproject { path, reason } => ExecutionOutcome::user_error(
            format!("invalid pyproject.toml at {path}"),
            json!({ "path": path, "reason": reason }),
        ),
        DomainError::NonUtf8Path { path } => ExecutionOutcome::user_error(
            "path is not valid UTF-8",
            json!({ "path": path }),
        ),
    }
}
