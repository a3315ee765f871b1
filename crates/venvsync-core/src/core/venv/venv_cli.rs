use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use venvsync_domain::{
    environment_hash, list_environments, read_active_binary, read_prompt, resolve_active,
    HashedPrefix, ProjectRoot,
};

use super::errors::{domain_outcome, outcome_from_error};
use crate::effects::PdmStorageRoot;
use crate::outcome::{ExecutionOutcome, UserError};
use crate::watch::{MarkerEventKind, WatchRegistry};
use crate::CommandContext;

pub struct VenvListRequest;

pub struct VenvCurrentRequest;

#[derive(Clone, Debug)]
pub struct VenvUseRequest {
    pub name: String,
}

#[derive(Clone, Debug, Default)]
pub struct VenvSyncRequest {
    /// Sync even when auto-select is turned off in the configuration.
    pub force: bool,
}

#[derive(Clone, Debug, Default)]
pub struct VenvHashRequest {
    pub path: Option<String>,
}

#[derive(Clone, Debug)]
pub struct VenvWatchRequest {
    pub shutdown: Arc<AtomicBool>,
}

/// Lists the pdm venvs that belong to the current project.
///
/// # Errors
/// Returns the domain error when no project is found or pdm cannot report
/// its venv storage root.
pub fn venv_list(ctx: &CommandContext, _request: &VenvListRequest) -> Result<ExecutionOutcome> {
    let root = ctx.project_root()?;
    let environments = list_environments(&root, &PdmStorageRoot(ctx.effects().pdm()))?;
    let active = match read_active_binary(&root) {
        Ok(binary) => Some(binary),
        Err(err) if err.is_routine() => None,
        Err(err) => {
            warn!(root = %root, "{err}");
            None
        }
    };

    let rows: Vec<Value> = environments
        .iter()
        .map(|(name, path)| {
            let is_active = active
                .as_ref()
                .is_some_and(|binary| binary.starts_with(path));
            json!({
                "name": name,
                "path": path,
                "prompt": read_prompt(path),
                "active": is_active,
            })
        })
        .collect();
    let details = json!({ "project": root.path(), "environments": rows });

    if environments.is_empty() {
        return Ok(ExecutionOutcome::success(
            format!("no environments found for {root}"),
            merge_hint(details, "create one with `pdm venv create --name <NAME>`"),
        ));
    }
    let summary = environments
        .iter()
        .map(|(name, path)| {
            let flag = if active.as_ref().is_some_and(|b| b.starts_with(path)) {
                "*"
            } else {
                " "
            };
            format!("{flag} {name}  {path}")
        })
        .collect::<Vec<_>>()
        .join("\n");
    Ok(ExecutionOutcome::success(
        format!("environments for {}:\n{summary}", root.name()),
        details,
    ))
}

/// Reports the interpreter pdm currently has selected for the project.
///
/// A missing marker is answered with a user-error outcome rather than `Err`.
pub fn venv_current(
    ctx: &CommandContext,
    _request: &VenvCurrentRequest,
) -> Result<ExecutionOutcome> {
    let root = ctx.project_root()?;
    let (binary, name) = match resolve_active(&root) {
        Ok(active) => active,
        Err(err) if err.is_routine() => {
            debug!(root = %root, "{err}");
            return Ok(domain_outcome(&err));
        }
        Err(err) => return Err(err.into()),
    };
    let prompt = venv_dir_of(&binary).and_then(|dir| read_prompt(&dir));
    let selected = ctx.effects().selector().get_active(root.scope())?;
    let in_sync = selected.as_ref() == Some(&binary);
    Ok(ExecutionOutcome::success(
        format!("active environment: {name}"),
        json!({
            "project": root.path(),
            "name": name.as_str(),
            "managed": name.is_managed(),
            "interpreter": binary,
            "prompt": prompt,
            "selected": selected,
            "in_sync": in_sync,
        }),
    ))
}

/// Switches pdm to the named venv and syncs the selection.
pub fn venv_use(ctx: &CommandContext, request: &VenvUseRequest) -> Result<ExecutionOutcome> {
    let root = ctx.project_root()?;
    let pdm = ctx.effects().pdm();
    let environments = list_environments(&root, &PdmStorageRoot(pdm))?;
    if !environments.contains_key(&request.name) {
        let known: Vec<&str> = environments.keys().map(String::as_str).collect();
        let hint = if known.is_empty() {
            "no environments exist yet; create one with `pdm venv create --name <NAME>`"
                .to_string()
        } else {
            format!("available environments: {}", known.join(", "))
        };
        return Err(UserError::new(
            format!("unknown environment `{}`", request.name),
            json!({ "name": request.name, "available": known, "hint": hint }),
        )
        .into());
    }

    info!(root = %root, name = %request.name, "switching pdm venv");
    let output = pdm.use_venv(&root, &request.name)?;
    if !output.success() {
        let message = format!("pdm use --venv {} failed", request.name);
        ctx.effects().notifier().error(&message);
        return Ok(ExecutionOutcome::failure(
            message,
            json!({
                "name": request.name,
                "code": output.code,
                "stdout": output.stdout,
                "stderr": output.stderr,
            }),
        ));
    }

    let action = ctx.session().sync_once(&root)?;
    Ok(ExecutionOutcome::success(
        format!("now using environment {}", request.name),
        action.details(&root),
    ))
}

pub fn venv_sync(ctx: &CommandContext, request: &VenvSyncRequest) -> Result<ExecutionOutcome> {
    let root = ctx.project_root()?;
    let mut session = ctx.session();
    let action = if request.force {
        match session.on_config_change(&root, true)? {
            Some(action) => action,
            None => session.sync_once(&root)?,
        }
    } else {
        session.sync_once(&root)?
    };
    Ok(ExecutionOutcome::success(
        action.message(&root),
        action.details(&root),
    ))
}

/// Shows how pdm names venvs for a project path.
pub fn venv_hash(ctx: &CommandContext, request: &VenvHashRequest) -> Result<ExecutionOutcome> {
    let root = match &request.path {
        Some(path) => ProjectRoot::new(Utf8PathBuf::from(path))?,
        None => ctx.project_root()?,
    };
    let canonical = root.canonical_path();
    let hash = environment_hash(&canonical);
    let prefix = HashedPrefix::for_root(&root);
    Ok(ExecutionOutcome::success(
        prefix.to_string(),
        json!({
            "project": root.path(),
            "canonical": canonical,
            "hash": hash.as_str(),
            "prefix": prefix.as_str(),
        }),
    ))
}

/// Watches the marker and syncs on every change until `shutdown` is set.
///
/// # Errors
/// Returns an error when the watcher cannot be started.
pub fn venv_watch(ctx: &CommandContext, request: &VenvWatchRequest) -> Result<ExecutionOutcome> {
    let root = ctx.project_root()?;
    let mut registry = WatchRegistry::new();
    registry.start(&root)?;
    info!(root = %root, "watching {}", root.marker_path());

    let session = ctx.session();
    let notifier = ctx.effects().notifier();
    let interval = ctx.config().sync().poll_interval;
    let mut passes = 0usize;
    let mut run_pass = |root: &ProjectRoot| {
        passes += 1;
        match session.sync_once(root) {
            Ok(action) => debug!(root = %root, ?action, "sync pass complete"),
            Err(err) => {
                let outcome = outcome_from_error(err);
                warn!(root = %root, "{}", outcome.message);
                notifier.error(&outcome.message);
            }
        }
    };

    run_pass(&root);
    while !request.shutdown.load(Ordering::SeqCst) {
        for event in registry.wait_for_changes(interval, interval / 4) {
            if event.kind == MarkerEventKind::Removed {
                info!(root = %event.root, "interpreter marker removed");
            }
            run_pass(&event.root);
        }
    }
    registry.stop_all();

    Ok(ExecutionOutcome::success(
        format!("stopped watching {root}"),
        json!({ "project": root.path(), "passes": passes }),
    ))
}

fn venv_dir_of(binary: &Utf8Path) -> Option<Utf8PathBuf> {
    binary.parent()?.parent().map(Utf8Path::to_path_buf)
}

fn merge_hint(mut details: Value, hint: &str) -> Value {
    if let Some(map) = details.as_object_mut() {
        map.insert("hint".to_string(), Value::String(hint.to_string()));
    }
    details
}
