use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use color_eyre::{eyre::eyre, Result};
use tracing::debug;
use venvsync_core::{
    outcome_from_error, venv_current, venv_hash, venv_list, venv_sync, venv_use, venv_watch,
    CommandContext, ExecutionOutcome, VenvCurrentRequest, VenvHashRequest, VenvListRequest,
    VenvSyncRequest, VenvUseRequest, VenvWatchRequest,
};

use crate::cli::CommandGroupCli;

/// Runs a parsed subcommand and returns the outcome to render.
///
/// `completions` is handled before a context exists and never reaches here.
pub fn dispatch_command(ctx: &CommandContext, group: &CommandGroupCli) -> Result<ExecutionOutcome> {
    match group {
        CommandGroupCli::List => core_call("list", || venv_list(ctx, &VenvListRequest)),
        CommandGroupCli::Current => core_call("current", || venv_current(ctx, &VenvCurrentRequest)),
        CommandGroupCli::Use(args) => {
            let request = VenvUseRequest {
                name: args.name.clone(),
            };
            core_call("use", || venv_use(ctx, &request))
        }
        CommandGroupCli::Sync(args) => {
            let request = VenvSyncRequest { force: args.force };
            core_call("sync", || venv_sync(ctx, &request))
        }
        CommandGroupCli::Watch => {
            let request = VenvWatchRequest {
                shutdown: install_shutdown_flag()?,
            };
            core_call("watch", || venv_watch(ctx, &request))
        }
        CommandGroupCli::Hash(args) => {
            let request = VenvHashRequest {
                path: args.path.clone(),
            };
            core_call("hash", || venv_hash(ctx, &request))
        }
        CommandGroupCli::Completions(_) => Err(eyre!("completions are generated before dispatch")),
    }
}

fn core_call<F>(name: &str, action: F) -> Result<ExecutionOutcome>
where
    F: FnOnce() -> anyhow::Result<ExecutionOutcome>,
{
    debug!(command = name, "dispatching");
    Ok(action().unwrap_or_else(outcome_from_error))
}

fn install_shutdown_flag() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .map_err(|err| eyre!("failed to install Ctrl-C handler: {err}"))?;
    Ok(flag)
}
