#![deny(clippy::all)]

mod core;

pub(crate) use crate::core::config;
pub(crate) use crate::core::runtime::effects;
pub(crate) use crate::core::tooling::outcome;
pub(crate) use crate::core::{selection, sync, watch};

pub use crate::core::config::context::CommandContext;
pub use crate::core::config::{Config, GlobalOptions, PdmConfig, SelectionConfig, SyncConfig};
pub use crate::core::runtime::effects::{
    EnvironmentSelector, Effects, LogNotifier, Notifier, PdmClient, PdmStorageRoot,
    SharedEffects, SystemEffects,
};
pub use crate::core::runtime::process::RunOutput;
pub use crate::core::selection::{ActiveRecord, SelectionStore};
pub use crate::core::sync::{SyncAction, SyncSession};
pub use crate::core::tooling::outcome::{CommandStatus, ExecutionOutcome, UserError};
pub use crate::core::venv::errors::{outcome_from_error, MISSING_PROJECT_HINT};
pub use crate::core::venv::venv_cli::{
    venv_current, venv_hash, venv_list, venv_sync, venv_use, venv_watch, VenvCurrentRequest,
    VenvHashRequest, VenvListRequest, VenvSyncRequest, VenvUseRequest, VenvWatchRequest,
};
pub use crate::core::watch::{MarkerEvent, MarkerEventKind, WatchError, WatchRegistry};
