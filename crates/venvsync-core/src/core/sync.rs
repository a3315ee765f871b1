use anyhow::Result;
use camino::Utf8PathBuf;
use serde_json::{json, Value};
use tracing::{debug, info};
use venvsync_domain::{resolve_active, DomainError, ProjectRoot, ResolvedName};

use crate::effects::Effects;

/// What a single synchronisation pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    Disabled,
    NoInterpreterRecorded,
    AlreadyActive {
        binary: Utf8PathBuf,
        name: ResolvedName,
    },
    Switched {
        binary: Utf8PathBuf,
        name: ResolvedName,
        previous: Option<Utf8PathBuf>,
    },
}

impl SyncAction {
    #[must_use]
    pub fn message(&self, root: &ProjectRoot) -> String {
        match self {
            SyncAction::Disabled => "auto-select is disabled; nothing synced".to_string(),
            SyncAction::NoInterpreterRecorded => {
                format!("no interpreter recorded for {root}")
            }
            SyncAction::AlreadyActive { name, .. } => {
                format!("environment {name} is already active")
            }
            SyncAction::Switched { name, .. } => format!("switched to environment {name}"),
        }
    }

    #[must_use]
    pub fn details(&self, root: &ProjectRoot) -> Value {
        let base = json!({ "project": root.path() });
        let extra = match self {
            SyncAction::Disabled => json!({ "action": "disabled" }),
            SyncAction::NoInterpreterRecorded => json!({
                "action": "none",
                "recorded": false,
                "hint": "run `pdm use` to select an interpreter for this project",
            }),
            SyncAction::AlreadyActive { binary, name } => json!({
                "action": "unchanged",
                "recorded": true,
                "interpreter": binary,
                "name": name.as_str(),
                "managed": name.is_managed(),
            }),
            SyncAction::Switched {
                binary,
                name,
                previous,
            } => json!({
                "action": "switched",
                "recorded": true,
                "interpreter": binary,
                "name": name.as_str(),
                "managed": name.is_managed(),
                "previous": previous,
            }),
        };
        merge(base, extra)
    }
}

fn merge(mut base: Value, extra: Value) -> Value {
    if let (Some(target), Value::Object(source)) = (base.as_object_mut(), extra) {
        target.extend(source);
    }
    base
}

/// Pushes pdm's recorded interpreter into the environment selector.
pub struct SyncSession<'a> {
    effects: &'a dyn Effects,
    auto_select: bool,
}

impl<'a> SyncSession<'a> {
    #[must_use]
    pub fn new(effects: &'a dyn Effects, auto_select: bool) -> Self {
        Self {
            effects,
            auto_select,
        }
    }

    /// Reads the marker and updates the selector when it disagrees.
    ///
    /// # Errors
    /// Returns the domain error for an unreadable marker, or the selector's
    /// error when the active record cannot be read or written.
    pub fn sync_once(&self, root: &ProjectRoot) -> Result<SyncAction> {
        if !self.auto_select {
            debug!(root = %root, "auto-select disabled, skipping sync");
            return Ok(SyncAction::Disabled);
        }

        let (binary, name) = match resolve_active(root) {
            Ok(active) => active,
            Err(err @ DomainError::MarkerFileMissing { .. }) => {
                debug!(root = %root, "{err}");
                return Ok(SyncAction::NoInterpreterRecorded);
            }
            Err(err) => return Err(err.into()),
        };

        let selector = self.effects.selector();
        let previous = selector.get_active(root.scope())?;
        if previous.as_ref() == Some(&binary) {
            debug!(root = %root, %binary, "interpreter already active");
            return Ok(SyncAction::AlreadyActive { binary, name });
        }

        selector.set_active(&binary, root.scope())?;
        info!(root = %root, %binary, name = %name, "selected interpreter");
        self.effects
            .notifier()
            .info(&format!("Switched to environment {name}"));
        Ok(SyncAction::Switched {
            binary,
            name,
            previous,
        })
    }

    /// Applies a new auto-select setting; turning it on syncs immediately.
    ///
    /// # Errors
    /// Propagates errors from [`SyncSession::sync_once`].
    pub fn on_config_change(
        &mut self,
        root: &ProjectRoot,
        auto_select: bool,
    ) -> Result<Option<SyncAction>> {
        let was_enabled = std::mem::replace(&mut self.auto_select, auto_select);
        if auto_select && !was_enabled {
            return self.sync_once(root).map(Some);
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::core::test_support::{project_with_storage, FakeEffects};
    use venvsync_domain::HashedPrefix;

    #[test]
    fn missing_marker_is_not_an_error() {
        let (_temp, root, _storage) = project_with_storage();
        let effects = FakeEffects::default();
        let session = SyncSession::new(&effects, true);
        assert_eq!(
            session.sync_once(&root).unwrap(),
            SyncAction::NoInterpreterRecorded
        );
        assert!(effects.notifications().is_empty());
    }

    #[test]
    fn switches_then_reports_unchanged() {
        let (_temp, root, storage) = project_with_storage();
        let prefix = HashedPrefix::for_root(&root);
        let binary = storage.join(prefix.dir_name("dev")).join("bin").join("python");
        fs::write(root.marker_path(), format!("{binary}\n")).unwrap();

        let effects = FakeEffects::default();
        let session = SyncSession::new(&effects, true);

        let first = session.sync_once(&root).unwrap();
        assert_eq!(
            first,
            SyncAction::Switched {
                binary: binary.clone(),
                name: ResolvedName::Short("dev".into()),
                previous: None,
            }
        );
        assert_eq!(effects.active(root.scope()), Some(binary.clone()));
        assert_eq!(effects.notifications(), ["info: Switched to environment dev"]);

        let second = session.sync_once(&root).unwrap();
        assert!(matches!(second, SyncAction::AlreadyActive { .. }));
        assert_eq!(effects.notifications().len(), 1);
    }

    #[test]
    fn foreign_interpreter_is_selected_under_its_path() {
        let (_temp, root, _storage) = project_with_storage();
        fs::write(root.marker_path(), "/usr/bin/python3").unwrap();
        let effects = FakeEffects::default();
        let action = SyncSession::new(&effects, true).sync_once(&root).unwrap();
        match action {
            SyncAction::Switched { name, .. } => {
                assert_eq!(name, ResolvedName::Raw("/usr/bin/python3".into()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn disabled_session_leaves_selector_alone() {
        let (_temp, root, _storage) = project_with_storage();
        fs::write(root.marker_path(), "/usr/bin/python3").unwrap();
        let effects = FakeEffects::default();
        let mut session = SyncSession::new(&effects, false);
        assert_eq!(session.sync_once(&root).unwrap(), SyncAction::Disabled);
        assert_eq!(effects.active(root.scope()), None);

        let action = session.on_config_change(&root, true).unwrap();
        assert!(matches!(action, Some(SyncAction::Switched { .. })));

        // Already enabled: no extra pass.
        assert_eq!(session.on_config_change(&root, true).unwrap(), None);
        assert_eq!(session.on_config_change(&root, false).unwrap(), None);
        assert_eq!(session.sync_once(&root).unwrap(), SyncAction::Disabled);
    }

    #[test]
    fn unreadable_marker_propagates() {
        let (_temp, root, _storage) = project_with_storage();
        fs::create_dir_all(root.marker_path()).unwrap();
        let effects = FakeEffects::default();
        let err = SyncSession::new(&effects, true).sync_once(&root).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::MarkerFileUnreadable { .. })
        ));
    }

    #[test]
    fn details_carry_project_and_action() {
        let root = ProjectRoot::new("/home/u/proj").unwrap();
        let details = SyncAction::NoInterpreterRecorded.details(&root);
        assert_eq!(details["project"], "/home/u/proj");
        assert_eq!(details["recorded"], false);
        assert!(details["hint"].is_string());
    }
}
