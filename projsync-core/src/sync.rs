//! Consumer-facing facade over a `DocumentRegistry`.
//!
//! Every query takes the host's `ProjectIdentity`. Read queries never fail:
//! a project without a path, a missing document or a parse failure degrades
//! to the query's neutral result. Writes propagate errors, except that a
//! project without a path is a silent no-op.

use crate::error::{SyncError, SyncResult};
use crate::integration;
use crate::items;
use crate::ports::{DocumentStore, ProjectIdentity, VersionControl};
use crate::properties::{self, Evaluator};
use crate::registry::{DocumentRegistry, Subscription};
use crate::settings::SyncSettings;
use camino::{Utf8Path, Utf8PathBuf};
use projsync_types::{Document, property};
use tracing::{debug, error, warn};

/// Project-state synchronization facade for one host session.
#[derive(Debug)]
pub struct ProjectSync {
    registry: DocumentRegistry,
    settings: SyncSettings,
}

impl ProjectSync {
    pub fn new(registry: DocumentRegistry, settings: SyncSettings) -> Self {
        Self { registry, settings }
    }

    pub fn with_ports(
        store: Box<dyn DocumentStore>,
        vcs: Box<dyn VersionControl>,
        settings: SyncSettings,
    ) -> Self {
        Self::new(DocumentRegistry::new(store, vcs), settings)
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Full document path for `project`, or an empty path when the host
    /// cannot produce one.
    pub fn project_path(&self, project: &dyn ProjectIdentity) -> Utf8PathBuf {
        match project.full_path() {
            Ok(path) => path,
            Err(SyncError::UnsupportedOperation) => Utf8PathBuf::new(),
            Err(err) => {
                debug!(error = %err, "project path unavailable");
                Utf8PathBuf::new()
            }
        }
    }

    /// Run `f` against the project's document, degrading to `default`.
    pub fn read<T>(
        &self,
        project: &dyn ProjectIdentity,
        default: T,
        f: impl FnOnce(&Document) -> T,
    ) -> T {
        let path = self.project_path(project);
        if path.as_str().is_empty() {
            return default;
        }
        match self.registry.with_document(&path, f) {
            Ok(value) => value,
            Err(err) if err.is_read_degradable() => {
                warn!(path = %path, error = %err, "read query degraded to default");
                default
            }
            Err(err) => {
                error!(path = %path, error = %err, "read query failed; using default");
                default
            }
        }
    }

    /// Check out, mutate, persist and notify. No-op for a project without a path.
    pub fn update_document<T>(
        &self,
        project: &dyn ProjectIdentity,
        f: impl FnOnce(&mut Document) -> T,
    ) -> SyncResult<Option<T>> {
        let path = self.project_path(project);
        if path.as_str().is_empty() {
            debug!("no build document available; update skipped");
            return Ok(None);
        }
        self.registry.update_document(&path, f).map(Some)
    }

    /// Register `callback` to run after each committed update of the project.
    ///
    /// A project without a path has no document to update; the returned
    /// subscription is inert and `callback` is dropped.
    pub fn on_document_update(
        &self,
        project: &dyn ProjectIdentity,
        callback: impl Fn() + 'static,
    ) -> Subscription {
        let path = self.project_path(project);
        if path.as_str().is_empty() {
            debug!("no build document available; subscription not registered");
            return Subscription::detached();
        }
        self.registry.subscribe(&path, callback)
    }

    /// Drop the cached document (project closed or unloaded).
    pub fn unload(&self, project: &dyn ProjectIdentity) -> SyncResult<bool> {
        let path = self.project_path(project);
        if path.as_str().is_empty() {
            return Ok(false);
        }
        self.registry.unload(&path)
    }

    // Item classification

    pub fn tracked_items(&self, project: &dyn ProjectIdentity) -> Vec<String> {
        self.read(project, Vec::new(), |doc| items::tracked_items(doc, &self.settings))
    }

    /// Whether `path` (absolute) is an item produced by code generation.
    pub fn is_generated_item(&self, project: &dyn ProjectIdentity, path: &Utf8Path) -> bool {
        let Ok(base) = project.base_directory() else {
            return false;
        };
        let relative = items::relative_path(&base, path);
        self.read(project, false, |doc| {
            items::find_generated_item(doc, &self.settings, &relative).is_some()
        })
    }

    pub fn item_metadata(
        &self,
        project: &dyn ProjectIdentity,
        identity: &str,
        name: &str,
        default: &str,
    ) -> String {
        self.read(project, default.to_string(), |doc| {
            items::item_metadata(doc, &self.settings, identity, name, default)
        })
    }

    /// Item-definition metadata of the tracked item type.
    pub fn default_item_metadata(
        &self,
        project: &dyn ProjectIdentity,
        name: &str,
        evaluated: bool,
        default: &str,
    ) -> String {
        self.read(project, default.to_string(), |doc| {
            items::default_item_metadata(
                doc,
                &self.settings,
                &self.settings.tracked_item_type,
                name,
                evaluated,
                default,
            )
        })
    }

    /// Set metadata on items matching the optional type and label. Returns
    /// how many items were updated.
    pub fn set_item_metadata(
        &self,
        project: &dyn ProjectIdentity,
        item_type: Option<&str>,
        label: Option<&str>,
        name: &str,
        value: &str,
    ) -> SyncResult<usize> {
        let updated = self.update_document(project, |doc| {
            items::set_item_metadata(doc, item_type, label, name, value)
        })?;
        Ok(updated.unwrap_or(0))
    }

    /// Set item-definition metadata of the tracked item type.
    pub fn set_default_item_metadata(
        &self,
        project: &dyn ProjectIdentity,
        name: &str,
        value: &str,
    ) -> SyncResult<()> {
        let item_type = self.settings.tracked_item_type.clone();
        self.update_document(project, |doc| {
            items::set_default_item_metadata(doc, &item_type, name, value)
        })?;
        Ok(())
    }

    // Properties

    /// Raw authored value, or `""`.
    pub fn property(&self, project: &dyn ProjectIdentity, name: &str) -> String {
        self.read(project, String::new(), |doc| properties::raw_property(doc, name))
    }

    /// Raw authored value, or `default` when absent or empty.
    pub fn property_or(&self, project: &dyn ProjectIdentity, name: &str, default: &str) -> String {
        self.read(project, default.to_string(), |doc| {
            properties::raw_property_or(doc, name, default)
        })
    }

    /// Evaluated value, or `""`.
    pub fn evaluated_property(&self, project: &dyn ProjectIdentity, name: &str) -> String {
        self.evaluated_property_or(project, name, "")
    }

    /// Evaluated value, or `default` when absent or empty.
    pub fn evaluated_property_or(
        &self,
        project: &dyn ProjectIdentity,
        name: &str,
        default: &str,
    ) -> String {
        self.read(project, default.to_string(), |doc| {
            properties::evaluated_property_or(doc, &self.settings.global_properties, name, default)
        })
    }

    /// Expand property references in `text` against the project's document.
    pub fn expand(&self, project: &dyn ProjectIdentity, text: &str) -> String {
        self.read(project, text.to_string(), |doc| {
            Evaluator::new(doc, &self.settings.global_properties).expand(text)
        })
    }

    // Project kind and integration

    pub fn is_native_project(&self, project: &dyn ProjectIdentity) -> bool {
        project.kind().is_native()
    }

    pub fn is_managed_project(&self, project: &dyn ProjectIdentity) -> bool {
        project.kind().is_managed()
    }

    /// Whether the default integration is imported and its files exist.
    pub fn is_integration_installed(&self, project: &dyn ProjectIdentity) -> bool {
        self.is_named_integration_installed(project, &self.settings.default_integration)
    }

    pub fn is_named_integration_installed(&self, project: &dyn ProjectIdentity, name: &str) -> bool {
        let kind = project.kind();
        if !self.settings.supports_integration(kind) {
            return false;
        }
        let Some(spec) = self.settings.integration(name) else {
            warn!(integration = name, "unknown integration");
            return false;
        };
        self.read(project, false, |doc| {
            integration::is_installed(doc, &self.settings, kind, spec)
        })
    }

    /// Add the integration's imports if either half is missing. Returns
    /// whether the document changed. Nothing is written when both halves
    /// are already declared.
    pub fn add_integration_if_missing(
        &self,
        project: &dyn ProjectIdentity,
        name: &str,
    ) -> SyncResult<bool> {
        let spec = self
            .settings
            .integration(name)
            .ok_or_else(|| SyncError::UnknownIntegration {
                name: name.to_string(),
            })?;
        let path = self.project_path(project);
        if path.as_str().is_empty() {
            return Ok(false);
        }
        let declared = self
            .registry
            .with_document(&path, |doc| integration::declared(doc, &self.settings, spec))?;
        if declared == (true, true) {
            debug!(path = %path, integration = name, "integration already declared");
            return Ok(false);
        }
        self.registry
            .update_document(&path, |doc| integration::add_if_missing(doc, &self.settings, spec))
    }

    /// Prepend `flavor` to the project's type identifier list if absent.
    pub fn add_project_flavor_if_missing(
        &self,
        project: &dyn ProjectIdentity,
        flavor: &str,
    ) -> SyncResult<bool> {
        let path = self.project_path(project);
        if path.as_str().is_empty() {
            return Ok(false);
        }
        let present = self.registry.with_document(&path, |doc| has_flavor(doc, flavor))?;
        if present {
            return Ok(false);
        }
        self.registry.update_document(&path, |doc| {
            let current = properties::raw_property(doc, property::PROJECT_TYPE_GUIDS);
            let value = if current.trim().is_empty() {
                flavor.to_string()
            } else {
                format!("{flavor};{current}")
            };
            doc.set_property(property::PROJECT_TYPE_GUIDS, value);
            true
        })
    }
}

fn has_flavor(document: &Document, flavor: &str) -> bool {
    let wanted = flavor.trim().trim_start_matches('{').trim_end_matches('}');
    document
        .property(property::PROJECT_TYPE_GUIDS)
        .unwrap_or_default()
        .split(';')
        .map(|id| id.trim().trim_start_matches('{').trim_end_matches('}'))
        .any(|id| id.eq_ignore_ascii_case(wanted))
}
