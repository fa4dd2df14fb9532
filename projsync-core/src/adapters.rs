//! Default port implementations: filesystem/TOML documents, git, and
//! in-memory doubles for embedding and testing.

use crate::error::{SyncError, SyncResult};
use crate::ports::{DocumentStore, ProjectIdentity, VersionControl};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use projsync_types::{Document, ProjectKind};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::io::ErrorKind;
use std::process::Command;
use std::rc::Rc;
use tracing::debug;

/// Documents persisted as TOML on disk.
///
/// Writes go to a sibling temp file which is then renamed over the target.
#[derive(Debug, Clone, Default)]
pub struct FsDocumentStore;

impl FsDocumentStore {
    fn temp_path(path: &Utf8Path) -> Utf8PathBuf {
        let name = path.file_name().unwrap_or("document");
        path.with_file_name(format!(".{name}.projsync.tmp"))
    }
}

impl DocumentStore for FsDocumentStore {
    fn parse(&self, path: &Utf8Path) -> SyncResult<Document> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(SyncError::DocumentNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(err) => {
                return Err(SyncError::ParseFailure {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                });
            }
        };
        let mut document: Document =
            toml::from_str(&text).map_err(|err| SyncError::ParseFailure {
                path: path.to_path_buf(),
                message: err.message().to_string(),
            })?;
        document.path = path.to_path_buf();
        debug!(path = %path, items = document.items.len(), "parsed build document");
        Ok(document)
    }

    fn write(&self, document: &Document, path: &Utf8Path) -> SyncResult<()> {
        let write = || -> anyhow::Result<()> {
            let text = toml::to_string(document).context("serialize build document")?;
            let temp = Self::temp_path(path);
            let written = fs::write(&temp, text)
                .with_context(|| format!("write {}", temp))
                .and_then(|()| {
                    fs::rename(&temp, path)
                        .with_context(|| format!("rename {} over {}", temp, path))
                });
            if written.is_err() && temp.exists() {
                if let Err(err) = fs::remove_file(&temp) {
                    debug!(path = %temp, error = %err, "could not remove temp document");
                }
            }
            written
        };
        write().map_err(|source| SyncError::PersistenceFailure {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Version control via the `git` binary.
///
/// Git working copies are always writable, so tracked files count as
/// checked out and `check_out` has nothing to do.
#[derive(Debug, Clone, Default)]
pub struct GitVersionControl;

impl VersionControl for GitVersionControl {
    fn is_tracked(&self, path: &Utf8Path) -> SyncResult<bool> {
        let dir = path.parent().filter(|p| !p.as_str().is_empty());
        let mut cmd = Command::new("git");
        cmd.args(["ls-files", "--error-unmatch", "--"]).arg(path.as_str());
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        let output = cmd
            .output()
            .map_err(|err| SyncError::VersionControlUnavailable {
                message: format!("run git: {err}"),
            })?;
        // Exit 1: untracked. Exit 128: not inside a repository.
        Ok(output.status.success())
    }

    fn is_checked_out(&self, path: &Utf8Path) -> SyncResult<bool> {
        self.is_tracked(path)
    }

    fn check_out(&self, _path: &Utf8Path) -> SyncResult<()> {
        Ok(())
    }
}

/// No version control: nothing is tracked.
#[derive(Debug, Clone, Default)]
pub struct NoVersionControl;

impl VersionControl for NoVersionControl {
    fn is_tracked(&self, _path: &Utf8Path) -> SyncResult<bool> {
        Ok(false)
    }

    fn is_checked_out(&self, _path: &Utf8Path) -> SyncResult<bool> {
        Ok(false)
    }

    fn check_out(&self, _path: &Utf8Path) -> SyncResult<()> {
        Ok(())
    }
}

/// A project file on disk with an explicit kind.
#[derive(Debug, Clone)]
pub struct FsProject {
    path: Utf8PathBuf,
    kind: ProjectKind,
}

impl FsProject {
    pub fn new(path: impl Into<Utf8PathBuf>, kind: ProjectKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Guess the kind from the project file extension.
    pub fn with_inferred_kind(path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();
        let kind = match path.extension() {
            Some("vcxproj") => ProjectKind::Native,
            Some("csproj") => ProjectKind::Managed,
            _ => ProjectKind::Unknown,
        };
        Self { path, kind }
    }
}

impl ProjectIdentity for FsProject {
    fn full_path(&self) -> SyncResult<Utf8PathBuf> {
        let abs = std::path::absolute(&self.path).map_err(|_| SyncError::UnsupportedOperation)?;
        Utf8PathBuf::from_path_buf(abs).map_err(|_| SyncError::UnsupportedOperation)
    }

    fn base_directory(&self) -> SyncResult<Utf8PathBuf> {
        let full = self.full_path()?;
        full.parent()
            .map(Utf8Path::to_path_buf)
            .ok_or(SyncError::UnsupportedOperation)
    }

    fn kind(&self) -> ProjectKind {
        self.kind
    }
}

/// A project whose identity is fixed up front.
///
/// A project without a path behaves like a host project kind that cannot
/// report one.
#[derive(Debug, Clone, Default)]
pub struct StaticProject {
    pub path: Option<Utf8PathBuf>,
    pub kind: ProjectKind,
}

impl StaticProject {
    pub fn new(path: impl Into<Utf8PathBuf>, kind: ProjectKind) -> Self {
        Self {
            path: Some(path.into()),
            kind,
        }
    }

    pub fn without_path(kind: ProjectKind) -> Self {
        Self { path: None, kind }
    }
}

impl ProjectIdentity for StaticProject {
    fn full_path(&self) -> SyncResult<Utf8PathBuf> {
        self.path.clone().ok_or(SyncError::UnsupportedOperation)
    }

    fn base_directory(&self) -> SyncResult<Utf8PathBuf> {
        self.path
            .as_deref()
            .and_then(Utf8Path::parent)
            .map(Utf8Path::to_path_buf)
            .ok_or(SyncError::UnsupportedOperation)
    }

    fn kind(&self) -> ProjectKind {
        self.kind
    }
}

#[derive(Debug, Default)]
struct StoreState {
    documents: HashMap<Utf8PathBuf, Document>,
    parse_calls: usize,
    write_calls: usize,
    fail_writes: bool,
}

/// In-memory document store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    state: Rc<RefCell<StoreState>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the "on-disk" copy of a document.
    pub fn insert(&self, document: Document) {
        let path = document.path.clone();
        self.state.borrow_mut().documents.insert(path, document);
    }

    /// The last persisted copy of `path`.
    pub fn persisted(&self, path: &Utf8Path) -> Option<Document> {
        self.state.borrow().documents.get(path).cloned()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    pub fn parse_calls(&self) -> usize {
        self.state.borrow().parse_calls
    }

    pub fn write_calls(&self) -> usize {
        self.state.borrow().write_calls
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn parse(&self, path: &Utf8Path) -> SyncResult<Document> {
        let mut state = self.state.borrow_mut();
        state.parse_calls += 1;
        state
            .documents
            .get(path)
            .cloned()
            .ok_or_else(|| SyncError::DocumentNotFound {
                path: path.to_path_buf(),
            })
    }

    fn write(&self, document: &Document, path: &Utf8Path) -> SyncResult<()> {
        let mut state = self.state.borrow_mut();
        state.write_calls += 1;
        if state.fail_writes {
            return Err(SyncError::PersistenceFailure {
                path: path.to_path_buf(),
                source: anyhow::anyhow!("simulated write failure"),
            });
        }
        state.documents.insert(path.to_path_buf(), document.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct VcsState {
    tracked: BTreeSet<Utf8PathBuf>,
    checked_out: BTreeSet<Utf8PathBuf>,
    unavailable: bool,
    checkout_calls: usize,
}

/// In-memory version control. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVersionControl {
    state: Rc<RefCell<VcsState>>,
}

impl InMemoryVersionControl {
    pub fn track(&self, path: impl Into<Utf8PathBuf>) {
        self.state.borrow_mut().tracked.insert(path.into());
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.borrow_mut().unavailable = unavailable;
    }

    pub fn checkout_calls(&self) -> usize {
        self.state.borrow().checkout_calls
    }

    fn available(&self) -> SyncResult<()> {
        if self.state.borrow().unavailable {
            return Err(SyncError::VersionControlUnavailable {
                message: "simulated outage".to_string(),
            });
        }
        Ok(())
    }
}

impl VersionControl for InMemoryVersionControl {
    fn is_tracked(&self, path: &Utf8Path) -> SyncResult<bool> {
        self.available()?;
        Ok(self.state.borrow().tracked.contains(path))
    }

    fn is_checked_out(&self, path: &Utf8Path) -> SyncResult<bool> {
        self.available()?;
        Ok(self.state.borrow().checked_out.contains(path))
    }

    fn check_out(&self, path: &Utf8Path) -> SyncResult<()> {
        self.available()?;
        let mut state = self.state.borrow_mut();
        state.checkout_calls += 1;
        state.checked_out.insert(path.to_path_buf());
        Ok(())
    }
}
