//! Port traits abstracting the host environment, version control and the
//! on-disk document format away from the core.

use crate::error::SyncResult;
use camino::{Utf8Path, Utf8PathBuf};
use projsync_types::{Document, ProjectKind};

/// Identity of one project as reported by the host environment.
pub trait ProjectIdentity {
    /// Full path of the project's build document.
    ///
    /// Fails with `UnsupportedOperation` when the host cannot produce a
    /// filesystem path for this project kind.
    fn full_path(&self) -> SyncResult<Utf8PathBuf>;

    /// Directory item includes are relative to.
    fn base_directory(&self) -> SyncResult<Utf8PathBuf>;

    fn kind(&self) -> ProjectKind;
}

/// Version-control queries and check-out.
pub trait VersionControl {
    fn is_tracked(&self, path: &Utf8Path) -> SyncResult<bool>;
    fn is_checked_out(&self, path: &Utf8Path) -> SyncResult<bool>;
    fn check_out(&self, path: &Utf8Path) -> SyncResult<()>;
}

/// Parser/writer for the persisted build document.
pub trait DocumentStore {
    /// Load `path`. The returned document has `path` set.
    fn parse(&self, path: &Utf8Path) -> SyncResult<Document>;

    fn write(&self, document: &Document, path: &Utf8Path) -> SyncResult<()>;
}
