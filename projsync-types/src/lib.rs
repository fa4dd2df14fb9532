//! Shared data model for the projsync workspace.
//!
//! # Design constraints
//! - These types are serialized to disk as the persisted build document.
//! - No I/O lives here; loading and writing belong to `projsync-core` adapters.
//! - Prefer adding optional fields over changing semantics.

pub mod document;
pub mod kind;

pub use document::{Document, Import, Item, ItemDefinition};
pub use kind::{PROJECT_TYPE_IDS, ProjectKind};

/// Well-known property names.
pub mod property {
    /// `;`-separated list of project type identifiers (flavors).
    pub const PROJECT_TYPE_GUIDS: &str = "ProjectTypeGuids";
    pub const PROJECT_DIR: &str = "ProjectDir";
    pub const PROJECT_PATH: &str = "ProjectPath";
    pub const PROJECT_NAME: &str = "ProjectName";
    pub const PROJECT_FILE_NAME: &str = "ProjectFileName";
}
