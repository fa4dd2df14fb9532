//! Embeddable core library for projsync.
//!
//! Keeps one canonical in-memory build document per project path and
//! funnels every mutation through a checkout-guarded, persist-then-notify
//! transaction.
//!
//! # Port traits
//!
//! All host and disk access is abstracted behind port traits in [`ports`]:
//! - [`ProjectIdentity`](ports::ProjectIdentity) — project path, base directory, kind
//! - [`VersionControl`](ports::VersionControl) — tracked/checked-out queries and check-out
//! - [`DocumentStore`](ports::DocumentStore) — parse and write build documents
//!
//! The [`adapters`] module provides filesystem, git and in-memory implementations.
//!
//! # Entry points
//!
//! - [`ProjectSync`] — consumer facade (queries, metadata and integration updates)
//! - [`DocumentRegistry`] — the cached documents and the mutation transaction

pub mod adapters;
pub mod checkout;
pub mod error;
pub mod integration;
pub mod items;
pub mod ports;
pub mod properties;
pub mod registry;
pub mod settings;
mod sync;

pub use error::{SyncError, SyncResult};
pub use registry::{DocumentRegistry, Subscription};
pub use settings::{IntegrationSpec, SyncSettings};
pub use sync::ProjectSync;

// Re-export the data model so embedders don't need projsync-types directly.
pub use projsync_types::{Document, Import, Item, ItemDefinition, ProjectKind};
