//! Canonical per-path build documents and the checkout-guarded mutation
//! transaction.
//!
//! A `DocumentRegistry` owns one cached `Document` per path. Callers only see
//! the document for the duration of a `with_document` / `update_document`
//! closure. The registry assumes a single-threaded or externally serialized
//! caller; re-entering a mutation from inside a closure fails with
//! `SyncError::Busy` instead of aliasing the document.

use crate::checkout;
use crate::error::{SyncError, SyncResult};
use crate::ports::{DocumentStore, VersionControl};
use camino::{Utf8Path, Utf8PathBuf};
use projsync_types::Document;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, info};

type Callback = Rc<dyn Fn()>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    by_path: HashMap<Utf8PathBuf, Vec<(u64, Callback)>>,
}

impl Subscribers {
    fn remove(&mut self, path: &Utf8Path, id: u64) {
        if let Some(list) = self.by_path.get_mut(path) {
            list.retain(|(sid, _)| *sid != id);
            if list.is_empty() {
                self.by_path.remove(path);
            }
        }
    }
}

/// Registration of an update callback. Dropping it deregisters the callback.
#[must_use = "dropping a Subscription deregisters its callback"]
pub struct Subscription {
    subscribers: Weak<RefCell<Subscribers>>,
    path: Utf8PathBuf,
    id: u64,
}

impl Subscription {
    /// A subscription bound to no registry.
    pub(crate) fn detached() -> Self {
        Self {
            subscribers: Weak::new(),
            path: Utf8PathBuf::new(),
            id: 0,
        }
    }

    /// Deregister now.
    pub fn release(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            if let Ok(mut subscribers) = subscribers.try_borrow_mut() {
                subscribers.remove(&self.path, self.id);
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("path", &self.path)
            .field("id", &self.id)
            .finish()
    }
}

/// Cache of canonical build documents, one per path, for one host session.
pub struct DocumentRegistry {
    store: Box<dyn DocumentStore>,
    vcs: Box<dyn VersionControl>,
    documents: RefCell<HashMap<Utf8PathBuf, Document>>,
    subscribers: Rc<RefCell<Subscribers>>,
}

impl DocumentRegistry {
    pub fn new(store: Box<dyn DocumentStore>, vcs: Box<dyn VersionControl>) -> Self {
        Self {
            store,
            vcs,
            documents: RefCell::new(HashMap::new()),
            subscribers: Rc::new(RefCell::new(Subscribers::default())),
        }
    }

    /// Make sure the canonical document for `path` is cached, parsing it on
    /// first access. Parse failures are not cached.
    pub fn load(&self, path: &Utf8Path) -> SyncResult<()> {
        if path.as_str().is_empty() {
            return Err(SyncError::UnsupportedOperation);
        }
        let cached = self
            .documents
            .try_borrow()
            .map_err(|_| busy(path))?
            .contains_key(path);
        if cached {
            debug!(path = %path, "build document cache hit");
            return Ok(());
        }

        let document = self.store.parse(path)?;
        debug!(path = %path, "cached build document");
        self.documents
            .try_borrow_mut()
            .map_err(|_| busy(path))?
            .insert(path.to_path_buf(), document);
        Ok(())
    }

    pub fn is_loaded(&self, path: &Utf8Path) -> bool {
        self.documents
            .try_borrow()
            .map(|docs| docs.contains_key(path))
            .unwrap_or(false)
    }

    /// Drop the cached document for `path`. Subscribers stay registered.
    pub fn unload(&self, path: &Utf8Path) -> SyncResult<bool> {
        let removed = self
            .documents
            .try_borrow_mut()
            .map_err(|_| busy(path))?
            .remove(path)
            .is_some();
        if removed {
            debug!(path = %path, "unloaded build document");
        }
        Ok(removed)
    }

    /// Run a read-only function against the canonical document for `path`.
    pub fn with_document<T>(&self, path: &Utf8Path, f: impl FnOnce(&Document) -> T) -> SyncResult<T> {
        self.load(path)?;
        let documents = self.documents.try_borrow().map_err(|_| busy(path))?;
        let document = documents.get(path).ok_or_else(|| not_found(path))?;
        Ok(f(document))
    }

    /// Check out, mutate in place, persist, then notify subscribers.
    ///
    /// If persisting fails the mutation stays applied in memory, the error is
    /// returned, and no subscriber is notified.
    pub fn update_document<T>(
        &self,
        path: &Utf8Path,
        f: impl FnOnce(&mut Document) -> T,
    ) -> SyncResult<T> {
        self.load(path)?;

        let value = {
            let mut documents = self.documents.try_borrow_mut().map_err(|_| busy(path))?;
            let document = documents.get_mut(path).ok_or_else(|| not_found(path))?;
            // Only once the document is exclusively ours.
            checkout::ensure_checked_out(self.vcs.as_ref(), path);
            let value = f(document);
            self.store.write(document, path)?;
            value
        };
        info!(path = %path, "committed build document");

        self.notify(path);
        Ok(value)
    }

    /// Register `callback` to run after every committed update of `path`.
    pub fn subscribe(&self, path: &Utf8Path, callback: impl Fn() + 'static) -> Subscription {
        let mut subscribers = self.subscribers.borrow_mut();
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers
            .by_path
            .entry(path.to_path_buf())
            .or_default()
            .push((id, Rc::new(callback)));
        Subscription {
            subscribers: Rc::downgrade(&self.subscribers),
            path: path.to_path_buf(),
            id,
        }
    }

    pub fn subscriber_count(&self, path: &Utf8Path) -> usize {
        self.subscribers
            .borrow()
            .by_path
            .get(path)
            .map_or(0, Vec::len)
    }

    fn notify(&self, path: &Utf8Path) {
        // Snapshot so callbacks may subscribe, release, or read documents.
        let callbacks: Vec<Callback> = self
            .subscribers
            .borrow()
            .by_path
            .get(path)
            .map(|list| list.iter().map(|(_, cb)| Rc::clone(cb)).collect())
            .unwrap_or_default();
        debug!(path = %path, subscribers = callbacks.len(), "notifying subscribers");
        for callback in callbacks {
            callback();
        }
    }
}

impl fmt::Debug for DocumentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loaded = self.documents.try_borrow().map(|d| d.len()).ok();
        f.debug_struct("DocumentRegistry")
            .field("loaded", &loaded)
            .finish_non_exhaustive()
    }
}

fn busy(path: &Utf8Path) -> SyncError {
    SyncError::Busy {
        path: path.to_path_buf(),
    }
}

fn not_found(path: &Utf8Path) -> SyncError {
    SyncError::DocumentNotFound {
        path: path.to_path_buf(),
    }
}
