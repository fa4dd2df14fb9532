//! Best-effort check-out before a document is written.

use crate::error::{SyncError, SyncResult};
use crate::ports::VersionControl;
use camino::Utf8Path;
use tracing::{debug, info, warn};

/// What `ensure_checked_out` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    NotTracked,
    AlreadyCheckedOut,
    CheckedOut,
    /// Version control failed; the write proceeds against the working copy.
    Unavailable,
}

/// Check `path` out if it is tracked and not already checked out.
///
/// Never fails: version-control errors are logged and the caller proceeds.
pub fn ensure_checked_out(vcs: &dyn VersionControl, path: &Utf8Path) -> CheckoutOutcome {
    match try_check_out(vcs, path) {
        Ok(outcome) => {
            if outcome == CheckoutOutcome::CheckedOut {
                info!(path = %path, "checked out build document");
            } else {
                debug!(path = %path, ?outcome, "no check-out needed");
            }
            outcome
        }
        Err(SyncError::VersionControlUnavailable { message }) => {
            warn!(path = %path, reason = %message, "version control unavailable; writing working copy");
            CheckoutOutcome::Unavailable
        }
        Err(err) => {
            warn!(path = %path, error = %err, "check-out failed; writing working copy");
            CheckoutOutcome::Unavailable
        }
    }
}

fn try_check_out(vcs: &dyn VersionControl, path: &Utf8Path) -> SyncResult<CheckoutOutcome> {
    if !vcs.is_tracked(path)? {
        return Ok(CheckoutOutcome::NotTracked);
    }
    if vcs.is_checked_out(path)? {
        return Ok(CheckoutOutcome::AlreadyCheckedOut);
    }
    vcs.check_out(path)?;
    Ok(CheckoutOutcome::CheckedOut)
}
