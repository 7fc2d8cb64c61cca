//! The scope unwind protocol: pop entries most-recently-pushed first, run or
//! await each release exactly once, and fold every failure into a single
//! outcome without ever aborting the walk.
//!
//! Both renditions take the scope's completion (the body's return value or
//! its in-flight error) and give back the final outcome: the completion
//! untouched when every release succeeds, otherwise one error that chains
//! every failure with the original error innermost.

use crate::entry::{AsyncEntry, Release, SyncEntry};
use crate::error::{ReleaseError, combine};

pub(crate) fn run_sync<T>(
    entries: Vec<SyncEntry>,
    mut completion: Result<T, ReleaseError>,
) -> Result<T, ReleaseError> {
    log::debug!(
        "unwinding {} entries (pending error: {})",
        entries.len(),
        completion.is_err()
    );
    for entry in entries.into_iter().rev() {
        log::trace!("releasing {}", entry.what);
        if let Err(failure) = (entry.release)() {
            log::warn!("release of {} failed: {failure}", entry.what);
            completion = Err(record(completion, failure));
        }
    }
    completion
}

/// Asynchronous rendition. The awaits on async releases are the only
/// suspension points: one per async entry, none for sync entries, which run
/// inline in the same loop.
pub(crate) async fn run_async<T>(
    entries: Vec<AsyncEntry>,
    mut completion: Result<T, ReleaseError>,
) -> Result<T, ReleaseError> {
    log::debug!(
        "unwinding {} entries (pending error: {})",
        entries.len(),
        completion.is_err()
    );
    for entry in entries.into_iter().rev() {
        log::trace!("releasing {}", entry.what);
        let outcome = match entry.release {
            Release::Sync(thunk) => thunk(),
            Release::Async(thunk) => thunk().await,
        };
        if let Err(failure) = outcome {
            log::warn!("release of {} failed: {failure}", entry.what);
            completion = Err(record(completion, failure));
        }
    }
    completion
}

fn record<T>(completion: Result<T, ReleaseError>, failure: ReleaseError) -> ReleaseError {
    match completion {
        Ok(_) => combine(None, failure),
        Err(previous) => combine(Some(previous), failure),
    }
}
