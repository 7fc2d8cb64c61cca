//! One-shot release entries. The release callable is bound to its value when
//! the entry is pushed, never re-resolved later; `FnOnce` makes the
//! exactly-once contract structural.

use std::any;
use std::future::Future;

use crate::capability::{Kind, ReleaseFuture, Shared, Trackable};
use crate::error::{DisposalError, ReleaseError};

pub(crate) type SyncThunk = Box<dyn FnOnce() -> Result<(), ReleaseError>>;
pub(crate) type AsyncThunk = Box<dyn FnOnce() -> ReleaseFuture<'static>>;

pub(crate) enum Release {
    Sync(SyncThunk),
    Async(AsyncThunk),
}

pub(crate) struct Entry<R> {
    /// Diagnostic label: the tracked value's type name, or a marker for
    /// deferred callbacks.
    pub(crate) what: &'static str,
    pub(crate) release: R,
}

pub(crate) type SyncEntry = Entry<SyncThunk>;
pub(crate) type AsyncEntry = Entry<Release>;

fn sync_release_thunk<T: Trackable + 'static>(value: Shared<T>, what: &'static str) -> SyncThunk {
    Box::new(move || {
        let mut value = value.borrow_mut();
        match value.sync_capability() {
            Some(capability) => capability.dispose(),
            None => Err(DisposalError::CapabilityWithdrawn { type_name: what }.into()),
        }
    })
}

/// Entry for a value tracked on the synchronous container.
pub(crate) fn tracked_sync<T: Trackable + 'static>(value: Shared<T>) -> SyncEntry {
    let what = any::type_name::<T>();
    Entry {
        what,
        release: sync_release_thunk(value, what),
    }
}

/// Entry for a value tracked on the asynchronous container, bound to the
/// release path the resolver picked.
pub(crate) fn tracked_async<T: Trackable + 'static>(value: Shared<T>, kind: Kind) -> AsyncEntry {
    let what = any::type_name::<T>();
    let release = match kind {
        Kind::Sync => Release::Sync(sync_release_thunk(value, what)),
        Kind::Async => Release::Async(Box::new(move || {
            Box::pin(async move {
                let mut value = value.borrow_mut();
                match value.async_capability() {
                    Some(capability) => capability.dispose_async().await,
                    None => Err(DisposalError::CapabilityWithdrawn { type_name: what }.into()),
                }
            })
        })),
    };
    Entry { what, release }
}

/// Pseudo-resource: user callback invoked with the adopted value's handle.
pub(crate) fn adopted<T, F>(value: Shared<T>, release: F) -> SyncEntry
where
    T: 'static,
    F: FnOnce(Shared<T>) -> Result<(), ReleaseError> + 'static,
{
    Entry {
        what: any::type_name::<T>(),
        release: Box::new(move || release(value)),
    }
}

pub(crate) fn adopted_async<T, F, Fut>(value: Shared<T>, release: F) -> AsyncEntry
where
    T: 'static,
    F: FnOnce(Shared<T>) -> Fut + 'static,
    Fut: Future<Output = Result<(), ReleaseError>> + 'static,
{
    Entry {
        what: any::type_name::<T>(),
        release: Release::Async(Box::new(move || Box::pin(release(value)))),
    }
}

/// Pseudo-resource with no associated value.
pub(crate) fn deferred<F>(release: F) -> SyncEntry
where
    F: FnOnce() -> Result<(), ReleaseError> + 'static,
{
    Entry {
        what: "deferred callback",
        release: Box::new(release),
    }
}

pub(crate) fn deferred_async<F, Fut>(release: F) -> AsyncEntry
where
    F: FnOnce() -> Fut + 'static,
    Fut: Future<Output = Result<(), ReleaseError>> + 'static,
{
    Entry {
        what: "deferred callback",
        release: Release::Async(Box::new(move || Box::pin(release()))),
    }
}

/// Admit a synchronous entry into the asynchronous container; it will run
/// inline during the unwind, without a suspension point.
pub(crate) fn lift(entry: SyncEntry) -> AsyncEntry {
    Entry {
        what: entry.what,
        release: Release::Sync(entry.release),
    }
}
