use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::mem;
use std::rc::Rc;

use crate::capability::{AsyncDispose, ReleaseFuture, Shared, Trackable, resolve_for_async};
use crate::entry::{self, AsyncEntry};
use crate::error::{DisposalError, ReleaseError};
use crate::unwind;

/// Ordered container of pending releases, synchronous or asynchronous, with
/// one-shot disposal semantics. The public aggregator type of this crate.
///
/// Registration probes the async release capability first and falls back to
/// the sync one; a sync release simply runs inline during the unwind, as if
/// it were an already-settled future. Release order is strictly the reverse
/// of push order regardless of the sync/async mix; an async release is
/// awaited to completion before the next entry is popped.
///
/// Disposal is one-shot and idempotent: after the first
/// [`dispose_async`](AsyncDisposalStack::dispose_async) (or a
/// [`take`](AsyncDisposalStack::take)), the stack reports
/// [`disposed`](AsyncDisposalStack::disposed), mutating operations fail with
/// [`DisposalError::AlreadyDisposed`], and further disposals succeed
/// trivially.
pub struct AsyncDisposalStack {
    entries: Vec<AsyncEntry>,
    disposed: bool,
}

impl AsyncDisposalStack {
    pub fn new() -> Self {
        AsyncDisposalStack {
            entries: Vec::new(),
            disposed: false,
        }
    }

    /// True once a disposal pass has run or ownership has been moved out via
    /// [`take`](AsyncDisposalStack::take).
    pub fn disposed(&self) -> bool {
        self.disposed
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register `value` as a tracked resource and hand back a shared handle
    /// to it.
    ///
    /// Capability resolution happens here, not at release time: async first,
    /// sync fallback, and a value answering neither probe is rejected with
    /// [`DisposalError::InvalidResource`] before anything is pushed.
    pub fn track<T: Trackable + 'static>(&mut self, value: T) -> Result<Shared<T>, DisposalError> {
        self.check_open()?;
        let mut value = value;
        let kind = resolve_for_async(&mut value)?;
        let shared = Rc::new(RefCell::new(value));
        self.entries.push(entry::tracked_async(Rc::clone(&shared), kind));
        Ok(shared)
    }

    /// [`track`](AsyncDisposalStack::track) for optional resources: `None`
    /// is not tracked at all: no entry, no error.
    pub fn track_optional<T: Trackable + 'static>(
        &mut self,
        value: Option<T>,
    ) -> Result<Option<Shared<T>>, DisposalError> {
        self.check_open()?;
        match value {
            Some(value) => self.track(value).map(Some),
            None => Ok(None),
        }
    }

    /// Register a value together with a synchronous release callback,
    /// bypassing capability probing. The callback receives the value's
    /// handle when the entry is released.
    pub fn adopt<T, F>(&mut self, value: T, release: F) -> Result<Shared<T>, DisposalError>
    where
        T: 'static,
        F: FnOnce(Shared<T>) -> Result<(), ReleaseError> + 'static,
    {
        self.check_open()?;
        let shared = Rc::new(RefCell::new(value));
        self.entries
            .push(entry::lift(entry::adopted(Rc::clone(&shared), release)));
        Ok(shared)
    }

    /// [`adopt`](AsyncDisposalStack::adopt) with an asynchronous release
    /// callback.
    pub fn adopt_async<T, F, Fut>(&mut self, value: T, release: F) -> Result<Shared<T>, DisposalError>
    where
        T: 'static,
        F: FnOnce(Shared<T>) -> Fut + 'static,
        Fut: Future<Output = Result<(), ReleaseError>> + 'static,
    {
        self.check_open()?;
        let shared = Rc::new(RefCell::new(value));
        self.entries
            .push(entry::adopted_async(Rc::clone(&shared), release));
        Ok(shared)
    }

    /// Register a synchronous release callback with no associated value.
    pub fn defer<F>(&mut self, release: F) -> Result<(), DisposalError>
    where
        F: FnOnce() -> Result<(), ReleaseError> + 'static,
    {
        self.check_open()?;
        self.entries.push(entry::lift(entry::deferred(release)));
        Ok(())
    }

    /// Register an asynchronous release callback with no associated value.
    pub fn defer_async<F, Fut>(&mut self, release: F) -> Result<(), DisposalError>
    where
        F: FnOnce() -> Fut + 'static,
        Fut: Future<Output = Result<(), ReleaseError>> + 'static,
    {
        self.check_open()?;
        self.entries.push(entry::deferred_async(release));
        Ok(())
    }

    /// Transfer every pending entry to a fresh stack, in order.
    ///
    /// A pure ownership reassignment: no release runs, no user code is
    /// invoked, so the transfer itself cannot fail part-way. The source is
    /// left disposed and empty: its obligations were transferred, not
    /// discharged.
    pub fn take(&mut self) -> Result<Self, DisposalError> {
        self.check_open()?;
        self.disposed = true;
        Ok(AsyncDisposalStack {
            entries: mem::take(&mut self.entries),
            disposed: false,
        })
    }

    /// Release every pending entry, most recently pushed first, awaiting
    /// each asynchronous release before moving on.
    ///
    /// Idempotent: disposing an already-disposed stack is a successful no-op.
    pub async fn dispose_async(&mut self) -> Result<(), ReleaseError> {
        self.unwind_with(Ok(())).await
    }

    /// Run the unwind protocol against this stack, seeded with the scope's
    /// completion. The disposed flag is flipped and the entry list taken in
    /// one step, the single check-then-act site guarding reentrant disposal.
    pub(crate) async fn unwind_with<T>(
        &mut self,
        completion: Result<T, ReleaseError>,
    ) -> Result<T, ReleaseError> {
        if self.disposed {
            return completion;
        }
        self.disposed = true;
        unwind::run_async(mem::take(&mut self.entries), completion).await
    }

    fn check_open(&self) -> Result<(), DisposalError> {
        if self.disposed {
            Err(DisposalError::AlreadyDisposed)
        } else {
            Ok(())
        }
    }
}

impl Default for AsyncDisposalStack {
    fn default() -> Self {
        AsyncDisposalStack::new()
    }
}

impl fmt::Debug for AsyncDisposalStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncDisposalStack")
            .field("entries", &self.entries.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl AsyncDispose for AsyncDisposalStack {
    fn dispose_async(&mut self) -> ReleaseFuture<'_> {
        Box::pin(self.unwind_with(Ok(())))
    }
}

/// A stack is itself a resource, so stacks nest inside other stacks.
impl Trackable for AsyncDisposalStack {
    fn async_capability(&mut self) -> Option<&mut dyn AsyncDispose> {
        Some(self)
    }
}
