use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;

use crate::capability::{Dispose, Shared, Trackable, resolve_for_sync};
use crate::entry::{self, SyncEntry};
use crate::error::{DisposalError, ReleaseError};
use crate::unwind;

/// Ordered container of pending synchronous releases with one-shot disposal
/// semantics.
///
/// Entries are released in reverse push order when the stack is disposed,
/// explicitly via [`dispose`](DisposalStack::dispose) or through a
/// [`sync_scope`](crate::sync_scope). A stack transitions to `disposed`
/// exactly once; afterwards every mutating operation fails with
/// [`DisposalError::AlreadyDisposed`] and further `dispose` calls are no-ops.
pub struct DisposalStack {
    entries: Vec<SyncEntry>,
    disposed: bool,
}

impl DisposalStack {
    pub fn new() -> Self {
        DisposalStack {
            entries: Vec::new(),
            disposed: false,
        }
    }

    /// True once a disposal pass has run or ownership has been moved out via
    /// [`take`](DisposalStack::take).
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
    /// The sync capability is probed at registration; a value without one is
    /// rejected with [`DisposalError::InvalidResource`] before anything is
    /// pushed, so a binder mistake surfaces here rather than as silently
    /// skipped cleanup later.
    pub fn track<T: Trackable + 'static>(&mut self, value: T) -> Result<Shared<T>, DisposalError> {
        self.check_open()?;
        let mut value = value;
        resolve_for_sync(&mut value)?;
        let shared = Rc::new(RefCell::new(value));
        self.entries.push(entry::tracked_sync(Rc::clone(&shared)));
        Ok(shared)
    }

    /// [`track`](DisposalStack::track) for optional resources: `None` is not
    /// tracked at all, no entry, no error.
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

    /// Register a value together with a release callback, bypassing
    /// capability probing. The callback receives the value's handle when the
    /// entry is released.
    pub fn adopt<T, F>(&mut self, value: T, release: F) -> Result<Shared<T>, DisposalError>
    where
        T: 'static,
        F: FnOnce(Shared<T>) -> Result<(), ReleaseError> + 'static,
    {
        self.check_open()?;
        let shared = Rc::new(RefCell::new(value));
        self.entries.push(entry::adopted(Rc::clone(&shared), release));
        Ok(shared)
    }

    /// Register a release callback with no associated value.
    pub fn defer<F>(&mut self, release: F) -> Result<(), DisposalError>
    where
        F: FnOnce() -> Result<(), ReleaseError> + 'static,
    {
        self.check_open()?;
        self.entries.push(entry::deferred(release));
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
        Ok(DisposalStack {
            entries: mem::take(&mut self.entries),
            disposed: false,
        })
    }

    /// Release every pending entry, most recently pushed first.
    ///
    /// Idempotent: disposing an already-disposed stack is a successful no-op.
    pub fn dispose(&mut self) -> Result<(), ReleaseError> {
        self.unwind_with(Ok(()))
    }

    /// Run the unwind protocol against this stack, seeded with the scope's
    /// completion. The disposed flag is flipped and the entry list taken in
    /// one step, the single check-then-act site guarding reentrant disposal.
    pub(crate) fn unwind_with<T>(
        &mut self,
        completion: Result<T, ReleaseError>,
    ) -> Result<T, ReleaseError> {
        if self.disposed {
            return completion;
        }
        self.disposed = true;
        unwind::run_sync(mem::take(&mut self.entries), completion)
    }

    fn check_open(&self) -> Result<(), DisposalError> {
        if self.disposed {
            Err(DisposalError::AlreadyDisposed)
        } else {
            Ok(())
        }
    }
}

impl Default for DisposalStack {
    fn default() -> Self {
        DisposalStack::new()
    }
}

impl fmt::Debug for DisposalStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposalStack")
            .field("entries", &self.entries.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl Dispose for DisposalStack {
    fn dispose(&mut self) -> Result<(), ReleaseError> {
        self.unwind_with(Ok(()))
    }
}

/// A stack is itself a resource, so stacks nest inside other stacks.
impl Trackable for DisposalStack {
    fn sync_capability(&mut self) -> Option<&mut dyn Dispose> {
        Some(self)
    }
}
