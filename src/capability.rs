use std::any;
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::error::{DisposalError, ReleaseError};

/// Shared handle under which a stack holds a tracked resource.
///
/// Tracking wraps the value so the caller keeps access to it while the stack
/// holds the release obligation; the whole protocol is single-threaded and
/// cooperatively scheduled, so plain reference counting with interior
/// mutability is the right vehicle.
pub type Shared<T> = Rc<RefCell<T>>;

/// Future returned by an asynchronous release capability.
pub type ReleaseFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ReleaseError>> + 'a>>;

/// Synchronous release capability.
///
/// One of the two well-known release identifiers. A synchronous release
/// participates in an asynchronous unwind without introducing a suspension
/// point: it is invoked inline, as if it were an already-settled future.
pub trait Dispose {
    /// Release the resource. Called at most once per tracked entry.
    fn dispose(&mut self) -> Result<(), ReleaseError>;
}

/// Asynchronous release capability; probed before [`Dispose`].
///
/// The other well-known release identifier. The returned future may suspend
/// the unwind pass; only one release runs at a time, so there is no parallel
/// fan-out across entries.
pub trait AsyncDispose {
    /// Release the resource, possibly awaiting external work.
    fn dispose_async(&mut self) -> ReleaseFuture<'_>;
}

/// Probing surface consulted when a value is registered on a stack.
///
/// A value qualifies as a resource by answering at least one of the probes;
/// which one wins is decided by the resolver at registration time (async
/// first, sync as fallback) and captured into the entry. Implementations must
/// answer consistently between registration and release.
///
/// The usual implementation forwards to `self`:
///
/// ```
/// use disposal::{Dispose, ReleaseError, Trackable};
///
/// struct TempFile;
///
/// impl Dispose for TempFile {
///     fn dispose(&mut self) -> Result<(), ReleaseError> {
///         Ok(())
///     }
/// }
///
/// impl Trackable for TempFile {
///     fn sync_capability(&mut self) -> Option<&mut dyn Dispose> {
///         Some(self)
///     }
/// }
/// ```
pub trait Trackable {
    /// The asynchronous release capability, if the value exposes one.
    fn async_capability(&mut self) -> Option<&mut dyn AsyncDispose> {
        None
    }

    /// The synchronous release capability, if the value exposes one.
    fn sync_capability(&mut self) -> Option<&mut dyn Dispose> {
        None
    }
}

impl<T: Trackable + ?Sized> Trackable for Box<T> {
    fn async_capability(&mut self) -> Option<&mut dyn AsyncDispose> {
        (**self).async_capability()
    }

    fn sync_capability(&mut self) -> Option<&mut dyn Dispose> {
        (**self).sync_capability()
    }
}

/// Release path selected for an entry at registration time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Kind {
    Async,
    Sync,
}

/// Resolve the release path for the asynchronous container: async capability
/// first, sync fallback, error when neither answers.
pub(crate) fn resolve_for_async<T: Trackable>(value: &mut T) -> Result<Kind, DisposalError> {
    let type_name = any::type_name::<T>();
    if value.async_capability().is_some() {
        log::debug!("{type_name}: async release capability selected");
        Ok(Kind::Async)
    } else if value.sync_capability().is_some() {
        log::debug!("{type_name}: sync release capability selected (no async capability)");
        Ok(Kind::Sync)
    } else {
        Err(DisposalError::InvalidResource { type_name })
    }
}

/// Resolve the release path for the synchronous container, which only ever
/// probes the sync capability: an async capability is unusable without an
/// awaiting unwind.
pub(crate) fn resolve_for_sync<T: Trackable>(value: &mut T) -> Result<(), DisposalError> {
    let type_name = any::type_name::<T>();
    if value.sync_capability().is_some() {
        log::debug!("{type_name}: sync release capability selected");
        Ok(())
    } else {
        Err(DisposalError::InvalidResource { type_name })
    }
}
