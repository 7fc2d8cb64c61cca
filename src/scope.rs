//! Scope combinators: the declarative face of the unwind protocol. A scope
//! owns a fresh stack for its body and unwinds it on every exit path, normal
//! or abrupt, seeding the unwind with the body's error when there is one.

use std::ops::ControlFlow;

use crate::async_stack::AsyncDisposalStack;
use crate::capability::{Shared, Trackable};
use crate::error::ReleaseError;
use crate::stack::DisposalStack;

/// Run `body` against a fresh [`AsyncDisposalStack`] and unwind it when the
/// body finishes, whichever way it finishes.
///
/// The unwind is awaited at this one call site, making scope exit an explicit
/// suspension point. A body error comes back as the innermost link of the
/// final error; a body value survives only an unwind that reported nothing.
///
/// An enclosing scope's unwind cannot start until this call returns, so an
/// inner scope always finishes releasing, suspensions included, before an
/// outer one begins.
pub async fn scope<T, F>(body: F) -> Result<T, ReleaseError>
where
    F: AsyncFnOnce(&mut AsyncDisposalStack) -> Result<T, ReleaseError>,
{
    let mut stack = AsyncDisposalStack::new();
    let completion = body(&mut stack).await;
    stack.unwind_with(completion).await
}

/// Synchronous rendition of [`scope`], over a [`DisposalStack`].
pub fn sync_scope<T, F>(body: F) -> Result<T, ReleaseError>
where
    F: FnOnce(&mut DisposalStack) -> Result<T, ReleaseError>,
{
    let mut stack = DisposalStack::new();
    let completion = body(&mut stack);
    stack.unwind_with(completion)
}

/// Iterate `items`, binding each value as a tracked resource in its own
/// per-iteration scope.
///
/// Each iteration's stack is fully unwound before the next item is pulled.
/// Returning `ControlFlow::Break(())` ends the loop after the current
/// iteration's unwind; items never pulled are never registered and therefore
/// never released.
pub async fn for_each_tracked<I, T, F>(items: I, mut body: F) -> Result<(), ReleaseError>
where
    I: IntoIterator<Item = T>,
    T: Trackable + 'static,
    F: AsyncFnMut(Shared<T>, &mut AsyncDisposalStack) -> Result<ControlFlow<()>, ReleaseError>,
{
    for item in items {
        let flow = scope(async |stack| {
            let handle = stack.track(item)?;
            body(handle, stack).await
        })
        .await?;
        if flow.is_break() {
            break;
        }
    }
    Ok(())
}
