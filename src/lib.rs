//! Deterministic, ordered release of acquired resources for sync and async
//! Rust.
//!
//! A [`DisposalStack`] or [`AsyncDisposalStack`] tracks pending releasable
//! resources (handles, locks, streams, transactions) and unwinds them in
//! reverse-acquisition order when the owning scope exits, normally or with an
//! error. Release failures are never silently dropped and never skip the
//! remaining entries: every failure from one unwind pass is folded into a
//! single [`Suppressed`] chain, the most recent failure outermost and the
//! scope body's own error innermost. The asynchronous variant may suspend
//! between individual releases without breaking either guarantee.
//!
//! Values qualify as resources through the two release capabilities,
//! [`AsyncDispose`] and [`Dispose`]; registration probes the async one first
//! and falls back to the sync one. The [`scope`] / [`sync_scope`] combinators
//! tie a stack to a lexical scope:
//!
//! ```
//! use disposal::{ReleaseError, sync_scope};
//!
//! let released: Result<i32, ReleaseError> = sync_scope(|stack| {
//!     stack.defer(|| {
//!         println!("second");
//!         Ok(())
//!     })?;
//!     stack.defer(|| {
//!         println!("first");
//!         Ok(())
//!     })?;
//!     Ok(42)
//! });
//! assert_eq!(released.unwrap(), 42);
//! ```

pub(crate) mod async_stack;
pub(crate) mod capability;
pub(crate) mod entry;
pub(crate) mod error;
pub(crate) mod scope;
pub(crate) mod stack;
pub(crate) mod unwind;

pub use async_stack::AsyncDisposalStack;
pub use capability::{AsyncDispose, Dispose, ReleaseFuture, Shared, Trackable};
pub use error::{DisposalError, ReleaseError, Suppressed, SuppressedChain, combine};
pub use scope::{for_each_tracked, scope, sync_scope};
pub use stack::DisposalStack;
