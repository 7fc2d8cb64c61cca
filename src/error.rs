use std::error::Error;
use std::fmt;

/// Failure raised by a release callable.
///
/// Boxed so capability implementations and adopted/deferred callbacks can
/// surface any error type; the unwind protocol aggregates these without ever
/// dropping one.
pub type ReleaseError = Box<dyn Error + 'static>;

#[derive(thiserror::Error, Debug)]
pub enum DisposalError {
    /// The value offered for tracking exposes neither an async nor a sync
    /// release capability. Raised at registration time, before any entry is
    /// pushed, and never aggregated into a suppression chain.
    #[error("resource of type '{type_name}' exposes no release capability")]
    InvalidResource { type_name: &'static str },

    /// A mutating operation was attempted on a stack whose obligations have
    /// already been discharged (disposed) or transferred (moved out).
    #[error("disposal stack has already been disposed")]
    AlreadyDisposed,

    /// A capability that was present at registration no longer answered at
    /// release time. Surfaced through the unwind pass as a release failure so
    /// the remaining entries still run.
    #[error("release capability of '{type_name}' was withdrawn before disposal")]
    CapabilityWithdrawn { type_name: &'static str },
}

/// A release failure that suppressed earlier failures from the same unwind
/// pass.
///
/// The chain is a two-field link: `error` is the most recent failure,
/// `suppressed` is everything recorded before it (possibly another
/// `Suppressed` node). Walking outer to inner therefore reads the last
/// released entry's failure first and the scope body's own error, if any,
/// innermost. [`Error::source`] exposes the suppressed tail, so the standard
/// error-chain machinery sees every failure.
#[derive(Debug)]
pub struct Suppressed {
    error: ReleaseError,
    suppressed: ReleaseError,
}

impl Suppressed {
    /// The most recent failure.
    pub fn error(&self) -> &(dyn Error + 'static) {
        self.error.as_ref()
    }

    /// The failure(s) this one suppressed.
    pub fn suppressed(&self) -> &(dyn Error + 'static) {
        self.suppressed.as_ref()
    }

    /// Walk every failure in the chain, outermost (most recent) first.
    pub fn chain(&self) -> SuppressedChain<'_> {
        SuppressedChain { node: Some(self) }
    }
}

impl fmt::Display for Suppressed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (suppressed: {})", self.error, self.suppressed)
    }
}

impl Error for Suppressed {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.suppressed.as_ref())
    }
}

/// Iterator over a suppression chain, yielding each underlying failure from
/// the most recent to the innermost.
pub struct SuppressedChain<'a> {
    node: Option<&'a (dyn Error + 'static)>,
}

impl<'a> Iterator for SuppressedChain<'a> {
    type Item = &'a (dyn Error + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.node.take()?;
        match current.downcast_ref::<Suppressed>() {
            Some(link) => {
                self.node = Some(link.suppressed.as_ref());
                Some(link.error.as_ref())
            }
            None => Some(current),
        }
    }
}

/// Fold a new release failure into the outcome of an unwind pass.
///
/// With no prior failure the new one stands alone; otherwise the new failure
/// becomes the primary of a [`Suppressed`] node and everything recorded so
/// far moves into its suppressed slot. Nesting depth equals the number of
/// failures beyond the first.
pub fn combine(existing: Option<ReleaseError>, new: ReleaseError) -> ReleaseError {
    match existing {
        None => new,
        Some(previous) => Box::new(Suppressed {
            error: new,
            suppressed: previous,
        }),
    }
}
