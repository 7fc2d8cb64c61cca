use std::cell::RefCell;
use std::rc::Rc;

use disposal::{
    AsyncDispose, AsyncDisposalStack, Dispose, DisposalStack, ReleaseError, ReleaseFuture,
    Trackable, scope,
};

// Initialize logger for this integration test binary so `RUST_LOG` is honored.
#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

type Log = Rc<RefCell<Vec<String>>>;

fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

struct Probe {
    name: &'static str,
    log: Log,
    has_async: bool,
    has_sync: bool,
    yields: usize,
}

impl Probe {
    fn asynchronous(name: &'static str, log: &Log) -> Self {
        Probe {
            name,
            log: Rc::clone(log),
            has_async: true,
            has_sync: false,
            yields: 0,
        }
    }

    fn synchronous(name: &'static str, log: &Log) -> Self {
        Probe {
            name,
            log: Rc::clone(log),
            has_async: false,
            has_sync: true,
            yields: 0,
        }
    }

    fn yielding(name: &'static str, log: &Log, yields: usize) -> Self {
        Probe {
            yields,
            ..Probe::asynchronous(name, log)
        }
    }
}

impl Dispose for Probe {
    fn dispose(&mut self) -> Result<(), ReleaseError> {
        self.log.borrow_mut().push(format!("sync:{}", self.name));
        Ok(())
    }
}

impl AsyncDispose for Probe {
    fn dispose_async(&mut self) -> ReleaseFuture<'_> {
        Box::pin(async move {
            for _ in 0..self.yields {
                tokio::task::yield_now().await;
            }
            self.log.borrow_mut().push(format!("async:{}", self.name));
            Ok(())
        })
    }
}

impl Trackable for Probe {
    fn async_capability(&mut self) -> Option<&mut dyn AsyncDispose> {
        if self.has_async { Some(self) } else { None }
    }

    fn sync_capability(&mut self) -> Option<&mut dyn Dispose> {
        if self.has_sync { Some(self) } else { None }
    }
}

#[test]
fn sync_stack_releases_in_reverse_push_order() {
    let log = new_log();
    let mut stack = DisposalStack::new();
    for name in ["r1", "r2", "r3", "r4", "r5"] {
        stack.track(Probe::synchronous(name, &log)).unwrap();
    }
    stack.dispose().unwrap();
    assert_eq!(
        *log.borrow(),
        vec!["sync:r5", "sync:r4", "sync:r3", "sync:r2", "sync:r1"]
    );
}

#[tokio::test]
async fn async_stack_releases_in_reverse_push_order() {
    let log = new_log();
    let mut stack = AsyncDisposalStack::new();
    for name in ["r1", "r2", "r3", "r4", "r5"] {
        stack.track(Probe::asynchronous(name, &log)).unwrap();
    }
    stack.dispose_async().await.unwrap();
    assert_eq!(
        *log.borrow(),
        vec!["async:r5", "async:r4", "async:r3", "async:r2", "async:r1"]
    );
    assert!(stack.disposed());
}

#[tokio::test]
async fn sync_release_joins_async_unwind_in_order() {
    // `a` only has a sync capability, `b` an async one; the async release is
    // awaited first, then the sync release runs inline.
    let log = new_log();
    let mut stack = AsyncDisposalStack::new();
    stack.track(Probe::synchronous("a", &log)).unwrap();
    stack.track(Probe::asynchronous("b", &log)).unwrap();
    stack.dispose_async().await.unwrap();
    assert_eq!(*log.borrow(), vec!["async:b", "sync:a"]);
    assert!(stack.disposed());
}

#[tokio::test]
async fn order_survives_suspension_points() {
    // Each async release suspends several times; the reverse order must hold
    // regardless, because every release is awaited to completion before the
    // next entry is popped.
    let log = new_log();
    let mut stack = AsyncDisposalStack::new();
    stack.track(Probe::yielding("r1", &log, 3)).unwrap();
    stack.track(Probe::synchronous("r2", &log)).unwrap();
    stack.track(Probe::yielding("r3", &log, 1)).unwrap();
    stack.dispose_async().await.unwrap();
    assert_eq!(*log.borrow(), vec!["async:r3", "sync:r2", "async:r1"]);
}

#[tokio::test]
async fn inner_scope_unwinds_before_outer_scope() {
    let log = new_log();
    let outer_log = Rc::clone(&log);
    scope(async |outer| {
        outer.track(Probe::asynchronous("outer", &outer_log)).unwrap();
        scope(async |inner| {
            inner.track(Probe::asynchronous("inner", &outer_log)).unwrap();
            Ok(())
        })
        .await?;
        outer_log.borrow_mut().push("inner scope done".into());
        Ok(())
    })
    .await
    .unwrap();
    assert_eq!(
        *log.borrow(),
        vec!["async:inner", "inner scope done", "async:outer"]
    );
}

#[tokio::test]
async fn stacks_nest_as_resources() {
    // A stack is itself trackable; disposing the outer stack unwinds the
    // inner one in its turn.
    let log = new_log();
    let mut outer = AsyncDisposalStack::new();
    let entry_log = Rc::clone(&log);
    outer
        .defer(move || {
            entry_log.borrow_mut().push("outer entry".into());
            Ok(())
        })
        .unwrap();

    let mut inner = AsyncDisposalStack::new();
    let entry_log = Rc::clone(&log);
    inner
        .defer(move || {
            entry_log.borrow_mut().push("inner entry".into());
            Ok(())
        })
        .unwrap();

    let inner = outer.track(inner).unwrap();
    outer.dispose_async().await.unwrap();
    assert!(inner.borrow().disposed());
    assert_eq!(*log.borrow(), vec!["inner entry", "outer entry"]);
}
