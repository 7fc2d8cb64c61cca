use criterion::{Criterion, criterion_group, criterion_main};
use disposal::{AsyncDisposalStack, Dispose, DisposalStack, ReleaseError, Trackable};
use std::hint::black_box;

// cargo bench --profile dev

// Initialize logger for benchmark so `RUST_LOG` is honored.
#[ctor::ctor]
fn __init_bench_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).try_init();
}

struct Counter(u64);

impl Dispose for Counter {
    fn dispose(&mut self) -> Result<(), ReleaseError> {
        self.0 += 1;
        Ok(())
    }
}

impl Trackable for Counter {
    fn sync_capability(&mut self) -> Option<&mut dyn Dispose> {
        Some(self)
    }
}

fn benchmark_disposal_operations(c: &mut Criterion) {
    c.bench_function("sync_stack_defer_and_dispose_64", |b| {
        b.iter(|| {
            let mut stack = DisposalStack::new();
            for _ in 0..64 {
                stack.defer(|| Ok(())).unwrap();
            }
            black_box(stack.dispose()).unwrap();
        })
    });

    c.bench_function("sync_stack_track_and_dispose_64", |b| {
        b.iter(|| {
            let mut stack = DisposalStack::new();
            for i in 0..64 {
                stack.track(Counter(i)).unwrap();
            }
            black_box(stack.dispose()).unwrap();
        })
    });

    c.bench_function("take_transfer_64", |b| {
        b.iter(|| {
            let mut stack = DisposalStack::new();
            for _ in 0..64 {
                stack.defer(|| Ok(())).unwrap();
            }
            let mut moved = stack.take().unwrap();
            black_box(moved.dispose()).unwrap();
        })
    });

    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build the benchmark runtime");

    c.bench_function("async_stack_defer_and_dispose_64", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut stack = AsyncDisposalStack::new();
                for _ in 0..64 {
                    stack.defer_async(|| async { Ok(()) }).unwrap();
                }
                black_box(stack.dispose_async().await).unwrap();
            })
        })
    });

    c.bench_function("async_stack_mixed_dispose_64", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut stack = AsyncDisposalStack::new();
                for i in 0..64 {
                    if i % 2 == 0 {
                        stack.track(Counter(i)).unwrap();
                    } else {
                        stack.defer_async(|| async { Ok(()) }).unwrap();
                    }
                }
                black_box(stack.dispose_async().await).unwrap();
            })
        })
    });
}

criterion_group!(benches, benchmark_disposal_operations);
criterion_main!(benches);
