//! Scoped cleanup walkthrough: track, adopt and defer releases in one scope,
//! let one release fail, and print the aggregated failure chain.
//!
//! Run with `cargo run --example scoped_cleanup`.

use disposal::{AsyncDispose, ReleaseError, ReleaseFuture, Suppressed, Trackable, scope};

struct Connection {
    peer: &'static str,
    flaky: bool,
}

impl Connection {
    async fn open(peer: &'static str, flaky: bool) -> Result<Self, ReleaseError> {
        println!("opening connection to {peer}");
        Ok(Connection { peer, flaky })
    }
}

impl AsyncDispose for Connection {
    fn dispose_async(&mut self) -> ReleaseFuture<'_> {
        Box::pin(async move {
            println!("closing connection to {}", self.peer);
            if self.flaky {
                return Err(format!("{}: connection reset during close", self.peer).into());
            }
            Ok(())
        })
    }
}

impl Trackable for Connection {
    fn async_capability(&mut self) -> Option<&mut dyn AsyncDispose> {
        Some(self)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let outcome = scope(async |stack| {
        let primary = stack.track(Connection::open("db-1", true).await?)?;
        stack.track(Connection::open("db-2", true).await?)?;
        stack.adopt("session-token", |token| {
            println!("revoking {}", token.borrow());
            Ok(())
        })?;
        stack.defer(|| {
            println!("flushing metrics");
            Ok(())
        })?;

        println!("working against {}", primary.borrow().peer);
        Ok("all writes committed")
    })
    .await;

    match outcome {
        Ok(message) => println!("scope finished: {message}"),
        Err(err) => {
            println!("scope failed: {err}");
            if let Some(link) = err.downcast_ref::<Suppressed>() {
                for (depth, failure) in link.chain().enumerate() {
                    println!("  [{depth}] {failure}");
                }
            }
        }
    }
}
