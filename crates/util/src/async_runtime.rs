//! Running async fetches from synchronous callers.
//!
//! Decoding is synchronous, but it may happen anywhere: in a plain `main`, inside a
//! `#[tokio::main]` application, or on a current-thread runtime. [`block_on_future`] picks a
//! way to drive the future that is valid in each of those places.

use std::{future::Future, io, panic, thread};

use tokio::{
    runtime::{Builder, Handle, RuntimeFlavor},
    task,
};

/// Executes `future` to completion from synchronous code.
///
/// - Inside a multi-thread runtime, the current worker is handed over with
///   [`task::block_in_place`] and the future runs on the existing runtime.
/// - Inside a current-thread runtime, which cannot block in place, the future runs on a
///   fresh single-threaded runtime on a scoped helper thread.
/// - Outside any runtime, a single-threaded runtime is built on the calling thread.
///
/// The surrounding runtime must have its IO and time drivers enabled.
pub fn block_on_future<F, T, E>(future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: From<io::Error> + Send,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() != RuntimeFlavor::CurrentThread => {
            task::block_in_place(|| handle.block_on(future))
        }
        Ok(_) => thread::scope(|scope| {
            scope
                .spawn(|| run_on_local_runtime(future))
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload))
        }),
        Err(_) => run_on_local_runtime(future),
    }
}

fn run_on_local_runtime<F, T, E>(future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<io::Error>,
{
    Builder::new_current_thread().enable_all().build()?.block_on(future)
}
