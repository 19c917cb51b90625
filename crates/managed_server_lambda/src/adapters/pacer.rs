use std::time::Duration;

use tokio::runtime::{Handle, RuntimeFlavor};

/// Performs the simulated waits that stand in for real work.
pub trait Pacer {
    fn pause(&self, duration: Duration);
}

/// Sleeps the current thread. On a multi-threaded runtime the worker is
/// handed off first so other tasks keep running.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockingPacer;

impl Pacer for BlockingPacer {
    fn pause(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }

        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| std::thread::sleep(duration))
            }
            _ => std::thread::sleep(duration),
        }
    }
}
