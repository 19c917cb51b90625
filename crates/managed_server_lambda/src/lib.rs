//! Lambda handlers and runtime adapters for the managed-server demo.
//!
//! Handlers are plain functions over a JSON event, an [`config::InvocationContext`]
//! and injected adapters (state stores, pacing), so every behavior can be
//! exercised without the Lambda runtime. The binaries under `src/bin` wire the
//! real adapters and hand the handlers to `lambda_runtime`.

pub mod adapters;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
