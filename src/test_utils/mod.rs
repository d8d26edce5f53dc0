#[cfg(feature = "test-utils")]
use std::sync::LazyLock;
#[cfg(feature = "test-utils")]
use tokio::runtime::Runtime;

/// Shared tokio runtime for test utilities to avoid creating multiple runtimes
#[cfg(feature = "test-utils")]
pub(crate) static SHARED_RUNTIME: LazyLock<Runtime> =
    LazyLock::new(|| Runtime::new().expect("Failed to create tokio runtime for test utilities"));

/// Scripted fake session for driving the engine without a server
pub mod scripted;

/// Test utilities for `PostgreSQL` testing and benchmarking
#[cfg(feature = "test-utils")]
pub mod postgres;

pub use scripted::ScriptedSession;

#[cfg(feature = "test-utils")]
pub use postgres::*;
