//! Subprocess execution of the Deno binary.
//!
//! Every run resolves the binary afresh through the locator, then spawns it
//! with stderr forwarded to the host's stdout.

pub mod runner;

pub use runner::{spawn, spawn_forwarding_to, ExecutionRunner, ProcessHandle};
