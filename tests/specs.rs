//! Behavioral specifications for the bosun supervisor.
//!
//! Black-box: these tests spawn the real `bosund` binary and verify its
//! observable effects (exit codes, lock file, log output).

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/daemon/lifecycle.rs"]
mod daemon_lifecycle;
#[path = "specs/daemon/restart.rs"]
mod daemon_restart;
