//! Test-driven code generation loop.
//!
//! Given test code, this crate asks a language model for an implementation,
//! runs a build-and-test pipeline against the result, and feeds failures back
//! to the model until the tests pass or the retry budget is exhausted. A
//! second flow generates the test files themselves from a specification
//! document, repairing them against build errors only.
//!
//! The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (response parsing, conversation
//!   transcript, retry accounting, segmentation). No I/O.
//! - **[`io`]**: Side-effecting adapters (filesystem, model subprocess,
//!   verification pipeline). Isolated behind traits to enable scripted
//!   implementations in tests.
//!
//! Orchestration modules ([`cycle`], [`batch`]) coordinate core logic with
//! I/O to implement the CLI commands.

pub mod batch;
pub mod core;
pub mod cycle;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
