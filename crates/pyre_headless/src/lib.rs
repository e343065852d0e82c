//! Headless battle runner for replay verification and CI.
//!
//! This crate drives `pyre_core` battles without any presentation layer:
//!
//! - **Replay runs**: load content and a replay, simulate to completion and
//!   print the outcome, digest and hash
//! - **Determinism checks**: run one replay many times in parallel and
//!   require a single hash
//! - **Golden checks**: compare a replay against a pinned hash for CI
//! - **Seeds**: mint run seeds from OS entropy and derive encounter seeds
//!
//! It is the only crate in the workspace that touches the filesystem or
//! OS randomness.
//!
//! # Example
//!
//! ```bash
//! # Run a replay
//! cargo run -p pyre_headless -- run --content data/content.ron --replay data/replays/push.ron
//!
//! # Verify determinism
//! cargo run -p pyre_headless -- verify --content data/content.ron --replay data/replays/push.ron --runs 16
//! ```

#![warn(missing_docs)]

pub mod loader;
pub mod runner;

pub use loader::{
    load_config, load_config_or_default, load_content, load_replay, load_setup, save_replay,
    HeadlessError, Result,
};
pub use runner::{
    check_golden, parse_hash, parse_node_id, run_replay, verify_replay, GoldenCheck, RunReport,
    VerifyReport,
};
