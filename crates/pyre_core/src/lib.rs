//! # Pyre Core
//!
//! Deterministic lane battle simulation for Pyre Tactics.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math (integers, fixed-point for ratios)
//!
//! This separation enables:
//! - Asynchronous battles resolved from a setup alone
//! - Replays and golden-hash regression tests
//! - A presentation layer that only reads state snapshots
//!
//! ## Crate Structure
//!
//! - [`components`] - Archetypes, unit instances, statuses and pyres
//! - [`content`] - Read-only archetype lookups
//! - [`state`] - Setup, config and the mutable entity store
//! - [`simulation`] - The tick state machine and player actions
//! - [`targeting`] - Target priority and cadence helpers
//! - [`spells`] - Spell effect resolution
//! - [`replay`] - Replay records and hashing
//! - [`rng`] / [`seed`] - Deterministic randomness and seed derivation

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod components;
pub mod content;
pub mod error;
pub mod math;
pub mod replay;
pub mod rng;
pub mod seed;
pub mod simulation;
pub mod spells;
pub mod state;
pub mod targeting;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::components::*;
    pub use crate::content::{ContentCatalog, ContentDatabase};
    pub use crate::error::{CoreError, Result};
    pub use crate::math::Fixed;
    pub use crate::replay::{BattleReplay, ReplayAction, REPLAY_VERSION};
    pub use crate::rng::DeterministicRng;
    pub use crate::seed::SeedFactory;
    pub use crate::simulation::{BattleSimulation, ScheduledCast};
    pub use crate::state::{BattleConfig, BattleDigest, BattleSetup, BattleState, UnitPlacement};
}
