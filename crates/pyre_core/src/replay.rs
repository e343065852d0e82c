//! Replay records for deterministic re-runs and golden hashes.
//!
//! A replay is a seed, the starting setup and a timeline of casts. Running
//! it twice with the same content and config gives the same hash; the
//! golden tests pin that hash.
//!
//! Two encodings are supported: RON for hand-edited fixtures (fields added
//! after version 1 fall back to defaults when missing) and bincode for
//! compact storage (version-checked on load).

use serde::{Deserialize, Serialize};

use crate::components::{BattleOutcome, Lane, SpellTarget};
use crate::content::ContentDatabase;
use crate::error::{CoreError, Result};
use crate::simulation::{BattleSimulation, ScheduledCast};
use crate::state::{BattleConfig, BattleSetup};

/// Replay format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Anchor lane used when a recorded cast omits one.
pub const DEFAULT_ACTION_LANE: Lane = Lane::Mid;

/// Anchor tile used when a recorded cast omits one.
pub const DEFAULT_ACTION_TILE: i32 = 0;

fn current_version() -> u32 {
    REPLAY_VERSION
}

/// A recorded player action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayAction {
    /// Cast a spell at a lane point.
    CastSpell {
        /// Tick the cast fires on.
        tick: u64,
        /// Spell key.
        spell_id: String,
        /// Anchor lane, defaulting to the middle lane.
        #[serde(default)]
        lane: Option<Lane>,
        /// Anchor tile, defaulting to 0.
        #[serde(default)]
        tile: Option<i32>,
    },
}

impl ReplayAction {
    /// Tick the action fires on.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        match self {
            ReplayAction::CastSpell { tick, .. } => *tick,
        }
    }

    /// Convert to a simulation cast with the default anchor filled in.
    #[must_use]
    pub fn to_scheduled(&self) -> ScheduledCast {
        match self {
            ReplayAction::CastSpell {
                tick,
                spell_id,
                lane,
                tile,
            } => ScheduledCast {
                tick: *tick,
                spell_id: spell_id.clone(),
                target: SpellTarget::LanePoint {
                    lane: lane.unwrap_or(DEFAULT_ACTION_LANE),
                    tile: tile.unwrap_or(DEFAULT_ACTION_TILE),
                },
            },
        }
    }
}

/// Complete replay record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReplay {
    /// Replay format version.
    #[serde(default = "current_version")]
    pub version: u32,
    /// Battle seed.
    pub seed: u64,
    /// Starting setup.
    pub setup: BattleSetup,
    /// Actions in tick order.
    #[serde(default)]
    pub actions: Vec<ReplayAction>,
}

impl BattleReplay {
    /// Create a replay; actions are stable-sorted by tick.
    #[must_use]
    pub fn new(seed: u64, setup: BattleSetup, mut actions: Vec<ReplayAction>) -> Self {
        actions.sort_by_key(ReplayAction::tick);
        Self {
            version: REPLAY_VERSION,
            seed,
            setup,
            actions,
        }
    }

    /// Build a simulation with the action timeline registered.
    pub fn simulation<'a>(
        &self,
        content: &'a ContentDatabase,
        config: BattleConfig,
    ) -> Result<BattleSimulation<'a>> {
        let mut sim = BattleSimulation::new(&self.setup, content, self.seed, config)?;
        sim.schedule_actions(self.actions.iter().map(ReplayAction::to_scheduled).collect());
        Ok(sim)
    }

    /// Run to completion and return the outcome.
    pub fn run(&self, content: &ContentDatabase, config: BattleConfig) -> Result<BattleOutcome> {
        let mut sim = self.simulation(content, config)?;
        Ok(sim.simulate_until_finished(config.max_ticks))
    }

    /// Run to completion and return the final state hash.
    pub fn hash_outcome(&self, content: &ContentDatabase, config: BattleConfig) -> Result<u64> {
        let mut sim = self.simulation(content, config)?;
        sim.simulate_until_finished(config.max_ticks);
        Ok(sim.battle_hash())
    }

    /// Encode as pretty RON.
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| CoreError::ReplayEncode(e.to_string()))
    }

    /// Decode from RON. Missing optional fields take their defaults.
    pub fn from_ron(text: &str) -> Result<Self> {
        let mut replay: Self =
            ron::from_str(text).map_err(|e| CoreError::ReplayDecode(e.to_string()))?;
        replay.actions.sort_by_key(ReplayAction::tick);
        Ok(replay)
    }

    /// Encode as bincode bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CoreError::ReplayEncode(e.to_string()))
    }

    /// Decode bincode bytes, rejecting other format versions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let replay: Self =
            bincode::deserialize(bytes).map_err(|e| CoreError::ReplayDecode(e.to_string()))?;

        if replay.version != REPLAY_VERSION {
            return Err(CoreError::ReplayVersionMismatch {
                expected: REPLAY_VERSION,
                found: replay.version,
            });
        }

        Ok(replay)
    }
}
