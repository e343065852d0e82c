//! Replay execution, determinism verification and golden checks.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use pyre_core::components::BattleOutcome;
use pyre_core::content::ContentDatabase;
use pyre_core::replay::BattleReplay;
use pyre_core::state::{BattleConfig, BattleDigest, BattleState};

use crate::loader::Result;

/// Summary of one replay run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Replay seed.
    pub seed: u64,
    /// Final outcome.
    pub outcome: BattleOutcome,
    /// Final digest.
    pub digest: BattleDigest,
    /// Folded digest hash.
    pub hash: u64,
}

/// Run a replay to completion and return the report with the final state.
pub fn run_replay(
    replay: &BattleReplay,
    content: &ContentDatabase,
    config: BattleConfig,
) -> Result<(RunReport, BattleState)> {
    let mut sim = replay.simulation(content, config)?;
    let outcome = sim.simulate_until_finished(config.max_ticks);
    let state = sim.state().clone();
    let digest = state.digest();

    Ok((
        RunReport {
            seed: replay.seed,
            outcome,
            digest,
            hash: digest.hash(),
        },
        state,
    ))
}

/// Result of running the same replay several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Number of runs.
    pub runs: u32,
    /// Hash of every run, in run order.
    pub hashes: Vec<u64>,
}

impl VerifyReport {
    /// Whether all runs agree.
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Distinct hashes, sorted.
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }
}

/// Run a replay `runs` times in parallel and collect the hashes.
pub fn verify_replay(
    replay: &BattleReplay,
    content: &ContentDatabase,
    config: BattleConfig,
    runs: u32,
) -> Result<VerifyReport> {
    info!("Verifying determinism: seed {} ({} runs)", replay.seed, runs);

    let hashes = (0..runs)
        .into_par_iter()
        .map(|run| -> Result<u64> {
            let hash = replay.hash_outcome(content, config)?;
            debug!("run {}: {:016x}", run, hash);
            Ok(hash)
        })
        .collect::<Result<Vec<u64>>>()?;

    Ok(VerifyReport { runs, hashes })
}

/// Outcome of a golden hash comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GoldenCheck {
    /// Pinned hash.
    pub expected: u64,
    /// Hash produced now.
    pub actual: u64,
}

impl GoldenCheck {
    /// Whether the replay still matches its pinned hash.
    pub fn passed(&self) -> bool {
        self.expected == self.actual
    }
}

/// Compare a replay's outcome hash against a pinned value.
pub fn check_golden(
    replay: &BattleReplay,
    content: &ContentDatabase,
    config: BattleConfig,
    expected: u64,
) -> Result<GoldenCheck> {
    let actual = replay.hash_outcome(content, config)?;
    Ok(GoldenCheck { expected, actual })
}

/// Parse a hash given either in decimal or as `0x`-prefixed hex.
pub fn parse_hash(text: &str) -> std::result::Result<u64, String> {
    let text = text.trim().replace('_', "");
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse::<u64>(),
    };
    parsed.map_err(|e| format!("invalid hash '{text}': {e}"))
}

/// Parse an encounter node identifier written as a UUID or 32 hex digits.
pub fn parse_node_id(text: &str) -> std::result::Result<u128, String> {
    let hex: String = text.trim().chars().filter(|c| *c != '-').collect();
    if hex.len() != 32 {
        return Err(format!("node id '{text}' must have 32 hex digits"));
    }
    u128::from_str_radix(&hex, 16).map_err(|e| format!("invalid node id '{text}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hash_accepts_decimal_and_hex() {
        assert_eq!(parse_hash("42"), Ok(42));
        assert_eq!(parse_hash("0x2a"), Ok(42));
        assert_eq!(parse_hash("0X2A"), Ok(42));
        assert_eq!(parse_hash("1_000"), Ok(1000));
        assert!(parse_hash("0xzz").is_err());
        assert!(parse_hash("").is_err());
    }

    #[test]
    fn test_parse_node_id_accepts_uuid_form() {
        assert_eq!(
            parse_node_id("D9A54F62-7BB7-4C06-AF0D-7E79D407F7B3"),
            Ok(0xD9A5_4F62_7BB7_4C06_AF0D_7E79_D407_F7B3)
        );
        assert_eq!(
            parse_node_id("d9a54f627bb74c06af0d7e79d407f7b3"),
            Ok(0xD9A5_4F62_7BB7_4C06_AF0D_7E79_D407_F7B3)
        );
        assert!(parse_node_id("d9a5").is_err());
    }

    #[test]
    fn test_verify_report_uniqueness() {
        let report = VerifyReport {
            runs: 3,
            hashes: vec![7, 7, 7],
        };
        assert!(report.is_deterministic());
        assert_eq!(report.unique_hashes(), vec![7]);

        let report = VerifyReport {
            runs: 3,
            hashes: vec![7, 9, 7],
        };
        assert!(!report.is_deterministic());
        assert_eq!(report.unique_hashes(), vec![7, 9]);
    }
}
