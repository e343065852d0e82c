//! File loading for content, configs, setups and replays.
//!
//! Everything the CLI reads is RON except binary replays, which are
//! recognised by the `.bin` extension and decoded with the versioned
//! bincode format.

use std::path::Path;

use pyre_core::content::ContentDatabase;
use pyre_core::error::CoreError;
use pyre_core::replay::BattleReplay;
use pyre_core::state::{BattleConfig, BattleSetup};
use thiserror::Error;

/// Extension that selects the binary replay encoding.
pub const BINARY_REPLAY_EXTENSION: &str = "bin";

/// Error type for headless operations.
#[derive(Error, Debug)]
pub enum HeadlessError {
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(String),
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse RON: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Engine rejected the data.
    #[error(transparent)]
    Core(#[from] CoreError),
    /// Failed to write JSON output.
    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for headless operations.
pub type Result<T> = std::result::Result<T, HeadlessError>;

fn read_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(HeadlessError::FileNotFound(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}

fn is_binary(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(BINARY_REPLAY_EXTENSION))
}

/// Load a content catalog.
pub fn load_content<P: AsRef<Path>>(path: P) -> Result<ContentDatabase> {
    let path = path.as_ref();
    let text = read_text(path)?;
    Ok(ContentDatabase::from_ron_str(&path.display().to_string(), &text)?)
}

/// Load a battle config; missing fields take their defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BattleConfig> {
    let text = read_text(path.as_ref())?;
    Ok(ron::from_str(&text)?)
}

/// Load a config if a path is given, otherwise use the defaults.
pub fn load_config_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<BattleConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(BattleConfig::default()),
    }
}

/// Load a battle setup.
pub fn load_setup<P: AsRef<Path>>(path: P) -> Result<BattleSetup> {
    let text = read_text(path.as_ref())?;
    Ok(ron::from_str(&text)?)
}

/// Load a replay, choosing the encoding by extension.
pub fn load_replay<P: AsRef<Path>>(path: P) -> Result<BattleReplay> {
    let path = path.as_ref();
    if is_binary(path) {
        if !path.exists() {
            return Err(HeadlessError::FileNotFound(path.display().to_string()));
        }
        let bytes = std::fs::read(path)?;
        return Ok(BattleReplay::from_bytes(&bytes)?);
    }
    let text = read_text(path)?;
    Ok(BattleReplay::from_ron(&text)?)
}

/// Write a replay, choosing the encoding by extension.
pub fn save_replay<P: AsRef<Path>>(path: P, replay: &BattleReplay) -> Result<()> {
    let path = path.as_ref();
    if is_binary(path) {
        std::fs::write(path, replay.to_bytes()?)?;
    } else {
        std::fs::write(path, replay.to_ron()?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_extension_detection() {
        assert!(is_binary(Path::new("replays/push.bin")));
        assert!(is_binary(Path::new("PUSH.BIN")));
        assert!(!is_binary(Path::new("push.ron")));
        assert!(!is_binary(Path::new("push")));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = load_content("does/not/exist.ron").unwrap_err();
        assert!(matches!(err, HeadlessError::FileNotFound(_)));
    }

    #[test]
    fn test_no_config_path_gives_defaults() {
        let config = load_config_or_default::<&Path>(None).unwrap();
        assert_eq!(config, BattleConfig::default());
    }
}
