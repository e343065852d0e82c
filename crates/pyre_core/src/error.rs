//! Error types for the battle engine.
//!
//! Only construction and data-loading faults are errors. Rejected player
//! actions (casts, maneuvers) are ordinary game outcomes and are reported
//! as `false` by the simulation instead.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Top-level error type for all engine faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A placement referenced a unit archetype the content database lacks.
    #[error("Missing unit archetype: {0}")]
    MissingArchetype(String),

    /// A spell identifier is not present in the content database.
    #[error("Missing spell archetype: {0}")]
    MissingSpell(String),

    /// A trap identifier is not present in the content database.
    #[error("Missing trap archetype: {0}")]
    MissingTrap(String),

    /// A placement used a slot outside front/mid/back.
    #[error("Invalid placement slot: {slot} (expected 0..=2)")]
    InvalidPlacementSlot {
        /// The offending slot value.
        slot: u8,
    },

    /// A data document failed to parse.
    #[error("Failed to parse {source_name}: {message}")]
    DataParseError {
        /// Name of the document that failed (file name or logical name).
        source_name: String,
        /// Parser error message.
        message: String,
    },

    /// A replay record could not be encoded.
    #[error("Failed to encode replay: {0}")]
    ReplayEncode(String),

    /// A replay record could not be decoded.
    #[error("Failed to decode replay: {0}")]
    ReplayDecode(String),

    /// A binary replay was written by an incompatible engine version.
    #[error("Replay version mismatch: expected {expected}, found {found}")]
    ReplayVersionMismatch {
        /// Version this engine understands.
        expected: u32,
        /// Version stored in the record.
        found: u32,
    },
}
