//! Read-only content lookups.
//!
//! The engine never owns content authoring; it receives an immutable
//! [`ContentDatabase`] handle at construction and only resolves keys
//! through it. Maps are `BTreeMap` so any iteration over content is
//! ordered.
//!
//! # Example RON
//!
//! ```ron
//! (
//!     units: [
//!         (
//!             key: "unit.spearman",
//!             role: Melee,
//!             max_hp: 60,
//!             attack: 8,
//!             attack_interval_ticks: 60,
//!             range_tiles: 1,
//!             speed_tiles_per_second: 2,
//!             cost: 2,
//!         ),
//!     ],
//!     spells: [
//!         (key: "spell.heal", cost: 2, effect: Heal(amount: 25, radius: None)),
//!     ],
//! )
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{ArtifactArchetype, SpellArchetype, TrapArchetype, UnitArchetype};
use crate::error::{CoreError, Result};

/// Serialized form of a content catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentCatalog {
    /// Unit archetypes.
    #[serde(default)]
    pub units: Vec<UnitArchetype>,
    /// Spell archetypes.
    #[serde(default)]
    pub spells: Vec<SpellArchetype>,
    /// Trap archetypes.
    #[serde(default)]
    pub traps: Vec<TrapArchetype>,
    /// Artifact archetypes.
    #[serde(default)]
    pub artifacts: Vec<ArtifactArchetype>,
}

/// Immutable archetype lookup keyed by content string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentDatabase {
    units: BTreeMap<String, UnitArchetype>,
    spells: BTreeMap<String, SpellArchetype>,
    traps: BTreeMap<String, TrapArchetype>,
    artifacts: BTreeMap<String, ArtifactArchetype>,
}

impl ContentDatabase {
    /// Build a database from unit and spell archetypes.
    ///
    /// Later duplicates of a key replace earlier ones.
    #[must_use]
    pub fn new(units: Vec<UnitArchetype>, spells: Vec<SpellArchetype>) -> Self {
        Self {
            units: units.into_iter().map(|u| (u.key.clone(), u)).collect(),
            spells: spells.into_iter().map(|s| (s.key.clone(), s)).collect(),
            traps: BTreeMap::new(),
            artifacts: BTreeMap::new(),
        }
    }

    /// Add trap archetypes.
    #[must_use]
    pub fn with_traps(mut self, traps: Vec<TrapArchetype>) -> Self {
        self.traps
            .extend(traps.into_iter().map(|t| (t.key.clone(), t)));
        self
    }

    /// Add artifact archetypes.
    #[must_use]
    pub fn with_artifacts(mut self, artifacts: Vec<ArtifactArchetype>) -> Self {
        self.artifacts
            .extend(artifacts.into_iter().map(|a| (a.key.clone(), a)));
        self
    }

    /// Build a database from a catalog document.
    #[must_use]
    pub fn from_catalog(catalog: ContentCatalog) -> Self {
        Self::new(catalog.units, catalog.spells)
            .with_traps(catalog.traps)
            .with_artifacts(catalog.artifacts)
    }

    /// Parse a RON catalog document.
    pub fn from_ron_str(source_name: &str, text: &str) -> Result<Self> {
        let catalog: ContentCatalog =
            ron::from_str(text).map_err(|e| CoreError::DataParseError {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self::from_catalog(catalog))
    }

    /// Export the database back to catalog form.
    #[must_use]
    pub fn to_catalog(&self) -> ContentCatalog {
        ContentCatalog {
            units: self.units.values().cloned().collect(),
            spells: self.spells.values().cloned().collect(),
            traps: self.traps.values().cloned().collect(),
            artifacts: self.artifacts.values().cloned().collect(),
        }
    }

    /// Resolve a unit archetype.
    pub fn unit(&self, key: &str) -> Result<&UnitArchetype> {
        self.units
            .get(key)
            .ok_or_else(|| CoreError::MissingArchetype(key.to_string()))
    }

    /// Resolve a spell archetype.
    pub fn spell(&self, key: &str) -> Result<&SpellArchetype> {
        self.spells
            .get(key)
            .ok_or_else(|| CoreError::MissingSpell(key.to_string()))
    }

    /// Resolve a trap archetype.
    pub fn trap(&self, key: &str) -> Result<&TrapArchetype> {
        self.traps
            .get(key)
            .ok_or_else(|| CoreError::MissingTrap(key.to_string()))
    }

    /// Look up an artifact; unknown keys are not an error.
    #[must_use]
    pub fn artifact(&self, key: &str) -> Option<&ArtifactArchetype> {
        self.artifacts.get(key)
    }

    /// All spell keys in sorted order.
    pub fn spell_keys(&self) -> impl Iterator<Item = &str> {
        self.spells.keys().map(String::as_str)
    }
}
