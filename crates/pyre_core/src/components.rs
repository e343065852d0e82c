//! Battle entity and archetype definitions.
//!
//! Static archetypes (units, spells, traps, artifacts) are immutable data
//! looked up by string key. Dynamic state (unit instances, pyres) is
//! plain data mutated by the simulation each tick.

use serde::{Deserialize, Serialize};

/// Unique identifier for a unit instance.
///
/// Assigned from a monotonically increasing sequence at insertion, so it
/// doubles as the final tie-breaker in every priority comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// Battle side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    /// The player's side, spawning at tile 0.
    Player,
    /// The opposing side, spawning at the far end of the field.
    Enemy,
}

impl Team {
    /// Tile step taken when advancing toward the opposing pyre.
    #[must_use]
    pub const fn direction(self) -> i32 {
        match self {
            Team::Player => 1,
            Team::Enemy => -1,
        }
    }

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Team::Player => Team::Enemy,
            Team::Enemy => Team::Player,
        }
    }
}

/// One of the three parallel combat corridors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lane {
    /// Lane index 0.
    Left,
    /// Lane index 1.
    Mid,
    /// Lane index 2.
    Right,
}

impl Lane {
    /// All lanes in index order.
    pub const ALL: [Lane; 3] = [Lane::Left, Lane::Mid, Lane::Right];

    /// Ordinal of this lane.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Lane::Left => 0,
            Lane::Mid => 1,
            Lane::Right => 2,
        }
    }

    /// Lane for an ordinal, if any.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Lane::Left),
            1 => Some(Lane::Mid),
            2 => Some(Lane::Right),
            _ => None,
        }
    }

    /// Absolute index distance between two lanes.
    #[must_use]
    pub const fn distance(self, other: Lane) -> u8 {
        self.index().abs_diff(other.index())
    }

    /// Whether the two lanes are index neighbours.
    #[must_use]
    pub const fn is_adjacent(self, other: Lane) -> bool {
        self.distance(other) == 1
    }
}

/// Closed set of unit behaviours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Closes distance and strikes at range 1.
    Melee,
    /// Holds position once anything is in range.
    Ranged,
    /// Heals wounded allies instead of attacking.
    Healer,
    /// Support unit; fights like melee.
    Buffer,
}

/// Target-selection bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stance {
    /// Prefer the closest enemy.
    Guard,
    /// Prefer the weakest enemy.
    Skirmish,
    /// Prefer ranged enemies.
    Hunter,
}

/// Static unit definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitArchetype {
    /// Stable content key.
    pub key: String,
    /// Behaviour class.
    pub role: Role,
    /// Maximum hit points.
    pub max_hp: i32,
    /// Damage per attack (also the damage dealt to a pyre on contact).
    pub attack: i32,
    /// Ticks between attacks before status modifiers.
    pub attack_interval_ticks: u32,
    /// Attack range in tiles.
    pub range_tiles: i32,
    /// Movement speed in tiles per second; zero never moves.
    pub speed_tiles_per_second: u32,
    /// Deployment cost.
    pub cost: u32,
}

impl UnitArchetype {
    /// Units with reach beyond one tile count as ranged for targeting.
    #[must_use]
    pub const fn is_ranged(&self) -> bool {
        self.range_tiles > 1
    }
}

/// Timed effect attached to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEffect {
    /// Attack-speed modifier; negative percentages shorten the interval.
    Rally {
        /// Tick at which the effect lapses.
        expires_at_tick: u64,
        /// Signed percent applied to the attack interval.
        attack_speed_modifier_pct: i32,
    },
    /// Damage applied every status pass until expiry.
    Burn {
        /// HP lost per tick.
        damage_per_tick: i32,
        /// Tick at which the effect lapses.
        expires_at_tick: u64,
    },
    /// Lengthens the attack interval.
    Slow {
        /// Percent added to the attack interval.
        percent: i32,
        /// Tick at which the effect lapses.
        expires_at_tick: u64,
    },
}

impl StatusEffect {
    /// Expiry tick of the effect.
    #[must_use]
    pub const fn expires_at(&self) -> u64 {
        match *self {
            StatusEffect::Rally { expires_at_tick, .. }
            | StatusEffect::Burn { expires_at_tick, .. }
            | StatusEffect::Slow { expires_at_tick, .. } => expires_at_tick,
        }
    }

    /// Whether the effect has lapsed at `tick`.
    #[must_use]
    pub const fn is_expired(&self, tick: u64) -> bool {
        tick >= self.expires_at()
    }
}

/// What a spell does when cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpellEffect {
    /// Restore HP; single target without a radius, area with one.
    Heal {
        /// HP restored per target.
        amount: i32,
        /// Optional tile radius around the anchor.
        radius: Option<i32>,
    },
    /// Damage every enemy in the anchor lane within `radius` tiles.
    Fireball {
        /// Damage per enemy.
        damage: i32,
        /// Tile radius around the anchor.
        radius: i32,
    },
    /// Timed attack-speed buff for allies in the anchor lane.
    Rally {
        /// Percent by which the attack interval shrinks.
        attack_speed_percent: i32,
        /// Buff length in ticks.
        duration_ticks: u64,
    },
}

/// Static spell definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpellArchetype {
    /// Stable content key.
    pub key: String,
    /// Energy cost.
    pub cost: u32,
    /// Effect applied on a successful cast.
    pub effect: SpellEffect,
}

/// Lane trap effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrapEffect {
    /// One-shot damage to the first intruder.
    Spikes {
        /// Damage dealt on trigger.
        damage: i32,
    },
}

/// Static trap definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrapArchetype {
    /// Stable content key.
    pub key: String,
    /// Placement cost.
    pub cost: u32,
    /// Effect on trigger.
    pub effect: TrapEffect,
}

impl TrapArchetype {
    /// Damage dealt when the trap springs.
    #[must_use]
    pub const fn damage(&self) -> i32 {
        match self.effect {
            TrapEffect::Spikes { damage } => damage,
        }
    }
}

/// Passive artifact effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactEffect {
    /// Flat armor for every front-slot ally.
    FrontSlotArmor {
        /// Armor granted.
        amount: i32,
    },
    /// Heal the most wounded lane ally when a unit scores a kill.
    OnKillHeal {
        /// HP restored.
        amount: i32,
    },
}

/// Static artifact definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactArchetype {
    /// Stable content key.
    pub key: String,
    /// Passive effect.
    pub effect: ArtifactEffect,
    /// Player-facing summary.
    #[serde(default)]
    pub description: String,
}

/// Where a spell is aimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpellTarget {
    /// Centre on a unit's current lane and tile.
    Unit(UnitId),
    /// Centre on an explicit lane and tile.
    LanePoint {
        /// Anchor lane.
        lane: Lane,
        /// Anchor tile.
        tile: i32,
    },
}

/// A live unit on the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInstance {
    /// Stable identity and insertion sequence.
    pub id: UnitId,
    /// Archetype key resolved at bootstrap.
    pub archetype_key: String,
    /// Owning side.
    pub team: Team,
    /// Current lane.
    pub lane: Lane,
    /// 0 = front, 1 = mid, 2 = back.
    pub slot: u8,
    /// Tile along the field, 0 at the player pyre.
    pub x_tile: i32,
    /// Current hit points.
    pub hp: i32,
    /// Ticks until the next attack or heal.
    pub attack_cooldown: u32,
    /// Target-selection bias.
    pub stance: Stance,
    /// Active timed effects, in application order.
    pub statuses: Vec<StatusEffect>,
    /// Hero units project the adjacency aura.
    pub is_hero: bool,
    /// Veteran marker carried from the run layer.
    pub is_veteran: bool,
    /// Flat damage reduction.
    pub armor: i32,
}

impl UnitInstance {
    /// Whether the unit still has HP.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Whether any rally effect is active on the unit.
    #[must_use]
    pub fn has_rally(&self) -> bool {
        self.statuses
            .iter()
            .any(|s| matches!(s, StatusEffect::Rally { .. }))
    }
}

/// A team's base structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pyre {
    /// Owning side.
    pub team: Team,
    /// Current hit points.
    pub hp: i32,
    /// Damage per shot.
    pub attack: i32,
    /// Ticks between shots.
    pub attack_interval_ticks: u32,
    /// Ticks until the next shot.
    pub cooldown: u32,
}

impl Pyre {
    /// Create a pyre with its cooldown primed to a full interval.
    #[must_use]
    pub const fn new(team: Team, hp: i32, attack: i32, attack_interval_ticks: u32) -> Self {
        Self {
            team,
            hp,
            attack,
            attack_interval_ticks,
            cooldown: attack_interval_ticks,
        }
    }

    /// Whether the pyre has fallen.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.hp <= 0
    }
}

/// Battle result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BattleOutcome {
    /// Still being fought.
    #[default]
    InProgress,
    /// The enemy pyre fell.
    Victory,
    /// The player pyre fell, or the battle timed out.
    Defeat,
}

impl BattleOutcome {
    /// Numeric code folded into the battle hash.
    #[must_use]
    pub const fn code(self) -> u64 {
        match self {
            BattleOutcome::InProgress => 0,
            BattleOutcome::Victory => 1,
            BattleOutcome::Defeat => 2,
        }
    }

    /// Whether the outcome is final.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, BattleOutcome::InProgress)
    }
}
