//! Creature Entities and Reference Data
//!
//! Creatures, base templates, rarity tiers, elements, and fusion lineage.
//! Creatures are immutable once created except for the battle record
//! aggregate (wins/losses/damage).

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::game::ability::AbilityId;
use crate::game::player::PlayerId;

/// Content key for a base creature template.
pub type TemplateId = String;

/// Content key for a fusion catalyst.
pub type CatalystId = String;

// =============================================================================
// CREATURE ID
// =============================================================================

/// Unique creature identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub struct CreatureId(pub [u8; 16]);

impl CreatureId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

// =============================================================================
// RARITY
// =============================================================================

/// Rarity tier (Common lowest, Legendary top).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[derive(Default)]
pub enum Rarity {
    /// Tier 1: most common
    #[default]
    Common = 0,
    /// Tier 2
    Uncommon = 1,
    /// Tier 3
    Rare = 2,
    /// Tier 4
    Epic = 3,
    /// Tier 5: top tier, resets the pity counter
    Legendary = 4,
}

impl Rarity {
    /// All tiers ordered rarest to most common (drop-table order).
    pub const RAREST_FIRST: [Rarity; 5] = [
        Rarity::Legendary,
        Rarity::Epic,
        Rarity::Rare,
        Rarity::Uncommon,
        Rarity::Common,
    ];

    /// The top tier, guaranteed at hard pity.
    pub const TOP: Rarity = Rarity::Legendary;

    /// Next tier down (used for template fallback).
    pub fn next_lower(self) -> Option<Rarity> {
        match self {
            Rarity::Legendary => Some(Rarity::Epic),
            Rarity::Epic => Some(Rarity::Rare),
            Rarity::Rare => Some(Rarity::Uncommon),
            Rarity::Uncommon => Some(Rarity::Common),
            Rarity::Common => None,
        }
    }

    /// Get tier from index (0-4).
    pub fn from_index(index: u8) -> Option<Rarity> {
        match index {
            0 => Some(Rarity::Common),
            1 => Some(Rarity::Uncommon),
            2 => Some(Rarity::Rare),
            3 => Some(Rarity::Epic),
            4 => Some(Rarity::Legendary),
            _ => None,
        }
    }
}

// =============================================================================
// ELEMENT
// =============================================================================

/// Elemental affinity of a creature or ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Element {
    /// Fire-aspected
    Ember = 0,
    /// Water-aspected
    Tide = 1,
    /// Wind-aspected
    Gale = 2,
    /// Earth-aspected
    Stone = 3,
    /// Light-aspected
    Radiant = 4,
    /// Shadow-aspected
    Umbral = 5,
}

impl Element {
    /// Whether this element has advantage over `other`.
    ///
    /// Cycle: Ember > Gale > Stone > Tide > Ember.
    /// Radiant and Umbral have advantage over each other.
    pub fn beats(self, other: Element) -> bool {
        matches!(
            (self, other),
            (Element::Ember, Element::Gale)
                | (Element::Gale, Element::Stone)
                | (Element::Stone, Element::Tide)
                | (Element::Tide, Element::Ember)
                | (Element::Radiant, Element::Umbral)
                | (Element::Umbral, Element::Radiant)
        )
    }
}

/// Damage multiplier in percent for attacker vs defender element.
///
/// 150 with advantage, 50 at disadvantage, 100 otherwise.
pub fn element_multiplier_pct(attacker: Element, defender: Element) -> u32 {
    if attacker.beats(defender) {
        150
    } else if defender.beats(attacker) {
        50
    } else {
        100
    }
}

// =============================================================================
// STATS
// =============================================================================

/// A combat-relevant stat, addressable by buffs and catalysts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Stat {
    /// Maximum hit points
    MaxHp = 0,
    /// Offensive power
    Attack = 1,
    /// Damage mitigation
    Defense = 2,
    /// Turn-order priority
    Speed = 3,
}

impl Stat {
    /// All stats in fixed order (fusion iterates over these).
    pub const ALL: [Stat; 4] = [Stat::MaxHp, Stat::Attack, Stat::Defense, Stat::Speed];
}

/// Base stat block for a creature or template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    /// Maximum hit points
    pub max_hp: i32,
    /// Offensive power
    pub attack: i32,
    /// Damage mitigation
    pub defense: i32,
    /// Turn-order priority
    pub speed: i32,
}

impl StatBlock {
    /// Create a stat block.
    pub const fn new(max_hp: i32, attack: i32, defense: i32, speed: i32) -> Self {
        Self { max_hp, attack, defense, speed }
    }

    /// Read a stat by kind.
    pub fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::MaxHp => self.max_hp,
            Stat::Attack => self.attack,
            Stat::Defense => self.defense,
            Stat::Speed => self.speed,
        }
    }

    /// Write a stat by kind.
    pub fn set(&mut self, stat: Stat, value: i32) {
        match stat {
            Stat::MaxHp => self.max_hp = value,
            Stat::Attack => self.attack = value,
            Stat::Defense => self.defense = value,
            Stat::Speed => self.speed = value,
        }
    }

    /// Sum of all stats.
    pub fn total(&self) -> i32 {
        self.max_hp + self.attack + self.defense + self.speed
    }
}

// =============================================================================
// TEMPLATE
// =============================================================================

/// Base creature template. Read-only content data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreatureTemplate {
    /// Content key
    pub id: TemplateId,
    /// Display name
    pub name: String,
    /// Family tag (carried into fusion lineage)
    pub family: String,
    /// Elemental affinity
    pub element: Element,
    /// Rarity tier
    pub rarity: Rarity,
    /// Base stats
    pub stats: StatBlock,
    /// Passive ability ids
    pub passive_abilities: Vec<AbilityId>,
    /// Active ability ids
    pub active_abilities: Vec<AbilityId>,
    /// Ultimate ability id, if the template has one
    pub ultimate_ability: Option<AbilityId>,
}

// =============================================================================
// FUSION LINEAGE
// =============================================================================

/// Recorded ancestry of a fused creature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionLineage {
    /// max(parent generations) + 1; template creatures are generation 0
    pub generation: u32,
    /// Both parent creature ids
    pub parent_ids: [CreatureId; 2],
    /// Both parent family tags
    pub parent_families: [String; 2],
    /// Both catalyst ids
    pub catalyst_ids: [CatalystId; 2],
    /// Number of stats whose fusion bonus exceeded the notable threshold
    pub mutations: u32,
    /// When the fusion happened
    pub fused_at: DateTime<Utc>,
}

// =============================================================================
// BATTLE RECORD
// =============================================================================

/// Battle-derived aggregate statistics.
///
/// The only part of a creature that mutates after creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRecord {
    /// Battles won
    pub wins: u32,
    /// Battles lost
    pub losses: u32,
    /// Total damage dealt across all battles
    pub damage_dealt: u64,
}

// =============================================================================
// CREATURE
// =============================================================================

/// An owned creature instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Creature {
    /// Unique creature id
    pub id: CreatureId,

    /// Owning player
    pub owner: PlayerId,

    /// Template this creature was summoned from.
    /// None for fusion children.
    pub origin_template: Option<TemplateId>,

    /// Display name
    pub name: String,

    /// Family tag
    pub family: String,

    /// Elemental affinity
    pub element: Element,

    /// Rarity tier
    pub rarity: Rarity,

    /// Stat block
    pub stats: StatBlock,

    /// Current hit points (outside battle: equals max)
    pub current_hp: i32,

    /// Passive ability ids
    pub passive_abilities: Vec<AbilityId>,

    /// Active ability ids
    pub active_abilities: Vec<AbilityId>,

    /// Ultimate ability id
    pub ultimate_ability: Option<AbilityId>,

    /// Fusion ancestry, if this creature was fused
    pub lineage: Option<FusionLineage>,

    /// When the creature entered the collection
    pub collected_at: DateTime<Utc>,

    /// Battle-derived aggregates
    pub record: BattleRecord,
}

impl Creature {
    /// Instantiate a creature from a base template.
    pub fn from_template(
        id: CreatureId,
        owner: PlayerId,
        template: &CreatureTemplate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            origin_template: Some(template.id.clone()),
            name: template.name.clone(),
            family: template.family.clone(),
            element: template.element,
            rarity: template.rarity,
            stats: template.stats,
            current_hp: template.stats.max_hp,
            passive_abilities: template.passive_abilities.clone(),
            active_abilities: template.active_abilities.clone(),
            ultimate_ability: template.ultimate_ability.clone(),
            lineage: None,
            collected_at: now,
            record: BattleRecord::default(),
        }
    }

    /// Fusion generation. Template creatures are generation 0.
    pub fn generation(&self) -> u32 {
        self.lineage.as_ref().map(|l| l.generation).unwrap_or(0)
    }

    /// All ability ids this creature can reference in battle.
    pub fn all_ability_ids(&self) -> impl Iterator<Item = &AbilityId> {
        self.passive_abilities
            .iter()
            .chain(self.active_abilities.iter())
            .chain(self.ultimate_ability.iter())
    }
}

// =============================================================================
// TESTS
// =============================================================================
