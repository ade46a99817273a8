//! Battle State
//!
//! In-combat snapshots of two teams, the fixed turn order, active
//! statuses/modifiers/domain effects, and the append-only combat log.
//! Mutated turn-by-turn by `game::turn`, immutable once complete.

use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, compute_state_hash};
use crate::core::rng::DeterministicRng;
use crate::game::ability::{AbilityId, StatusKind};
use crate::game::creature::{Creature, CreatureId, Element, Stat, StatBlock};
use crate::game::events::CombatLogEntry;

/// Unique battle identifier.
pub type BattleId = [u8; 16];

// =============================================================================
// CONFIG
// =============================================================================

/// Configuration for battle resolution.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BattleConfig {
    /// Energy each combatant starts with
    pub starting_energy: i32,
    /// Energy cap
    pub max_energy: i32,
    /// Energy regained at the end of the combatant's own turn
    pub energy_regen: i32,
    /// Hit chance for damage effects, in percent
    pub base_hit_pct: u32,
    /// Critical chance for damage effects, in percent
    pub crit_pct: u32,
    /// Critical damage multiplier, in percent
    pub crit_multiplier_pct: u32,
    /// Hard ceiling on turns before the battle is called (safety net
    /// against stall compositions)
    pub max_turns: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            starting_energy: 50,
            max_energy: 100,
            energy_regen: 15,
            base_hit_pct: 95,
            crit_pct: 10,
            crit_multiplier_pct: 150,
            max_turns: 500,
        }
    }
}

// =============================================================================
// SIDES & PHASES
// =============================================================================

/// Which of the two teams a combatant fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TeamSide {
    /// First team
    A = 0,
    /// Second team
    B = 1,
}

impl TeamSide {
    /// The opposing side.
    pub fn opponent(self) -> TeamSide {
        match self {
            TeamSide::A => TeamSide::B,
            TeamSide::B => TeamSide::A,
        }
    }
}

/// Battle lifecycle. No reverse transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Default)]
pub enum BattlePhase {
    /// Created but not yet started
    #[default]
    NotStarted,
    /// Turns are being resolved
    InProgress,
    /// Finished; state is frozen
    Complete,
}

/// Final result of a battle.
///
/// `Draw` is only produced when both teams are eliminated in the same
/// resolution step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleOutcome {
    /// Team A won
    TeamA,
    /// Team B won
    TeamB,
    /// Both teams fell in the same step
    Draw,
}

impl BattleOutcome {
    /// Winning side, if any.
    pub fn winner(self) -> Option<TeamSide> {
        match self {
            BattleOutcome::TeamA => Some(TeamSide::A),
            BattleOutcome::TeamB => Some(TeamSide::B),
            BattleOutcome::Draw => None,
        }
    }
}

// =============================================================================
// STATUS / MODIFIER / DOMAIN STATE
// =============================================================================

/// A status condition active on a combatant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInstance {
    /// Condition kind
    pub status: StatusKind,
    /// Turns remaining (decrements at the end of the carrier's turn)
    pub turns_left: u32,
}

/// A stat buff/debuff active on a combatant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatModifier {
    /// Affected stat
    pub stat: Stat,
    /// Flat change (signed)
    pub amount: i32,
    /// Percent change (signed)
    pub percent: i32,
    /// Turns remaining
    pub turns_left: u32,
}

/// Battlefield-wide modifier kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainEffectKind {
    /// Damage dealt by abilities of this element is amplified
    ElementalAmplification {
        /// Amplified element
        element: Element,
        /// Extra damage in percent
        percent: u32,
    },

    /// Every living combatant heals at the start of each turn
    Regeneration {
        /// Flat HP restored per turn
        amount: i32,
    },
}

/// A battlefield-wide modifier active for part or all of a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEffect {
    /// What the domain does
    pub kind: DomainEffectKind,
    /// Turns remaining; `None` lasts the whole battle
    pub turns_left: Option<u32>,
}

// =============================================================================
// COMBATANT
// =============================================================================

/// In-combat snapshot of one creature.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Combatant {
    /// Source creature
    pub creature_id: CreatureId,

    /// Team this combatant fights for
    pub side: TeamSide,

    /// Input slot on its team (tie-break for turn order)
    pub slot: usize,

    /// Elemental affinity
    pub element: Element,

    /// Unmodified stats
    pub base_stats: StatBlock,

    /// Current hit points
    pub current_hp: i32,

    /// Current energy
    pub energy: i32,

    /// Remaining cooldown per ability (absent = ready)
    pub cooldowns: std::collections::BTreeMap<AbilityId, u32>,

    /// Active status conditions
    pub statuses: Vec<StatusInstance>,

    /// Active stat modifiers
    pub modifiers: Vec<StatModifier>,

    /// Active ability ids available as actions
    pub active_abilities: Vec<AbilityId>,

    /// Ultimate ability id, if any
    pub ultimate_ability: Option<AbilityId>,
}

impl Combatant {
    /// Snapshot a creature into battle.
    pub fn from_creature(creature: &Creature, side: TeamSide, slot: usize, config: &BattleConfig) -> Self {
        Self {
            creature_id: creature.id,
            side,
            slot,
            element: creature.element,
            base_stats: creature.stats,
            current_hp: creature.stats.max_hp,
            energy: config.starting_energy,
            cooldowns: std::collections::BTreeMap::new(),
            statuses: Vec::new(),
            modifiers: Vec::new(),
            active_abilities: creature.active_abilities.clone(),
            ultimate_ability: creature.ultimate_ability.clone(),
        }
    }

    /// Whether this combatant is still fighting.
    #[inline]
    pub fn alive(&self) -> bool {
        self.current_hp > 0
    }

    /// Effective value of a stat after active modifiers.
    ///
    /// Flat changes apply before percent changes; results floor at 1
    /// so a debuff can never zero out a stat.
    pub fn effective_stat(&self, stat: Stat) -> i32 {
        let mut flat = 0i32;
        let mut percent = 0i32;
        for modifier in &self.modifiers {
            if modifier.stat == stat {
                flat += modifier.amount;
                percent += modifier.percent;
            }
        }
        let base = self.base_stats.get(stat) + flat;
        (base * (100 + percent).max(0) / 100).max(1)
    }

    /// Whether a status of this kind is active.
    pub fn has_status(&self, status: StatusKind) -> bool {
        self.statuses.iter().any(|s| s.status == status && s.turns_left > 0)
    }

    /// Add a status, refreshing the duration if already present.
    pub fn add_status(&mut self, status: StatusKind, turns: u32) {
        for instance in &mut self.statuses {
            if instance.status == status {
                instance.turns_left = instance.turns_left.max(turns);
                return;
            }
        }
        self.statuses.push(StatusInstance { status, turns_left: turns });
    }

    /// Apply damage; returns the HP actually removed.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        let dealt = amount.max(0).min(self.current_hp);
        self.current_hp -= dealt;
        dealt
    }

    /// Apply healing; returns the HP actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let max_hp = self.effective_stat(Stat::MaxHp);
        let healed = amount.max(0).min((max_hp - self.current_hp).max(0));
        self.current_hp += healed;
        healed
    }

    /// Whether the ability is off cooldown and affordable.
    pub fn can_use(&self, ability_id: &str, energy_cost: i32) -> bool {
        let on_cooldown = self.cooldowns.get(ability_id).is_some_and(|t| *t > 0);
        !on_cooldown && self.energy >= energy_cost
    }

    /// Tick down ability cooldowns. Runs at the start of this
    /// combatant's own turn.
    pub fn tick_cooldowns(&mut self) {
        for turns in self.cooldowns.values_mut() {
            *turns = turns.saturating_sub(1);
        }
        self.cooldowns.retain(|_, turns| *turns > 0);
    }

    /// Tick down statuses and stat modifiers. Runs at the end of this
    /// combatant's own turn, after status HP ticks have resolved.
    pub fn decay_statuses_and_modifiers(&mut self) {
        for status in &mut self.statuses {
            status.turns_left = status.turns_left.saturating_sub(1);
        }
        self.statuses.retain(|s| s.turns_left > 0);

        for modifier in &mut self.modifiers {
            modifier.turns_left = modifier.turns_left.saturating_sub(1);
        }
        self.modifiers.retain(|m| m.turns_left > 0);
    }
}

// =============================================================================
// TURN ORDER
// =============================================================================

/// Position of a combatant in the battle (side + index in that team).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantRef {
    /// Team side
    pub side: TeamSide,
    /// Index within the team vector
    pub index: usize,
}

// =============================================================================
// BATTLE STATE
// =============================================================================

/// Complete state of one battle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BattleState {
    /// Battle identifier
    pub id: BattleId,

    /// RNG seed (for verification/replay)
    pub rng_seed: u64,

    /// Deterministic RNG state
    #[serde(skip)]
    pub rng: DeterministicRng,

    /// Team A combatants, input order preserved
    pub team_a: Vec<Combatant>,

    /// Team B combatants, input order preserved
    pub team_b: Vec<Combatant>,

    /// Fixed turn order, computed once at creation
    pub order: Vec<CombatantRef>,

    /// Cursor into `order` for the next turn
    pub next_in_order: usize,

    /// Turns resolved so far
    pub turn: u32,

    /// Lifecycle phase
    pub phase: BattlePhase,

    /// Active battlefield-wide effects
    pub domain_effects: Vec<DomainEffect>,

    /// Append-only combat log
    pub log: Vec<CombatLogEntry>,

    /// Final outcome, set when `phase` becomes `Complete`
    pub outcome: Option<BattleOutcome>,
}

impl BattleState {
    /// Create a battle from two teams of creatures.
    ///
    /// Turn order is fixed here: all combatants sorted by speed
    /// descending, ties broken by stable input order (side A first,
    /// then slot).
    pub fn new(
        id: BattleId,
        rng_seed: u64,
        team_a: &[Creature],
        team_b: &[Creature],
        domain_effects: Vec<DomainEffect>,
        config: &BattleConfig,
    ) -> Self {
        let team_a: Vec<Combatant> = team_a
            .iter()
            .enumerate()
            .map(|(slot, c)| Combatant::from_creature(c, TeamSide::A, slot, config))
            .collect();
        let team_b: Vec<Combatant> = team_b
            .iter()
            .enumerate()
            .map(|(slot, c)| Combatant::from_creature(c, TeamSide::B, slot, config))
            .collect();

        // Stable sort keeps input order for equal speeds.
        let mut order: Vec<(i32, CombatantRef)> = team_a
            .iter()
            .enumerate()
            .map(|(index, c)| (c.base_stats.speed, CombatantRef { side: TeamSide::A, index }))
            .chain(team_b.iter().enumerate().map(|(index, c)| {
                (c.base_stats.speed, CombatantRef { side: TeamSide::B, index })
            }))
            .collect();
        order.sort_by_key(|(speed, _)| std::cmp::Reverse(*speed));

        Self {
            id,
            rng_seed,
            rng: DeterministicRng::new(rng_seed),
            team_a,
            team_b,
            order: order.into_iter().map(|(_, r)| r).collect(),
            next_in_order: 0,
            turn: 0,
            phase: BattlePhase::NotStarted,
            domain_effects,
            log: Vec::new(),
            outcome: None,
        }
    }

    /// Rebuild the RNG after deserialization (serde skips it).
    ///
    /// Replays the seed; callers resuming mid-battle should restore
    /// the checkpointed state via `rng.set_state`.
    pub fn reseed(&mut self) {
        self.rng = DeterministicRng::new(self.rng_seed);
    }

    /// Get a combatant by reference.
    pub fn combatant(&self, r: CombatantRef) -> &Combatant {
        match r.side {
            TeamSide::A => &self.team_a[r.index],
            TeamSide::B => &self.team_b[r.index],
        }
    }

    /// Get a combatant mutably by reference.
    pub fn combatant_mut(&mut self, r: CombatantRef) -> &mut Combatant {
        match r.side {
            TeamSide::A => &mut self.team_a[r.index],
            TeamSide::B => &mut self.team_b[r.index],
        }
    }

    /// All combatants on a side.
    pub fn team(&self, side: TeamSide) -> &[Combatant] {
        match side {
            TeamSide::A => &self.team_a,
            TeamSide::B => &self.team_b,
        }
    }

    /// Number of living combatants on a side.
    pub fn living_count(&self, side: TeamSide) -> usize {
        self.team(side).iter().filter(|c| c.alive()).count()
    }

    /// References to living enemies of a side, in input order.
    pub fn living_enemies(&self, side: TeamSide) -> Vec<CombatantRef> {
        let enemy = side.opponent();
        self.team(enemy)
            .iter()
            .enumerate()
            .filter(|(_, c)| c.alive())
            .map(|(index, _)| CombatantRef { side: enemy, index })
            .collect()
    }

    /// References to living allies of a side (including the side itself).
    pub fn living_allies(&self, side: TeamSide) -> Vec<CombatantRef> {
        self.team(side)
            .iter()
            .enumerate()
            .filter(|(_, c)| c.alive())
            .map(|(index, _)| CombatantRef { side, index })
            .collect()
    }

    /// Whether the battle is finished.
    pub fn is_complete(&self) -> bool {
        matches!(self.phase, BattlePhase::Complete)
    }

    /// Append a log entry.
    pub fn push_log(&mut self, entry: CombatLogEntry) {
        self.log.push(entry);
    }

    /// Compute hash of current state for replay verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.turn, self.rng_seed, |hasher| {
            for combatant in self.team_a.iter().chain(self.team_b.iter()) {
                hasher.update_uuid(combatant.creature_id.as_bytes());
                hasher.update_i32(combatant.current_hp);
                hasher.update_i32(combatant.energy);
                hasher.update_u32(combatant.statuses.len() as u32);
                for status in &combatant.statuses {
                    hasher.update_u8(status.status as u8);
                    hasher.update_u32(status.turns_left);
                }
                hasher.update_u32(combatant.modifiers.len() as u32);
                for modifier in &combatant.modifiers {
                    hasher.update_u8(modifier.stat as u8);
                    hasher.update_i32(modifier.amount);
                    hasher.update_i32(modifier.percent);
                    hasher.update_u32(modifier.turns_left);
                }
            }
            hasher.update_u32(self.log.len() as u32);
            hasher.update_bool(self.is_complete());
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
