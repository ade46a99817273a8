//! Turn Resolution
//!
//! The core battle loop. One call to [`resolve_turn`] advances exactly
//! one acting combatant: domain pulse, status skip check, AI action
//! selection, effect application in declared order, end-of-turn status
//! ticks, and termination detection.
//!
//! Resolution is 100% deterministic: the only randomness comes from the
//! battle's seeded RNG, iteration follows the fixed turn order, and no
//! wall-clock or ambient state is consulted.

use crate::game::ability::{Ability, AbilityBook, EffectSpec, StatusKind};
use crate::game::battle::{
    BattleConfig, BattleOutcome, BattlePhase, BattleState, CombatantRef, DomainEffectKind,
    StatModifier, TeamSide,
};
use crate::game::creature::{Stat, element_multiplier_pct};
use crate::game::events::{CombatLogEntry, ModifierNote, SkipReason, TargetOutcome};

/// Result of resolving one turn.
#[derive(Debug, Default)]
pub struct TurnReport {
    /// Turn number that resolved
    pub turn: u32,
    /// Log entries appended this turn
    pub entries: Vec<CombatLogEntry>,
    /// Whether the battle finished this turn
    pub battle_complete: bool,
    /// Final outcome, if the battle finished
    pub outcome: Option<BattleOutcome>,
}

/// Resolve one turn of the battle.
///
/// Starting a `NotStarted` battle transitions it to `InProgress`
/// first; calling on a `Complete` battle is a no-op that reports the
/// existing outcome.
pub fn resolve_turn(
    state: &mut BattleState,
    book: &AbilityBook,
    config: &BattleConfig,
) -> TurnReport {
    let mut report = TurnReport::default();

    match state.phase {
        BattlePhase::NotStarted => {
            state.phase = BattlePhase::InProgress;
        }
        BattlePhase::InProgress => {}
        BattlePhase::Complete => {
            report.battle_complete = true;
            report.outcome = state.outcome;
            return report;
        }
    }

    let Some(actor_ref) = advance_to_next_actor(state) else {
        // Nobody left standing on either side
        check_termination(state, &mut report);
        return report;
    };

    state.turn += 1;
    report.turn = state.turn;
    let log_start = state.log.len();
    let actor_id = state.combatant(actor_ref).creature_id;

    // 1. Domain effects pulse on every matching combatant, independent
    //    of whose turn it is
    if let Some(entry) = apply_domain_pulse(state, actor_id) {
        state.push_log(entry);
    }

    // 2. Cooldowns recover at the start of the combatant's own turn
    state.combatant_mut(actor_ref).tick_cooldowns();

    // 3. Act, unless a status forces a skip
    let skip = skip_reason(state, actor_ref);
    match skip {
        Some(reason) => {
            state.push_log(CombatLogEntry::skip(state.turn, actor_id, reason));
        }
        None => match select_action(state, actor_ref, book, config) {
            Some((ability, target_ref)) => {
                let outcomes = apply_ability(state, actor_ref, &ability, target_ref, config);
                state.push_log(CombatLogEntry::ability(
                    state.turn,
                    actor_id,
                    ability.id.clone(),
                    outcomes,
                ));
            }
            None => {
                state.push_log(CombatLogEntry::skip(
                    state.turn,
                    actor_id,
                    SkipReason::NoUsableAbility,
                ));
            }
        },
    }

    // An action can end the battle outright
    if check_termination(state, &mut report) {
        report.entries = state.log[log_start..].to_vec();
        return report;
    }

    // 4. End of turn: actor's statuses tick and decay, energy recovers
    if let Some(entry) = tick_actor_statuses(state, actor_ref) {
        state.push_log(entry);
    }
    {
        let actor = state.combatant_mut(actor_ref);
        actor.decay_statuses_and_modifiers();
        if actor.alive() {
            actor.energy = (actor.energy + config.energy_regen).min(config.max_energy);
        }
    }

    // 5. Domain effect durations run down once per turn
    for effect in &mut state.domain_effects {
        if let Some(turns) = &mut effect.turns_left {
            *turns = turns.saturating_sub(1);
        }
    }
    state.domain_effects.retain(|e| e.turns_left.map_or(true, |t| t > 0));

    // 6. Termination again: a status tick can finish a team off
    if !check_termination(state, &mut report) && state.turn >= config.max_turns {
        call_stalled_battle(state, &mut report);
    }

    report.entries = state.log[log_start..].to_vec();
    report
}

/// Run a battle to completion. Returns the final outcome.
pub fn run_battle(
    state: &mut BattleState,
    book: &AbilityBook,
    config: &BattleConfig,
) -> BattleOutcome {
    loop {
        let report = resolve_turn(state, book, config);
        if report.battle_complete {
            return report.outcome.unwrap_or(BattleOutcome::Draw);
        }
    }
}

// =============================================================================
// ACTOR SELECTION
// =============================================================================

/// Move the order cursor to the next living combatant and return it.
fn advance_to_next_actor(state: &mut BattleState) -> Option<CombatantRef> {
    let len = state.order.len();
    for step in 0..len {
        let pos = (state.next_in_order + step) % len;
        let r = state.order[pos];
        if state.combatant(r).alive() {
            state.next_in_order = (pos + 1) % len;
            return Some(r);
        }
    }
    None
}

/// Status-forced skip, if any.
fn skip_reason(state: &BattleState, actor_ref: CombatantRef) -> Option<SkipReason> {
    let actor = state.combatant(actor_ref);
    if actor.has_status(StatusKind::Stun) {
        Some(SkipReason::Stunned)
    } else if actor.has_status(StatusKind::Freeze) {
        Some(SkipReason::Frozen)
    } else {
        None
    }
}

// =============================================================================
// AI ACTION SELECTION
// =============================================================================

/// Pick an ability and target for the acting combatant.
///
/// Threat assessment: the primary target is the living enemy with the
/// lowest remaining HP; among usable abilities the one maximizing
/// expected damage against that target wins. If no damaging ability is
/// usable, fall back to the first usable support ability, aimed at the
/// lowest-HP living ally. Returns `None` when nothing is usable.
fn select_action(
    state: &BattleState,
    actor_ref: CombatantRef,
    book: &AbilityBook,
    config: &BattleConfig,
) -> Option<(Ability, CombatantRef)> {
    let actor = state.combatant(actor_ref);

    let enemy_target = lowest_hp(state, &state.living_enemies(actor.side))?;

    let usable: Vec<&Ability> = actor
        .active_abilities
        .iter()
        .chain(actor.ultimate_ability.iter())
        .filter_map(|id| book.get(id))
        .filter(|a| actor.can_use(&a.id, a.energy_cost))
        .collect();

    // Best damaging option against the weakest enemy
    let mut best: Option<(&Ability, i64)> = None;
    for &ability in usable.iter().filter(|a| a.deals_damage()) {
        let score = expected_damage(state, actor_ref, ability, enemy_target, config);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((ability, score));
        }
    }
    if let Some((ability, _)) = best {
        return Some((ability.clone(), enemy_target));
    }

    // Support fallback: first usable non-damaging ability on the
    // weakest ally
    if let Some(&ability) = usable.first() {
        let ally_target =
            lowest_hp(state, &state.living_allies(actor.side)).unwrap_or(actor_ref);
        return Some((ability.clone(), ally_target));
    }

    None
}

/// Combatant with the lowest current HP; ties resolve to input order.
fn lowest_hp(state: &BattleState, refs: &[CombatantRef]) -> Option<CombatantRef> {
    refs.iter()
        .copied()
        .min_by_key(|r| state.combatant(*r).current_hp)
}

/// Expected damage of an ability against a target, scaled by elemental
/// multiplier, domain amplification, hit chance, and crit expectation.
fn expected_damage(
    state: &BattleState,
    actor_ref: CombatantRef,
    ability: &Ability,
    target_ref: CombatantRef,
    config: &BattleConfig,
) -> i64 {
    let actor = state.combatant(actor_ref);
    let target = state.combatant(target_ref);
    let attack = actor.effective_stat(Stat::Attack) as i64;
    let defense = target.effective_stat(Stat::Defense) as i64;
    let elem = element_multiplier_pct(ability.element, target.element) as i64;
    let amp = 100 + domain_amp_pct(state, ability) as i64;
    let crit_expectation =
        100 + (config.crit_pct * (config.crit_multiplier_pct - 100) / 100) as i64;
    let hit = config.base_hit_pct as i64;

    ability
        .effects
        .iter()
        .map(|effect| match effect {
            EffectSpec::Damage { power } => {
                let base = (*power as i64 + attack - defense).max(1);
                base * elem * amp * crit_expectation * hit / 100_000_000
            }
            _ => 0,
        })
        .sum()
}

/// Extra damage percent from elemental amplification domains.
fn domain_amp_pct(state: &BattleState, ability: &Ability) -> u32 {
    state
        .domain_effects
        .iter()
        .map(|effect| match effect.kind {
            DomainEffectKind::ElementalAmplification { element, percent }
                if element == ability.element =>
            {
                percent
            }
            _ => 0,
        })
        .sum()
}

// =============================================================================
// EFFECT APPLICATION
// =============================================================================

/// Apply an ability's effects in declared order.
///
/// Offensive effects land on `target_ref` when it is an enemy (or the
/// lowest-HP enemy otherwise); heals and beneficial statuses land on
/// `target_ref` when allied; buffs land on the actor; lifesteal heals
/// the actor by a fraction of the damage dealt by this action.
fn apply_ability(
    state: &mut BattleState,
    actor_ref: CombatantRef,
    ability: &Ability,
    target_ref: CombatantRef,
    config: &BattleConfig,
) -> Vec<TargetOutcome> {
    let actor_side = state.combatant(actor_ref).side;

    // Pay costs up front
    {
        let actor = state.combatant_mut(actor_ref);
        actor.energy -= ability.energy_cost;
        if ability.cooldown > 0 {
            actor.cooldowns.insert(ability.id.clone(), ability.cooldown);
        }
    }

    let enemy_ref = if target_ref.side != actor_side {
        target_ref
    } else {
        lowest_hp(state, &state.living_enemies(actor_side)).unwrap_or(target_ref)
    };
    let ally_ref = if target_ref.side == actor_side { target_ref } else { actor_ref };

    let mut outcomes: Vec<TargetOutcome> = Vec::new();
    let mut damage_dealt = 0i32;

    for effect in &ability.effects {
        match effect {
            EffectSpec::Damage { power } => {
                let target_id = state.combatant(enemy_ref).creature_id;
                if !state.rng.next_bool_pct(config.base_hit_pct) {
                    outcome_for(&mut outcomes, target_id).missed = true;
                    continue;
                }

                let attack = state.combatant(actor_ref).effective_stat(Stat::Attack);
                let target = state.combatant(enemy_ref);
                let defense = target.effective_stat(Stat::Defense);
                let elem = element_multiplier_pct(ability.element, target.element);
                let amp = domain_amp_pct(state, ability);

                let mut damage = (*power + attack - defense).max(1);
                damage = damage * elem as i32 / 100;
                damage = damage * (100 + amp as i32) / 100;
                let critical = state.rng.next_bool_pct(config.crit_pct);
                if critical {
                    damage = damage * config.crit_multiplier_pct as i32 / 100;
                }
                damage = damage.max(1);

                let dealt = state.combatant_mut(enemy_ref).apply_damage(damage);
                damage_dealt += dealt;

                let outcome = outcome_for(&mut outcomes, target_id);
                outcome.damage += dealt;
                outcome.critical |= critical;
            }

            EffectSpec::Heal { amount } => {
                let healed = state.combatant_mut(ally_ref).heal(*amount);
                let target_id = state.combatant(ally_ref).creature_id;
                outcome_for(&mut outcomes, target_id).healing += healed;
            }

            EffectSpec::Status { status, chance_pct, turns } => {
                let recipient = if status.is_beneficial() { ally_ref } else { enemy_ref };
                if state.rng.next_bool_pct(*chance_pct) {
                    let combatant = state.combatant_mut(recipient);
                    if combatant.alive() {
                        combatant.add_status(*status, *turns);
                        let target_id = combatant.creature_id;
                        outcome_for(&mut outcomes, target_id).status_applied = Some(*status);
                    }
                }
            }

            EffectSpec::Buff { stat, amount, percent, turns } => {
                let combatant = state.combatant_mut(actor_ref);
                combatant.modifiers.push(StatModifier {
                    stat: *stat,
                    amount: *amount,
                    percent: *percent,
                    turns_left: *turns,
                });
                let target_id = combatant.creature_id;
                outcome_for(&mut outcomes, target_id).modifier_applied =
                    Some(ModifierNote { stat: *stat, amount: *amount, percent: *percent });
            }

            EffectSpec::Debuff { stat, amount, percent, turns } => {
                let combatant = state.combatant_mut(enemy_ref);
                if combatant.alive() {
                    combatant.modifiers.push(StatModifier {
                        stat: *stat,
                        amount: -amount,
                        percent: -percent,
                        turns_left: *turns,
                    });
                    let target_id = combatant.creature_id;
                    outcome_for(&mut outcomes, target_id).modifier_applied =
                        Some(ModifierNote { stat: *stat, amount: -amount, percent: -percent });
                }
            }

            EffectSpec::Lifesteal { percent } => {
                let amount = damage_dealt * *percent as i32 / 100;
                if amount > 0 {
                    let healed = state.combatant_mut(actor_ref).heal(amount);
                    let actor_id = state.combatant(actor_ref).creature_id;
                    outcome_for(&mut outcomes, actor_id).healing += healed;
                }
            }
        }
    }

    outcomes
}

/// Find or create the outcome slot for a target.
fn outcome_for(
    outcomes: &mut Vec<TargetOutcome>,
    target: crate::game::creature::CreatureId,
) -> &mut TargetOutcome {
    if let Some(pos) = outcomes.iter().position(|o| o.target == target) {
        return &mut outcomes[pos];
    }
    outcomes.push(TargetOutcome::new(target));
    outcomes.last_mut().unwrap()
}

// =============================================================================
// DOMAIN & STATUS TICKS
// =============================================================================

/// Pulse regeneration-type domain effects on every living combatant.
fn apply_domain_pulse(
    state: &mut BattleState,
    actor_id: crate::game::creature::CreatureId,
) -> Option<CombatLogEntry> {
    let regen: i32 = state
        .domain_effects
        .iter()
        .map(|effect| match effect.kind {
            DomainEffectKind::Regeneration { amount } => amount,
            _ => 0,
        })
        .sum();
    if regen <= 0 {
        return None;
    }

    let mut outcomes = Vec::new();
    for side in [TeamSide::A, TeamSide::B] {
        for r in state.living_allies(side) {
            let healed = state.combatant_mut(r).heal(regen);
            if healed > 0 {
                let target_id = state.combatant(r).creature_id;
                outcome_for(&mut outcomes, target_id).healing += healed;
            }
        }
    }

    if outcomes.is_empty() {
        None
    } else {
        Some(CombatLogEntry::domain_pulse(state.turn, actor_id, outcomes))
    }
}

/// Apply end-of-turn status HP ticks to the actor.
fn tick_actor_statuses(state: &mut BattleState, actor_ref: CombatantRef) -> Option<CombatLogEntry> {
    let (actor_id, max_hp, statuses): (_, i32, Vec<StatusKind>) = {
        let actor = state.combatant(actor_ref);
        if !actor.alive() {
            return None;
        }
        (
            actor.creature_id,
            actor.effective_stat(Stat::MaxHp),
            actor.statuses.iter().map(|s| s.status).collect(),
        )
    };

    let mut outcome = TargetOutcome::new(actor_id);
    for status in statuses {
        let pct = status.tick_hp_pct();
        if pct < 0 {
            let damage = (max_hp * -pct / 100).max(1);
            outcome.damage += state.combatant_mut(actor_ref).apply_damage(damage);
        } else if pct > 0 {
            outcome.healing += state.combatant_mut(actor_ref).heal(max_hp * pct / 100);
        }
    }

    if outcome.damage == 0 && outcome.healing == 0 {
        None
    } else {
        Some(CombatLogEntry::status_tick(state.turn, actor_id, vec![outcome]))
    }
}

// =============================================================================
// TERMINATION
// =============================================================================

/// Complete the battle if a team has been wiped out.
///
/// Both teams at zero in the same resolution step is a draw; neither
/// side takes precedence.
fn check_termination(state: &mut BattleState, report: &mut TurnReport) -> bool {
    let a_alive = state.living_count(TeamSide::A) > 0;
    let b_alive = state.living_count(TeamSide::B) > 0;

    let outcome = match (a_alive, b_alive) {
        (true, true) => return false,
        (false, false) => BattleOutcome::Draw,
        (true, false) => BattleOutcome::TeamA,
        (false, true) => BattleOutcome::TeamB,
    };

    state.phase = BattlePhase::Complete;
    state.outcome = Some(outcome);
    report.battle_complete = true;
    report.outcome = Some(outcome);
    true
}

/// Call a battle that hit the turn ceiling: the team with more total
/// HP remaining wins, equal totals draw.
fn call_stalled_battle(state: &mut BattleState, report: &mut TurnReport) {
    let total = |side: TeamSide| -> i64 {
        state.team(side).iter().map(|c| c.current_hp.max(0) as i64).sum()
    };
    let outcome = match total(TeamSide::A).cmp(&total(TeamSide::B)) {
        std::cmp::Ordering::Greater => BattleOutcome::TeamA,
        std::cmp::Ordering::Less => BattleOutcome::TeamB,
        std::cmp::Ordering::Equal => BattleOutcome::Draw,
    };

    state.phase = BattlePhase::Complete;
    state.outcome = Some(outcome);
    report.battle_complete = true;
    report.outcome = Some(outcome);
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ability::{Ability, AbilityKind};
    use crate::game::battle::DomainEffect;
    use crate::game::creature::{Creature, CreatureId, Element, Rarity, StatBlock};
    use crate::game::events::LogAction;
    use crate::game::player::PlayerId;
    use chrono::Utc;

    fn creature(id: u8, element: Element, stats: StatBlock, actives: &[&str]) -> Creature {
        Creature {
            id: CreatureId::new([id; 16]),
            owner: PlayerId::new([1; 16]),
            origin_template: None,
            name: format!("C{id}"),
            family: "test".to_string(),
            element,
            rarity: Rarity::Common,
            stats,
            current_hp: stats.max_hp,
            passive_abilities: vec![],
            active_abilities: actives.iter().map(|s| s.to_string()).collect(),
            ultimate_ability: None,
            lineage: None,
            collected_at: Utc::now(),
            record: Default::default(),
        }
    }

    fn strike() -> Ability {
        Ability {
            id: "strike".to_string(),
            name: "Strike".to_string(),
            kind: AbilityKind::Active,
            energy_cost: 10,
            cooldown: 0,
            element: Element::Ember,
            effects: vec![EffectSpec::Damage { power: 25 }],
        }
    }

    fn mend() -> Ability {
        Ability {
            id: "mend".to_string(),
            name: "Mend".to_string(),
            kind: AbilityKind::Active,
            energy_cost: 10,
            cooldown: 0,
            element: Element::Radiant,
            effects: vec![EffectSpec::Heal { amount: 30 }],
        }
    }

    fn book() -> AbilityBook {
        AbilityBook::from_abilities([strike(), mend()])
    }

    fn sure_hit_config() -> BattleConfig {
        BattleConfig {
            base_hit_pct: 100,
            crit_pct: 0,
            ..Default::default()
        }
    }

    fn two_v_one() -> BattleState {
        let config = BattleConfig::default();
        let a = vec![
            creature(1, Element::Ember, StatBlock::new(100, 30, 10, 40), &["strike"]),
            creature(2, Element::Tide, StatBlock::new(100, 30, 10, 20), &["strike"]),
        ];
        let b = vec![creature(3, Element::Stone, StatBlock::new(120, 25, 15, 30), &["strike"])];
        BattleState::new([0; 16], 42, &a, &b, vec![], &config)
    }

    #[test]
    fn test_first_turn_starts_battle() {
        let mut battle = two_v_one();
        assert_eq!(battle.phase, BattlePhase::NotStarted);

        let report = resolve_turn(&mut battle, &book(), &sure_hit_config());
        assert_eq!(battle.phase, BattlePhase::InProgress);
        assert_eq!(report.turn, 1);
        assert_eq!(battle.log.len(), 1);
    }

    #[test]
    fn test_fastest_acts_first_and_targets_lowest_hp() {
        let config = sure_hit_config();
        let a = vec![creature(1, Element::Ember, StatBlock::new(100, 30, 10, 99), &["strike"])];
        let b = vec![
            creature(2, Element::Gale, StatBlock::new(100, 20, 10, 10), &["strike"]),
            creature(3, Element::Gale, StatBlock::new(100, 20, 10, 5), &["strike"]),
        ];
        let mut battle = BattleState::new([0; 16], 7, &a, &b, vec![], &config);

        // Wound the second enemy so it becomes the threat target
        battle.combatant_mut(CombatantRef { side: TeamSide::B, index: 1 }).current_hp = 40;

        let report = resolve_turn(&mut battle, &book(), &config);
        let entry = &report.entries[0];
        assert_eq!(entry.actor, CreatureId::new([1; 16]));
        assert_eq!(entry.outcomes[0].target, CreatureId::new([3; 16]));
        assert!(entry.outcomes[0].damage > 0);
    }

    #[test]
    fn test_elemental_advantage_raises_damage() {
        let config = sure_hit_config();
        // Ember attacker vs Gale defender: 150%
        let a = vec![creature(1, Element::Ember, StatBlock::new(100, 30, 10, 50), &["strike"])];
        let b = vec![creature(2, Element::Gale, StatBlock::new(300, 10, 10, 10), &["strike"])];
        let mut battle = BattleState::new([0; 16], 3, &a, &b, vec![], &config);

        let report = resolve_turn(&mut battle, &book(), &config);
        // (25 + 30 - 10) * 1.5 = 67
        assert_eq!(report.entries[0].outcomes[0].damage, 67);
    }

    #[test]
    fn test_stunned_actor_skips() {
        let config = sure_hit_config();
        let mut battle = two_v_one();
        battle
            .combatant_mut(CombatantRef { side: TeamSide::A, index: 0 })
            .add_status(StatusKind::Stun, 1);

        let report = resolve_turn(&mut battle, &book(), &config);
        assert!(matches!(
            report.entries[0].action,
            LogAction::Skip { reason: SkipReason::Stunned }
        ));

        // Stun expires at end of the actor's own turn
        assert!(
            !battle.combatant(CombatantRef { side: TeamSide::A, index: 0 })
                .has_status(StatusKind::Stun)
        );
    }

    #[test]
    fn test_no_energy_skips() {
        let config = sure_hit_config();
        let mut battle = two_v_one();
        for r in [
            CombatantRef { side: TeamSide::A, index: 0 },
            CombatantRef { side: TeamSide::A, index: 1 },
            CombatantRef { side: TeamSide::B, index: 0 },
        ] {
            battle.combatant_mut(r).energy = 0;
        }

        let report = resolve_turn(&mut battle, &book(), &config);
        assert!(matches!(
            report.entries[0].action,
            LogAction::Skip { reason: SkipReason::NoUsableAbility }
        ));

        // Energy regen at end of turn makes the next own turn usable
        let actor = battle.combatant(CombatantRef { side: TeamSide::A, index: 0 });
        assert_eq!(actor.energy, config.energy_regen);
    }

    #[test]
    fn test_support_fallback_heals_weakest_ally() {
        let config = sure_hit_config();
        let a = vec![
            creature(1, Element::Radiant, StatBlock::new(100, 30, 10, 50), &["mend"]),
            creature(2, Element::Radiant, StatBlock::new(100, 30, 10, 5), &["mend"]),
        ];
        let b = vec![creature(3, Element::Umbral, StatBlock::new(100, 1, 10, 1), &["mend"])];
        let mut battle = BattleState::new([0; 16], 11, &a, &b, vec![], &config);

        battle.combatant_mut(CombatantRef { side: TeamSide::A, index: 1 }).current_hp = 20;

        let report = resolve_turn(&mut battle, &book(), &config);
        let entry = &report.entries[0];
        assert!(matches!(entry.action, LogAction::Ability { ref ability } if ability == "mend"));
        assert_eq!(entry.outcomes[0].target, CreatureId::new([2; 16]));
        assert_eq!(entry.outcomes[0].healing, 30);
    }

    #[test]
    fn test_status_tick_damages_at_end_of_turn() {
        let config = sure_hit_config();
        let mut battle = two_v_one();
        battle
            .combatant_mut(CombatantRef { side: TeamSide::A, index: 0 })
            .add_status(StatusKind::Burn, 2);

        let report = resolve_turn(&mut battle, &book(), &config);
        let tick = report
            .entries
            .iter()
            .find(|e| matches!(e.action, LogAction::StatusTick))
            .expect("burn should tick");
        // 5% of 100 max HP
        assert_eq!(tick.outcomes[0].damage, 5);
    }

    #[test]
    fn test_domain_regeneration_pulses_all() {
        let config = sure_hit_config();
        let a = vec![creature(1, Element::Ember, StatBlock::new(100, 30, 10, 40), &["strike"])];
        let b = vec![creature(2, Element::Tide, StatBlock::new(100, 30, 10, 20), &["strike"])];
        let domains = vec![DomainEffect {
            kind: DomainEffectKind::Regeneration { amount: 10 },
            turns_left: None,
        }];
        let mut battle = BattleState::new([0; 16], 9, &a, &b, domains, &config);

        battle.combatant_mut(CombatantRef { side: TeamSide::A, index: 0 }).current_hp = 50;
        battle.combatant_mut(CombatantRef { side: TeamSide::B, index: 0 }).current_hp = 50;

        let report = resolve_turn(&mut battle, &book(), &config);
        let pulse = report
            .entries
            .iter()
            .find(|e| matches!(e.action, LogAction::DomainPulse))
            .expect("regeneration should pulse");
        // Both wounded combatants healed, regardless of whose turn it is
        assert_eq!(pulse.outcomes.len(), 2);
        assert!(pulse.outcomes.iter().all(|o| o.healing == 10));
    }

    #[test]
    fn test_elemental_amplification_domain() {
        let config = sure_hit_config();
        let a = vec![creature(1, Element::Ember, StatBlock::new(100, 30, 10, 50), &["strike"])];
        let b = vec![creature(2, Element::Stone, StatBlock::new(300, 10, 10, 10), &["strike"])];
        let domains = vec![DomainEffect {
            kind: DomainEffectKind::ElementalAmplification { element: Element::Ember, percent: 50 },
            turns_left: None,
        }];
        let mut battle = BattleState::new([0; 16], 3, &a, &b, domains, &config);

        let report = resolve_turn(&mut battle, &book(), &config);
        // (25 + 30 - 10) * 1.0 elem * 1.5 amp = 67
        assert_eq!(report.entries[0].outcomes[0].damage, 67);
    }

    #[test]
    fn test_battle_runs_to_completion() {
        let config = sure_hit_config();
        let mut battle = two_v_one();
        let outcome = run_battle(&mut battle, &book(), &config);

        assert!(battle.is_complete());
        assert_eq!(battle.outcome, Some(outcome));
        // 2v1 with equal statlines: team A grinds team B down
        assert_eq!(outcome, BattleOutcome::TeamA);
        // Completed battles refuse further mutation
        let log_len = battle.log.len();
        let report = resolve_turn(&mut battle, &book(), &config);
        assert!(report.battle_complete);
        assert_eq!(battle.log.len(), log_len);
    }

    #[test]
    fn test_replay_determinism() {
        let config = BattleConfig::default();
        let a = vec![
            creature(1, Element::Ember, StatBlock::new(100, 30, 10, 40), &["strike"]),
            creature(2, Element::Tide, StatBlock::new(90, 28, 12, 25), &["strike"]),
        ];
        let b = vec![
            creature(3, Element::Gale, StatBlock::new(110, 26, 14, 35), &["strike"]),
            creature(4, Element::Stone, StatBlock::new(105, 32, 8, 15), &["strike"]),
        ];

        let mut battle1 = BattleState::new([5; 16], 987, &a, &b, vec![], &config);
        let mut battle2 = BattleState::new([5; 16], 987, &a, &b, vec![], &config);

        let outcome1 = run_battle(&mut battle1, &book(), &config);
        let outcome2 = run_battle(&mut battle2, &book(), &config);

        assert_eq!(outcome1, outcome2);
        assert_eq!(battle1.turn, battle2.turn);
        assert_eq!(battle1.log, battle2.log);
        assert_eq!(battle1.compute_hash(), battle2.compute_hash());
    }

    #[test]
    fn test_draw_when_both_teams_at_zero() {
        let config = sure_hit_config();
        let a = vec![creature(1, Element::Ember, StatBlock::new(100, 30, 10, 40), &["strike"])];
        let b = vec![creature(2, Element::Tide, StatBlock::new(100, 30, 10, 20), &["strike"])];
        let mut battle = BattleState::new([0; 16], 1, &a, &b, vec![], &config);
        battle.phase = BattlePhase::InProgress;

        // Force the simultaneous-wipe shape directly: both teams at zero
        // in the same resolution step must resolve as a draw
        battle.combatant_mut(CombatantRef { side: TeamSide::A, index: 0 }).current_hp = 0;
        battle.combatant_mut(CombatantRef { side: TeamSide::B, index: 0 }).current_hp = 0;

        let mut report = TurnReport::default();
        assert!(check_termination(&mut battle, &mut report));
        assert_eq!(report.outcome, Some(BattleOutcome::Draw));
        assert_eq!(battle.outcome, Some(BattleOutcome::Draw));
    }

    #[test]
    fn test_stall_ceiling_calls_battle() {
        // Nobody can afford an ability and regen is zero: pure stall
        let mut config = sure_hit_config();
        config.max_turns = 10;
        config.energy_regen = 0;

        let a = vec![creature(1, Element::Ember, StatBlock::new(100, 30, 10, 40), &["strike"])];
        let b = vec![creature(2, Element::Tide, StatBlock::new(100, 30, 10, 20), &["strike"])];
        let mut battle = BattleState::new([0; 16], 1, &a, &b, vec![], &config);
        battle.combatant_mut(CombatantRef { side: TeamSide::A, index: 0 }).energy = 0;
        battle.combatant_mut(CombatantRef { side: TeamSide::B, index: 0 }).energy = 0;
        battle.combatant_mut(CombatantRef { side: TeamSide::B, index: 0 }).current_hp = 60;

        let outcome = run_battle(&mut battle, &book(), &config);
        assert_eq!(outcome, BattleOutcome::TeamA);
        assert_eq!(battle.turn, 10);
    }

    #[test]
    fn test_lifesteal_heals_attacker() {
        let config = sure_hit_config();
        let drain = Ability {
            id: "drain".to_string(),
            name: "Drain".to_string(),
            kind: AbilityKind::Active,
            energy_cost: 10,
            cooldown: 0,
            element: Element::Umbral,
            effects: vec![
                EffectSpec::Damage { power: 20 },
                EffectSpec::Lifesteal { percent: 50 },
            ],
        };
        let book = AbilityBook::from_abilities([drain]);

        let a = vec![creature(1, Element::Umbral, StatBlock::new(100, 30, 10, 50), &["drain"])];
        let b = vec![creature(2, Element::Stone, StatBlock::new(200, 10, 10, 10), &["drain"])];
        let mut battle = BattleState::new([0; 16], 4, &a, &b, vec![], &config);
        battle.combatant_mut(CombatantRef { side: TeamSide::A, index: 0 }).current_hp = 50;

        let report = resolve_turn(&mut battle, &book, &config);
        let entry = &report.entries[0];

        // (20 + 30 - 10) = 40 damage, 20 healed back
        let dmg = entry.outcomes.iter().find(|o| o.target == CreatureId::new([2; 16])).unwrap();
        let heal = entry.outcomes.iter().find(|o| o.target == CreatureId::new([1; 16])).unwrap();
        assert_eq!(dmg.damage, 40);
        assert_eq!(heal.healing, 20);
    }

    #[test]
    fn test_cooldown_blocks_reuse() {
        let config = sure_hit_config();
        let slow_strike = Ability {
            cooldown: 2,
            ..strike()
        };
        let book = AbilityBook::from_abilities([slow_strike]);

        let a = vec![creature(1, Element::Ember, StatBlock::new(500, 30, 10, 50), &["strike"])];
        let b = vec![creature(2, Element::Tide, StatBlock::new(500, 1, 200, 10), &["strike"])];
        let mut battle = BattleState::new([0; 16], 6, &a, &b, vec![], &config);

        // Turn 1: A uses strike
        let report = resolve_turn(&mut battle, &book, &config);
        assert!(matches!(report.entries[0].action, LogAction::Ability { .. }));

        // Turn 2 is B's; turn 3 is A's again and strike is still cooling
        resolve_turn(&mut battle, &book, &config);
        let report = resolve_turn(&mut battle, &book, &config);
        assert_eq!(report.entries[0].actor, CreatureId::new([1; 16]));
        assert!(matches!(
            report.entries[0].action,
            LogAction::Skip { reason: SkipReason::NoUsableAbility }
        ));
    }
}
