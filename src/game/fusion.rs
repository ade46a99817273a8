//! Fusion Engine
//!
//! Blends two parent creatures into a child: floor-of-average stats
//! plus a bounded random bonus per stat, catalyst modifiers, and a
//! lineage record. Parents are not consumed here; the economy layer
//! decides consumption policy.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::game::ability::AbilityId;
use crate::game::creature::{
    CatalystId, Creature, CreatureId, Element, FusionLineage, Rarity, Stat, StatBlock,
};

/// Maximum active abilities a fused child inherits.
const MAX_INHERITED_ACTIVES: usize = 4;

/// Maximum passive abilities a fused child inherits.
const MAX_INHERITED_PASSIVES: usize = 2;

// =============================================================================
// CATALYSTS
// =============================================================================

/// Elemental bias a catalyst can apply to one stat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementBias {
    /// Bias applies only when the child ends up with this element
    pub element: Element,
    /// Stat whose bonus ceiling is raised
    pub stat: Stat,
    /// Extra bonus ceiling in percent of the stat average
    pub bonus_pct: u32,
}

/// A fusion catalyst. External configuration, not logic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalyst {
    /// Content key
    pub id: CatalystId,
    /// Display name
    pub name: String,
    /// Multiplier on the bonus ceiling, in percent (100 = neutral)
    pub bonus_multiplier_pct: u32,
    /// Optional elemental stat bias
    pub element_bias: Option<ElementBias>,
}

impl Catalyst {
    /// A neutral catalyst with no effect on the bonus range.
    pub fn neutral(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            bonus_multiplier_pct: 100,
            element_bias: None,
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Configuration for the fusion engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Max per-stat bonus as percent of the parent-stat average.
    pub bonus_fraction_pct: u32,

    /// A bonus above this percent of the stat average counts as a
    /// mutation in the lineage record.
    pub notable_bonus_pct: u32,

    /// Catalyst table, keyed by content id.
    pub catalysts: BTreeMap<CatalystId, Catalyst>,

    /// Essence consumed per parent, by the parent's tier.
    /// Charged by the economy layer, not by `fuse` itself.
    pub essence_cost: BTreeMap<Rarity, u32>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        let catalysts = [
            Catalyst::neutral("plain-ash"),
            Catalyst {
                id: "ember-core".to_string(),
                name: "Ember Core".to_string(),
                bonus_multiplier_pct: 120,
                element_bias: Some(ElementBias {
                    element: Element::Ember,
                    stat: Stat::Attack,
                    bonus_pct: 10,
                }),
            },
            Catalyst {
                id: "tide-pearl".to_string(),
                name: "Tide Pearl".to_string(),
                bonus_multiplier_pct: 120,
                element_bias: Some(ElementBias {
                    element: Element::Tide,
                    stat: Stat::Defense,
                    bonus_pct: 10,
                }),
            },
        ]
        .into_iter()
        .map(|c| (c.id.clone(), c))
        .collect();

        let essence_cost = [
            (Rarity::Common, 2),
            (Rarity::Uncommon, 4),
            (Rarity::Rare, 8),
            (Rarity::Epic, 16),
            (Rarity::Legendary, 32),
        ]
        .into_iter()
        .collect();

        Self {
            bonus_fraction_pct: 20,
            notable_bonus_pct: 15,
            catalysts,
            essence_cost,
        }
    }
}

impl FusionConfig {
    /// Look up a catalyst by id.
    pub fn catalyst(&self, id: &str) -> Option<&Catalyst> {
        self.catalysts.get(id)
    }

    /// Load the catalyst table from a JSON array.
    pub fn load_catalysts_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let catalysts: Vec<Catalyst> = serde_json::from_str(json)?;
        self.catalysts = catalysts.into_iter().map(|c| (c.id.clone(), c)).collect();
        Ok(())
    }

    /// Essence cost for a parent of the given tier.
    pub fn essence_cost_for(&self, tier: Rarity) -> u32 {
        self.essence_cost.get(&tier).copied().unwrap_or(0)
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Validation failures on a fusion request. No state is mutated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FusionError {
    /// Both parents are the same creature.
    #[error("cannot fuse a creature with itself")]
    SameCreature,

    /// Parents belong to different players.
    #[error("parents must share an owner")]
    MixedOwners,

    /// Catalyst id not present in the catalyst table.
    #[error("unknown catalyst: {0}")]
    UnknownCatalyst(CatalystId),
}

// =============================================================================
// FUSION
// =============================================================================

/// Blend two parents and two catalysts into a new child creature.
///
/// Per stat: `floor(avg(parent_a, parent_b))` plus a random bonus in
/// `[0, ceiling]`, where the ceiling is `bonus_fraction_pct` of the
/// average scaled by both catalyst multipliers, plus any matching
/// elemental bias. The child is a brand-new entity; parents are left
/// untouched.
pub fn fuse(
    child_id: CreatureId,
    parent_a: &Creature,
    parent_b: &Creature,
    catalyst_a: &Catalyst,
    catalyst_b: &Catalyst,
    rng: &mut DeterministicRng,
    config: &FusionConfig,
    now: DateTime<Utc>,
) -> Result<Creature, FusionError> {
    if parent_a.id == parent_b.id {
        return Err(FusionError::SameCreature);
    }
    if parent_a.owner != parent_b.owner {
        return Err(FusionError::MixedOwners);
    }

    // Child element: even pick between the parents' elements.
    let element = if rng.next_bool_pct(50) {
        parent_a.element
    } else {
        parent_b.element
    };

    let mut stats = StatBlock::new(0, 0, 0, 0);
    let mut mutations = 0u32;

    for stat in Stat::ALL {
        let a = parent_a.stats.get(stat);
        let b = parent_b.stats.get(stat);
        let avg = (a + b) / 2;

        // Bonus ceiling: fraction of the average, scaled by catalysts,
        // plus elemental bias when the child's element matches.
        let mut ceiling_pct = config.bonus_fraction_pct
            * catalyst_a.bonus_multiplier_pct
            * catalyst_b.bonus_multiplier_pct
            / 10_000;
        for catalyst in [catalyst_a, catalyst_b] {
            if let Some(bias) = &catalyst.element_bias {
                if bias.element == element && bias.stat == stat {
                    ceiling_pct += bias.bonus_pct;
                }
            }
        }

        let ceiling = avg * ceiling_pct as i32 / 100;
        let bonus = rng.next_int_range(0, ceiling.max(0));
        if bonus * 100 > avg * config.notable_bonus_pct as i32 {
            mutations += 1;
        }

        stats.set(stat, avg + bonus);
    }

    let lineage = FusionLineage {
        generation: parent_a.generation().max(parent_b.generation()) + 1,
        parent_ids: [parent_a.id, parent_b.id],
        parent_families: [parent_a.family.clone(), parent_b.family.clone()],
        catalyst_ids: [catalyst_a.id.clone(), catalyst_b.id.clone()],
        mutations,
        fused_at: now,
    };

    // Higher-rarity parent drives tier, ultimate, and naming.
    let (dominant, secondary) = if parent_b.rarity > parent_a.rarity {
        (parent_b, parent_a)
    } else {
        (parent_a, parent_b)
    };

    Ok(Creature {
        id: child_id,
        owner: parent_a.owner,
        origin_template: None,
        name: format!("{} x {}", parent_a.name, parent_b.name),
        family: parent_a.family.clone(),
        element,
        rarity: dominant.rarity,
        stats,
        current_hp: stats.max_hp,
        passive_abilities: merge_abilities(
            &dominant.passive_abilities,
            &secondary.passive_abilities,
            MAX_INHERITED_PASSIVES,
        ),
        active_abilities: merge_abilities(
            &dominant.active_abilities,
            &secondary.active_abilities,
            MAX_INHERITED_ACTIVES,
        ),
        ultimate_ability: dominant
            .ultimate_ability
            .clone()
            .or_else(|| secondary.ultimate_ability.clone()),
        lineage: Some(lineage),
        collected_at: now,
        record: Default::default(),
    })
}

/// Deduplicated merge of two ability lists, dominant parent first,
/// capped at `max`.
fn merge_abilities(first: &[AbilityId], second: &[AbilityId], max: usize) -> Vec<AbilityId> {
    let mut merged: Vec<AbilityId> = Vec::with_capacity(max);
    for id in first.iter().chain(second.iter()) {
        if !merged.contains(id) {
            merged.push(id.clone());
            if merged.len() == max {
                break;
            }
        }
    }
    merged
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::PlayerId;

    fn parent(id: u8, attack: i32, rarity: Rarity, element: Element) -> Creature {
        Creature {
            id: CreatureId::new([id; 16]),
            owner: PlayerId::new([1; 16]),
            origin_template: Some(format!("template-{id}")),
            name: format!("Parent{id}"),
            family: format!("family-{id}"),
            element,
            rarity,
            stats: StatBlock::new(100, attack, 30, 40),
            current_hp: 100,
            passive_abilities: vec![format!("passive-{id}")],
            active_abilities: vec![format!("active-{id}"), "shared".to_string()],
            ultimate_ability: Some(format!("ultimate-{id}")),
            lineage: None,
            collected_at: Utc::now(),
            record: Default::default(),
        }
    }

    fn neutral_pair() -> (Catalyst, Catalyst) {
        (Catalyst::neutral("a"), Catalyst::neutral("b"))
    }

    #[test]
    fn test_self_fusion_rejected() {
        let p = parent(1, 50, Rarity::Common, Element::Ember);
        let (ca, cb) = neutral_pair();
        let mut rng = DeterministicRng::new(1);
        let config = FusionConfig::default();

        let err = fuse(CreatureId::new([9; 16]), &p, &p, &ca, &cb, &mut rng, &config, Utc::now())
            .unwrap_err();
        assert_eq!(err, FusionError::SameCreature);
    }

    #[test]
    fn test_mixed_owner_rejected() {
        let pa = parent(1, 50, Rarity::Common, Element::Ember);
        let mut pb = parent(2, 50, Rarity::Common, Element::Tide);
        pb.owner = PlayerId::new([99; 16]);
        let (ca, cb) = neutral_pair();
        let mut rng = DeterministicRng::new(1);
        let config = FusionConfig::default();

        let err = fuse(CreatureId::new([9; 16]), &pa, &pb, &ca, &cb, &mut rng, &config, Utc::now())
            .unwrap_err();
        assert_eq!(err, FusionError::MixedOwners);
    }

    #[test]
    fn test_stat_bounds() {
        let pa = parent(1, 60, Rarity::Rare, Element::Ember);
        let pb = parent(2, 40, Rarity::Common, Element::Tide);
        let (ca, cb) = neutral_pair();
        let config = FusionConfig::default();

        for seed in 0..100u64 {
            let mut rng = DeterministicRng::new(seed);
            let child = fuse(
                CreatureId::new([9; 16]),
                &pa,
                &pb,
                &ca,
                &cb,
                &mut rng,
                &config,
                Utc::now(),
            )
            .unwrap();

            for stat in Stat::ALL {
                let avg = (pa.stats.get(stat) + pb.stats.get(stat)) / 2;
                let max = avg + avg * config.bonus_fraction_pct as i32 / 100;
                let value = child.stats.get(stat);
                assert!(value >= avg, "{stat:?} below floor(avg)");
                assert!(value <= max, "{stat:?} above avg + max bonus");
            }
        }
    }

    #[test]
    fn test_lineage_record() {
        let mut pa = parent(1, 60, Rarity::Rare, Element::Ember);
        pa.lineage = Some(FusionLineage {
            generation: 2,
            parent_ids: [CreatureId::new([7; 16]), CreatureId::new([8; 16])],
            parent_families: ["x".to_string(), "y".to_string()],
            catalyst_ids: ["a".to_string(), "b".to_string()],
            mutations: 0,
            fused_at: Utc::now(),
        });
        let pb = parent(2, 40, Rarity::Common, Element::Tide);
        let (ca, cb) = neutral_pair();
        let mut rng = DeterministicRng::new(3);
        let config = FusionConfig::default();

        let child = fuse(
            CreatureId::new([9; 16]),
            &pa,
            &pb,
            &ca,
            &cb,
            &mut rng,
            &config,
            Utc::now(),
        )
        .unwrap();

        let lineage = child.lineage.as_ref().unwrap();
        assert_eq!(lineage.generation, 3); // max(2, 0) + 1
        assert_eq!(lineage.parent_ids, [pa.id, pb.id]);
        assert_eq!(lineage.parent_families, [pa.family.clone(), pb.family.clone()]);
        assert_eq!(lineage.catalyst_ids, ["a".to_string(), "b".to_string()]);

        // Fusion children carry no origin template
        assert!(child.origin_template.is_none());
        assert_eq!(child.generation(), 3);
    }

    #[test]
    fn test_child_element_comes_from_a_parent() {
        let pa = parent(1, 60, Rarity::Rare, Element::Ember);
        let pb = parent(2, 40, Rarity::Common, Element::Tide);
        let (ca, cb) = neutral_pair();
        let config = FusionConfig::default();

        for seed in 0..20u64 {
            let mut rng = DeterministicRng::new(seed);
            let child = fuse(
                CreatureId::new([9; 16]),
                &pa,
                &pb,
                &ca,
                &cb,
                &mut rng,
                &config,
                Utc::now(),
            )
            .unwrap();
            assert!(child.element == Element::Ember || child.element == Element::Tide);
        }
    }

    #[test]
    fn test_rarity_follows_dominant_parent() {
        let pa = parent(1, 60, Rarity::Common, Element::Ember);
        let pb = parent(2, 40, Rarity::Epic, Element::Tide);
        let (ca, cb) = neutral_pair();
        let mut rng = DeterministicRng::new(5);
        let config = FusionConfig::default();

        let child = fuse(
            CreatureId::new([9; 16]),
            &pa,
            &pb,
            &ca,
            &cb,
            &mut rng,
            &config,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(child.rarity, Rarity::Epic);
        // Dominant parent's ultimate wins
        assert_eq!(child.ultimate_ability.as_deref(), Some("ultimate-2"));
    }

    #[test]
    fn test_ability_merge_dedups_and_caps() {
        let merged = merge_abilities(
            &["a".to_string(), "shared".to_string()],
            &["shared".to_string(), "b".to_string(), "c".to_string(), "d".to_string()],
            4,
        );
        assert_eq!(merged, vec!["a", "shared", "b", "c"]);
    }

    #[test]
    fn test_fusion_deterministic_for_seed() {
        let pa = parent(1, 60, Rarity::Rare, Element::Ember);
        let pb = parent(2, 40, Rarity::Common, Element::Tide);
        let (ca, cb) = neutral_pair();
        let config = FusionConfig::default();
        let now = Utc::now();

        let mut rng1 = DeterministicRng::new(77);
        let mut rng2 = DeterministicRng::new(77);
        let c1 =
            fuse(CreatureId::new([9; 16]), &pa, &pb, &ca, &cb, &mut rng1, &config, now).unwrap();
        let c2 =
            fuse(CreatureId::new([9; 16]), &pa, &pb, &ca, &cb, &mut rng2, &config, now).unwrap();

        assert_eq!(c1.stats, c2.stats);
        assert_eq!(c1.element, c2.element);
        assert_eq!(c1.lineage.unwrap().mutations, c2.lineage.unwrap().mutations);
    }
}
