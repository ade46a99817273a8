//! Collection Service
//!
//! Orchestrates summons and fusions against the entity store: balance
//! checks before any mutation, sequential batch rolls, duplicate
//! conversion to essence, and the fixed persistence order (economy
//! mutation before creature creation).

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::core::rng::DeterministicRng;
use crate::game::creature::{CatalystId, Creature, CreatureId, Rarity, TemplateId};
use crate::game::fusion::{self, FusionConfig, FusionError};
use crate::game::gacha::{self, GachaConfig, GachaConfigError, GachaError};
use crate::game::player::{EconomyError, PlayerId};
use crate::service::store::EntityStore;

/// What a single summon produced.
#[derive(Clone, Debug)]
pub enum SummonReward {
    /// A new creature joined the collection.
    NewCreature(Creature),

    /// The player already owned an un-fused copy of the template;
    /// the summon converted to essence instead.
    EssenceConverted {
        /// Template that would have duplicated
        template: TemplateId,
        /// Essence tier awarded
        tier: Rarity,
        /// Essence amount awarded
        amount: u32,
    },
}

/// Result of one summon roll.
#[derive(Clone, Debug)]
pub struct SummonResult {
    /// Rarity tier the roll produced
    pub rarity: Rarity,
    /// Pity counter after the roll
    pub pity_after: u32,
    /// What the player received
    pub reward: SummonReward,
}

/// Result of a fusion.
#[derive(Clone, Debug)]
pub struct FusionResult {
    /// The new child creature
    pub child: Creature,
    /// Essence spent per parent tier
    pub essence_spent: Vec<(Rarity, u32)>,
}

/// Collection operation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CollectionError {
    /// No such player.
    #[error("player not found")]
    PlayerNotFound,

    /// No such creature, or owned by someone else.
    #[error("creature not owned by player")]
    NotOwned,

    /// Catalyst id not in the catalyst table.
    #[error("unknown catalyst: {0}")]
    UnknownCatalyst(CatalystId),

    /// Economy validation failure (insufficient balance).
    #[error(transparent)]
    Economy(#[from] EconomyError),

    /// Summon resource exhaustion.
    #[error(transparent)]
    Gacha(#[from] GachaError),

    /// Fusion validation failure.
    #[error(transparent)]
    Fusion(#[from] FusionError),
}

/// Summon and fusion orchestration.
pub struct CollectionService {
    gacha: GachaConfig,
    fusion: FusionConfig,
}

impl CollectionService {
    /// Create the service, validating the drop table up front.
    ///
    /// A bad drop table is a startup fault, not a per-request error.
    pub fn new(gacha: GachaConfig, fusion: FusionConfig) -> Result<Self, GachaConfigError> {
        gacha.validate()?;
        Ok(Self { gacha, fusion })
    }

    /// Summon configuration.
    pub fn gacha_config(&self) -> &GachaConfig {
        &self.gacha
    }

    /// Fusion configuration.
    pub fn fusion_config(&self) -> &FusionConfig {
        &self.fusion
    }

    /// Roll one summon for a player.
    ///
    /// Debits the coin cost, rolls a rarity with the player's pity
    /// counter threaded through, picks a template (falling back a tier
    /// when empty), and either creates the creature or converts a
    /// duplicate to essence. The player aggregate is persisted before
    /// the creature.
    pub fn roll_gacha(
        &self,
        store: &mut impl EntityStore,
        player_id: PlayerId,
        rng: &mut DeterministicRng,
        now: DateTime<Utc>,
    ) -> Result<SummonResult, CollectionError> {
        let mut player = store.player(&player_id).ok_or(CollectionError::PlayerNotFound)?;

        // Cost is consumed before the roll; insufficient balance fails
        // with nothing mutated
        player.debit_coins(self.gacha.summon_cost)?;

        let (rarity, pity_after) = gacha::roll_rarity(player.pity, rng, &self.gacha);
        player.pity = pity_after;

        let template = gacha::select_template(rarity, |tier| store.templates_by_rarity(tier), rng)?;

        let owned_duplicate = store
            .creatures_by_owner(&player_id)
            .iter()
            .any(|c| c.origin_template.as_deref() == Some(template.id.as_str()));

        if owned_duplicate {
            // One un-fused copy per origin template: duplicates become
            // essence of the template's tier
            let amount = self.gacha.duplicate_essence_for(template.rarity);
            player.grant_essence(template.rarity, amount);
            store.upsert_player(player);

            debug!(
                player = %player_id.to_uuid_string(),
                template = %template.id,
                amount,
                "duplicate summon converted to essence"
            );

            return Ok(SummonResult {
                rarity,
                pity_after,
                reward: SummonReward::EssenceConverted {
                    template: template.id,
                    tier: template.rarity,
                    amount,
                },
            });
        }

        let creature_id = CreatureId(uuid::Uuid::new_v4().into_bytes());
        let creature = Creature::from_template(creature_id, player_id, &template, now);

        // Economy mutation persists before creature creation
        store.upsert_player(player);
        store.upsert_creature(creature.clone());

        info!(
            player = %player_id.to_uuid_string(),
            template = %template.id,
            ?rarity,
            "summon produced a creature"
        );

        Ok(SummonResult {
            rarity,
            pity_after,
            reward: SummonReward::NewCreature(creature),
        })
    }

    /// Roll a batch of summons, strictly one at a time.
    ///
    /// Each roll's pity outcome depends on the previous roll's mutated
    /// counter, so evaluation is sequential by construction. The full
    /// batch cost is validated up front; a batch never partially
    /// consumes.
    pub fn roll_gacha_batch(
        &self,
        store: &mut impl EntityStore,
        player_id: PlayerId,
        count: u32,
        rng: &mut DeterministicRng,
        now: DateTime<Utc>,
    ) -> Result<Vec<SummonResult>, CollectionError> {
        let player = store.player(&player_id).ok_or(CollectionError::PlayerNotFound)?;
        let total_cost = self.gacha.summon_cost.saturating_mul(count);
        if player.coins < total_cost {
            return Err(EconomyError::InsufficientCoins {
                needed: total_cost,
                available: player.coins,
            }
            .into());
        }

        let mut results = Vec::with_capacity(count as usize);
        for _ in 0..count {
            results.push(self.roll_gacha(store, player_id, rng, now)?);
        }
        Ok(results)
    }

    /// Fuse two owned creatures into a new one.
    ///
    /// Charges the per-parent essence cost (by each parent's tier),
    /// persists the player, then the child. Parents stay in the
    /// collection.
    pub fn fuse_creatures(
        &self,
        store: &mut impl EntityStore,
        player_id: PlayerId,
        parent_a_id: CreatureId,
        parent_b_id: CreatureId,
        catalyst_a_id: &str,
        catalyst_b_id: &str,
        rng: &mut DeterministicRng,
        now: DateTime<Utc>,
    ) -> Result<FusionResult, CollectionError> {
        let mut player = store.player(&player_id).ok_or(CollectionError::PlayerNotFound)?;

        let parent_a = store.creature(&parent_a_id).ok_or(CollectionError::NotOwned)?;
        let parent_b = store.creature(&parent_b_id).ok_or(CollectionError::NotOwned)?;
        if parent_a.owner != player_id || parent_b.owner != player_id {
            return Err(CollectionError::NotOwned);
        }

        let catalyst_a = self
            .fusion
            .catalyst(catalyst_a_id)
            .ok_or_else(|| CollectionError::UnknownCatalyst(catalyst_a_id.to_string()))?
            .clone();
        let catalyst_b = self
            .fusion
            .catalyst(catalyst_b_id)
            .ok_or_else(|| CollectionError::UnknownCatalyst(catalyst_b_id.to_string()))?
            .clone();

        // Validate both essence debits before mutating either
        let cost_a = self.fusion.essence_cost_for(parent_a.rarity);
        let cost_b = self.fusion.essence_cost_for(parent_b.rarity);
        let mut essence_spent = vec![(parent_a.rarity, cost_a)];
        if parent_b.rarity == parent_a.rarity {
            essence_spent = vec![(parent_a.rarity, cost_a + cost_b)];
        } else {
            essence_spent.push((parent_b.rarity, cost_b));
        }
        for (tier, amount) in &essence_spent {
            if player.essence_of(*tier) < *amount {
                return Err(EconomyError::InsufficientEssence {
                    tier: *tier,
                    needed: *amount,
                    available: player.essence_of(*tier),
                }
                .into());
            }
        }

        let child_id = CreatureId(uuid::Uuid::new_v4().into_bytes());
        let child = fusion::fuse(
            child_id,
            &parent_a,
            &parent_b,
            &catalyst_a,
            &catalyst_b,
            rng,
            &self.fusion,
            now,
        )?;

        for (tier, amount) in &essence_spent {
            player.spend_essence(*tier, *amount)?;
        }

        // Economy mutation persists before creature creation
        store.upsert_player(player);
        store.upsert_creature(child.clone());

        info!(
            player = %player_id.to_uuid_string(),
            child = %child.id.to_uuid_string(),
            generation = child.generation(),
            "fusion produced a creature"
        );

        Ok(FusionResult { child, essence_spent })
    }
}

// =============================================================================
// TESTS
// =============================================================================
