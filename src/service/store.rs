//! Entity Store Boundary
//!
//! The persistent store is an injected dependency: point lookups,
//! simple predicate scans, and a per-entity upsert. No multi-entity
//! transactions exist; services persist each mutated aggregate as a
//! separate write in a fixed order.
//!
//! `MemoryStore` is the BTreeMap-backed reference implementation used
//! by tests and the demo binary.

use std::collections::BTreeMap;

use crate::game::ability::{Ability, AbilityId};
use crate::game::creature::{Creature, CreatureId, CreatureTemplate, Rarity, TemplateId};
use crate::game::player::{Player, PlayerId, Ranking};
use crate::service::lifecycle::{MatchId, MatchStatus, PvpMatch};

/// Injected persistence boundary for all engine entities.
pub trait EntityStore {
    /// Point lookup of a player.
    fn player(&self, id: &PlayerId) -> Option<Player>;

    /// Upsert a player aggregate.
    fn upsert_player(&mut self, player: Player);

    /// Point lookup of a creature.
    fn creature(&self, id: &CreatureId) -> Option<Creature>;

    /// All creatures owned by a player.
    fn creatures_by_owner(&self, owner: &PlayerId) -> Vec<Creature>;

    /// Upsert a creature aggregate.
    fn upsert_creature(&mut self, creature: Creature);

    /// Point lookup of ability content.
    fn ability(&self, id: &AbilityId) -> Option<Ability>;

    /// All templates at a rarity tier.
    fn templates_by_rarity(&self, rarity: Rarity) -> Vec<CreatureTemplate>;

    /// Point lookup of a ranking.
    fn ranking(&self, id: &PlayerId) -> Option<Ranking>;

    /// All rankings (matchmaking candidate scan).
    fn rankings(&self) -> Vec<Ranking>;

    /// Upsert a ranking aggregate.
    fn upsert_ranking(&mut self, ranking: Ranking);

    /// Point lookup of a match.
    fn match_by_id(&self, id: &MatchId) -> Option<PvpMatch>;

    /// A `Pending`/`InProgress` match involving the player, if any.
    fn active_match_for(&self, player: &PlayerId) -> Option<PvpMatch>;

    /// Upsert a match aggregate.
    fn upsert_match(&mut self, pvp_match: PvpMatch);
}

/// In-memory store backed by BTreeMaps (deterministic iteration).
#[derive(Debug, Default)]
pub struct MemoryStore {
    players: BTreeMap<PlayerId, Player>,
    creatures: BTreeMap<CreatureId, Creature>,
    abilities: BTreeMap<AbilityId, Ability>,
    templates: BTreeMap<TemplateId, CreatureTemplate>,
    rankings: BTreeMap<PlayerId, Ranking>,
    matches: BTreeMap<MatchId, PvpMatch>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load ability content.
    pub fn insert_ability(&mut self, ability: Ability) {
        self.abilities.insert(ability.id.clone(), ability);
    }

    /// Load template content.
    pub fn insert_template(&mut self, template: CreatureTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    /// All loaded abilities (for building an `AbilityBook`).
    pub fn all_abilities(&self) -> Vec<Ability> {
        self.abilities.values().cloned().collect()
    }
}

impl EntityStore for MemoryStore {
    fn player(&self, id: &PlayerId) -> Option<Player> {
        self.players.get(id).cloned()
    }

    fn upsert_player(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    fn creature(&self, id: &CreatureId) -> Option<Creature> {
        self.creatures.get(id).cloned()
    }

    fn creatures_by_owner(&self, owner: &PlayerId) -> Vec<Creature> {
        self.creatures
            .values()
            .filter(|c| c.owner == *owner)
            .cloned()
            .collect()
    }

    fn upsert_creature(&mut self, creature: Creature) {
        self.creatures.insert(creature.id, creature);
    }

    fn ability(&self, id: &AbilityId) -> Option<Ability> {
        self.abilities.get(id).cloned()
    }

    fn templates_by_rarity(&self, rarity: Rarity) -> Vec<CreatureTemplate> {
        self.templates
            .values()
            .filter(|t| t.rarity == rarity)
            .cloned()
            .collect()
    }

    fn ranking(&self, id: &PlayerId) -> Option<Ranking> {
        self.rankings.get(id).cloned()
    }

    fn rankings(&self) -> Vec<Ranking> {
        self.rankings.values().cloned().collect()
    }

    fn upsert_ranking(&mut self, ranking: Ranking) {
        self.rankings.insert(ranking.player_id, ranking);
    }

    fn match_by_id(&self, id: &MatchId) -> Option<PvpMatch> {
        self.matches.get(id).cloned()
    }

    fn active_match_for(&self, player: &PlayerId) -> Option<PvpMatch> {
        self.matches
            .values()
            .find(|m| {
                m.participants.contains(player)
                    && matches!(m.status, MatchStatus::Pending | MatchStatus::InProgress)
            })
            .cloned()
    }

    fn upsert_match(&mut self, pvp_match: PvpMatch) {
        self.matches.insert(pvp_match.id, pvp_match);
    }
}

// =============================================================================
// TESTS
// =============================================================================
