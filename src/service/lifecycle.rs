//! Match Lifecycle & Reward Service
//!
//! Asynchronous PvP matches: creation, battle attachment, turn
//! advancement, lazy expiry, and terminal completion with rating
//! updates and reward computation.
//!
//! Status transitions are monotonic:
//! `Pending -> InProgress | Expired`, `InProgress -> Completed | Expired`.
//! `Completed` and `Expired` are terminal. Expiry is evaluated lazily
//! against the caller-supplied clock whenever a match is read or acted
//! upon; there is no timer.

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::rating::{self, Division, Outcome};
use crate::core::rng::derive_battle_seed;
use crate::game::ability::AbilityBook;
use crate::game::battle::{BattleConfig, BattleOutcome, BattleState, TeamSide};
use crate::game::creature::{Creature, CreatureId};
use crate::game::events::LogAction;
use crate::game::player::{PlayerId, Ranking, MAX_TEAM_SIZE};
use crate::game::turn::{TurnReport, resolve_turn};
use crate::service::store::EntityStore;

/// Unique match identifier.
pub type MatchId = [u8; 16];

// =============================================================================
// MATCH STATE
// =============================================================================

/// Lifecycle status of a PvP match. Monotonic, never reversed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Default)]
pub enum MatchStatus {
    /// Created, waiting for the battle to start
    #[default]
    Pending,
    /// Battle attached and running
    InProgress,
    /// Finished with a winner and rewards. Terminal.
    Completed,
    /// Passed its expiry before completing. Terminal.
    Expired,
}

impl MatchStatus {
    /// Whether no further transition is allowed.
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Expired)
    }
}

/// Reward payload computed at completion and attached to the match.
///
/// Loser's rating delta is negative for display; the stored rating is
/// clamped at zero and never negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRewards {
    /// Winner's primary-currency reward
    pub winner_coins: u32,
    /// Winner's secondary-currency bonus (scaled rating gain)
    pub winner_shards: u32,
    /// Loser's consolation primary-currency reward
    pub loser_coins: u32,
    /// Winner's rating change
    pub winner_rating_delta: i32,
    /// Loser's rating change (display only; may exceed the clamp)
    pub loser_rating_delta: i32,
    /// Winner's post-match division
    pub winner_division: Division,
    /// Loser's post-match division
    pub loser_division: Division,
}

/// An asynchronous PvP match between two players.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PvpMatch {
    /// Match identifier
    pub id: MatchId,

    /// Both participants
    pub participants: [PlayerId; 2],

    /// Team compositions, one per participant (1-4 creatures)
    pub teams: [Vec<CreatureId>; 2],

    /// Embedded battle, attached when the match starts
    pub battle: Option<BattleState>,

    /// Whether the match resolves asynchronously
    pub asynchronous: bool,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Expiry deadline for non-terminal matches
    pub expires_at: DateTime<Utc>,

    /// Lifecycle status
    pub status: MatchStatus,

    /// Winning participant, set at completion
    pub winner: Option<PlayerId>,

    /// Reward payload, set at completion
    pub rewards: Option<MatchRewards>,
}

impl PvpMatch {
    /// Create a pending match.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: MatchId,
        player_a: PlayerId,
        player_b: PlayerId,
        team_a: Vec<CreatureId>,
        team_b: Vec<CreatureId>,
        asynchronous: bool,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            participants: [player_a, player_b],
            teams: [team_a, team_b],
            battle: None,
            asynchronous,
            created_at,
            expires_at,
            status: MatchStatus::Pending,
            winner: None,
            rewards: None,
        }
    }

    /// Index of a participant (0 or 1), if present.
    pub fn participant_index(&self, player: &PlayerId) -> Option<usize> {
        self.participants.iter().position(|p| p == player)
    }

    /// Whether the match has passed its expiry without reaching a
    /// terminal status.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && now >= self.expires_at
    }
}

// =============================================================================
// CONFIG & ERRORS
// =============================================================================

/// Configuration for match lifecycle and rewards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Hours before a non-terminal match expires
    pub match_ttl_hours: i64,
    /// Base primary-currency reward for the winner
    pub base_win_coins: u32,
    /// Base consolation reward for the loser
    pub consolation_coins: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            match_ttl_hours: 24,
            base_win_coins: 100,
            consolation_coins: 25,
        }
    }
}

/// Match lifecycle failures.
///
/// Validation and state-conflict errors alike are reported
/// synchronously with no state mutated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// No such match.
    #[error("match not found")]
    MatchNotFound,

    /// No such player.
    #[error("player not found")]
    PlayerNotFound,

    /// A referenced creature does not exist or belongs to someone else.
    #[error("creature not owned by player")]
    NotOwned,

    /// Team size outside [1, 4].
    #[error("team size {size} out of range 1..=4")]
    TeamSizeOutOfRange {
        /// Offending size
        size: usize,
    },

    /// The match already completed; completion is terminal.
    #[error("match already completed")]
    AlreadyCompleted,

    /// The match expired before completion.
    #[error("match expired")]
    MatchExpired,

    /// The claimed winner is not one of the two participants.
    #[error("winner is not a participant")]
    WinnerNotParticipant,

    /// The match is not in a status that allows this transition.
    #[error("invalid match status for this operation")]
    InvalidStatus,

    /// A creature references ability content that does not exist.
    /// Configuration fault, surfaced before any turn resolves.
    #[error("missing ability reference: {0}")]
    MissingAbility(String),
}

// =============================================================================
// COMPLETION RESULT
// =============================================================================

/// Everything `complete_match` computed and persisted.
#[derive(Clone, Debug)]
pub struct MatchCompletion {
    /// The completed match (with winner and rewards attached)
    pub pvp_match: PvpMatch,
    /// Winner's updated ranking
    pub winner_ranking: Ranking,
    /// Loser's updated ranking
    pub loser_ranking: Ranking,
    /// Reward payload
    pub rewards: MatchRewards,
}

// =============================================================================
// SERVICE
// =============================================================================

/// Match lifecycle and reward service.
pub struct MatchService {
    config: LifecycleConfig,
    battle_config: BattleConfig,
}

impl MatchService {
    /// Create the service.
    pub fn new(config: LifecycleConfig, battle_config: BattleConfig) -> Self {
        Self { config, battle_config }
    }

    /// Lifecycle configuration.
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Create a pending asynchronous match.
    ///
    /// Validates team size (1-4) and that the challenger owns every
    /// listed creature. The opponent's team is their creatures in
    /// collection order, capped at the challenger's team size.
    pub fn create_async_match(
        &self,
        store: &mut impl EntityStore,
        player_id: PlayerId,
        opponent_id: PlayerId,
        team: Vec<CreatureId>,
        now: DateTime<Utc>,
    ) -> Result<PvpMatch, LifecycleError> {
        if team.is_empty() || team.len() > MAX_TEAM_SIZE {
            return Err(LifecycleError::TeamSizeOutOfRange { size: team.len() });
        }
        store.player(&player_id).ok_or(LifecycleError::PlayerNotFound)?;
        store.player(&opponent_id).ok_or(LifecycleError::PlayerNotFound)?;

        for creature_id in &team {
            let creature = store.creature(creature_id).ok_or(LifecycleError::NotOwned)?;
            if creature.owner != player_id {
                return Err(LifecycleError::NotOwned);
            }
        }

        let mut opponent_team: Vec<CreatureId> = store
            .creatures_by_owner(&opponent_id)
            .iter()
            .map(|c| c.id)
            .collect();
        opponent_team.truncate(team.len().clamp(1, MAX_TEAM_SIZE));
        if opponent_team.is_empty() {
            return Err(LifecycleError::NotOwned);
        }

        let id: MatchId = uuid::Uuid::new_v4().into_bytes();
        let expires_at = now + Duration::hours(self.config.match_ttl_hours);
        let pvp_match = PvpMatch::new(
            id,
            player_id,
            opponent_id,
            team,
            opponent_team,
            true,
            now,
            expires_at,
        );

        info!(
            match_id = %hex::encode(id),
            player = %player_id.to_uuid_string(),
            opponent = %opponent_id.to_uuid_string(),
            "async match created"
        );

        store.upsert_match(pvp_match.clone());
        Ok(pvp_match)
    }

    /// Attach a seeded battle and move `Pending -> InProgress`.
    ///
    /// The battle seed derives from the match id and the sorted
    /// participant ids, so neither player can bias it.
    pub fn start_match(
        &self,
        store: &mut impl EntityStore,
        book: &AbilityBook,
        match_id: &MatchId,
        now: DateTime<Utc>,
    ) -> Result<PvpMatch, LifecycleError> {
        let mut pvp_match = self.load_checked(store, match_id, now)?;
        if pvp_match.status != MatchStatus::Pending {
            return Err(LifecycleError::InvalidStatus);
        }

        let team_a = self.load_team(store, &pvp_match.teams[0])?;
        let team_b = self.load_team(store, &pvp_match.teams[1])?;

        // Broken content is a startup-class fault; surface it before
        // any turn resolves
        let all_ids: Vec<_> = team_a
            .iter()
            .chain(team_b.iter())
            .flat_map(|c| c.all_ability_ids().cloned())
            .collect();
        book.validate_refs(all_ids.iter())
            .map_err(|e| match e {
                crate::game::ability::AbilityBookError::MissingAbility(id) => {
                    LifecycleError::MissingAbility(id)
                }
            })?;

        let mut participant_bytes = [*pvp_match.participants[0].as_bytes(),
            *pvp_match.participants[1].as_bytes()];
        participant_bytes.sort();
        let seed = derive_battle_seed(&pvp_match.id, &participant_bytes);

        pvp_match.battle = Some(BattleState::new(
            pvp_match.id,
            seed,
            &team_a,
            &team_b,
            Vec::new(),
            &self.battle_config,
        ));
        pvp_match.status = MatchStatus::InProgress;

        debug!(match_id = %hex::encode(pvp_match.id), seed, "battle attached");

        store.upsert_match(pvp_match.clone());
        Ok(pvp_match)
    }

    /// Advance the embedded battle by one turn and persist the match.
    ///
    /// When the battle finishes, each creature's battle record is
    /// updated (wins/losses and damage dealt from the combat log).
    pub fn resolve_battle_turn(
        &self,
        store: &mut impl EntityStore,
        book: &AbilityBook,
        match_id: &MatchId,
        now: DateTime<Utc>,
    ) -> Result<TurnReport, LifecycleError> {
        let mut pvp_match = self.load_checked(store, match_id, now)?;
        if pvp_match.status != MatchStatus::InProgress {
            return Err(LifecycleError::InvalidStatus);
        }
        let battle = pvp_match.battle.as_mut().ok_or(LifecycleError::InvalidStatus)?;
        let already_complete = battle.is_complete();

        let report = resolve_turn(battle, book, &self.battle_config);

        // Record creature aggregates only on the completing turn, not on
        // repeat calls against an already-finished battle
        if report.battle_complete && !already_complete {
            if let (Some(outcome), Some(battle)) = (report.outcome, pvp_match.battle.as_ref()) {
                self.record_battle_stats(store, battle, outcome);
            }
        }

        store.upsert_match(pvp_match);
        Ok(report)
    }

    /// Complete a match: validate, compute rating deltas and rewards,
    /// persist both rankings, then mark the match terminal.
    pub fn complete_match(
        &self,
        store: &mut impl EntityStore,
        match_id: &MatchId,
        winner_id: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<MatchCompletion, LifecycleError> {
        let mut pvp_match = store.match_by_id(match_id).ok_or(LifecycleError::MatchNotFound)?;

        // State-conflict checks: terminal statuses stay terminal
        match pvp_match.status {
            MatchStatus::Completed => return Err(LifecycleError::AlreadyCompleted),
            MatchStatus::Expired => return Err(LifecycleError::MatchExpired),
            MatchStatus::Pending | MatchStatus::InProgress => {}
        }
        if pvp_match.is_expired(now) {
            pvp_match.status = MatchStatus::Expired;
            store.upsert_match(pvp_match);
            return Err(LifecycleError::MatchExpired);
        }

        let winner_index = pvp_match
            .participant_index(&winner_id)
            .ok_or(LifecycleError::WinnerNotParticipant)?;
        let loser_id = pvp_match.participants[1 - winner_index];

        let mut winner_ranking = store
            .ranking(&winner_id)
            .unwrap_or_else(|| Ranking::new(winner_id, now));
        let mut loser_ranking = store
            .ranking(&loser_id)
            .unwrap_or_else(|| Ranking::new(loser_id, now));

        // Rating deltas are symmetric up to K-factor differences
        let winner_delta = rating::rating_delta(
            winner_ranking.rating,
            loser_ranking.rating,
            Outcome::Win,
            winner_ranking.games_played(),
        );
        let loser_delta = rating::rating_delta(
            loser_ranking.rating,
            winner_ranking.rating,
            Outcome::Loss,
            loser_ranking.games_played(),
        );

        let winner_rating = rating::apply_delta(winner_ranking.rating, winner_delta);
        let loser_rating = rating::apply_delta(loser_ranking.rating, loser_delta);

        winner_ranking.apply_result(Outcome::Win, winner_rating, now);
        loser_ranking.apply_result(Outcome::Loss, loser_rating, now);

        let rewards = MatchRewards {
            winner_coins: self.config.base_win_coins
                * winner_ranking.division.reward_multiplier_pct()
                / 100,
            winner_shards: winner_delta.unsigned_abs()
                * winner_ranking.division.reward_multiplier_pct()
                / 100,
            loser_coins: self.config.consolation_coins
                * loser_ranking.division.reward_multiplier_pct()
                / 100,
            winner_rating_delta: winner_delta,
            loser_rating_delta: loser_delta,
            winner_division: winner_ranking.division,
            loser_division: loser_ranking.division,
        };

        // Persistence order: rankings first, then the terminal match
        store.upsert_ranking(winner_ranking.clone());
        store.upsert_ranking(loser_ranking.clone());

        pvp_match.status = MatchStatus::Completed;
        pvp_match.winner = Some(winner_id);
        pvp_match.rewards = Some(rewards);
        store.upsert_match(pvp_match.clone());

        info!(
            match_id = %hex::encode(pvp_match.id),
            winner = %winner_id.to_uuid_string(),
            delta = winner_delta,
            "match completed"
        );

        Ok(MatchCompletion { pvp_match, winner_ranking, loser_ranking, rewards })
    }

    /// Load a match, applying lazy expiry against the supplied clock.
    fn load_checked(
        &self,
        store: &mut impl EntityStore,
        match_id: &MatchId,
        now: DateTime<Utc>,
    ) -> Result<PvpMatch, LifecycleError> {
        let mut pvp_match = store.match_by_id(match_id).ok_or(LifecycleError::MatchNotFound)?;
        if pvp_match.is_expired(now) {
            pvp_match.status = MatchStatus::Expired;
            store.upsert_match(pvp_match);
            return Err(LifecycleError::MatchExpired);
        }
        Ok(pvp_match)
    }

    /// Load and ownership-check one team's creatures.
    fn load_team(
        &self,
        store: &impl EntityStore,
        ids: &[CreatureId],
    ) -> Result<Vec<Creature>, LifecycleError> {
        ids.iter()
            .map(|id| store.creature(id).ok_or(LifecycleError::NotOwned))
            .collect()
    }

    /// Write battle-derived aggregates back onto the creatures.
    fn record_battle_stats(
        &self,
        store: &mut impl EntityStore,
        battle: &BattleState,
        outcome: BattleOutcome,
    ) {
        let mut damage_by_creature: std::collections::BTreeMap<CreatureId, u64> =
            std::collections::BTreeMap::new();
        for entry in &battle.log {
            if let LogAction::Ability { .. } = entry.action {
                let dealt: u64 = entry.outcomes.iter().map(|o| o.damage.max(0) as u64).sum();
                *damage_by_creature.entry(entry.actor).or_insert(0) += dealt;
            }
        }

        for side in [TeamSide::A, TeamSide::B] {
            let won = outcome.winner() == Some(side);
            for combatant in battle.team(side) {
                if let Some(mut creature) = store.creature(&combatant.creature_id) {
                    if won {
                        creature.record.wins += 1;
                    } else if outcome.winner().is_some() {
                        creature.record.losses += 1;
                    }
                    creature.record.damage_dealt +=
                        damage_by_creature.get(&combatant.creature_id).copied().unwrap_or(0);
                    store.upsert_creature(creature);
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
