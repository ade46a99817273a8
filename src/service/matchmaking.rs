//! Matchmaking Service
//!
//! Opponent discovery over the ranking pool: an expanding rating
//! window, an active-match exclusion filter, and rating-proximity
//! weighted sampling. "No candidate yet" drives window expansion
//! internally; only an entirely empty pool is an error.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::core::rating::win_probability_pct;
use crate::core::rng::DeterministicRng;
use crate::game::player::{PlayerId, Ranking};
use crate::service::store::EntityStore;

/// Configuration for opponent discovery.
#[derive(Clone, Debug)]
pub struct MatchmakingConfig {
    /// Starting rating window (plus/minus)
    pub initial_window: i32,
    /// Window growth per expansion step
    pub window_step: i32,
    /// Largest window before falling back to the whole pool
    pub max_window: i32,
    /// Scale of the proximity weight `exp(-|diff| / scale)`
    pub weight_scale: f64,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            initial_window: 200,
            window_step: 200,
            max_window: 1000,
            weight_scale: 200.0,
        }
    }
}

/// A discovered opponent.
#[derive(Clone, Debug)]
pub struct OpponentMatch {
    /// Chosen opponent
    pub opponent_id: PlayerId,
    /// Opponent's ranking snapshot
    pub opponent_ranking: Ranking,
    /// Requester's estimated win probability, in whole percent
    pub win_probability_pct: u8,
}

/// Matchmaking failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchmakingError {
    /// No other ranked player exists. Terminal for this request;
    /// the service never retries on its own.
    #[error("ranking pool is empty")]
    EmptyPool,
}

/// Matchmaking service.
pub struct MatchmakingService {
    config: MatchmakingConfig,
}

impl MatchmakingService {
    /// Create the service.
    pub fn new(config: MatchmakingConfig) -> Self {
        Self { config }
    }

    /// Find an opponent for a player.
    ///
    /// Initializes the requester's ranking if absent. Candidates are
    /// searched in an expanding window (±initial, growing by the step
    /// up to ±max, then the whole pool), excluding the requester and
    /// anyone with a live `Pending`/`InProgress` match. Among eligible
    /// candidates, closer ratings are favored but not guaranteed via
    /// `exp(-|diff| / scale)` weighting.
    pub fn find_opponent(
        &self,
        store: &mut impl EntityStore,
        player_id: PlayerId,
        rng: &mut DeterministicRng,
        now: DateTime<Utc>,
    ) -> Result<OpponentMatch, MatchmakingError> {
        let requester = match store.ranking(&player_id) {
            Some(ranking) => ranking,
            None => {
                let ranking = Ranking::new(player_id, now);
                store.upsert_ranking(ranking.clone());
                ranking
            }
        };

        // Eligibility filter over the whole pool, applied once
        let pool: Vec<Ranking> = store
            .rankings()
            .into_iter()
            .filter(|r| r.player_id != player_id)
            .filter(|r| {
                match store.active_match_for(&r.player_id) {
                    // A match already past its expiry is not blocking
                    Some(m) => m.is_expired(now),
                    None => true,
                }
            })
            .collect();

        if store.rankings().len() <= 1 {
            return Err(MatchmakingError::EmptyPool);
        }

        let mut window = self.config.initial_window;
        let candidates = loop {
            let in_window: Vec<&Ranking> = pool
                .iter()
                .filter(|r| (r.rating - requester.rating).abs() <= window)
                .collect();
            if !in_window.is_empty() {
                debug!(window, count = in_window.len(), "candidates found");
                break in_window;
            }
            if window >= self.config.max_window {
                // Whole-pool fallback
                break pool.iter().collect();
            }
            window += self.config.window_step;
        };

        if candidates.is_empty() {
            return Err(MatchmakingError::EmptyPool);
        }

        // Closer ratings are favored, not guaranteed
        let weights: Vec<f64> = candidates
            .iter()
            .map(|r| {
                let diff = (r.rating - requester.rating).abs() as f64;
                (-diff / self.config.weight_scale).exp()
            })
            .collect();
        let index = rng.choose_weighted(&weights).unwrap_or(0);
        let opponent = candidates[index].clone();

        Ok(OpponentMatch {
            opponent_id: opponent.player_id,
            win_probability_pct: win_probability_pct(requester.rating, opponent.rating),
            opponent_ranking: opponent,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
