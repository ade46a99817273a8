//! Player and Ranking Aggregates
//!
//! Player economy state (essence, currencies, pity, teams) and the
//! ranked-ladder record. All balance mutators are checked so balances
//! can never go negative.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::core::rating::{Division, Outcome, STARTING_RATING};
use crate::game::creature::{CreatureId, Rarity};

/// Maximum creatures per team.
pub const MAX_TEAM_SIZE: usize = 4;

// =============================================================================
// PLAYER ID
// =============================================================================

/// Unique player identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
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
// ECONOMY ERRORS
// =============================================================================

/// Validation failures on player economy mutations.
///
/// Reported synchronously; no state is mutated on failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EconomyError {
    /// Not enough coins for the requested debit.
    #[error("insufficient coins: need {needed}, have {available}")]
    InsufficientCoins {
        /// Amount required
        needed: u32,
        /// Amount available
        available: u32,
    },

    /// Not enough essence of the given tier.
    #[error("insufficient {tier:?} essence: need {needed}, have {available}")]
    InsufficientEssence {
        /// Essence tier
        tier: Rarity,
        /// Amount required
        needed: u32,
        /// Amount available
        available: u32,
    },

    /// Team size outside [1, 4].
    #[error("team size {size} out of range 1..=4")]
    TeamSizeOutOfRange {
        /// Offending size
        size: usize,
    },
}

// =============================================================================
// PLAYER
// =============================================================================

/// Player economy aggregate.
///
/// Mutated by summoning/fusion (essence, pity, currency) and read by
/// the match services. Rating lives on [`Ranking`], not here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    /// Unique player id
    pub id: PlayerId,

    /// Display name
    pub name: String,

    /// Per-rarity essence balances
    pub essence: BTreeMap<Rarity, u32>,

    /// Primary currency
    pub coins: u32,

    /// Secondary currency
    pub shards: u32,

    /// Summon pity counter (consecutive non-top results)
    pub pity: u32,

    /// Named teams of creature ids (1-4 entries each)
    pub teams: BTreeMap<String, Vec<CreatureId>>,

    /// Completed-content markers
    pub completed_content: BTreeSet<String>,

    /// Account creation time
    pub created_at: DateTime<Utc>,
}

impl Player {
    /// Create a new player with empty balances.
    pub fn new(id: PlayerId, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            essence: BTreeMap::new(),
            coins: 0,
            shards: 0,
            pity: 0,
            teams: BTreeMap::new(),
            completed_content: BTreeSet::new(),
            created_at: now,
        }
    }

    /// Essence balance for a tier.
    pub fn essence_of(&self, tier: Rarity) -> u32 {
        self.essence.get(&tier).copied().unwrap_or(0)
    }

    /// Add essence of a tier.
    pub fn grant_essence(&mut self, tier: Rarity, amount: u32) {
        let balance = self.essence.entry(tier).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Spend essence of a tier. Fails without mutating if insufficient.
    pub fn spend_essence(&mut self, tier: Rarity, amount: u32) -> Result<(), EconomyError> {
        let available = self.essence_of(tier);
        if available < amount {
            return Err(EconomyError::InsufficientEssence {
                tier,
                needed: amount,
                available,
            });
        }
        self.essence.insert(tier, available - amount);
        Ok(())
    }

    /// Add coins.
    pub fn credit_coins(&mut self, amount: u32) {
        self.coins = self.coins.saturating_add(amount);
    }

    /// Spend coins. Fails without mutating if insufficient.
    pub fn debit_coins(&mut self, amount: u32) -> Result<(), EconomyError> {
        if self.coins < amount {
            return Err(EconomyError::InsufficientCoins {
                needed: amount,
                available: self.coins,
            });
        }
        self.coins -= amount;
        Ok(())
    }

    /// Add shards.
    pub fn credit_shards(&mut self, amount: u32) {
        self.shards = self.shards.saturating_add(amount);
    }

    /// Save a named team. Team size must be in [1, 4].
    pub fn save_team(
        &mut self,
        name: impl Into<String>,
        creatures: Vec<CreatureId>,
    ) -> Result<(), EconomyError> {
        if creatures.is_empty() || creatures.len() > MAX_TEAM_SIZE {
            return Err(EconomyError::TeamSizeOutOfRange { size: creatures.len() });
        }
        self.teams.insert(name.into(), creatures);
        Ok(())
    }

    /// Mark a piece of content completed.
    pub fn mark_content_complete(&mut self, key: impl Into<String>) {
        self.completed_content.insert(key.into());
    }
}

// =============================================================================
// RANKING
// =============================================================================

/// Ranked-ladder record for one player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranking {
    /// Player this ranking belongs to
    pub player_id: PlayerId,

    /// Current rating (trophies); never negative
    pub rating: i32,

    /// Division derived from rating
    pub division: Division,

    /// Matches won
    pub wins: u32,

    /// Matches lost
    pub losses: u32,

    /// Matches drawn
    pub draws: u32,

    /// Current win streak
    pub streak: u32,

    /// Best win streak ever
    pub best_streak: u32,

    /// Last time this ranking changed
    pub updated_at: DateTime<Utc>,
}

impl Ranking {
    /// Fresh ranking at the starting rating.
    pub fn new(player_id: PlayerId, now: DateTime<Utc>) -> Self {
        Self {
            player_id,
            rating: STARTING_RATING,
            division: Division::from_rating(STARTING_RATING),
            wins: 0,
            losses: 0,
            draws: 0,
            streak: 0,
            best_streak: 0,
            updated_at: now,
        }
    }

    /// Total matches recorded.
    pub fn games_played(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    /// Record a match result at the already-clamped new rating.
    ///
    /// Winner streaks increment, any other outcome resets the streak;
    /// best streak is a running maximum.
    pub fn apply_result(&mut self, outcome: Outcome, new_rating: i32, now: DateTime<Utc>) {
        self.rating = new_rating.max(0);
        self.division = Division::from_rating(self.rating);
        match outcome {
            Outcome::Win => {
                self.wins += 1;
                self.streak += 1;
                self.best_streak = self.best_streak.max(self.streak);
            }
            Outcome::Loss => {
                self.losses += 1;
                self.streak = 0;
            }
            Outcome::Draw => {
                self.draws += 1;
                self.streak = 0;
            }
        }
        self.updated_at = now;
    }
}

// =============================================================================
// TESTS
// =============================================================================
