//! ELO Rating Math
//!
//! Pure rating functions: expected score, K-factor, rating deltas, and
//! division assignment. No dependencies on game or service state.

use serde::{Serialize, Deserialize};

/// Rating assigned to a player the first time they are ranked.
pub const STARTING_RATING: i32 = 1000;

/// Players below this many games use the provisional K-factor.
const K_PROVISIONAL_GAMES: u32 = 30;

/// Players at or above this rating use the elite K-factor.
const K_ELITE_RATING: i32 = 2400;

const K_PROVISIONAL: f64 = 40.0;
const K_ESTABLISHED: f64 = 20.0;
const K_ELITE: f64 = 10.0;

/// Match outcome from the perspective of one player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Player won the match.
    Win,
    /// Match was drawn.
    Draw,
    /// Player lost the match.
    Loss,
}

impl Outcome {
    /// Actual score used by the ELO formula.
    pub fn score(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Draw => 0.5,
            Outcome::Loss => 0.0,
        }
    }
}

/// K-factor for a player based on games played and current rating.
pub fn k_factor(games_played: u32, rating: i32) -> f64 {
    if games_played < K_PROVISIONAL_GAMES {
        K_PROVISIONAL
    } else if rating >= K_ELITE_RATING {
        K_ELITE
    } else {
        K_ESTABLISHED
    }
}

/// Expected score for player A against player B.
///
/// Logistic ELO expectation: `1 / (1 + 10^((b - a) / 400))`.
pub fn expected_score(rating_a: i32, rating_b: i32) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((rating_b - rating_a) as f64 / 400.0))
}

/// Rounded rating delta for one side of a match.
pub fn rating_delta(rating: i32, opponent_rating: i32, outcome: Outcome, games_played: u32) -> i32 {
    let k = k_factor(games_played, rating);
    let expected = expected_score(rating, opponent_rating);
    (k * (outcome.score() - expected)).round() as i32
}

/// Apply a delta to a rating, clamping the result at zero.
///
/// Ratings are never stored negative; a display-only negative delta is
/// carried separately by the reward payload.
pub fn apply_delta(rating: i32, delta: i32) -> i32 {
    (rating + delta).max(0)
}

/// Win probability for player A against player B as a whole percentage.
pub fn win_probability_pct(rating_a: i32, rating_b: i32) -> u8 {
    (expected_score(rating_a, rating_b) * 100.0).round() as u8
}

// =============================================================================
// DIVISIONS
// =============================================================================

/// Discrete tier derived from rating, used for reward scaling and display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[derive(Default)]
pub enum Division {
    /// Below 1100 rating
    #[default]
    Bronze = 0,
    /// 1100 - 1399
    Silver = 1,
    /// 1400 - 1699
    Gold = 2,
    /// 1700 - 1999
    Platinum = 3,
    /// 2000 - 2299
    Diamond = 4,
    /// 2300 and up
    Legend = 5,
}

/// Ascending rating thresholds, one per division above Bronze.
const DIVISION_THRESHOLDS: [(i32, Division); 5] = [
    (1100, Division::Silver),
    (1400, Division::Gold),
    (1700, Division::Platinum),
    (2000, Division::Diamond),
    (2300, Division::Legend),
];

impl Division {
    /// Division for a rating. Monotonic non-decreasing in rating.
    pub fn from_rating(rating: i32) -> Self {
        let mut division = Division::Bronze;
        for (threshold, d) in DIVISION_THRESHOLDS {
            if rating >= threshold {
                division = d;
            }
        }
        division
    }

    /// Reward multiplier in percent (100 = 1.0x).
    pub fn reward_multiplier_pct(self) -> u32 {
        match self {
            Division::Bronze => 100,
            Division::Silver => 110,
            Division::Gold => 125,
            Division::Platinum => 140,
            Division::Diamond => 160,
            Division::Legend => 200,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
