//! Service Layer
//!
//! Store-facing orchestration over the pure engines. Services are
//! synchronous request/response; the persistent store is injected and
//! each mutated aggregate is persisted as a separate write in a fixed
//! order. Per-player serialization of requests is the caller's
//! responsibility - no internal locking happens here.

pub mod store;
pub mod collection;
pub mod matchmaking;
pub mod lifecycle;

pub use store::{EntityStore, MemoryStore};
pub use collection::{CollectionService, CollectionError, SummonResult, SummonReward, FusionResult};
pub use matchmaking::{MatchmakingService, MatchmakingConfig, MatchmakingError, OpponentMatch};
pub use lifecycle::{
    MatchService, LifecycleConfig, LifecycleError, MatchCompletion, MatchId, MatchRewards,
    MatchStatus, PvpMatch,
};
