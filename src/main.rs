//! Beastforge Engine Demo
//!
//! Seeded end-to-end session: summons, a fusion, matchmaking, an
//! asynchronous match resolved to completion, and a determinism check
//! replaying the battle from its seed.

use chrono::Utc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use beastforge::{
    VERSION,
    core::rng::DeterministicRng,
    game::ability::{Ability, AbilityBook, AbilityKind, EffectSpec, StatusKind},
    game::battle::{BattleConfig, BattleOutcome, BattleState},
    game::creature::{Creature, CreatureId, CreatureTemplate, Element, Rarity, Stat, StatBlock},
    game::fusion::FusionConfig,
    game::gacha::GachaConfig,
    game::player::{Player, PlayerId, Ranking},
    game::turn::run_battle,
    service::collection::{CollectionService, SummonReward},
    service::lifecycle::{LifecycleConfig, MatchService},
    service::matchmaking::{MatchmakingConfig, MatchmakingService},
    service::store::{EntityStore, MemoryStore},
};

fn main() {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Beastforge Engine v{}", VERSION);

    demo_session();
}

/// Demo function exercising the whole engine surface.
fn demo_session() {
    info!("=== Starting Demo Session ===");

    let mut store = MemoryStore::new();
    let now = Utc::now();
    load_content(&mut store);
    let book = AbilityBook::from_abilities(store.all_abilities());

    // Two players with summon funds
    let p1 = PlayerId::new([1; 16]);
    let p2 = PlayerId::new([2; 16]);
    for (id, name) in [(p1, "Aster"), (p2, "Bryn")] {
        let mut player = Player::new(id, name, now);
        player.credit_coins(2_000);
        store.upsert_player(player);
    }

    let collection = CollectionService::new(GachaConfig::default(), FusionConfig::default())
        .expect("default drop table must validate");

    let rng_seed = 20_260_804u64;
    let mut rng = DeterministicRng::new(rng_seed);
    info!("RNG Seed: {}", rng_seed);

    // Seeded summon session
    for id in [p1, p2] {
        let results = collection
            .roll_gacha_batch(&mut store, id, 12, &mut rng, now)
            .expect("batch roll");
        for result in &results {
            match &result.reward {
                SummonReward::NewCreature(creature) => {
                    info!(
                        "Player {} summoned {} ({:?})",
                        hex::encode(&id.0[..4]),
                        creature.name,
                        result.rarity
                    );
                }
                SummonReward::EssenceConverted { template, tier, amount } => {
                    info!(
                        "Player {} duplicate {} converted to {} {:?} essence",
                        hex::encode(&id.0[..4]),
                        template,
                        amount,
                        tier
                    );
                }
            }
        }
    }

    // Fuse the first two of player one's creatures
    let owned = store.creatures_by_owner(&p1);
    if owned.len() >= 2 {
        let mut player = store.player(&p1).expect("player exists");
        for tier in Rarity::RAREST_FIRST {
            player.grant_essence(tier, 200);
        }
        store.upsert_player(player);

        let fused = collection
            .fuse_creatures(
                &mut store,
                p1,
                owned[0].id,
                owned[1].id,
                "ember-core",
                "plain-ash",
                &mut rng,
                now,
            )
            .expect("fusion");
        info!(
            "Fused {} + {} -> {} (generation {}, {} mutations)",
            owned[0].name,
            owned[1].name,
            fused.child.name,
            fused.child.generation(),
            fused.child.lineage.as_ref().map(|l| l.mutations).unwrap_or(0)
        );
    }

    // Matchmaking: rank the opponent, then discover them
    store.upsert_ranking(Ranking::new(p2, now));
    let matchmaking = MatchmakingService::new(MatchmakingConfig::default());
    let found = matchmaking
        .find_opponent(&mut store, p1, &mut rng, now)
        .expect("one ranked opponent exists");
    info!(
        "Matched against {} (rating {}, win chance {}%)",
        hex::encode(&found.opponent_id.0[..4]),
        found.opponent_ranking.rating,
        found.win_probability_pct
    );

    // Async match: create, start, resolve to completion
    let matches = MatchService::new(LifecycleConfig::default(), BattleConfig::default());
    let team: Vec<CreatureId> = store
        .creatures_by_owner(&p1)
        .iter()
        .take(3)
        .map(|c| c.id)
        .collect();
    let created = matches
        .create_async_match(&mut store, p1, found.opponent_id, team, now)
        .expect("match creation");
    matches
        .start_match(&mut store, &book, &created.id, now)
        .expect("match start");
    info!("Match {} started", hex::encode(created.id));

    let outcome = loop {
        let report = matches
            .resolve_battle_turn(&mut store, &book, &created.id, now)
            .expect("turn resolution");
        if report.battle_complete {
            break report.outcome.expect("finished battles carry an outcome");
        }
    };

    let finished = store.match_by_id(&created.id).expect("match persisted");
    let battle = finished.battle.as_ref().expect("battle attached");
    info!("Battle finished after {} turns: {:?}", battle.turn, outcome);
    let hash = battle.compute_hash();
    info!("Final Battle Hash: {}", hex::encode(hash));

    match outcome {
        BattleOutcome::TeamA | BattleOutcome::TeamB => {
            let winner = if outcome == BattleOutcome::TeamA { p1 } else { found.opponent_id };
            let completion = matches
                .complete_match(&mut store, &created.id, winner, now)
                .expect("completion");
            info!(
                "Winner {}: {:+} rating ({:?}), {} coins, {} shards",
                hex::encode(&winner.0[..4]),
                completion.rewards.winner_rating_delta,
                completion.rewards.winner_division,
                completion.rewards.winner_coins,
                completion.rewards.winner_shards
            );
            info!(
                "Loser: {:+} rating ({:?}), {} coins",
                completion.rewards.loser_rating_delta,
                completion.rewards.loser_division,
                completion.rewards.loser_coins
            );
        }
        BattleOutcome::Draw => info!("Battle was a draw; match left open"),
    }

    // Verify determinism by replaying the battle from its seed
    info!("=== Verifying Determinism ===");
    let config = BattleConfig::default();
    let team_a = load_team(&store, &finished.teams[0]);
    let team_b = load_team(&store, &finished.teams[1]);
    let mut replay = BattleState::new(
        finished.id,
        battle.rng_seed,
        &team_a,
        &team_b,
        Vec::new(),
        &config,
    );
    run_battle(&mut replay, &book, &config);
    let replay_hash = replay.compute_hash();
    info!("Replay Battle Hash: {}", hex::encode(replay_hash));

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
    } else {
        info!("DETERMINISM FAILURE: Hashes differ!");
    }
}

fn load_team(store: &MemoryStore, ids: &[CreatureId]) -> Vec<Creature> {
    ids.iter().filter_map(|id| store.creature(id)).collect()
}

fn ability(
    id: &str,
    name: &str,
    kind: AbilityKind,
    energy_cost: i32,
    cooldown: u32,
    element: Element,
    effects: Vec<EffectSpec>,
) -> Ability {
    Ability {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        energy_cost,
        cooldown,
        element,
        effects,
    }
}

fn template(
    id: &str,
    name: &str,
    family: &str,
    element: Element,
    rarity: Rarity,
    stats: StatBlock,
    actives: &[&str],
    ultimate: Option<&str>,
) -> CreatureTemplate {
    CreatureTemplate {
        id: id.to_string(),
        name: name.to_string(),
        family: family.to_string(),
        element,
        rarity,
        stats,
        passive_abilities: vec![],
        active_abilities: actives.iter().map(|s| s.to_string()).collect(),
        ultimate_ability: ultimate.map(|s| s.to_string()),
    }
}

/// Load the demo content tables: abilities first, then templates.
fn load_content(store: &mut MemoryStore) {
    use AbilityKind::{Active, Ultimate};
    use EffectSpec::{Buff, Damage, Debuff, Heal, Lifesteal, Status};

    let abilities = [
        ability("scorch", "Scorch", Active, 20, 0, Element::Ember, vec![
            Damage { power: 25 },
            Status { status: StatusKind::Burn, chance_pct: 40, turns: 2 },
        ]),
        ability("tide-lash", "Tide Lash", Active, 20, 0, Element::Tide, vec![
            Damage { power: 30 },
        ]),
        ability("gale-cut", "Gale Cut", Active, 15, 0, Element::Gale, vec![
            Damage { power: 20 },
        ]),
        ability("stone-wall", "Stone Wall", Active, 15, 1, Element::Stone, vec![
            Buff { stat: Stat::Defense, amount: 10, percent: 0, turns: 2 },
        ]),
        ability("mend", "Mend", Active, 20, 1, Element::Radiant, vec![
            Heal { amount: 30 },
        ]),
        ability("soul-drain", "Soul Drain", Active, 25, 1, Element::Umbral, vec![
            Damage { power: 20 },
            Lifesteal { percent: 50 },
        ]),
        ability("inferno", "Inferno", Ultimate, 60, 3, Element::Ember, vec![
            Damage { power: 60 },
            Status { status: StatusKind::Burn, chance_pct: 80, turns: 2 },
        ]),
        ability("maelstrom", "Maelstrom", Ultimate, 60, 3, Element::Tide, vec![
            Damage { power: 50 },
            Debuff { stat: Stat::Speed, amount: 0, percent: 30, turns: 2 },
        ]),
    ];
    for a in abilities {
        store.insert_ability(a);
    }

    let templates = [
        template("emberling", "Emberling", "salamander", Element::Ember, Rarity::Common,
            StatBlock::new(100, 22, 10, 16), &["scorch", "gale-cut"], None),
        template("tidepup", "Tidepup", "selkie", Element::Tide, Rarity::Common,
            StatBlock::new(110, 18, 12, 14), &["tide-lash"], None),
        template("pebblit", "Pebblit", "golem", Element::Stone, Rarity::Common,
            StatBlock::new(130, 14, 18, 8), &["stone-wall", "gale-cut"], None),
        template("breezelet", "Breezelet", "sylph", Element::Gale, Rarity::Common,
            StatBlock::new(90, 20, 8, 24), &["gale-cut"], None),
        template("duskmoth", "Duskmoth", "wraith", Element::Umbral, Rarity::Uncommon,
            StatBlock::new(105, 24, 10, 20), &["soul-drain", "gale-cut"], None),
        template("sunwhelp", "Sunwhelp", "seraph", Element::Radiant, Rarity::Uncommon,
            StatBlock::new(115, 20, 14, 15), &["mend", "tide-lash"], None),
        template("cinderwolf", "Cinderwolf", "salamander", Element::Ember, Rarity::Rare,
            StatBlock::new(125, 30, 14, 22), &["scorch", "gale-cut"], Some("inferno")),
        template("stormdrake", "Stormdrake", "drake", Element::Gale, Rarity::Epic,
            StatBlock::new(140, 34, 16, 28), &["gale-cut", "tide-lash"], Some("maelstrom")),
        template("pyrelord", "Pyrelord", "salamander", Element::Ember, Rarity::Legendary,
            StatBlock::new(160, 40, 20, 26), &["scorch", "soul-drain"], Some("inferno")),
    ];
    for t in templates {
        store.insert_template(t);
    }
}
