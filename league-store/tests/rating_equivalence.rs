use std::sync::Arc;
use std::thread;

use league_core::{AgentId, NewMatch, Rating, SettingsOverrides};
use league_rank::ReplayOrder;
use league_store::SqliteStore;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn seed_league(store: &SqliteStore, agents: usize) -> Vec<AgentId> {
    store.ensure_league(1, &SettingsOverrides::default()).unwrap();
    (0..agents)
        .map(|i| store.register_agent(&format!("bot-{:02}", i)).unwrap().agent_id)
        .collect()
}

fn random_match(rng: &mut ChaCha8Rng, ids: &[AgentId]) -> NewMatch {
    let p1 = ids[rng.gen_range(0..ids.len())];
    let mut p2 = ids[rng.gen_range(0..ids.len())];
    while p2 == p1 {
        p2 = ids[rng.gen_range(0..ids.len())];
    }
    let mut m = NewMatch::decisive(1, p1, p2, if rng.gen_bool(0.6) { p1 } else { p2 });
    if rng.gen_bool(0.1) {
        m.winner_id = None;
    }
    m
}

fn assert_close(a: &[Rating], b: &[Rating]) {
    assert_eq!(a.len(), b.len());
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by_key(|r| r.agent_id);
    b.sort_by_key(|r| r.agent_id);
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.agent_id, y.agent_id);
        assert!((x.mu - y.mu).abs() < 1e-9, "mu {} vs {}", x.mu, y.mu);
        assert!((x.sigma - y.sigma).abs() < 1e-9, "sigma {} vs {}", x.sigma, y.sigma);
    }
}

#[test]
fn test_rebuild_matches_incremental_updates() {
    let store = SqliteStore::open_in_memory().unwrap();
    let ids = seed_league(&store, 6);
    let mut rng = ChaCha8Rng::seed_from_u64(12);

    // Interleave appends with incremental updates
    for _ in 0..8 {
        for _ in 0..rng.gen_range(0..15) {
            store.record_match(&random_match(&mut rng, &ids)).unwrap();
        }
        store.update(1).unwrap();
    }
    let incremental = store.ratings(1).unwrap();
    let cursor = store.settings(1).unwrap().last_processed_match_id;

    let report = store.rebuild(1, true, ReplayOrder::Id).unwrap();
    let rebuilt = store.ratings(1).unwrap();

    assert_close(&incremental, &rebuilt);
    assert_eq!(report.last_match_id, cursor);
    assert_eq!(store.update(1).unwrap(), 0);
}

#[test]
fn test_update_after_rebuild_continues() {
    let store = SqliteStore::open_in_memory().unwrap();
    let ids = seed_league(&store, 4);
    let mut rng = ChaCha8Rng::seed_from_u64(77);

    for _ in 0..20 {
        store.record_match(&random_match(&mut rng, &ids)).unwrap();
    }
    store.rebuild(1, true, ReplayOrder::Id).unwrap();
    for _ in 0..10 {
        store.record_match(&random_match(&mut rng, &ids)).unwrap();
    }
    store.update(1).unwrap();
    let mixed = store.ratings(1).unwrap();

    store.rebuild(1, true, ReplayOrder::Id).unwrap();
    assert_close(&mixed, &store.ratings(1).unwrap());
}

#[test]
fn test_concurrent_updates_apply_each_match_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("league.db");

    let writer = SqliteStore::open(&path).unwrap();
    let ids = seed_league(&writer, 5);
    let mut rng = ChaCha8Rng::seed_from_u64(2025);
    for _ in 0..60 {
        writer.record_match(&random_match(&mut rng, &ids)).unwrap();
    }

    let stores: Vec<Arc<SqliteStore>> = (0..4).map(|_| Arc::new(SqliteStore::open(&path).unwrap())).collect();
    let handles: Vec<_> = stores
        .iter()
        .map(|store| {
            let store = Arc::clone(store);
            thread::spawn(move || {
                let mut total = 0;
                for _ in 0..5 {
                    total += store.update(1).unwrap();
                }
                total
            })
        })
        .collect();
    let processed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    let decisive = writer
        .matches(1)
        .unwrap()
        .iter()
        .filter(|m| m.is_decisive())
        .count();
    assert_eq!(processed, decisive);

    let concurrent = writer.ratings(1).unwrap();
    writer.rebuild(1, true, ReplayOrder::Id).unwrap();
    assert_close(&concurrent, &writer.ratings(1).unwrap());
}

#[test]
fn test_ratings_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("league.db");
    {
        let store = SqliteStore::open(&path).unwrap();
        let ids = seed_league(&store, 2);
        store.record_match(&NewMatch::decisive(1, ids[0], ids[1], ids[1])).unwrap();
        store.update(1).unwrap();
    }
    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.ratings(1).unwrap().len(), 2);
    assert_eq!(store.update(1).unwrap(), 0);
}
