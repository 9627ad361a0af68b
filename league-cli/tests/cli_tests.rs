//! End-to-end tests for the `league` binary
//!
//! Each test runs in its own temporary directory with a fresh database.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

// ============================================================================
// TEST FIXTURES
// ============================================================================

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn db(&self) -> PathBuf {
        self.path().join("league.db")
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_league"))
            .current_dir(self.path())
            .env_remove("LEAGUE_CONFIG")
            .env_remove("LEAGUE_DB")
            .env_remove("LEAGUE_ID")
            .env("RUST_LOG", "warn")
            .arg("--db")
            .arg(self.db())
            .args(args)
            .output()
            .unwrap()
    }

    fn ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "league {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    fn json(&self, args: &[&str]) -> Value {
        serde_json::from_str(&self.ok(args)).unwrap()
    }
}

/// Two entrants where alpha beat beta twice
fn played_league() -> Workspace {
    let ws = Workspace::new();
    ws.ok(&["agent", "add", "alpha", "--enter"]);
    ws.ok(&["agent", "add", "beta", "--enter"]);
    ws.ok(&["match", "record", "--p1", "alpha", "--p2", "beta", "--winner", "alpha"]);
    ws.ok(&["match", "record", "--p1", "beta", "--p2", "alpha", "--winner", "alpha"]);
    ws
}

// ============================================================================
// TESTS
// ============================================================================

#[test]
fn test_update_then_show_ratings() {
    let ws = played_league();

    let out = ws.ok(&["ratings", "update"]);
    assert!(out.contains("Processed 2"), "{}", out);
    let out = ws.ok(&["ratings", "update"]);
    assert!(out.contains("Processed 0"), "{}", out);

    let ratings = ws.json(&["ratings", "show", "--json"]);
    let ratings = ratings.as_array().unwrap();
    assert_eq!(ratings.len(), 2);
    assert_eq!(ratings[0]["agent_id"], 1);
    assert!(ratings[0]["mu"].as_f64().unwrap() > ratings[1]["mu"].as_f64().unwrap());

    let table = ws.ok(&["ratings", "show"]);
    assert!(table.lines().nth(1).unwrap().contains("alpha"));
}

#[test]
fn test_rebuild_matches_update() {
    let ws = played_league();
    ws.ok(&["ratings", "update"]);
    let incremental = ws.json(&["ratings", "show", "--json"]);

    let out = ws.ok(&["ratings", "rebuild", "--reset", "--order", "id"]);
    assert!(out.contains("2 match(es)"), "{}", out);
    let rebuilt = ws.json(&["ratings", "show", "--json"]);

    for (a, b) in incremental.as_array().unwrap().iter().zip(rebuilt.as_array().unwrap()) {
        assert_eq!(a["agent_id"], b["agent_id"]);
        assert!((a["mu"].as_f64().unwrap() - b["mu"].as_f64().unwrap()).abs() < 1e-9);
        assert!((a["sigma"].as_f64().unwrap() - b["sigma"].as_f64().unwrap()).abs() < 1e-9);
    }

    let settings = ws.json(&["settings", "show", "--json"]);
    assert_eq!(settings["last_processed_match_id"], 2);
}

#[test]
fn test_rank_and_matchups() {
    let ws = played_league();

    let outcome = ws.json(&["rank", "--json", "--alpha", "10"]);
    assert_eq!(outcome["status"], "ranked");
    assert_eq!(outcome["agents"][0]["name"], "alpha");

    let table = ws.json(&["matchups", "--json"]);
    assert_eq!(table[0]["name"], "alpha");
    assert_eq!(table[0]["total_wins"], 2);
    assert_eq!(table[1]["opponents"][0]["losses"], 2);

    assert!(!ws.run(&["rank", "--alpha", "-1"]).status.success());
}

#[test]
fn test_rank_with_one_agent_is_not_an_error() {
    let ws = Workspace::new();
    ws.ok(&["agent", "add", "solo", "--enter"]);
    let outcome = ws.json(&["rank", "--json"]);
    assert_eq!(outcome["status"], "not_enough_agents");
}

#[test]
fn test_next_pair_is_reproducible_with_seed() {
    let ws = played_league();
    ws.ok(&["agent", "add", "gamma", "--enter"]);

    let first = ws.json(&["next-pair", "--seed", "7", "--json"]);
    let second = ws.json(&["next-pair", "--seed", "7", "--json"]);
    assert_eq!(first["pair"], second["pair"]);

    let pair = first["pair"].as_array().unwrap();
    assert_ne!(pair[0], pair[1]);
    // gamma has never played, so it is the focal agent
    assert_eq!(pair[0], 3);
}

#[test]
fn test_settings_set_and_validation() {
    let ws = Workspace::new();
    let out = ws.ok(&["settings", "set", "--beta", "3.5", "--model", "weng_lin"]);
    assert!(out.contains("3.5"), "{}", out);

    let settings = ws.json(&["settings", "show", "--json"]);
    assert_eq!(settings["beta"], 3.5);
    assert_eq!(settings["model"], "weng_lin");

    assert!(!ws.run(&["settings", "set", "--sigma0", "0"]).status.success());
    assert!(!ws.run(&["settings", "show", "--league", "9"]).status.success());
}

#[test]
fn test_invalid_match_fails() {
    let ws = played_league();
    let output = ws.run(&["match", "record", "--p1", "alpha", "--p2", "alpha", "--winner", "alpha"]);
    assert!(!output.status.success());
    let output = ws.run(&["match", "record", "--p1", "alpha", "--p2", "nobody"]);
    assert!(!output.status.success());
}

#[test]
fn test_series_records_one_row_per_win() {
    let ws = Workspace::new();
    ws.ok(&["agent", "add", "alpha"]);
    ws.ok(&["agent", "add", "beta"]);
    let out = ws.ok(&[
        "match", "series", "--a", "alpha", "--b", "beta", "--wins-a", "3", "--wins-b", "1", "--draws", "2",
    ]);
    assert!(out.contains("Recorded 4 decisive"), "{}", out);

    let out = ws.ok(&["ratings", "update"]);
    assert!(out.contains("Processed 4"), "{}", out);
}

#[test]
fn test_config_file_selects_league() {
    let ws = Workspace::new();
    std::fs::write(ws.path().join("league.toml"), "league_id = 2\n").unwrap();

    ws.ok(&["settings", "set"]);
    ws.ok(&["settings", "show", "--league", "2"]);
    assert!(!ws.run(&["settings", "show", "--league", "1"]).status.success());
}
