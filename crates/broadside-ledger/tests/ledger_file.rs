//! File-backed ledger tests. Each test works in its own temp directory.

use broadside_ledger::ScoreLedger;
use broadside_protocol::ScoreEntry;

fn entry(ledger: &ScoreLedger, name: &str) -> ScoreEntry {
    ledger.scoreboard().get(name).copied().unwrap_or_default()
}

#[tokio::test]
async fn test_load_missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.json");

    let ledger = ScoreLedger::load(&path).await;

    assert!(ledger.scoreboard().is_empty());
    assert!(!path.exists(), "loading must not create the file");
}

#[tokio::test]
async fn test_save_then_load_restores_counts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.json");

    let mut ledger = ScoreLedger::load(&path).await;
    ledger.record_result("alice", "bob");
    ledger.save().await.expect("save");

    let reloaded = ScoreLedger::load(&path).await;
    assert_eq!(entry(&reloaded, "alice"), ScoreEntry { wins: 1, losses: 0 });
    assert_eq!(entry(&reloaded, "bob"), ScoreEntry { wins: 0, losses: 1 });
}

#[tokio::test]
async fn test_save_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.json");

    let mut ledger = ScoreLedger::load(&path).await;
    ledger.record_result("alice", "bob");
    ledger.save().await.expect("save");

    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["scores.json".to_string()]);
}

#[tokio::test]
async fn test_file_format_is_name_to_counters() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.json");

    let mut ledger = ScoreLedger::load(&path).await;
    ledger.record_result("alice", "bob");
    ledger.save().await.expect("save");

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        raw,
        serde_json::json!({
            "alice": {"wins": 1, "losses": 0},
            "bob": {"wins": 0, "losses": 1}
        })
    );
}

#[tokio::test]
async fn test_load_corrupt_file_starts_empty_and_save_repairs_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.json");
    std::fs::write(&path, b"{not json").unwrap();

    let mut ledger = ScoreLedger::load(&path).await;
    assert!(ledger.scoreboard().is_empty());

    ledger.record_result("carol", "dave");
    ledger.save().await.expect("save");

    let reloaded = ScoreLedger::load(&path).await;
    assert_eq!(entry(&reloaded, "carol").wins, 1);
}

#[tokio::test]
async fn test_counts_accumulate_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.json");

    for _ in 0..3 {
        let mut ledger = ScoreLedger::load(&path).await;
        ledger.record_result("alice", "bob");
        ledger.save().await.expect("save");
    }

    let ledger = ScoreLedger::load(&path).await;
    assert_eq!(entry(&ledger, "alice"), ScoreEntry { wins: 3, losses: 0 });
    assert_eq!(entry(&ledger, "bob"), ScoreEntry { wins: 0, losses: 3 });
}

#[tokio::test]
async fn test_save_keeps_other_entries_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.json");
    std::fs::write(&path, br#"{"carol":{"wins":2,"losses":5}}"#).unwrap();

    let mut ledger = ScoreLedger::load(&path).await;
    ledger.record_result("alice", "bob");
    ledger.save().await.expect("save");

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["carol"], serde_json::json!({"wins": 2, "losses": 5}));
    assert_eq!(raw["alice"], serde_json::json!({"wins": 1, "losses": 0}));
    assert_eq!(raw["bob"], serde_json::json!({"wins": 0, "losses": 1}));
}
