// Integration tests for the key-value store collections: raids, members,
// guides, the leaderboard document, and the processed-log guard.

use titan_backend::db::{self, Database, GuideItem, GuideKind, Member, Raid};
use titan_backend::leaderboard::{Entry, Metric};

async fn test_db() -> Database {
    sqlx::any::install_default_drivers();
    Database::new("sqlite::memory:").await.unwrap()
}

fn raid(name: &str, date: &str) -> Raid {
    let now = db::now_iso();
    Raid {
        id: db::new_id(),
        date: date.to_string(),
        raid_name: name.to_string(),
        start_time: "20:00".to_string(),
        status: "scheduled".to_string(),
        boss_kills: 0,
        uwu_log_url: String::new(),
        logger: String::new(),
        composition_text: String::new(),
        composition: None,
        notes: String::new(),
        created_at: now.clone(),
        updated_at: now,
    }
}

fn member(name: &str, class: &str, rank: u32) -> Member {
    let now = db::now_iso();
    Member {
        id: db::new_id(),
        name: name.to_string(),
        class: class.to_string(),
        level: 80,
        rank,
        spec: String::new(),
        notes: String::new(),
        created_at: now.clone(),
        updated_at: now,
    }
}

fn guide(name: &str, priority: i64) -> GuideItem {
    let now = db::now_iso();
    GuideItem {
        id: db::new_id(),
        name: name.to_string(),
        description: String::new(),
        url: String::new(),
        category: String::new(),
        priority,
        content: String::new(),
        created_at: now.clone(),
        updated_at: now,
    }
}

// ── Raids ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_raids_are_newest_first() {
    let db = test_db().await;
    db.create_raid(raid("ICC 25", "2026-02-01")).await.unwrap();
    db.create_raid(raid("RS 25", "2026-02-03")).await.unwrap();

    let raids = db.list_raids().await.unwrap();
    assert_eq!(raids.len(), 2);
    assert_eq!(raids[0].raid_name, "RS 25");
    assert_eq!(raids[1].raid_name, "ICC 25");
}

#[tokio::test]
async fn test_raid_update_and_delete() {
    let db = test_db().await;
    let created = db.create_raid(raid("ICC 25", "2026-02-01")).await.unwrap();

    let updated = db
        .update_raid(&created.id, |r| {
            r.status = "completed".to_string();
            r.boss_kills = 12;
        })
        .await
        .unwrap()
        .expect("raid should exist");
    assert_eq!(updated.status, "completed");
    assert_eq!(updated.boss_kills, 12);
    assert_ne!(updated.updated_at, created.updated_at);

    assert!(db.delete_raid(&created.id).await.unwrap());
    assert!(!db.delete_raid(&created.id).await.unwrap());
    assert!(db.list_raids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_missing_raid_is_none() {
    let db = test_db().await;
    let result = db.update_raid("no-such-id", |_| {}).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_clear_raids_empties_the_list() {
    let db = test_db().await;
    db.create_raid(raid("ICC 25", "2026-02-01")).await.unwrap();
    db.create_raid(raid("RS 25", "2026-02-03")).await.unwrap();
    db.clear_raids().await.unwrap();
    assert!(db.list_raids().await.unwrap().is_empty());
}

// ── Members ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_member_duplicate_name_is_rejected() {
    let db = test_db().await;
    assert!(db.create_member(member("Athelard", "Paladin", 0)).await.unwrap());
    assert!(!db.create_member(member("athelard", "Mage", 4)).await.unwrap());
    assert_eq!(db.list_members().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_members_sort_by_rank_then_name() {
    let db = test_db().await;
    db.create_member(member("Zal", "Mage", 4)).await.unwrap();
    db.create_member(member("Athelard", "Paladin", 0)).await.unwrap();
    db.create_member(member("Bren", "Rogue", 4)).await.unwrap();

    let names: Vec<String> = db
        .list_members()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(names, vec!["Athelard", "Bren", "Zal"]);
}

#[tokio::test]
async fn test_member_update_resorts() {
    let db = test_db().await;
    db.create_member(member("Athelard", "Paladin", 0)).await.unwrap();
    let bren = member("Bren", "Rogue", 4);
    let bren_id = bren.id.clone();
    db.create_member(bren).await.unwrap();

    // Promoting Bren ties the ranks; name breaks the tie.
    db.update_member(&bren_id, |m| m.rank = 0).await.unwrap().unwrap();
    let members = db.list_members().await.unwrap();
    assert_eq!(members[0].name, "Athelard");
    assert_eq!(members[0].rank, 0);
    assert_eq!(members[1].name, "Bren");
    assert_eq!(members[1].rank, 0);
}

// ── Guides ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_guide_kinds_are_isolated() {
    let db = test_db().await;
    db.create_guide(GuideKind::Guides, guide("LK tactics", 5))
        .await
        .unwrap();
    db.create_guide(GuideKind::Addons, guide("DBM", 10))
        .await
        .unwrap();

    assert_eq!(db.list_guides(GuideKind::Guides).await.unwrap().len(), 1);
    assert_eq!(db.list_guides(GuideKind::Addons).await.unwrap().len(), 1);
    assert!(db.list_guides(GuideKind::Weakauras).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_guides_sort_by_priority_desc() {
    let db = test_db().await;
    db.create_guide(GuideKind::Addons, guide("Recount", 1))
        .await
        .unwrap();
    db.create_guide(GuideKind::Addons, guide("DBM", 10))
        .await
        .unwrap();

    let names: Vec<String> = db
        .list_guides(GuideKind::Addons)
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(names, vec!["DBM", "Recount"]);
}

// ── Leaderboard document ─────────────────────────────────────────────

#[tokio::test]
async fn test_leaderboard_roundtrip() {
    let db = test_db().await;

    // Missing key yields the empty default.
    let board = db.get_leaderboard().await.unwrap();
    assert!(board.dps.is_empty());
    assert_eq!(board.total_logs, 0);

    let mut board = board;
    board.record(
        Metric::Dps,
        "Rotface",
        Entry {
            player: "Zalandra".to_string(),
            class: "Mage".to_string(),
            dps: Some(8412.5),
            hps: None,
            date: "2026-02-02".to_string(),
            log_id: Some("26-02-02--21-00--Athelard--Lordaeron".to_string()),
        },
    );
    board.total_logs = 1;
    db.put_leaderboard(&board).await.unwrap();

    let loaded = db.get_leaderboard().await.unwrap();
    assert_eq!(loaded, board);
    assert_eq!(loaded.dps["Rotface"][0].player, "Zalandra");
}

// ── Processed-log guard ──────────────────────────────────────────────

#[tokio::test]
async fn test_log_is_only_processed_once() {
    let db = test_db().await;
    let id = "26-02-02--21-00--Athelard--Lordaeron";
    assert!(db.mark_log_processed(id).await.unwrap());
    assert!(!db.mark_log_processed(id).await.unwrap());
    assert_eq!(db.processed_log_ids().await.unwrap(), vec![id.to_string()]);
}
