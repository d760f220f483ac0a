// Key-value store (SQLite via sqlx) and the typed collections on top.
//
// Each collection lives as one whole JSON document under a fixed key,
// mirroring the hosted KV service the site originally ran on. Writes are
// read-modify-write with last-write-wins semantics: concurrent writers to
// the same key race and the later `set` silently wins. That limitation is
// part of the store contract; callers that need stronger guarantees would
// have to add a version token at this boundary.

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use uuid::Uuid;

use crate::leaderboard::Leaderboard;
use crate::roster::Composition;

/// Store key namespace.
pub mod keys {
    pub const RAIDS: &str = "titan:raids";
    pub const MEMBERS: &str = "titan:members";
    pub const LEADERBOARD: &str = "titan:top-parsers";
    pub const PROCESSED_LOGS: &str = "titan:processed-logs";
    pub const GUIDES: &str = "titan:guides";
    pub const ADDONS: &str = "titan:addons";
    pub const WEAKAURAS: &str = "titan:weakauras";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("corrupt document at {key}: {source}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ── Records ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Raid {
    pub id: String,
    pub date: String,
    pub raid_name: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub boss_kills: u32,
    #[serde(default)]
    pub uwu_log_url: String,
    #[serde(default)]
    pub logger: String,
    #[serde(default)]
    pub composition_text: String,
    #[serde(default)]
    pub composition: Option<Composition>,
    #[serde(default)]
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    pub class: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub spec: String,
    #[serde(default)]
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

/// The three resource lists served by the guides endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideKind {
    Guides,
    Addons,
    Weakauras,
}

impl GuideKind {
    pub fn from_query(value: Option<&str>) -> GuideKind {
        match value {
            Some("addons") => GuideKind::Addons,
            Some("weakauras") => GuideKind::Weakauras,
            _ => GuideKind::Guides,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            GuideKind::Guides => keys::GUIDES,
            GuideKind::Addons => keys::ADDONS,
            GuideKind::Weakauras => keys::WEAKAURAS,
        }
    }
}

// ── Database ─────────────────────────────────────────────────────────

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Read a whole JSON document. Missing key is `None`, not an error.
    pub async fn get_doc<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some((value,)) => {
                serde_json::from_str(&value)
                    .map(Some)
                    .map_err(|source| StoreError::Corrupt {
                        key: key.to_string(),
                        source,
                    })
            }
            None => Ok(None),
        }
    }

    /// Replace a whole JSON document (upsert).
    pub async fn put_doc<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        sqlx::query(
            "INSERT INTO kv (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ── Raids ─────────────────────────────────────────────────────────

    pub async fn list_raids(&self) -> Result<Vec<Raid>, StoreError> {
        Ok(self.get_doc(keys::RAIDS).await?.unwrap_or_default())
    }

    /// Prepend a raid (newest first, as the site lists them).
    pub async fn create_raid(&self, raid: Raid) -> Result<Raid, StoreError> {
        let mut raids = self.list_raids().await?;
        raids.insert(0, raid.clone());
        self.put_doc(keys::RAIDS, &raids).await?;
        Ok(raid)
    }

    /// Apply a partial update; returns the updated raid, or None if absent.
    pub async fn update_raid<F>(&self, id: &str, apply: F) -> Result<Option<Raid>, StoreError>
    where
        F: FnOnce(&mut Raid),
    {
        let mut raids = self.list_raids().await?;
        let Some(raid) = raids.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        apply(raid);
        raid.updated_at = now_iso();
        let updated = raid.clone();
        self.put_doc(keys::RAIDS, &raids).await?;
        Ok(Some(updated))
    }

    pub async fn delete_raid(&self, id: &str) -> Result<bool, StoreError> {
        let mut raids = self.list_raids().await?;
        let before = raids.len();
        raids.retain(|r| r.id != id);
        if raids.len() == before {
            return Ok(false);
        }
        self.put_doc(keys::RAIDS, &raids).await?;
        Ok(true)
    }

    pub async fn clear_raids(&self) -> Result<(), StoreError> {
        self.put_doc(keys::RAIDS, &Vec::<Raid>::new()).await
    }

    // ── Members ───────────────────────────────────────────────────────

    pub async fn list_members(&self) -> Result<Vec<Member>, StoreError> {
        Ok(self.get_doc(keys::MEMBERS).await?.unwrap_or_default())
    }

    /// Insert a member, keeping the roster sorted by rank then name.
    /// Returns false without writing when the name is already taken
    /// (case-insensitive).
    pub async fn create_member(&self, member: Member) -> Result<bool, StoreError> {
        let mut members = self.list_members().await?;
        if members
            .iter()
            .any(|m| m.name.eq_ignore_ascii_case(&member.name))
        {
            return Ok(false);
        }
        members.push(member);
        sort_members(&mut members);
        self.put_doc(keys::MEMBERS, &members).await?;
        Ok(true)
    }

    pub async fn update_member<F>(&self, id: &str, apply: F) -> Result<Option<Member>, StoreError>
    where
        F: FnOnce(&mut Member),
    {
        let mut members = self.list_members().await?;
        let Some(member) = members.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        apply(member);
        member.updated_at = now_iso();
        let updated = member.clone();
        sort_members(&mut members);
        self.put_doc(keys::MEMBERS, &members).await?;
        Ok(Some(updated))
    }

    pub async fn delete_member(&self, id: &str) -> Result<bool, StoreError> {
        let mut members = self.list_members().await?;
        let before = members.len();
        members.retain(|m| m.id != id);
        if members.len() == before {
            return Ok(false);
        }
        self.put_doc(keys::MEMBERS, &members).await?;
        Ok(true)
    }

    // ── Guides / addons / weakauras ───────────────────────────────────

    pub async fn list_guides(&self, kind: GuideKind) -> Result<Vec<GuideItem>, StoreError> {
        Ok(self.get_doc(kind.key()).await?.unwrap_or_default())
    }

    pub async fn create_guide(
        &self,
        kind: GuideKind,
        item: GuideItem,
    ) -> Result<GuideItem, StoreError> {
        let mut items = self.list_guides(kind).await?;
        items.push(item.clone());
        sort_guides(&mut items);
        self.put_doc(kind.key(), &items).await?;
        Ok(item)
    }

    pub async fn update_guide<F>(
        &self,
        kind: GuideKind,
        id: &str,
        apply: F,
    ) -> Result<Option<GuideItem>, StoreError>
    where
        F: FnOnce(&mut GuideItem),
    {
        let mut items = self.list_guides(kind).await?;
        let Some(item) = items.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        apply(item);
        item.updated_at = now_iso();
        let updated = item.clone();
        sort_guides(&mut items);
        self.put_doc(kind.key(), &items).await?;
        Ok(Some(updated))
    }

    pub async fn delete_guide(&self, kind: GuideKind, id: &str) -> Result<bool, StoreError> {
        let mut items = self.list_guides(kind).await?;
        let before = items.len();
        items.retain(|i| i.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.put_doc(kind.key(), &items).await?;
        Ok(true)
    }

    // ── Leaderboard ───────────────────────────────────────────────────

    pub async fn get_leaderboard(&self) -> Result<Leaderboard, StoreError> {
        Ok(self.get_doc(keys::LEADERBOARD).await?.unwrap_or_default())
    }

    pub async fn put_leaderboard(&self, leaderboard: &Leaderboard) -> Result<(), StoreError> {
        self.put_doc(keys::LEADERBOARD, leaderboard).await
    }

    // ── Processed log ids (double-import guard) ───────────────────────

    pub async fn processed_log_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.get_doc(keys::PROCESSED_LOGS).await?.unwrap_or_default())
    }

    /// Record a log id as imported. Returns false if it was already there.
    pub async fn mark_log_processed(&self, log_id: &str) -> Result<bool, StoreError> {
        let mut ids = self.processed_log_ids().await?;
        if ids.iter().any(|id| id == log_id) {
            return Ok(false);
        }
        ids.push(log_id.to_string());
        self.put_doc(keys::PROCESSED_LOGS, &ids).await?;
        Ok(true)
    }
}

fn sort_members(members: &mut [Member]) {
    members.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.name.cmp(&b.name)));
}

fn sort_guides(items: &mut [GuideItem]) {
    items.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));
}
