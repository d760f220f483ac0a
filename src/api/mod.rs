// HTTP API routes (raids, members, guides, leaderboard, roster parsing,
// log import).

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::auth::AdminAuth;
use crate::config::Config;
use crate::db::{self, Database, GuideItem, GuideKind, Member, Raid, StoreError};
use crate::leaderboard::{Entry, Leaderboard, Metric};
use crate::roster::{self, Composition, ParseOptions, Role};
use crate::uwu::{self, LogFetcher};

// ── Request types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRaidRequest {
    pub date: Option<String>,
    pub raid_name: Option<String>,
    pub start_time: Option<String>,
    pub status: Option<String>,
    pub boss_kills: Option<u32>,
    pub uwu_log_url: Option<String>,
    pub logger: Option<String>,
    pub composition_text: Option<String>,
    pub composition: Option<Composition>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRaidRequest {
    pub date: Option<String>,
    pub raid_name: Option<String>,
    pub start_time: Option<String>,
    pub status: Option<String>,
    pub boss_kills: Option<u32>,
    pub uwu_log_url: Option<String>,
    pub logger: Option<String>,
    pub composition_text: Option<String>,
    pub composition: Option<Composition>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateMemberRequest {
    pub name: Option<String>,
    pub class: Option<String>,
    pub level: Option<u32>,
    pub rank: Option<u32>,
    pub spec: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateMemberRequest {
    pub name: Option<String>,
    pub class: Option<String>,
    pub level: Option<u32>,
    pub rank: Option<u32>,
    pub spec: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct GuideQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateGuideRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub priority: Option<i64>,
    pub content: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateGuideRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub priority: Option<i64>,
    pub content: Option<String>,
}

/// Admin leaderboard mutation envelope. `action` selects the operation;
/// the other fields are required per action.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardAction {
    pub action: Option<String>,
    pub boss: Option<String>,
    #[serde(rename = "type")]
    pub metric: Option<Metric>,
    pub player_data: Option<Entry>,
    pub player: Option<String>,
    /// Whole replacement document, for the `import` action.
    pub data: Option<Leaderboard>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRosterRequest {
    pub text: Option<String>,
    pub default_role: Option<Role>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportLogRequest {
    pub log_url: Option<String>,
    pub attempt: Option<u32>,
}

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub fetcher: Arc<LogFetcher>,
}

// ── Error helper ──────────────────────────────────────────────────────

fn json_error(status: StatusCode, msg: &str) -> impl IntoResponse {
    (status, Json(json!({ "error": msg })))
}

fn internal_error(e: StoreError) -> impl IntoResponse {
    tracing::error!("Store error: {e}");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

// ── Router ────────────────────────────────────────────────────────────

/// Build the API router. The config rides along in request extensions so
/// the admin auth extractor can reach it without touching `AppState`.
pub fn router(db: Arc<Database>, fetcher: Arc<LogFetcher>, config: Arc<Config>) -> Router {
    let state = AppState { db, fetcher };

    Router::new()
        // Raids
        .route("/api/raids", get(list_raids).post(create_raid))
        .route("/api/raids/clear", post(clear_raids))
        .route(
            "/api/raids/{id}",
            axum::routing::put(update_raid).delete(delete_raid),
        )
        // Members
        .route("/api/members", get(list_members).post(create_member))
        .route(
            "/api/members/{id}",
            axum::routing::put(update_member).delete(delete_member),
        )
        // Guides / addons / weakauras (selected via ?type=)
        .route("/api/guides", get(list_guides).post(create_guide))
        .route(
            "/api/guides/{id}",
            axum::routing::put(update_guide).delete(delete_guide),
        )
        // Leaderboard
        .route(
            "/api/leaderboard",
            get(get_leaderboard).post(mutate_leaderboard),
        )
        // Roster parsing
        .route("/api/roster/parse", post(parse_roster))
        // Log import
        .route("/api/logs/import", post(import_log))
        .with_state(state)
        .layer(axum::middleware::from_fn(
            move |mut req: axum::http::Request<axum::body::Body>,
                  next: axum::middleware::Next| {
                let config = config.clone();
                async move {
                    req.extensions_mut().insert(config);
                    next.run(req).await
                }
            },
        ))
}

// ── Raid handlers ─────────────────────────────────────────────────────

async fn list_raids(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.list_raids().await {
        Ok(raids) => (StatusCode::OK, Json(json!(raids))).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// Resolve the stored composition for a raid: an explicit one wins, else
/// the composition text is parsed; an empty parse stores nothing.
fn resolve_composition(
    explicit: Option<Composition>,
    composition_text: &str,
) -> Option<Composition> {
    if let Some(comp) = explicit {
        return Some(comp);
    }
    if composition_text.trim().is_empty() {
        return None;
    }
    let comp = roster::parse(composition_text).composition();
    if comp.is_empty() {
        None
    } else {
        Some(comp)
    }
}

async fn create_raid(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Json(req): Json<CreateRaidRequest>,
) -> impl IntoResponse {
    let Some(date) = req.date.filter(|d| !d.is_empty()) else {
        return json_error(StatusCode::BAD_REQUEST, "date is required").into_response();
    };
    let Some(raid_name) = req.raid_name.filter(|n| !n.is_empty()) else {
        return json_error(StatusCode::BAD_REQUEST, "raidName is required").into_response();
    };

    let composition_text = req.composition_text.unwrap_or_default();
    let composition = resolve_composition(req.composition, &composition_text);

    let now = db::now_iso();
    let raid = Raid {
        id: db::new_id(),
        date,
        raid_name,
        start_time: req.start_time.unwrap_or_default(),
        status: req.status.unwrap_or_else(|| "scheduled".to_string()),
        boss_kills: req.boss_kills.unwrap_or(0),
        uwu_log_url: req.uwu_log_url.unwrap_or_default(),
        logger: req.logger.unwrap_or_default(),
        composition_text,
        composition,
        notes: req.notes.unwrap_or_default(),
        created_at: now.clone(),
        updated_at: now,
    };

    match state.db.create_raid(raid).await {
        Ok(raid) => (StatusCode::CREATED, Json(json!(raid))).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

async fn update_raid(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
    Json(req): Json<UpdateRaidRequest>,
) -> impl IntoResponse {
    let result = state
        .db
        .update_raid(&id, |raid| {
            if let Some(date) = req.date {
                raid.date = date;
            }
            if let Some(raid_name) = req.raid_name {
                raid.raid_name = raid_name;
            }
            if let Some(start_time) = req.start_time {
                raid.start_time = start_time;
            }
            if let Some(status) = req.status {
                raid.status = status;
            }
            if let Some(boss_kills) = req.boss_kills {
                raid.boss_kills = boss_kills;
            }
            if let Some(url) = req.uwu_log_url {
                raid.uwu_log_url = url;
            }
            if let Some(logger) = req.logger {
                raid.logger = logger;
            }
            if let Some(text) = req.composition_text {
                // Re-derive the composition whenever the text changes,
                // unless the request carries an explicit one.
                raid.composition = resolve_composition(req.composition, &text);
                raid.composition_text = text;
            } else if let Some(comp) = req.composition {
                raid.composition = Some(comp);
            }
            if let Some(notes) = req.notes {
                raid.notes = notes;
            }
        })
        .await;

    match result {
        Ok(Some(raid)) => (StatusCode::OK, Json(json!(raid))).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "Raid not found").into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

async fn delete_raid(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.db.delete_raid(&id).await {
        Ok(true) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Ok(false) => json_error(StatusCode::NOT_FOUND, "Raid not found").into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

async fn clear_raids(State(state): State<AppState>, _auth: AdminAuth) -> impl IntoResponse {
    match state.db.clear_raids().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

// ── Member handlers ───────────────────────────────────────────────────

const RANK_NAMES: &[(u32, &str)] = &[
    (0, "Guild Master"),
    (1, "Officer"),
    (2, "Veteran"),
    (3, "Raider"),
    (4, "Member"),
    (5, "Initiate"),
];

fn rank_name(rank: u32) -> &'static str {
    RANK_NAMES
        .iter()
        .find(|(r, _)| *r == rank)
        .map(|(_, name)| *name)
        .unwrap_or("Member")
}

async fn list_members(State(state): State<AppState>) -> impl IntoResponse {
    let members = match state.db.list_members().await {
        Ok(members) => members,
        Err(e) => return internal_error(e).into_response(),
    };

    let mut by_class: BTreeMap<String, u32> = BTreeMap::new();
    let mut by_rank: BTreeMap<String, u32> = BTreeMap::new();
    for member in &members {
        *by_class.entry(member.class.clone()).or_default() += 1;
        *by_rank.entry(rank_name(member.rank).to_string()).or_default() += 1;
    }

    (
        StatusCode::OK,
        Json(json!({
            "members": members,
            "totalMembers": members.len(),
            "byClass": by_class,
            "byRank": by_rank,
        })),
    )
        .into_response()
}

async fn create_member(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Json(req): Json<CreateMemberRequest>,
) -> impl IntoResponse {
    let Some(name) = req.name.filter(|n| !n.is_empty()) else {
        return json_error(StatusCode::BAD_REQUEST, "name is required").into_response();
    };
    let Some(class) = req.class.filter(|c| !c.is_empty()) else {
        return json_error(StatusCode::BAD_REQUEST, "class is required").into_response();
    };

    let now = db::now_iso();
    let member = Member {
        id: db::new_id(),
        name,
        class,
        level: req.level.unwrap_or(80),
        rank: req.rank.unwrap_or(4),
        spec: req.spec.unwrap_or_default(),
        notes: req.notes.unwrap_or_default(),
        created_at: now.clone(),
        updated_at: now,
    };

    match state.db.create_member(member.clone()).await {
        Ok(true) => (StatusCode::CREATED, Json(json!(member))).into_response(),
        Ok(false) => json_error(
            StatusCode::BAD_REQUEST,
            "Member with this name already exists",
        )
        .into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

async fn update_member(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
    Json(req): Json<UpdateMemberRequest>,
) -> impl IntoResponse {
    let result = state
        .db
        .update_member(&id, |member| {
            if let Some(name) = req.name {
                member.name = name;
            }
            if let Some(class) = req.class {
                member.class = class;
            }
            if let Some(level) = req.level {
                member.level = level;
            }
            if let Some(rank) = req.rank {
                member.rank = rank;
            }
            if let Some(spec) = req.spec {
                member.spec = spec;
            }
            if let Some(notes) = req.notes {
                member.notes = notes;
            }
        })
        .await;

    match result {
        Ok(Some(member)) => (StatusCode::OK, Json(json!(member))).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "Member not found").into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

async fn delete_member(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.db.delete_member(&id).await {
        Ok(true) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Ok(false) => json_error(StatusCode::NOT_FOUND, "Member not found").into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

// ── Guide handlers ────────────────────────────────────────────────────

async fn list_guides(
    State(state): State<AppState>,
    Query(query): Query<GuideQuery>,
) -> impl IntoResponse {
    let kind = GuideKind::from_query(query.kind.as_deref());
    match state.db.list_guides(kind).await {
        Ok(items) => (StatusCode::OK, Json(json!(items))).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

async fn create_guide(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Query(query): Query<GuideQuery>,
    Json(req): Json<CreateGuideRequest>,
) -> impl IntoResponse {
    let Some(name) = req.name.filter(|n| !n.is_empty()) else {
        return json_error(StatusCode::BAD_REQUEST, "name is required").into_response();
    };

    let kind = GuideKind::from_query(query.kind.as_deref());
    let now = db::now_iso();
    let item = GuideItem {
        id: db::new_id(),
        name,
        description: req.description.unwrap_or_default(),
        url: req.url.unwrap_or_default(),
        category: req.category.unwrap_or_default(),
        priority: req.priority.unwrap_or(0),
        content: req.content.unwrap_or_default(),
        created_at: now.clone(),
        updated_at: now,
    };

    match state.db.create_guide(kind, item).await {
        Ok(item) => (StatusCode::CREATED, Json(json!(item))).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

async fn update_guide(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
    Query(query): Query<GuideQuery>,
    Json(req): Json<UpdateGuideRequest>,
) -> impl IntoResponse {
    let kind = GuideKind::from_query(query.kind.as_deref());
    let result = state
        .db
        .update_guide(kind, &id, |item| {
            if let Some(name) = req.name {
                item.name = name;
            }
            if let Some(description) = req.description {
                item.description = description;
            }
            if let Some(url) = req.url {
                item.url = url;
            }
            if let Some(category) = req.category {
                item.category = category;
            }
            if let Some(priority) = req.priority {
                item.priority = priority;
            }
            if let Some(content) = req.content {
                item.content = content;
            }
        })
        .await;

    match result {
        Ok(Some(item)) => (StatusCode::OK, Json(json!(item))).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "Item not found").into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

async fn delete_guide(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
    Query(query): Query<GuideQuery>,
) -> impl IntoResponse {
    let kind = GuideKind::from_query(query.kind.as_deref());
    match state.db.delete_guide(kind, &id).await {
        Ok(true) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Ok(false) => json_error(StatusCode::NOT_FOUND, "Item not found").into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

// ── Leaderboard handlers ──────────────────────────────────────────────

async fn get_leaderboard(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.get_leaderboard().await {
        Ok(board) => (StatusCode::OK, Json(json!(board))).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

async fn mutate_leaderboard(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Json(req): Json<LeaderboardAction>,
) -> impl IntoResponse {
    let mut board = match state.db.get_leaderboard().await {
        Ok(board) => board,
        Err(e) => return internal_error(e).into_response(),
    };

    match req.action.as_deref() {
        Some("add") => {
            let Some(boss) = req.boss.filter(|b| !b.is_empty()) else {
                return json_error(StatusCode::BAD_REQUEST, "boss is required").into_response();
            };
            let Some(metric) = req.metric else {
                return json_error(StatusCode::BAD_REQUEST, "type is required").into_response();
            };
            let Some(entry) = req.player_data else {
                return json_error(StatusCode::BAD_REQUEST, "playerData is required")
                    .into_response();
            };
            if entry.player.is_empty() {
                return json_error(StatusCode::BAD_REQUEST, "playerData.player is required")
                    .into_response();
            }
            board.record(metric, &boss, entry);
        }
        Some("remove") => {
            let Some(boss) = req.boss.filter(|b| !b.is_empty()) else {
                return json_error(StatusCode::BAD_REQUEST, "boss is required").into_response();
            };
            let Some(metric) = req.metric else {
                return json_error(StatusCode::BAD_REQUEST, "type is required").into_response();
            };
            let Some(player) = req.player.filter(|p| !p.is_empty()) else {
                return json_error(StatusCode::BAD_REQUEST, "player is required").into_response();
            };
            board.remove(metric, &boss, &player);
        }
        Some("clear") => {
            let Some(boss) = req.boss.filter(|b| !b.is_empty()) else {
                return json_error(StatusCode::BAD_REQUEST, "boss is required").into_response();
            };
            board.clear(&boss, req.metric);
        }
        Some("reset") => {
            board.reset();
        }
        Some("import") => {
            let Some(imported) = req.data else {
                return json_error(StatusCode::BAD_REQUEST, "data is required").into_response();
            };
            board = imported;
        }
        _ => {
            return json_error(
                StatusCode::BAD_REQUEST,
                "Invalid action. Use: add, remove, clear, reset, or import",
            )
            .into_response();
        }
    }

    board.touch();
    match state.db.put_leaderboard(&board).await {
        Ok(()) => (StatusCode::OK, Json(json!(board))).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

// ── Roster parsing ────────────────────────────────────────────────────

async fn parse_roster(Json(req): Json<ParseRosterRequest>) -> impl IntoResponse {
    let Some(text) = req.text.filter(|t| !t.trim().is_empty()) else {
        return json_error(StatusCode::BAD_REQUEST, "text is required").into_response();
    };

    let parsed = roster::parse_with(
        &text,
        ParseOptions {
            default_role: req.default_role,
        },
    );

    (
        StatusCode::OK,
        Json(json!({
            "composition": parsed.composition(),
            "breakdown": parsed.breakdown(),
            "parseStats": parsed.stats,
        })),
    )
        .into_response()
}

// ── Log import ────────────────────────────────────────────────────────

async fn import_log(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Json(req): Json<ImportLogRequest>,
) -> impl IntoResponse {
    let Some(log_url) = req.log_url.filter(|u| !u.is_empty()) else {
        return json_error(StatusCode::BAD_REQUEST, "logUrl is required").into_response();
    };
    let Some(log_id) = uwu::extract_log_id(&log_url) else {
        return json_error(StatusCode::BAD_REQUEST, "Could not extract a log id from logUrl")
            .into_response();
    };

    let processed = match state.db.processed_log_ids().await {
        Ok(ids) => ids,
        Err(e) => return internal_error(e).into_response(),
    };
    if processed.iter().any(|id| *id == log_id) {
        return (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "alreadyProcessed": true,
                "logId": log_id,
            })),
        )
            .into_response();
    }

    let date = uwu::date_from_log_id(&log_id).unwrap_or_default();
    let outcomes = state
        .fetcher
        .fetch_log(&log_id, req.attempt.unwrap_or(0))
        .await;
    let fetched = outcomes.iter().filter(|o| o.ok).count();

    if fetched == 0 {
        return (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "success": false,
                "logId": log_id,
                "bosses": outcomes,
                "error": "All boss pages failed to fetch",
            })),
        )
            .into_response();
    }

    let mut board = match state.db.get_leaderboard().await {
        Ok(board) => board,
        Err(e) => return internal_error(e).into_response(),
    };

    let mut entries_added = 0usize;
    for outcome in &outcomes {
        if !outcome.ok {
            continue;
        }
        for row in &outcome.players {
            if !uwu::is_dps_spec(&row.spec) {
                continue;
            }
            board.record(
                Metric::Dps,
                &outcome.boss,
                Entry {
                    player: row.player.clone(),
                    class: row.class.clone(),
                    dps: Some(row.dps),
                    hps: None,
                    date: date.clone(),
                    log_id: Some(log_id.clone()),
                },
            );
            entries_added += 1;
        }
    }

    board.total_logs += 1;
    if !date.is_empty() {
        board.widen_date_range(&date);
    }
    board.touch();

    if let Err(e) = state.db.put_leaderboard(&board).await {
        return internal_error(e).into_response();
    }
    if let Err(e) = state.db.mark_log_processed(&log_id).await {
        return internal_error(e).into_response();
    }

    tracing::info!(
        log_id = %log_id,
        bosses_fetched = fetched,
        entries_added,
        "imported log"
    );

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "logId": log_id,
            "date": date,
            "bossesFetched": fetched,
            "entriesAdded": entries_added,
            "bosses": outcomes,
        })),
    )
        .into_response()
}
