//! Scraper for uwu-logs.xyz combat log reports.
//!
//! A report page per boss carries an HTML table of per-player damage; we
//! pull the useful-DPS column out of it with a row regex rather than a
//! full HTML parser, since the site's markup is stable and tiny.

use std::sync::LazyLock;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

/// Bosses scraped per report, in display order. Slug on the left is the
/// path segment uwu-logs uses.
pub const BOSSES: &[(&str, &str)] = &[
    ("lord-marrowgar", "Lord Marrowgar"),
    ("lady-deathwhisper", "Lady Deathwhisper"),
    ("deathbringer-saurfang", "Deathbringer Saurfang"),
    ("rotface", "Rotface"),
    ("festergut", "Festergut"),
    ("professor-putricide", "Professor Putricide"),
    ("blood-prince-council", "Blood Prince Council"),
    ("blood-queen-lanathel", "Blood-Queen Lana'thel"),
    ("sindragosa", "Sindragosa"),
    ("the-lich-king", "The Lich King"),
    ("halion", "Halion"),
];

/// How many boss pages are fetched concurrently per report.
const FETCH_CONCURRENCY: usize = 3;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
}

/// Damage row extracted from one boss page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRow {
    pub player: String,
    pub spec: String,
    pub class: String,
    pub dps: f64,
}

/// Per-boss fetch result. `error` is set when the page could not be
/// fetched; an empty `players` with `ok: true` means the boss simply
/// was not attempted in that report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BossOutcome {
    pub boss: String,
    pub ok: bool,
    pub players: Vec<PlayerRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

static REPORTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/reports/([^/?#]+)").unwrap());
static LOG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/log/([A-Za-z0-9-]+)").unwrap());

// One <tr> per player: title attr on the player cell is the full spec,
// the anchor is the name, then useful total and useful per-second cells.
// The player cell carries extra classes (e.g. "player-cell mage"), so the
// attribute is matched as a prefix, not an exact value.
static ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<tr[^>]*>.*?<td[^>]*class="player-cell[^"]*"[^>]*title="([^"]+)".*?<a[^>]*>([^<]+)</a>.*?<td class="useful total-cell">([^<]+)</td>\s*<td class="useful per-sec-cell">([^<]+)</td>.*?</tr>"#,
    )
    .unwrap()
});

/// Pull the report id out of a pasted uwu-logs URL (or accept a bare id).
pub fn extract_log_id(url: &str) -> Option<String> {
    if let Some(caps) = REPORTS_RE.captures(url) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = LOG_RE.captures(url) {
        return Some(caps[1].to_string());
    }
    // Bare report id, e.g. "26-02-02--21-00--Athelard--Lordaeron".
    if !url.is_empty() && !url.contains('/') && url.contains("--") {
        return Some(url.to_string());
    }
    None
}

/// Report ids start with the log date as "YY-MM-DD"; assume 20xx.
pub fn date_from_log_id(log_id: &str) -> Option<String> {
    let date = log_id.split("--").next()?;
    let mut parts = date.split('-');
    let (yy, mm, dd) = (parts.next()?, parts.next()?, parts.next()?);
    if yy.len() != 2 || mm.len() != 2 || dd.len() != 2 {
        return None;
    }
    if ![yy, mm, dd].iter().all(|p| p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    Some(format!("20{yy}-{mm}-{dd}"))
}

/// True for specs that count toward the damage leaderboard. Healers and
/// tanks show up in the table too but their numbers are not comparable.
pub fn is_dps_spec(spec: &str) -> bool {
    if spec == "Blood Death Knight" || spec == "Feral Combat Druid" {
        return false;
    }
    !(spec.contains("Restoration")
        || spec.contains("Holy")
        || spec.contains("Discipline")
        || spec.contains("Protection"))
}

/// Class name from a full spec string such as "Fire Mage".
pub fn class_from_spec(spec: &str) -> &'static str {
    // Plain contains checks; no class name is a substring of another, so
    // the order only matters for display consistency.
    const CLASSES: &[&str] = &[
        "Warrior",
        "Mage",
        "Rogue",
        "Warlock",
        "Druid",
        "Hunter",
        "Death Knight",
        "Paladin",
        "Priest",
        "Shaman",
    ];
    for class in CLASSES {
        if spec.contains(class) {
            return class;
        }
    }
    "Unknown"
}

fn parse_rows(html: &str) -> Vec<PlayerRow> {
    let mut rows = Vec::new();
    for caps in ROW_RE.captures_iter(html) {
        let spec = caps[1].trim().to_string();
        let player = caps[2].trim().to_string();
        if player == "Total" {
            continue;
        }
        let dps: f64 = caps[4].trim().replace(',', "").parse().unwrap_or(0.0);
        if dps <= 0.0 {
            continue;
        }
        let class = class_from_spec(&spec).to_string();
        rows.push(PlayerRow {
            player,
            spec,
            class,
            dps,
        });
    }
    rows
}

/// HTTP client for uwu-logs report pages.
pub struct LogFetcher {
    client: Client,
    base_url: String,
}

impl LogFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent("titan-backend/0.1 (guild site log importer)")
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn boss_url(&self, log_id: &str, slug: &str, attempt: u32) -> String {
        format!(
            "{}/reports/{}/?boss={}&mode=25H&attempt={}",
            self.base_url, log_id, slug, attempt
        )
    }

    async fn fetch_boss(&self, log_id: &str, slug: &str, name: &str, attempt: u32) -> BossOutcome {
        let url = self.boss_url(log_id, slug, attempt);
        match self.fetch_page(&url).await {
            Ok(html) => BossOutcome {
                boss: name.to_string(),
                ok: true,
                players: parse_rows(&html),
                error: None,
            },
            Err(err) => {
                tracing::warn!(boss = name, %url, error = %err, "boss page fetch failed");
                BossOutcome {
                    boss: name.to_string(),
                    ok: false,
                    players: Vec::new(),
                    error: Some(err.to_string()),
                }
            }
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status {
                status: resp.status(),
                url: url.to_string(),
            });
        }
        Ok(resp.text().await?)
    }

    /// Fetch all boss pages for one report, a few at a time. Outcomes come
    /// back in `BOSSES` order regardless of completion order.
    pub async fn fetch_log(&self, log_id: &str, attempt: u32) -> Vec<BossOutcome> {
        let fetches: Vec<_> = BOSSES
            .iter()
            .map(|(slug, name)| self.fetch_boss(log_id, slug, name, attempt))
            .collect();
        let mut outcomes: Vec<BossOutcome> = stream::iter(fetches)
            .buffer_unordered(FETCH_CONCURRENCY)
            .collect()
            .await;
        outcomes.sort_by_key(|o| {
            BOSSES
                .iter()
                .position(|(_, name)| *name == o.boss)
                .unwrap_or(usize::MAX)
        });
        outcomes
    }
}
