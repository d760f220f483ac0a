// Per-boss DPS/HPS leaderboard: top-10 maintenance over a single stored
// document. An existing player's entry is only replaced by a higher value.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Entries kept per boss per metric.
pub const TOP_N: usize = 10;

/// Which table an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Dps,
    Hps,
}

/// One leaderboard record. The wire shape carries either a `dps` or an
/// `hps` field depending on the table it sits in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub player: String,
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hps: Option<f64>,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_id: Option<String>,
}

impl Entry {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Dps => self.dps.unwrap_or(0.0),
            Metric::Hps => self.hps.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// The whole leaderboard document as persisted under its store key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub dps: BTreeMap<String, Vec<Entry>>,
    pub hps: BTreeMap<String, Vec<Entry>>,
    pub total_logs: u64,
    pub date_range: DateRange,
    pub generated: String,
}

impl Default for Leaderboard {
    fn default() -> Self {
        Leaderboard {
            dps: BTreeMap::new(),
            hps: BTreeMap::new(),
            total_logs: 0,
            date_range: DateRange::default(),
            generated: now_iso(),
        }
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Leaderboard {
    fn table_mut(&mut self, metric: Metric) -> &mut BTreeMap<String, Vec<Entry>> {
        match metric {
            Metric::Dps => &mut self.dps,
            Metric::Hps => &mut self.hps,
        }
    }

    /// Insert a record for a boss. If the player already has an entry it is
    /// replaced only when the new value is higher. The list stays sorted
    /// descending and truncated to `TOP_N`.
    pub fn record(&mut self, metric: Metric, boss: &str, entry: Entry) {
        let list = self.table_mut(metric).entry(boss.to_string()).or_default();
        match list.iter_mut().find(|e| e.player == entry.player) {
            Some(existing) => {
                if entry.value(metric) > existing.value(metric) {
                    *existing = entry;
                }
            }
            None => list.push(entry),
        }
        list.sort_by(|a, b| {
            b.value(metric)
                .partial_cmp(&a.value(metric))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        list.truncate(TOP_N);
    }

    /// Drop a player's entry for a boss.
    pub fn remove(&mut self, metric: Metric, boss: &str, player: &str) {
        if let Some(list) = self.table_mut(metric).get_mut(boss) {
            list.retain(|e| e.player != player);
        }
    }

    /// Clear a boss, either for one metric or for both.
    pub fn clear(&mut self, boss: &str, metric: Option<Metric>) {
        match metric {
            Some(m) => {
                self.table_mut(m).insert(boss.to_string(), Vec::new());
            }
            None => {
                self.dps.insert(boss.to_string(), Vec::new());
                self.hps.insert(boss.to_string(), Vec::new());
            }
        }
    }

    /// Reset the whole document.
    pub fn reset(&mut self) {
        *self = Leaderboard::default();
    }

    /// Widen the covered date range to include `date` (ISO dates compare
    /// lexicographically).
    pub fn widen_date_range(&mut self, date: &str) {
        match &self.date_range.from {
            Some(from) if from.as_str() <= date => {}
            _ => self.date_range.from = Some(date.to_string()),
        }
        match &self.date_range.to {
            Some(to) if to.as_str() >= date => {}
            _ => self.date_range.to = Some(date.to_string()),
        }
    }

    /// Refresh the `generated` timestamp; called after every mutation.
    pub fn touch(&mut self) {
        self.generated = now_iso();
    }
}
