// Roster/composition parser.
//
// Converts loosely structured Discord signup text (role headers, @mentions,
// bare names, class/spec keywords, status emoji) into a normalized roster.
// Pure text-in, data-out: no I/O, no state, deterministic. Unparseable
// lines are skipped, never errors — callers that care how well a blob
// parsed get the raw-vs-extracted counts back in `ParseStats`.

pub mod tables;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use tables::{role_for_spec, CLASSES, SPEC_ALIASES, STATUS_MARKERS};

// ── Vocabulary ───────────────────────────────────────────────────────

/// The ten game classes, plus Unknown when no keyword matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Class {
    #[serde(rename = "Death Knight")]
    DeathKnight,
    Druid,
    Hunter,
    Mage,
    Paladin,
    Priest,
    Rogue,
    Shaman,
    Warlock,
    Warrior,
    Unknown,
}

impl Class {
    pub fn name(self) -> &'static str {
        match self {
            Class::DeathKnight => "Death Knight",
            Class::Druid => "Druid",
            Class::Hunter => "Hunter",
            Class::Mage => "Mage",
            Class::Paladin => "Paladin",
            Class::Priest => "Priest",
            Class::Rogue => "Rogue",
            Class::Shaman => "Shaman",
            Class::Warlock => "Warlock",
            Class::Warrior => "Warrior",
            Class::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Player role. Melee/Ranged are kept distinct internally; `Dps` is the
/// generic form produced by a plain "DPS" header. The two output shapes
/// collapse these differently (see `Composition` and `RosterBreakdown`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Tank,
    Healer,
    Melee,
    Ranged,
    Dps,
    Unknown,
}

/// Signup status. Defaults to Confirmed when no marker is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Confirmed,
    Tentative,
    Late,
    Bench,
    Absent,
}

// ── Output types ─────────────────────────────────────────────────────

/// One parsed roster entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub class: Class,
    pub spec: Option<String>,
    pub role: Role,
    pub status: Status,
}

/// How well the text parsed: raw line and mention counts vs players
/// actually extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseStats {
    pub lines: usize,
    pub mentions_seen: usize,
    pub players_extracted: usize,
}

/// Parse result: players in input order plus match statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedRoster {
    pub players: Vec<Player>,
    pub stats: ParseStats,
}

/// Four-way raid composition. `Dps` and `Unknown` roles fold into the
/// ranged bucket (the parser's default inference when nothing narrower
/// is known).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub tanks: Vec<Player>,
    pub melee: Vec<Player>,
    pub ranged: Vec<Player>,
    pub healers: Vec<Player>,
}

impl Composition {
    pub fn is_empty(&self) -> bool {
        self.tanks.is_empty()
            && self.melee.is_empty()
            && self.ranged.is_empty()
            && self.healers.is_empty()
    }
}

/// Role-based signup view: tanks/healers/dps/unknown buckets plus derived
/// status counts and class frequencies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterBreakdown {
    pub roster: RoleBuckets,
    pub stats: SignupStats,
    pub class_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleBuckets {
    pub tanks: Vec<Player>,
    pub healers: Vec<Player>,
    pub dps: Vec<Player>,
    pub unknown: Vec<Player>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SignupStats {
    pub total: usize,
    pub tanks: usize,
    pub healers: usize,
    pub dps: usize,
    pub confirmed: usize,
    pub tentative: usize,
    pub late: usize,
    pub bench: usize,
}

impl ParsedRoster {
    /// Group into the `{tanks, melee, ranged, healers}` shape.
    pub fn composition(&self) -> Composition {
        let mut out = Composition::default();
        for p in &self.players {
            match p.role {
                Role::Tank => out.tanks.push(p.clone()),
                Role::Healer => out.healers.push(p.clone()),
                Role::Melee => out.melee.push(p.clone()),
                Role::Ranged | Role::Dps | Role::Unknown => out.ranged.push(p.clone()),
            }
        }
        out
    }

    /// Group into the `{roster, stats, classCounts}` signup shape.
    pub fn breakdown(&self) -> RosterBreakdown {
        let mut buckets = RoleBuckets::default();
        for p in &self.players {
            match p.role {
                Role::Tank => buckets.tanks.push(p.clone()),
                Role::Healer => buckets.healers.push(p.clone()),
                Role::Melee | Role::Ranged | Role::Dps => buckets.dps.push(p.clone()),
                Role::Unknown => buckets.unknown.push(p.clone()),
            }
        }

        let mut stats = SignupStats {
            total: self.players.len(),
            tanks: buckets.tanks.len(),
            healers: buckets.healers.len(),
            dps: buckets.dps.len(),
            ..SignupStats::default()
        };
        for p in &self.players {
            match p.status {
                Status::Confirmed => stats.confirmed += 1,
                Status::Tentative => stats.tentative += 1,
                Status::Late => stats.late += 1,
                Status::Bench => stats.bench += 1,
                Status::Absent => {}
            }
        }

        // Class tally skips the unknown role bucket and unmatched classes,
        // mirroring the signup view this feeds.
        let mut class_counts = BTreeMap::new();
        for p in buckets
            .tanks
            .iter()
            .chain(&buckets.healers)
            .chain(&buckets.dps)
        {
            if p.class != Class::Unknown {
                *class_counts.entry(p.class.name().to_string()).or_insert(0) += 1;
            }
        }

        RosterBreakdown {
            roster: buckets,
            stats,
            class_counts,
        }
    }
}

// ── Parse options ────────────────────────────────────────────────────

/// Caller knobs for `parse_with`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Role assumed before the first header line. Signup parsing passes
    /// `Some(Role::Dps)`; raid composition parsing passes `None`, in which
    /// case bare names are only picked up once a header has been seen.
    pub default_role: Option<Role>,
}

// ── Parser ───────────────────────────────────────────────────────────

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@(\S+)").unwrap());
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{1,15}$").unwrap());
static NUMBERING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[.)]\s*").unwrap());
static COUNT_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\d+\s*(players?|ppl)").unwrap());

/// Parse roster text with default options.
pub fn parse(text: &str) -> ParsedRoster {
    parse_with(text, ParseOptions::default())
}

/// Parse roster text: one forward pass over the lines, tracking the role
/// header context, extracting a player per @mention (or per bare-name line
/// when a role context is active). Never fails; worst case the result is
/// empty.
pub fn parse_with(text: &str, opts: ParseOptions) -> ParsedRoster {
    let mut players = Vec::new();
    let mut stats = ParseStats::default();
    // Explicit headers override spec inference; the caller default does not.
    let mut header_role: Option<Role> = None;

    for raw in text.lines() {
        let line = raw.trim_end_matches('\r').trim();
        if line.is_empty() {
            continue;
        }
        stats.lines += 1;

        if let Some(role) = detect_role_header(line) {
            header_role = Some(role);
            continue;
        }

        let (line, status) = strip_status(line);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mentions = extract_mentions(line, &mut stats.mentions_seen);
        if !mentions.is_empty() {
            // Class/spec context on the line applies to every mention on it.
            let scan = MENTION_RE.replace_all(line, " ").to_lowercase();
            let (class, spec, spec_role) = extract_class_spec(&scan);
            let role = resolve_role(header_role, spec_role, opts.default_role);
            for name in mentions {
                players.push(Player {
                    name,
                    class,
                    spec: spec.clone(),
                    role,
                    status,
                });
                stats.players_extracted += 1;
            }
            continue;
        }

        // Bare names need an active role context and must not look like
        // section decoration or prose.
        if header_role.or(opts.default_role).is_none() || is_excluded(line) {
            continue;
        }
        if let Some((name, rest)) = extract_bare_name(line) {
            let (class, spec, spec_role) = extract_class_spec(&rest.to_lowercase());
            let role = resolve_role(header_role, spec_role, opts.default_role);
            players.push(Player {
                name,
                class,
                spec,
                role,
                status,
            });
            stats.players_extracted += 1;
        }
    }

    ParsedRoster { players, stats }
}

/// Header context wins outright; otherwise spec-inferred role; otherwise
/// the caller default; otherwise unknown.
fn resolve_role(header: Option<Role>, from_spec: Option<Role>, default: Option<Role>) -> Role {
    header
        .or(from_spec)
        .or(default)
        .unwrap_or(Role::Unknown)
}

/// Detect a role-header line: after stripping surrounding dashes,
/// punctuation, and emoji, the remaining core must be exactly one of the
/// known header words.
fn detect_role_header(line: &str) -> Option<Role> {
    let core = line.trim_matches(|c: char| !c.is_ascii_alphanumeric());
    if core.is_empty() {
        return None;
    }
    let collapsed = core
        .to_ascii_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    match collapsed.as_str() {
        "tank" | "tanks" => Some(Role::Tank),
        "healer" | "healers" | "heal" | "heals" => Some(Role::Healer),
        "melee" | "meele" | "melee dps" | "meele dps" | "mdps" => Some(Role::Melee),
        "range" | "ranged" | "range dps" | "ranged dps" | "rdps" => Some(Role::Ranged),
        "dps" | "damage" | "damage dealers" => Some(Role::Dps),
        _ => None,
    }
}

/// Find and remove the first status marker. Word markers require
/// non-alphanumeric boundaries; emoji/shortcode markers match anywhere.
fn strip_status(line: &str) -> (String, Status) {
    for entry in STATUS_MARKERS {
        let range = if entry.word {
            find_word(line, entry.marker)
        } else {
            line.find(entry.marker).map(|i| (i, i + entry.marker.len()))
        };
        if let Some((start, end)) = range {
            let mut cleaned = String::with_capacity(line.len());
            cleaned.push_str(&line[..start]);
            cleaned.push_str(&line[end..]);
            return (cleaned, entry.status);
        }
    }
    (line.to_string(), Status::Confirmed)
}

/// ASCII case-insensitive whole-word search. Byte indices are valid for
/// the original string because ASCII lowercasing preserves length.
fn find_word(hay: &str, word: &str) -> Option<(usize, usize)> {
    let lower = hay.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut from = 0;
    while let Some(pos) = lower[from..].find(word) {
        let start = from + pos;
        let end = start + word.len();
        let before_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
        let after_ok = end == bytes.len() || !bytes[end].is_ascii_alphanumeric();
        if before_ok && after_ok {
            return Some((start, end));
        }
        from = end;
    }
    None
}

/// Pull every `@mention` off the line as a cleaned, Title-cased name.
/// Mentions that clean down to nothing usable yield no entry.
fn extract_mentions(line: &str, seen: &mut usize) -> Vec<String> {
    let mut names = Vec::new();
    for cap in MENTION_RE.captures_iter(line) {
        *seen += 1;
        let cleaned: String = cap[1]
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        if let Some(name) = valid_name(&cleaned, 30) {
            names.push(name);
        }
    }
    names
}

/// Bare-name extraction: strip numbering and leading markers, cut at the
/// first separator, and accept the first token if it looks like a short
/// character name. Returns the name and the rest of the line for
/// class/spec scanning.
fn extract_bare_name(line: &str) -> Option<(String, String)> {
    let line = NUMBERING_RE.replace(line, "");
    let trimmed = line.trim_start_matches(|c: char| !c.is_ascii_alphanumeric());
    let (segment, after_sep) = match trimmed.find(['-', ':', '(']) {
        Some(i) => (&trimmed[..i], &trimmed[i + 1..]),
        None => (trimmed, ""),
    };
    let mut words = segment.split_whitespace();
    let token = words.next()?;
    if !NAME_RE.is_match(token) {
        return None;
    }
    let name = valid_name(token, 16)?;
    let rest = format!("{} {}", words.collect::<Vec<_>>().join(" "), after_sep);
    Some((name, rest))
}

/// Validate a cleaned name candidate and Title-case it.
fn valid_name(candidate: &str, max_len: usize) -> Option<String> {
    if candidate.len() < 2 || candidate.len() > max_len {
        return None;
    }
    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    let mut name = first.to_ascii_uppercase().to_string();
    name.extend(chars.map(|c| c.to_ascii_lowercase()));
    Some(name)
}

/// Lines that are decoration, dividers, or headcounts — never names.
fn is_excluded(line: &str) -> bool {
    matches!(
        line.chars().next(),
        Some('-') | Some(':') | Some('=') | Some('*') | Some('#')
    ) || COUNT_LINE_RE.is_match(line)
}

/// Scan lowercased line text for the first class alias and first spec
/// alias, in table order. A spec's implied class only applies when no
/// class alias matched; the returned role is the alias' hint or the
/// spec→role inference.
fn extract_class_spec(scan: &str) -> (Class, Option<String>, Option<Role>) {
    let mut class = Class::Unknown;
    'outer: for entry in CLASSES {
        for alias in entry.aliases {
            if scan.contains(alias) {
                class = entry.class;
                break 'outer;
            }
        }
    }

    for entry in SPEC_ALIASES {
        if scan.contains(entry.alias) {
            if class == Class::Unknown {
                class = entry.implied_class;
            }
            let role = entry
                .role_hint
                .unwrap_or_else(|| role_for_spec(entry.spec, class));
            return (class, Some(entry.spec.to_string()), Some(role));
        }
    }

    (class, None, None)
}
