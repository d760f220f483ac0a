// Static alias tables for the roster parser.
//
// These are pure, immutable configuration. Lookups take the FIRST substring
// match, so the ordering recorded here is the precedence policy: class
// aliases iterate classes in the order of `CLASSES` (longest alias first
// within a class), spec aliases iterate `SPEC_ALIASES` top to bottom.
// In particular, a bare `resto`/`restoration` resolves to Shaman unless a
// druid class alias also appears on the line, and a bare `frost`/`holy`
// resolves to Death Knight / Paladin.

use super::{Class, Role, Status};

/// A game class and the free-text aliases players type for it.
pub struct ClassEntry {
    pub class: Class,
    pub aliases: &'static [&'static str],
}

/// Class alias table. Iterated in order; within a class, longer aliases
/// come first so e.g. `warlock` is tested before Warrior's `war` can see it.
pub const CLASSES: &[ClassEntry] = &[
    ClassEntry {
        class: Class::DeathKnight,
        aliases: &["death knight", "deathknight", "dk"],
    },
    ClassEntry {
        class: Class::Druid,
        aliases: &["druid", "dru"],
    },
    ClassEntry {
        class: Class::Hunter,
        aliases: &["hunter", "hunt"],
    },
    ClassEntry {
        class: Class::Mage,
        aliases: &["mage"],
    },
    ClassEntry {
        class: Class::Paladin,
        aliases: &["paladin", "pally", "pala", "pal"],
    },
    ClassEntry {
        class: Class::Priest,
        aliases: &["priest"],
    },
    ClassEntry {
        class: Class::Rogue,
        aliases: &["rogue", "rog"],
    },
    ClassEntry {
        class: Class::Shaman,
        aliases: &["shaman", "shammy", "sham"],
    },
    ClassEntry {
        class: Class::Warlock,
        aliases: &["warlock", "lock"],
    },
    ClassEntry {
        class: Class::Warrior,
        aliases: &["warrior", "warr", "war"],
    },
];

/// A spec alias: canonical spec name, the class it implies when no class
/// alias matched on the line, and an optional role override.
///
/// `role_hint` is only set where the alias itself decides the role: `bear`
/// is a Feral druid that tanks, while `feral`/`cat` stay melee.
pub struct SpecEntry {
    pub alias: &'static str,
    pub spec: &'static str,
    pub implied_class: Class,
    pub role_hint: Option<Role>,
}

const fn spec(alias: &'static str, spec: &'static str, implied_class: Class) -> SpecEntry {
    SpecEntry {
        alias,
        spec,
        implied_class,
        role_hint: None,
    }
}

/// Spec alias table, consulted top to bottom, first substring match wins.
pub const SPEC_ALIASES: &[SpecEntry] = &[
    // Death Knight
    spec("blood", "Blood", Class::DeathKnight),
    spec("unholy", "Unholy", Class::DeathKnight),
    spec("unh", "Unholy", Class::DeathKnight),
    spec("frost", "Frost", Class::DeathKnight),
    // Druid
    spec("balance", "Balance", Class::Druid),
    spec("boomkin", "Balance", Class::Druid),
    spec("boomie", "Balance", Class::Druid),
    spec("boomy", "Balance", Class::Druid),
    spec("boom", "Balance", Class::Druid),
    spec("owl", "Balance", Class::Druid),
    SpecEntry {
        alias: "bear",
        spec: "Feral",
        implied_class: Class::Druid,
        role_hint: Some(Role::Tank),
    },
    spec("feral", "Feral", Class::Druid),
    spec("cat", "Feral", Class::Druid),
    spec("rdudu", "Restoration", Class::Druid),
    spec("tree", "Restoration", Class::Druid),
    // Hunter
    spec("beast mastery", "Beast Mastery", Class::Hunter),
    spec("bm", "Beast Mastery", Class::Hunter),
    spec("marksmanship", "Marksmanship", Class::Hunter),
    spec("marks", "Marksmanship", Class::Hunter),
    spec("mm", "Marksmanship", Class::Hunter),
    spec("survival", "Survival", Class::Hunter),
    spec("surv", "Survival", Class::Hunter),
    spec("sv", "Survival", Class::Hunter),
    // Mage
    spec("arcane", "Arcane", Class::Mage),
    spec("fire", "Fire", Class::Mage),
    // Paladin
    spec("protection", "Protection", Class::Paladin),
    spec("prot", "Protection", Class::Paladin),
    spec("retribution", "Retribution", Class::Paladin),
    spec("retri", "Retribution", Class::Paladin),
    spec("ret", "Retribution", Class::Paladin),
    spec("hpala", "Holy", Class::Paladin),
    spec("hpal", "Holy", Class::Paladin),
    spec("holy", "Holy", Class::Paladin),
    // Priest
    spec("discipline", "Discipline", Class::Priest),
    spec("disco", "Discipline", Class::Priest),
    spec("disc", "Discipline", Class::Priest),
    spec("shadow", "Shadow", Class::Priest),
    spec("spriest", "Shadow", Class::Priest),
    spec("sp", "Shadow", Class::Priest),
    // Rogue
    spec("assassination", "Assassination", Class::Rogue),
    spec("assassin", "Assassination", Class::Rogue),
    spec("assa", "Assassination", Class::Rogue),
    spec("combat", "Combat", Class::Rogue),
    spec("subtlety", "Subtlety", Class::Rogue),
    spec("sub", "Subtlety", Class::Rogue),
    // Shaman (also owns the bare resto aliases)
    spec("elemental", "Elemental", Class::Shaman),
    spec("elem", "Elemental", Class::Shaman),
    spec("ele", "Elemental", Class::Shaman),
    spec("enhancement", "Enhancement", Class::Shaman),
    spec("enhance", "Enhancement", Class::Shaman),
    spec("enha", "Enhancement", Class::Shaman),
    spec("enh", "Enhancement", Class::Shaman),
    spec("restoration", "Restoration", Class::Shaman),
    spec("resto", "Restoration", Class::Shaman),
    spec("rshamy", "Restoration", Class::Shaman),
    spec("rsham", "Restoration", Class::Shaman),
    // Warlock
    spec("affliction", "Affliction", Class::Warlock),
    spec("affli", "Affliction", Class::Warlock),
    spec("afli", "Affliction", Class::Warlock),
    spec("demonology", "Demonology", Class::Warlock),
    spec("demo", "Demonology", Class::Warlock),
    spec("destruction", "Destruction", Class::Warlock),
    spec("destro", "Destruction", Class::Warlock),
    // Warrior
    spec("arms", "Arms", Class::Warrior),
    spec("fury", "Fury", Class::Warrior),
    spec("fwarr", "Fury", Class::Warrior),
    spec("fwar", "Fury", Class::Warrior),
];

/// Infer a role from a canonical spec name plus the class it landed on.
/// Frost is the only spec whose role depends on the class (DK melee vs
/// Mage ranged). Unknown specs default to ranged.
pub fn role_for_spec(spec: &str, class: Class) -> Role {
    match spec {
        "Blood" | "Protection" => Role::Tank,
        "Holy" | "Discipline" | "Restoration" => Role::Healer,
        "Frost" => {
            if class == Class::Mage {
                Role::Ranged
            } else {
                Role::Melee
            }
        }
        "Unholy" | "Fury" | "Arms" | "Retribution" | "Combat" | "Assassination" | "Subtlety"
        | "Enhancement" | "Feral" => Role::Melee,
        _ => Role::Ranged,
    }
}

/// A signup-status marker. `word` markers only match on word boundaries
/// (so `out` does not fire inside `Scout`); the rest are plain substrings
/// (emoji and `:shortcode:` forms).
pub struct StatusEntry {
    pub marker: &'static str,
    pub status: Status,
    pub word: bool,
}

const fn emoji(marker: &'static str, status: Status) -> StatusEntry {
    StatusEntry {
        marker,
        status,
        word: false,
    }
}

const fn word(marker: &'static str, status: Status) -> StatusEntry {
    StatusEntry {
        marker,
        status,
        word: true,
    }
}

/// Status marker table, consulted top to bottom, first match wins.
pub const STATUS_MARKERS: &[StatusEntry] = &[
    emoji("\u{2705}", Status::Confirmed),     // ✅
    emoji("\u{2713}", Status::Confirmed),     // ✓
    emoji("\u{2611}", Status::Confirmed),     // ☑
    emoji(":white_check_mark:", Status::Confirmed),
    word("confirmed", Status::Confirmed),
    emoji("\u{2753}", Status::Tentative), // ❓
    emoji("\u{2754}", Status::Tentative), // ❔
    emoji(":question:", Status::Tentative),
    word("tentative", Status::Tentative),
    word("maybe", Status::Tentative),
    emoji("\u{23F0}", Status::Late), // ⏰
    emoji(":clock:", Status::Late),
    word("late", Status::Late),
    emoji("\u{1FA91}", Status::Bench), // 🪑
    word("benched", Status::Bench),
    word("bench", Status::Bench),
    emoji("\u{274C}", Status::Absent), // ❌
    emoji(":x:", Status::Absent),
    word("absent", Status::Absent),
    word("out", Status::Absent),
    word("x", Status::Absent),
];
