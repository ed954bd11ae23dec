// ==========================================
// Apparel Season Reconciliation - Season Code Normalizer
// ==========================================
// Maps free-form human-entered season strings to the canonical
// two-digit-year + SP/FA code ("Spring 26" -> "26SP", "FA26" -> "26FA").
// Pure function, no dependencies on the rest of the importer.
//
// A string that matches nothing is passed through cleaned but unchanged;
// the caller treats it as the "Unknown" bucket. A record is never
// discarded just because its season string is unparseable.
// ==========================================

use crate::domain::types::SeasonType;
use regex::Regex;
use std::sync::LazyLock;

static CANONICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}(SP|FA)$").expect("canonical season regex"));
static SPRING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SPRING\s*(\d{2})").expect("spring regex"));
static FALL_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"FALL\s*(\d{2})").expect("fall regex"));
static PERIOD_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(FA|SP)(\d{2})$").expect("period-first regex"));
static LETTER_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(F|S)(\d{2})$").expect("letter-first regex"));
static YEAR_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})(FA|SP)$").expect("year-first regex"));
static YEAR_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})(F|S)$").expect("year-letter regex"));

/// Trailing qualifiers that mark a non-main season variant.
/// Ordered so longer markers are tried first.
const QUALIFIERS: &[(&str, SeasonType)] = &[
    ("PRODUCTION", SeasonType::Bulk),
    ("PROTO", SeasonType::Proto),
    ("BULK", SeasonType::Bulk),
    ("SMS", SeasonType::Proto),
];

/// Normalization outcome: canonical code when a pattern matched,
/// cleaned passthrough otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSeason {
    pub season: String,
    pub season_type: SeasonType,
}

impl NormalizedSeason {
    /// True when `season` is in canonical `YYSP`/`YYFA` form.
    pub fn is_canonical(&self) -> bool {
        CANONICAL.is_match(&self.season)
    }
}

/// Normalize a raw season string.
///
/// Ordered algorithm, first match wins:
/// 1. Uppercase + trim; strip a trailing qualifier (BULK/PROTO/SMS/
///    PRODUCTION), recording the season type.
/// 2. Compound seasons ("25FA/26SP") keep the part before the slash.
/// 3. Strip remaining non-alphanumerics.
/// 4. Try the spelled-out and swapped forms in order.
/// 5. No match: return the cleaned string unchanged.
pub fn normalize(raw: &str) -> NormalizedSeason {
    let mut value = raw.trim().to_uppercase();
    let mut season_type = SeasonType::Main;

    // Step 1: trailing qualifier
    for (marker, kind) in QUALIFIERS {
        if value.ends_with(marker) {
            season_type = *kind;
            value.truncate(value.len() - marker.len());
            value = value
                .trim_end_matches(|c: char| c == '-' || c == '_' || c == '/' || c.is_whitespace())
                .to_string();
            break;
        }
    }

    // Step 2: compound season, keep the leading half
    if let Some(idx) = value.find('/') {
        value.truncate(idx);
    }

    // Step 3: strip separators and punctuation
    let cleaned: String = value.chars().filter(|c| c.is_ascii_alphanumeric()).collect();

    // Step 4: ordered pattern list
    if let Some(caps) = SPRING_YEAR.captures(&cleaned) {
        return NormalizedSeason {
            season: format!("{}SP", &caps[1]),
            season_type,
        };
    }
    if let Some(caps) = FALL_YEAR.captures(&cleaned) {
        return NormalizedSeason {
            season: format!("{}FA", &caps[1]),
            season_type,
        };
    }
    if let Some(caps) = PERIOD_FIRST.captures(&cleaned) {
        return NormalizedSeason {
            season: format!("{}{}", &caps[2], &caps[1]),
            season_type,
        };
    }
    if let Some(caps) = LETTER_FIRST.captures(&cleaned) {
        let period = if &caps[1] == "F" { "FA" } else { "SP" };
        return NormalizedSeason {
            season: format!("{}{}", &caps[2], period),
            season_type,
        };
    }
    if YEAR_FIRST.is_match(&cleaned) {
        return NormalizedSeason {
            season: cleaned,
            season_type,
        };
    }
    if let Some(caps) = YEAR_LETTER.captures(&cleaned) {
        let period = if &caps[2] == "F" { "FA" } else { "SP" };
        return NormalizedSeason {
            season: format!("{}{}", &caps[1], period),
            season_type,
        };
    }

    // Step 5: passthrough
    NormalizedSeason {
        season: cleaned,
        season_type,
    }
}
