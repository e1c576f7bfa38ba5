//! Manufacturer name normalization.
//!
//! Users type manufacturer names freely ("gateron", "Gateron Co., Ltd.",
//! "GATERON "). Every such string is reduced to a comparison key and matched
//! against the canonical names and aliases of known manufacturers:
//!
//! ```text
//! "Gateron Co., Ltd."  →  key "gateron"  →  canonical "Gateron"
//! ```
//!
//! This module is pure; the database-backed lookup lives in `switchbook-db`
//! and the create-on-miss workflow in `switchbook-moderation`.

/// Trailing tokens that do not distinguish one manufacturer from another.
const NOISE_SUFFIXES: &[&str] = &["co", "ltd", "inc", "corp", "company", "limited", "switches"];

/// Reduce a manufacturer string to its comparison key.
///
/// Lowercases, splits on anything that is not a letter or digit, drops trailing
/// corporate suffix tokens (as long as one token remains), and concatenates.
///
/// # Examples
///
/// ```
/// use switchbook_catalog::manufacturer::normalize_key;
///
/// assert_eq!(normalize_key("Gateron"), "gateron");
/// assert_eq!(normalize_key("  GATE-RON "), "gateron");
/// assert_eq!(normalize_key("Gateron Co., Ltd."), "gateron");
/// assert_eq!(normalize_key("JWK / Durock"), "jwkdurock");
/// ```
pub fn normalize_key(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    while tokens.len() > 1 && tokens.last().is_some_and(|t| NOISE_SUFFIXES.contains(t)) {
        tokens.pop();
    }

    tokens.concat()
}

/// Trim and collapse internal whitespace, keeping the user's capitalization.
pub fn clean_display_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A manufacturer as seen by the matcher: its id, canonical name, and aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownManufacturer {
    pub id: i64,
    pub name: String,
    pub aliases: Vec<String>,
}

/// Outcome of matching a free-text manufacturer string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The input is (a spelling of) a canonical name.
    Canonical { id: i64, name: String },
    /// The input matched an alias; `name` is the canonical name it maps to.
    Alias { id: i64, name: String },
    /// Nothing matched. Carries the cleaned-up input.
    Unknown(String),
}

impl Resolution {
    /// The name that should be stored on the switch record.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Canonical { name, .. } | Self::Alias { name, .. } => name,
            Self::Unknown(name) => name,
        }
    }

    pub fn manufacturer_id(&self) -> Option<i64> {
        match self {
            Self::Canonical { id, .. } | Self::Alias { id, .. } => Some(*id),
            Self::Unknown(_) => None,
        }
    }
}

/// Match `input` against known manufacturers.
///
/// Canonical names win over aliases when both would match.
pub fn resolve(input: &str, known: &[KnownManufacturer]) -> Resolution {
    let key = normalize_key(input);
    if key.is_empty() {
        return Resolution::Unknown(clean_display_name(input));
    }

    if let Some(m) = known.iter().find(|m| normalize_key(&m.name) == key) {
        return Resolution::Canonical {
            id: m.id,
            name: m.name.clone(),
        };
    }

    for m in known {
        if m.aliases.iter().any(|a| normalize_key(a) == key) {
            return Resolution::Alias {
                id: m.id,
                name: m.name.clone(),
            };
        }
    }

    Resolution::Unknown(clean_display_name(input))
}

/// Default edit distance for [`similar`].
pub const DEFAULT_SIMILARITY_DISTANCE: usize = 2;

/// Known manufacturers whose key is within `max_distance` edits of `input`,
/// nearest first. Exact key matches are included with distance 0.
///
/// Used to warn moderators that a newly submitted name is probably a typo of
/// an existing one ("Gaterom" vs "Gateron").
pub fn similar<'a>(
    input: &str,
    known: &'a [KnownManufacturer],
    max_distance: usize,
) -> Vec<(&'a KnownManufacturer, usize)> {
    let key = normalize_key(input);
    if key.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<(&KnownManufacturer, usize)> = known
        .iter()
        .filter_map(|m| {
            std::iter::once(m.name.as_str())
                .chain(m.aliases.iter().map(String::as_str))
                .map(|candidate| levenshtein(&key, &normalize_key(candidate)))
                .min()
                .filter(|d| *d <= max_distance)
                .map(|d| (m, d))
        })
        .collect();

    hits.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.name.cmp(&b.0.name)));
    hits
}

/// Classic two-row Levenshtein distance over chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
