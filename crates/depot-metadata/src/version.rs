//! # Version Ordering
//!
//! Versions are split on `.`, `-`, `_`, `+` and on digit/letter transitions,
//! then compared item by item:
//!
//! - numbers compare numerically, of any length;
//! - qualifiers rank `alpha < beta < milestone < rc < snapshot < (release) < sp`,
//!   and unknown qualifiers sort after `sp`, lexically among themselves;
//! - `0` and the release qualifiers (`ga`, `final`, `release`) are the same
//!   item, the one a shorter version is padded with;
//! - a number above zero outranks every qualifier.
//!
//! So `1.0-alpha < 1.0-rc1 < 1.0-SNAPSHOT < 1.0 < 1.0-sp1 < 1.0.1`.
//! Versions with equal items (`1.0`, `1.0.0`, `1-ga`) fall back to their text
//! so the order stays total.

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Number(String),
    Qualifier(String),
}

const RELEASE_RANK: u8 = 5;
const SP_RANK: u8 = 6;
const NULL_CLASS: u8 = 1;

fn qualifier_rank(q: &str) -> u8 {
    match q {
        "alpha" | "a" => 0,
        "beta" | "b" => 1,
        "milestone" | "m" => 2,
        "rc" | "cr" => 3,
        "snapshot" => 4,
        "" | "ga" | "final" | "release" => RELEASE_RANK,
        "sp" => SP_RANK,
        _ => 7,
    }
}

fn compare_qualifiers(a: &str, b: &str) -> Ordering {
    let (ra, rb) = (qualifier_rank(a), qualifier_rank(b));
    ra.cmp(&rb).then_with(|| {
        if ra == 7 {
            a.cmp(b)
        } else {
            Ordering::Equal
        }
    })
}

fn compare_numbers(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Coarse position of an item on the one scale all items share. A missing
/// item (padding) sits in [`NULL_CLASS`] together with `0` and the release
/// qualifiers, so every pair of items compares consistently.
fn class(item: Option<&Item>) -> u8 {
    match item {
        None => NULL_CLASS,
        Some(Item::Number(n)) if n == "0" => NULL_CLASS,
        Some(Item::Number(_)) => 4,
        Some(Item::Qualifier(q)) => match qualifier_rank(q) {
            r if r < RELEASE_RANK => 0,
            RELEASE_RANK => NULL_CLASS,
            SP_RANK => 2,
            _ => 3,
        },
    }
}

fn compare_items(a: Option<&Item>, b: Option<&Item>) -> Ordering {
    class(a).cmp(&class(b)).then_with(|| match (a, b) {
        (Some(Item::Number(x)), Some(Item::Number(y))) => compare_numbers(x, y),
        (Some(Item::Qualifier(x)), Some(Item::Qualifier(y))) => compare_qualifiers(x, y),
        _ => Ordering::Equal,
    })
}

fn push_item(items: &mut Vec<Item>, token: &mut String, numeric: bool) {
    if token.is_empty() {
        return;
    }
    let item = if numeric {
        let trimmed = token.trim_start_matches('0');
        Item::Number(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
    } else {
        Item::Qualifier(token.to_ascii_lowercase())
    };
    items.push(item);
    token.clear();
}

fn tokenize(raw: &str) -> Vec<Item> {
    let mut items = Vec::new();
    let mut token = String::new();
    let mut numeric = false;
    for c in raw.chars() {
        if matches!(c, '.' | '-' | '_' | '+') {
            push_item(&mut items, &mut token, numeric);
            continue;
        }
        let digit = c.is_ascii_digit();
        if !token.is_empty() && digit != numeric {
            push_item(&mut items, &mut token, numeric);
        }
        numeric = digit;
        token.push(c);
    }
    push_item(&mut items, &mut token, numeric);
    items
}

/// A version string with Maven-style ordering.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    items: Vec<Item>,
}

impl Version {
    /// Parse a version. Every string is a version; unusual ones just sort oddly.
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            items: tokenize(raw),
        }
    }

    /// The original text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this is a `-SNAPSHOT` version.
    pub fn is_snapshot(&self) -> bool {
        self.raw.to_ascii_uppercase().ends_with("SNAPSHOT")
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.items.len().max(other.items.len());
        (0..len)
            .map(|i| compare_items(self.items.get(i), other.items.get(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
