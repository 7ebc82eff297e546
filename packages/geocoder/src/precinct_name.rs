//! Extracts NYPD precinct numbers from free-text place names returned by
//! a nearby search ("NYPD 28th Precinct", "Midtown South Pct", ...).

use std::sync::LazyLock;

use regex::Regex;

/// Every precinct number in service.
pub const VALID_PRECINCTS: &[u32] = &[
    1, 5, 6, 7, 9, 10, 13, 14, 17, 18, 19, 20, 22, 23, 24, 25, 26, 28, 30, 32, 33, 34, 40, 41, 42,
    43, 44, 45, 46, 47, 48, 49, 50, 52, 60, 61, 62, 63, 66, 67, 68, 69, 70, 71, 72, 73, 75, 76, 77,
    78, 79, 81, 83, 84, 88, 90, 94, 100, 101, 102, 103, 104, 105, 106, 107, 108, 109, 110, 111,
    112, 113, 114, 115, 116, 120, 121, 122,
];

/// Named precincts whose place names carry no number. Checked against
/// the lowercased name, in order; every keyword must be present.
const NAMED_PRECINCTS: &[(&[&str], u64)] = &[
    (&["midtown", "south"], 14),
    (&["midtown", "north"], 18),
    (&["central park"], 22),
];

static ORDINAL_PRECINCT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]+)\s*(?:st|nd|rd|th)?\s*(?:precinct|pct)").expect("valid regex")
});

static ANY_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

/// A standalone 1-3 digit number, bounded by non-word characters.
static SHORT_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9A-Za-z_])([0-9]{1,3})(?:$|[^0-9A-Za-z_])").expect("valid regex")
});

/// Whether `num` is a precinct in service.
#[must_use]
pub fn is_valid_precinct(num: u64) -> bool {
    u32::try_from(num).is_ok_and(|n| VALID_PRECINCTS.contains(&n))
}

/// Extracts a candidate precinct number from a place name.
///
/// Rules, first match wins:
///
/// 1. Named precincts (Midtown South, Midtown North, Central Park).
/// 2. A number followed by an optional ordinal suffix and `precinct` or
///    `pct`.
/// 3. The first number in a name containing `precinct`.
/// 4. A standalone 1-3 digit number in a name containing `nypd` or
///    `police`, only if it is a valid precinct.
///
/// Rules 1-3 may return numbers that are not valid precincts; callers
/// must check with [`is_valid_precinct`].
#[must_use]
pub fn extract_precinct_number(name: &str) -> Option<u64> {
    let lower = name.to_lowercase();

    if let Some((_, num)) = NAMED_PRECINCTS
        .iter()
        .find(|(keywords, _)| keywords.iter().all(|k| lower.contains(k)))
    {
        return Some(*num);
    }

    if let Some(caps) = ORDINAL_PRECINCT.captures(name) {
        return Some(parse_number(&caps[1]));
    }

    if lower.contains("precinct")
        && let Some(m) = ANY_NUMBER.find(name)
    {
        return Some(parse_number(m.as_str()));
    }

    if (lower.contains("nypd") || lower.contains("police"))
        && let Some(caps) = SHORT_NUMBER.captures(name)
    {
        let num = parse_number(&caps[1]);
        if is_valid_precinct(num) {
            return Some(num);
        }
    }

    None
}

/// Overflowing digit runs map to a number that is never valid.
fn parse_number(digits: &str) -> u64 {
    digits.parse().unwrap_or(u64::MAX)
}

/// Returns the first valid precinct number found among `names`, in the
/// order given.
pub fn first_valid_precinct<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<u32> {
    names.into_iter().find_map(|name| {
        let num = extract_precinct_number(name).filter(|n| is_valid_precinct(*n))?;
        log::debug!("Matched precinct {num} from place name {name:?}");
        u32::try_from(num).ok()
    })
}
