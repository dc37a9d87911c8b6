//! Cell-level cleanup for the site's HTML tables. Cells arrive full of
//! newlines, nbsp padding, and placeholder dashes.

/// Collapse whitespace runs (including `\u{a0}`) to single spaces and trim.
pub(crate) fn clean_text(raw: &str) -> String {
    raw.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalized_number(raw: &str) -> Option<String> {
    let cleaned = clean_text(raw).replace(',', "");
    if cleaned.is_empty() || cleaned == "-" || cleaned == "--" || cleaned == "/" {
        return None;
    }
    Some(cleaned)
}

pub(crate) fn parse_u8(raw: &str) -> Option<u8> {
    normalized_number(raw)?.parse().ok()
}

pub(crate) fn parse_u16(raw: &str) -> Option<u16> {
    normalized_number(raw)?.parse().ok()
}

pub(crate) fn parse_u32(raw: &str) -> Option<u32> {
    normalized_number(raw)?.parse().ok()
}

pub(crate) fn parse_i32(raw: &str) -> Option<i32> {
    normalized_number(raw)?.parse().ok()
}

pub(crate) fn parse_i64(raw: &str) -> Option<i64> {
    normalized_number(raw)?.parse().ok()
}

pub(crate) fn parse_f32(raw: &str) -> Option<f32> {
    let cleaned = normalized_number(raw)?;
    cleaned.trim_end_matches('%').parse().ok()
}

/// Attendance cells read like `Attendance: 5,231`; keep the digits.
pub(crate) fn parse_attendance(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

/// Innings pitched shows thirds as decimals: "7.1" is 7 and 1/3 innings.
pub(crate) fn parse_innings_pitched(raw: &str) -> Option<f32> {
    let cleaned = normalized_number(raw)?;
    let (whole, frac) = match cleaned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (cleaned.as_str(), "0"),
    };
    let whole: f32 = whole.parse().ok()?;
    let thirds = match frac {
        "0" | "" => 0.0,
        "1" => 1.0 / 3.0,
        "2" => 2.0 / 3.0,
        _ => return None,
    };
    Some(whole + thirds)
}

/// Game clocks read `MM:SS` or `MM:SS:cc` with a trailing centisecond
/// field. Returns `(seconds, centiseconds)`.
pub(crate) fn parse_clock(raw: &str) -> Option<(u32, u16)> {
    let cleaned = clean_text(raw);
    let parts: Vec<&str> = cleaned.split(':').collect();
    let (minutes, seconds, fraction) = match parts.as_slice() {
        [m, s] => (m, s, "0"),
        [m, s, f] => (m, s, *f),
        _ => return None,
    };
    let minutes: u32 = minutes.trim().parse().ok()?;
    let seconds: u32 = seconds.trim().parse().ok()?;
    let fraction: u16 = fraction.trim().parse().ok()?;
    Some((minutes * 60 + seconds, fraction))
}

/// Inverse of [`parse_clock`] for summed playing time.
pub(crate) fn format_clock(total_seconds: u32) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// The sortable name attribute is `Last,First` or `Last,Suffix,First`.
/// Returns `(first, last)`.
pub(crate) fn name_from_sortable(raw: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [last, first] => Some((first.to_string(), last.to_string())),
        [last, suffix, first] => Some((first.to_string(), format!("{last} {suffix}"))),
        _ => None,
    }
}

pub(crate) fn full_name_from_sortable(raw: &str) -> Option<String> {
    let (first, last) = name_from_sortable(raw)?;
    Some(clean_text(&format!("{first} {last}")))
}

/// Folds a player name to a lookup key. Play-by-play text prints
/// `Last, First` where rosters print `First Last`, with initials
/// dotted on one side only; both forms fold to the same key.
pub(crate) fn normalize_name(raw: &str) -> String {
    let cleaned = raw.replace('.', " ");
    let cleaned = cleaned.trim();
    let reordered = match cleaned.split_once(',') {
        Some((last, first)) => format!("{} {}", first.trim(), last.trim()),
        None => cleaned.to_string(),
    };
    clean_text(&reordered).to_lowercase()
}

/// Opponent names sometimes fold a venue marker in: `@ Texas` for road
/// games, `Texas @ Hoover, AL` for neutral sites. Keeps the name only.
pub(crate) fn strip_venue(name: &str) -> String {
    let name = name.trim();
    if let Some(stripped) = name.strip_prefix('@') {
        stripped.trim().to_string()
    } else if let Some((before, _site)) = name.split_once('@') {
        before.trim().to_string()
    } else {
        name.to_string()
    }
}

/// Trailing numeric id of hrefs like `/teams/573916`,
/// `/players/8291409?year_stat_category_id=15687`, or
/// `/contests/4525569/box_score`.
pub(crate) fn id_after(href: &str, marker: &str) -> Option<i64> {
    let start = href.find(marker)? + marker.len();
    let digits: String = href[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}
