//! Date, time, and clock parsing. Game times on the site are US Eastern.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::US::Eastern;

use crate::utils::text::clean_text;

/// Schedule date cells: `05/31/2025` with an optional `(2)` doubleheader
/// marker. Returns the date and the game number (1 when unmarked).
pub(crate) fn parse_schedule_date(raw: &str) -> Option<(NaiveDate, u8)> {
    let cleaned = clean_text(raw);
    let (date_part, game_num) = split_parenthetical(&cleaned);
    let date = NaiveDate::parse_from_str(date_part.trim(), "%m/%d/%Y").ok()?;
    Some((date, game_num.unwrap_or(1)))
}

/// Splits a `(n)` marker out of a cell, if present and numeric. The marker
/// usually trails the text but can sit mid-string on scoreboard headers.
pub(crate) fn split_parenthetical(cleaned: &str) -> (String, Option<u8>) {
    if let (Some(open), Some(close)) = (cleaned.find('('), cleaned.find(')')) {
        if open < close {
            if let Ok(n) = cleaned[open + 1..close].trim().parse::<u8>() {
                let mut rest = cleaned[..open].trim_end().to_string();
                let tail = cleaned[close + 1..].trim();
                if !tail.is_empty() {
                    rest.push(' ');
                    rest.push_str(tail);
                }
                return (rest.trim().to_string(), Some(n));
            }
        }
    }
    (cleaned.trim().to_string(), None)
}

/// Kickoff/first-pitch cells: `05/31/2025`, `05/31/2025 7:05 PM`, or a date
/// with a TBA/TBD suffix. Interpreted as US Eastern.
pub(crate) fn parse_game_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    let mut cleaned = clean_text(raw);
    for marker in ["TBA", "TBD", "tba", "tbd"] {
        cleaned = cleaned.replace(marker, "");
    }
    // The site sometimes glues the meridiem onto the minutes.
    for (glued, spaced) in [("AM", " AM"), ("PM", " PM")] {
        cleaned = cleaned.replace(glued, spaced);
    }
    let cleaned = clean_text(&cleaned);
    let trimmed = cleaned.trim();
    let naive = NaiveDateTime::parse_from_str(trimmed, "%m/%d/%Y %I:%M %p")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%m/%d/%Y")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    eastern(naive)
}

fn eastern(naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    Eastern
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

/// Season names like `2011-12` resolve to the ending year, 2012: the campaign
/// spans both semesters of one academic year.
pub(crate) fn season_from_name(name: &str) -> Option<u16> {
    let trimmed = name.trim();
    if trimmed.len() < 4 || !trimmed.is_char_boundary(2) {
        return None;
    }
    let head = &trimmed[..2];
    let tail = &trimmed[trimmed.len() - 2..];
    format!("{head}{tail}").parse().ok()
}

/// Game clocks: `MM:SS`, or `MM:SS:cc` with trailing centiseconds.
pub(crate) fn seconds_from_clock(raw: &str) -> Option<u32> {
    let cleaned = clean_text(raw);
    let parts: Vec<&str> = cleaned.split(':').collect();
    let (m, s) = match parts.as_slice() {
        [m, s] => (m, s),
        [m, s, _subsecond] => (m, s),
        _ => return None,
    };
    let minutes: u32 = m.trim().parse().ok()?;
    let seconds: u32 = s.trim().parse().ok()?;
    Some(minutes * 60 + seconds)
}

/// The season a football date belongs to. Fall sports wrap into the next
/// calendar year, and the 2020 season played its postseason in spring 2021.
pub(crate) fn football_season_for(today: NaiveDate) -> u16 {
    let year = today.year() as u16;
    if year == 2021 && today.month() < 8 {
        2020
    } else if today.month() < 6 {
        year - 1
    } else {
        year
    }
}
