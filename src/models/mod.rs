use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// NCAA competitive division.
///
/// Football splits Division I into FBS and FCS, which the site numbers 11
/// and 12; the other sports only use I, II, and III.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Division {
    #[serde(rename = "I")]
    I,
    #[serde(rename = "II")]
    II,
    #[serde(rename = "III")]
    III,
    #[serde(rename = "FBS")]
    Fbs,
    #[serde(rename = "FCS")]
    Fcs,
}

impl Division {
    /// Numeric level the site's query strings use.
    pub fn level(self) -> u8 {
        match self {
            Division::I => 1,
            Division::II => 2,
            Division::III => 3,
            Division::Fbs => 11,
            Division::Fcs => 12,
        }
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Division::I),
            2 => Some(Division::II),
            3 => Some(Division::III),
            11 => Some(Division::Fbs),
            12 => Some(Division::Fcs),
            _ => None,
        }
    }

    pub fn all() -> [Division; 3] {
        [Division::I, Division::II, Division::III]
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Division::I => "I",
            Division::II => "II",
            Division::III => "III",
            Division::Fbs => "FBS",
            Division::Fcs => "FCS",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Division {
    type Err = Error;

    /// Accepts `1`/`2`/`3`, `I`/`II`/`III`, `d1`/`d2`/`d3`, and the football
    /// levels `fbs`/`11` and `fcs`/`12`, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "i" | "d1" => Ok(Division::I),
            "2" | "ii" | "d2" => Ok(Division::II),
            "3" | "iii" | "d3" => Ok(Division::III),
            "11" | "fbs" => Ok(Division::Fbs),
            "12" | "fcs" => Ok(Division::Fcs),
            _ => Err(Error::Parse {
                what: "NCAA division",
                value: s.to_string(),
            }),
        }
    }
}

/// Which side of a gendered sport a scraper reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Mens,
    Womens,
}

/// An institution, as listed by the site's team-history picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    pub school_id: i64,
    pub school_name: String,
}

/// One team: a school fielding a sport in one season and division.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub season: u16,
    pub division: Division,
    pub sport_code: String,
    pub team_id: i64,
    pub school_id: Option<i64>,
    pub school_name: String,
    pub conference: Option<String>,
}

/// One game from a team's schedule page.
///
/// Neutral-site games list the lower team id as the home side so that rows
/// from both teams' schedules de-duplicate cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleGame {
    pub game_id: Option<i64>,
    pub season: u16,
    pub season_name: String,
    pub division: Division,
    pub sport_code: String,
    pub game_date: NaiveDate,
    /// Doubleheader game number; 1 unless the date cell carried `(2)`.
    pub game_num: u8,
    /// Innings actually played; baseball and softball only.
    pub innings: Option<u8>,
    /// Overtime periods played; clocked sports only, 0 when none.
    pub ot_periods: Option<u8>,
    pub home_team_id: i64,
    pub home_team_name: String,
    pub away_team_id: i64,
    pub away_team_name: String,
    pub home_team_score: Option<u16>,
    pub away_team_score: Option<u16>,
    pub is_neutral_game: bool,
    pub attendance: Option<u32>,
    pub game_url: Option<String>,
}

/// One game from a day scoreboard page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreboardGame {
    pub game_id: i64,
    pub season: u16,
    pub division: Division,
    pub sport_code: String,
    pub game_date: NaiveDate,
    pub game_datetime: Option<DateTime<FixedOffset>>,
    /// Doubleheader game number from the scoreboard header.
    pub game_num: u8,
    pub away_team_id: Option<i64>,
    pub away_team_name: String,
    pub home_team_id: Option<i64>,
    pub home_team_name: String,
    pub away_score: u16,
    pub home_score: u16,
    /// Line-score extras; baseball and softball boards only.
    pub away_hits: Option<u16>,
    pub away_errors: Option<u16>,
    pub home_hits: Option<u16>,
    pub home_errors: Option<u16>,
    pub attendance: Option<u32>,
}

/// One player on a roster page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterMember {
    pub season: u16,
    pub team_id: i64,
    pub sport_code: String,
    pub player_id: Option<i64>,
    pub player_url: Option<String>,
    pub full_name: String,
    pub jersey_number: Option<String>,
    pub class_year: Option<String>,
    pub positions: Option<String>,
    pub height: Option<String>,
    /// Football rosters only.
    pub weight: Option<u16>,
    /// Baseball and softball rosters only.
    pub batting_hand: Option<String>,
    pub throwing_hand: Option<String>,
    pub hometown: Option<String>,
    pub high_school: Option<String>,
    pub games_played: Option<u16>,
    pub games_started: Option<u16>,
}

/// Header block shared by box score and play-by-play pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMeta {
    pub game_id: i64,
    pub season: u16,
    pub game_datetime: Option<DateTime<FixedOffset>>,
    pub stadium_name: Option<String>,
    pub attendance: Option<u32>,
    pub away_team_id: i64,
    pub away_team_name: String,
    pub home_team_id: i64,
    pub home_team_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_parsing() {
        assert_eq!("1".parse::<Division>().unwrap(), Division::I);
        assert_eq!("III".parse::<Division>().unwrap(), Division::III);
        assert_eq!("d2".parse::<Division>().unwrap(), Division::II);
        assert_eq!("fbs".parse::<Division>().unwrap(), Division::Fbs);
        assert!("d4".parse::<Division>().is_err());
    }

    #[test]
    fn test_division_display_and_level() {
        assert_eq!(Division::II.to_string(), "II");
        assert_eq!(Division::III.level(), 3);
        assert_eq!(Division::Fcs.level(), 12);
        assert_eq!(Division::from_level(1), Some(Division::I));
        assert_eq!(Division::from_level(11), Some(Division::Fbs));
        assert_eq!(Division::from_level(4), None);
    }
}
