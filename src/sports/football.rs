//! Football: FBS/FCS/DII/DIII team lists, schedules, rosters, and a
//! drive-oriented play-by-play with a scrimmage-play classifier.
//!
//! The site publishes no usable per-player season or box tables for
//! football, so the grid here stops at teams, schedules, rosters, and
//! pbp. Play text ties field spots to a side through club codes
//! (`TROY35` is Troy's 35), so the raw log leans on a code registry
//! fetched from the project's data mirror; see [`TeamCode`]. Seasons
//! straddle calendar years: a January bowl belongs to the prior fall.

use std::collections::HashMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache;
use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::models::{Division, GameMeta, RosterMember, ScheduleGame, ScoreboardGame, Team};
use crate::pages::drives::Drive;
use crate::pages::pbp;
use crate::sports::engine::SportEngine;
use crate::utils::{dates, text};

static DRIVE_SUMMARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z\s]+)([0-9:]+), ?([A-Za-z0-9]+), ?([0-9]+) ?plays?, ?(-?[0-9]+) ?yards?, ?([0-9:]+)").unwrap()
});
static DOWN_DISTANCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)[a-zA-Z]+ & ([0-9]+) at ([A-Za-z0-9 ]+)").unwrap());
static CLOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+):([0-9]+)").unwrap());
static QUARTER_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)start of ([A-Za-z0-9]+) quarter").unwrap());
static SPOT_NUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)").unwrap());

static SHOTGUN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:shotgun-no huddle|no huddle-shotgun|shotgun|no huddle)[.,]? ?").unwrap()
});
static FIRST_DOWN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i),? ?1st down( [A-Za-z0-9]+)?").unwrap());
static YARDS_GAIN_PAREN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)yards? gain \([0-9]+\)").unwrap());
static QB_HURRY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i),? ?QB hurr(?:ied|y) by [A-Za-z,'\s-]+").unwrap());

static PASS_COMPLETE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)([A-Za-z.,'\s-]+?) pass complete(?: (?:deep|short) (?:left|middle|right))? to ([A-Za-z.,'\s-]+?)(?: caught at (?:the )?[A-Za-z0-9]+,?)? for (?:(-?[0-9]+) yards?(?: gain)?|no gain|(?:a )?loss of ([0-9]+) yards?)",
    )
    .unwrap()
});
static PASS_INCOMPLETE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)([A-Za-z.,'\s-]+?) pass incomplete(?: (?:deep|short) (?:left|middle|right))?(?: (?:to|intended for) ([A-Za-z.,'\s-]+?))?(?: \(|\.?$)",
    )
    .unwrap()
});
static INTERCEPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)([A-Za-z.,'\s-]+?) pass intercepted by ([A-Za-z.,'\s-]+?) at (?:the )?([A-Za-z0-9]+)",
    )
    .unwrap()
});
static SACK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)([A-Za-z.,'\s-]+?) sacked for (?:a )?(?:loss of )?(-?[0-9]+) yards? to the ([A-Za-z0-9]+)(?: \(([A-Za-z.,;'\s-]+)\))?",
    )
    .unwrap()
});
static RUSH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)([A-Za-z.,'\s-]+?) rush(?: (?:left|right|middle|up the middle))? for (?:(-?[0-9]+) yards?(?: gain)?|no gain|(?:a )?loss of ([0-9]+) yards?)",
    )
    .unwrap()
});
static KNEEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)kneel down by ([A-Za-z.,'\s-]+?) at (?:the )?([A-Za-z0-9]+)(?: for loss of ([0-9]+) yards?)?",
    )
    .unwrap()
});
static SPIKE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([A-Za-z.,'\s-]+?) spikes?\b").unwrap());
static KICKOFF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([A-Za-z.,'\s-]+?) kickoff (-?[0-9]+) yards? to the ([A-Za-z0-9]+)").unwrap()
});
static PUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([A-Za-z.,'\s-]+?) punt (-?[0-9]+) yards? to the ([A-Za-z0-9]+)").unwrap()
});
static RETURNER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([A-Za-z.,'\s-]+?) return (-?[0-9]+) yards? to the ([A-Za-z0-9]+)").unwrap()
});
static RETURN_YARDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)return(?:ed)? (-?[0-9]+) yards? to the ([A-Za-z0-9]+)").unwrap());
static FAIR_CATCH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)fair catch by ([A-Za-z.,'\s-]+?)(?: at | on |$)").unwrap());
static FG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([A-Za-z.,'\s-]+?) field goal attempt from (-?[0-9]+) yards?,? ?([A-Za-z ]+)")
        .unwrap()
});
static PAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([A-Za-z.,'\s-]+?) kick attempt ([A-Za-z ]+)").unwrap());
static TWO_POINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)([A-Za-z.,'\s-]+?) (pass|rush) attempt(?: to ([A-Za-z.,'\s-]+?))? ?(good|successful|failed|no good)",
    )
    .unwrap()
});
static PENALTY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)PENALTY ([A-Za-z0-9&'-]+) ([A-Za-z\s:]+?)(?: \(([A-Za-z.,'\s-]+)\))?,? (-?[0-9]+) yards?",
    )
    .unwrap()
});
static PENALTY_DECLINED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)PENALTY ([A-Za-z0-9&'-]+) ([0-9A-Za-z\s]+?) declined").unwrap());
static TIMEOUT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)timeout ([#0-9A-Za-z\s]+)").unwrap());
static FUMBLE_RECOVERY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)recovered by ([A-Za-z0-9]+)").unwrap());
static TACKLERS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([A-Za-z.,;'\s-]+)\)\.?\s*$").unwrap());
static DOWN_AND_FILLER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[0-9]+(?:st|nd|rd|th) and [0-9]+\.?$").unwrap());
static CLOCK_FILLER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^clock [0-9]{1,2}:[0-9]{2}\.?$").unwrap());

const REGISTRY_URL: &str =
    "https://raw.githubusercontent.com/armstjc/ncaa_stats_py/refs/heads/main/fb_team_abvs.csv";
const REGISTRY_CACHE_FILE: &str = "fb_team_abvs.csv";

/// Clubs the registry has no row (or no code) for, with codes matching the
/// ones play text uses for them.
const FALLBACK_CODES: [(i64, &str); 15] = [
    (114, "CALV"),   // Calvin
    (125, "CENT"),   // Centenary (LA)
    (241, "FPU"),    // Franklin Pierce
    (985, "BSU"),    // Bluefield St.
    (1072, "ECSP"),  // Erskine
    (1318, "POST"),  // Post
    (2807, "ROOS"),  // Roosevelt
    (8398, "HILB"),  // Hilbert
    (8968, "EUE"),   // Eastern
    (12799, "WHL"),  // Wheeling
    (13028, "AND"),  // Anderson (SC)
    (15646, "BART"), // Barton
    (22989, "LYN"),  // Lyon
    (30047, "KEY"),  // Keystone
    (30240, "ALL"),  // Allen
];

/// One row of the club-code registry: the codes the site's play text uses
/// for a school. Serialized with the mirror's own headers so the cached
/// copy round-trips against the upstream file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamCode {
    #[serde(rename = "NCAA ID")]
    pub school_id: i64,
    #[serde(rename = "NFS Team Code")]
    pub nfs_code: String,
    #[serde(rename = "Club Code")]
    pub club_code: String,
    #[serde(rename = "Club Code 2")]
    pub club_code_2: String,
}

pub(crate) fn parse_team_codes(body: &str) -> Result<Vec<TeamCode>> {
    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let mut codes = Vec::new();
    for row in reader.deserialize() {
        codes.push(row?);
    }
    Ok(codes)
}

/// Patches the registry with [`FALLBACK_CODES`]: missing schools get a
/// row, present rows only gain a code when theirs is blank.
fn with_fallback_codes(mut codes: Vec<TeamCode>) -> Vec<TeamCode> {
    for (school_id, code) in FALLBACK_CODES {
        match codes.iter_mut().find(|c| c.school_id == school_id) {
            Some(row) => {
                if row.club_code.trim().is_empty() {
                    row.club_code = code.to_string();
                }
            }
            None => codes.push(TeamCode {
                school_id,
                nfs_code: String::new(),
                club_code: code.to_string(),
                club_code_2: String::new(),
            }),
        }
    }
    codes
}

/// Code candidates for one side of a game, best first: club code, the
/// alternate club code, then the NFS code.
#[derive(Debug, Clone)]
struct SideCodes {
    team_id: i64,
    school_name: String,
    codes: Vec<String>,
}

impl SideCodes {
    fn new(team: &Team, registry: &[TeamCode]) -> Self {
        let mut codes = Vec::new();
        let row = team
            .school_id
            .and_then(|id| registry.iter().find(|c| c.school_id == id));
        if let Some(row) = row {
            for code in [&row.club_code, &row.club_code_2, &row.nfs_code] {
                let code = code.trim();
                if !code.is_empty() && !codes.iter().any(|c| c == code) {
                    codes.push(code.to_string());
                }
            }
        }
        Self {
            team_id: team.team_id,
            school_name: team.school_name.clone(),
            codes,
        }
    }

    fn primary(&self) -> Option<&str> {
        self.codes.first().map(String::as_str)
    }
}

/// Which side a spot like `TROY35` sits on. Full codes are tried before
/// two-letter prefixes, and the home side before the away side at each
/// rank. `None` for code-less spots such as a bare `50`.
fn spot_side(spot: &str, away: &SideCodes, home: &SideCodes) -> Option<i64> {
    let ranks = away.codes.len().max(home.codes.len());
    for rank in 0..ranks {
        for side in [home, away] {
            if let Some(code) = side.codes.get(rank) {
                if spot.contains(code.as_str()) {
                    return Some(side.team_id);
                }
            }
        }
    }
    for rank in 0..ranks {
        for side in [home, away] {
            if let Some(code) = side.codes.get(rank) {
                let prefix: String = code.chars().take(2).collect();
                if prefix.len() == 2 && spot.contains(&prefix) {
                    return Some(side.team_id);
                }
            }
        }
    }
    None
}

/// One raw play row from the drive log, with its drive and clock context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FbPlay {
    pub game_id: i64,
    pub season: u16,
    pub event_number: u32,
    pub away_team_id: i64,
    pub home_team_id: i64,
    pub quarter_num: u8,
    pub is_overtime: bool,
    pub drive_num: u16,
    pub drive_result: String,
    pub drive_plays: u16,
    pub drive_yards: i16,
    pub drive_summary: String,
    pub possession_team_id: i64,
    pub defensive_team_id: i64,
    /// Running score entering the drive, from the drive header.
    pub away_score: u16,
    pub home_score: u16,
    pub quarter_seconds_remaining: u16,
    pub half_seconds_remaining: u16,
    pub game_seconds_remaining: u16,
    pub down: u8,
    pub distance: u8,
    pub spot: String,
    pub spot_team_id: Option<i64>,
    /// Distance to the opponent's goal line; own goal line is 100.
    pub yardline_100: Option<u8>,
    pub play_text: String,
}

/// What a down resolved into. Point-after covers both kicked PATs and
/// two-point tries; no-play marks snaps a penalty wiped out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FbPlayType {
    Rush,
    Pass,
    Sack,
    Punt,
    Kickoff,
    FieldGoal,
    PointAfter,
    Penalty,
    Kneel,
    Spike,
    NoPlay,
}

/// One classified play. Rows that are game chrome (quarter markers, the
/// coin toss, clock notes) keep a `None` play type and blank fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FbParsedPlay {
    pub game_id: i64,
    pub season: u16,
    pub event_number: u32,
    pub quarter_num: u8,
    pub is_overtime: bool,
    pub drive_num: u16,
    pub possession_team_id: i64,
    pub defensive_team_id: i64,
    pub down: u8,
    pub distance: u8,
    pub spot: String,
    pub yardline_100: Option<u8>,
    pub quarter_seconds_remaining: u16,
    pub half_seconds_remaining: u16,
    pub game_seconds_remaining: u16,
    pub play_type: Option<FbPlayType>,
    pub yards_gained: Option<i16>,
    pub kick_distance: Option<u16>,
    pub return_yards: Option<i16>,
    pub is_first_down: bool,
    pub is_no_play: bool,
    pub is_shotgun: bool,
    pub is_no_huddle: bool,
    pub is_touchdown: bool,
    pub is_complete_pass: bool,
    pub is_incomplete_pass: bool,
    pub is_interception: bool,
    pub is_fumble: bool,
    pub is_touchback: bool,
    pub is_fair_catch: bool,
    pub is_timeout: bool,
    pub is_penalty: bool,
    pub is_turnover: bool,
    pub passer_name: Option<String>,
    pub passer_id: Option<i64>,
    pub receiver_name: Option<String>,
    pub receiver_id: Option<i64>,
    pub rusher_name: Option<String>,
    pub rusher_id: Option<i64>,
    pub interceptor_name: Option<String>,
    pub interceptor_id: Option<i64>,
    /// Kicker on kickoffs, field goals, and PATs; punter on punts.
    pub kicker_name: Option<String>,
    pub kicker_id: Option<i64>,
    pub returner_name: Option<String>,
    pub returner_id: Option<i64>,
    /// Raw tackler list, `;`-separated on gang tackles.
    pub tackler_names: Option<String>,
    pub timeout_team: Option<String>,
    pub penalty_team: Option<String>,
    pub penalty_type: Option<String>,
    pub penalty_player_name: Option<String>,
    pub penalty_yards: Option<i16>,
    pub field_goal_result: Option<String>,
    pub extra_point_result: Option<String>,
    pub two_point_result: Option<String>,
    /// Running score after the play, recomputed from scoring plays.
    pub away_score_post: u16,
    pub home_score_post: u16,
    pub play_text: String,
}

impl FbParsedPlay {
    fn from_raw(raw: &FbPlay) -> Self {
        Self {
            game_id: raw.game_id,
            season: raw.season,
            event_number: raw.event_number,
            quarter_num: raw.quarter_num,
            is_overtime: raw.is_overtime,
            drive_num: raw.drive_num,
            possession_team_id: raw.possession_team_id,
            defensive_team_id: raw.defensive_team_id,
            down: raw.down,
            distance: raw.distance,
            spot: raw.spot.clone(),
            yardline_100: raw.yardline_100,
            quarter_seconds_remaining: raw.quarter_seconds_remaining,
            half_seconds_remaining: raw.half_seconds_remaining,
            game_seconds_remaining: raw.game_seconds_remaining,
            play_type: None,
            yards_gained: None,
            kick_distance: None,
            return_yards: None,
            is_first_down: false,
            is_no_play: false,
            is_shotgun: false,
            is_no_huddle: false,
            is_touchdown: false,
            is_complete_pass: false,
            is_incomplete_pass: false,
            is_interception: false,
            is_fumble: false,
            is_touchback: false,
            is_fair_catch: false,
            is_timeout: false,
            is_penalty: false,
            is_turnover: false,
            passer_name: None,
            passer_id: None,
            receiver_name: None,
            receiver_id: None,
            rusher_name: None,
            rusher_id: None,
            interceptor_name: None,
            interceptor_id: None,
            kicker_name: None,
            kicker_id: None,
            returner_name: None,
            returner_id: None,
            tackler_names: None,
            timeout_team: None,
            penalty_team: None,
            penalty_type: None,
            penalty_player_name: None,
            penalty_yards: None,
            field_goal_result: None,
            extra_point_result: None,
            two_point_result: None,
            away_score_post: 0,
            home_score_post: 0,
            play_text: raw.play_text.clone(),
        }
    }
}

/// Scraper for `MFB`. Division I requests read as FBS; pass
/// [`Division::Fcs`] for the championship subdivision.
pub struct FootballScraper {
    engine: SportEngine,
}

impl FootballScraper {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        Ok(Self {
            engine: SportEngine::new(config, &super::FOOTBALL)?,
        })
    }

    /// Teams fielding football in one season and division.
    pub async fn teams(&self, season: u16, division: Division) -> Result<Vec<Team>> {
        self.engine.teams(season, division).await
    }

    /// Teams across every cached season and division.
    pub async fn all_teams(&self) -> Result<Vec<Team>> {
        self.engine.all_teams().await
    }

    pub async fn team_schedule(&self, team_id: i64) -> Result<Vec<ScheduleGame>> {
        self.engine.team_schedule(team_id).await
    }

    pub async fn full_schedule(&self, season: u16, division: Division) -> Result<Vec<ScheduleGame>> {
        self.engine.full_schedule(season, division).await
    }

    pub async fn day_schedule(
        &self,
        date: NaiveDate,
        division: Division,
    ) -> Result<Vec<ScoreboardGame>> {
        self.engine.day_schedule(date, division).await
    }

    pub async fn roster(&self, team_id: i64) -> Result<Vec<RosterMember>> {
        self.engine.roster(team_id).await
    }

    /// The club-code registry, refreshed from the data mirror every 90
    /// days, with the fallback codes patched in.
    pub async fn team_codes(&self) -> Result<Vec<TeamCode>> {
        let rel = self.engine.rel(REGISTRY_CACHE_FILE);
        if let Some(rows) = self
            .engine
            .cache
            .load_if_fresh::<TeamCode>(&rel, cache::SCHOOLS_MAX_AGE)
        {
            return Ok(rows);
        }
        let body = self.engine.http.get(REGISTRY_URL).await?;
        let codes = with_fallback_codes(parse_team_codes(&body)?);
        self.engine.cache.store(&rel, &codes)?;
        Ok(codes)
    }

    /// The drive log flattened to play rows with drive, score, clock, and
    /// field-position context.
    pub async fn raw_pbp(&self, game_id: i64) -> Result<Vec<FbPlay>> {
        let rel = self.engine.rel(&format!("raw_pbp/{game_id}_raw_pbp.csv"));
        if let Some(rows) = self.engine.cache.load_if_fresh::<FbPlay>(&rel, cache::GAME_MAX_AGE) {
            return Ok(rows);
        }

        let (meta, quarters) = self.engine.drives_page(game_id).await?;
        let season = meta
            .game_datetime
            .map(|dt| dates::football_season_for(dt.date_naive()))
            .unwrap_or(meta.season);
        let (away, home) = self.game_sides(&meta).await?;
        let plays = drive_rows(&meta, season, &quarters, &away, &home);
        self.engine.cache.store(&rel, &plays)?;
        Ok(plays)
    }

    /// The raw rows classified into play types, yardage, and players, with
    /// names resolved against both rosters.
    pub async fn parsed_pbp(&self, game_id: i64) -> Result<Vec<FbParsedPlay>> {
        let rel = self.engine.rel(&format!("parsed_pbp/{game_id}_parsed_pbp.csv"));
        if let Some(rows) = self
            .engine
            .cache
            .load_if_fresh::<FbParsedPlay>(&rel, cache::DAY)
        {
            return Ok(rows);
        }

        let plays = self.raw_pbp(game_id).await?;
        let Some(first) = plays.first() else {
            return Ok(Vec::new());
        };
        let meta_ids = (first.away_team_id, first.home_team_id);
        let meta = GameMeta {
            game_id,
            season: first.season,
            game_datetime: None,
            stadium_name: None,
            attendance: None,
            away_team_id: meta_ids.0,
            away_team_name: String::new(),
            home_team_id: meta_ids.1,
            home_team_name: String::new(),
        };
        let (away, home) = self.game_sides(&meta).await?;

        let mut directory = HashMap::new();
        for team_id in [meta_ids.0, meta_ids.1] {
            for member in self.engine.roster(team_id).await? {
                if let Some(player_id) = member.player_id {
                    directory.insert(text::normalize_name(&member.full_name), player_id);
                }
            }
        }
        let rows = parsed_plays(&plays, &away, &home, &directory);
        self.engine.cache.store(&rel, &rows)?;
        Ok(rows)
    }

    async fn game_sides(&self, meta: &GameMeta) -> Result<(SideCodes, SideCodes)> {
        let registry = self.team_codes().await?;
        let away_team = self.engine.find_team(meta.away_team_id).await?;
        let home_team = self.engine.find_team(meta.home_team_id).await?;
        Ok((
            SideCodes::new(&away_team, &registry),
            SideCodes::new(&home_team, &registry),
        ))
    }
}

/// Flattens the quarter drive groups into play rows. Quarter numbers are
/// positional but `start of ... quarter` rows can override them, which is
/// how overtime boxes announce themselves.
fn drive_rows(
    meta: &GameMeta,
    season: u16,
    quarters: &[Vec<Drive>],
    away: &SideCodes,
    home: &SideCodes,
) -> Vec<FbPlay> {
    let mut rows: Vec<FbPlay> = Vec::new();
    let mut drive_num: u16 = 0;
    let mut away_score: u16 = 0;
    let mut home_score: u16 = 0;
    let mut down: u8 = 0;
    let mut distance: u8 = 0;
    let mut spot = String::new();
    let mut clock: Option<u32> = None;

    for (idx, drives) in quarters.iter().enumerate() {
        let mut quarter_num = (idx + 1) as u8;
        for drive in drives {
            let Some((possession, defense)) = possession_of(&drive.team, meta) else {
                debug!(team = %drive.team, "drive logo names neither side");
                continue;
            };
            drive_num += 1;
            let (drive_result, drive_plays, drive_yards) = parse_drive_summary(&drive.summary);
            if let Some((a, h)) = pbp::parse_running_score(&drive.score) {
                away_score = a;
                home_score = h;
            }

            for row in &drive.plays {
                let play_text = scrub_play_text(&row.text, season, away, home);
                if let Some(caps) = CLOCK_RE.captures(&play_text) {
                    let minutes: u32 = caps[1].parse().unwrap_or(0);
                    let seconds: u32 = caps[2].parse().unwrap_or(0);
                    clock = Some(minutes * 60 + seconds);
                }
                if let Some(caps) = QUARTER_START_RE.captures(&play_text) {
                    quarter_num = quarter_token(&caps[1]).unwrap_or(quarter_num);
                }
                let is_overtime = quarter_num >= 5;

                // Untimed rows read `0th & 0 at` and keep the previous spot.
                if !row.down_distance.contains("0th & 0 at") {
                    if let Some(caps) = DOWN_DISTANCE_RE.captures(&row.down_distance) {
                        down = caps[1].parse().unwrap_or(0);
                        distance = caps[2].parse().unwrap_or(0);
                        spot = swap_school_codes(caps[3].trim(), away, home);
                    }
                }
                let spot_team_id = spot_side(&spot, away, home);
                let yardline_100 = yardline_100(&spot, spot_team_id, possession);
                let (quarter_s, half_s, game_s) = seconds_remaining(quarter_num, clock);

                rows.push(FbPlay {
                    game_id: meta.game_id,
                    season,
                    event_number: 0,
                    away_team_id: meta.away_team_id,
                    home_team_id: meta.home_team_id,
                    quarter_num,
                    is_overtime,
                    drive_num,
                    drive_result: drive_result.clone(),
                    drive_plays,
                    drive_yards,
                    drive_summary: drive.summary.clone(),
                    possession_team_id: possession,
                    defensive_team_id: defense,
                    away_score,
                    home_score,
                    quarter_seconds_remaining: quarter_s,
                    half_seconds_remaining: half_s,
                    game_seconds_remaining: game_s,
                    down,
                    distance,
                    spot: spot.clone(),
                    spot_team_id,
                    yardline_100,
                    play_text,
                });
            }
        }
    }

    for (i, row) in rows.iter_mut().enumerate() {
        row.event_number = (i + 1) as u32;
    }
    rows
}

/// Matches the logo alt text against the header team names. The alt is a
/// fragment of the full name ("Troy" for "Troy Trojans").
fn possession_of(team_fragment: &str, meta: &GameMeta) -> Option<(i64, i64)> {
    if team_fragment.is_empty() {
        return None;
    }
    if meta.away_team_name.contains(team_fragment) {
        return Some((meta.away_team_id, meta.home_team_id));
    }
    if meta.home_team_name.contains(team_fragment) {
        return Some((meta.home_team_id, meta.away_team_id));
    }
    None
}

/// `Punt 1:56, TROY25, 3 plays, 9 yards, 1:30` gives the result, play
/// count, and net yards. Unparseable summaries read as empty/zero.
fn parse_drive_summary(raw: &str) -> (String, u16, i16) {
    let Some(caps) = DRIVE_SUMMARY_RE.captures(raw) else {
        return (String::new(), 0, 0);
    };
    let result = caps[1].trim().to_string();
    let plays = caps[4].parse().unwrap_or(0);
    let yards = caps[5].parse().unwrap_or(0);
    (result, plays, yards)
}

/// Play text embeds season year strings and sometimes full uppercase
/// school names; both get in the way of spot and name parsing.
fn scrub_play_text(raw: &str, season: u16, away: &SideCodes, home: &SideCodes) -> String {
    let mut out = text::clean_text(raw);
    out = out.replace(&season.to_string(), "");
    out = out.replace(&(season + 1).to_string(), "");
    out = swap_school_codes(&out, away, home);
    text::clean_text(&out)
}

fn swap_school_codes(raw: &str, away: &SideCodes, home: &SideCodes) -> String {
    let mut out = raw.to_string();
    for side in [home, away] {
        if let Some(code) = side.primary() {
            let upper = side.school_name.to_uppercase();
            if !upper.is_empty() {
                out = out.replace(&upper, code);
            }
        }
    }
    out
}

/// `2nd` gives 2; any overtime token gives 5.
fn quarter_token(token: &str) -> Option<u8> {
    if token.to_lowercase().contains("ot") {
        return Some(5);
    }
    token.chars().next()?.to_digit(10).map(|d| d as u8)
}

/// Clock seconds mapped to quarter/half/game time remaining. Overtime is
/// untimed, so all three read zero there.
fn seconds_remaining(quarter_num: u8, clock: Option<u32>) -> (u16, u16, u16) {
    let Some(s) = clock else {
        return (0, 0, 0);
    };
    let s = s as u16;
    match quarter_num {
        1 => (s, 900 + s, 2700 + s),
        2 => (s, s, 1800 + s),
        3 => (s, 900 + s, 900 + s),
        4 => (s, s, s),
        _ => (0, 0, 0),
    }
}

/// Digits of a spot, reading glued groups the way the site writes them:
/// four digits are two spots mashed together, three are a spot against a
/// single-digit yardline.
fn spot_number(spot: &str) -> Option<u8> {
    let digits = SPOT_NUM_RE.find_iter(spot).last()?.as_str();
    let digits = match digits.len() {
        4 => &digits[..2],
        3 => &digits[..1],
        _ => digits,
    };
    digits.parse().ok()
}

/// Distance from the opponent's goal line: own goal line is 100, the
/// opponent's is 0. Midfield is 50 from either side, so a bare `50`
/// resolves without knowing the side.
fn yardline_100(spot: &str, spot_team_id: Option<i64>, possession_team_id: i64) -> Option<u8> {
    let lower = spot.to_lowercase();
    if lower.contains("end zone") {
        return match spot_team_id {
            Some(id) if id == possession_team_id => Some(100),
            Some(_) => Some(0),
            None => None,
        };
    }
    let n = spot_number(spot)?;
    match spot_team_id {
        Some(id) if id == possession_team_id => Some(100 - n.min(100)),
        Some(_) => Some(n.min(100)),
        None if n == 50 => Some(50),
        None => None,
    }
}

fn clean_name(raw: &str) -> Option<String> {
    let name = text::clean_text(raw);
    let name = name
        .trim_matches(|c: char| c == '.' || c == ',' || c.is_whitespace())
        .to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Yardage from the gain/loss capture pair; the bare `no gain` wording
/// leaves both empty.
fn signed_yards(gain: Option<&str>, loss: Option<&str>) -> Option<i16> {
    if let Some(g) = gain {
        return g.parse().ok();
    }
    if let Some(l) = loss {
        return l.parse::<i16>().ok().map(|n| -n);
    }
    Some(0)
}

fn trailing_tacklers(text: &str) -> Option<String> {
    TACKLERS_RE
        .captures(text.trim())
        .map(|c| c[1].trim().to_string())
}

fn kick_good(result: &str) -> bool {
    let lower = result.to_lowercase();
    lower.contains("good") && !lower.contains("no good")
}

/// Rows that narrate the game rather than a snap: quarter and half
/// markers, the coin toss, clock notes, possession notes, and QB checks.
fn is_chrome(lower: &str) -> bool {
    lower.contains("drive start")
        || lower.contains("end of half")
        || lower.contains("end of game")
        || (lower.contains("end of") && lower.contains("quarter"))
        || (lower.contains("start of") && lower.contains("quarter"))
        || lower.contains("won the toss")
        || (lower.contains("will receive") && lower.contains("will defend"))
        || lower.contains("ball on")
        || lower.contains("at qb for")
        || DOWN_AND_FILLER_RE.is_match(lower)
        || CLOCK_FILLER_RE.is_match(lower)
}

fn defense_of<'a>(raw: &FbPlay, away: &'a SideCodes, home: &'a SideCodes) -> &'a SideCodes {
    if raw.defensive_team_id == away.team_id {
        away
    } else {
        home
    }
}

/// Classifies the whole game, resolving player names against the roster
/// directory and recomputing the running score from scoring plays.
fn parsed_plays(
    plays: &[FbPlay],
    away: &SideCodes,
    home: &SideCodes,
    directory: &HashMap<String, i64>,
) -> Vec<FbParsedPlay> {
    let mut away_post: u16 = 0;
    let mut home_post: u16 = 0;
    let mut rows = Vec::with_capacity(plays.len());
    for raw in plays {
        let mut play = parse_play(raw, defense_of(raw, away, home));
        resolve_players(&mut play, directory);

        let points = scored_points(&play);
        if points > 0 && !play.is_no_play {
            if raw.possession_team_id == raw.away_team_id {
                away_post = away_post.saturating_add(points);
            } else {
                home_post = home_post.saturating_add(points);
            }
        }
        play.away_score_post = away_post;
        play.home_score_post = home_post;
        rows.push(play);
    }
    rows
}

/// Classifies one row. The first matching family wins, mirroring how the
/// site phrases plays; penalty details are layered on afterwards because
/// a flag can ride on any play.
fn parse_play(raw: &FbPlay, defense: &SideCodes) -> FbParsedPlay {
    let mut play = FbParsedPlay::from_raw(raw);
    let mut text = raw.play_text.clone();

    // Encoding artifacts: a mangled colon byte and a spelled-out midfield.
    if text.contains("3a") {
        text = text.replace("3a", ";");
    }
    text = text.replace("50 yardline", "50");

    let mut lower = text.to_lowercase();
    if lower.contains("shotgun") {
        play.is_shotgun = true;
    }
    if lower.contains("no huddle") {
        play.is_no_huddle = true;
    }
    if play.is_shotgun || play.is_no_huddle {
        text = SHOTGUN_RE.replace_all(&text, "").into_owned();
    }
    if lower.contains("no play") {
        play.is_no_play = true;
    }
    if lower.contains("first down") || lower.contains("1st down") {
        play.is_first_down = true;
    }
    text = FIRST_DOWN_RE.replace_all(&text, "").into_owned();
    text = YARDS_GAIN_PAREN_RE.replace_all(&text, "yards gain").into_owned();
    text = QB_HURRY_RE.replace_all(&text, "").into_owned();
    lower = text.to_lowercase();

    play.is_touchdown = lower.contains("touchdown");
    play.is_touchback = lower.contains("touchback");
    play.is_fumble = lower.contains("fumble");
    play.is_fair_catch = lower.contains("fair catch");

    if is_chrome(&lower) {
        // Narration only; nothing to classify.
    } else if lower.contains("injury timeout") {
        // Stoppage, not a charged timeout.
    } else if lower.contains("timeout") {
        play.is_timeout = true;
        play.timeout_team = TIMEOUT_RE
            .captures(&text)
            .and_then(|c| clean_name(&c[1]));
    } else if lower.contains("kneel down") {
        play.play_type = Some(FbPlayType::Kneel);
        if let Some(c) = KNEEL_RE.captures(&text) {
            play.rusher_name = clean_name(&c[1]);
            play.yards_gained = c
                .get(3)
                .and_then(|m| m.as_str().parse::<i16>().ok())
                .map(|n| -n);
        }
    } else if lower.contains("spike") {
        play.play_type = Some(FbPlayType::Spike);
        play.is_incomplete_pass = true;
        play.yards_gained = Some(0);
        if let Some(c) = SPIKE_RE.captures(&text) {
            play.passer_name = clean_name(&c[1]);
        }
    } else if lower.contains("pass intercepted") {
        play.play_type = Some(FbPlayType::Pass);
        play.is_interception = true;
        play.is_turnover = true;
        if let Some(c) = INTERCEPT_RE.captures(&text) {
            play.passer_name = clean_name(&c[1]);
            play.interceptor_name = clean_name(&c[2]);
        }
        if let Some(c) = RETURN_YARDS_RE.captures(&text) {
            play.return_yards = c[1].parse().ok();
        }
        play.tackler_names = trailing_tacklers(&text);
    } else if lower.contains("sacked") {
        play.play_type = Some(FbPlayType::Sack);
        if let Some(c) = SACK_RE.captures(&text) {
            play.passer_name = clean_name(&c[1]);
            play.yards_gained = c[2].parse::<i16>().ok().map(|n| -n.abs());
            play.tackler_names = c.get(3).map(|m| m.as_str().trim().to_string());
        }
    } else if lower.contains("pass complete") {
        play.play_type = Some(FbPlayType::Pass);
        play.is_complete_pass = true;
        if let Some(c) = PASS_COMPLETE_RE.captures(&text) {
            play.passer_name = clean_name(&c[1]);
            play.receiver_name = clean_name(&c[2]);
            play.yards_gained = signed_yards(
                c.get(3).map(|m| m.as_str()),
                c.get(4).map(|m| m.as_str()),
            );
        }
        play.tackler_names = trailing_tacklers(&text);
    } else if lower.contains("pass incomplete") {
        play.play_type = Some(FbPlayType::Pass);
        play.is_incomplete_pass = true;
        play.yards_gained = Some(0);
        if let Some(c) = PASS_INCOMPLETE_RE.captures(&text) {
            play.passer_name = clean_name(&c[1]);
            // `thrown to TROY35` names a spot, not a receiver.
            if !lower.contains("thrown to") {
                play.receiver_name = c.get(2).and_then(|m| clean_name(m.as_str()));
            }
        }
    } else if lower.contains("pass attempt") || lower.contains("rush attempt") {
        play.play_type = Some(FbPlayType::PointAfter);
        if let Some(c) = TWO_POINT_RE.captures(&text) {
            let result = c[4].to_lowercase();
            let success = kick_good(&result) || result.contains("success");
            play.two_point_result =
                Some(if success { "success" } else { "failure" }.to_string());
            if c[2].to_lowercase() == "pass" {
                play.passer_name = clean_name(&c[1]);
                play.receiver_name = c.get(3).and_then(|m| clean_name(m.as_str()));
            } else {
                play.rusher_name = clean_name(&c[1]);
            }
        }
    } else if lower.contains("rush") {
        play.play_type = Some(FbPlayType::Rush);
        if let Some(c) = RUSH_RE.captures(&text) {
            play.rusher_name = clean_name(&c[1]);
            play.yards_gained = signed_yards(
                c.get(2).map(|m| m.as_str()),
                c.get(3).map(|m| m.as_str()),
            );
        }
        play.tackler_names = trailing_tacklers(&text);
    } else if lower.contains("kickoff") {
        play.play_type = Some(FbPlayType::Kickoff);
        if let Some(c) = KICKOFF_RE.captures(&text) {
            play.kicker_name = clean_name(&c[1]);
            play.kick_distance = c[2].parse().ok();
        }
        apply_return(&mut play, &text);
    } else if lower.contains("punt") {
        play.play_type = Some(FbPlayType::Punt);
        if let Some(c) = PUNT_RE.captures(&text) {
            play.kicker_name = clean_name(&c[1]);
            play.kick_distance = c[2].parse().ok();
        }
        apply_return(&mut play, &text);
    } else if lower.contains("field goal attempt") {
        play.play_type = Some(FbPlayType::FieldGoal);
        if let Some(c) = FG_RE.captures(&text) {
            play.kicker_name = clean_name(&c[1]);
            play.kick_distance = c[2].parse().ok();
            play.field_goal_result = Some(c[3].trim().to_lowercase());
        }
    } else if lower.contains("kick attempt") {
        play.play_type = Some(FbPlayType::PointAfter);
        if let Some(c) = PAT_RE.captures(&text) {
            play.kicker_name = clean_name(&c[1]);
            play.extra_point_result = Some(c[2].trim().to_lowercase());
        }
    } else if lower.contains("penalty") {
        play.play_type = Some(FbPlayType::Penalty);
    } else {
        debug!(text = %text, "unclassified football play");
    }

    if lower.contains("penalty") {
        play.is_penalty = true;
        if let Some(c) = PENALTY_DECLINED_RE.captures(&text) {
            play.penalty_team = Some(c[1].trim().to_string());
            play.penalty_type = Some(c[2].trim().to_string());
        } else if let Some(c) = PENALTY_RE.captures(&text) {
            play.penalty_team = Some(c[1].trim().to_string());
            play.penalty_type = Some(c[2].trim().to_string());
            play.penalty_player_name = c.get(3).and_then(|m| clean_name(m.as_str()));
            play.penalty_yards = c[4].parse().ok();
        }
        // Off-setting flags carry no distance; the flag alone is kept.
    }

    if play.is_fumble && !play.is_turnover {
        if let Some(c) = FUMBLE_RECOVERY_RE.captures(&text) {
            let token = &c[1];
            if defense.codes.iter().any(|code| token.eq_ignore_ascii_case(code)) {
                play.is_turnover = true;
            }
        }
    }

    if play.is_no_play {
        play.play_type = Some(FbPlayType::NoPlay);
    }

    play
}

fn apply_return(play: &mut FbParsedPlay, text: &str) {
    if play.is_fair_catch {
        play.returner_name = FAIR_CATCH_RE.captures(text).and_then(|c| clean_name(&c[1]));
        play.return_yards = Some(0);
    } else if let Some(c) = RETURNER_RE.captures(text) {
        play.returner_name = clean_name(&c[1]);
        play.return_yards = c[2].parse().ok();
        play.tackler_names = trailing_tacklers(text);
    }
}

fn resolve_players(play: &mut FbParsedPlay, directory: &HashMap<String, i64>) {
    play.passer_id = resolve(directory, &play.passer_name);
    play.receiver_id = resolve(directory, &play.receiver_name);
    play.rusher_id = resolve(directory, &play.rusher_name);
    play.interceptor_id = resolve(directory, &play.interceptor_name);
    play.kicker_id = resolve(directory, &play.kicker_name);
    play.returner_id = resolve(directory, &play.returner_name);
}

fn resolve(directory: &HashMap<String, i64>, name: &Option<String>) -> Option<i64> {
    name.as_deref()
        .and_then(|n| directory.get(&text::normalize_name(n)).copied())
}

/// Points a classified play is worth to the possession side. Defensive
/// and return touchdowns are left to the drive headers, which carry the
/// official running score.
fn scored_points(play: &FbParsedPlay) -> u16 {
    match play.play_type {
        Some(FbPlayType::Pass) | Some(FbPlayType::Rush)
            if play.is_touchdown && !play.is_interception && !play.is_fumble =>
        {
            6
        }
        Some(FbPlayType::FieldGoal) => {
            if play.field_goal_result.as_deref().is_some_and(kick_good) {
                3
            } else {
                0
            }
        }
        Some(FbPlayType::PointAfter) => {
            if play.extra_point_result.as_deref().is_some_and(kick_good) {
                1
            } else if play.two_point_result.as_deref() == Some("success") {
                2
            } else {
                0
            }
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::drives::PlayRow;

    fn registry() -> Vec<TeamCode> {
        vec![
            TeamCode {
                school_id: 1,
                nfs_code: "TRY".to_string(),
                club_code: "TROY".to_string(),
                club_code_2: String::new(),
            },
            TeamCode {
                school_id: 2,
                nfs_code: String::new(),
                club_code: "USA".to_string(),
                club_code_2: "SALA".to_string(),
            },
        ]
    }

    fn team(team_id: i64, school_id: i64, name: &str) -> Team {
        Team {
            season: 2024,
            division: Division::Fbs,
            sport_code: "MFB".to_string(),
            team_id,
            school_id: Some(school_id),
            school_name: name.to_string(),
            conference: Some("Sun Belt".to_string()),
        }
    }

    fn sides() -> (SideCodes, SideCodes) {
        let registry = registry();
        (
            SideCodes::new(&team(100, 1, "Troy"), &registry),
            SideCodes::new(&team(200, 2, "South Alabama"), &registry),
        )
    }

    fn meta() -> GameMeta {
        GameMeta {
            game_id: 5362152,
            season: 2024,
            game_datetime: None,
            stadium_name: None,
            attendance: None,
            away_team_id: 100,
            away_team_name: "Troy".to_string(),
            home_team_id: 200,
            home_team_name: "South Alabama".to_string(),
        }
    }

    fn raw_play(text: &str) -> FbPlay {
        FbPlay {
            game_id: 5362152,
            season: 2024,
            event_number: 1,
            away_team_id: 100,
            home_team_id: 200,
            quarter_num: 1,
            is_overtime: false,
            drive_num: 1,
            drive_result: "Punt".to_string(),
            drive_plays: 3,
            drive_yards: 9,
            drive_summary: String::new(),
            possession_team_id: 100,
            defensive_team_id: 200,
            away_score: 0,
            home_score: 0,
            quarter_seconds_remaining: 900,
            half_seconds_remaining: 1800,
            game_seconds_remaining: 3600,
            down: 1,
            distance: 10,
            spot: "TROY25".to_string(),
            spot_team_id: Some(100),
            yardline_100: Some(75),
            play_text: text.to_string(),
        }
    }

    fn classify(text: &str) -> FbParsedPlay {
        let (_, home) = sides();
        parse_play(&raw_play(text), &home)
    }

    #[test]
    fn test_parse_team_codes_reads_mirror_headers() {
        let body = "NCAA ID,School,NFS Team Code,Club Code,Club Code 2\n\
                    746,Troy,TRY,TROY,\n\
                    26,South Alabama,USA,USA,SALA\n";
        let codes = parse_team_codes(body).unwrap();
        assert_eq!(codes.len(), 2);
        assert_eq!(codes[0].school_id, 746);
        assert_eq!(codes[0].club_code, "TROY");
        assert_eq!(codes[0].club_code_2, "");
        assert_eq!(codes[1].club_code_2, "SALA");
    }

    #[test]
    fn test_fallback_codes_fill_gaps_only() {
        let codes = with_fallback_codes(vec![
            TeamCode {
                school_id: 114,
                nfs_code: String::new(),
                club_code: "CAL".to_string(),
                club_code_2: String::new(),
            },
            TeamCode {
                school_id: 241,
                nfs_code: String::new(),
                club_code: String::new(),
                club_code_2: String::new(),
            },
        ]);

        // A present code is kept, a blank one is filled, missing schools
        // are appended.
        let calvin = codes.iter().find(|c| c.school_id == 114).unwrap();
        assert_eq!(calvin.club_code, "CAL");
        let franklin_pierce = codes.iter().find(|c| c.school_id == 241).unwrap();
        assert_eq!(franklin_pierce.club_code, "FPU");
        let wheeling = codes.iter().find(|c| c.school_id == 12799).unwrap();
        assert_eq!(wheeling.club_code, "WHL");
        assert_eq!(codes.iter().filter(|c| c.school_id == 114).count(), 1);
    }

    #[test]
    fn test_side_codes_order_and_dedup() {
        let registry = vec![TeamCode {
            school_id: 9,
            nfs_code: "USA".to_string(),
            club_code: "USA".to_string(),
            club_code_2: "SALA".to_string(),
        }];
        let side = SideCodes::new(&team(200, 9, "South Alabama"), &registry);
        assert_eq!(side.codes, vec!["USA".to_string(), "SALA".to_string()]);
        assert_eq!(side.primary(), Some("USA"));

        let no_row = SideCodes::new(&team(300, 77, "Nowhere"), &registry);
        assert!(no_row.codes.is_empty());
        assert_eq!(no_row.primary(), None);
    }

    #[test]
    fn test_spot_side_waterfall() {
        let (away, home) = sides();
        assert_eq!(spot_side("TROY35", &away, &home), Some(100));
        assert_eq!(spot_side("USA20", &away, &home), Some(200));
        assert_eq!(spot_side("SALA44", &away, &home), Some(200));
        // Two-letter prefix only matches after full codes fail.
        assert_eq!(spot_side("TR9", &away, &home), Some(100));
        assert_eq!(spot_side("50", &away, &home), None);
    }

    #[test]
    fn test_yardline_from_either_side() {
        assert_eq!(yardline_100("TROY25", Some(100), 100), Some(75));
        assert_eq!(yardline_100("USA30", Some(200), 100), Some(30));
        assert_eq!(yardline_100("TROY end zone", Some(100), 100), Some(100));
        assert_eq!(yardline_100("USA end zone", Some(200), 100), Some(0));
        assert_eq!(yardline_100("50", None, 100), Some(50));
        assert_eq!(yardline_100("OU35", None, 100), None);
        // Glued digit groups keep the leading spot.
        assert_eq!(yardline_100("TROY2531", Some(100), 100), Some(75));
    }

    #[test]
    fn test_drive_summary_fields() {
        let (result, plays, yards) =
            parse_drive_summary("Punt 1:56, TROY25, 3 plays, 9 yards, 1:30");
        assert_eq!(result, "Punt");
        assert_eq!(plays, 3);
        assert_eq!(yards, 9);

        let (result, plays, yards) =
            parse_drive_summary("Touchdown 0:44, USA20, 8 plays, -80 yards, 3:10");
        assert_eq!(result, "Touchdown");
        assert_eq!(plays, 8);
        assert_eq!(yards, -80);

        assert_eq!(parse_drive_summary("garbled"), (String::new(), 0, 0));
    }

    #[test]
    fn test_seconds_remaining_by_quarter() {
        assert_eq!(seconds_remaining(1, Some(900)), (900, 1800, 3600));
        assert_eq!(seconds_remaining(2, Some(120)), (120, 120, 1920));
        assert_eq!(seconds_remaining(3, Some(454)), (454, 1354, 1354));
        assert_eq!(seconds_remaining(4, Some(61)), (61, 61, 61));
        assert_eq!(seconds_remaining(5, Some(900)), (0, 0, 0));
        assert_eq!(seconds_remaining(2, None), (0, 0, 0));
    }

    #[test]
    fn test_drive_rows_context() {
        let (away, home) = sides();
        let quarters = vec![
            vec![
                Drive {
                    team: "Troy".to_string(),
                    summary: "Punt 11:56, TROY25, 3 plays, 9 yards, 1:30".to_string(),
                    score: "0-0".to_string(),
                    plays: vec![
                        PlayRow {
                            down_distance: "1st & 10 at TROY25".to_string(),
                            text: "15:00 Jon Doe rush for 4 yards to the TROY29 (Al Roe).".to_string(),
                        },
                        PlayRow {
                            down_distance: "0th & 0 at".to_string(),
                            text: "Timeout Troy.".to_string(),
                        },
                    ],
                },
                Drive {
                    team: "South Alabama".to_string(),
                    summary: "Touchdown 8:12, USA30, 5 plays, 70 yards, 2:44".to_string(),
                    score: "0-7".to_string(),
                    plays: vec![PlayRow {
                        down_distance: "1st & 10 at USA30".to_string(),
                        text: "11:56 Jim Poe rush for 70 yards to the TROY0, TOUCHDOWN.".to_string(),
                    }],
                },
            ],
            vec![Drive {
                team: "Troy".to_string(),
                summary: "Downs 2:00, TROY40, 4 plays, 12 yards, 2:02".to_string(),
                score: "bad".to_string(),
                plays: vec![PlayRow {
                    down_distance: "1st & 10 at TROY40".to_string(),
                    text: "14:10 Jon Doe pass incomplete.".to_string(),
                }],
            }],
        ];

        let rows = drive_rows(&meta(), 2024, &quarters, &away, &home);
        assert_eq!(rows.len(), 4);

        let first = &rows[0];
        assert_eq!(first.event_number, 1);
        assert_eq!(first.quarter_num, 1);
        assert_eq!(first.drive_num, 1);
        assert_eq!(first.possession_team_id, 100);
        assert_eq!(first.defensive_team_id, 200);
        assert_eq!(first.drive_result, "Punt");
        assert_eq!(first.drive_plays, 3);
        assert_eq!(first.down, 1);
        assert_eq!(first.spot, "TROY25");
        assert_eq!(first.yardline_100, Some(75));
        assert_eq!(first.quarter_seconds_remaining, 900);
        assert_eq!(first.game_seconds_remaining, 3600);

        // Untimed rows carry the previous spot and clock forward.
        let timeout = &rows[1];
        assert_eq!(timeout.spot, "TROY25");
        assert_eq!(timeout.quarter_seconds_remaining, 900);

        let td = &rows[2];
        assert_eq!(td.drive_num, 2);
        assert_eq!(td.possession_team_id, 200);
        assert_eq!(td.away_score, 0);
        assert_eq!(td.home_score, 7);
        assert_eq!(td.yardline_100, Some(70));
        assert_eq!(td.quarter_seconds_remaining, 716);

        // A garbled drive score keeps the previous one; the second
        // quarter box bumps the quarter number.
        let q2 = &rows[3];
        assert_eq!(q2.quarter_num, 2);
        assert_eq!(q2.home_score, 7);
        assert_eq!(q2.game_seconds_remaining, 1800 + 850);
    }

    #[test]
    fn test_overtime_box_and_marker_rows() {
        let (away, home) = sides();
        let quarters = vec![
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            vec![Drive {
                team: "Troy".to_string(),
                summary: "Field Goal 0:00, USA25, 4 plays, 17 yards, 0:00".to_string(),
                score: "24-24".to_string(),
                plays: vec![PlayRow {
                    down_distance: "1st & 10 at USA25".to_string(),
                    text: "Jon Doe rush for 9 yards to the USA16 (Al Roe).".to_string(),
                }],
            }],
        ];
        let rows = drive_rows(&meta(), 2024, &quarters, &away, &home);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quarter_num, 5);
        assert!(rows[0].is_overtime);
        assert_eq!(rows[0].quarter_seconds_remaining, 0);

        let marker = raw_play("Start of 3rd quarter, clock 15:00.");
        let quarters = vec![vec![Drive {
            team: "Troy".to_string(),
            summary: "Punt 11:56, TROY25, 3 plays, 9 yards, 1:30".to_string(),
            score: "0-0".to_string(),
            plays: vec![PlayRow {
                down_distance: "0th & 0 at".to_string(),
                text: marker.play_text.clone(),
            }],
        }]];
        let rows = drive_rows(&meta(), 2024, &quarters, &away, &home);
        assert_eq!(rows[0].quarter_num, 3);
        assert!(!rows[0].is_overtime);
    }

    #[test]
    fn test_classify_pass_complete() {
        let play = classify(
            "14:21 Doe,Jon pass complete short right to Moe,Ed for 12 yards to the USA43, 1ST DOWN TROY (Roe,Al).",
        );
        assert_eq!(play.play_type, Some(FbPlayType::Pass));
        assert!(play.is_complete_pass);
        assert!(play.is_first_down);
        assert_eq!(play.passer_name.as_deref(), Some("Doe,Jon"));
        assert_eq!(play.receiver_name.as_deref(), Some("Moe,Ed"));
        assert_eq!(play.yards_gained, Some(12));
        assert_eq!(play.tackler_names.as_deref(), Some("Roe,Al"));
        assert!(!play.is_touchdown);
    }

    #[test]
    fn test_classify_pass_incomplete_and_thrown_to_spot() {
        let play = classify("14:21 Doe,Jon pass incomplete to Moe,Ed (Roe,Al).");
        assert_eq!(play.play_type, Some(FbPlayType::Pass));
        assert!(play.is_incomplete_pass);
        assert_eq!(play.yards_gained, Some(0));
        assert_eq!(play.receiver_name.as_deref(), Some("Moe,Ed"));

        let spot_only = classify("Doe,Jon pass incomplete thrown to USA35.");
        assert!(spot_only.is_incomplete_pass);
        assert_eq!(spot_only.receiver_name, None);
    }

    #[test]
    fn test_classify_interception_is_turnover() {
        let play = classify(
            "Doe,Jon pass intercepted by Poe,Jim at the USA20, Poe,Jim return 15 yards to the USA35 (Moe,Ed).",
        );
        assert_eq!(play.play_type, Some(FbPlayType::Pass));
        assert!(play.is_interception);
        assert!(play.is_turnover);
        assert_eq!(play.passer_name.as_deref(), Some("Doe,Jon"));
        assert_eq!(play.interceptor_name.as_deref(), Some("Poe,Jim"));
        assert_eq!(play.return_yards, Some(15));
    }

    #[test]
    fn test_classify_sack_negates_yards() {
        let play = classify("Doe,Jon sacked for loss of 7 yards to the TROY18 (Poe,Jim; Roe,Al).");
        assert_eq!(play.play_type, Some(FbPlayType::Sack));
        assert_eq!(play.yards_gained, Some(-7));
        assert_eq!(play.passer_name.as_deref(), Some("Doe,Jon"));
        assert_eq!(play.tackler_names.as_deref(), Some("Poe,Jim; Roe,Al"));
    }

    #[test]
    fn test_classify_rush_variants() {
        let gain = classify("Doe,Jon rush for 4 yards gain to the TROY29 (Roe,Al).");
        assert_eq!(gain.play_type, Some(FbPlayType::Rush));
        assert_eq!(gain.rusher_name.as_deref(), Some("Doe,Jon"));
        assert_eq!(gain.yards_gained, Some(4));

        let none = classify("Doe,Jon rush for no gain to the TROY25 (Roe,Al).");
        assert_eq!(none.yards_gained, Some(0));

        let loss = classify("Doe,Jon rush up the middle for loss of 3 yards to the TROY22 (Roe,Al).");
        assert_eq!(loss.yards_gained, Some(-3));

        let td = classify("Doe,Jon rush for 70 yards to the USA0, TOUCHDOWN.");
        assert!(td.is_touchdown);
    }

    #[test]
    fn test_classify_rush_fumble_recovered_by_defense() {
        let lost = classify(
            "Doe,Jon rush for 2 yards to the TROY27, fumble forced by Poe,Jim, fumble by Doe,Jon recovered by USA Poe,Jim at TROY30.",
        );
        assert_eq!(lost.play_type, Some(FbPlayType::Rush));
        assert!(lost.is_fumble);
        assert!(lost.is_turnover);

        let kept = classify(
            "Doe,Jon rush for 2 yards to the TROY27, fumble by Doe,Jon recovered by TROY Moe,Ed at TROY26.",
        );
        assert!(kept.is_fumble);
        assert!(!kept.is_turnover);
    }

    #[test]
    fn test_classify_kickoff_and_returns() {
        let touchback = classify("Roe,Al kickoff 65 yards to the TROY0, touchback.");
        assert_eq!(touchback.play_type, Some(FbPlayType::Kickoff));
        assert_eq!(touchback.kicker_name.as_deref(), Some("Roe,Al"));
        assert_eq!(touchback.kick_distance, Some(65));
        assert!(touchback.is_touchback);
        assert_eq!(touchback.return_yards, None);

        let returned =
            classify("Roe,Al kickoff 61 yards to the TROY4, Doe,Jon return 27 yards to the TROY31 (Poe,Jim).");
        assert_eq!(returned.returner_name.as_deref(), Some("Doe,Jon"));
        assert_eq!(returned.return_yards, Some(27));
        assert_eq!(returned.tackler_names.as_deref(), Some("Poe,Jim"));
    }

    #[test]
    fn test_classify_punt_fair_catch() {
        let play = classify("Doe,Jon punt 44 yards to the USA12, fair catch by Poe,Jim at the USA12.");
        assert_eq!(play.play_type, Some(FbPlayType::Punt));
        assert_eq!(play.kicker_name.as_deref(), Some("Doe,Jon"));
        assert_eq!(play.kick_distance, Some(44));
        assert!(play.is_fair_catch);
        assert_eq!(play.returner_name.as_deref(), Some("Poe,Jim"));
        assert_eq!(play.return_yards, Some(0));
    }

    #[test]
    fn test_classify_field_goal_results() {
        let good = classify("Roe,Al field goal attempt from 38 yards GOOD (H: Doe,Jon, LS: Moe,Ed).");
        assert_eq!(good.play_type, Some(FbPlayType::FieldGoal));
        assert_eq!(good.kicker_name.as_deref(), Some("Roe,Al"));
        assert_eq!(good.kick_distance, Some(38));
        assert_eq!(good.field_goal_result.as_deref(), Some("good"));
        assert_eq!(scored_points(&good), 3);

        let missed = classify("Roe,Al field goal attempt from 52 yards NO GOOD.");
        assert_eq!(missed.field_goal_result.as_deref(), Some("no good"));
        assert_eq!(scored_points(&missed), 0);
    }

    #[test]
    fn test_classify_point_after_kick() {
        let good = classify("Roe,Al kick attempt good (H: Doe,Jon, LS: Moe,Ed).");
        assert_eq!(good.play_type, Some(FbPlayType::PointAfter));
        assert_eq!(good.extra_point_result.as_deref(), Some("good"));
        assert_eq!(scored_points(&good), 1);

        // A missed try is worth nothing.
        let failed = classify("Roe,Al kick attempt failed.");
        assert_eq!(failed.extra_point_result.as_deref(), Some("failed"));
        assert_eq!(scored_points(&failed), 0);
    }

    #[test]
    fn test_classify_two_point_tries() {
        let good = classify("Doe,Jon pass attempt to Moe,Ed good.");
        assert_eq!(good.play_type, Some(FbPlayType::PointAfter));
        assert_eq!(good.two_point_result.as_deref(), Some("success"));
        assert_eq!(good.passer_name.as_deref(), Some("Doe,Jon"));
        assert_eq!(good.receiver_name.as_deref(), Some("Moe,Ed"));
        assert_eq!(scored_points(&good), 2);

        let failed = classify("Doe,Jon rush attempt failed.");
        assert_eq!(failed.two_point_result.as_deref(), Some("failure"));
        assert_eq!(failed.rusher_name.as_deref(), Some("Doe,Jon"));
        assert_eq!(scored_points(&failed), 0);
    }

    #[test]
    fn test_classify_penalty_layers() {
        let standalone = classify("PENALTY USA offside 5 yards from USA35 to USA30.");
        assert_eq!(standalone.play_type, Some(FbPlayType::Penalty));
        assert!(standalone.is_penalty);
        assert_eq!(standalone.penalty_team.as_deref(), Some("USA"));
        assert_eq!(standalone.penalty_type.as_deref(), Some("offside"));
        assert_eq!(standalone.penalty_yards, Some(5));

        let on_a_rush = classify(
            "Doe,Jon rush for 8 yards to the TROY33. PENALTY TROY holding (Moe,Ed) 10 yards from TROY33 to TROY23. NO PLAY.",
        );
        assert!(on_a_rush.is_penalty);
        assert!(on_a_rush.is_no_play);
        assert_eq!(on_a_rush.play_type, Some(FbPlayType::NoPlay));
        assert_eq!(on_a_rush.penalty_player_name.as_deref(), Some("Moe,Ed"));
        assert_eq!(on_a_rush.penalty_yards, Some(10));
        assert_eq!(on_a_rush.rusher_name.as_deref(), Some("Doe,Jon"));

        let declined = classify("Doe,Jon rush for 9 yards to the TROY34. PENALTY USA offside declined.");
        assert_eq!(declined.play_type, Some(FbPlayType::Rush));
        assert!(declined.is_penalty);
        assert_eq!(declined.penalty_type.as_deref(), Some("offside"));
        assert_eq!(declined.penalty_yards, None);
    }

    #[test]
    fn test_classify_kneel_and_spike() {
        let kneel = classify("Kneel down by Doe,Jon at TROY24 for loss of 1 yard.");
        assert_eq!(kneel.play_type, Some(FbPlayType::Kneel));
        assert_eq!(kneel.rusher_name.as_deref(), Some("Doe,Jon"));
        assert_eq!(kneel.yards_gained, Some(-1));

        let spike = classify("Doe,Jon spike.");
        assert_eq!(spike.play_type, Some(FbPlayType::Spike));
        assert!(spike.is_incomplete_pass);
        assert_eq!(spike.passer_name.as_deref(), Some("Doe,Jon"));
    }

    #[test]
    fn test_classify_timeout_and_chrome() {
        let timeout = classify("Timeout South Alabama, clock 05:33.");
        assert!(timeout.is_timeout);
        assert_eq!(timeout.play_type, None);
        assert_eq!(timeout.timeout_team.as_deref(), Some("South Alabama"));

        let injury = classify("Injury timeout, clock 05:33.");
        assert!(!injury.is_timeout);

        for chrome in [
            "TROY drive start at 15:00.",
            "Start of 2nd quarter, clock 15:00.",
            "End of half, clock 00:00.",
            "End of game, clock 00:00.",
            "Troy won the toss and deferred.",
            "TROY will receive; USA will defend the south end zone.",
            "1st and 10.",
            "Clock 00:38.",
            "Doe,Jon at QB for Troy.",
        ] {
            let play = classify(chrome);
            assert_eq!(play.play_type, None, "`{chrome}` should stay chrome");
            assert!(!play.is_timeout);
        }
    }

    #[test]
    fn test_classify_shotgun_strip_keeps_rush_parse() {
        let play = classify("Shotgun-No Huddle Doe,Jon rush for 6 yards to the TROY31 (Roe,Al).");
        assert!(play.is_shotgun);
        assert!(play.is_no_huddle);
        assert_eq!(play.play_type, Some(FbPlayType::Rush));
        assert_eq!(play.rusher_name.as_deref(), Some("Doe,Jon"));
        assert_eq!(play.yards_gained, Some(6));
    }

    #[test]
    fn test_parsed_plays_scores_and_ids() {
        let (away, home) = sides();
        let mut directory = HashMap::new();
        directory.insert("jon doe".to_string(), 111_i64);
        directory.insert("jim poe".to_string(), 222_i64);

        let mut td = raw_play("Doe,Jon rush for 70 yards to the USA0, TOUCHDOWN.");
        td.event_number = 1;
        let mut pat = raw_play("Roe,Al kick attempt good (H: Doe,Jon, LS: Moe,Ed).");
        pat.event_number = 2;
        let mut home_td = raw_play("Poe,Jim pass complete to Moe,Ed for 21 yards to the TROY0, TOUCHDOWN.");
        home_td.event_number = 3;
        home_td.possession_team_id = 200;
        home_td.defensive_team_id = 100;
        let mut failed_pat = raw_play("Roe,Al kick attempt failed.");
        failed_pat.event_number = 4;
        failed_pat.possession_team_id = 200;
        failed_pat.defensive_team_id = 100;

        let rows = parsed_plays(&[td, pat, home_td, failed_pat], &away, &home, &directory);
        assert_eq!(rows[0].away_score_post, 6);
        assert_eq!(rows[0].home_score_post, 0);
        assert_eq!(rows[0].rusher_id, Some(111));
        assert_eq!(rows[1].away_score_post, 7);
        assert_eq!(rows[2].home_score_post, 6);
        assert_eq!(rows[2].passer_id, Some(222));
        assert_eq!(rows[2].receiver_id, None);
        // The missed PAT leaves the score unchanged.
        assert_eq!(rows[3].home_score_post, 6);
        assert_eq!(rows[3].away_score_post, 7);
    }

    #[test]
    fn test_no_points_on_no_play_touchdown() {
        let (away, home) = sides();
        let wiped = raw_play(
            "Doe,Jon rush for 70 yards to the USA0, TOUCHDOWN. PENALTY TROY holding 10 yards from TROY30 to TROY20. NO PLAY.",
        );
        let rows = parsed_plays(&[wiped], &away, &home, &HashMap::new());
        assert_eq!(rows[0].play_type, Some(FbPlayType::NoPlay));
        assert_eq!(rows[0].away_score_post, 0);
        assert_eq!(rows[0].home_score_post, 0);
    }
}
