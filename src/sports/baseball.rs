//! Baseball: team lists, schedules, rosters, per-category season and
//! game-log stats, box scores, and raw play-by-play.
//!
//! The season pages split batting, pitching, and fielding behind a
//! `year_stat_category_id` query parameter whose value changes every
//! season. Known ids live in [`SEASON_STAT_IDS`]; unknown seasons fall
//! back to scraping the category dropdown. Softball shares every record
//! type and builder in this module.

use chrono::{Local, NaiveDate};
use scraper::Html;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache;
use crate::config::ScrapeConfig;
use crate::error::{Error, Result};
use crate::models::{Division, GameMeta, RosterMember, ScheduleGame, ScoreboardGame, Team};
use crate::pages::boxscore::StatBox;
use crate::pages::gamelog::{self, GamelogEntry};
use crate::pages::pbp::{self, PeriodCard};
use crate::pages::stat_table::{self, HtmlTable, RowView};
use crate::sports::engine::{parse_result_cell, SportEngine};
use crate::utils::text;

/// `year_stat_category_id` values by season, as `(batting, pitching,
/// fielding)`. 2020 reuses the 2021 ids; 2011 is the one season where
/// the site numbered the categories in reverse.
const SEASON_STAT_IDS: &[(u16, [u64; 3])] = &[
    (2025, [15687, 15688, 15689]),
    (2024, [15080, 15081, 15082]),
    (2023, [15000, 15001, 15002]),
    (2022, [14940, 14941, 14942]),
    (2021, [14760, 14761, 14762]),
    (2020, [14760, 14761, 14762]),
    (2019, [14643, 14644, 14645]),
    (2018, [11953, 11954, 11955]),
    (2017, [11000, 11001, 11002]),
    (2016, [10946, 10947, 10948]),
    (2015, [10780, 10781, 10782]),
    (2014, [10460, 10461, 10462]),
    (2013, [10120, 10121, 10122]),
    (2012, [10082, 10083, 10084]),
    (2011, [10002, 10001, 10000]),
];

/// The three stat tables a bat-and-ball season splits into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum StatCategory {
    Batting,
    Pitching,
    Fielding,
}

impl StatCategory {
    pub(super) fn label(self) -> &'static str {
        match self {
            StatCategory::Batting => "batting",
            StatCategory::Pitching => "pitching",
            StatCategory::Fielding => "fielding",
        }
    }

    fn index(self) -> usize {
        match self {
            StatCategory::Batting => 0,
            StatCategory::Pitching => 1,
            StatCategory::Fielding => 2,
        }
    }

    /// Matches the dropdown label; the site says `Hitting` where the
    /// stat tables say batting.
    fn matches(self, label: &str) -> bool {
        let label = label.to_lowercase();
        match self {
            StatCategory::Batting => label.contains("hitting") || label.contains("batting"),
            StatCategory::Pitching => label.contains("pitching"),
            StatCategory::Fielding => label.contains("fielding"),
        }
    }
}

/// One player's season batting line from a team's `season_to_date_stats`
/// page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattingSeasonLine {
    pub season: u16,
    pub team_id: i64,
    pub school_id: Option<i64>,
    pub school_name: String,
    pub division: Division,
    pub conference: Option<String>,
    pub stat_category_id: u64,
    pub player_id: Option<i64>,
    pub jersey_number: Option<String>,
    pub player_name: String,
    pub class_year: Option<String>,
    pub positions: Option<String>,
    pub height: Option<String>,
    pub bats_throws: Option<String>,
    pub games_played: Option<u16>,
    pub games_started: Option<u16>,
    pub batting_average: Option<f32>,
    pub on_base_pct: Option<f32>,
    pub slugging_pct: Option<f32>,
    pub runs: Option<u16>,
    pub at_bats: Option<u16>,
    pub hits: Option<u16>,
    pub doubles: Option<u16>,
    pub triples: Option<u16>,
    pub total_bases: Option<u16>,
    pub home_runs: Option<u16>,
    pub runs_batted_in: Option<u16>,
    pub walks: Option<u16>,
    pub hit_by_pitch: Option<u16>,
    pub sacrifice_flies: Option<u16>,
    pub sacrifice_hits: Option<u16>,
    pub strikeouts: Option<u16>,
    pub opponent_double_plays: Option<u16>,
    pub caught_stealing: Option<u16>,
    pub picked_off: Option<u16>,
    pub stolen_bases: Option<u16>,
    pub intentional_walks: Option<u16>,
    pub ground_into_double_plays: Option<u16>,
    pub two_out_rbi: Option<u16>,
}

/// One player's season pitching line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchingSeasonLine {
    pub season: u16,
    pub team_id: i64,
    pub school_id: Option<i64>,
    pub school_name: String,
    pub division: Division,
    pub conference: Option<String>,
    pub stat_category_id: u64,
    pub player_id: Option<i64>,
    pub jersey_number: Option<String>,
    pub player_name: String,
    pub class_year: Option<String>,
    pub positions: Option<String>,
    pub height: Option<String>,
    pub bats_throws: Option<String>,
    pub appearances: Option<u16>,
    pub games: Option<u16>,
    pub games_started: Option<u16>,
    pub earned_run_average: Option<f32>,
    /// Fractional innings; the site's `.1`/`.2` thirds notation is
    /// converted, so 7.2 on the page reads back as 7.667.
    pub innings_pitched: Option<f32>,
    pub innings_pitched_raw: Option<String>,
    pub complete_games: Option<u16>,
    pub hits_allowed: Option<u16>,
    pub runs_allowed: Option<u16>,
    pub earned_runs: Option<u16>,
    pub walks_allowed: Option<u16>,
    pub strikeouts: Option<u16>,
    pub shutouts: Option<u16>,
    pub batters_faced: Option<u16>,
    pub opponent_at_bats: Option<u16>,
    pub doubles_allowed: Option<u16>,
    pub triples_allowed: Option<u16>,
    pub balks: Option<u16>,
    pub home_runs_allowed: Option<u16>,
    pub wild_pitches: Option<u16>,
    pub hit_batters: Option<u16>,
    pub intentional_walks: Option<u16>,
    pub inherited_runners: Option<u16>,
    pub inherited_runners_scored: Option<u16>,
    pub sacrifice_hits_allowed: Option<u16>,
    pub sacrifice_flies_allowed: Option<u16>,
    pub pitches: Option<u16>,
    pub ground_outs: Option<u16>,
    pub fly_outs: Option<u16>,
    pub wins: Option<u16>,
    pub losses: Option<u16>,
    pub saves: Option<u16>,
    pub strikeouts_looking: Option<u16>,
    pub pickoffs: Option<u16>,
}

/// One player's season fielding line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldingSeasonLine {
    pub season: u16,
    pub team_id: i64,
    pub school_id: Option<i64>,
    pub school_name: String,
    pub division: Division,
    pub conference: Option<String>,
    pub stat_category_id: u64,
    pub player_id: Option<i64>,
    pub jersey_number: Option<String>,
    pub player_name: String,
    pub class_year: Option<String>,
    pub positions: Option<String>,
    pub height: Option<String>,
    pub bats_throws: Option<String>,
    pub games_played: Option<u16>,
    pub games_started: Option<u16>,
    pub putouts: Option<u16>,
    pub assists: Option<u16>,
    pub total_chances: Option<u16>,
    pub errors: Option<u16>,
    pub fielding_pct: Option<f32>,
    pub catcher_interference: Option<u16>,
    pub passed_balls: Option<u16>,
    pub stolen_bases_allowed: Option<u16>,
    pub runners_caught_stealing: Option<u16>,
    pub double_plays: Option<u16>,
    pub triple_plays: Option<u16>,
    pub stolen_base_pct: Option<f32>,
}

/// One game row from a player's game-by-game batting log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattingGameLine {
    pub player_id: i64,
    pub season: u16,
    pub game_id: Option<i64>,
    pub game_date: NaiveDate,
    pub game_num: u8,
    pub opponent_id: Option<i64>,
    pub opponent_name: String,
    pub result: String,
    pub innings: Option<u8>,
    pub games_played: Option<u16>,
    pub runs: Option<u16>,
    pub at_bats: Option<u16>,
    pub hits: Option<u16>,
    pub doubles: Option<u16>,
    pub triples: Option<u16>,
    pub total_bases: Option<u16>,
    pub home_runs: Option<u16>,
    pub runs_batted_in: Option<u16>,
    pub walks: Option<u16>,
    pub hit_by_pitch: Option<u16>,
    pub sacrifice_flies: Option<u16>,
    pub sacrifice_hits: Option<u16>,
    pub strikeouts: Option<u16>,
    pub opponent_double_plays: Option<u16>,
    pub caught_stealing: Option<u16>,
    pub picked_off: Option<u16>,
    pub stolen_bases: Option<u16>,
    pub intentional_walks: Option<u16>,
    pub ground_into_double_plays: Option<u16>,
    pub two_out_rbi: Option<u16>,
}

/// One game row from a player's game-by-game pitching log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchingGameLine {
    pub player_id: i64,
    pub season: u16,
    pub game_id: Option<i64>,
    pub game_date: NaiveDate,
    pub game_num: u8,
    pub opponent_id: Option<i64>,
    pub opponent_name: String,
    pub result: String,
    pub innings: Option<u8>,
    pub games_played: Option<u16>,
    pub appearances: Option<u16>,
    pub games_started: Option<u16>,
    pub innings_pitched: Option<f32>,
    pub innings_pitched_raw: Option<String>,
    pub complete_games: Option<u16>,
    pub hits_allowed: Option<u16>,
    pub runs_allowed: Option<u16>,
    pub earned_runs: Option<u16>,
    pub walks_allowed: Option<u16>,
    pub strikeouts: Option<u16>,
    pub shutouts: Option<u16>,
    pub batters_faced: Option<u16>,
    pub opponent_at_bats: Option<u16>,
    pub doubles_allowed: Option<u16>,
    pub triples_allowed: Option<u16>,
    pub balks: Option<u16>,
    pub home_runs_allowed: Option<u16>,
    pub wild_pitches: Option<u16>,
    pub hit_batters: Option<u16>,
    pub intentional_walks: Option<u16>,
    pub inherited_runners: Option<u16>,
    pub inherited_runners_scored: Option<u16>,
    pub sacrifice_hits_allowed: Option<u16>,
    pub sacrifice_flies_allowed: Option<u16>,
    pub pitches: Option<u16>,
    pub ground_outs: Option<u16>,
    pub fly_outs: Option<u16>,
    pub wins: Option<u16>,
    pub losses: Option<u16>,
    pub saves: Option<u16>,
    pub strikeouts_looking: Option<u16>,
    pub pickoffs: Option<u16>,
}

/// One game row from a player's game-by-game fielding log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldingGameLine {
    pub player_id: i64,
    pub season: u16,
    pub game_id: Option<i64>,
    pub game_date: NaiveDate,
    pub game_num: u8,
    pub opponent_id: Option<i64>,
    pub opponent_name: String,
    pub result: String,
    pub innings: Option<u8>,
    pub games_played: Option<u16>,
    pub putouts: Option<u16>,
    pub assists: Option<u16>,
    pub total_chances: Option<u16>,
    pub errors: Option<u16>,
    pub catcher_interference: Option<u16>,
    pub passed_balls: Option<u16>,
    pub stolen_bases_allowed: Option<u16>,
    pub runners_caught_stealing: Option<u16>,
    pub double_plays: Option<u16>,
    pub triple_plays: Option<u16>,
}

/// One player's batting line from a box score.
///
/// A negative `player_id` is the team id negated: the row had no player
/// link, which is how the site marks `TEAM` pseudo-rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattingBoxLine {
    pub game_id: i64,
    pub season: u16,
    pub team_id: i64,
    pub player_id: i64,
    pub jersey_number: Option<String>,
    pub player_name: String,
    pub positions: Option<String>,
    pub games_played: u16,
    /// 0 when the name cell is indented with a non-breaking space, the
    /// site's marker for substitutes.
    pub games_started: u16,
    pub runs: Option<u16>,
    pub at_bats: Option<u16>,
    pub hits: Option<u16>,
    pub doubles: Option<u16>,
    pub triples: Option<u16>,
    pub total_bases: Option<u16>,
    pub home_runs: Option<u16>,
    pub runs_batted_in: Option<u16>,
    pub walks: Option<u16>,
    pub hit_by_pitch: Option<u16>,
    pub sacrifice_flies: Option<u16>,
    pub sacrifice_hits: Option<u16>,
    pub strikeouts: Option<u16>,
    pub strikeouts_looking: Option<u16>,
    pub opponent_double_plays: Option<u16>,
    pub caught_stealing: Option<u16>,
    pub picked_off: Option<u16>,
    pub stolen_bases: Option<u16>,
    pub intentional_walks: Option<u16>,
    pub ground_into_double_plays: Option<u16>,
    pub two_out_rbi: Option<u16>,
}

/// One pitcher's line from a box score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchingBoxLine {
    pub game_id: i64,
    pub season: u16,
    pub team_id: i64,
    pub player_id: i64,
    pub jersey_number: Option<String>,
    pub player_name: String,
    pub positions: Option<String>,
    pub games_played: u16,
    pub games_started: u16,
    /// Position in the pitching table, 1-based; relievers appear in the
    /// order they entered.
    pub order_appeared: u16,
    pub innings_pitched: Option<f32>,
    pub innings_pitched_raw: Option<String>,
    pub complete_games: Option<u16>,
    pub hits_allowed: Option<u16>,
    pub runs_allowed: Option<u16>,
    pub earned_runs: Option<u16>,
    pub walks_allowed: Option<u16>,
    pub strikeouts: Option<u16>,
    pub shutouts: Option<u16>,
    pub batters_faced: Option<u16>,
    pub opponent_at_bats: Option<u16>,
    pub doubles_allowed: Option<u16>,
    pub triples_allowed: Option<u16>,
    pub balks: Option<u16>,
    pub home_runs_allowed: Option<u16>,
    pub wild_pitches: Option<u16>,
    pub hit_batters: Option<u16>,
    pub intentional_walks: Option<u16>,
    pub inherited_runners: Option<u16>,
    pub inherited_runners_scored: Option<u16>,
    pub sacrifice_hits_allowed: Option<u16>,
    pub sacrifice_flies_allowed: Option<u16>,
    pub pitches: Option<u16>,
    pub ground_outs: Option<u16>,
    pub fly_outs: Option<u16>,
    pub team_unearned_runs: Option<u16>,
    pub wins: Option<u16>,
    pub losses: Option<u16>,
    pub saves: Option<u16>,
    pub strikeouts_looking: Option<u16>,
    pub pickoffs: Option<u16>,
}

/// One player's fielding line from a box score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldingBoxLine {
    pub game_id: i64,
    pub season: u16,
    pub team_id: i64,
    pub player_id: i64,
    pub jersey_number: Option<String>,
    pub player_name: String,
    pub positions: Option<String>,
    pub games_played: u16,
    pub games_started: u16,
    pub putouts: Option<u16>,
    pub assists: Option<u16>,
    pub total_chances: Option<u16>,
    pub errors: Option<u16>,
    pub catcher_interference: Option<u16>,
    pub passed_balls: Option<u16>,
    pub stolen_bases_allowed: Option<u16>,
    pub runners_caught_stealing: Option<u16>,
    pub double_plays: Option<u16>,
    pub triple_plays: Option<u16>,
}

/// Every player line in one game, split by category. Join the vectors on
/// `player_id` for a two-way-player view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameBox {
    pub batting: Vec<BattingBoxLine>,
    pub pitching: Vec<PitchingBoxLine>,
    pub fielding: Vec<FieldingBoxLine>,
}

/// One team's totals for a game: the box lines grouped by team with the
/// countable columns summed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamBoxLine {
    pub game_id: i64,
    pub season: u16,
    pub team_id: i64,
    pub batting_at_bats: u16,
    pub batting_runs: u16,
    pub batting_hits: u16,
    pub batting_doubles: u16,
    pub batting_triples: u16,
    pub batting_total_bases: u16,
    pub batting_home_runs: u16,
    pub batting_rbi: u16,
    pub batting_walks: u16,
    pub batting_hit_by_pitch: u16,
    pub batting_sacrifice_flies: u16,
    pub batting_sacrifice_hits: u16,
    pub batting_strikeouts: u16,
    pub batting_strikeouts_looking: u16,
    pub batting_opponent_double_plays: u16,
    pub batting_caught_stealing: u16,
    pub batting_picked_off: u16,
    pub batting_stolen_bases: u16,
    pub batting_intentional_walks: u16,
    pub pitching_innings_pitched: f32,
    pub pitching_hits_allowed: u16,
    pub pitching_runs_allowed: u16,
    pub pitching_earned_runs: u16,
    pub pitching_walks_allowed: u16,
    pub pitching_strikeouts: u16,
    pub pitching_batters_faced: u16,
    pub pitching_doubles_allowed: u16,
    pub pitching_triples_allowed: u16,
    pub pitching_balks: u16,
    pub pitching_home_runs_allowed: u16,
    pub pitching_wild_pitches: u16,
    pub pitching_hit_batters: u16,
    pub pitching_intentional_walks: u16,
    pub pitching_inherited_runners: u16,
    pub pitching_inherited_runners_scored: u16,
    pub pitching_sacrifice_hits_allowed: u16,
    pub pitching_sacrifice_flies_allowed: u16,
    pub pitching_strikeouts_looking: u16,
    pub pitching_team_unearned_runs: u16,
    pub pitching_pickoffs: u16,
    pub fielding_putouts: u16,
    pub fielding_assists: u16,
    pub fielding_total_chances: u16,
    pub fielding_errors: u16,
    pub fielding_catcher_interference: u16,
    pub fielding_passed_balls: u16,
    pub fielding_stolen_bases_allowed: u16,
    pub fielding_runners_caught_stealing: u16,
    pub fielding_double_plays: u16,
    pub fielding_triple_plays: u16,
    /// `SBA / (SBA + CSB)`, recomputed from the sums; None when the
    /// opponent never ran.
    pub fielding_stolen_base_pct: Option<f32>,
}

/// One play-by-play event in a bat-and-ball game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InningPlay {
    pub game_id: i64,
    pub season: u16,
    pub away_team_id: i64,
    pub home_team_id: i64,
    pub inning: u8,
    pub top_of_inning: bool,
    pub batting_team_id: i64,
    pub event_number: u32,
    pub event_text: String,
    pub away_score: Option<u16>,
    pub home_score: Option<u16>,
}

/// Scraper for NCAA baseball (sport code `MBA`).
pub struct BaseballScraper {
    engine: SportEngine,
}

impl BaseballScraper {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        Ok(Self {
            engine: SportEngine::new(config, &super::BASEBALL)?,
        })
    }

    /// Teams fielding baseball in one season and division.
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

    /// Season batting lines for every player on a team.
    pub async fn season_batting_stats(&self, team_id: i64) -> Result<Vec<BattingSeasonLine>> {
        season_stat_lines(
            &self.engine,
            SEASON_STAT_IDS,
            team_id,
            StatCategory::Batting,
            batting_season_lines,
        )
        .await
    }

    /// Season pitching lines for every player on a team.
    pub async fn season_pitching_stats(&self, team_id: i64) -> Result<Vec<PitchingSeasonLine>> {
        season_stat_lines(
            &self.engine,
            SEASON_STAT_IDS,
            team_id,
            StatCategory::Pitching,
            pitching_season_lines,
        )
        .await
    }

    /// Season fielding lines for every player on a team.
    pub async fn season_fielding_stats(&self, team_id: i64) -> Result<Vec<FieldingSeasonLine>> {
        season_stat_lines(
            &self.engine,
            SEASON_STAT_IDS,
            team_id,
            StatCategory::Fielding,
            fielding_season_lines,
        )
        .await
    }

    /// Game-by-game batting lines from a player's page.
    pub async fn player_game_batting_stats(
        &self,
        player_id: i64,
        season: u16,
    ) -> Result<Vec<BattingGameLine>> {
        let engine = &self.engine;
        player_game_lines(engine, SEASON_STAT_IDS, player_id, season, StatCategory::Batting, |t| {
            batting_game_lines(player_id, season, engine, t)
        })
        .await
    }

    /// Game-by-game pitching lines from a player's page.
    pub async fn player_game_pitching_stats(
        &self,
        player_id: i64,
        season: u16,
    ) -> Result<Vec<PitchingGameLine>> {
        let engine = &self.engine;
        player_game_lines(engine, SEASON_STAT_IDS, player_id, season, StatCategory::Pitching, |t| {
            pitching_game_lines(player_id, season, engine, t)
        })
        .await
    }

    /// Game-by-game fielding lines from a player's page.
    pub async fn player_game_fielding_stats(
        &self,
        player_id: i64,
        season: u16,
    ) -> Result<Vec<FieldingGameLine>> {
        let engine = &self.engine;
        player_game_lines(engine, SEASON_STAT_IDS, player_id, season, StatCategory::Fielding, |t| {
            fielding_game_lines(player_id, season, engine, t)
        })
        .await
    }

    /// Every player's box score lines for one game.
    pub async fn game_player_stats(&self, game_id: i64) -> Result<GameBox> {
        game_box(&self.engine, game_id).await
    }

    /// Both teams' summed box score totals for one game.
    pub async fn game_team_stats(&self, game_id: i64) -> Result<Vec<TeamBoxLine>> {
        let box_stats = game_box(&self.engine, game_id).await?;
        Ok(team_box_lines(&box_stats))
    }

    /// The raw play-by-play log for one game.
    pub async fn raw_pbp(&self, game_id: i64) -> Result<Vec<InningPlay>> {
        inning_pbp(&self.engine, game_id).await
    }
}

/// Registry lookup for a season's category id.
fn registry_stat_id(registry: &[(u16, [u64; 3])], season: u16, category: StatCategory) -> Option<u64> {
    registry
        .iter()
        .find(|(s, _)| *s == season)
        .map(|(_, ids)| ids[category.index()])
}

/// Resolves the category id for a team's season page, scraping the
/// category dropdown when the registry has no entry.
pub(super) async fn resolve_stat_id(
    engine: &SportEngine,
    registry: &[(u16, [u64; 3])],
    team_id: i64,
    season: u16,
    category: StatCategory,
) -> Result<u64> {
    if let Some(id) = registry_stat_id(registry, season, category) {
        return Ok(id);
    }
    let html = engine.season_stats_html(team_id, None).await?;
    stat_id_from_dropdown(&html, season, category)
}

/// Same as [`resolve_stat_id`], but reads the dropdown off the player's
/// own page since game logs have no team page in hand.
pub(super) async fn resolve_player_stat_id(
    engine: &SportEngine,
    registry: &[(u16, [u64; 3])],
    player_id: i64,
    season: u16,
    category: StatCategory,
) -> Result<u64> {
    if let Some(id) = registry_stat_id(registry, season, category) {
        return Ok(id);
    }
    let html = engine.player_page_html(player_id, None).await?;
    stat_id_from_dropdown(&html, season, category)
}

fn stat_id_from_dropdown(html: &str, season: u16, category: StatCategory) -> Result<u64> {
    let doc = Html::parse_document(html);
    let options = stat_table::stat_category_options(&doc)?;
    options
        .iter()
        .find(|(_, label)| category.matches(label))
        .map(|(id, _)| *id)
        .ok_or_else(|| {
            Error::markup(format!(
                "no {} category option on the season {season} stats page",
                category.label()
            ))
        })
}

/// Cache-first season stats fetch, shared by baseball and softball. The
/// builder turns the `stat_grid` table into typed lines.
pub(super) async fn season_stat_lines<T, F>(
    engine: &SportEngine,
    registry: &[(u16, [u64; 3])],
    team_id: i64,
    category: StatCategory,
    build: F,
) -> Result<Vec<T>>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce(&Team, u64, &HtmlTable) -> Vec<T>,
{
    let team = engine.find_team(team_id).await?;
    let rel = engine.rel(&format!(
        "player_season_stats/{team_id}_{}.csv",
        category.label()
    ));
    let today = Local::now().date_naive();
    let max_age = cache::in_season_max_age(team.season, today, 1);
    if let Some(rows) = engine.cache.load_if_fresh::<T>(&rel, max_age) {
        return Ok(rows);
    }

    let stat_id = resolve_stat_id(engine, registry, team_id, team.season, category).await?;
    let html = engine.season_stats_html(team_id, Some(stat_id)).await?;
    let table = stat_table::parse_stat_grid(&html)?;
    let lines = build(&team, stat_id, &table);
    engine.cache.store(&rel, &lines)?;
    Ok(lines)
}

/// Cache-first game-log fetch, shared by baseball and softball.
pub(super) async fn player_game_lines<T, F>(
    engine: &SportEngine,
    registry: &[(u16, [u64; 3])],
    player_id: i64,
    season: u16,
    category: StatCategory,
    build: F,
) -> Result<Vec<T>>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce(&HtmlTable) -> Vec<T>,
{
    let rel = engine.rel(&format!(
        "player_game_stats/{}/{season}_{player_id}.csv",
        category.label()
    ));
    let today = Local::now().date_naive();
    let max_age = cache::in_season_max_age(season, today, 1);
    if let Some(rows) = engine.cache.load_if_fresh::<T>(&rel, max_age) {
        return Ok(rows);
    }

    let stat_id = resolve_player_stat_id(engine, registry, player_id, season, category).await?;
    let html = engine.player_page_html(player_id, Some(stat_id)).await?;
    let table = gamelog::parse_player_gamelog(&html)?;
    let lines = build(&table);
    engine.cache.store(&rel, &lines)?;
    Ok(lines)
}

/// Identity cells shared by every season line.
struct SeasonIdentity {
    player_id: Option<i64>,
    jersey_number: Option<String>,
    player_name: String,
    class_year: Option<String>,
    positions: Option<String>,
    height: Option<String>,
    bats_throws: Option<String>,
}

/// Season tables mark player rows with the `text` class; totals rows
/// carry other classes and are skipped.
fn season_identity(view: &RowView<'_>) -> Option<SeasonIdentity> {
    if !view.row().has_class("text") {
        return None;
    }
    let name_cell = view.cell(&["Player", "Name"])?;
    let player_name = name_cell
        .data_order
        .as_deref()
        .and_then(text::full_name_from_sortable)
        .unwrap_or_else(|| name_cell.text.clone());
    let player_id = view
        .row()
        .cells
        .iter()
        .find_map(|c| c.id_in_href("/players/"));
    Some(SeasonIdentity {
        player_id,
        jersey_number: view.string(&["#"]),
        player_name,
        class_year: view.string(&["Yr"]),
        positions: view.string(&["Pos"]),
        height: view.string(&["Ht"]),
        bats_throws: view.string(&["B/T"]),
    })
}

pub(super) fn batting_season_lines(
    team: &Team,
    stat_id: u64,
    table: &HtmlTable,
) -> Vec<BattingSeasonLine> {
    let mut lines = Vec::new();
    for view in table.views() {
        let Some(id) = season_identity(&view) else {
            continue;
        };
        lines.push(BattingSeasonLine {
            season: team.season,
            team_id: team.team_id,
            school_id: team.school_id,
            school_name: team.school_name.clone(),
            division: team.division,
            conference: team.conference.clone(),
            stat_category_id: stat_id,
            player_id: id.player_id,
            jersey_number: id.jersey_number,
            player_name: id.player_name,
            class_year: id.class_year,
            positions: id.positions,
            height: id.height,
            bats_throws: id.bats_throws,
            games_played: view.u16(&["GP", "G"]),
            games_started: view.u16(&["GS"]),
            batting_average: view.f32(&["BA", "AVG"]),
            on_base_pct: view.f32(&["OBPct", "OBP"]),
            slugging_pct: view.f32(&["SlgPct", "SLG"]),
            runs: view.u16(&["R"]),
            at_bats: view.u16(&["AB"]),
            hits: view.u16(&["H"]),
            doubles: view.u16(&["2B"]),
            triples: view.u16(&["3B"]),
            total_bases: view.u16(&["TB"]),
            home_runs: view.u16(&["HR"]),
            runs_batted_in: view.u16(&["RBI"]),
            walks: view.u16(&["BB"]),
            hit_by_pitch: view.u16(&["HBP"]),
            sacrifice_flies: view.u16(&["SF"]),
            sacrifice_hits: view.u16(&["SH"]),
            strikeouts: view.u16(&["K", "SO"]),
            opponent_double_plays: view.u16(&["OPP DP", "OPPDP", "DP"]),
            caught_stealing: view.u16(&["CS"]),
            picked_off: view.u16(&["Picked"]),
            stolen_bases: view.u16(&["SB"]),
            intentional_walks: view.u16(&["IBB"]),
            ground_into_double_plays: view.u16(&["GDP"]),
            two_out_rbi: view.u16(&["RBI2out"]),
        });
    }
    lines
}

pub(super) fn pitching_season_lines(
    team: &Team,
    stat_id: u64,
    table: &HtmlTable,
) -> Vec<PitchingSeasonLine> {
    let mut lines = Vec::new();
    for view in table.views() {
        let Some(id) = season_identity(&view) else {
            continue;
        };
        let ip_raw = view.string(&["IP"]);
        lines.push(PitchingSeasonLine {
            season: team.season,
            team_id: team.team_id,
            school_id: team.school_id,
            school_name: team.school_name.clone(),
            division: team.division,
            conference: team.conference.clone(),
            stat_category_id: stat_id,
            player_id: id.player_id,
            jersey_number: id.jersey_number,
            player_name: id.player_name,
            class_year: id.class_year,
            positions: id.positions,
            height: id.height,
            bats_throws: id.bats_throws,
            appearances: view.u16(&["App", "APP"]),
            games: view.u16(&["G", "GP"]),
            games_started: view.u16(&["GS"]),
            earned_run_average: view.f32(&["ERA"]),
            innings_pitched: ip_raw.as_deref().and_then(text::parse_innings_pitched),
            innings_pitched_raw: ip_raw,
            complete_games: view.u16(&["CG"]),
            hits_allowed: view.u16(&["H"]),
            runs_allowed: view.u16(&["R"]),
            earned_runs: view.u16(&["ER"]),
            walks_allowed: view.u16(&["BB"]),
            strikeouts: view.u16(&["SO"]),
            shutouts: view.u16(&["SHO"]),
            batters_faced: view.u16(&["BF"]),
            opponent_at_bats: view.u16(&["P-OAB"]),
            doubles_allowed: view.u16(&["2B-A"]),
            triples_allowed: view.u16(&["3B-A"]),
            balks: view.u16(&["Bk"]),
            home_runs_allowed: view.u16(&["HR-A"]),
            wild_pitches: view.u16(&["WP"]),
            hit_batters: view.u16(&["HB"]),
            intentional_walks: view.u16(&["IBB"]),
            inherited_runners: view.u16(&["Inh Run", "InhRun"]),
            inherited_runners_scored: view.u16(&["Inh Run Score", "InhRunScore"]),
            sacrifice_hits_allowed: view.u16(&["SHA"]),
            sacrifice_flies_allowed: view.u16(&["SFA"]),
            pitches: view.u16(&["Pitches"]),
            ground_outs: view.u16(&["GO"]),
            fly_outs: view.u16(&["FO"]),
            wins: view.u16(&["W"]),
            losses: view.u16(&["L"]),
            saves: view.u16(&["SV"]),
            strikeouts_looking: view.u16(&["KL"]),
            pickoffs: view.u16(&["pickoffs"]),
        });
    }
    lines
}

pub(super) fn fielding_season_lines(
    team: &Team,
    stat_id: u64,
    table: &HtmlTable,
) -> Vec<FieldingSeasonLine> {
    let mut lines = Vec::new();
    for view in table.views() {
        let Some(id) = season_identity(&view) else {
            continue;
        };
        lines.push(FieldingSeasonLine {
            season: team.season,
            team_id: team.team_id,
            school_id: team.school_id,
            school_name: team.school_name.clone(),
            division: team.division,
            conference: team.conference.clone(),
            stat_category_id: stat_id,
            player_id: id.player_id,
            jersey_number: id.jersey_number,
            player_name: id.player_name,
            class_year: id.class_year,
            positions: id.positions,
            height: id.height,
            bats_throws: id.bats_throws,
            games_played: view.u16(&["GP", "G"]),
            games_started: view.u16(&["GS"]),
            putouts: view.u16(&["PO"]),
            assists: view.u16(&["A"]),
            total_chances: view.u16(&["TC"]),
            errors: view.u16(&["E"]),
            fielding_pct: view.f32(&["FldPct", "FLD%"]),
            catcher_interference: view.u16(&["CI"]),
            passed_balls: view.u16(&["PB"]),
            stolen_bases_allowed: view.u16(&["SBA"]),
            runners_caught_stealing: view.u16(&["CSB"]),
            double_plays: view.u16(&["IDP"]),
            triple_plays: view.u16(&["TP"]),
            stolen_base_pct: view.f32(&["SBAPct", "SBA%"]),
        });
    }
    lines
}

pub(super) fn batting_game_lines(
    player_id: i64,
    season: u16,
    engine: &SportEngine,
    table: &HtmlTable,
) -> Vec<BattingGameLine> {
    let mut lines = Vec::new();
    for (entry, view) in gamelog::gamelog_entries(table) {
        let innings = game_innings(engine, &entry);
        lines.push(BattingGameLine {
            player_id,
            season,
            game_id: entry.game_id,
            game_date: entry.game_date,
            game_num: entry.game_num,
            opponent_id: entry.opponent_id,
            opponent_name: entry.opponent_name,
            result: entry.result_text,
            innings,
            games_played: view.u16(&["GP", "G"]),
            runs: view.u16(&["R"]),
            at_bats: view.u16(&["AB"]),
            hits: view.u16(&["H"]),
            doubles: view.u16(&["2B"]),
            triples: view.u16(&["3B"]),
            total_bases: view.u16(&["TB"]),
            home_runs: view.u16(&["HR"]),
            runs_batted_in: view.u16(&["RBI"]),
            walks: view.u16(&["BB"]),
            hit_by_pitch: view.u16(&["HBP"]),
            sacrifice_flies: view.u16(&["SF"]),
            sacrifice_hits: view.u16(&["SH"]),
            strikeouts: view.u16(&["K", "SO"]),
            opponent_double_plays: view.u16(&["OPP DP", "OPPDP", "DP"]),
            caught_stealing: view.u16(&["CS"]),
            picked_off: view.u16(&["Picked"]),
            stolen_bases: view.u16(&["SB"]),
            intentional_walks: view.u16(&["IBB"]),
            ground_into_double_plays: view.u16(&["GDP"]),
            two_out_rbi: view.u16(&["RBI2out"]),
        });
    }
    lines
}

pub(super) fn pitching_game_lines(
    player_id: i64,
    season: u16,
    engine: &SportEngine,
    table: &HtmlTable,
) -> Vec<PitchingGameLine> {
    let mut lines = Vec::new();
    for (entry, view) in gamelog::gamelog_entries(table) {
        let innings = game_innings(engine, &entry);
        let ip_raw = view.string(&["IP"]);
        lines.push(PitchingGameLine {
            player_id,
            season,
            game_id: entry.game_id,
            game_date: entry.game_date,
            game_num: entry.game_num,
            opponent_id: entry.opponent_id,
            opponent_name: entry.opponent_name,
            result: entry.result_text,
            innings,
            games_played: view.u16(&["GP", "G"]),
            appearances: view.u16(&["App", "APP"]),
            games_started: view.u16(&["GS"]),
            innings_pitched: ip_raw.as_deref().and_then(text::parse_innings_pitched),
            innings_pitched_raw: ip_raw,
            complete_games: view.u16(&["CG"]),
            hits_allowed: view.u16(&["H"]),
            runs_allowed: view.u16(&["R"]),
            earned_runs: view.u16(&["ER"]),
            walks_allowed: view.u16(&["BB"]),
            strikeouts: view.u16(&["SO"]),
            shutouts: view.u16(&["SHO"]),
            batters_faced: view.u16(&["BF"]),
            opponent_at_bats: view.u16(&["P-OAB"]),
            doubles_allowed: view.u16(&["2B-A"]),
            triples_allowed: view.u16(&["3B-A"]),
            balks: view.u16(&["Bk"]),
            home_runs_allowed: view.u16(&["HR-A"]),
            wild_pitches: view.u16(&["WP"]),
            hit_batters: view.u16(&["HB"]),
            intentional_walks: view.u16(&["IBB"]),
            inherited_runners: view.u16(&["Inh Run", "InhRun"]),
            inherited_runners_scored: view.u16(&["Inh Run Score", "InhRunScore"]),
            sacrifice_hits_allowed: view.u16(&["SHA"]),
            sacrifice_flies_allowed: view.u16(&["SFA"]),
            pitches: view.u16(&["Pitches"]),
            ground_outs: view.u16(&["GO"]),
            fly_outs: view.u16(&["FO"]),
            wins: view.u16(&["W"]),
            losses: view.u16(&["L"]),
            saves: view.u16(&["SV"]),
            strikeouts_looking: view.u16(&["KL"]),
            pickoffs: view.u16(&["pickoffs"]),
        });
    }
    lines
}

pub(super) fn fielding_game_lines(
    player_id: i64,
    season: u16,
    engine: &SportEngine,
    table: &HtmlTable,
) -> Vec<FieldingGameLine> {
    let mut lines = Vec::new();
    for (entry, view) in gamelog::gamelog_entries(table) {
        let innings = game_innings(engine, &entry);
        lines.push(FieldingGameLine {
            player_id,
            season,
            game_id: entry.game_id,
            game_date: entry.game_date,
            game_num: entry.game_num,
            opponent_id: entry.opponent_id,
            opponent_name: entry.opponent_name,
            result: entry.result_text,
            innings,
            games_played: view.u16(&["GP", "G"]),
            putouts: view.u16(&["PO"]),
            assists: view.u16(&["A"]),
            total_chances: view.u16(&["TC"]),
            errors: view.u16(&["E"]),
            catcher_interference: view.u16(&["CI"]),
            passed_balls: view.u16(&["PB"]),
            stolen_bases_allowed: view.u16(&["SBA"]),
            runners_caught_stealing: view.u16(&["CSB", "CS"]),
            double_plays: view.u16(&["IDP"]),
            triple_plays: view.u16(&["TP"]),
        });
    }
    lines
}

fn game_innings(engine: &SportEngine, entry: &GamelogEntry) -> Option<u8> {
    parse_result_cell(&entry.result_text, engine.info).innings
}

/// Identity read off a box score row. `None` drops the row: rows with no
/// player link are kept only when they are the `TEAM` pseudo-player.
struct BoxIdentity {
    player_id: i64,
    jersey_number: Option<String>,
    player_name: String,
    positions: Option<String>,
    games_started: u16,
}

fn box_identity(team_id: i64, view: &RowView<'_>) -> Option<BoxIdentity> {
    let name_cell = view.cell(&["Name", "Player"])?;
    let player_name = name_cell.text.clone();
    if player_name.is_empty() {
        return None;
    }
    // Substitutes are indented with a non-breaking space.
    let games_started = if name_cell.raw_text.contains('\u{a0}') { 0 } else { 1 };
    let player_id = view
        .row()
        .cells
        .iter()
        .find_map(|c| c.id_in_href("/players/"))
        .unwrap_or(-team_id);
    if player_id <= 0 && player_name != "TEAM" {
        return None;
    }
    Some(BoxIdentity {
        player_id,
        jersey_number: view.string(&["#"]),
        player_name,
        positions: view.string(&["P", "Pos"]),
        games_started,
    })
}

fn batting_box_lines(meta: &GameMeta, team_id: i64, table: &HtmlTable) -> Vec<BattingBoxLine> {
    let mut lines = Vec::new();
    for row in &table.rows {
        let view = table.view(row);
        let Some(id) = box_identity(team_id, &view) else {
            continue;
        };
        lines.push(BattingBoxLine {
            game_id: meta.game_id,
            season: meta.season,
            team_id,
            player_id: id.player_id,
            jersey_number: id.jersey_number,
            player_name: id.player_name,
            positions: id.positions,
            games_played: 1,
            games_started: id.games_started,
            runs: view.u16(&["R"]),
            at_bats: view.u16(&["AB"]),
            hits: view.u16(&["H"]),
            doubles: view.u16(&["2B"]),
            triples: view.u16(&["3B"]),
            total_bases: view.u16(&["TB"]),
            home_runs: view.u16(&["HR"]),
            runs_batted_in: view.u16(&["RBI"]),
            walks: view.u16(&["BB"]),
            hit_by_pitch: view.u16(&["HBP"]),
            sacrifice_flies: view.u16(&["SF"]),
            sacrifice_hits: view.u16(&["SH"]),
            strikeouts: view.u16(&["K", "SO"]),
            strikeouts_looking: view.u16(&["KL"]),
            opponent_double_plays: view.u16(&["OPP DP", "OPPDP", "DP"]),
            caught_stealing: view.u16(&["CS"]),
            picked_off: view.u16(&["Picked"]),
            stolen_bases: view.u16(&["SB"]),
            intentional_walks: view.u16(&["IBB"]),
            ground_into_double_plays: view.u16(&["GDP"]),
            two_out_rbi: view.u16(&["RBI2out"]),
        });
    }
    lines
}

fn pitching_box_lines(meta: &GameMeta, team_id: i64, table: &HtmlTable) -> Vec<PitchingBoxLine> {
    let mut lines = Vec::new();
    for (idx, row) in table.rows.iter().enumerate() {
        let view = table.view(row);
        let Some(id) = box_identity(team_id, &view) else {
            continue;
        };
        let ip_raw = view.string(&["IP"]);
        lines.push(PitchingBoxLine {
            game_id: meta.game_id,
            season: meta.season,
            team_id,
            player_id: id.player_id,
            jersey_number: id.jersey_number,
            player_name: id.player_name,
            positions: id.positions,
            games_played: 1,
            games_started: id.games_started,
            order_appeared: (idx + 1) as u16,
            innings_pitched: ip_raw.as_deref().and_then(text::parse_innings_pitched),
            innings_pitched_raw: ip_raw,
            complete_games: view.u16(&["CG"]),
            hits_allowed: view.u16(&["H"]),
            runs_allowed: view.u16(&["R"]),
            earned_runs: view.u16(&["ER"]),
            walks_allowed: view.u16(&["BB"]),
            strikeouts: view.u16(&["SO"]),
            shutouts: view.u16(&["SHO"]),
            batters_faced: view.u16(&["BF"]),
            opponent_at_bats: view.u16(&["P-OAB"]),
            doubles_allowed: view.u16(&["2B-A"]),
            triples_allowed: view.u16(&["3B-A"]),
            balks: view.u16(&["Bk"]),
            home_runs_allowed: view.u16(&["HR-A"]),
            wild_pitches: view.u16(&["WP"]),
            hit_batters: view.u16(&["HB"]),
            intentional_walks: view.u16(&["IBB"]),
            inherited_runners: view.u16(&["Inh Run", "InhRun"]),
            inherited_runners_scored: view.u16(&["Inh Run Score", "InhRunScore"]),
            sacrifice_hits_allowed: view.u16(&["SHA"]),
            sacrifice_flies_allowed: view.u16(&["SFA"]),
            pitches: view.u16(&["Pitches"]),
            ground_outs: view.u16(&["GO"]),
            fly_outs: view.u16(&["FO"]),
            team_unearned_runs: view.u16(&["TUER"]),
            wins: view.u16(&["W"]),
            losses: view.u16(&["L"]),
            saves: view.u16(&["SV"]),
            strikeouts_looking: view.u16(&["KL"]),
            pickoffs: view.u16(&["pickoffs"]),
        });
    }
    lines
}

fn fielding_box_lines(meta: &GameMeta, team_id: i64, table: &HtmlTable) -> Vec<FieldingBoxLine> {
    let mut lines = Vec::new();
    for row in &table.rows {
        let view = table.view(row);
        let Some(id) = box_identity(team_id, &view) else {
            continue;
        };
        lines.push(FieldingBoxLine {
            game_id: meta.game_id,
            season: meta.season,
            team_id,
            player_id: id.player_id,
            jersey_number: id.jersey_number,
            player_name: id.player_name,
            positions: id.positions,
            games_played: 1,
            games_started: id.games_started,
            putouts: view.u16(&["PO"]),
            assists: view.u16(&["A"]),
            total_chances: view.u16(&["TC"]),
            errors: view.u16(&["E"]),
            catcher_interference: view.u16(&["CI"]),
            passed_balls: view.u16(&["PB"]),
            stolen_bases_allowed: view.u16(&["SBA"]),
            runners_caught_stealing: view.u16(&["CSB", "CS"]),
            double_plays: view.u16(&["IDP"]),
            triple_plays: view.u16(&["TP"]),
        });
    }
    lines
}

/// Sorts the page's stat boxes into a [`GameBox`] by card heading. The
/// site calls batting `Hitting` on some pages.
pub(super) fn build_game_box(meta: &GameMeta, boxes: &[StatBox]) -> GameBox {
    let mut game_box = GameBox::default();
    for stat_box in boxes {
        let heading = stat_box.heading.to_lowercase();
        if heading.contains("batting") || heading.contains("hitting") {
            game_box
                .batting
                .extend(batting_box_lines(meta, stat_box.team_id, &stat_box.table));
        } else if heading.contains("pitching") {
            game_box
                .pitching
                .extend(pitching_box_lines(meta, stat_box.team_id, &stat_box.table));
        } else if heading.contains("fielding") {
            game_box
                .fielding
                .extend(fielding_box_lines(meta, stat_box.team_id, &stat_box.table));
        } else {
            debug!(heading = %stat_box.heading, "unrecognized stat box, skipping");
        }
    }
    game_box
}

/// Cache-first box score fetch, shared by baseball and softball. The
/// three categories are cached as separate files; a miss on any of them
/// refetches the page.
pub(super) async fn game_box(engine: &SportEngine, game_id: i64) -> Result<GameBox> {
    let bat_rel = engine.rel(&format!("game_stats/player/{game_id}_batting.csv"));
    let pit_rel = engine.rel(&format!("game_stats/player/{game_id}_pitching.csv"));
    let fld_rel = engine.rel(&format!("game_stats/player/{game_id}_fielding.csv"));
    if let (Some(batting), Some(pitching), Some(fielding)) = (
        engine.cache.load_if_fresh::<BattingBoxLine>(&bat_rel, cache::GAME_MAX_AGE),
        engine.cache.load_if_fresh::<PitchingBoxLine>(&pit_rel, cache::GAME_MAX_AGE),
        engine.cache.load_if_fresh::<FieldingBoxLine>(&fld_rel, cache::GAME_MAX_AGE),
    ) {
        return Ok(GameBox {
            batting,
            pitching,
            fielding,
        });
    }

    let (meta, boxes) = engine.box_score_page(game_id).await?;
    let game_box = build_game_box(&meta, &boxes);
    engine.cache.store(&bat_rel, &game_box.batting)?;
    engine.cache.store(&pit_rel, &game_box.pitching)?;
    engine.cache.store(&fld_rel, &game_box.fielding)?;
    Ok(game_box)
}

fn add(total: &mut u16, value: Option<u16>) {
    *total = total.saturating_add(value.unwrap_or(0));
}

fn team_line_index(teams: &mut Vec<TeamBoxLine>, game_id: i64, season: u16, team_id: i64) -> usize {
    if let Some(pos) = teams.iter().position(|t| t.team_id == team_id) {
        return pos;
    }
    teams.push(TeamBoxLine {
        game_id,
        season,
        team_id,
        ..TeamBoxLine::default()
    });
    teams.len() - 1
}

/// Groups a game's box lines by team and sums the countable columns.
/// `TEAM` pseudo-rows count too; they hold events charged to no player.
pub(super) fn team_box_lines(game_box: &GameBox) -> Vec<TeamBoxLine> {
    let mut teams: Vec<TeamBoxLine> = Vec::new();

    for b in &game_box.batting {
        let i = team_line_index(&mut teams, b.game_id, b.season, b.team_id);
        let t = &mut teams[i];
        add(&mut t.batting_at_bats, b.at_bats);
        add(&mut t.batting_runs, b.runs);
        add(&mut t.batting_hits, b.hits);
        add(&mut t.batting_doubles, b.doubles);
        add(&mut t.batting_triples, b.triples);
        add(&mut t.batting_total_bases, b.total_bases);
        add(&mut t.batting_home_runs, b.home_runs);
        add(&mut t.batting_rbi, b.runs_batted_in);
        add(&mut t.batting_walks, b.walks);
        add(&mut t.batting_hit_by_pitch, b.hit_by_pitch);
        add(&mut t.batting_sacrifice_flies, b.sacrifice_flies);
        add(&mut t.batting_sacrifice_hits, b.sacrifice_hits);
        add(&mut t.batting_strikeouts, b.strikeouts);
        add(&mut t.batting_strikeouts_looking, b.strikeouts_looking);
        add(&mut t.batting_opponent_double_plays, b.opponent_double_plays);
        add(&mut t.batting_caught_stealing, b.caught_stealing);
        add(&mut t.batting_picked_off, b.picked_off);
        add(&mut t.batting_stolen_bases, b.stolen_bases);
        add(&mut t.batting_intentional_walks, b.intentional_walks);
    }
    for p in &game_box.pitching {
        let i = team_line_index(&mut teams, p.game_id, p.season, p.team_id);
        let t = &mut teams[i];
        t.pitching_innings_pitched += p.innings_pitched.unwrap_or(0.0);
        add(&mut t.pitching_hits_allowed, p.hits_allowed);
        add(&mut t.pitching_runs_allowed, p.runs_allowed);
        add(&mut t.pitching_earned_runs, p.earned_runs);
        add(&mut t.pitching_walks_allowed, p.walks_allowed);
        add(&mut t.pitching_strikeouts, p.strikeouts);
        add(&mut t.pitching_batters_faced, p.batters_faced);
        add(&mut t.pitching_doubles_allowed, p.doubles_allowed);
        add(&mut t.pitching_triples_allowed, p.triples_allowed);
        add(&mut t.pitching_balks, p.balks);
        add(&mut t.pitching_home_runs_allowed, p.home_runs_allowed);
        add(&mut t.pitching_wild_pitches, p.wild_pitches);
        add(&mut t.pitching_hit_batters, p.hit_batters);
        add(&mut t.pitching_intentional_walks, p.intentional_walks);
        add(&mut t.pitching_inherited_runners, p.inherited_runners);
        add(&mut t.pitching_inherited_runners_scored, p.inherited_runners_scored);
        add(&mut t.pitching_sacrifice_hits_allowed, p.sacrifice_hits_allowed);
        add(&mut t.pitching_sacrifice_flies_allowed, p.sacrifice_flies_allowed);
        add(&mut t.pitching_strikeouts_looking, p.strikeouts_looking);
        add(&mut t.pitching_team_unearned_runs, p.team_unearned_runs);
        add(&mut t.pitching_pickoffs, p.pickoffs);
    }
    for f in &game_box.fielding {
        let i = team_line_index(&mut teams, f.game_id, f.season, f.team_id);
        let t = &mut teams[i];
        add(&mut t.fielding_putouts, f.putouts);
        add(&mut t.fielding_assists, f.assists);
        add(&mut t.fielding_total_chances, f.total_chances);
        add(&mut t.fielding_errors, f.errors);
        add(&mut t.fielding_catcher_interference, f.catcher_interference);
        add(&mut t.fielding_passed_balls, f.passed_balls);
        add(&mut t.fielding_stolen_bases_allowed, f.stolen_bases_allowed);
        add(&mut t.fielding_runners_caught_stealing, f.runners_caught_stealing);
        add(&mut t.fielding_double_plays, f.double_plays);
        add(&mut t.fielding_triple_plays, f.triple_plays);
    }

    for t in &mut teams {
        let attempts = t.fielding_stolen_bases_allowed + t.fielding_runners_caught_stealing;
        if attempts > 0 {
            t.fielding_stolen_base_pct =
                Some(t.fielding_stolen_bases_allowed as f32 / attempts as f32);
        }
    }
    teams
}

/// Flattens inning cards into plays. Rows read away text, running score,
/// home text; whichever side has text is the batting side.
pub(super) fn inning_plays(meta: &GameMeta, cards: &[PeriodCard]) -> Vec<InningPlay> {
    let mut plays = Vec::new();
    for card in cards {
        let Some(inning) = card.number() else {
            continue;
        };
        for row in &card.rows {
            if row.len() < 3 {
                continue;
            }
            let (top, batting_team_id, event_text) = if !row[0].is_empty() {
                (true, meta.away_team_id, row[0].clone())
            } else if !row[2].is_empty() {
                (false, meta.home_team_id, row[2].clone())
            } else {
                continue;
            };
            let (away_score, home_score) = match pbp::parse_running_score(&row[1]) {
                Some((a, h)) => (Some(a), Some(h)),
                None => (None, None),
            };
            plays.push(InningPlay {
                game_id: meta.game_id,
                season: meta.season,
                away_team_id: meta.away_team_id,
                home_team_id: meta.home_team_id,
                inning,
                top_of_inning: top,
                batting_team_id,
                event_number: 0,
                event_text,
                away_score,
                home_score,
            });
        }
    }
    for (idx, play) in plays.iter_mut().enumerate() {
        play.event_number = (idx + 1) as u32;
    }
    plays
}

/// Cache-first play-by-play fetch, shared by baseball and softball.
pub(super) async fn inning_pbp(engine: &SportEngine, game_id: i64) -> Result<Vec<InningPlay>> {
    let rel = engine.rel(&format!("raw_pbp/{game_id}_raw_pbp.csv"));
    if let Some(rows) = engine.cache.load_if_fresh::<InningPlay>(&rel, cache::PBP_MAX_AGE) {
        return Ok(rows);
    }
    let (meta, cards) = engine.pbp_page(game_id).await?;
    let plays = inning_plays(&meta, &cards);
    engine.cache.store(&rel, &plays)?;
    Ok(plays)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team() -> Team {
        Team {
            season: 2024,
            division: Division::I,
            sport_code: "MBA".to_string(),
            team_id: 574223,
            school_id: Some(616),
            school_name: "Stetson".to_string(),
            conference: Some("ASUN".to_string()),
        }
    }

    fn meta() -> GameMeta {
        GameMeta {
            game_id: 4525569,
            season: 2024,
            game_datetime: None,
            stadium_name: Some("Melching Field".to_string()),
            attendance: Some(1245),
            away_team_id: 574223,
            away_team_name: "Stetson".to_string(),
            home_team_id: 574077,
            home_team_name: "Texas".to_string(),
        }
    }

    fn parse(html: &str, css: &str) -> HtmlTable {
        let doc = Html::parse_document(html);
        stat_table::parse_table(&doc, css).unwrap()
    }

    #[test]
    fn test_stat_id_registry() {
        assert_eq!(
            registry_stat_id(SEASON_STAT_IDS, 2024, StatCategory::Batting),
            Some(15080)
        );
        assert_eq!(
            registry_stat_id(SEASON_STAT_IDS, 2024, StatCategory::Fielding),
            Some(15082)
        );
        // The pandemic season kept the prior year's ids.
        assert_eq!(
            registry_stat_id(SEASON_STAT_IDS, 2020, StatCategory::Pitching),
            registry_stat_id(SEASON_STAT_IDS, 2021, StatCategory::Pitching),
        );
        // 2011 numbered the categories backwards.
        assert_eq!(
            registry_stat_id(SEASON_STAT_IDS, 2011, StatCategory::Batting),
            Some(10002)
        );
        assert_eq!(registry_stat_id(SEASON_STAT_IDS, 2010, StatCategory::Batting), None);
    }

    #[test]
    fn test_stat_id_from_dropdown() {
        let html = r#"
        <select id="year_stat_category_id">
          <option value="15687">Hitting</option>
          <option value="15688">Pitching</option>
          <option value="15689">Fielding</option>
        </select>"#;
        assert_eq!(
            stat_id_from_dropdown(html, 2025, StatCategory::Batting).unwrap(),
            15687
        );
        assert_eq!(
            stat_id_from_dropdown(html, 2025, StatCategory::Fielding).unwrap(),
            15689
        );
        assert!(stat_id_from_dropdown("<p></p>", 2025, StatCategory::Batting).is_err());
    }

    const SEASON_BATTING: &str = r#"
    <table id="stat_grid" class="small_font dataTable table-bordered">
      <thead>
        <tr>
          <th>#</th><th>Player</th><th>Yr</th><th>Pos</th><th>Ht</th><th>B/T</th>
          <th>GP</th><th>GS</th><th>BA</th><th>AB</th><th>H</th><th>HR</th><th>K</th>
        </tr>
      </thead>
      <tbody>
        <tr class="text">
          <td>20</td>
          <td data-order="Skenes,Paul"><a href="/players/8480532?year_stat_category_id=15080">Skenes, Paul</a></td>
          <td>Jr</td><td>P</td><td>6-6</td><td>R/R</td>
          <td>55</td><td>54</td><td>.314</td><td>210</td><td>66</td><td>12</td><td>31</td>
        </tr>
        <tr class="grey_heading">
          <td></td><td>Totals</td><td></td><td></td><td></td><td></td>
          <td></td><td></td><td>.301</td><td>1902</td><td>573</td><td>88</td><td>401</td>
        </tr>
      </tbody>
    </table>"#;

    #[test]
    fn test_batting_season_lines() {
        let table = parse(SEASON_BATTING, "table#stat_grid");
        let lines = batting_season_lines(&team(), 15080, &table);
        assert_eq!(lines.len(), 1);

        let line = &lines[0];
        assert_eq!(line.player_id, Some(8480532));
        assert_eq!(line.player_name, "Paul Skenes");
        assert_eq!(line.jersey_number.as_deref(), Some("20"));
        assert_eq!(line.bats_throws.as_deref(), Some("R/R"));
        assert_eq!(line.games_played, Some(55));
        assert_eq!(line.batting_average, Some(0.314));
        assert_eq!(line.at_bats, Some(210));
        assert_eq!(line.home_runs, Some(12));
        assert_eq!(line.strikeouts, Some(31));
        assert_eq!(line.stat_category_id, 15080);
        assert_eq!(line.team_id, 574223);
    }

    const SEASON_PITCHING: &str = r#"
    <table id="stat_grid">
      <thead>
        <tr>
          <th>#</th><th>Player</th><th>Yr</th><th>Pos</th><th>Ht</th><th>B/T</th>
          <th>App</th><th>GS</th><th>ERA</th><th>IP</th><th>SO</th><th>P-OAB</th>
          <th>Inh Run</th><th>pickoffs</th>
        </tr>
      </thead>
      <tbody>
        <tr class="text">
          <td>20</td>
          <td data-order="Skenes,Paul"><a href="/players/8480532">Skenes, Paul</a></td>
          <td>Jr</td><td>P</td><td>6-6</td><td>R/R</td>
          <td>19</td><td>19</td><td>1.69</td><td>122.2</td><td>209</td><td>435</td>
          <td>3</td><td>2</td>
        </tr>
      </tbody>
    </table>"#;

    #[test]
    fn test_pitching_season_lines() {
        let table = parse(SEASON_PITCHING, "table#stat_grid");
        let lines = pitching_season_lines(&team(), 15081, &table);
        assert_eq!(lines.len(), 1);

        let line = &lines[0];
        assert_eq!(line.appearances, Some(19));
        assert_eq!(line.earned_run_average, Some(1.69));
        assert_eq!(line.innings_pitched_raw.as_deref(), Some("122.2"));
        let ip = line.innings_pitched.unwrap();
        assert!((ip - 122.667).abs() < 0.001);
        assert_eq!(line.strikeouts, Some(209));
        assert_eq!(line.opponent_at_bats, Some(435));
        assert_eq!(line.inherited_runners, Some(3));
        assert_eq!(line.pickoffs, Some(2));
    }

    const BOX_TABLE: &str = r#"
    <table>
      <thead>
        <tr><th>#</th><th>Name</th><th>P</th><th>AB</th><th>R</th><th>H</th><th>RBI</th></tr>
      </thead>
      <tbody>
        <tr>
          <td>7</td>
          <td><a href="/players/8480001">Crews, Dylan</a></td>
          <td>CF</td><td>4</td><td>2</td><td>3</td><td>1</td>
        </tr>
        <tr>
          <td>15</td>
          <td>&#160;<a href="/players/8480002">White, Tre</a></td>
          <td>PH</td><td>1</td><td>0</td><td>0</td><td>0</td>
        </tr>
        <tr>
          <td></td><td>TEAM</td><td></td><td></td><td>1</td><td></td><td></td>
        </tr>
        <tr>
          <td></td><td>Totals</td><td></td><td>33</td><td>8</td><td>11</td><td>7</td>
        </tr>
      </tbody>
    </table>"#;

    #[test]
    fn test_batting_box_lines() {
        let table = parse(BOX_TABLE, "table");
        let lines = batting_box_lines(&meta(), 574223, &table);

        // Two players and the TEAM pseudo-row; the totals row is dropped.
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].player_id, 8480001);
        assert_eq!(lines[0].games_started, 1);
        assert_eq!(lines[0].at_bats, Some(4));

        // The pinch hitter's name cell is nbsp-indented.
        assert_eq!(lines[1].player_id, 8480002);
        assert_eq!(lines[1].games_started, 0);

        let team_row = &lines[2];
        assert_eq!(team_row.player_id, -574223);
        assert_eq!(team_row.player_name, "TEAM");
        assert_eq!(team_row.runs, Some(1));
    }

    const PITCHING_BOX: &str = r#"
    <table>
      <thead>
        <tr><th>#</th><th>Name</th><th>P</th><th>IP</th><th>H</th><th>ER</th><th>SO</th></tr>
      </thead>
      <tbody>
        <tr>
          <td>20</td>
          <td><a href="/players/8480532">Skenes, Paul</a></td>
          <td>P</td><td>6.1</td><td>3</td><td>1</td><td>12</td>
        </tr>
        <tr>
          <td>33</td>
          <td><a href="/players/8480003">Floyd, Gavin</a></td>
          <td>P</td><td>2.2</td><td>1</td><td>0</td><td>4</td>
        </tr>
      </tbody>
    </table>"#;

    #[test]
    fn test_pitching_box_order() {
        let table = parse(PITCHING_BOX, "table");
        let lines = pitching_box_lines(&meta(), 574223, &table);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].order_appeared, 1);
        assert_eq!(lines[1].order_appeared, 2);
        let ip = lines[0].innings_pitched.unwrap();
        assert!((ip - 6.333).abs() < 0.001);
        assert_eq!(lines[1].innings_pitched_raw.as_deref(), Some("2.2"));
    }

    #[test]
    fn test_team_box_lines() {
        let mut game_box = GameBox::default();
        let bat_table = parse(BOX_TABLE, "table");
        game_box.batting = batting_box_lines(&meta(), 574223, &bat_table);

        let fld = FieldingBoxLine {
            game_id: 4525569,
            season: 2024,
            team_id: 574223,
            player_id: 8480001,
            jersey_number: None,
            player_name: "Crews, Dylan".to_string(),
            positions: None,
            games_played: 1,
            games_started: 1,
            putouts: Some(5),
            assists: Some(1),
            total_chances: Some(6),
            errors: Some(0),
            catcher_interference: None,
            passed_balls: None,
            stolen_bases_allowed: Some(3),
            runners_caught_stealing: Some(1),
            double_plays: None,
            triple_plays: None,
        };
        game_box.fielding = vec![fld];

        let teams = team_box_lines(&game_box);
        assert_eq!(teams.len(), 1);
        let t = &teams[0];
        assert_eq!(t.team_id, 574223);
        // 4 + 1 player at-bats; TEAM row adds its unattributed run.
        assert_eq!(t.batting_at_bats, 5);
        assert_eq!(t.batting_runs, 3);
        assert_eq!(t.fielding_stolen_bases_allowed, 3);
        let pct = t.fielding_stolen_base_pct.unwrap();
        assert!((pct - 0.75).abs() < 0.001);
    }

    #[test]
    fn test_inning_plays() {
        let cards = vec![
            PeriodCard {
                heading: "1st Inning".to_string(),
                rows: vec![
                    vec![
                        "Crews singled to left.".to_string(),
                        "0-0".to_string(),
                        String::new(),
                    ],
                    vec![
                        String::new(),
                        "0-1".to_string(),
                        "Smith homered.".to_string(),
                    ],
                    vec![String::new(), "R H E".to_string(), String::new()],
                ],
            },
            PeriodCard {
                heading: "2nd Inning".to_string(),
                rows: vec![vec![
                    "Jones walked.".to_string(),
                    "0-1".to_string(),
                    String::new(),
                ]],
            },
        ];

        let plays = inning_plays(&meta(), &cards);
        assert_eq!(plays.len(), 3);

        assert_eq!(plays[0].inning, 1);
        assert!(plays[0].top_of_inning);
        assert_eq!(plays[0].batting_team_id, 574223);
        assert_eq!(plays[0].away_score, Some(0));

        assert!(!plays[1].top_of_inning);
        assert_eq!(plays[1].batting_team_id, 574077);
        assert_eq!(plays[1].home_score, Some(1));
        // The side summary row has no score to parse but keeps its slot out
        // of the log entirely.
        assert_eq!(plays[2].inning, 2);
        assert_eq!(plays[2].event_number, 3);
    }
}
