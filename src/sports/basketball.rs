//! Basketball: team lists, schedules, rosters, season and game-log
//! stats, box scores, clocked play-by-play, and starting lineups.
//!
//! The men's and women's games are separate sports to the site (`MBB`,
//! `WBB`); the [`Gender`] passed at construction picks between them.
//! Season stats come as a single table rather than the bat-and-ball
//! category split, and shooting rates are recomputed from the raw makes
//! and attempts instead of trusting the page's rounded columns.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::cache;
use crate::config::ScrapeConfig;
use crate::error::{Error, Result};
use crate::models::{Division, GameMeta, Gender, RosterMember, ScheduleGame, ScoreboardGame, Team};
use crate::pages::boxscore::StatBox;
use crate::pages::gamelog;
use crate::pages::pbp::{self, PeriodCard};
use crate::pages::stat_table::{self, HtmlTable, RowView};
use crate::sports::engine::SportEngine;
use crate::utils::text;

/// One player's season-to-date line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeasonLine {
    pub season: u16,
    pub team_id: i64,
    pub school_id: Option<i64>,
    pub school_name: String,
    pub division: Division,
    pub conference: Option<String>,
    pub player_id: Option<i64>,
    pub jersey_number: Option<String>,
    pub player_name: String,
    pub class_year: Option<String>,
    pub positions: Option<String>,
    pub height: Option<String>,
    pub games_played: Option<u16>,
    pub games_started: Option<u16>,
    /// Minutes played as the site prints them, `275:30`.
    pub minutes: Option<String>,
    pub minutes_seconds: Option<u32>,
    pub field_goals_made: Option<u16>,
    pub field_goals_attempted: Option<u16>,
    pub field_goal_pct: Option<f32>,
    pub three_pointers_made: Option<u16>,
    pub three_pointers_attempted: Option<u16>,
    pub three_point_pct: Option<f32>,
    pub two_pointers_made: Option<u16>,
    pub two_pointers_attempted: Option<u16>,
    pub two_point_pct: Option<f32>,
    pub free_throws_made: Option<u16>,
    pub free_throws_attempted: Option<u16>,
    pub free_throw_pct: Option<f32>,
    pub points: Option<u16>,
    pub offensive_rebounds: Option<u16>,
    pub defensive_rebounds: Option<u16>,
    pub total_rebounds: Option<u16>,
    pub assists: Option<u16>,
    pub turnovers: Option<u16>,
    pub steals: Option<u16>,
    pub blocks: Option<u16>,
    pub fouls: Option<u16>,
    /// Not published for every season.
    pub technical_fouls: Option<u16>,
    pub disqualifications: Option<u16>,
    pub double_doubles: Option<u16>,
    pub triple_doubles: Option<u16>,
    pub effective_fg_pct: Option<f32>,
    pub true_shooting_attempts: f32,
    pub true_shooting_pct: Option<f32>,
    pub turnover_pct: Option<f32>,
}

/// One game of a player's game log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameLine {
    pub player_id: i64,
    pub season: u16,
    pub game_id: Option<i64>,
    pub game_date: NaiveDate,
    pub game_num: u8,
    pub opponent_id: Option<i64>,
    pub opponent_name: String,
    /// Raw result cell, e.g. `W 78-64`.
    pub result: String,
    pub games_played: Option<u16>,
    pub games_started: Option<u16>,
    pub minutes: Option<String>,
    pub minutes_seconds: Option<u32>,
    pub field_goals_made: Option<u16>,
    pub field_goals_attempted: Option<u16>,
    pub field_goal_pct: Option<f32>,
    pub three_pointers_made: Option<u16>,
    pub three_pointers_attempted: Option<u16>,
    pub three_point_pct: Option<f32>,
    pub two_pointers_made: Option<u16>,
    pub two_pointers_attempted: Option<u16>,
    pub two_point_pct: Option<f32>,
    pub free_throws_made: Option<u16>,
    pub free_throws_attempted: Option<u16>,
    pub free_throw_pct: Option<f32>,
    pub points: Option<u16>,
    pub offensive_rebounds: Option<u16>,
    pub defensive_rebounds: Option<u16>,
    pub total_rebounds: Option<u16>,
    pub assists: Option<u16>,
    pub turnovers: Option<u16>,
    pub steals: Option<u16>,
    pub blocks: Option<u16>,
    pub fouls: Option<u16>,
    pub technical_fouls: Option<u16>,
    pub disqualifications: Option<u16>,
    pub double_doubles: Option<u16>,
    pub triple_doubles: Option<u16>,
    pub effective_fg_pct: Option<f32>,
    pub true_shooting_attempts: f32,
    pub true_shooting_pct: Option<f32>,
    pub turnover_pct: Option<f32>,
}

/// One player's line in a game's box score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerBoxLine {
    pub game_id: i64,
    pub season: u16,
    pub team_id: i64,
    pub player_id: i64,
    pub jersey_number: Option<String>,
    pub player_name: String,
    pub positions: Option<String>,
    pub games_played: u16,
    pub minutes: Option<String>,
    pub minutes_seconds: u32,
    pub field_goals_made: Option<u16>,
    pub field_goals_attempted: Option<u16>,
    pub field_goal_pct: Option<f32>,
    pub three_pointers_made: Option<u16>,
    pub three_pointers_attempted: Option<u16>,
    pub three_point_pct: Option<f32>,
    pub two_pointers_made: Option<u16>,
    pub two_pointers_attempted: Option<u16>,
    pub two_point_pct: Option<f32>,
    pub free_throws_made: Option<u16>,
    pub free_throws_attempted: Option<u16>,
    pub free_throw_pct: Option<f32>,
    pub points: Option<u16>,
    pub offensive_rebounds: Option<u16>,
    pub defensive_rebounds: Option<u16>,
    pub total_rebounds: Option<u16>,
    pub assists: Option<u16>,
    pub turnovers: Option<u16>,
    pub steals: Option<u16>,
    pub blocks: Option<u16>,
    pub fouls: Option<u16>,
    pub technical_fouls: Option<u16>,
    pub disqualifications: Option<u16>,
    /// Ten or more in two of points, rebounds, assists, blocks, steals.
    pub double_double: bool,
    pub triple_double: bool,
    pub effective_fg_pct: Option<f32>,
    pub true_shooting_attempts: f32,
    pub true_shooting_pct: Option<f32>,
    pub turnover_pct: Option<f32>,
}

/// A team's box totals: the countable columns summed over its players,
/// rates recomputed from the sums.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamBoxLine {
    pub game_id: i64,
    pub season: u16,
    pub team_id: i64,
    pub minutes: String,
    pub minutes_seconds: u32,
    pub field_goals_made: u16,
    pub field_goals_attempted: u16,
    pub field_goal_pct: Option<f32>,
    pub three_pointers_made: u16,
    pub three_pointers_attempted: u16,
    pub three_point_pct: Option<f32>,
    pub two_pointers_made: u16,
    pub two_pointers_attempted: u16,
    pub two_point_pct: Option<f32>,
    pub free_throws_made: u16,
    pub free_throws_attempted: u16,
    pub free_throw_pct: Option<f32>,
    pub points: u16,
    pub offensive_rebounds: u16,
    pub defensive_rebounds: u16,
    pub total_rebounds: u16,
    pub assists: u16,
    pub turnovers: u16,
    pub steals: u16,
    pub blocks: u16,
    pub fouls: u16,
    pub technical_fouls: u16,
    pub disqualifications: u16,
    /// How many of the team's players posted a double-double.
    pub double_doubles: u16,
    pub triple_doubles: u16,
    pub effective_fg_pct: Option<f32>,
    pub true_shooting_attempts: f32,
    pub true_shooting_pct: Option<f32>,
    pub turnover_pct: Option<f32>,
}

/// One clocked play-by-play event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamePlay {
    pub game_id: i64,
    pub season: u16,
    pub away_team_id: i64,
    pub home_team_id: i64,
    /// Half 1 and 2 in regulation; overtime periods count from 3.
    pub half: u8,
    pub is_overtime: bool,
    /// Position in the game's event stream, counted from 1.
    pub event_number: u32,
    /// Clock as printed, `MM:SS` with an optional centisecond field.
    pub clock: String,
    pub half_seconds_remaining: u32,
    pub clock_centiseconds: u16,
    /// Half clock plus the untouched second half for first-half events;
    /// second-half and overtime events count their own clock only.
    pub game_seconds_remaining: u32,
    pub event_team_id: i64,
    pub event_text: String,
    /// Running score after the event, `(away, home)` carried forward
    /// across rows without a readable score cell.
    pub away_score: u16,
    pub home_score: u16,
}

/// Scraper for NCAA basketball, men's or women's per the constructor.
pub struct BasketballScraper {
    engine: SportEngine,
}

impl BasketballScraper {
    pub fn new(config: &ScrapeConfig, gender: Gender) -> Result<Self> {
        let info = match gender {
            Gender::Mens => &super::MENS_BASKETBALL,
            Gender::Womens => &super::WOMENS_BASKETBALL,
        };
        Ok(Self {
            engine: SportEngine::new(config, info)?,
        })
    }

    /// Teams fielding basketball in one season and division.
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

    /// Season lines for every player on a team.
    pub async fn season_stats(&self, team_id: i64) -> Result<Vec<PlayerSeasonLine>> {
        let team = self.engine.find_team(team_id).await?;
        let rel = self.engine.rel(&format!("player_season_stats/{team_id}.csv"));
        let today = Local::now().date_naive();
        let max_age = cache::in_season_max_age(team.season, today, 1);
        if let Some(rows) = self.engine.cache.load_if_fresh::<PlayerSeasonLine>(&rel, max_age) {
            return Ok(rows);
        }

        let html = self.engine.season_stats_html(team_id, None).await?;
        let table = stat_table::parse_stat_grid(&html)?;
        let lines = season_lines(&team, &table);
        self.engine.cache.store(&rel, &lines)?;
        Ok(lines)
    }

    /// Game-by-game lines from a player's page.
    pub async fn player_game_stats(
        &self,
        player_id: i64,
        season: u16,
    ) -> Result<Vec<PlayerGameLine>> {
        let rel = self
            .engine
            .rel(&format!("player_game_stats/{season}_{player_id}.csv"));
        let today = Local::now().date_naive();
        let max_age = cache::in_season_max_age(season, today, 1);
        if let Some(rows) = self.engine.cache.load_if_fresh::<PlayerGameLine>(&rel, max_age) {
            return Ok(rows);
        }

        let html = self.engine.player_page_html(player_id, None).await?;
        let table = gamelog::parse_player_gamelog(&html)?;
        let lines = game_lines(player_id, season, &table);
        self.engine.cache.store(&rel, &lines)?;
        Ok(lines)
    }

    /// Every player's box score line for one game.
    pub async fn game_player_stats(&self, game_id: i64) -> Result<Vec<PlayerBoxLine>> {
        game_box(&self.engine, game_id).await
    }

    /// Both teams' summed box score totals for one game.
    pub async fn game_team_stats(&self, game_id: i64) -> Result<Vec<TeamBoxLine>> {
        let lines = game_box(&self.engine, game_id).await?;
        Ok(team_box_lines(&lines))
    }

    /// The raw play-by-play log for one game.
    pub async fn raw_pbp(&self, game_id: i64) -> Result<Vec<GamePlay>> {
        clocked_pbp(&self.engine, game_id).await
    }

    /// The ten starters of a game, read from substitution events: the
    /// first five distinct names subbing out per team, away five first.
    /// Starters are ordered by when they first left the floor, nothing
    /// positional.
    pub async fn game_starters(&self, game_id: i64) -> Result<Vec<String>> {
        let plays = self.raw_pbp(game_id).await?;
        starting_fives(&plays)
    }
}

/// Makes, attempts, and the rates derived from them. The site rounds
/// its percentage columns to three places; recomputing from the counts
/// keeps four.
#[derive(Debug, Clone, Copy, Default)]
struct ShotTotals {
    field_goals_made: u16,
    field_goals_attempted: u16,
    three_made: u16,
    three_attempted: u16,
    free_throws_made: u16,
    free_throws_attempted: u16,
    points: u16,
    turnovers: u16,
}

impl ShotTotals {
    fn from_view(view: &RowView<'_>) -> Self {
        Self {
            field_goals_made: view.u16(&["FGM", "FG"]).unwrap_or(0),
            field_goals_attempted: view.u16(&["FGA"]).unwrap_or(0),
            three_made: view.u16(&["3FG", "3PM"]).unwrap_or(0),
            three_attempted: view.u16(&["3FGA", "3PA"]).unwrap_or(0),
            free_throws_made: view.u16(&["FT", "FTM"]).unwrap_or(0),
            free_throws_attempted: view.u16(&["FTA"]).unwrap_or(0),
            points: view.u16(&["PTS"]).unwrap_or(0),
            turnovers: view.u16(&["TO", "TOV"]).unwrap_or(0),
        }
    }

    fn two_made(&self) -> u16 {
        self.field_goals_made.saturating_sub(self.three_made)
    }

    fn two_attempted(&self) -> u16 {
        self.field_goals_attempted.saturating_sub(self.three_attempted)
    }

    fn field_goal_pct(&self) -> Option<f32> {
        ratio(self.field_goals_made, self.field_goals_attempted)
    }

    fn three_point_pct(&self) -> Option<f32> {
        ratio(self.three_made, self.three_attempted)
    }

    fn two_point_pct(&self) -> Option<f32> {
        ratio(self.two_made(), self.two_attempted())
    }

    fn free_throw_pct(&self) -> Option<f32> {
        ratio(self.free_throws_made, self.free_throws_attempted)
    }

    fn effective_fg_pct(&self) -> Option<f32> {
        if self.field_goals_attempted == 0 {
            return None;
        }
        let made = self.field_goals_made as f32 + 0.5 * self.three_made as f32;
        Some(round4(made / self.field_goals_attempted as f32))
    }

    /// FGA + 0.44 FTA.
    fn true_shooting_attempts(&self) -> f32 {
        round4(self.field_goals_attempted as f32 + 0.44 * self.free_throws_attempted as f32)
    }

    fn true_shooting_pct(&self) -> Option<f32> {
        let tsa = self.true_shooting_attempts();
        if tsa > 0.0 {
            Some(round4(self.points as f32 / (2.0 * tsa)))
        } else {
            None
        }
    }

    fn turnover_pct(&self) -> Option<f32> {
        let denom = self.true_shooting_attempts() + self.turnovers as f32;
        if denom > 0.0 {
            Some(round4(self.turnovers as f32 / denom))
        } else {
            None
        }
    }
}

fn ratio(makes: u16, attempts: u16) -> Option<f32> {
    if attempts == 0 {
        None
    } else {
        Some(round4(makes as f32 / attempts as f32))
    }
}

fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

fn minutes_fields(view: &RowView<'_>) -> (Option<String>, Option<u32>) {
    let minutes = view.string(&["MP", "Min"]);
    let seconds = minutes
        .as_deref()
        .and_then(text::parse_clock)
        .map(|(secs, _)| secs);
    (minutes, seconds)
}

fn season_lines(team: &Team, table: &HtmlTable) -> Vec<PlayerSeasonLine> {
    let mut lines = Vec::new();
    for view in table.views() {
        // Player rows carry the `text` class; the trailing rows are
        // team totals and repeat the team in the name cell.
        if !view.row().has_class("text") {
            continue;
        }
        let Some(name_cell) = view.cell(&["Player", "Name"]) else {
            continue;
        };
        if name_cell.text.to_lowercase().contains("team") {
            continue;
        }
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
        let (minutes, minutes_seconds) = minutes_fields(&view);
        let shots = ShotTotals::from_view(&view);

        lines.push(PlayerSeasonLine {
            season: team.season,
            team_id: team.team_id,
            school_id: team.school_id,
            school_name: team.school_name.clone(),
            division: team.division,
            conference: team.conference.clone(),
            player_id,
            jersey_number: view.string(&["#"]),
            player_name,
            class_year: view.string(&["Yr"]),
            positions: view.string(&["Pos"]),
            height: view.string(&["Ht"]),
            games_played: view.u16(&["GP", "G"]),
            games_started: view.u16(&["GS"]),
            minutes,
            minutes_seconds,
            field_goals_made: view.u16(&["FGM"]),
            field_goals_attempted: view.u16(&["FGA"]),
            field_goal_pct: shots.field_goal_pct(),
            three_pointers_made: view.u16(&["3FG", "3PM"]),
            three_pointers_attempted: view.u16(&["3FGA", "3PA"]),
            three_point_pct: shots.three_point_pct(),
            two_pointers_made: Some(shots.two_made()),
            two_pointers_attempted: Some(shots.two_attempted()),
            two_point_pct: shots.two_point_pct(),
            free_throws_made: view.u16(&["FT", "FTM"]),
            free_throws_attempted: view.u16(&["FTA"]),
            free_throw_pct: shots.free_throw_pct(),
            points: view.u16(&["PTS"]),
            offensive_rebounds: view.u16(&["ORebs", "Off Reb", "ORB"]),
            defensive_rebounds: view.u16(&["DRebs", "Def Reb", "DRB"]),
            total_rebounds: view.u16(&["Tot Reb", "TotReb", "TRB"]),
            assists: view.u16(&["AST"]),
            turnovers: view.u16(&["TO", "TOV"]),
            steals: view.u16(&["ST", "STL"]),
            blocks: view.u16(&["BLKS", "BLK"]),
            fouls: view.u16(&["Fouls", "PF"]),
            technical_fouls: view.u16(&["Tech Fouls", "TechFouls", "TF"]),
            disqualifications: view.u16(&["DQ"]),
            double_doubles: view.u16(&["Dbl Dbl", "DBL_DBL"]),
            triple_doubles: view.u16(&["Trpl Dbl", "TRP_DBL"]),
            effective_fg_pct: shots.effective_fg_pct(),
            true_shooting_attempts: shots.true_shooting_attempts(),
            true_shooting_pct: shots.true_shooting_pct(),
            turnover_pct: shots.turnover_pct(),
        });
    }
    lines
}

fn game_lines(player_id: i64, season: u16, table: &HtmlTable) -> Vec<PlayerGameLine> {
    let mut lines = Vec::new();
    for (entry, view) in gamelog::gamelog_entries(table) {
        let (minutes, minutes_seconds) = minutes_fields(&view);
        let shots = ShotTotals::from_view(&view);
        lines.push(PlayerGameLine {
            player_id,
            season,
            game_id: entry.game_id,
            game_date: entry.game_date,
            game_num: entry.game_num,
            opponent_id: entry.opponent_id,
            opponent_name: entry.opponent_name,
            result: entry.result_text,
            games_played: view.u16(&["GP", "G"]),
            games_started: view.u16(&["GS"]),
            minutes,
            minutes_seconds,
            field_goals_made: view.u16(&["FGM"]),
            field_goals_attempted: view.u16(&["FGA"]),
            field_goal_pct: shots.field_goal_pct(),
            three_pointers_made: view.u16(&["3FG", "3PM"]),
            three_pointers_attempted: view.u16(&["3FGA", "3PA"]),
            three_point_pct: shots.three_point_pct(),
            two_pointers_made: Some(shots.two_made()),
            two_pointers_attempted: Some(shots.two_attempted()),
            two_point_pct: shots.two_point_pct(),
            free_throws_made: view.u16(&["FT", "FTM"]),
            free_throws_attempted: view.u16(&["FTA"]),
            free_throw_pct: shots.free_throw_pct(),
            points: view.u16(&["PTS"]),
            offensive_rebounds: view.u16(&["ORebs", "Off Reb", "ORB"]),
            defensive_rebounds: view.u16(&["DRebs", "Def Reb", "DRB"]),
            total_rebounds: view.u16(&["Tot Reb", "TotReb", "TRB"]),
            assists: view.u16(&["AST"]),
            turnovers: view.u16(&["TO", "TOV"]),
            steals: view.u16(&["ST", "STL"]),
            blocks: view.u16(&["BLKS", "BLK"]),
            fouls: view.u16(&["Fouls", "PF"]),
            technical_fouls: view.u16(&["Tech Fouls", "TechFouls", "TF"]),
            disqualifications: view.u16(&["DQ"]),
            double_doubles: view.u16(&["Dbl Dbl", "DBL_DBL"]),
            triple_doubles: view.u16(&["Trpl Dbl", "TRP_DBL"]),
            effective_fg_pct: shots.effective_fg_pct(),
            true_shooting_attempts: shots.true_shooting_attempts(),
            true_shooting_pct: shots.true_shooting_pct(),
            turnover_pct: shots.turnover_pct(),
        });
    }
    lines
}

fn box_lines(meta: &GameMeta, boxes: &[StatBox]) -> Vec<PlayerBoxLine> {
    let mut lines = Vec::new();
    for stat_box in boxes {
        let team_name = stat_box.heading.replace("Period Stats", "");
        let team_name = team_name.trim();
        for row in &stat_box.table.rows {
            let view = stat_box.table.view(row);
            if let Some(line) = box_line(meta, stat_box.team_id, team_name, &view) {
                lines.push(line);
            }
        }
    }
    lines
}

fn box_line(
    meta: &GameMeta,
    team_id: i64,
    team_name: &str,
    view: &RowView<'_>,
) -> Option<PlayerBoxLine> {
    let name_cell = view.cell(&["Name", "Player"])?;
    let player_name = name_cell.text.clone();
    // Totals rows repeat the team name; bench events get a `TEAM` row.
    // Neither is a player.
    if player_name.is_empty()
        || player_name.eq_ignore_ascii_case("team")
        || (!team_name.is_empty() && player_name.contains(team_name))
    {
        return None;
    }
    let player_id = view
        .row()
        .cells
        .iter()
        .find_map(|c| c.id_in_href("/players/"))?;

    let (minutes, minutes_seconds) = minutes_fields(view);
    let shots = ShotTotals::from_view(view);
    let points = view.u16(&["PTS"]);
    let total_rebounds = view.u16(&["Tot Reb", "TotReb", "TRB"]);
    let assists = view.u16(&["AST"]);
    let blocks = view.u16(&["BLKS", "BLK"]);
    let steals = view.u16(&["ST", "STL"]);
    let tens = [points, total_rebounds, assists, blocks, steals]
        .iter()
        .filter(|v| v.unwrap_or(0) >= 10)
        .count();

    Some(PlayerBoxLine {
        game_id: meta.game_id,
        season: meta.season,
        team_id,
        player_id,
        jersey_number: view.string(&["#"]),
        player_name,
        positions: view.string(&["P", "Pos"]),
        games_played: 1,
        minutes,
        minutes_seconds: minutes_seconds.unwrap_or(0),
        field_goals_made: view.u16(&["FGM"]),
        field_goals_attempted: view.u16(&["FGA"]),
        field_goal_pct: shots.field_goal_pct(),
        three_pointers_made: view.u16(&["3FG", "3PM"]),
        three_pointers_attempted: view.u16(&["3FGA", "3PA"]),
        three_point_pct: shots.three_point_pct(),
        two_pointers_made: Some(shots.two_made()),
        two_pointers_attempted: Some(shots.two_attempted()),
        two_point_pct: shots.two_point_pct(),
        free_throws_made: view.u16(&["FT", "FTM"]),
        free_throws_attempted: view.u16(&["FTA"]),
        free_throw_pct: shots.free_throw_pct(),
        points,
        offensive_rebounds: view.u16(&["ORebs", "Off Reb", "ORB"]),
        defensive_rebounds: view.u16(&["DRebs", "Def Reb", "DRB"]),
        total_rebounds,
        assists,
        turnovers: view.u16(&["TO", "TOV"]),
        steals,
        blocks,
        fouls: view.u16(&["Fouls", "PF"]),
        technical_fouls: view.u16(&["Tech Fouls", "TechFouls", "TF"]),
        disqualifications: view.u16(&["DQ"]),
        double_double: tens >= 2,
        triple_double: tens >= 3,
        effective_fg_pct: shots.effective_fg_pct(),
        true_shooting_attempts: shots.true_shooting_attempts(),
        true_shooting_pct: shots.true_shooting_pct(),
        turnover_pct: shots.turnover_pct(),
    })
}

async fn game_box(engine: &SportEngine, game_id: i64) -> Result<Vec<PlayerBoxLine>> {
    let rel = engine.rel(&format!("game_stats/player/{game_id}.csv"));
    if let Some(rows) = engine.cache.load_if_fresh::<PlayerBoxLine>(&rel, cache::GAME_MAX_AGE) {
        return Ok(rows);
    }
    let (meta, boxes) = engine.box_score_page(game_id).await?;
    let lines = box_lines(&meta, &boxes);
    engine.cache.store(&rel, &lines)?;
    Ok(lines)
}

fn add(total: &mut u16, value: Option<u16>) {
    *total = total.saturating_add(value.unwrap_or(0));
}

fn team_box_lines(lines: &[PlayerBoxLine]) -> Vec<TeamBoxLine> {
    let mut teams: Vec<TeamBoxLine> = Vec::new();
    for line in lines {
        let idx = match teams.iter().position(|t| t.team_id == line.team_id) {
            Some(idx) => idx,
            None => {
                teams.push(TeamBoxLine {
                    game_id: line.game_id,
                    season: line.season,
                    team_id: line.team_id,
                    ..TeamBoxLine::default()
                });
                teams.len() - 1
            }
        };
        let team = &mut teams[idx];
        team.minutes_seconds += line.minutes_seconds;
        add(&mut team.field_goals_made, line.field_goals_made);
        add(&mut team.field_goals_attempted, line.field_goals_attempted);
        add(&mut team.three_pointers_made, line.three_pointers_made);
        add(&mut team.three_pointers_attempted, line.three_pointers_attempted);
        add(&mut team.free_throws_made, line.free_throws_made);
        add(&mut team.free_throws_attempted, line.free_throws_attempted);
        add(&mut team.points, line.points);
        add(&mut team.offensive_rebounds, line.offensive_rebounds);
        add(&mut team.defensive_rebounds, line.defensive_rebounds);
        add(&mut team.total_rebounds, line.total_rebounds);
        add(&mut team.assists, line.assists);
        add(&mut team.turnovers, line.turnovers);
        add(&mut team.steals, line.steals);
        add(&mut team.blocks, line.blocks);
        add(&mut team.fouls, line.fouls);
        add(&mut team.technical_fouls, line.technical_fouls);
        add(&mut team.disqualifications, line.disqualifications);
        if line.double_double {
            team.double_doubles += 1;
        }
        if line.triple_double {
            team.triple_doubles += 1;
        }
    }

    for team in &mut teams {
        let shots = ShotTotals {
            field_goals_made: team.field_goals_made,
            field_goals_attempted: team.field_goals_attempted,
            three_made: team.three_pointers_made,
            three_attempted: team.three_pointers_attempted,
            free_throws_made: team.free_throws_made,
            free_throws_attempted: team.free_throws_attempted,
            points: team.points,
            turnovers: team.turnovers,
        };
        team.minutes = text::format_clock(team.minutes_seconds);
        team.two_pointers_made = shots.two_made();
        team.two_pointers_attempted = shots.two_attempted();
        team.field_goal_pct = shots.field_goal_pct();
        team.three_point_pct = shots.three_point_pct();
        team.two_point_pct = shots.two_point_pct();
        team.free_throw_pct = shots.free_throw_pct();
        team.effective_fg_pct = shots.effective_fg_pct();
        team.true_shooting_attempts = shots.true_shooting_attempts();
        team.true_shooting_pct = shots.true_shooting_pct();
        team.turnover_pct = shots.turnover_pct();
    }
    teams
}

/// Flattens period cards into clocked plays. Rows read clock, away
/// text, running score, home text; rows with neither side's text are
/// scoreboard chrome and dropped.
fn clocked_plays(meta: &GameMeta, cards: &[PeriodCard]) -> Vec<GamePlay> {
    let mut plays = Vec::new();
    let (mut away_score, mut home_score) = (0u16, 0u16);
    for card in cards {
        let Some(number) = card.number() else {
            continue;
        };
        let is_overtime = card.is_overtime();
        let half = if is_overtime { number + 2 } else { number };
        for row in &card.rows {
            if row.len() < 4 {
                continue;
            }
            let Some((half_seconds, centis)) = text::parse_clock(&row[0]) else {
                continue;
            };
            let (event_team_id, event_text) = if !row[1].is_empty() {
                (meta.away_team_id, row[1].clone())
            } else if !row[3].is_empty() {
                (meta.home_team_id, row[3].clone())
            } else {
                continue;
            };
            // Start/end/timeout rows print no score; the previous one
            // stands.
            if let Some((away, home)) = pbp::parse_running_score(&row[2]) {
                away_score = away;
                home_score = home;
            }
            let game_seconds = if half == 1 {
                half_seconds + 1200
            } else {
                half_seconds
            };
            plays.push(GamePlay {
                game_id: meta.game_id,
                season: meta.season,
                away_team_id: meta.away_team_id,
                home_team_id: meta.home_team_id,
                half,
                is_overtime,
                event_number: 0,
                clock: row[0].clone(),
                half_seconds_remaining: half_seconds,
                clock_centiseconds: centis,
                game_seconds_remaining: game_seconds,
                event_team_id,
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

async fn clocked_pbp(engine: &SportEngine, game_id: i64) -> Result<Vec<GamePlay>> {
    let rel = engine.rel(&format!("raw_pbp/{game_id}_raw_pbp.csv"));
    if let Some(rows) = engine.cache.load_if_fresh::<GamePlay>(&rel, cache::GAME_MAX_AGE) {
        return Ok(rows);
    }
    let (meta, cards) = engine.pbp_page(game_id).await?;
    let plays = clocked_plays(&meta, &cards);
    engine.cache.store(&rel, &plays)?;
    Ok(plays)
}

/// Substitution events name the player ahead of the first comma. `team`
/// events and repeat sub-outs of the same player do not count.
fn starting_fives(plays: &[GamePlay]) -> Result<Vec<String>> {
    let Some(first) = plays.first() else {
        return Err(Error::markup("no play-by-play events to read starters from"));
    };
    let mut starters = Vec::with_capacity(10);
    for team_id in [first.away_team_id, first.home_team_id] {
        let mut five: Vec<String> = Vec::with_capacity(5);
        for play in plays.iter().filter(|p| p.event_team_id == team_id) {
            if five.len() == 5 {
                break;
            }
            if !play.event_text.contains("substitution out") {
                continue;
            }
            let name = play.event_text.split(',').next().unwrap_or("").trim();
            if name.is_empty() {
                return Err(Error::markup("substitution event with no player name"));
            }
            if name.eq_ignore_ascii_case("team") || five.iter().any(|n| n == name) {
                continue;
            }
            five.push(name.to_string());
        }
        if five.len() < 5 {
            return Err(Error::markup(format!(
                "found {} of 5 starters for team {team_id}",
                five.len()
            )));
        }
        starters.append(&mut five);
    }
    Ok(starters)
}
