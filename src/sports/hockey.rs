//! Ice hockey: team lists, schedules, rosters, season and game stats,
//! and raw play-by-play.
//!
//! The men's and women's games are separate sports to the site (`MIH`,
//! `WIH`); the [`Gender`] passed at construction picks between them.
//! Season stats split into two category tables, skaters and goalies,
//! and no fixed registry carries hockey's category ids, so both are
//! resolved from the stats page dropdown. Player game stats are not a
//! single page either: they are assembled from the box score of every
//! game the player's log counts an appearance in.

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::cache;
use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::models::{Division, GameMeta, Gender, RosterMember, ScheduleGame, ScoreboardGame, Team};
use crate::pages::boxscore::StatBox;
use crate::pages::gamelog;
use crate::pages::pbp::PeriodCard;
use crate::pages::stat_table::{self, HtmlTable, RowView};
use crate::sports::engine::SportEngine;
use crate::utils::text;

/// One skater's season-to-date line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkaterSeasonLine {
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
    pub plus_minus: Option<i32>,
    pub goals: Option<u16>,
    pub empty_net_goals: Option<u16>,
    pub short_handed_goals: Option<u16>,
    pub overtime_goals: Option<u16>,
    pub power_play_goals: Option<u16>,
    pub game_winning_goals: Option<u16>,
    pub game_tying_goals: Option<u16>,
    pub assists: Option<u16>,
    pub points: Option<u16>,
    pub shots: Option<u16>,
    pub faceoffs_won: Option<u16>,
    pub faceoffs_lost: Option<u16>,
    pub penalties: Option<u16>,
    pub penalty_minutes: Option<u16>,
}

/// One goalie's season-to-date line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalieSeasonLine {
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
    /// Time on ice as the site prints it, `2154:33`.
    pub minutes: Option<String>,
    pub minutes_seconds: Option<u32>,
    pub goals_allowed: Option<u16>,
    pub power_play_goals_allowed: Option<u16>,
    pub saves: Option<u16>,
}

/// A team's season stats: the two category tables side by side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonStats {
    pub skaters: Vec<SkaterSeasonLine>,
    pub goalies: Vec<GoalieSeasonLine>,
}

/// One skater's line in a game's box score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkaterBoxLine {
    pub game_id: i64,
    pub season: u16,
    pub team_id: i64,
    /// `-team_id` for the `TEAM` pseudo-player.
    pub player_id: i64,
    pub jersey_number: Option<String>,
    pub player_name: String,
    pub positions: Option<String>,
    pub games_played: u16,
    pub minutes: Option<String>,
    pub minutes_seconds: Option<u32>,
    pub plus_minus: Option<i32>,
    pub goals: Option<u16>,
    pub assists: Option<u16>,
    pub points: Option<u16>,
    pub shots: Option<u16>,
    pub shots_on_goal: Option<u16>,
    pub power_play_goals: Option<u16>,
    pub power_play_shots: Option<u16>,
    pub power_play_assists: Option<u16>,
    pub short_handed_goals: Option<u16>,
    pub short_handed_shots: Option<u16>,
    pub short_handed_assists: Option<u16>,
    pub overtime_goals: Option<u16>,
    pub faceoffs_won: Option<u16>,
    pub faceoffs_lost: Option<u16>,
    pub penalties: Option<u16>,
    pub penalty_minutes: Option<u16>,
}

/// One goalie's line in a game's box score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalieBoxLine {
    pub game_id: i64,
    pub season: u16,
    pub team_id: i64,
    pub player_id: i64,
    pub jersey_number: Option<String>,
    pub player_name: String,
    pub positions: Option<String>,
    /// Always 1; one line is one appearance.
    pub games_played: u16,
    pub games_started: Option<u16>,
    pub wins: Option<u16>,
    pub losses: Option<u16>,
    pub ties: Option<u16>,
    pub minutes: Option<String>,
    pub minutes_seconds: u32,
    pub goals_allowed: Option<u16>,
    pub saves: Option<u16>,
    pub save_pct: Option<f32>,
    pub shots_on_goal_allowed: Option<u16>,
    pub power_play_goals_allowed: Option<u16>,
    pub short_handed_goals_allowed: Option<u16>,
    /// Goals allowed per sixty minutes, recomputed from time on ice
    /// rather than read off the page.
    pub goals_against_average: Option<f32>,
}

/// Every player line in one game, split by table kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameBox {
    pub skaters: Vec<SkaterBoxLine>,
    pub goalies: Vec<GoalieBoxLine>,
}

/// One team's totals for a game: the box lines grouped by team with the
/// countable columns summed and the rates recomputed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamBoxLine {
    pub game_id: i64,
    pub season: u16,
    pub team_id: i64,
    pub goals: u16,
    pub assists: u16,
    pub points: u16,
    pub shots: u16,
    pub shots_on_goal: u16,
    pub power_play_goals: u16,
    pub power_play_shots: u16,
    pub power_play_assists: u16,
    pub short_handed_goals: u16,
    pub short_handed_shots: u16,
    pub short_handed_assists: u16,
    pub overtime_goals: u16,
    pub faceoffs_won: u16,
    pub faceoffs_lost: u16,
    pub faceoff_pct: Option<f32>,
    pub penalties: u16,
    pub penalty_minutes: u16,
    pub goalie_minutes: String,
    pub goalie_seconds: u32,
    pub goals_allowed: u16,
    pub saves: u16,
    /// `SV / (SV + GA)`, recomputed from the sums.
    pub save_pct: Option<f32>,
    pub shots_on_goal_allowed: u16,
    pub power_play_goals_allowed: u16,
    pub short_handed_goals_allowed: u16,
    pub goals_against_average: Option<f32>,
}

/// One raw play-by-play event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamePlay {
    pub game_id: i64,
    pub season: u16,
    pub away_team_id: i64,
    pub home_team_id: i64,
    /// Periods 1-3 in regulation; overtime periods count from 4.
    pub period: u8,
    pub is_overtime: bool,
    /// Position in the game's event stream, counted from 1.
    pub event_number: u32,
    /// Clock as printed, `MM:SS` with an optional centisecond field.
    /// Blank cells inherit the previous row's time.
    pub clock: String,
    pub period_seconds_remaining: u32,
    pub clock_centiseconds: u16,
    /// Period clock plus the regulation periods still to play; overtime
    /// events count only their own clock.
    pub game_seconds_remaining: u32,
    pub event_team_id: i64,
    pub event_text: String,
}

/// Scraper for NCAA ice hockey, men's or women's per the constructor.
pub struct HockeyScraper {
    engine: SportEngine,
}

impl HockeyScraper {
    pub fn new(config: &ScrapeConfig, gender: Gender) -> Result<Self> {
        let info = match gender {
            Gender::Mens => &super::MENS_HOCKEY,
            Gender::Womens => &super::WOMENS_HOCKEY,
        };
        Ok(Self {
            engine: SportEngine::new(config, info)?,
        })
    }

    /// Teams fielding hockey in one season and division.
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
        date: chrono::NaiveDate,
        division: Division,
    ) -> Result<Vec<ScoreboardGame>> {
        self.engine.day_schedule(date, division).await
    }

    pub async fn roster(&self, team_id: i64) -> Result<Vec<RosterMember>> {
        self.engine.roster(team_id).await
    }

    /// Skater and goalie season lines for every player on a team. The
    /// two category tables are fetched separately and returned together.
    pub async fn season_stats(&self, team_id: i64) -> Result<SeasonStats> {
        let team = self.engine.find_team(team_id).await?;
        let skater_rel = self
            .engine
            .rel(&format!("player_season_stats/{team_id}_skaters.csv"));
        let goalie_rel = self
            .engine
            .rel(&format!("player_season_stats/{team_id}_goalies.csv"));
        let today = Local::now().date_naive();
        let max_age = cache::in_season_max_age(team.season, today, 1);
        if let (Some(skaters), Some(goalies)) = (
            self.engine.cache.load_if_fresh::<SkaterSeasonLine>(&skater_rel, max_age),
            self.engine.cache.load_if_fresh::<GoalieSeasonLine>(&goalie_rel, max_age),
        ) {
            return Ok(SeasonStats { skaters, goalies });
        }

        let picker = self.engine.season_stats_html(team_id, None).await?;
        let (skater_id, goalie_id) = stat_table::goalie_category_split(&picker)?;
        let skater_html = self.engine.season_stats_html(team_id, Some(skater_id)).await?;
        let goalie_html = self.engine.season_stats_html(team_id, Some(goalie_id)).await?;
        let stats = SeasonStats {
            skaters: skater_season_lines(&team, &stat_table::parse_stat_grid(&skater_html)?),
            goalies: goalie_season_lines(&team, &stat_table::parse_stat_grid(&goalie_html)?),
        };
        self.engine.cache.store(&skater_rel, &stats.skaters)?;
        self.engine.cache.store(&goalie_rel, &stats.goalies)?;
        Ok(stats)
    }

    /// A player's per-game lines, assembled from the box score of every
    /// game the player's log counts an appearance in.
    pub async fn player_game_stats(&self, player_id: i64, season: u16) -> Result<GameBox> {
        let skater_rel = self
            .engine
            .rel(&format!("player_game_stats/skater/{season}_{player_id}.csv"));
        let goalie_rel = self
            .engine
            .rel(&format!("player_game_stats/goalie/{season}_{player_id}.csv"));
        let today = Local::now().date_naive();
        let max_age = cache::in_season_max_age(season, today, 1);
        if let (Some(skaters), Some(goalies)) = (
            self.engine.cache.load_if_fresh::<SkaterBoxLine>(&skater_rel, max_age),
            self.engine.cache.load_if_fresh::<GoalieBoxLine>(&goalie_rel, max_age),
        ) {
            return Ok(GameBox { skaters, goalies });
        }

        let html = self.engine.player_page_html(player_id, None).await?;
        let table = gamelog::parse_player_gamelog(&html)?;
        let mut stats = GameBox::default();
        for game_id in played_game_ids(&table) {
            let game = game_box(&self.engine, game_id).await?;
            stats
                .skaters
                .extend(game.skaters.into_iter().filter(|l| l.player_id == player_id));
            stats
                .goalies
                .extend(game.goalies.into_iter().filter(|l| l.player_id == player_id));
        }
        self.engine.cache.store(&skater_rel, &stats.skaters)?;
        self.engine.cache.store(&goalie_rel, &stats.goalies)?;
        Ok(stats)
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
    pub async fn raw_pbp(&self, game_id: i64) -> Result<Vec<GamePlay>> {
        let rel = self.engine.rel(&format!("raw_pbp/{game_id}_raw_pbp.csv"));
        if let Some(rows) = self.engine.cache.load_if_fresh::<GamePlay>(&rel, cache::GAME_MAX_AGE) {
            return Ok(rows);
        }
        let (meta, cards) = self.engine.pbp_page(game_id).await?;
        let plays = period_plays(&meta, &cards);
        self.engine.cache.store(&rel, &plays)?;
        Ok(plays)
    }
}

/// Identity cells shared by every season line.
struct SeasonIdentity {
    player_id: Option<i64>,
    jersey_number: Option<String>,
    player_name: String,
    class_year: Option<String>,
    positions: Option<String>,
    height: Option<String>,
}

/// Player rows carry the `text` class; a `-` sortable name marks the
/// filler rows mid-season rebuilds leave behind, and those are dropped.
fn season_identity(view: &RowView<'_>) -> Option<SeasonIdentity> {
    if !view.row().has_class("text") {
        return None;
    }
    let name_cell = view.cell(&["Player", "Name"])?;
    if name_cell.data_order.as_deref() == Some("-") {
        return None;
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
    Some(SeasonIdentity {
        player_id,
        jersey_number: view.string(&["#"]),
        player_name,
        class_year: view.string(&["Yr"]),
        positions: view.string(&["Pos"]),
        height: view.string(&["Ht"]),
    })
}

fn skater_season_lines(team: &Team, table: &HtmlTable) -> Vec<SkaterSeasonLine> {
    let mut lines = Vec::new();
    for view in table.views() {
        let Some(id) = season_identity(&view) else {
            continue;
        };
        lines.push(SkaterSeasonLine {
            season: team.season,
            team_id: team.team_id,
            school_id: team.school_id,
            school_name: team.school_name.clone(),
            division: team.division,
            conference: team.conference.clone(),
            player_id: id.player_id,
            jersey_number: id.jersey_number,
            player_name: id.player_name,
            class_year: id.class_year,
            positions: id.positions,
            height: id.height,
            games_played: view.u16(&["GP"]),
            games_started: view.u16(&["GS"]),
            plus_minus: view.i32(&["P-M"]),
            goals: view.u16(&["Goals"]),
            empty_net_goals: view.u16(&["ENG"]),
            short_handed_goals: view.u16(&["SHG"]),
            overtime_goals: view.u16(&["OT Goals"]),
            power_play_goals: view.u16(&["PPG"]),
            game_winning_goals: view.u16(&["GWG"]),
            game_tying_goals: view.u16(&["GTG"]),
            assists: view.u16(&["AST", "Assists"]),
            points: view.u16(&["PTS", "Points"]),
            shots: view.u16(&["ShAtt", "Shots"]),
            faceoffs_won: view.u16(&["FO won"]),
            faceoffs_lost: view.u16(&["FO lost"]),
            penalties: view.u16(&["Penalties"]),
            penalty_minutes: view.u16(&["Pen. Min."]),
        });
    }
    lines
}

fn goalie_season_lines(team: &Team, table: &HtmlTable) -> Vec<GoalieSeasonLine> {
    let mut lines = Vec::new();
    for view in table.views() {
        let Some(id) = season_identity(&view) else {
            continue;
        };
        let minutes = view.string(&["Min", "Goalie Mins."]);
        let minutes_seconds = minutes
            .as_deref()
            .and_then(text::parse_clock)
            .map(|(secs, _)| secs);
        lines.push(GoalieSeasonLine {
            season: team.season,
            team_id: team.team_id,
            school_id: team.school_id,
            school_name: team.school_name.clone(),
            division: team.division,
            conference: team.conference.clone(),
            player_id: id.player_id,
            jersey_number: id.jersey_number,
            player_name: id.player_name,
            class_year: id.class_year,
            positions: id.positions,
            height: id.height,
            games_played: view.u16(&["GP"]),
            games_started: view.u16(&["GS"]),
            minutes,
            minutes_seconds,
            goals_allowed: view.u16(&["GA"]),
            power_play_goals_allowed: view.u16(&["PPG Allowed", "PPGA"]),
            saves: view.u16(&["SV", "Saves"]),
        });
    }
    lines
}

/// Game ids the log counts an appearance in; GP reads 1 on rows the
/// player actually played.
fn played_game_ids(table: &HtmlTable) -> Vec<i64> {
    let mut ids = Vec::new();
    for (entry, view) in gamelog::gamelog_entries(table) {
        if view.u16(&["GP", "Games"]) != Some(1) {
            continue;
        }
        let Some(game_id) = entry.game_id else {
            continue;
        };
        if !ids.contains(&game_id) {
            ids.push(game_id);
        }
    }
    ids
}

/// Identity read off a box score row. Rows with no player link are kept
/// only as the `TEAM` pseudo-player, keyed by the negated team id.
struct BoxIdentity {
    player_id: i64,
    jersey_number: Option<String>,
    player_name: String,
    positions: Option<String>,
}

fn box_identity(team_id: i64, view: &RowView<'_>) -> Option<BoxIdentity> {
    let name_cell = view.cell(&["Name", "Player"])?;
    let player_name = name_cell.text.clone();
    if player_name.is_empty() {
        return None;
    }
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
    })
}

fn skater_box_lines(
    game_id: i64,
    season: u16,
    team_id: i64,
    table: &HtmlTable,
) -> Vec<SkaterBoxLine> {
    let mut lines = Vec::new();
    for row in &table.rows {
        let view = table.view(row);
        let Some(id) = box_identity(team_id, &view) else {
            continue;
        };
        let minutes = view.string(&["MP", "Min"]);
        let minutes_seconds = minutes
            .as_deref()
            .and_then(text::parse_clock)
            .map(|(secs, _)| secs);
        lines.push(SkaterBoxLine {
            game_id,
            season,
            team_id,
            player_id: id.player_id,
            jersey_number: id.jersey_number,
            player_name: id.player_name,
            positions: id.positions,
            games_played: view.u16(&["GP", "Games"]).unwrap_or(1),
            minutes,
            minutes_seconds,
            plus_minus: view.i32(&["P-M"]),
            goals: view.u16(&["Goals"]),
            assists: view.u16(&["AST", "Assists"]),
            points: view.u16(&["PTS", "Points"]),
            shots: view.u16(&["ShAtt", "Shots"]),
            shots_on_goal: view.u16(&["SoG"]),
            power_play_goals: view.u16(&["PPG"]),
            power_play_shots: view.u16(&["PPShots"]),
            power_play_assists: view.u16(&["PPAssists"]),
            short_handed_goals: view.u16(&["SHG"]),
            short_handed_shots: view.u16(&["SHShots"]),
            short_handed_assists: view.u16(&["SHAssists"]),
            overtime_goals: view.u16(&["OTGoals", "OT Goals"]),
            faceoffs_won: view.u16(&["FOwon", "FO won"]),
            faceoffs_lost: view.u16(&["FOlost", "FO lost"]),
            penalties: view.u16(&["Penalties"]),
            penalty_minutes: view.u16(&["Pen.Min.", "Pen. Min."]),
        });
    }
    lines
}

fn goalie_box_lines(
    game_id: i64,
    season: u16,
    team_id: i64,
    table: &HtmlTable,
) -> Vec<GoalieBoxLine> {
    let mut lines = Vec::new();
    for row in &table.rows {
        let view = table.view(row);
        let Some(id) = box_identity(team_id, &view) else {
            continue;
        };
        let minutes = view.string(&["Min", "GoalieMins.", "Goalie Mins."]);
        let minutes_seconds = minutes
            .as_deref()
            .and_then(text::parse_clock)
            .map(|(secs, _)| secs)
            .unwrap_or(0);
        let goals_allowed = view.u16(&["GA"]);
        lines.push(GoalieBoxLine {
            game_id,
            season,
            team_id,
            player_id: id.player_id,
            jersey_number: id.jersey_number,
            player_name: id.player_name,
            positions: id.positions,
            games_played: 1,
            games_started: view.u16(&["GS"]),
            wins: view.u16(&["GoalieWon"]),
            losses: view.u16(&["GoalieLoss"]),
            ties: view.u16(&["GoalieTied"]),
            minutes,
            minutes_seconds,
            goals_allowed,
            saves: view.u16(&["SV", "Saves"]),
            save_pct: view.f32(&["Savepct", "SV%"]),
            shots_on_goal_allowed: view.u16(&["SOGallowed"]),
            power_play_goals_allowed: view.u16(&["PPGAllowed", "PPGA"]),
            short_handed_goals_allowed: view.u16(&["SHGAllowed"]),
            goals_against_average: goals_against_average(
                goals_allowed.unwrap_or(0),
                minutes_seconds,
            ),
        });
    }
    lines
}

/// Goals allowed per sixty minutes. None without time on ice.
fn goals_against_average(goals_allowed: u16, seconds: u32) -> Option<f32> {
    if seconds == 0 {
        return None;
    }
    let minutes = seconds as f32 / 60.0;
    Some(round3(goals_allowed as f32 / minutes * 60.0))
}

fn round3(value: f32) -> f32 {
    (value * 1_000.0).round() / 1_000.0
}

fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

fn rate(part: u16, whole: u16) -> Option<f32> {
    if whole == 0 {
        None
    } else {
        Some(round4(part as f32 / whole as f32))
    }
}

/// Sorts the page's stat boxes into skater and goalie lines. Goalie
/// tables are the ones carrying a goals-allowed column.
fn build_game_box(meta: &GameMeta, boxes: &[StatBox]) -> GameBox {
    let season = super::contest_season(meta);
    let mut game_box = GameBox::default();
    for stat_box in boxes {
        if stat_box.table.column("GA").is_some() {
            game_box.goalies.extend(goalie_box_lines(
                meta.game_id,
                season,
                stat_box.team_id,
                &stat_box.table,
            ));
        } else {
            game_box.skaters.extend(skater_box_lines(
                meta.game_id,
                season,
                stat_box.team_id,
                &stat_box.table,
            ));
        }
    }
    game_box
}

/// Cache-first box score fetch. Skaters and goalies are cached as
/// separate files; a miss on either refetches the page.
async fn game_box(engine: &SportEngine, game_id: i64) -> Result<GameBox> {
    let skater_rel = engine.rel(&format!("game_stats/player/{game_id}_skaters.csv"));
    let goalie_rel = engine.rel(&format!("game_stats/player/{game_id}_goalies.csv"));
    if let (Some(skaters), Some(goalies)) = (
        engine.cache.load_if_fresh::<SkaterBoxLine>(&skater_rel, cache::GAME_MAX_AGE),
        engine.cache.load_if_fresh::<GoalieBoxLine>(&goalie_rel, cache::GAME_MAX_AGE),
    ) {
        return Ok(GameBox { skaters, goalies });
    }

    let (meta, boxes) = engine.box_score_page(game_id).await?;
    let game_box = build_game_box(&meta, &boxes);
    engine.cache.store(&skater_rel, &game_box.skaters)?;
    engine.cache.store(&goalie_rel, &game_box.goalies)?;
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
fn team_box_lines(game_box: &GameBox) -> Vec<TeamBoxLine> {
    let mut teams: Vec<TeamBoxLine> = Vec::new();

    for s in &game_box.skaters {
        let i = team_line_index(&mut teams, s.game_id, s.season, s.team_id);
        let t = &mut teams[i];
        add(&mut t.goals, s.goals);
        add(&mut t.assists, s.assists);
        add(&mut t.points, s.points);
        add(&mut t.shots, s.shots);
        add(&mut t.shots_on_goal, s.shots_on_goal);
        add(&mut t.power_play_goals, s.power_play_goals);
        add(&mut t.power_play_shots, s.power_play_shots);
        add(&mut t.power_play_assists, s.power_play_assists);
        add(&mut t.short_handed_goals, s.short_handed_goals);
        add(&mut t.short_handed_shots, s.short_handed_shots);
        add(&mut t.short_handed_assists, s.short_handed_assists);
        add(&mut t.overtime_goals, s.overtime_goals);
        add(&mut t.faceoffs_won, s.faceoffs_won);
        add(&mut t.faceoffs_lost, s.faceoffs_lost);
        add(&mut t.penalties, s.penalties);
        add(&mut t.penalty_minutes, s.penalty_minutes);
    }
    for g in &game_box.goalies {
        let i = team_line_index(&mut teams, g.game_id, g.season, g.team_id);
        let t = &mut teams[i];
        t.goalie_seconds += g.minutes_seconds;
        add(&mut t.goals_allowed, g.goals_allowed);
        add(&mut t.saves, g.saves);
        add(&mut t.shots_on_goal_allowed, g.shots_on_goal_allowed);
        add(&mut t.power_play_goals_allowed, g.power_play_goals_allowed);
        add(&mut t.short_handed_goals_allowed, g.short_handed_goals_allowed);
    }

    for team in &mut teams {
        team.goalie_minutes = text::format_clock(team.goalie_seconds);
        team.faceoff_pct = rate(team.faceoffs_won, team.faceoffs_won + team.faceoffs_lost);
        team.save_pct = rate(team.saves, team.saves + team.goals_allowed);
        team.goals_against_average =
            goals_against_average(team.goals_allowed, team.goalie_seconds);
    }
    teams
}

/// Seconds in a regulation period.
const PERIOD_SECONDS: u32 = 1200;

/// Flattens period cards into the raw event log.
///
/// Most games clock down from 20:00; a few log count-up time instead,
/// flagged when either of the first two plays reads 00:00. Every card
/// closes with a synthetic `End of Period` event, since the site's own
/// end markers are unreliable.
fn period_plays(meta: &GameMeta, cards: &[PeriodCard]) -> Vec<GamePlay> {
    let season = super::contest_season(meta);
    let mut plays: Vec<GamePlay> = Vec::new();
    let mut count_up = false;
    let mut row_count = 0u32;
    let mut event_team_id = meta.away_team_id;
    for card in cards {
        let Some(number) = card.number() else {
            continue;
        };
        let is_overtime = card.is_overtime();
        let period = if is_overtime { number + 3 } else { number };
        // Seconds of regulation still to play once this period ends.
        let later = PERIOD_SECONDS * u32::from(3u8.saturating_sub(period));
        let mut clock = if count_up { (0, 0) } else { (PERIOD_SECONDS, 0) };
        for row in &card.rows {
            if row.len() < 4 {
                continue;
            }
            if let Some(parsed) = text::parse_clock(&row[0]) {
                clock = parsed;
            }
            let event_text = if !row[1].is_empty() {
                event_team_id = meta.away_team_id;
                row[1].clone()
            } else if !row[3].is_empty() {
                event_team_id = meta.home_team_id;
                row[3].clone()
            } else {
                continue;
            };
            let (clock_seconds, centis) = clock;
            if row_count <= 1 && clock_seconds == 0 {
                // An opening play at 00:00 means the clock counts up.
                count_up = true;
            }
            let lowered = event_text.to_lowercase();
            let period_seconds = if lowered.contains("end of") && lowered.contains("period") {
                0
            } else if count_up {
                PERIOD_SECONDS.saturating_sub(clock_seconds)
            } else {
                clock_seconds
            };
            plays.push(GamePlay {
                game_id: meta.game_id,
                season,
                away_team_id: meta.away_team_id,
                home_team_id: meta.home_team_id,
                period,
                is_overtime,
                event_number: 0,
                clock: row[0].clone(),
                period_seconds_remaining: period_seconds,
                clock_centiseconds: centis,
                game_seconds_remaining: period_seconds + later,
                event_team_id,
                event_text,
            });
            row_count += 1;
        }
        plays.push(GamePlay {
            game_id: meta.game_id,
            season,
            away_team_id: meta.away_team_id,
            home_team_id: meta.home_team_id,
            period,
            is_overtime,
            event_number: 0,
            clock: if count_up { "20:00:00" } else { "00:00:00" }.to_string(),
            period_seconds_remaining: 0,
            clock_centiseconds: 0,
            game_seconds_remaining: later,
            event_team_id,
            event_text: "End of Period".to_string(),
        });
    }
    for (idx, play) in plays.iter_mut().enumerate() {
        play.event_number = (idx + 1) as u32;
    }
    plays
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn team() -> Team {
        Team {
            season: 2025,
            division: Division::I,
            sport_code: "MIH".to_string(),
            team_id: 589000,
            school_id: Some(67),
            school_name: "Boston College".to_string(),
            conference: Some("Hockey East".to_string()),
        }
    }

    fn meta() -> GameMeta {
        GameMeta {
            game_id: 5254468,
            season: 2024,
            game_datetime: None,
            stadium_name: Some("Xcel Energy Center".to_string()),
            attendance: Some(18631),
            away_team_id: 589000,
            away_team_name: "Boston College".to_string(),
            home_team_id: 589555,
            home_team_name: "Denver".to_string(),
        }
    }

    fn parse(html: &str, css: &str) -> HtmlTable {
        let doc = Html::parse_document(html);
        stat_table::parse_table(&doc, css).unwrap()
    }

    const SKATER_GRID: &str = r#"
    <table id="stat_grid" class="small_font dataTable table-bordered">
      <thead><tr>
        <th>#</th><th>Player</th><th>Yr</th><th>Pos</th><th>Ht</th>
        <th>GP</th><th>GS</th><th>P-M</th><th>Goals</th><th>ENG</th>
        <th>SHG</th><th>OT Goals</th><th>PPG</th><th>GWG</th><th>GTG</th>
        <th>AST</th><th>PTS</th><th>ShAtt</th><th>FO won</th>
        <th>FO lost</th><th>Penalties</th><th>Pen. Min.</th>
      </tr></thead>
      <tbody>
        <tr class="text">
          <td>9</td>
          <td data-order="Leonard,Ryan">
            <a href="/players/8000003">Leonard, Ryan</a>
          </td>
          <td>So</td><td>F</td><td>6-0</td>
          <td>37</td><td>37</td><td>-3</td><td>30</td><td>2</td>
          <td>1</td><td>1</td><td>10</td><td>7</td><td>0</td>
          <td>19</td><td>49</td><td>152</td><td>12</td>
          <td>17</td><td>21</td><td>42</td>
        </tr>
        <tr class="text">
          <td></td>
          <td data-order="-">-</td>
          <td></td><td></td><td></td>
          <td>37</td><td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td>
        </tr>
        <tr class="grey_heading">
          <td></td><td>Totals</td>
          <td></td><td></td><td></td>
          <td>37</td><td></td><td></td><td>120</td><td></td>
          <td></td><td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td>
        </tr>
      </tbody>
    </table>"#;

    #[test]
    fn test_skater_season_lines() {
        let table = parse(SKATER_GRID, "table#stat_grid");
        let lines = skater_season_lines(&team(), &table);
        assert_eq!(lines.len(), 1);

        let line = &lines[0];
        assert_eq!(line.player_name, "Ryan Leonard");
        assert_eq!(line.player_id, Some(8000003));
        assert_eq!(line.plus_minus, Some(-3));
        assert_eq!(line.goals, Some(30));
        assert_eq!(line.overtime_goals, Some(1));
        assert_eq!(line.shots, Some(152));
        assert_eq!(line.faceoffs_lost, Some(17));
        assert_eq!(line.penalty_minutes, Some(42));
    }

    const GOALIE_GRID: &str = r#"
    <table id="stat_grid" class="small_font dataTable table-bordered">
      <thead><tr>
        <th>#</th><th>Player</th><th>Yr</th><th>Pos</th><th>Ht</th>
        <th>GP</th><th>GS</th><th>Min</th><th>GA</th>
        <th>PPG Allowed</th><th>GAA</th><th>SV</th>
      </tr></thead>
      <tbody>
        <tr class="text">
          <td>1</td>
          <td data-order="Fowler,Jacob">
            <a href="/players/8000002">Fowler, Jacob</a>
          </td>
          <td>Fr</td><td>G</td><td>6-2</td>
          <td>36</td><td>36</td><td>2154:33</td><td>71</td>
          <td>18</td><td>1.98</td><td>901</td>
        </tr>
      </tbody>
    </table>"#;

    #[test]
    fn test_goalie_season_lines() {
        let table = parse(GOALIE_GRID, "table#stat_grid");
        let lines = goalie_season_lines(&team(), &table);
        assert_eq!(lines.len(), 1);

        let line = &lines[0];
        assert_eq!(line.player_name, "Jacob Fowler");
        assert_eq!(line.minutes.as_deref(), Some("2154:33"));
        assert_eq!(line.minutes_seconds, Some(129273));
        assert_eq!(line.goals_allowed, Some(71));
        assert_eq!(line.power_play_goals_allowed, Some(18));
        assert_eq!(line.saves, Some(901));
    }

    const SKATER_BOX: &str = r#"
    <table class="skaters">
      <thead><tr>
        <th>#</th><th>Name</th><th>P</th><th>Goals</th><th>AST</th>
        <th>PTS</th><th>ShAtt</th><th>SoG</th><th>PPG</th><th>PPShots</th>
        <th>SHG</th><th>FOwon</th><th>FOlost</th><th>Penalties</th>
        <th>Pen.Min.</th>
      </tr></thead>
      <tbody>
        <tr>
          <td>9</td>
          <td><a href="/players/8000003">Leonard, Ryan</a></td>
          <td>F</td><td>1</td><td>1</td>
          <td>2</td><td>6</td><td>4</td><td>1</td><td>2</td>
          <td>0</td><td>3</td><td>2</td><td>1</td>
          <td>2</td>
        </tr>
        <tr>
          <td></td>
          <td>TEAM</td>
          <td></td><td></td><td></td>
          <td></td><td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td><td>1</td>
          <td>2</td>
        </tr>
        <tr>
          <td></td>
          <td>Boston College Totals</td>
          <td></td><td>2</td><td></td>
          <td></td><td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td><td></td>
          <td></td>
        </tr>
      </tbody>
    </table>"#;

    const GOALIE_BOX: &str = r#"
    <table class="goalies">
      <thead><tr>
        <th>#</th><th>Name</th><th>P</th><th>GoalieWon</th>
        <th>GoalieLoss</th><th>GoalieTied</th><th>GoalieMins.</th>
        <th>GA</th><th>SV</th><th>Savepct</th><th>SOGallowed</th>
        <th>PPGAllowed</th><th>SHGAllowed</th>
      </tr></thead>
      <tbody>
        <tr>
          <td>1</td>
          <td><a href="/players/8000002">Fowler, Jacob</a></td>
          <td>G</td><td>0</td>
          <td>1</td><td>0</td><td>60:00</td>
          <td>2</td><td>28</td><td>0.933</td><td>30</td>
          <td>1</td><td>0</td>
        </tr>
      </tbody>
    </table>"#;

    fn game_boxes() -> Vec<StatBox> {
        vec![
            StatBox {
                heading: "Boston College Period Stats".to_string(),
                team_id: 589000,
                table: parse(SKATER_BOX, "table.skaters"),
            },
            StatBox {
                heading: "Boston College Goalie Stats".to_string(),
                team_id: 589000,
                table: parse(GOALIE_BOX, "table.goalies"),
            },
        ]
    }

    #[test]
    fn test_build_game_box_splits_tables() {
        let game_box = build_game_box(&meta(), &game_boxes());
        assert_eq!(game_box.skaters.len(), 2);
        assert_eq!(game_box.goalies.len(), 1);

        let skater = &game_box.skaters[0];
        assert_eq!(skater.player_id, 8000003);
        assert_eq!(skater.games_played, 1);
        assert_eq!(skater.goals, Some(1));
        assert_eq!(skater.shots_on_goal, Some(4));
        assert_eq!(skater.penalty_minutes, Some(2));

        // Bench penalties land on the TEAM pseudo-player; totals rows drop.
        let bench = &game_box.skaters[1];
        assert_eq!(bench.player_id, -589000);
        assert_eq!(bench.player_name, "TEAM");
        assert_eq!(bench.penalties, Some(1));
    }

    #[test]
    fn test_goalie_box_recomputes_gaa() {
        let game_box = build_game_box(&meta(), &game_boxes());
        let goalie = &game_box.goalies[0];
        assert_eq!(goalie.games_played, 1);
        assert_eq!(goalie.minutes_seconds, 3600);
        assert_eq!(goalie.losses, Some(1));
        assert_eq!(goalie.goals_against_average, Some(2.0));
        assert_eq!(goalie.save_pct, Some(0.933));
    }

    #[test]
    fn test_team_box_lines_recompute_rates() {
        let teams = team_box_lines(&build_game_box(&meta(), &game_boxes()));
        assert_eq!(teams.len(), 1);

        let team = &teams[0];
        assert_eq!(team.team_id, 589000);
        assert_eq!(team.goals, 1);
        assert_eq!(team.penalties, 2);
        assert_eq!(team.penalty_minutes, 4);
        assert_eq!(team.faceoff_pct, Some(0.6));
        assert_eq!(team.goalie_minutes, "60:00");
        assert_eq!(team.save_pct, Some(0.9333));
        assert_eq!(team.goals_against_average, Some(2.0));
    }

    fn play_card(heading: &str, rows: Vec<[&str; 4]>) -> PeriodCard {
        PeriodCard {
            heading: heading.to_string(),
            rows: rows
                .into_iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_period_plays_count_down() {
        let cards = vec![
            play_card(
                "1st Period",
                vec![
                    ["20:00", "Game start", "", ""],
                    ["19:13", "Shot by Ryan Leonard missed", "0-0", ""],
                    ["08:32:55", "", "0-1", "Goal by Jack Devine"],
                ],
            ),
            play_card("3rd Period", vec![["00:45", "", "2-2", "Goal by Tristan Broz"]]),
            play_card("1st OT", vec![["04:12", "Shot by Will Smith missed", "2-2", ""]]),
        ];
        let plays = period_plays(&meta(), &cards);
        assert_eq!(plays.len(), 8);

        assert_eq!(plays[0].period, 1);
        assert_eq!(plays[0].period_seconds_remaining, 1200);
        assert_eq!(plays[0].game_seconds_remaining, 3600);
        assert_eq!(plays[0].event_team_id, 589000);

        assert_eq!(plays[2].event_team_id, 589555);
        assert_eq!(plays[2].period_seconds_remaining, 512);
        assert_eq!(plays[2].clock_centiseconds, 55);
        assert_eq!(plays[2].game_seconds_remaining, 2912);

        // Synthetic period end, charged against nobody new.
        let end = &plays[3];
        assert_eq!(end.event_text, "End of Period");
        assert_eq!(end.clock, "00:00:00");
        assert_eq!(end.period_seconds_remaining, 0);
        assert_eq!(end.game_seconds_remaining, 2400);
        assert_eq!(end.event_team_id, 589555);
        assert_eq!(end.event_number, 4);

        assert_eq!(plays[4].period, 3);
        assert_eq!(plays[4].game_seconds_remaining, 45);
        assert_eq!(plays[5].game_seconds_remaining, 0);

        let overtime = &plays[6];
        assert_eq!(overtime.period, 4);
        assert!(overtime.is_overtime);
        assert_eq!(overtime.period_seconds_remaining, 252);
        assert_eq!(overtime.game_seconds_remaining, 252);
        assert_eq!(plays[7].event_number, 8);
    }

    #[test]
    fn test_period_plays_count_up() {
        let cards = vec![play_card(
            "1st Period",
            vec![
                ["00:00", "Game start", "", ""],
                ["00:47", "Faceoff won by Boston College", "0-0", ""],
                ["19:58", "", "0-1", "Goal by Jack Devine"],
                ["20:00", "End of 1st period", "0-1", ""],
            ],
        )];
        let plays = period_plays(&meta(), &cards);
        assert_eq!(plays.len(), 5);

        // 00:00 on the opening play flips the count-up interpretation.
        assert_eq!(plays[0].period_seconds_remaining, 1200);
        assert_eq!(plays[0].game_seconds_remaining, 3600);
        assert_eq!(plays[1].period_seconds_remaining, 1153);
        assert_eq!(plays[2].period_seconds_remaining, 2);
        assert_eq!(plays[2].game_seconds_remaining, 2402);

        // The printed end-of-period row zeroes out with the period.
        assert_eq!(plays[3].period_seconds_remaining, 0);
        assert_eq!(plays[3].game_seconds_remaining, 2400);
        assert_eq!(plays[4].clock, "20:00:00");
    }

    #[test]
    fn test_period_plays_blank_clock_carries() {
        let cards = vec![play_card(
            "2nd Period",
            vec![
                ["15:30", "Penalty on Denver", "1-1", ""],
                ["", "Penalty on Boston College", "1-1", ""],
            ],
        )];
        let plays = period_plays(&meta(), &cards);
        assert_eq!(plays[1].period_seconds_remaining, 930);
        assert_eq!(plays[1].game_seconds_remaining, 2130);
        assert_eq!(plays[1].clock, "");
    }

    const PLAYER_PAGE: &str = r#"
    <table class="small_font dataTable table-bordered">
      <thead><tr><th>Year</th><th>GP</th></tr></thead>
      <tbody><tr><td>2024-25</td><td>36</td></tr></tbody>
    </table>
    <table class="small_font dataTable table-bordered">
      <thead>
        <tr><th>Date</th><th>Opponent</th><th>Result</th><th>GP</th><th>Goals</th></tr>
      </thead>
      <tbody>
        <tr id="contest_6081234">
          <td>10/12/2024</td>
          <td><a href="/teams/589555">Denver</a></td>
          <td><a href="/contests/6081234/box_score">W 4-3</a></td>
          <td>1</td><td>1</td>
        </tr>
        <tr id="contest_6081235">
          <td>10/13/2024</td>
          <td><a href="/teams/589555">Denver</a></td>
          <td><a href="/contests/6081235/box_score">L 1-2</a></td>
          <td></td><td></td>
        </tr>
        <tr id="contest_6081236">
          <td>10/19/2024</td>
          <td><a href="/teams/589777">Michigan St.</a></td>
          <td><a href="/contests/6081236/box_score">W 5-2</a></td>
          <td>1</td><td>0</td>
        </tr>
      </tbody>
    </table>"#;

    #[test]
    fn test_played_game_ids() {
        let table = gamelog::parse_player_gamelog(PLAYER_PAGE).unwrap();
        assert_eq!(played_game_ids(&table), vec![6081234, 6081236]);
    }
}
