//! Field hockey: team lists, schedules, rosters, season and game
//! stats, and raw play-by-play.
//!
//! The site carries the women's game only (`WFH`). Season stats split
//! into field players and goalies, both resolved from the stats page
//! dropdown, and player game stats are assembled from the box score of
//! every game the player's log counts an appearance in. Play-by-play
//! time is cumulative: the clock counts up from kickoff through the
//! whole match, and the period layout depends on the season. Quarters
//! arrived with the 2019 rule change; before that the game ran in
//! 35-minute halves. Overtimes shrank to ten minutes in 2018.

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::cache;
use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::models::{Division, GameMeta, RosterMember, ScheduleGame, ScoreboardGame, Team};
use crate::pages::boxscore::StatBox;
use crate::pages::gamelog;
use crate::pages::pbp::PeriodCard;
use crate::pages::stat_table::{self, HtmlTable, RowView};
use crate::sports::engine::SportEngine;
use crate::utils::text;

/// One field player's season-to-date line.
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
    pub games_played: Option<u16>,
    pub games_started: Option<u16>,
    pub goals: Option<u16>,
    pub assists: Option<u16>,
    pub points: Option<u16>,
    pub shots: Option<u16>,
    /// Saves made by a field player defending the goal.
    pub defensive_saves: Option<u16>,
    pub fouls: Option<u16>,
    pub red_cards: Option<u16>,
    pub yellow_cards: Option<u16>,
    pub green_cards: Option<u16>,
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
    pub games_played: Option<u16>,
    pub games_started: Option<u16>,
    /// Time in goal as the site prints it, `1208:26`.
    pub minutes: Option<String>,
    pub minutes_seconds: Option<u32>,
    pub goals_allowed: Option<u16>,
    pub saves: Option<u16>,
    /// As printed on the season page, unlike the recomputed box values.
    pub goals_against_average: Option<f32>,
}

/// A team's season stats: the two category tables side by side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonStats {
    pub players: Vec<PlayerSeasonLine>,
    pub goalies: Vec<GoalieSeasonLine>,
}

/// One field player's line in a game's box score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerBoxLine {
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
    pub goals: Option<u16>,
    pub assists: Option<u16>,
    pub points: Option<u16>,
    pub shots: Option<u16>,
    pub shots_on_goal: Option<u16>,
    pub defensive_saves: Option<u16>,
    pub fouls: Option<u16>,
    pub red_cards: Option<u16>,
    pub yellow_cards: Option<u16>,
    pub green_cards: Option<u16>,
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
    pub minutes: Option<String>,
    pub minutes_seconds: u32,
    pub goals_allowed: Option<u16>,
    pub saves: Option<u16>,
    /// Goals allowed per sixty minutes, recomputed from time in goal
    /// rather than read off the page.
    pub goals_against_average: Option<f32>,
}

/// Every player line in one game, split by table kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameBox {
    pub players: Vec<PlayerBoxLine>,
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
    pub defensive_saves: u16,
    pub fouls: u16,
    pub red_cards: u16,
    pub yellow_cards: u16,
    pub green_cards: u16,
    pub goalie_minutes: String,
    pub goalie_seconds: u32,
    pub goals_allowed: u16,
    pub saves: u16,
    /// `SV / (SV + GA)`, recomputed from the sums.
    pub save_pct: Option<f32>,
    pub goals_against_average: Option<f32>,
}

/// One raw play-by-play event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamePlay {
    pub game_id: i64,
    pub season: u16,
    pub away_team_id: i64,
    pub home_team_id: i64,
    /// Quarters 1-4 in regulation since 2019, halves 1-2 before;
    /// overtime periods count past the regulation ones.
    pub period: u8,
    pub is_overtime: bool,
    /// Position in the game's event stream, counted from 1.
    pub event_number: u32,
    /// Clock as printed: cumulative match time counting up from
    /// kickoff. Blank cells inherit the previous row's time.
    pub clock: String,
    pub period_seconds_remaining: u32,
    pub clock_centiseconds: u16,
    /// Seconds left in regulation; overtime events read 0 here.
    pub game_seconds_remaining: u32,
    pub event_team_id: i64,
    pub event_text: String,
}

/// Scraper for NCAA women's field hockey.
pub struct FieldHockeyScraper {
    engine: SportEngine,
}

impl FieldHockeyScraper {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        Ok(Self {
            engine: SportEngine::new(config, &super::FIELD_HOCKEY)?,
        })
    }

    /// Teams fielding field hockey in one season and division.
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

    /// Field player and goalie season lines for every player on a team.
    /// The two category tables are fetched separately and returned
    /// together.
    pub async fn season_stats(&self, team_id: i64) -> Result<SeasonStats> {
        let team = self.engine.find_team(team_id).await?;
        let player_rel = self
            .engine
            .rel(&format!("player_season_stats/{team_id}_players.csv"));
        let goalie_rel = self
            .engine
            .rel(&format!("player_season_stats/{team_id}_goalies.csv"));
        let today = Local::now().date_naive();
        let max_age = cache::in_season_max_age(team.season, today, 1);
        if let (Some(players), Some(goalies)) = (
            self.engine.cache.load_if_fresh::<PlayerSeasonLine>(&player_rel, max_age),
            self.engine.cache.load_if_fresh::<GoalieSeasonLine>(&goalie_rel, max_age),
        ) {
            return Ok(SeasonStats { players, goalies });
        }

        let picker = self.engine.season_stats_html(team_id, None).await?;
        let (player_id, goalie_id) = stat_table::goalie_category_split(&picker)?;
        let player_html = self.engine.season_stats_html(team_id, Some(player_id)).await?;
        let goalie_html = self.engine.season_stats_html(team_id, Some(goalie_id)).await?;
        let stats = SeasonStats {
            players: player_season_lines(&team, &stat_table::parse_stat_grid(&player_html)?),
            goalies: goalie_season_lines(&team, &stat_table::parse_stat_grid(&goalie_html)?),
        };
        self.engine.cache.store(&player_rel, &stats.players)?;
        self.engine.cache.store(&goalie_rel, &stats.goalies)?;
        Ok(stats)
    }

    /// A player's per-game lines, assembled from the box score of every
    /// game the player's log counts an appearance in.
    pub async fn player_game_stats(&self, player_id: i64, season: u16) -> Result<GameBox> {
        let player_rel = self
            .engine
            .rel(&format!("player_game_stats/player/{season}_{player_id}.csv"));
        let goalie_rel = self
            .engine
            .rel(&format!("player_game_stats/goalie/{season}_{player_id}.csv"));
        let today = Local::now().date_naive();
        let max_age = cache::in_season_max_age(season, today, 1);
        if let (Some(players), Some(goalies)) = (
            self.engine.cache.load_if_fresh::<PlayerBoxLine>(&player_rel, max_age),
            self.engine.cache.load_if_fresh::<GoalieBoxLine>(&goalie_rel, max_age),
        ) {
            return Ok(GameBox { players, goalies });
        }

        let html = self.engine.player_page_html(player_id, None).await?;
        let table = gamelog::parse_player_gamelog(&html)?;
        let mut stats = GameBox::default();
        for game_id in played_game_ids(&table) {
            let game = game_box(&self.engine, game_id).await?;
            stats
                .players
                .extend(game.players.into_iter().filter(|l| l.player_id == player_id));
            stats
                .goalies
                .extend(game.goalies.into_iter().filter(|l| l.player_id == player_id));
        }
        self.engine.cache.store(&player_rel, &stats.players)?;
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
        let plays = quarter_plays(&meta, &cards);
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
    })
}

fn player_season_lines(team: &Team, table: &HtmlTable) -> Vec<PlayerSeasonLine> {
    let mut lines = Vec::new();
    for view in table.views() {
        let Some(id) = season_identity(&view) else {
            continue;
        };
        lines.push(PlayerSeasonLine {
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
            games_played: view.u16(&["GP"]),
            games_started: view.u16(&["GS"]),
            goals: view.u16(&["Goals"]),
            assists: view.u16(&["AST", "Assists"]),
            points: view.u16(&["PTS", "Points"]),
            shots: view.u16(&["ShAtt", "Shots"]),
            defensive_saves: view.u16(&["DSv"]),
            fouls: view.u16(&["Fouls"]),
            red_cards: view.u16(&["RC"]),
            yellow_cards: view.u16(&["YC"]),
            green_cards: view.u16(&["GC"]),
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
            games_played: view.u16(&["GP"]),
            games_started: view.u16(&["GS"]),
            minutes,
            minutes_seconds,
            goals_allowed: view.u16(&["GA", "Goals Allowed"]),
            saves: view.u16(&["SV", "Saves"]),
            goals_against_average: view.f32(&["GAA"]),
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

fn player_box_lines(
    game_id: i64,
    season: u16,
    team_id: i64,
    table: &HtmlTable,
) -> Vec<PlayerBoxLine> {
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
        lines.push(PlayerBoxLine {
            game_id,
            season,
            team_id,
            player_id: id.player_id,
            jersey_number: id.jersey_number,
            player_name: id.player_name,
            positions: id.positions,
            games_played: view.u16(&["GP", "G", "Games"]).unwrap_or(1),
            minutes,
            minutes_seconds,
            goals: view.u16(&["Goals"]),
            assists: view.u16(&["AST", "Assists"]),
            points: view.u16(&["PTS", "Points"]),
            shots: view.u16(&["ShAtt", "Shots"]),
            shots_on_goal: view.u16(&["SoG", "SOG"]),
            defensive_saves: view.u16(&["DSv"]),
            fouls: view.u16(&["Fouls"]),
            red_cards: view.u16(&["RC"]),
            yellow_cards: view.u16(&["YC"]),
            green_cards: view.u16(&["GC"]),
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
        let goals_allowed = view.u16(&["GA", "GoalsAllowed", "Goals Allowed"]);
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
            minutes,
            minutes_seconds,
            goals_allowed,
            saves: view.u16(&["SV", "Saves"]),
            goals_against_average: goals_against_average(
                goals_allowed.unwrap_or(0),
                minutes_seconds,
            ),
        });
    }
    lines
}

/// Goals allowed per sixty minutes. None without time in goal.
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

/// Goalie tables are the ones carrying a goals-allowed column, under
/// whichever of its spellings the season serves.
fn is_goalie_table(table: &HtmlTable) -> bool {
    ["GA", "GoalsAllowed", "Goals Allowed"]
        .iter()
        .any(|name| table.column(name).is_some())
}

/// Sorts the page's stat boxes into field player and goalie lines.
fn build_game_box(meta: &GameMeta, boxes: &[StatBox]) -> GameBox {
    let season = super::contest_season(meta);
    let mut game_box = GameBox::default();
    for stat_box in boxes {
        if is_goalie_table(&stat_box.table) {
            game_box.goalies.extend(goalie_box_lines(
                meta.game_id,
                season,
                stat_box.team_id,
                &stat_box.table,
            ));
        } else {
            game_box.players.extend(player_box_lines(
                meta.game_id,
                season,
                stat_box.team_id,
                &stat_box.table,
            ));
        }
    }
    game_box
}

/// Cache-first box score fetch. Field players and goalies are cached as
/// separate files; a miss on either refetches the page.
async fn game_box(engine: &SportEngine, game_id: i64) -> Result<GameBox> {
    let player_rel = engine.rel(&format!("game_stats/player/{game_id}_players.csv"));
    let goalie_rel = engine.rel(&format!("game_stats/player/{game_id}_goalies.csv"));
    if let (Some(players), Some(goalies)) = (
        engine.cache.load_if_fresh::<PlayerBoxLine>(&player_rel, cache::GAME_MAX_AGE),
        engine.cache.load_if_fresh::<GoalieBoxLine>(&goalie_rel, cache::GAME_MAX_AGE),
    ) {
        return Ok(GameBox { players, goalies });
    }

    let (meta, boxes) = engine.box_score_page(game_id).await?;
    let game_box = build_game_box(&meta, &boxes);
    engine.cache.store(&player_rel, &game_box.players)?;
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

    for p in &game_box.players {
        let i = team_line_index(&mut teams, p.game_id, p.season, p.team_id);
        let t = &mut teams[i];
        add(&mut t.goals, p.goals);
        add(&mut t.assists, p.assists);
        add(&mut t.points, p.points);
        add(&mut t.shots, p.shots);
        add(&mut t.shots_on_goal, p.shots_on_goal);
        add(&mut t.defensive_saves, p.defensive_saves);
        add(&mut t.fouls, p.fouls);
        add(&mut t.red_cards, p.red_cards);
        add(&mut t.yellow_cards, p.yellow_cards);
        add(&mut t.green_cards, p.green_cards);
    }
    for g in &game_box.goalies {
        let i = team_line_index(&mut teams, g.game_id, g.season, g.team_id);
        let t = &mut teams[i];
        t.goalie_seconds += g.minutes_seconds;
        add(&mut t.goals_allowed, g.goals_allowed);
        add(&mut t.saves, g.saves);
    }

    for team in &mut teams {
        team.goalie_minutes = text::format_clock(team.goalie_seconds);
        team.save_pct = rate(team.saves, team.saves + team.goals_allowed);
        team.goals_against_average =
            goals_against_average(team.goals_allowed, team.goalie_seconds);
    }
    teams
}

/// How a season's clock divides into periods.
struct ClockPlan {
    regulation_periods: u8,
    period_seconds: u32,
    overtime_seconds: u32,
}

impl ClockPlan {
    fn for_season(season: u16) -> Self {
        if season >= 2019 {
            ClockPlan {
                regulation_periods: 4,
                period_seconds: 900,
                overtime_seconds: 600,
            }
        } else if season == 2018 {
            ClockPlan {
                regulation_periods: 2,
                period_seconds: 2100,
                overtime_seconds: 600,
            }
        } else {
            ClockPlan {
                regulation_periods: 2,
                period_seconds: 2100,
                overtime_seconds: 900,
            }
        }
    }

    fn regulation_seconds(&self) -> u32 {
        self.period_seconds * u32::from(self.regulation_periods)
    }

    /// Cumulative match seconds at the end of `period`.
    fn period_bound(&self, period: u8) -> u32 {
        let regulation = u32::from(self.regulation_periods);
        let p = u32::from(period);
        if p <= regulation {
            self.period_seconds * p
        } else {
            self.regulation_seconds() + self.overtime_seconds * (p - regulation)
        }
    }
}

/// Flattens period cards into the raw event log.
///
/// The clock is cumulative; each row's remaining time falls out of the
/// season's period layout. Every card closes with a synthetic
/// `End of Quarter` event, since the site's own end markers are
/// unreliable.
fn quarter_plays(meta: &GameMeta, cards: &[PeriodCard]) -> Vec<GamePlay> {
    let season = super::contest_season(meta);
    let plan = ClockPlan::for_season(season);
    let regulation = plan.regulation_seconds();
    let mut plays: Vec<GamePlay> = Vec::new();
    let mut event_team_id = meta.away_team_id;
    for card in cards {
        let Some(number) = card.number() else {
            continue;
        };
        let is_overtime = card.is_overtime();
        let period = if is_overtime {
            number + plan.regulation_periods
        } else {
            number
        };
        let bound = plan.period_bound(period);
        let mut clock = (plan.period_bound(period.saturating_sub(1)), 0);
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
            let (elapsed, centis) = clock;
            let lowered = event_text.to_lowercase();
            let ended = lowered.contains("end of")
                && ["quarter", "half", "period"]
                    .iter()
                    .any(|w| lowered.contains(w));
            let (period_seconds, game_seconds) = if ended {
                (0, regulation.saturating_sub(bound))
            } else {
                (
                    bound.saturating_sub(elapsed),
                    regulation.saturating_sub(elapsed),
                )
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
                game_seconds_remaining: game_seconds,
                event_team_id,
                event_text,
            });
        }
        plays.push(GamePlay {
            game_id: meta.game_id,
            season,
            away_team_id: meta.away_team_id,
            home_team_id: meta.home_team_id,
            period,
            is_overtime,
            event_number: 0,
            clock: text::format_clock(bound),
            period_seconds_remaining: 0,
            clock_centiseconds: 0,
            game_seconds_remaining: regulation.saturating_sub(bound),
            event_team_id,
            event_text: "End of Quarter".to_string(),
        });
    }
    for (idx, play) in plays.iter_mut().enumerate() {
        play.event_number = (idx + 1) as u32;
    }
    plays
}
