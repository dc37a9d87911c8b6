//! Volleyball: team lists, schedules, rosters, season and game-log
//! stats, box scores, and a set-by-set rally log that can be classified
//! into per-event flags with roster-resolved players.
//!
//! The men's and women's games are separate sports to the site (`MVB`,
//! `WVB`); the [`Gender`] passed at construction picks between them.
//! Sets run to 25 points with deuce play from 24-24 (14-14 in a
//! deciding fifth set); rows from that mark on are flagged as extra
//! points. Hitting percentage and total blocks are recomputed from the
//! raw counts rather than read from the page's rounded columns.

use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache;
use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::models::{Division, GameMeta, Gender, RosterMember, ScheduleGame, ScoreboardGame, Team};
use crate::pages::boxscore::StatBox;
use crate::pages::gamelog;
use crate::pages::pbp::{self, PeriodCard};
use crate::pages::stat_table::{self, HtmlTable, RowView};
use crate::sports::engine::SportEngine;
use crate::utils::text;

static TYPED_PLAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(set|attack|block|reception)\(([^)]+)\) by ([^(]+)").unwrap());
static BY_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bby ([^(]+)").unwrap());
static SUB_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bsub (?:in|out) ([^(]+)").unwrap());
static TEAM_SUBS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bsubs: ([^.]+)").unwrap());
static TIMEOUT_TEAM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\btimeout ([^.(]+)").unwrap());
static SERVER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^([^(]+?) serves").unwrap());
static POINT_SERVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\(([^)]+)\) service (?:ace|error)").unwrap());
static SERVICE_ERROR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(.+?) service error").unwrap());

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
    pub sets_played: Option<u16>,
    pub matches_started: Option<u16>,
    pub kills: Option<u16>,
    pub attack_errors: Option<u16>,
    pub total_attacks: Option<u16>,
    /// `(kills - errors) / attacks`, negative when errors outnumber
    /// kills.
    pub hit_pct: Option<f32>,
    pub assists: Option<u16>,
    pub aces: Option<u16>,
    pub serve_errors: Option<u16>,
    pub serve_attempts: Option<u16>,
    pub digs: Option<u16>,
    pub return_attacks: Option<u16>,
    pub return_errors: Option<u16>,
    pub solo_blocks: Option<u16>,
    pub assisted_blocks: Option<u16>,
    pub block_errors: Option<u16>,
    /// Solo blocks count whole, assisted blocks half each.
    pub total_blocks: Option<f32>,
    pub points: Option<f32>,
    pub ball_handling_errors: Option<u16>,
    pub double_doubles: Option<u16>,
    pub triple_doubles: Option<u16>,
}

/// One match of a player's game log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameLine {
    pub player_id: i64,
    pub season: u16,
    pub game_id: Option<i64>,
    pub game_date: NaiveDate,
    pub game_num: u8,
    pub opponent_id: Option<i64>,
    pub opponent_name: String,
    /// Raw result cell, e.g. `W 3-1`.
    pub result: String,
    pub sets_won: Option<u8>,
    pub sets_lost: Option<u8>,
    pub games_played: Option<u16>,
    pub games_started: Option<u16>,
    pub sets_played: Option<u16>,
    pub kills: Option<u16>,
    pub attack_errors: Option<u16>,
    pub total_attacks: Option<u16>,
    pub hit_pct: Option<f32>,
    pub assists: Option<u16>,
    pub aces: Option<u16>,
    pub serve_errors: Option<u16>,
    pub serve_attempts: Option<u16>,
    pub digs: Option<u16>,
    pub return_attacks: Option<u16>,
    pub return_errors: Option<u16>,
    pub solo_blocks: Option<u16>,
    pub assisted_blocks: Option<u16>,
    pub block_errors: Option<u16>,
    pub total_blocks: Option<f32>,
    pub points: Option<f32>,
    pub ball_handling_errors: Option<u16>,
    /// Ten or more in two of kills, aces, digs, assists, and total
    /// blocks.
    pub double_double: bool,
    pub triple_double: bool,
}

/// One player's line in a match's box score.
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
    pub sets_played: Option<u16>,
    pub kills: Option<u16>,
    pub attack_errors: Option<u16>,
    pub total_attacks: Option<u16>,
    pub hit_pct: Option<f32>,
    pub assists: Option<u16>,
    pub aces: Option<u16>,
    pub serve_errors: Option<u16>,
    pub digs: Option<u16>,
    pub return_attacks: Option<u16>,
    pub return_errors: Option<u16>,
    pub solo_blocks: Option<u16>,
    pub assisted_blocks: Option<u16>,
    pub block_errors: Option<u16>,
    pub total_blocks: f32,
    pub points: Option<f32>,
    pub ball_handling_errors: Option<u16>,
    pub double_double: bool,
    pub triple_double: bool,
}

/// A team's box totals: the countable columns summed over its players,
/// hitting percentage and blocks recomputed from the sums.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamBoxLine {
    pub game_id: i64,
    pub season: u16,
    pub team_id: i64,
    pub sets_played: u16,
    pub kills: u16,
    pub attack_errors: u16,
    pub total_attacks: u16,
    pub hit_pct: Option<f32>,
    pub assists: u16,
    pub aces: u16,
    pub serve_errors: u16,
    pub digs: u16,
    pub return_attacks: u16,
    pub return_errors: u16,
    pub solo_blocks: u16,
    pub assisted_blocks: u16,
    pub block_errors: u16,
    pub total_blocks: f32,
    pub points: f32,
    pub ball_handling_errors: u16,
    /// How many of the team's players posted a double-double.
    pub double_doubles: u16,
    pub triple_doubles: u16,
}

/// One rally of the set-by-set log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetPlay {
    pub game_id: i64,
    pub season: u16,
    pub away_team_id: i64,
    pub home_team_id: i64,
    pub set_num: u8,
    /// Position in the match's event stream, counted from 1.
    pub event_number: u32,
    pub event_team_id: i64,
    pub event_text: String,
    pub is_scoring_play: bool,
    /// Deuce play, from 24-24 (14-14 in a fifth set) to the set's end.
    pub is_extra_points: bool,
    /// Running score within the set, `(away, home)` carried forward
    /// across rows without a readable score cell.
    pub away_set_score: u16,
    pub home_set_score: u16,
    /// Match points through this rally, earlier sets included.
    pub away_cumulative_score: u16,
    pub home_cumulative_score: u16,
    pub away_sets_won: u8,
    pub home_sets_won: u8,
}

/// One classified rally: the raw row's scores and text plus event
/// flags and the players the text names, resolved against the rosters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RallyPlay {
    pub game_id: i64,
    pub season: u16,
    pub away_team_id: i64,
    pub home_team_id: i64,
    pub set_num: u8,
    pub event_number: u32,
    pub event_team_id: i64,
    pub event_text: String,
    pub is_scoring_play: bool,
    pub is_extra_points: bool,
    pub away_set_score: u16,
    pub home_set_score: u16,
    pub away_cumulative_score: u16,
    pub home_cumulative_score: u16,
    pub away_sets_won: u8,
    pub home_sets_won: u8,
    /// Parenthesized qualifier on typed events, the `OH` of
    /// `Attack(OH) by ...`.
    pub play_type: Option<String>,
    pub player_name: Option<String>,
    pub player_id: Option<i64>,
    /// The second blocker, or the second player of a paired sub.
    pub second_player_name: Option<String>,
    pub second_player_id: Option<i64>,
    pub timeout_team: Option<String>,
    pub is_serve: bool,
    pub is_service_ace: bool,
    pub is_service_error: bool,
    pub is_reception: bool,
    pub is_set: bool,
    pub is_set_error: bool,
    pub is_attack: bool,
    pub is_attack_error: bool,
    pub is_kill: bool,
    pub is_first_ball_kill: bool,
    pub is_dig: bool,
    pub is_dig_error: bool,
    pub is_block: bool,
    pub is_assisted_block: bool,
    pub is_block_error: bool,
    pub is_ball_handling_error: bool,
    pub is_substitution: bool,
    pub is_sub_in: bool,
    pub is_sub_out: bool,
    pub is_timeout: bool,
    pub is_starting_lineup: bool,
    pub is_challenge: bool,
    pub is_end_of_set: bool,
    pub is_end_of_match: bool,
}

/// Scraper for NCAA volleyball, men's or women's per the constructor.
pub struct VolleyballScraper {
    engine: SportEngine,
}

impl VolleyballScraper {
    pub fn new(config: &ScrapeConfig, gender: Gender) -> Result<Self> {
        let info = match gender {
            Gender::Mens => &super::MENS_VOLLEYBALL,
            Gender::Womens => &super::WOMENS_VOLLEYBALL,
        };
        Ok(Self {
            engine: SportEngine::new(config, info)?,
        })
    }

    /// Teams fielding volleyball in one season and division.
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

    /// Match-by-match lines from a player's page.
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

    /// Every player's box score line for one match.
    pub async fn game_player_stats(&self, game_id: i64) -> Result<Vec<PlayerBoxLine>> {
        game_box(&self.engine, game_id).await
    }

    /// Both teams' summed box score totals for one match.
    pub async fn game_team_stats(&self, game_id: i64) -> Result<Vec<TeamBoxLine>> {
        let lines = game_box(&self.engine, game_id).await?;
        Ok(team_box_lines(&lines))
    }

    /// The raw set-by-set rally log for one match.
    pub async fn raw_pbp(&self, game_id: i64) -> Result<Vec<SetPlay>> {
        let rel = self.engine.rel(&format!("raw_pbp/{game_id}_raw_pbp.csv"));
        if let Some(rows) = self.engine.cache.load_if_fresh::<SetPlay>(&rel, cache::GAME_MAX_AGE) {
            return Ok(rows);
        }
        let (meta, cards) = self.engine.pbp_page(game_id).await?;
        let plays = set_plays(&meta, &cards);
        self.engine.cache.store(&rel, &plays)?;
        Ok(plays)
    }

    /// The rally log classified into event flags, with the players each
    /// rally names resolved against both rosters.
    pub async fn parsed_pbp(&self, game_id: i64) -> Result<Vec<RallyPlay>> {
        let rel = self.engine.rel(&format!("parsed_pbp/{game_id}_parsed_pbp.csv"));
        if let Some(rows) = self.engine.cache.load_if_fresh::<RallyPlay>(&rel, cache::DAY) {
            return Ok(rows);
        }

        let plays = self.raw_pbp(game_id).await?;
        let Some(first) = plays.first() else {
            return Ok(Vec::new());
        };
        let mut directory = HashMap::new();
        for team_id in [first.away_team_id, first.home_team_id] {
            for member in self.engine.roster(team_id).await? {
                if let Some(player_id) = member.player_id {
                    directory.insert(text::normalize_name(&member.full_name), player_id);
                }
            }
        }
        let rows = rally_plays(&plays, &directory);
        self.engine.cache.store(&rel, &rows)?;
        Ok(rows)
    }
}

/// The attack and block counts behind the derived columns. The site
/// rounds its percentage columns to three places; recomputing from the
/// counts keeps four.
#[derive(Debug, Clone, Copy, Default)]
struct AttackTotals {
    kills: u16,
    attack_errors: u16,
    total_attacks: u16,
    solo_blocks: u16,
    assisted_blocks: u16,
}

impl AttackTotals {
    fn from_view(view: &RowView<'_>) -> Self {
        Self {
            kills: view.u16(&["Kills"]).unwrap_or(0),
            attack_errors: view.u16(&["Errors"]).unwrap_or(0),
            total_attacks: view.u16(&["Total Attacks", "TotalAttacks"]).unwrap_or(0),
            solo_blocks: view.u16(&["Block Solos", "BlockSolos"]).unwrap_or(0),
            assisted_blocks: view.u16(&["Block Assists", "BlockAssists"]).unwrap_or(0),
        }
    }

    fn hit_pct(&self) -> Option<f32> {
        if self.total_attacks == 0 {
            return None;
        }
        let net = f32::from(self.kills) - f32::from(self.attack_errors);
        Some(round4(net / f32::from(self.total_attacks)))
    }

    fn total_blocks(&self) -> f32 {
        f32::from(self.solo_blocks) + f32::from(self.assisted_blocks) / 2.0
    }
}

fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

/// Ten or more in two of kills, aces, digs, assists, and total blocks
/// makes a double-double; in three, a triple-double.
fn double_figures(
    kills: Option<u16>,
    aces: Option<u16>,
    digs: Option<u16>,
    assists: Option<u16>,
    total_blocks: f32,
) -> usize {
    let mut tens = [kills, aces, digs, assists]
        .iter()
        .filter(|v| v.unwrap_or(0) >= 10)
        .count();
    if total_blocks >= 10.0 {
        tens += 1;
    }
    tens
}

/// Result cells read `W 3-1`, sometimes with a deciding-set score in
/// parens. Returns `(won, lost)` for the player's team.
fn parse_sets_result(result: &str) -> Option<(u8, u8)> {
    let score: String = result
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-' || *c == '(')
        .collect();
    let score = score.split('(').next()?;
    let (won, lost) = score.split_once('-')?;
    Some((won.parse().ok()?, lost.parse().ok()?))
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
        let attack = AttackTotals::from_view(&view);

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
            sets_played: view.u16(&["S"]),
            matches_started: view.u16(&["MS"]),
            kills: view.u16(&["Kills"]),
            attack_errors: view.u16(&["Errors"]),
            total_attacks: view.u16(&["Total Attacks", "TotalAttacks"]),
            hit_pct: attack.hit_pct(),
            assists: view.u16(&["Assists"]),
            aces: view.u16(&["Aces"]),
            serve_errors: view.u16(&["SErr"]),
            serve_attempts: view.u16(&["SrvAtt"]),
            digs: view.u16(&["Digs"]),
            return_attacks: view.u16(&["RetAtt"]),
            return_errors: view.u16(&["RErr"]),
            solo_blocks: view.u16(&["Block Solos", "BlockSolos"]),
            assisted_blocks: view.u16(&["Block Assists", "BlockAssists"]),
            block_errors: view.u16(&["BErr"]),
            total_blocks: Some(attack.total_blocks()),
            points: view.f32(&["PTS"]),
            ball_handling_errors: view.u16(&["BHE"]),
            double_doubles: view.u16(&["Dbl Dbl", "DblDbl"]),
            triple_doubles: view.u16(&["Trpl Dbl", "TrplDbl"]),
        });
    }
    lines
}

fn game_lines(player_id: i64, season: u16, table: &HtmlTable) -> Vec<PlayerGameLine> {
    let mut lines = Vec::new();
    for (entry, view) in gamelog::gamelog_entries(table) {
        let attack = AttackTotals::from_view(&view);
        let total_blocks = attack.total_blocks();
        let sets = parse_sets_result(&entry.result_text);
        let kills = view.u16(&["Kills"]);
        let aces = view.u16(&["Aces"]);
        let digs = view.u16(&["Digs"]);
        let assists = view.u16(&["Assists"]);
        let tens = double_figures(kills, aces, digs, assists, total_blocks);

        lines.push(PlayerGameLine {
            player_id,
            season,
            game_id: entry.game_id,
            game_date: entry.game_date,
            game_num: entry.game_num,
            opponent_id: entry.opponent_id,
            opponent_name: entry.opponent_name,
            result: entry.result_text,
            sets_won: sets.map(|(won, _)| won),
            sets_lost: sets.map(|(_, lost)| lost),
            games_played: view.u16(&["GP", "G"]),
            games_started: view.u16(&["GS"]),
            sets_played: view.u16(&["S"]),
            kills,
            attack_errors: view.u16(&["Errors"]),
            total_attacks: view.u16(&["Total Attacks", "TotalAttacks"]),
            hit_pct: attack.hit_pct(),
            assists,
            aces,
            serve_errors: view.u16(&["SErr"]),
            serve_attempts: view.u16(&["SrvAtt"]),
            digs,
            return_attacks: view.u16(&["RetAtt"]),
            return_errors: view.u16(&["RErr"]),
            solo_blocks: view.u16(&["Block Solos", "BlockSolos"]),
            assisted_blocks: view.u16(&["Block Assists", "BlockAssists"]),
            block_errors: view.u16(&["BErr"]),
            total_blocks: Some(total_blocks),
            points: view.f32(&["PTS"]),
            ball_handling_errors: view.u16(&["BHE"]),
            double_double: tens >= 2,
            triple_double: tens >= 3,
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

    let attack = AttackTotals::from_view(view);
    let total_blocks = attack.total_blocks();
    let kills = view.u16(&["Kills"]);
    let aces = view.u16(&["Aces"]);
    let digs = view.u16(&["Digs"]);
    let assists = view.u16(&["Assists"]);
    let tens = double_figures(kills, aces, digs, assists, total_blocks);

    Some(PlayerBoxLine {
        game_id: meta.game_id,
        season: meta.season,
        team_id,
        player_id,
        jersey_number: view.string(&["#"]),
        player_name,
        positions: view.string(&["P", "Pos"]),
        games_played: 1,
        sets_played: view.u16(&["S"]),
        kills,
        attack_errors: view.u16(&["Errors"]),
        total_attacks: view.u16(&["Total Attacks", "TotalAttacks"]),
        hit_pct: attack.hit_pct(),
        assists,
        aces,
        serve_errors: view.u16(&["SErr"]),
        digs,
        return_attacks: view.u16(&["RetAtt"]),
        return_errors: view.u16(&["RErr"]),
        solo_blocks: view.u16(&["Block Solos", "BlockSolos"]),
        assisted_blocks: view.u16(&["Block Assists", "BlockAssists"]),
        block_errors: view.u16(&["BErr"]),
        total_blocks,
        points: view.f32(&["PTS"]),
        ball_handling_errors: view.u16(&["BHE"]),
        double_double: tens >= 2,
        triple_double: tens >= 3,
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
        add(&mut team.sets_played, line.sets_played);
        add(&mut team.kills, line.kills);
        add(&mut team.attack_errors, line.attack_errors);
        add(&mut team.total_attacks, line.total_attacks);
        add(&mut team.assists, line.assists);
        add(&mut team.aces, line.aces);
        add(&mut team.serve_errors, line.serve_errors);
        add(&mut team.digs, line.digs);
        add(&mut team.return_attacks, line.return_attacks);
        add(&mut team.return_errors, line.return_errors);
        add(&mut team.solo_blocks, line.solo_blocks);
        add(&mut team.assisted_blocks, line.assisted_blocks);
        add(&mut team.block_errors, line.block_errors);
        add(&mut team.ball_handling_errors, line.ball_handling_errors);
        team.points += line.points.unwrap_or(0.0);
        if line.double_double {
            team.double_doubles += 1;
        }
        if line.triple_double {
            team.triple_doubles += 1;
        }
    }

    for team in &mut teams {
        let attack = AttackTotals {
            kills: team.kills,
            attack_errors: team.attack_errors,
            total_attacks: team.total_attacks,
            solo_blocks: team.solo_blocks,
            assisted_blocks: team.assisted_blocks,
        };
        team.hit_pct = attack.hit_pct();
        team.total_blocks = attack.total_blocks();
    }
    teams
}

/// Scoring cells prefix the description with `Team +`; keep the
/// description.
fn rally_text(raw: &str) -> String {
    match raw.split_once('+') {
        Some((_, rest)) => rest.trim().to_string(),
        None => raw.trim().to_string(),
    }
}

/// Flattens set cards into rally rows. Rows read away text, running
/// score, home text. Each set closes with a synthetic `END SET` row
/// carrying its final scores and the sets won so far, and the match
/// with an `END MATCH` row.
fn set_plays(meta: &GameMeta, cards: &[PeriodCard]) -> Vec<SetPlay> {
    let mut plays = Vec::new();
    let (mut away_sets_won, mut home_sets_won) = (0u8, 0u8);
    let (mut away_cumulative, mut home_cumulative) = (0u16, 0u16);
    let (mut away_score, mut home_score) = (0u16, 0u16);
    let mut event_team_id = meta.away_team_id;
    let mut last_set = 0u8;

    for card in cards {
        let Some(set_num) = card.number() else {
            continue;
        };
        last_set = set_num;
        away_score = 0;
        home_score = 0;
        let deuce_at = if set_num >= 5 { 14 } else { 24 };
        let mut is_extra_points = false;

        for row in &card.rows {
            if row.len() < 3 {
                continue;
            }
            let event_text = if !row[0].is_empty() {
                event_team_id = meta.away_team_id;
                rally_text(&row[0])
            } else if !row[2].is_empty() {
                event_team_id = meta.home_team_id;
                rally_text(&row[2])
            } else {
                continue;
            };
            // Timeout and sub rows print no score; the previous one
            // stands.
            let score = pbp::parse_running_score(&row[1]);
            if let Some((away, home)) = score {
                away_score = away;
                home_score = home;
            }
            if away_score >= deuce_at && home_score >= deuce_at {
                is_extra_points = true;
            }
            plays.push(SetPlay {
                game_id: meta.game_id,
                season: meta.season,
                away_team_id: meta.away_team_id,
                home_team_id: meta.home_team_id,
                set_num,
                event_number: 0,
                event_team_id,
                event_text,
                is_scoring_play: score.is_some(),
                is_extra_points,
                away_set_score: away_score,
                home_set_score: home_score,
                away_cumulative_score: away_cumulative + away_score,
                home_cumulative_score: home_cumulative + home_score,
                away_sets_won,
                home_sets_won,
            });
        }

        away_cumulative += away_score;
        home_cumulative += home_score;
        if away_score > home_score {
            away_sets_won += 1;
        } else if home_score > away_score {
            home_sets_won += 1;
        }
        plays.push(SetPlay {
            game_id: meta.game_id,
            season: meta.season,
            away_team_id: meta.away_team_id,
            home_team_id: meta.home_team_id,
            set_num,
            event_number: 0,
            event_team_id,
            event_text: format!("END SET {set_num}"),
            is_scoring_play: false,
            is_extra_points,
            away_set_score: away_score,
            home_set_score: home_score,
            away_cumulative_score: away_cumulative,
            home_cumulative_score: home_cumulative,
            away_sets_won,
            home_sets_won,
        });
    }

    plays.push(SetPlay {
        game_id: meta.game_id,
        season: meta.season,
        away_team_id: meta.away_team_id,
        home_team_id: meta.home_team_id,
        set_num: last_set,
        event_number: 0,
        event_team_id,
        event_text: "END MATCH".to_string(),
        is_scoring_play: false,
        is_extra_points: false,
        away_set_score: away_score,
        home_set_score: home_score,
        away_cumulative_score: away_cumulative,
        home_cumulative_score: home_cumulative,
        away_sets_won,
        home_sets_won,
    });

    for (idx, play) in plays.iter_mut().enumerate() {
        play.event_number = (idx + 1) as u32;
    }
    plays
}

/// Flags and captures classified out of one rally's text.
#[derive(Debug, Default, Clone, PartialEq)]
struct RallyEvent {
    play_type: Option<String>,
    player_name: Option<String>,
    second_player_name: Option<String>,
    timeout_team: Option<String>,
    is_serve: bool,
    is_service_ace: bool,
    is_service_error: bool,
    is_reception: bool,
    is_set: bool,
    is_set_error: bool,
    is_attack: bool,
    is_attack_error: bool,
    is_kill: bool,
    is_first_ball_kill: bool,
    is_dig: bool,
    is_dig_error: bool,
    is_block: bool,
    is_assisted_block: bool,
    is_block_error: bool,
    is_ball_handling_error: bool,
    is_substitution: bool,
    is_sub_in: bool,
    is_sub_out: bool,
    is_timeout: bool,
    is_starting_lineup: bool,
    is_challenge: bool,
    is_end_of_set: bool,
    is_end_of_match: bool,
}

/// Captured names keep a trailing parenthetical out and drop the
/// sentence's closing period.
fn captured_name(raw: &str) -> Option<String> {
    let name = raw.trim().trim_end_matches('.').trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn by_name(event_text: &str) -> Option<String> {
    BY_NAME_RE
        .captures(event_text)
        .and_then(|c| captured_name(&c[1]))
}

fn typed_play(event_text: &str) -> (Option<String>, Option<String>) {
    match TYPED_PLAY_RE.captures(event_text) {
        Some(c) => (captured_name(&c[2]), captured_name(&c[3])),
        None => (None, None),
    }
}

/// Two blockers read `First Last, First Last`; a lone `Last, First`
/// has no space after its comma half.
fn split_block_pair(name: &str) -> (String, Option<String>) {
    if let Some((first, second)) = name.split_once(", ") {
        if second.contains(' ') && !second.contains(',') {
            return (first.to_string(), Some(second.to_string()));
        }
    }
    (name.to_string(), None)
}

/// Classifies one rally's text. Returns `None` for filler rows that
/// describe nothing. Checks run most-specific first; a row no branch
/// claims keeps its text with every flag unset.
fn classify(event_text: &str) -> Option<RallyEvent> {
    let lowered = event_text.to_lowercase();
    let mut event = RallyEvent::default();
    if lowered.contains("match started")
        || lowered.contains("set started")
        || lowered.contains("set ended")
        || lowered.contains("match ended")
    {
        // Scoreboard chrome; keep the row, flag nothing.
    } else if lowered.contains("end match") {
        event.is_end_of_match = true;
    } else if event_text == "Team(Independent) by Team" {
        return None;
    } else if lowered.contains("end of") && lowered.contains("set") {
        return None;
    } else if lowered.contains("end set") {
        event.is_end_of_set = true;
    } else if lowered.contains("media timeout") || lowered.contains("facultative timeout") {
        event.is_timeout = true;
    } else if lowered.contains("timeout ") {
        event.is_timeout = true;
        event.timeout_team = TIMEOUT_TEAM_RE
            .captures(event_text)
            .and_then(|c| captured_name(&c[1]));
    } else if lowered.contains("starters:") {
        event.is_starting_lineup = true;
    } else if lowered.contains("challenge") {
        event.is_challenge = true;
    } else if lowered.contains("sub in") {
        event.is_substitution = true;
        event.is_sub_in = true;
        event.player_name = SUB_NAME_RE
            .captures(event_text)
            .and_then(|c| captured_name(&c[1]));
    } else if lowered.contains("sub out") {
        event.is_substitution = true;
        event.is_sub_out = true;
        event.player_name = SUB_NAME_RE
            .captures(event_text)
            .and_then(|c| captured_name(&c[1]));
    } else if lowered.contains("substitution by") {
        event.is_substitution = true;
        event.player_name = by_name(event_text);
    } else if lowered.contains("subs:") {
        event.is_substitution = true;
        event.is_sub_in = true;
        event.is_sub_out = true;
        if let Some(c) = TEAM_SUBS_RE.captures(event_text) {
            let mut names = c[1].split_whitespace();
            event.player_name = names.next().map(str::to_string);
            event.second_player_name = names.next().map(str::to_string);
        }
    } else if lowered.contains("serves") {
        event.is_serve = true;
        event.player_name = SERVER_RE
            .captures(event_text)
            .and_then(|c| captured_name(&c[1]));
    } else if lowered.contains(") service ace") {
        event.is_service_ace = true;
        event.player_name = POINT_SERVE_RE
            .captures(event_text)
            .and_then(|c| captured_name(&c[1]));
    } else if lowered.contains(") service error") {
        event.is_service_error = true;
        event.player_name = POINT_SERVE_RE
            .captures(event_text)
            .and_then(|c| captured_name(&c[1]));
    } else if lowered.contains("service error") {
        event.is_service_error = true;
        event.player_name = SERVICE_ERROR_RE
            .captures(event_text)
            .and_then(|c| captured_name(&c[1]));
    } else if lowered.contains("reception by") {
        event.is_reception = true;
        event.player_name = by_name(event_text);
    } else if lowered.contains("bad set by") {
        event.is_set_error = true;
        event.player_name = by_name(event_text);
    } else if lowered.contains("set(") && lowered.contains(") by") {
        event.is_set = true;
        (event.play_type, event.player_name) = typed_play(event_text);
    } else if lowered.contains("set by") {
        event.is_set = true;
        event.player_name = by_name(event_text);
    } else if lowered.contains("set error by") {
        event.is_set_error = true;
        event.player_name = by_name(event_text);
    } else if lowered.contains("attack error by") {
        event.is_attack_error = true;
        event.player_name = by_name(event_text);
    } else if lowered.contains("attack(") && lowered.contains(") by") {
        event.is_attack = true;
        (event.play_type, event.player_name) = typed_play(event_text);
    } else if lowered.contains("attack by") {
        event.is_attack = true;
        event.player_name = by_name(event_text);
    } else if lowered.contains("dig by") {
        event.is_dig = true;
        event.player_name = by_name(event_text);
    } else if lowered.contains("dig error by") {
        event.is_dig_error = true;
        event.player_name = by_name(event_text);
    } else if lowered.contains("first ball kill") {
        event.is_kill = true;
        event.is_first_ball_kill = true;
        event.player_name = by_name(event_text);
    } else if lowered.contains("kill by") {
        event.is_kill = true;
        event.player_name = by_name(event_text);
    } else if lowered.contains("block error by") {
        event.is_block_error = true;
        event.player_name = by_name(event_text);
    } else if lowered.contains("block by") {
        event.is_block = true;
        if let Some(name) = by_name(event_text) {
            let (first, second) = split_block_pair(&name);
            event.is_assisted_block = second.is_some();
            event.player_name = Some(first);
            event.second_player_name = second;
        }
    } else if lowered.contains("block(") && lowered.contains(") by") {
        event.is_block = true;
        (event.play_type, event.player_name) = typed_play(event_text);
    } else if lowered.contains("ball handling error by") {
        event.is_ball_handling_error = true;
        event.player_name = by_name(event_text);
    } else if lowered.contains("reception(") && lowered.contains(") by") {
        event.is_reception = true;
        (event.play_type, event.player_name) = typed_play(event_text);
    } else {
        debug!(event = %event_text, "unclassified rally event");
    }
    Some(event)
}

fn resolve(directory: &HashMap<String, i64>, name: Option<&str>) -> Option<i64> {
    directory.get(&text::normalize_name(name?)).copied()
}

fn rally_plays(plays: &[SetPlay], directory: &HashMap<String, i64>) -> Vec<RallyPlay> {
    let mut rows = Vec::new();
    for play in plays {
        let Some(event) = classify(&play.event_text) else {
            continue;
        };
        let player_id = resolve(directory, event.player_name.as_deref());
        let second_player_id = resolve(directory, event.second_player_name.as_deref());
        rows.push(RallyPlay {
            game_id: play.game_id,
            season: play.season,
            away_team_id: play.away_team_id,
            home_team_id: play.home_team_id,
            set_num: play.set_num,
            event_number: play.event_number,
            event_team_id: play.event_team_id,
            event_text: play.event_text.clone(),
            is_scoring_play: play.is_scoring_play,
            is_extra_points: play.is_extra_points,
            away_set_score: play.away_set_score,
            home_set_score: play.home_set_score,
            away_cumulative_score: play.away_cumulative_score,
            home_cumulative_score: play.home_cumulative_score,
            away_sets_won: play.away_sets_won,
            home_sets_won: play.home_sets_won,
            play_type: event.play_type,
            player_name: event.player_name,
            player_id,
            second_player_name: event.second_player_name,
            second_player_id,
            timeout_team: event.timeout_team,
            is_serve: event.is_serve,
            is_service_ace: event.is_service_ace,
            is_service_error: event.is_service_error,
            is_reception: event.is_reception,
            is_set: event.is_set,
            is_set_error: event.is_set_error,
            is_attack: event.is_attack,
            is_attack_error: event.is_attack_error,
            is_kill: event.is_kill,
            is_first_ball_kill: event.is_first_ball_kill,
            is_dig: event.is_dig,
            is_dig_error: event.is_dig_error,
            is_block: event.is_block,
            is_assisted_block: event.is_assisted_block,
            is_block_error: event.is_block_error,
            is_ball_handling_error: event.is_ball_handling_error,
            is_substitution: event.is_substitution,
            is_sub_in: event.is_sub_in,
            is_sub_out: event.is_sub_out,
            is_timeout: event.is_timeout,
            is_starting_lineup: event.is_starting_lineup,
            is_challenge: event.is_challenge,
            is_end_of_set: event.is_end_of_set,
            is_end_of_match: event.is_end_of_match,
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn team() -> Team {
        Team {
            season: 2024,
            division: Division::I,
            sport_code: "WVB".to_string(),
            team_id: 585400,
            school_id: Some(334),
            school_name: "Kentucky".to_string(),
            conference: Some("SEC".to_string()),
        }
    }

    fn meta() -> GameMeta {
        GameMeta {
            game_id: 6081234,
            season: 2024,
            game_datetime: None,
            stadium_name: Some("Memorial Coliseum".to_string()),
            attendance: Some(5239),
            away_team_id: 585400,
            away_team_name: "Kentucky".to_string(),
            home_team_id: 585500,
            home_team_name: "Nebraska".to_string(),
        }
    }

    fn parse(html: &str, css: &str) -> HtmlTable {
        let doc = Html::parse_document(html);
        stat_table::parse_table(&doc, css).unwrap()
    }

    const SEASON_GRID: &str = r#"
    <table id="stat_grid" class="small_font dataTable table-bordered">
      <thead><tr>
        <th>#</th><th>Player</th><th>Yr</th><th>Pos</th><th>Ht</th>
        <th>GP</th><th>GS</th><th>S</th><th>MS</th><th>Kills</th>
        <th>Errors</th><th>Total Attacks</th><th>Hit Pct</th><th>Assists</th>
        <th>Aces</th><th>SErr</th><th>SrvAtt</th><th>Digs</th><th>RetAtt</th>
        <th>RErr</th><th>Block Solos</th><th>Block Assists</th><th>BErr</th>
        <th>TB</th><th>PTS</th><th>BHE</th><th>Dbl Dbl</th><th>Trpl Dbl</th>
      </tr></thead>
      <tbody>
        <tr class="text">
          <td>7</td>
          <td data-order="Skinner,Avery">
            <a href="/players/8200441">Skinner, Avery</a>
          </td>
          <td>Sr</td><td>OH</td><td>6-1</td>
          <td>28</td><td>28</td><td>101</td><td>28</td><td>339</td>
          <td>104</td><td>940</td><td>.250</td><td>12</td>
          <td>21</td><td>30</td><td>320</td><td>221</td><td>400</td>
          <td>18</td><td>8</td><td>40</td><td>5</td>
          <td>28.0</td><td>388.0</td><td>2</td><td>4</td><td>0</td>
        </tr>
        <tr class="text">
          <td></td>
          <td>Team</td>
          <td></td><td></td><td></td>
          <td>28</td><td></td><td>101</td><td></td><td></td>
          <td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td><td></td>
          <td></td><td></td><td>3</td><td></td><td></td>
        </tr>
        <tr class="grey_heading">
          <td></td><td>Totals</td>
          <td></td><td></td><td></td>
          <td>28</td><td></td><td>101</td><td></td><td>1301</td>
          <td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td><td></td><td></td>
        </tr>
      </tbody>
    </table>"#;

    #[test]
    fn test_season_lines_recompute_rates() {
        let table = parse(SEASON_GRID, "table#stat_grid");
        let lines = season_lines(&team(), &table);
        assert_eq!(lines.len(), 1);

        let line = &lines[0];
        assert_eq!(line.player_name, "Avery Skinner");
        assert_eq!(line.player_id, Some(8200441));
        assert_eq!(line.sets_played, Some(101));
        assert_eq!(line.matches_started, Some(28));
        assert_eq!(line.kills, Some(339));
        assert_eq!(line.total_attacks, Some(940));
        // (339 - 104) / 940, not the printed .250.
        assert_eq!(line.hit_pct, Some(0.25));
        assert_eq!(line.total_blocks, Some(28.0));
        assert_eq!(line.points, Some(388.0));
        assert_eq!(line.serve_attempts, Some(320));
        assert_eq!(line.double_doubles, Some(4));
    }

    #[test]
    fn test_season_lines_negative_hit_pct() {
        let html = SEASON_GRID.replace("<td>339</td>", "<td>50</td>");
        let table = parse(&html, "table#stat_grid");
        let lines = season_lines(&team(), &table);
        assert_eq!(lines[0].hit_pct, Some(-0.0574));
    }

    const PLAYER_PAGE: &str = r#"
    <table class="small_font dataTable table-bordered">
      <thead><tr><th>Year</th><th>S</th></tr></thead>
      <tbody><tr><td>2024-25</td><td>101</td></tr></tbody>
    </table>
    <table class="small_font dataTable table-bordered">
      <thead><tr>
        <th>Date</th><th>Opponent</th><th>Result</th><th>S</th><th>Kills</th>
        <th>Errors</th><th>TotalAttacks</th><th>HitPct</th><th>Assists</th>
        <th>Aces</th><th>SErr</th><th>Digs</th><th>RetAtt</th><th>RErr</th>
        <th>BlockSolos</th><th>BlockAssists</th><th>BErr</th><th>BHE</th>
        <th>PTS</th>
      </tr></thead>
      <tbody>
        <tr id="contest_6081234">
          <td>09/14/2024</td>
          <td><a href="/teams/585500">Nebraska</a></td>
          <td><a href="/contests/6081234/box_score">W 3-1</a></td>
          <td>4</td><td>12</td>
          <td>3</td><td>30</td><td>.300</td><td>2</td>
          <td>1</td><td>2</td><td>11</td><td>8</td><td>1</td>
          <td>1</td><td>4</td><td>0</td><td>0</td>
          <td>15.0</td>
        </tr>
        <tr id="contest_6081235">
          <td>09/15/2024</td>
          <td><a href="/teams/585501">Omaha</a></td>
          <td>Ppd</td>
          <td></td><td></td>
          <td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td><td></td>
          <td></td>
        </tr>
      </tbody>
    </table>"#;

    #[test]
    fn test_game_lines_sets_and_doubles() {
        let table = gamelog::parse_player_gamelog(PLAYER_PAGE).unwrap();
        let lines = game_lines(8200441, 2024, &table);
        assert_eq!(lines.len(), 1);

        let line = &lines[0];
        assert_eq!(line.game_id, Some(6081234));
        assert_eq!(line.opponent_id, Some(585500));
        assert_eq!(line.result, "W 3-1");
        assert_eq!(line.sets_won, Some(3));
        assert_eq!(line.sets_lost, Some(1));
        assert_eq!(line.sets_played, Some(4));
        assert_eq!(line.hit_pct, Some(0.3));
        assert_eq!(line.total_blocks, Some(3.0));
        // Kills 12 and digs 11 reach ten; blocks do not.
        assert!(line.double_double);
        assert!(!line.triple_double);
    }

    #[test]
    fn test_parse_sets_result() {
        assert_eq!(parse_sets_result("W 3-1"), Some((3, 1)));
        assert_eq!(parse_sets_result("L 2-3 (15-13)"), Some((2, 3)));
        assert_eq!(parse_sets_result("Ppd"), None);
    }

    const BOX_TABLE: &str = r#"
    <table class="mytable">
      <thead><tr>
        <th>#</th><th>Name</th><th>P</th><th>S</th><th>Kills</th>
        <th>Errors</th><th>TotalAttacks</th><th>HitPct</th><th>Assists</th>
        <th>Aces</th><th>SErr</th><th>Digs</th><th>RetAtt</th><th>RErr</th>
        <th>BlockSolos</th><th>BlockAssists</th><th>BErr</th><th>BHE</th>
        <th>PTS</th>
      </tr></thead>
      <tbody>
        <tr>
          <td>7</td>
          <td><a href="/players/8200441">Skinner, Avery</a></td>
          <td>OH</td><td>4</td><td>18</td>
          <td>4</td><td>40</td><td>.350</td><td>1</td>
          <td>2</td><td>1</td><td>12</td><td>10</td><td>0</td>
          <td>2</td><td>16</td><td>1</td><td>0</td>
          <td>21.0</td>
        </tr>
        <tr>
          <td></td>
          <td>TEAM</td>
          <td></td><td></td><td></td>
          <td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td><td>1</td>
          <td></td>
        </tr>
        <tr>
          <td></td>
          <td>Kentucky Totals</td>
          <td></td><td>4</td><td>52</td>
          <td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td><td></td><td></td>
          <td></td><td></td><td></td><td></td>
          <td></td>
        </tr>
      </tbody>
    </table>"#;

    fn stat_box(team_id: i64, heading: &str) -> StatBox {
        StatBox {
            heading: heading.to_string(),
            team_id,
            table: parse(BOX_TABLE, "table.mytable"),
        }
    }

    #[test]
    fn test_box_lines_skip_team_rows() {
        let boxes = vec![
            stat_box(585400, "Kentucky Period Stats"),
            stat_box(585500, "Nebraska Period Stats"),
        ];
        let lines = box_lines(&meta(), &boxes);
        assert_eq!(lines.len(), 2);

        let line = &lines[0];
        assert_eq!(line.team_id, 585400);
        assert_eq!(line.player_id, 8200441);
        assert_eq!(line.games_played, 1);
        assert_eq!(line.sets_played, Some(4));
        assert_eq!(line.hit_pct, Some(0.35));
        assert_eq!(line.total_blocks, 10.0);
        // Kills, digs, and blocks all reach ten.
        assert!(line.triple_double);
        assert_eq!(lines[1].team_id, 585500);
    }

    #[test]
    fn test_team_box_lines_recompute_rates() {
        let boxes = vec![stat_box(585400, "Kentucky Period Stats")];
        let teams = team_box_lines(&box_lines(&meta(), &boxes));
        assert_eq!(teams.len(), 1);

        let team = &teams[0];
        assert_eq!(team.kills, 18);
        assert_eq!(team.sets_played, 4);
        assert_eq!(team.hit_pct, Some(0.35));
        assert_eq!(team.total_blocks, 10.0);
        assert_eq!(team.points, 21.0);
        assert_eq!(team.double_doubles, 1);
        assert_eq!(team.triple_doubles, 1);
    }

    fn play_card(heading: &str, rows: Vec<[&str; 3]>) -> PeriodCard {
        PeriodCard {
            heading: heading.to_string(),
            rows: rows
                .into_iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_set_plays_scores_and_synthetics() {
        let cards = vec![
            play_card(
                "1st Set",
                vec![
                    ["Skinner, Avery serves", "", ""],
                    ["", "0-1", "Nebraska + Kill by Church, Lindsay."],
                    ["Kentucky + Kill by Skinner, Avery.", "1-1", ""],
                    ["", "1-2", "Nebraska + Kill by Church, Lindsay."],
                ],
            ),
            play_card(
                "2nd Set",
                vec![
                    ["Kentucky + Kill by Skinner, Avery.", "1-0", ""],
                    ["", "1-1", "Nebraska + Kill by Church, Lindsay."],
                ],
            ),
        ];
        let plays = set_plays(&meta(), &cards);
        assert_eq!(plays.len(), 9);

        let serve = &plays[0];
        assert_eq!(serve.event_team_id, 585400);
        assert!(!serve.is_scoring_play);
        assert_eq!((serve.away_set_score, serve.home_set_score), (0, 0));
        assert_eq!(serve.event_number, 1);

        let home_kill = &plays[1];
        assert_eq!(home_kill.event_team_id, 585500);
        assert!(home_kill.is_scoring_play);
        assert_eq!((home_kill.away_set_score, home_kill.home_set_score), (0, 1));

        // The `Team +` scoring prefix comes off.
        assert_eq!(plays[2].event_text, "Kill by Skinner, Avery.");

        let end_one = &plays[4];
        assert_eq!(end_one.event_text, "END SET 1");
        assert!(!end_one.is_scoring_play);
        assert_eq!((end_one.away_set_score, end_one.home_set_score), (1, 2));
        assert_eq!((end_one.away_sets_won, end_one.home_sets_won), (0, 1));

        // Cumulative score carries the finished set into the next.
        let second_set = &plays[5];
        assert_eq!(second_set.set_num, 2);
        assert_eq!((second_set.away_set_score, second_set.home_set_score), (1, 0));
        assert_eq!(
            (second_set.away_cumulative_score, second_set.home_cumulative_score),
            (2, 2)
        );

        let end_match = &plays[8];
        assert_eq!(end_match.event_text, "END MATCH");
        assert_eq!(end_match.set_num, 2);
        assert_eq!(
            (end_match.away_cumulative_score, end_match.home_cumulative_score),
            (2, 3)
        );
        assert_eq!(end_match.event_number, 9);
    }

    #[test]
    fn test_set_plays_deuce_flags() {
        let cards = vec![play_card(
            "4th Set",
            vec![
                ["", "23-24", "Nebraska + Kill by Church, Lindsay."],
                ["Kentucky + Kill by Skinner, Avery.", "24-24", ""],
                ["", "", "Timeout Nebraska."],
                ["Kentucky + Kill by Skinner, Avery.", "26-24", ""],
            ],
        )];
        let plays = set_plays(&meta(), &cards);

        assert!(!plays[0].is_extra_points);
        assert!(plays[1].is_extra_points);
        // Sticky through the scoreless timeout row.
        assert!(plays[2].is_extra_points);
        assert!(plays[3].is_extra_points);

        let end_set = &plays[4];
        assert!(end_set.is_extra_points);
        assert_eq!((end_set.away_sets_won, end_set.home_sets_won), (1, 0));
    }

    #[test]
    fn test_set_plays_fifth_set_deuce_at_fourteen() {
        let cards = vec![
            play_card("3rd Set", vec![["Kentucky + Kill by Skinner, Avery.", "14-14", ""]]),
            play_card("5th Set", vec![["Kentucky + Kill by Skinner, Avery.", "14-14", ""]]),
        ];
        let plays = set_plays(&meta(), &cards);
        assert!(!plays[0].is_extra_points);
        assert!(plays[2].is_extra_points);
    }

    #[test]
    fn test_set_winner_from_set_scores() {
        // Kentucky takes the second set while still behind on total
        // points.
        let cards = vec![
            play_card("1st Set", vec![["", "10-25", "Nebraska + Kill by Church, Lindsay."]]),
            play_card("2nd Set", vec![["Kentucky + Kill by Skinner, Avery.", "25-23", ""]]),
        ];
        let plays = set_plays(&meta(), &cards);

        let end_two = &plays[3];
        assert_eq!(end_two.event_text, "END SET 2");
        assert_eq!((end_two.away_sets_won, end_two.home_sets_won), (1, 1));
        assert_eq!(
            (end_two.away_cumulative_score, end_two.home_cumulative_score),
            (35, 48)
        );
    }

    #[test]
    fn test_classify_rally_events() {
        let kill = classify("Kill by SKINNER, Avery (from Lilley, Emma).").unwrap();
        assert!(kill.is_kill);
        assert!(!kill.is_first_ball_kill);
        assert_eq!(kill.player_name.as_deref(), Some("SKINNER, Avery"));

        let fbk = classify("First ball kill by SKINNER, Avery.").unwrap();
        assert!(fbk.is_kill && fbk.is_first_ball_kill);

        let ace =
            classify("Point Kentucky: (Skinner, Avery) Service ace (Church, Lindsay).").unwrap();
        assert!(ace.is_service_ace);
        assert_eq!(ace.player_name.as_deref(), Some("Skinner, Avery"));

        let serve = classify("Skinner, Avery serves.").unwrap();
        assert!(serve.is_serve);
        assert_eq!(serve.player_name.as_deref(), Some("Skinner, Avery"));

        let timeout = classify("Timeout Kentucky.").unwrap();
        assert!(timeout.is_timeout);
        assert_eq!(timeout.timeout_team.as_deref(), Some("Kentucky"));

        let media = classify("Media timeout.").unwrap();
        assert!(media.is_timeout);
        assert_eq!(media.timeout_team, None);

        let sub = classify("Sub in Stumler, Alli.").unwrap();
        assert!(sub.is_substitution && sub.is_sub_in && !sub.is_sub_out);
        assert_eq!(sub.player_name.as_deref(), Some("Stumler, Alli"));

        let typed = classify("Attack(OH) by Skinner, Avery (blocked).").unwrap();
        assert!(typed.is_attack);
        assert_eq!(typed.play_type.as_deref(), Some("OH"));
        assert_eq!(typed.player_name.as_deref(), Some("Skinner, Avery"));
    }

    #[test]
    fn test_classify_blocks() {
        let paired = classify("Block by Azhani Tealer, Reagan Rutherford.").unwrap();
        assert!(paired.is_block && paired.is_assisted_block);
        assert_eq!(paired.player_name.as_deref(), Some("Azhani Tealer"));
        assert_eq!(paired.second_player_name.as_deref(), Some("Reagan Rutherford"));

        // A lone blocker in `Last, First` form is not a pair.
        let solo = classify("Block by TEALER, Azhani.").unwrap();
        assert!(solo.is_block && !solo.is_assisted_block);
        assert_eq!(solo.player_name.as_deref(), Some("TEALER, Azhani"));
        assert_eq!(solo.second_player_name, None);

        let typed = classify("Block(A) by TEALER, Azhani.").unwrap();
        assert!(typed.is_block);
        assert_eq!(typed.play_type.as_deref(), Some("A"));
        assert_eq!(typed.player_name.as_deref(), Some("TEALER, Azhani"));
    }

    #[test]
    fn test_classify_chrome_and_filler() {
        assert!(classify("End of 3rd Set.").is_none());
        assert!(classify("Team(Independent) by Team").is_none());

        let end_set = classify("END SET 2").unwrap();
        assert!(end_set.is_end_of_set);
        let end_match = classify("END MATCH").unwrap();
        assert!(end_match.is_end_of_match);

        let started = classify("Match started").unwrap();
        assert_eq!(started, RallyEvent::default());

        let unknown = classify("Libero exchange for Kentucky").unwrap();
        assert_eq!(unknown, RallyEvent::default());
    }

    fn set_play(event_text: &str) -> SetPlay {
        SetPlay {
            game_id: 6081234,
            season: 2024,
            away_team_id: 585400,
            home_team_id: 585500,
            set_num: 1,
            event_number: 2,
            event_team_id: 585400,
            event_text: event_text.to_string(),
            is_scoring_play: true,
            is_extra_points: false,
            away_set_score: 1,
            home_set_score: 0,
            away_cumulative_score: 1,
            home_cumulative_score: 0,
            away_sets_won: 0,
            home_sets_won: 0,
        }
    }

    #[test]
    fn test_rally_plays_resolve_roster_ids() {
        let mut directory = HashMap::new();
        directory.insert(text::normalize_name("Avery Skinner"), 8200441i64);
        directory.insert(text::normalize_name("Lindsay Church"), 8200500i64);

        let plays = vec![
            set_play("Kill by SKINNER, Avery (from Lilley, Emma)."),
            set_play("End of 1st Set."),
        ];
        let rows = rally_plays(&plays, &directory);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_kill);
        assert_eq!(rows[0].player_id, Some(8200441));
        assert_eq!(rows[0].second_player_id, None);
        assert_eq!(rows[0].event_number, 2);
    }
}
