//! The scraping engine behind every sport module.
//!
//! Holds the HTTP client and the cache store, and implements the flows
//! the sports share: team lists via the rankings pages, team schedule
//! pages, day scoreboards, rosters, and the contest page fetches the
//! sport-specific stat builders start from.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Local, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::cache::{self, CacheStore};
use crate::config::ScrapeConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::models::{Division, GameMeta, RosterMember, ScheduleGame, ScoreboardGame, Team};
use crate::pages::boxscore::{self, GameHeader, StatBox};
use crate::pages::drives::{self, Drive};
use crate::pages::pbp::{self, PeriodCard};
use crate::pages::rankings::{self, RankedTeam};
use crate::pages::roster;
use crate::pages::schedule::{self, TeamPage};
use crate::pages::scoreboard::{self, ScoreboardBox};
use crate::pages::stat_table::HtmlTable;
use crate::schools;
use crate::sports::SportInfo;
use crate::utils::{dates, text};

pub(crate) const BASE_URL: &str = "https://stats.ncaa.org";

pub(crate) struct SportEngine {
    pub http: HttpClient,
    pub cache: CacheStore,
    pub info: &'static SportInfo,
}

impl SportEngine {
    pub fn new(config: &ScrapeConfig, info: &'static SportInfo) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
            cache: CacheStore::new(config.cache_root.clone()),
            info,
        })
    }

    /// Cache path under this sport's directory.
    pub fn rel(&self, tail: &str) -> String {
        format!("{}/{}", self.info.cache_dir, tail)
    }

    /// The newest season worth asking the site about.
    pub fn current_season(&self) -> u16 {
        Local::now().year() as u16
    }

    /// Rejects divisions the sport is not played in. Football reads a
    /// plain division I request as FBS.
    fn check_division(&self, division: Division) -> Result<Division> {
        if self.info.divisions.contains(&division) {
            return Ok(division);
        }
        if division == Division::I && self.info.divisions.contains(&Division::Fbs) {
            warn!(
                "division I {} means FBS here; ask for FCS explicitly if you want I-AA",
                self.info.name
            );
            return Ok(Division::Fbs);
        }
        Err(Error::UnknownDivision {
            sport: self.info.name,
            division: division.to_string(),
        })
    }

    /// Every team fielding this sport in one season and division, joined
    /// with the schools registry for institution ids.
    pub async fn teams(&self, season: u16, division: Division) -> Result<Vec<Team>> {
        let division = self.check_division(division)?;
        if season < self.info.first_season {
            return Err(Error::UnknownSeason(season));
        }
        let rel = self.rel(&format!("teams/{season}_{division}_teams.csv"));
        let today = Local::now().date_naive();
        let max_age = cache::team_list_max_age(season, today);
        if let Some(rows) = self.cache.load_if_fresh::<Team>(&rel, max_age) {
            return Ok(rows);
        }

        let schools = schools::load_schools(&self.http, &self.cache).await?;
        let index = schools::school_index(&schools);

        let ay = self.info.academic_year(season);
        let lvl = division.level();
        let code = self.info.code;
        let picker_url = format!(
            "{BASE_URL}/rankings/change_sport_year_div?\
             academic_year={ay}.0&division={lvl}.0&sport_code={code}"
        );
        let picker_html = self.http.get(&picker_url).await?;
        let periods = rankings::parse_ranking_periods(&picker_html)?;
        let rp = rankings::final_ranking_period(&periods)
            .ok_or_else(|| Error::markup("season page lists no ranking periods"))?
            .value
            .clone();

        let ranked = if self.info.uses_legacy_listing(season) {
            self.national_ranking(season, division, &rp).await?
        } else {
            match self.institution_trends(season, division, &rp).await {
                Ok(teams) => teams,
                Err(err) => {
                    warn!(
                        season,
                        %division,
                        "institution_trends failed ({err}), falling back to national_ranking"
                    );
                    self.national_ranking(season, division, &rp).await?
                }
            }
        };

        let teams: Vec<Team> = ranked
            .into_iter()
            .map(|ranked| self.ranked_to_team(ranked, season, division, &index))
            .collect();
        self.cache.store(&rel, &teams)?;
        Ok(teams)
    }

    async fn institution_trends(
        &self,
        season: u16,
        division: Division,
        rp: &str,
    ) -> Result<Vec<RankedTeam>> {
        let ay = self.info.academic_year(season);
        let lvl = division.level();
        let code = self.info.code;
        let mut url = format!(
            "{BASE_URL}/rankings/institution_trends?\
             academic_year={ay}.0&division={lvl}.0&ranking_period={rp}&sport_code={code}"
        );
        if self.info.trends_stat_seq {
            url.push_str("&stat_seq=");
            url.push_str(self.info.stat_seq);
        }
        let html = self.http.get(&url).await?;
        rankings::parse_institution_trends(&html)
    }

    async fn national_ranking(
        &self,
        season: u16,
        division: Division,
        rp: &str,
    ) -> Result<Vec<RankedTeam>> {
        let ay = self.info.academic_year(season);
        let lvl = division.level();
        let code = self.info.code;
        let seq = self.info.stat_seq;
        let url = format!(
            "{BASE_URL}/rankings/national_ranking?\
             academic_year={ay}.0&division={lvl}.0&ranking_period={rp}&sport_code={code}&stat_seq={seq}"
        );
        let html = self.http.get(&url).await?;
        rankings::parse_national_ranking(&html)
    }

    fn ranked_to_team(
        &self,
        ranked: RankedTeam,
        season: u16,
        division: Division,
        index: &HashMap<String, i64>,
    ) -> Team {
        let (school_name, forced_id) = fix_school_name(ranked.school_name);
        let school_id = forced_id.or_else(|| index.get(&school_name).copied());
        if school_id.is_none() {
            info!(school = %school_name, "school is missing from the history registry");
        }
        Team {
            season,
            division,
            sport_code: self.info.code.to_string(),
            team_id: ranked.team_id,
            school_id,
            school_name,
            conference: ranked.conference,
        }
    }

    /// Team lists for every season and division the sport has, concatenated.
    /// Seasons that fail (not yet ranked, never played at a level) are
    /// logged and skipped.
    pub async fn all_teams(&self) -> Result<Vec<Team>> {
        let seasons: Vec<u16> = (self.info.first_season..=self.current_season()).collect();
        info!(
            "loading every {} team list; the first pass fetches one page per \
             season and division",
            self.info.name
        );
        let bar = progress_bar(
            (seasons.len() * self.info.divisions.len()) as u64,
            format!("{} team lists", self.info.name),
        );
        let mut teams = Vec::new();
        for season in seasons {
            for &division in self.info.divisions {
                match self.teams(season, division).await {
                    Ok(mut rows) => teams.append(&mut rows),
                    Err(err) => {
                        warn!(season, %division, "skipping team list: {err}");
                    }
                }
                bar.inc(1);
            }
        }
        bar.finish_and_clear();
        Ok(teams)
    }

    /// Resolves a team id to its season, division, and school by walking
    /// the team lists newest first. Lists come from the cache once warm.
    pub async fn find_team(&self, team_id: i64) -> Result<Team> {
        for season in (self.info.first_season..=self.current_season()).rev() {
            for &division in self.info.divisions {
                let teams = match self.teams(season, division).await {
                    Ok(teams) => teams,
                    Err(err) => {
                        warn!(season, %division, "skipping team list: {err}");
                        continue;
                    }
                };
                if let Some(team) = teams.into_iter().find(|t| t.team_id == team_id) {
                    return Ok(team);
                }
            }
        }
        Err(Error::UnknownTeam(team_id))
    }

    pub async fn team_schedule(&self, team_id: i64) -> Result<Vec<ScheduleGame>> {
        let team = self.find_team(team_id).await?;
        self.team_schedule_for(&team).await
    }

    /// Schedule fetch for an already-resolved team, so bulk callers skip
    /// the id lookup.
    pub async fn team_schedule_for(&self, team: &Team) -> Result<Vec<ScheduleGame>> {
        let rel = self.rel(&format!("team_schedule/{}_team_schedule.csv", team.team_id));
        let today = Local::now().date_naive();
        let max_age = cache::in_season_max_age(team.season, today, 1);
        if let Some(rows) = self.cache.load_if_fresh::<ScheduleGame>(&rel, max_age) {
            return Ok(rows);
        }

        let url = format!("{BASE_URL}/teams/{}", team.team_id);
        let html = self.http.get(&url).await?;
        let page = schedule::parse_team_page(&html)?;
        let games = self.build_schedule(team, &page);
        self.cache.store(&rel, &games)?;
        Ok(games)
    }

    fn build_schedule(&self, team: &Team, page: &TeamPage) -> Vec<ScheduleGame> {
        let mut games = Vec::new();
        for row in &page.rows {
            let Some((game_date, game_num)) = dates::parse_schedule_date(&row.date_text) else {
                continue;
            };

            let opponent_id = row.opponent_id.unwrap_or(-1);
            let opponent_name = text::strip_venue(&row.opponent_name);
            let lowered = row.opponent_text.to_lowercase();
            let is_away = row.opponent_text.starts_with('@');
            let is_neutral = (!is_away && row.opponent_text.contains('@'))
                || lowered.contains("championship")
                || lowered.contains("ncaa");

            let result = parse_result_cell(&row.result_text, self.info);
            let attendance = row
                .attendance_text
                .as_deref()
                .and_then(text::parse_attendance);
            let game_url = row
                .box_score_id
                .map(|id| format!("{BASE_URL}/contests/{id}/box_score"));

            // Both teams list a shared neutral-site game; writing the lower
            // id as the home side makes those rows de-duplicate.
            let scraped_is_home = if is_neutral {
                team.team_id < opponent_id
            } else {
                !is_away
            };

            let (home_team_id, home_team_name, home_score, away_team_id, away_team_name, away_score) =
                if scraped_is_home {
                    (
                        team.team_id,
                        page.school_name.clone(),
                        result.team_score,
                        opponent_id,
                        opponent_name,
                        result.opponent_score,
                    )
                } else {
                    (
                        opponent_id,
                        opponent_name,
                        result.opponent_score,
                        team.team_id,
                        page.school_name.clone(),
                        result.team_score,
                    )
                };

            games.push(ScheduleGame {
                game_id: row.box_score_id,
                season: team.season,
                season_name: page.season_name.clone(),
                division: team.division,
                sport_code: self.info.code.to_string(),
                game_date,
                game_num,
                innings: result.innings,
                ot_periods: result.ot_periods,
                home_team_id,
                home_team_name,
                away_team_id,
                away_team_name,
                home_team_score: home_score,
                away_team_score: away_score,
                is_neutral_game: is_neutral,
                attendance,
                game_url,
            });
        }
        games
    }

    /// Every game in a season and division: each team's schedule fetched
    /// and de-duplicated by game id.
    pub async fn full_schedule(&self, season: u16, division: Division) -> Result<Vec<ScheduleGame>> {
        let division = self.check_division(division)?;
        let rel = self.rel(&format!("full_schedule/{season}_{division}_full_schedule.csv"));
        let today = Local::now().date_naive();
        let max_age = cache::in_season_max_age(season, today, 1);
        if let Some(rows) = self.cache.load_if_fresh::<ScheduleGame>(&rel, max_age) {
            return Ok(rows);
        }

        let teams = self.teams(season, division).await?;
        let bar = progress_bar(
            teams.len() as u64,
            format!("{season} {} division {division} schedules", self.info.name),
        );
        let mut games: Vec<ScheduleGame> = Vec::new();
        let mut seen = HashSet::new();
        for team in &teams {
            match self.team_schedule_for(team).await {
                Ok(rows) => {
                    for game in rows {
                        match game.game_id {
                            Some(id) if !seen.insert(id) => {}
                            _ => games.push(game),
                        }
                    }
                }
                Err(err) => {
                    warn!(team_id = team.team_id, "skipping schedule: {err}");
                }
            }
            bar.inc(1);
        }
        bar.finish_and_clear();
        self.cache.store(&rel, &games)?;
        Ok(games)
    }

    /// Day scoreboard: every game of the sport on one date and division.
    /// Not cached; the page covers live games.
    pub async fn day_schedule(
        &self,
        date: NaiveDate,
        division: Division,
    ) -> Result<Vec<ScoreboardGame>> {
        let division = self.check_division(division)?;
        let url = format!(
            "{BASE_URL}/contests/livestream_scoreboards?utf8=%E2%9C%93&sport_code={code}\
             &academic_year={year}&division={lvl}\
             &game_date={month:02}%2F{day:02}%2F{year}&commit=Submit",
            code = self.info.code,
            year = date.year(),
            lvl = division.level(),
            month = date.month(),
            day = date.day(),
        );
        let html = self.http.get(&url).await?;
        let boxes = scoreboard::parse_scoreboard(&html, self.info.line_score)?;
        Ok(boxes
            .into_iter()
            .map(|game| self.scoreboard_game(game, date, division))
            .collect())
    }

    fn scoreboard_game(
        &self,
        game: ScoreboardBox,
        date: NaiveDate,
        division: Division,
    ) -> ScoreboardGame {
        ScoreboardGame {
            game_id: game.game_id,
            season: date.year() as u16,
            division,
            sport_code: self.info.code.to_string(),
            game_date: date,
            game_datetime: dates::parse_game_datetime(&game.datetime_text),
            game_num: game.game_num,
            away_team_id: game.away.team_id,
            away_team_name: game.away.team_name,
            home_team_id: game.home.team_id,
            home_team_name: game.home.team_name,
            away_score: game.away.score,
            home_score: game.home.score,
            away_hits: game.away.hits,
            away_errors: game.away.errors,
            home_hits: game.home.hits,
            home_errors: game.home.errors,
            attendance: game.attendance,
        }
    }

    pub async fn roster(&self, team_id: i64) -> Result<Vec<RosterMember>> {
        let team = self.find_team(team_id).await?;
        let rel = self.rel(&format!("rosters/{team_id}_roster.csv"));
        let today = Local::now().date_naive();
        let max_age = cache::in_season_max_age(team.season, today, 14);
        if let Some(rows) = self.cache.load_if_fresh::<RosterMember>(&rel, max_age) {
            return Ok(rows);
        }

        let url = format!("{BASE_URL}/teams/{team_id}/roster");
        let html = self.http.get(&url).await?;
        let page = roster::parse_roster_page(&html)?;
        let members = self.build_roster(&team, &page.table);
        self.cache.store(&rel, &members)?;
        Ok(members)
    }

    fn build_roster(&self, team: &Team, table: &HtmlTable) -> Vec<RosterMember> {
        let mut members = Vec::new();
        for view in table.views() {
            let Some(full_name) = view.string(&["Name", "Player"]) else {
                continue;
            };
            let player_id = view
                .row()
                .cells
                .iter()
                .find_map(|c| c.id_in_href("/players/"));
            members.push(RosterMember {
                season: team.season,
                team_id: team.team_id,
                sport_code: self.info.code.to_string(),
                player_id,
                player_url: player_id.map(|id| format!("{BASE_URL}/players/{id}")),
                full_name,
                jersey_number: view.string(&["#", "No.", "No", "Jersey"]),
                class_year: view.string(&["Class", "Yr"]),
                positions: view.string(&["Position", "Pos"]),
                height: view.string(&["Height", "Ht"]),
                weight: view.u16(&["Weight", "Wt"]),
                batting_hand: view.string(&["Bats"]),
                throwing_hand: view.string(&["Throws"]),
                hometown: view.string(&["Hometown"]),
                high_school: view.string(&["High School", "Previous School"]),
                games_played: view.u16(&["GP", "G"]),
                games_started: view.u16(&["GS"]),
            });
        }
        members
    }

    /// Box score page fetch: game metadata plus the per-category stat boxes.
    pub async fn box_score_page(&self, game_id: i64) -> Result<(GameMeta, Vec<StatBox>)> {
        let url = format!("{BASE_URL}/contests/{game_id}/individual_stats");
        let html = self.http.get(&url).await?;
        let (header, boxes) = boxscore::parse_box_score_page(&html)?;
        Ok((game_meta(game_id, &header), boxes))
    }

    /// Play-by-play page fetch: game metadata plus the period cards.
    pub async fn pbp_page(&self, game_id: i64) -> Result<(GameMeta, Vec<PeriodCard>)> {
        let url = format!("{BASE_URL}/contests/{game_id}/play_by_play");
        let html = self.http.get(&url).await?;
        let (header, cards) = pbp::parse_pbp_page(&html)?;
        Ok((game_meta(game_id, &header), cards))
    }

    /// Drive-log page fetch: game metadata plus drives grouped by quarter.
    /// Football lays its play_by_play page out this way instead of as
    /// period cards.
    pub async fn drives_page(&self, game_id: i64) -> Result<(GameMeta, Vec<Vec<Drive>>)> {
        let url = format!("{BASE_URL}/contests/{game_id}/play_by_play");
        let html = self.http.get(&url).await?;
        let (header, quarters) = drives::parse_drives_page(&html)?;
        Ok((game_meta(game_id, &header), quarters))
    }

    /// Season-to-date stats page body for a team, optionally pinned to one
    /// stat category.
    pub async fn season_stats_html(
        &self,
        team_id: i64,
        category: Option<u64>,
    ) -> Result<String> {
        let mut url = format!("{BASE_URL}/teams/{team_id}/season_to_date_stats");
        if let Some(id) = category {
            url.push_str(&format!("?year_stat_category_id={id}"));
        }
        self.http.get(&url).await
    }

    /// Player profile page body, optionally pinned to one stat category.
    pub async fn player_page_html(
        &self,
        player_id: i64,
        category: Option<u64>,
    ) -> Result<String> {
        let mut url = format!("{BASE_URL}/players/{player_id}");
        if let Some(id) = category {
            url.push_str(&format!("?year_stat_category_id={id}"));
        }
        self.http.get(&url).await
    }
}

fn game_meta(game_id: i64, header: &GameHeader) -> GameMeta {
    let game_datetime = dates::parse_game_datetime(&header.datetime_text);
    let season = game_datetime
        .map(|dt| dt.year() as u16)
        .unwrap_or_else(|| Local::now().year() as u16);
    GameMeta {
        game_id,
        season,
        game_datetime,
        stadium_name: header.stadium.clone(),
        attendance: header.attendance,
        away_team_id: header.away_team_id,
        away_team_name: header.away_team_name.clone(),
        home_team_id: header.home_team_id,
        home_team_name: header.home_team_name.clone(),
    }
}

/// Rankings pages disagree with the history registry on a couple of names.
fn fix_school_name(name: String) -> (String, Option<i64>) {
    match name.as_str() {
        // Two institutions named Saint Francis; the (PA) one is org 600.
        "Saint Francis (PA)" => ("Saint Francis".to_string(), Some(600)),
        "Tex. A&M-Commerce" => ("East Texas A&M".to_string(), None),
        _ => (name, None),
    }
}

#[derive(Debug, Default, PartialEq)]
pub(crate) struct ResultCell {
    /// Scraped team's score, regardless of home or away.
    pub team_score: Option<u16>,
    pub opponent_score: Option<u16>,
    pub innings: Option<u8>,
    pub ot_periods: Option<u8>,
}

/// Result cells read `W 5-4`, `L 2-9 (11)`, `W 78-75 (2 OT)`, `Canceled`,
/// or nothing for unplayed games. The first score always belongs to the
/// scraped team.
pub(crate) fn parse_result_cell(raw: &str, info: &SportInfo) -> ResultCell {
    let mut result = ResultCell {
        innings: info.default_innings,
        ot_periods: if info.default_innings.is_none() {
            Some(0)
        } else {
            None
        },
        ..ResultCell::default()
    };

    let cleaned = raw.trim();
    let lowered = cleaned.to_lowercase();
    if cleaned.is_empty() || lowered.contains("canceled") || lowered.contains("ppd") {
        return result;
    }
    let Some((team_part, opponent_part)) = cleaned.split_once('-') else {
        return result;
    };

    let team_part = team_part
        .trim()
        .trim_start_matches(|c| matches!(c, 'W' | 'L' | 'T'))
        .trim();
    let (opponent_part, extra) = split_extra_periods(opponent_part);
    if let Some(extra) = extra {
        if result.innings.is_some() {
            result.innings = Some(extra);
        } else {
            result.ot_periods = Some(extra);
        }
    }
    result.team_score = text::parse_u16(team_part);
    result.opponent_score = text::parse_u16(&opponent_part);
    result
}

/// `9 (11)` marks extra innings, `75 (2 OT)` extra periods.
fn split_extra_periods(raw: &str) -> (String, Option<u8>) {
    if let (Some(open), Some(close)) = (raw.find('('), raw.find(')')) {
        if open < close {
            let middle = raw[open + 1..close].to_uppercase().replace("OT", "");
            if let Ok(n) = middle.trim().parse::<u8>() {
                return (raw[..open].trim().to_string(), Some(n));
            }
        }
    }
    (raw.trim().to_string(), None)
}

fn progress_bar(len: u64, msg: String) -> ProgressBar {
    let bar = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{msg} {pos}/{len} ({percent}%) {eta}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.set_message(msg);
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::schedule::ScheduleRow;
    use crate::sports;

    fn test_engine(info: &'static SportInfo) -> SportEngine {
        let config = ScrapeConfig::default()
            .with_cache_root(std::env::temp_dir().join("ncaa_stats_engine_tests"))
            .with_politeness(std::time::Duration::ZERO);
        SportEngine::new(&config, info).unwrap()
    }

    fn stetson() -> Team {
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

    fn row(
        date: &str,
        opponent_text: &str,
        opponent_id: Option<i64>,
        opponent_name: &str,
        result: &str,
        box_score_id: Option<i64>,
    ) -> ScheduleRow {
        ScheduleRow {
            date_text: date.to_string(),
            opponent_text: opponent_text.to_string(),
            opponent_id,
            opponent_name: opponent_name.to_string(),
            result_text: result.to_string(),
            box_score_id,
            attendance_text: None,
        }
    }

    #[test]
    fn test_result_cell_baseball() {
        let won = parse_result_cell("W 5-4", &sports::BASEBALL);
        assert_eq!(won.team_score, Some(5));
        assert_eq!(won.opponent_score, Some(4));
        assert_eq!(won.innings, Some(9));
        assert_eq!(won.ot_periods, None);

        let extras = parse_result_cell("L 2-9 (11)", &sports::BASEBALL);
        assert_eq!(extras.team_score, Some(2));
        assert_eq!(extras.opponent_score, Some(9));
        assert_eq!(extras.innings, Some(11));

        let unplayed = parse_result_cell("", &sports::BASEBALL);
        assert_eq!(unplayed.team_score, None);
        assert_eq!(unplayed.innings, Some(9));

        let canceled = parse_result_cell("Canceled", &sports::BASEBALL);
        assert_eq!(canceled.team_score, None);
        assert_eq!(canceled.opponent_score, None);
    }

    #[test]
    fn test_result_cell_overtime() {
        let regulation = parse_result_cell("W 78-75", &sports::MENS_BASKETBALL);
        assert_eq!(regulation.ot_periods, Some(0));
        assert_eq!(regulation.innings, None);

        let overtime = parse_result_cell("W 78-75 (2 OT)", &sports::MENS_BASKETBALL);
        assert_eq!(overtime.team_score, Some(78));
        assert_eq!(overtime.opponent_score, Some(75));
        assert_eq!(overtime.ot_periods, Some(2));
    }

    #[test]
    fn test_tie_result() {
        let tie = parse_result_cell("T 3-3", &sports::BASEBALL);
        assert_eq!(tie.team_score, Some(3));
        assert_eq!(tie.opponent_score, Some(3));
    }

    #[test]
    fn test_build_schedule_sides() {
        let engine = test_engine(&sports::BASEBALL);
        let page = TeamPage {
            school_name: "Stetson".to_string(),
            season_name: "2023-24".to_string(),
            rows: vec![
                row(
                    "02/16/2024",
                    "Texas",
                    Some(574077),
                    "Texas",
                    "W 5-4",
                    Some(4972222),
                ),
                row(
                    "02/17/2024 (2)",
                    "@ Texas",
                    Some(574077),
                    "Texas",
                    "L 2-9 (11)",
                    Some(4972223),
                ),
                // Junk date cell, dropped.
                row("Mar", "not a date row", None, "junk", "", None),
            ],
        };

        let games = engine.build_schedule(&stetson(), &page);
        assert_eq!(games.len(), 2);

        let home = &games[0];
        assert_eq!(home.home_team_id, 574223);
        assert_eq!(home.home_team_name, "Stetson");
        assert_eq!(home.away_team_id, 574077);
        assert_eq!(home.home_team_score, Some(5));
        assert_eq!(home.away_team_score, Some(4));
        assert!(!home.is_neutral_game);
        assert_eq!(home.game_num, 1);

        let away = &games[1];
        assert_eq!(away.home_team_id, 574077);
        assert_eq!(away.away_team_id, 574223);
        assert_eq!(away.home_team_score, Some(9));
        assert_eq!(away.away_team_score, Some(2));
        assert_eq!(away.innings, Some(11));
        assert_eq!(away.game_num, 2);
        assert_eq!(
            away.game_url.as_deref(),
            Some("https://stats.ncaa.org/contests/4972223/box_score")
        );
    }

    #[test]
    fn test_build_schedule_neutral_ordering() {
        let engine = test_engine(&sports::BASEBALL);
        let page = TeamPage {
            school_name: "Stetson".to_string(),
            season_name: "2023-24".to_string(),
            rows: vec![
                // Lower opponent id: the opponent becomes the home side.
                row(
                    "05/21/2024",
                    "Texas @ Hoover, AL",
                    Some(400001),
                    "Texas",
                    "W 6-2",
                    Some(5000001),
                ),
                // Higher opponent id: the scraped team stays home.
                row(
                    "05/22/2024",
                    "NCAA Regional vs Duke",
                    Some(600001),
                    "Duke",
                    "L 1-3",
                    Some(5000002),
                ),
            ],
        };

        let games = engine.build_schedule(&stetson(), &page);
        assert_eq!(games.len(), 2);

        assert!(games[0].is_neutral_game);
        assert_eq!(games[0].home_team_id, 400001);
        assert_eq!(games[0].away_team_id, 574223);
        assert_eq!(games[0].home_team_score, Some(2));
        assert_eq!(games[0].away_team_score, Some(6));

        assert!(games[1].is_neutral_game);
        assert_eq!(games[1].home_team_id, 574223);
        assert_eq!(games[1].away_team_id, 600001);
        assert_eq!(games[1].home_team_score, Some(1));
        assert_eq!(games[1].away_team_score, Some(3));
    }

    #[test]
    fn test_fix_school_name() {
        let (name, forced) = fix_school_name("Saint Francis (PA)".to_string());
        assert_eq!(name, "Saint Francis");
        assert_eq!(forced, Some(600));

        let (name, forced) = fix_school_name("Tex. A&M-Commerce".to_string());
        assert_eq!(name, "East Texas A&M");
        assert_eq!(forced, None);

        let (name, forced) = fix_school_name("Stetson".to_string());
        assert_eq!(name, "Stetson");
        assert_eq!(forced, None);
    }

    #[test]
    fn test_check_division() {
        let baseball = test_engine(&sports::BASEBALL);
        assert!(baseball.check_division(Division::I).is_ok());
        assert!(baseball.check_division(Division::Fbs).is_err());

        let football = test_engine(&sports::FOOTBALL);
        assert_eq!(
            football.check_division(Division::I).unwrap(),
            Division::Fbs
        );
        assert!(football.check_division(Division::III).is_ok());
    }
}
