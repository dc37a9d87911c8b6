//! Softball: the bat-and-ball page grammar under sport code `WSB`.
//!
//! The pages mirror baseball's exactly, down to the split season
//! categories and inning cards, so this module shares baseball's record
//! types and builders. Games schedule seven innings instead of nine,
//! which the engine reads off the sport constants.

use chrono::NaiveDate;

use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::models::{Division, RosterMember, ScheduleGame, ScoreboardGame, Team};
use crate::sports::engine::SportEngine;

use super::baseball::{self, StatCategory};
pub use super::baseball::{
    BattingBoxLine, BattingGameLine, BattingSeasonLine, FieldingBoxLine, FieldingGameLine,
    FieldingSeasonLine, GameBox, InningPlay, PitchingBoxLine, PitchingGameLine,
    PitchingSeasonLine, TeamBoxLine,
};

/// No hand-tracked category ids for softball; every season resolves
/// through the category dropdown.
const SEASON_STAT_IDS: &[(u16, [u64; 3])] = &[];

/// Scraper for NCAA softball (sport code `WSB`).
pub struct SoftballScraper {
    engine: SportEngine,
}

impl SoftballScraper {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        Ok(Self {
            engine: SportEngine::new(config, &super::SOFTBALL)?,
        })
    }

    /// Teams fielding softball in one season and division.
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
        baseball::season_stat_lines(
            &self.engine,
            SEASON_STAT_IDS,
            team_id,
            StatCategory::Batting,
            baseball::batting_season_lines,
        )
        .await
    }

    /// Season pitching lines for every player on a team.
    pub async fn season_pitching_stats(&self, team_id: i64) -> Result<Vec<PitchingSeasonLine>> {
        baseball::season_stat_lines(
            &self.engine,
            SEASON_STAT_IDS,
            team_id,
            StatCategory::Pitching,
            baseball::pitching_season_lines,
        )
        .await
    }

    /// Season fielding lines for every player on a team.
    pub async fn season_fielding_stats(&self, team_id: i64) -> Result<Vec<FieldingSeasonLine>> {
        baseball::season_stat_lines(
            &self.engine,
            SEASON_STAT_IDS,
            team_id,
            StatCategory::Fielding,
            baseball::fielding_season_lines,
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
        baseball::player_game_lines(
            engine,
            SEASON_STAT_IDS,
            player_id,
            season,
            StatCategory::Batting,
            |t| baseball::batting_game_lines(player_id, season, engine, t),
        )
        .await
    }

    /// Game-by-game pitching lines from a player's page.
    pub async fn player_game_pitching_stats(
        &self,
        player_id: i64,
        season: u16,
    ) -> Result<Vec<PitchingGameLine>> {
        let engine = &self.engine;
        baseball::player_game_lines(
            engine,
            SEASON_STAT_IDS,
            player_id,
            season,
            StatCategory::Pitching,
            |t| baseball::pitching_game_lines(player_id, season, engine, t),
        )
        .await
    }

    /// Game-by-game fielding lines from a player's page.
    pub async fn player_game_fielding_stats(
        &self,
        player_id: i64,
        season: u16,
    ) -> Result<Vec<FieldingGameLine>> {
        let engine = &self.engine;
        baseball::player_game_lines(
            engine,
            SEASON_STAT_IDS,
            player_id,
            season,
            StatCategory::Fielding,
            |t| baseball::fielding_game_lines(player_id, season, engine, t),
        )
        .await
    }

    /// Every player's box score lines for one game.
    pub async fn game_player_stats(&self, game_id: i64) -> Result<GameBox> {
        baseball::game_box(&self.engine, game_id).await
    }

    /// Both teams' summed box score totals for one game.
    pub async fn game_team_stats(&self, game_id: i64) -> Result<Vec<TeamBoxLine>> {
        let box_stats = baseball::game_box(&self.engine, game_id).await?;
        Ok(baseball::team_box_lines(&box_stats))
    }

    /// The raw play-by-play log for one game.
    pub async fn raw_pbp(&self, game_id: i64) -> Result<Vec<InningPlay>> {
        baseball::inning_pbp(&self.engine, game_id).await
    }
}
