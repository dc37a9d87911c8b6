//! One scraper per sport, all built on the shared [`engine`].
//!
//! Sports differ in query-string constants, calendars, and stat-table
//! shapes. Everything they share (team lists, schedules, scoreboards,
//! rosters, contest pages, the cache tree) lives in the engine; each
//! sport module holds its constants plus its typed stat records.

pub mod baseball;
pub mod basketball;
mod engine;
pub mod field_hockey;
pub mod football;
pub mod hockey;
pub mod lacrosse;
pub mod soccer;
pub mod softball;
pub mod volleyball;

use chrono::Datelike;

use crate::models::{Division, GameMeta};

const DIVISIONS: &[Division] = &[Division::I, Division::II, Division::III];
const FOOTBALL_DIVISIONS: &[Division] = &[
    Division::Fbs,
    Division::Fcs,
    Division::II,
    Division::III,
];

/// Query-string constants and calendar facts for one sport (and gender,
/// where the site codes the genders separately).
#[derive(Debug)]
pub(crate) struct SportInfo {
    /// Human name for logs and errors.
    pub name: &'static str,
    /// Sport code the site's query strings use, e.g. `MBA`.
    pub code: &'static str,
    /// Directory under the cache root holding this sport's files.
    pub cache_dir: &'static str,
    /// `stat_seq` value for the rankings pages.
    pub stat_seq: &'static str,
    /// Whether `institution_trends` takes `stat_seq`; volleyball's does not.
    pub trends_stat_seq: bool,
    /// Added to a season to form the site's academic year. Fall sports
    /// wrap into the next calendar year.
    pub academic_year_offset: u16,
    /// Earliest season with usable team lists.
    pub first_season: u16,
    /// Seasons before this one only exist in the `national_ranking` layout.
    pub legacy_season: Option<u16>,
    /// Divisions the sport is played in.
    pub divisions: &'static [Division],
    /// Whether day scoreboards carry runs/hits/errors line scores.
    pub line_score: bool,
    /// Scheduled game length, for the sports that count innings.
    pub default_innings: Option<u8>,
}

impl SportInfo {
    pub fn academic_year(&self, season: u16) -> u16 {
        season + self.academic_year_offset
    }

    pub fn uses_legacy_listing(&self, season: u16) -> bool {
        self.legacy_season.map(|cut| season < cut).unwrap_or(false)
    }
}

/// Season a contest belongs to. Normally the calendar year of the game
/// date, except the COVID-delayed 2020 championships played into spring
/// 2021, which still count as 2020.
fn contest_season(meta: &GameMeta) -> u16 {
    match meta.game_datetime {
        Some(dt) if dt.year() == 2021 && dt.month() < 8 => 2020,
        _ => meta.season,
    }
}

pub(crate) static BASEBALL: SportInfo = SportInfo {
    name: "baseball",
    code: "MBA",
    cache_dir: "baseball",
    stat_seq: "484.0",
    trends_stat_seq: true,
    academic_year_offset: 0,
    first_season: 2008,
    legacy_season: Some(2013),
    divisions: DIVISIONS,
    line_score: true,
    default_innings: Some(9),
};

pub(crate) static SOFTBALL: SportInfo = SportInfo {
    name: "softball",
    code: "WSB",
    cache_dir: "softball",
    stat_seq: "515",
    trends_stat_seq: true,
    academic_year_offset: 0,
    first_season: 2012,
    legacy_season: Some(2013),
    divisions: DIVISIONS,
    line_score: true,
    default_innings: Some(7),
};

pub(crate) static MENS_BASKETBALL: SportInfo = SportInfo {
    name: "men's basketball",
    code: "MBB",
    cache_dir: "basketball_MBB",
    stat_seq: "168",
    trends_stat_seq: true,
    academic_year_offset: 0,
    first_season: 2011,
    legacy_season: Some(2015),
    divisions: DIVISIONS,
    line_score: false,
    default_innings: None,
};

pub(crate) static WOMENS_BASKETBALL: SportInfo = SportInfo {
    name: "women's basketball",
    code: "WBB",
    cache_dir: "basketball_WBB",
    stat_seq: "169",
    trends_stat_seq: true,
    academic_year_offset: 0,
    first_season: 2011,
    legacy_season: Some(2013),
    divisions: DIVISIONS,
    line_score: false,
    default_innings: None,
};

pub(crate) static FIELD_HOCKEY: SportInfo = SportInfo {
    name: "field hockey",
    code: "WFH",
    cache_dir: "field_hockey",
    stat_seq: "450",
    trends_stat_seq: true,
    academic_year_offset: 1,
    first_season: 2009,
    legacy_season: Some(2013),
    divisions: DIVISIONS,
    line_score: false,
    default_innings: None,
};

pub(crate) static FOOTBALL: SportInfo = SportInfo {
    name: "football",
    code: "MFB",
    cache_dir: "football",
    stat_seq: "23",
    trends_stat_seq: true,
    academic_year_offset: 1,
    first_season: 2013,
    legacy_season: Some(2013),
    divisions: FOOTBALL_DIVISIONS,
    line_score: false,
    default_innings: None,
};

pub(crate) static MENS_HOCKEY: SportInfo = SportInfo {
    name: "men's ice hockey",
    code: "MIH",
    cache_dir: "hockey_MIH",
    stat_seq: "179",
    trends_stat_seq: true,
    academic_year_offset: 0,
    first_season: 2016,
    legacy_season: None,
    divisions: DIVISIONS,
    line_score: false,
    default_innings: None,
};

pub(crate) static WOMENS_HOCKEY: SportInfo = SportInfo {
    name: "women's ice hockey",
    code: "WIH",
    cache_dir: "hockey_WIH",
    stat_seq: "475",
    trends_stat_seq: true,
    academic_year_offset: 0,
    first_season: 2016,
    legacy_season: None,
    divisions: DIVISIONS,
    line_score: false,
    default_innings: None,
};

pub(crate) static MENS_LACROSSE: SportInfo = SportInfo {
    name: "men's lacrosse",
    code: "MLA",
    cache_dir: "lacrosse_MLA",
    stat_seq: "537",
    trends_stat_seq: true,
    academic_year_offset: 0,
    first_season: 2010,
    legacy_season: Some(2013),
    divisions: DIVISIONS,
    line_score: false,
    default_innings: None,
};

pub(crate) static WOMENS_LACROSSE: SportInfo = SportInfo {
    name: "women's lacrosse",
    code: "WLA",
    cache_dir: "lacrosse_WLA",
    stat_seq: "246",
    trends_stat_seq: true,
    academic_year_offset: 0,
    first_season: 2010,
    legacy_season: Some(2013),
    divisions: DIVISIONS,
    line_score: false,
    default_innings: None,
};

pub(crate) static MENS_SOCCER: SportInfo = SportInfo {
    name: "men's soccer",
    code: "MSO",
    cache_dir: "soccer_MSO",
    stat_seq: "30",
    trends_stat_seq: true,
    academic_year_offset: 1,
    first_season: 2010,
    legacy_season: Some(2013),
    divisions: DIVISIONS,
    line_score: false,
    default_innings: None,
};

pub(crate) static WOMENS_SOCCER: SportInfo = SportInfo {
    name: "women's soccer",
    code: "WSO",
    cache_dir: "soccer_WSO",
    stat_seq: "34",
    trends_stat_seq: true,
    academic_year_offset: 1,
    first_season: 2010,
    legacy_season: Some(2013),
    divisions: DIVISIONS,
    line_score: false,
    default_innings: None,
};

pub(crate) static MENS_VOLLEYBALL: SportInfo = SportInfo {
    name: "men's volleyball",
    code: "MVB",
    cache_dir: "volleyball_MVB",
    stat_seq: "528.0",
    trends_stat_seq: false,
    academic_year_offset: 0,
    first_season: 2011,
    legacy_season: Some(2017),
    divisions: DIVISIONS,
    line_score: false,
    default_innings: None,
};

pub(crate) static WOMENS_VOLLEYBALL: SportInfo = SportInfo {
    name: "women's volleyball",
    code: "WVB",
    cache_dir: "volleyball_WVB",
    stat_seq: "48.0",
    trends_stat_seq: false,
    academic_year_offset: 1,
    first_season: 2011,
    legacy_season: Some(2017),
    divisions: DIVISIONS,
    line_score: false,
    default_innings: None,
};
