//! Parsers for the page layouts served by stats.ncaa.org.
//!
//! Every function here takes fetched HTML text and returns plain data, so
//! the page grammar stays testable without touching the network.

pub(crate) mod boxscore;
pub(crate) mod drives;
pub(crate) mod gamelog;
pub(crate) mod pbp;
pub(crate) mod rankings;
pub(crate) mod roster;
pub(crate) mod schedule;
pub(crate) mod scoreboard;
pub(crate) mod stat_table;

use scraper::Selector;

use crate::error::{Error, Result};

/// Compiles a CSS selector, turning the unprintable parse error into ours.
pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|_| Error::Selector(css.to_string()))
}
