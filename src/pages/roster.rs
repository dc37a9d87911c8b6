//! Parser for roster pages (`/teams/{team_id}/roster`).

use scraper::Html;

use crate::error::{Error, Result};
use crate::pages::schedule::{parse_school_name, parse_season_name};
use crate::pages::stat_table::{extract_table, HtmlTable};
use crate::pages::selector;

/// A roster page: the school header plus the player table. Column sets
/// differ per sport, so rows are left keyed by header name.
#[derive(Debug, Clone)]
pub(crate) struct RosterPage {
    pub school_name: String,
    pub season_name: String,
    pub table: HtmlTable,
}

pub(crate) fn parse_roster_page(html: &str) -> Result<RosterPage> {
    let doc = Html::parse_document(html);

    // Matches both the plain and the `no_padding` variant of the table.
    let table_sel = selector("table.dataTable.small_font")?;
    let table = doc
        .select(&table_sel)
        .next()
        .ok_or_else(|| Error::markup("roster page has no player table"))?;

    Ok(RosterPage {
        school_name: parse_school_name(&doc)?,
        season_name: parse_season_name(&doc)?,
        table: extract_table(table)?,
    })
}
