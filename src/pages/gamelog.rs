//! Game-by-game tables on player pages.
//!
//! A player page shows a season-summary table first and the game log
//! under it. Log rows carry date, opponent, and result cells ahead of
//! the stat columns, and only rows tied to a contest are real games.

use chrono::NaiveDate;
use scraper::Html;

use crate::error::{Error, Result};
use crate::pages::selector;
use crate::pages::stat_table::{self, HtmlTable, RowView};
use crate::utils::{dates, text};

/// Identity cells of one played game in a game log.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GamelogEntry {
    pub game_date: NaiveDate,
    /// Doubleheader game number; 1 unless the date cell carried `(2)`.
    pub game_num: u8,
    pub opponent_id: Option<i64>,
    pub opponent_name: String,
    /// Raw result cell, e.g. `W 5-4 (11)`.
    pub result_text: String,
    pub game_id: Option<i64>,
}

/// Extracts the game-by-game table, the second stat table on the page.
pub(crate) fn parse_player_gamelog(html: &str) -> Result<HtmlTable> {
    let doc = Html::parse_document(html);
    let table_sel = selector("table.small_font.dataTable.table-bordered")?;
    let mut tables = doc.select(&table_sel);
    tables
        .next()
        .ok_or_else(|| Error::markup("player page has no stat tables"))?;
    let games = tables
        .next()
        .ok_or_else(|| Error::markup("player page has no game-by-game table"))?;
    stat_table::extract_table(games)
}

/// Pairs each played game with its stat row.
///
/// Rows without a contest id, rows whose date cell is not a date, and
/// unplayed games (blank, postponed, or canceled results) are dropped.
pub(crate) fn gamelog_entries(table: &HtmlTable) -> Vec<(GamelogEntry, RowView<'_>)> {
    let mut out = Vec::new();
    for row in &table.rows {
        if !row.id.as_deref().is_some_and(|id| id.contains("contest")) {
            continue;
        }
        let Some((game_date, game_num)) = row
            .cell(0)
            .and_then(|c| dates::parse_schedule_date(&c.text))
        else {
            continue;
        };
        let Some(opp_cell) = row.cell(1) else {
            continue;
        };
        // The opponent link is either a team page or the defensive-stats
        // toggle, which still embeds the team id.
        let opponent_id = opp_cell.id_in_href("/teams/").or_else(|| {
            opp_cell
                .href
                .as_deref()
                .and_then(|h| text::id_after(h, "toggleDefensiveStats("))
        });
        let mut opponent_name = opp_cell
            .img_alts
            .get(1)
            .cloned()
            .unwrap_or_else(|| opp_cell.text.clone());
        if opponent_name == "Defensive Stats" {
            opponent_name = opp_cell.text.clone();
        }
        let opponent_name = text::strip_venue(&opponent_name);

        let Some(result_cell) = row.cell(2) else {
            continue;
        };
        let result_text = result_cell.text.clone();
        let lowered = result_text.to_lowercase();
        if lowered.is_empty() || lowered.contains("ppd") || lowered.contains("cancel") {
            continue;
        }
        let game_id = result_cell.id_in_href("/contests/");

        out.push((
            GamelogEntry {
                game_date,
                game_num,
                opponent_id,
                opponent_name,
                result_text,
                game_id,
            },
            table.view(row),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    const PLAYER_PAGE: &str = r#"
    <table class="small_font dataTable table-bordered">
      <thead><tr><th>Year</th><th>AB</th></tr></thead>
      <tbody><tr><td>2023-24</td><td>210</td></tr></tbody>
    </table>
    <table class="small_font dataTable table-bordered">
      <thead>
        <tr><th>Date</th><th>Opponent</th><th>Result</th><th>AB</th><th>H</th></tr>
      </thead>
      <tbody>
        <tr id="contest_4972222">
          <td>02/16/2024</td>
          <td>
            <a href="javascript:toggleDefensiveStats(574077);">
              <img alt="toggle"/><img alt="Texas"/>Defensive Stats</a>
          </td>
          <td><a href="/contests/4972222/box_score">W 5-4</a></td>
          <td>4</td><td>2</td>
        </tr>
        <tr id="contest_4972223">
          <td>02/17/2024 (2)</td>
          <td><a href="/teams/574077">@ Texas</a></td>
          <td><a href="/contests/4972223/box_score">L 2-9 (11)</a></td>
          <td>5</td><td>1</td>
        </tr>
        <tr id="contest_4972224">
          <td>02/18/2024</td>
          <td>Texas</td>
          <td>Ppd</td>
          <td></td><td></td>
        </tr>
        <tr id="totals_row">
          <td>Totals</td><td></td><td></td><td>9</td><td>3</td>
        </tr>
      </tbody>
    </table>"#;

    #[test]
    fn test_gamelog_rows() {
        let table = parse_player_gamelog(PLAYER_PAGE).unwrap();
        let entries = gamelog_entries(&table);
        assert_eq!(entries.len(), 2);

        let (first, view) = &entries[0];
        assert_eq!(first.game_date.day(), 16);
        assert_eq!(first.game_num, 1);
        assert_eq!(first.opponent_id, Some(574077));
        assert_eq!(first.opponent_name, "Texas");
        assert_eq!(first.result_text, "W 5-4");
        assert_eq!(first.game_id, Some(4972222));
        assert_eq!(view.u16(&["AB"]), Some(4));
        assert_eq!(view.u16(&["H"]), Some(2));

        let (second, _) = &entries[1];
        assert_eq!(second.game_num, 2);
        assert_eq!(second.opponent_name, "Texas");
        assert_eq!(second.result_text, "L 2-9 (11)");
    }

    #[test]
    fn test_single_table_is_error() {
        let html = r#"<table class="small_font dataTable table-bordered">
          <thead><tr><th>Year</th></tr></thead>
          <tbody><tr><td>2023-24</td></tr></tbody>
        </table>"#;
        assert!(parse_player_gamelog(html).is_err());
    }
}
