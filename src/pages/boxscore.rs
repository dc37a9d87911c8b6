//! Parsers for contest pages: the shared game header block and the
//! per-category stat boxes of `individual_stats` pages.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

use crate::error::{Error, Result};
use crate::pages::stat_table::{extract_table, HtmlTable};
use crate::pages::selector;
use crate::utils::text;

static ATTENDANCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9,]+)").unwrap());

/// The header block every contest page repeats: tipoff time, venue,
/// attendance, and the two team cards.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GameHeader {
    pub datetime_text: String,
    pub stadium: Option<String>,
    pub attendance: Option<u32>,
    pub away_team_id: i64,
    pub away_team_name: String,
    pub home_team_id: i64,
    pub home_team_name: String,
}

/// One stat table on an `individual_stats` page, with the category and
/// team id read off its card header.
#[derive(Debug, Clone)]
pub(crate) struct StatBox {
    /// Card header text; the category word (batting, pitching, ...) is in here.
    pub heading: String,
    /// Team the box belongs to, `-1` when the header link is unreadable.
    pub team_id: i64,
    pub table: HtmlTable,
}

pub(crate) fn parse_box_score_page(html: &str) -> Result<(GameHeader, Vec<StatBox>)> {
    let doc = Html::parse_document(html);
    let header = parse_game_header(&doc)?;
    let boxes = parse_stat_boxes(&doc)?;
    Ok((header, boxes))
}

/// Reads the info table and team cards shared by box score and
/// play-by-play pages.
pub(crate) fn parse_game_header(doc: &Html) -> Result<GameHeader> {
    let info_sel = selector(
        r#"td.d-none.d-md-table-cell[style="padding: 0px 30px 0px 30px"]
           table[style="border-collapse: collapse"] tr"#,
    )?;
    let td_sel = selector("td")?;

    let rows: Vec<String> = doc
        .select(&info_sel)
        .map(|tr| {
            tr.select(&td_sel)
                .next()
                .map(|td| text::clean_text(&td.text().collect::<String>()))
                .unwrap_or_default()
        })
        .collect();
    if rows.len() < 6 {
        return Err(Error::markup("contest page is missing its info table"));
    }

    let datetime_text = rows[3].clone();
    let stadium = Some(rows[4].clone()).filter(|s| !s.is_empty());
    let attendance = ATTENDANCE_RE
        .find(&rows[5])
        .and_then(|m| m.as_str().replace(',', "").parse::<u32>().ok());

    let card_sel = selector(r#"td.grey_text.d-none.d-sm-table-cell[valign="center"]"#)?;
    let a_sel = selector("a[href]")?;
    let mut sides = Vec::new();
    for card in doc.select(&card_sel) {
        let Some(a) = card.select(&a_sel).next() else {
            continue;
        };
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let Some(team_id) = text::id_after(href, "/teams/") else {
            continue;
        };
        let name = text::clean_text(&a.text().collect::<String>());
        sides.push((team_id, name));
    }
    if sides.len() < 2 {
        return Err(Error::markup("contest page is missing its team cards"));
    }

    Ok(GameHeader {
        datetime_text,
        stadium,
        attendance,
        away_team_id: sides[0].0,
        away_team_name: sides[0].1.clone(),
        home_team_id: sides[1].0,
        home_team_name: sides[1].1.clone(),
    })
}

/// Reads every per-category stat box on an `individual_stats` page.
pub(crate) fn parse_stat_boxes(doc: &Html) -> Result<Vec<StatBox>> {
    let box_sel = selector("div.card.p-0.table-responsive")?;
    let header_sel = selector("div.card-header div.row")?;
    let header_fallback_sel = selector("div.card-header")?;
    let a_sel = selector("a[href]")?;
    let table_sel = selector("table.display.dataTable.small_font")?;

    let mut boxes = Vec::new();
    for card in doc.select(&box_sel) {
        let header = card
            .select(&header_sel)
            .next()
            .or_else(|| card.select(&header_fallback_sel).next());
        let Some(header) = header else {
            continue;
        };
        let heading = text::clean_text(&header.text().collect::<String>());
        let team_id = header
            .select(&a_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(box_team_id)
            .unwrap_or(-1);

        let Some(table) = card.select(&table_sel).next() else {
            continue;
        };
        boxes.push(StatBox {
            heading,
            team_id,
            table: extract_table(table)?,
        });
    }

    if boxes.is_empty() {
        return Err(Error::markup("individual_stats page has no stat tables"));
    }
    Ok(boxes)
}

/// Stat box headers link the team either as `/teams/{id}` or through a
/// `javascript:togglePeriodStats(competitor_{id}_year...)` handler.
fn box_team_id(href: &str) -> Option<i64> {
    if let Some(id) = text::id_after(href, "/teams/") {
        return Some(id);
    }
    let tail = href.strip_prefix("javascript:togglePeriodStats(competitor_")?;
    let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
