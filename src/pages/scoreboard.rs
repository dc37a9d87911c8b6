//! Parser for day scoreboard pages (`contests/livestream_scoreboards`).
//!
//! Each game sits in its own `div.table-responsive` box: a header row with
//! the start time and an attendance-or-game-state blurb, then one row per
//! team sharing the id `contest_{game_id}`.

use scraper::Html;

use crate::error::Result;
use crate::pages::selector;
use crate::utils::{dates, text};

/// One team's line in a scoreboard box.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScoreboardSide {
    pub team_id: Option<i64>,
    pub team_name: String,
    pub score: u16,
    /// Trailing line-score cells; boards for bat-and-ball sports only.
    pub hits: Option<u16>,
    pub errors: Option<u16>,
}

/// One game box from the scoreboard.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScoreboardBox {
    pub game_id: i64,
    /// Start time text with the doubleheader marker removed.
    pub datetime_text: String,
    pub game_num: u8,
    pub attendance: Option<u32>,
    pub away: ScoreboardSide,
    pub home: ScoreboardSide,
}

/// Parses every game box on the page.
///
/// `line_score` selects how many trailing cells each team row carries:
/// baseball and softball boards show runs/hits/errors, everything else
/// shows a single score.
pub(crate) fn parse_scoreboard(html: &str, line_score: bool) -> Result<Vec<ScoreboardBox>> {
    let doc = Html::parse_document(html);
    let box_sel = selector("div.table-responsive")?;
    let tr_sel = selector("table tr")?;
    let td_sel = selector("td")?;
    let datetime_sel = selector("div.col-6.p-0")?;
    let attend_sel = selector("div.col.p-0.text-right")?;
    let link_sel = selector(r#"a[href*="contests"]"#)?;
    let img_sel = selector("img[alt]")?;
    let team_link_sel = selector(r#"a[href*="/teams/"]"#)?;

    let mut games = Vec::new();

    for game_box in doc.select(&box_sel) {
        let rows: Vec<_> = game_box.select(&tr_sel).collect();
        let Some(header_row) = rows.first() else {
            continue;
        };

        let datetime_text = header_row
            .select(&datetime_sel)
            .next()
            .map(|d| normalize_datetime_text(&d.text().collect::<String>()))
            .unwrap_or_default();
        let (datetime_text, game_num) = dates::split_parenthetical(&datetime_text);
        let game_num = game_num.unwrap_or(1);
        let attendance = header_row
            .select(&attend_sel)
            .next()
            .and_then(|d| parse_attendance_blurb(&d.text().collect::<String>()));

        // The box-score link is the usual source for the game id; boxes
        // without one still tag their team rows with `contest_{id}`.
        let mut game_id = game_box
            .select(&link_sel)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| text::id_after(href, "/contests/"))
            .last();
        if game_id.is_none() {
            game_id = rows
                .iter()
                .filter_map(|tr| tr.value().attr("id"))
                .filter_map(|id| id.strip_prefix("contest_"))
                .filter_map(|id| id.parse::<i64>().ok())
                .last();
        }
        let Some(game_id) = game_id else {
            continue;
        };

        let contest_id = format!("contest_{game_id}");
        let team_rows: Vec<_> = rows
            .iter()
            .filter(|tr| tr.value().attr("id") == Some(contest_id.as_str()))
            .collect();
        if team_rows.len() < 2 {
            continue;
        }

        let away_cells: Vec<_> = team_rows[0].select(&td_sel).collect();
        let home_cells: Vec<_> = team_rows[1].select(&td_sel).collect();
        if is_called_off(&away_cells) || is_called_off(&home_cells) {
            continue;
        }

        let away = read_side(&away_cells, line_score, &img_sel, &team_link_sel);
        let home = read_side(&home_cells, line_score, &img_sel, &team_link_sel);
        let (Some(away), Some(home)) = (away, home) else {
            continue;
        };

        games.push(ScoreboardBox {
            game_id,
            datetime_text,
            game_num,
            attendance,
            away,
            home,
        });
    }

    Ok(games)
}

fn normalize_datetime_text(raw: &str) -> String {
    text::clean_text(raw)
}

/// The right-hand header slot shows `Attend: n` once the game is over, but
/// an inning/quarter ordinal or `FINAL` while it is running.
fn parse_attendance_blurb(raw: &str) -> Option<u32> {
    let cleaned = text::clean_text(raw).replace("Attend:", "");
    let cleaned = cleaned.trim();
    let lowered = cleaned.to_lowercase();
    if ["st", "nd", "rd", "th", "final"]
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        return None;
    }
    text::parse_attendance(cleaned)
}

fn is_called_off(cells: &[scraper::ElementRef<'_>]) -> bool {
    let mut texts = Vec::new();
    if let Some(cell) = cells.get(5) {
        texts.push(cell.text().collect::<String>().to_lowercase());
    }
    if let Some(cell) = cells.last() {
        texts.push(cell.text().collect::<String>().to_lowercase());
    }
    texts
        .iter()
        .any(|t| t.contains("canceled") || t.contains("ppd"))
}

fn read_side(
    cells: &[scraper::ElementRef<'_>],
    line_score: bool,
    img_sel: &scraper::Selector,
    team_link_sel: &scraper::Selector,
) -> Option<ScoreboardSide> {
    let needed = if line_score { 4 } else { 2 };
    if cells.len() < needed {
        return None;
    }

    let team_name = cells[0]
        .select(img_sel)
        .next()
        .and_then(|img| img.value().attr("alt"))
        .map(text::clean_text)
        .filter(|name| !name.is_empty())
        .or_else(|| {
            cells
                .get(1)
                .map(|c| text::clean_text(&c.text().collect::<String>()))
        })?;

    let team_id = cells
        .get(1)
        .and_then(|c| c.select(team_link_sel).next())
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| text::id_after(href, "/teams/"));

    let cell_number = |idx_from_end: usize| -> u16 {
        cells
            .get(cells.len() - idx_from_end)
            .map(|c| text::clean_text(&c.text().collect::<String>()))
            .and_then(|t| text::parse_u16(&t))
            .unwrap_or(0)
    };

    if line_score {
        Some(ScoreboardSide {
            team_id,
            team_name,
            score: cell_number(3),
            hits: Some(cell_number(2)),
            errors: Some(cell_number(1)),
        })
    } else {
        Some(ScoreboardSide {
            team_id,
            team_name,
            score: cell_number(1),
            hits: None,
            errors: None,
        })
    }
}
