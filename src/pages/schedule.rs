//! Parser for team pages (`/teams/{team_id}`), which carry the school
//! header, the season picker, and the schedule card.

use scraper::Html;

use crate::error::{Error, Result};
use crate::pages::selector;
use crate::utils::text;

/// Raw pieces of one schedule row, before any game semantics are applied.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScheduleRow {
    /// Date cell text, e.g. `03/15/2024` or `04/20/2024 (2)`.
    pub date_text: String,
    /// Full opponent cell text. `@` markers and championship labels live here.
    pub opponent_text: String,
    /// Opponent team id from the cell's link, when the opponent has a page.
    pub opponent_id: Option<i64>,
    /// Opponent display name, from the logo's alt text when present.
    pub opponent_name: String,
    /// Result cell text, e.g. `W 5-4`, `L 2-9 (11)`, `Canceled`.
    pub result_text: String,
    /// Game id from the result cell's box-score link.
    pub box_score_id: Option<i64>,
    /// Attendance cell text, when the table has that column.
    pub attendance_text: Option<String>,
}

/// A team page reduced to the parts the schedule builder needs.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TeamPage {
    pub school_name: String,
    pub season_name: String,
    pub rows: Vec<ScheduleRow>,
}

pub(crate) fn parse_team_page(html: &str) -> Result<TeamPage> {
    let doc = Html::parse_document(html);
    Ok(TeamPage {
        school_name: parse_school_name(&doc)?,
        season_name: parse_season_name(&doc)?,
        rows: parse_schedule_rows(&doc)?,
    })
}

/// School name from the card logo, falling back to the card link with its
/// trailing "History" word dropped.
pub(crate) fn parse_school_name(doc: &Html) -> Result<String> {
    let img_sel = selector("div.card img[alt]")?;
    if let Some(alt) = doc
        .select(&img_sel)
        .next()
        .and_then(|img| img.value().attr("alt"))
    {
        let name = text::clean_text(alt);
        if !name.is_empty() {
            return Ok(name);
        }
    }

    let a_sel = selector("div.card a")?;
    let link_text = doc
        .select(&a_sel)
        .next()
        .map(|a| text::clean_text(&a.text().collect::<String>()))
        .ok_or_else(|| Error::markup("team page has no school card"))?;
    match link_text.rsplit_once(' ') {
        Some((name, _)) => Ok(name.to_string()),
        None => Ok(link_text),
    }
}

/// Selected season label from the year picker, e.g. `2023-24`.
pub(crate) fn parse_season_name(doc: &Html) -> Result<String> {
    let selected = selector("select#year_list option[selected]")?;
    let option_sel = selector("select#year_list option")?;
    let option = doc
        .select(&selected)
        .next()
        .or_else(|| doc.select(&option_sel).next())
        .ok_or_else(|| Error::markup("team page has no season picker"))?;
    Ok(text::clean_text(&option.text().collect::<String>()))
}

/// Rows of the card whose header mentions "schedule".
fn parse_schedule_rows(doc: &Html) -> Result<Vec<ScheduleRow>> {
    let card_sel = selector("div.col.p-0")?;
    let header_sel = selector("div.card-header")?;
    let heading_sel = selector("tr.heading td")?;
    let table_sel = selector("table")?;
    let underline_sel = selector("tr.underline_rows")?;
    let tr_sel = selector("tr")?;
    let td_sel = selector("td")?;
    let team_link_sel = selector(r#"a[href*="/teams/"]"#)?;
    let contest_link_sel = selector(r#"a[href*="/contests/"]"#)?;
    let img_sel = selector("img[alt]")?;

    let mut table = None;
    for card in doc.select(&card_sel) {
        let header = card
            .select(&header_sel)
            .next()
            .map(|h| h.text().collect::<String>())
            .or_else(|| {
                card.select(&heading_sel)
                    .next()
                    .map(|h| h.text().collect::<String>())
            });
        let Some(header) = header else {
            continue;
        };
        if header.to_lowercase().contains("schedule") {
            if let Some(t) = card.select(&table_sel).next() {
                table = Some(t);
            }
        }
    }
    let table = table.ok_or_else(|| Error::markup("team page has no schedule card"))?;

    let mut trs: Vec<_> = table.select(&underline_sel).collect();
    if trs.is_empty() {
        trs = table.select(&tr_sel).collect();
    }

    let mut rows = Vec::new();
    for tr in trs {
        let cells: Vec<_> = tr.select(&td_sel).collect();
        // Header rows resurface as all-th rows when the underline class
        // is missing.
        if cells.len() <= 1 {
            continue;
        }

        let date_text = text::clean_text(&cells[0].text().collect::<String>());
        if date_text.is_empty() {
            continue;
        }

        let opponent_cell = cells[1];
        let opponent_text = text::clean_text(&opponent_cell.text().collect::<String>());
        let opponent_id = opponent_cell
            .select(&team_link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| text::id_after(href, "/teams/"));
        let opponent_name = opponent_cell
            .select(&img_sel)
            .next()
            .and_then(|img| img.value().attr("alt"))
            .map(text::clean_text)
            .filter(|alt| !alt.is_empty())
            .unwrap_or_else(|| opponent_text.clone());

        let result_cell = cells.get(2);
        let result_text = result_cell
            .map(|c| text::clean_text(&c.text().collect::<String>()))
            .unwrap_or_default();
        let box_score_id = result_cell
            .and_then(|c| c.select(&contest_link_sel).next())
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| text::id_after(href, "/contests/"));

        let attendance_text = cells
            .get(3)
            .map(|c| text::clean_text(&c.text().collect::<String>()))
            .filter(|t| !t.is_empty());

        rows.push(ScheduleRow {
            date_text,
            opponent_text,
            opponent_id,
            opponent_name,
            result_text,
            box_score_id,
            attendance_text,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEAM_PAGE: &str = r#"
    <div class="card">
      <img alt="Stetson" src="/logo.png"/>
    </div>
    <select id="year_list">
      <option value="16221">2022-23</option>
      <option value="16500" selected="selected">2023-24</option>
    </select>
    <div class="col p-0">
      <div class="card-header">Roster</div>
      <table><tr><td>ignored</td><td>ignored</td></tr></table>
    </div>
    <div class="col p-0">
      <div class="card-header">Schedule (Division I)</div>
      <table>
        <tr class="heading"><td>Schedule</td></tr>
        <tr class="underline_rows">
          <td>02/16/2024</td>
          <td><a href="/teams/574223"><img alt="Texas"/>Texas</a></td>
          <td><a href="/contests/4972222/box_score">W 5-4</a></td>
          <td>1,234</td>
        </tr>
        <tr class="underline_rows">
          <td>02/17/2024 (2)</td>
          <td>@ <a href="/teams/574223"><img alt="Texas"/>Texas</a></td>
          <td><a href="/contests/4972223/box_score">L 2-9 (11)</a></td>
          <td></td>
        </tr>
        <tr class="underline_rows">
          <td>03/01/2024</td>
          <td>Hidden Valley</td>
          <td>Canceled</td>
        </tr>
      </table>
    </div>"#;

    #[test]
    fn test_parse_team_page_header() {
        let page = parse_team_page(TEAM_PAGE).unwrap();
        assert_eq!(page.school_name, "Stetson");
        assert_eq!(page.season_name, "2023-24");
        assert_eq!(page.rows.len(), 3);
    }

    #[test]
    fn test_schedule_row_fields() {
        let page = parse_team_page(TEAM_PAGE).unwrap();

        let first = &page.rows[0];
        assert_eq!(first.date_text, "02/16/2024");
        assert_eq!(first.opponent_id, Some(574223));
        assert_eq!(first.opponent_name, "Texas");
        assert_eq!(first.result_text, "W 5-4");
        assert_eq!(first.box_score_id, Some(4972222));
        assert_eq!(first.attendance_text.as_deref(), Some("1,234"));

        let away = &page.rows[1];
        assert!(away.opponent_text.starts_with('@'));
        assert_eq!(away.date_text, "02/17/2024 (2)");
        assert_eq!(away.box_score_id, Some(4972223));
        assert_eq!(away.attendance_text, None);

        let canceled = &page.rows[2];
        assert_eq!(canceled.opponent_id, None);
        assert_eq!(canceled.opponent_name, "Hidden Valley");
        assert_eq!(canceled.box_score_id, None);
    }

    #[test]
    fn test_school_name_link_fallback() {
        let html = r#"
        <div class="card"><a href="/teams/history">Stetson History</a></div>
        <select id="year_list"><option selected="selected">2023-24</option></select>
        <div class="col p-0">
          <div class="card-header">Schedule</div>
          <table><tr class="underline_rows"><td>02/16/2024</td><td>Foo</td><td></td></tr></table>
        </div>"#;
        let page = parse_team_page(html).unwrap();
        assert_eq!(page.school_name, "Stetson");
    }

    #[test]
    fn test_missing_schedule_card_is_error() {
        let html = r#"
        <div class="card"><img alt="Stetson"/></div>
        <select id="year_list"><option selected="selected">2023-24</option></select>"#;
        assert!(parse_team_page(html).is_err());
    }
}
