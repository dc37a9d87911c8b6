//! Generic extraction for the site's stat tables.
//!
//! Most data pages center on a `<table>` whose header row names the stat
//! columns and whose body rows carry one player or team each. Column sets
//! drift from season to season, so rows are read back by header name
//! (with alternates) instead of by position.

use scraper::{ElementRef, Html};

use crate::error::{Error, Result};
use crate::pages::selector;
use crate::utils::text;

/// One `<td>`, with the attributes the site hides data in.
#[derive(Debug, Clone, Default)]
pub(crate) struct Cell {
    /// Cleaned text content.
    pub text: String,
    /// Uncleaned text content. Non-breaking spaces are meaningful in a few
    /// places, so the raw form is kept around.
    pub raw_text: String,
    /// `data-order` attribute, used for sortable name columns.
    pub data_order: Option<String>,
    /// First `<a href>` inside the cell.
    pub href: Option<String>,
    /// Alt text of every `<img>` in the cell. Opponent cells put the
    /// opposing team's logo second, after a toggle icon.
    pub img_alts: Vec<String>,
}

impl Cell {
    /// Numeric id at the end of the cell's link, e.g. `/teams/574077`.
    pub fn id_in_href(&self, marker: &str) -> Option<i64> {
        self.href.as_deref().and_then(|h| text::id_after(h, marker))
    }
}

/// One `<tr>` from a table body.
#[derive(Debug, Clone, Default)]
pub(crate) struct TableRow {
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub cells: Vec<Cell>,
}

impl TableRow {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn cell(&self, idx: usize) -> Option<&Cell> {
        self.cells.get(idx)
    }
}

/// A parsed stat table: cleaned header names plus body rows.
#[derive(Debug, Clone, Default)]
pub(crate) struct HtmlTable {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl HtmlTable {
    /// Index of the column named `name`, ignoring case.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }

    pub fn view<'a>(&'a self, row: &'a TableRow) -> RowView<'a> {
        RowView { table: self, row }
    }

    pub fn views(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(|row| RowView { table: self, row })
    }
}

/// A body row paired with its table's headers, for lookups by column name.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RowView<'a> {
    table: &'a HtmlTable,
    row: &'a TableRow,
}

impl<'a> RowView<'a> {
    pub fn row(&self) -> &'a TableRow {
        self.row
    }

    /// Cell under the first of `names` that exists as a column.
    pub fn cell(&self, names: &[&str]) -> Option<&'a Cell> {
        names
            .iter()
            .find_map(|n| self.table.column(n))
            .and_then(|idx| self.row.cells.get(idx))
    }

    /// Cleaned, non-empty text under the first matching column.
    pub fn text(&self, names: &[&str]) -> Option<&'a str> {
        self.cell(names)
            .map(|c| c.text.as_str())
            .filter(|t| !t.is_empty())
    }

    pub fn string(&self, names: &[&str]) -> Option<String> {
        self.text(names).map(str::to_string)
    }

    pub fn u8(&self, names: &[&str]) -> Option<u8> {
        self.text(names).and_then(text::parse_u8)
    }

    pub fn u16(&self, names: &[&str]) -> Option<u16> {
        self.text(names).and_then(text::parse_u16)
    }

    pub fn u32(&self, names: &[&str]) -> Option<u32> {
        self.text(names).and_then(text::parse_u32)
    }

    /// Signed variant for columns such as plus/minus.
    pub fn i32(&self, names: &[&str]) -> Option<i32> {
        self.text(names).and_then(text::parse_i32)
    }

    pub fn f32(&self, names: &[&str]) -> Option<f32> {
        self.text(names).and_then(text::parse_f32)
    }
}

/// Finds `css` in the document and extracts it as a stat table.
pub(crate) fn parse_table(doc: &Html, css: &str) -> Result<HtmlTable> {
    let table_sel = selector(css)?;
    let table = doc
        .select(&table_sel)
        .next()
        .ok_or_else(|| Error::markup(format!("no table matching `{css}`")))?;
    extract_table(table)
}

/// The `stat_grid` table carried by every season-to-date stats page.
pub(crate) fn parse_stat_grid(html: &str) -> Result<HtmlTable> {
    let doc = Html::parse_document(html);
    parse_table(&doc, "table#stat_grid")
}

/// Extracts headers and body rows from a `<table>` element.
///
/// Headers come from `thead th`, falling back to the `th` cells of the
/// first row. Body rows come from `tbody tr`, falling back to every `tr`
/// that contains at least one `td`.
pub(crate) fn extract_table(table: ElementRef<'_>) -> Result<HtmlTable> {
    let thead_th = selector("thead th")?;
    let any_th = selector("th")?;
    let tbody_tr = selector("tbody tr")?;
    let any_tr = selector("tr")?;
    let td_sel = selector("td")?;
    let a_sel = selector("a[href]")?;
    let img_sel = selector("img[alt]")?;

    let mut headers: Vec<String> = table
        .select(&thead_th)
        .map(|th| text::clean_text(&th.text().collect::<String>()))
        .collect();
    if headers.is_empty() {
        if let Some(first_row) = table.select(&any_tr).next() {
            headers = first_row
                .select(&any_th)
                .map(|th| text::clean_text(&th.text().collect::<String>()))
                .collect();
        }
    }

    let mut rows = Vec::new();
    let body_rows: Vec<ElementRef<'_>> = {
        let from_tbody: Vec<_> = table.select(&tbody_tr).collect();
        if from_tbody.is_empty() {
            table.select(&any_tr).collect()
        } else {
            from_tbody
        }
    };

    for tr in body_rows {
        let cells: Vec<Cell> = tr
            .select(&td_sel)
            .map(|td| read_cell(td, &a_sel, &img_sel))
            .collect();
        if cells.is_empty() {
            continue;
        }
        rows.push(TableRow {
            id: tr.value().attr("id").map(str::to_string),
            classes: tr.value().classes().map(str::to_string).collect(),
            cells,
        });
    }

    Ok(HtmlTable { headers, rows })
}

fn read_cell(
    td: ElementRef<'_>,
    a_sel: &scraper::Selector,
    img_sel: &scraper::Selector,
) -> Cell {
    let raw_text = td.text().collect::<String>();
    Cell {
        text: text::clean_text(&raw_text),
        raw_text,
        data_order: td.value().attr("data-order").map(str::to_string),
        href: td
            .select(a_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string),
        img_alts: td
            .select(img_sel)
            .filter_map(|img| img.value().attr("alt"))
            .map(str::to_string)
            .collect(),
    }
}

/// Options of the stat-category picker on season stat pages.
///
/// Returns `(value, label)` pairs in document order.
pub(crate) fn stat_category_options(doc: &Html) -> Result<Vec<(u64, String)>> {
    let option_sel = selector("select#year_stat_category_id option")?;
    let mut out = Vec::new();
    for option in doc.select(&option_sel) {
        let value = match option.value().attr("value") {
            Some(v) => v.trim(),
            None => continue,
        };
        let Ok(id) = value.parse::<u64>() else {
            continue;
        };
        let label = text::clean_text(&option.text().collect::<String>());
        out.push((id, label));
    }
    Ok(out)
}

/// Splits the category picker into `(field players, goalies)` ids.
///
/// Goalie-sport stat pages list the two categories under labels that
/// vary by sport and season ("Goalkeepers" vs "Non-Goalkeepers",
/// "Goalie" vs "Skater"). The goalie option names the goal; the field
/// player option is whichever comes first that does not.
pub(crate) fn goalie_category_split(html: &str) -> Result<(u64, u64)> {
    let doc = Html::parse_document(html);
    let options = stat_category_options(&doc)?;
    let mut players = None;
    let mut goalies = None;
    for (id, label) in &options {
        let lowered = label.to_lowercase();
        if lowered.contains("goal") && !lowered.contains("non") {
            goalies.get_or_insert(*id);
        } else {
            players.get_or_insert(*id);
        }
    }
    match (players, goalies) {
        (Some(p), Some(g)) => Ok((p, g)),
        _ => Err(Error::markup(
            "stats page lists no player and goalie categories",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <table id="stat_grid">
      <thead>
        <tr><th>#</th><th>Name</th><th>GP</th><th>AVG</th></tr>
      </thead>
      <tbody>
        <tr class="text" id="row_1">
          <td>12</td>
          <td data-order="Doe,John">
            <a href="/players/12345?year_stat_category_id=15687">
              <img alt="headshot"/>John Doe</a>
          </td>
          <td>41</td>
          <td>.312</td>
        </tr>
        <tr class="text">
          <td>7</td>
          <td data-order="Roe,Jane">Jane Roe&nbsp;</td>
          <td>-</td>
          <td></td>
        </tr>
      </tbody>
    </table>"#;

    #[test]
    fn test_extract_table_headers_and_rows() {
        let doc = Html::parse_document(SAMPLE);
        let table = parse_table(&doc, "table#stat_grid").unwrap();

        assert_eq!(table.headers, vec!["#", "Name", "GP", "AVG"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].id.as_deref(), Some("row_1"));
        assert!(table.rows[0].has_class("text"));
    }

    #[test]
    fn test_row_view_lookups() {
        let doc = Html::parse_document(SAMPLE);
        let table = parse_table(&doc, "table#stat_grid").unwrap();

        let first = table.view(&table.rows[0]);
        assert_eq!(first.text(&["Name"]), Some("John Doe"));
        assert_eq!(first.u16(&["GP"]), Some(41));
        assert_eq!(first.f32(&["AVG"]), Some(0.312));
        assert_eq!(
            first.cell(&["Name"]).unwrap().data_order.as_deref(),
            Some("Doe,John")
        );
        assert_eq!(
            first.cell(&["Name"]).unwrap().id_in_href("/players/"),
            Some(12345)
        );

        let second = table.view(&table.rows[1]);
        assert_eq!(second.u16(&["GP"]), None);
        assert_eq!(second.f32(&["AVG"]), None);
        assert!(second.cell(&["Name"]).unwrap().raw_text.contains('\u{a0}'));
    }

    #[test]
    fn test_table_without_thead() {
        let html = r#"
        <table class="mytable">
          <tr><th>A</th><th>B</th></tr>
          <tr><td>1</td><td>2</td></tr>
        </table>"#;
        let doc = Html::parse_document(html);
        let table = parse_table(&doc, "table.mytable").unwrap();
        assert_eq!(table.headers, vec!["A", "B"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].cells[1].text, "2");
    }

    #[test]
    fn test_stat_category_options() {
        let html = r#"
        <select id="year_stat_category_id">
          <option value="15687">Hitting</option>
          <option value="15688" selected="selected">Pitching</option>
          <option value="junk">Bad</option>
        </select>"#;
        let doc = Html::parse_document(html);
        let opts = stat_category_options(&doc).unwrap();
        assert_eq!(
            opts,
            vec![(15687, "Hitting".to_string()), (15688, "Pitching".to_string())]
        );
    }

    #[test]
    fn test_goalie_category_split() {
        let html = r#"
        <select id="year_stat_category_id">
          <option value="15140">Goalkeepers</option>
          <option value="15139">Non-Goalkeepers</option>
        </select>"#;
        let (players, goalies) = goalie_category_split(html).unwrap();
        assert_eq!(players, 15139);
        assert_eq!(goalies, 15140);
    }

    #[test]
    fn test_goalie_category_split_missing() {
        let html = "<select id=\"year_stat_category_id\"></select>";
        assert!(goalie_category_split(html).is_err());
    }

    #[test]
    fn test_missing_table_is_error() {
        let doc = Html::parse_document("<p>nothing here</p>");
        assert!(parse_table(&doc, "table#stat_grid").is_err());
    }
}
