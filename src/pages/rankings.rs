//! Parsers for the rankings pages that enumerate every team in a
//! season and division.

use scraper::Html;

use crate::error::{Error, Result};
use crate::pages::{selector, stat_table};
use crate::utils::text;

/// One `<option>` from the ranking-period picker.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RankingPeriod {
    pub value: String,
    pub label: String,
}

/// One team row from either rankings layout.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RankedTeam {
    pub team_id: i64,
    pub school_name: String,
    pub conference: Option<String>,
}

/// Reads the ranking-period picker from a `change_sport_year_div` page.
pub(crate) fn parse_ranking_periods(html: &str) -> Result<Vec<RankingPeriod>> {
    let doc = Html::parse_document(html);
    let option_sel = selector("select#rp option")?;

    let mut periods = Vec::new();
    for option in doc.select(&option_sel) {
        let Some(value) = option.value().attr("value") else {
            continue;
        };
        if value.trim().is_empty() {
            continue;
        }
        periods.push(RankingPeriod {
            value: value.trim().to_string(),
            label: text::clean_text(&option.text().collect::<String>()),
        });
    }
    Ok(periods)
}

/// Picks the period covering the whole season.
///
/// Championship-week periods list a subset of teams, so the first
/// non-championship option wins.
pub(crate) fn final_ranking_period(periods: &[RankingPeriod]) -> Option<&RankingPeriod> {
    periods
        .iter()
        .find(|p| !p.label.to_lowercase().contains("championship"))
        .or_else(|| periods.first())
}

/// Team rows from an `institution_trends` page (2013 and later).
///
/// The grid lists one team per body row, with the school link carrying the
/// team id and the second cell carrying the conference.
pub(crate) fn parse_institution_trends(html: &str) -> Result<Vec<RankedTeam>> {
    let doc = Html::parse_document(html);
    let table = stat_table::parse_table(&doc, "table#stat_grid")?;

    let mut teams = Vec::new();
    for row in &table.rows {
        let Some(name_cell) = row.cell(0) else {
            continue;
        };
        let team_id = row
            .cells
            .iter()
            .find_map(|c| c.id_in_href("/teams/"));
        let Some(team_id) = team_id else {
            continue;
        };
        let school_name = name_cell.text.clone();
        if school_name.is_empty() {
            continue;
        }
        let conference = row
            .cell(1)
            .map(|c| c.text.clone())
            .filter(|t| !t.is_empty());
        teams.push(RankedTeam {
            team_id,
            school_name,
            conference,
        });
    }

    if teams.is_empty() {
        return Err(Error::markup("institution_trends page listed no teams"));
    }
    Ok(teams)
}

/// Team rows from a `national_ranking` page (pre-2013 seasons and the
/// fallback when `institution_trends` errors out).
///
/// Here the name cell's `data-order` attribute packs the school and
/// conference as `"name, conference"`.
pub(crate) fn parse_national_ranking(html: &str) -> Result<Vec<RankedTeam>> {
    let doc = Html::parse_document(html);
    let table = stat_table::parse_table(&doc, "table#rankings_table")?;

    let mut teams = Vec::new();
    for row in &table.rows {
        let team_id = row
            .cells
            .iter()
            .find_map(|c| c.id_in_href("/teams/"));
        let Some(team_id) = team_id else {
            continue;
        };
        let Some(order) = row.cell(1).and_then(|c| c.data_order.clone()) else {
            continue;
        };
        let (name, conference) = match order.split_once(',') {
            Some((n, c)) => (n.trim().to_string(), Some(c.trim().to_string())),
            None => (order.trim().to_string(), None),
        };
        if name.is_empty() {
            continue;
        }
        teams.push(RankedTeam {
            team_id,
            school_name: name,
            conference: conference.filter(|c| !c.is_empty()),
        });
    }

    if teams.is_empty() {
        return Err(Error::markup("national_ranking page listed no teams"));
    }
    Ok(teams)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_periods_prefer_non_championship() {
        let html = r#"
        <select id="rp" name="rp">
          <option value="294.0">Championship - 05/27/2024</option>
          <option value="293.0">Final - 05/20/2024</option>
          <option value="292.0">Week 14 - 05/13/2024</option>
        </select>"#;
        let periods = parse_ranking_periods(html).unwrap();
        assert_eq!(periods.len(), 3);
        let rp = final_ranking_period(&periods).unwrap();
        assert_eq!(rp.value, "293.0");
    }

    #[test]
    fn test_institution_trends_rows() {
        let html = r#"
        <table id="stat_grid">
          <thead><tr><th>Institution</th><th>Conference</th><th>G</th></tr></thead>
          <tbody>
            <tr>
              <td><a href="/teams/574077">Stetson</a></td>
              <td>ASUN</td>
              <td>55</td>
            </tr>
            <tr>
              <td><a href="/teams/574223">Texas</a></td>
              <td>Big 12</td>
              <td>61</td>
            </tr>
          </tbody>
        </table>"#;
        let teams = parse_institution_trends(html).unwrap();
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].team_id, 574077);
        assert_eq!(teams[0].school_name, "Stetson");
        assert_eq!(teams[1].conference.as_deref(), Some("Big 12"));
    }

    #[test]
    fn test_national_ranking_rows() {
        let html = r#"
        <table id="rankings_table">
          <thead><tr><th>Rank</th><th>Team</th></tr></thead>
          <tbody>
            <tr>
              <td>1</td>
              <td data-order="South Carolina, SEC">
                <a href="/teams/505860">South Carolina (SEC)</a>
              </td>
            </tr>
          </tbody>
        </table>"#;
        let teams = parse_national_ranking(html).unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].team_id, 505860);
        assert_eq!(teams[0].school_name, "South Carolina");
        assert_eq!(teams[0].conference.as_deref(), Some("SEC"));
    }

    #[test]
    fn test_empty_tables_error() {
        let html = r#"<table id="stat_grid"><tbody></tbody></table>"#;
        assert!(parse_institution_trends(html).is_err());
    }
}
