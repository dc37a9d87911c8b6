//! Parser for play-by-play pages (`/contests/{game_id}/play_by_play`).
//!
//! Events are grouped into one card per inning/half/period/set. Row shape
//! varies by sport: bat-and-ball sports use three cells (away event,
//! score, home event), clocked sports prepend a game-time cell. Cards are
//! returned as cleaned cell text and interpreted per sport.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

use crate::error::{Error, Result};
use crate::pages::boxscore::{parse_game_header, GameHeader};
use crate::pages::selector;
use crate::utils::text;

static PERIOD_NUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)").unwrap());

/// One period/inning/set card.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PeriodCard {
    pub heading: String,
    /// Cleaned `<td>` texts of each body row, in document order.
    pub rows: Vec<Vec<String>>,
}

impl PeriodCard {
    /// First number in the heading: `"3rd Inning"` gives 3.
    pub fn number(&self) -> Option<u8> {
        PERIOD_NUM_RE
            .find(&self.heading)
            .and_then(|m| m.as_str().parse().ok())
    }

    pub fn is_overtime(&self) -> bool {
        self.heading.to_lowercase().contains("ot")
    }
}

pub(crate) fn parse_pbp_page(html: &str) -> Result<(GameHeader, Vec<PeriodCard>)> {
    let doc = Html::parse_document(html);
    let header = parse_game_header(&doc)?;
    let cards = parse_period_cards(&doc)?;
    Ok((header, cards))
}

pub(crate) fn parse_period_cards(doc: &Html) -> Result<Vec<PeriodCard>> {
    let card_sel = selector("div.row.justify-content-md-center.w-100")?;
    let header_sel = selector("div.card-header")?;
    let tr_sel = selector("table tbody tr")?;
    let td_sel = selector("td")?;

    let mut cards = Vec::new();
    for card in doc.select(&card_sel) {
        let Some(heading) = card
            .select(&header_sel)
            .next()
            .map(|h| text::clean_text(&h.text().collect::<String>()))
        else {
            continue;
        };

        let mut rows = Vec::new();
        for tr in card.select(&tr_sel) {
            let cells: Vec<String> = tr
                .select(&td_sel)
                .map(|td| text::clean_text(&td.text().collect::<String>()))
                .collect();
            if !cells.is_empty() {
                rows.push(cells);
            }
        }
        cards.push(PeriodCard { heading, rows });
    }

    if cards.is_empty() {
        return Err(Error::markup("play_by_play page has no period cards"));
    }
    Ok(cards)
}

/// Running scores come as `away-home`. Dashes inside team tallies do not
/// occur, so a plain split is enough.
pub(crate) fn parse_running_score(raw: &str) -> Option<(u16, u16)> {
    let (away, home) = raw.split_once('-')?;
    Some((
        away.trim().parse().ok()?,
        home.trim().parse().ok()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::boxscore::tests::HEADER_BLOCK;

    fn card(heading: &str, rows: &str) -> String {
        format!(
            r#"
        <div class="row justify-content-md-center w-100">
          <div class="card-header">{heading}</div>
          <table><tbody>{rows}</tbody></table>
        </div>"#
        )
    }

    #[test]
    fn test_parse_pbp_cards() {
        let html = format!(
            "{}{}{}",
            HEADER_BLOCK,
            card(
                "1st Inning",
                "<tr><td>Doe singled.</td><td>0-0</td><td></td></tr>
                 <tr><td></td><td>1-0</td><td>Roe homered.</td></tr>"
            ),
            card("2nd Inning", "<tr><td>Doe walked.</td><td>1-0</td><td></td></tr>")
        );
        let (header, cards) = parse_pbp_page(&html).unwrap();
        assert_eq!(header.home_team_name, "Stetson");
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].number(), Some(1));
        assert!(!cards[0].is_overtime());
        assert_eq!(cards[0].rows.len(), 2);
        assert_eq!(cards[0].rows[1][2], "Roe homered.");
    }

    #[test]
    fn test_overtime_heading() {
        let cardval = PeriodCard {
            heading: "OT 2".to_string(),
            rows: Vec::new(),
        };
        assert_eq!(cardval.number(), Some(2));
        assert!(cardval.is_overtime());
    }

    #[test]
    fn test_running_score() {
        assert_eq!(parse_running_score("4-2"), Some((4, 2)));
        assert_eq!(parse_running_score(" 10 - 7 "), Some((10, 7)));
        assert_eq!(parse_running_score("Doe struck out."), None);
    }
}
