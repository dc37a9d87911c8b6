//! Parser for football's drive-log layout of `/contests/{game_id}/play_by_play`.
//!
//! Football games render one `div.drives` box per quarter instead of the
//! period cards other sports use. Inside a box, each drive is an `h5`
//! header (team logo, drive summary, running score) paired positionally
//! with a container of play rows. Play rows carry a down-and-distance
//! span followed by the play text span.

use scraper::Html;

use crate::error::{Error, Result};
use crate::pages::boxscore::{parse_game_header, GameHeader};
use crate::pages::selector;
use crate::utils::text;

/// One drive: the header strings plus the play rows beneath it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Drive {
    /// Alt text of the possessing team's logo, a team-name fragment.
    pub team: String,
    /// `Punt 2:10, OU25, 3 plays, 5 yards, 1:30` and similar.
    pub summary: String,
    /// Running score after the drive, as `away-home`.
    pub score: String,
    pub plays: Vec<PlayRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlayRow {
    /// `1st & 10 at OU25`, or `0th & 0 at` on untimed rows.
    pub down_distance: String,
    pub text: String,
}

/// Header plus drives grouped by quarter, first quarter first. Overtimes
/// are extra trailing groups.
pub(crate) fn parse_drives_page(html: &str) -> Result<(GameHeader, Vec<Vec<Drive>>)> {
    let doc = Html::parse_document(html);
    let header = parse_game_header(&doc)?;
    let quarters = parse_quarter_drives(&doc)?;
    Ok((header, quarters))
}

pub(crate) fn parse_quarter_drives(doc: &Html) -> Result<Vec<Vec<Drive>>> {
    let box_sel = selector("div.drives")?;
    let header_sel = selector("h5[class*=\"scoring_play\"]")?;
    let plays_sel = selector("div[class*=\"scoring_play\"]")?;
    let left_sel = selector("div.headerLeft")?;
    let right_sel = selector("div.headerRight")?;
    let img_sel = selector("img")?;
    let row_sel = selector("div[style*=\"border-bottom: 1px dotted\"]")?;
    let span_sel = selector("span")?;

    let mut quarters = Vec::new();
    for quarter_box in doc.select(&box_sel) {
        let headers: Vec<_> = quarter_box.select(&header_sel).collect();
        let containers: Vec<_> = quarter_box.select(&plays_sel).collect();

        // Headers and play containers are emitted pairwise in document
        // order, so position ties a drive to its plays.
        let mut drives = Vec::new();
        for (header, container) in headers.iter().zip(containers.iter()) {
            let team = header
                .select(&img_sel)
                .next()
                .and_then(|img| img.value().attr("alt"))
                .map(|alt| text::clean_text(alt))
                .unwrap_or_default();
            // The first headerLeft holds the team name, the second the
            // drive summary.
            let summary = header
                .select(&left_sel)
                .nth(1)
                .map(|el| text::clean_text(&el.text().collect::<String>()))
                .unwrap_or_default();
            let score = header
                .select(&right_sel)
                .next()
                .map(|el| text::clean_text(&el.text().collect::<String>()))
                .unwrap_or_default();

            let mut plays = Vec::new();
            for row in container.select(&row_sel) {
                let spans: Vec<String> = row
                    .select(&span_sel)
                    .map(|s| text::clean_text(&s.text().collect::<String>()))
                    .collect();
                if spans.len() < 2 {
                    continue;
                }
                plays.push(PlayRow {
                    down_distance: spans[spans.len() - 2].clone(),
                    text: spans[spans.len() - 1].clone(),
                });
            }
            drives.push(Drive {
                team,
                summary,
                score,
                plays,
            });
        }
        quarters.push(drives);
    }

    if quarters.is_empty() {
        return Err(Error::markup("play_by_play page has no drive boxes"));
    }
    Ok(quarters)
}
