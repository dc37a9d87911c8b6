//! The institution registry behind every team list.
//!
//! Team rankings pages only name schools; ids come from the history
//! picker on `/teams/history`, which lists every institution the site
//! has ever tracked.

use std::collections::HashMap;

use scraper::Html;

use crate::cache::{CacheStore, SCHOOLS_MAX_AGE};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::models::School;
use crate::pages::selector;
use crate::utils::text;

const SCHOOLS_URL: &str = "https://stats.ncaa.org/teams/history";
const SCHOOLS_CACHE_FILE: &str = "schools.csv";

/// Loads the registry, refreshing the cached copy every 90 days.
pub(crate) async fn load_schools(http: &HttpClient, cache: &CacheStore) -> Result<Vec<School>> {
    if let Some(rows) = cache.load_if_fresh::<School>(SCHOOLS_CACHE_FILE, SCHOOLS_MAX_AGE) {
        return Ok(rows);
    }
    let html = http.get(SCHOOLS_URL).await?;
    let schools = parse_schools(&html)?;
    cache.store(SCHOOLS_CACHE_FILE, &schools)?;
    Ok(schools)
}

/// Name-to-id lookup over the registry. First listing wins for schools the
/// picker repeats.
pub(crate) fn school_index(schools: &[School]) -> HashMap<String, i64> {
    let mut index = HashMap::with_capacity(schools.len());
    for school in schools {
        index
            .entry(school.school_name.clone())
            .or_insert(school.school_id);
    }
    index
}

pub(crate) fn parse_schools(html: &str) -> Result<Vec<School>> {
    let doc = Html::parse_document(html);
    let option_sel = selector("select#org_id_select option")?;

    let mut schools = Vec::new();
    for option in doc.select(&option_sel) {
        let Some(value) = option.value().attr("value") else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let name = text::clean_text(&option.text().collect::<String>());
        // The picker carries a couple of non-school entries.
        if name.eq_ignore_ascii_case("career") || name.contains("Z_Do_Not_Use_") {
            continue;
        }
        let Ok(school_id) = value.parse::<i64>() else {
            continue;
        };
        schools.push(School {
            school_id,
            school_name: name,
        });
    }

    if schools.is_empty() {
        return Err(Error::markup("history page listed no schools"));
    }

    schools.sort_by_key(|s| s.school_id);
    schools.dedup_by(|a, b| a.school_name == b.school_name);
    Ok(schools)
}
