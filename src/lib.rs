//! Scraping client for stats.ncaa.org.
//!
//! One scraper struct per sport (baseball, basketball, field hockey,
//! football, ice hockey, lacrosse, soccer, softball, volleyball), all
//! built on a shared engine: throttled HTTP with retries, HTML table
//! parsing, and a CSV cache tree under `~/.ncaa_stats/`. Every
//! operation is cache-first; pages are refetched only once their
//! freshness window lapses.

mod cache;
pub mod config;
pub mod error;
mod http;
pub mod models;
mod pages;
mod schools;
pub mod sports;
pub mod utils;

pub use config::ScrapeConfig;
pub use error::{Error, Result};
pub use models::*;
pub use sports::baseball::BaseballScraper;
pub use sports::basketball::BasketballScraper;
pub use sports::field_hockey::FieldHockeyScraper;
pub use sports::football::FootballScraper;
pub use sports::hockey::HockeyScraper;
pub use sports::lacrosse::LacrosseScraper;
pub use sports::soccer::SoccerScraper;
pub use sports::softball::SoftballScraper;
pub use sports::volleyball::VolleyballScraper;
