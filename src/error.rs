use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure classes for scraping stats.ncaa.org.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}: {reason}")]
    Status {
        status: u16,
        url: String,
        reason: &'static str,
    },

    #[error("invalid selector `{0}`")]
    Selector(String),

    #[error("unexpected page structure: {0}")]
    Markup(String),

    #[error("could not parse `{value}` as {what}")]
    Parse { what: &'static str, value: String },

    #[error("team id {0} was not found in any cached team list")]
    UnknownTeam(i64),

    #[error("the {0} season is not covered for this sport")]
    UnknownSeason(u16),

    #[error("division {division} is not played in {sport}")]
    UnknownDivision {
        sport: &'static str,
        division: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn status(status: u16, url: &str) -> Self {
        Error::Status {
            status,
            url: url.to_string(),
            reason: status_reason(status),
        }
    }

    pub(crate) fn markup(what: impl Into<String>) -> Self {
        Error::Markup(what.into())
    }
}

/// Human-readable explanation for the status codes the site is known to send.
fn status_reason(status: u16) -> &'static str {
    match status {
        400 => "bad request, check the URL that was generated",
        401 => "unauthorized",
        403 => "forbidden, the website is blocking access",
        404 => "not found, the page does not exist",
        408 => "request timeout",
        418 => "the server is a teapot",
        429 => "too many requests, you are being rate limited",
        451 => "unavailable for legal reasons",
        500 => "internal server error",
        502 => "bad gateway",
        503 => "service unavailable",
        504 => "gateway timeout",
        511 => "network authentication required",
        _ => "unhandled status code",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = Error::status(429, "https://stats.ncaa.org/teams/1");
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("rate limited"));
    }

    #[test]
    fn test_unknown_status_message() {
        let err = Error::status(999, "https://stats.ncaa.org/teams/1");
        assert!(err.to_string().contains("unhandled status code"));
    }
}
