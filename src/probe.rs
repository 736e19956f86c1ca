//! Freshness probe against the slide server.
//!
//! Before any cache or disk decision, the pipeline issues a cheap HEAD
//! request to the render URL. The server answers with a `Date` header set to
//! the deck's source modification time, which doubles as a liveness check:
//! no answer (or no header) means the render backend cannot be trusted and
//! the whole request is refused rather than spiralling into self-renders.

use std::time::{Duration, SystemTime};

use crate::{Error, Result};

pub struct FreshnessProbe {
    client: reqwest::blocking::Client,
}

impl FreshnessProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// HEAD the render URL and return the instant its `Date` header reports.
    ///
    /// Every failure mode (transport error, non-success status, missing or
    /// unparseable header) maps to [`Error::Unavailable`].
    pub fn remote_date(&self, url: &str) -> Result<SystemTime> {
        let response = self
            .client
            .head(url)
            .send()
            .map_err(|e| Error::Unavailable(format!("probe {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::Unavailable(format!(
                "probe {}: status {}",
                url,
                response.status()
            )));
        }

        let header = response
            .headers()
            .get(reqwest::header::DATE)
            .ok_or_else(|| Error::Unavailable(format!("probe {}: no Date header", url)))?;
        let text = header
            .to_str()
            .map_err(|e| Error::Unavailable(format!("probe {}: bad Date header: {}", url, e)))?;

        let parsed = chrono::DateTime::parse_from_rfc2822(text)
            .map_err(|e| Error::Unavailable(format!("probe {}: bad Date '{}': {}", url, text, e)))?;

        Ok(SystemTime::from(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_server(date_header: Option<&'static str>, status: u16) -> String {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_string();
        std::thread::spawn(move || {
            if let Ok(request) = server.recv() {
                let mut response =
                    tiny_http::Response::empty(tiny_http::StatusCode(status));
                if let Some(date) = date_header {
                    response.add_header(
                        tiny_http::Header::from_bytes(&b"Date"[..], date.as_bytes()).unwrap(),
                    );
                }
                let _ = request.respond(response);
            }
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_remote_date_parses_header() {
        let url = spawn_server(Some("Wed, 21 Oct 2015 07:28:00 GMT"), 200);
        let probe = FreshnessProbe::new(Duration::from_secs(2)).unwrap();
        let date = probe.remote_date(&url).unwrap();

        let expected = SystemTime::UNIX_EPOCH + Duration::from_secs(1445412480);
        assert_eq!(date, expected);
    }

    #[test]
    fn test_unreachable_server_is_unavailable() {
        // Nothing listens on this port.
        let probe = FreshnessProbe::new(Duration::from_millis(300)).unwrap();
        let err = probe.remote_date("http://127.0.0.1:1/view?label=x").unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)));
        assert_eq!(err.http_status(), 503);
    }

    #[test]
    fn test_error_status_is_unavailable() {
        let url = spawn_server(Some("Wed, 21 Oct 2015 07:28:00 GMT"), 500);
        let probe = FreshnessProbe::new(Duration::from_secs(2)).unwrap();
        assert!(matches!(
            probe.remote_date(&url),
            Err(Error::Unavailable(_))
        ));
    }
}
