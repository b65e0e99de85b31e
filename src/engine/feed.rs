//! Remote advisory feed download.
//!
//! A feed location is either an `http(s)://` URL or a local mirror path
//! (`file://...` or a bare filesystem path). The payload is a JSON array of
//! [`Advisory`] objects, or an object with an `advisories` array.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Proxy;
use serde::Deserialize;
use tracing::{debug, info};

use super::store::Advisory;
use crate::error::EngineError;
use crate::settings::{Setting, Settings};

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedDocument {
    Bare(Vec<Advisory>),
    Wrapped { advisories: Vec<Advisory> },
}

impl FeedDocument {
    fn into_advisories(self) -> Vec<Advisory> {
        match self {
            FeedDocument::Bare(advisories) => advisories,
            FeedDocument::Wrapped { advisories } => advisories,
        }
    }
}

/// Parse a feed payload.
pub fn parse_feed(body: &str, location: &str) -> Result<Vec<Advisory>, EngineError> {
    serde_json::from_str::<FeedDocument>(body)
        .map(FeedDocument::into_advisories)
        .map_err(|source| EngineError::Json {
            context: location.to_owned(),
            source,
        })
}

/// Downloads feeds with the proxy and timeout taken from the settings table.
pub struct FeedClient {
    http: Client,
}

impl FeedClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, EngineError> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));

        if let Some(timeout) = connection_timeout(settings)? {
            debug!(timeout_ms = timeout.as_millis() as u64, "feed request deadline");
            builder = builder.timeout(timeout);
        }

        if let Some(server) = settings.get_string(Setting::ProxyServer) {
            let url = match settings.get_string(Setting::ProxyPort) {
                Some(port) => format!("http://{server}:{port}"),
                None => format!("http://{server}"),
            };
            let mut proxy = Proxy::all(url.as_str())
                .map_err(|e| EngineError::Message(format!("invalid proxy '{url}': {e}")))?;
            if let Some(user) = settings.get_string(Setting::ProxyUsername) {
                let password = settings.get_string(Setting::ProxyPassword).unwrap_or_default();
                proxy = proxy.basic_auth(user, password);
            }
            debug!(proxy = %url, "feed requests go through proxy");
            builder = builder.proxy(proxy);
        }

        let http = builder
            .build()
            .map_err(|e| EngineError::Message(format!("failed to build http client: {e}")))?;
        Ok(Self { http })
    }

    /// Fetch and parse one feed.
    pub fn fetch(&self, location: &str) -> Result<Vec<Advisory>, EngineError> {
        info!(feed = %location, "downloading advisory feed");
        let body = if location.starts_with("http://") || location.starts_with("https://") {
            self.fetch_http(location)?
        } else {
            let path = Path::new(location.strip_prefix("file://").unwrap_or(location));
            std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?
        };
        let advisories = parse_feed(&body, location)?;
        debug!(feed = %location, count = advisories.len(), "feed parsed");
        Ok(advisories)
    }

    fn fetch_http(&self, url: &str) -> Result<String, EngineError> {
        let http_err = |source: reqwest::Error| EngineError::Http {
            url: url.to_owned(),
            source,
        };
        self.http
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(http_err)
    }
}

/// `connection.timeout` is in milliseconds.
fn connection_timeout(settings: &Settings) -> Result<Option<Duration>, EngineError> {
    match settings.get_string(Setting::ConnectionTimeout) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| {
                EngineError::Message(format!(
                    "{} must be a number of milliseconds, got '{raw}'",
                    Setting::ConnectionTimeout
                ))
            }),
    }
}
