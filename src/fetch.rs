use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::SourceConfig;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Error accessing {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Error accessing {url}: HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("Error reading body from {url}: {source}")]
    Read {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Anything that can hand the pipeline one HTML document.
pub trait PageSource {
    /// Where the page comes from, for logs and diagnostics
    fn location(&self) -> &str;

    fn fetch_page(&self) -> Result<String, FetchError>;
}

/// Fetches the page with a single blocking GET.
pub struct HttpFetcher {
    url: String,
    user_agent: String,
    timeout: Option<Duration>,
    use_system_proxy: bool,
}

impl HttpFetcher {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            url: config.url.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
            use_system_proxy: config.use_system_proxy,
        }
    }
}

impl PageSource for HttpFetcher {
    fn location(&self) -> &str {
        &self.url
    }

    #[instrument(skip(self), fields(url = %self.url))]
    fn fetch_page(&self) -> Result<String, FetchError> {
        let mut builder = reqwest::blocking::Client::builder().user_agent(&self.user_agent);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if !self.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(|e| FetchError::Request {
            url: self.url.clone(),
            source: e,
        })?;

        info!("GET {}", self.url);
        let response = client
            .get(&self.url)
            .send()
            .map_err(|e| FetchError::Request {
                url: self.url.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(|e| FetchError::Read {
            url: self.url.clone(),
            source: e,
        })?;
        debug!(bytes = body.len(), "page downloaded");
        Ok(body)
    }
}

/// A document already in memory: a saved copy of the page, or test markup.
pub struct StaticPage {
    location: String,
    html: String,
}

impl StaticPage {
    pub fn new(location: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            html: html.into(),
        }
    }
}

impl PageSource for StaticPage {
    fn location(&self) -> &str {
        &self.location
    }

    fn fetch_page(&self) -> Result<String, FetchError> {
        Ok(self.html.clone())
    }
}
