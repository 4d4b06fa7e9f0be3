//! Fetch collaborators: retrieving a URL into a [`FetchedDocument`]

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::config::HttpConfig;
use crate::document::{FetchedDocument, Headers};
use crate::error::{Error, Result};

/// Retrieves a URL.
///
/// Fetching is synchronous and blocks until a response or the
/// implementation's own timeout. A non-2xx status is a successful fetch;
/// only unreachable hosts and protocol failures are errors.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<FetchedDocument>;
}

impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        (**self).fetch(url)
    }
}

/// HTTP fetcher backed by a blocking reqwest client.
///
/// The client keeps a cookie store, so every fetch in a session shares the
/// authentication state established by earlier responses.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .cookie_store(config.cookies)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::transport(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers: Headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str(), value.to_str().unwrap_or_default()))
            .collect();
        let body = response.text().map_err(|e| Error::transport(url, e))?;

        debug!("{} -> {} ({} bytes)", url, status, body.len());

        Ok(FetchedDocument::new(final_url, status, headers, body))
    }
}

/// Canned response served by [`StaticSite`]
#[derive(Debug, Clone)]
pub struct StaticResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: String,
}

impl StaticResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }
}

/// In-memory fetcher serving canned responses by absolute URL.
///
/// Unknown URLs fail like an unreachable host would.
#[derive(Debug, Clone, Default)]
pub struct StaticSite {
    pages: HashMap<String, StaticResponse>,
}

impl StaticSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, response: StaticResponse) -> Self {
        self.pages.insert(url.into(), response);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, response: StaticResponse) {
        self.pages.insert(url.into(), response);
    }
}

impl Fetcher for StaticSite {
    fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        let response = self
            .pages
            .get(url)
            .ok_or_else(|| Error::transport(url, "host unreachable"))?;

        Ok(FetchedDocument::new(
            url,
            response.status,
            response.headers.clone(),
            response.body.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one canned HTTP response on a random local port
    fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });

        format!("http://{}/style.css", addr)
    }

    #[test]
    fn test_static_site_serves_known_urls() {
        let site = StaticSite::new().page(
            "https://x.com/",
            StaticResponse::ok("<html></html>").header("Cache-Control", "max-age=60"),
        );

        let doc = site.fetch("https://x.com/").unwrap();
        assert_eq!(doc.status, 200);
        assert_eq!(doc.header("cache-control"), Some("max-age=60"));
        assert_eq!(doc.body, "<html></html>");
    }

    #[test]
    fn test_static_site_unknown_url_is_transport_error() {
        let site = StaticSite::new();
        let err = site.fetch("https://nowhere.test/").unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }

    #[test]
    fn test_http_fetcher_reads_status_headers_and_body() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Type: text/css\r\nCache-Control: no-cache\r\nContent-Length: 7\r\nConnection: close\r\n\r\na{b:c}\n",
        );

        let fetcher = HttpFetcher::new(&HttpConfig::default()).unwrap();
        let doc = fetcher.fetch(&url).unwrap();

        assert_eq!(doc.status, 404);
        assert_eq!(doc.header("Cache-Control"), Some("no-cache"));
        assert_eq!(doc.body, "a{b:c}\n");
    }

    #[test]
    fn test_http_fetcher_unreachable_host() {
        // Bind then drop to get a port nobody listens on.
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let fetcher = HttpFetcher::new(&HttpConfig::default()).unwrap();

        let err = fetcher.fetch(&format!("http://127.0.0.1:{}/", port)).unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }
}
