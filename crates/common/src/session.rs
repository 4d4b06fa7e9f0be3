//! Navigation session: the "current page" and scoped probes away from it

use std::ops::Deref;

use tracing::debug;
use url::Url;

use crate::document::FetchedDocument;
use crate::error::{Error, Result};
use crate::fetch::Fetcher;

/// A browsing session over one site.
///
/// The most recently visited document is the current page; each visit
/// replaces it. Probes fetch another document for the lifetime of a guard
/// and leave the current page in place.
pub struct BrowserSession {
    fetcher: Box<dyn Fetcher>,
    base_url: Url,
    current: Option<FetchedDocument>,
}

impl BrowserSession {
    pub fn new(fetcher: impl Fetcher + 'static, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| Error::invalid_url(base_url, e))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::invalid_url(base_url.as_str(), "not usable as a base URL"));
        }

        Ok(Self {
            fetcher: Box::new(fetcher),
            base_url,
            current: None,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Origin of the site under test, e.g. `https://x.com`
    pub fn base_origin(&self) -> String {
        self.base_url.origin().ascii_serialization()
    }

    /// Resolve `url` against the current page, or the base URL before any visit
    pub fn resolve(&self, url: &str) -> Result<Url> {
        let base = match self.current() {
            Some(doc) => Url::parse(&doc.url).unwrap_or_else(|_| self.base_url.clone()),
            None => self.base_url.clone(),
        };
        base.join(url.trim()).map_err(|e| Error::invalid_url(url, e))
    }

    fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        let target = self.resolve(url)?;
        let doc = self.fetcher.fetch(target.as_str())?;
        debug!("fetched {} ({})", doc.url, doc.status);
        Ok(doc)
    }

    /// Navigate to `url`, replacing the current page with the response
    pub fn visit(&mut self, url: &str) -> Result<&FetchedDocument> {
        let doc = self.fetch(url)?;
        Ok(self.current.insert(doc))
    }

    pub fn current(&self) -> Option<&FetchedDocument> {
        self.current.as_ref()
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current().map(|doc| doc.url.as_str())
    }

    pub fn require_current(&self) -> Result<&FetchedDocument> {
        self.current().ok_or(Error::NoCurrentPage)
    }

    /// Fetch `url` for the lifetime of the returned guard.
    ///
    /// Relative URLs resolve against the current page. The guard holds the
    /// session exclusively, so the current page is the same one before and
    /// after the probe, whichever way the caller leaves its scope.
    pub fn probe(&mut self, url: &str) -> Result<Probe<'_>> {
        let document = self.fetch(url)?;
        Ok(Probe {
            session: self,
            document,
        })
    }
}

/// A temporary navigation; derefs to the probed document
pub struct Probe<'a> {
    session: &'a mut BrowserSession,
    document: FetchedDocument,
}

impl Deref for Probe<'_> {
    type Target = FetchedDocument;

    fn deref(&self) -> &FetchedDocument {
        &self.document
    }
}

impl Drop for Probe<'_> {
    fn drop(&mut self) {
        debug!(
            "probe of {} finished, current page is {}",
            self.document.url,
            self.session.current_url().unwrap_or("<none>")
        );
    }
}
