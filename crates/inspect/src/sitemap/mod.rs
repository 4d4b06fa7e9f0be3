//! Sitemap Document Validator
//!
//! A [`SitemapDocument`] is the loaded sitemap under test. Structural queries
//! run against its parsed tree; liveness checks probe the listed URLs through
//! the browser session.

pub mod schema;
pub mod xml;

use rand::seq::SliceRandom;
use rand::Rng;
use seoprobe_common::BrowserSession;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ensure, CheckError, Verdict};

pub use schema::{SitemapProfile, Violation};
pub use xml::{XmlDocument, XmlElement, XmlError};

pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// One `<loc>` of a url set with its alternate links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    /// `(hreflang, href)` pairs
    pub alternates: Vec<(String, String)>,
}

/// A fetched sitemap, kept even when it is not well-formed
#[derive(Debug, Clone)]
pub struct SitemapDocument {
    uri: String,
    parsed: Result<XmlDocument, XmlError>,
}

impl SitemapDocument {
    pub fn parse(uri: impl Into<String>, body: &str) -> Self {
        let uri = uri.into();
        let parsed = XmlDocument::parse(body);
        if let Err(e) = &parsed {
            warn!("sitemap {} is not well-formed: {}", uri, e);
        }
        Self { uri, parsed }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn is_well_formed(&self) -> bool {
        self.parsed.is_ok()
    }

    fn document(&self) -> Result<&XmlDocument, CheckError> {
        self.parsed
            .as_ref()
            .map_err(|e| CheckError::assertion(format!("Error loading {} Sitemap: {}", self.uri, e)))
    }

    /// Validate against the schema bound to `profile`.
    ///
    /// A document that is not well-formed fails the same way as one that
    /// breaks the schema.
    pub fn validate_schema(&self, profile: SitemapProfile) -> Verdict {
        let details = match &self.parsed {
            Err(e) => vec![e.to_string()],
            Ok(doc) => schema::validate(doc, profile)
                .iter()
                .map(Violation::to_string)
                .collect(),
        };

        ensure(details.is_empty(), || {
            format!(
                "Sitemap {} does not pass validation using {} schema:\n{}",
                self.uri,
                profile.schema_file(),
                details.join("\n")
            )
        })
    }

    /// `<loc>` values under `sitemapindex/sitemap` or `urlset/url`
    pub fn locations(&self, in_index: bool) -> Result<Vec<String>, CheckError> {
        let (root, parent) = if in_index {
            ("sitemapindex", "sitemap")
        } else {
            ("urlset", "url")
        };
        let doc = self.document()?;
        if !doc.root.is(SITEMAP_NS, root) {
            return Ok(Vec::new());
        }
        Ok(doc
            .root
            .children_named(SITEMAP_NS, parent)
            .flat_map(|child| child.children_named(SITEMAP_NS, "loc"))
            .map(|loc| loc.text.trim().to_string())
            .collect())
    }

    /// Number of `<loc>` values ending with `url`
    pub fn child_matches(&self, in_index: bool, url: &str) -> Result<usize, CheckError> {
        Ok(self
            .locations(in_index)?
            .iter()
            .filter(|loc| loc.ends_with(url))
            .count())
    }

    /// Exactly one child location ends with `url`
    pub fn has_child(&self, in_index: bool, url: &str) -> Verdict {
        let matches = self.child_matches(in_index, url)?;
        ensure(matches == 1, || {
            format!("Sitemap {} has not child sitemap {} ({} matches)", self.uri, url, matches)
        })
    }

    /// No child location ends with `url`
    pub fn has_no_child(&self, in_index: bool, url: &str) -> Verdict {
        let matches = self.child_matches(in_index, url)?;
        ensure(matches == 0, || {
            format!("Sitemap {} has {} children sitemap {}", self.uri, matches, url)
        })
    }

    /// `<loc>` elements under either a `sitemap` or a `url` element
    pub fn count_children(&self) -> Result<usize, CheckError> {
        let doc = self.document()?;
        if !(doc.root.is(SITEMAP_NS, "sitemapindex") || doc.root.is(SITEMAP_NS, "urlset")) {
            return Ok(0);
        }
        Ok(doc
            .root
            .children
            .iter()
            .filter(|c| c.is(SITEMAP_NS, "sitemap") || c.is(SITEMAP_NS, "url"))
            .map(|c| c.children_named(SITEMAP_NS, "loc").count())
            .sum())
    }

    /// `urlset/url` entries with their `xhtml:link` alternates
    pub fn entries(&self) -> Result<Vec<SitemapEntry>, CheckError> {
        let doc = self.document()?;
        if !doc.root.is(SITEMAP_NS, "urlset") {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for url in doc.root.children_named(SITEMAP_NS, "url") {
            let Some(loc) = url.children_named(SITEMAP_NS, "loc").next() else {
                continue;
            };
            let alternates = url
                .descendants()
                .into_iter()
                .filter(|el| el.name == "link")
                .map(|link| {
                    (
                        link.attribute("hreflang").unwrap_or_default().to_string(),
                        link.attribute("href").unwrap_or_default().to_string(),
                    )
                })
                .collect();
            entries.push(SitemapEntry {
                loc: loc.text.trim().to_string(),
                alternates,
            });
        }
        Ok(entries)
    }

    /// Every non-self alternate link A -> B names exactly one entry B of
    /// this sitemap. B may link back to A or only to itself.
    pub fn validate_reciprocal_alternate_links(&self) -> Verdict {
        self.validate_schema(SitemapProfile::Multilingual)?;

        let entries = self.entries()?;
        for entry in &entries {
            for (_, href) in &entry.alternates {
                if href == &entry.loc {
                    continue;
                }

                let targets = entries.iter().filter(|e| &e.loc == href).count();
                ensure(targets == 1, || {
                    format!(
                        "Url {} has not reciprocous URL for alternative link {} in Sitemap {}",
                        entry.loc, href, self.uri
                    )
                })?;
            }
        }
        Ok(())
    }
}

/// Loads sitemaps and checks that the URLs they list are alive
#[derive(Debug, Clone, Default)]
pub struct SitemapValidator;

impl SitemapValidator {
    pub fn new() -> Self {
        Self
    }

    /// Navigate to `url` and keep the response as the sitemap under test
    pub fn load(&self, session: &mut BrowserSession, url: &str) -> Result<SitemapDocument, CheckError> {
        let doc = session
            .visit(url)
            .map_err(|e| CheckError::transport(format!("Error loading {} Sitemap", url), e))?;
        if !doc.is_ok() {
            warn!("sitemap {} answered {}", doc.url, doc.status);
        }
        info!("loaded sitemap {}", doc.url);
        Ok(SitemapDocument::parse(doc.url.clone(), &doc.body))
    }

    /// Every `urlset/url` location, in document order, stopping at the first
    /// one that is not alive
    pub fn all_urls_alive(&self, session: &mut BrowserSession, sitemap: &SitemapDocument) -> Verdict {
        for loc in sitemap.locations(false)? {
            self.url_alive(session, sitemap, &loc)?;
        }
        Ok(())
    }

    /// `count` locations chosen by an unweighted shuffle. The sitemap must
    /// list strictly more than `count` locations.
    pub fn sample_urls_alive<R: Rng + ?Sized>(
        &self,
        session: &mut BrowserSession,
        sitemap: &SitemapDocument,
        count: usize,
        rng: &mut R,
    ) -> Verdict {
        let mut locations = sitemap.locations(false)?;
        if locations.len() <= count {
            return Err(CheckError::precondition(format!(
                "Sitemap {} only has {} children, minimum expected value was: {}",
                sitemap.uri(),
                locations.len(),
                count + 1
            )));
        }

        locations.shuffle(rng);
        for loc in locations.iter().take(count) {
            self.url_alive(session, sitemap, loc)?;
        }
        Ok(())
    }

    fn url_alive(&self, session: &mut BrowserSession, sitemap: &SitemapDocument, loc: &str) -> Verdict {
        let invalid = |detail: String| {
            format!(
                "Sitemap Url {} is not valid in Sitemap: {}. {}",
                loc,
                sitemap.uri(),
                detail
            )
        };

        match Url::parse(loc) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(CheckError::assertion(invalid(format!(
                    "Unsupported scheme: {}",
                    url.scheme()
                ))))
            }
            Err(e) => return Err(CheckError::assertion(invalid(format!("Exception: {}", e)))),
        }

        let probe = session
            .probe(loc)
            .map_err(|e| CheckError::transport(invalid(format!("Exception: {}", e)), e))?;
        debug!("sitemap url {} answered {}", loc, probe.status);
        ensure(probe.status == 200, || {
            invalid(format!("Response status code: {}", probe.status))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use seoprobe_common::{StaticResponse, StaticSite};

    const INDEX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://x.com/a.xml</loc></sitemap>
  <sitemap><loc>https://x.com/blog/a.xml</loc><lastmod>2024-01-01</lastmod></sitemap>
  <sitemap><loc>https://x.com/c.xml</loc></sitemap>
</sitemapindex>"#;

    const URLSET: &str = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://x.com/</loc></url>
  <url><loc>https://x.com/a</loc></url>
  <url><loc>https://x.com/b</loc></url>
</urlset>"#;

    fn multilingual(fr_links_back: bool) -> String {
        let back = if fr_links_back {
            r#"<xhtml:link rel="alternate" hreflang="en" href="https://x.com/en/"/>"#
        } else {
            ""
        };
        format!(
            r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9" xmlns:xhtml="http://www.w3.org/1999/xhtml">
  <url>
    <loc>https://x.com/en/</loc>
    <xhtml:link rel="alternate" hreflang="en" href="https://x.com/en/"/>
    <xhtml:link rel="alternate" hreflang="fr" href="https://x.com/fr/"/>
  </url>
  <url>
    <loc>https://x.com/fr/</loc>
    {}
    <xhtml:link rel="alternate" hreflang="fr" href="https://x.com/fr/"/>
  </url>
</urlset>"#,
            back
        )
    }

    fn live_site() -> StaticSite {
        StaticSite::new()
            .page("https://x.com/", StaticResponse::ok("home"))
            .page("https://x.com/a", StaticResponse::ok("a"))
            .page("https://x.com/b", StaticResponse::with_status(404, "gone"))
    }

    #[test]
    fn test_has_child_uses_suffix_match() {
        let index = SitemapDocument::parse("https://x.com/sitemap.xml", INDEX);
        assert!(index.has_child(true, "c.xml").is_ok());
        assert!(index.has_child(true, "b.xml").is_err());
        // two locations end with a.xml
        assert!(index.has_child(true, "a.xml").is_err());
        assert!(index.has_child(true, "blog/a.xml").is_ok());
        assert!(index.has_no_child(true, "b.xml").is_ok());
        assert!(index.has_child(false, "c.xml").is_err());
    }

    #[test]
    fn test_count_children() {
        assert_eq!(SitemapDocument::parse("u", URLSET).count_children().unwrap(), 3);
        assert_eq!(SitemapDocument::parse("u", INDEX).count_children().unwrap(), 3);
    }

    #[test]
    fn test_malformed_sitemap() {
        let sitemap = SitemapDocument::parse("https://x.com/sitemap.xml", "<urlset><url>");
        assert!(!sitemap.is_well_formed());

        let err = sitemap.validate_schema(SitemapProfile::UrlSet).unwrap_err();
        assert!(err.is_failure());
        assert!(err.to_string().contains("sitemap.xsd"));
        assert!(err.to_string().contains("https://x.com/sitemap.xml"));

        assert!(sitemap.count_children().unwrap_err().is_failure());
    }

    #[test]
    fn test_reciprocal_links() {
        let mutual = SitemapDocument::parse("https://x.com/sitemap.xml", &multilingual(true));
        assert!(mutual.validate_reciprocal_alternate_links().is_ok());
    }

    #[test]
    fn test_target_with_only_self_link_is_reciprocal() {
        let self_only = SitemapDocument::parse("https://x.com/sitemap.xml", &multilingual(false));
        assert!(self_only.validate_reciprocal_alternate_links().is_ok());
    }

    #[test]
    fn test_alternate_target_must_exist() {
        let xml = multilingual(true).replace("<loc>https://x.com/fr/</loc>", "<loc>https://x.com/fr/home</loc>");
        let sitemap = SitemapDocument::parse("https://x.com/sitemap.xml", &xml);
        let err = sitemap.validate_reciprocal_alternate_links().unwrap_err();
        assert!(err.to_string().contains("has not reciprocous URL for alternative link https://x.com/fr/"));
    }

    #[test]
    fn test_reciprocity_requires_multilingual_schema() {
        let xml = multilingual(true).replace("<loc>https://x.com/fr/</loc>", "<loc>https://x.com/fr/</loc><priority>2</priority>");
        let sitemap = SitemapDocument::parse("https://x.com/sitemap.xml", &xml);
        let err = sitemap.validate_reciprocal_alternate_links().unwrap_err();
        assert!(err.to_string().contains("sitemap_xhtml.xsd"));
    }

    #[test]
    fn test_all_urls_alive_stops_at_first_failure() {
        let mut session = BrowserSession::new(live_site(), "https://x.com").unwrap();
        let sitemap = SitemapDocument::parse("https://x.com/sitemap.xml", URLSET);
        let err = SitemapValidator::new().all_urls_alive(&mut session, &sitemap).unwrap_err();
        assert!(err.to_string().contains("https://x.com/b"));
        assert!(err.to_string().contains("Response status code: 404"));
    }

    #[test]
    fn test_sample_requires_more_entries_than_requested() {
        let mut session = BrowserSession::new(live_site(), "https://x.com").unwrap();
        let sitemap = SitemapDocument::parse("https://x.com/sitemap.xml", URLSET);
        let mut rng = StdRng::seed_from_u64(1);
        let validator = SitemapValidator::new();

        let err = validator
            .sample_urls_alive(&mut session, &sitemap, 3, &mut rng)
            .unwrap_err();
        assert!(err.is_precondition());

        // zero samples only checks the precondition
        assert!(validator.sample_urls_alive(&mut session, &sitemap, 0, &mut rng).is_ok());
    }

    #[test]
    fn test_invalid_location_is_reported() {
        let xml = URLSET.replace("https://x.com/a", "mailto:someone@x.com");
        let sitemap = SitemapDocument::parse("https://x.com/sitemap.xml", &xml);
        let mut session = BrowserSession::new(live_site(), "https://x.com").unwrap();
        let err = SitemapValidator::new().all_urls_alive(&mut session, &sitemap).unwrap_err();
        assert!(err.to_string().contains("mailto:someone@x.com is not valid"));
    }
}
