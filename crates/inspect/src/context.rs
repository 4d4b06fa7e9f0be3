//! Verification context: the state one verification session carries
//! between judgments

use rand::rngs::StdRng;
use rand::SeedableRng;
use seoprobe_common::{BrowserSession, Fetcher, HttpFetcher, ProbeConfig};
use tracing::debug;

use crate::error::CheckError;
use crate::robots::CrawlerIdentity;
use crate::sitemap::SitemapDocument;

/// Session state passed into every judgment.
///
/// Created when a verification session starts and dropped when it ends.
pub struct VerificationContext {
    session: BrowserSession,
    crawler: CrawlerIdentity,
    sitemap: Option<SitemapDocument>,
    rng: StdRng,
}

impl VerificationContext {
    pub fn new(session: BrowserSession, crawler: CrawlerIdentity, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => {
                debug!("sampling seeded with {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };

        Self {
            session,
            crawler,
            sitemap: None,
            rng,
        }
    }

    /// Context over `fetcher` configured from `config`
    pub fn with_fetcher(fetcher: impl Fetcher + 'static, config: &ProbeConfig) -> seoprobe_common::Result<Self> {
        let session = BrowserSession::new(fetcher, &config.base_url)?;
        Ok(Self::new(
            session,
            CrawlerIdentity::new(config.crawler.clone()),
            config.sampling.seed,
        ))
    }

    /// Context fetching over HTTP as configured
    pub fn from_config(config: &ProbeConfig) -> seoprobe_common::Result<Self> {
        Self::with_fetcher(HttpFetcher::new(&config.http)?, config)
    }

    pub fn session(&self) -> &BrowserSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut BrowserSession {
        &mut self.session
    }

    pub fn crawler(&self) -> &CrawlerIdentity {
        &self.crawler
    }

    pub fn set_crawler(&mut self, crawler: CrawlerIdentity) {
        self.crawler = crawler;
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn set_sitemap(&mut self, sitemap: SitemapDocument) {
        self.sitemap = Some(sitemap);
    }

    /// The loaded sitemap; using one before loading it is a usage error
    pub fn sitemap(&self) -> Result<&SitemapDocument, CheckError> {
        self.sitemap.as_ref().ok_or_else(|| {
            CheckError::precondition("a sitemap must be loaded before running sitemap judgments")
        })
    }

    /// Split borrow for judgments that probe URLs of the loaded sitemap
    pub fn sitemap_and_session(&mut self) -> Result<(&SitemapDocument, &mut BrowserSession, &mut StdRng), CheckError> {
        match self.sitemap.as_ref() {
            Some(sitemap) => Ok((sitemap, &mut self.session, &mut self.rng)),
            None => Err(CheckError::precondition(
                "a sitemap must be loaded before running sitemap judgments",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use seoprobe_common::StaticSite;

    fn context(seed: Option<u64>) -> VerificationContext {
        let config = ProbeConfig {
            base_url: "https://x.com".to_string(),
            sampling: seoprobe_common::SamplingConfig { seed },
            ..ProbeConfig::default()
        };
        VerificationContext::with_fetcher(StaticSite::new(), &config).unwrap()
    }

    #[test]
    fn test_sitemap_before_load_is_precondition() {
        let mut ctx = context(None);
        assert!(ctx.sitemap().unwrap_err().is_precondition());
        assert!(ctx.sitemap_and_session().is_err());

        ctx.set_sitemap(SitemapDocument::parse("https://x.com/sitemap.xml", "<urlset/>"));
        assert_eq!(ctx.sitemap().unwrap().uri(), "https://x.com/sitemap.xml");
    }

    #[test]
    fn test_seed_makes_sampling_reproducible() {
        let a: Vec<u32> = (0..4).map(|_| context(Some(9)).rng().gen()).collect();
        let b: Vec<u32> = (0..4).map(|_| context(Some(9)).rng().gen()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_default_crawler() {
        assert_eq!(context(None).crawler().user_agent(), "Googlebot");
    }
}
