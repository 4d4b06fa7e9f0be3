use tracing::{debug, info};

use crate::context::VerificationContext;
use crate::error::{ensure, CheckError, Verdict};
use crate::inspector::Inspector;
use crate::robots::CrawlerIdentity;

impl Inspector {
    /// Evaluate the following crawl judgments as `user_agent`
    pub fn act_as_crawler(&self, ctx: &mut VerificationContext, user_agent: &str) -> Verdict {
        if user_agent.trim().is_empty() {
            return Err(CheckError::precondition("crawler user agent must not be empty"));
        }
        ctx.set_crawler(CrawlerIdentity::new(user_agent.trim()));
        debug!("acting as crawler {}", ctx.crawler());
        Ok(())
    }

    /// robots.txt lets the current crawler fetch `resource`
    pub fn crawler_can(&self, ctx: &mut VerificationContext, resource: &str) -> Verdict {
        let crawler = ctx.crawler().clone();
        let allowed = self.robots.is_allowed(ctx.session_mut(), &crawler, resource);
        ensure(allowed, || {
            format!("Crawler with User-Agent {} is not allowed to crawl {}", crawler, resource)
        })
    }

    pub fn crawler_cannot(&self, ctx: &mut VerificationContext, resource: &str) -> Verdict {
        let crawler = ctx.crawler().clone();
        let allowed = self.robots.is_allowed(ctx.session_mut(), &crawler, resource);
        ensure(!allowed, || {
            format!("Crawler with User-Agent {} is allowed to crawl {}", crawler, resource)
        })
    }

    /// The single sitemap URL robots.txt declares
    pub fn declared_sitemap(&self, ctx: &mut VerificationContext) -> Result<String, CheckError> {
        let crawler = ctx.crawler().clone();
        let mut sitemaps = self.robots.list_sitemaps(ctx.session_mut());

        match sitemaps.len() {
            0 => Err(CheckError::assertion(format!(
                "Crawler with User-Agent {} can not find a sitemap url in robots file.",
                crawler
            ))),
            1 => Ok(sitemaps.remove(0)),
            _ => Err(CheckError::assertion(format!(
                "Crawler with User-Agent {} has found more than 1 sitemap url in robots file: {}",
                crawler,
                sitemaps.join(", ")
            ))),
        }
    }

    /// robots.txt declares exactly one sitemap and it answers 200
    pub fn sitemap_url_declared_and_live(&self, ctx: &mut VerificationContext) -> Verdict {
        let sitemap = self.declared_sitemap(ctx)?;
        let probe = ctx
            .session_mut()
            .probe(&sitemap)
            .map_err(|e| CheckError::transport(format!("Sitemap url {} is not valid. Exception: {}", sitemap, e), e))?;

        ensure(probe.status == 200, || {
            format!("Sitemap url {} is not valid. Response status code: {}", sitemap, probe.status)
        })?;
        info!("sitemap {} declared in robots.txt", sitemap);
        Ok(())
    }
}
