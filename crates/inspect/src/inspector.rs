//! The inspector: owns the five components and exposes the judgments

use seoprobe_common::FetchedDocument;
use tracing::info;

use crate::cache::CachePolicyVerifier;
use crate::context::VerificationContext;
use crate::error::{CheckError, Verdict};
use crate::minify::MinificationVerifier;
use crate::resource::{HostScope, ResourceLocator, ResourceReference, ResourceType};
use crate::robots::RobotsEvaluator;
use crate::sitemap::SitemapValidator;

/// Runs judgments against a [`VerificationContext`].
///
/// Judgments are grouped by concern in the `judgments` modules; each returns
/// a [`Verdict`] naming the page, resource or document it failed on.
#[derive(Debug, Clone, Default)]
pub struct Inspector {
    pub(crate) locator: ResourceLocator,
    pub(crate) minification: MinificationVerifier,
    pub(crate) cache: CachePolicyVerifier,
    pub(crate) robots: RobotsEvaluator,
    pub(crate) sitemaps: SitemapValidator,
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Navigate to `url`, making it the page under test
    pub fn visit(&self, ctx: &mut VerificationContext, url: &str) -> Verdict {
        let doc = ctx
            .session_mut()
            .visit(url)
            .map_err(|e| CheckError::transport(format!("Could not open page {}", url), e))?;
        info!("page under test: {} ({})", doc.url, doc.status);
        Ok(())
    }

    pub(crate) fn current_page(ctx: &VerificationContext) -> Result<&FetchedDocument, CheckError> {
        ctx.session()
            .require_current()
            .map_err(|_| CheckError::precondition("a page must be visited before running page judgments"))
    }

    /// Resources of the current page, with the page URL for diagnostics
    pub(crate) fn locate(
        &self,
        ctx: &VerificationContext,
        resource_type: ResourceType,
        scope: &HostScope,
    ) -> Result<(String, Vec<ResourceReference>), CheckError> {
        let page = Self::current_page(ctx)?;
        let origin = ctx.session().base_origin();
        let found = self.locator.locate(&page.body, resource_type, scope, &origin);
        Ok((page.url.clone(), found))
    }
}
