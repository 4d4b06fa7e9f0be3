use tracing::info;

use crate::context::VerificationContext;
use crate::error::{ensure, inverse, Verdict};
use crate::inspector::Inspector;
use crate::sitemap::SitemapProfile;

impl Inspector {
    /// Load the sitemap at `url` as the sitemap under test
    pub fn load_sitemap(&self, ctx: &mut VerificationContext, url: &str) -> Verdict {
        let sitemap = self.sitemaps.load(ctx.session_mut(), url)?;
        ctx.set_sitemap(sitemap);
        Ok(())
    }

    pub fn sitemap_is_valid(&self, ctx: &VerificationContext, profile: SitemapProfile) -> Verdict {
        let sitemap = ctx.sitemap()?;
        sitemap.validate_schema(profile)?;
        info!("sitemap {} is a valid {} sitemap", sitemap.uri(), profile);
        Ok(())
    }

    pub fn sitemap_is_not_valid(&self, ctx: &VerificationContext, profile: SitemapProfile) -> Verdict {
        inverse(
            self.sitemap_is_valid(ctx, profile),
            format!("The sitemap is a valid {} sitemap.", profile),
        )
    }

    /// Exactly one `loc` ends with `url`; `in_index` selects
    /// `sitemapindex/sitemap` instead of `urlset/url`
    pub fn sitemap_has_child(&self, ctx: &VerificationContext, in_index: bool, url: &str) -> Verdict {
        ctx.sitemap()?.has_child(in_index, url)
    }

    pub fn sitemap_has_no_child(&self, ctx: &VerificationContext, in_index: bool, url: &str) -> Verdict {
        ctx.sitemap()?.has_no_child(in_index, url)
    }

    pub fn sitemap_child_count(&self, ctx: &VerificationContext, expected: usize) -> Verdict {
        let sitemap = ctx.sitemap()?;
        let found = sitemap.count_children()?;
        ensure(found == expected, || {
            format!(
                "Sitemap {} has {} children, expected value was: {}",
                sitemap.uri(),
                found,
                expected
            )
        })
    }

    pub fn sitemap_urls_alive(&self, ctx: &mut VerificationContext) -> Verdict {
        let (sitemap, session, _) = ctx.sitemap_and_session()?;
        self.sitemaps.all_urls_alive(session, sitemap)
    }

    pub fn sitemap_sample_urls_alive(&self, ctx: &mut VerificationContext, count: usize) -> Verdict {
        let (sitemap, session, rng) = ctx.sitemap_and_session()?;
        self.sitemaps.sample_urls_alive(session, sitemap, count, rng)
    }

    pub fn sitemap_alternates_reciprocal(&self, ctx: &VerificationContext) -> Verdict {
        ctx.sitemap()?.validate_reciprocal_alternate_links()
    }

    pub fn sitemap_alternates_not_reciprocal(&self, ctx: &VerificationContext) -> Verdict {
        inverse(
            self.sitemap_alternates_reciprocal(ctx),
            "The multilanguage sitemap passes Google validation.",
        )
    }
}
