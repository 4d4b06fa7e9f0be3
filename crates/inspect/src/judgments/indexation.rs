use scraper::Html;
use tracing::info;

use crate::context::VerificationContext;
use crate::error::{ensure, inverse, Verdict};
use crate::inspector::Inspector;
use crate::query::{Predicate, Query};

impl Inspector {
    /// No `noindex` meta directive, crawlable by robots.txt, and no
    /// `X-Robots-Tag: noindex` response header
    pub fn page_is_indexable(&self, ctx: &mut VerificationContext) -> Verdict {
        let page = Self::current_page(ctx)?;
        let url = page.url.clone();
        let robots_header = page.headers.joined("x-robots-tag");

        self.page_is_not_noindex(ctx)?;
        self.crawler_can(ctx, &url)?;

        if let Some(tag) = robots_header {
            ensure(!tag.to_ascii_lowercase().contains("noindex"), || {
                format!(
                    "Url {} should not send X-Robots-Tag HTTP header with noindex value: {}",
                    url, tag
                )
            })?;
        }
        info!("{} is indexable", url);
        Ok(())
    }

    pub fn page_is_not_indexable(&self, ctx: &mut VerificationContext) -> Verdict {
        inverse(self.page_is_indexable(ctx), "The page is indexable.")
    }

    /// No `<meta name="robots">` (or crawler-specific meta) containing
    /// `noindex` or `none`
    pub fn page_is_not_noindex(&self, ctx: &VerificationContext) -> Verdict {
        let page = Self::current_page(ctx)?;
        let document = Html::parse_document(&page.body);
        let crawler = ctx.crawler().product_token();
        let query = Query::tag("meta").filter(
            Predicate::attr_eq_ignore_case("name", "robots").or(Predicate::attr_eq_ignore_case("name", crawler)),
        );

        for meta in query.select(&document) {
            let content = meta.value().attr("content").unwrap_or_default().to_ascii_lowercase();
            let excluded = content
                .split(',')
                .map(str::trim)
                .any(|directive| directive == "noindex" || directive == "none");
            ensure(!excluded, || {
                format!("Url {} is excluded from indexing by {}", page.url, meta.html())
            })?;
        }
        Ok(())
    }
}
