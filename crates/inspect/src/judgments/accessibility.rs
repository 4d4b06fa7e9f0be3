use scraper::Html;

use crate::context::VerificationContext;
use crate::error::{ensure, Verdict};
use crate::inspector::Inspector;
use crate::query::Query;

impl Inspector {
    /// Every image carries a non-empty `alt` attribute
    pub fn images_have_alt_text(&self, ctx: &VerificationContext) -> Verdict {
        let page = Self::current_page(ctx)?;
        let document = Html::parse_document(&page.body);

        for image in Query::tag("img").select(&document) {
            let alt = image.value().attr("alt").unwrap_or_default();
            ensure(!alt.is_empty(), || format!("Alt Text is empty for image: {}", image.html()))?;
        }
        Ok(())
    }
}
