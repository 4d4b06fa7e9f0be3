use tracing::{debug, info};

use crate::context::VerificationContext;
use crate::error::{ensure, inverse, CheckError, Verdict};
use crate::inspector::Inspector;
use crate::minify::MinificationClass;
use crate::resource::{HostScope, ResourceType};

impl Inspector {
    /// No self-hosted stylesheet is linked from `<head>`
    pub fn stylesheets_load_deferred(&self, ctx: &VerificationContext) -> Verdict {
        let (page, linked) = self.locate(ctx, ResourceType::LinkedStylesheetInHead, &HostScope::SelfHosted)?;
        for reference in &linked {
            debug!("render blocking stylesheet: {}", reference.html);
        }
        ensure(linked.is_empty(), || {
            format!("Some self hosted css files are loading in head in {}", page)
        })
    }

    /// At least one inline `<style>` in `<head>`
    pub fn critical_css_in_head(&self, ctx: &VerificationContext) -> Verdict {
        let (page, inline) = self.locate(ctx, ResourceType::InlineStylesheetInHead, &HostScope::Any)?;
        ensure(!inline.is_empty(), || format!("No inline css is loading in head in {}", page))
    }

    pub fn critical_css_not_in_head(&self, ctx: &VerificationContext) -> Verdict {
        inverse(self.critical_css_in_head(ctx), "Critical CSS exist in head.")
    }

    /// Every self-hosted script is `async` or `defer`
    pub fn scripts_load_async_or_deferred(&self, ctx: &VerificationContext) -> Verdict {
        let (page, scripts) = self.locate(ctx, ResourceType::Script, &HostScope::SelfHosted)?;
        for script in &scripts {
            ensure(script.loads_non_blocking(), || {
                format!(
                    "Javascript file {} is render blocking in {}",
                    script.url.as_deref().unwrap_or(&script.html),
                    page
                )
            })?;
        }
        Ok(())
    }

    pub fn scripts_do_not_load_async_or_deferred(&self, ctx: &VerificationContext) -> Verdict {
        inverse(self.scripts_load_async_or_deferred(ctx), "All JS files load async.")
    }

    /// HTML judges the current page; CSS and JS judge every self-hosted
    /// stylesheet or script it references
    pub fn resource_is_minified(&self, ctx: &mut VerificationContext, class: MinificationClass) -> Verdict {
        let resource_type = match class {
            MinificationClass::Html => {
                let page = Self::current_page(ctx)?;
                return self.minification.verify(&page.body, class, &page.url);
            }
            MinificationClass::Css => ResourceType::Stylesheet,
            MinificationClass::Script => ResourceType::Script,
        };

        let (page, references) = self.locate(ctx, resource_type, &HostScope::SelfHosted)?;
        info!("checking {} self hosted {} file(s) of {}", references.len(), class, page);

        for url in references.iter().filter_map(|r| r.url.as_deref()) {
            let probe = ctx
                .session_mut()
                .probe(url)
                .map_err(|e| CheckError::transport(format!("Could not load {} resource {}", class, url), e))?;
            self.minification.verify(&probe.body, class, &probe.url)?;
        }
        Ok(())
    }

    pub fn resource_is_not_minified(&self, ctx: &mut VerificationContext, class: MinificationClass) -> Verdict {
        let message = match class {
            MinificationClass::Html => "HTML should not be minified.".to_string(),
            other => format!("{} should not be minified.", other.name().to_ascii_uppercase()),
        };
        inverse(self.resource_is_minified(ctx, class), message)
    }

    /// A randomly chosen `resource_type` resource within `scope` is served
    /// with a cache-enabling `Cache-Control` header
    pub fn browser_cache_enabled_for(
        &self,
        ctx: &mut VerificationContext,
        scope: &HostScope,
        resource_type: ResourceType,
    ) -> Verdict {
        if resource_type.locator_attribute().is_none() {
            return Err(CheckError::precondition(format!(
                "{} resources are inline and have no cache policy",
                resource_type
            )));
        }

        let (page, references) = self.locate(ctx, resource_type, scope)?;
        ensure(!references.is_empty(), || {
            format!("There are no {} {} resources in {}.", scope, resource_type, page)
        })?;

        let chosen = self
            .cache
            .sample(&references, ctx.rng())
            .and_then(|r| r.url.clone())
            .ok_or_else(|| CheckError::assertion(format!("No {} resource url found in {}", resource_type, page)))?;
        debug!("sampled {} resource {}", resource_type, chosen);

        match self.cache.inspect(ctx.session_mut(), &chosen)? {
            Some(violation) => Err(CheckError::assertion(format!(
                "{} ({})",
                violation.describe(&format!("{} resources", resource_type)),
                chosen
            ))),
            None => Ok(()),
        }
    }

    pub fn browser_cache_disabled_for(
        &self,
        ctx: &mut VerificationContext,
        scope: &HostScope,
        resource_type: ResourceType,
    ) -> Verdict {
        inverse(
            self.browser_cache_enabled_for(ctx, scope, resource_type),
            format!("Browser cache is enabled for {} resources.", resource_type),
        )
    }
}
