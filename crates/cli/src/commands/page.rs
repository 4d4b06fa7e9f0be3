//! Page Commands

use clap::Subcommand;
use seoprobe_inspect::{HostScope, Inspector, MinificationClass, ResourceType, VerificationContext};

use super::parse_arg;
use crate::output::JudgmentReport;

#[derive(Subcommand)]
pub enum PageCommands {
    /// The page can be indexed by search engines
    Indexable {
        /// Page URL, absolute or relative to the base URL
        url: String,
    },

    /// The page is excluded from indexing
    NotIndexable { url: String },

    /// Every image has alternative text
    AltText { url: String },

    /// No self-hosted stylesheet is linked from <head>
    CssDeferred { url: String },

    /// Critical CSS is inlined in <head>
    CriticalCss {
        url: String,

        /// Expect no inline CSS in <head>
        #[arg(long)]
        absent: bool,
    },

    /// Self-hosted scripts load async or deferred
    ScriptsAsync {
        url: String,

        /// Expect at least one render blocking script
        #[arg(long)]
        blocking: bool,
    },

    /// The page (html) or its self-hosted stylesheets or scripts are minified
    Minified {
        url: String,

        /// Content class: html, css or js
        #[arg(long, default_value = "html")]
        kind: String,

        /// Expect the content not to be minified
        #[arg(long)]
        not: bool,
    },

    /// A random resource of a type is served with browser caching enabled
    Cache {
        url: String,

        /// internal, external or an explicit host
        #[arg(long, default_value = "internal")]
        host: String,

        /// Resource type: png, jpeg, gif, ico, css, css-link-head or js
        #[arg(long = "type")]
        resource_type: String,

        /// Expect browser caching to be disabled
        #[arg(long)]
        disabled: bool,
    },
}

impl PageCommands {
    fn url(&self) -> &str {
        match self {
            PageCommands::Indexable { url }
            | PageCommands::NotIndexable { url }
            | PageCommands::AltText { url }
            | PageCommands::CssDeferred { url }
            | PageCommands::CriticalCss { url, .. }
            | PageCommands::ScriptsAsync { url, .. }
            | PageCommands::Minified { url, .. }
            | PageCommands::Cache { url, .. } => url,
        }
    }
}

pub fn execute(cmd: PageCommands, inspector: &Inspector, ctx: &mut VerificationContext) -> Vec<JudgmentReport> {
    let url = cmd.url().to_string();
    if let Err(e) = inspector.visit(ctx, &url) {
        return vec![JudgmentReport::new("visit", url, Err(e))];
    }

    let report = match cmd {
        PageCommands::Indexable { .. } => {
            JudgmentReport::new("indexable", &url, inspector.page_is_indexable(ctx))
        }
        PageCommands::NotIndexable { .. } => {
            JudgmentReport::new("not-indexable", &url, inspector.page_is_not_indexable(ctx))
        }
        PageCommands::AltText { .. } => {
            JudgmentReport::new("alt-text", &url, inspector.images_have_alt_text(ctx))
        }
        PageCommands::CssDeferred { .. } => {
            JudgmentReport::new("css-deferred", &url, inspector.stylesheets_load_deferred(ctx))
        }
        PageCommands::CriticalCss { absent: false, .. } => {
            JudgmentReport::new("critical-css", &url, inspector.critical_css_in_head(ctx))
        }
        PageCommands::CriticalCss { absent: true, .. } => {
            JudgmentReport::new("no-critical-css", &url, inspector.critical_css_not_in_head(ctx))
        }
        PageCommands::ScriptsAsync { blocking: false, .. } => {
            JudgmentReport::new("scripts-async", &url, inspector.scripts_load_async_or_deferred(ctx))
        }
        PageCommands::ScriptsAsync { blocking: true, .. } => JudgmentReport::new(
            "scripts-blocking",
            &url,
            inspector.scripts_do_not_load_async_or_deferred(ctx),
        ),
        PageCommands::Minified { kind, not, .. } => {
            let class: MinificationClass = match parse_arg("minified", &url, &kind) {
                Ok(class) => class,
                Err(report) => return vec![report],
            };
            if not {
                JudgmentReport::new(
                    format!("{}-not-minified", class),
                    &url,
                    inspector.resource_is_not_minified(ctx, class),
                )
            } else {
                JudgmentReport::new(format!("{}-minified", class), &url, inspector.resource_is_minified(ctx, class))
            }
        }
        PageCommands::Cache {
            host,
            resource_type,
            disabled,
            ..
        } => {
            let resource_type: ResourceType = match parse_arg("cache", &url, &resource_type) {
                Ok(resource_type) => resource_type,
                Err(report) => return vec![report],
            };
            let scope = HostScope::parse(&host);
            let judgment = format!("{} {} cache", scope, resource_type);
            if disabled {
                JudgmentReport::new(
                    format!("{} disabled", judgment),
                    &url,
                    inspector.browser_cache_disabled_for(ctx, &scope, resource_type),
                )
            } else {
                JudgmentReport::new(
                    format!("{} enabled", judgment),
                    &url,
                    inspector.browser_cache_enabled_for(ctx, &scope, resource_type),
                )
            }
        }
    };
    vec![report]
}
