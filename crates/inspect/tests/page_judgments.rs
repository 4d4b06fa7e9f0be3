//! Page judgment tests
//!
//! Runs indexation, accessibility, crawl and performance judgments against a
//! synthetic site served from memory.

use seoprobe_common::{ProbeConfig, SamplingConfig, StaticResponse, StaticSite};
use seoprobe_inspect::{
    HostScope, ImageFormat, Inspector, MinificationClass, ResourceType, VerificationContext,
};

const HOME: &str = concat!(
    r#"<html><head><meta name="robots" content="index, follow"><style>h1{color:red}</style>"#,
    r#"<link rel="stylesheet" href="https://cdn.other.com/lib.css"></head><body>"#,
    r#"<img src="/img/a.png" alt="A"><img src="https://cdn.other.com/b.png" alt="B">"#,
    r#"<script src="/js/app.js" defer></script></body></html>"#
);

const ROBOTS: &str = "User-agent: *\nDisallow: /private\nAllow: /private/public\n\nSitemap: https://x.com/sitemap.xml\n";

/// Build the synthetic site
fn site() -> StaticSite {
    StaticSite::new()
        .page("https://x.com/", StaticResponse::ok(HOME))
        .page("https://x.com/robots.txt", StaticResponse::ok(ROBOTS))
        .page("https://x.com/sitemap.xml", StaticResponse::ok("<urlset/>"))
        .page(
            "https://x.com/img/a.png",
            StaticResponse::ok("png").header("Cache-Control", "public, max-age=3600"),
        )
        .page(
            "https://cdn.other.com/b.png",
            StaticResponse::ok("png").header("Cache-Control", "max-age=0"),
        )
        .page("https://x.com/js/app.js", StaticResponse::ok("function f(x){return x+1;}"))
        .page(
            "https://x.com/hidden",
            StaticResponse::ok(r#"<html><head><meta name="ROBOTS" content="NOINDEX, follow"></head></html>"#),
        )
        .page(
            "https://x.com/tagged",
            StaticResponse::ok("<html></html>").header("X-Robots-Tag", "noarchive, noindex"),
        )
        .page("https://x.com/private/x", StaticResponse::ok("<html></html>"))
        .page(
            "https://x.com/gallery",
            StaticResponse::ok(r#"<html><body><img src="/a.png" alt="ok"><img src="/b.png" alt=""></body></html>"#),
        )
        .page(
            "https://x.com/blocking",
            StaticResponse::ok(concat!(
                r#"<html><head><link rel="stylesheet" href="/css/site.css"></head>"#,
                r#"<body><script src="/js/app.js"></script></body></html>"#
            )),
        )
        .page("https://x.com/css/site.css", StaticResponse::ok("a { color: red; }"))
}

fn context() -> VerificationContext {
    let config = ProbeConfig {
        base_url: "https://x.com".to_string(),
        sampling: SamplingConfig { seed: Some(7) },
        ..ProbeConfig::default()
    };
    VerificationContext::with_fetcher(site(), &config).unwrap()
}

fn visited(path: &str) -> (Inspector, VerificationContext) {
    let inspector = Inspector::new();
    let mut ctx = context();
    inspector.visit(&mut ctx, path).unwrap();
    (inspector, ctx)
}

#[test]
fn test_page_judgments_need_a_visited_page() {
    let inspector = Inspector::new();
    let mut ctx = context();

    assert!(inspector.images_have_alt_text(&ctx).unwrap_err().is_precondition());
    // the inverse does not hide the usage error
    assert!(inspector.page_is_not_indexable(&mut ctx).unwrap_err().is_precondition());
}

#[test]
fn test_unreachable_page_is_a_failure() {
    let inspector = Inspector::new();
    let mut ctx = context();

    let err = inspector.visit(&mut ctx, "/missing").unwrap_err();
    assert!(err.is_failure());
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_home_page_is_indexable() {
    let (inspector, mut ctx) = visited("/");
    inspector.page_is_indexable(&mut ctx).unwrap();
    assert!(inspector.page_is_not_indexable(&mut ctx).unwrap_err().is_failure());
}

#[test]
fn test_meta_noindex_is_not_indexable() {
    let (inspector, mut ctx) = visited("/hidden");
    let err = inspector.page_is_indexable(&mut ctx).unwrap_err();
    assert!(err.to_string().contains("excluded from indexing"));
    inspector.page_is_not_indexable(&mut ctx).unwrap();
}

#[test]
fn test_x_robots_tag_noindex_is_not_indexable() {
    let (inspector, mut ctx) = visited("/tagged");
    let err = inspector.page_is_indexable(&mut ctx).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Url https://x.com/tagged should not send X-Robots-Tag HTTP header with noindex value: noarchive, noindex"
    );
}

#[test]
fn test_disallowed_page_is_not_indexable() {
    let (inspector, mut ctx) = visited("/private/x");
    let err = inspector.page_is_indexable(&mut ctx).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Crawler with User-Agent Googlebot is not allowed to crawl https://x.com/private/x"
    );
}

#[test]
fn test_crawler_longest_match() {
    let inspector = Inspector::new();
    let mut ctx = context();

    inspector.crawler_can(&mut ctx, "/private/public/page").unwrap();
    inspector.crawler_cannot(&mut ctx, "/private/x").unwrap();
    assert!(inspector.crawler_can(&mut ctx, "/private/x").is_err());
}

#[test]
fn test_act_as_crawler() {
    let inspector = Inspector::new();
    let mut ctx = context();

    inspector.act_as_crawler(&mut ctx, "Bingbot/2.0").unwrap();
    assert_eq!(ctx.crawler().user_agent(), "Bingbot/2.0");
    assert!(inspector.act_as_crawler(&mut ctx, "  ").unwrap_err().is_precondition());
}

#[test]
fn test_declared_sitemap_is_live() {
    let inspector = Inspector::new();
    let mut ctx = context();

    assert_eq!(inspector.declared_sitemap(&mut ctx).unwrap(), "https://x.com/sitemap.xml");
    inspector.sitemap_url_declared_and_live(&mut ctx).unwrap();
}

#[test]
fn test_missing_alt_text() {
    let (inspector, ctx) = visited("/gallery");
    let err = inspector.images_have_alt_text(&ctx).unwrap_err();
    assert!(err.to_string().starts_with("Alt Text is empty for image: <img"));

    let (inspector, ctx) = visited("/");
    inspector.images_have_alt_text(&ctx).unwrap();
}

#[test]
fn test_render_blocking_resources() {
    let (inspector, ctx) = visited("/");
    inspector.stylesheets_load_deferred(&ctx).unwrap();
    inspector.scripts_load_async_or_deferred(&ctx).unwrap();
    inspector.critical_css_in_head(&ctx).unwrap();
    assert!(inspector.critical_css_not_in_head(&ctx).is_err());

    let (inspector, ctx) = visited("/blocking");
    assert_eq!(
        inspector.stylesheets_load_deferred(&ctx).unwrap_err().to_string(),
        "Some self hosted css files are loading in head in https://x.com/blocking"
    );
    assert_eq!(
        inspector.scripts_load_async_or_deferred(&ctx).unwrap_err().to_string(),
        "Javascript file /js/app.js is render blocking in https://x.com/blocking"
    );
    inspector.scripts_do_not_load_async_or_deferred(&ctx).unwrap();
    inspector.critical_css_not_in_head(&ctx).unwrap();
}

#[test]
fn test_minified_resources() {
    let (inspector, mut ctx) = visited("/");
    inspector.resource_is_minified(&mut ctx, MinificationClass::Html).unwrap();
    inspector.resource_is_minified(&mut ctx, MinificationClass::Script).unwrap();
    // the probes leave the page under test in place
    assert_eq!(ctx.session().current_url(), Some("https://x.com/"));

    let (inspector, mut ctx) = visited("/blocking");
    let err = inspector.resource_is_minified(&mut ctx, MinificationClass::Css).unwrap_err();
    assert!(err.to_string().starts_with("css resource https://x.com/css/site.css is not minified"));
    inspector.resource_is_not_minified(&mut ctx, MinificationClass::Css).unwrap();
}

#[test]
fn test_browser_cache() {
    let png = ResourceType::Image(ImageFormat::Png);
    let (inspector, mut ctx) = visited("/");

    inspector.browser_cache_enabled_for(&mut ctx, &HostScope::SelfHosted, png).unwrap();

    let err = inspector
        .browser_cache_enabled_for(&mut ctx, &HostScope::External, png)
        .unwrap_err();
    assert!(err.to_string().contains("max-age=0"));
    inspector.browser_cache_disabled_for(&mut ctx, &HostScope::External, png).unwrap();

    let err = inspector
        .browser_cache_enabled_for(&mut ctx, &HostScope::SelfHosted, ResourceType::Image(ImageFormat::Gif))
        .unwrap_err();
    assert_eq!(err.to_string(), "There are no internal gif resources in https://x.com/.");

    let err = inspector
        .browser_cache_enabled_for(&mut ctx, &HostScope::Any, ResourceType::InlineStylesheetInHead)
        .unwrap_err();
    assert!(err.is_precondition());
}
