//! seoprobe Inspection Engine
//!
//! Judgments about a site's search-engine readiness and delivery
//! performance, evaluated against fetched pages, robots.txt and sitemaps.
//!
//! ```no_run
//! use seoprobe_common::ProbeConfig;
//! use seoprobe_inspect::{Inspector, VerificationContext};
//!
//! let config = ProbeConfig::default();
//! let mut ctx = VerificationContext::from_config(&config).unwrap();
//! let inspector = Inspector::new();
//! inspector.visit(&mut ctx, "/").unwrap();
//! inspector.page_is_indexable(&mut ctx).unwrap();
//! ```

pub mod cache;
pub mod context;
pub mod error;
pub mod inspector;
mod judgments;
pub mod minify;
pub mod query;
pub mod resource;
pub mod robots;
pub mod sitemap;

pub use cache::{CachePolicyVerifier, CacheViolation};
pub use context::VerificationContext;
pub use error::{CheckError, Verdict};
pub use inspector::Inspector;
pub use minify::{MinificationClass, MinificationVerifier};
pub use resource::{HostScope, ImageFormat, ResourceLocator, ResourceReference, ResourceType};
pub use robots::{CrawlerIdentity, RobotsEvaluator, RobotsTxt};
pub use sitemap::{SitemapDocument, SitemapProfile, SitemapValidator};
