//! Judgments, grouped by concern. Each module adds methods to
//! [`Inspector`](crate::Inspector).

mod accessibility;
mod crawl;
mod indexation;
mod performance;
mod sitemap;
