//! Robots Commands

use clap::Subcommand;
use seoprobe_inspect::{Inspector, VerificationContext};

use crate::output::JudgmentReport;

#[derive(Subcommand)]
pub enum RobotsCommands {
    /// robots.txt lets the crawler fetch a path
    Allowed {
        /// Path or URL to evaluate
        path: String,

        /// Expect the path to be disallowed
        #[arg(long)]
        not: bool,
    },

    /// robots.txt declares exactly one sitemap and it is reachable
    Sitemap,
}

pub fn execute(cmd: RobotsCommands, inspector: &Inspector, ctx: &mut VerificationContext) -> Vec<JudgmentReport> {
    let robots_url = format!("{}/robots.txt", ctx.session().base_origin());

    let report = match cmd {
        RobotsCommands::Allowed { path, not: false } => {
            JudgmentReport::new(format!("{} allowed", ctx.crawler()), &path, inspector.crawler_can(ctx, &path))
        }
        RobotsCommands::Allowed { path, not: true } => JudgmentReport::new(
            format!("{} disallowed", ctx.crawler()),
            &path,
            inspector.crawler_cannot(ctx, &path),
        ),
        RobotsCommands::Sitemap => JudgmentReport::new(
            "sitemap declared",
            robots_url,
            inspector.sitemap_url_declared_and_live(ctx),
        ),
    };
    vec![report]
}
