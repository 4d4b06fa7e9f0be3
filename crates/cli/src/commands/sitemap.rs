//! Sitemap Commands

use clap::{Args, Subcommand};
use seoprobe_inspect::{Inspector, SitemapProfile, VerificationContext};

use super::parse_arg;
use crate::output::JudgmentReport;

#[derive(Args)]
pub struct SitemapArgs {
    /// Sitemap URL, absolute or relative to the base URL
    pub url: String,

    #[command(subcommand)]
    pub check: SitemapCommands,
}

#[derive(Subcommand)]
pub enum SitemapCommands {
    /// The sitemap validates against a sitemap schema
    Valid {
        /// urlset, index or multilanguage
        #[arg(long, default_value = "urlset")]
        profile: String,

        /// Expect validation to fail
        #[arg(long)]
        not: bool,
    },

    /// Exactly one child location ends with the given URL
    HasChild {
        child: String,

        /// Look at sitemapindex/sitemap entries instead of urlset/url
        #[arg(long)]
        index: bool,

        /// Expect no child location to end with the URL
        #[arg(long)]
        not: bool,
    },

    /// The sitemap lists exactly this many child locations
    Count { expected: usize },

    /// Every listed URL answers 200
    Alive,

    /// A random sample of listed URLs answer 200
    Sample { count: usize },

    /// Alternate links of a multilingual sitemap are reciprocal
    Reciprocal {
        /// Expect the check to fail
        #[arg(long)]
        not: bool,
    },
}

pub fn execute(args: SitemapArgs, inspector: &Inspector, ctx: &mut VerificationContext) -> Vec<JudgmentReport> {
    let url = args.url;
    if let Err(e) = inspector.load_sitemap(ctx, &url) {
        return vec![JudgmentReport::new("load", url, Err(e))];
    }

    let report = match args.check {
        SitemapCommands::Valid { profile, not } => {
            let profile: SitemapProfile = match parse_arg("valid", &url, &profile) {
                Ok(profile) => profile,
                Err(report) => return vec![report],
            };
            if not {
                JudgmentReport::new(
                    format!("not valid {}", profile),
                    &url,
                    inspector.sitemap_is_not_valid(ctx, profile),
                )
            } else {
                JudgmentReport::new(format!("valid {}", profile), &url, inspector.sitemap_is_valid(ctx, profile))
            }
        }
        SitemapCommands::HasChild { child, index, not } => {
            let judgment = if not { "has no child" } else { "has child" };
            let verdict = if not {
                inspector.sitemap_has_no_child(ctx, index, &child)
            } else {
                inspector.sitemap_has_child(ctx, index, &child)
            };
            JudgmentReport::new(format!("{} {}", judgment, child), &url, verdict)
        }
        SitemapCommands::Count { expected } => JudgmentReport::new(
            format!("{} children", expected),
            &url,
            inspector.sitemap_child_count(ctx, expected),
        ),
        SitemapCommands::Alive => JudgmentReport::new("urls alive", &url, inspector.sitemap_urls_alive(ctx)),
        SitemapCommands::Sample { count } => JudgmentReport::new(
            format!("{} sampled urls alive", count),
            &url,
            inspector.sitemap_sample_urls_alive(ctx, count),
        ),
        SitemapCommands::Reciprocal { not: false } => JudgmentReport::new(
            "reciprocal alternates",
            &url,
            inspector.sitemap_alternates_reciprocal(ctx),
        ),
        SitemapCommands::Reciprocal { not: true } => JudgmentReport::new(
            "non-reciprocal alternates",
            &url,
            inspector.sitemap_alternates_not_reciprocal(ctx),
        ),
    };
    vec![report]
}
