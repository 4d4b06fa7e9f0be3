//! seoprobe CLI - Main Entry Point
//!
//! Runs SEO and delivery-performance judgments against a live site and
//! reports each outcome.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use seoprobe_common::ProbeConfig;
use seoprobe_inspect::{Inspector, VerificationContext};
use tracing::debug;

mod commands;
mod output;

use commands::{page, robots, schema, sitemap};
use output::{JudgmentReport, Outcome};

/// seoprobe - Declarative SEO and delivery-performance checks
#[derive(Parser)]
#[command(name = "seoprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, env = "SEOPROBE_CONFIG", default_value = "seoprobe.toml", global = true)]
    config: PathBuf,

    /// Site under test; overrides the configuration file
    #[arg(long, env = "SEOPROBE_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Crawler user agent for robots.txt evaluation
    #[arg(long, global = true)]
    crawler: Option<String>,

    /// Seed for reproducible random sampling
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Judge a page
    #[command(subcommand)]
    Page(page::PageCommands),

    /// Judge robots.txt rules
    #[command(subcommand)]
    Robots(robots::RobotsCommands),

    /// Judge a sitemap
    Sitemap(sitemap::SitemapArgs),

    /// Print a bundled sitemap schema
    Schema(schema::SchemaArgs),

    /// Show version information
    Version,
}

impl Cli {
    /// File configuration with command line overrides applied
    fn probe_config(&self) -> anyhow::Result<ProbeConfig> {
        let mut config = ProbeConfig::load(&self.config)
            .with_context(|| format!("failed to load {}", self.config.display()))?;

        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(crawler) = &self.crawler {
            config.crawler = crawler.clone();
        }
        if let Some(seed) = self.seed {
            config.sampling.seed = Some(seed);
        }
        if let Some(timeout) = self.timeout {
            config.http.timeout_secs = timeout;
        }
        Ok(config)
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// 0 when every judgment held, 2 on any precondition error, 1 otherwise
fn exit_status(reports: &[JudgmentReport]) -> u8 {
    if reports.iter().any(|r| r.outcome == Outcome::Precondition) {
        2
    } else if reports.iter().any(|r| r.outcome == Outcome::Failed) {
        1
    } else {
        0
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let format = cli.format;
    let config = cli.probe_config()?;
    debug!("probing {} as {}", config.base_url, config.crawler);

    let ctx = || {
        VerificationContext::from_config(&config)
            .with_context(|| format!("cannot start a session on {}", config.base_url))
    };
    let inspector = Inspector::new();

    let reports = match cli.command {
        Commands::Page(cmd) => page::execute(cmd, &inspector, &mut ctx()?),
        Commands::Robots(cmd) => robots::execute(cmd, &inspector, &mut ctx()?),
        Commands::Sitemap(args) => sitemap::execute(args, &inspector, &mut ctx()?),
        Commands::Schema(args) => {
            schema::execute(args)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Version => {
            println!("seoprobe CLI v{}", seoprobe_common::VERSION);
            println!("Declarative SEO and delivery-performance verification");
            return Ok(ExitCode::SUCCESS);
        }
    };

    output::print_list(&reports, format);
    Ok(ExitCode::from(exit_status(&reports)))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use seoprobe_inspect::CheckError;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config_file() {
        let cli = Cli::parse_from([
            "seoprobe",
            "--config",
            "/nonexistent/seoprobe.toml",
            "--base-url",
            "https://x.com",
            "--seed",
            "5",
            "--timeout",
            "3",
            "robots",
            "sitemap",
        ]);
        let config = cli.probe_config().unwrap();
        assert_eq!(config.base_url, "https://x.com");
        assert_eq!(config.crawler, "Googlebot");
        assert_eq!(config.sampling.seed, Some(5));
        assert_eq!(config.http.timeout_secs, 3);
    }

    #[test]
    fn test_page_cache_arguments() {
        let cli = Cli::parse_from([
            "seoprobe", "page", "cache", "/", "--host", "external", "--type", "png", "--disabled",
        ]);
        match cli.command {
            Commands::Page(page::PageCommands::Cache {
                host,
                resource_type,
                disabled,
                ..
            }) => {
                assert_eq!(host, "external");
                assert_eq!(resource_type, "png");
                assert!(disabled);
            }
            _ => panic!("expected page cache"),
        }
    }

    #[test]
    fn test_exit_codes() {
        let passed = JudgmentReport::new("a", "/", Ok(()));
        let failed = JudgmentReport::new("b", "/", Err(CheckError::assertion("no")));
        let usage = JudgmentReport::new("c", "/", Err(CheckError::precondition("order")));

        assert_eq!(exit_status(&[passed.clone()]), 0);
        assert_eq!(exit_status(&[passed, failed.clone()]), 1);
        assert_eq!(exit_status(&[failed, usage]), 2);
    }
}
