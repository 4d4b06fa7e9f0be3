//! CLI Commands

pub mod page;
pub mod robots;
pub mod schema;
pub mod sitemap;

use std::str::FromStr;

use seoprobe_inspect::CheckError;

use crate::output::JudgmentReport;

/// Parse a judgment argument, turning a bad value into a precondition report
fn parse_arg<T>(judgment: &str, target: &str, value: &str) -> Result<T, JudgmentReport>
where
    T: FromStr<Err = CheckError>,
{
    value
        .parse()
        .map_err(|e| JudgmentReport::new(judgment, target, Err(e)))
}
