//! Schema Command

use anyhow::Result;
use clap::Args;
use seoprobe_inspect::SitemapProfile;

#[derive(Args)]
pub struct SchemaArgs {
    /// urlset, index or multilanguage
    pub profile: String,
}

/// Print the XML Schema bundled for a sitemap profile, unchanged
pub fn execute(args: SchemaArgs) -> Result<()> {
    let profile: SitemapProfile = args.profile.parse()?;
    print!("{}", profile.schema());
    Ok(())
}
