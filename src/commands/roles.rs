use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::constants::{DEFAULT_TAG_KEY, DEFAULT_TAG_VALUE, DEFAULT_THRESHOLD_DAYS};
use crate::directory::AwsDirectory;
use crate::scanner::{self, ScanConfig};

#[derive(Debug, Clone, Args)]
pub struct UnusedRolesCommand {
    #[arg(
        long,
        default_value_t = DEFAULT_THRESHOLD_DAYS,
        value_parser = clap::value_parser!(i64).range(0..),
        help = "Flag roles unused for more than this many days"
    )]
    pub threshold_days: i64,

    #[arg(long, help = "Actually apply tags (default is a dry run)")]
    pub apply: bool,

    #[arg(long, help = "Tag unused roles")]
    pub tag: bool,

    #[arg(long, default_value = DEFAULT_TAG_KEY, help = "Tag key for unused roles")]
    pub tag_key: String,

    #[arg(long, default_value = DEFAULT_TAG_VALUE, help = "Tag value for unused roles")]
    pub tag_value: String,
}

impl UnusedRolesCommand {
    pub async fn execute(self, profile: &str) -> Result<()> {
        info!(
            "Scanning roles for profile {profile} (threshold: {} days)",
            self.threshold_days
        );

        let config = ScanConfig {
            threshold_days: self.threshold_days,
            dry_run: !self.apply,
            tag_unused: self.tag,
            tag_key: self.tag_key,
            tag_value: self.tag_value,
        };

        let directory = AwsDirectory::new(profile)
            .await
            .context("Failed to initialize AWS IAM client")?;

        let unused = scanner::scan_roles(&directory, &config).await?;

        println!("\n=== Unused Roles (> {} days) ===", config.threshold_days);
        for role in &unused {
            println!("- {role}");
        }
        if unused.is_empty() {
            println!("No unused roles detected.");
        }

        if config.tag_unused && !unused.is_empty() {
            scanner::tag_unused_roles(&directory, &unused, &config).await;
        }

        Ok(())
    }
}
