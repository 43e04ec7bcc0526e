use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::constants::DEFAULT_THRESHOLD_DAYS;
use crate::directory::AwsDirectory;
use crate::rotation::{self, RotationConfig};

#[derive(Debug, Clone, Args)]
pub struct RotateKeysCommand {
    #[arg(
        long,
        default_value_t = DEFAULT_THRESHOLD_DAYS,
        value_parser = clap::value_parser!(i64).range(0..),
        help = "Rotate keys this many days old or older"
    )]
    pub threshold_days: i64,

    #[arg(long, help = "Actually create, delete, and deactivate keys (default is a dry run)")]
    pub apply: bool,

    #[arg(short = 'u', long, help = "Only process this user")]
    pub user: Option<String>,
}

impl RotateKeysCommand {
    pub async fn execute(self, profile: &str) -> Result<()> {
        info!(
            "Starting key rotation for profile {profile} (threshold: {} days)",
            self.threshold_days
        );

        let config = RotationConfig {
            threshold_days: self.threshold_days,
            dry_run: !self.apply,
            target_user: self.user,
        };

        let directory = AwsDirectory::new(profile)
            .await
            .context("Failed to initialize AWS IAM client")?;

        rotation::run_rotation(&directory, &config).await?;

        Ok(())
    }
}
