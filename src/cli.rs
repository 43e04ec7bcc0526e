use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use crate::commands::{RotateKeysCommand, UnusedRolesCommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "iamsweep", version, about = "Operational hygiene for AWS IAM: rotate stale access keys and flag unused roles", long_about = None, arg_required_else_help = true)]
pub struct Cli {
    #[arg(
        short = 'p',
        long,
        global = true,
        default_value = "default",
        help = "AWS profile name"
    )]
    pub profile: String,

    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Increase verbosity (-v debug, -vv trace)")]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Rotate access keys at or past the staleness threshold")]
    RotateKeys(RotateKeysCommand),
    #[command(about = "Report IAM roles with no recent activity")]
    UnusedRoles(UnusedRolesCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let profile = self.profile;

        match self.command {
            Commands::RotateKeys(cmd) => cmd.execute(&profile).await,
            Commands::UnusedRoles(cmd) => cmd.execute(&profile).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, error::ErrorKind};

    #[test]
    fn test_command_structure_validation() {
        let cmd = Cli::command();
        cmd.debug_assert();
    }

    #[test]
    fn test_profile_default_value() {
        let cli = Cli::try_parse_from(["iamsweep", "rotate-keys"]).unwrap();
        assert_eq!(cli.profile, "default");
    }

    #[test]
    fn test_profile_custom_value() {
        let cli = Cli::try_parse_from(["iamsweep", "--profile", "production", "rotate-keys"]).unwrap();
        assert_eq!(cli.profile, "production");
    }

    #[test]
    fn test_profile_short_flag() {
        let cli = Cli::try_parse_from(["iamsweep", "-p", "dev", "unused-roles"]).unwrap();
        assert_eq!(cli.profile, "dev");
    }

    #[test]
    fn test_rotate_keys_defaults() {
        let cli = Cli::try_parse_from(["iamsweep", "rotate-keys"]).unwrap();
        match cli.command {
            Commands::RotateKeys(cmd) => {
                assert_eq!(cmd.threshold_days, 90);
                assert!(!cmd.apply);
                assert_eq!(cmd.user, None);
            }
            _ => panic!("Expected rotate-keys command"),
        }
    }

    #[test]
    fn test_rotate_keys_with_flags() {
        let cli = Cli::try_parse_from([
            "iamsweep",
            "rotate-keys",
            "--threshold-days",
            "30",
            "--apply",
            "--user",
            "alice",
        ])
        .unwrap();
        match cli.command {
            Commands::RotateKeys(cmd) => {
                assert_eq!(cmd.threshold_days, 30);
                assert!(cmd.apply);
                assert_eq!(cmd.user, Some("alice".to_string()));
            }
            _ => panic!("Expected rotate-keys command"),
        }
    }

    #[test]
    fn test_rotate_keys_rejects_negative_threshold() {
        let result = Cli::try_parse_from(["iamsweep", "rotate-keys", "--threshold-days", "-1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unused_roles_defaults() {
        let cli = Cli::try_parse_from(["iamsweep", "unused-roles"]).unwrap();
        match cli.command {
            Commands::UnusedRoles(cmd) => {
                assert_eq!(cmd.threshold_days, 90);
                assert!(!cmd.apply);
                assert!(!cmd.tag);
                assert_eq!(cmd.tag_key, "Usage");
                assert_eq!(cmd.tag_value, "Unused");
            }
            _ => panic!("Expected unused-roles command"),
        }
    }

    #[test]
    fn test_unused_roles_with_tagging() {
        let cli = Cli::try_parse_from([
            "iamsweep",
            "unused-roles",
            "--tag",
            "--tag-key",
            "Lifecycle",
            "--tag-value",
            "Stale",
        ])
        .unwrap();
        match cli.command {
            Commands::UnusedRoles(cmd) => {
                assert!(cmd.tag);
                assert_eq!(cmd.tag_key, "Lifecycle");
                assert_eq!(cmd.tag_value, "Stale");
            }
            _ => panic!("Expected unused-roles command"),
        }
    }

    #[test]
    fn test_no_command_shows_help() {
        let result = Cli::try_parse_from(["iamsweep"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_command_fails() {
        let result = Cli::try_parse_from(["iamsweep", "invalid"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_help_flag_works() {
        let result = Cli::try_parse_from(["iamsweep", "--help"]);
        assert!(result.is_err());
        if let Err(e) = result {
            assert_eq!(e.kind(), ErrorKind::DisplayHelp);
        }
    }

    #[test]
    fn test_version_flag_works() {
        let result = Cli::try_parse_from(["iamsweep", "--version"]);
        assert!(result.is_err());
        if let Err(e) = result {
            assert_eq!(e.kind(), ErrorKind::DisplayVersion);
        }
    }

    #[test]
    fn test_verbose_flag_single() {
        let cli = Cli::try_parse_from(["iamsweep", "-v", "rotate-keys"]).unwrap();
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_verbose_flag_multiple() {
        let cli = Cli::try_parse_from(["iamsweep", "-vv", "unused-roles"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_verbose_default_zero() {
        let cli = Cli::try_parse_from(["iamsweep", "rotate-keys"]).unwrap();
        assert_eq!(cli.verbose, 0);
    }
}
