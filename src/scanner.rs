//! Unused-role scanner.
//!
//! Classifies each role by its last recorded activity and optionally tags
//! the unused ones. A role whose activity cannot be evaluated is never
//! flagged: wrongly tagging a live role is worse than missing a dead one.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::directory::IdentityDirectory;

/// Scan settings, built once from CLI flags and treated as immutable.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub threshold_days: i64,
    pub dry_run: bool,
    pub tag_unused: bool,
    pub tag_key: String,
    pub tag_value: String,
}

/// Whether a role with the given last-activity timestamp counts as unused.
///
/// Never used at all counts as unused. The bound is strict: a role last used
/// exactly `threshold_days` ago is still considered in use.
pub fn is_unused(
    last_used: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    threshold_days: i64,
) -> bool {
    match last_used {
        None => true,
        Some(ts) => (now - ts).num_days() > threshold_days,
    }
}

/// Classify every role, returning the names of the unused ones.
///
/// A failed last-used lookup is logged with the role name and the role is
/// treated as in use; the scan continues with the next role.
pub async fn scan_roles<D>(directory: &D, config: &ScanConfig) -> Result<Vec<String>>
where
    D: IdentityDirectory + Sync,
{
    let roles = directory
        .list_roles()
        .await
        .context("Failed to list roles")?;
    let now = Utc::now();
    let mut unused = Vec::new();

    for role in roles {
        match directory.role_last_used(&role).await {
            Ok(None) => {
                info!("Role {role} has never been used.");
                unused.push(role);
            }
            Ok(Some(ts)) => {
                let days = (now - ts).num_days();
                info!("Role {role} last used {days} days ago.");
                if is_unused(Some(ts), now, config.threshold_days) {
                    unused.push(role);
                }
            }
            Err(e) => {
                warn!("Could not evaluate role {role}: {e:#}");
            }
        }
    }

    Ok(unused)
}

/// Apply the configured tag to each unused role. Tag failures are logged per
/// role and never stop the remaining roles; under dry-run only the intents
/// are logged.
pub async fn tag_unused_roles<D>(directory: &D, unused: &[String], config: &ScanConfig)
where
    D: IdentityDirectory + Sync,
{
    for role in unused {
        info!("Tagging role {role} as unused");
        if config.dry_run {
            continue;
        }
        if let Err(e) = directory
            .tag_role(role, &config.tag_key, &config.tag_value)
            .await
        {
            error!("Failed to tag role {role}: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::fake::{FakeDirectory, Mutation};
    use chrono::Duration;

    fn config(dry_run: bool, tag_unused: bool) -> ScanConfig {
        ScanConfig {
            threshold_days: 90,
            dry_run,
            tag_unused,
            tag_key: "Usage".to_string(),
            tag_value: "Unused".to_string(),
        }
    }

    #[test]
    fn never_used_role_is_unused() {
        assert!(is_unused(None, Utc::now(), 90));
    }

    #[test]
    fn role_used_exactly_at_threshold_is_not_unused() {
        let now = Utc::now();
        assert!(!is_unused(Some(now - Duration::days(90)), now, 90));
    }

    #[test]
    fn role_past_threshold_is_unused() {
        let now = Utc::now();
        assert!(is_unused(Some(now - Duration::days(91)), now, 90));
    }

    #[test]
    fn recently_used_role_is_not_unused() {
        let now = Utc::now();
        assert!(!is_unused(Some(now - Duration::days(3)), now, 90));
    }

    #[tokio::test]
    async fn scan_flags_never_used_and_stale_roles() {
        let now = Utc::now();
        let directory = FakeDirectory::new();
        directory.add_role("never-used", None);
        directory.add_role("stale", Some(now - Duration::days(200)));
        directory.add_role("active", Some(now - Duration::days(2)));

        let unused = scan_roles(&directory, &config(true, false)).await.unwrap();

        assert_eq!(unused, vec!["never-used".to_string(), "stale".to_string()]);
    }

    #[tokio::test]
    async fn failing_lookup_is_never_flagged() {
        let directory = FakeDirectory::new();
        directory.fail_last_used_for("R1");
        directory.add_role("never-used", None);

        let unused = scan_roles(&directory, &config(true, false)).await.unwrap();

        // R1 errors out and must not appear; the scan still covers the rest
        assert_eq!(unused, vec!["never-used".to_string()]);
    }

    #[tokio::test]
    async fn tagging_applies_configured_tag() {
        let directory = FakeDirectory::new();
        let unused = vec!["stale".to_string()];

        tag_unused_roles(&directory, &unused, &config(false, true)).await;

        assert_eq!(
            directory.mutations(),
            vec![Mutation::Tagged {
                role: "stale".to_string(),
                key: "Usage".to_string(),
                value: "Unused".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn tag_failure_does_not_stop_remaining_roles() {
        let directory = FakeDirectory::new();
        directory.fail_tag_for("first");
        let unused = vec!["first".to_string(), "second".to_string()];

        tag_unused_roles(&directory, &unused, &config(false, true)).await;

        assert_eq!(
            directory.mutations(),
            vec![Mutation::Tagged {
                role: "second".to_string(),
                key: "Usage".to_string(),
                value: "Unused".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn dry_run_tagging_issues_no_calls() {
        let directory = FakeDirectory::new();
        let unused = vec!["stale".to_string()];

        tag_unused_roles(&directory, &unused, &config(true, true)).await;

        assert!(directory.mutations().is_empty());
    }
}
