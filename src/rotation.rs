//! Access key rotation engine.
//!
//! Policy and side effects are split: [`plan_rotation`] decides what a user
//! needs from a snapshot of their keys, and [`rotate_user`] carries the plan
//! out against the directory (or only logs it under dry-run). At most one
//! rotation happens per user per run so a user is never left without a valid
//! key mid-rotation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::directory::{AccessKey, IdentityDirectory, KeyStatus};

/// Rotation settings, built once from CLI flags and treated as immutable.
#[derive(Debug, Clone)]
pub struct RotationConfig {
    pub threshold_days: i64,
    pub dry_run: bool,
    pub target_user: Option<String>,
}

/// What the policy decided for one user, before any side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationPlan {
    /// The user has no keys at all; provision their first one.
    Provision,
    /// Retire `trigger` and provision a replacement.
    Rotate {
        /// The key whose age tripped the threshold.
        trigger: String,
        /// Oldest key, deleted up front when the two-key ceiling is reached.
        /// The directory refuses a third key, so deletion must precede the
        /// create.
        delete_first: Option<String>,
        /// The trigger is deactivated, not deleted, in case deployed systems
        /// still use it. Omitted when the trigger is itself the deletion
        /// target.
        deactivate: Option<String>,
    },
}

/// Decide what rotation, if any, a user's key set calls for.
///
/// Makes no directory calls; the caller owns all side effects. Keys are
/// sorted oldest first and the first Active key at or past the threshold
/// triggers. Inactive keys never trigger (they are already retired) but
/// still count toward the ceiling and can be the deletion target.
pub fn plan_rotation(
    keys: &[AccessKey],
    now: DateTime<Utc>,
    threshold_days: i64,
) -> Option<RotationPlan> {
    if keys.is_empty() {
        // Never provisioned is not stale
        return Some(RotationPlan::Provision);
    }

    let mut keys: Vec<&AccessKey> = keys.iter().collect();
    // Oldest first; index 0 drives the deletion choice below
    keys.sort_by_key(|k| k.created_at);

    for key in &keys {
        let age_days = (now - key.created_at).num_days();
        info!(
            "Key {} is {} days old. Status: {}",
            key.id,
            age_days,
            key.status.as_str()
        );

        if key.status != KeyStatus::Active {
            continue;
        }
        if age_days < threshold_days {
            continue;
        }

        // Deletion is conditioned on the current count, never just "oldest"
        let delete_first = (keys.len() >= 2).then(|| keys[0].id.clone());
        let deactivate =
            (delete_first.as_deref() != Some(key.id.as_str())).then(|| key.id.clone());

        // First trigger wins: one rotation per user per run
        return Some(RotationPlan::Rotate {
            trigger: key.id.clone(),
            delete_first,
            deactivate,
        });
    }

    None
}

/// How processing one user ended. Reported as a value so the run loop can
/// keep going after failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    /// Every key is under the threshold; nothing to do.
    Current,
    /// The user had no keys; one was provisioned (`None` id under dry-run).
    Provisioned { created: Option<String> },
    /// One key rotated. Ids are `None` for steps skipped under dry-run.
    Rotated {
        deleted: Option<String>,
        created: Option<String>,
        deactivated: Option<String>,
    },
}

/// Fetch one user's keys, plan, and carry the plan out.
///
/// Under dry-run every intended action is logged but no mutating call is
/// issued.
pub async fn rotate_user<D>(
    directory: &D,
    user: &str,
    config: &RotationConfig,
    now: DateTime<Utc>,
) -> Result<RotationOutcome>
where
    D: IdentityDirectory + Sync,
{
    info!("Checking keys for user: {user}");
    let keys = directory.list_access_keys(user).await?;

    match plan_rotation(&keys, now, config.threshold_days) {
        None => Ok(RotationOutcome::Current),
        Some(RotationPlan::Provision) => {
            info!("No keys found for {user}. Creating a new access key.");
            let mut created = None;
            if !config.dry_run {
                let key = directory.create_access_key(user).await?;
                info!("Created new key: {}", key.id);
                created = Some(key.id);
            }
            Ok(RotationOutcome::Provisioned { created })
        }
        Some(RotationPlan::Rotate {
            trigger,
            delete_first,
            deactivate,
        }) => {
            info!("Rotating key {trigger} for user {user}");

            let mut deleted = None;
            if let Some(oldest) = delete_first {
                info!("Deleting oldest key: {oldest}");
                if !config.dry_run {
                    directory.delete_access_key(user, &oldest).await?;
                    deleted = Some(oldest);
                }
            }

            info!("Creating replacement access key for {user}");
            let mut created = None;
            if !config.dry_run {
                let key = directory.create_access_key(user).await?;
                info!("Created new key: {}", key.id);
                created = Some(key.id);
            }

            let mut deactivated = None;
            if let Some(key_id) = deactivate {
                info!("Deactivating old key: {key_id}");
                if !config.dry_run {
                    directory
                        .set_key_status(user, &key_id, KeyStatus::Inactive)
                        .await?;
                    deactivated = Some(key_id);
                }
            }

            Ok(RotationOutcome::Rotated {
                deleted,
                created,
                deactivated,
            })
        }
    }
}

/// Outcome counts for one engine run; logged, never printed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RotationSummary {
    pub current: usize,
    pub provisioned: usize,
    pub rotated: usize,
    pub failed: Vec<String>,
}

/// Process every user sequentially. A failure on one user is recorded and
/// the next user is still processed.
pub async fn run_rotation<D>(directory: &D, config: &RotationConfig) -> Result<RotationSummary>
where
    D: IdentityDirectory + Sync,
{
    if config.dry_run {
        info!("Dry run: no key will be created, deleted, or deactivated");
    }

    let users = directory
        .list_users()
        .await
        .context("Failed to list users")?;
    let mut summary = RotationSummary::default();

    for user in users {
        if let Some(target) = &config.target_user {
            if &user != target {
                continue;
            }
        }

        match rotate_user(directory, &user, config, Utc::now()).await {
            Ok(RotationOutcome::Current) => summary.current += 1,
            Ok(RotationOutcome::Provisioned { .. }) => summary.provisioned += 1,
            Ok(RotationOutcome::Rotated { .. }) => summary.rotated += 1,
            Err(e) => {
                warn!("Skipping user {user}: {e:#}");
                summary.failed.push(user);
            }
        }
    }

    info!(
        "Rotation pass complete: {} rotated, {} provisioned, {} current, {} failed",
        summary.rotated,
        summary.provisioned,
        summary.current,
        summary.failed.len()
    );
    Ok(summary)
}
