use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_iam::Client as IamClient;
use aws_sdk_iam::types::{StatusType, Tag};
use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use super::{AccessKey, IdentityDirectory, KeyStatus};
use crate::constants::DEFAULT_AWS_REGION;

/// [`IdentityDirectory`] backed by the AWS IAM control plane.
///
/// All calls are plain request/response pairs: no retry, no client-side
/// timeout beyond the SDK defaults. Failed calls surface to the caller, which
/// decides whether to skip the entity or abort the run.
pub struct AwsDirectory {
    client: IamClient,
}

impl AwsDirectory {
    /// Load AWS config for the profile with automatic region fallback.
    /// Priority: ENV vars -> Config file -> EC2 metadata -> DEFAULT_AWS_REGION
    pub async fn new(profile: &str) -> Result<Self> {
        let config = {
            let loaded = aws_config::defaults(BehaviorVersion::latest())
                .profile_name(profile)
                .load()
                .await;

            match loaded.region() {
                Some(region) => {
                    debug!("Using region: {}", region);
                    loaded
                }
                None => {
                    debug!(
                        "No region configured, using default {} for IAM",
                        DEFAULT_AWS_REGION
                    );
                    aws_config::defaults(BehaviorVersion::latest())
                        .profile_name(profile)
                        .region(Region::new(DEFAULT_AWS_REGION))
                        .load()
                        .await
                }
            }
        };

        Ok(Self {
            client: IamClient::new(&config),
        })
    }

    pub fn with_client(client: IamClient) -> Self {
        Self { client }
    }
}

fn to_utc(dt: &aws_smithy_types::DateTime) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(dt.secs(), dt.subsec_nanos())
        .single()
        .with_context(|| format!("Timestamp out of range: {dt}"))
}

fn from_smithy_status(status: &StatusType) -> KeyStatus {
    match status {
        StatusType::Active => KeyStatus::Active,
        // Unknown statuses are treated as Inactive so they never trigger a rotation
        _ => KeyStatus::Inactive,
    }
}

fn to_smithy_status(status: KeyStatus) -> StatusType {
    match status {
        KeyStatus::Active => StatusType::Active,
        KeyStatus::Inactive => StatusType::Inactive,
    }
}

#[async_trait]
impl IdentityDirectory for AwsDirectory {
    async fn list_users(&self) -> Result<Vec<String>> {
        let mut users = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut request = self.client.list_users();
            if let Some(m) = marker {
                request = request.marker(m);
            }

            let response = request.send().await.context("Failed to list IAM users")?;
            users.extend(response.users().iter().map(|u| u.user_name().to_string()));

            marker = response.marker().map(str::to_string);
            if !response.is_truncated() {
                break;
            }
        }

        debug!("Listed {} users", users.len());
        Ok(users)
    }

    async fn list_access_keys(&self, user: &str) -> Result<Vec<AccessKey>> {
        let mut keys = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut request = self.client.list_access_keys().user_name(user);
            if let Some(m) = marker {
                request = request.marker(m);
            }

            let response = request
                .send()
                .await
                .with_context(|| format!("Failed to list access keys for user '{user}'"))?;

            for meta in response.access_key_metadata() {
                let id = meta
                    .access_key_id()
                    .context("Access key metadata is missing the key id")?
                    .to_string();
                let created_at = to_utc(
                    meta.create_date()
                        .with_context(|| format!("Key {id} has no creation date"))?,
                )?;
                let status = meta
                    .status()
                    .map_or(KeyStatus::Inactive, from_smithy_status);

                keys.push(AccessKey {
                    id,
                    created_at,
                    status,
                });
            }

            marker = response.marker().map(str::to_string);
            if !response.is_truncated() {
                break;
            }
        }

        Ok(keys)
    }

    async fn create_access_key(&self, user: &str) -> Result<AccessKey> {
        let response = self
            .client
            .create_access_key()
            .user_name(user)
            .send()
            .await
            .with_context(|| format!("Failed to create access key for user '{user}'"))?;

        let key = response
            .access_key()
            .context("CreateAccessKey returned no key material")?;
        let created_at = match key.create_date() {
            Some(dt) => to_utc(dt)?,
            None => Utc::now(),
        };

        Ok(AccessKey {
            id: key.access_key_id().to_string(),
            created_at,
            // CreateAccessKey always returns an Active key
            status: KeyStatus::Active,
        })
    }

    async fn delete_access_key(&self, user: &str, key_id: &str) -> Result<()> {
        self.client
            .delete_access_key()
            .user_name(user)
            .access_key_id(key_id)
            .send()
            .await
            .with_context(|| format!("Failed to delete access key {key_id} for user '{user}'"))?;

        Ok(())
    }

    async fn set_key_status(&self, user: &str, key_id: &str, status: KeyStatus) -> Result<()> {
        self.client
            .update_access_key()
            .user_name(user)
            .access_key_id(key_id)
            .status(to_smithy_status(status))
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to set access key {key_id} to {} for user '{user}'",
                    status.as_str()
                )
            })?;

        Ok(())
    }

    async fn list_roles(&self) -> Result<Vec<String>> {
        let mut roles = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut request = self.client.list_roles();
            if let Some(m) = marker {
                request = request.marker(m);
            }

            let response = request.send().await.context("Failed to list IAM roles")?;
            roles.extend(response.roles().iter().map(|r| r.role_name().to_string()));

            marker = response.marker().map(str::to_string);
            if !response.is_truncated() {
                break;
            }
        }

        debug!("Listed {} roles", roles.len());
        Ok(roles)
    }

    async fn role_last_used(&self, role: &str) -> Result<Option<DateTime<Utc>>> {
        // ListRoles does not populate RoleLastUsed; it takes a GetRole per role
        let response = self
            .client
            .get_role()
            .role_name(role)
            .send()
            .await
            .with_context(|| format!("Failed to fetch role '{role}'"))?;

        let last_used = response
            .role()
            .with_context(|| format!("GetRole returned no record for '{role}'"))?
            .role_last_used()
            .and_then(|lu| lu.last_used_date());

        last_used.map(to_utc).transpose()
    }

    async fn tag_role(&self, role: &str, key: &str, value: &str) -> Result<()> {
        let tag = Tag::builder()
            .key(key)
            .value(value)
            .build()
            .context("Invalid role tag")?;

        self.client
            .tag_role()
            .role_name(role)
            .tags(tag)
            .send()
            .await
            .with_context(|| format!("Failed to tag role '{role}'"))?;

        Ok(())
    }
}
