use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod aws;

pub use aws::AwsDirectory;

/// Access key status as reported by the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Active,
    Inactive,
}

impl KeyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyStatus::Active => "Active",
            KeyStatus::Inactive => "Inactive",
        }
    }
}

/// One access key as observed on the remote directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKey {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub status: KeyStatus,
}

/// Administrative surface of the identity directory.
///
/// The directory is the single source of truth: nothing is cached between
/// runs, and the two-keys-per-user ceiling is enforced remotely, not here.
/// Implemented by [`AwsDirectory`] in production and by an in-memory fake in
/// tests.
#[async_trait]
pub trait IdentityDirectory {
    /// All user names, fully materialized (pagination handled internally).
    async fn list_users(&self) -> Result<Vec<String>>;

    async fn list_access_keys(&self, user: &str) -> Result<Vec<AccessKey>>;

    /// Create a new key for the user. The returned key is Active.
    async fn create_access_key(&self, user: &str) -> Result<AccessKey>;

    async fn delete_access_key(&self, user: &str, key_id: &str) -> Result<()>;

    async fn set_key_status(&self, user: &str, key_id: &str, status: KeyStatus) -> Result<()>;

    /// All role names, fully materialized.
    async fn list_roles(&self) -> Result<Vec<String>>;

    /// Timestamp of the role's last recorded activity, if any.
    async fn role_last_used(&self, role: &str) -> Result<Option<DateTime<Utc>>>;

    async fn tag_role(&self, role: &str, key: &str, value: &str) -> Result<()>;
}
