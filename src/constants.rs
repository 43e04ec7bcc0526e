/// Staleness threshold in days shared by both subcommands: keys this old or
/// older rotate, roles idle for strictly longer than this are unused
pub const DEFAULT_THRESHOLD_DAYS: i64 = 90;

/// Tag key applied to unused roles when tagging is enabled
pub const DEFAULT_TAG_KEY: &str = "Usage";

/// Tag value applied to unused roles when tagging is enabled
pub const DEFAULT_TAG_VALUE: &str = "Unused";

/// Default AWS region when no region is configured. IAM is a global service
/// but the SDK still requires a signing region.
pub const DEFAULT_AWS_REGION: &str = "us-east-1";
