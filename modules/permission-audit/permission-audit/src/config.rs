//! Configuration for a permission audit run.

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Largest batch the remote service accepts before its list view threshold applies.
pub const MAX_BATCH_SIZE: u32 = 5000;

/// Audit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// Root site to audit.
    pub site_url: String,

    /// Login name or e-mail of the user to search for.
    pub target_user: String,

    /// Page size for every paginated collection.
    pub batch_size: u32,

    /// Restrict list scans to folder-kind items.
    pub folders_only: bool,

    /// Do not expand subsites deeper than this (root is depth 0).
    pub max_depth: Option<usize>,

    /// List titles never scanned, in addition to hidden lists.
    pub excluded_lists: Vec<String>,

    /// Permission levels dropped from report rows, compared case-insensitively.
    /// A match left with no levels emits no row. Empty by default.
    pub ignored_permission_levels: Vec<String>,

    /// Backoff policy for throttled calls.
    pub retry: RetryConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            site_url: String::new(),
            target_user: String::new(),
            batch_size: 500,
            folders_only: true,
            max_depth: None,
            excluded_lists: Vec::new(),
            ignored_permission_levels: Vec::new(),
            retry: RetryConfig::default(),
        }
    }
}

/// Backoff policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Attempts per remote call before giving up on a throttled call.
    pub max_attempts: u32,

    /// Delay after the first throttled attempt; doubled after each further one.
    pub initial_delay_ms: u64,

    /// Upper bound for a single delay. Unbounded when absent.
    pub max_delay_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay_ms: 5000,
            max_delay_ms: None,
        }
    }
}

impl AuditConfig {
    /// Reject configurations the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfig` naming the offending field.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.site_url.trim().is_empty() {
            return Err(DomainError::invalid_config("site_url must not be empty"));
        }
        if self.target_user.trim().is_empty() {
            return Err(DomainError::invalid_config("target_user must not be empty"));
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(DomainError::invalid_config(format!(
                "batch_size must be between 1 and {MAX_BATCH_SIZE}, got {}",
                self.batch_size
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(DomainError::invalid_config(
                "retry.max_attempts must be at least 1",
            ));
        }
        if let Some(cap) = self.retry.max_delay_ms
            && cap < self.retry.initial_delay_ms
        {
            return Err(DomainError::invalid_config(format!(
                "retry.max_delay_ms ({cap}) is below retry.initial_delay_ms ({})",
                self.retry.initial_delay_ms
            )));
        }
        Ok(())
    }
}
