//! Permission Audit Module
//!
//! Walks a remote content tree (site → subsites → lists → folders) and
//! reports every place a given user holds permissions, either directly or
//! through membership of a group.
//!
//! ## Architecture
//!
//! ### Contract Layer (`permission-audit-sdk`)
//! - `ContentClient` trait: the remote API the engine needs
//! - Models: `TreeNode`, `Principal`, `RoleAssignment`, `ReportRow`
//! - Error type: `RemoteError` (throttled vs. fatal)
//!
//! ### Domain Layer (`permission_audit::domain`)
//! - `retry` - bounded exponential backoff for throttled calls
//! - `remote` - session binding client, context, and retry policy
//! - `pagination` - cursor-driven batch fetcher
//! - `resolver` - role assignment and group expansion
//! - `walker` - depth-first tree walk with inheritance pruning
//! - `report` - row sinks and the delimited report writer
//! - `service` - one audit run end to end
//!
//! Every remote round trip goes through [`domain::RetryPolicy`]; nothing in
//! the domain layer calls the client directly.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub use permission_audit_sdk::{
    ContentClient, NodeKind, PermissionSource, RemoteError, ReportRow, SessionContext, TreeNode,
    User,
};

pub mod config;
pub mod domain;

pub use config::{AuditConfig, RetryConfig};
pub use domain::{
    AuditService, AuditSummary, DelimitedReportWriter, DomainError, ReportSink, RetryPolicy,
    WalkStats,
};

#[cfg(test)]
mod test_support;
