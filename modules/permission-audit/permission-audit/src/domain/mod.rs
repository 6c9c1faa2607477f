//! Domain layer for the permission audit engine.

pub mod error;
pub mod pagination;
pub mod remote;
pub mod report;
pub mod resolver;
pub mod retry;
pub mod service;
pub mod walker;

pub use error::DomainError;
pub use remote::RemoteSession;
pub use report::{DelimitedReportWriter, ReportSink};
pub use resolver::PermissionResolver;
pub use retry::RetryPolicy;
pub use service::{AuditService, AuditSummary};
pub use walker::{TreeWalker, WalkOptions, WalkStats};
