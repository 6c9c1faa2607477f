#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Permission Audit SDK
//!
//! This crate provides the contract between the permission-audit engine and
//! the remote content service it inspects:
//!
//! - [`ContentClient`] - Remote API trait (tree listing, ACL retrieval, principal lookup)
//! - [`TreeNode`], [`NodeKind`] - Securable nodes of the content tree
//! - [`Principal`], [`User`], [`Group`], [`RoleAssignment`] - Access-control models
//! - [`PagedQuery`], [`Page`], [`PageCursor`] - Cursor-based pagination
//! - [`ReportRow`], [`PermissionSource`] - Rows emitted by an audit run
//! - [`RemoteError`] - Error taxonomy (throttled vs. fatal)
//! - [`SessionContext`] - Authenticated session handle passed to every call
//!
//! ## Usage
//!
//! ```ignore
//! use permission_audit_sdk::{ContentClient, PagedQuery, SessionContext};
//!
//! let ctx = SessionContext::builder()
//!     .site_url("https://contoso.sharepoint.com/sites/hr")
//!     .build();
//!
//! let root = client.get_root_web(&ctx, ctx.site_url()).await?;
//! let page = client
//!     .fetch_page(&ctx, &PagedQuery::lists(&root.id, 500), None)
//!     .await?;
//! ```

pub mod api;
pub mod error;
pub mod models;
pub mod session;

// Re-export main types at crate root
pub use api::ContentClient;
pub use error::RemoteError;
pub use models::{
    Collection, Group, NodeId, NodeKind, ObjectType, Page, PageCursor, PagedQuery,
    PermissionSource, Principal, PrincipalId, RecordFilter, ReportRow, RoleAssignment, TreeNode,
    User,
};
pub use session::{SessionContext, SessionContextBuilder};
