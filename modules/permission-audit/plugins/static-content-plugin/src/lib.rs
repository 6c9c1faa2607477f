#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static Content Plugin
//!
//! A [`ContentClient`](permission_audit_sdk::ContentClient) backed by a site
//! tree described in configuration. Used for dry runs of the audit CLI and as
//! the backend of the engine's integration tests.
//!
//! Behaves like the remote service where the engine can observe it:
//! collections are ordered by identity and paginated with opaque cursors,
//! item listings do not carry the unique-permissions flag, and every call can
//! be made to throttle deterministically.
//!
//! ## Configuration
//!
//! ```yaml
//! static_content:
//!   throttle_every_n_calls: 7
//!   users:
//!     - { id: 1, login_name: "i:0#.f|membership|alice@contoso.com", title: "Alice" }
//!   groups:
//!     - { id: 10, title: "Marketing", members: [1] }
//!   root:
//!     id: "web-root"
//!     url: "https://contoso.sharepoint.com/sites/hr"
//!     title: "HR"
//!     lists:
//!       - id: "list-docs"
//!         url: "https://contoso.sharepoint.com/sites/hr/Docs"
//!         title: "Docs"
//!         items:
//!           - id: 1
//!             title: "F1"
//!             folder: true
//!             unique_permissions: true
//!             role_assignments:
//!               - { principal_id: 1, roles: ["Contribute"] }
//! ```

pub mod config;
pub mod domain;

pub use config::StaticContentConfig;
pub use domain::{RemoteRequest, Service};
