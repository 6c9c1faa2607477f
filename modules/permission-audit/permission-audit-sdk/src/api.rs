//! Remote API trait consumed by the audit engine.

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::models::{
    NodeId, Page, PageCursor, PagedQuery, Principal, PrincipalId, RoleAssignment, TreeNode, User,
};
use crate::session::SessionContext;

/// Remote content-and-permissions service.
///
/// Every method performs exactly one round trip. Any call may fail with
/// [`RemoteError::Throttled`]; the engine retries those and treats every
/// other error as fatal.
///
/// ```ignore
/// let root = client.get_root_web(&ctx, ctx.site_url()).await?;
/// let unique = client.has_unique_role_assignments(&ctx, &root.id).await?;
/// ```
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Load the root web of the site at `url`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no site lives at `url`
    /// - `Throttled` when rate-limited
    async fn get_root_web(&self, ctx: &SessionContext, url: &str)
    -> Result<TreeNode, RemoteError>;

    /// Fetch one batch of a collection, resuming after `cursor` when given.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the parent container does not exist
    /// - `Internal` if the cursor is not recognised
    /// - `Throttled` when rate-limited
    async fn fetch_page(
        &self,
        ctx: &SessionContext,
        query: &PagedQuery,
        cursor: Option<&PageCursor>,
    ) -> Result<Page<TreeNode>, RemoteError>;

    /// Whether the node breaks permission inheritance.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the node does not exist
    /// - `Throttled` when rate-limited
    async fn has_unique_role_assignments(
        &self,
        ctx: &SessionContext,
        node: &NodeId,
    ) -> Result<bool, RemoteError>;

    /// List the role assignments of a node, in the service's own order.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the node does not exist
    /// - `Throttled` when rate-limited
    async fn get_role_assignments(
        &self,
        ctx: &SessionContext,
        node: &NodeId,
    ) -> Result<Vec<RoleAssignment>, RemoteError>;

    /// Permission-level names bound to `principal` on `node`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the principal holds no assignment on the node
    /// - `Throttled` when rate-limited
    async fn get_role_definitions(
        &self,
        ctx: &SessionContext,
        node: &NodeId,
        principal: PrincipalId,
    ) -> Result<Vec<String>, RemoteError>;

    /// Load the principal behind an assignment.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the principal does not exist
    /// - `Throttled` when rate-limited
    async fn resolve_principal(
        &self,
        ctx: &SessionContext,
        principal: PrincipalId,
    ) -> Result<Principal, RemoteError>;

    /// Direct user members of a group. Nested groups are not returned.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the group does not exist
    /// - `Throttled` when rate-limited
    async fn get_group_members(
        &self,
        ctx: &SessionContext,
        group: PrincipalId,
    ) -> Result<Vec<User>, RemoteError>;

    /// Resolve a login name or e-mail address to a site user.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no such user exists
    /// - `Throttled` when rate-limited
    async fn ensure_user(
        &self,
        ctx: &SessionContext,
        login_or_email: &str,
    ) -> Result<User, RemoteError>;

    /// URL of the default display form of a list (used to link folder items).
    ///
    /// # Errors
    ///
    /// - `NotFound` if the list does not exist
    /// - `Throttled` when rate-limited
    async fn default_display_form_url(
        &self,
        ctx: &SessionContext,
        list: &NodeId,
    ) -> Result<String, RemoteError>;
}
