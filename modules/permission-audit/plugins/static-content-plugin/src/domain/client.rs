//! Client implementation for the static content plugin.
//!
//! Implements `ContentClient` using the domain service.

use async_trait::async_trait;
use permission_audit_sdk::{
    ContentClient, NodeId, Page, PageCursor, PagedQuery, Principal, PrincipalId, RemoteError,
    RoleAssignment, SessionContext, TreeNode, User,
};

use super::service::Service;

#[async_trait]
impl ContentClient for Service {
    async fn get_root_web(
        &self,
        _ctx: &SessionContext,
        url: &str,
    ) -> Result<TreeNode, RemoteError> {
        self.begin("get_root_web", url)?;
        self.root(url)
    }

    async fn fetch_page(
        &self,
        _ctx: &SessionContext,
        query: &PagedQuery,
        cursor: Option<&PageCursor>,
    ) -> Result<Page<TreeNode>, RemoteError> {
        let target = cursor.map_or_else(String::new, |c| c.as_str().to_owned());
        self.begin("fetch_page", target)?;
        self.page(query, cursor)
    }

    async fn has_unique_role_assignments(
        &self,
        _ctx: &SessionContext,
        node: &NodeId,
    ) -> Result<bool, RemoteError> {
        self.begin("has_unique_role_assignments", node.as_str())?;
        self.is_unique(node)
    }

    async fn get_role_assignments(
        &self,
        _ctx: &SessionContext,
        node: &NodeId,
    ) -> Result<Vec<RoleAssignment>, RemoteError> {
        self.begin("get_role_assignments", node.as_str())?;
        Ok(self
            .assignments(node)?
            .into_iter()
            .map(|principal_id| RoleAssignment { principal_id })
            .collect())
    }

    async fn get_role_definitions(
        &self,
        _ctx: &SessionContext,
        node: &NodeId,
        principal: PrincipalId,
    ) -> Result<Vec<String>, RemoteError> {
        self.begin("get_role_definitions", format!("{node}/{principal}"))?;
        self.roles(node, principal)
    }

    async fn resolve_principal(
        &self,
        _ctx: &SessionContext,
        principal: PrincipalId,
    ) -> Result<Principal, RemoteError> {
        self.begin("resolve_principal", principal.to_string())?;
        if let Some(user) = self.user(principal) {
            return Ok(Principal::User(user.clone()));
        }
        self.group(principal)
            .map(|g| Principal::Group(g.clone()))
            .ok_or_else(|| RemoteError::NotFound(format!("principal {principal}")))
    }

    async fn get_group_members(
        &self,
        _ctx: &SessionContext,
        group: PrincipalId,
    ) -> Result<Vec<User>, RemoteError> {
        self.begin("get_group_members", group.to_string())?;
        self.members(group)
    }

    async fn ensure_user(
        &self,
        _ctx: &SessionContext,
        login_or_email: &str,
    ) -> Result<User, RemoteError> {
        self.begin("ensure_user", login_or_email)?;
        self.find_user(login_or_email)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("user '{login_or_email}'")))
    }

    async fn default_display_form_url(
        &self,
        _ctx: &SessionContext,
        list: &NodeId,
    ) -> Result<String, RemoteError> {
        self.begin("default_display_form_url", list.as_str())?;
        self.display_form(list)
    }
}
