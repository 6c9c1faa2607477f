//! Permission resolution for a single node.

use permission_audit_sdk::{
    NodeKind, PermissionSource, Principal, ReportRow, RoleAssignment, TreeNode, User,
};
use tracing::debug;

use super::error::DomainError;
use super::remote::RemoteSession;

/// Finds the role assignments on a node that apply to the audit target,
/// either directly or through group membership.
///
/// Groups are expanded one level only. A group nested inside another group
/// is not followed.
pub struct PermissionResolver<'a> {
    session: RemoteSession<'a>,
    ignored_levels: &'a [String],
}

impl<'a> PermissionResolver<'a> {
    #[must_use]
    pub fn new(session: RemoteSession<'a>, ignored_levels: &'a [String]) -> Self {
        Self {
            session,
            ignored_levels,
        }
    }

    /// Report rows for `target` on `node`, in assignment order.
    ///
    /// Plain leaf items are not examined and yield no rows without any
    /// remote call.
    ///
    /// # Errors
    ///
    /// Any remote failure (after retries) aborts resolution of the node.
    pub async fn resolve(
        &self,
        node: &TreeNode,
        target: &User,
    ) -> Result<Vec<ReportRow>, DomainError> {
        if !node.kind.is_securable() {
            return Ok(Vec::new());
        }

        let object_url = self.display_url(node).await?;
        let assignments = self
            .session
            .call("get_role_assignments", |c, ctx| {
                c.get_role_assignments(ctx, &node.id)
            })
            .await?;

        let mut rows = Vec::new();
        for assignment in assignments {
            let Some(source) = self.match_target(assignment, target).await? else {
                continue;
            };

            let permissions = self.permissions(node, assignment).await?;
            if permissions.is_empty() {
                debug!(
                    node = %node.id,
                    principal = assignment.principal_id,
                    "only ignored permission levels, no row"
                );
                continue;
            }

            debug!(node = %node.id, %source, "target holds permissions");
            rows.push(ReportRow {
                object_url: object_url.clone(),
                object_type: node.kind.object_type(),
                object_title: node.title.clone(),
                source,
                permissions,
            });
        }
        Ok(rows)
    }

    /// Folders are addressed through their list's display form, containers
    /// by their own URL.
    async fn display_url(&self, node: &TreeNode) -> Result<String, DomainError> {
        match &node.kind {
            NodeKind::FolderItem { list_id, item_id } => {
                let form = self
                    .session
                    .call("default_display_form_url", |c, ctx| {
                        c.default_display_form_url(ctx, list_id)
                    })
                    .await?;
                Ok(format!("{form}?ID={item_id}"))
            }
            NodeKind::Site | NodeKind::Web | NodeKind::List { .. } | NodeKind::OtherLeaf { .. } => {
                Ok(node.url.clone())
            }
        }
    }

    async fn match_target(
        &self,
        assignment: RoleAssignment,
        target: &User,
    ) -> Result<Option<PermissionSource>, DomainError> {
        let principal = self
            .session
            .call("resolve_principal", |c, ctx| {
                c.resolve_principal(ctx, assignment.principal_id)
            })
            .await?;

        match principal {
            Principal::User(user) => {
                Ok(user.is_same_login(target).then_some(PermissionSource::Direct))
            }
            Principal::Group(group) => {
                let members = self
                    .session
                    .call("get_group_members", |c, ctx| {
                        c.get_group_members(ctx, group.id)
                    })
                    .await?;
                let is_member = members.iter().any(|m| m.is_same_login(target));
                Ok(is_member.then(|| PermissionSource::Group(group.title)))
            }
        }
    }

    async fn permissions(
        &self,
        node: &TreeNode,
        assignment: RoleAssignment,
    ) -> Result<Vec<String>, DomainError> {
        let mut levels = self
            .session
            .call("get_role_definitions", |c, ctx| {
                c.get_role_definitions(ctx, &node.id, assignment.principal_id)
            })
            .await?;
        levels.retain(|level| {
            !self
                .ignored_levels
                .iter()
                .any(|ignored| ignored.eq_ignore_ascii_case(level))
        });
        Ok(levels)
    }
}
