//! Domain service for one audit run.

use std::sync::Arc;

use permission_audit_sdk::{ContentClient, SessionContext, User};
use serde::Serialize;
use tracing::{error, info};

use super::error::DomainError;
use super::remote::RemoteSession;
use super::report::ReportSink;
use super::resolver::PermissionResolver;
use super::retry::RetryPolicy;
use super::walker::{TreeWalker, WalkOptions, WalkStats};
use crate::config::AuditConfig;

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct AuditSummary {
    /// The audited user as the remote service knows it.
    pub target: User,
    pub stats: WalkStats,
}

/// Permission audit service.
pub struct AuditService {
    client: Arc<dyn ContentClient>,
    config: AuditConfig,
    retry: RetryPolicy,
    walk: WalkOptions,
}

impl AuditService {
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfig` if `config` fails validation.
    pub fn new(client: Arc<dyn ContentClient>, config: AuditConfig) -> Result<Self, DomainError> {
        config.validate()?;
        Ok(Self {
            client,
            retry: RetryPolicy::from_config(&config.retry),
            walk: WalkOptions::from_config(&config),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Resolve the target user, walk the site, and emit every row to `sink`.
    ///
    /// # Errors
    ///
    /// - `RetriesExhausted` when a call stays throttled
    /// - `Remote` on any other remote failure, including an unknown user or site
    /// - `Report` when the sink cannot be written
    #[tracing::instrument(
        skip_all,
        fields(site = %self.config.site_url, user = %self.config.target_user)
    )]
    pub async fn run(
        &self,
        ctx: &SessionContext,
        sink: &mut dyn ReportSink,
    ) -> Result<AuditSummary, DomainError> {
        let session = RemoteSession::new(self.client.as_ref(), ctx, &self.retry);

        let target = session
            .call("ensure_user", |c, ctx| {
                c.ensure_user(ctx, &self.config.target_user)
            })
            .await?;
        info!(login = %target.login_name, "target user resolved");

        let root = session
            .call("get_root_web", |c, ctx| {
                c.get_root_web(ctx, &self.config.site_url)
            })
            .await?;
        info!(root = %root.url, title = %root.title, "starting walk");

        let resolver = PermissionResolver::new(session, &self.config.ignored_permission_levels);
        let walker = TreeWalker::new(session, resolver, &self.walk);
        let stats = walker
            .walk(root, &target, sink)
            .await
            .inspect_err(|e| error!(error = %e, "audit aborted"))?;

        info!(
            webs = stats.webs_visited,
            lists = stats.lists_scanned,
            items = stats.items_examined,
            resolved = stats.nodes_resolved,
            rows = stats.rows_emitted,
            "audit complete"
        );
        Ok(AuditSummary { target, stats })
    }
}
