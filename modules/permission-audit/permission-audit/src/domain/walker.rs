//! Depth-first walk of the content tree.
//!
//! The walker visits every web from the root down, scans each visible list
//! for folders, and hands every node that breaks permission inheritance to
//! the [`PermissionResolver`]. Nodes that inherit are never resolved: their
//! permissions are already reported on the ancestor they inherit from.
//!
//! Webs are kept on an explicit work stack, so arbitrarily deep site
//! hierarchies do not grow the call stack.

use std::pin::pin;

use futures::TryStreamExt;
use permission_audit_sdk::{NodeKind, PagedQuery, RecordFilter, TreeNode, User};
use serde::Serialize;
use tracing::debug;

use super::error::DomainError;
use super::pagination::{fetch_all, fetch_pages};
use super::remote::RemoteSession;
use super::report::ReportSink;
use super::resolver::PermissionResolver;
use crate::config::AuditConfig;

/// Walk parameters derived from [`AuditConfig`].
#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub batch_size: u32,
    pub filter: RecordFilter,
    /// Webs at this depth are checked but not expanded. Root is depth 0.
    pub max_depth: Option<usize>,
    pub excluded_lists: Vec<String>,
}

impl WalkOptions {
    #[must_use]
    pub fn from_config(cfg: &AuditConfig) -> Self {
        Self {
            batch_size: cfg.batch_size,
            filter: if cfg.folders_only {
                RecordFilter::FoldersOnly
            } else {
                RecordFilter::AllItems
            },
            max_depth: cfg.max_depth,
            excluded_lists: cfg.excluded_lists.clone(),
        }
    }

    fn is_excluded(&self, list: &TreeNode) -> bool {
        self.excluded_lists
            .iter()
            .any(|title| title.eq_ignore_ascii_case(&list.title))
    }

    fn expands(&self, depth: usize) -> bool {
        self.max_depth.is_none_or(|max| depth < max)
    }
}

/// Counters for one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    pub webs_visited: usize,
    pub lists_scanned: usize,
    pub items_examined: usize,
    pub nodes_resolved: usize,
    pub rows_emitted: usize,
}

pub struct TreeWalker<'a> {
    session: RemoteSession<'a>,
    resolver: PermissionResolver<'a>,
    options: &'a WalkOptions,
}

impl<'a> TreeWalker<'a> {
    #[must_use]
    pub fn new(
        session: RemoteSession<'a>,
        resolver: PermissionResolver<'a>,
        options: &'a WalkOptions,
    ) -> Self {
        Self {
            session,
            resolver,
            options,
        }
    }

    /// Walk the tree under `root`, emitting every row for `target` to `sink`.
    ///
    /// # Errors
    ///
    /// The first remote or sink failure aborts the walk. Rows emitted before
    /// the failure stay in the sink.
    pub async fn walk(
        &self,
        root: TreeNode,
        target: &User,
        sink: &mut dyn ReportSink,
    ) -> Result<WalkStats, DomainError> {
        let mut stats = WalkStats::default();
        let mut stack = vec![(root, 0_usize)];

        while let Some((web, depth)) = stack.pop() {
            stats.webs_visited += 1;
            debug!(web = %web.url, depth, "visiting web");

            if self.is_unique(&web).await? {
                self.resolve_into(&web, target, sink, &mut stats).await?;
            }

            self.walk_lists(&web, target, sink, &mut stats).await?;

            if !self.options.expands(depth) {
                debug!(web = %web.url, depth, "max depth reached, not expanding subsites");
                continue;
            }

            let children: Vec<TreeNode> = fetch_all(
                self.session,
                PagedQuery::child_webs(&web.id, self.options.batch_size),
            )
            .try_collect()
            .await?;
            stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }

        Ok(stats)
    }

    async fn walk_lists(
        &self,
        web: &TreeNode,
        target: &User,
        sink: &mut dyn ReportSink,
        stats: &mut WalkStats,
    ) -> Result<(), DomainError> {
        let mut lists = pin!(fetch_all(
            self.session,
            PagedQuery::lists(&web.id, self.options.batch_size),
        ));

        while let Some(list) = lists.try_next().await? {
            match &list.kind {
                NodeKind::List { hidden: true, .. } => {
                    debug!(list = %list.title, "skipping hidden list");
                    continue;
                }
                NodeKind::List { .. } if self.options.is_excluded(&list) => {
                    debug!(list = %list.title, "skipping excluded list");
                    continue;
                }
                NodeKind::List { .. } => {}
                NodeKind::Site
                | NodeKind::Web
                | NodeKind::FolderItem { .. }
                | NodeKind::OtherLeaf { .. } => {
                    debug!(node = %list.id, "ignoring non-list node in list listing");
                    continue;
                }
            }

            self.scan_list(&list, target, sink, stats).await?;

            if self.is_unique(&list).await? {
                self.resolve_into(&list, target, sink, stats).await?;
            }
        }
        Ok(())
    }

    async fn scan_list(
        &self,
        list: &TreeNode,
        target: &User,
        sink: &mut dyn ReportSink,
        stats: &mut WalkStats,
    ) -> Result<(), DomainError> {
        stats.lists_scanned += 1;
        let total = list.item_count();
        let mut processed = 0_u64;

        let mut pages = pin!(fetch_pages(
            self.session,
            PagedQuery::items(&list.id, self.options.filter, self.options.batch_size),
        ));

        while let Some(batch) = pages.try_next().await? {
            processed += u64::try_from(batch.len()).unwrap_or(u64::MAX);
            for item in batch {
                stats.items_examined += 1;
                match &item.kind {
                    NodeKind::FolderItem { .. } => {
                        if self.is_unique(&item).await? {
                            self.resolve_into(&item, target, sink, stats).await?;
                        }
                    }
                    NodeKind::OtherLeaf { .. } => {}
                    NodeKind::Site | NodeKind::Web | NodeKind::List { .. } => {
                        debug!(node = %item.id, "ignoring container in item listing");
                    }
                }
            }
            debug!(list = %list.title, processed, total, "list scan progress");
        }
        Ok(())
    }

    /// Inheritance flag from the listing, or one extra round trip when the
    /// listing did not carry it.
    async fn is_unique(&self, node: &TreeNode) -> Result<bool, DomainError> {
        match node.has_unique_permissions {
            Some(unique) => Ok(unique),
            None => {
                self.session
                    .call("has_unique_role_assignments", |c, ctx| {
                        c.has_unique_role_assignments(ctx, &node.id)
                    })
                    .await
            }
        }
    }

    async fn resolve_into(
        &self,
        node: &TreeNode,
        target: &User,
        sink: &mut dyn ReportSink,
        stats: &mut WalkStats,
    ) -> Result<(), DomainError> {
        stats.nodes_resolved += 1;
        for row in self.resolver.resolve(node, target).await? {
            sink.emit(row)?;
            stats.rows_emitted += 1;
        }
        Ok(())
    }
}
