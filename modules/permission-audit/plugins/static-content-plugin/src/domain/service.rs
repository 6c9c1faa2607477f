//! Domain service for the static content plugin.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;
use permission_audit_sdk::{
    Collection, Group, NodeId, NodeKind, Page, PageCursor, PagedQuery, PrincipalId,
    RecordFilter, RemoteError, TreeNode, User,
};

use crate::config::{AssignmentConfig, ListConfig, StaticContentConfig, WebConfig};

const CURSOR_PREFIX: &str = "Paged=TRUE&p_ID=";

/// One call received by the plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRequest {
    pub operation: &'static str,
    pub target: String,
    /// Whether the call was answered with `Throttled`.
    pub throttled: bool,
}

struct NodeEntry {
    node: TreeNode,
    assignments: Vec<(PrincipalId, Vec<String>)>,
    child_webs: Vec<NodeId>,
    lists: Vec<NodeId>,
    items: Vec<NodeId>,
    display_form: Option<String>,
}

impl NodeEntry {
    fn new(node: TreeNode, assignments: &[AssignmentConfig]) -> Self {
        Self {
            node,
            assignments: assignments
                .iter()
                .map(|a| (a.principal_id, a.roles.clone()))
                .collect(),
            child_webs: Vec::new(),
            lists: Vec::new(),
            items: Vec::new(),
            display_form: None,
        }
    }
}

struct GroupEntry {
    group: Group,
    members: Vec<PrincipalId>,
}

#[derive(Default)]
struct Journal {
    calls: u64,
    requests: Vec<RemoteRequest>,
}

/// Static content service: an in-memory site tree.
pub struct Service {
    root_id: NodeId,
    root_url: String,
    nodes: HashMap<NodeId, NodeEntry>,
    users: BTreeMap<PrincipalId, User>,
    groups: BTreeMap<PrincipalId, GroupEntry>,
    throttle_every_n_calls: Option<u32>,
    journal: Mutex<Journal>,
}

impl Service {
    /// Build the in-memory tree from configuration.
    #[must_use]
    pub fn from_config(cfg: &StaticContentConfig) -> Self {
        let mut nodes = HashMap::new();
        let root_id = index_web(&cfg.root, NodeKind::Site, &mut nodes);

        let users = cfg
            .users
            .iter()
            .map(|u| {
                (
                    u.id,
                    User {
                        id: u.id,
                        login_name: u.login_name.clone(),
                        title: u.title.clone(),
                        email: u.email.clone(),
                    },
                )
            })
            .collect();

        let groups = cfg
            .groups
            .iter()
            .map(|g| {
                (
                    g.id,
                    GroupEntry {
                        group: Group {
                            id: g.id,
                            title: g.title.clone(),
                        },
                        members: g.members.clone(),
                    },
                )
            })
            .collect();

        Self {
            root_id,
            root_url: cfg.root.url.clone(),
            nodes,
            users,
            groups,
            throttle_every_n_calls: cfg.throttle_every_n_calls,
            journal: Mutex::new(Journal::default()),
        }
    }

    /// Every call received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RemoteRequest> {
        self.journal.lock().requests.clone()
    }

    /// Number of calls received for one operation, throttled ones included.
    #[must_use]
    pub fn request_count(&self, operation: &str) -> usize {
        self.journal
            .lock()
            .requests
            .iter()
            .filter(|r| r.operation == operation)
            .count()
    }

    /// Record a call and decide whether it is throttled.
    pub(crate) fn begin(
        &self,
        operation: &'static str,
        target: impl Into<String>,
    ) -> Result<(), RemoteError> {
        let mut journal = self.journal.lock();
        journal.calls += 1;
        let throttled = self
            .throttle_every_n_calls
            .is_some_and(|n| n > 0 && journal.calls % u64::from(n) == 0);
        journal.requests.push(RemoteRequest {
            operation,
            target: target.into(),
            throttled,
        });
        if throttled {
            tracing::debug!(operation, "static content plugin throttling call");
            return Err(RemoteError::Throttled);
        }
        Ok(())
    }

    pub(crate) fn root(&self, url: &str) -> Result<TreeNode, RemoteError> {
        if !same_url(url, &self.root_url) {
            return Err(RemoteError::NotFound(url.to_owned()));
        }
        Ok(self.entry(&self.root_id)?.node.clone())
    }

    pub(crate) fn page(
        &self,
        query: &PagedQuery,
        cursor: Option<&PageCursor>,
    ) -> Result<Page<TreeNode>, RemoteError> {
        let (ids, filter) = match &query.collection {
            Collection::ChildWebs { web } => (&self.entry(web)?.child_webs, None),
            Collection::Lists { web } => (&self.entry(web)?.lists, None),
            Collection::Items { list, filter } => (&self.entry(list)?.items, Some(*filter)),
        };

        let start = match cursor {
            None => 0,
            Some(cursor) => resume_position(ids, cursor)?,
        };
        let batch = usize::try_from(query.batch_size.max(1)).unwrap_or(usize::MAX);

        let mut matching = ids[start..]
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .map(|entry| &entry.node)
            .filter(|node| passes_filter(node, filter));

        let items: Vec<TreeNode> = matching
            .by_ref()
            .take(batch)
            .map(|node| listed(node, filter.is_some()))
            .collect();

        let next_cursor = if matching.next().is_some() {
            items
                .last()
                .map(|n| PageCursor::new(format!("{CURSOR_PREFIX}{}", n.id)))
        } else {
            None
        };

        Ok(Page { items, next_cursor })
    }

    pub(crate) fn is_unique(&self, id: &NodeId) -> Result<bool, RemoteError> {
        Ok(self
            .entry(id)?
            .node
            .has_unique_permissions
            .unwrap_or(false))
    }

    pub(crate) fn assignments(&self, id: &NodeId) -> Result<Vec<PrincipalId>, RemoteError> {
        Ok(self
            .entry(id)?
            .assignments
            .iter()
            .map(|(principal, _)| *principal)
            .collect())
    }

    pub(crate) fn roles(
        &self,
        id: &NodeId,
        principal: PrincipalId,
    ) -> Result<Vec<String>, RemoteError> {
        self.entry(id)?
            .assignments
            .iter()
            .find(|(p, _)| *p == principal)
            .map(|(_, roles)| roles.clone())
            .ok_or_else(|| {
                RemoteError::NotFound(format!("principal {principal} has no assignment on {id}"))
            })
    }

    pub(crate) fn user(&self, id: PrincipalId) -> Option<&User> {
        self.users.get(&id)
    }

    pub(crate) fn group(&self, id: PrincipalId) -> Option<&Group> {
        self.groups.get(&id).map(|g| &g.group)
    }

    pub(crate) fn members(&self, group: PrincipalId) -> Result<Vec<User>, RemoteError> {
        let entry = self
            .groups
            .get(&group)
            .ok_or_else(|| RemoteError::NotFound(format!("group {group}")))?;
        // Members that are groups themselves are not returned.
        Ok(entry
            .members
            .iter()
            .filter_map(|id| self.users.get(id))
            .cloned()
            .collect())
    }

    pub(crate) fn find_user(&self, login_or_email: &str) -> Option<&User> {
        let wanted = login_or_email.trim();
        self.users.values().find(|u| {
            u.login_name.eq_ignore_ascii_case(wanted)
                || u.email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(wanted))
                || u.login_name
                    .rsplit_once('|')
                    .is_some_and(|(_, account)| account.eq_ignore_ascii_case(wanted))
        })
    }

    pub(crate) fn display_form(&self, list: &NodeId) -> Result<String, RemoteError> {
        let entry = self.entry(list)?;
        match (&entry.node.kind, &entry.display_form) {
            (NodeKind::List { .. }, Some(form)) => Ok(form.clone()),
            (NodeKind::List { .. }, None) => Ok(format!("{}/DispForm.aspx", entry.node.url)),
            _ => Err(RemoteError::NotFound(format!("list {list}"))),
        }
    }

    fn entry(&self, id: &NodeId) -> Result<&NodeEntry, RemoteError> {
        self.nodes
            .get(id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }
}

fn index_web(web: &WebConfig, kind: NodeKind, nodes: &mut HashMap<NodeId, NodeEntry>) -> NodeId {
    let id = NodeId::new(web.id.as_str());
    let mut entry = NodeEntry::new(
        TreeNode {
            id: id.clone(),
            url: web.url.clone(),
            title: web.title.clone(),
            kind,
            has_unique_permissions: Some(web.unique_permissions),
        },
        &web.role_assignments,
    );

    entry.lists = web.lists.iter().map(|l| index_list(l, nodes)).collect();
    entry.lists.sort();
    entry.child_webs = web
        .webs
        .iter()
        .map(|w| index_web(w, NodeKind::Web, nodes))
        .collect();
    entry.child_webs.sort();

    nodes.insert(id.clone(), entry);
    id
}

fn index_list(list: &ListConfig, nodes: &mut HashMap<NodeId, NodeEntry>) -> NodeId {
    let id = NodeId::new(list.id.as_str());
    let mut entry = NodeEntry::new(
        TreeNode {
            id: id.clone(),
            url: list.url.clone(),
            title: list.title.clone(),
            kind: NodeKind::List {
                item_count: u64::try_from(list.items.len()).unwrap_or(u64::MAX),
                hidden: list.hidden,
            },
            has_unique_permissions: Some(list.unique_permissions),
        },
        &list.role_assignments,
    );
    entry.display_form.clone_from(&list.default_display_form);

    let mut items: Vec<_> = list.items.iter().collect();
    items.sort_by_key(|item| item.id);
    for item in items {
        let item_id = NodeId::new(format!("{}:{}", list.id, item.id));
        let kind = if item.folder {
            NodeKind::FolderItem {
                list_id: id.clone(),
                item_id: item.id,
            }
        } else {
            NodeKind::OtherLeaf {
                list_id: id.clone(),
                item_id: item.id,
            }
        };
        let node = TreeNode {
            id: item_id.clone(),
            url: format!("{}/{}", list.url, item.title),
            title: item.title.clone(),
            kind,
            has_unique_permissions: Some(item.unique_permissions),
        };
        nodes.insert(item_id.clone(), NodeEntry::new(node, &item.role_assignments));
        entry.items.push(item_id);
    }

    nodes.insert(id.clone(), entry);
    id
}

fn resume_position(ids: &[NodeId], cursor: &PageCursor) -> Result<usize, RemoteError> {
    let last = cursor
        .as_str()
        .strip_prefix(CURSOR_PREFIX)
        .ok_or_else(|| RemoteError::Internal(format!("malformed cursor '{}'", cursor.as_str())))?;
    ids.iter()
        .position(|id| id.as_str() == last)
        .map(|pos| pos + 1)
        .ok_or_else(|| RemoteError::Internal(format!("unknown cursor '{}'", cursor.as_str())))
}

fn passes_filter(node: &TreeNode, filter: Option<RecordFilter>) -> bool {
    match filter {
        Some(RecordFilter::FoldersOnly) => matches!(node.kind, NodeKind::FolderItem { .. }),
        Some(RecordFilter::AllItems) | None => true,
    }
}

/// Item listings do not carry the unique-permissions flag.
fn listed(node: &TreeNode, is_item_listing: bool) -> TreeNode {
    let mut node = node.clone();
    if is_item_listing {
        node.has_unique_permissions = None;
    }
    node
}

fn same_url(a: &str, b: &str) -> bool {
    a.trim_end_matches('/')
        .eq_ignore_ascii_case(b.trim_end_matches('/'))
}
