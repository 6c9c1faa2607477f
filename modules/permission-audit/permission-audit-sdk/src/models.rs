//! Domain models for the permission-audit module.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of a securable node (web id, list id, or `list:item`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric principal identifier as assigned by the remote site.
pub type PrincipalId = i64;

/// Kind of a securable node.
///
/// Every decision point in the walker matches on this exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// Site collection root.
    Site,
    /// Subsite.
    Web,
    /// List or document library.
    List {
        /// Total number of items, used for progress reporting.
        item_count: u64,
        /// Hidden/system lists are never scanned.
        #[serde(default)]
        hidden: bool,
    },
    /// Folder inside a list.
    FolderItem { list_id: NodeId, item_id: i64 },
    /// Plain list item or document.
    OtherLeaf { list_id: NodeId, item_id: i64 },
}

impl NodeKind {
    /// Containers and folders carry ACLs worth inspecting; plain leaves do not.
    #[must_use]
    pub fn is_securable(&self) -> bool {
        !matches!(self, Self::OtherLeaf { .. })
    }

    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Site => ObjectType::Site,
            Self::Web => ObjectType::Web,
            Self::List { .. } => ObjectType::List,
            Self::FolderItem { .. } => ObjectType::Folder,
            Self::OtherLeaf { .. } => ObjectType::Item,
        }
    }
}

/// Object type label written to the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectType {
    Site,
    Web,
    List,
    Folder,
    Item,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Site => "Site",
            Self::Web => "Web",
            Self::List => "List",
            Self::Folder => "Folder",
            Self::Item => "Item",
        };
        f.write_str(label)
    }
}

/// Read-only view of one securable node of the remote tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: NodeId,
    pub url: String,
    pub title: String,
    pub kind: NodeKind,
    /// `None` when the listing did not include the flag; it is then
    /// loaded with one extra round trip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_unique_permissions: Option<bool>,
}

impl TreeNode {
    /// Item count for lists, zero for every other kind.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        match self.kind {
            NodeKind::List { item_count, .. } => item_count,
            _ => 0,
        }
    }
}

/// Opaque resume position inside a paginated collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Leaf-record filter applied to list item queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordFilter {
    /// Only folder-kind items.
    #[default]
    FoldersOnly,
    /// Every item; leaves are still skipped by the walker.
    AllItems,
}

/// Collection being enumerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "collection", rename_all = "snake_case")]
pub enum Collection {
    /// Immediate subsites of a web.
    ChildWebs { web: NodeId },
    /// Lists and libraries of a web.
    Lists { web: NodeId },
    /// Items of a list.
    Items { list: NodeId, filter: RecordFilter },
}

/// One paginated collection query.
///
/// Results are always ordered by identity, ascending, so that a cursor stays
/// valid when the same page is requested again after a throttled attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedQuery {
    pub collection: Collection,
    pub batch_size: u32,
}

impl PagedQuery {
    #[must_use]
    pub fn child_webs(web: &NodeId, batch_size: u32) -> Self {
        Self {
            collection: Collection::ChildWebs { web: web.clone() },
            batch_size,
        }
    }

    #[must_use]
    pub fn lists(web: &NodeId, batch_size: u32) -> Self {
        Self {
            collection: Collection::Lists { web: web.clone() },
            batch_size,
        }
    }

    #[must_use]
    pub fn items(list: &NodeId, filter: RecordFilter, batch_size: u32) -> Self {
        Self {
            collection: Collection::Items {
                list: list.clone(),
                filter,
            },
            batch_size,
        }
    }
}

/// One batch of a paginated collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// `None` once the collection is exhausted.
    pub next_cursor: Option<PageCursor>,
}

/// A user principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: PrincipalId,
    /// Unique claims login, e.g. `i:0#.f|membership|alice@contoso.com`.
    pub login_name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    /// Login-name equality with ASCII case folded, not byte equality:
    /// `i:0#.f|membership|Bob@x.com` and `i:0#.f|membership|bob@x.com` are
    /// the same login.
    #[must_use]
    pub fn is_same_login(&self, other: &User) -> bool {
        self.login_name.eq_ignore_ascii_case(&other.login_name)
    }
}

/// A group principal. Members are fetched on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: PrincipalId,
    pub title: String,
}

/// Principal bound by a role assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Principal {
    User(User),
    Group(Group),
}

/// Binding of one principal to one or more permission levels on a node.
///
/// The bound permission-level names are loaded separately, only when the
/// principal turns out to match the audit target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub principal_id: PrincipalId,
}

/// How the target obtained a permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionSource {
    Direct,
    /// Through membership of the named group.
    Group(String),
}

impl fmt::Display for PermissionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("Direct"),
            Self::Group(name) => write!(f, "Member of '{name}'"),
        }
    }
}

/// One line of the audit report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub object_url: String,
    pub object_type: ObjectType,
    pub object_title: String,
    pub source: PermissionSource,
    pub permissions: Vec<String>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn user(login: &str) -> User {
        User {
            id: 7,
            login_name: login.to_owned(),
            title: "Alice".to_owned(),
            email: None,
        }
    }

    #[test]
    fn login_comparison_ignores_case() {
        let a = user("i:0#.f|membership|alice@contoso.com");
        let b = user("i:0#.f|membership|Alice@Contoso.com");
        let c = user("i:0#.f|membership|bob@contoso.com");
        assert!(a.is_same_login(&b));
        assert!(!a.is_same_login(&c));
    }

    #[test]
    fn permission_source_labels() {
        assert_eq!(PermissionSource::Direct.to_string(), "Direct");
        assert_eq!(
            PermissionSource::Group("Marketing".to_owned()).to_string(),
            "Member of 'Marketing'"
        );
    }

    #[test]
    fn only_plain_leaves_are_not_securable() {
        let list = NodeId::new("list-1");
        assert!(NodeKind::Site.is_securable());
        assert!(
            NodeKind::FolderItem {
                list_id: list.clone(),
                item_id: 1
            }
            .is_securable()
        );
        assert!(
            !NodeKind::OtherLeaf {
                list_id: list,
                item_id: 2
            }
            .is_securable()
        );
    }

    #[test]
    fn node_kind_deserializes_from_tagged_json() {
        let kind: NodeKind =
            serde_json::from_str(r#"{"kind":"list","item_count":42}"#).unwrap();
        assert_eq!(
            kind,
            NodeKind::List {
                item_count: 42,
                hidden: false
            }
        );
        assert_eq!(kind.object_type().to_string(), "List");
    }
}
