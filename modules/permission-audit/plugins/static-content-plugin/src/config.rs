//! Configuration for the static content plugin.

use std::collections::HashSet;

use permission_audit_sdk::PrincipalId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Plugin configuration: the whole site tree plus its principals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticContentConfig {
    /// Root web of the site.
    pub root: WebConfig,

    /// Site users.
    pub users: Vec<UserConfig>,

    /// Site groups.
    pub groups: Vec<GroupConfig>,

    /// When set, every n-th call (across all operations) answers `Throttled`.
    pub throttle_every_n_calls: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebConfig {
    pub id: String,
    pub url: String,
    pub title: String,
    pub unique_permissions: bool,
    pub role_assignments: Vec<AssignmentConfig>,
    pub lists: Vec<ListConfig>,
    pub webs: Vec<WebConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListConfig {
    pub id: String,
    pub url: String,
    pub title: String,
    pub hidden: bool,
    pub unique_permissions: bool,
    pub role_assignments: Vec<AssignmentConfig>,
    /// Defaults to `<url>/DispForm.aspx`.
    pub default_display_form: Option<String>,
    pub items: Vec<ItemConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ItemConfig {
    pub id: i64,
    pub title: String,
    pub folder: bool,
    pub unique_permissions: bool,
    pub role_assignments: Vec<AssignmentConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignmentConfig {
    pub principal_id: PrincipalId,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    pub id: PrincipalId,
    pub login_name: String,
    pub title: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    pub id: PrincipalId,
    pub title: String,
    /// Principal ids; ids that name other groups are not expanded.
    #[serde(default)]
    pub members: Vec<PrincipalId>,
}

/// Invalid static content configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("duplicate node id '{0}'")]
    DuplicateNode(String),

    #[error("duplicate principal id {0}")]
    DuplicatePrincipal(PrincipalId),

    #[error("throttle_every_n_calls must be at least 2, got {0}")]
    ThrottleTooAggressive(u32),
}

impl StaticContentConfig {
    /// Check identities are unique and throttling still lets calls through.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(n) = self.throttle_every_n_calls
            && n < 2
        {
            return Err(ConfigError::ThrottleTooAggressive(n));
        }

        let mut principals = HashSet::new();
        let ids = self
            .users
            .iter()
            .map(|u| u.id)
            .chain(self.groups.iter().map(|g| g.id));
        for id in ids {
            if !principals.insert(id) {
                return Err(ConfigError::DuplicatePrincipal(id));
            }
        }

        let mut nodes = HashSet::new();
        let mut stack = vec![&self.root];
        while let Some(web) = stack.pop() {
            if !nodes.insert(web.id.clone()) {
                return Err(ConfigError::DuplicateNode(web.id.clone()));
            }
            for list in &web.lists {
                if !nodes.insert(list.id.clone()) {
                    return Err(ConfigError::DuplicateNode(list.id.clone()));
                }
                let mut items = HashSet::new();
                for item in &list.items {
                    if !items.insert(item.id) {
                        return Err(ConfigError::DuplicateNode(format!(
                            "{}:{}",
                            list.id, item.id
                        )));
                    }
                }
            }
            stack.extend(&web.webs);
        }

        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_tree() {
        let cfg: StaticContentConfig = serde_json::from_str(
            r#"{
                "root": { "id": "web-root", "url": "https://x/sites/a", "title": "A" },
                "users": [{ "id": 1, "login_name": "alice", "title": "Alice" }]
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.root.id, "web-root");
        assert!(cfg.root.lists.is_empty());
        assert_eq!(cfg.users.len(), 1);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_fields() {
        let result: Result<StaticContentConfig, _> =
            serde_json::from_str(r#"{ "root": { "id": "a", "colour": "red" } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_duplicate_nodes() {
        let cfg = StaticContentConfig {
            root: WebConfig {
                id: "w".to_owned(),
                webs: vec![WebConfig {
                    id: "w".to_owned(),
                    ..Default::default()
                }],
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DuplicateNode("w".to_owned()))
        );
    }

    #[test]
    fn rejects_duplicate_principals() {
        let cfg = StaticContentConfig {
            users: vec![UserConfig {
                id: 3,
                login_name: "a".to_owned(),
                title: "A".to_owned(),
                email: None,
            }],
            groups: vec![GroupConfig {
                id: 3,
                title: "G".to_owned(),
                members: vec![],
            }],
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::DuplicatePrincipal(3)));
    }

    #[test]
    fn rejects_throttling_every_call() {
        let cfg = StaticContentConfig {
            throttle_every_n_calls: Some(1),
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ThrottleTooAggressive(1)));
    }
}
