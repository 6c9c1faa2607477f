//! Fixtures shared by the unit tests: a small HR site backed by the static
//! content plugin.
#![cfg_attr(coverage_nightly, coverage(off))]

use std::ops::RangeInclusive;

use permission_audit_sdk::{PrincipalId, User};
use static_content_plugin::config::{
    AssignmentConfig, GroupConfig, ItemConfig, ListConfig, UserConfig, WebConfig,
};
use static_content_plugin::StaticContentConfig;

pub const SITE: &str = "https://contoso.sharepoint.com/sites/hr";
pub const DOCS_URL: &str = "https://contoso.sharepoint.com/sites/hr/Shared Documents";

pub const ALICE: PrincipalId = 10;
pub const BOB: PrincipalId = 11;
pub const HR_MEMBERS: PrincipalId = 20;
pub const HR_OWNERS: PrincipalId = 21;

pub fn alice() -> User {
    User {
        id: ALICE,
        login_name: "i:0#.f|membership|alice@contoso.com".to_owned(),
        title: "Alice Smith".to_owned(),
        email: Some("alice@contoso.com".to_owned()),
    }
}

pub fn users() -> Vec<UserConfig> {
    let alice = alice();
    vec![
        UserConfig {
            id: alice.id,
            login_name: alice.login_name,
            title: alice.title,
            email: alice.email,
        },
        UserConfig {
            id: BOB,
            login_name: "i:0#.f|membership|bob@contoso.com".to_owned(),
            title: "Bob Jones".to_owned(),
            email: Some("bob@contoso.com".to_owned()),
        },
    ]
}

/// "HR Members" holds Alice and, nested, "HR Owners"; "HR Owners" holds Bob.
pub fn groups() -> Vec<GroupConfig> {
    vec![
        GroupConfig {
            id: HR_MEMBERS,
            title: "HR Members".to_owned(),
            members: vec![ALICE, HR_OWNERS],
        },
        GroupConfig {
            id: HR_OWNERS,
            title: "HR Owners".to_owned(),
            members: vec![BOB],
        },
    ]
}

pub fn assign(principal_id: PrincipalId, roles: &[&str]) -> AssignmentConfig {
    AssignmentConfig {
        principal_id,
        roles: roles.iter().map(|r| (*r).to_owned()).collect(),
    }
}

/// Inherited folders titled `Folder <i>` with item id `i`.
pub fn folders(ids: RangeInclusive<i64>) -> Vec<ItemConfig> {
    ids.map(|id| ItemConfig {
        id,
        title: format!("Folder {id}"),
        folder: true,
        ..Default::default()
    })
    .collect()
}

pub fn docs_list(items: Vec<ItemConfig>) -> ListConfig {
    ListConfig {
        id: "list-docs".to_owned(),
        url: DOCS_URL.to_owned(),
        title: "Documents".to_owned(),
        items,
        ..Default::default()
    }
}

pub fn root_web(lists: Vec<ListConfig>, webs: Vec<WebConfig>) -> WebConfig {
    WebConfig {
        id: "web-root".to_owned(),
        url: SITE.to_owned(),
        title: "HR".to_owned(),
        unique_permissions: true,
        role_assignments: vec![assign(HR_OWNERS, &["Full Control"])],
        lists,
        webs,
    }
}

pub fn site(root: WebConfig) -> StaticContentConfig {
    StaticContentConfig {
        root,
        users: users(),
        groups: groups(),
        throttle_every_n_calls: None,
    }
}

/// Root web with the single "Documents" library holding `items`.
pub fn site_with_list(items: Vec<ItemConfig>) -> StaticContentConfig {
    site(root_web(vec![docs_list(items)], Vec::new()))
}
