//! Static navigation menu, filtered by the caller's role in the selected
//! company.

use serde::Serialize;

use crate::models::Role;

#[derive(Debug, Clone, Copy)]
enum Access {
    /// Any authenticated user.
    Anyone,
    /// Requires a selected company.
    Member,
    Roles(&'static [Role]),
}

impl Access {
    fn allows(self, role: Option<Role>) -> bool {
        match (self, role) {
            (Access::Anyone, _) => true,
            (Access::Member, role) => role.is_some(),
            (Access::Roles(allowed), Some(role)) => allowed.contains(&role),
            (Access::Roles(_), None) => false,
        }
    }
}

struct MenuNode {
    key: &'static str,
    label: &'static str,
    path: Option<&'static str>,
    icon: &'static str,
    access: Access,
    children: &'static [MenuNode],
}

const fn leaf(
    key: &'static str,
    label: &'static str,
    path: &'static str,
    icon: &'static str,
    access: Access,
) -> MenuNode {
    MenuNode {
        key,
        label,
        path: Some(path),
        icon,
        access,
        children: &[],
    }
}

static MENU: &[MenuNode] = &[
    leaf("dashboard", "Dashboard", "/dashboard", "home", Access::Anyone),
    leaf("posts", "Posts", "/posts", "file-text", Access::Member),
    leaf(
        "moderation",
        "Moderation",
        "/moderation",
        "shield",
        Access::Roles(&[Role::Admin, Role::Moderator]),
    ),
    MenuNode {
        key: "company",
        label: "Company",
        path: None,
        icon: "briefcase",
        access: Access::Member,
        children: &[
            leaf("company.members", "Members", "/company/members", "users", Access::Roles(&[Role::Admin])),
            leaf("company.settings", "Settings", "/company/settings", "settings", Access::Roles(&[Role::Admin])),
            leaf("company.switch", "Switch company", "/company/switch", "repeat", Access::Member),
        ],
    },
    MenuNode {
        key: "profile",
        label: "Profile",
        path: None,
        icon: "user",
        access: Access::Anyone,
        children: &[
            leaf("profile.account", "Account", "/profile", "user", Access::Anyone),
            leaf("profile.preferences", "Preferences", "/profile/preferences", "sliders", Access::Anyone),
        ],
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct MenuItem {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<&'static str>,
    pub icon: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

/// The menu visible to a user whose selected company grants `role`
/// (`None` when no company is selected).
pub fn menu_for(role: Option<Role>) -> Vec<MenuItem> {
    filter(MENU, role)
}

fn filter(nodes: &[MenuNode], role: Option<Role>) -> Vec<MenuItem> {
    nodes
        .iter()
        .filter(|node| node.access.allows(role))
        .filter_map(|node| {
            let children = filter(node.children, role);
            // Groups without a path of their own vanish when empty.
            if node.path.is_none() && children.is_empty() {
                return None;
            }
            Some(MenuItem {
                key: node.key,
                label: node.label,
                path: node.path,
                icon: node.icon,
                children,
            })
        })
        .collect()
}
