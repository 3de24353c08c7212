//! Static role and page tables.
//!
//! Both tables are process-wide constants. Lookups never fail: an unknown
//! role or an unknown admin path simply has no access.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;
use utoipa::ToSchema;

use super::role::{AsRole, Permission, Role};

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::ManageUsers,
    Permission::ManageSettings,
    Permission::CreateContent,
    Permission::EditContent,
    Permission::DeleteContent,
    Permission::ViewContent,
];

const EDITOR_PERMISSIONS: &[Permission] = &[
    Permission::CreateContent,
    Permission::EditContent,
    Permission::DeleteContent,
    Permission::ViewContent,
];

const VIEWER_PERMISSIONS: &[Permission] = &[Permission::ViewContent];

const ALL_STAFF: &[Role] = &[Role::Admin, Role::Editor, Role::Viewer];
const CONTENT_STAFF: &[Role] = &[Role::Admin, Role::Editor];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// One entry of the admin area: where it lives, what the sidebar calls it,
/// and who may open it.
#[derive(Debug, Clone, Copy)]
pub struct AdminPage {
    pub path: &'static str,
    pub title: &'static str,
    pub roles: &'static [Role],
}

/// Every admin page, in sidebar order.
pub const ADMIN_PAGES: &[AdminPage] = &[
    AdminPage { path: "/admin", title: "Dashboard", roles: ALL_STAFF },
    AdminPage { path: "/admin/posts", title: "Blog Posts", roles: CONTENT_STAFF },
    AdminPage { path: "/admin/pages", title: "Pages", roles: CONTENT_STAFF },
    AdminPage { path: "/admin/services", title: "Services", roles: CONTENT_STAFF },
    AdminPage { path: "/admin/case-studies", title: "Case Studies", roles: CONTENT_STAFF },
    AdminPage { path: "/admin/team", title: "Team", roles: CONTENT_STAFF },
    AdminPage { path: "/admin/testimonials", title: "Testimonials", roles: CONTENT_STAFF },
    AdminPage { path: "/admin/faqs", title: "FAQs", roles: CONTENT_STAFF },
    AdminPage { path: "/admin/contacts", title: "Contacts", roles: CONTENT_STAFF },
    AdminPage { path: "/admin/analytics", title: "Analytics", roles: ALL_STAFF },
    AdminPage { path: "/admin/users", title: "Users", roles: ADMIN_ONLY },
    AdminPage { path: "/admin/settings", title: "Settings", roles: ADMIN_ONLY },
];

fn page_access() -> &'static HashMap<&'static str, &'static [Role]> {
    static PAGE_ACCESS: OnceLock<HashMap<&'static str, &'static [Role]>> = OnceLock::new();
    PAGE_ACCESS.get_or_init(|| ADMIN_PAGES.iter().map(|page| (page.path, page.roles)).collect())
}

/// Permissions held by a role.
pub fn role_permissions(role: Role) -> &'static [Permission] {
    match role {
        Role::Admin => ADMIN_PERMISSIONS,
        Role::Editor => EDITOR_PERMISSIONS,
        Role::Viewer => VIEWER_PERMISSIONS,
    }
}

/// Roles allowed to open `path`, or `None` when the path is not a known
/// admin page.
pub fn allowed_roles(path: &str) -> Option<&'static [Role]> {
    page_access().get(path).copied()
}

pub fn has_permission(role: impl AsRole, permission: Permission) -> bool {
    match role.as_role() {
        Some(role) => role_permissions(role).contains(&permission),
        None => false,
    }
}

/// Exact match on the path. Sub-paths of a known page are not covered by
/// its entry.
pub fn has_page_access(role: impl AsRole, path: &str) -> bool {
    match (role.as_role(), allowed_roles(path)) {
        (Some(role), Some(roles)) => roles.contains(&role),
        _ => false,
    }
}

pub fn can_manage_users(role: impl AsRole) -> bool {
    has_permission(role, Permission::ManageUsers)
}

pub fn can_manage_settings(role: impl AsRole) -> bool {
    has_permission(role, Permission::ManageSettings)
}

pub fn can_edit_content(role: impl AsRole) -> bool {
    has_permission(role, Permission::EditContent)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct NavItem {
    pub title: &'static str,
    pub href: &'static str,
}

/// Sidebar entries the role is allowed to open.
pub fn admin_navigation(role: impl AsRole) -> Vec<NavItem> {
    let role = role.as_role();
    ADMIN_PAGES
        .iter()
        .filter(|page| has_page_access(role, page.path))
        .map(|page| NavItem {
            title: page.title,
            href: page.path,
        })
        .collect()
}
