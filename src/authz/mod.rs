//! Authorization module - role registry and session gate
//!
//! - `role`: the three staff roles and the permission vocabulary
//! - `registry`: static role → permissions and admin page → roles tables
//! - `gate`: per-request resolution of `(user, profile, role)` and the
//!   admit/deny decision, in redirecting and non-redirecting flavours
//!
//! Unknown roles, unknown pages and missing profiles are always denied.

mod gate;
mod registry;
mod role;

pub use gate::{Admitted, Authenticated, Denial, Gate, Resolution, RoleCheck};
pub use registry::{
    admin_navigation, allowed_roles, can_edit_content, can_manage_settings, can_manage_users, has_page_access,
    has_permission, role_permissions, AdminPage, NavItem, ADMIN_PAGES,
};
pub use role::{AsRole, Permission, Role};
