use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Staff roles. A profile holds at most one.
///
/// Privilege nests admin ⊇ editor ⊇ viewer for every permission in the
/// registry, but nothing here orders the variants; each check goes through
/// the permission table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Editor, Role::Viewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }

    /// Exact, case-sensitive match on the stored role name.
    ///
    /// Anything else yields `None`, which the registry treats as a role with
    /// no permissions and no page access.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "admin" => Some(Role::Admin),
            "editor" => Some(Role::Editor),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic capabilities. Granted to roles, never to individual users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageUsers,
    ManageSettings,
    CreateContent,
    EditContent,
    DeleteContent,
    ViewContent,
}

impl Permission {
    pub const ALL: [Permission; 6] = [
        Permission::ManageUsers,
        Permission::ManageSettings,
        Permission::CreateContent,
        Permission::EditContent,
        Permission::DeleteContent,
        Permission::ViewContent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageUsers => "manage_users",
            Permission::ManageSettings => "manage_settings",
            Permission::CreateContent => "create_content",
            Permission::EditContent => "edit_content",
            Permission::DeleteContent => "delete_content",
            Permission::ViewContent => "view_content",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything a registry lookup can be keyed on: a typed role, a possibly
/// absent role, or a raw role string straight from storage.
pub trait AsRole {
    fn as_role(&self) -> Option<Role>;
}

impl AsRole for Role {
    fn as_role(&self) -> Option<Role> {
        Some(*self)
    }
}

impl AsRole for Option<Role> {
    fn as_role(&self) -> Option<Role> {
        *self
    }
}

impl AsRole for str {
    fn as_role(&self) -> Option<Role> {
        Role::parse(self)
    }
}

impl AsRole for String {
    fn as_role(&self) -> Option<Role> {
        Role::parse(self)
    }
}

impl<T: AsRole + ?Sized> AsRole for &T {
    fn as_role(&self) -> Option<Role> {
        (**self).as_role()
    }
}
