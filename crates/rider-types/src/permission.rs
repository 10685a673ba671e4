//! Sharing permissions
//!
//! Riders and projects are shared with other people by email. Each grant
//! carries one [`Permission`] level; the set of levels a grant may use depends
//! on the [`GrantScope`] it is attached to.

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Permission level carried by a grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Project listing only (project grants)
    Read,
    /// View and comment
    Comment,
    /// View, comment and modify
    Edit,
}

impl Permission {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Comment => "comment",
            Self::Edit => "edit",
        }
    }

    /// Parse a level and check it is allowed for the given scope
    pub fn parse_for(scope: GrantScope, s: &str) -> Result<Self, ParseError> {
        let permission: Self = s.parse()?;
        if scope.allows(permission) {
            Ok(permission)
        } else {
            Err(ParseError::new(scope.permission_kind(), s))
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Permission {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "comment" => Ok(Self::Comment),
            "edit" => Ok(Self::Edit),
            other => Err(ParseError::new("permission", other)),
        }
    }
}

/// The kind of resource a grant is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantScope {
    Rider,
    Project,
}

impl GrantScope {
    /// Levels a grant in this scope may carry
    pub const fn allowed(&self) -> &'static [Permission] {
        match self {
            Self::Rider => &[Permission::Comment, Permission::Edit],
            Self::Project => &[Permission::Read, Permission::Comment, Permission::Edit],
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.allowed().contains(&permission)
    }

    const fn permission_kind(&self) -> &'static str {
        match self {
            Self::Rider => "rider permission",
            Self::Project => "project permission",
        }
    }
}

impl std::fmt::Display for GrantScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rider => f.write_str("rider"),
            Self::Project => f.write_str("project"),
        }
    }
}

/// Something a principal wants to do to a rider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Comment,
    Edit,
}

impl Action {
    /// Grant levels that satisfy this action
    ///
    /// Opening a rider needs at least `comment`; a project `read` grant lists
    /// the project but never opens its riders.
    pub const fn required(&self) -> &'static [Permission] {
        match self {
            Self::View | Self::Comment => &[Permission::Comment, Permission::Edit],
            Self::Edit => &[Permission::Edit],
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Comment => "comment",
            Self::Edit => "edit",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
