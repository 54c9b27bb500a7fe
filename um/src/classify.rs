//! User role classification
//!
//! Maps the raw `Rights` / `UniqueID` pair of a source row to a [`Role`] and
//! the [`UserType`] derived from it.

use std::fmt;

use crate::rowset::{RowSet, Value};

/// Source column holding the access-rights label
pub const RIGHTS_COLUMN: &str = "Rights";

/// Source column holding the unique user id
pub const UNIQUE_ID_COLUMN: &str = "UniqueID";

/// Classification label assigned to a user row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Admin,
    TeamLead,
    Staff,
    Lawyer,
    Attorney,
    Provider,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::TeamLead,
        Role::Staff,
        Role::Lawyer,
        Role::Attorney,
        Role::Provider,
    ];

    /// Coarse grouping for this role
    pub fn user_type(self) -> UserType {
        match self {
            Role::Lawyer | Role::Attorney | Role::Provider => UserType::External,
            Role::Admin | Role::TeamLead | Role::Staff => UserType::Internal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::TeamLead => "TeamLead",
            Role::Staff => "Staff",
            Role::Lawyer => "Lawyer",
            Role::Attorney => "Attorney",
            Role::Provider => "Provider",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal/External grouping derived from [`Role`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserType {
    Internal,
    External,
}

impl UserType {
    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Internal => "Internal",
            UserType::External => "External",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub role: Role,
    pub user_type: UserType,
}

impl From<Role> for Classification {
    fn from(role: Role) -> Self {
        Self {
            role,
            user_type: role.user_type(),
        }
    }
}

type Rule = (fn(&str, &str) -> bool, Role);

/// Evaluated top to bottom; the first matching predicate decides the role.
const RULES: &[Rule] = &[
    (|rights, id| rights == "superadmin" && id == "superuser", Role::Admin),
    (|rights, id| rights == "staff" && id == "superuser", Role::TeamLead),
    (|rights, id| rights == "staff" && id.is_empty(), Role::Staff),
    (|rights, _| rights.contains("lawyer"), Role::Lawyer),
    (|rights, _| rights.contains("attorney"), Role::Attorney),
    (|rights, _| rights.contains("provider"), Role::Provider),
];

const FALLBACK: Role = Role::Staff;

fn field_text(value: Option<&Value>) -> String {
    value.map(Value::to_text).unwrap_or_default()
}

/// Classify raw rights/id strings. Never fails.
pub fn classify_fields(rights: &str, unique_id: &str) -> Classification {
    let rights = rights.trim().to_lowercase();
    let id = unique_id.trim().to_lowercase();

    RULES
        .iter()
        .find(|(matches, _)| matches(rights.as_str(), id.as_str()))
        .map(|&(_, role)| role)
        .unwrap_or(FALLBACK)
        .into()
}

/// Classify row `row` of `set`; absent or NULL fields count as empty
pub fn classify(set: &RowSet, row: usize) -> Classification {
    let rights = field_text(set.get(row, RIGHTS_COLUMN));
    let id = field_text(set.get(row, UNIQUE_ID_COLUMN));
    classify_fields(&rights, &id)
}
