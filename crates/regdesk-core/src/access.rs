//! Departments, admin roles and the scope an admin may act within.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The departments a student can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "Computer Science")]
    ComputerScience,
    Electronics,
    Mechanical,
    Civil,
    Chemical,
}

impl Department {
    pub const ALL: [Department; 5] = [
        Department::ComputerScience,
        Department::Electronics,
        Department::Mechanical,
        Department::Civil,
        Department::Chemical,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::ComputerScience => "Computer Science",
            Department::Electronics => "Electronics",
            Department::Mechanical => "Mechanical",
            Department::Civil => "Civil",
            Department::Chemical => "Chemical",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Department::ALL
            .into_iter()
            .find(|d| d.as_str() == s.trim())
            .ok_or_else(|| CoreError::validation(format!("unknown department: {s}")))
    }
}

/// Administrative roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Reviews documents for one department.
    DepartmentAdmin,
    /// Captures student photos; not tied to a department.
    PhotoAdmin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::DepartmentAdmin => "department_admin",
            Role::PhotoAdmin => "photo_admin",
        })
    }
}

/// The set of departments an admin may read and modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Department(Department),
    Unrestricted,
}

impl Scope {
    /// Scope granted by `role`. Department admins are confined to `department`.
    pub fn for_role(role: Role, department: Option<Department>) -> Result<Self, CoreError> {
        match (role, department) {
            (Role::DepartmentAdmin, Some(d)) => Ok(Scope::Department(d)),
            (Role::DepartmentAdmin, None) => Err(CoreError::validation(
                "department admin requires a department",
            )),
            (Role::PhotoAdmin, _) => Ok(Scope::Unrestricted),
        }
    }

    #[must_use]
    pub fn permits(&self, department: Department) -> bool {
        match self {
            Scope::Unrestricted => true,
            Scope::Department(own) => *own == department,
        }
    }

    pub fn require(&self, department: Department) -> Result<(), CoreError> {
        if self.permits(department) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "not authorized for department {department}"
            )))
        }
    }
}
