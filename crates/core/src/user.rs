//! Users, roles and habit categories.

use serde::{Deserialize, Serialize};
use crate::error::{CoreError, Result};
use crate::id::{CategoryId, RoleId, UserId};
use crate::Time;

/// A registered user who owns habits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: UserId,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// E-mail address, unique across users
    pub email: String,

    /// Preferred UI theme
    pub theme: Option<String>,

    /// Assigned role
    pub role_id: Option<RoleId>,

    /// When registered
    pub created_at: Time,
}

impl User {
    /// Create a user, validating the e-mail is present.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            id: UserId::new(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: normalize_email(email.into())?,
            theme: None,
            role_id: None,
            created_at: chrono::Utc::now(),
        })
    }

    /// Replace the e-mail, normalized the same way as on creation.
    pub fn set_email(&mut self, email: impl Into<String>) -> Result<()> {
        self.email = normalize_email(email.into())?;
        Ok(())
    }

    /// Full display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// A user role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique identifier
    pub id: RoleId,
    /// Role name
    pub name: String,
}

impl Role {
    /// Create a role.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::Blank("role name"));
        }
        Ok(Self { id: RoleId::new(), name })
    }
}

/// A habit category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: CategoryId,
    /// Category name
    pub name: String,
}

impl Category {
    /// Create a category.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::Blank("category name"));
        }
        Ok(Self { id: CategoryId::new(), name })
    }
}

fn normalize_email(raw: String) -> Result<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(CoreError::Blank("email"));
    }
    Ok(email)
}
