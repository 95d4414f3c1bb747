//! Subject role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Roles a connected subject can hold.
///
/// Roles are ordered by privilege level: Admin > Coordinator > UnitDevice >
/// Demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectRole {
    /// Full system administrator; may join any topic.
    Admin,
    /// Dispatch coordinator; monitors units and facilities.
    Coordinator,
    /// A vehicle-mounted device reporting telemetry.
    UnitDevice,
    /// Demo subject admitted via the sentinel credential.
    Demo,
}

impl SubjectRole {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Admin => 4,
            Self::Coordinator => 3,
            Self::UnitDevice => 2,
            Self::Demo => 1,
        }
    }

    /// Check if this role has at least the given role's privileges.
    pub fn has_at_least(&self, other: &SubjectRole) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    /// Check if this role is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Coordinator => "coordinator",
            Self::UnitDevice => "unit_device",
            Self::Demo => "demo",
        }
    }
}

impl fmt::Display for SubjectRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubjectRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "coordinator" => Ok(Self::Coordinator),
            "unit_device" => Ok(Self::UnitDevice),
            "demo" => Ok(Self::Demo),
            _ => Err(AppError::validation(format!(
                "Invalid subject role: '{s}'. Expected one of: admin, coordinator, unit_device, demo"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_ordering() {
        assert!(SubjectRole::Admin.has_at_least(&SubjectRole::Demo));
        assert!(SubjectRole::Coordinator.has_at_least(&SubjectRole::UnitDevice));
        assert!(!SubjectRole::UnitDevice.has_at_least(&SubjectRole::Coordinator));
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "coordinator".parse::<SubjectRole>().unwrap(),
            SubjectRole::Coordinator
        );
        assert_eq!(
            "UNIT_DEVICE".parse::<SubjectRole>().unwrap(),
            SubjectRole::UnitDevice
        );
        assert!("dispatcher".parse::<SubjectRole>().is_err());
    }
}
