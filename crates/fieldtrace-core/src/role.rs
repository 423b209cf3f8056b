//! Actor roles and the user identity they are attached to.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// One of the fixed actor categories that gate API access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  Farmer,
  Processor,
  Retailer,
  InputProvider,
  FinancialProvider,
  Regulator,
  Consumer,
}

impl Role {
  pub const ALL: [Role; 7] = [
    Role::Farmer,
    Role::Processor,
    Role::Retailer,
    Role::InputProvider,
    Role::FinancialProvider,
    Role::Regulator,
    Role::Consumer,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Role::Farmer => "farmer",
      Role::Processor => "processor",
      Role::Retailer => "retailer",
      Role::InputProvider => "input_provider",
      Role::FinancialProvider => "financial_provider",
      Role::Regulator => "regulator",
      Role::Consumer => "consumer",
    }
  }

  /// Whether this role appears in a route's allow-list.
  pub fn is_allowed(self, allowed: &[Role]) -> bool { allowed.contains(&self) }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Role::ALL
      .into_iter()
      .find(|r| r.as_str() == s)
      .ok_or_else(|| Error::UnknownRole(s.to_owned()))
  }
}

/// An authenticated actor. Credentials never leave the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:         String,
  pub username:   String,
  pub role:       Role,
  pub created_at: DateTime<Utc>,
}

/// Input for creating a user. `password_hash` is an argon2 PHC string.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub id:            String,
  pub username:      String,
  pub role:          Role,
  pub password_hash: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_every_wire_name() {
    for role in Role::ALL {
      assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
    }
  }

  #[test]
  fn unknown_role_is_rejected() {
    assert!(matches!(
      "admin".parse::<Role>(),
      Err(Error::UnknownRole(name)) if name == "admin"
    ));
  }

  #[test]
  fn serde_matches_wire_names() {
    let json = serde_json::to_string(&Role::InputProvider).unwrap();
    assert_eq!(json, "\"input_provider\"");
  }

  #[test]
  fn allow_list_membership() {
    let readers = [Role::Farmer, Role::Regulator, Role::Processor];
    assert!(Role::Regulator.is_allowed(&readers));
    assert!(!Role::Consumer.is_allowed(&readers));
    assert!(!Role::Farmer.is_allowed(&[]));
  }
}
