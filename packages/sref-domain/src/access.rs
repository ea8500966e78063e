use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
	User,
	Admin,
}
impl Role {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::User => "USER",
			Self::Admin => "ADMIN",
		}
	}
}
impl FromStr for Role {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"USER" => Ok(Self::User),
			"ADMIN" => Ok(Self::Admin),
			other => Err(format!("unknown role '{other}'.")),
		}
	}
}

/// How much of the catalog a caller may see.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
	Anonymous,
	Authenticated,
	Premium,
}
impl AccessLevel {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Anonymous => "anonymous",
			Self::Authenticated => "authenticated",
			Self::Premium => "premium",
		}
	}
}

/// The caller of an operation after server-side verification of the user row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Caller {
	Anonymous,
	Member { user_id: Uuid, role: Role, is_premium: bool },
}
impl Caller {
	pub fn access_level(&self) -> AccessLevel {
		match self {
			Self::Anonymous => AccessLevel::Anonymous,
			Self::Member { role: Role::Admin, .. } | Self::Member { is_premium: true, .. } =>
				AccessLevel::Premium,
			Self::Member { .. } => AccessLevel::Authenticated,
		}
	}

	pub fn user_id(&self) -> Option<Uuid> {
		match self {
			Self::Anonymous => None,
			Self::Member { user_id, .. } => Some(*user_id),
		}
	}

	pub fn is_admin(&self) -> bool {
		matches!(self, Self::Member { role: Role::Admin, .. })
	}

	/// Owners and admins may modify an item.
	pub fn can_manage(&self, owner: Option<Uuid>) -> bool {
		self.is_admin() || (owner.is_some() && self.user_id() == owner)
	}
}
