use sref_domain::access::{Caller, Role};

use crate::{Error, Requester, Result, SrefService};

impl SrefService {
	/// Verifies the requester against the `users` table. Unknown ids are rejected rather than
	/// downgraded to anonymous.
	pub async fn resolve_caller(&self, requester: &Requester) -> Result<Caller> {
		let Some(user_id) = requester.user_id else {
			return Ok(Caller::Anonymous);
		};
		let user = sref_storage::queries::get_user(&self.db.pool, user_id)
			.await?
			.ok_or_else(|| Error::Unauthorized { message: "Unknown user.".to_string() })?;
		let role: Role =
			user.role.parse().map_err(|message: String| Error::Storage { message })?;

		Ok(Caller::Member { user_id: user.user_id, role, is_premium: user.is_premium })
	}

	pub(crate) async fn require_member(&self, requester: &Requester) -> Result<Caller> {
		match self.resolve_caller(requester).await? {
			Caller::Anonymous =>
				Err(Error::Unauthorized { message: "Sign in to perform this action.".to_string() }),
			caller => Ok(caller),
		}
	}

	/// Operators pass without a user row. Everyone else needs the ADMIN role.
	pub(crate) async fn require_admin(&self, requester: &Requester) -> Result<()> {
		if requester.operator {
			return Ok(());
		}
		if self.resolve_caller(requester).await?.is_admin() {
			return Ok(());
		}

		Err(Error::Unauthorized { message: "Admin role is required.".to_string() })
	}
}
