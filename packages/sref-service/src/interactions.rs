use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use sref_domain::catalog::InteractionKind;
use sref_storage::{events, models::InteractionEvent, queries};

use crate::{Error, Requester, Result, SrefService};

const MAX_REFERRER_CHARS: usize = 2_048;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInteractionRequest {
	pub kind: String,
	pub referrer: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInteractionResponse {
	pub event_id: Uuid,
	pub kind: InteractionKind,
	/// False for kinds that have no counter column, such as SHARE.
	pub counted: bool,
}

impl SrefService {
	/// Appends an interaction event and bumps the matching counter in one transaction.
	pub async fn record_interaction(
		&self,
		requester: &Requester,
		code: &str,
		req: RecordInteractionRequest,
	) -> Result<RecordInteractionResponse> {
		let kind: InteractionKind =
			req.kind.parse().map_err(|message: String| Error::invalid("$.kind", message))?;
		let referrer = req
			.referrer
			.map(|referrer| referrer.trim().to_string())
			.filter(|referrer| !referrer.is_empty());

		if referrer.as_ref().is_some_and(|referrer| referrer.chars().count() > MAX_REFERRER_CHARS)
		{
			return Err(Error::invalid(
				"$.referrer",
				format!("referrer must be at most {MAX_REFERRER_CHARS} characters."),
			));
		}

		let caller = self.resolve_caller(requester).await?;
		let item = self.visible_item(&caller, code).await?;
		let event = InteractionEvent {
			event_id: Uuid::new_v4(),
			item_id: item.item_id,
			user_id: caller.user_id(),
			kind: kind.as_str().to_string(),
			occurred_at: OffsetDateTime::now_utc(),
			referrer,
			ip: requester.ip.clone(),
			user_agent: requester.user_agent.clone(),
		};
		let counter = kind.counter();
		let mut tx = self.db.pool.begin().await?;

		events::insert_interaction_event(&mut *tx, &event).await?;

		if let Some(counter) = counter {
			queries::increment_counter(&mut *tx, item.item_id, counter.column()).await?;
		}

		tx.commit().await?;

		tracing::debug!(
			event_id = %event.event_id,
			item_id = %item.item_id,
			kind = kind.as_str(),
			"Interaction recorded."
		);

		Ok(RecordInteractionResponse { event_id: event.event_id, kind, counted: counter.is_some() })
	}
}
