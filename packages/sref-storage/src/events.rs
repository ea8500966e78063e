use sqlx::PgExecutor;

use crate::{
	Result,
	models::{InteractionEvent, SearchAnalytic},
};

pub async fn insert_interaction_event<'e, E>(executor: E, event: &InteractionEvent) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO interaction_events (
\tevent_id,
\titem_id,
\tuser_id,
\tkind,
\toccurred_at,
\treferrer,
\tip,
\tuser_agent
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8)",
	)
	.bind(event.event_id)
	.bind(event.item_id)
	.bind(event.user_id)
	.bind(event.kind.as_str())
	.bind(event.occurred_at)
	.bind(event.referrer.as_deref())
	.bind(event.ip.as_deref())
	.bind(event.user_agent.as_deref())
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn insert_search_analytic<'e, E>(executor: E, row: &SearchAnalytic) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO search_analytics (
\tsearch_id,
\tquery,
\tfilters,
\tsort,
\tuser_id,
\tip,
\tresults_count,
\tcache_hit,
\tcreated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)",
	)
	.bind(row.search_id)
	.bind(row.query.as_str())
	.bind(&row.filters)
	.bind(row.sort.as_str())
	.bind(row.user_id)
	.bind(row.ip.as_deref())
	.bind(row.results_count)
	.bind(row.cache_hit)
	.bind(row.created_at)
	.execute(executor)
	.await?;

	Ok(())
}
