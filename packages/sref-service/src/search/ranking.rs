//! SQL side of the Sort/Rank Resolver: the two-window trend aggregation and `ORDER BY`.

use sqlx::{Postgres, QueryBuilder};

use sref_domain::{
	catalog::InteractionKind,
	ranking::{SortColumn, SortPlan, WindowBounds},
};

#[derive(Clone, Copy, Debug)]
pub(crate) struct TrendScope {
	pub(crate) bounds: WindowBounds,
	pub(crate) kind: InteractionKind,
}

/// `trend(item_id, recent_window, prior_window, growth_rate)` for items with at least one event
/// in the recent window. Growth is `recent` when `prior = 0`, otherwise the relative change.
pub(crate) fn push_trend_cte(qb: &mut QueryBuilder<'_, Postgres>, trend: &TrendScope) {
	qb.push(
		"WITH windows AS (\
		SELECT e.item_id, \
		count(*) FILTER (WHERE e.occurred_at > ",
	);
	qb.push_bind(trend.bounds.recent_start);
	qb.push(") AS recent_window, count(*) FILTER (WHERE e.occurred_at <= ");
	qb.push_bind(trend.bounds.recent_start);
	qb.push(") AS prior_window FROM interaction_events e WHERE e.kind = ");
	qb.push_bind(trend.kind.as_str());
	qb.push(" AND e.occurred_at > ");
	qb.push_bind(trend.bounds.prior_start);
	qb.push(" AND e.occurred_at <= ");
	qb.push_bind(trend.bounds.now);
	qb.push(
		" GROUP BY e.item_id), \
		trend AS (\
		SELECT item_id, recent_window, prior_window, \
		CASE WHEN prior_window = 0 THEN recent_window::float8 \
		ELSE (recent_window - prior_window)::float8 / prior_window::float8 END AS growth_rate \
		FROM windows WHERE recent_window > 0) ",
	);
}

/// Trend columns to add to a select list, as NULLs when the scope has no trend join.
pub(crate) fn trend_columns(with_trend: bool) -> &'static str {
	if with_trend {
		", t.recent_window, t.prior_window, t.growth_rate"
	} else {
		", NULL::bigint AS recent_window, NULL::bigint AS prior_window, NULL::float8 AS growth_rate"
	}
}

pub(crate) fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, plan: &SortPlan) {
	qb.push(" ORDER BY ");

	for (idx, term) in plan.terms.iter().enumerate() {
		if idx > 0 {
			qb.push(", ");
		}

		qb.push(column_sql(term.column));
		qb.push(" ");
		qb.push(term.direction.as_sql());
	}
}

fn column_sql(column: SortColumn) -> &'static str {
	match column {
		SortColumn::CreatedAt => "i.created_at",
		SortColumn::Views => "i.views",
		SortColumn::Likes => "i.likes",
		SortColumn::PopularityScore => "i.popularity_score",
		SortColumn::Featured => "i.featured",
		SortColumn::Verified => "i.verified",
		SortColumn::GrowthRate => "t.growth_rate",
		SortColumn::RecentWindow => "t.recent_window",
		SortColumn::ItemId => "i.item_id",
	}
}
