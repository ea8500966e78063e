//! Renders a [`SearchPredicate`] into SQL over `catalog_items i`.

use sqlx::{Postgres, QueryBuilder};

use sref_domain::{
	search::{SearchPredicate, TextFilter},
	text,
};

use super::ranking::{self, TrendScope};

/// Everything that decides which rows belong to a result set.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SearchScope<'a> {
	pub(crate) predicate: &'a SearchPredicate,
	/// Present for trending sorts. Restricts rows to items with recent activity.
	pub(crate) trend: Option<TrendScope>,
}
impl<'a> SearchScope<'a> {
	pub(crate) fn with_predicate(self, predicate: &'a SearchPredicate) -> Self {
		Self { predicate, ..self }
	}
}

/// Pushes the optional `WITH` clause. Must come before `SELECT`.
pub(crate) fn push_with(qb: &mut QueryBuilder<'_, Postgres>, scope: &SearchScope<'_>) {
	if let Some(trend) = &scope.trend {
		ranking::push_trend_cte(qb, trend);
	}
}

/// Pushes `FROM ... WHERE ...` for the scope. `joins` is spliced in after the item and trend
/// relations so facet passes can group by joined columns.
pub(crate) fn push_from_where(
	qb: &mut QueryBuilder<'_, Postgres>,
	scope: &SearchScope<'_>,
	joins: &str,
) {
	qb.push(" FROM catalog_items i");

	if scope.trend.is_some() {
		qb.push(" JOIN trend t ON t.item_id = i.item_id");
	}

	qb.push(joins);

	qb.push(" WHERE i.status = ");
	qb.push_bind(SearchPredicate::REQUIRED_STATUS.as_str());
	push_predicate(qb, scope.predicate);
}

fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, predicate: &SearchPredicate) {
	match &predicate.text {
		Some(TextFilter::Prefix { terms }) =>
			if let Some(tsquery) = text::prefix_tsquery(terms) {
				qb.push(" AND i.search_vector @@ to_tsquery('simple', ");
				qb.push_bind(tsquery);
				qb.push(")");
			},
		Some(TextFilter::Substring { needle }) => {
			let pattern = format!("%{}%", text::escape_like(needle));

			qb.push(" AND (i.title ILIKE ");
			qb.push_bind(pattern.clone());
			qb.push(" OR i.description ILIKE ");
			qb.push_bind(pattern.clone());
			qb.push(" OR i.code ILIKE ");
			qb.push_bind(pattern);
			qb.push(")");
		},
		None => {},
	}

	if !predicate.categories.is_empty() {
		qb.push(
			" AND EXISTS (SELECT 1 FROM catalog_item_categories fc \
			JOIN categories c ON c.category_id = fc.category_id \
			WHERE fc.item_id = i.item_id AND c.slug = ANY(",
		);
		qb.push_bind(predicate.categories.clone());
		qb.push("))");
	}
	if !predicate.tags.is_empty() {
		qb.push(
			" AND EXISTS (SELECT 1 FROM catalog_item_tags ft \
			JOIN tags tg ON tg.tag_id = ft.tag_id \
			WHERE ft.item_id = i.item_id AND tg.name = ANY(",
		);
		qb.push_bind(predicate.tags.clone());
		qb.push("))");
	}

	for (column, wanted) in [
		("premium", predicate.premium),
		("featured", predicate.featured),
		("verified", predicate.verified),
	] {
		if let Some(wanted) = wanted {
			qb.push(format_args!(" AND i.{column} = "));
			qb.push_bind(wanted);
		}
	}

	if let Some(from) = predicate.created_from {
		qb.push(" AND i.created_at >= ");
		qb.push_bind(from);
	}
	if let Some(to) = predicate.created_to {
		qb.push(" AND i.created_at <= ");
		qb.push_bind(to);
	}

	for range in &predicate.numeric_ranges {
		let column = range.field.column();

		if let Some(min) = range.min {
			qb.push(format_args!(" AND i.{column}::float8 >= "));
			qb.push_bind(min);
		}
		if let Some(max) = range.max {
			qb.push(format_args!(" AND i.{column}::float8 <= "));
			qb.push_bind(max);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sref_domain::search::{NumericField, NumericRange};

	fn render(predicate: &SearchPredicate) -> String {
		let mut qb = QueryBuilder::<Postgres>::new("SELECT count(*)");

		push_from_where(&mut qb, &SearchScope { predicate, trend: None }, "");

		qb.sql().to_string()
	}

	#[test]
	fn status_is_always_constrained() {
		let sql = render(&SearchPredicate::default());

		assert_eq!(sql, "SELECT count(*) FROM catalog_items i WHERE i.status = $1");
	}

	#[test]
	fn categories_and_tags_are_separate_exists_clauses() {
		let predicate = SearchPredicate {
			categories: vec!["x".to_string(), "y".to_string()],
			tags: vec!["p".to_string()],
			..Default::default()
		};
		let sql = render(&predicate);

		assert!(sql.contains("c.slug = ANY($2)"), "{sql}");
		assert!(sql.contains("tg.name = ANY($3)"), "{sql}");
		assert_eq!(sql.matches("AND EXISTS").count(), 2);
	}

	#[test]
	fn prefix_text_uses_the_full_text_index() {
		let predicate = SearchPredicate {
			text: Some(TextFilter::Prefix { terms: vec!["anime".to_string()] }),
			..Default::default()
		};

		assert!(render(&predicate).contains("i.search_vector @@ to_tsquery('simple', $2)"));
	}

	#[test]
	fn substring_text_checks_three_columns() {
		let predicate = SearchPredicate {
			text: Some(TextFilter::Substring { needle: "neo".to_string() }),
			..Default::default()
		};
		let sql = render(&predicate);

		assert!(sql.contains("i.title ILIKE $2 OR i.description ILIKE $3 OR i.code ILIKE $4"));
	}

	#[test]
	fn flags_dates_and_ranges_are_inclusive() {
		let predicate = SearchPredicate {
			premium: Some(false),
			created_from: Some(time::OffsetDateTime::UNIX_EPOCH),
			numeric_ranges: vec![NumericRange {
				field: NumericField::PopularityScore,
				min: Some(1.0),
				max: Some(2.0),
			}],
			..Default::default()
		};
		let sql = render(&predicate);

		assert!(sql.contains("AND i.premium = $2"), "{sql}");
		assert!(sql.contains("AND i.created_at >= $3"), "{sql}");
		assert!(sql.contains("AND i.popularity_score::float8 >= $4"), "{sql}");
		assert!(sql.contains("AND i.popularity_score::float8 <= $5"), "{sql}");
	}
}
