//! Facet passes. Each runs against the shared scope with its own dimension removed.

use sqlx::{PgPool, Postgres, QueryBuilder};

use sref_domain::facets::{CategoryFacet, FacetDimension, Facets, PremiumSplit, TagFacet};

use super::filter::{self, SearchScope};
use crate::Result;

const CATEGORY_JOINS: &str = " JOIN catalog_item_categories ic ON ic.item_id = i.item_id \
	JOIN categories c ON c.category_id = ic.category_id";
const TAG_JOINS: &str = " JOIN catalog_item_tags it ON it.item_id = i.item_id \
	JOIN tags tg ON tg.tag_id = it.tag_id";

pub(crate) async fn aggregate(
	pool: &PgPool,
	scope: &SearchScope<'_>,
	limit: u32,
) -> Result<Facets> {
	let (categories, tags, premium_split) = tokio::try_join!(
		category_facet(pool, scope, limit),
		tag_facet(pool, scope, limit),
		premium_facet(pool, scope),
	)?;

	Ok(Facets { categories, tags, premium_split })
}

async fn category_facet(
	pool: &PgPool,
	scope: &SearchScope<'_>,
	limit: u32,
) -> Result<Vec<CategoryFacet>> {
	let predicate = scope.predicate.without(FacetDimension::Category);
	let mut qb = category_facet_query(&scope.with_predicate(&predicate), limit);
	let rows: Vec<(String, String, i64)> = qb.build_query_as().fetch_all(pool).await?;

	Ok(rows.into_iter().map(|(slug, name, count)| CategoryFacet { slug, name, count }).collect())
}

async fn tag_facet(pool: &PgPool, scope: &SearchScope<'_>, limit: u32) -> Result<Vec<TagFacet>> {
	let predicate = scope.predicate.without(FacetDimension::Tag);
	let mut qb = tag_facet_query(&scope.with_predicate(&predicate), limit);
	let rows: Vec<(String, i64)> = qb.build_query_as().fetch_all(pool).await?;

	Ok(rows.into_iter().map(|(name, count)| TagFacet { name, count }).collect())
}

async fn premium_facet(pool: &PgPool, scope: &SearchScope<'_>) -> Result<PremiumSplit> {
	let predicate = scope.predicate.without(FacetDimension::Premium);
	let mut qb = premium_facet_query(&scope.with_predicate(&predicate));
	let (free, premium): (i64, i64) = qb.build_query_as().fetch_one(pool).await?;

	Ok(PremiumSplit { free, premium })
}

fn category_facet_query(scope: &SearchScope<'_>, limit: u32) -> QueryBuilder<'static, Postgres> {
	let mut qb = QueryBuilder::new("");

	filter::push_with(&mut qb, scope);
	qb.push("SELECT c.slug, c.name, count(*) AS n");
	filter::push_from_where(&mut qb, scope, CATEGORY_JOINS);
	qb.push(" GROUP BY c.slug, c.name ORDER BY n DESC, c.slug ASC LIMIT ");
	qb.push_bind(i64::from(limit));

	qb
}

fn tag_facet_query(scope: &SearchScope<'_>, limit: u32) -> QueryBuilder<'static, Postgres> {
	let mut qb = QueryBuilder::new("");

	filter::push_with(&mut qb, scope);
	qb.push("SELECT tg.name, count(*) AS n");
	filter::push_from_where(&mut qb, scope, TAG_JOINS);
	qb.push(" GROUP BY tg.name ORDER BY n DESC, tg.name ASC LIMIT ");
	qb.push_bind(i64::from(limit));

	qb
}

fn premium_facet_query(scope: &SearchScope<'_>) -> QueryBuilder<'static, Postgres> {
	let mut qb = QueryBuilder::new("");

	filter::push_with(&mut qb, scope);
	qb.push(
		"SELECT count(*) FILTER (WHERE NOT i.premium) AS free, \
		count(*) FILTER (WHERE i.premium) AS premium",
	);
	filter::push_from_where(&mut qb, scope, "");

	qb
}
