pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		match line.trim().strip_prefix("\\ir ").map(str::trim) {
			Some(path) => out.push_str(include_file(path).unwrap_or(line)),
			None => out.push_str(line),
		}

		out.push('\n');
	}

	out
}

fn include_file(path: &str) -> Option<&'static str> {
	let sql = match path {
		"00_extensions.sql" => include_str!("../../../sql/00_extensions.sql"),
		"tables/001_users.sql" => include_str!("../../../sql/tables/001_users.sql"),
		"tables/002_categories.sql" => include_str!("../../../sql/tables/002_categories.sql"),
		"tables/003_tags.sql" => include_str!("../../../sql/tables/003_tags.sql"),
		"tables/004_catalog_items.sql" => include_str!("../../../sql/tables/004_catalog_items.sql"),
		"tables/005_catalog_item_categories.sql" =>
			include_str!("../../../sql/tables/005_catalog_item_categories.sql"),
		"tables/006_catalog_item_tags.sql" =>
			include_str!("../../../sql/tables/006_catalog_item_tags.sql"),
		"tables/007_catalog_images.sql" =>
			include_str!("../../../sql/tables/007_catalog_images.sql"),
		"tables/008_interaction_events.sql" =>
			include_str!("../../../sql/tables/008_interaction_events.sql"),
		"tables/009_search_analytics.sql" =>
			include_str!("../../../sql/tables/009_search_analytics.sql"),
		"tables/010_search_cache.sql" => include_str!("../../../sql/tables/010_search_cache.sql"),
		_ => return None,
	};

	Some(sql)
}
