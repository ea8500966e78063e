use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
	pub page: u32,
	pub limit: u32,
	pub total: u64,
	pub total_pages: u64,
	pub has_next: bool,
	pub has_prev: bool,
}
impl Pagination {
	/// `page` is 1-based and `limit` must be non-zero.
	pub fn new(page: u32, limit: u32, total: u64) -> Self {
		let total_pages = total.div_ceil(u64::from(limit.max(1)));

		Self {
			page,
			limit,
			total,
			total_pages,
			has_next: u64::from(page) < total_pages,
			has_prev: page > 1,
		}
	}

	pub fn offset(page: u32, limit: u32) -> u64 {
		u64::from(page.saturating_sub(1)) * u64::from(limit)
	}
}
