use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const MAX_CODE_DIGITS: usize = 20;
pub const MAX_TITLE_CHARS: usize = 120;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogStatus {
	Pending,
	Active,
	Archived,
	Deleted,
}
impl CatalogStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "PENDING",
			Self::Active => "ACTIVE",
			Self::Archived => "ARCHIVED",
			Self::Deleted => "DELETED",
		}
	}

	/// Status an item moves to under `action`, or `None` when the move is not allowed.
	pub fn transition(self, action: LifecycleAction) -> Option<Self> {
		match (self, action) {
			(Self::Pending, LifecycleAction::Approve) => Some(Self::Active),
			(Self::Active, LifecycleAction::Archive) => Some(Self::Archived),
			(Self::Deleted, LifecycleAction::Delete) => None,
			(_, LifecycleAction::Delete) => Some(Self::Deleted),
			_ => None,
		}
	}
}
impl FromStr for CatalogStatus {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"PENDING" => Ok(Self::Pending),
			"ACTIVE" => Ok(Self::Active),
			"ARCHIVED" => Ok(Self::Archived),
			"DELETED" => Ok(Self::Deleted),
			other => Err(format!("unknown catalog status '{other}'.")),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleAction {
	Approve,
	Archive,
	Delete,
}
impl LifecycleAction {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Approve => "approve",
			Self::Archive => "archive",
			Self::Delete => "delete",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionKind {
	View,
	Like,
	Favorite,
	Share,
	Download,
	Comment,
}
impl InteractionKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::View => "VIEW",
			Self::Like => "LIKE",
			Self::Favorite => "FAVORITE",
			Self::Share => "SHARE",
			Self::Download => "DOWNLOAD",
			Self::Comment => "COMMENT",
		}
	}

	/// Counter bumped alongside the event row. Shares and comments only append.
	pub fn counter(self) -> Option<Counter> {
		match self {
			Self::View => Some(Counter::Views),
			Self::Like => Some(Counter::Likes),
			Self::Favorite => Some(Counter::Favorites),
			Self::Download => Some(Counter::Downloads),
			Self::Share | Self::Comment => None,
		}
	}
}
impl FromStr for InteractionKind {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_ascii_uppercase().as_str() {
			"VIEW" => Ok(Self::View),
			"LIKE" => Ok(Self::Like),
			"FAVORITE" => Ok(Self::Favorite),
			"SHARE" => Ok(Self::Share),
			"DOWNLOAD" => Ok(Self::Download),
			"COMMENT" => Ok(Self::Comment),
			other => Err(format!("unknown interaction kind '{other}'.")),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Counter {
	Views,
	Likes,
	Favorites,
	Downloads,
}
impl Counter {
	pub fn column(self) -> &'static str {
		match self {
			Self::Views => "views",
			Self::Likes => "likes",
			Self::Favorites => "favorites",
			Self::Downloads => "downloads",
		}
	}
}

pub fn validate_code(code: &str) -> Result<(), String> {
	let pattern = format!(r"^[0-9]{{1,{MAX_CODE_DIGITS}}}$");
	let ok = Regex::new(&pattern).map(|re| re.is_match(code)).unwrap_or(false);

	if ok { Ok(()) } else { Err(format!("code must be 1-{MAX_CODE_DIGITS} ASCII digits.")) }
}

pub fn validate_title(title: &str) -> Result<(), String> {
	let count = title.trim().chars().count();

	if count == 0 || count > MAX_TITLE_CHARS {
		return Err(format!("title must be 1-{MAX_TITLE_CHARS} characters."));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn codes_are_short_digit_strings() {
		assert!(validate_code("1234567890").is_ok());
		assert!(validate_code("7").is_ok());
		assert!(validate_code("").is_err());
		assert!(validate_code("12a4").is_err());
		assert!(validate_code("123456789012345678901").is_err());
		assert!(validate_code("١٢٣").is_err());
	}

	#[test]
	fn lifecycle_only_allows_forward_moves() {
		assert_eq!(
			CatalogStatus::Pending.transition(LifecycleAction::Approve),
			Some(CatalogStatus::Active)
		);
		assert_eq!(CatalogStatus::Active.transition(LifecycleAction::Approve), None);
		assert_eq!(
			CatalogStatus::Active.transition(LifecycleAction::Archive),
			Some(CatalogStatus::Archived)
		);
		assert_eq!(CatalogStatus::Pending.transition(LifecycleAction::Archive), None);
		assert_eq!(
			CatalogStatus::Archived.transition(LifecycleAction::Delete),
			Some(CatalogStatus::Deleted)
		);
		assert_eq!(CatalogStatus::Deleted.transition(LifecycleAction::Delete), None);
	}

	#[test]
	fn share_and_comment_do_not_touch_counters() {
		assert_eq!(InteractionKind::Like.counter(), Some(Counter::Likes));
		assert_eq!(InteractionKind::Share.counter(), None);
		assert_eq!(InteractionKind::Comment.counter(), None);
		assert_eq!("download".parse::<InteractionKind>(), Ok(InteractionKind::Download));
	}
}
