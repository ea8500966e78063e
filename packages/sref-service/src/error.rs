use sref_domain::search::FilterError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request at {field}: {message}")]
	InvalidRequest { field: String, message: String },
	#[error("Unauthorized: {message}")]
	Unauthorized { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidRequest { field: field.into(), message: message.into() }
	}

	pub(crate) fn not_found(message: impl Into<String>) -> Self {
		Self::NotFound { message: message.into() }
	}
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
impl From<sref_storage::Error> for Error {
	fn from(err: sref_storage::Error) -> Self {
		match err {
			sref_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			sref_storage::Error::InvalidArgument(message) =>
				Self::InvalidRequest { field: "$".to_string(), message },
			sref_storage::Error::NotFound(message) => Self::NotFound { message },
			sref_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}
impl From<FilterError> for Error {
	fn from(err: FilterError) -> Self {
		match err {
			FilterError::Invalid { path, message } => Self::InvalidRequest { field: path, message },
			FilterError::Unauthorized { message } => Self::Unauthorized { message },
		}
	}
}
