use synroute_domain::{MetricsError, PlanError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Duplicate input: {message}")]
	DuplicateInput { message: String },
	#[error("Malformed route tree: {message}")]
	MalformedTree { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	/// Stable code used in batch summaries and API responses.
	pub fn code(&self) -> &'static str {
		match self {
			Self::InvalidRequest { .. } => "INVALID_REQUEST",
			Self::NotFound { .. } => "NOT_FOUND",
			Self::DuplicateInput { .. } => "DUPLICATE_INPUT",
			Self::MalformedTree { .. } => "MALFORMED_TREE",
			Self::Conflict { .. } => "CONFLICT",
			Self::Storage { .. } => "STORAGE_ERROR",
		}
	}

	/// Whether a batch may record this error against one item and keep going.
	pub fn is_item_error(&self) -> bool {
		!matches!(self, Self::Storage { .. })
	}

	pub(crate) fn not_found(message: impl Into<String>) -> Self {
		Self::NotFound { message: message.into() }
	}

	pub(crate) fn invalid(message: impl Into<String>) -> Self {
		Self::InvalidRequest { message: message.into() }
	}
}

impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<synroute_storage::Error> for Error {
	fn from(err: synroute_storage::Error) -> Self {
		match err {
			synroute_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			synroute_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			synroute_storage::Error::NotFound(message) => Self::NotFound { message },
			synroute_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}

impl From<PlanError> for Error {
	fn from(err: PlanError) -> Self {
		Self::MalformedTree { message: err.to_string() }
	}
}

impl From<MetricsError> for Error {
	fn from(err: MetricsError) -> Self {
		Self::Storage { message: format!("Stored metric rows are inconsistent: {err}") }
	}
}
