#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Conflict: {0}")]
	Conflict(String),
}
impl Error {
	/// Name of the violated constraint when the database rejected a write as a duplicate.
	pub fn unique_violation(&self) -> Option<&str> {
		let Self::Sqlx(sqlx::Error::Database(err)) = self else {
			return None;
		};

		if err.is_unique_violation() { err.constraint().or(Some("")) } else { None }
	}
}
