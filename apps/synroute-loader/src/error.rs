use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read export file at {path:?}.")]
	Read { path: PathBuf, source: std::io::Error },
	#[error("Failed to decode export file at {path:?}: {source}")]
	Decode { path: PathBuf, source: serde_json::Error },
}
