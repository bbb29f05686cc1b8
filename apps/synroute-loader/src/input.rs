//! Export files: JSON, gzip-compressed when the name ends in `.gz`.

use std::{
	fs::File,
	io::{BufReader, Read},
	path::Path,
};

use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

pub fn read_json<T>(path: &Path) -> Result<T>
where
	T: DeserializeOwned,
{
	let file =
		File::open(path).map_err(|err| Error::Read { path: path.to_path_buf(), source: err })?;
	let reader: Box<dyn Read> = if is_gzip(path) {
		Box::new(GzDecoder::new(BufReader::new(file)))
	} else {
		Box::new(BufReader::new(file))
	};

	serde_json::from_reader(reader).map_err(|err| {
		if err.is_io() {
			Error::Read { path: path.to_path_buf(), source: err.into() }
		} else {
			Error::Decode { path: path.to_path_buf(), source: err }
		}
	})
}

fn is_gzip(path: &Path) -> bool {
	path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}
