pub mod catalog;
pub mod db;
pub mod models;
pub mod molecules;
pub mod predictions;
pub mod routes;
pub mod schema;
pub mod solvability;
pub mod statistics;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
