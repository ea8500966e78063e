pub mod cache;
pub mod counters;
pub mod db;
pub mod events;
pub mod models;
pub mod queries;
pub mod schema;
pub mod taxonomy;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
