//! Database module — driver abstraction + MySQL and SQLite backends

mod driver;
mod insert;
mod params;
mod query;
pub mod mysql;
pub mod sqlite;

pub use driver::*;
pub use insert::*;
pub use params::*;
pub use query::*;
