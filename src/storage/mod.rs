// Storage module: the observation log and its CSV interchange format.

pub mod csv;
pub mod sqlite;

pub use sqlite::SqliteStorage;
