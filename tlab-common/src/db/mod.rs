//! SQLite persistence: schema initialization and store implementations

pub mod documents;
pub mod init;
pub mod sheets;

pub use documents::SqliteDocumentStore;
pub use init::{init_database, init_in_memory, BUSY_TIMEOUT_MS};
pub use sheets::SqliteSpreadsheet;
