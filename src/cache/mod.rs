pub mod backend;
pub mod error;
pub mod file_store;
pub mod store;
