//! Turns client table requests (search keyword, sort column, page bounds)
//! into bounded queries over an introspected SQLite table.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;

pub use crate::config::{ConfiguredTable, TableRegistry};
pub use crate::core::descriptor::{DataTable, TableDescriptor};
pub use crate::core::records::fetch_records;
pub use crate::core::request::TableRequest;
pub use crate::core::store::{SqliteStore, TableStore};
pub use crate::core::types::{ResponseMode, ResponseOptions, ResultPage, SearchContext};
pub use crate::error::{AppError, AppResult};
