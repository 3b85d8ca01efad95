//! MySQL change source for rds-sync
//!
//! Selects the rows of a table whose effective change time is strictly
//! after a watermark, using a parameterized statement evaluated by the
//! server, and converts them into [`sync_core::Batch`]es.

mod client;
mod error;
pub mod reverse;
mod selector;
mod source;

pub mod testing;

pub use client::{new_mysql_pool, ConnectionOpts, DEFAULT_MYSQL_PORT};
pub use error::{ConversionError, SourceError};
pub use selector::{build_select, quote_identifier, SelectStatement};
pub use source::MySQLChangeSource;
