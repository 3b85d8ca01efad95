//! MySQL client utilities
//!
//! This module provides utilities for creating and managing MySQL connection pools.

use mysql_async::{OptsBuilder, Pool};
use std::fmt;

pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Connection parameters for the source database.
#[derive(Clone)]
pub struct ConnectionOpts {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl ConnectionOpts {
    /// Connection target for logs and errors, with the password hidden.
    pub fn describe(&self) -> String {
        format!(
            "mysql://{}:***@{}:{}/{}",
            self.username, self.host, self.port, self.database
        )
    }
}

impl fmt::Debug for ConnectionOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOpts")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Create a new MySQL connection pool
///
/// No connection is opened until one is requested from the pool.
pub fn new_mysql_pool(opts: &ConnectionOpts) -> Pool {
    let builder = OptsBuilder::default()
        .ip_or_hostname(opts.host.clone())
        .tcp_port(opts.port)
        .db_name(Some(opts.database.clone()))
        .user(Some(opts.username.clone()))
        .pass(Some(opts.password.clone()));
    Pool::new(builder)
}
