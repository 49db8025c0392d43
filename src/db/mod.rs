//! PostgreSQL destination.
//!
//! This module provides the [`Database`] sink used by the load protocol,
//! along with connection configuration ([`ConnectionOpts`],
//! [`ConnectionConfig`]).

mod postgres;

pub use postgres::{ConnectionConfig, ConnectionOpts, Database};
