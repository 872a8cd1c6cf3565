//! RTM Connection - Realtime messaging connection layer
//!
//! This library provides the connection abstraction used by realtime
//! messaging clients: a tunable configuration object and a connection
//! that broadcasts events to weakly-held delegates.
//!
//! The library does not perform transport I/O itself. A transport driver
//! feeds events into a [`Connection`] via [`Connection::dispatch`], and
//! registered [`ConnectionDelegate`]s (or broadcast subscribers) react
//! to them.

pub mod config;
pub mod connection;
pub mod error;
pub mod metrics;
pub mod util;

pub use config::{Config, ConnectionConfiguration, OptionValue};
pub use connection::{
    Connection, ConnectionDelegate, ConnectionEvent, ConnectionId, ConnectionPhase,
};
pub use error::ConnectionError;

/// Library version for display
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
