//! Connection abstraction
//!
//! The connection object, its lifecycle phases, and delegate dispatch.

mod conn;
mod delegates;
mod events;
mod state;

pub use conn::Connection;
pub use delegates::{ConnectionDelegate, DelegateSet};
pub use events::ConnectionEvent;
pub use state::{ConnectionId, ConnectionInfo, ConnectionPhase, ConnectionState};
