//! Fetch Module
//!
//! Upstream access: connections, per-backend worker pools and the
//! coordinator tying them to the response cache.

mod connection;
mod coordinator;
mod pool;
mod simulated;

pub use connection::{Connection, ConnectionFactory, HttpConnectionFactory, OpenConnection};
pub use coordinator::FetchCoordinator;
pub use pool::{WorkerPool, WorkerPools};
pub use simulated::SimulatedConnectionFactory;
