//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread
//! - One handler thread per connection
//! - Commands routed through the engine's single execution lane

mod connection;
mod server;

pub use connection::Connection;
pub use server::Server;
