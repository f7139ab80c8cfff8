//! A2A protocol types
//!
//! Task model, JSON-RPC envelope, and Agent Card structures as exchanged
//! with A2A clients.

pub mod agent_card;
pub mod jsonrpc;
pub mod messages;

pub use agent_card::*;
pub use jsonrpc::*;
pub use messages::*;
