//! EVM chain bindings and client
//!
//! The rest of the crate depends on this module only through
//! [`EvmChainClient`] and the tracker's `FlowReader` seam, never on a
//! specific RPC transport.

pub mod client;
pub mod contracts;

pub use client::EvmChainClient;
